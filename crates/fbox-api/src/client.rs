use crate::error::FetchError;
use crate::source::UnitSource;
use async_trait::async_trait;
use fbox_config::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 错误信息中保留的响应体长度
const BODY_HEAD_CHARS: usize = 200;

/// FBOX 厂商 API 客户端
///
/// 详情与功率各有一组候选接口，按顺序尝试，第一个返回 JSON 对象的接口胜出。
pub struct FboxClient {
    client: reqwest::Client,
    base_url: String,
    area_id: String,
    detail_paths: Vec<String>,
    power_paths: Vec<String>,
}

impl FboxClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(REFERER, header_value(&format!("{}/", base_url))?);
        headers.insert(COOKIE, header_value(&cookie_header(config))?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            area_id: config.area_id.clone(),
            detail_paths: config.detail_paths.clone(),
            power_paths: config.power_paths.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 依次尝试候选接口
    async fn fetch_candidates(
        &self,
        paths: &[String],
        query: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let mut tried = Vec::with_capacity(paths.len());
        let mut last = None;

        for path in paths {
            let endpoint = self.endpoint(path);
            tried.push(endpoint.clone());

            match self.fetch_json(&endpoint, query).await {
                Ok(value) => {
                    debug!(endpoint = %endpoint, "Endpoint responded");
                    return Ok(value);
                }
                Err(e) => {
                    debug!(endpoint = %endpoint, error = %e, "Endpoint rejected");
                    last = Some(e);
                }
            }
        }

        match last {
            Some(last) => {
                warn!(tried = tried.len(), error = %last, "All candidate endpoints failed");
                Err(FetchError::Exhausted {
                    tried,
                    last: Box::new(last),
                })
            }
            None => Err(FetchError::NoEndpoints),
        }
    }

    async fn fetch_json(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(endpoint)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(transport)?;

        classify_response(endpoint, status, &content_type, &body)
    }
}

#[async_trait]
impl UnitSource for FboxClient {
    async fn fetch_detail(&self, unit_id: u32) -> Result<Value, FetchError> {
        let query = [
            ("output", "json".to_string()),
            ("area_id", self.area_id.clone()),
            ("id", unit_id.to_string()),
        ];
        self.fetch_candidates(&self.detail_paths, &query).await
    }

    async fn fetch_power(&self, unit_id: u32) -> Result<Value, FetchError> {
        let query = [
            ("output", "json".to_string()),
            ("area_id", self.area_id.clone()),
            ("fbox_id", unit_id.to_string()),
        ];
        self.fetch_candidates(&self.power_paths, &query).await
    }
}

/// 判断单个响应是否可用
///
/// 要求 200、JSON 内容类型且响应体是 JSON 对象。业务状态码（`code`）不在此处判断，
/// `code != 1` 的响应照常返回，由提取器当作离线快照处理。
pub fn classify_response(
    endpoint: &str,
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<Value, FetchError> {
    let unexpected = || FetchError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        status,
        content_type: content_type.to_string(),
        body_head: body.chars().take(BODY_HEAD_CHARS).collect(),
    };

    if status != 200 || !content_type.contains("application/json") {
        return Err(unexpected());
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(unexpected()),
    }
}

fn cookie_header(config: &ApiConfig) -> String {
    let mut cookies = vec!["lang=en-us".to_string(), "language=en".to_string()];
    if let Some(ssid) = &config.ssid {
        cookies.push(format!("ssid={}", ssid.trim()));
    }
    if let Some(token) = &config.admin_token {
        cookies.push(format!("Admin-Token={}", token.trim()));
    }
    cookies.join("; ")
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_json_object() {
        let value = classify_response(
            "http://x/detail",
            200,
            "application/json; charset=utf-8",
            r#"{"code": 1, "data": {}}"#,
        )
        .unwrap();
        assert_eq!(value["code"], 1);
    }

    #[test]
    fn test_offline_code_is_not_an_error() {
        let value = classify_response("e", 200, "application/json", r#"{"code": 0, "msg": "offline"}"#).unwrap();
        assert_eq!(value, json!({"code": 0, "msg": "offline"}));
    }

    #[test]
    fn test_html_login_page_rejected() {
        let body = format!("<html>{}</html>", "x".repeat(500));
        let err = classify_response("http://x/detail", 200, "text/html", &body).unwrap_err();

        match err {
            FetchError::UnexpectedResponse {
                status,
                content_type,
                body_head,
                ..
            } => {
                assert_eq!(status, 200);
                assert_eq!(content_type, "text/html");
                assert_eq!(body_head.chars().count(), 200);
                assert!(body_head.starts_with("<html>"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_200_and_non_object() {
        assert!(classify_response("e", 404, "application/json", "{}").is_err());
        assert!(classify_response("e", 200, "application/json", "[1, 2]").is_err());
        assert!(classify_response("e", 200, "application/json", "{broken").is_err());
    }

    #[test]
    fn test_cookie_header() {
        let config = ApiConfig {
            ssid: Some("abc".into()),
            admin_token: Some("tok".into()),
            ..Default::default()
        };
        assert_eq!(
            cookie_header(&config),
            "lang=en-us; language=en; ssid=abc; Admin-Token=tok"
        );
    }

    #[test]
    fn test_endpoint_join() {
        let client = FboxClient::new(&ApiConfig {
            base_url: "http://host/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("/api/index/fbox.boxlist/detail"),
            "http://host/api/index/fbox.boxlist/detail"
        );
    }
}
