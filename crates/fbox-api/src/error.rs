use thiserror::Error;

/// 上游请求失败
///
/// 作为值返回给调用方：该单元在本周期被跳过，检查周期继续。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// 非 200、非 JSON 或无法解析的响应
    #[error("Unexpected response from {endpoint}: status={status} content_type={content_type:?} body={body_head:?}")]
    UnexpectedResponse {
        endpoint: String,
        status: u16,
        content_type: String,
        /// 响应体前 200 个字符
        body_head: String,
    },

    #[error("Transport error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// 所有候选接口均失败，携带最后一次失败
    #[error("All {} endpoints failed, last: {last}", .tried.len())]
    Exhausted {
        tried: Vec<String>,
        last: Box<FetchError>,
    },

    #[error("No endpoints configured")]
    NoEndpoints,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    pub fn tried(&self) -> &[String] {
        match self {
            FetchError::Exhausted { tried, .. } => tried,
            _ => &[],
        }
    }
}
