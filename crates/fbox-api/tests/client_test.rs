use fbox_api::{FboxClient, FetchError, UnitSource};
use fbox_config::ApiConfig;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::assert_ok;

/// 极简 HTTP 桩：按请求路径返回预设响应，并记录收到的请求行
async fn spawn_stub(routes: Vec<(&'static str, u16, &'static str, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            seen.lock().unwrap().push(request.clone());

            let path = request
                .split_whitespace()
                .nth(1)
                .unwrap_or("/")
                .split('?')
                .next()
                .unwrap_or("/")
                .to_string();

            let (status, content_type, body) = routes
                .iter()
                .find(|(p, ..)| *p == path)
                .map(|(_, s, c, b)| (*s, *c, *b))
                .unwrap_or((404, "text/html", "<html>not found</html>"));

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), requests)
}

fn config(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        area_id: "10000013".into(),
        timeout_secs: 5,
        detail_paths: vec!["api/a/detail".into(), "api/b/detail".into()],
        power_paths: vec!["api/a/power".into()],
        ssid: Some("s1".into()),
        admin_token: Some("t1".into()),
    }
}

#[tokio::test]
async fn test_falls_back_to_next_candidate() {
    let (base, requests) = spawn_stub(vec![
        ("/api/a/detail", 200, "text/html", "<html>login</html>"),
        ("/api/b/detail", 200, "application/json", r#"{"code": 1, "data": {"miner_online": 5}}"#),
    ])
    .await;

    let client = FboxClient::new(&config(base)).unwrap();
    let detail = assert_ok!(client.fetch_detail(290).await);
    assert_eq!(detail["data"]["miner_online"], 5);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].contains("area_id=10000013"));
    assert!(requests[1].contains("id=290"));
    assert!(requests[1].to_lowercase().contains("cookie: lang=en-us; language=en; ssid=s1; admin-token=t1"));
}

#[tokio::test]
async fn test_offline_response_is_returned() {
    let (base, _) = spawn_stub(vec![(
        "/api/a/detail",
        200,
        "application/json",
        r#"{"code": 0, "msg": "device offline"}"#,
    )])
    .await;

    let client = FboxClient::new(&config(base)).unwrap();
    let detail = assert_ok!(client.fetch_detail(291).await);
    assert_eq!(detail["code"], 0);
}

#[tokio::test]
async fn test_exhausted_lists_tried_endpoints() {
    let (base, requests) = spawn_stub(vec![(
        "/api/a/power",
        500,
        "application/json",
        r#"{"error": "boom"}"#,
    )])
    .await;

    let client = FboxClient::new(&config(base.clone())).unwrap();
    let err = client.fetch_power(290).await.unwrap_err();

    assert_eq!(err.tried(), &[format!("{}/api/a/power", base)]);
    match err {
        FetchError::Exhausted { last, .. } => {
            assert!(matches!(*last, FetchError::UnexpectedResponse { status: 500, .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(requests.lock().unwrap()[0].contains("fbox_id=290"));
}
