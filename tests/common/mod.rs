use serde_json::{Map, Value};
use session_fernet::{CookieConfiguration, Fernet, SessionLayer, SessionMiddleware, serve};
use tokio::net::TcpListener;

pub const COOKIE_NAME: &str = "session";

pub fn value_default() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("value".to_string(), Value::from(0));
    data
}

pub async fn spawn_server(key: &str, cookie: CookieConfiguration) -> u16 {
    spawn_server_with_limit(key, cookie, 64).await
}

pub async fn spawn_server_with_limit(
    key: &str,
    cookie: CookieConfiguration,
    concurrency_limit: usize,
) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let middleware = SessionMiddleware::new(key, cookie)
        .unwrap()
        .with_default_value(value_default());

    tokio::spawn(async move {
        let _ = serve(listener, SessionLayer::new(middleware), concurrency_limit).await;
    });

    port
}

pub async fn spawn_default_server(max_age: u64) -> u16 {
    spawn_server(
        &Fernet::generate_key(),
        CookieConfiguration::default().with_max_age(max_age),
    )
    .await
}

/// Returns the `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(resp: &reqwest::Response) -> String {
    let set_cookie = resp
        .headers()
        .get("set-cookie")
        .expect("response sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn get(
    client: &reqwest::Client,
    port: u16,
    path: &str,
    cookie: Option<&str>,
) -> reqwest::Response {
    let mut req = client.get(format!("http://127.0.0.1:{port}{path}"));
    if let Some(cookie) = cookie {
        req = req.header("Cookie", cookie);
    }
    req.send().await.unwrap()
}

pub async fn read_value(client: &reqwest::Client, port: u16, cookie: Option<&str>) -> Value {
    let resp = get(client, port, "/read_session", cookie).await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(&resp.bytes().await.unwrap()).unwrap();
    body["value"].clone()
}
