//! `/analyze` over real HTTP, in mock mode.

use serde_json::{json, Value};

use sitegrade::api::{self, AppState};
use sitegrade::config::AppConfig;
use sitegrade::lifecycle;

async fn spawn_app() -> String {
    let analyzer = lifecycle::build_analyzer(&AppConfig::default()).unwrap();
    let state = AppState::new(analyzer, 5);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(api::serve(listener, state, std::future::pending()));
    format!("http://{}", addr)
}

async fn post(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn analyzes_target_and_competitors() {
    let base = spawn_app().await;
    let (status, body) = post(
        &base,
        json!({
            "targetUrl": "mysite.example",
            "competitorUrls": ["https://rival.example", "ftp://dropped.example"]
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body["analyzedAt"].as_str().unwrap().contains('T'));
    assert_eq!(
        body["weights"],
        json!({"seo": 20, "mobile": 20, "performance": 25, "security": 15, "uiux": 20})
    );

    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0]["url"], "https://mysite.example/");
    assert_eq!(sites[1]["url"], "https://rival.example/");
    for site in sites {
        assert_eq!(site["source"], "static");
        assert!(site.get("error").is_none());
        let overall = site["scores"]["overall"].as_u64().unwrap();
        assert!(overall <= 100);
        assert!(site["fixesTop3"].as_array().unwrap().len() <= 3);
        assert!(site["details"]["security"]["securityHeaderFlags"].is_object());
    }
}

#[tokio::test]
async fn rejects_missing_target() {
    let base = spawn_app().await;
    let (status, body) = post(&base, json!({ "competitorUrls": ["https://a.example"] })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "targetUrl is required");

    let (status, _) = post(&base, json!({ "targetUrl": "" })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn rejects_when_no_url_is_valid() {
    let base = spawn_app().await;
    let (status, body) = post(&base, json!({ "targetUrl": "ftp://files.example" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No valid URLs to analyze");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let base = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{}/analyze", base))
        .header("content-type", "application/json")
        .body("{\"targetUrl\":")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn usage_and_health() {
    let base = spawn_app().await;

    let usage: Value = reqwest::get(format!("{}/analyze", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(usage["endpoint"], "POST /analyze");

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({ "status": "ok", "mode": "mock" }));
}
