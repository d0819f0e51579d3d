use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use service::counter::FileCounterStore;
use tokio::net::TcpListener;
use uuid::Uuid;

use server::startup::build_app;

struct TestApp {
    base_url: String,
    data_dir: std::path::PathBuf,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join("server-e2e").join(Uuid::new_v4().to_string());
    let store = Arc::new(FileCounterStore::new(data_dir.join("clicks.json")));
    let app = build_app(store);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, data_dir })
}

#[tokio::test]
async fn e2e_click_flow_over_http() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let res = c.get(format!("{}/api/clicks", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["totalClicks"], 0);

    let res = c.post(format!("{}/api/clicks", app.base_url))
        .json(&json!({"clicks": 5}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["totalClicks"], 5);
    assert_eq!(body["success"], true);

    let res = c.post(format!("{}/api/clicks", app.base_url)).send().await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["totalClicks"], 6);

    let _ = tokio::fs::remove_dir_all(&app.data_dir).await;
    Ok(())
}

#[tokio::test]
async fn e2e_concurrent_posts_all_count() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let c = c.clone();
            let url = format!("{}/api/clicks", app.base_url);
            tokio::spawn(async move { c.post(url).json(&json!({"clicks": 1})).send().await })
        })
        .collect();
    for t in tasks {
        assert_eq!(t.await??.status(), HttpStatusCode::OK);
    }

    let body = c.get(format!("{}/api/clicks", app.base_url))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["totalClicks"], 20);

    let _ = tokio::fs::remove_dir_all(&app.data_dir).await;
    Ok(())
}
