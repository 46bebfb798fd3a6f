//! Redis-backed sessions
//!
//! The payload lives in Redis; the client only holds an identifier, either
//! in the signed `koa.sess` cookie or, with `SESSION_HEADER` set, in that
//! request/response header.

use salvo::http::header::HeaderName;
use salvo::prelude::*;
use salvo_koa_session::{
    HeaderExternalKey, RedisStore, SessionConfig, SessionDepotExt, SessionHandler,
};

#[handler]
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "server": "rust", "status": "ok" }))
}

#[handler]
async fn get_session_info(depot: &mut Depot) -> Json<serde_json::Value> {
    let session = depot.session_mut().expect("Session not found");
    let info = serde_json::json!({
        "isNew": session.is_new(),
        "maxAgeMs": session.max_age().as_duration().map(|d| d.as_millis() as u64),
        "data": session.to_json(),
    });
    let key = depot
        .session_context()
        .and_then(|ctx| ctx.external_key())
        .map(str::to_string);

    Json(serde_json::json!({
        "server": "rust",
        "sessionId": key,
        "session": info
    }))
}

#[handler]
async fn counter(depot: &mut Depot) -> Json<serde_json::Value> {
    let session = depot.session_mut().expect("Session not found");

    let count: i32 = session.get("counter").unwrap_or(0);
    let updated = session
        .set("counter", count + 1)
        .and_then(|_| session.set("lastModifiedAt", chrono::Utc::now().to_rfc3339()));

    Json(serde_json::json!({
        "server": "rust",
        "counter": count + 1,
        "saved": updated.is_ok()
    }))
}

#[handler]
async fn set_max_age(req: &mut Request, depot: &mut Depot) -> Json<serde_json::Value> {
    let seconds: u64 = req.query::<u64>("seconds").unwrap_or(3600);
    let session = depot.session_mut().expect("Session not found");

    session.set_max_age(std::time::Duration::from_secs(seconds));

    Json(serde_json::json!({
        "server": "rust",
        "action": "set-max-age",
        "maxAgeSecs": seconds
    }))
}

#[handler]
async fn clear_session(depot: &mut Depot) -> Json<serde_json::Value> {
    depot.set_session(None);

    Json(serde_json::json!({ "server": "rust", "action": "clear" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    println!("Connecting to Redis at {}", redis_url);

    let store = RedisStore::from_url(&redis_url)
        .await
        .expect("Failed to connect to Redis");

    let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| "keyboard cat".to_string());

    let mut config = SessionConfig::new(&secret)
        .with_store(store)
        .with_prefix("rust-")
        .with_max_age_secs(86400);

    if let Ok(header) = std::env::var("SESSION_HEADER") {
        let header = HeaderName::try_from(header).expect("valid header name");
        config = config.with_external_key(HeaderExternalKey::new(header));
    }

    let session_handler = SessionHandler::new(config).expect("valid session config");

    let router = Router::new()
        .push(Router::with_path("health").get(health))
        .push(
            Router::new()
                .hoop(session_handler)
                .get(get_session_info)
                .push(Router::with_path("counter").get(counter))
                .push(Router::with_path("max-age").get(set_max_age))
                .push(Router::with_path("clear").get(clear_session)),
        );

    let port = std::env::var("PORT").unwrap_or_else(|_| "5800".to_string());
    let addr = format!("127.0.0.1:{}", port);

    let acceptor = TcpListener::new(addr.clone()).bind().await;
    println!("Server running at http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  GET /health              - Health check (no session)");
    println!("  GET /                    - Session info");
    println!("  GET /counter             - Increment counter");
    println!("  GET /max-age?seconds=60  - Change session lifetime");
    println!("  GET /clear               - Destroy session");

    Server::new(acceptor).serve(router).await;
}
