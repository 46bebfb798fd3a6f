//! Cookie-only sessions: the whole payload travels in a signed cookie

use salvo::prelude::*;
use salvo_koa_session::{SessionConfig, SessionDepotExt, SessionHandler};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let views: i32 = session.get("views").unwrap_or(0);
    if let Err(e) = session.set("views", views + 1) {
        return format!("Failed to update session: {}", e);
    }

    format!("Hello! You have viewed this page {} time(s).", views + 1)
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    match session.set("user", &username) {
        Ok(()) => format!("User set to: {}", username),
        Err(e) => format!("Failed to update session: {}", e),
    }
}

#[handler]
async fn remember_me(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");

    // Kept across requests without setting it again
    session.set_max_age(std::time::Duration::from_secs(30 * 24 * 3600));

    "Session extended to 30 days"
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    depot.set_session(None);

    "Logged out successfully"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::new("your-super-secret-key-change-in-production")
        .with_max_age_secs(3600);

    let session_handler = SessionHandler::new(config).expect("valid session config");

    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("remember").get(remember_me))
        .push(Router::with_path("logout").get(logout));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /                 - View counter");
    println!("  GET /user             - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /remember         - Extend session lifetime");
    println!("  GET /logout           - Clear session");

    Server::new(acceptor).serve(router).await;
}
