use std::sync::Arc;

use mock_server::{MockState, DEFAULT_TOKEN};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let token = std::env::var("MOCK_TOKEN").unwrap_or_else(|_| DEFAULT_TOKEN.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} (token {token})");
    let state: Arc<MockState> = MockState::new(token);
    mock_server::run_with_state(listener, state).await
}
