use keyrace::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), KeyraceError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("KEYRACE_BIND")
        .unwrap_or_else(|_| "127.0.0.1:4000".to_string());

    let server = KeyraceServer::builder().bind(&bind).build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "keyrace listening");
    }
    server.run().await
}
