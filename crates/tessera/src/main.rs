//! Tessera server binary.
//!
//! Binds to `TESSERA_ADDR` (default `127.0.0.1:8080`) and runs until
//! terminated. Log verbosity follows `RUST_LOG`.

use tessera::{TesseraError, TesseraServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TesseraError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("TESSERA_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = TesseraServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "tessera listening");
    server.run().await
}
