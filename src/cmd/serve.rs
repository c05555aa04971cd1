//! Kanban UI server command: `milo-kanban serve`.

use anyhow::Result;
use milo_kanban::board::server::{ServerConfig, start_server};

use crate::StoreArgs;

pub async fn cmd_serve(port: u16, open: bool, dev: bool, store: &StoreArgs) -> Result<()> {
    let service = super::build_service(store)?;

    // Spawn browser open before starting the server (which blocks)
    if open {
        let url = format!("http://localhost:{}", port);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!(error = %e, "failed to open browser");
            }
        });
    }

    start_server(
        ServerConfig {
            port,
            dev_mode: dev,
        },
        service,
    )
    .await
}
