use axum::serve;
use dsefs_node::{init_tracing, router, AppConfig, AppState};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::new(config.clone())?;

    if let Some(mut notifications) = state.take_notifications() {
        tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                debug!(
                    message_id = %notification.message_id,
                    sender = %notification.sender_name,
                    unread = notification.unread_count,
                    "unread chat message"
                );
            }
        });
    }

    state.spawn_message_sync();

    let app = router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!(
        %local_addr,
        build_id = %config.build_id,
        data_dir = %config.data_dir.display(),
        "starting DSEFS dashboard service"
    );

    serve(listener, app).await?;
    Ok(())
}
