use ledger_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(work_dir = %config.work_dir, "Ledger server starting...");

    // 2. Open storage and wire services
    let state = ServerState::initialize(&config)?;

    // 3. Serve until Ctrl+C (background tasks are started by Server::run)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e);
    }

    Ok(())
}
