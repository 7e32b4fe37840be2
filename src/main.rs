mod accounts;
mod admin;
mod app;
mod auth;
mod config;
mod error;
mod rides;
mod state;
mod store;
mod users;

use time::UtcOffset;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Only readable while the process is still single-threaded.
    let local_offset = UtcOffset::current_local_offset().ok();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(local_offset))
}

async fn run(local_offset: Option<UtcOffset>) -> anyhow::Result<()> {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "ridebook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init(local_offset).await?;
    tracing::info!(
        admin = %state.admin.email,
        report_offset = %state.config.report_offset,
        "state initialized"
    );

    app::serve(app::build_app(state)).await
}
