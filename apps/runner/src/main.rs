mod config;
mod main_lib;

use config::Config;
use main_lib::{build_runtime, init_tracing, run_job};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let runtime = build_runtime(&config)?;

    // Ctrl-C stops new entities from starting; persisted work is kept.
    let cancel = runtime.orchestrator.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let report = run_job(&runtime, &config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
