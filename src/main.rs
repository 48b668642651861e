use clap::Parser;
use std::path::PathBuf;

/// Dashboard synthesis and query validation tool server.
#[derive(Debug, Parser)]
#[command(name = "dashboard-synth", version)]
struct Cli {
    /// Directory holding the engine's state database and logs.
    #[arg(long, env = "DASHBOARD_SYNTH_STATE_DIR", default_value = ".dashboard-synth")]
    state_dir: PathBuf,

    /// SQLite copy of the PSA reporting database to run reports against.
    #[arg(long, env = "DASHBOARD_SYNTH_SOURCE_DB")]
    source_db: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dashboard_synth_lib::run(&cli.state_dir, &cli.source_db).await?;
    Ok(())
}
