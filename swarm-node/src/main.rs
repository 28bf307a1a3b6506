use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use swarm_node::{build_swarm, cli::Args, setup::ensure_config, SwarmConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Arguments and config
    let args = Args::parse();
    let generated = !args.config.exists();
    ensure_config(&args.config)?;
    let mut config = SwarmConfig::load_from_file(&args.config)?;
    args.apply(&mut config);

    // 2. Logging: stdout for everything but the consensus audit trail,
    //    which goes to <log_folder>/consensus.log.
    let (consensus_layer, _guard) = match &config.log_folder {
        Some(folder) => {
            std::fs::create_dir_all(folder)?;
            let file_appender = tracing_appender::rolling::never(folder, "consensus.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
                    metadata.target() == "consensus"
                }));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swarm_node=debug".into()),
        )
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() != "consensus"
        }));

    tracing_subscriber::registry()
        .with(consensus_layer)
        .with(stdout_layer)
        .init();

    info!("--- SWARM TOKEN CENSUS ---");
    if generated {
        info!("📝 Default config written to {}", args.config.display());
    }
    info!("Config: {}", args.config.display());
    info!(
        "Robots: {} ({} compromised, f = {}), tokens: {}, seed: {}",
        config.num_robots,
        config.num_compromised,
        config.max_faulty(),
        config.num_tokens,
        config.seed
    );

    // 3. Build and run
    let maestro = match build_swarm(&config).await {
        Ok(maestro) => maestro,
        Err(e) => {
            error!("❌ Startup failed: {}", e);
            return Err(e.into());
        }
    };

    let audit = maestro.run().await?;
    if let Some(summary) = audit.summaries.last() {
        info!("✅ Coverage ratio: {:.3}", summary.coverage_ratio);
    }

    Ok(())
}
