use anyhow::{Context, Result};
#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;
use tracing::{error, info};
use tracing_subscriber::{filter, prelude::*, Layer};

use ranked_match_harvester::config::load_config;
use ranked_match_harvester::harvester::Harvester;
use ranked_match_harvester::riot::RiotClient;
use ranked_match_harvester::shutdown::Shutdown;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;

    std::panic::set_hook(Box::new(|i| {
        error!("Panic'd: {}", i);
    }));

    let file_appender = tracing_appender::rolling::daily(&config.log_path, "harvester.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter::LevelFilter::INFO))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(filter::filter_fn(|metadata| {
                    metadata.target().starts_with("ranked_match_harvester")
                })),
        )
        .init();

    info!(
        "Collecting {} {} on {} (batch of {}, {} matches per player)",
        config.tier.path_segment(),
        config.queue_type,
        config.platform,
        config.players_per_batch,
        config.matches_per_player
    );

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let source = RiotClient::new(&config).context("Failed to build the Riot client")?;
    let mut harvester = Harvester::new(config, source, shutdown);
    harvester.run().await
}
