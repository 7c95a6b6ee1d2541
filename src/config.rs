use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use riven::consts::{PlatformRoute, Queue, QueueType, RegionalRoute};

const REQUEST_DELAY: Duration = Duration::from_millis(500);
const BATCH_DELAY: Duration = Duration::from_secs(120);
const MATCH_ERROR_DELAY: Duration = Duration::from_secs(10);
const CYCLE_ERROR_DELAY: Duration = Duration::from_secs(30);
const PLAYERS_PER_BATCH: usize = 50;
const MATCHES_PER_PLAYER: u32 = 10;
const MAX_MATCH_RETRIES: u32 = 3;

/// Which apex league the leaderboard is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueTier {
    Challenger,
    Grandmaster,
    Master,
}

impl LeagueTier {
    /// Path segment used by league-v4, e.g. `masterleagues`.
    pub fn path_segment(self) -> &'static str {
        match self {
            LeagueTier::Challenger => "challengerleagues",
            LeagueTier::Grandmaster => "grandmasterleagues",
            LeagueTier::Master => "masterleagues",
        }
    }
}

/// How a player's match window is positioned on each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Page through history using the persisted per-player offset.
    Paged,
    /// Always request the newest window; cursors are never touched.
    Latest,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_token: String,
    pub platform: PlatformRoute,
    pub region: RegionalRoute,
    pub queue_type: QueueType,
    pub queue: Queue,
    pub tier: LeagueTier,
    pub request_delay: Duration,
    pub batch_delay: Duration,
    pub match_error_delay: Duration,
    pub cycle_error_delay: Duration,
    pub players_per_batch: usize,
    pub matches_per_player: u32,
    pub max_match_retries: u32,
    pub cursor_mode: CursorMode,
    pub processed_path: PathBuf,
    pub cursors_path: PathBuf,
    pub sink_path: PathBuf,
    pub archive_dir: Option<PathBuf>,
    pub log_path: PathBuf,
}

impl Config {
    /// Paged collection over the top of the master league.
    pub fn enhanced(riot_api_token: String) -> Self {
        Config {
            riot_api_token,
            platform: PlatformRoute::NA1,
            region: RegionalRoute::AMERICAS,
            queue_type: QueueType::RANKED_SOLO_5x5,
            queue: Queue::SUMMONERS_RIFT_5V5_RANKED_SOLO,
            tier: LeagueTier::Master,
            request_delay: REQUEST_DELAY,
            batch_delay: BATCH_DELAY,
            match_error_delay: MATCH_ERROR_DELAY,
            cycle_error_delay: CYCLE_ERROR_DELAY,
            players_per_batch: PLAYERS_PER_BATCH,
            matches_per_player: MATCHES_PER_PLAYER,
            max_match_retries: MAX_MATCH_RETRIES,
            cursor_mode: CursorMode::Paged,
            processed_path: PathBuf::from("processed_matches_new.json"),
            cursors_path: PathBuf::from("player_match_ranges_new.json"),
            sink_path: PathBuf::from("player_stats_new.csv"),
            archive_dir: None,
            log_path: PathBuf::from("."),
        }
    }

    /// Single-player smoke run that always reads the newest matches.
    pub fn baseline(riot_api_token: String) -> Self {
        Config {
            players_per_batch: 1,
            cursor_mode: CursorMode::Latest,
            processed_path: PathBuf::from("processed_matches.json"),
            sink_path: PathBuf::from("player_stats.csv"),
            ..Config::enhanced(riot_api_token)
        }
    }

    /// Host for platform-routed endpoints (league, summoner).
    pub fn platform_host(&self) -> String {
        format!(
            "https://{}.api.riotgames.com",
            self.platform.to_string().to_lowercase()
        )
    }

    /// Host for regional endpoints (match-v5).
    pub fn regional_host(&self) -> String {
        format!(
            "https://{}.api.riotgames.com",
            self.region.to_string().to_lowercase()
        )
    }
}

/// Builds the enhanced configuration, taking the API token and log directory
/// from the environment (a `.env` file is honoured).
pub fn load_config() -> Result<Config> {
    dotenv().ok();

    let riot_api_token = env::var("RIOT_API_TOKEN").context("Missing RIOT_API_TOKEN")?;

    let log_path_str = env::var("LOG_PATH").unwrap_or_else(|_| {
        if cfg!(target_os = "linux") {
            "/var/log/harvester"
        } else {
            "."
        }
        .to_string()
    });

    Ok(Config {
        log_path: PathBuf::from(log_path_str),
        ..Config::enhanced(riot_api_token)
    })
}
