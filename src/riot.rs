use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{LeagueList, PlayerEntry, Summoner};

/// Outcome of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Success(T),
    /// Worth trying again later: rate limits, 5xx, error payloads, bad JSON.
    Transient(String),
    /// The request was refused (401/403). Callers decide whether that ends
    /// the cycle or only skips the item.
    Fatal(String),
}

impl<T> Fetch<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetch<U> {
        match self {
            Fetch::Success(t) => Fetch::Success(f(t)),
            Fetch::Transient(e) => Fetch::Transient(e),
            Fetch::Fatal(e) => Fetch::Fatal(e),
        }
    }
}

/// The four match-history endpoints the harvester needs.
#[async_trait]
pub trait MatchSource {
    async fn league_entries(&mut self) -> Fetch<Vec<PlayerEntry>>;
    async fn puuid_for_summoner(&mut self, summoner_id: &str) -> Fetch<Option<String>>;
    async fn match_ids(&mut self, puuid: &str, start: u32, count: u32) -> Fetch<Vec<String>>;
    async fn match_detail(&mut self, match_id: &str) -> Fetch<Value>;
}

pub struct RiotClient {
    http: reqwest::Client,
    token: String,
    platform_host: String,
    regional_host: String,
    league_path: String,
    queue_id: u16,
    throttle: Option<Interval>,
}

impl RiotClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        let throttle = if config.request_delay.is_zero() {
            None
        } else {
            let mut interval = time::interval(config.request_delay);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        };
        Ok(RiotClient {
            http,
            token: config.riot_api_token.clone(),
            platform_host: config.platform_host(),
            regional_host: config.regional_host(),
            league_path: format!(
                "/lol/league/v4/{}/by-queue/{}",
                config.tier.path_segment(),
                config.queue_type
            ),
            queue_id: u16::from(config.queue),
            throttle,
        })
    }

    async fn get_json(&mut self, url: &str) -> Fetch<Value> {
        if let Some(throttle) = self.throttle.as_mut() {
            throttle.tick().await;
        }
        debug!("GET {}", url);

        let response = match self
            .http
            .get(url)
            .header("X-Riot-Token", &self.token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Fetch::Transient(format!("Request failed: {}", e)),
        };

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Fetch::Transient(format!("Failed to read body: {}", e)),
        };
        classify(status, retry_after.as_deref(), &body)
    }
}

/// Sorts a raw HTTP reply into success, transient or fatal.
fn classify(status: http::StatusCode, retry_after: Option<&str>, body: &str) -> Fetch<Value> {
    match status {
        http::StatusCode::UNAUTHORIZED | http::StatusCode::FORBIDDEN => {
            return Fetch::Fatal(format!("Request refused ({})", status));
        }
        http::StatusCode::TOO_MANY_REQUESTS => {
            return Fetch::Transient(format!(
                "Rate limited, retry after {} seconds",
                retry_after.unwrap_or("?")
            ));
        }
        _ => {}
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return Fetch::Transient(format!("Malformed JSON ({}): {}", status, e)),
    };
    // Riot reports errors in-band as {"status": {"status_code": .., "message": ..}}.
    if let Some(err) = value.get("status") {
        return Fetch::Transient(format!("API error: {}", err));
    }
    if !status.is_success() {
        return Fetch::Transient(format!("Unexpected status {}", status));
    }
    Fetch::Success(value)
}

fn decode<T: serde::de::DeserializeOwned>(fetched: Fetch<Value>, what: &str) -> Fetch<T> {
    match fetched {
        Fetch::Success(value) => match serde_json::from_value(value) {
            Ok(t) => Fetch::Success(t),
            Err(e) => Fetch::Transient(format!("Unexpected {} payload: {}", what, e)),
        },
        Fetch::Transient(e) => Fetch::Transient(e),
        Fetch::Fatal(e) => Fetch::Fatal(e),
    }
}

#[async_trait]
impl MatchSource for RiotClient {
    async fn league_entries(&mut self) -> Fetch<Vec<PlayerEntry>> {
        let url = format!("{}{}", self.platform_host, self.league_path);
        let fetched = self.get_json(&url).await;
        decode::<LeagueList>(fetched, "league").map(|list| list.entries)
    }

    async fn puuid_for_summoner(&mut self, summoner_id: &str) -> Fetch<Option<String>> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/{}",
            self.platform_host, summoner_id
        );
        let fetched = self.get_json(&url).await;
        decode::<Summoner>(fetched, "summoner").map(|s| s.puuid)
    }

    async fn match_ids(&mut self, puuid: &str, start: u32, count: u32) -> Fetch<Vec<String>> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}&queue={}",
            self.regional_host, puuid, start, count, self.queue_id
        );
        let fetched = self.get_json(&url).await;
        decode(fetched, "match id list")
    }

    async fn match_detail(&mut self, match_id: &str) -> Fetch<Value> {
        let url = format!("{}/lol/match/v5/matches/{}", self.regional_host, match_id);
        let fetched = self.get_json(&url).await;
        if let Fetch::Success(Value::Null) = fetched {
            warn!("Match {} came back empty", match_id);
            return Fetch::Transient(format!("Empty payload for {}", match_id));
        }
        fetched
    }
}
