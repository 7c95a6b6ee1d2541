use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Display;
use std::fs;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{Config, CursorMode};
use crate::cursor_store::CursorStore;
use crate::extract::extract;
use crate::models::{MatchRecord, ParticipantStatRow, PlayerEntry};
use crate::riot::{Fetch, MatchSource};
use crate::shutdown::Shutdown;
use crate::sink::CsvSink;

/// Counters for one pass over the leaderboard.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub players: usize,
    pub players_skipped: usize,
    pub matches_recorded: usize,
    pub matches_seen_before: usize,
    pub matches_deferred: usize,
    pub matches_failed: usize,
    pub rows_written: usize,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Recorded(usize),
    AlreadyProcessed,
    /// Detail fetch failed transiently; queued for the next cycle.
    Deferred,
    /// Payload malformed or rows could not be written.
    Failed,
}

/// The polling loop: leaderboard, players, match windows, matches, sleep.
pub struct Harvester<S> {
    config: Config,
    source: S,
    store: CursorStore,
    sink: CsvSink,
    processed: HashSet<String>,
    cursors: HashMap<String, u32>,
    retries: BTreeMap<String, u32>,
    shutdown: Shutdown,
}

impl<S: MatchSource + Send> Harvester<S> {
    pub fn new(config: Config, source: S, shutdown: Shutdown) -> Self {
        let store = CursorStore::new(&config.processed_path, &config.cursors_path);
        let sink = CsvSink::new(&config.sink_path);
        let processed = store.load();
        let cursors = match config.cursor_mode {
            CursorMode::Paged => store.load_cursors(),
            CursorMode::Latest => HashMap::new(),
        };
        info!(
            "Loaded {} processed matches and {} player cursors",
            processed.len(),
            cursors.len()
        );
        Harvester {
            config,
            source,
            store,
            sink,
            processed,
            cursors,
            retries: BTreeMap::new(),
            shutdown,
        }
    }

    pub fn processed(&self) -> &HashSet<String> {
        &self.processed
    }

    pub fn cursors(&self) -> &HashMap<String, u32> {
        &self.cursors
    }

    /// Runs until interrupted. Errors inside a cycle are logged and followed
    /// by a pause; they never end the loop.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting data collection into {}",
            self.sink.path().display()
        );
        while !self.shutdown.is_triggered() {
            match self.run_cycle().await {
                Ok(report) => {
                    self.persist();
                    info!(
                        "Completed batch: {:?}. Processed {} total matches.",
                        report,
                        self.processed.len()
                    );
                    if report.interrupted {
                        break;
                    }
                    info!(
                        "Sleeping {} seconds before next round...",
                        self.config.batch_delay.as_secs()
                    );
                    if self.shutdown.sleep(self.config.batch_delay).await {
                        break;
                    }
                }
                Err(e) => {
                    error!("Error in main loop: {:#}", e);
                    if self.shutdown.sleep(self.config.cycle_error_delay).await {
                        break;
                    }
                }
            }
        }
        info!("Stopping data collection...");
        self.persist();
        Ok(())
    }

    /// One pass: retry deferred matches, then walk the top of the leaderboard.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        self.retry_deferred(&mut report).await;
        if report.interrupted {
            return Ok(report);
        }

        let entries = match self.source.league_entries().await {
            Fetch::Success(entries) => entries,
            Fetch::Transient(e) => {
                warn!("Leaderboard unavailable: {}", e);
                Vec::new()
            }
            Fetch::Fatal(e) => return Err(anyhow!(e)).context("Failed to list players"),
        };
        info!("Fetched {} players", entries.len());

        let batch: Vec<PlayerEntry> = entries
            .into_iter()
            .take(self.config.players_per_batch)
            .collect();
        let total = batch.len();
        for (i, entry) in batch.iter().enumerate() {
            if self.shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            info!(
                "Processing player {}/{}: {}",
                i + 1,
                total,
                entry.display_name()
            );
            report.players += 1;
            self.process_player(entry, &mut report).await;
            if report.interrupted {
                break;
            }
        }
        Ok(report)
    }

    async fn retry_deferred(&mut self, report: &mut CycleReport) {
        let pending: Vec<String> = self.retries.keys().cloned().collect();
        if pending.is_empty() {
            return;
        }
        info!("Retrying {} deferred matches", pending.len());
        for match_id in pending {
            if self.shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            self.process_match(&match_id, report).await;
        }
    }

    /// Walks one window of a player's history. Failures on this player's
    /// calls skip the player or match and never abort the batch.
    async fn process_player(&mut self, entry: &PlayerEntry, report: &mut CycleReport) {
        let Some(puuid) = self.resolve_puuid(entry).await else {
            warn!("Could not get PUUID for {}", entry.display_name());
            report.players_skipped += 1;
            return;
        };

        let start = match self.config.cursor_mode {
            CursorMode::Paged => self.cursors.get(&puuid).copied().unwrap_or(0),
            CursorMode::Latest => 0,
        };
        let count = self.config.matches_per_player;
        let match_ids = match self.source.match_ids(&puuid, start, count).await {
            Fetch::Success(ids) => ids,
            Fetch::Transient(e) => {
                warn!("Could not list matches for {}: {}", entry.display_name(), e);
                Vec::new()
            }
            Fetch::Fatal(e) => {
                error!("Match list refused for {}: {}", entry.display_name(), e);
                Vec::new()
            }
        };
        if match_ids.is_empty() {
            info!("No more matches found for player {}", entry.display_name());
        }

        for match_id in &match_ids {
            if self.shutdown.is_triggered() {
                // Leave the cursor alone so the rest of this window is asked for again.
                report.interrupted = true;
                return;
            }
            self.process_match(match_id, report).await;
        }

        if self.config.cursor_mode == CursorMode::Paged {
            let next = start.saturating_add(count);
            self.cursors.insert(puuid, next);
            info!(
                "Updated player {} to start at match {}",
                entry.display_name(),
                next
            );
        }
    }

    async fn resolve_puuid(&mut self, entry: &PlayerEntry) -> Option<String> {
        if let Some(puuid) = entry.puuid.as_ref().filter(|p| !p.is_empty()) {
            return Some(puuid.clone());
        }
        let summoner_id = entry.summoner_id.as_deref()?;
        match self.source.puuid_for_summoner(summoner_id).await {
            Fetch::Success(puuid) => puuid,
            Fetch::Transient(e) => {
                warn!("API error getting PUUID: {}", e);
                None
            }
            Fetch::Fatal(e) => {
                error!("Summoner lookup refused for {}: {}", summoner_id, e);
                None
            }
        }
    }

    /// Fetches, extracts and records one match unless it was already recorded.
    pub async fn process_match(
        &mut self,
        match_id: &str,
        report: &mut CycleReport,
    ) -> MatchOutcome {
        if self.processed.contains(match_id) {
            info!("Match {} already processed, skipping...", match_id);
            self.retries.remove(match_id);
            report.matches_seen_before += 1;
            return MatchOutcome::AlreadyProcessed;
        }

        info!("Fetching match {}...", match_id);
        let payload = match self.source.match_detail(match_id).await {
            Fetch::Success(payload) => payload,
            Fetch::Transient(e) => {
                warn!("Failed to get match data for {}: {}", match_id, e);
                self.defer(match_id);
                report.matches_deferred += 1;
                return MatchOutcome::Deferred;
            }
            Fetch::Fatal(e) => {
                error!("Match {} refused: {}", match_id, e);
                self.defer(match_id);
                report.matches_deferred += 1;
                return MatchOutcome::Deferred;
            }
        };

        self.retries.remove(match_id);
        match self.record(match_id, &payload) {
            Ok(rows) => {
                self.processed.insert(match_id.to_string());
                report.matches_recorded += 1;
                report.rows_written += rows;
                self.shutdown.sleep(self.config.request_delay).await;
                MatchOutcome::Recorded(rows)
            }
            Err(e) => {
                error!("Error processing match {}: {:#}", match_id, e);
                report.matches_failed += 1;
                self.shutdown.sleep(self.config.match_error_delay).await;
                MatchOutcome::Failed
            }
        }
    }

    fn record(&self, match_id: &str, payload: &Value) -> Result<usize> {
        let record = MatchRecord::from_value(payload)?;
        let rows = extract(&record);
        let written = self.sink.append(&rows)?;

        info!("Extracted stats for {} players:", rows.len());
        for row in &rows {
            log_row(row);
        }
        if let Err(e) = self.archive(match_id, payload) {
            warn!("Could not archive match {}: {:#}", match_id, e);
        }
        Ok(written)
    }

    fn archive(&self, match_id: &str, payload: &Value) -> Result<()> {
        let Some(dir) = self.config.archive_dir.as_ref() else {
            return Ok(());
        };
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(format!("{}.json", match_id));
        let json = serde_json::to_string_pretty(payload)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn defer(&mut self, match_id: &str) {
        let attempts = self.retries.entry(match_id.to_string()).or_insert(0);
        *attempts += 1;
        if *attempts > self.config.max_match_retries {
            warn!(
                "Giving up on match {} after {} failed fetches",
                match_id, attempts
            );
            self.retries.remove(match_id);
        }
    }

    /// Best-effort write of both cursor files.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.processed) {
            error!("Failed to save processed matches: {:#}", e);
        }
        if self.config.cursor_mode == CursorMode::Paged {
            if let Err(e) = self.store.save_cursors(&self.cursors) {
                error!("Failed to save player cursors: {:#}", e);
            }
        }
    }
}

fn log_row(row: &ParticipantStatRow) {
    info!(
        "  {}: {} - {}/{}/{}",
        or_dash(&row.riot_id_game_name),
        or_dash(&row.champion_name),
        or_dash(&row.kills),
        or_dash(&row.deaths),
        or_dash(&row.assists)
    );
}

fn or_dash<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSource {
        entries: Vec<PlayerEntry>,
        league_fetch: Option<Fetch<Vec<PlayerEntry>>>,
        puuids: HashMap<String, String>,
        history: HashMap<String, Vec<String>>,
        details: HashMap<String, Value>,
        transient_details: HashMap<String, u32>,
        fatal_details: HashSet<String>,
        fatal_lookups: HashSet<String>,
        fatal_windows: HashSet<String>,
        detail_calls: Vec<String>,
        window_calls: Vec<(String, u32, u32)>,
        interrupt_after_detail: Option<Shutdown>,
    }

    #[async_trait]
    impl MatchSource for FakeSource {
        async fn league_entries(&mut self) -> Fetch<Vec<PlayerEntry>> {
            self.league_fetch
                .clone()
                .unwrap_or_else(|| Fetch::Success(self.entries.clone()))
        }

        async fn puuid_for_summoner(&mut self, summoner_id: &str) -> Fetch<Option<String>> {
            if self.fatal_lookups.contains(summoner_id) {
                return Fetch::Fatal("403".to_string());
            }
            Fetch::Success(self.puuids.get(summoner_id).cloned())
        }

        async fn match_ids(&mut self, puuid: &str, start: u32, count: u32) -> Fetch<Vec<String>> {
            self.window_calls.push((puuid.to_string(), start, count));
            if self.fatal_windows.contains(puuid) {
                return Fetch::Fatal("403".to_string());
            }
            let history = self.history.get(puuid).cloned().unwrap_or_default();
            Fetch::Success(
                history
                    .into_iter()
                    .skip(start as usize)
                    .take(count as usize)
                    .collect(),
            )
        }

        async fn match_detail(&mut self, match_id: &str) -> Fetch<Value> {
            self.detail_calls.push(match_id.to_string());
            if let Some(shutdown) = &self.interrupt_after_detail {
                shutdown.trigger();
            }
            if self.fatal_details.contains(match_id) {
                return Fetch::Fatal("key rejected".to_string());
            }
            if let Some(left) = self.transient_details.get_mut(match_id) {
                if *left > 0 {
                    *left -= 1;
                    return Fetch::Transient("429".to_string());
                }
            }
            match self.details.get(match_id) {
                Some(v) => Fetch::Success(v.clone()),
                None => Fetch::Transient("not found".to_string()),
            }
        }
    }

    fn test_config(dir: &Path) -> Config {
        Config {
            request_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            match_error_delay: Duration::ZERO,
            cycle_error_delay: Duration::ZERO,
            processed_path: dir.join("processed.json"),
            cursors_path: dir.join("cursors.json"),
            sink_path: dir.join("stats.csv"),
            ..Config::enhanced("test-token".to_string())
        }
    }

    fn entry(summoner_id: &str, name: &str) -> PlayerEntry {
        PlayerEntry {
            summoner_id: Some(summoner_id.to_string()),
            puuid: None,
            riot_id_game_name: Some(name.to_string()),
        }
    }

    fn match_payload(match_id: &str) -> Value {
        json!({
            "metadata": { "matchId": match_id },
            "info": {
                "gameDuration": 1700,
                "teams": [{ "teamId": 100 }, { "teamId": 200 }],
                "participants": [
                    { "teamId": 100, "participantId": 1, "championName": "Ahri" },
                    { "teamId": 200, "participantId": 2, "championName": "Zed" }
                ]
            }
        })
    }

    /// One player ("s-1" -> "p-1") with the given match history, all fetchable.
    fn single_player_source(history: &[&str]) -> FakeSource {
        let mut source = FakeSource {
            entries: vec![entry("s-1", "Alpha")],
            ..Default::default()
        };
        source.puuids.insert("s-1".to_string(), "p-1".to_string());
        source.history.insert(
            "p-1".to_string(),
            history.iter().map(|s| s.to_string()).collect(),
        );
        for id in history {
            source.details.insert(id.to_string(), match_payload(id));
        }
        source
    }

    fn csv_lines(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("stats.csv"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn records_new_matches_and_advances_cursor() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = single_player_source(&["NA1_1", "NA1_2"]);
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;

        assert_eq!(report.players, 1);
        assert_eq!(report.matches_recorded, 2);
        assert_eq!(report.rows_written, 4);
        assert!(harvester.processed().contains("NA1_1"));
        assert!(harvester.processed().contains("NA1_2"));
        // Two matches came back but the window was ten wide.
        assert_eq!(harvester.cursors().get("p-1"), Some(&10));
        assert_eq!(csv_lines(tmp.path()).len(), 1 + 4);
        Ok(())
    }

    #[tokio::test]
    async fn cursor_advances_by_window_even_when_nothing_comes_back() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = single_player_source(&[]);
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        harvester.run_cycle().await?;
        assert_eq!(harvester.cursors().get("p-1"), Some(&10));
        harvester.run_cycle().await?;
        assert_eq!(harvester.cursors().get("p-1"), Some(&20));
        assert_eq!(
            harvester.source.window_calls,
            vec![("p-1".to_string(), 0, 10), ("p-1".to_string(), 10, 10)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn processed_matches_are_never_fetched_again() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1", "NA1_2"]);
        // A second player whose history overlaps the first.
        source.entries.push(entry("s-2", "Beta"));
        source.puuids.insert("s-2".to_string(), "p-2".to_string());
        source
            .history
            .insert("p-2".to_string(), vec!["NA1_2".to_string()]);
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;

        assert_eq!(report.matches_recorded, 2);
        assert_eq!(report.matches_seen_before, 1);
        assert_eq!(harvester.source.detail_calls, vec!["NA1_1", "NA1_2"]);
        Ok(())
    }

    #[tokio::test]
    async fn processed_set_from_a_previous_run_is_honoured() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = CursorStore::new(
            tmp.path().join("processed.json"),
            tmp.path().join("cursors.json"),
        );
        store.save(&HashSet::from(["NA1_1".to_string()]))?;
        let source = single_player_source(&["NA1_1", "NA1_2"]);
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        harvester.run_cycle().await?;
        assert_eq!(harvester.source.detail_calls, vec!["NA1_2"]);
        Ok(())
    }

    #[tokio::test]
    async fn leaderboard_error_is_an_empty_cycle() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.league_fetch = Some(Fetch::Transient("503".to_string()));
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report, CycleReport::default());
        assert!(harvester.source.window_calls.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_key_fails_the_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = single_player_source(&["NA1_1"]);
        source.league_fetch = Some(Fetch::Fatal("403".to_string()));
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        assert!(harvester.run_cycle().await.is_err());
    }

    #[tokio::test]
    async fn unresolvable_player_is_skipped() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.entries.insert(0, entry("s-unknown", "Ghost"));
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.players, 2);
        assert_eq!(report.players_skipped, 1);
        assert_eq!(report.matches_recorded, 1);
        Ok(())
    }

    #[tokio::test]
    async fn leaderboard_puuid_skips_resolution() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.entries = vec![PlayerEntry {
            summoner_id: None,
            puuid: Some("p-1".to_string()),
            riot_id_game_name: None,
        }];
        source.puuids.clear();
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.matches_recorded, 1);
        Ok(())
    }

    #[tokio::test]
    async fn batch_is_truncated_to_players_per_batch() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&[]);
        for i in 2..=5 {
            source.entries.push(entry(&format!("s-{}", i), "Other"));
            source
                .puuids
                .insert(format!("s-{}", i), format!("p-{}", i));
        }
        let config = Config {
            players_per_batch: 3,
            ..test_config(tmp.path())
        };
        let mut harvester = Harvester::new(config, source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.players, 3);
        assert_eq!(harvester.source.window_calls.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_match_is_isolated_and_not_marked() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1", "NA1_BAD", "NA1_3"]);
        source
            .details
            .insert("NA1_BAD".to_string(), json!({ "metadata": { "matchId": "NA1_BAD" } }));
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.matches_recorded, 2);
        assert_eq!(report.matches_failed, 1);
        assert!(!harvester.processed().contains("NA1_BAD"));
        assert!(harvester.processed().contains("NA1_3"));

        // Malformed payloads are not queued for another attempt.
        harvester.run_cycle().await?;
        assert_eq!(
            harvester
                .source
                .detail_calls
                .iter()
                .filter(|id| *id == "NA1_BAD")
                .count(),
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn transient_detail_failure_is_retried_next_cycle() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.transient_details.insert("NA1_1".to_string(), 1);
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let first = harvester.run_cycle().await?;
        assert_eq!(first.matches_deferred, 1);
        assert!(harvester.processed().is_empty());
        assert_eq!(harvester.cursors().get("p-1"), Some(&10));

        let second = harvester.run_cycle().await?;
        assert_eq!(second.matches_recorded, 1);
        assert!(harvester.processed().contains("NA1_1"));
        Ok(())
    }

    #[tokio::test]
    async fn deferred_match_is_dropped_after_max_retries() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.transient_details.insert("NA1_1".to_string(), u32::MAX);
        let config = Config {
            max_match_retries: 2,
            ..test_config(tmp.path())
        };
        let mut harvester = Harvester::new(config, source, Shutdown::new());

        for _ in 0..5 {
            harvester.run_cycle().await?;
        }
        // First attempt plus two retries.
        assert_eq!(harvester.source.detail_calls.len(), 3);
        assert!(harvester.retries.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn refused_detail_is_deferred_and_the_cursor_still_advances() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.fatal_details.insert("NA1_1".to_string());
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.matches_deferred, 1);
        assert!(harvester.processed().is_empty());
        assert_eq!(harvester.cursors().get("p-1"), Some(&10));
        Ok(())
    }

    #[tokio::test]
    async fn refused_player_does_not_starve_the_rest_of_the_batch() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.fatal_details.insert("NA1_1".to_string());
        source.entries.push(entry("s-2", "Beta"));
        source.puuids.insert("s-2".to_string(), "p-2".to_string());
        source
            .history
            .insert("p-2".to_string(), vec!["NA1_2".to_string()]);
        source
            .details
            .insert("NA1_2".to_string(), match_payload("NA1_2"));
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        for _ in 0..5 {
            harvester.run_cycle().await?;
        }
        assert!(harvester.processed().contains("NA1_2"));
        assert!(!harvester.processed().contains("NA1_1"));
        assert_eq!(harvester.cursors().get("p-1"), Some(&50));
        assert_eq!(harvester.cursors().get("p-2"), Some(&50));
        // One attempt plus the default three retries, then the id is dropped.
        let refused = harvester
            .source
            .detail_calls
            .iter()
            .filter(|id| *id == "NA1_1")
            .count();
        assert_eq!(refused, 4);
        Ok(())
    }

    #[tokio::test]
    async fn refused_lookups_skip_only_that_player() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut source = single_player_source(&["NA1_1"]);
        source.entries.insert(0, entry("s-refused", "Ghost"));
        source.fatal_lookups.insert("s-refused".to_string());
        source.entries.insert(1, entry("s-3", "Gamma"));
        source.puuids.insert("s-3".to_string(), "p-3".to_string());
        source.fatal_windows.insert("p-3".to_string());
        let mut harvester = Harvester::new(test_config(tmp.path()), source, Shutdown::new());

        let report = harvester.run_cycle().await?;
        assert_eq!(report.players, 3);
        assert_eq!(report.players_skipped, 1);
        assert_eq!(report.matches_recorded, 1);
        // A refused window still moves the cursor along.
        assert_eq!(harvester.cursors().get("p-3"), Some(&10));
        Ok(())
    }

    #[tokio::test]
    async fn latest_mode_always_starts_at_zero_and_keeps_no_cursors() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = single_player_source(&["NA1_1"]);
        let config = Config {
            cursor_mode: CursorMode::Latest,
            ..test_config(tmp.path())
        };
        let mut harvester = Harvester::new(config, source, Shutdown::new());

        harvester.run_cycle().await?;
        harvester.run_cycle().await?;
        assert!(harvester.cursors().is_empty());
        assert!(harvester
            .source
            .window_calls
            .iter()
            .all(|(_, start, _)| *start == 0));
        assert_eq!(harvester.source.detail_calls, vec!["NA1_1"]);
        Ok(())
    }

    #[tokio::test]
    async fn interrupt_persists_progress_and_stops() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let shutdown = Shutdown::new();
        let mut source = single_player_source(&["NA1_1", "NA1_2"]);
        source.interrupt_after_detail = Some(shutdown.clone());
        let mut harvester = Harvester::new(test_config(tmp.path()), source, shutdown);

        harvester.run().await?;

        assert_eq!(harvester.source.detail_calls, vec!["NA1_1"]);
        let store = CursorStore::new(
            tmp.path().join("processed.json"),
            tmp.path().join("cursors.json"),
        );
        assert_eq!(store.load(), HashSet::from(["NA1_1".to_string()]));
        // The window was cut short, so the cursor stays put.
        assert!(store.load_cursors().is_empty());
        assert_eq!(csv_lines(tmp.path()).len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn raw_payloads_are_archived_when_configured() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = single_player_source(&["NA1_1"]);
        let config = Config {
            archive_dir: Some(tmp.path().join("matches")),
            ..test_config(tmp.path())
        };
        let mut harvester = Harvester::new(config, source, Shutdown::new());

        harvester.run_cycle().await?;
        let archived = fs::read_to_string(tmp.path().join("matches").join("NA1_1.json"))?;
        let value: Value = serde_json::from_str(&archived)?;
        assert_eq!(value, match_payload("NA1_1"));
        Ok(())
    }
}
