//! Integration tests for the crawler
//!
//! These tests drive the crawl controller against a scripted in-memory site
//! and check the full crawl cycle end-to-end on a paused clock.

use async_trait::async_trait;
use match_harvest::browser::{Driver, DriverError, Launcher};
use match_harvest::config::Config;
use match_harvest::crawler::{CrawlController, CrawlEvent, EventLog};
use match_harvest::output::OutputStore;
use match_harvest::state::{MatchId, StopReason};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const ROOT: &str = "https://www.hltv.org";

#[derive(Default)]
struct SiteState {
    pages: HashMap<String, String>,
    failures: HashMap<String, VecDeque<DriverError>>,
    cancel_on: Option<(String, CancellationToken)>,
    visits: Vec<String>,
    launches: u32,
    quits: u32,
    current: Option<String>,
}

/// A fake site served through the browser seam
#[derive(Clone, Default)]
struct ScriptedSite {
    state: Arc<Mutex<SiteState>>,
}

impl ScriptedSite {
    fn page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    fn listing(self, offset: u64, ids: &[u32]) -> Self {
        let links: String = ids
            .iter()
            .map(|id| {
                // Every match is linked twice, like the real listing does
                format!(
                    r#"<div class="result-con"><a href="/matches/{id}/a-vs-b">A vs B</a></div>
                       <a href="/matches/{id}/a-vs-b"><span>score</span></a>"#
                )
            })
            .collect();
        self.page(
            &format!("{ROOT}/results?offset={offset}"),
            &format!("<html><body>{links}</body></html>"),
        )
    }

    fn no_results(self, offset: u64) -> Self {
        self.page(
            &format!("{ROOT}/results?offset={offset}"),
            r#"<html><body><div class="results-none">No results</div></body></html>"#,
        )
    }

    fn overview_without_stats(self, id: u32) -> Self {
        self.page(
            &format!("{ROOT}/matches/{id}/x"),
            r#"<html><body><div class="match-page">Stats not available yet</div></body></html>"#,
        )
    }

    fn full_match(self, id: u32) -> Self {
        self.page(
            &format!("{ROOT}/matches/{id}/x"),
            &format!(
                r#"<html><body><a class="results-stats" href="/stats/matches/mapstatsid/{id}/x">Detailed stats</a></body></html>"#
            ),
        )
        .page(&format!("{ROOT}/stats/matches/mapstatsid/{id}/x"), STATS_PAGE)
    }

    fn fail(&self, url: &str, error: DriverError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(url.to_string())
            .or_default()
            .push_back(error);
    }

    fn cancel_on(&self, url: &str, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on = Some((url.to_string(), token));
    }

    fn visits_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .visits
            .iter()
            .filter(|v| *v == url)
            .count()
    }

    fn launches(&self) -> u32 {
        self.state.lock().unwrap().launches
    }

    fn quits(&self) -> u32 {
        self.state.lock().unwrap().quits
    }
}

#[async_trait]
impl Launcher for ScriptedSite {
    async fn launch(&self) -> Result<Box<dyn Driver>, DriverError> {
        self.state.lock().unwrap().launches += 1;
        Ok(Box::new(ScriptedDriver {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedDriver {
    state: Arc<Mutex<SiteState>>,
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());

        if let Some(error) = state.failures.get_mut(url).and_then(|f| f.pop_front()) {
            return Err(error);
        }
        if let Some((trigger, token)) = &state.cancel_on {
            if trigger == url {
                token.cancel();
            }
        }

        state.current = Some(url.to_string());
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .current
            .as_ref()
            .and_then(|url| state.pages.get(url))
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingLog {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingLog {
    fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

impl EventLog for RecordingLog {
    fn record(&self, event: &CrawlEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

const STATS_PAGE: &str = r#"<html><body>
<table class="stats-table totalstats">
  <thead><tr><th>Alpha</th><th>K (hs)</th><th>A (f)</th><th>KAST</th><th>K-D Diff</th></tr></thead>
  <tbody>
    <tr><td>alpha1</td><td>24 (12)</td><td>3 (1)</td><td>78.3%</td><td>+7</td></tr>
    <tr><td>alpha2</td><td>19 (8)</td><td>5 (0)</td><td>73.9%</td><td>+2</td></tr>
    <tr><td>alpha3</td><td>17 (9)</td><td>4 (2)</td><td>69.6%</td><td>-1</td></tr>
    <tr><td>alpha4</td><td>15 (5)</td><td>6 (1)</td><td>65.2%</td><td>-3</td></tr>
    <tr><td>alpha5</td><td>12 (3)</td><td>2 (0)</td><td>60.9%</td><td>-5</td></tr>
  </tbody>
</table>
<table class="stats-table ctstats"><thead><tr><th>Alpha</th><th>K</th></tr></thead></table>
<table class="stats-table tstats"><thead><tr><th>Alpha</th><th>K</th></tr></thead></table>
<table class="stats-table totalstats">
  <thead><tr><th>Beta</th><th>K (hs)</th><th>A (f)</th><th>KAST</th><th>K-D Diff</th></tr></thead>
  <tbody>
    <tr><td>beta1</td><td>21 (10)</td><td>2 (0)</td><td>72.0%</td><td>+1</td></tr>
    <tr><td>beta2</td><td>18 (7)</td><td>4 (1)</td><td>68.0%</td><td>0</td></tr>
    <tr><td>beta3</td><td>16 (6)</td><td>3 (0)</td><td>64.0%</td><td>-2</td></tr>
    <tr><td>beta4</td><td>14 (4)</td><td>5 (2)</td><td>60.0%</td><td>-4</td></tr>
    <tr><td>beta5</td><td>10 (2)</td><td>1 (0)</td><td>52.0%</td><td>-8</td></tr>
  </tbody>
</table>
</body></html>"#;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.directory = dir.path().display().to_string();
    config
}

fn controller(
    config: Config,
    site: &ScriptedSite,
    log: &Arc<RecordingLog>,
    cancel: CancellationToken,
) -> CrawlController {
    CrawlController::new(config, Box::new(site.clone()), log.clone(), cancel)
        .expect("Failed to create controller")
}

fn record_exists(dir: &TempDir, id: u32) -> bool {
    dir.path().join(format!("match_{}.csv", id)).exists()
}

#[tokio::test(start_paused = true)]
async fn test_full_crawl_until_listing_exhausted() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default()
        .listing(0, &[101, 102])
        .listing(100, &[103])
        .no_results(200)
        .full_match(101)
        .full_match(102)
        .full_match(103);
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::ListingExhausted);
    assert_eq!(summary.saved, 3);
    assert_eq!(summary.total_on_disk, 3);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.final_offset, 200);
    assert_eq!(site.quits(), 1);

    // Duplicate anchors on the listing still mean one fetch per match
    assert_eq!(site.visits_to(&format!("{ROOT}/matches/101/x")), 1);

    let content = std::fs::read_to_string(dir.path().join("match_101.csv")).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("players,K (hs),A (f),KAST,K-D Diff,team")
    );
    assert_eq!(lines.clone().count(), 10);
    assert_eq!(
        lines.next(),
        Some("alpha1,24 (12),3 (1),78.3%,+7,Alpha")
    );
    assert!(content.contains("beta5,10 (2),1 (0),52.0%,-8,Beta"));
}

#[tokio::test(start_paused = true)]
async fn test_rerun_never_refetches_completed_matches() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("match_201.csv"), "players,team\nx,Alpha\n").unwrap();
    std::fs::write(dir.path().join("match_202.csv"), "players,team\ny,Beta\n").unwrap();

    let site = ScriptedSite::default()
        .listing(0, &[201, 202, 203])
        .no_results(100)
        .full_match(201)
        .full_match(202)
        .full_match(203);
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(site.visits_to(&format!("{ROOT}/matches/201/x")), 0);
    assert_eq!(site.visits_to(&format!("{ROOT}/matches/202/x")), 0);
    assert_eq!(site.visits_to(&format!("{ROOT}/matches/203/x")), 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.total_on_disk, 3);

    // Existing records are left untouched
    let kept = std::fs::read_to_string(dir.path().join("match_201.csv")).unwrap();
    assert_eq!(kept, "players,team\nx,Alpha\n");
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_empty_pages_stop_exactly_once() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default().page(
        &format!("{ROOT}/results?offset=0"),
        "<html><body><div class=\"results-holder\"></div></body></html>",
    );
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::TooManyConsecutiveEmptyPages);
    assert_eq!(
        log.count(|e| matches!(
            e,
            CrawlEvent::EmptyPage {
                exhausted: false,
                ..
            }
        )),
        3
    );
    assert_eq!(log.count(|e| matches!(e, CrawlEvent::Stopped { .. })), 1);
    assert_eq!(log.count(|e| matches!(e, CrawlEvent::Finished(_))), 1);
    assert_eq!(site.quits(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_mid_loop_closes_session_once() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default()
        .listing(0, &[301, 302, 303])
        .full_match(301)
        .full_match(302)
        .full_match(303);
    let cancel = CancellationToken::new();
    // Ctrl-C arrives while the second match is loading
    site.cancel_on(&format!("{ROOT}/matches/302/x"), cancel.clone());
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, cancel)
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::UserInterrupt);
    assert_eq!(site.quits(), 1);
    // The navigation in flight completes, the next match is never started
    assert!(record_exists(&dir, 301));
    assert!(record_exists(&dir, 302));
    assert!(!record_exists(&dir, 303));
    assert_eq!(site.visits_to(&format!("{ROOT}/matches/303/x")), 0);
}

#[tokio::test(start_paused = true)]
async fn test_target_count_reached() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("match_400.csv"), "players,team\n").unwrap();

    let mut config = test_config(&dir);
    config.crawl.target_matches = Some(3);
    let site = ScriptedSite::default()
        .listing(0, &[401, 402, 403, 404])
        .full_match(401)
        .full_match(402)
        .full_match(403)
        .full_match(404);
    let log = Arc::new(RecordingLog::default());

    let summary = controller(config, &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::TargetCountReached);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.total_on_disk, 3);
    assert!(!record_exists(&dir, 403));
}

#[tokio::test(start_paused = true)]
async fn test_missing_stats_link_is_skipped() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default()
        .listing(0, &[501, 502])
        .no_results(100)
        .overview_without_stats(501)
        .full_match(502);
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::ListingExhausted);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.saved, 1);
    assert!(!record_exists(&dir, 501));
    assert!(record_exists(&dir, 502));
    assert_eq!(
        log.count(|e| matches!(e, CrawlEvent::MatchFailed { id, .. } if *id == MatchId::from("501"))),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_dead_session_is_restarted_and_crawl_continues() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default()
        .listing(0, &[601, 602])
        .no_results(100)
        .full_match(601)
        .full_match(602);
    site.fail(
        &format!("{ROOT}/matches/602/x"),
        DriverError::SessionInvalid("invalid session id".into()),
    );
    let log = Arc::new(RecordingLog::default());

    let summary = controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::ListingExhausted);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.restarts, 1);
    assert_eq!(site.launches(), 2);
    // One quit for the restart, one at teardown
    assert_eq!(site.quits(), 2);
    assert_eq!(
        log.count(|e| matches!(e, CrawlEvent::SessionRestarting { .. })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_listing_counts_as_empty_page() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.crawl.consecutive_failure_threshold = 1;

    let site = ScriptedSite::default().listing(0, &[701]).full_match(701);
    let listing_url = format!("{ROOT}/results?offset=0");
    for _ in 0..3 {
        site.fail(
            &listing_url,
            DriverError::Network("net::ERR_INTERNET_DISCONNECTED".into()),
        );
    }
    let log = Arc::new(RecordingLog::default());

    let start = tokio::time::Instant::now();
    let summary = controller(config, &site, &log, CancellationToken::new())
        .run()
        .await;

    assert_eq!(summary.stop_reason, StopReason::TooManyConsecutiveEmptyPages);
    assert_eq!(site.visits_to(&listing_url), 3);
    assert_eq!(
        log.count(|e| matches!(e, CrawlEvent::AttemptFailed { .. })),
        3
    );
    // 2s after opening the site root, then 5s and 10s of backoff
    assert_eq!(start.elapsed(), std::time::Duration::from_secs(17));
    assert!(!record_exists(&dir, 701));
}

#[tokio::test(start_paused = true)]
async fn test_output_store_reports_records_written_by_crawl() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::default()
        .listing(0, &[801])
        .no_results(100)
        .full_match(801);
    let log = Arc::new(RecordingLog::default());

    controller(test_config(&dir), &site, &log, CancellationToken::new())
        .run()
        .await;

    let store = OutputStore::new(dir.path()).unwrap();
    let ids = store.completed_ids().unwrap();
    assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![MatchId::from("801")]);
}
