use crate::config::Settings;
use crate::domain::player::{Fixture, TeamSnapshot};
use crate::error::CaptainError;
use crate::fpl::mapper;
use crate::fpl::types::{BootstrapStatic, Entry, EntryPicks, Event, RawFixture};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";
const FALLBACK_GAMEWEEK: u32 = 1;
const ERROR_BODY_PREVIEW: usize = 200;

/// The four read-only resources of the sports-data API.
#[async_trait::async_trait]
pub trait FplSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn bootstrap_static(&self) -> Result<BootstrapStatic, CaptainError>;

    async fn entry(&self, team_id: u64) -> Result<Entry, CaptainError>;

    async fn entry_picks(&self, team_id: u64, gameweek: u32) -> Result<EntryPicks, CaptainError>;

    async fn fixtures(&self) -> Result<Vec<RawFixture>, CaptainError>;
}

#[derive(Debug, Clone)]
pub struct HttpFplSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFplSource {
    pub fn from_settings(settings: &Settings) -> Result<Self, CaptainError> {
        let timeout_secs = settings.fpl_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let user_agent = settings
            .fpl_user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(CaptainError::HttpClient)?;

        Ok(Self {
            http,
            base_url: settings.fpl_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CaptainError> {
        let res = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| CaptainError::upstream(path, e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| CaptainError::upstream(path, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(CaptainError::upstream(
                path,
                format!("status={status} body={preview}"),
            ));
        }

        serde_json::from_str::<T>(&text).map_err(|e| CaptainError::payload(path, e))
    }
}

#[async_trait::async_trait]
impl FplSource for HttpFplSource {
    fn source_name(&self) -> &'static str {
        "fpl_http"
    }

    async fn bootstrap_static(&self) -> Result<BootstrapStatic, CaptainError> {
        self.get_json("/bootstrap-static/").await
    }

    async fn entry(&self, team_id: u64) -> Result<Entry, CaptainError> {
        self.get_json(&format!("/entry/{team_id}/")).await
    }

    async fn entry_picks(&self, team_id: u64, gameweek: u32) -> Result<EntryPicks, CaptainError> {
        self.get_json(&format!("/entry/{team_id}/event/{gameweek}/picks/"))
            .await
    }

    async fn fixtures(&self) -> Result<Vec<RawFixture>, CaptainError> {
        self.get_json("/fixtures/").await
    }
}

/// Typed accessors over an [`FplSource`], caching the catalog and the fixture
/// list for the lifetime of the client.
///
/// The fixture cache holds the unfiltered upstream list so every forward
/// window is answered from the same snapshot.
pub struct FplClient {
    source: Arc<dyn FplSource>,
    catalog: Mutex<Option<Arc<BootstrapStatic>>>,
    fixtures: Mutex<Option<Arc<Vec<RawFixture>>>>,
}

impl std::fmt::Debug for FplClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FplClient")
            .field("source", &self.source.source_name())
            .finish_non_exhaustive()
    }
}

impl FplClient {
    pub fn new(source: Arc<dyn FplSource>) -> Self {
        Self {
            source,
            catalog: Mutex::new(None),
            fixtures: Mutex::new(None),
        }
    }

    pub async fn fetch_catalog(&self) -> Result<Arc<BootstrapStatic>, CaptainError> {
        let mut guard = self.catalog.lock().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let catalog = Arc::new(self.source.bootstrap_static().await?);
        tracing::debug!(
            players = catalog.elements.len(),
            teams = catalog.teams.len(),
            events = catalog.events.len(),
            "fetched bootstrap catalog"
        );
        *guard = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub async fn current_gameweek(&self) -> Result<u32, CaptainError> {
        let catalog = self.fetch_catalog().await?;
        Ok(resolve_current_gameweek(&catalog.events))
    }

    pub async fn fetch_team_snapshot(&self, team_id: u64) -> Result<TeamSnapshot, CaptainError> {
        let team_info = self.source.entry(team_id).await?;
        let gameweek = self.current_gameweek().await?;
        let picks = self.source.entry_picks(team_id, gameweek).await?;

        tracing::debug!(
            team_id,
            gameweek,
            picks = picks.picks.len(),
            active_chip = ?picks.active_chip,
            "fetched team snapshot"
        );

        Ok(TeamSnapshot {
            team_id,
            gameweek,
            team_info,
            picks: picks.picks,
            active_chip: picks.active_chip,
            automatic_subs: picks.automatic_subs,
            entry_history: picks.entry_history,
        })
    }

    async fn raw_fixtures(&self) -> Result<Arc<Vec<RawFixture>>, CaptainError> {
        let mut guard = self.fixtures.lock().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let fixtures = Arc::new(self.source.fixtures().await?);
        tracing::debug!(fixtures = fixtures.len(), "fetched fixture list");
        *guard = Some(Arc::clone(&fixtures));
        Ok(fixtures)
    }

    /// Unfinished fixtures in gameweeks `[current, current + window_size - 1]`.
    pub async fn fetch_fixtures(&self, window_size: u32) -> Result<Vec<Fixture>, CaptainError> {
        let raw = self.raw_fixtures().await?;
        let current = self.current_gameweek().await?;
        Ok(mapper::upcoming_fixtures(&raw, current, window_size))
    }
}

/// The gameweek flagged current, else the one flagged next, else gameweek 1.
pub fn resolve_current_gameweek(events: &[Event]) -> u32 {
    events
        .iter()
        .find(|e| e.is_current)
        .or_else(|| events.iter().find(|e| e.is_next))
        .map(|e| e.id)
        .unwrap_or(FALLBACK_GAMEWEEK)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source serving canned JSON and counting upstream calls.
    pub(crate) struct StaticSource {
        pub bootstrap: Value,
        pub entry: Value,
        pub picks: Value,
        pub fixtures: Value,
        pub fail_fixtures: bool,
        pub bootstrap_calls: AtomicUsize,
        pub fixture_calls: AtomicUsize,
        pub picks_gameweeks: std::sync::Mutex<Vec<u32>>,
    }

    impl StaticSource {
        pub(crate) fn new(bootstrap: Value, entry: Value, picks: Value, fixtures: Value) -> Self {
            Self {
                bootstrap,
                entry,
                picks,
                fixtures,
                fail_fixtures: false,
                bootstrap_calls: AtomicUsize::new(0),
                fixture_calls: AtomicUsize::new(0),
                picks_gameweeks: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, v: &Value) -> Result<T, CaptainError> {
        serde_json::from_value(v.clone()).map_err(|e| CaptainError::payload(endpoint, e))
    }

    #[async_trait::async_trait]
    impl FplSource for StaticSource {
        fn source_name(&self) -> &'static str {
            "static"
        }

        async fn bootstrap_static(&self) -> Result<BootstrapStatic, CaptainError> {
            self.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
            decode("/bootstrap-static/", &self.bootstrap)
        }

        async fn entry(&self, team_id: u64) -> Result<Entry, CaptainError> {
            decode(&format!("/entry/{team_id}/"), &self.entry)
        }

        async fn entry_picks(
            &self,
            team_id: u64,
            gameweek: u32,
        ) -> Result<EntryPicks, CaptainError> {
            self.picks_gameweeks.lock().unwrap().push(gameweek);
            decode(
                &format!("/entry/{team_id}/event/{gameweek}/picks/"),
                &self.picks,
            )
        }

        async fn fixtures(&self) -> Result<Vec<RawFixture>, CaptainError> {
            self.fixture_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fixtures {
                return Err(CaptainError::upstream("/fixtures/", "status=503"));
            }
            decode("/fixtures/", &self.fixtures)
        }
    }

    pub(crate) fn event(id: u32, is_current: bool, is_next: bool) -> Value {
        json!({"id": id, "name": format!("Gameweek {id}"), "is_current": is_current, "is_next": is_next})
    }

    pub(crate) fn raw_fixture(id: u32, event: Option<u32>, finished: bool) -> Value {
        json!({
            "id": id,
            "event": event,
            "finished": finished,
            "kickoff_time": "2025-09-20T14:00:00Z",
            "team_h": 1,
            "team_a": 2,
            "team_h_difficulty": 2,
            "team_a_difficulty": 4,
            "stats": []
        })
    }

    fn events(list: Vec<Value>) -> Vec<Event> {
        serde_json::from_value(Value::Array(list)).unwrap()
    }

    #[test]
    fn current_flag_wins_over_next() {
        let evs = events(vec![
            event(4, false, false),
            event(6, false, true),
            event(5, true, false),
        ]);
        assert_eq!(resolve_current_gameweek(&evs), 5);
    }

    #[test]
    fn next_flag_used_when_no_current() {
        let evs = events(vec![event(1, false, false), event(2, false, true)]);
        assert_eq!(resolve_current_gameweek(&evs), 2);
    }

    #[test]
    fn falls_back_to_first_gameweek() {
        let evs = events(vec![event(7, false, false), event(8, false, false)]);
        assert_eq!(resolve_current_gameweek(&evs), 1);
        assert_eq!(resolve_current_gameweek(&[]), 1);
    }

    fn source_with_fixtures(fixtures: Vec<Value>) -> StaticSource {
        StaticSource::new(
            json!({"events": [event(5, true, false)], "teams": [], "elements": [], "element_types": []}),
            json!({"id": 42, "name": "Test FC"}),
            json!({"picks": []}),
            Value::Array(fixtures),
        )
    }

    #[tokio::test]
    async fn fixture_window_only_returns_current_gameweek_for_gw5_and_gw8() {
        let source = Arc::new(source_with_fixtures(vec![
            raw_fixture(1, Some(5), false),
            raw_fixture(2, Some(8), false),
        ]));
        let client = FplClient::new(source);

        let fixtures = client.fetch_fixtures(3).await.unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].gameweek, 5);
    }

    #[tokio::test]
    async fn fixture_cache_is_shared_across_window_sizes() {
        let source = Arc::new(source_with_fixtures(vec![
            raw_fixture(1, Some(5), false),
            raw_fixture(2, Some(6), false),
            raw_fixture(3, Some(7), false),
        ]));
        let client = FplClient::new(source.clone());

        assert_eq!(client.fetch_fixtures(1).await.unwrap().len(), 1);
        assert_eq!(client.fetch_fixtures(3).await.unwrap().len(), 3);
        assert_eq!(source.fixture_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.bootstrap_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn team_snapshot_uses_resolved_gameweek() {
        let source = Arc::new(StaticSource::new(
            json!({"events": [event(4, false, false), event(5, false, true)]}),
            json!({"id": 42, "name": "Test FC", "summary_overall_points": 300}),
            json!({
                "active_chip": "bboost",
                "automatic_subs": [],
                "picks": [{"element": 10, "position": 1, "multiplier": 1}]
            }),
            json!([]),
        ));
        let client = FplClient::new(source.clone());

        let snapshot = client.fetch_team_snapshot(42).await.unwrap();
        assert_eq!(snapshot.gameweek, 5);
        assert_eq!(snapshot.active_chip.as_deref(), Some("bboost"));
        assert_eq!(snapshot.team_info.name, "Test FC");
        assert_eq!(*source.picks_gameweeks.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let mut source = source_with_fixtures(vec![]);
        source.fail_fixtures = true;
        let client = FplClient::new(Arc::new(source));

        let err = client.fetch_fixtures(3).await.unwrap_err();
        assert!(matches!(err, CaptainError::UpstreamUnavailable { .. }));
    }

    /// Serves one canned HTTP response on a loopback port and returns its base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn http_source(base_url: String) -> HttpFplSource {
        let settings = Settings {
            fpl_base_url: base_url,
            fpl_timeout_secs: Some(5),
            ..Settings::default()
        };
        HttpFplSource::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_unavailable() {
        let source = http_source(serve_once("503 Service Unavailable", "down").await);

        match source.fixtures().await.unwrap_err() {
            CaptainError::UpstreamUnavailable { endpoint, detail } => {
                assert_eq!(endpoint, "/fixtures/");
                assert!(detail.contains("status=503"), "{detail}");
                assert!(detail.contains("body=down"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_shape_success_body_is_unexpected_payload() {
        let source = http_source(serve_once("200 OK", r#"{"nope":1}"#).await);

        match source.fixtures().await.unwrap_err() {
            CaptainError::UnexpectedPayload { endpoint, .. } => {
                assert_eq!(endpoint, "/fixtures/");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_upstream_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = http_source(format!("http://{addr}"))
            .entry(42)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CaptainError::UpstreamUnavailable { ref endpoint, .. } if endpoint == "/entry/42/"
        ));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let settings = Settings {
            fpl_base_url: "https://example.test/api/".to_string(),
            ..Settings::default()
        };
        let source = HttpFplSource::from_settings(&settings).unwrap();
        assert_eq!(
            source.url("/fixtures/"),
            "https://example.test/api/fixtures/"
        );
    }
}
