use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 120;

const TRIGGER_TIMEOUT: Duration = Duration::from_secs(30);
const BATCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("prediction service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("a prediction job is already running")]
    AlreadyRunning,
    #[error("prediction polling timed out after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("prediction polling was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub last_run: Option<String>,
    pub last_result: Option<RunSummary>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_customers: i64,
    pub champions: i64,
    pub at_risk: i64,
    pub critical: i64,
    pub predicted_churn: i64,
    pub predicted_retain: i64,
    pub mean_risk_score: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringResult {
    pub customer_id: String,
    pub customer_name: String,
    pub churn_risk_score: f64,
    pub status_classification: String,
    pub prediction: bool,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    results: Vec<ScoringResult>,
}

/// Cooperative cancellation handle shared between the poller and whoever
/// tears it down.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let already_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !already_cancelled {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

pub struct PredictClient {
    http: reqwest::Client,
    base_url: String,
}

impl PredictClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PredictError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Availability probe; transport failures read as unavailable.
    pub async fn health(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::warn!(error = %error, "prediction service health check failed");
                false
            }
        }
    }

    pub async fn trigger(&self) -> Result<(), PredictError> {
        let response = self
            .http
            .post(self.url("/predict"))
            .timeout(TRIGGER_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(PredictError::AlreadyRunning);
        }
        if !status.is_success() {
            return Err(PredictError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        tracing::info!("prediction job triggered");
        Ok(())
    }

    pub async fn status(&self) -> Result<StatusSnapshot, PredictError> {
        let response = self.http.get(self.url("/predict/status")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<StatusSnapshot>().await?)
    }

    pub async fn batch_score(
        &self,
        file_name: &str,
        csv_bytes: Vec<u8>,
    ) -> Result<Vec<ScoringResult>, PredictError> {
        let part = reqwest::multipart::Part::bytes(csv_bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/predict/batch"))
            .timeout(BATCH_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let batch = response.json::<BatchResponse>().await?;
        tracing::info!(count = batch.results.len(), "batch scoring completed");
        Ok(batch.results)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Idle,
    Checking,
    Running,
    Completed(Option<RunSummary>),
    Failed(String),
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed(_) | PollState::Failed(_) | PollState::TimedOut
        )
    }
}

fn observe(snapshot: &StatusSnapshot) -> PollState {
    if snapshot.is_running {
        return PollState::Running;
    }
    if let Some(error) = &snapshot.last_error {
        return PollState::Failed(error.clone());
    }
    if snapshot.last_run.is_some() {
        return PollState::Completed(snapshot.last_result.clone());
    }
    // Idle service with no recorded run yet; keep waiting.
    PollState::Checking
}

/// Fixed-interval, bounded status poll. Exclusive ownership (`&mut self`)
/// keeps a second overlapping poll of the same trigger unrepresentable.
pub struct StatusPoller {
    interval: Duration,
    max_attempts: u32,
    state: PollState,
}

impl StatusPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub async fn run(
        &mut self,
        client: &PredictClient,
        cancel: &CancelToken,
    ) -> Result<PollState, PredictError> {
        self.state = PollState::Checking;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                self.state = PollState::Idle;
                return Err(PredictError::Cancelled);
            }

            let snapshot = tokio::select! {
                _ = cancel.cancelled() => {
                    self.state = PollState::Idle;
                    return Err(PredictError::Cancelled);
                }
                result = client.status() => result?,
            };

            self.state = observe(&snapshot);
            if self.state.is_terminal() {
                return Ok(self.state.clone());
            }
            tracing::debug!(attempt, max_attempts = self.max_attempts, "prediction still running");

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.state = PollState::Idle;
                    return Err(PredictError::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.state = PollState::TimedOut;
        Err(PredictError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn snapshot(
        is_running: bool,
        last_run: Option<&str>,
        last_error: Option<&str>,
    ) -> StatusSnapshot {
        StatusSnapshot {
            is_running,
            last_run: last_run.map(str::to_string),
            last_result: None,
            last_error: last_error.map(str::to_string),
        }
    }

    #[test]
    fn observe_running_service() {
        assert_eq!(observe(&snapshot(true, None, None)), PollState::Running);
    }

    #[test]
    fn observe_completed_run() {
        let state = observe(&snapshot(false, Some("2026-02-01T10:00:00"), None));
        assert_eq!(state, PollState::Completed(None));
        assert!(state.is_terminal());
    }

    #[test]
    fn observe_prefers_recorded_error() {
        let state = observe(&snapshot(false, Some("2026-02-01T10:00:00"), Some("model missing")));
        assert_eq!(state, PollState::Failed("model missing".to_string()));
    }

    #[test]
    fn observe_keeps_checking_before_first_run() {
        let state = observe(&snapshot(false, None, None));
        assert_eq!(state, PollState::Checking);
        assert!(!state.is_terminal());
    }

    #[tokio::test]
    async fn trigger_maps_conflict_to_already_running() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/predict");
                then.status(409).body("already running");
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let error = client.trigger().await.unwrap_err();
        assert!(matches!(error, PredictError::AlreadyRunning));
    }

    #[tokio::test]
    async fn trigger_surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/predict");
                then.status(500).body("pipeline exploded");
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let error = client.trigger().await.unwrap_err();
        match error {
            PredictError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "pipeline exploded");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_deserializes_full_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/predict/status");
                then.status(200).json_body(serde_json::json!({
                    "is_running": false,
                    "last_run": "2026-02-01T10:00:00",
                    "last_result": {
                        "total_customers": 40,
                        "champions": 25,
                        "at_risk": 10,
                        "critical": 5,
                        "predicted_churn": 9,
                        "predicted_retain": 31,
                        "mean_risk_score": 0.31,
                        "timestamp": "2026-02-01T10:00:00"
                    },
                    "last_error": null
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let status = client.status().await.unwrap();
        assert!(!status.is_running);
        let summary = status.last_result.unwrap();
        assert_eq!(summary.total_customers, 40);
        assert_eq!(summary.critical, 5);
    }

    #[tokio::test]
    async fn poller_reaches_completed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/predict/status");
                then.status(200).json_body(serde_json::json!({
                    "is_running": false,
                    "last_run": "2026-02-01T10:00:00",
                    "last_result": {
                        "total_customers": 40,
                        "champions": 25,
                        "at_risk": 10,
                        "critical": 5,
                        "predicted_churn": 9,
                        "predicted_retain": 31,
                        "mean_risk_score": 0.31,
                        "timestamp": "2026-02-01T10:00:00"
                    },
                    "last_error": null
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let mut poller = StatusPoller::new(Duration::from_millis(1), 3);
        let state = poller.run(&client, &CancelToken::new()).await.unwrap();
        match state {
            PollState::Completed(Some(summary)) => assert_eq!(summary.total_customers, 40),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn poller_reports_failed_run() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/predict/status");
                then.status(200).json_body(serde_json::json!({
                    "is_running": false,
                    "last_run": null,
                    "last_result": null,
                    "last_error": "model file not found"
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let mut poller = StatusPoller::new(Duration::from_millis(1), 3);
        let state = poller.run(&client, &CancelToken::new()).await.unwrap();
        assert_eq!(state, PollState::Failed("model file not found".to_string()));
    }

    #[tokio::test]
    async fn poller_times_out_after_max_attempts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/predict/status");
                then.status(200).json_body(serde_json::json!({
                    "is_running": true,
                    "last_run": null,
                    "last_result": null,
                    "last_error": null
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let mut poller = StatusPoller::new(Duration::from_millis(1), 3);
        let error = poller.run(&client, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(error, PredictError::Timeout { attempts: 3 }));
        assert_eq!(*poller.state(), PollState::TimedOut);
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn cancellation_interrupts_polling() {
        let cancel = CancelToken::new();
        cancel.cancel();

        // Never contacted: cancellation is observed before the first check.
        let client = PredictClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let mut poller = StatusPoller::new(Duration::from_millis(1), 5);
        let error = poller.run(&client, &cancel).await.unwrap_err();
        assert!(matches!(error, PredictError::Cancelled));
        assert_eq!(*poller.state(), PollState::Idle);
    }

    #[tokio::test]
    async fn cancellation_during_sleep_stops_the_loop() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/predict/status");
                then.status(200).json_body(serde_json::json!({
                    "is_running": true,
                    "last_run": null,
                    "last_result": null,
                    "last_error": null
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let mut poller = StatusPoller::new(Duration::from_secs(60), 5);
        let error = poller.run(&client, &cancel).await.unwrap_err();
        assert!(matches!(error, PredictError::Cancelled));
    }

    #[tokio::test]
    async fn batch_score_parses_results() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/predict/batch");
                then.status(200).json_body(serde_json::json!({
                    "message": "Batch scoring completed successfully",
                    "total_customers": 1,
                    "results": [{
                        "customer_id": "C1",
                        "customer_name": "Acme",
                        "churn_risk_score": 0.873,
                        "status_classification": "Critical",
                        "prediction": true
                    }]
                }));
            })
            .await;

        let client = PredictClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let results = client
            .batch_score("upload.csv", b"customer_id,customer_name\nC1,Acme\n".to_vec())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].customer_id, "C1");
        assert!((results[0].churn_risk_score - 0.873).abs() < 1e-9);
        assert!(results[0].prediction);
    }
}
