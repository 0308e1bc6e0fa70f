use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use recommend::{RecommendRequest, RequestState, ResponseOrdering};

use super::*;

// =========================================================================
// MockApi
// =========================================================================

/// Answers each query after a per-query delay; `bad` fails with a detail.
struct MockApi {
    delays: HashMap<&'static str, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    fn new(delays: &[(&'static str, u64)]) -> Self {
        Self {
            delays: delays.iter().map(|(q, ms)| (*q, Duration::from_millis(*ms))).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecommendApi for MockApi {
    async fn send(&self, _route: Route, request: &RecommendRequest) -> Result<RecommendationResult, RequestFailure> {
        let query = request.query.trim().to_owned();
        self.calls.lock().unwrap().push(query.clone());
        let delay = self.delays.get(query.as_str()).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        if query == "bad" {
            return Err(RequestFailure::status(400, r#"{"detail":"Invalid query"}"#));
        }
        Ok(RecommendationResult { explanation: format!("for {query}"), recommendations: vec![] })
    }
}

fn explanation(session: &FormSession) -> Option<&str> {
    session.result().map(|r| r.explanation.as_str())
}

async fn run(
    input: &'static str,
    api: Arc<MockApi>,
    ordering: ResponseOrdering,
    allow_overlap: bool,
) -> (FormSession, String) {
    let mut out = Vec::new();
    let options = InteractiveOptions { allow_overlap, color: false };
    let session = run_interactive(input.as_bytes(), &mut out, api, FormSession::new(ordering), options)
        .await
        .expect("interactive run");
    (session, String::from_utf8(out).expect("utf8 output"))
}

// =========================================================================
// submit_once
// =========================================================================

#[tokio::test]
async fn submit_once_blank_query_makes_no_call() {
    let api = MockApi::new(&[]);
    let mut session = FormSession::default();
    session.set_query("   ");
    let rejected = submit_once(&mut session, &api, Route::Query, &mut Vec::<u8>::new(), false).await;
    assert_eq!(rejected, Err(SubmitRejected::EmptyQuery));
    assert!(api.calls().is_empty());
    assert_eq!(session.state(), RequestState::Idle);
}

#[tokio::test]
async fn submit_once_applies_success() {
    let api = MockApi::new(&[]);
    let mut session = FormSession::default();
    session.set_query("analyst");
    let resolution = submit_once(&mut session, &api, Route::Query, &mut Vec::<u8>::new(), false).await.expect("submit");
    assert_eq!(resolution, Resolution::Applied);
    assert_eq!(session.state(), RequestState::Success);
    assert_eq!(explanation(&session), Some("for analyst"));
    assert_eq!(api.calls(), ["analyst"]);
}

#[tokio::test]
async fn submit_once_applies_failure_banner() {
    let api = MockApi::new(&[]);
    let mut session = FormSession::default();
    session.set_query("bad");
    submit_once(&mut session, &api, Route::Query, &mut Vec::<u8>::new(), false).await.expect("submit");
    assert_eq!(session.view().error_banner, Some("Invalid query"));
}

#[tokio::test]
async fn submit_once_writes_loading_view_before_outcome() {
    let api = MockApi::new(&[]);
    let mut session = FormSession::default();
    session.set_query("analyst");
    let mut progress = Vec::new();
    submit_once(&mut session, &api, Route::Query, &mut progress, false).await.expect("submit");

    let progress = String::from_utf8(progress).expect("utf8 output");
    assert_eq!(progress, "Loading recommendations...\n\n");
    assert_eq!(explanation(&session), Some("for analyst"));
}

#[tokio::test]
async fn submit_once_rejected_writes_no_progress() {
    let api = MockApi::new(&[]);
    let mut session = FormSession::default();
    let mut progress = Vec::new();
    let rejected = submit_once(&mut session, &api, Route::Query, &mut progress, false).await;
    assert_eq!(rejected, Err(SubmitRejected::EmptyQuery));
    assert!(progress.is_empty());
}

// =========================================================================
// run_interactive
// =========================================================================

#[tokio::test(start_paused = true)]
async fn overlapping_requests_latest_submission_wins() {
    let api = Arc::new(MockApi::new(&[("slow", 200), ("fast", 10)]));
    let (session, output) = run("slow\nfast\n", api.clone(), ResponseOrdering::LatestSubmission, true).await;

    assert_eq!(api.calls(), ["slow", "fast"]);
    assert_eq!(explanation(&session), Some("for fast"));
    assert_eq!(session.state(), RequestState::Success);
    assert!(output.contains("for fast"));
    assert!(!output.contains("for slow"));
}

#[tokio::test(start_paused = true)]
async fn overlapping_requests_last_arrival_wins() {
    let api = Arc::new(MockApi::new(&[("slow", 200), ("fast", 10)]));
    let (session, output) = run("slow\nfast\n", api.clone(), ResponseOrdering::LastArrival, true).await;

    assert_eq!(explanation(&session), Some("for slow"));
    let fast_at = output.find("for fast").expect("fast rendered");
    let slow_at = output.find("for slow").expect("slow rendered");
    assert!(fast_at < slow_at);
}

#[tokio::test(start_paused = true)]
async fn lines_while_loading_are_refused_without_overlap() {
    let api = Arc::new(MockApi::new(&[("slow", 200)]));
    let (session, output) = run("slow\nfast\n", api.clone(), ResponseOrdering::LatestSubmission, false).await;

    assert_eq!(api.calls(), ["slow"]);
    assert!(output.contains("already in flight"));
    assert_eq!(explanation(&session), Some("for slow"));
}

#[tokio::test]
async fn blank_line_is_rejected() {
    let api = Arc::new(MockApi::new(&[]));
    let (_, output) = run("   \n", api.clone(), ResponseOrdering::LatestSubmission, false).await;
    assert!(api.calls().is_empty());
    assert!(output.contains("enter a job description first"));
}

#[tokio::test]
async fn quit_command_stops_reading() {
    let api = Arc::new(MockApi::new(&[]));
    let (session, _) = run(":quit\nanalyst\n", api.clone(), ResponseOrdering::LatestSubmission, false).await;
    assert!(api.calls().is_empty());
    assert_eq!(session.state(), RequestState::Idle);
}

#[tokio::test(start_paused = true)]
async fn failure_after_success_keeps_result_and_shows_banner() {
    let api = Arc::new(MockApi::new(&[("analyst", 10), ("bad", 50)]));
    let (session, output) = run("analyst\nbad\n", api.clone(), ResponseOrdering::LastArrival, true).await;

    assert_eq!(session.view().error_banner, Some("Invalid query"));
    assert_eq!(explanation(&session), Some("for analyst"));
    assert!(output.contains("error: Invalid query"));
}
