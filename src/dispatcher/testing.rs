//! Mock implementations for testing
//!
//! These mocks enable dispatcher tests without real I/O.

use crate::client::{AssistantClient, AssistantError, ChatReply, ChatRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Assistant Client
// ============================================================================

/// Mock client that returns queued results in order
pub struct MockAssistantClient {
    responses: Mutex<VecDeque<Result<ChatReply, AssistantError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockAssistantClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, response: &str, timestamp: &str, session_id: &str) {
        self.responses.lock().unwrap().push_back(Ok(ChatReply {
            response: response.to_string(),
            timestamp: timestamp.to_string(),
            session_id: session_id.to_string(),
        }));
    }

    /// Queue an error
    pub fn queue_error(&self, error: AssistantError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::transport("No mock response queued")))
    }
}

impl Default for MockAssistantClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantClient for MockAssistantClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        self.next(request)
    }

    fn endpoint(&self) -> &str {
        "mock://assistant"
    }
}

// ============================================================================
// Gated Mock Client (for contention testing)
// ============================================================================

/// Mock client that holds every request until released
pub struct GatedMockClient {
    inner: MockAssistantClient,
    /// One permit per request allowed to finish
    pub release: Arc<Notify>,
}

impl GatedMockClient {
    pub fn new() -> Self {
        Self {
            inner: MockAssistantClient::new(),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, response: &str, timestamp: &str, session_id: &str) {
        self.inner.queue_reply(response, timestamp, session_id);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl AssistantClient for GatedMockClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.release.notified().await;
        self.inner
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::transport("No mock response queued")))
    }

    fn endpoint(&self) -> &str {
        "mock://gated"
    }
}

// ============================================================================
// Panicking Mock Client
// ============================================================================

/// Mock client whose call panics mid-request
pub struct PanickingClient;

#[async_trait]
impl AssistantClient for PanickingClient {
    async fn chat(&self, _request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        panic!("client exploded");
    }

    fn endpoint(&self) -> &str {
        "mock://panicking"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AssistantErrorKind, LoggingClient};
    use crate::dispatcher::{Dispatcher, DropReason, SendOutcome};
    use crate::quick_actions::QuickActionCatalog;
    use crate::state_machine::{
        ChatState, Role, TransitionError, Turn, FALLBACK_MESSAGE, GREETING,
    };
    use chrono::{DateTime, Utc};
    use std::time::Duration;

    const T: &str = "2024-05-01T12:00:05Z";

    fn contents(state: &ChatState) -> Vec<String> {
        state.log().iter().map(|t| t.content().to_string()).collect()
    }

    /// Wait until the published state satisfies `predicate`
    async fn wait_until<C: AssistantClient + 'static>(
        dispatcher: &Dispatcher<C>,
        predicate: impl Fn(&ChatState) -> bool,
    ) {
        let mut rx = dispatcher.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for state")
            .expect("dispatcher dropped");
    }

    #[tokio::test]
    async fn test_mock_client() {
        let mock = MockAssistantClient::new();
        mock.queue_reply("Hello", T, "abc123");

        let request = ChatRequest {
            session_id: None,
            message: "Hi".to_string(),
        };
        let reply = mock.chat(&request).await.unwrap();
        assert_eq!(reply.response, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.chat(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// The concrete show-menu scenario, observed step by step
    #[tokio::test]
    async fn test_show_menu_scenario() {
        let client = Arc::new(GatedMockClient::new());
        client.queue_reply("Our menu includes...", T, "abc123");
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&client)));

        let initial = dispatcher.snapshot();
        assert_eq!(contents(&initial), vec![GREETING]);
        assert_eq!(initial.session().current(), None);
        assert!(!initial.is_pending());

        let task = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.send("Show menu").await }
        });

        wait_until(&dispatcher, ChatState::is_pending).await;
        let in_flight = dispatcher.snapshot();
        assert_eq!(in_flight.log().len(), 2);
        assert_eq!(in_flight.log().last().map(Turn::content), Some("Show menu"));

        client.release.notify_one();
        assert_eq!(task.await.unwrap(), SendOutcome::Replied);
        assert_eq!(
            client.recorded_requests(),
            vec![ChatRequest {
                session_id: None,
                message: "Show menu".to_string(),
            }]
        );

        let done = dispatcher.snapshot();
        assert_eq!(done.log().len(), 3);
        assert_eq!(done.session().current(), Some("abc123"));
        assert!(!done.is_pending());
        let reply = done.log().last().unwrap();
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.content(), "Our menu includes...");
        assert_eq!(reply.timestamp(), T.parse::<DateTime<Utc>>().unwrap());
    }

    #[tokio::test]
    async fn test_log_grows_by_two_per_round_trip() {
        let client = Arc::new(MockAssistantClient::new());
        client.queue_reply("menu", T, "abc123");
        client.queue_error(AssistantError::backend("500"));
        client.queue_reply("wings", T, "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        assert_eq!(dispatcher.send("Show menu").await, SendOutcome::Replied);
        assert_eq!(dispatcher.snapshot().log().len(), 3);
        assert_eq!(dispatcher.send("Popular pizzas").await, SendOutcome::FellBack);
        assert_eq!(dispatcher.snapshot().log().len(), 5);
        assert_eq!(dispatcher.send("Wings").await, SendOutcome::Replied);

        let state = dispatcher.snapshot();
        assert_eq!(
            contents(&state),
            vec![
                GREETING,
                "Show menu",
                "menu",
                "Popular pizzas",
                FALLBACK_MESSAGE,
                "Wings",
                "wings"
            ]
        );
    }

    #[tokio::test]
    async fn test_replies_stay_in_call_order_despite_skewed_clocks() {
        let client = Arc::new(MockAssistantClient::new());
        // Assistant clock runs far behind the client's
        client.queue_reply("first answer", "2001-01-01T00:00:00Z", "abc123");
        client.queue_reply("second answer", "1999-01-01T00:00:00Z", "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        dispatcher.send("one").await;
        dispatcher.send("two").await;

        let state = dispatcher.snapshot();
        assert_eq!(
            contents(&state),
            vec![GREETING, "one", "first answer", "two", "second answer"]
        );
    }

    #[tokio::test]
    async fn test_session_committed_once_and_sent_afterwards() {
        let client = Arc::new(MockAssistantClient::new());
        client.queue_reply("a", T, "abc123");
        client.queue_reply("b", T, "different");
        client.queue_reply("c", T, "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        for text in ["Show menu", "Wings", "Allergen info"] {
            dispatcher.send(text).await;
            assert_eq!(dispatcher.snapshot().session().current(), Some("abc123"));
        }

        let sessions: Vec<Option<String>> = client
            .recorded_requests()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        assert_eq!(
            sessions,
            vec![None, Some("abc123".to_string()), Some("abc123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_start_a_session() {
        let client = Arc::new(MockAssistantClient::new());
        client.queue_error(AssistantError::transport("connection refused"));
        client.queue_reply("menu", T, "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        assert_eq!(dispatcher.send("Show menu").await, SendOutcome::FellBack);
        assert_eq!(dispatcher.snapshot().session().current(), None);

        assert_eq!(dispatcher.send("Show menu").await, SendOutcome::Replied);
        assert_eq!(client.recorded_requests()[1].session_id, None);
        assert_eq!(dispatcher.snapshot().session().current(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let client = Arc::new(MockAssistantClient::new());
        let dispatcher = Dispatcher::new(Arc::clone(&client));
        let before = dispatcher.snapshot();

        for text in ["", "   ", "\n\t "] {
            assert_eq!(
                dispatcher.send(text).await,
                SendOutcome::Dropped(DropReason::EmptyInput)
            );
        }

        assert_eq!(dispatcher.snapshot(), before);
        assert!(client.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_pending_is_dropped() {
        let client = Arc::new(GatedMockClient::new());
        client.queue_reply("menu", T, "abc123");
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&client)));

        let first = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.send("Show menu").await }
        });
        wait_until(&dispatcher, ChatState::is_pending).await;
        let before = dispatcher.snapshot();

        assert_eq!(
            dispatcher.send("Wings").await,
            SendOutcome::Dropped(DropReason::Busy)
        );
        assert_eq!(
            dispatcher.invoke_quick_action(4).await,
            SendOutcome::Dropped(DropReason::Busy)
        );

        assert_eq!(dispatcher.snapshot(), before);
        assert!(dispatcher.is_pending());

        client.release.notify_one();
        assert_eq!(first.await.unwrap(), SendOutcome::Replied);
        assert_eq!(dispatcher.snapshot().log().len(), 3);
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_admit_exactly_one() {
        let client = Arc::new(GatedMockClient::new());
        client.queue_reply("menu", T, "abc123");
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&client)));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.send(&format!("message {i}")).await })
            })
            .collect();

        wait_until(&dispatcher, ChatState::is_pending).await;
        // Every loser returns straight away; release the winner only after
        // all of them have been turned away
        tokio::time::timeout(Duration::from_secs(2), async {
            while handles.iter().filter(|h| h.is_finished()).count() < handles.len() - 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("contenders never settled");
        client.release.notify_one();

        let mut replied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                SendOutcome::Replied => replied += 1,
                outcome => assert_eq!(outcome, SendOutcome::Dropped(DropReason::Busy)),
            }
        }

        assert_eq!(replied, 1);
        assert_eq!(client.recorded_requests().len(), 1);
        assert_eq!(dispatcher.snapshot().log().len(), 3);
    }

    #[tokio::test]
    async fn test_every_failure_kind_uses_the_fallback() {
        for kind in [AssistantErrorKind::Transport, AssistantErrorKind::Backend] {
            let client = Arc::new(MockAssistantClient::new());
            client.queue_error(AssistantError::new(kind, "boom"));
            let dispatcher = Dispatcher::new(Arc::clone(&client));

            assert_eq!(dispatcher.send("Show menu").await, SendOutcome::FellBack);

            let state = dispatcher.snapshot();
            assert_eq!(state.log().len(), 3);
            assert_eq!(state.log().last().map(Turn::content), Some(FALLBACK_MESSAGE));
            assert_eq!(state.log().last().map(Turn::role), Some(Role::Assistant));
            assert!(!state.is_pending());
        }
    }

    #[tokio::test]
    async fn test_unreadable_timestamp_still_appends_reply() {
        let client = Arc::new(MockAssistantClient::new());
        client.queue_reply("menu", "not a time", "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        let before = Utc::now();
        assert_eq!(dispatcher.send("Show menu").await, SendOutcome::Replied);

        let state = dispatcher.snapshot();
        let reply = state.log().last().unwrap();
        assert_eq!(reply.content(), "menu");
        assert!(reply.timestamp() >= before);
    }

    #[tokio::test]
    async fn test_quick_action_matches_typed_input() {
        let typed_client = Arc::new(MockAssistantClient::new());
        typed_client.queue_reply("Our menu includes...", T, "abc123");
        let typed = Dispatcher::new(Arc::clone(&typed_client));

        let quick_client = Arc::new(MockAssistantClient::new());
        quick_client.queue_reply("Our menu includes...", T, "abc123");
        let quick = Dispatcher::new(Arc::clone(&quick_client));

        assert_eq!(typed.send("Show menu").await, SendOutcome::Replied);
        let index = QuickActionCatalog::entries()
            .iter()
            .position(|a| a.phrase() == "Show menu")
            .unwrap();
        assert_eq!(quick.invoke_quick_action(index).await, SendOutcome::Replied);

        let (typed, quick) = (typed.snapshot(), quick.snapshot());
        assert_eq!(contents(&typed), contents(&quick));
        assert_eq!(typed.session(), quick.session());
        assert_eq!(typed.is_pending(), quick.is_pending());
        assert_eq!(typed_client.recorded_requests(), quick_client.recorded_requests());
    }

    #[tokio::test]
    async fn test_unknown_quick_action_is_dropped() {
        let client = Arc::new(MockAssistantClient::new());
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        assert_eq!(
            dispatcher.invoke_quick_action(99).await,
            SendOutcome::Dropped(DropReason::UnknownQuickAction)
        );
        assert_eq!(dispatcher.snapshot().log().len(), 1);
        assert!(client.recorded_requests().is_empty());
    }

    #[test]
    fn test_drop_reasons_follow_transition_errors() {
        assert_eq!(DropReason::from(TransitionError::EmptyInput), DropReason::EmptyInput);
        assert_eq!(DropReason::from(TransitionError::Busy), DropReason::Busy);
        // Never folded into Busy
        assert_eq!(
            DropReason::from(TransitionError::NoRequestInFlight),
            DropReason::Rejected(TransitionError::NoRequestInFlight)
        );
    }

    #[tokio::test]
    async fn test_panicking_client_still_releases_pending() {
        let dispatcher = Dispatcher::new(PanickingClient);

        assert_eq!(dispatcher.send("Show menu").await, SendOutcome::FellBack);

        let state = dispatcher.snapshot();
        assert!(!state.is_pending());
        assert_eq!(
            contents(&state),
            vec![GREETING, "Show menu", FALLBACK_MESSAGE]
        );
    }

    #[tokio::test]
    async fn test_dropped_send_future_still_settles() {
        let client = Arc::new(GatedMockClient::new());
        client.queue_reply("menu", T, "abc123");
        let dispatcher = Dispatcher::new(Arc::clone(&client));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), dispatcher.send("Show menu")).await;
        assert!(abandoned.is_err());
        assert!(dispatcher.is_pending());

        client.release.notify_one();
        wait_until(&dispatcher, |s| !s.is_pending()).await;

        let state = dispatcher.snapshot();
        assert_eq!(contents(&state), vec![GREETING, "Show menu", "menu"]);
        assert_eq!(state.session().current(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_subscribers_see_each_transition() {
        let client = Arc::new(MockAssistantClient::new());
        client.queue_reply("menu", T, "abc123");
        let dispatcher = Dispatcher::new(LoggingClient::new(client));
        let mut rx = dispatcher.subscribe();
        assert_eq!(rx.borrow_and_update().log().len(), 1);

        dispatcher.send("Show menu").await;

        assert!(rx.has_changed().unwrap());
        let latest = rx.borrow_and_update().clone();
        assert_eq!(latest.log().len(), 3);
        assert!(!latest.is_pending());
    }
}
