//! Timer-driven tests for the session manager (paused tokio time).

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use subtrack_shared::types::UserId;
use tokio::sync::broadcast;

use super::*;

struct FakeProvider {
    session: Mutex<Option<Session>>,
    refresh_results: Mutex<VecDeque<Result<Session, AuthError>>>,
    refresh_calls: AtomicUsize,
    refresh_latency: Mutex<Duration>,
    sign_out_calls: AtomicUsize,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeProvider {
    fn new(session: Option<Session>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            session: Mutex::new(session),
            refresh_results: Mutex::new(VecDeque::new()),
            refresh_calls: AtomicUsize::new(0),
            refresh_latency: Mutex::new(Duration::ZERO),
            sign_out_calls: AtomicUsize::new(0),
            events,
        })
    }

    fn fail_next_refresh(&self) {
        self.refresh_results
            .lock()
            .unwrap()
            .push_back(Err(AuthError::RefreshFailed("invalid refresh token".into())));
    }

    fn slow_refresh(&self, latency: Duration) {
        *self.refresh_latency.lock().unwrap() = latency;
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn sign_outs(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.refresh_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let next = self.refresh_results.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(session_expiring_in(Duration::from_secs(3600))),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.session.lock().unwrap().take();
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

fn session_expiring_in(duration: Duration) -> Session {
    Session {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        user_id: UserId::new(),
        email: Some("user@example.com".to_string()),
        expires_at: Utc::now() + chrono::Duration::from_std(duration).unwrap(),
    }
}

fn manager(provider: &Arc<FakeProvider>, marker: SessionMarker) -> SessionManager {
    SessionManager::new(
        Arc::clone(provider) as Arc<dyn IdentityProvider>,
        marker,
        SessionConfig::default(),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_start_without_session_is_anonymous() {
    let provider = FakeProvider::new(None);
    let manager = manager(&provider, SessionMarker::new());

    assert_eq!(manager.start().await.unwrap(), SessionState::Anonymous);
    settle().await;
    assert_eq!(provider.refreshes(), 0);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_expiry_inside_threshold_refreshes_immediately() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(180))));
    let manager = manager(&provider, SessionMarker::new());

    manager.start().await.unwrap();
    settle().await;

    assert_eq!(provider.refreshes(), 1);
    assert_eq!(manager.state(), SessionState::Authenticated);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_waits_for_threshold() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(600))));
    let manager = manager(&provider, SessionMarker::new());

    manager.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(240)).await;
    assert_eq!(provider.refreshes(), 0);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(provider.refreshes(), 1);
    assert_eq!(manager.state(), SessionState::Authenticated);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_expires_and_signs_out() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(60))));
    provider.fail_next_refresh();
    let marker = SessionMarker::new();
    let manager = manager(&provider, marker.clone());
    let mut states = manager.subscribe();

    manager.start().await.unwrap();
    settle().await;

    assert_eq!(manager.state(), SessionState::Expired);
    assert_eq!(provider.sign_outs(), 1);
    assert!(manager.session().is_none());
    assert_eq!(marker.current().map(|e| e.kind), Some(MarkerKind::SignedOut));
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), SessionState::Expired);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_signs_out() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(4 * 3600))));
    let manager = manager(&provider, SessionMarker::new());

    manager.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(29 * 60)).await;
    assert_eq!(manager.state(), SessionState::Authenticated);

    tokio::time::sleep(Duration::from_secs(3 * 60)).await;
    assert_eq!(manager.state(), SessionState::Anonymous);
    assert_eq!(provider.sign_outs(), 1);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_activity_keeps_session_alive() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(4 * 3600))));
    let manager = manager(&provider, SessionMarker::new());

    manager.start().await.unwrap();
    for event in ActivityEvent::ALL {
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        manager.record_activity(event);
    }

    assert_eq!(manager.state(), SessionState::Authenticated);
    assert_eq!(provider.sign_outs(), 0);
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_propagates_to_other_tab() {
    let marker = SessionMarker::new();
    let provider_a = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(3600))));
    let provider_b = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(3600))));
    let tab_a = manager(&provider_a, marker.clone());
    let tab_b = manager(&provider_b, marker.clone());

    tab_a.start().await.unwrap();
    tab_b.start().await.unwrap();
    settle().await;

    tab_a.sign_out().await.unwrap();
    settle().await;

    assert_eq!(tab_a.state(), SessionState::Anonymous);
    assert_eq!(tab_b.state(), SessionState::Anonymous);
    assert_eq!(provider_b.sign_outs(), 0);

    tab_a.stop();
    tab_b.stop();
}

#[tokio::test(start_paused = true)]
async fn test_other_tab_sign_out_wins_over_pending_refresh() {
    let marker = SessionMarker::new();
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(180))));
    provider.slow_refresh(Duration::from_secs(10));
    let manager = manager(&provider, marker.clone());

    manager.start().await.unwrap();
    settle().await;
    assert_eq!(manager.state(), SessionState::Expiring);

    marker.write(TabId::new(), MarkerKind::SignedOut);
    settle().await;
    assert_eq!(manager.state(), SessionState::Anonymous);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(provider.refreshes(), 1);
    assert_eq!(manager.state(), SessionState::Anonymous);
    assert!(manager.session().is_none());
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_provider_sign_in_event_is_mirrored() {
    let marker = SessionMarker::new();
    let provider = FakeProvider::new(None);
    let manager = manager(&provider, marker.clone());
    manager.start().await.unwrap();

    let session = session_expiring_in(Duration::from_secs(3600));
    let user_id = session.user_id;
    provider.events.send(AuthEvent::SignedIn(session)).unwrap();
    settle().await;

    assert_eq!(manager.state(), SessionState::Authenticated);
    assert_eq!(
        marker.current().map(|e| e.kind),
        Some(MarkerKind::SignedIn { user_id })
    );
    manager.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent_and_cancels_timers() {
    let provider = FakeProvider::new(Some(session_expiring_in(Duration::from_secs(600))));
    let manager = manager(&provider, SessionMarker::new());

    manager.start().await.unwrap();
    assert!(manager.is_running());
    manager.stop();
    manager.stop();
    assert!(!manager.is_running());

    tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
    assert_eq!(provider.refreshes(), 0);
    assert_eq!(provider.sign_outs(), 0);
}
