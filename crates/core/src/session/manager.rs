//! Session manager: refresh scheduling, inactivity watchdog, cross-tab sync.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::marker::{MarkerKind, SessionMarker, TabId};
use super::provider::IdentityProvider;
use super::types::{
    ActivityEvent, AuthError, AuthEvent, MIN_REFRESH_INTERVAL, Session, SessionConfig,
    SessionState, SignOutReason,
};

/// Drives one client's session.
///
/// Cloning yields another handle to the same manager. Background tasks run
/// until [`SessionManager::stop`] is called.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    marker: SessionMarker,
    tab: TabId,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    session: Mutex<Option<Session>>,
    /// Bumped on every sign-out; guarded by `session`.
    epoch: AtomicU64,
    last_activity: Mutex<Instant>,
    last_refresh: Mutex<Option<Instant>>,
    reschedule: Notify,
    running: Mutex<Option<CancellationToken>>,
}

impl SessionManager {
    /// Creates a stopped manager.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        marker: SessionMarker,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(Inner {
                provider,
                marker,
                tab: TabId::new(),
                config,
                state,
                session: Mutex::new(None),
                epoch: AtomicU64::new(0),
                last_activity: Mutex::new(Instant::now()),
                last_refresh: Mutex::new(None),
                reschedule: Notify::new(),
                running: Mutex::new(None),
            }),
        }
    }

    /// Loads the current session and starts the background tasks.
    ///
    /// Calling `start` on a running manager only returns the current state.
    pub async fn start(&self) -> Result<SessionState, AuthError> {
        if lock(&self.inner.running).is_some() {
            return Ok(self.state());
        }

        let events = self.inner.provider.on_auth_state_change();
        let existing = self.inner.provider.get_session().await?;

        let token = CancellationToken::new();
        {
            let mut running = lock(&self.inner.running);
            if running.is_some() {
                return Ok(self.state());
            }
            *running = Some(token.clone());
        }

        if let Some(session) = existing {
            self.inner.adopt(session);
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(refresh_loop(Arc::clone(&inner), token.clone()));
        tokio::spawn(inactivity_watchdog(Arc::clone(&inner), token.clone()));
        tokio::spawn(marker_watcher(Arc::clone(&inner), token.clone()));
        tokio::spawn(provider_listener(inner, events, token));

        info!(state = ?self.state(), "Session manager started");
        Ok(self.state())
    }

    /// Cancels every timer and listener. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.inner.running).take() {
            token.cancel();
            debug!("Session manager stopped");
        }
    }

    /// Returns true between `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner.running).is_some()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        lock(&self.inner.session).clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Resets the inactivity clock.
    pub fn record_activity(&self, event: ActivityEvent) {
        *lock(&self.inner.last_activity) = Instant::now();
        debug!(?event, "Activity recorded");
    }

    /// Signs the user out at the provider and in every tab.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.force_sign_out(SignOutReason::User).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn set_state(&self, next: SessionState) -> SessionState {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "Session state changed");
        }
        previous
    }

    fn adopt(&self, session: Session) {
        {
            let mut slot = lock(&self.session);
            *slot = Some(session);
            self.set_state(SessionState::Authenticated);
        }
        *lock(&self.last_activity) = Instant::now();
        self.reschedule.notify_one();
    }

    fn clear(&self, next: SessionState) -> SessionState {
        let previous = {
            let mut slot = lock(&self.session);
            slot.take();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.set_state(next)
        };
        *lock(&self.last_refresh) = None;
        self.reschedule.notify_one();
        previous
    }

    /// Delay until the next refresh, `None` without a session.
    fn refresh_delay(&self) -> Option<Duration> {
        let expires_in = lock(&self.session).as_ref()?.time_to_expiry(Utc::now());
        let due = expires_in.saturating_sub(self.config.refresh_threshold);
        let floor = lock(&self.last_refresh)
            .map(|at| MIN_REFRESH_INTERVAL.saturating_sub(at.elapsed()))
            .unwrap_or_default();
        Some(due.max(floor))
    }

    async fn refresh(&self) {
        if !self.state.borrow().is_signed_in() {
            return;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(SessionState::Expiring);

        let result = self.provider.refresh_session().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("Signed out during refresh, discarding result");
            return;
        }

        match result {
            Ok(session) => {
                {
                    let mut slot = lock(&self.session);
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        debug!("Signed out during refresh, discarding session");
                        return;
                    }
                    *slot = Some(session);
                    self.set_state(SessionState::Authenticated);
                }
                *lock(&self.last_refresh) = Some(Instant::now());
                info!("Session refreshed");
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, signing out");
                if let Err(e) = self.force_sign_out(SignOutReason::RefreshFailed).await {
                    warn!(error = %e, "Provider sign-out failed after refresh failure");
                }
            }
        }
    }

    async fn force_sign_out(&self, reason: SignOutReason) -> Result<(), AuthError> {
        let next = if reason == SignOutReason::RefreshFailed {
            SessionState::Expired
        } else {
            SessionState::Anonymous
        };
        let previous = self.clear(next);
        if previous.is_signed_in() {
            self.marker.write(self.tab, MarkerKind::SignedOut);
        }
        info!(?reason, "Signed out");
        self.provider.sign_out().await
    }

    fn idle_for(&self) -> Duration {
        lock(&self.last_activity).elapsed()
    }
}

async fn refresh_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        match inner.refresh_delay() {
            None => {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = inner.reschedule.notified() => {}
                }
            }
            Some(delay) => {
                debug!(delay_secs = delay.as_secs(), "Refresh scheduled");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = inner.reschedule.notified() => {}
                    () = tokio::time::sleep(delay) => inner.refresh().await,
                }
            }
        }
    }
}

async fn inactivity_watchdog(inner: Arc<Inner>, cancel: CancellationToken) {
    let period = inner.config.inactivity_check_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !inner.state.borrow().is_signed_in() {
                    continue;
                }
                let idle = inner.idle_for();
                if idle > inner.config.inactivity_timeout {
                    info!(idle_secs = idle.as_secs(), "Inactivity timeout reached");
                    if let Err(e) = inner.force_sign_out(SignOutReason::Inactivity).await {
                        warn!(error = %e, "Provider sign-out failed after inactivity");
                    }
                }
            }
        }
    }
}

async fn marker_watcher(inner: Arc<Inner>, cancel: CancellationToken) {
    let mut marker = inner.marker.subscribe();
    marker.mark_unchanged();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            changed = marker.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(entry) = marker.borrow_and_update().clone() else {
                    continue;
                };
                if entry.tab == inner.tab {
                    continue;
                }
                match entry.kind {
                    MarkerKind::SignedOut => {
                        if inner.state.borrow().is_signed_in() {
                            info!(reason = ?SignOutReason::OtherTab, "Signed out");
                            inner.clear(SessionState::Anonymous);
                        }
                    }
                    MarkerKind::SignedIn { user_id } => match inner.provider.get_session().await {
                        Ok(Some(session)) => {
                            debug!(%user_id, "Adopting session from another tab");
                            inner.adopt(session);
                        }
                        Ok(None) => debug!(%user_id, "Other tab signed in but no session found"),
                        Err(e) => warn!(error = %e, "Failed to load session written by another tab"),
                    },
                }
            }
        }
    }
}

async fn provider_listener(
    inner: Arc<Inner>,
    mut events: broadcast::Receiver<AuthEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(AuthEvent::SignedIn(session)) => {
                    let user_id = session.user_id;
                    let was_signed_in = inner.state.borrow().is_signed_in();
                    inner.adopt(session);
                    if !was_signed_in {
                        inner.marker.write(inner.tab, MarkerKind::SignedIn { user_id });
                    }
                }
                Ok(AuthEvent::TokenRefreshed(session)) => {
                    *lock(&inner.last_refresh) = Some(Instant::now());
                    inner.adopt(session);
                }
                Ok(AuthEvent::SignedOut) => {
                    if inner.state.borrow().is_signed_in() {
                        info!(reason = ?SignOutReason::Provider, "Signed out");
                        inner.clear(SessionState::Anonymous);
                        inner.marker.write(inner.tab, MarkerKind::SignedOut);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
