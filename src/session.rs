// ABOUTME: Session Manager owning the single Share session credential
// ABOUTME: Lazy login with bounded retries, coalesced concurrent logins, and lazy invalidation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Manager
//!
//! The credential moves between three states:
//!
//! - **Absent**: no session; the next caller starts a login
//! - **Pending**: a login is in flight; every caller awaits that same attempt
//! - **Valid**: a session id is cached and handed out without a network call
//!
//! There is no expiry timer. A failed read invalidates the session it used,
//! and the next caller logs in again.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::AccountCredentials;
use crate::errors::ShareResult;
use crate::gateway::{SessionId, ShareGateway};
use crate::retry::{with_retry, RetryError, RetryPolicy};

/// A login attempt sequence that several callers can await together
type PendingLogin = Shared<BoxFuture<'static, ShareResult<SessionId>>>;

enum CredentialState {
    Absent,
    Pending(PendingLogin),
    Valid(SessionId),
}

/// Observable credential state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// No session and no login in flight
    Absent,
    /// A login attempt sequence is in flight
    Pending,
    /// A session id is cached
    Valid,
}

/// Owner of the session credential for one client
pub struct SessionManager {
    gateway: Arc<dyn ShareGateway>,
    credentials: Arc<AccountCredentials>,
    policy: RetryPolicy,
    state: Mutex<CredentialState>,
}

impl SessionManager {
    /// Create a manager with no session
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ShareGateway>,
        credentials: AccountCredentials,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            credentials: Arc::new(credentials),
            policy,
            state: Mutex::new(CredentialState::Absent),
        }
    }

    /// Gateway used for both login and reads
    #[must_use]
    pub fn gateway(&self) -> &dyn ShareGateway {
        self.gateway.as_ref()
    }

    /// Current credential state
    pub async fn status(&self) -> CredentialStatus {
        match &*self.state.lock().await {
            CredentialState::Absent => CredentialStatus::Absent,
            CredentialState::Pending(_) => CredentialStatus::Pending,
            CredentialState::Valid(_) => CredentialStatus::Valid,
        }
    }

    /// Return the cached session, logging in first if there is none
    ///
    /// Concurrent callers that find a login in flight await its outcome
    /// instead of starting another one.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::AuthRejected` immediately when the service rejects
    /// the account, or the last transient error once the login retry budget
    /// is exhausted.
    pub async fn ensure_session(&self) -> ShareResult<SessionId> {
        let pending = {
            let mut state = self.state.lock().await;

            // A finished login whose caller was cancelled before settling it
            let settled = match &*state {
                CredentialState::Pending(login) => login.peek().cloned(),
                _ => None,
            };
            match settled {
                Some(Ok(session)) => {
                    *state = CredentialState::Valid(session.clone());
                    return Ok(session);
                }
                Some(Err(err)) => {
                    debug!(error = %err, "discarding unsettled failed login");
                    *state = CredentialState::Absent;
                }
                None => {}
            }

            match &*state {
                CredentialState::Valid(session) => return Ok(session.clone()),
                CredentialState::Pending(login) => login.clone(),
                CredentialState::Absent => {
                    let login = self.start_login();
                    *state = CredentialState::Pending(login.clone());
                    login
                }
            }
        };

        let outcome = pending.clone().await;

        // Only the attempt that is still current may settle the state
        let mut state = self.state.lock().await;
        if matches!(&*state, CredentialState::Pending(current) if current.ptr_eq(&pending)) {
            *state = match &outcome {
                Ok(session) => CredentialState::Valid(session.clone()),
                Err(_) => CredentialState::Absent,
            };
        }
        outcome
    }

    /// Drop `stale` so the next caller logs in again
    ///
    /// A session that has already been replaced by a newer login is left alone.
    pub async fn invalidate(&self, stale: &SessionId) {
        let mut state = self.state.lock().await;
        if matches!(&*state, CredentialState::Valid(current) if current == stale) {
            *state = CredentialState::Absent;
            info!("Share session invalidated");
        }
    }

    fn start_login(&self) -> PendingLogin {
        let gateway = Arc::clone(&self.gateway);
        let credentials = Arc::clone(&self.credentials);
        let policy = self.policy;

        async move {
            with_retry("login", &policy, |attempt| {
                let gateway = Arc::clone(&gateway);
                let credentials = Arc::clone(&credentials);
                async move {
                    debug!(attempt, "fetching new session");
                    gateway
                        .authenticate(&credentials)
                        .await
                        .map_err(RetryError::classify)
                }
            })
            .await
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ShareError;
    use crate::models::RawReading;

    #[derive(Default)]
    struct CountingGateway {
        logins: AtomicUsize,
    }

    #[async_trait]
    impl ShareGateway for CountingGateway {
        async fn authenticate(&self, _credentials: &AccountCredentials) -> ShareResult<SessionId> {
            let call = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SessionId::new(format!("session-{call}")))
        }

        async fn fetch_latest(
            &self,
            _session: &SessionId,
            _minutes: u32,
            _max_count: u32,
        ) -> ShareResult<Vec<RawReading>> {
            Ok(Vec::new())
        }
    }

    fn manager(gateway: &Arc<CountingGateway>) -> SessionManager {
        let gateway: Arc<dyn ShareGateway> = gateway.clone();
        SessionManager::new(
            gateway,
            AccountCredentials {
                account_name: "alice".to_owned(),
                password: "hunter2".to_owned(),
                application_id: "app".to_owned(),
            },
            RetryPolicy::new(0, Duration::from_millis(10), Duration::from_millis(10)),
        )
    }

    /// A login that already finished but was never written back to the state
    async fn resolved(outcome: ShareResult<SessionId>) -> PendingLogin {
        let login = async move { outcome }.boxed().shared();
        let _ = login.clone().await;
        login
    }

    #[tokio::test]
    async fn test_unsettled_failed_login_is_retried() {
        let gateway = Arc::new(CountingGateway::default());
        let sessions = manager(&gateway);
        *sessions.state.lock().await =
            CredentialState::Pending(resolved(Err(ShareError::Network("reset".to_owned()))).await);

        let session = sessions.ensure_session().await.unwrap();

        assert_eq!(session, SessionId::new("session-1"));
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);
        assert_eq!(sessions.status().await, CredentialStatus::Valid);
    }

    #[tokio::test]
    async fn test_unsettled_successful_login_is_reused() {
        let gateway = Arc::new(CountingGateway::default());
        let sessions = manager(&gateway);
        *sessions.state.lock().await =
            CredentialState::Pending(resolved(Ok(SessionId::new("earlier"))).await);

        let session = sessions.ensure_session().await.unwrap();

        assert_eq!(session, SessionId::new("earlier"));
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 0);
        assert_eq!(sessions.status().await, CredentialStatus::Valid);
    }
}
