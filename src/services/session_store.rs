//! Session lifecycle: restore at boot, login, logout.
//!
//! Phases follow `UNINITIALIZED -> LOADING -> {AUTHENTICATED, ANONYMOUS}`,
//! then alternate between the last two. Entering AUTHENTICATED always
//! reconciles the cart before the call returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::{
    dto::auth::{LoginRedirect, OAuthCallbackQuery, SessionSnapshot},
    error::{AppError, AppResult},
    gateway::BearerToken,
    models::{SessionPhase, SessionUser, validate_token},
    services::reconcile::{CartReconciler, ReconcileOutcome},
    storage::{DurableStorage, TOKEN_KEY, USER_KEY},
};

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    user: Option<SessionUser>,
}

pub struct AuthSessionStore {
    state: Mutex<SessionState>,
    storage: Arc<dyn DurableStorage>,
    token: BearerToken,
    reconciler: CartReconciler,
    user_tx: watch::Sender<Option<SessionUser>>,
}

impl AuthSessionStore {
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        token: BearerToken,
        reconciler: CartReconciler,
    ) -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                user: None,
            }),
            storage,
            token,
            reconciler,
            user_tx,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == SessionPhase::Loading
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.lock().user.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            phase: state.phase,
            user: state.user.clone(),
            is_authenticated: state.phase == SessionPhase::Authenticated,
            is_loading: state.phase == SessionPhase::Loading,
        }
    }

    /// Signed-in user, updated on every login, logout and profile change.
    pub fn subscribe_user(&self) -> watch::Receiver<Option<SessionUser>> {
        self.user_tx.subscribe()
    }

    /// Bring the session back from storage. Only the first call does any
    /// work; later calls report the current phase.
    pub async fn restore(&self) -> AppResult<SessionPhase> {
        {
            let mut state = self.lock();
            if state.phase != SessionPhase::Uninitialized {
                tracing::debug!(phase = ?state.phase, "session already restored");
                return Ok(state.phase);
            }
            transition(&mut state, SessionPhase::Loading)?;
        }

        let restored = match self.read_persisted() {
            Ok(restored) => restored,
            Err(err) => {
                tracing::warn!(error = %err, "persisted session is invalid, discarding");
                None
            }
        };

        let Some((user, token)) = restored else {
            self.clear_persisted();
            let mut state = self.lock();
            transition(&mut state, SessionPhase::Anonymous)?;
            tracing::info!("no stored session, continuing anonymously");
            return Ok(SessionPhase::Anonymous);
        };

        {
            let mut state = self.lock();
            self.activate(&mut state, user, token)?;
        }
        tracing::info!("stored session restored, pulling server cart");
        self.reconciler.load_from_backend().await;
        Ok(SessionPhase::Authenticated)
    }

    /// Adopt credentials, persist them and reconcile the cart. Resolves only
    /// after reconciliation has finished.
    pub async fn login(&self, user: SessionUser, token: String) -> AppResult<ReconcileOutcome> {
        user.validate()?;
        validate_token(&token)?;

        {
            let mut state = self.lock();
            if !state.phase.can_transition_to(SessionPhase::Authenticated) {
                return Err(AppError::InvalidTransition {
                    from: state.phase,
                    to: SessionPhase::Authenticated,
                });
            }
            self.persist_credentials(&user, &token)?;
            tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");
            self.activate(&mut state, user, token)?;
        }

        Ok(self.reconciler.reconcile().await)
    }

    /// Forget the credentials. The local cart is kept for anonymous use.
    pub async fn logout(&self) -> AppResult<()> {
        let mut state = self.lock();
        match state.phase {
            SessionPhase::Authenticated => {
                transition(&mut state, SessionPhase::Anonymous)?;
                state.user = None;
                self.token.clear();
                self.reconciler.epoch().advance();
                self.user_tx.send_replace(None);
                tracing::info!("user logged out");
            }
            SessionPhase::Anonymous => {
                tracing::debug!("logout without a session");
            }
            phase => {
                return Err(AppError::InvalidTransition {
                    from: phase,
                    to: SessionPhase::Anonymous,
                });
            }
        }
        drop(state);

        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        Ok(())
    }

    /// Adopt the `token` and `user` handed back by the OAuth provider.
    pub async fn complete_oauth(&self, query: OAuthCallbackQuery) -> AppResult<LoginRedirect> {
        let (user, token) = query.into_credentials()?;
        let role = user.role;
        self.login(user, token).await?;
        Ok(LoginRedirect {
            role,
            location: role.landing_path().to_string(),
        })
    }

    /// Replace the signed-in user, e.g. after a profile update.
    pub fn update_user(&self, user: SessionUser) -> AppResult<()> {
        user.validate()?;
        let mut state = self.lock();
        if state.phase != SessionPhase::Authenticated {
            return Err(AppError::Unauthorized);
        }
        self.storage.set(USER_KEY, &serde_json::to_string(&user)?)?;
        state.user = Some(user.clone());
        self.user_tx.send_replace(Some(user));
        Ok(())
    }

    fn activate(
        &self,
        state: &mut SessionState,
        user: SessionUser,
        token: String,
    ) -> AppResult<()> {
        transition(state, SessionPhase::Authenticated)?;
        state.user = Some(user.clone());
        self.token.set(token);
        self.reconciler.epoch().advance();
        self.user_tx.send_replace(Some(user));
        Ok(())
    }

    /// Store token and user together. A token is never left behind without
    /// its user.
    fn persist_credentials(&self, user: &SessionUser, token: &str) -> AppResult<()> {
        let raw_user = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        if let Err(err) = self.storage.set(USER_KEY, &raw_user) {
            self.clear_persisted();
            return Err(err);
        }
        Ok(())
    }

    fn read_persisted(&self) -> AppResult<Option<(SessionUser, String)>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;
        let (Some(token), Some(raw_user)) = (token, user) else {
            return Ok(None);
        };
        validate_token(&token)?;
        let user = SessionUser::decode(&raw_user)?;
        Ok(Some((user, token)))
    }

    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to clear stored session key");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn transition(state: &mut SessionState, next: SessionPhase) -> AppResult<()> {
    if !state.phase.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: state.phase,
            to: next,
        });
    }
    tracing::debug!(from = ?state.phase, to = ?next, "session transition");
    state.phase = next;
    Ok(())
}
