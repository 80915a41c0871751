//! Unread-notification polling and notification list state.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    dto::notifications::NotificationFeed,
    error::AppResult,
    gateway::NotificationGateway,
    models::{Notification, SessionUser},
};

#[derive(Debug, Default)]
struct NotificationState {
    items: Vec<Notification>,
    unread_count: u64,
    error: Option<String>,
}

pub struct NotificationCenter {
    gateway: Arc<dyn NotificationGateway>,
    state: Mutex<NotificationState>,
}

impl NotificationCenter {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self {
            gateway,
            state: Mutex::new(NotificationState::default()),
        }
    }

    pub fn unread_count(&self) -> u64 {
        self.lock().unread_count
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn feed(&self) -> NotificationFeed {
        let state = self.lock();
        NotificationFeed {
            items: state.items.clone(),
            unread_count: state.unread_count,
            error: state.error.clone(),
        }
    }

    /// Drop everything held for the previous user.
    pub fn reset(&self) {
        *self.lock() = NotificationState::default();
    }

    pub async fn refresh_unread(&self) {
        match self.gateway.unread_count().await {
            Ok(count) => self.lock().unread_count = count,
            Err(err) => tracing::warn!(error = %err, "failed to refresh unread notifications"),
        }
    }

    pub async fn fetch(&self) -> AppResult<Vec<Notification>> {
        match self.gateway.list().await {
            Ok(items) => {
                let mut state = self.lock();
                state.unread_count = items.iter().filter(|n| !n.read).count() as u64;
                state.items = items.clone();
                state.error = None;
                Ok(items)
            }
            Err(err) => {
                self.lock().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn mark_as_read(&self, id: &str) {
        let result = self.gateway.mark_read(id).await;
        self.apply(result, |state| {
            // Items not in the loaded list still count against the badge.
            let was_unread = match state.items.iter_mut().find(|n| n.id == id) {
                Some(item) => !std::mem::replace(&mut item.read, true),
                None => true,
            };
            if was_unread {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        });
    }

    pub async fn mark_all_as_read(&self) {
        let result = self.gateway.mark_all_read().await;
        self.apply(result, |state| {
            state.items.iter_mut().for_each(|n| n.read = true);
            state.unread_count = 0;
        });
    }

    pub async fn delete(&self, id: &str) {
        let result = self.gateway.delete(id).await;
        self.apply(result, |state| {
            let Some(index) = state.items.iter().position(|n| n.id == id) else {
                return;
            };
            let removed = state.items.remove(index);
            if !removed.read {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        });
    }

    /// Apply `update` once the request has succeeded. A failure is kept as
    /// the current error; nothing local is changed or rolled back.
    fn apply(&self, result: AppResult<()>, update: impl FnOnce(&mut NotificationState)) {
        let mut state = self.lock();
        match result {
            Ok(()) => {
                update(&mut *state);
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "notification request failed");
                state.error = Some(err.to_string());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotificationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Refresh the unread count immediately and then every `period` while a user
/// is signed in. Polling stops (and the count is reset) when the user goes
/// away and resumes on the next sign-in. The task ends when the session
/// store is dropped.
pub fn spawn_unread_poller(
    center: Arc<NotificationCenter>,
    mut user: watch::Receiver<Option<SessionUser>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let user_id = user.borrow_and_update().as_ref().map(|u| u.id.clone());
            let Some(user_id) = user_id else {
                center.reset();
                if user.changed().await.is_err() {
                    return;
                }
                continue;
            };

            tracing::debug!(user_id = %user_id, "notification polling started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => center.refresh_unread().await,
                    changed = user.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        let signed_in = user.borrow_and_update().is_some();
                        if !signed_in {
                            tracing::debug!(user_id = %user_id, "notification polling stopped");
                            break;
                        }
                        ticker.reset_immediately();
                    }
                }
            }
        }
    })
}
