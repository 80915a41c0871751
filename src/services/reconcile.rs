//! Login-time cart reconciliation.
//!
//! The rule is push-xor-pull: a non-empty local cart replaces the server
//! cart, an empty one is replaced by the server cart. Lines are never
//! merged. Failures are logged and leave the local cart untouched.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    dto::cart::SyncCartItem,
    gateway::CartGateway,
    models::CartLine,
    services::cart_store::LocalCartStore,
};

/// Counter advanced on every login and logout. A pull that started under
/// one epoch is not applied once the epoch has moved on.
#[derive(Debug, Clone, Default)]
pub struct SessionEpoch(Arc<AtomicU64>);

impl SessionEpoch {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.current() == epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Pull,
}

pub fn plan(local: &[CartLine]) -> Direction {
    if local.is_empty() {
        Direction::Pull
    } else {
        Direction::Push
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Pushed { lines: usize },
    Pulled { lines: usize },
    /// The session changed while the request was in flight.
    Discarded,
    Failed,
}

#[derive(Clone)]
pub struct CartReconciler {
    cart: Arc<LocalCartStore>,
    gateway: Arc<dyn CartGateway>,
    epoch: SessionEpoch,
}

impl CartReconciler {
    pub fn new(
        cart: Arc<LocalCartStore>,
        gateway: Arc<dyn CartGateway>,
        epoch: SessionEpoch,
    ) -> Self {
        Self {
            cart,
            gateway,
            epoch,
        }
    }

    pub fn epoch(&self) -> &SessionEpoch {
        &self.epoch
    }

    pub async fn reconcile(&self) -> ReconcileOutcome {
        match plan(&self.cart.lines()) {
            Direction::Push => self.sync_to_backend().await,
            Direction::Pull => self.load_from_backend().await,
        }
    }

    /// Replace the server cart with the local lines, then re-key them with
    /// the ids the server assigned.
    pub async fn sync_to_backend(&self) -> ReconcileOutcome {
        let items: Vec<SyncCartItem> = self.cart.lines().iter().map(SyncCartItem::from).collect();
        let epoch = self.epoch.current();

        self.cart.set_syncing(true);
        let result = self.gateway.sync(&items).await;
        self.cart.set_syncing(false);

        match result {
            Ok(_) if !self.epoch.is_current(epoch) => {
                tracing::info!(lines = items.len(), "cart pushed but session changed meanwhile");
                ReconcileOutcome::Discarded
            }
            Ok(server_lines) => {
                let adopted = self.cart.adopt_server_ids(&server_lines);
                tracing::info!(lines = items.len(), adopted, "local cart pushed to server");
                ReconcileOutcome::Pushed { lines: items.len() }
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to push cart to server");
                ReconcileOutcome::Failed
            }
        }
    }

    /// Replace the local lines with the server cart.
    pub async fn load_from_backend(&self) -> ReconcileOutcome {
        let epoch = self.epoch.current();

        self.cart.set_syncing(true);
        let result = self.gateway.fetch_cart().await;
        self.cart.set_syncing(false);

        match result {
            Ok(_) if !self.epoch.is_current(epoch) => {
                tracing::warn!("server cart arrived after the session changed, discarding");
                ReconcileOutcome::Discarded
            }
            Ok(server_lines) => {
                let lines: Vec<CartLine> = server_lines.into_iter().map(CartLine::from).collect();
                let count = lines.len();
                self.cart.replace_lines(lines);
                tracing::info!(lines = count, "server cart loaded");
                ReconcileOutcome::Pulled { lines: count }
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load cart from server");
                ReconcileOutcome::Failed
            }
        }
    }
}
