//! Local cart, persisted under `cart-storage`.
//!
//! Every mutation is two-phase: a synchronous transition on [`CartState`]
//! applied under the lock and persisted immediately, then an optional remote
//! call made after the lock is released. What happens when that remote call
//! fails is decided by [`CartOp::failure_policy`], not by the call site.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dto::cart::AddToCartRequest,
    error::{AppError, AppResult},
    gateway::CartGateway,
    models::{CartLine, NewCartLine, ServerCartLine},
    storage::{CART_KEY, DurableStorage},
};

const PERSIST_VERSION: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFailurePolicy {
    /// Undo the local transition and return the error to the caller.
    Rollback,
    /// Keep the local transition and only log the error.
    LogOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOp {
    Add,
    Remove,
    UpdateQuantity,
    Clear,
}

impl CartOp {
    pub fn failure_policy(self) -> SyncFailurePolicy {
        match self {
            CartOp::Add => SyncFailurePolicy::Rollback,
            CartOp::Remove | CartOp::UpdateQuantity | CartOp::Clear => SyncFailurePolicy::LogOnly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CartOp::Add => "add",
            CartOp::Remove => "remove",
            CartOp::UpdateQuantity => "update_quantity",
            CartOp::Clear => "clear",
        }
    }
}

/// What `CartState::add` did, kept so the add can be undone precisely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted { id: String },
    Incremented { id: String, added: u32 },
}

impl AddOutcome {
    pub fn id(&self) -> &str {
        match self {
            AddOutcome::Inserted { id } | AddOutcome::Incremented { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartLine>,
}

impl CartState {
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        Self { items }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, id: &str) -> Option<&CartLine> {
        self.items.iter().find(|l| l.id == id)
    }

    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.subtotal()))
    }

    /// Total price, or `None` if it does not fit in an `i64`.
    pub fn checked_total_price(&self) -> Option<i64> {
        self.items.iter().try_fold(0i64, |total, line| {
            line.price
                .checked_mul(i64::from(line.quantity))?
                .checked_add(total)
        })
    }

    /// Merge into the line with the same (product, size, color) or append a
    /// new line identified by `fresh_id`.
    pub fn add(&mut self, line: NewCartLine, fresh_id: String) -> AddOutcome {
        let existing = self.items.iter_mut().find(|l| {
            l.matches(&line.product_id, line.size.as_deref(), line.color.as_deref())
        });
        match existing {
            Some(current) => {
                let previous = current.quantity;
                current.quantity = previous.saturating_add(line.quantity);
                AddOutcome::Incremented {
                    id: current.id.clone(),
                    added: current.quantity - previous,
                }
            }
            None => {
                self.items.push(line.into_line(fresh_id.clone()));
                AddOutcome::Inserted { id: fresh_id }
            }
        }
    }

    pub fn revert_add(&mut self, outcome: &AddOutcome) {
        match outcome {
            AddOutcome::Inserted { id } => {
                self.remove(id);
            }
            AddOutcome::Incremented { id, added } => {
                if let Some(line) = self.items.iter_mut().find(|l| &l.id == id) {
                    line.quantity = line.quantity.saturating_sub(*added);
                }
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CartLine> {
        let index = self.items.iter().position(|l| l.id == id)?;
        Some(self.items.remove(index))
    }

    /// Returns the previous quantity, or `None` if there is no such line.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> Option<u32> {
        let line = self.items.iter_mut().find(|l| l.id == id)?;
        Some(std::mem::replace(&mut line.quantity, quantity))
    }

    /// Swap a local id for the one the server assigned. Ignored if the
    /// server id is already taken by another line; returns whether it swapped.
    pub fn adopt_id(&mut self, local_id: &str, server_id: &str) -> bool {
        if local_id == server_id || self.line(server_id).is_some() {
            return false;
        }
        match self.items.iter_mut().find(|l| l.id == local_id) {
            Some(line) => {
                line.id = server_id.to_string();
                true
            }
            None => false,
        }
    }

    /// Re-key local lines with the ids of the server lines of the same
    /// variant. Returns how many lines were re-keyed.
    pub fn adopt_server_ids(&mut self, server_lines: &[ServerCartLine]) -> usize {
        let mut adopted = 0;
        for server in server_lines {
            let size = server.size.as_deref();
            let color = server.color.as_deref();
            let Some(local_id) = self
                .items
                .iter()
                .find(|l| l.matches(&server.product_id, size, color))
                .map(|l| l.id.clone())
            else {
                continue;
            };
            if self.adopt_id(&local_id, &server.id) {
                adopted += 1;
            }
        }
        adopted
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn replace(&mut self, items: Vec<CartLine>) {
        self.items = items;
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    state: CartState,
    version: u32,
}

pub struct LocalCartStore {
    state: Mutex<CartState>,
    storage: Arc<dyn DurableStorage>,
    gateway: Arc<dyn CartGateway>,
    syncing: AtomicBool,
}

impl LocalCartStore {
    /// Hydrate from storage. An unreadable document yields an empty cart.
    pub fn open(storage: Arc<dyn DurableStorage>, gateway: Arc<dyn CartGateway>) -> Self {
        let state = match storage.get(CART_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(persisted) => persisted.state,
                Err(err) => {
                    tracing::warn!(error = %err, "persisted cart is unreadable, starting empty");
                    CartState::default()
                }
            },
            Ok(None) => CartState::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted cart");
                CartState::default()
            }
        };
        tracing::debug!(lines = state.lines().len(), "cart hydrated");

        Self {
            state: Mutex::new(state),
            storage,
            gateway,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> CartState {
        self.lock().clone()
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines().to_vec()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn total_items(&self) -> u64 {
        self.lock().total_items()
    }

    pub fn total_price(&self) -> i64 {
        self.lock().total_price()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    pub(crate) fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
    }

    /// Replace every line, e.g. with the server cart after a pull.
    pub fn replace_lines(&self, lines: Vec<CartLine>) {
        self.mutate(|state| state.replace(lines));
    }

    /// Take over the server ids returned by a push.
    pub fn adopt_server_ids(&self, server_lines: &[ServerCartLine]) -> usize {
        self.mutate(|state| state.adopt_server_ids(server_lines))
    }

    pub async fn add(&self, line: NewCartLine, authenticated: bool) -> AppResult<CartLine> {
        if line.quantity == 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".to_string(),
            ));
        }
        if line.price < 0 {
            return Err(AppError::BadRequest("price must not be negative".to_string()));
        }

        let request = AddToCartRequest::from(&line);
        let applied = self.mutate(|state| {
            let outcome = state.add(line, Uuid::new_v4().to_string());
            if state.checked_total_price().is_none() {
                state.revert_add(&outcome);
                return None;
            }
            let added = state.line(outcome.id()).cloned();
            Some((outcome, added))
        });
        let Some((outcome, added)) = applied else {
            return Err(AppError::BadRequest("cart total is out of range".to_string()));
        };
        tracing::debug!(
            line_id = outcome.id(),
            product_id = %request.product_id,
            "cart line added"
        );

        let mut line_id = outcome.id().to_string();
        if authenticated {
            let result = self.gateway.add_item(&request).await;
            let record = self.settle(CartOp::Add, result, |state| state.revert_add(&outcome))?;
            if let (Some(record), AddOutcome::Inserted { id }) = (record, &outcome) {
                if self.mutate(|state| state.adopt_id(id, &record.id)) {
                    line_id = record.id;
                }
            }
        }

        self.current_line(&line_id)
            .or(added)
            .ok_or(AppError::NotFound)
    }

    pub async fn remove(&self, id: &str, authenticated: bool) -> AppResult<()> {
        let removed = self.mutate(|state| state.remove(id));
        if removed.is_none() {
            tracing::debug!(line_id = id, "remove of unknown cart line ignored");
            return Ok(());
        }

        if authenticated {
            let result = self.gateway.remove_item(id).await;
            self.settle(CartOp::Remove, result, |_| {})?;
        }
        Ok(())
    }

    pub async fn update_quantity(
        &self,
        id: &str,
        quantity: i64,
        authenticated: bool,
    ) -> AppResult<()> {
        if quantity <= 0 {
            return self.remove(id, authenticated).await;
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| AppError::BadRequest("quantity is too large".to_string()))?;

        let applied = self.mutate(|state| {
            let previous = state.set_quantity(id, quantity).ok_or(AppError::NotFound)?;
            if state.checked_total_price().is_none() {
                state.set_quantity(id, previous);
                return Err(AppError::BadRequest("cart total is out of range".to_string()));
            }
            Ok(())
        });
        applied?;

        if authenticated {
            let result = self.gateway.update_item(id, quantity).await;
            self.settle(CartOp::UpdateQuantity, result, |_| {})?;
        }
        Ok(())
    }

    pub async fn clear(&self, authenticated: bool) -> AppResult<()> {
        self.mutate(CartState::clear);

        if authenticated {
            let result = self.gateway.clear().await;
            self.settle(CartOp::Clear, result, |_| {})?;
        }
        Ok(())
    }

    /// Apply the failure policy of `op` to the outcome of its remote call.
    /// Returns `Ok(None)` when a failure was absorbed.
    fn settle<T>(
        &self,
        op: CartOp,
        result: AppResult<T>,
        rollback: impl FnOnce(&mut CartState),
    ) -> AppResult<Option<T>> {
        let err = match result {
            Ok(value) => return Ok(Some(value)),
            Err(err) => err,
        };
        match op.failure_policy() {
            SyncFailurePolicy::Rollback => {
                tracing::warn!(op = op.as_str(), error = %err, "cart sync failed, rolling back");
                self.mutate(rollback);
                Err(err)
            }
            SyncFailurePolicy::LogOnly => {
                tracing::warn!(
                    op = op.as_str(),
                    error = %err,
                    "cart sync failed, keeping local state"
                );
                Ok(None)
            }
        }
    }

    fn current_line(&self, id: &str) -> Option<CartLine> {
        self.lock().line(id).cloned()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut CartState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut *state);
        self.persist(&*state);
        result
    }

    fn persist(&self, state: &CartState) {
        let persisted = PersistedCart {
            state: state.clone(),
            version: PERSIST_VERSION,
        };
        let outcome = serde_json::to_string(&persisted)
            .map_err(AppError::from)
            .and_then(|raw| self.storage.set(CART_KEY, &raw));
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
