//! Call scopes.
//!
//! A [`Scope`] is passed explicitly to every database operation and to every
//! resolver. It carries exactly one bound [`Database`] and a cancellation
//! signal. Binding is strict: reading from an unbound scope or binding a
//! second database are construction-order bugs, reported as the fatal
//! `BindingMissing` / `BindingConflict` errors so the composition root can
//! fail fast.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::Notify;

use crate::error::{DatabaseError, DatabaseResult};
use crate::traits::Database;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared cancellation state. Cancelling a node cancels all nodes derived
/// from it.
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<Weak<CancelState>>>,
}

impl CancelState {
    fn root() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
            children: Mutex::new(Vec::new()),
        })
    }

    fn child(self: &Arc<Self>) -> Arc<Self> {
        let child = Self::root();
        let mut children = self.children.lock().expect("cancel lock poisoned");
        // Checked under the lock so a concurrent `cancel` either sees this
        // child or we see its flag.
        if self.is_cancelled() {
            child.cancelled.store(true, Ordering::SeqCst);
        } else {
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        child
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.notify.notify_waiters();
        let children = std::mem::take(&mut *self.children.lock().expect("cancel lock poisoned"));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }

    async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Cancels the scope returned alongside it by [`Scope::cancellable`], and
/// every scope derived from that one.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Cancel the scope and every scope derived from it. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Returns `true` once the scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A call scope: the carrier through which operations reach their database.
///
/// Cheap to clone; clones share the binding and the cancellation signal.
#[derive(Clone)]
pub struct Scope {
    database: Option<Arc<dyn Database>>,
    cancel: Arc<CancelState>,
}

impl Scope {
    /// An unbound, never-cancelled root scope.
    pub fn new() -> Self {
        Self {
            database: None,
            cancel: CancelState::root(),
        }
    }

    /// A root scope bound to `database`. The usual composition-root
    /// constructor.
    pub fn bound(database: Arc<dyn Database>) -> Self {
        Self {
            database: Some(database),
            cancel: CancelState::root(),
        }
    }

    /// A copy of this scope carrying `database`.
    ///
    /// Fails with `BindingConflict` if this scope is already bound.
    pub fn put(&self, database: Arc<dyn Database>) -> DatabaseResult<Scope> {
        if self.database.is_some() {
            return Err(DatabaseError::BindingConflict);
        }
        Ok(Self {
            database: Some(database),
            cancel: Arc::clone(&self.cancel),
        })
    }

    /// The bound database. Fails with `BindingMissing` if none is bound.
    pub fn get(&self) -> DatabaseResult<&Arc<dyn Database>> {
        self.database.as_ref().ok_or(DatabaseError::BindingMissing)
    }

    /// Returns `true` if a database is bound.
    pub fn is_bound(&self) -> bool {
        self.database.is_some()
    }

    /// A child scope with the same binding that can be cancelled on its own.
    /// Cancelling this scope also cancels the child.
    pub fn cancellable(&self) -> (Scope, CancelHandle) {
        let state = self.cancel.child();
        let scope = Self {
            database: self.database.clone(),
            cancel: Arc::clone(&state),
        };
        (scope, CancelHandle { state })
    }

    /// Returns `true` once this scope or one of its ancestors is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes once this scope is cancelled. Pending forever otherwise.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("bound", &self.is_bound())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
