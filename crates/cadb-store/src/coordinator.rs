//! Resolution coordination.
//!
//! The in-flight registry is the `InFlight` state of the entry table, so
//! deciding "resolved / join / lead" and the transition into `InFlight` are a
//! single critical section: two callers can never both become the leader for
//! one identity. Each flight is a `watch` channel carrying the eventual
//! outcome; every waiter holds a receiver and observes the same published
//! outcome.

use std::sync::Arc;

use cadb_types::ObjectId;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::FailurePolicy;
use crate::entry::{EntryState, EntryTable};
use crate::error::{DatabaseError, DatabaseResult};
use crate::object::Recipe;
use crate::scope::Scope;

/// What one resolution round produced.
pub(crate) type Outcome = DatabaseResult<Arc<Value>>;

// ---------------------------------------------------------------------------
// Flight
// ---------------------------------------------------------------------------

/// Registry record of a resolution in progress.
pub(crate) struct Flight {
    id: ObjectId,
    outcome: watch::Receiver<Option<Outcome>>,
}

impl Flight {
    fn open(id: ObjectId) -> (FlightPublisher, Flight) {
        let (tx, rx) = watch::channel(None);
        (FlightPublisher { id, tx }, Flight { id, outcome: rx })
    }

    /// The publisher was dropped without publishing: the task running the
    /// computation is gone (runtime shutdown) and nothing will settle it.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.outcome.has_changed().is_err() && self.outcome.borrow().is_none()
    }

    pub(crate) fn join(&self) -> FlightWaiter {
        FlightWaiter {
            id: self.id,
            outcome: self.outcome.clone(),
        }
    }
}

/// Held by the task running the computation.
pub(crate) struct FlightPublisher {
    id: ObjectId,
    tx: watch::Sender<Option<Outcome>>,
}

impl FlightPublisher {
    fn publish(self, outcome: Outcome) {
        // Never fails: the entry's `Flight` may already be gone but waiters
        // that subscribed still observe the value.
        self.tx.send_replace(Some(outcome));
    }
}

/// One observer of a flight.
pub(crate) struct FlightWaiter {
    id: ObjectId,
    outcome: watch::Receiver<Option<Outcome>>,
}

impl FlightWaiter {
    /// Wait for the flight's outcome, or until `scope` is cancelled.
    ///
    /// Cancellation only detaches this observer; the computation and the
    /// other waiters are unaffected.
    pub(crate) async fn wait(mut self, scope: &Scope) -> Outcome {
        let id = self.id;
        tokio::select! {
            biased;
            published = self.outcome.wait_for(Option::is_some) => match published {
                Ok(outcome) => outcome
                    .clone()
                    .unwrap_or_else(|| Err(DatabaseError::resolution_failed(id, DatabaseError::Abandoned))),
                Err(_) => Err(DatabaseError::resolution_failed(id, DatabaseError::Abandoned)),
            },
            _ = scope.cancelled() => {
                warn!(id = %id.short_hex(), "waiter cancelled; resolution continues");
                Err(DatabaseError::Cancelled(id))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// How a `resolve` call proceeds.
pub(crate) enum Admission {
    /// The entry already holds its final value.
    Ready(Arc<Value>),
    /// Another caller is resolving; wait for its outcome.
    Join(FlightWaiter),
    /// This caller starts the resolution and must run `recipe`, then
    /// [`settle`] with the publisher.
    Lead {
        recipe: Recipe,
        publisher: FlightPublisher,
        waiter: FlightWaiter,
    },
}

/// Decide how a resolve of `id` proceeds, registering a new flight when this
/// caller is the first.
pub(crate) fn admit(
    table: &EntryTable,
    id: ObjectId,
    failure_policy: FailurePolicy,
) -> DatabaseResult<Admission> {
    table.update(&id, |entry| -> DatabaseResult<Admission> {
        let entry = entry.ok_or(DatabaseError::NotFound(id))?;
        let abandoned = match &entry.state {
            EntryState::InFlight { recipe, flight } if flight.is_abandoned() => {
                Some(recipe.clone())
            }
            _ => None,
        };
        if let Some(recipe) = abandoned {
            warn!(id = %id.short_hex(), "in-flight resolution was abandoned; recording failure");
            entry.state = EntryState::Failed {
                recipe,
                error: DatabaseError::resolution_failed(id, DatabaseError::Abandoned),
            };
        }
        match &entry.state {
            EntryState::Resolved(value) => Ok(Admission::Ready(Arc::clone(value))),
            EntryState::InFlight { flight, .. } => Ok(Admission::Join(flight.join())),
            EntryState::Failed { error, .. } if failure_policy == FailurePolicy::Sticky => {
                Err(error.clone())
            }
            EntryState::Pending(recipe) | EntryState::Failed { recipe, .. } => {
                let recipe = recipe.clone();
                let (publisher, flight) = Flight::open(id);
                let waiter = flight.join();
                entry.state = EntryState::InFlight {
                    recipe: recipe.clone(),
                    flight,
                };
                debug!(id = %id.short_hex(), kind = %recipe.kind, "resolution started");
                Ok(Admission::Lead {
                    recipe,
                    publisher,
                    waiter,
                })
            }
        }
    })
}

/// Record the outcome of a resolution round and release every waiter.
///
/// Success makes the entry permanently `Resolved`. Failure leaves it `Failed`
/// with the recipe kept, so no invalid value is ever cached.
pub(crate) fn settle(table: &EntryTable, publisher: FlightPublisher, outcome: Outcome) {
    let id = publisher.id;
    table.update(&id, |entry| {
        let Some(entry) = entry else {
            return;
        };
        let recipe = match &entry.state {
            EntryState::InFlight { recipe, .. } => recipe.clone(),
            _ => return,
        };
        entry.state = match &outcome {
            Ok(value) => {
                debug!(id = %id.short_hex(), "resolution completed");
                EntryState::Resolved(Arc::clone(value))
            }
            Err(error) => {
                warn!(id = %id.short_hex(), %error, "resolution failed");
                EntryState::Failed {
                    recipe,
                    error: error.clone(),
                }
            }
        };
    });
    publisher.publish(outcome);
}
