use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{ReactionAggregate, ReactionKind, ReactionRecord, ReactionRemote, ReactionView};
use crate::error::{ApiError, ApiResult, ReactionError, ReactionResult};

type PairKey = (String, String);

#[derive(Default)]
struct LedgerState {
    aggregates: HashMap<String, ReactionAggregate>,
    /// Absent key: not known yet. `Some(None)`: known to have no reaction.
    mine: HashMap<PairKey, Option<ReactionKind>>,
    in_flight: HashSet<PairKey>,
    /// Bumped when a toggle starts or settles and on release.
    epoch: u64,
    /// Epoch of the last local change per item, pair and release.
    item_changed: HashMap<String, u64>,
    pair_changed: HashMap<PairKey, u64>,
    released: HashMap<String, u64>,
}

impl LedgerState {
    fn bump(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Record a local change to the pair and its item.
    fn touch(&mut self, key: &PairKey) {
        let epoch = self.bump();
        self.item_changed.insert(key.0.clone(), epoch);
        self.pair_changed.insert(key.clone(), epoch);
    }

    fn item_changed_since(&self, content_id: &str, epoch: u64) -> bool {
        self.item_changed.get(content_id).is_some_and(|e| *e > epoch)
    }

    fn pair_changed_since(&self, key: &PairKey, epoch: u64) -> bool {
        self.pair_changed.get(key).is_some_and(|e| *e > epoch)
            || self.released.get(&key.0).is_some_and(|e| *e > epoch)
    }
}

/// Reaction state for every mounted content view.
///
/// Toggles on the same `(content, user)` pair are serialized by refusing a
/// second toggle while one is in flight; toggles on different pairs run
/// independently.
pub struct ReactionLedger {
    remote: Arc<dyn ReactionRemote>,
    state: Mutex<LedgerState>,
}

/// Marks a pair as in flight until dropped.
struct InFlight<'a> {
    ledger: &'a ReactionLedger,
    key: PairKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.ledger.state();
        state.in_flight.remove(&self.key);
        state.touch(&self.key);
    }
}

impl ReactionLedger {
    /// Create an empty ledger.
    pub fn new(remote: Arc<dyn ReactionRemote>) -> Self {
        Self {
            remote,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Fetch the aggregate and the user's reaction for a freshly mounted view.
    ///
    /// A toggle or release that started or settled while the load was
    /// outstanding wins; the load's values are returned but not cached.
    pub async fn load(&self, content_id: &str, user_id: &str) -> ReactionResult<ReactionView> {
        let key = pair(content_id, user_id);
        let started = self.state().epoch;

        let (counts, mine) = tokio::join!(
            self.remote.fetch_counts(content_id),
            self.lookup_mine(content_id, user_id)
        );
        let fetched = ReactionAggregate {
            content_id: content_id.to_string(),
            counts: counts?,
        };
        let fetched_mine = mine?;

        let mut state = self.state();
        let aggregate = if state.item_changed_since(content_id, started) {
            debug!(content_id = %content_id, "Discarding aggregate from superseded load");
            state
                .aggregates
                .get(content_id)
                .cloned()
                .unwrap_or(fetched)
        } else {
            state
                .aggregates
                .insert(content_id.to_string(), fetched.clone());
            fetched
        };

        let pending = state.in_flight.contains(&key);
        let mine = if pending || state.pair_changed_since(&key, started) {
            state.mine.get(&key).copied().flatten()
        } else {
            state.mine.insert(key, fetched_mine);
            fetched_mine
        };

        Ok(ReactionView {
            aggregate,
            mine,
            pending,
        })
    }

    /// React with `kind`, or withdraw the reaction if it is already `kind`.
    ///
    /// Returns the freshly fetched aggregate. The user's own reaction is
    /// updated immediately and restored if the remote call fails.
    pub async fn toggle(
        &self,
        content_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> ReactionResult<ReactionAggregate> {
        let start = Instant::now();
        let key = pair(content_id, user_id);
        let _in_flight = self.begin(&key)?;

        let known = self.state().mine.get(&key).copied();
        let prior = match known {
            Some(prior) => prior,
            None => self.lookup_mine(content_id, user_id).await?,
        };
        let next = if prior == Some(kind) { None } else { Some(kind) };

        self.state().mine.insert(key.clone(), next);
        debug!(
            content_id = %content_id,
            user_id = %user_id,
            prior = ?prior,
            next = ?next,
            "Optimistic reaction update"
        );

        let mutation = match next {
            None => self.remote.delete_reaction(content_id, user_id).await,
            Some(kind) => {
                let record = ReactionRecord {
                    content_id: content_id.to_string(),
                    user_id: user_id.to_string(),
                    kind,
                };
                self.remote.put_reaction(&record).await
            }
        };

        if let Err(e) = mutation {
            warn!(
                content_id = %content_id,
                user_id = %user_id,
                error = %e,
                "Reaction update failed; rolling back"
            );
            let mut state = self.state();
            if state.mine.contains_key(&key) {
                state.mine.insert(key, prior);
            }
            return Err(e.into());
        }

        let counts = match self.remote.fetch_counts(content_id).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(
                    content_id = %content_id,
                    error = %e,
                    "Reaction saved but aggregate refresh failed"
                );
                return Err(ReactionError::Reconcile { source: e });
            }
        };

        let aggregate = ReactionAggregate {
            content_id: content_id.to_string(),
            counts,
        };
        {
            let mut state = self.state();
            // Released views stay released.
            if state.mine.contains_key(&key) {
                state
                    .aggregates
                    .insert(content_id.to_string(), aggregate.clone());
            }
        }

        info!(
            content_id = %content_id,
            user_id = %user_id,
            reaction = ?next,
            total = aggregate.counts.total(),
            latency_ms = start.elapsed().as_millis(),
            "Reaction toggled"
        );

        Ok(aggregate)
    }

    /// The user's current (possibly optimistic) reaction, if known.
    pub fn mine(&self, content_id: &str, user_id: &str) -> Option<ReactionKind> {
        self.state()
            .mine
            .get(&pair(content_id, user_id))
            .copied()
            .flatten()
    }

    /// Last aggregate fetched for an item.
    pub fn aggregate(&self, content_id: &str) -> Option<ReactionAggregate> {
        self.state().aggregates.get(content_id).cloned()
    }

    /// Whether a toggle is in flight for the pair.
    pub fn is_pending(&self, content_id: &str, user_id: &str) -> bool {
        self.state().in_flight.contains(&pair(content_id, user_id))
    }

    /// Forget everything about an item once its view unmounts.
    pub fn release(&self, content_id: &str) {
        let mut state = self.state();
        let epoch = state.bump();
        state.aggregates.remove(content_id);
        state.mine.retain(|(c, _), _| c != content_id);
        state.pair_changed.retain(|(c, _), _| c != content_id);
        state.item_changed.insert(content_id.to_string(), epoch);
        state.released.insert(content_id.to_string(), epoch);
    }

    async fn lookup_mine(
        &self,
        content_id: &str,
        user_id: &str,
    ) -> ApiResult<Option<ReactionKind>> {
        match self.remote.fetch_reaction(content_id, user_id).await {
            Ok(kind) => Ok(kind),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn begin(&self, key: &PairKey) -> ReactionResult<InFlight<'_>> {
        let mut state = self.state();
        if !state.in_flight.insert(key.clone()) {
            return Err(ReactionError::InFlight {
                content_id: key.0.clone(),
                user_id: key.1.clone(),
            });
        }
        state.touch(key);
        Ok(InFlight {
            ledger: self,
            key: key.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn pair(content_id: &str, user_id: &str) -> PairKey {
    (content_id.to_string(), user_id.to_string())
}
