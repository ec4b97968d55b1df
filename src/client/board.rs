use chrono::Utc;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use super::reconcile::merge;
use super::{ClientError, IdeaApi, UpvoteStorage};
use crate::models::{Idea, MAX_IDEA_CHARS, SortMode};

pub const PLACEHOLDER_PREFIX: &str = "temp-";
pub const LOAD_FAILED: &str = "Failed to load ideas. Please try again.";
pub const EMPTY_SUBMISSION: &str = "Please enter an idea";
pub const SUBMISSION_TOO_LONG: &str = "Idea must be 280 characters or less";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpvoteOutcome {
    /// Server accepted the vote; the idea as the server returned it.
    Applied(Idea),
    /// This client already voted for the idea, nothing was sent.
    AlreadyUpvoted,
    /// The id is a local placeholder the server has not confirmed yet.
    NotConfirmed,
}

#[derive(Default)]
struct BoardState {
    sort: SortMode,
    confirmed: Vec<Idea>,
    pending: Vec<Idea>,
    // optimistic +1s not yet reflected in `confirmed`
    vote_deltas: HashMap<String, u64>,
    in_flight: HashSet<String>,
    upvoted: BTreeSet<String>,
    last_error: Option<String>,
    // bumped by every local change; a list fetched under an older value is dropped
    generation: u64,
}

impl BoardState {
    fn upvoted_ids(&self) -> Vec<String> {
        self.upvoted.iter().cloned().collect()
    }

    fn remove_delta(&mut self, id: &str) {
        if let Some(delta) = self.vote_deltas.get_mut(id) {
            *delta = delta.saturating_sub(1);
            if *delta == 0 {
                self.vote_deltas.remove(id);
            }
        }
    }
}

/// Client-side idea board with optimistic updates.
///
/// Displayed ideas are the server-confirmed list merged with locally pending
/// placeholders, plus any optimistic vote increments still awaiting the
/// server. A failed request rolls its optimistic change back.
pub struct Board<A, S> {
    api: A,
    storage: S,
    state: Mutex<BoardState>,
    placeholder_seq: AtomicU64,
}

impl<A: IdeaApi, S: UpvoteStorage> Board<A, S> {
    /// Build a board, loading the persisted upvoted set from `storage`.
    pub fn new(api: A, storage: S) -> Result<Self, ClientError> {
        let upvoted = storage.load()?.into_iter().collect();

        Ok(Self {
            api,
            storage,
            state: Mutex::new(BoardState {
                upvoted,
                ..BoardState::default()
            }),
            placeholder_seq: AtomicU64::new(0),
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn sort(&self) -> SortMode {
        self.state.lock().await.sort
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn has_upvoted(&self, id: &str) -> bool {
        self.state.lock().await.upvoted.contains(id)
    }

    /// What the UI renders right now.
    pub async fn displayed(&self) -> Vec<Idea> {
        let state = self.state.lock().await;
        let mut ideas = merge(&state.confirmed, &state.pending);

        for idea in ideas.iter_mut() {
            if let Some(delta) = state.vote_deltas.get(&idea.id) {
                idea.votes += delta;
            }
        }

        ideas
    }

    /// Re-fetch the list for the current sort mode.
    ///
    /// A response is discarded if a sort switch, submit or upvote happened
    /// after the request went out, since it may predate that change.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let (sort, generation) = {
            let state = self.state.lock().await;
            (state.sort, state.generation)
        };

        match self.api.list(sort).await {
            Ok(ideas) => {
                let mut state = self.state.lock().await;
                if state.generation != generation {
                    debug!("Dropping stale idea list");
                    return Ok(());
                }

                state.confirmed = ideas;
                let BoardState {
                    vote_deltas,
                    in_flight,
                    ..
                } = &mut *state;
                vote_deltas.retain(|id, _| in_flight.contains(id));
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to refresh ideas: {}", e);
                self.state.lock().await.last_error = Some(LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    pub async fn set_sort(&self, sort: SortMode) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock().await;
            if state.sort == sort {
                return Ok(());
            }
            state.sort = sort;
            state.confirmed.clear();
            state.generation += 1;
        }
        self.refresh().await
    }

    /// Called when the window regains focus.
    pub async fn on_focus(&self) -> Result<(), ClientError> {
        self.refresh().await
    }

    /// Post a new idea, showing a placeholder until the server answers.
    pub async fn submit(&self, text: &str) -> Result<Idea, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::Invalid(EMPTY_SUBMISSION.to_string()));
        }
        if text.chars().count() > MAX_IDEA_CHARS {
            return Err(ClientError::Invalid(SUBMISSION_TOO_LONG.to_string()));
        }

        let placeholder = Idea {
            id: format!(
                "{}{}-{}",
                PLACEHOLDER_PREFIX,
                Utc::now().timestamp_millis(),
                self.placeholder_seq.fetch_add(1, Ordering::Relaxed)
            ),
            text: text.to_string(),
            votes: 0,
            created_at: Utc::now(),
        };
        let placeholder_id = placeholder.id.clone();

        self.state.lock().await.pending.insert(0, placeholder);

        let result = self.api.create(text).await;

        // the placeholder goes either way
        {
            let mut state = self.state.lock().await;
            state.pending.retain(|i| i.id != placeholder_id);
            if result.is_ok() {
                state.generation += 1;
            }
        }

        let idea = result?;
        debug!(id = %idea.id, "Idea submitted");

        if let Err(e) = self.refresh().await {
            debug!("Refresh after submit failed: {}", e);
        }

        Ok(idea)
    }

    /// Upvote once per client, bumping the displayed count before the server confirms.
    pub async fn upvote(&self, id: &str) -> Result<UpvoteOutcome, ClientError> {
        if id.starts_with(PLACEHOLDER_PREFIX) {
            return Ok(UpvoteOutcome::NotConfirmed);
        }

        {
            let mut state = self.state.lock().await;
            if !state.upvoted.insert(id.to_string()) {
                return Ok(UpvoteOutcome::AlreadyUpvoted);
            }
            *state.vote_deltas.entry(id.to_string()).or_insert(0) += 1;
            state.in_flight.insert(id.to_string());
            state.generation += 1;
            self.persist(&state.upvoted_ids());
        }

        match self.api.upvote(id).await {
            Ok(idea) => {
                {
                    let mut state = self.state.lock().await;
                    state.in_flight.remove(id);
                    state.remove_delta(id);
                    state.generation += 1;
                    if let Some(existing) = state.confirmed.iter_mut().find(|i| i.id == idea.id) {
                        *existing = idea.clone();
                    }
                }

                if let Err(e) = self.refresh().await {
                    debug!("Refresh after upvote failed: {}", e);
                }
                Ok(UpvoteOutcome::Applied(idea))
            }
            Err(e) => {
                warn!(id, "Upvote failed, reverting: {}", e);
                {
                    let mut state = self.state.lock().await;
                    state.in_flight.remove(id);
                    state.remove_delta(id);
                    state.upvoted.remove(id);
                    state.generation += 1;
                    self.persist(&state.upvoted_ids());
                }

                if let Err(e) = self.refresh().await {
                    debug!("Refresh after failed upvote failed: {}", e);
                }
                Err(e)
            }
        }
    }

    // losing the local record only re-enables the button, so a failed save is logged and skipped
    fn persist(&self, ids: &[String]) {
        if let Err(e) = self.storage.save(ids) {
            warn!("Failed to persist upvoted ideas: {}", e);
        }
    }
}

impl<A, S> Board<A, S>
where
    A: IdeaApi + 'static,
    S: UpvoteStorage + 'static,
{
    /// [`Board::spawn_poller`] at [`DEFAULT_POLL_INTERVAL`].
    pub fn spawn_default_poller(self: &Arc<Self>) -> PollerHandle {
        self.spawn_poller(DEFAULT_POLL_INTERVAL)
    }

    /// Refresh now and then every `period` until the handle is shut down.
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> PollerHandle {
        let board = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // failures are recorded in last_error, the next tick retries
                        let _ = board.refresh().await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        PollerHandle {
            shutdown_tx,
            handle,
        }
    }
}

pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}
