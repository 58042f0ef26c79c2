//! Session Store
//!
//! Holds the [`Session`] and mutates it only through [`SessionStore::dispatch`].
//! Each applied change bumps the version and notifies observers in
//! registration order with a snapshot of the new session. Dispatches that
//! change nothing notify nobody.
//!
//! Derived values are exposed as [`Projection`]s: watch channels that only
//! publish when the derived value differs from the previous one.

use crate::action::SessionAction;
use crate::reducer::reduce;
use crate::session::Session;
use chainreq_types::RestRequest;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Callback invoked with the session after every change
pub type Observer = Arc<dyn Fn(&Session) + Send + Sync>;

/// Handle returned by [`SessionStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
struct Versioned {
    session: Session,
    version: u64,
}

/// Single-writer store for one session
pub struct SessionStore {
    state: Mutex<Versioned>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("version", &self.version())
            .field("observers", &self.observers.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl SessionStore {
    /// Store holding `session` at version 0
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            state: Mutex::new(Versioned {
                session,
                version: 0,
            }),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Current session
    #[must_use]
    pub fn value(&self) -> Session {
        self.state.lock().session.clone()
    }

    /// Number of applied changes
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Apply a transition; returns whether the session changed
    pub fn dispatch(&self, action: SessionAction) -> bool {
        let name = action.name();
        let snapshot = {
            let mut state = self.state.lock();
            let patch = reduce(&state.session, action);
            if !patch.apply(&mut state.session) {
                tracing::trace!(action = name, "Dispatch left session unchanged");
                return false;
            }
            state.version += 1;
            tracing::debug!(action = name, version = state.version, "Session updated");
            state.session.clone()
        };
        self.notify(&snapshot);
        true
    }

    /// Put the default request template back
    pub fn reset_request(&self) -> bool {
        self.dispatch(SessionAction::SetRequest(RestRequest::default()))
    }

    /// Register an observer
    ///
    /// The observer is called once with the current session, then after every
    /// change.
    pub fn subscribe(&self, observer: impl Fn(&Session) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let observer: Observer = Arc::new(observer);
        observer(&self.value());
        self.observers.lock().push((id, observer));
        id
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    fn notify(&self, session: &Session) {
        // Observers may dispatch; call them without holding the list lock
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(session);
        }
    }

    /// Distinct-until-changed projection of the session
    pub fn select<T, F>(&self, project: F) -> Projection<T>
    where
        T: PartialEq + Clone + Send + Sync + 'static,
        F: Fn(&Session) -> T + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(project(&self.value()));
        self.subscribe(move |session| {
            publish(&tx, project(session));
        });
        Projection { rx }
    }

    /// Projection recomputed only when its source slice changes
    ///
    /// `derive` runs once per distinct `slice` value; the result is then
    /// published only if it differs from the previous one.
    pub fn select_map<S, T, FS, FD>(&self, slice: FS, derive: FD) -> Projection<T>
    where
        S: PartialEq + Send + 'static,
        T: PartialEq + Clone + Send + Sync + 'static,
        FS: Fn(&Session) -> S + Send + Sync + 'static,
        FD: Fn(&S) -> T + Send + Sync + 'static,
    {
        let source = slice(&self.value());
        let (tx, rx) = watch::channel(derive(&source));
        let last = Mutex::new(source);
        self.subscribe(move |session| {
            let source = slice(session);
            let mut last = last.lock();
            if *last == source {
                return;
            }
            publish(&tx, derive(&source));
            *last = source;
        });
        Projection { rx }
    }

    /// Projection that only takes the values `filter` keeps
    ///
    /// Holds `None` until the first kept value.
    pub fn select_some<T, F>(&self, filter: F) -> Projection<Option<T>>
    where
        T: PartialEq + Clone + Send + Sync + 'static,
        F: Fn(&Session) -> Option<T> + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(filter(&self.value()));
        self.subscribe(move |session| {
            if let Some(next) = filter(session) {
                publish(&tx, Some(next));
            }
        });
        Projection { rx }
    }
}

fn publish<T: PartialEq>(tx: &watch::Sender<T>, next: T) {
    tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// Read-only derived value of the session
#[derive(Debug, Clone)]
pub struct Projection<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Projection<T> {
    /// Current value
    #[must_use]
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next distinct value
    ///
    /// `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Check if a value was published since the last read
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Underlying watch receiver
    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }
}
