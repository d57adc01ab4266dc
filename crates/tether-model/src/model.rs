#![forbid(unsafe_code)]

//! Shared keyed model with per-key listeners.
//!
//! # Performance
//!
//! | Operation      | Complexity                         |
//! |----------------|------------------------------------|
//! | `get()`        | O(1) average + value clone         |
//! | `set()`        | O(E) scan + O(K) snapshot per ear  |
//! | `hear()`       | O(1) amortized + one ear call      |
//! | `stop_hearing()` | O(E)                             |
//!
//! where E is the number of registered ears and K the number of keys.
//!
//! # Failure Modes
//!
//! - **Ear failure**: the remaining ears of the cycle still run; the failures
//!   are returned from `set()` as a [`HearError`]. The value has already been
//!   stored.
//! - **Failure on registration**: `hear()` runs the ear once immediately; if
//!   that call fails, the ear is removed again and the error is returned.
//! - **Ear leak**: ears are only removed by `stop_hearing()` or by dropping
//!   the last `Model` handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::{EarError, HearError, ModelError};
use crate::state::State;

/// Outcome of a single ear invocation.
pub type EarResult = Result<(), EarError>;

type Ear = Rc<dyn Fn(&Model) -> EarResult>;

/// Identity of a registered ear, unique within its model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EarId(u64);

impl fmt::Display for EarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ear-{}", self.0)
    }
}

struct Registration {
    id: EarId,
    key: String,
    ear: Ear,
}

struct ModelInner {
    state: RefCell<State>,
    ears: RefCell<Vec<Registration>>,
    next_ear: Cell<u64>,
    version: Cell<u64>,
}

/// A shared, observable map of JSON values.
///
/// Cloning a `Model` creates another handle to the **same** state and ears.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

impl Model {
    /// Create a model holding `state`.
    #[must_use]
    pub fn new(state: State) -> Self {
        Self {
            inner: Rc::new(ModelInner {
                state: RefCell::new(state),
                ears: RefCell::new(Vec::new()),
                next_ear: Cell::new(0),
                version: Cell::new(0),
            }),
        }
    }

    /// Create a model from a JSON object.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotAnObject`] when `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(map) => Ok(Self::new(State::from(map))),
            Value::Null => Err(ModelError::NotAnObject("null")),
            Value::Bool(_) => Err(ModelError::NotAnObject("a boolean")),
            Value::Number(_) => Err(ModelError::NotAnObject("a number")),
            Value::String(_) => Err(ModelError::NotAnObject("a string")),
            Value::Array(_) => Err(ModelError::NotAnObject("an array")),
        }
    }

    /// Clone of the value at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.borrow().get(key).cloned()
    }

    /// Snapshot of the full state.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.inner.state.borrow().clone()
    }

    /// Read the state by reference without cloning.
    ///
    /// The model must not be mutated from inside `f`.
    pub fn with_state<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Store `value` at `key` and notify that key's ears.
    ///
    /// Equal values are a no-op.
    ///
    /// # Errors
    ///
    /// [`HearError`] carrying every ear failure of this cycle. The new value
    /// is kept regardless.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), HearError> {
        let changed = self.inner.state.borrow_mut().replace(key, value.into());
        if !changed {
            return Ok(());
        }
        self.bump();
        self.notify(key)
    }

    /// Remove `key` and notify its ears. Missing keys are a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn remove(&self, key: &str) -> Result<(), HearError> {
        let removed = self.inner.state.borrow_mut().remove(key);
        if !removed {
            return Ok(());
        }
        self.bump();
        self.notify(key)
    }

    /// Register `ear` for changes of `key` and run it once immediately.
    ///
    /// # Errors
    ///
    /// [`HearError`] when the immediate call fails. The ear is not left
    /// registered in that case.
    pub fn hear(
        &self,
        key: &str,
        ear: impl Fn(&Model) -> EarResult + 'static,
    ) -> Result<EarId, HearError> {
        let id = EarId(self.inner.next_ear.get());
        self.inner.next_ear.set(id.0 + 1);
        let ear: Ear = Rc::new(ear);
        self.inner.ears.borrow_mut().push(Registration {
            id,
            key: key.to_owned(),
            ear: Rc::clone(&ear),
        });
        tracing::trace!(%id, key, "ear registered");

        if let Err(err) = ear(self) {
            self.stop_hearing(id);
            return Err(HearError::new(key, vec![err]));
        }
        Ok(id)
    }

    /// Deregister an ear. Returns whether it was registered.
    pub fn stop_hearing(&self, id: EarId) -> bool {
        let removed = {
            let mut ears = self.inner.ears.borrow_mut();
            let before = ears.len();
            ears.retain(|registration| registration.id != id);
            before != ears.len()
        };
        if removed {
            tracing::trace!(%id, "ear removed");
        }
        removed
    }

    /// Whether `id` is still registered.
    #[must_use]
    pub fn is_hearing(&self, id: EarId) -> bool {
        self.inner.ears.borrow().iter().any(|r| r.id == id)
    }

    /// Number of ears registered for `key`.
    #[must_use]
    pub fn ear_count(&self, key: &str) -> usize {
        self.inner.ears.borrow().iter().filter(|r| r.key == key).count()
    }

    /// Number of ears registered across all keys.
    #[must_use]
    pub fn total_ears(&self) -> usize {
        self.inner.ears.borrow().len()
    }

    /// Incremented once per value-changing mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle to this model.
    #[must_use]
    pub fn downgrade(&self) -> WeakModel {
        WeakModel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn bump(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
    }

    fn notify(&self, key: &str) -> Result<(), HearError> {
        // Collect first so no borrow is held while ears run.
        let ears: Vec<(EarId, Ear)> = self
            .inner
            .ears
            .borrow()
            .iter()
            .filter(|r| r.key == key)
            .map(|r| (r.id, Rc::clone(&r.ear)))
            .collect();
        tracing::trace!(key, ears = ears.len(), "notifying");

        let mut failures = Vec::new();
        for (id, ear) in ears {
            if !self.is_hearing(id) {
                continue;
            }
            if let Err(err) = ear(self) {
                tracing::debug!(%id, key, error = %err, "ear failed");
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HearError::new(key, failures))
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(State::new())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Model {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("state", &*self.inner.state.borrow())
            .field("version", &self.inner.version.get())
            .field("ears", &self.inner.ears.borrow().len())
            .finish()
    }
}

/// Non-owning model handle. Upgrading after the model is dropped yields
/// `None`.
#[derive(Clone, Default)]
pub struct WeakModel {
    inner: Weak<ModelInner>,
}

impl WeakModel {
    #[must_use]
    pub fn upgrade(&self) -> Option<Model> {
        self.inner.upgrade().map(|inner| Model { inner })
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

impl fmt::Debug for WeakModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakModel")
            .field("alive", &!self.is_dead())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
