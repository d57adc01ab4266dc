#![forbid(unsafe_code)]

//! Observable keyed model for Tether.
//!
//! - [`Model`]: a shared map of JSON values. Every key has its own
//!   notification channel; listeners ("ears") registered with
//!   [`Model::hear`] run synchronously whenever that key changes.
//! - [`State`]: an immutable snapshot of the whole model, handed to
//!   derivation functions.
//! - [`WeakModel`]: a non-owning handle that never keeps a model alive.
//!
//! # Architecture
//!
//! `Model` uses `Rc<..>` with interior `RefCell`s for single-threaded shared
//! ownership. Ears are owned by the model; nothing an ear captures is
//! reachable from the model's values, so dropping the last `Model` handle
//! drops every ear with it.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes a value.
//! 2. Ears for a key run in registration order, before `set` returns.
//! 3. Setting a value equal to the current one is a no-op (no version bump,
//!    no notifications).
//! 4. No borrow is held while an ear runs, so ears may mutate the model and
//!    re-enter notification for other keys.
//! 5. An ear removed earlier in a notification cycle is not invoked later in
//!    that cycle.

pub mod error;
pub mod model;
pub mod state;

pub use error::{EarError, HearError, ModelError};
pub use model::{EarId, EarResult, Model, WeakModel};
pub use serde_json::{Value, json};
pub use state::State;
