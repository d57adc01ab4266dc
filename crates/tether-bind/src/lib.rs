#![forbid(unsafe_code)]

//! Injection-safe reactive bindings between [`Model`]s and [`Element`]s.
//!
//! Three strategies keep an element in sync with one or more model keys:
//!
//! - [`Bind::bind_attr`]: one attribute value.
//! - [`Bind::bind_inner`]: the text content, never parsed as markup.
//! - [`Bind::bind_replace`]: the whole child set, built by a factory.
//!
//! Every write passes a narrow [`sanitize`] gate: denied tags refuse all
//! bindings, `on*` attributes are refused, and URL attributes must resolve to
//! `http` or `https`.
//!
//! # Lifecycle
//!
//! Bindings are recorded per element. When a bound element is removed from
//! the observed document body, its bindings are unsubscribed on the next
//! [`Document::flush_mutations`](tether_dom::Document::flush_mutations).
//! Until then the element keeps receiving writes. [`Bind::linger_bindings`]
//! opts an element out of this cleanup.
//!
//! # Scope
//!
//! The engine is single-threaded. The localizer, the binding registry and
//! the removal observer are per-thread state.
//!
//! [`Model`]: tether_model::Model
//! [`Element`]: tether_dom::Element

mod api;
pub mod binder;
pub mod error;
pub mod localize;
pub mod observer;
pub mod registry;
pub mod sanitize;

pub use api::{Bind, Keys};
pub use binder::{IntoReplacement, Rendered, Replacement};
pub use error::{BindError, DeriveError, InjectionError};
pub use localize::{localize_with, plain_text, reset_localizer};
pub use observer::{install, is_observing};
pub use registry::{binding_count, is_lingering, release};
