#![forbid(unsafe_code)]

//! Tether public facade and prelude.
//!
//! Re-exports the element tree ([`dom`]), the observable model ([`model`])
//! and the binding engine ([`bind`]). Most programs only need the prelude:
//!
//! ```ignore
//! use tether::prelude::*;
//!
//! let doc = Document::new();
//! let model = Model::from_value(json!({"count": 1}))?;
//! let label = doc.create_element("span");
//! label.bind_inner(&model, "count")?;
//! doc.body().append_child(label.as_node())?;
//!
//! model.set("count", 2)?;
//! assert_eq!(label.inner_text(), "2");
//! ```

pub use tether_bind as bind;
pub use tether_dom as dom;
pub use tether_model as model;

pub use tether_bind::{
    Bind, BindError, InjectionError, IntoReplacement, Keys, Rendered, Replacement, binding_count,
    install, is_lingering, localize_with, plain_text, release, reset_localizer,
};
pub use tether_dom::{Document, DomError, Element, Node, NodeId, Url};
pub use tether_model::{HearError, Model, ModelError, State, Value, json};

/// Everything needed to build and bind a tree.
pub mod prelude {
    pub use tether_bind::{Bind, BindError, InjectionError, Replacement, localize_with};
    pub use tether_dom::{Document, Element, Node};
    pub use tether_model::{Model, State, Value, json};
}
