#![forbid(unsafe_code)]

use std::fmt;

use tether_dom::{Element, WeakElement};
use tether_model::Model;

use super::{Binder, Factory, Replacement};
use crate::error::BindError;
use crate::sanitize;

/// Rebuilds an element's child set from a factory.
pub struct ReplaceBinder {
    element: WeakElement,
    factory: Factory,
}

impl ReplaceBinder {
    /// # Errors
    ///
    /// [`InjectionError::Tag`](crate::InjectionError::Tag) for a denied tag.
    pub(crate) fn new(element: &Element, factory: Factory) -> Result<Self, BindError> {
        sanitize::check_tag(element)?;
        Ok(Self {
            element: element.downgrade(),
            factory,
        })
    }
}

impl Binder for ReplaceBinder {
    fn strategy(&self) -> &'static str {
        "replace"
    }

    fn on_change(&self, model: &Model) -> Result<(), BindError> {
        let Some(element) = self.element.upgrade() else {
            return Ok(());
        };
        // Snapshot first: the factory may write to the model.
        let state = model.snapshot();
        let replacement = (self.factory)(&state).map_err(BindError::Derive)?;
        match replacement {
            Replacement::Unchanged => {
                tracing::trace!(node = %element.id(), "factory left children unchanged");
            }
            Replacement::One(node) => {
                tracing::trace!(node = %element.id(), children = 1, "children replaced");
                element.replace_children([node])?;
            }
            Replacement::Many(nodes) => {
                tracing::trace!(node = %element.id(), children = nodes.len(), "children replaced");
                element.replace_children(nodes)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ReplaceBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceBinder")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}
