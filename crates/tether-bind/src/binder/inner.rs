#![forbid(unsafe_code)]

use std::fmt;

use serde_json::Value;
use tether_dom::{Element, WeakElement};
use tether_model::Model;

use super::{Binder, Derive};
use crate::error::BindError;
use crate::localize::localize;
use crate::sanitize;

/// Writes an element's text content from one model key.
pub struct InnerBinder {
    element: WeakElement,
    key: String,
    derive: Option<Derive>,
}

impl InnerBinder {
    /// # Errors
    ///
    /// [`InjectionError::Tag`](crate::InjectionError::Tag) for a denied tag.
    pub(crate) fn new(element: &Element, key: &str, derive: Option<Derive>) -> Result<Self, BindError> {
        sanitize::check_tag(element)?;
        Ok(Self {
            element: element.downgrade(),
            key: key.to_owned(),
            derive,
        })
    }
}

impl Binder for InnerBinder {
    fn strategy(&self) -> &'static str {
        "inner"
    }

    fn on_change(&self, model: &Model) -> Result<(), BindError> {
        let Some(element) = self.element.upgrade() else {
            return Ok(());
        };
        let text = match &self.derive {
            Some(derive) => derive(&model.snapshot()).map_err(BindError::Derive)?,
            None => localize(&model.get(&self.key).unwrap_or(Value::Null)),
        };
        tracing::trace!(node = %element.id(), key = %self.key, "text write");
        element.set_inner_text(&text);
        Ok(())
    }
}

impl fmt::Debug for InnerBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InnerBinder")
            .field("key", &self.key)
            .field("derived", &self.derive.is_some())
            .finish()
    }
}
