#![forbid(unsafe_code)]

use std::fmt;

use serde_json::Value;
use tether_dom::{Element, WeakElement};
use tether_model::Model;

use super::{Binder, Derive};
use crate::error::BindError;
use crate::localize::plain_text;
use crate::sanitize;

/// Writes one attribute from one model key.
pub struct AttrBinder {
    element: WeakElement,
    attribute: String,
    key: String,
    derive: Option<Derive>,
    check_url: bool,
}

impl AttrBinder {
    /// # Errors
    ///
    /// [`InjectionError::Tag`](crate::InjectionError::Tag) for a denied tag,
    /// [`InjectionError::EventHandler`](crate::InjectionError::EventHandler)
    /// for an `on*` attribute.
    pub(crate) fn new(
        element: &Element,
        attribute: &str,
        key: &str,
        derive: Option<Derive>,
    ) -> Result<Self, BindError> {
        sanitize::check_tag(element)?;
        let attribute = sanitize::check_attribute_name(attribute)?;
        let check_url = sanitize::carries_url(&attribute);
        Ok(Self {
            element: element.downgrade(),
            attribute,
            key: key.to_owned(),
            derive,
            check_url,
        })
    }

    /// The lower-cased attribute this binder writes.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl Binder for AttrBinder {
    fn strategy(&self) -> &'static str {
        "attribute"
    }

    fn on_change(&self, model: &Model) -> Result<(), BindError> {
        let Some(element) = self.element.upgrade() else {
            return Ok(());
        };
        let value = match &self.derive {
            Some(derive) => derive(&model.snapshot()).map_err(BindError::Derive)?,
            None => plain_text(&model.get(&self.key).unwrap_or(Value::Null)),
        };
        if self.check_url {
            sanitize::check_url(&self.attribute, &value, &element.base_url())?;
        }
        tracing::trace!(node = %element.id(), attribute = %self.attribute, %value, "attribute write");
        element.set_attribute(&self.attribute, &value);
        Ok(())
    }
}

impl fmt::Debug for AttrBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrBinder")
            .field("attribute", &self.attribute)
            .field("key", &self.key)
            .field("derived", &self.derive.is_some())
            .field("check_url", &self.check_url)
            .finish()
    }
}
