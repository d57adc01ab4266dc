#![forbid(unsafe_code)]

//! Public attachment API.
//!
//! Every entry point expands its keys into one binding per key. For each
//! key the binder is constructed (construction-time checks run here), its
//! ear is registered with the model and invoked once immediately, and the
//! binding is recorded against the element. A failure anywhere aborts the
//! call: bindings for earlier keys stay in place, the failing one is never
//! left registered.

use std::rc::Rc;

use tether_dom::Element;
use tether_model::{EarResult, Model, State};

use crate::binder::{
    AttrBinder, Binder, InnerBinder, IntoReplacement, ReplaceBinder, Rendered, erase_derive,
    erase_factory,
};
use crate::error::{BindError, DeriveError};
use crate::{observer, registry};

/// One or more model keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keys(Vec<String>);

impl Keys {
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Self(vec![key.to_owned()])
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<&String> for Keys {
    fn from(key: &String) -> Self {
        Self(vec![key.clone()])
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|key| (*key).to_owned()).collect())
    }
}

impl From<&[&str]> for Keys {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|key| (*key).to_owned()).collect())
    }
}

impl From<Vec<&str>> for Keys {
    fn from(keys: Vec<&str>) -> Self {
        Self(keys.into_iter().map(str::to_owned).collect())
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

/// Reactive bindings on an element.
///
/// All methods return the element again so calls chain:
///
/// ```ignore
/// link.bind_attr("href", &model, "url")?
///     .bind_inner(&model, "label")?;
/// ```
pub trait Bind {
    /// Keep `attribute` equal to the plain text of each key's value.
    ///
    /// # Errors
    ///
    /// [`BindError::Injection`] for a denied tag, an event-handler attribute,
    /// or a URL attribute whose first value has a disallowed scheme.
    fn bind_attr(
        &self,
        attribute: &str,
        model: &Model,
        keys: impl Into<Keys>,
    ) -> Result<&Self, BindError>;

    /// Keep `attribute` equal to `derive` over the model's full state,
    /// recomputed whenever any of `keys` changes.
    ///
    /// # Errors
    ///
    /// As [`bind_attr`](Self::bind_attr), plus [`BindError::Derive`] when the
    /// first derivation fails.
    fn bind_attr_with<F, R>(
        &self,
        attribute: &str,
        model: &Model,
        keys: impl Into<Keys>,
        derive: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: Rendered;

    /// Keep the text content equal to each key's value, formatted by the
    /// active localizer.
    ///
    /// # Errors
    ///
    /// [`BindError::Injection`] for a denied tag.
    fn bind_inner(&self, model: &Model, keys: impl Into<Keys>) -> Result<&Self, BindError>;

    /// Keep the text content equal to `derive` over the model's full state.
    ///
    /// # Errors
    ///
    /// As [`bind_inner`](Self::bind_inner), plus [`BindError::Derive`].
    fn bind_inner_with<F, R>(
        &self,
        model: &Model,
        keys: impl Into<Keys>,
        derive: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: Rendered;

    /// Rebuild the child set from `factory` whenever any of `keys` changes.
    ///
    /// # Errors
    ///
    /// [`BindError::Injection`] for a denied tag, [`BindError::Derive`] when
    /// the first factory call fails, [`BindError::Dom`] when it returns an
    /// ancestor.
    fn bind_replace<F, R>(
        &self,
        model: &Model,
        keys: impl Into<Keys>,
        factory: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: IntoReplacement;

    /// Exempt this element from automatic cleanup.
    ///
    /// Bindings created earlier are forgotten without unsubscribing; later
    /// ones are never tracked. Their ears live as long as the model.
    fn linger_bindings(&self) -> &Self;
}

impl Bind for Element {
    fn bind_attr(
        &self,
        attribute: &str,
        model: &Model,
        keys: impl Into<Keys>,
    ) -> Result<&Self, BindError> {
        let keys: Keys = keys.into();
        for key in keys.iter() {
            subscribe(self, model, key, AttrBinder::new(self, attribute, key, None)?)?;
        }
        Ok(self)
    }

    fn bind_attr_with<F, R>(
        &self,
        attribute: &str,
        model: &Model,
        keys: impl Into<Keys>,
        derive: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: Rendered,
    {
        let derive = erase_derive(derive);
        let keys: Keys = keys.into();
        for key in keys.iter() {
            let binder = AttrBinder::new(self, attribute, key, Some(Rc::clone(&derive)))?;
            subscribe(self, model, key, binder)?;
        }
        Ok(self)
    }

    fn bind_inner(&self, model: &Model, keys: impl Into<Keys>) -> Result<&Self, BindError> {
        let keys: Keys = keys.into();
        for key in keys.iter() {
            subscribe(self, model, key, InnerBinder::new(self, key, None)?)?;
        }
        Ok(self)
    }

    fn bind_inner_with<F, R>(
        &self,
        model: &Model,
        keys: impl Into<Keys>,
        derive: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: Rendered,
    {
        let derive = erase_derive(derive);
        let keys: Keys = keys.into();
        for key in keys.iter() {
            let binder = InnerBinder::new(self, key, Some(Rc::clone(&derive)))?;
            subscribe(self, model, key, binder)?;
        }
        Ok(self)
    }

    fn bind_replace<F, R>(
        &self,
        model: &Model,
        keys: impl Into<Keys>,
        factory: F,
    ) -> Result<&Self, BindError>
    where
        F: Fn(&State) -> R + 'static,
        R: IntoReplacement,
    {
        let factory = erase_factory(factory);
        let keys: Keys = keys.into();
        for key in keys.iter() {
            let binder = ReplaceBinder::new(self, Rc::clone(&factory))?;
            subscribe(self, model, key, binder)?;
        }
        Ok(self)
    }

    fn linger_bindings(&self) -> &Self {
        registry::linger(self);
        self
    }
}

fn subscribe(
    element: &Element,
    model: &Model,
    key: &str,
    binder: impl Binder,
) -> Result<(), BindError> {
    let strategy = binder.strategy();
    let ear = model
        .hear(key, move |model: &Model| -> EarResult {
            binder
                .on_change(model)
                .map_err(|err| -> DeriveError { Box::new(err) })
        })
        .map_err(BindError::from_hear)?;
    registry::attach(element, registry::Binding::new(model, key, ear));
    observer::ensure_installed(element);
    tracing::debug!(node = %element.id(), key, strategy, %ear, "binding created");
    Ok(())
}
