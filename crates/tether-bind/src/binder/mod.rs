#![forbid(unsafe_code)]

//! Binding strategies.
//!
//! Each strategy is a [`Binder`]: constructed once per (element, key) with
//! its construction-time checks already passed, then invoked with the model
//! on registration and on every change of its key. Binders hold the element
//! weakly; a reclaimed element turns every later call into a no-op.
//!
//! | Strategy  | Writes                      | Default derivation       |
//! |-----------|-----------------------------|--------------------------|
//! | attribute | one attribute value         | [`plain_text`] of the key |
//! | inner     | text content (never markup) | [`localize`] of the key  |
//! | replace   | the whole child set         | none, factory required   |
//!
//! [`plain_text`]: crate::localize::plain_text
//! [`localize`]: crate::localize::localize

mod attr;
mod inner;
mod replace;

pub use attr::AttrBinder;
pub use inner::InnerBinder;
pub use replace::ReplaceBinder;

use std::rc::Rc;

use tether_dom::{Element, Node};
use tether_model::{Model, State};

use crate::error::{BindError, DeriveError};

/// One binding's reaction to a change of its key.
pub trait Binder: 'static {
    /// Short name used in log fields.
    fn strategy(&self) -> &'static str;

    /// Re-derive and write.
    ///
    /// # Errors
    ///
    /// Any sanitization, derivation or tree failure of this write.
    fn on_change(&self, model: &Model) -> Result<(), BindError>;
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// A type-erased string derivation.
pub(crate) type Derive = Rc<dyn Fn(&State) -> Result<String, DeriveError>>;

/// Values a string derivation may return.
pub trait Rendered {
    /// # Errors
    ///
    /// The derivation's own failure, unmodified.
    fn into_rendered(self) -> Result<String, DeriveError>;
}

impl Rendered for String {
    fn into_rendered(self) -> Result<String, DeriveError> {
        Ok(self)
    }
}

impl Rendered for &str {
    fn into_rendered(self) -> Result<String, DeriveError> {
        Ok(self.to_owned())
    }
}

impl<E: Into<DeriveError>> Rendered for Result<String, E> {
    fn into_rendered(self) -> Result<String, DeriveError> {
        self.map_err(Into::into)
    }
}

pub(crate) fn erase_derive<F, R>(derive: F) -> Derive
where
    F: Fn(&State) -> R + 'static,
    R: Rendered,
{
    Rc::new(move |state: &State| derive(state).into_rendered())
}

// ---------------------------------------------------------------------------
// Replacement outcomes
// ---------------------------------------------------------------------------

/// What a replacement factory decided.
#[derive(Clone, Debug, PartialEq)]
pub enum Replacement {
    /// Leave the current children untouched.
    Unchanged,
    /// Replace the children with exactly this node.
    One(Node),
    /// Replace the children with exactly these nodes, in order. May be empty.
    Many(Vec<Node>),
}

/// Values a replacement factory may return.
pub trait IntoReplacement {
    /// # Errors
    ///
    /// The factory's own failure, unmodified.
    fn into_replacement(self) -> Result<Replacement, DeriveError>;
}

impl IntoReplacement for Replacement {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        Ok(self)
    }
}

impl IntoReplacement for Node {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        Ok(Replacement::One(self))
    }
}

impl IntoReplacement for Element {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        Ok(Replacement::One(self.into()))
    }
}

impl IntoReplacement for Vec<Node> {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        Ok(Replacement::Many(self))
    }
}

impl IntoReplacement for Vec<Element> {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        Ok(Replacement::Many(self.into_iter().map(Node::from).collect()))
    }
}

/// `None` leaves the children untouched.
impl<T: IntoReplacement> IntoReplacement for Option<T> {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        self.map_or(Ok(Replacement::Unchanged), IntoReplacement::into_replacement)
    }
}

impl<T: IntoReplacement, E: Into<DeriveError>> IntoReplacement for Result<T, E> {
    fn into_replacement(self) -> Result<Replacement, DeriveError> {
        self.map_err(Into::into)?.into_replacement()
    }
}

/// A type-erased replacement factory.
pub(crate) type Factory = Rc<dyn Fn(&State) -> Result<Replacement, DeriveError>>;

pub(crate) fn erase_factory<F, R>(factory: F) -> Factory
where
    F: Fn(&State) -> R + 'static,
    R: IntoReplacement,
{
    Rc::new(move |state: &State| factory(state).into_replacement())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_dom::Document;

    #[test]
    fn rendered_passes_errors_through() {
        assert_eq!(String::from("x").into_rendered().unwrap(), "x");
        assert_eq!("static".into_rendered().unwrap(), "static");
        let failed: Result<String, &str> = Err("no name");
        assert_eq!(failed.into_rendered().unwrap_err().to_string(), "no name");
    }

    #[test]
    fn replacement_conversions() {
        let doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");

        assert_eq!(
            a.clone().into_replacement().unwrap(),
            Replacement::One(a.clone().into())
        );
        assert_eq!(
            vec![a.clone(), b.clone()].into_replacement().unwrap(),
            Replacement::Many(vec![a.clone().into(), b.into()])
        );
        assert_eq!(
            Vec::<Element>::new().into_replacement().unwrap(),
            Replacement::Many(Vec::new())
        );
        assert_eq!(
            None::<Element>.into_replacement().unwrap(),
            Replacement::Unchanged
        );
        let text = doc.create_text_node("t");
        assert!(matches!(
            Some(text.clone()).into_replacement().unwrap(),
            Replacement::One(node) if node.ptr_eq(&text)
        ));
    }

    #[test]
    fn failed_factory_result_is_an_error() {
        let failed: Result<Element, String> = Err("no rows".into());
        assert_eq!(failed.into_replacement().unwrap_err().to_string(), "no rows");

        let unchanged: Result<Option<Element>, &str> = Ok(None);
        assert_eq!(unchanged.into_replacement().unwrap(), Replacement::Unchanged);
    }
}
