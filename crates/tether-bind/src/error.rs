#![forbid(unsafe_code)]

//! Binding errors.
//!
//! [`InjectionError`] is the single injection-safety kind; every sanitization
//! failure maps to one of its variants. [`BindError`] is what the public
//! attachment API returns and what failing ears report back through
//! [`Model::set`](tether_model::Model::set).

use tether_dom::DomError;
use tether_model::HearError;

/// Failure of a caller-supplied derivation or factory, carried unmodified.
pub type DeriveError = Box<dyn std::error::Error>;

/// A write was refused because it could introduce script execution or
/// unsafe navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionError {
    /// The element's tag never accepts bindings.
    Tag { tag: String },
    /// The attribute is an event handler.
    EventHandler { attribute: String },
    /// A URL attribute resolved to a scheme outside the allowlist.
    /// `protocol` includes the trailing colon, e.g. `"javascript:"`.
    Protocol { protocol: String, attribute: String },
    /// A URL attribute value could not be resolved at all.
    MalformedUrl { attribute: String, value: String },
}

impl std::fmt::Display for InjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag { tag } => write!(f, "XSS: no bindings allowed on {tag} tag."),
            Self::EventHandler { attribute } => {
                write!(f, "XSS: not allowing binding to {attribute} event handler.")
            }
            Self::Protocol {
                protocol,
                attribute,
            } => write!(
                f,
                "XSS: not allowing {protocol} protocol in a {attribute} attribute."
            ),
            Self::MalformedUrl { attribute, value } => write!(
                f,
                "XSS: not allowing unresolvable URL {value:?} in a {attribute} attribute."
            ),
        }
    }
}

impl std::error::Error for InjectionError {}

/// Errors from attaching or running a binding.
#[derive(Debug)]
pub enum BindError {
    /// A sanitization check refused the binding or the write.
    Injection(InjectionError),
    /// The derivation function or factory failed.
    Derive(DeriveError),
    /// The factory produced nodes that cannot be inserted.
    Dom(DomError),
}

impl BindError {
    /// The injection-safety violation, if that is what this is.
    #[must_use]
    pub fn as_injection(&self) -> Option<&InjectionError> {
        match self {
            Self::Injection(err) => Some(err),
            _ => None,
        }
    }

    /// Recover the first failure of a rejected registration.
    ///
    /// Ears created by this crate fail with a boxed `BindError`; anything else
    /// is treated as a derivation failure.
    pub(crate) fn from_hear(err: HearError) -> Self {
        let Some(first) = err.into_failures().into_iter().next() else {
            return Self::Derive("binding rejected without a reason".into());
        };
        match first.downcast::<BindError>() {
            Ok(bind) => *bind,
            Err(other) => Self::Derive(other),
        }
    }
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injection(err) => write!(f, "{err}"),
            Self::Derive(err) => write!(f, "{err}"),
            Self::Dom(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Injection(err) => Some(err),
            Self::Derive(err) => Some(err.as_ref()),
            Self::Dom(err) => Some(err),
        }
    }
}

impl From<InjectionError> for BindError {
    fn from(err: InjectionError) -> Self {
        Self::Injection(err)
    }
}

impl From<DomError> for BindError {
    fn from(err: DomError) -> Self {
        Self::Dom(err)
    }
}
