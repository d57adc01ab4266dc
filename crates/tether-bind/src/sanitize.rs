#![forbid(unsafe_code)]

//! Injection-safety gate.
//!
//! Checks are split by when they can be decided:
//!
//! - **Construction time** (value-independent): the element's tag and, for
//!   attribute bindings, the attribute name. Neither can change later.
//! - **Write time** (value-dependent): the scheme a URL attribute resolves
//!   to. The value is model-driven, so it is re-checked on every write.
//!
//! This is a narrow gate over a fixed set of vectors, not a general
//! sanitizer.

use tether_dom::Element;
use url::Url;

use crate::error::InjectionError;

/// Tags (upper-case) that never accept bindings: script execution, style
/// sheets, nested documents.
pub const DENIED_TAGS: [&str; 3] = ["SCRIPT", "STYLE", "IFRAME"];

/// Attribute names (lower-case) whose values are navigated to or loaded.
pub const URL_ATTRIBUTES: [&str; 7] = [
    "href",
    "src",
    "srcdoc",
    "data",
    "xlink:href",
    "action",
    "formaction",
];

/// Prefix shared by every event-handler attribute.
pub const EVENT_HANDLER_PREFIX: &str = "on";

/// URL schemes an attribute may resolve to.
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Refuse elements whose tag is in [`DENIED_TAGS`].
///
/// # Errors
///
/// [`InjectionError::Tag`] naming the upper-case tag.
pub fn check_tag(element: &Element) -> Result<(), InjectionError> {
    let tag = element.tag_name();
    if DENIED_TAGS.contains(&tag.as_str()) {
        tracing::warn!(node = %element.id(), %tag, "binding refused on denied tag");
        return Err(InjectionError::Tag { tag });
    }
    Ok(())
}

/// Normalize an attribute name and refuse event handlers.
///
/// Returns the lower-cased name the binding writes to.
///
/// # Errors
///
/// [`InjectionError::EventHandler`] when the name starts with
/// [`EVENT_HANDLER_PREFIX`], ignoring case.
pub fn check_attribute_name(attribute: &str) -> Result<String, InjectionError> {
    let attribute = attribute.to_ascii_lowercase();
    if attribute.starts_with(EVENT_HANDLER_PREFIX) {
        tracing::warn!(%attribute, "binding refused on event handler attribute");
        return Err(InjectionError::EventHandler { attribute });
    }
    Ok(attribute)
}

/// Whether writes to `attribute` (lower-case) go through [`check_url`].
#[must_use]
pub fn carries_url(attribute: &str) -> bool {
    URL_ATTRIBUTES.contains(&attribute)
}

/// Resolve `value` against `base` and refuse schemes outside
/// [`ALLOWED_SCHEMES`].
///
/// # Errors
///
/// - [`InjectionError::Protocol`] for a disallowed scheme.
/// - [`InjectionError::MalformedUrl`] when `value` cannot be resolved.
pub fn check_url(attribute: &str, value: &str, base: &Url) -> Result<(), InjectionError> {
    let resolved = base.join(value).map_err(|_| {
        tracing::warn!(%attribute, value, "unresolvable URL refused");
        InjectionError::MalformedUrl {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        }
    })?;
    if ALLOWED_SCHEMES.contains(&resolved.scheme()) {
        return Ok(());
    }
    tracing::warn!(%attribute, scheme = resolved.scheme(), "URL scheme refused");
    Err(InjectionError::Protocol {
        protocol: format!("{}:", resolved.scheme()),
        attribute: attribute.to_owned(),
    })
}
