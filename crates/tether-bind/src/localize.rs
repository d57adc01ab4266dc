#![forbid(unsafe_code)]

//! Replaceable text-formatting hook for default inner-content renders.
//!
//! The engine keeps one active localizer per thread. Inner-content bindings
//! without a derivation function format their key's raw value through it.
//! Replacing it affects every *subsequent* default render in this thread;
//! text already written stays until its key changes again.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

type Localizer = Rc<dyn Fn(&Value) -> String>;

thread_local! {
    static LOCALIZER: RefCell<Localizer> = RefCell::new(Rc::new(plain_text));
}

/// Install `localizer` as the active hook. The last call wins; there is no
/// unregistration, only [`reset_localizer`].
pub fn localize_with(localizer: impl Fn(&Value) -> String + 'static) {
    LOCALIZER.with(|slot| *slot.borrow_mut() = Rc::new(localizer));
    tracing::debug!("localizer replaced");
}

/// Restore the default [`plain_text`] hook.
pub fn reset_localizer() {
    LOCALIZER.with(|slot| *slot.borrow_mut() = Rc::new(plain_text));
}

/// Format `value` with the active hook.
#[must_use]
pub fn localize(value: &Value) -> String {
    // Clone out so the hook itself may call `localize_with`.
    let localizer = LOCALIZER.with(|slot| Rc::clone(&slot.borrow()));
    localizer(value)
}

/// Generic display conversion.
///
/// Strings are written without quotes, arrays are comma-joined with null
/// items left empty, and everything else uses its JSON text.
#[must_use]
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => plain_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
