//! Inner-content bindings end to end.

mod common;

use tether::prelude::*;
use tether::{plain_text, reset_localizer};

#[test]
fn simple_case_follows_the_model() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"name": "Ada"})).unwrap();
    let el = doc.create_element("span");
    el.bind_inner(&model, "name").unwrap();
    assert_eq!(el.inner_text(), "Ada");

    model.set("name", "Grace").unwrap();
    assert_eq!(el.inner_text(), "Grace");
}

#[test]
fn multiple_keys_recompute_from_full_state() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"firstName": "Ada", "lastName": "Byron"})).unwrap();
    let el = doc.create_element("h1");
    el.bind_inner_with(&model, ["firstName", "lastName"], |s: &State| {
        format!(
            "Hello, {} {}!",
            s.str("firstName").unwrap_or_default(),
            s.str("lastName").unwrap_or_default()
        )
    })
    .unwrap();
    assert_eq!(el.inner_text(), "Hello, Ada Byron!");

    model.set("lastName", "Lovelace").unwrap();
    assert_eq!(el.inner_text(), "Hello, Ada Lovelace!");
    model.set("firstName", "Augusta").unwrap();
    assert_eq!(el.inner_text(), "Hello, Augusta Lovelace!");
}

#[test]
fn localizer_applies_to_subsequent_writes_only() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"greeting": "hello", "other": "x"})).unwrap();
    let first = doc.create_element("span");
    first.bind_inner(&model, "greeting").unwrap();
    assert_eq!(first.inner_text(), "hello");

    localize_with(|v| plain_text(v).to_uppercase());
    assert_eq!(first.inner_text(), "hello", "existing text is not re-rendered");

    model.set("other", "y").unwrap();
    assert_eq!(first.inner_text(), "hello", "unrelated keys do not re-render");

    model.set("greeting", "bonjour").unwrap();
    assert_eq!(first.inner_text(), "BONJOUR");

    let second = doc.create_element("span");
    second.bind_inner(&model, "other").unwrap();
    assert_eq!(second.inner_text(), "Y");
    reset_localizer();
}

#[test]
fn derivation_failure_is_reported_unmodified() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"n": 1})).unwrap();
    let el = doc.create_element("span");
    el.bind_inner_with(&model, "n", |s: &State| match s.i64("n") {
        Some(n) if n > 0 => Ok(n.to_string()),
        _ => Err("n must be positive"),
    })
    .unwrap();
    assert_eq!(el.inner_text(), "1");

    let err = model.set("n", -1).unwrap_err();
    assert_eq!(err.to_string(), "n must be positive");
    assert_eq!(el.inner_text(), "1");
}

#[test]
fn style_tag_refused() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"css": "body{}"})).unwrap();
    let err = doc
        .create_element("style")
        .bind_inner(&model, "css")
        .unwrap_err();
    assert_eq!(err.to_string(), "XSS: no bindings allowed on STYLE tag.");
}

#[test]
fn reentrant_set_notifies_synchronously() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"celsius": 0, "fahrenheit": 32})).unwrap();
    let shown = doc.create_element("output");
    shown.bind_inner(&model, "fahrenheit").unwrap();

    let writer = model.downgrade();
    model
        .hear("celsius", move |m: &Model| {
            let celsius = m.get("celsius").and_then(|v| v.as_i64()).unwrap_or(0);
            if let Some(model) = writer.upgrade() {
                model.set("fahrenheit", celsius * 9 / 5 + 32)?;
            }
            Ok(())
        })
        .unwrap();

    model.set("celsius", 100).unwrap();
    assert_eq!(shown.inner_text(), "212");
}

#[test]
fn derivation_may_write_to_the_model() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"n": 1, "renders": 0})).unwrap();
    let counter = doc.create_element("small");
    counter.bind_inner(&model, "renders").unwrap();

    let writer = model.downgrade();
    let el = doc.create_element("span");
    el.bind_inner_with(&model, "n", move |s: &State| {
        if let Some(model) = writer.upgrade() {
            let renders = s.i64("renders").unwrap_or(0) + 1;
            model.set("renders", renders).unwrap();
        }
        format!("n={}", s["n"])
    })
    .unwrap();
    assert_eq!(el.inner_text(), "n=1");
    assert_eq!(counter.inner_text(), "1");

    model.set("n", 2).unwrap();
    assert_eq!(el.inner_text(), "n=2");
    assert_eq!(counter.inner_text(), "2");
    assert_eq!(model.get("renders"), Some(json!(2)));
}

#[test]
fn static_text_derivation() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"online": true})).unwrap();
    let el = doc.create_element("span");
    el.bind_inner_with(&model, "online", |s: &State| {
        if s["online"] == json!(true) { "online" } else { "offline" }
    })
    .unwrap();
    assert_eq!(el.inner_text(), "online");

    model.set("online", false).unwrap();
    assert_eq!(el.inner_text(), "offline");
}
