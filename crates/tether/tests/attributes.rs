//! Attribute bindings end to end.

mod common;

use tether::prelude::*;
use tether::{Url, binding_count};

#[test]
fn simple_case_follows_the_model() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": 111})).unwrap();
    let el = doc.create_element("div");
    el.set_attribute("class", "keep");
    el.bind_attr("data-test", &model, "value").unwrap();
    assert_eq!(el.get_attribute("data-test").as_deref(), Some("111"));
    let names = el.attribute_names();

    model.set("value", 222).unwrap();
    assert_eq!(el.get_attribute("data-test").as_deref(), Some("222"));
    assert_eq!(el.attribute_names(), names, "no other attribute touched");
    assert_eq!(el.get_attribute("class").as_deref(), Some("keep"));
}

#[test]
fn custom_translation() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": "abc"})).unwrap();
    let el = doc.create_element("div");
    el.bind_attr_with("data-test", &model, "value", |s: &State| {
        s.str("value").unwrap_or_default().to_uppercase()
    })
    .unwrap();
    assert_eq!(el.get_attribute("data-test").as_deref(), Some("ABC"));

    model.set("value", "xyz").unwrap();
    assert_eq!(el.get_attribute("data-test").as_deref(), Some("XYZ"));
}

#[test]
fn attribute_default_ignores_localizer() {
    common::init_tracing();
    localize_with(|_| "localized".to_owned());
    let doc = Document::new();
    let model = Model::from_value(json!({"value": "raw"})).unwrap();
    let el = doc.create_element("div");
    el.bind_attr("title", &model, "value").unwrap();
    assert_eq!(el.get_attribute("title").as_deref(), Some("raw"));
}

#[test]
fn script_tag_refused() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": 1})).unwrap();
    let err = doc
        .create_element("script")
        .bind_attr("data-test", &model, "value")
        .unwrap_err();
    assert_eq!(err.to_string(), "XSS: no bindings allowed on SCRIPT tag.");
    assert_eq!(model.total_ears(), 0);
}

#[test]
fn event_handler_refused() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": "alert(1)"})).unwrap();
    let el = doc.create_element("img");
    let err = el.bind_attr("onError", &model, "value").unwrap_err();
    assert_eq!(
        err.to_string(),
        "XSS: not allowing binding to onerror event handler."
    );
    assert!(!el.has_attribute("onerror"));
}

#[test]
fn javascript_url_refused_at_first_write() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": "javascript:alert(1)"})).unwrap();
    let el = doc.create_element("img");
    let err = el.bind_attr("src", &model, "value").unwrap_err();
    assert_eq!(
        err.to_string(),
        "XSS: not allowing javascript: protocol in a src attribute."
    );
    assert!(!el.has_attribute("src"));
    assert_eq!(model.ear_count("value"), 0);
}

#[test]
fn javascript_url_refused_on_later_write() {
    common::init_tracing();
    let doc = Document::with_base_url(Url::parse("https://example.com/app/").unwrap());
    let model = Model::from_value(json!({"value": "next"})).unwrap();
    let el = doc.create_element("a");
    el.bind_attr("href", &model, "value").unwrap();
    assert_eq!(el.get_attribute("href").as_deref(), Some("next"));

    let err = model.set("value", "javascript:alert(1)").unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert_eq!(
        err.to_string(),
        "XSS: not allowing javascript: protocol in a href attribute."
    );
    assert_eq!(el.get_attribute("href").as_deref(), Some("next"));
    assert_eq!(
        model.get("value"),
        Some(json!("javascript:alert(1)")),
        "the mutation itself took effect"
    );

    model.set("value", "https://example.org/").unwrap();
    assert_eq!(
        el.get_attribute("href").as_deref(),
        Some("https://example.org/")
    );
}

#[test]
fn failing_ear_does_not_stop_the_others() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"value": "/ok"})).unwrap();
    let link = doc.create_element("a");
    let label = doc.create_element("span");
    link.bind_attr("href", &model, "value").unwrap();
    label.bind_attr("title", &model, "value").unwrap();

    assert!(model.set("value", "data:text/html,hi").is_err());
    assert_eq!(link.get_attribute("href").as_deref(), Some("/ok"));
    assert_eq!(
        label.get_attribute("title").as_deref(),
        Some("data:text/html,hi")
    );
}

#[test]
fn chained_calls_and_multiple_keys() {
    common::init_tracing();
    let doc = Document::new();
    let model = Model::from_value(json!({"w": 10, "h": 20})).unwrap();
    let el = doc.create_element("div");
    el.bind_attr_with("data-size", &model, ["w", "h"], |s: &State| {
        format!("{}x{}", s["w"], s["h"])
    })
    .unwrap()
    .bind_attr("data-w", &model, "w")
    .unwrap();
    assert_eq!(el.get_attribute("data-size").as_deref(), Some("10x20"));
    assert_eq!(binding_count(&el), 3);

    model.set("h", 30).unwrap();
    assert_eq!(el.get_attribute("data-size").as_deref(), Some("10x30"));
    assert_eq!(el.get_attribute("data-w").as_deref(), Some("10"));
}
