//! Browser-side checks for the pieces that take JS values.
#![cfg(target_arch = "wasm32")]

use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

use touchkeys_wasm::{socket_url, Config, SendPolicy};

wasm_bindgen_test_configure!(run_in_browser);

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).expect("set");
    }
    object.into()
}

#[wasm_bindgen_test]
fn test_missing_options_use_defaults() {
    let config = Config::from_js(JsValue::UNDEFINED).expect("undefined");
    assert_eq!(config, Config::default());
    let config = Config::from_js(JsValue::NULL).expect("null");
    assert_eq!(config, Config::default());
}

#[wasm_bindgen_test]
fn test_options_object_is_read() {
    let config = Config::from_js(options(&[
        ("invert", JsValue::TRUE),
        ("keyColor", JsValue::from_str("#123")),
        ("sendPolicy", JsValue::from_str("always")),
        ("sendIntervalMs", JsValue::from_f64(25.0)),
    ]))
    .expect("options");

    assert!(config.invert);
    assert_eq!(config.key_color.as_deref(), Some("#123"));
    let settings = config.keyboard_settings();
    assert_eq!(settings.send_policy, SendPolicy::Always);
    assert_eq!(settings.send_interval.as_millis(), 25);
}

#[wasm_bindgen_test]
fn test_mistyped_option_is_ignored() {
    let config = Config::from_js(options(&[
        ("keyHeight", JsValue::from_str("tall")),
        ("bgColor", JsValue::from_str("navy")),
    ]))
    .expect("options");

    assert_eq!(config.key_height, None);
    assert_eq!(config.bg_color.as_deref(), Some("navy"));
}

#[wasm_bindgen_test]
fn test_socket_url_follows_page_scheme() {
    assert_eq!(socket_url("https:", "pad.local"), "wss://pad.local/ws");
    assert_eq!(socket_url("http:", "192.168.4.1"), "ws://192.168.4.1/ws");
}
