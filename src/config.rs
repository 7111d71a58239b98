//! Page configuration.
//!
//! The hosting page supplies a plain options object (usually a global
//! `config`). Presentation options become an injected stylesheet; the
//! remaining knobs tune the keyboard's timing and logging.
//!
//! Every field is optional and parsed leniently: a value of the wrong type
//! is treated as absent instead of rejecting the whole object.

use std::time::Duration;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use wasm_bindgen::JsValue;

use crate::constants::{HEARTBEAT_MISS_LIMIT, SEND_INTERVAL, WATCHDOG_INTERVAL};
use crate::error::{Error, Result};

/// Background used when `bgColor` is not given.
const DEFAULT_BG_COLOR: &str = "rgba(0, 0, 0, 0.9)";

/// When key state is sent relative to the previous touch event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendPolicy {
    /// Send only when the flags differ from the previous event's.
    #[default]
    OnChange,
    /// Send on every touch event.
    Always,
}

/// Options object as supplied by the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Reverse the key rows. Any truthy value counts.
    #[serde(deserialize_with = "truthy")]
    pub invert: bool,
    #[serde(deserialize_with = "lenient")]
    pub bg_color: Option<String>,
    /// Background image URL.
    #[serde(deserialize_with = "lenient")]
    pub bg_image: Option<String>,
    /// LED canvas opacity; `0` hides it.
    #[serde(deserialize_with = "lenient")]
    pub led_opacity: Option<f64>,
    /// Background of a pressed key.
    #[serde(deserialize_with = "lenient")]
    pub key_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub key_border_color: Option<String>,
    /// Release fade duration in milliseconds.
    #[serde(deserialize_with = "lenient")]
    pub key_color_fade: Option<f64>,
    /// Flex weight of the touch layer; `0` hides it.
    #[serde(deserialize_with = "lenient")]
    pub key_height: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub send_interval_ms: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub watchdog_interval_ms: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub heartbeat_miss_limit: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub send_policy: Option<SendPolicy>,
    /// `log` level name (`error` .. `trace`).
    #[serde(deserialize_with = "lenient")]
    pub log_level: Option<String>,
}

/// Deserialize any value, keeping it only if it has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize any value by its JavaScript truthiness.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Runtime knobs for [`crate::keyboard::Keyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardSettings {
    pub send_interval: Duration,
    pub watchdog_interval: Duration,
    pub heartbeat_miss_limit: u32,
    pub send_policy: SendPolicy,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            send_interval: SEND_INTERVAL,
            watchdog_interval: WATCHDOG_INTERVAL,
            heartbeat_miss_limit: HEARTBEAT_MISS_LIMIT,
            send_policy: SendPolicy::default(),
        }
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Millisecond option as a `Duration`, if it is positive and representable.
fn millis(value: Option<f64>) -> Option<Duration> {
    positive(value).and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
}

impl Config {
    /// Parse a JSON options object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a JS options object. `undefined` and `null` yield the defaults.
    pub fn from_js(value: JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| Error::Config(e.to_string()))
    }

    /// Timing and send policy, falling back to defaults for unusable values.
    #[must_use]
    pub fn keyboard_settings(&self) -> KeyboardSettings {
        let defaults = KeyboardSettings::default();
        KeyboardSettings {
            send_interval: millis(self.send_interval_ms).unwrap_or(defaults.send_interval),
            watchdog_interval: millis(self.watchdog_interval_ms)
                .unwrap_or(defaults.watchdog_interval),
            heartbeat_miss_limit: positive(self.heartbeat_miss_limit)
                .map_or(defaults.heartbeat_miss_limit, |n| n as u32),
            send_policy: self.send_policy.unwrap_or(defaults.send_policy),
        }
    }

    /// Log level, `info` unless a valid name is given.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Stylesheet text for the presentation options.
    #[must_use]
    pub fn stylesheet(&self) -> String {
        let mut rules: Vec<String> = Vec::new();

        if self.invert {
            rules.push(
                ".container, .air-container {flex-flow: column-reverse nowrap;}".to_string(),
            );
        }

        let bg_color = self
            .bg_color
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_BG_COLOR);
        match self.bg_image.as_deref().filter(|url| !url.is_empty()) {
            None => rules.push(format!("#fullscreen {{background: {bg_color};}}")),
            Some(url) => rules.push(format!(
                "#fullscreen {{background: {bg_color} url(\"{url}\") fixed center / cover!important; background-repeat: no-repeat;}}"
            )),
        }

        if let Some(opacity) = self.led_opacity {
            if opacity == 0.0 {
                rules.push("#canvas {display: none}".to_string());
            } else {
                rules.push(format!("#canvas {{opacity: {opacity}}}"));
            }
        }

        if let Some(color) = &self.key_color {
            rules.push(format!(".key[data-active] {{background-color: {color};}}"));
        }
        if let Some(color) = &self.key_border_color {
            rules.push(format!(".key {{border: 1px solid {color};}}"));
        }
        if let Some(fade) = self.key_color_fade.filter(|ms| *ms != 0.0 && !ms.is_nan()) {
            rules.push(format!(
                ".key:not([data-active]) {{transition: background {fade}ms ease-out;}}"
            ));
        }

        if let Some(height) = self.key_height {
            if height == 0.0 {
                rules.push(".touch-container {display: none;}".to_string());
            } else {
                rules.push(format!(".touch-container {{flex: {height};}}"));
            }
        }

        rules.join(" ")
    }
}
