//! Error types for the touch keyboard front-end.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised by the keyboard core and the browser driver.
#[derive(Error, Debug)]
pub enum Error {
    /// A key element declared a flag attribute that is not a non-negative integer.
    #[error("Invalid key attribute {attribute}={value:?}")]
    InvalidKeyAttribute {
        /// Attribute name (e.g. `data-kflag`).
        attribute: &'static str,
        /// Raw attribute text as found on the element.
        value: String,
    },
    /// A required DOM element could not be found.
    #[error("Missing element: {0}")]
    MissingElement(String),
    /// The socket refused a send or could not be opened.
    #[error("Socket error: {0}")]
    Socket(String),
    /// The options object could not be read.
    #[error("Config error: {0}")]
    Config(String),
    /// Any other failure reported by a browser API.
    #[error("JS error: {0}")]
    Js(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"));
        Error::Js(message)
    }
}
