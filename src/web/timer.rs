//! `setTimeout` / `setInterval` wrappers.

use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::error::Result;

fn millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

/// Run `f` once after `delay`.
pub fn set_timeout<F>(window: &Window, delay: Duration, f: F) -> Result<i32>
where
    F: FnOnce() + 'static,
{
    let callback = Closure::once_into_js(f);
    let id = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        millis(delay),
    )?;
    Ok(id)
}

/// Run `f` every `period` for the lifetime of the page.
pub fn set_interval<F>(window: &Window, period: Duration, f: F) -> Result<i32>
where
    F: FnMut() + 'static,
{
    let callback = Closure::<dyn FnMut()>::new(f);
    let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        millis(period),
    )?;
    callback.forget();
    Ok(id)
}
