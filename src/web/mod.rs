//! Browser driver.
//!
//! Wires page events to the [`Keyboard`] controller:
//!
//! ```text
//! #main touch*      ──► handle_touches ──► data-active toggles
//!                                      └─► send throttle timer
//! window resize     ──► compile
//! WebSocket events  ──► on_open / on_text / on_binary ──► #canvas
//! setInterval(1s)   ──► watchdog_tick
//! ```
//!
//! All state lives in one `Rc<RefCell<Keyboard>>`. Callbacks borrow it only
//! for the duration of a single controller call; browser events are never
//! dispatched synchronously from inside one, so borrows cannot overlap.

mod dom;
mod fullscreen;
mod logging;
mod socket;
mod timer;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::LevelFilter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, TouchEvent, Window};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::keyboard::Keyboard;
use crate::protocol::socket_url;

use dom::LedCanvas;
use fullscreen::FullscreenRequester;
use socket::{SocketEvent, SocketSink, WebSocketTransport};

type WebKeyboard = Keyboard<HtmlElement, WebSocketTransport>;
type SharedKeyboard = Rc<RefCell<WebKeyboard>>;

/// Touch events that re-run the touch pass.
const TOUCH_EVENTS: [&str; 4] = ["touchstart", "touchmove", "touchend", "touchcancel"];

/// Elements the driver needs.
#[derive(Debug, Clone)]
struct Page {
    window: Window,
    document: Document,
    container: HtmlElement,
    fullscreen_target: HtmlElement,
    led: LedCanvas,
}

impl Page {
    fn locate() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::MissingElement("window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::MissingElement("document".to_string()))?;
        Ok(Self {
            container: dom::get_element(&document, "main")?,
            fullscreen_target: dom::get_element(&document, "fullscreen")?,
            led: LedCanvas::locate(&document, "canvas")?,
            window,
            document,
        })
    }
}

/// Install the panic hook and console logger when the module loads.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);
}

/// Start the keyboard on the current page.
///
/// `config` is the options object; when `undefined` or `null` the page's
/// global `config` is used if it exists.
#[wasm_bindgen]
pub fn run(config: JsValue) -> std::result::Result<(), JsValue> {
    let config = if config.is_undefined() || config.is_null() {
        js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("config"))?
    } else {
        config
    };
    let config = Config::from_js(config)?;
    log::set_max_level(config.log_level());

    let page = Page::locate()?;
    dom::inject_style(&page.document, &config.stylesheet())?;

    let settings = config.keyboard_settings();
    let location = page.window.location();
    let url = socket_url(&location.protocol()?, &location.host()?);

    let keyboard: SharedKeyboard = Rc::new_cyclic(|weak: &Weak<RefCell<WebKeyboard>>| {
        let transport = WebSocketTransport::new(url, socket_sink(weak.clone(), page.led.clone()));
        RefCell::new(Keyboard::new(transport, settings))
    });

    recompile(&page.document, &keyboard)?;
    install_touch_handlers(&page, &keyboard)?;
    install_resize_handler(&page, &keyboard)?;

    if let Err(e) = keyboard.borrow_mut().connect() {
        log::error!("Initial connect failed: {e}");
    }
    let watchdog = Rc::clone(&keyboard);
    timer::set_interval(&page.window, settings.watchdog_interval, move || {
        let result = watchdog.borrow_mut().watchdog_tick();
        if let Err(e) = result {
            log::error!("Reconnect failed: {e}");
        }
    })?;

    log::info!(
        "Touch keyboard running with {} keys",
        keyboard.borrow().layout().len()
    );
    Ok(())
}

/// Route socket events into the keyboard; paint LED frames as they arrive.
fn socket_sink(keyboard: Weak<RefCell<WebKeyboard>>, led: LedCanvas) -> SocketSink {
    Rc::new(move |event: SocketEvent| {
        let Some(keyboard) = keyboard.upgrade() else {
            return;
        };
        let mut keyboard = keyboard.borrow_mut();
        match event {
            SocketEvent::Open => {
                if let Err(e) = keyboard.on_open() {
                    log::warn!("Probe on open failed: {e}");
                }
            }
            SocketEvent::Text(text) => keyboard.on_text(&text),
            SocketEvent::Binary(data) => {
                if let Some(raster) = keyboard.on_binary(&data) {
                    if let Err(e) = led.paint(raster) {
                        log::warn!("LED paint failed: {e}");
                    }
                }
            }
            SocketEvent::Closed => keyboard.on_close(),
        }
    })
}

fn recompile(document: &Document, keyboard: &SharedKeyboard) -> Result<()> {
    let descriptors = dom::key_descriptors(document);
    keyboard.borrow_mut().compile(descriptors)
}

fn install_resize_handler(page: &Page, keyboard: &SharedKeyboard) -> Result<()> {
    let document = page.document.clone();
    let keyboard = Rc::clone(keyboard);
    let on_resize = Closure::<dyn FnMut()>::new(move || {
        if let Err(e) = recompile(&document, &keyboard) {
            log::error!("Key layout recompile failed: {e}");
        }
    });
    page.window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();
    Ok(())
}

fn install_touch_handlers(page: &Page, keyboard: &SharedKeyboard) -> Result<()> {
    let window = page.window.clone();
    let keyboard = Rc::clone(keyboard);
    let fullscreen = FullscreenRequester::new(page.window.clone(), page.fullscreen_target.clone());

    let on_touch = Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
        event.prevent_default();
        fullscreen.request();

        let points = dom::touch_points(&event);
        let result = keyboard
            .borrow_mut()
            .handle_touches(&points, dom::apply_toggle);
        match result {
            Ok(outcome) if outcome.arm_send_timer => arm_send_timer(&window, &keyboard),
            Ok(_) => {}
            Err(e) => {
                if keyboard.borrow().is_send_cooling_down() {
                    arm_send_timer(&window, &keyboard);
                }
                report_fault(&window, &e);
            }
        }
    });

    for name in TOUCH_EVENTS {
        page.container
            .add_event_listener_with_callback(name, on_touch.as_ref().unchecked_ref())?;
    }
    on_touch.forget();
    Ok(())
}

/// Schedule the end of the send cooldown, re-arming while trailing sends run.
fn arm_send_timer(window: &Window, keyboard: &SharedKeyboard) {
    let delay = keyboard.borrow().send_interval();
    let weak = Rc::downgrade(keyboard);
    let window_cb = window.clone();
    let armed = timer::set_timeout(window, delay, move || {
        let Some(keyboard) = weak.upgrade() else {
            return;
        };
        let result = keyboard.borrow_mut().send_cooldown_elapsed();
        match result {
            Ok(true) => arm_send_timer(&window_cb, &keyboard),
            Ok(false) => {}
            Err(e) => {
                log::error!("Trailing key send failed: {e}");
                arm_send_timer(&window_cb, &keyboard);
            }
        }
    });
    if let Err(e) = armed {
        log::error!("Could not arm send cooldown: {e}");
    }
}

/// Surface a touch-pass fault to the user.
fn report_fault(window: &Window, err: &Error) {
    log::error!("Touch handling failed: {err}");
    if let Err(e) = window.alert_with_message(&err.to_string()) {
        log::debug!("alert() unavailable: {e:?}");
    }
}
