//! Throttled fullscreen requests.
//!
//! Every touch asks for fullscreen; the request is throttled and only
//! issued on phone/tablet-sized screens that are not already fullscreen.

use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{HtmlElement, Window};

use crate::constants::{FULLSCREEN_INTERVAL, FULLSCREEN_MAX_SCREEN_HEIGHT};
use crate::throttle::Throttle;

use super::timer;

/// Whether a fullscreen request should be issued.
pub fn wants_fullscreen(already_fullscreen: bool, screen_height: i32) -> bool {
    !already_fullscreen && screen_height <= FULLSCREEN_MAX_SCREEN_HEIGHT
}

#[derive(Debug, Clone)]
pub struct FullscreenRequester {
    window: Window,
    target: HtmlElement,
    throttle: Rc<RefCell<Throttle<()>>>,
}

impl FullscreenRequester {
    pub fn new(window: Window, target: HtmlElement) -> Self {
        Self {
            window,
            target,
            throttle: Rc::new(RefCell::new(Throttle::new(FULLSCREEN_INTERVAL))),
        }
    }

    pub fn request(&self) {
        let run = self.throttle.borrow_mut().call(());
        if run.is_some() {
            self.request_now();
            self.arm();
        }
    }

    fn arm(&self) {
        let this = self.clone();
        let delay = self.throttle.borrow().interval();
        let armed = timer::set_timeout(&self.window, delay, move || {
            let trailing = this.throttle.borrow_mut().cooldown_elapsed();
            if trailing.is_some() {
                this.request_now();
                this.arm();
            }
        });
        if let Err(e) = armed {
            log::warn!("Could not arm fullscreen cooldown: {e}");
            self.throttle.borrow_mut().reset();
        }
    }

    fn request_now(&self) {
        let already = self
            .window
            .document()
            .and_then(|document| document.fullscreen_element())
            .is_some();
        let height = self
            .window
            .screen()
            .and_then(|screen| screen.height())
            .unwrap_or(i32::MAX);
        if !wants_fullscreen(already, height) {
            return;
        }
        if let Err(e) = self.target.request_fullscreen() {
            log::debug!("Fullscreen request refused: {e:?}");
        }
    }
}
