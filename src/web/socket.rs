//! Browser WebSocket transport.
//!
//! Each [`Transport::open`] creates a fresh `WebSocket` and wires its
//! events into a [`SocketSink`]. Closing detaches every handler before the
//! socket is closed, so a dying connection can never report into the
//! session that replaced it.

use std::fmt;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, Event, MessageEvent, WebSocket};

use crate::error::{Error, Result};
use crate::session::Transport;

/// Socket event forwarded to the driver.
#[derive(Debug)]
pub enum SocketEvent {
    Open,
    Text(String),
    Binary(Vec<u8>),
    /// The connection closed or failed.
    Closed,
}

/// Receiver for socket events.
pub type SocketSink = Rc<dyn Fn(SocketEvent)>;

/// Event handlers kept alive for as long as their socket is current.
struct Handlers {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(Event)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl Handlers {
    fn attach(socket: &WebSocket, sink: &SocketSink) -> Self {
        let open_sink = Rc::clone(sink);
        let on_open = Closure::<dyn FnMut(Event)>::new(move |_| open_sink(SocketEvent::Open));

        let message_sink = Rc::clone(sink);
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let data = event.data();
            if let Some(text) = data.as_string() {
                message_sink(SocketEvent::Text(text));
            } else if let Some(buffer) = data.dyn_ref::<js_sys::ArrayBuffer>() {
                message_sink(SocketEvent::Binary(js_sys::Uint8Array::new(buffer).to_vec()));
            }
        });

        let close_sink = Rc::clone(sink);
        let on_close = Closure::<dyn FnMut(Event)>::new(move |_| close_sink(SocketEvent::Closed));

        let error_sink = Rc::clone(sink);
        let on_error = Closure::<dyn FnMut(Event)>::new(move |_| {
            log::warn!("Socket error");
            error_sink(SocketEvent::Closed);
        });

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self {
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        }
    }

    fn detach(socket: &WebSocket) {
        socket.set_onopen(None);
        socket.set_onmessage(None);
        socket.set_onclose(None);
        socket.set_onerror(None);
    }
}

/// [`Transport`] backed by the browser's `WebSocket`.
pub struct WebSocketTransport {
    url: String,
    sink: SocketSink,
    socket: Option<WebSocket>,
    handlers: Option<Handlers>,
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.url)
            .field("ready_state", &self.socket.as_ref().map(WebSocket::ready_state))
            .finish()
    }
}

impl WebSocketTransport {
    pub fn new(url: String, sink: SocketSink) -> Self {
        Self {
            url,
            sink,
            socket: None,
            handlers: None,
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) -> Result<()> {
        self.close();
        let socket = WebSocket::new(&self.url)?;
        socket.set_binary_type(BinaryType::Arraybuffer);
        self.handlers = Some(Handlers::attach(&socket, &self.sink));
        self.socket = Some(socket);
        log::debug!("Opening {}", self.url);
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| Error::Socket("no connection".to_string()))?;
        match socket.ready_state() {
            WebSocket::OPEN => {}
            WebSocket::CLOSING | WebSocket::CLOSED => {
                log::debug!("Dropping frame on closing socket");
                return Ok(());
            }
            _ => return Err(Error::Socket("connection not open".to_string())),
        }
        socket
            .send_with_str(text)
            .map_err(|e| Error::Socket(format!("send failed: {e:?}")))
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            Handlers::detach(&socket);
            if let Err(e) = socket.close() {
                log::debug!("Socket close failed: {e:?}");
            }
        }
        self.handlers = None;
    }
}
