//! HTTP transport over libcurl.
//!
//! [`HttpClient`] holds the request settings and is shared read-only by every
//! worker. Resolver exchanges go through a [`Session`], which keeps one curl
//! handle (connections and cookies) across the landing GET and the submit POST.
//! Media downloads stream into a [`BodySink`].
//!
//! Everything here blocks the current thread; call from `spawn_blocking` if
//! used from async code.

mod classify;
mod error;
mod head;

pub use classify::{classify, classify_curl_error, classify_http_status, ErrorKind};
pub use error::TransportError;

use std::cell::{Cell, RefCell};
use std::io;
use std::time::Duration;

use curl::easy::Easy;

use crate::config::TransportConfig;
use head::ResponseHead;

/// Receives a streamed 2xx response body.
pub trait BodySink {
    /// Called once, before any data, with the declared `Content-Length`.
    fn on_response(&mut self, content_length: Option<u64>) -> io::Result<()>;

    /// Called for each block of body bytes, in order.
    fn on_data(&mut self, data: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    pub fn new(cfg: &TransportConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            user_agent: cfg.user_agent.clone(),
        }
    }

    fn easy(&self) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.timeout)?;
        // Read timeout: abort when the transfer stalls below 1 B/s for `timeout`.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.timeout)?;
        Ok(easy)
    }

    /// Opens a resolver session with its own handle and in-memory cookie jar.
    pub fn session(&self) -> Result<Session, TransportError> {
        let mut easy = self.easy()?;
        // Empty cookie file enables curl's cookie engine without reading from disk.
        easy.cookie_file("")?;
        Ok(Session { easy })
    }

    /// Streams a GET response into `sink`. Returns the number of body bytes
    /// delivered.
    ///
    /// Bodies of non-2xx responses are discarded without touching the sink, and
    /// the status is reported as [`TransportError::Http`].
    pub fn stream_get(&self, url: &str, sink: &mut dyn BodySink) -> Result<u64, TransportError> {
        let mut easy = self.easy()?;
        easy.url(url)?;

        let head = RefCell::new(ResponseHead::default());
        let announced = Cell::new(false);
        let received = Cell::new(0u64);
        let sink_error: RefCell<Option<io::Error>> = RefCell::new(None);
        let sink = RefCell::new(sink);

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                head.borrow_mut().feed(line);
                true
            })?;
            transfer.write_function(|data| {
                let state = head.borrow();
                if !state.is_success() {
                    return Ok(data.len());
                }
                let mut sink = sink.borrow_mut();
                if !announced.get() {
                    announced.set(true);
                    if let Err(e) = sink.on_response(state.content_length) {
                        sink_error.borrow_mut().replace(e);
                        return Ok(0);
                    }
                }
                match sink.on_data(data) {
                    Ok(()) => {
                        received.set(received.get() + data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_error.borrow_mut().replace(e);
                        // Short write aborts the transfer.
                        Ok(0)
                    }
                }
            })?;
            if let Err(e) = transfer.perform() {
                if e.is_write_error() {
                    if let Some(io_err) = sink_error.borrow_mut().take() {
                        return Err(TransportError::Storage(io_err));
                    }
                }
                return Err(TransportError::Curl(e));
            }
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        if !announced.get() {
            // Empty 2xx body: the sink still learns the response arrived.
            let content_length = head.borrow().content_length;
            sink.into_inner()
                .on_response(content_length)
                .map_err(TransportError::Storage)?;
        }
        Ok(received.get())
    }
}

/// A curl handle reused for consecutive resolver requests.
pub struct Session {
    easy: Easy,
}

impl Session {
    pub fn get_text(&mut self, url: &str) -> Result<String, TransportError> {
        self.easy.get(true)?;
        self.easy.url(url)?;
        self.perform_text()
    }

    /// POSTs `fields` as `application/x-www-form-urlencoded`.
    pub fn post_form(
        &mut self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<String, TransportError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().copied())
            .finish();
        self.easy.url(url)?;
        self.easy.post(true)?;
        self.easy.post_fields_copy(body.as_bytes())?;
        self.perform_text()
    }

    fn perform_text(&mut self) -> Result<String, TransportError> {
        let mut body = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = self.easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
