//! Minimal HTTP/1.1 stand-in for the resolver and its media host.
//!
//! Routes:
//! - `GET /`: landing page carrying the session token.
//! - `POST /abc2.php`: packed payload whose decoded HTML links to a media route.
//!   The submitted `url` field picks the link: containing `missing` links to a
//!   404 route, containing `nomarker` links to a route without the marker.
//! - `GET /snaptik/media.mp4`, `GET /plain/media.mp4`: the media body.
//! - anything else: 404.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use snapdl_core::numeral::recode;

pub const TOKEN: &str = "tok3n.Value-1";
const ALPHABET: &str = "qwertyuiopas";
const OFFSET: u32 = 31;
const BASE: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, the landing page has no token field.
    pub serve_token: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { serve_token: true }
    }
}

pub struct ResolverServer {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
}

impl ResolverServer {
    /// Total requests received so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `media`. Runs until the
/// process exits.
pub fn start(media: Vec<u8>, opts: ServerOptions) -> ResolverServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let media = Arc::new(media);
    let requests = Arc::new(AtomicUsize::new(0));
    {
        let base_url = base_url.clone();
        let requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let media = Arc::clone(&media);
                let base_url = base_url.clone();
                requests.fetch_add(1, Ordering::SeqCst);
                thread::spawn(move || handle(stream, &media, &base_url, opts));
            }
        });
    }
    ResolverServer { base_url, requests }
}

/// Encodes `text` the way the resolver packs its HTML.
pub fn obfuscate(text: &str) -> String {
    let symbols: Vec<char> = ALPHABET.chars().collect();
    let terminator = symbols[BASE as usize];
    let mut out = String::new();
    for c in text.chars() {
        let digits = recode(&(c as u32 + OFFSET).to_string(), 10, BASE).unwrap();
        for d in digits.chars() {
            out.push(symbols[d.to_digit(10).unwrap() as usize]);
        }
        out.push(terminator);
    }
    out
}

fn handle(mut stream: TcpStream, media: &[u8], base_url: &str, opts: ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };
    match (method.as_str(), path.as_str()) {
        ("GET", "/") => {
            let token = if opts.serve_token {
                format!(r#"<input name="token" value="{}" type="hidden">"#, TOKEN)
            } else {
                String::new()
            };
            let html = format!(
                concat!(
                    r#"<html><body><form action="/abc2.php" method="post">"#,
                    r#"<input name="url">{}</form></body></html>"#
                ),
                token
            );
            respond(&mut stream, "200 OK", "text/html", html.as_bytes());
        }
        ("POST", "/abc2.php") => {
            if !body.contains(&format!("token={}", TOKEN)) {
                respond(&mut stream, "403 Forbidden", "text/plain", b"bad token");
                return;
            }
            let route = if body.contains("missing") {
                "/snaptik/gone.mp4"
            } else if body.contains("nomarker") {
                "/plain/media.mp4"
            } else {
                "/snaptik/media.mp4"
            };
            let html = format!(
                r##"$("#download").innerHTML = "<a href=\"{}{}\" class=\"button\">Download</a>";"##,
                base_url, route
            );
            let payload = format!(
                concat!(
                    r#"var _0x1=1;eval(function(h,u,n,t,e,r){{r="";"#,
                    r#"return decodeURIComponent(escape(r))}}("{}",52,"{}",{},{},19))"#
                ),
                obfuscate(&html),
                ALPHABET,
                OFFSET,
                BASE
            );
            respond(&mut stream, "200 OK", "application/javascript", payload.as_bytes());
        }
        ("GET", "/snaptik/media.mp4") | ("GET", "/plain/media.mp4") => {
            respond(&mut stream, "200 OK", "video/mp4", media);
        }
        _ => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
    }
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (method, path, body) once the declared body has been read.
fn read_request(stream: &mut TcpStream) -> Option<(String, String, String)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let body = String::from_utf8_lossy(&data[header_end..]).into_owned();
    Some((method, path, body))
}
