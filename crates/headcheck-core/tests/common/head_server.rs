//! Minimal HTTP/1.1 server answering HEAD requests for integration tests.
//!
//! Each path gets a configurable status (200 by default). Successful
//! responses carry an ETag built from the last path segment, so a path of
//! `/<hash>` yields `ETag: "<hash>-gzip"`. Paths under `/moved/` redirect to
//! the same path without the prefix.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub const CONTENT_LENGTH: u64 = 1234;

#[derive(Clone)]
pub struct HeadServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/".
    pub base: String,
    statuses: Arc<Mutex<HashMap<String, u16>>>,
    hits: Arc<AtomicUsize>,
}

impl HeadServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Answer `path` with `status` from now on.
    pub fn set(&self, path: &str, status: u16) {
        let path = format!("/{}", path.trim_start_matches('/'));
        self.statuses.lock().unwrap().insert(path, status);
    }

    /// Requests served so far, redirects included.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start() -> HeadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = HeadServer {
        base: format!("http://127.0.0.1:{}/", port),
        statuses: Arc::new(Mutex::new(HashMap::new())),
        hits: Arc::new(AtomicUsize::new(0)),
    };
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let server = shared.clone();
            thread::spawn(move || handle(stream, &server));
        }
    });
    server
}

fn handle(mut stream: std::net::TcpStream, server: &HeadServer) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    server.hits.fetch_add(1, Ordering::SeqCst);

    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/").to_string();
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    if let Some(rest) = path.strip_prefix("/moved/") {
        let response = format!(
            "HTTP/1.1 301 Moved Permanently\r\nLocation: /{rest}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let status = server
        .statuses
        .lock()
        .unwrap()
        .get(&path)
        .copied()
        .unwrap_or(200);
    let response = if (200..300).contains(&status) {
        let name = path.rsplit('/').next().unwrap_or("");
        format!(
            "HTTP/1.1 {status} OK\r\nETag: \"{name}-gzip\"\r\nLast-Modified: {LAST_MODIFIED}\r\nContent-Length: {CONTENT_LENGTH}\r\nX-Served-By: head-server\r\nConnection: close\r\n\r\n"
        )
    } else {
        format!("HTTP/1.1 {status} Status\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
    };
    let _ = stream.write_all(response.as_bytes());
}
