//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body on every path, counts requests, and can be
//! switched into a failure mode that returns 500 on each request.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl TestServer {
    /// Full URL for a file name on this server (the name only matters for
    /// archive-extension detection).
    pub fn url_for(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// When enabled, every request gets a 500 response.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicUsize::new(0));
    let fail = Arc::new(AtomicBool::new(false));

    let thread_hits = Arc::clone(&hits);
    let thread_fail = Arc::clone(&fail);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let hits = Arc::clone(&thread_hits);
            let fail = Arc::clone(&thread_fail);
            thread::spawn(move || handle(stream, &body, &hits, &fail));
        }
    });

    TestServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        hits,
        fail,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    hits: &AtomicUsize,
    fail: &AtomicBool,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    hits.fetch_add(1, Ordering::SeqCst);

    if fail.load(Ordering::SeqCst) {
        let _ = stream.write_all(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
