//! Minimal canned GitHub API server for integration tests
//!
//! Serves routed responses over a real TCP socket so the binary under test
//! exercises its actual HTTP stack. Point `SKILLET_API_BASE` at
//! `StubGitHub::base_url` to use it.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use flate2::Compression;
use flate2::write::GzEncoder;

/// A canned response for one API path
#[derive(Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn gzip(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "application/gzip",
            body,
        }
    }
}

/// Routed stub server; serves until the test process exits
pub struct StubGitHub {
    pub base_url: String,
}

impl StubGitHub {
    /// Start serving the given (path, response) routes
    ///
    /// Paths match on the request path with the query string stripped, so
    /// paginated endpoints route regardless of `per_page`/`page` values.
    pub fn serve(routes: Vec<(String, StubResponse)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Failed to read stub address");

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut buf = [0u8; 4096];
                let Ok(n) = stream.read(&mut buf) else {
                    continue;
                };
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                let path = request_path(&request);

                let response = routes
                    .iter()
                    .find(|(route, _)| *route == path)
                    .map(|(_, r)| r.clone())
                    .unwrap_or_else(|| StubResponse {
                        status: 404,
                        content_type: "application/json",
                        body: br#"{"message":"Not Found"}"#.to_vec(),
                    });

                let reason = match response.status {
                    200 => "OK",
                    403 => "Forbidden",
                    404 => "Not Found",
                    _ => "Error",
                };
                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    response.status,
                    reason,
                    response.content_type,
                    response.body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&response.body);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
        }
    }
}

fn request_path(request: &str) -> String {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    target
        .split('?')
        .next()
        .unwrap_or(target)
        .to_string()
}

/// Build a gzipped tarball with all entries nested under `root/`
///
/// Mirrors the single-top-directory layout of GitHub tarball downloads.
pub fn tarball(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{root}/{path}"), content.as_bytes())
            .expect("Failed to append tar entry");
    }

    builder
        .into_inner()
        .expect("Failed to finish tar stream")
        .finish()
        .expect("Failed to finish gzip stream")
}

/// Full 40-hex commit SHA filled with one digit
pub fn sha(digit: char) -> String {
    std::iter::repeat_n(digit, 40).collect()
}
