//! Helpers shared by the integration tests.

#![allow(dead_code)]

use http::{Method, StatusCode};
use routechain::{Request, Response};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

/// Build a request for `path` on a fixed local origin
pub fn request(method: Method, path: &str) -> Request {
    Request::new(method, format!("http://localhost:3000{path}"))
}

pub fn get(path: &str) -> Request {
    request(Method::GET, path)
}

/// Assert status and body of a response
pub fn assert_response(actual: &Response, status: StatusCode, body: &str) {
    assert_eq!(actual.status(), status, "status for body {:?}", actual.body_text());
    assert_eq!(actual.body_text(), body);
}

/// Reserve an ephemeral port by binding and releasing it
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub type RawResponse = (u16, Vec<(String, String)>, String);

/// Minimal HTTP/1.1 client: returns the status code, header lines and body
pub fn send_request(addr: SocketAddr, raw: &str) -> RawResponse {
    send_pipelined(addr, raw, 1).pop().unwrap_or((0, Vec::new(), String::new()))
}

/// Write `raw` on one connection and read back `count` responses
pub fn send_pipelined(addr: SocketAddr, raw: &str, count: usize) -> Vec<RawResponse> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while split_responses(&buf).len() < count {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    split_responses(&buf)
        .into_iter()
        .map(|(head, body)| parse_response(&head, body))
        .collect()
}

/// Complete responses in `buf`, as head text and body
fn split_responses(buf: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(buf);
    let mut rest = text.as_ref();
    let mut out = Vec::new();
    while let Some((head, after)) = rest.split_once("\r\n\r\n") {
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if after.len() < length {
            break;
        }
        out.push((head.to_string(), after[..length].to_string()));
        rest = &after[length..];
    }
    out
}

fn parse_response(head: &str, body: String) -> RawResponse {
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    (status, headers, body)
}
