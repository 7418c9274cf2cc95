//! Mock collection API server for testing
//!
//! This module provides a mock HTTP server that simulates the remote ledger
//! store, allowing for comprehensive testing without a running backend.
//!
//! The mock server implements the same collection dialect as the real API:
//! - GET /users?id=..&password=..  exact-field filtering
//! - POST /users                   create
//! - PATCH /users/{id}             partial update
//! - GET /transactions?accountId=..&_sort=timestamp&_order=desc
//! - POST /transactions            create, id assigned by the server

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether PATCH /users/{id} fails with a server error
    pub fail_balance_updates: bool,
    /// Whether POST /transactions fails with a server error
    pub fail_transaction_creates: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

struct MockState {
    users: Mutex<Vec<JsonValue>>,
    transactions: Mutex<Vec<JsonValue>>,
    next_transaction_id: AtomicU64,
    fail_balance_updates: AtomicBool,
    fail_transaction_creates: AtomicBool,
    delay_ms: u64,
}

/// Mock ledger store server for testing
pub struct MockLedgerServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
    state: Arc<MockState>,
}

impl MockLedgerServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let state = Arc::new(MockState {
            users: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            next_transaction_id: AtomicU64::new(1),
            fail_balance_updates: AtomicBool::new(config.fail_balance_updates),
            fail_transaction_creates: AtomicBool::new(config.fail_transaction_creates),
            delay_ms: config.delay_ms,
        });
        let state_clone = state.clone();

        // Non-blocking accept loop so the server can shut down gracefully
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &state);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            thread_handle: Some(thread_handle),
            state,
        })
    }

    /// Get the port the server is listening on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Toggle balance-update failures at runtime
    pub fn set_fail_balance_updates(&self, fail: bool) {
        self.state.fail_balance_updates.store(fail, Ordering::SeqCst);
    }

    /// Toggle transaction-create failures at runtime
    pub fn set_fail_transaction_creates(&self, fail: bool) {
        self.state
            .fail_transaction_creates
            .store(fail, Ordering::SeqCst);
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockLedgerServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one request: header block plus a Content-Length body, which may
/// arrive in a separate segment from the headers
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 65536 {
            return None;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some((headers, body))
}

fn handle_connection(mut stream: TcpStream, state: &MockState) {
    let Some((headers, body)) = read_request(&mut stream) else {
        return;
    };

    if state.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(state.delay_ms));
    }

    let first_line = headers.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }

    let method = parts[0];
    let path = parts[1];
    let path_without_query = path.split('?').next().unwrap_or(path);
    let query = parse_query(path);

    match (method, path_without_query) {
        ("GET", "/users") => {
            let users = lock(&state.users);
            let matches: Vec<&JsonValue> = users
                .iter()
                .filter(|u| matches_query(u, &query, "id"))
                .filter(|u| matches_query(u, &query, "password"))
                .collect();
            respond_json(&mut stream, 200, "OK", &matches);
        }
        ("POST", "/users") => {
            let Ok(user) = serde_json::from_str::<JsonValue>(&body) else {
                send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid body"}"#);
                return;
            };
            lock(&state.users).push(user.clone());
            respond_json(&mut stream, 201, "Created", &user);
        }
        ("PATCH", _) if path_without_query.starts_with("/users/") => {
            if state.fail_balance_updates.load(Ordering::SeqCst) {
                send_response(
                    &mut stream,
                    500,
                    "Internal Server Error",
                    r#"{"error": "Simulated failure"}"#,
                );
                return;
            }
            let id = &path_without_query["/users/".len()..];
            let Ok(patch) = serde_json::from_str::<JsonValue>(&body) else {
                send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid body"}"#);
                return;
            };
            let mut users = lock(&state.users);
            let Some(user) = users
                .iter_mut()
                .find(|u| u.get("id").and_then(JsonValue::as_str) == Some(id))
            else {
                send_response(&mut stream, 404, "Not Found", r#"{"error": "Not found"}"#);
                return;
            };
            if let (Some(target), Some(fields)) = (user.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            let updated = user.clone();
            respond_json(&mut stream, 200, "OK", &updated);
        }
        ("GET", "/transactions") => {
            let transactions = lock(&state.transactions);
            let mut matches: Vec<JsonValue> = transactions
                .iter()
                .filter(|t| matches_query(t, &query, "accountId"))
                .cloned()
                .collect();
            if query.iter().any(|(k, v)| k == "_sort" && v == "timestamp") {
                let descending = query.iter().any(|(k, v)| k == "_order" && v == "desc");
                matches.sort_by_key(|t| parse_timestamp(t));
                if descending {
                    matches.reverse();
                }
            }
            respond_json(&mut stream, 200, "OK", &matches);
        }
        ("POST", "/transactions") => {
            if state.fail_transaction_creates.load(Ordering::SeqCst) {
                send_response(
                    &mut stream,
                    500,
                    "Internal Server Error",
                    r#"{"error": "Simulated failure"}"#,
                );
                return;
            }
            let Ok(mut tx) = serde_json::from_str::<JsonValue>(&body) else {
                send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid body"}"#);
                return;
            };
            let id = state.next_transaction_id.fetch_add(1, Ordering::SeqCst);
            if let Some(object) = tx.as_object_mut() {
                object.insert("id".to_string(), JsonValue::String(format!("t{}", id)));
            }
            lock(&state.transactions).push(tx.clone());
            respond_json(&mut stream, 201, "Created", &tx);
        }
        _ => {
            send_response(&mut stream, 404, "Not Found", r#"{"error": "Endpoint not found"}"#);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn parse_query(path: &str) -> Vec<(String, String)> {
    let Some((_, query)) = path.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn matches_query(record: &JsonValue, query: &[(String, String)], field: &str) -> bool {
    match query.iter().find(|(k, _)| k == field) {
        Some((_, wanted)) => record.get(field).and_then(JsonValue::as_str) == Some(wanted),
        None => true,
    }
}

fn parse_timestamp(record: &JsonValue) -> DateTime<Utc> {
    record
        .get("timestamp")
        .and_then(JsonValue::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn respond_json<T: serde::Serialize>(stream: &mut TcpStream, status: u16, status_text: &str, body: &T) {
    match serde_json::to_string(body) {
        Ok(json) => send_response(stream, status, status_text, &json),
        Err(_) => send_response(
            stream,
            500,
            "Internal Server Error",
            r#"{"error": "Serialization failure"}"#,
        ),
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
