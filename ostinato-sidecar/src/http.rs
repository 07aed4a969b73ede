//! HTTP surface for the sidecar.
//!
//! Uses `std::net::TcpListener` — no external HTTP framework needed.
//! Endpoints:
//!
//! - `GET /metrics`  — process metrics + current aggregated snapshot
//! - `POST /record`  — ingest one JSON measurement
//! - `GET /healthz`  — liveness check

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use ostinato::{Aggregator, Measurement};

/// Largest accepted `/record` request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Runs the HTTP server (blocking — intended for the main thread).
///
/// Each accepted connection is handled on its own thread so a slow scrape
/// never stalls ingestion.
pub fn run_server(aggregator: Arc<Aggregator>, port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind failed on {addr}: {e}");
            return;
        }
    };
    tracing::info!("listening on {addr}");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("accept error: {e}");
                continue;
            }
        };

        // Set a short read timeout so we don't block forever on slow clients
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

        let aggregator = Arc::clone(&aggregator);
        std::thread::spawn(move || {
            if let Err(e) = handle_request(&stream, &aggregator) {
                tracing::debug!("request error: {e}");
            }
        });
    }
}

/// Parses an HTTP request and dispatches to the appropriate handler.
fn handle_request(
    stream: &TcpStream,
    aggregator: &Aggregator,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Parse: "GET /path?query HTTP/1.x"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return send_response(stream, 400, "text/plain", "bad request");
    }
    let method = parts[0];
    let path = parts[1].split('?').next().unwrap_or(parts[1]);

    // Drain remaining headers, keeping the body length for POSTs.
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    match (method, path) {
        ("GET", "/metrics") => send_response(
            stream,
            200,
            "text/plain; version=0.0.4",
            &aggregator.expose(),
        ),
        ("POST", "/record") => handle_record(stream, &mut reader, content_length, aggregator),
        ("GET", "/healthz") => send_response(stream, 200, "application/json", r#"{"status":"ok"}"#),
        _ => send_response(stream, 404, "application/json", r#"{"error":"not found"}"#),
    }
}

/// `POST /record` — reads a JSON measurement body and enqueues it.
fn handle_record(
    stream: &TcpStream,
    reader: &mut BufReader<&TcpStream>,
    content_length: usize,
    aggregator: &Aggregator,
) -> Result<(), Box<dyn std::error::Error>> {
    if content_length == 0 || content_length > MAX_BODY_BYTES {
        return send_response(
            stream,
            400,
            "application/json",
            r#"{"error":"missing or oversized body"}"#,
        );
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    let measurement: Measurement = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            return send_response(
                stream,
                400,
                "application/json",
                &format!(r#"{{"error":"invalid measurement: {e}"}}"#),
            );
        }
    };

    match aggregator.record(measurement) {
        Ok(()) => send_response(
            stream,
            202,
            "application/json",
            r#"{"status":"accepted"}"#,
        ),
        Err(e) => send_response(
            stream,
            503,
            "application/json",
            &format!(r#"{{"error":"{e}"}}"#),
        ),
    }
}

/// Sends an HTTP response with the given status, content type, and body.
fn send_response(
    mut stream: &TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status_text = match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };

    write!(
        stream,
        "HTTP/1.1 {status} {status_text}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len(),
    )?;

    Ok(())
}
