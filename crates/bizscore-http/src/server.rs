use std::io::{self, BufRead, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::ScoreError;
use crate::handler::{ScoringService, SCORE_METHOD};
use crate::metrics::MetricsRegistry;
use crate::protocol::{ErrorBody, HealthBody};

const GENERIC_INTERNAL_ERROR: &str = "Internal Server Error";
const MAX_HEAD_BYTES: usize = 8 * 1024;
const MAX_HEADERS: usize = 64;
const DRAIN_LIMIT_BYTES: u64 = 1024 * 1024;
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);
const BUSY_TIMEOUT: Duration = Duration::from_millis(50);

pub struct HttpServer {
    service: ScoringService,
    config: ServerConfig,
    metrics: Mutex<MetricsRegistry>,
    active: AtomicUsize,
}

impl HttpServer {
    pub fn new(service: ScoringService, config: ServerConfig) -> Self {
        Self {
            service,
            config,
            metrics: Mutex::new(MetricsRegistry::default()),
            active: AtomicUsize::new(0),
        }
    }

    pub const fn service(&self) -> &ScoringService {
        &self.service
    }

    pub fn serve(&self) -> io::Result<()> {
        let listener = TcpListener::bind(&self.config.addr)?;
        self.serve_listener(&listener)
    }

    pub fn serve_listener(&self, listener: &TcpListener) -> io::Result<()> {
        info!(
            addr = %listener.local_addr()?,
            score_path = %self.config.score_path,
            max_connections = self.config.max_connections,
            "bizscore http listening"
        );
        thread::scope(|scope| {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(error = %err, "http accept error");
                        continue;
                    }
                };
                match ConnectionSlot::acquire(&self.active, self.config.max_connections) {
                    Some(slot) => {
                        scope.spawn(move || {
                            let _slot = slot;
                            if let Err(err) = self.handle_connection(&stream) {
                                warn!(error = %err, "http request error");
                            }
                        });
                    }
                    None => {
                        warn!(
                            max_connections = self.config.max_connections,
                            "connection limit reached"
                        );
                        self.reject_busy(&stream);
                    }
                }
            }
        });
        Ok(())
    }

    fn handle_connection(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_write_timeout(Some(self.config.read_timeout))?;
        let started = Instant::now();
        let mut reader = io::BufReader::new(DeadlineReader::new(
            stream,
            started + self.config.read_timeout,
        ));
        let (method, path, response, drain) =
            match read_http_request(&mut reader, self.config.max_body_bytes)? {
                ReadOutcome::Closed => return Ok(()),
                ReadOutcome::Rejected {
                    method,
                    path,
                    error,
                } => (method, path, self.error_response(&error), true),
                ReadOutcome::Request(req) => {
                    let response = self.dispatch(&req);
                    (req.method, req.path, response, false)
                }
            };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.lock().record_response(response.status, latency_ms);
        debug!(
            %method,
            %path,
            status = response.status,
            latency_ms,
            "http request served"
        );
        write_http_response(stream, &response)?;
        if drain {
            drain_and_close(stream, DRAIN_TIMEOUT);
        }
        Ok(())
    }

    fn reject_busy(&self, stream: &TcpStream) {
        let response = self.error_response(&ScoreError::Unavailable);
        self.metrics.lock().record_response(response.status, 0.0);
        if stream.set_write_timeout(Some(BUSY_TIMEOUT)).is_ok()
            && write_http_response(stream, &response).is_ok()
        {
            drain_and_close(stream, BUSY_TIMEOUT);
        }
    }

    pub fn dispatch(&self, req: &HttpRequest) -> HttpResponse {
        if req.path == self.config.score_path {
            return match self.service.handle(&req.method, &req.body) {
                Ok(score) => {
                    self.metrics.lock().record_prediction();
                    HttpResponse::json(200, &score)
                }
                Err(err) => self.error_response(&err),
            };
        }

        if req.method == "GET" && req.path == "/health" {
            let info = self.service.info();
            return HttpResponse::json(
                200,
                &HealthBody {
                    status: "ok",
                    model: &info.name,
                    kind: info.kind,
                },
            );
        }

        if req.method == "GET" && req.path == "/metrics" {
            return HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.metrics.lock().render_text(),
            );
        }

        HttpResponse::json(404, &ErrorBody::new("Not Found"))
    }

    fn error_response(&self, err: &ScoreError) -> HttpResponse {
        let message = match err {
            ScoreError::Internal(detail) => {
                error!(error = %detail, model = %self.service.info().name, "scoring failed");
                if self.config.expose_internal_errors {
                    detail.clone()
                } else {
                    GENERIC_INTERNAL_ERROR.to_string()
                }
            }
            other => other.to_string(),
        };
        let mut response = HttpResponse::json(err.status(), &ErrorBody::new(message));
        if matches!(err, ScoreError::MethodNotAllowed) {
            response.allow = Some(SCORE_METHOD);
        }
        response
    }
}

// Held by a connection thread for its lifetime; releases on drop.
struct ConnectionSlot<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ConnectionSlot<'a> {
    fn acquire(active: &'a AtomicUsize, max: usize) -> Option<Self> {
        active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .ok()
            .map(|_| Self { active })
    }
}

impl Drop for ConnectionSlot<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

// Socket reader bounded by one deadline across every read of a request.
struct DeadlineReader<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl<'a> DeadlineReader<'a> {
    const fn new(stream: &'a TcpStream, deadline: Instant) -> Self {
        Self { stream, deadline }
    }
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "request deadline exceeded",
            ));
        }
        self.stream.set_read_timeout(Some(remaining))?;
        let mut stream = self.stream;
        stream.read(buf)
    }
}

fn drain_and_close(stream: &TcpStream, budget: Duration) {
    let _ = stream.shutdown(Shutdown::Write);
    let mut reader = DeadlineReader::new(stream, Instant::now() + budget).take(DRAIN_LIMIT_BYTES);
    let _ = io::copy(&mut reader, &mut io::sink());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub allow: Option<&'static str>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            allow: None,
            body,
        }
    }

    fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            allow: None,
            body: body.into_bytes(),
        }
    }
}

#[derive(Debug)]
enum ReadOutcome {
    Closed,
    Rejected {
        method: String,
        path: String,
        error: ScoreError,
    },
    Request(HttpRequest),
}

enum HeadLine {
    Eof,
    TooLong,
    Line(String),
}

fn rejected(method: &str, path: &str, error: ScoreError) -> ReadOutcome {
    ReadOutcome::Rejected {
        method: method.to_string(),
        path: path.to_string(),
        error,
    }
}

fn read_http_request<R: BufRead>(reader: &mut R, max_body_bytes: usize) -> io::Result<ReadOutcome> {
    let mut method = String::from("-");
    let mut path = String::from("-");
    match read_request_parts(reader, max_body_bytes, &mut method, &mut path) {
        Ok(outcome) => Ok(outcome),
        Err(err) => match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Ok(rejected(&method, &path, ScoreError::RequestTimeout))
            }
            io::ErrorKind::InvalidData => Ok(rejected(
                &method,
                &path,
                ScoreError::invalid("request head is not valid UTF-8"),
            )),
            _ => Err(err),
        },
    }
}

fn read_request_parts<R: BufRead>(
    reader: &mut R,
    max_body_bytes: usize,
    method: &mut String,
    path: &mut String,
) -> io::Result<ReadOutcome> {
    let mut budget = MAX_HEAD_BYTES;
    let first = match read_head_line(reader, &mut budget)? {
        HeadLine::Eof => return Ok(ReadOutcome::Closed),
        HeadLine::TooLong => return Ok(rejected(method, path, ScoreError::HeadersTooLarge)),
        HeadLine::Line(line) => line,
    };
    if first.is_empty() {
        return Ok(ReadOutcome::Closed);
    }

    let mut parts = first.split_whitespace();
    let (Some(verb), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(rejected(
            method,
            path,
            ScoreError::invalid("malformed request line"),
        ));
    };
    *method = verb.to_string();
    *path = target.split_once('?').map_or(target, |(p, _)| p).to_string();

    let mut content_length = 0usize;
    let mut header_count = 0usize;
    loop {
        let header = match read_head_line(reader, &mut budget)? {
            HeadLine::Eof => break,
            HeadLine::TooLong => {
                return Ok(rejected(method, path, ScoreError::HeadersTooLarge));
            }
            HeadLine::Line(line) => line,
        };
        if header.is_empty() {
            break;
        }
        header_count += 1;
        if header_count > MAX_HEADERS {
            return Ok(rejected(method, path, ScoreError::HeadersTooLarge));
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let Ok(parsed) = value.trim().parse::<usize>() else {
                    return Ok(rejected(
                        method,
                        path,
                        ScoreError::invalid("invalid Content-Length header"),
                    ));
                };
                content_length = parsed;
            }
        }
    }

    if content_length > max_body_bytes {
        return Ok(rejected(method, path, ScoreError::PayloadTooLarge));
    }

    let mut body = vec![0_u8; content_length];
    reader.read_exact(&mut body)?;
    Ok(ReadOutcome::Request(HttpRequest {
        method: method.clone(),
        path: path.clone(),
        body,
    }))
}

// Reads one CRLF line, charging it against the remaining head budget.
fn read_head_line<R: BufRead>(reader: &mut R, budget: &mut usize) -> io::Result<HeadLine> {
    if *budget == 0 {
        return Ok(HeadLine::TooLong);
    }
    let mut line = String::new();
    let limit = u64::try_from(*budget).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_line(&mut line)?;
    *budget = budget.saturating_sub(read);

    if line.ends_with('\n') {
        Ok(HeadLine::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    } else if *budget == 0 {
        Ok(HeadLine::TooLong)
    } else {
        Ok(HeadLine::Eof)
    }
}

fn write_http_response(mut stream: &TcpStream, response: &HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let allow = response
        .allow
        .map(|methods| format!("Allow: {methods}\r\n"))
        .unwrap_or_default();
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len(),
        allow
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

const fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}
