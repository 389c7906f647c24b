use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde_json::{Value as Json, json};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::host::storage::SharedStorage;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Could not bind API to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Could not start API thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("API thread panicked")]
    Panicked,
}

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "*"),
    ("Access-Control-Allow-Headers", "*"),
];

/// HTTP service started by `create_api`, serving on a background thread.
pub struct ApiService {
    addr: SocketAddr,
    server: Arc<Server>,
    handle: JoinHandle<()>,
}

impl ApiService {
    /// Binds `addr` synchronously and starts serving on a thread named `mercu-api`.
    pub fn start(title: &str, addr: SocketAddr, storage: SharedStorage) -> Result<Self, ServiceError> {
        let server = Server::http(addr).map_err(|source| ServiceError::Bind { addr, source })?;
        let server = Arc::new(server);
        let addr = server.server_addr().to_ip().unwrap_or(addr);

        let worker = Arc::clone(&server);
        let title = title.to_string();
        let handle = thread::Builder::new()
            .name("mercu-api".to_string())
            .spawn(move || serve(&worker, &title, &storage))
            .map_err(ServiceError::Spawn)?;
        log::info!("API listening on http://{addr}");

        Ok(Self {
            addr,
            server,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Blocks until the service thread exits.
    pub fn wait(self) -> Result<(), ServiceError> {
        self.handle.join().map_err(|_| ServiceError::Panicked)
    }

    /// Stops accepting requests and joins the service thread.
    pub fn shutdown(self) -> Result<(), ServiceError> {
        self.server.unblock();
        self.wait()
    }
}

impl fmt::Debug for ApiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiService").field("addr", &self.addr).finish()
    }
}

fn serve(server: &Server, title: &str, storage: &SharedStorage) {
    for request in server.incoming_requests() {
        handle(request, title, storage);
    }
    log::debug!("API service stopped");
}

fn handle(request: Request, title: &str, storage: &SharedStorage) {
    let (status, body) = route(request.method(), request.url(), title, storage);
    log::debug!("{} {} -> {status}", request.method(), request.url());

    let body = body.map(|body| body.to_string()).unwrap_or_default();
    let mut response = Response::from_data(body.into_bytes()).with_status_code(status);
    let headers = CORS_HEADERS
        .iter()
        .chain(std::iter::once(&("Content-Type", "application/json")))
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok());
    for header in headers {
        response.add_header(header);
    }
    if let Err(error) = request.respond(response) {
        log::warn!("failed to send API response: {error}");
    }
}

/// Maps a request to a status code and optional JSON body.
fn route(method: &Method, url: &str, title: &str, storage: &SharedStorage) -> (u16, Option<Json>) {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    match (method, path) {
        (Method::Options, _) => (204, None),
        (Method::Get, "/") => (200, Some(json!({ "status": "OK!" }))),
        (Method::Get, "/openapi.json") => (200, Some(openapi(title))),
        (Method::Get, path) if path.starts_with("/tables/") => {
            match percent_decode(&path["/tables/".len()..]) {
                Some(table) => table_rows(&table, storage),
                None => (400, Some(json!({ "detail": "Malformed table name" }))),
            }
        }
        (Method::Get, _) => not_found(),
        (_, "/" | "/openapi.json") => (405, Some(json!({ "detail": "Method Not Allowed" }))),
        (_, path) if path.starts_with("/tables/") => {
            (405, Some(json!({ "detail": "Method Not Allowed" })))
        }
        _ => not_found(),
    }
}

fn table_rows(table: &str, storage: &SharedStorage) -> (u16, Option<Json>) {
    let storage = match storage.get() {
        Ok(Some(storage)) => storage,
        Ok(None) => return (503, Some(json!({ "detail": "No database connected" }))),
        Err(error) => return (500, Some(json!({ "detail": error.to_string() }))),
    };
    match storage.select_all(table) {
        Ok(rows) => (200, Some(rows.to_json())),
        Err(error) => (404, Some(json!({ "detail": error.to_string() }))),
    }
}

/// Decodes `%XX` escapes in a path segment. `None` for a bad escape or non-UTF-8 result.
fn percent_decode(segment: &str) -> Option<String> {
    let mut decoded = Vec::with_capacity(segment.len());
    let mut bytes = segment.bytes();
    while let Some(byte) = bytes.next() {
        if byte != b'%' {
            decoded.push(byte);
            continue;
        }
        let high = char::from(bytes.next()?).to_digit(16)?;
        let low = char::from(bytes.next()?).to_digit(16)?;
        decoded.push(u8::try_from(high * 16 + low).ok()?);
    }
    String::from_utf8(decoded).ok()
}

fn not_found() -> (u16, Option<Json>) {
    (404, Some(json!({ "detail": "Not Found" })))
}

fn openapi(title: &str) -> Json {
    json!({
        "openapi": "3.1.0",
        "info": { "title": title, "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/": { "get": { "summary": "Health check" } },
            "/tables/{name}": { "get": { "summary": "List table rows" } }
        }
    })
}
