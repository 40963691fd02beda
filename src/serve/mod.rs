//! Token-resolving link server.
//!
//! # Design
//!
//! Response decisions are separated from transport: [`resolve`] and
//! [`handle_health`] return plain values and the HTTP adapter writes them
//! out. Every serving outcome is testable without opening a socket.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::store::token::token_log_prefix;
use crate::store::{LinkStore, StoreError};

/// What resolving a token produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// A view was spent and the blob bytes are in hand.
    Served {
        body: Vec<u8>,
        content_type: &'static str,
        remaining: i64,
    },
    /// Token unknown or exhausted. Maps to HTTP 410.
    Gone,
    /// The row resolved but the blob is absent on disk. The view is already
    /// spent. Maps to HTTP 404.
    Missing,
}

/// Spend a view and load the bytes behind `token`.
///
/// The exhausting view removes the blob only after its bytes are read, so
/// the last reader is still served.
pub async fn resolve(store: &LinkStore, token: &str) -> Result<ServeOutcome, StoreError> {
    let Some(link) = store.consume(token).await? else {
        return Ok(ServeOutcome::Gone);
    };

    match tokio::fs::read(&link.path).await {
        Ok(body) => {
            if link.remaining == 0 {
                store.remove_blob(&link).await;
            }
            Ok(ServeOutcome::Served {
                body,
                content_type: content_type_for_path(&link.path),
                remaining: link.remaining,
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                token = token_log_prefix(token),
                path = %link.path.display(),
                "Link row resolved but blob is missing"
            );
            Ok(ServeOutcome::Missing)
        }
        Err(e) => Err(e.into()),
    }
}

/// Infer a content type from the blob file extension. Unknown or absent
/// extensions fall back to `image/jpeg`, which is what the store writes.
pub fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Body for the `GET /` health route: status, version and store counters.
pub async fn handle_health(store: &LinkStore) -> Result<String, StoreError> {
    let active = store.active_links().await?;

    Ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_links": active,
        "stats": store.stats(),
    })
    .to_string())
}

/// HTTP adapter in front of a shared [`LinkStore`].
pub struct LinkServer {
    store: Arc<LinkStore>,
    address: String,
    port: u16,
}

impl LinkServer {
    pub fn new(store: Arc<LinkStore>, config: &ServerConfig) -> Self {
        Self {
            store,
            address: config.address.clone(),
            port: config.port,
        }
    }

    /// Accept connections until `cancel` flips to true.
    pub async fn start(&self, mut cancel: watch::Receiver<bool>) -> std::io::Result<()> {
        let listener = TcpListener::bind((self.address.as_str(), self.port)).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "Link server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let store = Arc::clone(&self.store);
                            tokio::spawn(async move {
                                handle_connection(store, stream, peer_addr).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Accept failed");
                        }
                    }
                }
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Link server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Drive one TCP connection through hyper's http1 state machine.
async fn handle_connection(
    store: Arc<LinkStore>,
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
) {
    let io = hyper_util::rt::TokioIo::new(stream);

    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
        let store = Arc::clone(&store);
        async move { Ok::<_, hyper::Error>(route(store.as_ref(), &req).await) }
    });

    if let Err(e) = hyper::server::conn::http1::Builder::new()
        .serve_connection(io, service)
        .await
    {
        tracing::debug!(peer = %peer_addr, error = %e, "Connection closed with error");
    }
}

/// Map a request to a response. Request bodies are never read, so any body
/// type goes; this is what lets tests drive routing without a socket.
async fn route<B>(store: &LinkStore, req: &Request<B>) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let path = req.uri().path();

    if path == "/" {
        return match handle_health(store).await {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };
    }

    if let Some(token) = path.strip_prefix("/v/") {
        if token.is_empty() || token.contains('/') {
            return text_response(StatusCode::NOT_FOUND, "Not found");
        }

        return match resolve(store, token).await {
            Ok(ServeOutcome::Served {
                body,
                content_type,
                remaining,
            }) => {
                tracing::info!(
                    token = token_log_prefix(token),
                    remaining,
                    bytes = body.len(),
                    "View served"
                );
                blob_response(body, content_type)
            }
            Ok(ServeOutcome::Gone) => text_response(StatusCode::GONE, "Link expired or not found"),
            Ok(ServeOutcome::Missing) => text_response(StatusCode::NOT_FOUND, "Not found"),
            Err(e) => {
                tracing::error!(token = token_log_prefix(token), error = %e, "Serving failed");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };
    }

    text_response(StatusCode::NOT_FOUND, "Not found")
}

fn blob_response(body: Vec<u8>, content_type: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, content_type)
        // Views are spent server-side; a cached copy must never satisfy one.
        .header(http::header::CACHE_CONTROL, "no-store")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(message.as_bytes())))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
            *fallback.status_mut() = status;
            fallback
        })
}
