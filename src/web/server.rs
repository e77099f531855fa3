//! HTTP server.
//!
//! Accepts connections and serves the demo app wrapped in the session layer
//! over HTTP/1.1.

use super::app::route;
use crate::config::Result;
use crate::core::middleware::SessionLayer;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tracing::{debug, error, info};

/// Serves the demo app on `listener` until the task is dropped.
///
/// At most `concurrency_limit` connections are served at once.
///
/// # Errors
///
/// Returns an error if the listener's local address cannot be read.
pub async fn serve(
    listener: TcpListener,
    layer: SessionLayer,
    concurrency_limit: usize,
) -> Result<()> {
    let service = ServiceBuilder::new()
        .layer(layer)
        .service_fn(route::<Incoming>);

    info!(listen_addr = %listener.local_addr()?, "Session server started");

    let connection_limit = Arc::new(Semaphore::new(concurrency_limit.max(1)));

    loop {
        let Ok(permit) = connection_limit.clone().acquire_owned().await else {
            break;
        };

        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let io = TokioIo::new(stream);
                let svc = TowerToHyperService::new(service.clone());
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                        debug!(peer_addr = %peer_addr, error = %e, "Connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Accept error");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    Ok(())
}
