//! Demo application.
//!
//! A handful of routes that read and mutate the session placed in request
//! extensions by the session layer.

use crate::core::middleware::Session;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use std::convert::Infallible;
use tracing::{debug, warn};

/// Amount added to the `value` key by `/populate_session`.
pub const POPULATE_STEP: i64 = 120;

fn respond(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(body.into()));
    *res.status_mut() = status;
    res
}

fn populate(session: &Session) -> Response<Full<Bytes>> {
    let value = session.get::<i64>("value").unwrap_or(0);
    match session.insert("value", value + POPULATE_STEP) {
        Ok(_) => respond(StatusCode::OK, Bytes::new()),
        Err(e) => {
            warn!(error = %e, "Failed to update session");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "session update failed")
        }
    }
}

fn read(session: &Session) -> Response<Full<Bytes>> {
    match serde_json::to_vec(&session.snapshot()) {
        Ok(body) => {
            let mut res = respond(StatusCode::OK, body);
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            res
        }
        Err(e) => {
            warn!(error = %e, "Failed to serialize session");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "session read failed")
        }
    }
}

/// Routes a request. Expects to run behind a `SessionLayer`.
///
/// # Errors
///
/// Never fails; the error type satisfies the service contract.
pub async fn route<B>(req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible> {
    let Some(session) = req.extensions().get::<Session>().cloned() else {
        warn!(path = %req.uri().path(), "Request reached the app without a session");
        return Ok(respond(StatusCode::INTERNAL_SERVER_ERROR, "session layer missing"));
    };

    debug!(method = %req.method(), path = %req.uri().path(), "Handling request");

    let res = match (req.method(), req.uri().path()) {
        (&Method::GET, "/populate_session") => populate(&session),
        (&Method::GET, "/read_session") => read(&session),
        (&Method::GET, "/clear_session") => {
            session.clear();
            respond(StatusCode::OK, Bytes::new())
        }
        _ => respond(StatusCode::NOT_FOUND, "404 Not Found"),
    };

    Ok(res)
}
