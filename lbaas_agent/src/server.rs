/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

//! HTTP interface.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{event, Level};

use crate::error::{Error, ErrorKind};
use crate::service::FlowService;

#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub cookie_value: Option<String>,
    pub bm_neutron_port_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertResponse {
    pub cookie_value: String,
    pub rule: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Resolution => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn api_error(e: Error) -> ApiError {
    let status = status_for(e.kind());
    if status.is_server_error() {
        event!(Level::ERROR, "{e}");
    } else {
        event!(Level::WARN, "{e}");
    }
    (status, Json(ErrorBody { error: e.to_string() }))
}

pub fn router(service: Arc<FlowService>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/flows", post(insert_flow))
        .route("/flows/:cookie", delete(delete_flow))
        .route("/v1/openflow/rule", post(insert_flow))
        .route("/v1/openflow/rule/:cookie", delete(delete_flow))
        .with_state(service)
}

/// Serves `router` on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, service: Arc<FlowService>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// Runs `f` on the blocking pool, since every flow service call waits on `ovs-ofctl` or
/// `ovn-sbctl`.
async fn run_blocking<T, F>(service: Arc<FlowService>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&FlowService) -> Result<T, Error> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&service)).await {
        Ok(result) => result.map_err(api_error),
        Err(e) => {
            event!(Level::ERROR, "request task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: "internal error".into() })))
        }
    }
}

async fn insert_flow(State(service): State<Arc<FlowService>>,
                     req: Result<Json<InsertRequest>, JsonRejection>)
                     -> Result<Json<InsertResponse>, ApiError> {
    let Json(req) = req.map_err(|e| api_error(Error::BadRequest(e.body_text())))?;
    let (cookie, port_id) = match (req.cookie_value, req.bm_neutron_port_id) {
        (Some(c), Some(p)) if !c.trim().is_empty() && !p.trim().is_empty() => {
            (c.trim().to_string(), p.trim().to_string())
        }
        _ => return Err(api_error(Error::MissingFields)),
    };
    let installed = run_blocking(service, move |s| s.insert(&cookie, &port_id)).await?;
    Ok(Json(InsertResponse { cookie_value: installed.cookie.to_string(), rule: installed.rule }))
}

async fn delete_flow(State(service): State<Arc<FlowService>>, Path(cookie): Path<String>)
                     -> Result<Json<OkResponse>, ApiError> {
    run_blocking(service, move |s| s.delete(cookie.trim())).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Resolution), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Upstream), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }
}
