//! Probe endpoints for orchestrators.
//!
//! Both probes answer with a small JSON report. Readiness also names the
//! storage backend the server settled on, so an operator can tell at a glance
//! whether a deployment fell back to in-memory mode.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::{Deserialize, Serialize};

/// Where accounts, posts and ballots live for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Probe outcome reported in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ready,
    Starting,
    Alive,
    Draining,
}

/// Body of `/health/ready` and `/health/live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProbeReport {
    pub status: ProbeStatus,
    /// Absent until the server has bound its listener.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageBackend>,
}

/// Probe state shared between bootstrap and the handlers.
///
/// A fresh state is live but not ready.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    storage: OnceLock<StorageBackend>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            storage: OnceLock::new(),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting traffic on `storage`. The first backend recorded wins.
    pub fn mark_ready(&self, storage: StorageBackend) {
        let _ = self.storage.set(storage);
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness from now on, e.g. while draining for shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn storage(&self) -> Option<StorageBackend> {
        self.storage.get().copied()
    }

    fn readiness(&self) -> (bool, ProbeReport) {
        let is_ready = self.is_ready();
        let status = if is_ready {
            ProbeStatus::Ready
        } else {
            ProbeStatus::Starting
        };
        (
            is_ready,
            ProbeReport {
                status,
                storage: self.storage(),
            },
        )
    }

    fn liveness(&self) -> (bool, ProbeReport) {
        let alive = self.is_alive();
        let status = if alive {
            ProbeStatus::Alive
        } else {
            ProbeStatus::Draining
        };
        (
            alive,
            ProbeReport {
                status,
                storage: self.storage(),
            },
        )
    }
}

fn probe_response((ok, report): (bool, ProbeReport)) -> HttpResponse {
    let mut response = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(report)
}

/// Readiness probe. 200 once the listener is bound, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Serving traffic", body = ProbeReport),
        (status = 503, description = "Still starting", body = ProbeReport)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.readiness())
}

/// Liveness probe. 200 while alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is alive", body = ProbeReport),
        (status = 503, description = "Process is draining", body = ProbeReport)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.liveness())
}
