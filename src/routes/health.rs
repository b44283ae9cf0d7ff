use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
    pub redis: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn from_check<E>(result: Result<(), E>, start: std::time::Instant) -> Self {
        match result {
            Ok(()) => Self {
                status: "ok".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(_) => Self {
                status: "error".to_string(),
                latency_ms: None,
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// GET /health: database and Redis reachability.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let db_result = sqlx::query("SELECT 1").execute(&state.db).await.map(|_| ());
    let db_check = ComponentHealth::from_check(db_result, start);

    let redis_start = std::time::Instant::now();
    let redis_check = ComponentHealth::from_check(state.queue.health_check().await, redis_start);

    if let Ok(depth) = state.queue.queue_depth().await {
        metrics::gauge!("analysis_queue_depth").set(depth as f64);
    }

    let all_healthy = db_check.is_ok() && redis_check.is_ok();
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            redis: redis_check,
        },
    };

    (status_code, Json(response))
}
