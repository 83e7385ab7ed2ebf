use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::handlers::SharedState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub env: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub rate_limiting: bool,
}

/// Liveness probe. The service has no external dependencies, so it is
/// available whenever it can answer.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "available".to_string(),
        env: state.env.clone(),
        version: state.version.clone(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        rate_limiting: state.rate_limiter.is_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "available".to_string(),
            env: "test".to_string(),
            version: "1.0.0".to_string(),
            uptime_seconds: 3600,
            rate_limiting: true,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("available"));
        assert!(json.contains("3600"));
    }
}
