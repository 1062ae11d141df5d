//! System health data source for the dashboard's system metrics.
//!
//! No monitoring integration exists yet, so the gateway ships
//! [`StaticHealthSource`], which reports configured placeholder values and
//! marks them as approximate. A real integration implements
//! [`SystemHealthSource`] and is swapped in at startup.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Snapshot reported by a [`SystemHealthSource`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SystemHealth {
    /// Service availability over the reporting period, in percent.
    pub uptime_percent: f64,
    /// Mean API response time in milliseconds.
    pub avg_response_time_ms: u64,
    /// Measured error rate in percent, when the source has one.
    pub error_rate_percent: Option<f64>,
    /// `true` when the values are placeholders rather than measurements.
    pub approximate: bool,
    /// Name of the source that produced the snapshot.
    pub source: String,
}

/// Capability to fetch the current system health.
#[async_trait]
pub trait SystemHealthSource: Send + Sync + std::fmt::Debug {
    /// Returns the latest health snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HealthUnavailable`] if the source cannot be
    /// read.
    async fn fetch_system_health(&self) -> Result<SystemHealth, GatewayError>;
}

/// Placeholder source returning configured constants.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticHealthSource {
    uptime_percent: f64,
    avg_response_time_ms: u64,
}

impl StaticHealthSource {
    /// Creates a source reporting the given values.
    #[must_use]
    pub const fn new(uptime_percent: f64, avg_response_time_ms: u64) -> Self {
        Self {
            uptime_percent,
            avg_response_time_ms,
        }
    }

    /// Reads `HEALTH_UPTIME_PERCENT` / `HEALTH_RESPONSE_TIME_MS` settings.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.health_uptime_percent, config.health_response_time_ms)
    }
}

impl Default for StaticHealthSource {
    fn default() -> Self {
        Self::new(99.9, 120)
    }
}

#[async_trait]
impl SystemHealthSource for StaticHealthSource {
    async fn fetch_system_health(&self) -> Result<SystemHealth, GatewayError> {
        Ok(SystemHealth {
            uptime_percent: self.uptime_percent,
            avg_response_time_ms: self.avg_response_time_ms,
            error_rate_percent: None,
            approximate: true,
            source: "static".to_string(),
        })
    }
}
