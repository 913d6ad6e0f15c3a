//! One-shot position lookups with a bounded wait.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{config::GeolocationConfig, error::GeolocationError, model::Coordinates};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position the caller accepts; zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Ask `geolocator` for a fix, giving up after `options.timeout` or when `cancel` fires.
pub async fn locate(
    geolocator: &dyn Geolocator,
    options: &PositionOptions,
    cancel: &CancellationToken,
) -> Result<Coordinates, GeolocationError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(GeolocationError::Cancelled),
        res = tokio::time::timeout(options.timeout, geolocator.current_position(options)) => {
            res.unwrap_or(Err(GeolocationError::Timeout))
        }
    }
}

/// Position taken from configuration, or a permission refusal.
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    permitted: bool,
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self {
            permitted: true,
            position,
        }
    }

    pub fn denied() -> Self {
        Self {
            permitted: false,
            position: None,
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        if !self.permitted {
            return Err(GeolocationError::PermissionDenied);
        }
        self.position.ok_or_else(|| {
            GeolocationError::Unavailable("no position configured".to_string())
        })
    }
}

/// Approximate position from an ip-api.com compatible lookup service.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    endpoint: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        debug!(endpoint = %self.endpoint, "looking up position by IP");

        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| GeolocationError::Unavailable(err.to_string()))?;

        if !res.status().is_success() {
            return Err(GeolocationError::Unavailable(format!(
                "lookup service answered {}",
                res.status()
            )));
        }

        let body: IpLookupResponse = res
            .json()
            .await
            .map_err(|err| GeolocationError::Unavailable(err.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
            _ => Err(GeolocationError::Unavailable(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            )),
        }
    }
}

/// Pick the geolocator described by `config`.
pub fn geolocator_from_config(config: &GeolocationConfig) -> Box<dyn Geolocator> {
    if !config.enabled {
        return Box::new(FixedGeolocator::denied());
    }

    match (config.latitude, config.longitude) {
        (Some(lat), Some(lon)) => Box::new(FixedGeolocator::new(Some(Coordinates { lat, lon }))),
        _ => Box::new(IpGeolocator::new(config.lookup_url.as_str())),
    }
}
