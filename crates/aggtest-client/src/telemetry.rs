//! Client traits for the device under test and the traffic generator.
//!
//! Both sides expose a read-only telemetry tree through [`Telemetry`]. The
//! device additionally accepts gNMI-style configuration writes
//! ([`DeviceClient`]); the traffic generator accepts a whole topology at a
//! time ([`TrafficClient`]).
//!
//! Values cross the traits as `serde_json::Value`. The typed helpers
//! [`lookup_as`], [`get_as`] and [`encode`] convert at the edges.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::otg::OtgConfig;
use crate::ports::{Port, Vendor};
use crate::TelemetryPath;

/// Read access to a target's telemetry tree.
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Returns the target's name (for logging).
    fn target(&self) -> &str;

    /// Returns the ports reserved on this target for the test.
    fn ports(&self) -> Vec<Port>;

    /// Reads the value at `path`; `None` if no value is present.
    async fn lookup(&self, path: &TelemetryPath) -> ClientResult<Option<Value>>;

    /// Reads the value at `path`, failing if none is present.
    async fn get(&self, path: &TelemetryPath) -> ClientResult<Value> {
        self.lookup(path)
            .await?
            .ok_or_else(|| ClientError::not_found(path.to_string()))
    }

    /// Subscribes to `path`.
    ///
    /// The stream yields the current value first, then the value after
    /// every change to the target's tree. `None` means no value is present.
    async fn subscribe(&self, path: &TelemetryPath) -> ClientResult<BoxStream<'static, Option<Value>>>;
}

/// Configuration access to a device under test.
#[async_trait]
pub trait DeviceClient: Telemetry {
    /// Returns the device vendor.
    fn vendor(&self) -> Vendor;

    /// Replaces the subtree at `path` with `value`.
    async fn replace(&self, path: &TelemetryPath, value: Value) -> ClientResult<()>;

    /// Merges `value` into the subtree at `path`.
    async fn update(&self, path: &TelemetryPath, value: Value) -> ClientResult<()>;

    /// Deletes the subtree at `path`. Deleting an absent path succeeds.
    async fn delete(&self, path: &TelemetryPath) -> ClientResult<()>;
}

/// Control access to a traffic generator.
#[async_trait]
pub trait TrafficClient: Telemetry {
    /// Replaces the generator's whole topology with `config`.
    async fn push_config(&self, config: &OtgConfig) -> ClientResult<()>;

    /// Starts control-plane protocols (ARP/ND, LACP) on the pushed topology.
    async fn start_protocols(&self) -> ClientResult<()>;
}

/// Converts `value` into the JSON form sent over the client traits.
pub fn encode<T: Serialize>(path: &TelemetryPath, value: &T) -> ClientResult<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::decode(path.to_string(), e.to_string()))
}

/// Converts a value read at `path` into `T`.
pub fn decode<T: DeserializeOwned>(path: &TelemetryPath, value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|e| ClientError::decode(path.to_string(), e.to_string()))
}

/// Reads `path` and decodes the value, if present.
pub async fn lookup_as<T, C>(client: &C, path: &TelemetryPath) -> ClientResult<Option<T>>
where
    T: DeserializeOwned,
    C: Telemetry + ?Sized,
{
    match client.lookup(path).await? {
        Some(value) => decode(path, value).map(Some),
        None => Ok(None),
    }
}

/// Reads `path` and decodes the value, failing if none is present.
pub async fn get_as<T, C>(client: &C, path: &TelemetryPath) -> ClientResult<T>
where
    T: DeserializeOwned,
    C: Telemetry + ?Sized,
{
    let value = client.get(path).await?;
    decode(path, value)
}
