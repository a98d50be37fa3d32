//! Collaborator contracts for link aggregation tests.
//!
//! The test workflow talks to two externally supplied targets and this
//! crate defines what it expects from them:
//!
//! - [`DeviceClient`]: gNMI-style config writes and telemetry reads on the
//!   device under test
//! - [`TrafficClient`]: topology push, protocol start and telemetry reads on
//!   the traffic generator
//! - [`oc`]: the device configuration/state object model
//! - [`otg`]: the traffic-generator topology and metrics model
//! - [`paths`]: path builders for both trees
//! - [`Deviations`]: per-device capability flags
//!
//! # Example
//!
//! ```ignore
//! use aggtest_client::{encode, oc, paths, DeviceClient};
//!
//! async fn bind_member<D: DeviceClient>(dut: &D, port: &str, agg: &str) -> ClientResult<()> {
//!     let mut intf = oc::Interface::named(port);
//!     intf.get_or_create_ethernet().aggregate_id = Some(agg.to_string());
//!     let path = paths::device::interface(port);
//!     dut.replace(&path, encode(&path, &intf)?).await
//! }
//! ```

pub mod deviations;
pub mod error;
pub mod oc;
pub mod otg;
pub mod path;
pub mod paths;
pub mod ports;
pub mod telemetry;

// Re-export commonly used items at crate root
pub use deviations::{DeviationOverrides, Deviations, DEFAULT_NETWORK_INSTANCE};
pub use error::{ClientError, ClientResult};
pub use path::{PathElem, TelemetryPath, View};
pub use ports::{Port, Vendor};
pub use telemetry::{decode, encode, get_as, lookup_as, DeviceClient, Telemetry, TrafficClient};
