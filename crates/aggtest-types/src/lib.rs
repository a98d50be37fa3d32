//! Common types for link aggregation testbeds.
//!
//! This crate provides type-safe representations of the network primitives
//! exchanged between a device under test (DUT) and its traffic generator:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses with checked increment
//! - [`IpPrefix`]: interface addresses with prefix length
//! - [`Attributes`]: addressing of one logical test endpoint
//! - [`InterfaceType`], [`LagType`], [`AdminStatus`], [`OperStatus`]:
//!   OpenConfig interface enumerations
//! - [`PortRole`], [`Pmd`], [`PortSpeed`]: testbed port classifications

mod attrs;
mod interface;
mod ip;
mod mac;
mod port;

pub use attrs::Attributes;
pub use interface::{AdminStatus, InterfaceType, LagType, OperStatus};
pub use ip::IpPrefix;
pub use mac::MacAddress;
pub use port::{Pmd, PortRole, PortSpeed};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("MAC address {base} + {offset} overflows the 48-bit address space")]
    MacOverflow { base: String, offset: u64 },

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid interface type: {0}")]
    InvalidInterfaceType(String),

    #[error("invalid lag type: {0} (expected LACP or STATIC)")]
    InvalidLagType(String),

    #[error("invalid interface status: {0}")]
    InvalidStatus(String),

    #[error("invalid port speed: {0}")]
    InvalidPortSpeed(String),
}
