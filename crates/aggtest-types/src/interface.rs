//! OpenConfig interface enumerations.
//!
//! Values serialize with the exact identifiers used on the telemetry wire
//! (`ieee8023adLag`, `STATIC`, `UP`, ...), so they can be compared directly
//! against state read back from a device.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IETF interface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    /// Physical Ethernet port.
    #[serde(rename = "ethernetCsmacd")]
    EthernetCsmacd,
    /// IEEE 802.3ad link aggregate.
    #[serde(rename = "ieee8023adLag")]
    Ieee8023adLag,
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceType::EthernetCsmacd => write!(f, "ethernetCsmacd"),
            InterfaceType::Ieee8023adLag => write!(f, "ieee8023adLag"),
        }
    }
}

impl FromStr for InterfaceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethernetCsmacd" => Ok(InterfaceType::EthernetCsmacd),
            "ieee8023adLag" => Ok(InterfaceType::Ieee8023adLag),
            _ => Err(ParseError::InvalidInterfaceType(s.to_string())),
        }
    }
}

/// Aggregation type of a LAG interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LagType {
    /// Membership negotiated with LACP.
    #[serde(rename = "LACP", alias = "lacp")]
    Lacp,
    /// Static membership.
    #[default]
    #[serde(rename = "STATIC", alias = "static")]
    Static,
}

impl LagType {
    /// Returns true if the aggregate negotiates membership with LACP.
    pub const fn is_lacp(&self) -> bool {
        matches!(self, LagType::Lacp)
    }
}

impl fmt::Display for LagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LagType::Lacp => write!(f, "LACP"),
            LagType::Static => write!(f, "STATIC"),
        }
    }
}

impl FromStr for LagType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LACP" => Ok(LagType::Lacp),
            "STATIC" => Ok(LagType::Static),
            _ => Err(ParseError::InvalidLagType(s.to_string())),
        }
    }
}

/// Administrative status of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminStatus {
    Up,
    #[default]
    Down,
    Testing,
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminStatus::Up => write!(f, "UP"),
            AdminStatus::Down => write!(f, "DOWN"),
            AdminStatus::Testing => write!(f, "TESTING"),
        }
    }
}

/// Operational status of an interface, a LAG or a traffic-generator port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperStatus {
    Up,
    #[default]
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
}

impl OperStatus {
    /// Returns true if the interface is operationally up.
    pub const fn is_up(&self) -> bool {
        matches!(self, OperStatus::Up)
    }
}

impl fmt::Display for OperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperStatus::Up => "UP",
            OperStatus::Down => "DOWN",
            OperStatus::Testing => "TESTING",
            OperStatus::Unknown => "UNKNOWN",
            OperStatus::Dormant => "DORMANT",
            OperStatus::NotPresent => "NOT_PRESENT",
            OperStatus::LowerLayerDown => "LOWER_LAYER_DOWN",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OperStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UP" => Ok(OperStatus::Up),
            "DOWN" => Ok(OperStatus::Down),
            "TESTING" => Ok(OperStatus::Testing),
            "UNKNOWN" => Ok(OperStatus::Unknown),
            "DORMANT" => Ok(OperStatus::Dormant),
            "NOT_PRESENT" => Ok(OperStatus::NotPresent),
            "LOWER_LAYER_DOWN" => Ok(OperStatus::LowerLayerDown),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}
