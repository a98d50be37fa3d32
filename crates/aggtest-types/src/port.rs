//! Testbed port classifications.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a port in the aggregate testbed.
///
/// The lowest-ordered port on each side carries the source link; every
/// other port is a member of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    /// Stand-alone port carrying the source link.
    Source,
    /// Port bound to the aggregate interface.
    Member,
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRole::Source => write!(f, "source"),
            PortRole::Member => write!(f, "member"),
        }
    }
}

/// Physical medium dependent sublayer of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pmd {
    #[serde(rename = "10GBASE-SR")]
    Pmd10GBaseSr,
    #[serde(rename = "100GBASE-LR4")]
    Pmd100GBaseLr4,
    /// Single-lambda 100G optic; some generators cannot run RS-FEC on it.
    #[serde(rename = "100GBASE-FR")]
    Pmd100GBaseFr,
    #[serde(rename = "400GBASE-DR4")]
    Pmd400GBaseDr4,
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl Pmd {
    /// Returns true if the traffic generator must turn off RS-FEC
    /// auto-negotiation for this medium.
    pub const fn requires_fec_override(&self) -> bool {
        matches!(self, Pmd::Pmd100GBaseFr)
    }

    /// Returns the line rate the medium runs at, if it is known.
    pub const fn speed(&self) -> Option<PortSpeed> {
        match self {
            Pmd::Pmd10GBaseSr => Some(PortSpeed::Speed10Gb),
            Pmd::Pmd100GBaseLr4 | Pmd::Pmd100GBaseFr => Some(PortSpeed::Speed100Gb),
            Pmd::Pmd400GBaseDr4 => Some(PortSpeed::Speed400Gb),
            Pmd::Unspecified => None,
        }
    }
}

/// Ethernet port speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PortSpeed {
    #[serde(rename = "SPEED_10GB")]
    Speed10Gb,
    #[serde(rename = "SPEED_25GB")]
    Speed25Gb,
    #[serde(rename = "SPEED_40GB")]
    Speed40Gb,
    #[default]
    #[serde(rename = "SPEED_100GB")]
    Speed100Gb,
    #[serde(rename = "SPEED_400GB")]
    Speed400Gb,
}

impl PortSpeed {
    /// Returns the traffic generator's layer-1 speed identifier.
    pub const fn otg_name(&self) -> &'static str {
        match self {
            PortSpeed::Speed10Gb => "speed_10_gbps",
            PortSpeed::Speed25Gb => "speed_25_gbps",
            PortSpeed::Speed40Gb => "speed_40_gbps",
            PortSpeed::Speed100Gb => "speed_100_gbps",
            PortSpeed::Speed400Gb => "speed_400_gbps",
        }
    }
}

impl fmt::Display for PortSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortSpeed::Speed10Gb => "SPEED_10GB",
            PortSpeed::Speed25Gb => "SPEED_25GB",
            PortSpeed::Speed40Gb => "SPEED_40GB",
            PortSpeed::Speed100Gb => "SPEED_100GB",
            PortSpeed::Speed400Gb => "SPEED_400GB",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PortSpeed {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SPEED_10GB" | "10G" => Ok(PortSpeed::Speed10Gb),
            "SPEED_25GB" | "25G" => Ok(PortSpeed::Speed25Gb),
            "SPEED_40GB" | "40G" => Ok(PortSpeed::Speed40Gb),
            "SPEED_100GB" | "100G" => Ok(PortSpeed::Speed100Gb),
            "SPEED_400GB" | "400G" => Ok(PortSpeed::Speed400Gb),
            _ => Err(ParseError::InvalidPortSpeed(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fec_override_only_for_100g_fr() {
        assert!(Pmd::Pmd100GBaseFr.requires_fec_override());
        assert!(!Pmd::Pmd100GBaseLr4.requires_fec_override());
        assert!(!Pmd::Unspecified.requires_fec_override());
    }

    #[test]
    fn test_pmd_speed() {
        assert_eq!(Pmd::Pmd100GBaseFr.speed(), Some(PortSpeed::Speed100Gb));
        assert_eq!(Pmd::Pmd400GBaseDr4.speed(), Some(PortSpeed::Speed400Gb));
        assert_eq!(Pmd::Unspecified.speed(), None);
    }

    #[test]
    fn test_port_speed_parse() {
        assert_eq!("100G".parse::<PortSpeed>().unwrap(), PortSpeed::Speed100Gb);
        assert_eq!("speed_400gb".parse::<PortSpeed>().unwrap(), PortSpeed::Speed400Gb);
        assert!("1T".parse::<PortSpeed>().is_err());
        assert_eq!(PortSpeed::Speed100Gb.otg_name(), "speed_100_gbps");
    }

    #[test]
    fn test_display() {
        assert_eq!(PortRole::Source.to_string(), "source");
        assert_eq!(PortSpeed::Speed25Gb.to_string(), "SPEED_25GB");
    }
}
