//! Device capability flags.
//!
//! Devices differ in which configuration shapes they accept and which
//! telemetry they export. The workflow never branches on the vendor
//! directly; it asks a [`Deviations`] value, built from the per-vendor
//! table below and optionally adjusted with [`DeviationOverrides`] from the
//! testbed configuration.

use serde::{Deserialize, Serialize};

use crate::Vendor;

/// Name of the default network instance when a vendor does not override it.
pub const DEFAULT_NETWORK_INSTANCE: &str = "DEFAULT";

/// Capability flags consulted before each conditional configuration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deviations {
    /// Interfaces and address families need an explicit `enabled = true`.
    pub interface_enabled: bool,
    /// The device rejects the IPv4 `enabled` leaf.
    pub ipv4_missing_enabled: bool,
    /// Aggregate changes must be applied in one transaction together with
    /// their members.
    pub aggregate_atomic_update: bool,
    /// Interfaces must be bound to the default network instance explicitly.
    pub explicit_interface_in_default_vrf: bool,
    /// Name of the default network instance.
    pub default_network_instance: String,
    /// Ports need an explicit speed.
    pub explicit_port_speed: bool,
    /// Subinterface packet counters are not exported.
    pub subinterface_packet_counters_missing: bool,
    /// IPv6 discarded-packet counters are not exported.
    pub ipv6_discarded_pkts_unsupported: bool,
}

impl Default for Deviations {
    fn default() -> Self {
        Self {
            interface_enabled: false,
            ipv4_missing_enabled: false,
            aggregate_atomic_update: false,
            explicit_interface_in_default_vrf: false,
            default_network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
            explicit_port_speed: false,
            subinterface_packet_counters_missing: false,
            ipv6_discarded_pkts_unsupported: false,
        }
    }
}

impl Deviations {
    /// Returns the built-in capability flags for a vendor.
    pub fn for_vendor(vendor: Vendor) -> Self {
        match vendor {
            Vendor::Arista => Self {
                interface_enabled: true,
                default_network_instance: "default".to_string(),
                subinterface_packet_counters_missing: true,
                ..Self::default()
            },
            Vendor::Cisco => Self {
                interface_enabled: true,
                ipv4_missing_enabled: true,
                explicit_interface_in_default_vrf: true,
                ipv6_discarded_pkts_unsupported: true,
                ..Self::default()
            },
            Vendor::Juniper => Self {
                interface_enabled: true,
                aggregate_atomic_update: true,
                ..Self::default()
            },
            Vendor::Nokia => Self {
                interface_enabled: true,
                aggregate_atomic_update: true,
                explicit_interface_in_default_vrf: true,
                explicit_port_speed: true,
                ..Self::default()
            },
            Vendor::Other => Self::default(),
        }
    }

    /// Applies per-testbed overrides on top of these flags.
    pub fn with_overrides(mut self, overrides: &DeviationOverrides) -> Self {
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = overrides.$field.clone() {
                    self.$field = v;
                })*
            };
        }
        apply!(
            interface_enabled,
            ipv4_missing_enabled,
            aggregate_atomic_update,
            explicit_interface_in_default_vrf,
            default_network_instance,
            explicit_port_speed,
            subinterface_packet_counters_missing,
            ipv6_discarded_pkts_unsupported,
        );
        self
    }

    /// Returns true if the IPv4 `enabled` leaf should be written.
    pub fn ipv4_enabled_leaf(&self) -> bool {
        self.interface_enabled && !self.ipv4_missing_enabled
    }

    /// Returns true if the IPv6 discarded-packet counters are not exported.
    pub fn skip_ipv6_discarded_pkts(&self) -> bool {
        self.subinterface_packet_counters_missing || self.ipv6_discarded_pkts_unsupported
    }
}

/// Optional per-flag overrides, as read from a testbed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationOverrides {
    pub interface_enabled: Option<bool>,
    pub ipv4_missing_enabled: Option<bool>,
    pub aggregate_atomic_update: Option<bool>,
    pub explicit_interface_in_default_vrf: Option<bool>,
    pub default_network_instance: Option<String>,
    pub explicit_port_speed: Option<bool>,
    pub subinterface_packet_counters_missing: Option<bool>,
    pub ipv6_discarded_pkts_unsupported: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vendor_table() {
        let juniper = Deviations::for_vendor(Vendor::Juniper);
        assert!(juniper.aggregate_atomic_update);
        assert!(juniper.interface_enabled);

        let other = Deviations::for_vendor(Vendor::Other);
        assert_eq!(other, Deviations::default());
        assert_eq!(other.default_network_instance, "DEFAULT");
    }

    #[test]
    fn test_overrides() {
        let overrides = DeviationOverrides {
            aggregate_atomic_update: Some(false),
            ipv6_discarded_pkts_unsupported: Some(true),
            default_network_instance: Some("mgmt".to_string()),
            ..Default::default()
        };
        let devs = Deviations::for_vendor(Vendor::Juniper).with_overrides(&overrides);

        assert!(!devs.aggregate_atomic_update);
        assert!(devs.ipv6_discarded_pkts_unsupported);
        assert!(devs.interface_enabled);
        assert_eq!(devs.default_network_instance, "mgmt");
    }

    #[test]
    fn test_derived_flags() {
        let cisco = Deviations::for_vendor(Vendor::Cisco);
        assert!(!cisco.ipv4_enabled_leaf());
        assert!(cisco.skip_ipv6_discarded_pkts());

        let arista = Deviations::for_vendor(Vendor::Arista);
        assert!(arista.ipv4_enabled_leaf());
        assert!(arista.skip_ipv6_discarded_pkts());

        assert!(!Deviations::default().skip_ipv6_discarded_pkts());
    }
}
