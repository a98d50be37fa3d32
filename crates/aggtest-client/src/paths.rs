//! Path builders for the device and traffic-generator trees.
//!
//! Builders return config-view paths; call `.state()` on the result to read
//! observed state.

/// Schema path prefix of interface counters, used in reports and to name
/// unsupported counters.
pub const INTF_COUNTER_PATH: &str = "/interfaces/interface/state/counters/";

/// Schema path prefix of IPv4 subinterface counters.
pub const IPV4_COUNTER_PATH: &str = "/interfaces/interface/subinterfaces/subinterface/ipv4/state/counters/";

/// Schema path prefix of IPv6 subinterface counters.
pub const IPV6_COUNTER_PATH: &str = "/interfaces/interface/subinterfaces/subinterface/ipv6/state/counters/";

/// Device paths.
pub mod device {
    use crate::TelemetryPath;

    /// The device root.
    pub fn root() -> TelemetryPath {
        TelemetryPath::root()
    }

    /// `/interfaces`
    pub fn interfaces() -> TelemetryPath {
        TelemetryPath::root().child("interfaces")
    }

    /// `/interfaces/interface[name=<name>]`
    pub fn interface(name: &str) -> TelemetryPath {
        TelemetryPath::root()
            .child("interfaces")
            .keyed("interface", "name", name)
    }

    /// `/interfaces/interface[name=<name>]/type`
    pub fn interface_type(name: &str) -> TelemetryPath {
        interface(name).child("type")
    }

    /// `/interfaces/interface[name=<name>]/admin-status`
    pub fn admin_status(name: &str) -> TelemetryPath {
        interface(name).child("admin-status")
    }

    /// `/interfaces/interface[name=<name>]/oper-status`
    pub fn oper_status(name: &str) -> TelemetryPath {
        interface(name).child("oper-status")
    }

    /// `/interfaces/interface[name=<name>]/ethernet/aggregate-id`
    pub fn aggregate_id(name: &str) -> TelemetryPath {
        interface(name).child("ethernet").child("aggregate-id")
    }

    /// `/interfaces/interface[name=<name>]/ethernet/port-speed`
    pub fn port_speed(name: &str) -> TelemetryPath {
        interface(name).child("ethernet").child("port-speed")
    }

    /// `/interfaces/interface[name=<name>]/aggregation/min-links`
    pub fn min_links(name: &str) -> TelemetryPath {
        interface(name).child("aggregation").child("min-links")
    }

    /// `/interfaces/interface[name=<name>]/counters/<leaf>`
    pub fn counter(name: &str, leaf: &str) -> TelemetryPath {
        interface(name).child("counters").child(leaf)
    }

    /// `/interfaces/interface[name=<name>]/subinterfaces/subinterface[index=<index>]`
    pub fn subinterface(name: &str, index: u32) -> TelemetryPath {
        interface(name)
            .child("subinterfaces")
            .keyed("subinterface", "index", index.to_string())
    }

    /// `.../subinterface[index=<index>]/<family>/counters/<leaf>` where
    /// `family` is "ipv4" or "ipv6".
    pub fn subinterface_counter(name: &str, index: u32, family: &str, leaf: &str) -> TelemetryPath {
        subinterface(name, index)
            .child(family)
            .child("counters")
            .child(leaf)
    }

    /// `/lacp/interfaces/interface[name=<name>]`
    pub fn lacp_interface(name: &str) -> TelemetryPath {
        TelemetryPath::root()
            .child("lacp")
            .child("interfaces")
            .keyed("interface", "name", name)
    }

    /// `/network-instances/network-instance[name=<ni>]/interfaces/interface[id=<id>]`
    pub fn network_instance_interface(ni: &str, id: &str) -> TelemetryPath {
        TelemetryPath::root()
            .child("network-instances")
            .keyed("network-instance", "name", ni)
            .child("interfaces")
            .keyed("interface", "id", id)
    }
}

/// Traffic-generator paths.
pub mod otg {
    use crate::TelemetryPath;

    /// `/ports/port[name=<port>]`
    pub fn port(port: &str) -> TelemetryPath {
        TelemetryPath::root().child("ports").keyed("port", "name", port)
    }

    /// `/ports/port[name=<port>]/link`
    pub fn port_link(port: &str) -> TelemetryPath {
        self::port(port).child("link")
    }

    /// `/lags`
    pub fn lags() -> TelemetryPath {
        TelemetryPath::root().child("lags")
    }

    /// `/lags/lag[name=<lag>]`
    pub fn lag(lag: &str) -> TelemetryPath {
        TelemetryPath::root().child("lags").keyed("lag", "name", lag)
    }

    /// `/lags/lag[name=<lag>]/oper-status`
    pub fn lag_oper_status(lag: &str) -> TelemetryPath {
        self::lag(lag).child("oper-status")
    }

    /// `/lacp/lag-members`
    pub fn lacp_members() -> TelemetryPath {
        TelemetryPath::root().child("lacp").child("lag-members")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_device_paths() {
        assert_eq!(
            device::aggregate_id("Ethernet2").state().to_string(),
            "/interfaces/interface[name=Ethernet2]/ethernet/aggregate-id (state)"
        );
        assert_eq!(
            device::subinterface_counter("Agg1", 0, "ipv6", "in-discarded-pkts").segments(),
            vec![
                "interfaces",
                "interface",
                "Agg1",
                "subinterfaces",
                "subinterface",
                "0",
                "ipv6",
                "counters",
                "in-discarded-pkts"
            ]
        );
        assert_eq!(
            device::network_instance_interface("DEFAULT", "Agg1.0").to_string(),
            "/network-instances/network-instance[name=DEFAULT]/interfaces/interface[id=Agg1.0] (config)"
        );
    }

    #[test]
    fn test_otg_paths() {
        assert_eq!(
            otg::lag_oper_status("atedst").state().segments(),
            vec!["lags", "lag", "atedst", "oper-status"]
        );
        assert_eq!(otg::port_link("port1").segments(), vec!["ports", "port", "port1", "link"]);
    }
}
