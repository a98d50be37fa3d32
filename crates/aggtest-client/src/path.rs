//! Telemetry paths.
//!
//! A [`TelemetryPath`] addresses a node in a target's data tree together
//! with the view it is read or written through: intended configuration or
//! observed state. Keyed list elements carry exactly one key, which is all
//! the models used here need.

use std::fmt;

/// Which side of a node a path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Intended configuration.
    Config,
    /// Operational state reported by the target.
    State,
}

/// One element of a telemetry path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElem {
    /// Element name (e.g., "interface").
    pub name: String,
    /// List key name and value (e.g., ("name", "Ethernet1")).
    pub key: Option<(String, String)>,
}

impl PathElem {
    /// Creates an unkeyed element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    /// Creates a keyed list element.
    pub fn keyed(name: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some((key.into(), value.into())),
        }
    }
}

impl fmt::Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some((k, v)) => write!(f, "{}[{}={}]", self.name, k, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A path to a node in a telemetry tree.
///
/// # Examples
///
/// ```
/// use aggtest_client::TelemetryPath;
///
/// let path = TelemetryPath::root()
///     .child("interfaces")
///     .keyed("interface", "name", "Agg1")
///     .child("type")
///     .state();
/// assert_eq!(path.to_string(), "/interfaces/interface[name=Agg1]/type (state)");
/// assert_eq!(path.segments(), vec!["interfaces", "interface", "Agg1", "type"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TelemetryPath {
    elems: Vec<PathElem>,
    view: View,
}

impl TelemetryPath {
    /// Returns the root path in the config view.
    pub fn root() -> Self {
        Self {
            elems: Vec::new(),
            view: View::Config,
        }
    }

    /// Appends an unkeyed element.
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.elems.push(PathElem::new(name));
        self
    }

    /// Appends a keyed list element.
    pub fn keyed(
        mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.elems.push(PathElem::keyed(name, key, value));
        self
    }

    /// Returns this path in the config view.
    pub fn config(mut self) -> Self {
        self.view = View::Config;
        self
    }

    /// Returns this path in the state view.
    pub fn state(mut self) -> Self {
        self.view = View::State;
        self
    }

    /// Returns the view this path addresses.
    pub fn view(&self) -> View {
        self.view
    }

    /// Returns the path elements.
    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// Flattens the path into tree segments: every element contributes its
    /// name, and keyed elements additionally contribute their key value.
    pub fn segments(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.elems.len() * 2);
        for elem in &self.elems {
            out.push(elem.name.as_str());
            if let Some((_, value)) = &elem.key {
                out.push(value.as_str());
            }
        }
        out
    }
}

impl fmt::Display for TelemetryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elems.is_empty() {
            write!(f, "/")?;
        }
        for elem in &self.elems {
            write!(f, "/{}", elem)?;
        }
        match self.view {
            View::Config => write!(f, " (config)"),
            View::State => write!(f, " (state)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_display() {
        assert_eq!(TelemetryPath::root().to_string(), "/ (config)");
        assert!(TelemetryPath::root().is_root());
    }

    #[test]
    fn test_view_switch_keeps_elems() {
        let cfg = TelemetryPath::root().child("lags").keyed("lag", "name", "atedst");
        let state = cfg.clone().state();
        assert_eq!(cfg.elems(), state.elems());
        assert_eq!(cfg.view(), View::Config);
        assert_eq!(state.view(), View::State);
        assert_eq!(state.config(), cfg);
    }

    #[test]
    fn test_segments_include_key_values() {
        let path = TelemetryPath::root()
            .child("interfaces")
            .keyed("interface", "name", "Ethernet2")
            .child("subinterfaces")
            .keyed("subinterface", "index", "0");
        assert_eq!(
            path.segments(),
            vec!["interfaces", "interface", "Ethernet2", "subinterfaces", "subinterface", "0"]
        );
    }
}
