//! YAML description of an L2DA aggregate.
//!
//! ```yaml
//! bond: bond0
//! options:
//!   dedup_rx: true
//!   forward_rx: true
//! links:
//!   - name: eth0
//!   - name: eth1
//!     oper: down
//! default_link: eth0
//! mappings:
//!   - mac: "aa:bb:cc:dd:ee:ff"
//!     link: eth1
//! ```
//!
//! Links default to admin up, oper up and active.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use l2da_types::{AdminState, LinkState, MacAddress, OperState};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::context::L2daContext;
use crate::error::{L2daError, Result};
use crate::notify::L2daNotifier;
use crate::options::OptionFlags;
use crate::registry::LinkRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub name: String,
    #[serde(default = "admin_up")]
    pub admin: AdminState,
    #[serde(default = "oper_up")]
    pub oper: OperState,
    #[serde(default = "active")]
    pub active: bool,
}

fn admin_up() -> AdminState {
    AdminState::Up
}

fn oper_up() -> OperState {
    OperState::Up
}

fn active() -> bool {
    true
}

impl LinkConfig {
    pub fn state(&self) -> LinkState {
        LinkState::new(self.admin, self.oper, self.active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    pub mac: MacAddress,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L2daConfig {
    pub bond: String,
    #[serde(default)]
    pub options: OptionFlags,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub default_link: Option<String>,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

impl L2daConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: L2daConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks cross references: unique link names, and that the default
    /// link and every mapping name a declared link.
    pub fn validate(&self) -> Result<()> {
        if self.bond.is_empty() {
            return Err(L2daError::config("bond", "name must not be empty"));
        }

        let mut names = HashSet::new();
        for link in &self.links {
            if !names.insert(link.name.as_str()) {
                return Err(L2daError::config(
                    "links",
                    format!("duplicate link '{}'", link.name),
                ));
            }
        }

        if let Some(default) = &self.default_link {
            if !names.contains(default.as_str()) {
                return Err(L2daError::config(
                    "default_link",
                    format!("'{}' is not a declared link", default),
                ));
            }
        }

        let mut macs = HashSet::new();
        for mapping in &self.mappings {
            if !names.contains(mapping.link.as_str()) {
                return Err(L2daError::config(
                    "mappings",
                    format!("{} refers to undeclared link '{}'", mapping.mac, mapping.link),
                ));
            }
            if !macs.insert(mapping.mac) {
                return Err(L2daError::config(
                    "mappings",
                    format!("duplicate mapping for {}", mapping.mac),
                ));
            }
        }

        Ok(())
    }

    /// Adds and binds the links in declared order, then sets the options,
    /// the default link and the mappings.
    ///
    /// A declared default that cannot transmit is not fatal: the selector's
    /// choice stands and a warning is logged.
    pub fn apply(&self, ctx: &L2daContext, registry: &mut LinkRegistry) -> Result<()> {
        for link in &self.links {
            let id = registry.add_link(&link.name, link.state())?;
            ctx.bind_link(registry, id);
        }

        ctx.set_opts(self.options.into());

        if let Some(default) = &self.default_link {
            match ctx.set_default_link_by_name(registry, default) {
                Ok(()) => {}
                Err(L2daError::InvalidArgument(reason)) => warn!(
                    "{}: bond_l2da default link {} not applied ({}), using {}",
                    self.bond,
                    default,
                    reason,
                    ctx.default_link_name(registry).as_deref().unwrap_or("none")
                ),
                Err(e) => return Err(e),
            }
        }

        for mapping in &self.mappings {
            let link = registry
                .link_by_name(&mapping.link)
                .ok_or_else(|| L2daError::LinkNotFound(mapping.link.clone()))?;
            ctx.set_da_link(registry, mapping.mac, link)?;
        }

        info!(
            "{}: bond_l2da configured with {} link(s) and {} pair(s)",
            self.bond,
            registry.len(),
            ctx.mapping_count()
        );
        Ok(())
    }

    /// Builds a fresh context and registry from this configuration.
    pub fn build(&self, notifier: Arc<dyn L2daNotifier>) -> Result<(L2daContext, LinkRegistry)> {
        let ctx = L2daContext::new(self.bond.clone(), notifier);
        let mut registry = LinkRegistry::new();
        self.apply(&ctx, &mut registry)?;
        Ok((ctx, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoopNotifier;
    use crate::options::L2daOptions;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
bond: bond0
options:
  dedup_rx: true
  forward_rx: true
links:
  - name: eth0
  - name: eth1
  - name: eth2
    oper: down
default_link: eth1
mappings:
  - mac: "aa:bb:cc:dd:ee:ff"
    link: eth0
  - mac: "00:11:22:33:44:55"
    link: eth2
"#;

    #[test]
    fn test_parse_sample() {
        let config = L2daConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.bond, "bond0");
        assert_eq!(config.links.len(), 3);
        assert_eq!(config.links[0].state(), LinkState::UP);
        assert_eq!(config.links[2].oper, OperState::Down);
        assert!(!config.links[2].state().can_transmit());
        assert_eq!(
            L2daOptions::from(config.options),
            L2daOptions::DEDUP_RX | L2daOptions::FORWARD_RX
        );
        assert_eq!(config.default_link.as_deref(), Some("eth1"));
        assert_eq!(config.mappings[0].mac, "aa:bb:cc:dd:ee:ff".parse().unwrap());
    }

    #[test]
    fn test_minimal_config() {
        let config = L2daConfig::from_yaml_str("bond: bond1\n").unwrap();
        assert!(config.links.is_empty());
        assert!(config.mappings.is_empty());
        assert_eq!(config.options, OptionFlags::default());
    }

    fn rejected_field(yaml: &str) -> Option<String> {
        match L2daConfig::from_yaml_str(yaml) {
            Err(L2daError::Config { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_rejects_bad_references() {
        let dup = "bond: b\nlinks:\n  - name: eth0\n  - name: eth0\n";
        assert_eq!(rejected_field(dup).as_deref(), Some("links"));

        let default = "bond: b\nlinks:\n  - name: eth0\ndefault_link: eth9\n";
        assert_eq!(rejected_field(default).as_deref(), Some("default_link"));

        let mapping = "bond: b\nlinks:\n  - name: eth0\nmappings:\n  - mac: \"02:00:00:00:00:01\"\n    link: eth1\n";
        assert_eq!(rejected_field(mapping).as_deref(), Some("mappings"));
    }

    #[test]
    fn test_yaml_errors_surface() {
        assert!(matches!(
            L2daConfig::from_yaml_str("bond: b\nbogus: 1\n"),
            Err(L2daError::Yaml(_))
        ));
        assert!(matches!(
            L2daConfig::from_yaml_str("bond: b\nmappings:\n  - mac: nope\n    link: eth0\n"),
            Err(L2daError::Yaml(_))
        ));
    }

    #[test]
    fn test_build_applies_everything() {
        let config = L2daConfig::from_yaml_str(SAMPLE).unwrap();
        let (ctx, registry) = config.build(Arc::new(NoopNotifier)).unwrap();

        let eth0 = registry.link_by_name("eth0").unwrap();
        let eth2 = registry.link_by_name("eth2").unwrap();
        assert_eq!(ctx.name(), "bond0");
        assert_eq!(ctx.default_link_name(&registry).as_deref(), Some("eth1"));
        assert_eq!(ctx.opts(), L2daOptions::DEDUP_RX | L2daOptions::FORWARD_RX);
        assert_eq!(ctx.lookup("aa:bb:cc:dd:ee:ff".parse().unwrap()), Some(eth0));
        assert_eq!(ctx.lookup("00:11:22:33:44:55".parse().unwrap()), Some(eth2));
    }

    #[test]
    fn test_default_on_down_link_falls_back() {
        let yaml = "bond: b\nlinks:\n  - name: eth0\n    oper: down\n  - name: eth1\ndefault_link: eth0\nmappings:\n  - mac: \"02:00:00:00:00:01\"\n    link: eth0\n";
        let config = L2daConfig::from_yaml_str(yaml).unwrap();
        let (ctx, registry) = config.build(Arc::new(NoopNotifier)).unwrap();

        assert_eq!(ctx.default_link_name(&registry).as_deref(), Some("eth1"));
        assert_eq!(ctx.mapping_count(), 1);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = L2daConfig::from_file(file.path()).unwrap();
        assert_eq!(config.links.len(), 3);
    }

    #[test]
    fn test_from_file_not_found() {
        assert!(matches!(
            L2daConfig::from_file("/nonexistent/l2da.yaml"),
            Err(L2daError::Io(_))
        ));
    }
}
