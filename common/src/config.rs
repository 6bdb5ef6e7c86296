//! # Configuration
//!
//! The tool is configured from a single TOML document with global settings and one
//! `[[source]]` table per source.
//!
//! Relation rules, subnets and the interface filter are validated while the document is
//! deserialized, so a bad pattern stops the run before anything is written.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SsotError};
use crate::matcher::{NameMap, RelationRules};
use crate::network::SubnetList;

pub const DEFAULT_CONCURRENCY: usize = 50;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_tag() -> String {
    "ssot".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the worker pool used by fanned-out phases.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Tag put on every object the tool writes.
    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| SsotError::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SsotError::Config("concurrency must be at least 1".into()));
        }
        if self.tag.trim().is_empty() {
            return Err(SsotError::Config("tag must not be empty".into()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(SsotError::Config("source name must not be empty".into()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(SsotError::Config(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            concurrency: DEFAULT_CONCURRENCY,
            tag: default_tag(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Virtualization manager: datacenters, clusters, hosts and VMs.
    Hypervisor,
    /// Network controller: sites, switches, access points and wireless LANs.
    Controller,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Hypervisor => f.write_str("hypervisor"),
            SourceType::Controller => f.write_str("controller"),
        }
    }
}

/// Interfaces whose name matches are left out of the inventory.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct InterfaceFilter(Regex);

impl InterfaceFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(InterfaceFilter)
            .map_err(|source| SsotError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.0.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for InterfaceFilter {
    type Error = SsotError;

    fn try_from(pattern: String) -> Result<Self> {
        Self::new(&pattern)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// JSON snapshot of the source's normalized records.
    pub snapshot: PathBuf,
    /// Tag identifying objects written by this source. Defaults to the source name.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub ignore_vm_templates: bool,
    #[serde(default)]
    pub ignore_asset_tags: bool,
    #[serde(default)]
    pub ignore_serial_numbers: bool,

    #[serde(default)]
    pub interface_filter: Option<InterfaceFilter>,
    #[serde(default)]
    pub permitted_subnets: SubnetList,
    #[serde(default)]
    pub ignored_subnets: SubnetList,

    #[serde(default)]
    pub cluster_site_relations: Option<RelationRules>,
    #[serde(default)]
    pub cluster_tenant_relations: Option<RelationRules>,
    #[serde(default)]
    pub host_site_relations: Option<RelationRules>,
    #[serde(default)]
    pub host_tenant_relations: Option<RelationRules>,
    #[serde(default)]
    pub host_role_relations: Option<RelationRules>,
    #[serde(default)]
    pub vm_tenant_relations: Option<RelationRules>,
    #[serde(default)]
    pub vm_role_relations: Option<RelationRules>,
    #[serde(default)]
    pub vlan_site_relations: Option<RelationRules>,
    #[serde(default)]
    pub vlan_group_relations: Option<RelationRules>,
    #[serde(default)]
    pub vlan_tenant_relations: Option<RelationRules>,
    #[serde(default)]
    pub vlan_group_site_relations: Option<RelationRules>,

    /// Source custom-field name to one of `owner`, `email`, `description`.
    #[serde(default)]
    pub custom_field_mappings: NameMap,
    #[serde(default)]
    pub datacenter_cluster_group_relations: NameMap,
}

impl SourceConfig {
    /// Minimal configuration for a source, everything else unconfigured.
    pub fn new(name: &str, source_type: SourceType) -> Self {
        Self {
            name: name.to_string(),
            source_type,
            snapshot: PathBuf::new(),
            tag: None,
            ignore_vm_templates: false,
            ignore_asset_tags: false,
            ignore_serial_numbers: false,
            interface_filter: None,
            permitted_subnets: SubnetList::default(),
            ignored_subnets: SubnetList::default(),
            cluster_site_relations: None,
            cluster_tenant_relations: None,
            host_site_relations: None,
            host_tenant_relations: None,
            host_role_relations: None,
            vm_tenant_relations: None,
            vm_role_relations: None,
            vlan_site_relations: None,
            vlan_group_relations: None,
            vlan_tenant_relations: None,
            vlan_group_site_relations: None,
            custom_field_mappings: NameMap::default(),
            datacenter_cluster_group_relations: NameMap::default(),
        }
    }

    pub fn source_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }

    pub fn is_filtered_interface(&self, name: &str) -> bool {
        self.interface_filter
            .as_ref()
            .is_some_and(|filter| filter.excludes(name))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{Relation, match_subject};

    const SAMPLE: &str = r#"
        concurrency = 8
        tag = "ssot"

        [[source]]
        name = "vcenter-prod"
        type = "hypervisor"
        snapshot = "snapshots/vcenter.json"
        tag = "vcenter"
        ignore_vm_templates = true
        interface_filter = "^(lo|docker)"
        permitted_subnets = ["10.0.0.0/8"]
        ignored_subnets = ["10.99.0.0/16"]
        host_site_relations = ["^esx-lj.* = Ljubljana"]
        vlan_group_relations = []
        datacenter_cluster_group_relations = ["DC1 = Primary"]

        [[source]]
        name = "dnac"
        type = "controller"
        snapshot = "snapshots/dnac.json"
    "#;

    #[test]
    fn parses_sample_document() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sources.len(), 2);

        let vc = config.source("vcenter-prod").unwrap();
        assert_eq!(vc.source_type, SourceType::Hypervisor);
        assert_eq!(vc.source_tag(), "vcenter");
        assert!(vc.is_filtered_interface("docker0"));
        assert!(!vc.is_filtered_interface("vmk0"));
        assert_eq!(
            match_subject("esx-lj-01", vc.host_site_relations.as_ref()),
            Relation::Matched("Ljubljana")
        );
        assert_eq!(
            match_subject("VLAN0010", vc.vlan_group_relations.as_ref()),
            Relation::Unmatched
        );
        assert_eq!(
            match_subject("vm01", vc.vm_tenant_relations.as_ref()),
            Relation::Unconfigured
        );
        assert_eq!(vc.datacenter_cluster_group_relations.resolve("DC1"), "Primary");

        let dnac = config.source("dnac").unwrap();
        assert_eq!(dnac.source_tag(), "dnac");
        assert_eq!(dnac.source_type, SourceType::Controller);
    }

    #[test]
    fn bad_pattern_fails_at_load() {
        let text = r#"
            [[source]]
            name = "vc"
            type = "hypervisor"
            snapshot = "vc.json"
            host_site_relations = ["^(esx = Ljubljana"]
        "#;
        let err = Config::from_toml(text).unwrap_err();
        assert!(matches!(err, SsotError::Config(msg) if msg.contains("^(esx")));
    }

    #[test]
    fn duplicate_source_names_are_rejected() {
        let text = r#"
            [[source]]
            name = "vc"
            type = "hypervisor"
            snapshot = "a.json"

            [[source]]
            name = "vc"
            type = "controller"
            snapshot = "b.json"
        "#;
        assert!(matches!(Config::from_toml(text), Err(SsotError::Config(_))));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Config::from_toml("concurrency = 0").is_err());
        assert_eq!(Config::from_toml("").unwrap().concurrency, DEFAULT_CONCURRENCY);
    }
}
