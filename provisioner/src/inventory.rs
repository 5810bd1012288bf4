//! Inventory loading and group selection
//!
//! An inventory is a YAML mapping of group name to group definition. Only
//! groups shaped like `name: { hosts: { <pattern>: <metadata>, ... } }` take
//! part in provisioning; host metadata is never read.

use crate::error::{HostkeysError, Result};
use crate::expand::HostPattern;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A group selected for provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub hosts: Vec<HostPattern>,
}

impl Group {
    /// Concrete host names of the group, in inventory order
    pub fn expanded_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .flat_map(|pattern| {
                if pattern.is_empty() {
                    warn!(
                        "Host range '{}' in group '{}' is empty (end before start)",
                        pattern, self.name
                    );
                }
                pattern.expand()
            })
            .collect()
    }
}

/// Parsed inventory file, in source order
#[derive(Debug, Clone)]
pub struct Inventory {
    path: PathBuf,
    entries: Mapping,
}

impl Inventory {
    /// Read and parse an inventory file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HostkeysError::InventoryNotFound(path.to_path_buf()));
        }

        info!("Reading inventory from: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content, path)
    }

    /// Parse inventory text; `path` is only used for diagnostics
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let root: Value = if content.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(content).map_err(|source| HostkeysError::InventoryParse {
                path: path.to_path_buf(),
                source,
            })?
        };

        let entries = match root {
            Value::Mapping(entries) => entries,
            Value::Null => Mapping::new(),
            other => {
                return Err(HostkeysError::InventoryShape {
                    path: path.to_path_buf(),
                    found: kind(&other),
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Groups eligible for provisioning, in inventory order.
    ///
    /// Entries that are not a mapping with a `hosts` mapping are skipped and
    /// logged. Fails with `NoValidGroups` when nothing is left, or with
    /// `InvalidRangeSpec` when a selected group holds a malformed host range.
    pub fn groups(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();

        for (key, definition) in &self.entries {
            let Some(name) = key_text(key) else {
                warn!("Skipping inventory entry with non-string name ({})", kind(key));
                continue;
            };

            let Some(hosts) = hosts_mapping(&name, definition) else {
                continue;
            };

            let mut patterns = Vec::with_capacity(hosts.len());
            for host_key in hosts.keys() {
                match key_text(host_key) {
                    Some(pattern) => patterns.push(HostPattern::parse(&pattern)?),
                    None => warn!(
                        "Skipping host entry with non-string name ({}) in group '{}'",
                        kind(host_key),
                        name
                    ),
                }
            }

            groups.push(Group {
                name,
                hosts: patterns,
            });
        }

        if groups.is_empty() {
            return Err(HostkeysError::NoValidGroups);
        }

        info!(
            "Found {} valid groups: {}",
            groups.len(),
            groups
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(groups)
    }
}

fn hosts_mapping<'a>(name: &str, definition: &'a Value) -> Option<&'a Mapping> {
    let Value::Mapping(group) = definition else {
        warn!("Skipping '{}': expected a group mapping, found {}", name, kind(definition));
        return None;
    };

    match group.get("hosts") {
        Some(Value::Mapping(hosts)) => Some(hosts),
        Some(other) => {
            warn!(
                "Skipping group '{}': 'hosts' must be a mapping, found {}",
                name,
                kind(other)
            );
            None
        }
        None => {
            debug!("Skipping group '{}': no hosts defined", name);
            None
        }
    }
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
