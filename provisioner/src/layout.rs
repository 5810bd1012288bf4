//! Key layout planning
//!
//! Every key lives under the output root:
//!
//! ```text
//! keys/<group>/key<id>            group key
//! keys/<group>/<host>/<host>      host key
//! ```
//!
//! Planning is pure; `ensure_target_dir` is the only filesystem side effect.

use crate::error::{HostkeysError, Result};
use crate::inventory::Group;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    Group,
    Host,
}

/// One key pair to generate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyTarget {
    pub scope: KeyScope,
    /// Owning group
    pub group: String,
    /// `key<id>` for group keys, the host name for host keys
    pub identifier: String,
    /// Private key path; the public key is written next to it with `.pub` appended
    pub path: PathBuf,
    pub bits: u32,
    pub comment: String,
}

impl KeyTarget {
    pub fn public_key_path(&self) -> PathBuf {
        let mut path = self.path.as_os_str().to_owned();
        path.push(".pub");
        PathBuf::from(path)
    }
}

impl fmt::Display for KeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.scope {
            KeyScope::Group => "group",
            KeyScope::Host => "host",
        };
        write!(
            f,
            "{:<5} {:<16} {} ({} bits, \"{}\")",
            scope,
            self.group,
            self.path.display(),
            self.bits,
            self.comment
        )
    }
}

/// Derives key paths and comments under an output root
#[derive(Debug, Clone)]
pub struct LayoutPlanner {
    root: PathBuf,
    bits: u32,
}

impl LayoutPlanner {
    pub fn new(root: impl Into<PathBuf>, bits: u32) -> Self {
        Self {
            root: root.into(),
            bits,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shared key for a group: `<root>/<group>/key<id>`
    pub fn group_target(&self, group: &str, key_id: u32) -> Result<KeyTarget> {
        check_component("group", group)?;
        let identifier = format!("key{}", key_id);

        Ok(KeyTarget {
            scope: KeyScope::Group,
            group: group.to_string(),
            path: self.root.join(group).join(&identifier),
            identifier,
            bits: self.bits,
            comment: format!("key {}", key_id),
        })
    }

    /// Per-host key: `<root>/<group>/<host>/<host>`
    pub fn host_target(&self, group: &str, host: &str) -> Result<KeyTarget> {
        check_component("group", group)?;
        check_component("host", host)?;

        Ok(KeyTarget {
            scope: KeyScope::Host,
            group: group.to_string(),
            identifier: host.to_string(),
            path: self.root.join(group).join(host).join(host),
            bits: self.bits,
            comment: format!("{} key", host),
        })
    }

    /// All targets for a run, in generation order: each group's key followed by
    /// the keys of its hosts.
    ///
    /// Fails before anything is generated if two targets would share a key
    /// file, or a host directory would land on a group key file.
    pub fn plan(&self, groups: &[Group], key_id: u32) -> Result<Vec<KeyTarget>> {
        let mut targets = Vec::new();
        let mut occupied = HashSet::new();

        for group in groups {
            let group_target = self.group_target(&group.name, key_id)?;
            claim(&mut occupied, group_target.path.clone())?;
            claim(&mut occupied, group_target.public_key_path())?;
            targets.push(group_target);

            for host in group.expanded_hosts() {
                let target = self.host_target(&group.name, &host)?;
                if let Some(dir) = target.path.parent() {
                    claim(&mut occupied, dir.to_path_buf())?;
                }
                claim(&mut occupied, target.path.clone())?;
                claim(&mut occupied, target.public_key_path())?;
                targets.push(target);
            }
        }

        debug!("Planned {} key targets under {:?}", targets.len(), self.root);
        Ok(targets)
    }
}

fn claim(occupied: &mut HashSet<PathBuf>, path: PathBuf) -> Result<()> {
    if occupied.contains(&path) {
        return Err(HostkeysError::DuplicateTarget(path));
    }
    occupied.insert(path);
    Ok(())
}

fn check_component(kind: &'static str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);

    if valid {
        Ok(())
    } else {
        Err(HostkeysError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Create the directory a target's key files are written into.
///
/// Intermediate directories are created as needed; existing ones are reused.
pub fn ensure_target_dir(target: &KeyTarget) -> Result<()> {
    if let Some(dir) = target.path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
            debug!("Ensured directory {:?}", dir);
        }
    }
    Ok(())
}
