//! Key provisioning - walks a plan and generates each key in order

use crate::error::Result;
use crate::keygen::KeyGenerator;
use crate::layout::{ensure_target_dir, KeyScope, KeyTarget};
use tracing::info;

/// Counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub group_keys: usize,
    pub host_keys: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.group_keys + self.host_keys
    }
}

/// Generates planned keys one at a time, stopping at the first failure
pub struct Provisioner<G> {
    generator: G,
}

impl<G: KeyGenerator> Provisioner<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Create the target's directory and generate its key pair
    pub fn provision(&mut self, target: &KeyTarget) -> Result<()> {
        ensure_target_dir(target)?;

        info!("Generating SSH key: {}", target.path.display());
        self.generator
            .generate(&target.path, target.bits, &target.comment)
    }

    /// Provision every target in plan order.
    ///
    /// Nothing is retried; keys generated before a failure are left in place.
    pub fn run(&mut self, targets: &[KeyTarget]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, target) in targets.iter().enumerate() {
            match target.scope {
                KeyScope::Group => {
                    info!(
                        "Generating key for group '{}' ({}):",
                        target.group, target.identifier
                    );
                    self.provision(target)?;
                    summary.group_keys += 1;

                    let hosts = targets[index + 1..]
                        .iter()
                        .take_while(|t| t.scope == KeyScope::Host)
                        .count();
                    info!(
                        "Generating keys for {} hosts in group '{}':",
                        hosts, target.group
                    );
                }
                KeyScope::Host => {
                    info!(
                        "Generating key for host '{}' in group '{}'",
                        target.identifier, target.group
                    );
                    self.provision(target)?;
                    summary.host_keys += 1;
                }
            }
        }

        Ok(summary)
    }
}
