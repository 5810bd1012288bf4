//! Key pair generation
//!
//! The provisioner only decides where keys go; producing them is delegated to
//! a [`KeyGenerator`]. The stock implementation shells out to `ssh-keygen`.

use crate::config::{KeyType, KeygenConfig};
use crate::error::{HostkeysError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

const DEFAULT_PROGRAM: &str = "ssh-keygen";

/// Produces a private/public key pair at `path` and `path.pub`
pub trait KeyGenerator {
    fn generate(&mut self, path: &Path, bits: u32, comment: &str) -> Result<()>;
}

/// Runs `ssh-keygen` (or a compatible program) once per key
#[derive(Debug, Clone)]
pub struct SshKeygen {
    program: PathBuf,
    key_type: KeyType,
}

impl SshKeygen {
    pub fn new(program: impl Into<PathBuf>, key_type: KeyType) -> Self {
        Self {
            program: program.into(),
            key_type,
        }
    }

    /// Resolve the configured program on PATH
    pub fn from_config(config: &KeygenConfig) -> Result<Self> {
        let requested = config
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));

        let program = which::which(&requested)
            .map_err(|_| HostkeysError::KeygenNotFound(requested.display().to_string()))?;

        debug!("Key generator: {:?}", program);
        Ok(Self::new(program, config.key_type))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one invocation; the passphrase is always empty
    pub fn args(&self, path: &Path, bits: u32, comment: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-t".into(),
            self.key_type.as_str().into(),
            "-b".into(),
            bits.to_string().into(),
            "-f".into(),
            path.as_os_str().to_owned(),
            "-N".into(),
            "".into(),
        ];

        if !comment.is_empty() {
            args.push("-C".into());
            args.push(comment.into());
        }

        args
    }
}

impl KeyGenerator for SshKeygen {
    fn generate(&mut self, path: &Path, bits: u32, comment: &str) -> Result<()> {
        let args = self.args(path, bits, comment);
        debug!("Running {:?} {:?}", self.program, args);

        // stdin stays attached so the tool can ask before overwriting an existing key
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| HostkeysError::KeyGeneration {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("{} exited with {}", self.program.display(), output.status),
                detail => format!("{} exited with {}: {}", self.program.display(), output.status, detail),
            };
            return Err(HostkeysError::KeyGeneration {
                path: path.to_path_buf(),
                reason,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_shape() {
        let keygen = SshKeygen::new("ssh-keygen", KeyType::Rsa);
        let args = keygen.args(Path::new("keys/web/key7"), 4096, "key 7");
        let expected: Vec<OsString> = ["-t", "rsa", "-b", "4096", "-f", "keys/web/key7", "-N", "", "-C", "key 7"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_args_without_comment() {
        let keygen = SshKeygen::new("ssh-keygen", KeyType::Ed25519);
        let args = keygen.args(Path::new("k"), 256, "");
        assert_eq!(args.len(), 8);
        assert_eq!(args[1], OsString::from("ed25519"));
    }

    #[test]
    fn test_missing_program() {
        let config = KeygenConfig {
            program: Some(PathBuf::from("definitely-not-a-keygen-binary")),
            ..KeygenConfig::default()
        };
        let err = SshKeygen::from_config(&config).unwrap_err();
        assert!(matches!(err, HostkeysError::KeygenNotFound(name) if name == "definitely-not-a-keygen-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_reported() {
        let mut keygen = SshKeygen::new("false", KeyType::Rsa);
        let err = keygen.generate(Path::new("k"), 4096, "c").unwrap_err();
        assert!(matches!(err, HostkeysError::KeyGeneration { path, .. } if path == Path::new("k")));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_program() {
        let mut keygen = SshKeygen::new("true", KeyType::Rsa);
        keygen.generate(Path::new("k"), 4096, "c").unwrap();
    }
}
