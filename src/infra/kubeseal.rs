use anyhow::{anyhow, Result};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Seals `plaintext` for the secret `name` in `namespace` using the public cert at `cert`.
pub trait SealingOracle {
    fn seal(&self, cert: &Path, namespace: &str, name: &str, plaintext: &str) -> Result<String>;
}

/// A non-zero exit from the oracle. `stderr` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleError {
    pub status: Option<i32>,
    pub stderr: String,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "kubeseal exited with status {}: {}", code, self.stderr),
            None => write!(f, "kubeseal terminated by signal: {}", self.stderr),
        }
    }
}

impl std::error::Error for OracleError {}

pub struct Kubeseal {
    bin: String,
}

impl Kubeseal {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }
}

impl Default for Kubeseal {
    fn default() -> Self {
        Self::new("kubeseal")
    }
}

impl SealingOracle for Kubeseal {
    fn seal(&self, cert: &Path, namespace: &str, name: &str, plaintext: &str) -> Result<String> {
        crate::output::debug(format!(
            "{} --cert {} --raw --namespace {} --name {}",
            self.bin,
            cert.display(),
            namespace,
            name
        ));

        let mut child = Command::new(&self.bin)
            .arg("--cert")
            .arg(cert)
            .arg("--raw")
            .arg("--namespace")
            .arg(namespace)
            .arg("--name")
            .arg(name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to execute {}: {}", self.bin, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // kubeseal exits before reading stdin when the cert can't be opened
            if let Err(e) = stdin.write_all(plaintext.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(OracleError {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| anyhow!("{} produced non UTF-8 output", self.bin))?;
        match stdout.lines().next() {
            Some(line) if !line.is_empty() => Ok(line.to_string()),
            _ => Err(anyhow!("{} produced no sealed value", self.bin)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn fake_bin(dir: &Path, script: &str) -> String {
        let path = dir.join("kubeseal");
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_seal_passes_scope_and_stdin() {
        let dir = tempfile::tempdir().unwrap();
        // echo args and stdin back so the test can see what was passed
        let bin = fake_bin(dir.path(), r#"printf '%s|' "$@"; cat; printf '\nsecond line\n'"#);

        let sealed = Kubeseal::new(bin)
            .seal(Path::new("cert.pem"), "test-ns", "test-secret", "This is a test")
            .unwrap();
        assert_eq!(sealed, "--cert|cert.pem|--raw|--namespace|test-ns|--name|test-secret|This is a test");
    }

    #[test]
    fn test_seal_failure_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_bin(dir.path(), "cat >/dev/null; echo 'error: open invalidcert.pem: no such file or directory' >&2; exit 1");

        let err = Kubeseal::new(bin)
            .seal(Path::new("invalidcert.pem"), "ns", "s", "x")
            .unwrap_err();
        let oracle = err.downcast_ref::<OracleError>().expect("oracle error");
        assert_eq!(oracle.status, Some(1));
        assert_eq!(oracle.stderr, "error: open invalidcert.pem: no such file or directory");
    }

    #[test]
    fn test_seal_failure_before_reading_stdin() {
        let dir = tempfile::tempdir().unwrap();
        // never reads stdin, so a payload larger than the pipe buffer hits a closed pipe
        let bin = fake_bin(dir.path(), "echo 'error: open invalidcert.pem: no such file or directory' >&2; exit 1");
        let plaintext = "x".repeat(1024 * 1024);

        let err = Kubeseal::new(bin)
            .seal(Path::new("invalidcert.pem"), "ns", "s", &plaintext)
            .unwrap_err();
        let oracle = err.downcast_ref::<OracleError>().expect("oracle error");
        assert_eq!(oracle.status, Some(1));
        assert_eq!(oracle.stderr, "error: open invalidcert.pem: no such file or directory");
    }

    #[test]
    fn test_seal_empty_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_bin(dir.path(), "cat >/dev/null");
        assert!(Kubeseal::new(bin).seal(Path::new("c"), "ns", "s", "x").is_err());
    }

    #[test]
    fn test_missing_binary() {
        let err = Kubeseal::new("/nonexistent/kubeseal")
            .seal(Path::new("c"), "ns", "s", "x")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
    }
}
