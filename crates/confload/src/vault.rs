//! Vault query client
//!
//! Shells out to the vault CLI for every lookup. The passphrase is written
//! to the child's stdin - never passed as an argument, which would expose
//! it in process listings. Results are not cached: the vault may be
//! re-locked between calls, so every reference re-queries.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use confload_core::{Passphrase, Paths};
use thiserror::Error;

/// Opaque authentication failure.
///
/// A wrong passphrase, a missing vault entry and an unreadable vault are
/// deliberately indistinguishable to the caller: the vault CLI's non-zero
/// exit is the only signal, and differentiating it would tell an
/// unauthorized user which part of their query was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("authentication failed")]
pub struct AuthFailure;

/// Client for the external vault query contract.
///
/// Invokes `<program> show --quiet --attributes <attr> --key-file <keyfile>
/// <vault-file> <title>` with the passphrase on stdin.
#[derive(Debug, Clone)]
pub struct VaultQuery {
    program: PathBuf,
    vault_file: PathBuf,
    key_file: PathBuf,
}

impl VaultQuery {
    pub fn new(program: PathBuf, vault_file: PathBuf, key_file: PathBuf) -> Self {
        Self {
            program,
            vault_file,
            key_file,
        }
    }

    pub fn from_paths(paths: &Paths) -> Self {
        Self::new(
            paths.vault_cli.clone(),
            paths.vault_file.clone(),
            paths.key_file.clone(),
        )
    }

    /// Query one attribute of one vault entry.
    ///
    /// Returns the attribute value with the trailing newline stripped, or
    /// [`AuthFailure`] on any other outcome. The child process is reaped on
    /// every exit path.
    pub fn retrieve(
        &self,
        passphrase: &Passphrase,
        title: &str,
        attribute: &str,
    ) -> Result<String, AuthFailure> {
        if passphrase.is_empty() {
            return Err(AuthFailure);
        }

        tracing::debug!(title, attribute, "vault query");

        let mut child = Command::new(&self.program)
            .arg("show")
            .arg("--quiet")
            .arg("--attributes")
            .arg(attribute)
            .arg("--key-file")
            .arg(&self.key_file)
            .arg(&self.vault_file)
            .arg(title)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                tracing::debug!("vault CLI failed to spawn: {e}");
                AuthFailure
            })?;

        // Write the passphrase, then drop stdin to close the pipe. If the
        // write fails the child must still be reaped.
        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin
                .write_all(passphrase.expose().as_bytes())
                .and_then(|()| stdin.write_all(b"\n"));
            if let Err(e) = written {
                tracing::debug!("vault CLI stdin write failed: {e}");
                let _ = child.kill();
                let _ = child.wait();
                return Err(AuthFailure);
            }
        }

        let output = child.wait_with_output().map_err(|_| AuthFailure)?;

        if !output.status.success() {
            tracing::debug!(code = ?output.status.code(), "vault CLI exited non-zero");
            return Err(AuthFailure);
        }

        let value = String::from_utf8(output.stdout).map_err(|_| AuthFailure)?;
        Ok(value.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Bind a session passphrase to this client for the duration of one
    /// expansion - the secret-lookup thunk handed to
    /// [`crate::template::ConfigTemplate::expand`].
    pub fn bind<'a>(&'a self, passphrase: &'a Passphrase) -> BoundQuery<'a> {
        BoundQuery {
            vault: self,
            passphrase,
        }
    }
}

/// A [`VaultQuery`] with the session passphrase attached.
pub struct BoundQuery<'a> {
    vault: &'a VaultQuery,
    passphrase: &'a Passphrase,
}

impl crate::template::SecretResolver for BoundQuery<'_> {
    fn resolve(&self, title: &str, attribute: &str) -> Result<String, AuthFailure> {
        self.vault.retrieve(self.passphrase, title, attribute)
    }
}
