//! Standard paths and environment overrides for confload

use std::path::PathBuf;

/// Override for the configuration template location.
pub const TEMPLATE_ENV: &str = "CONFLOAD_TEMPLATE";
/// Override for the encrypted vault file.
pub const VAULT_FILE_ENV: &str = "CONFLOAD_VAULT_FILE";
/// Override for the vault key file.
pub const KEY_FILE_ENV: &str = "CONFLOAD_KEY_FILE";
/// Override for the vault query program.
pub const VAULT_CLI_ENV: &str = "CONFLOAD_VAULT_CLI";

/// Resolved locations of everything confload touches.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration template (~/.config/confload/confloadrc)
    pub template: PathBuf,
    /// Encrypted vault file (~/Passwords.kdbx)
    pub vault_file: PathBuf,
    /// Vault key file (~/Secret.key)
    pub key_file: PathBuf,
    /// Vault query program, resolved via PATH unless overridden
    pub vault_cli: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("confload");

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        let template = env_path(TEMPLATE_ENV).unwrap_or_else(|| config.join("confloadrc"));
        let vault_file = env_path(VAULT_FILE_ENV).unwrap_or_else(|| home.join("Passwords.kdbx"));
        let key_file = env_path(KEY_FILE_ENV).unwrap_or_else(|| home.join("Secret.key"));
        let vault_cli = env_path(VAULT_CLI_ENV).unwrap_or_else(|| PathBuf::from("vault-cli"));

        Self {
            template,
            vault_file,
            key_file,
            vault_cli,
        }
    }

    /// Label naming the protected vault file in user-facing prompts.
    pub fn vault_label(&self) -> String {
        self.vault_file.display().to_string()
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}
