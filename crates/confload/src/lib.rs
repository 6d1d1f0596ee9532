//! confload - Credential-gated configuration loader
//!
//! Lets a declarative command script reference secrets by name. References
//! of the form `SECRET(title, attribute)` are expanded by querying a local
//! encrypted vault through its CLI, and the resulting command lines are fed
//! to the host chat application in file order. The decrypted secrets and
//! the unlock passphrase never touch persistent storage, process argument
//! lists, or the host's input echo and history.
//!
//! Unlock paths:
//! - automatic: while locked, the first non-command input line is treated
//!   as a passphrase candidate (masked in the live display)
//! - manual: the `/confload <passphrase>` host command

pub mod capture;
pub mod executor;
pub mod plugin;
pub mod template;
pub mod vault;

pub use capture::{CaptureConfig, CaptureSession, CaptureStatus};
pub use executor::CommandStream;
pub use plugin::{ConfigLoader, Loader};
pub use template::{ConfigTemplate, SecretReference, SecretResolver};
pub use vault::{AuthFailure, VaultQuery};
