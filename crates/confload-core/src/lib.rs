//! Confload Core - Shared functionality for the confload loader
//!
//! The host chat application is only reachable through the narrow
//! [`host::Host`] trait; everything else here is plumbing around it.

pub mod host;
pub mod mock;
pub mod paths;
pub mod secret;

pub use host::{Host, HookHandle, HookStatus, ModifierEvent};
pub use mock::MockHost;
pub use paths::Paths;
pub use secret::Passphrase;
