//! Plugin wiring: loader, manual command, and capture installation
//!
//! `setup` is the plugin entry point: it registers the `/confload` manual
//! command (with its own argument masking) and, unless a prior run of this
//! host session already unlocked, installs the capture state machine.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use confload_core::{Host, HookStatus, ModifierEvent, Passphrase, Paths};

use crate::capture::{self, CaptureConfig, CaptureSession};
use crate::template::ConfigTemplate;
use crate::vault::{AuthFailure, VaultQuery};

/// Name of the manual host command.
pub const COMMAND_NAME: &str = "confload";

/// Expand the template with a passphrase and execute the result.
///
/// The seam between the capture machine and the expand/execute pipeline;
/// tests substitute their own implementation.
pub trait ConfigLoader {
    fn load(&self, host: &mut dyn Host, passphrase: &Passphrase) -> Result<(), AuthFailure>;
}

/// Production loader: template file plus vault query client.
pub struct Loader {
    template_path: PathBuf,
    vault: VaultQuery,
}

impl Loader {
    pub fn new(template_path: PathBuf, vault: VaultQuery) -> Self {
        Self {
            template_path,
            vault,
        }
    }

    pub fn from_paths(paths: &Paths) -> Self {
        Self::new(paths.template.clone(), VaultQuery::from_paths(paths))
    }
}

impl ConfigLoader for Loader {
    fn load(&self, host: &mut dyn Host, passphrase: &Passphrase) -> Result<(), AuthFailure> {
        let template = ConfigTemplate::load(&self.template_path)?;
        let stream = template.expand(&self.vault.bind(passphrase))?;
        tracing::info!(commands = stream.len(), "template expanded, executing");
        stream.run(host);
        Ok(())
    }
}

/// Register confload with the host.
///
/// Returns the capture session, or `None` when the persisted marker says
/// this host session is already unlocked (the machine is then not
/// instantiated at all).
pub fn setup(host: &mut dyn Host, paths: &Paths) -> Option<Rc<RefCell<CaptureSession>>> {
    let loader: Rc<dyn ConfigLoader> = Rc::new(Loader::from_paths(paths));
    setup_with_loader(host, loader, paths.vault_label())
}

/// As [`setup`], with the loader injected.
pub fn setup_with_loader(
    host: &mut dyn Host,
    loader: Rc<dyn ConfigLoader>,
    vault_label: String,
) -> Option<Rc<RefCell<CaptureSession>>> {
    // Mask the passphrase argument of the manual command in the live
    // display. Registered before the capture hooks so the argument is
    // already masked by the time the capture prompt is prepended.
    host.hook_modifier(
        ModifierEvent::InputDisplay,
        Box::new(|_host, input| conceal_command_line(input)),
    );

    let command_loader = Rc::clone(&loader);
    host.hook_command(
        COMMAND_NAME,
        "Load the confload template; expects the vault passphrase as argument",
        Box::new(move |host, args| {
            let passphrase = Passphrase::from(args);
            match command_loader.load(host, &passphrase) {
                Ok(()) => HookStatus::Ok,
                Err(AuthFailure) => {
                    host.print("confload: authentication failed (wrong passphrase?)");
                    HookStatus::Error
                }
            }
        }),
    );

    if capture::already_unlocked(host) {
        tracing::debug!("already unlocked this session, capture not installed");
        return None;
    }

    let config = CaptureConfig::new(vault_label);
    Some(CaptureSession::install(host, loader, config))
}

/// Replace the argument of `/confload <passphrase>` with mask characters.
fn conceal_command_line(input: &str) -> String {
    let prefix = format!("/{COMMAND_NAME} ");
    match input.strip_prefix(&prefix) {
        Some(rest) => format!("{prefix}{}", "*".repeat(rest.chars().count())),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureStatus, INIT_OPTION};
    use confload_core::MockHost;

    struct FakeLoader {
        accept: &'static str,
    }

    impl ConfigLoader for FakeLoader {
        fn load(&self, host: &mut dyn Host, passphrase: &Passphrase) -> Result<(), AuthFailure> {
            if passphrase.expose() == self.accept {
                host.run_command("connect server1");
                Ok(())
            } else {
                Err(AuthFailure)
            }
        }
    }

    fn fake_setup(host: &mut MockHost) -> Option<Rc<RefCell<CaptureSession>>> {
        let loader: Rc<dyn ConfigLoader> = Rc::new(FakeLoader { accept: "correct" });
        setup_with_loader(host, loader, "vault.kdbx".to_string())
    }

    #[test]
    fn test_conceal_command_line_masks_argument() {
        assert_eq!(conceal_command_line("/confload hunter2"), "/confload *******");
        assert_eq!(conceal_command_line("/join #rust"), "/join #rust");
        assert_eq!(conceal_command_line("plain text"), "plain text");
        // No trailing space yet, nothing to mask.
        assert_eq!(conceal_command_line("/confload"), "/confload");
    }

    #[test]
    fn test_setup_installs_capture_when_locked() {
        let mut host = MockHost::new();
        let session = fake_setup(&mut host);

        let session = session.expect("capture should be installed");
        assert_eq!(session.borrow().status(), CaptureStatus::Locked);
        // Manual conceal + capture conceal.
        assert_eq!(host.modifier_count(ModifierEvent::InputDisplay), 2);
        assert_eq!(host.modifier_count(ModifierEvent::InputSubmit), 1);
    }

    #[test]
    fn test_setup_skips_capture_when_marker_set() {
        let mut host = MockHost::new();
        host.preset_option(INIT_OPTION, "on");

        let session = fake_setup(&mut host);
        assert!(session.is_none());
        // Only the manual-command conceal remains.
        assert_eq!(host.modifier_count(ModifierEvent::InputDisplay), 1);
        assert_eq!(host.modifier_count(ModifierEvent::InputSubmit), 0);
    }

    #[test]
    fn test_manual_command_success_does_not_transition_capture() {
        let mut host = MockHost::new();
        let session = fake_setup(&mut host).unwrap();

        let status = host.invoke_command(COMMAND_NAME, "correct");
        assert_eq!(status, HookStatus::Ok);
        assert_eq!(host.commands, vec!["connect server1"]);

        // The manual path is independent of the capture session.
        assert_eq!(session.borrow().status(), CaptureStatus::Locked);
        assert_eq!(host.option(INIT_OPTION), None);
        assert_eq!(host.modifier_count(ModifierEvent::InputSubmit), 1);
    }

    #[test]
    fn test_manual_command_failure() {
        let mut host = MockHost::new();
        fake_setup(&mut host);

        let status = host.invoke_command(COMMAND_NAME, "wrong");
        assert_eq!(status, HookStatus::Error);
        assert!(host.commands.is_empty());
        assert_eq!(host.messages.len(), 1);
        assert!(host.messages[0].contains("authentication failed"));
    }

    #[test]
    fn test_display_chain_masks_manual_command_argument() {
        let mut host = MockHost::new();
        fake_setup(&mut host);

        let shown = host.emit_modifier(ModifierEvent::InputDisplay, "/confload hunter2");
        assert_eq!(
            shown,
            "Enter passphrase to unlock vault.kdbx: /confload *******"
        );
    }
}
