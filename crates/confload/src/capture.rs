//! Input capture state machine
//!
//! While locked, confload owns two host hooks: one masks the input display
//! so a passphrase being typed never appears on screen, the other
//! intercepts finalized lines and treats anything that is not a host
//! command as a passphrase candidate. The first successful unlock executes
//! the expanded template, releases both hooks and persists a marker so the
//! machine is never instantiated again this session. Unlocked is terminal.
//!
//! Masking leaves the trailing [`REVEAL_WINDOW`] characters visible. That
//! is a deliberate usability/security trade-off, not a guarantee: a user
//! typing a long passphrase needs positional feedback and a bounded
//! typo-recovery window, at the cost of disclosing those characters to
//! anyone watching the screen.

use std::cell::RefCell;
use std::rc::Rc;

use confload_core::{Host, HookHandle, ModifierEvent, Passphrase};

use crate::plugin::ConfigLoader;

/// Character shown in place of masked passphrase input.
pub const MASK_CHAR: char = '*';

/// Trailing characters left visible while typing a passphrase.
pub const REVEAL_WINDOW: usize = 3;

/// Plugin option persisting "already unlocked this session".
pub const INIT_OPTION: &str = "initialized";

/// Host directive that drops the current input line without echoing it.
const DELETE_LINE: &str = "/input delete_line";

/// Capture behavior knobs.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// The host's command prefix character.
    pub command_prefix: char,
    /// Vault file label shown in the unlock prompt.
    pub vault_label: String,
}

impl CaptureConfig {
    pub fn new(vault_label: String) -> Self {
        Self {
            command_prefix: '/',
            vault_label,
        }
    }
}

/// State of the capture machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Locked,
    Unlocked,
}

/// Passphrase-acquisition session. Owns the two hooks while locked.
pub struct CaptureSession {
    status: CaptureStatus,
    conceal_hook: Option<HookHandle>,
    grab_hook: Option<HookHandle>,
}

/// Whether a prior run of this host session already unlocked.
pub fn already_unlocked(host: &dyn Host) -> bool {
    host.get_option(INIT_OPTION).as_deref() == Some("on")
}

/// An explicit host command starts with a single, non-doubled command
/// prefix. A doubled prefix is the host's escape for literal text and is
/// treated as passphrase material.
pub fn is_command(prefix: char, line: &str) -> bool {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first == prefix && second == prefix => false,
        (Some(first), _) if first == prefix => true,
        _ => false,
    }
}

/// Mask all but the trailing [`REVEAL_WINDOW`] characters. Shorter input
/// is masked entirely.
pub fn mask_tail(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() >= REVEAL_WINDOW {
        let masked = MASK_CHAR.to_string().repeat(chars.len() - REVEAL_WINDOW);
        let tail: String = chars[chars.len() - REVEAL_WINDOW..].iter().collect();
        format!("{masked}{tail}")
    } else {
        MASK_CHAR.to_string().repeat(chars.len())
    }
}

fn conceal_display(config: &CaptureConfig, input: &str) -> String {
    let prompt = format!("Enter passphrase to unlock {}: ", config.vault_label);
    if is_command(config.command_prefix, input) {
        // Commands must remain visible and editable.
        format!("{prompt}{input}")
    } else {
        format!("{prompt}{}", mask_tail(input))
    }
}

impl CaptureSession {
    /// Register the masking and submission-intercept hooks and return the
    /// session that owns them.
    pub fn install(
        host: &mut dyn Host,
        loader: Rc<dyn ConfigLoader>,
        config: CaptureConfig,
    ) -> Rc<RefCell<CaptureSession>> {
        let session = Rc::new(RefCell::new(CaptureSession {
            status: CaptureStatus::Locked,
            conceal_hook: None,
            grab_hook: None,
        }));

        let conceal_config = config.clone();
        let conceal_hook = host.hook_modifier(
            ModifierEvent::InputDisplay,
            Box::new(move |_host, input| conceal_display(&conceal_config, input)),
        );

        let grab_session = Rc::clone(&session);
        let grab_hook = host.hook_modifier(
            ModifierEvent::InputSubmit,
            Box::new(move |host, line| {
                grab_input(host, &grab_session, &loader, &config, line)
            }),
        );

        {
            let mut state = session.borrow_mut();
            state.conceal_hook = Some(conceal_hook);
            state.grab_hook = Some(grab_hook);
        }
        session
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }
}

/// Submission intercept: commands pass through, anything else is a
/// passphrase candidate.
fn grab_input(
    host: &mut dyn Host,
    session: &Rc<RefCell<CaptureSession>>,
    loader: &Rc<dyn ConfigLoader>,
    config: &CaptureConfig,
    line: &str,
) -> String {
    if is_command(config.command_prefix, line) || line.is_empty() {
        return line.to_string();
    }

    let passphrase = Passphrase::from(line);
    match loader.load(host, &passphrase) {
        Ok(()) => {
            let mut state = session.borrow_mut();
            state.status = CaptureStatus::Unlocked;
            if let Some(handle) = state.conceal_hook.take() {
                host.unhook(handle);
            }
            if let Some(handle) = state.grab_hook.take() {
                host.unhook(handle);
            }
            host.set_option(INIT_OPTION, "on");
            tracing::info!("unlocked, capture hooks released");
            // Keep the raw passphrase out of input echo and history.
            DELETE_LINE.to_string()
        }
        Err(_) => {
            host.print("confload: authentication failed (wrong passphrase?)");
            String::new()
        }
    }
}
