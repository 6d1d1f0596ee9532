//! Host application abstraction
//!
//! The chat client that hosts confload exposes four primitives: execute a
//! textual command, print a message, persist a plugin option, and register
//! callbacks for input events. Callbacks are first-class closures paired
//! with opaque handles for later unregistration - no global name-table
//! indirection.

/// Input events a modifier callback can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierEvent {
    /// The input line display is being refreshed. The callback receives the
    /// raw buffer and returns the text to show instead.
    InputDisplay,
    /// The user finalized an input line (pressed enter). The callback
    /// receives the line and returns the text the host should process
    /// instead (possibly empty to swallow it).
    InputSubmit,
}

/// Opaque handle to a registered hook, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

impl HookHandle {
    /// Construct a handle from a raw id. Host implementations assign ids;
    /// callers only pass handles back verbatim.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id backing this handle.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Outcome reported by a command callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    Ok,
    Error,
}

/// Callback for a [`ModifierEvent`]. Receives the host (so it may execute
/// commands, print, or unregister hooks) and the current text; returns the
/// replacement text.
pub type ModifierCallback = Box<dyn FnMut(&mut dyn Host, &str) -> String>;

/// Callback for a registered host command. Receives the host and the
/// command's argument string.
pub type CommandCallback = Box<dyn FnMut(&mut dyn Host, &str) -> HookStatus>;

/// The host chat application, as seen by confload.
///
/// Hook delivery is serialized by the host's event loop; callbacks are
/// never invoked concurrently.
pub trait Host {
    /// Execute one textual command line inside the host. Per-command
    /// outcomes are the host's concern and are not reported back.
    fn run_command(&mut self, command: &str);

    /// Print a message to the host's core display.
    fn print(&mut self, message: &str);

    /// Read a persisted plugin option.
    fn get_option(&self, name: &str) -> Option<String>;

    /// Persist a plugin option.
    fn set_option(&mut self, name: &str, value: &str);

    /// Register a modifier callback for an input event.
    fn hook_modifier(&mut self, event: ModifierEvent, callback: ModifierCallback) -> HookHandle;

    /// Register a host command (e.g. `/confload`) with a callback invoked
    /// with the command's arguments.
    fn hook_command(
        &mut self,
        name: &str,
        description: &str,
        callback: CommandCallback,
    ) -> HookHandle;

    /// Unregister a previously registered hook.
    fn unhook(&mut self, handle: HookHandle);
}
