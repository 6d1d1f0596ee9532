//! Mock host for testing without a real chat client
//!
//! Records executed commands and printed messages, stores plugin options in
//! memory, and dispatches input events through the registered callbacks the
//! same way a real host's event loop would: in registration order, with the
//! output of one modifier feeding the next.

use std::collections::{BTreeMap, HashMap};

use crate::host::{
    CommandCallback, Host, HookHandle, HookStatus, ModifierCallback, ModifierEvent,
};

struct ModifierSlot {
    event: ModifierEvent,
    // Taken out of the slot while the callback runs so it may re-enter the
    // host (execute commands, unhook itself).
    callback: Option<ModifierCallback>,
}

struct CommandSlot {
    name: String,
    #[allow(dead_code)]
    description: String,
    callback: Option<CommandCallback>,
}

/// Scripted host used by unit and integration tests.
#[derive(Default)]
pub struct MockHost {
    /// Commands submitted via [`Host::run_command`], in order.
    pub commands: Vec<String>,
    /// Messages printed via [`Host::print`], in order.
    pub messages: Vec<String>,
    options: HashMap<String, String>,
    modifiers: BTreeMap<u64, ModifierSlot>,
    command_hooks: BTreeMap<u64, CommandSlot>,
    next_id: u64,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an input event through every registered modifier for it,
    /// chaining outputs, and return the final text.
    pub fn emit_modifier(&mut self, event: ModifierEvent, text: &str) -> String {
        let ids: Vec<u64> = self
            .modifiers
            .iter()
            .filter(|(_, slot)| slot.event == event)
            .map(|(id, _)| *id)
            .collect();

        let mut current = text.to_string();
        for id in ids {
            let taken = self
                .modifiers
                .get_mut(&id)
                .and_then(|slot| slot.callback.take());
            let Some(mut callback) = taken else {
                continue;
            };
            current = callback(self, &current);
            // The callback may have unhooked itself; only restore it if the
            // slot still exists.
            if let Some(slot) = self.modifiers.get_mut(&id) {
                slot.callback = Some(callback);
            }
        }
        current
    }

    /// Invoke a registered host command by name with an argument string.
    pub fn invoke_command(&mut self, name: &str, args: &str) -> HookStatus {
        let id = self
            .command_hooks
            .iter()
            .find(|(_, slot)| slot.name == name)
            .map(|(id, _)| *id);
        let Some(id) = id else {
            return HookStatus::Error;
        };

        let taken = self
            .command_hooks
            .get_mut(&id)
            .and_then(|slot| slot.callback.take());
        let Some(mut callback) = taken else {
            return HookStatus::Error;
        };
        let status = callback(self, args);
        if let Some(slot) = self.command_hooks.get_mut(&id) {
            slot.callback = Some(callback);
        }
        status
    }

    /// Number of modifiers currently registered for an event.
    pub fn modifier_count(&self, event: ModifierEvent) -> usize {
        self.modifiers
            .values()
            .filter(|slot| slot.event == event)
            .count()
    }

    /// Read a stored option value.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Preset an option value before the plugin is loaded.
    pub fn preset_option(&mut self, name: &str, value: &str) {
        self.options.insert(name.to_string(), value.to_string());
    }
}

impl Host for MockHost {
    fn run_command(&mut self, command: &str) {
        self.commands.push(command.to_string());
    }

    fn print(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn get_option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }

    fn set_option(&mut self, name: &str, value: &str) {
        self.options.insert(name.to_string(), value.to_string());
    }

    fn hook_modifier(&mut self, event: ModifierEvent, callback: ModifierCallback) -> HookHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.modifiers.insert(
            id,
            ModifierSlot {
                event,
                callback: Some(callback),
            },
        );
        HookHandle::from_raw(id)
    }

    fn hook_command(
        &mut self,
        name: &str,
        description: &str,
        callback: CommandCallback,
    ) -> HookHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.command_hooks.insert(
            id,
            CommandSlot {
                name: name.to_string(),
                description: description.to_string(),
                callback: Some(callback),
            },
        );
        HookHandle::from_raw(id)
    }

    fn unhook(&mut self, handle: HookHandle) {
        self.modifiers.remove(&handle.raw());
        self.command_hooks.remove(&handle.raw());
    }
}
