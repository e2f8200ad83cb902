use crate::command::{CommandId, CommandRegistry};
use eframe::egui::{Context, Key, Modifiers};

pub struct ShortcutManager;

impl ShortcutManager {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_shortcuts(&self, ctx: &Context, registry: &CommandRegistry) -> Option<CommandId> {
        let wants_keyboard_input = ctx.wants_keyboard_input();

        for cmd in &registry.commands {
            let Some((modifiers, key)) = cmd.shortcut else {
                continue;
            };
            // While typing, only keys that cannot produce text may fire.
            if wants_keyboard_input
                && (!cmd.allow_when_focused || !(is_function_key(key) || is_strong(modifiers)))
            {
                continue;
            }
            if ctx.input(|i| i.key_pressed(key) && modifiers_match(i.modifiers, modifiers)) {
                return Some(cmd.id);
            }
        }
        None
    }
}

fn is_strong(modifiers: Modifiers) -> bool {
    modifiers.command || modifiers.ctrl || modifiers.alt
}

fn is_function_key(key: Key) -> bool {
    key.name().strip_prefix('F').is_some_and(|n| n.parse::<u8>().is_ok())
}

fn modifiers_match(event_modifiers: Modifiers, expected_modifiers: Modifiers) -> bool {
    if event_modifiers == expected_modifiers {
        return true;
    }

    // COMMAND covers Ctrl on Windows/Linux and Cmd on Mac; the event carries both
    // COMMAND and the physical key.
    if expected_modifiers.command {
        return event_modifiers.command
            && event_modifiers.alt == expected_modifiers.alt
            && event_modifiers.shift == expected_modifiers.shift;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_modifier_matches_physical_ctrl() {
        let event = Modifiers {
            ctrl: true,
            command: true,
            ..Modifiers::NONE
        };
        assert!(modifiers_match(event, Modifiers::COMMAND));
        assert!(!modifiers_match(event, Modifiers::NONE));
        assert!(!modifiers_match(Modifiers::NONE, Modifiers::COMMAND));
        assert!(!modifiers_match(
            event | Modifiers::SHIFT,
            Modifiers::COMMAND
        ));
    }

    #[test]
    fn function_keys_are_recognised() {
        assert!(is_function_key(Key::F8));
        assert!(is_function_key(Key::F12));
        assert!(!is_function_key(Key::A));
        assert!(!is_function_key(Key::Enter));
    }
}
