use eframe::egui::{Key, Modifiers};

use crate::config::{ShortcutConfig, format_shortcut, parse_shortcut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    // Label Connector
    MakeConnector,
    ConnectSelected,
    ForceConnect,
    JumpToSource,

    // Edit Menu
    Undo,
    Redo,

    // File Menu
    SaveSettings,
    Quit,
}

pub struct Command {
    pub id: CommandId,
    pub text: &'static str,
    pub shortcut: Option<(Modifiers, Key)>,
    pub shortcut_text: String,
    /// Fires even while a text field (e.g. the popup search) has focus.
    pub allow_when_focused: bool,
}

impl Command {
    fn new(id: CommandId, text: &'static str, shortcut: Option<(Modifiers, Key)>) -> Self {
        Self {
            id,
            text,
            shortcut,
            shortcut_text: shortcut
                .map(|(modifiers, key)| format_shortcut(modifiers, key))
                .unwrap_or_default(),
            allow_when_focused: false,
        }
    }

    fn when_focused(mut self) -> Self {
        self.allow_when_focused = true;
        self
    }
}

pub struct CommandRegistry {
    pub commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new(shortcuts: &ShortcutConfig) -> Self {
        let configured = |text: &str| {
            let parsed = parse_shortcut(text);
            if parsed.is_none() && !text.trim().is_empty() {
                log::warn!("Ignoring unrecognised shortcut '{}'", text);
            }
            parsed
        };

        let commands = vec![
            Command::new(
                CommandId::MakeConnector,
                "Make Connector",
                configured(&shortcuts.make_connector),
            )
            .when_focused(),
            Command::new(
                CommandId::ConnectSelected,
                "Connect Connectors",
                configured(&shortcuts.connect),
            )
            .when_focused(),
            Command::new(
                CommandId::ForceConnect,
                "Force Connect Connectors",
                configured(&shortcuts.force_connect),
            )
            .when_focused(),
            Command::new(
                CommandId::JumpToSource,
                "Jump to Source Connector",
                configured(&shortcuts.jump_to_source),
            ),
            Command::new(
                CommandId::Undo,
                "Undo",
                Some((Modifiers::COMMAND, Key::Z)),
            ),
            Command::new(
                CommandId::Redo,
                "Redo",
                Some((Modifiers::COMMAND | Modifiers::SHIFT, Key::Z)),
            ),
            Command::new(
                CommandId::SaveSettings,
                "Save Settings",
                Some((Modifiers::COMMAND, Key::S)),
            ),
            Command::new(
                CommandId::Quit,
                "Quit",
                Some((Modifiers::COMMAND, Key::Q)),
            ),
        ];

        Self { commands }
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }
}
