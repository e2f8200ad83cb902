//! Toolkit-independent input events consumed by the popup state machine.

use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// Modifier keys held at the time of an event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        alt: false,
        ctrl: false,
    };
    pub const ALT: Self = Self {
        shift: false,
        alt: true,
        ctrl: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        alt: false,
        ctrl: true,
    };

    pub fn is_none(&self) -> bool {
        !(self.shift || self.alt || self.ctrl)
    }

    /// Copy with `key`'s modifier set to `down`. Other keys leave it unchanged.
    pub fn with_key(mut self, key: Key, down: bool) -> Self {
        match key {
            Key::Shift => self.shift = down,
            Key::Alt => self.alt = down,
            Key::Ctrl => self.ctrl = down,
            _ => {}
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Up,
    Down,
    Shift,
    Alt,
    Ctrl,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
}

/// What a primary click on a connector button does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickIntent {
    Connect,
    Jump,
    Options,
    Accumulate,
}

impl ClickIntent {
    /// Exactly one modifier selects its action; none or several mean connect.
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        match (modifiers.shift, modifiers.alt, modifiers.ctrl) {
            (true, false, false) => ClickIntent::Jump,
            (false, true, false) => ClickIntent::Options,
            (false, false, true) => ClickIntent::Accumulate,
            _ => ClickIntent::Connect,
        }
    }

    /// Caption prefix shown on a hovered connector button.
    pub fn caption_prefix(self) -> Option<&'static str> {
        match self {
            ClickIntent::Connect => None,
            ClickIntent::Jump => Some("Jump to"),
            ClickIntent::Options => Some("Options..."),
            ClickIntent::Accumulate => Some("Add"),
        }
    }
}

/// Non-connector buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupAction {
    CreateParent,
    Rename,
    Colorize,
    SelectChildren,
    JumpToParent,
    Reconnect,
}

impl PopupAction {
    pub fn caption(self) -> &'static str {
        match self {
            PopupAction::CreateParent => "Create New\nParent...",
            PopupAction::Rename => "Rename...",
            PopupAction::Colorize => "Colorize...",
            PopupAction::SelectChildren => "Select All Children",
            PopupAction::JumpToParent => "Jump to Parent",
            PopupAction::Reconnect => "Re-Connect to...",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Connector(NodeId),
    Action(PopupAction),
    /// Index into [`crate::color::PALETTE`].
    Palette(usize),
    /// Index into the ranked completion list.
    Completion(usize),
    Background,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PopupEvent {
    KeyPressed { key: Key, modifiers: Modifiers },
    KeyReleased { key: Key, modifiers: Modifiers },
    ModifiersChanged(Modifiers),
    Hover(NodeId),
    Unhover(NodeId),
    Click {
        target: ClickTarget,
        button: MouseButton,
        modifiers: Modifiers,
    },
    TextEdited(String),
    FocusLost,
}

impl PopupEvent {
    pub fn key(key: Key) -> Self {
        PopupEvent::KeyPressed {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click(target: ClickTarget) -> Self {
        PopupEvent::Click {
            target,
            button: MouseButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click_with(target: ClickTarget, modifiers: Modifiers) -> Self {
        PopupEvent::Click {
            target,
            button: MouseButton::Primary,
            modifiers,
        }
    }

    pub fn right_click(target: ClickTarget) -> Self {
        PopupEvent::Click {
            target,
            button: MouseButton::Secondary,
            modifiers: Modifiers::NONE,
        }
    }
}
