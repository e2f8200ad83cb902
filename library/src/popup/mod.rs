//! Modal popup state machine.
//!
//! A [`Popup`] is built for one variant and keeps it until it is closed. Events go
//! in through [`Popup::handle`], which only updates popup-local state and returns
//! [`Effect`]s. Applying effects to the graph is the session's job, so every
//! transition here can be exercised without a graph or a toolkit.

pub mod input;
pub mod layout;
pub mod search;

pub use input::{ClickIntent, ClickTarget, Key, Modifiers, MouseButton, PopupAction, PopupEvent};
pub use layout::GridCell;

use crate::classifier::PopupRequest;
use crate::color::{
    BUTTON_REGULAR_COLOR, BUTTON_REGULAR_DARK_COLOR, PALETTE, PaletteColor, packed_to_hex,
};
use crate::model::{Connector, NodeId, labels_match};
use layout::{PALETTE_COLUMNS, picker_layout, wrap_cells};
use search::{SearchResult, search};

/// Something the session has to do on behalf of the popup.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Create or re-target a proxy for `connector`, feeding `target` when given.
    Connect {
        connector: Connector,
        target: Option<NodeId>,
    },
    /// Frame `node` without changing the selection.
    Jump { node: NodeId },
    CreateMany { connectors: Vec<Connector> },
    MakeConnector {
        node: Option<NodeId>,
        text: String,
        previous: String,
    },
    SetColor {
        connectors: Vec<NodeId>,
        color: PaletteColor,
    },
    SelectDependents { connectors: Vec<NodeId> },
    PreviewShow { connector: NodeId },
    PreviewRestore,
    /// Close this popup and open another one.
    Open(PopupRequest),
    Close,
}

impl Effect {
    /// Effects that edit the graph and therefore belong in an undo step.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Effect::Connect { .. }
                | Effect::CreateMany { .. }
                | Effect::MakeConnector { .. }
                | Effect::SetColor { .. }
        )
    }

    pub fn closes(&self) -> bool {
        matches!(self, Effect::Close | Effect::Open(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupKind {
    Picker,
    ConnectorOptions,
    ChildrenOptions,
    Color,
    Naming,
}

/// A connector offered by the picker and the color its button is painted with.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectorButton {
    pub connector: Connector,
    pub color: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ButtonView {
    pub target: ClickTarget,
    pub caption: String,
    /// Background as `#rrggbb`.
    pub color: String,
    pub cell: GridCell,
    /// Outlined as a search match.
    pub highlighted: bool,
    /// Outlined as part of a multi-create.
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchView {
    pub text: String,
    pub completions: Vec<String>,
    pub active: Option<usize>,
    pub field: GridCell,
    pub list: GridCell,
}

/// Everything a toolkit needs to draw a popup.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupView {
    pub kind: PopupKind,
    pub buttons: Vec<ButtonView>,
    pub search: Option<SearchView>,
    /// Contents of the naming field.
    pub text_field: Option<String>,
}

fn action_buttons(actions: &[PopupAction]) -> Vec<ButtonView> {
    actions
        .iter()
        .enumerate()
        .map(|(column, action)| ButtonView {
            target: ClickTarget::Action(*action),
            caption: action.caption().to_string(),
            color: packed_to_hex(BUTTON_REGULAR_COLOR),
            cell: GridCell::new(0, column),
            highlighted: false,
            selected: false,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct PickerPopup {
    target: Option<NodeId>,
    buttons: Vec<ConnectorButton>,
    modifiers: Modifiers,
    hovered: Option<NodeId>,
    query: String,
    result: SearchResult,
    active: Option<usize>,
    accumulated: Vec<NodeId>,
    previewing: Option<NodeId>,
}

impl PickerPopup {
    pub fn new(target: Option<NodeId>, buttons: Vec<ConnectorButton>) -> Self {
        Self {
            target,
            buttons,
            modifiers: Modifiers::NONE,
            hovered: None,
            query: String::new(),
            result: SearchResult::default(),
            active: None,
            accumulated: Vec::new(),
            previewing: None,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn buttons(&self) -> &[ConnectorButton] {
        &self.buttons
    }

    pub fn accumulated(&self) -> &[NodeId] {
        &self.accumulated
    }

    pub fn previewing(&self) -> Option<NodeId> {
        self.previewing
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Labels in ranked order.
    pub fn completions(&self) -> Vec<&str> {
        self.result
            .ranked
            .iter()
            .map(|i| self.buttons[*i].connector.label.as_str())
            .collect()
    }

    pub fn active_completion(&self) -> Option<usize> {
        self.active
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.result
            .highlighted
            .iter()
            .any(|i| self.buttons[*i].connector.id == id)
    }

    /// Button caption, previewing the click action while hovered.
    pub fn caption(&self, button: &ConnectorButton) -> String {
        let label = &button.connector.label;
        if self.hovered != Some(button.connector.id) {
            return label.clone();
        }
        match ClickIntent::from_modifiers(self.modifiers).caption_prefix() {
            Some(prefix) => format!("{}\n-\n{}", prefix, label),
            None => label.clone(),
        }
    }

    fn connector(&self, id: NodeId) -> Option<&Connector> {
        self.buttons
            .iter()
            .map(|b| &b.connector)
            .find(|c| c.id == id)
    }

    fn set_query(&mut self, text: &str) {
        self.query = text.to_string();
        let labels: Vec<&str> = self
            .buttons
            .iter()
            .map(|b| b.connector.label.as_str())
            .collect();
        self.result = search(&labels, text);
        self.active = None;
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.result.ranked.len();
        if len == 0 {
            self.active = None;
            return;
        }
        self.active = match (self.active, down) {
            (None, true) => Some(0),
            (None, false) => Some(len - 1),
            (Some(i), true) => Some((i + 1).min(len - 1)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };
    }

    /// Active completion entry, else the exact label, else the sole match.
    fn resolve_query(&self) -> Option<&Connector> {
        if let Some(index) = self.active.and_then(|i| self.result.ranked.get(i)) {
            return Some(&self.buttons[*index].connector);
        }
        let text = self.query.trim();
        if let Some(exact) = self
            .buttons
            .iter()
            .find(|b| labels_match(&b.connector.label, text))
        {
            return Some(&exact.connector);
        }
        match self.result.ranked.as_slice() {
            [only] => Some(&self.buttons[*only].connector),
            _ => None,
        }
    }

    fn commit_query(&mut self, modifiers: Modifiers) -> Vec<Effect> {
        if self.query.trim().is_empty() {
            return vec![Effect::Close];
        }
        let Some(connector) = self.resolve_query().cloned() else {
            return Vec::new();
        };
        let effect = if ClickIntent::from_modifiers(modifiers) == ClickIntent::Jump {
            Effect::Jump { node: connector.id }
        } else {
            Effect::Connect {
                connector,
                target: self.target,
            }
        };
        vec![effect, Effect::Close]
    }

    fn take_accumulation(&mut self) -> Option<Effect> {
        if self.accumulated.is_empty() {
            return None;
        }
        let connectors = std::mem::take(&mut self.accumulated)
            .into_iter()
            .filter_map(|id| self.connector(id).cloned())
            .collect();
        Some(Effect::CreateMany { connectors })
    }

    fn commit_accumulation(&mut self) -> Vec<Effect> {
        match self.take_accumulation() {
            Some(effect) => vec![effect, Effect::Close],
            None => Vec::new(),
        }
    }

    fn toggle_accumulated(&mut self, id: NodeId) {
        match self.accumulated.iter().position(|a| *a == id) {
            Some(index) => {
                self.accumulated.remove(index);
            }
            None => self.accumulated.push(id),
        }
    }

    fn toggle_preview(&mut self, id: NodeId) -> Vec<Effect> {
        if self.previewing == Some(id) {
            self.previewing = None;
            vec![Effect::PreviewRestore]
        } else {
            self.previewing = Some(id);
            vec![Effect::PreviewShow { connector: id }]
        }
    }

    fn click_connector(&mut self, id: NodeId, modifiers: Modifiers) -> Vec<Effect> {
        let Some(connector) = self.connector(id).cloned() else {
            return Vec::new();
        };
        match ClickIntent::from_modifiers(modifiers) {
            ClickIntent::Connect => vec![
                Effect::Connect {
                    connector,
                    target: self.target,
                },
                Effect::Close,
            ],
            ClickIntent::Jump => vec![Effect::Jump { node: id }, Effect::Close],
            ClickIntent::Options => vec![Effect::Open(PopupRequest::ConnectorOptions {
                connectors: vec![id],
            })],
            ClickIntent::Accumulate => {
                self.toggle_accumulated(id);
                Vec::new()
            }
        }
    }

    fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        match event {
            PopupEvent::KeyPressed {
                key: Key::Enter | Key::Tab,
                modifiers,
            } => self.commit_query(*modifiers),
            PopupEvent::KeyPressed { key: Key::Up, .. } => {
                self.move_cursor(false);
                Vec::new()
            }
            PopupEvent::KeyPressed { key: Key::Down, .. } => {
                self.move_cursor(true);
                Vec::new()
            }
            PopupEvent::KeyPressed { key, modifiers } => {
                self.modifiers = modifiers.with_key(*key, true);
                Vec::new()
            }
            PopupEvent::KeyReleased { key, modifiers } => {
                let released_ctrl = *key == Key::Ctrl;
                self.modifiers = modifiers.with_key(*key, false);
                if released_ctrl {
                    self.commit_accumulation()
                } else {
                    Vec::new()
                }
            }
            PopupEvent::ModifiersChanged(modifiers) => {
                let released_ctrl = self.modifiers.ctrl && !modifiers.ctrl;
                self.modifiers = *modifiers;
                if released_ctrl {
                    self.commit_accumulation()
                } else {
                    Vec::new()
                }
            }
            PopupEvent::Hover(id) => {
                self.hovered = Some(*id);
                Vec::new()
            }
            PopupEvent::Unhover(id) => {
                if self.hovered == Some(*id) {
                    self.hovered = None;
                }
                Vec::new()
            }
            PopupEvent::Click {
                target: ClickTarget::Connector(id),
                button: MouseButton::Secondary,
                ..
            } => self.toggle_preview(*id),
            PopupEvent::Click {
                target,
                button: MouseButton::Primary,
                modifiers,
            } => match target {
                ClickTarget::Connector(id) => self.click_connector(*id, *modifiers),
                ClickTarget::Action(PopupAction::CreateParent) => {
                    vec![Effect::Open(PopupRequest::Naming { node: self.target })]
                }
                ClickTarget::Completion(index) if *index < self.result.ranked.len() => {
                    self.active = Some(*index);
                    self.commit_query(*modifiers)
                }
                ClickTarget::Background => vec![Effect::Close],
                _ => Vec::new(),
            },
            PopupEvent::TextEdited(text) => {
                self.set_query(text);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn teardown(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.take_accumulation().into_iter().collect();
        if self.previewing.take().is_some() {
            effects.push(Effect::PreviewRestore);
        }
        effects
    }

    fn view(&self) -> PopupView {
        let layout = picker_layout(self.buttons.len());
        let mut buttons: Vec<ButtonView> = self
            .buttons
            .iter()
            .zip(layout.connectors)
            .map(|(button, cell)| ButtonView {
                target: ClickTarget::Connector(button.connector.id),
                caption: self.caption(button),
                color: packed_to_hex(button.color),
                cell,
                highlighted: self.is_highlighted(button.connector.id),
                selected: self.accumulated.contains(&button.connector.id),
            })
            .collect();
        buttons.push(ButtonView {
            target: ClickTarget::Action(PopupAction::CreateParent),
            caption: PopupAction::CreateParent.caption().to_string(),
            color: packed_to_hex(BUTTON_REGULAR_DARK_COLOR),
            cell: layout.create_parent,
            highlighted: false,
            selected: false,
        });

        let search = (!self.buttons.is_empty()).then(|| SearchView {
            text: self.query.clone(),
            completions: self.completions().into_iter().map(str::to_string).collect(),
            active: self.active,
            field: layout.search,
            list: layout.completions,
        });

        PopupView {
            kind: PopupKind::Picker,
            buttons,
            search,
            text_field: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConnectorOptionsPopup {
    connectors: Vec<NodeId>,
}

impl ConnectorOptionsPopup {
    pub fn new(connectors: Vec<NodeId>) -> Self {
        Self { connectors }
    }

    pub fn connectors(&self) -> &[NodeId] {
        &self.connectors
    }

    /// Renaming is offered for a single connector only.
    pub fn actions(&self) -> Vec<PopupAction> {
        let mut actions = Vec::with_capacity(3);
        if self.connectors.len() == 1 {
            actions.push(PopupAction::Rename);
        }
        actions.push(PopupAction::Colorize);
        actions.push(PopupAction::SelectChildren);
        actions
    }

    fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        let PopupEvent::Click {
            target: ClickTarget::Action(action),
            button: MouseButton::Primary,
            ..
        } = event
        else {
            return Vec::new();
        };
        match action {
            PopupAction::Rename => match self.connectors.as_slice() {
                [only] => vec![Effect::Open(PopupRequest::Naming { node: Some(*only) })],
                _ => Vec::new(),
            },
            PopupAction::Colorize => vec![Effect::Open(PopupRequest::Color {
                connectors: self.connectors.clone(),
            })],
            PopupAction::SelectChildren => vec![
                Effect::SelectDependents {
                    connectors: self.connectors.clone(),
                },
                Effect::Close,
            ],
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChildrenOptionsPopup {
    proxy: NodeId,
    parent: Option<NodeId>,
}

impl ChildrenOptionsPopup {
    pub fn new(proxy: NodeId, parent: Option<NodeId>) -> Self {
        Self { proxy, parent }
    }

    pub fn proxy(&self) -> NodeId {
        self.proxy
    }

    fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        let PopupEvent::Click {
            target: ClickTarget::Action(action),
            button: MouseButton::Primary,
            ..
        } = event
        else {
            return Vec::new();
        };
        match action {
            PopupAction::JumpToParent => {
                let mut effects: Vec<Effect> = self
                    .parent
                    .map(|node| Effect::Jump { node })
                    .into_iter()
                    .collect();
                effects.push(Effect::Close);
                effects
            }
            PopupAction::Reconnect => vec![Effect::Open(PopupRequest::Picker {
                target: Some(self.proxy),
            })],
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColorPopup {
    connectors: Vec<NodeId>,
}

impl ColorPopup {
    pub fn new(connectors: Vec<NodeId>) -> Self {
        Self { connectors }
    }

    fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        match event {
            PopupEvent::Click {
                target: ClickTarget::Palette(index),
                button: MouseButton::Primary,
                ..
            } => match PALETTE.get(*index) {
                Some(entry) => vec![
                    Effect::SetColor {
                        connectors: self.connectors.clone(),
                        color: entry.color,
                    },
                    Effect::Close,
                ],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn view(&self) -> PopupView {
        let buttons = PALETTE
            .iter()
            .zip(wrap_cells(PALETTE.len(), PALETTE_COLUMNS))
            .enumerate()
            .map(|(index, (entry, cell))| ButtonView {
                target: ClickTarget::Palette(index),
                caption: entry.name.to_string(),
                color: packed_to_hex(entry.display_color()),
                cell,
                highlighted: false,
                selected: false,
            })
            .collect();
        PopupView {
            kind: PopupKind::Color,
            buttons,
            search: None,
            text_field: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NamingPopup {
    node: Option<NodeId>,
    previous: String,
    text: String,
}

impl NamingPopup {
    /// `previous` is the label being renamed, empty when creating.
    pub fn new(node: Option<NodeId>, previous: String) -> Self {
        Self {
            node,
            text: previous.clone(),
            previous,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        match event {
            PopupEvent::TextEdited(text) => {
                self.text = text.clone();
                Vec::new()
            }
            PopupEvent::KeyPressed {
                key: Key::Enter | Key::Tab,
                ..
            } if !self.text.trim().is_empty() => vec![
                Effect::MakeConnector {
                    node: self.node,
                    text: self.text.clone(),
                    previous: self.previous.clone(),
                },
                Effect::Close,
            ],
            _ => Vec::new(),
        }
    }
}

/// The live popup, one variant per kind.
#[derive(Clone, Debug)]
pub enum Popup {
    Picker(PickerPopup),
    ConnectorOptions(ConnectorOptionsPopup),
    ChildrenOptions(ChildrenOptionsPopup),
    Color(ColorPopup),
    Naming(NamingPopup),
}

impl Popup {
    pub fn kind(&self) -> PopupKind {
        match self {
            Popup::Picker(_) => PopupKind::Picker,
            Popup::ConnectorOptions(_) => PopupKind::ConnectorOptions,
            Popup::ChildrenOptions(_) => PopupKind::ChildrenOptions,
            Popup::Color(_) => PopupKind::Color,
            Popup::Naming(_) => PopupKind::Naming,
        }
    }

    /// Advances the state machine by one event.
    pub fn handle(&mut self, event: &PopupEvent) -> Vec<Effect> {
        if matches!(
            event,
            PopupEvent::KeyPressed {
                key: Key::Escape,
                ..
            } | PopupEvent::FocusLost
        ) {
            return vec![Effect::Close];
        }
        match self {
            Popup::Picker(p) => p.handle(event),
            Popup::ConnectorOptions(p) => p.handle(event),
            Popup::ChildrenOptions(p) => p.handle(event),
            Popup::Color(p) => p.handle(event),
            Popup::Naming(p) => p.handle(event),
        }
    }

    /// Effects still owed when the popup goes away: pending multi-create, viewer restore.
    pub fn teardown(&mut self) -> Vec<Effect> {
        match self {
            Popup::Picker(p) => p.teardown(),
            _ => Vec::new(),
        }
    }

    pub fn view(&self) -> PopupView {
        match self {
            Popup::Picker(p) => p.view(),
            Popup::ConnectorOptions(p) => PopupView {
                kind: PopupKind::ConnectorOptions,
                buttons: action_buttons(&p.actions()),
                search: None,
                text_field: None,
            },
            Popup::ChildrenOptions(_) => PopupView {
                kind: PopupKind::ChildrenOptions,
                buttons: action_buttons(&[PopupAction::JumpToParent, PopupAction::Reconnect]),
                search: None,
                text_field: None,
            },
            Popup::Color(p) => p.view(),
            Popup::Naming(p) => PopupView {
                kind: PopupKind::Naming,
                buttons: Vec::new(),
                search: None,
                text_field: Some(p.text.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(label: &str) -> ConnectorButton {
        ConnectorButton {
            connector: Connector {
                id: NodeId::new(),
                name: format!("Connector_{}", label),
                label: label.to_string(),
                tile_color: 0,
            },
            color: BUTTON_REGULAR_COLOR,
        }
    }

    fn picker(labels: &[&str]) -> (Popup, Vec<Connector>) {
        let buttons: Vec<ConnectorButton> = labels.iter().map(|l| connector(l)).collect();
        let connectors = buttons.iter().map(|b| b.connector.clone()).collect();
        (Popup::Picker(PickerPopup::new(None, buttons)), connectors)
    }

    fn as_picker(popup: &Popup) -> &PickerPopup {
        match popup {
            Popup::Picker(p) => p,
            other => panic!("expected picker, got {:?}", other.kind()),
        }
    }

    #[test]
    fn plain_click_connects_and_closes() {
        let (mut popup, connectors) = picker(&["BG", "PLATE"]);
        let effects = popup.handle(&PopupEvent::click(ClickTarget::Connector(connectors[1].id)));
        assert_eq!(
            effects,
            vec![
                Effect::Connect {
                    connector: connectors[1].clone(),
                    target: None
                },
                Effect::Close
            ]
        );
    }

    #[test]
    fn modifier_clicks_dispatch_by_intent() {
        let (mut popup, connectors) = picker(&["BG"]);
        let target = ClickTarget::Connector(connectors[0].id);

        assert_eq!(
            popup.handle(&PopupEvent::click_with(target, Modifiers::SHIFT)),
            vec![Effect::Jump { node: connectors[0].id }, Effect::Close]
        );
        assert_eq!(
            popup.handle(&PopupEvent::click_with(target, Modifiers::ALT)),
            vec![Effect::Open(PopupRequest::ConnectorOptions {
                connectors: vec![connectors[0].id]
            })]
        );
        assert!(popup
            .handle(&PopupEvent::click_with(target, Modifiers::CTRL))
            .is_empty());
        assert_eq!(as_picker(&popup).accumulated(), &[connectors[0].id]);
    }

    #[test]
    fn releasing_ctrl_commits_accumulation_once() {
        let (mut popup, connectors) = picker(&["A", "B", "C"]);
        for c in [&connectors[2], &connectors[0], &connectors[1]] {
            popup.handle(&PopupEvent::click_with(
                ClickTarget::Connector(c.id),
                Modifiers::CTRL,
            ));
        }

        let effects = popup.handle(&PopupEvent::KeyReleased {
            key: Key::Ctrl,
            modifiers: Modifiers::NONE,
        });
        assert_eq!(
            effects,
            vec![
                Effect::CreateMany {
                    connectors: vec![
                        connectors[2].clone(),
                        connectors[0].clone(),
                        connectors[1].clone()
                    ]
                },
                Effect::Close
            ]
        );
        assert!(as_picker(&popup).accumulated().is_empty());
        assert!(popup.teardown().is_empty());
    }

    #[test]
    fn ctrl_toggle_removes_from_accumulation() {
        let (mut popup, connectors) = picker(&["A", "B"]);
        let target = ClickTarget::Connector(connectors[0].id);
        popup.handle(&PopupEvent::click_with(target, Modifiers::CTRL));
        popup.handle(&PopupEvent::click_with(target, Modifiers::CTRL));
        assert!(as_picker(&popup).accumulated().is_empty());
        assert!(popup
            .handle(&PopupEvent::ModifiersChanged(Modifiers::NONE))
            .is_empty());
    }

    #[test]
    fn modifiers_changed_release_commits() {
        let (mut popup, connectors) = picker(&["A"]);
        popup.handle(&PopupEvent::ModifiersChanged(Modifiers::CTRL));
        popup.handle(&PopupEvent::click_with(
            ClickTarget::Connector(connectors[0].id),
            Modifiers::CTRL,
        ));
        let effects = popup.handle(&PopupEvent::ModifiersChanged(Modifiers::NONE));
        assert!(matches!(effects.as_slice(), [Effect::CreateMany { .. }, Effect::Close]));
    }

    #[test]
    fn escape_closes_and_teardown_flushes() {
        let (mut popup, connectors) = picker(&["A", "B"]);
        popup.handle(&PopupEvent::click_with(
            ClickTarget::Connector(connectors[1].id),
            Modifiers::CTRL,
        ));
        popup.handle(&PopupEvent::right_click(ClickTarget::Connector(connectors[0].id)));

        assert_eq!(popup.handle(&PopupEvent::key(Key::Escape)), vec![Effect::Close]);
        assert_eq!(
            popup.teardown(),
            vec![
                Effect::CreateMany {
                    connectors: vec![connectors[1].clone()]
                },
                Effect::PreviewRestore
            ]
        );
        assert!(popup.teardown().is_empty());
    }

    #[test]
    fn background_click_closes() {
        let (mut popup, _) = picker(&["A"]);
        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Background)),
            vec![Effect::Close]
        );
    }

    #[test]
    fn right_click_toggles_preview() {
        let (mut popup, connectors) = picker(&["A", "B"]);
        let a = ClickTarget::Connector(connectors[0].id);
        let b = ClickTarget::Connector(connectors[1].id);

        assert_eq!(
            popup.handle(&PopupEvent::right_click(a)),
            vec![Effect::PreviewShow { connector: connectors[0].id }]
        );
        assert_eq!(
            popup.handle(&PopupEvent::right_click(b)),
            vec![Effect::PreviewShow { connector: connectors[1].id }]
        );
        assert_eq!(popup.handle(&PopupEvent::right_click(b)), vec![Effect::PreviewRestore]);
        assert_eq!(as_picker(&popup).previewing(), None);
    }

    #[test]
    fn hover_caption_follows_modifiers() {
        let (mut popup, connectors) = picker(&["PLATE"]);
        let id = connectors[0].id;
        let caption = |popup: &Popup| popup.view().buttons[0].caption.clone();

        popup.handle(&PopupEvent::ModifiersChanged(Modifiers::SHIFT));
        assert_eq!(caption(&popup), "PLATE");

        popup.handle(&PopupEvent::Hover(id));
        assert_eq!(caption(&popup), "Jump to\n-\nPLATE");

        popup.handle(&PopupEvent::ModifiersChanged(Modifiers::ALT));
        assert_eq!(caption(&popup), "Options...\n-\nPLATE");

        popup.handle(&PopupEvent::ModifiersChanged(Modifiers::CTRL));
        assert_eq!(caption(&popup), "Add\n-\nPLATE");

        popup.handle(&PopupEvent::Unhover(id));
        assert_eq!(caption(&popup), "PLATE");
    }

    #[test]
    fn enter_with_empty_search_closes() {
        let (mut popup, _) = picker(&["A"]);
        assert_eq!(popup.handle(&PopupEvent::key(Key::Enter)), vec![Effect::Close]);
    }

    #[test]
    fn enter_connects_exact_match_over_ranking() {
        let (mut popup, connectors) = picker(&["PLATE", "PLATES"]);
        popup.handle(&PopupEvent::TextEdited("plate".into()));
        let view = popup.view();
        assert!(view.buttons[0].highlighted);
        assert!(!view.buttons[1].highlighted);

        assert_eq!(
            popup.handle(&PopupEvent::key(Key::Tab)),
            vec![
                Effect::Connect {
                    connector: connectors[0].clone(),
                    target: None
                },
                Effect::Close
            ]
        );
    }

    #[test]
    fn enter_connects_sole_match() {
        let (mut popup, connectors) = picker(&["BG", "CLEANPLATE"]);
        popup.handle(&PopupEvent::TextEdited("cp".into()));
        let effects = popup.handle(&PopupEvent::key(Key::Enter));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Connect { connector, .. }, Effect::Close] if connector.id == connectors[1].id
        ));
    }

    #[test]
    fn ambiguous_enter_stays_open() {
        let (mut popup, _) = picker(&["PLATE_A", "PLATE_B"]);
        popup.handle(&PopupEvent::TextEdited("pl".into()));
        assert!(popup.handle(&PopupEvent::key(Key::Enter)).is_empty());
        assert_eq!(as_picker(&popup).completions(), vec!["PLATE_A", "PLATE_B"]);
    }

    #[test]
    fn completion_cursor_picks_entry() {
        let (mut popup, connectors) = picker(&["PLATE_A", "PLATE_B"]);
        popup.handle(&PopupEvent::TextEdited("pl".into()));
        popup.handle(&PopupEvent::key(Key::Down));
        popup.handle(&PopupEvent::key(Key::Down));
        popup.handle(&PopupEvent::key(Key::Down));
        assert_eq!(as_picker(&popup).active_completion(), Some(1));

        let effects = popup.handle(&PopupEvent::KeyPressed {
            key: Key::Enter,
            modifiers: Modifiers::SHIFT,
        });
        assert_eq!(
            effects,
            vec![Effect::Jump { node: connectors[1].id }, Effect::Close]
        );
    }

    #[test]
    fn clicking_a_completion_commits_it() {
        let (mut popup, connectors) = picker(&["PLATE_A", "PLATE_B"]);
        popup.handle(&PopupEvent::TextEdited("pl".into()));
        let effects = popup.handle(&PopupEvent::click(ClickTarget::Completion(0)));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Connect { connector, .. }, Effect::Close] if connector.id == connectors[0].id
        ));
    }

    #[test]
    fn picker_view_lays_out_grid_and_side_column() {
        let (popup, _) = picker(&["A", "B", "C", "D", "E"]);
        let view = popup.view();
        assert_eq!(view.kind, PopupKind::Picker);
        assert_eq!(view.buttons.len(), 6);
        assert_eq!(view.buttons[3].cell, GridCell::new(1, 0));
        let create = view.buttons.last().unwrap();
        assert_eq!(create.caption, "Create New\nParent...");
        assert_eq!(create.color, "#1c1f22");
        assert_eq!(view.search.unwrap().field, GridCell::new(1, 4));
    }

    #[test]
    fn empty_picker_has_no_search() {
        let (mut popup, _) = picker(&[]);
        assert!(popup.view().search.is_none());
        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Action(PopupAction::CreateParent))),
            vec![Effect::Open(PopupRequest::Naming { node: None })]
        );
    }

    #[test]
    fn connector_options_offer_rename_for_one_connector_only() {
        let id = NodeId::new();
        let mut single = Popup::ConnectorOptions(ConnectorOptionsPopup::new(vec![id]));
        let captions: Vec<String> = single.view().buttons.into_iter().map(|b| b.caption).collect();
        assert_eq!(captions, vec!["Rename...", "Colorize...", "Select All Children"]);
        assert_eq!(
            single.handle(&PopupEvent::click(ClickTarget::Action(PopupAction::Rename))),
            vec![Effect::Open(PopupRequest::Naming { node: Some(id) })]
        );

        let many = Popup::ConnectorOptions(ConnectorOptionsPopup::new(vec![id, NodeId::new()]));
        assert_eq!(many.view().buttons.len(), 2);
    }

    #[test]
    fn colorize_opens_color_popup_for_all_connectors() {
        let ids = vec![NodeId::new(), NodeId::new()];
        let mut popup = Popup::ConnectorOptions(ConnectorOptionsPopup::new(ids.clone()));
        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Action(PopupAction::Colorize))),
            vec![Effect::Open(PopupRequest::Color { connectors: ids })]
        );
    }

    #[test]
    fn children_options() {
        let proxy = NodeId::new();
        let parent = NodeId::new();
        let mut popup = Popup::ChildrenOptions(ChildrenOptionsPopup::new(proxy, Some(parent)));
        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Action(PopupAction::JumpToParent))),
            vec![Effect::Jump { node: parent }, Effect::Close]
        );
        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Action(PopupAction::Reconnect))),
            vec![Effect::Open(PopupRequest::Picker {
                target: Some(proxy)
            })]
        );
    }

    #[test]
    fn color_popup_sets_palette_entry() {
        let id = NodeId::new();
        let mut popup = Popup::Color(ColorPopup::new(vec![id]));
        let view = popup.view();
        assert_eq!(view.buttons.len(), PALETTE.len());
        assert_eq!(view.buttons[5].cell, GridCell::new(1, 0));

        assert_eq!(
            popup.handle(&PopupEvent::click(ClickTarget::Palette(9))),
            vec![
                Effect::SetColor {
                    connectors: vec![id],
                    color: PaletteColor::Default
                },
                Effect::Close
            ]
        );
        assert!(popup.handle(&PopupEvent::click(ClickTarget::Palette(42))).is_empty());
    }

    #[test]
    fn naming_ignores_empty_submission() {
        let mut popup = Popup::Naming(NamingPopup::new(None, String::new()));
        popup.handle(&PopupEvent::TextEdited("   ".into()));
        assert!(popup.handle(&PopupEvent::key(Key::Enter)).is_empty());

        popup.handle(&PopupEvent::TextEdited("plate".into()));
        assert_eq!(
            popup.handle(&PopupEvent::key(Key::Enter)),
            vec![
                Effect::MakeConnector {
                    node: None,
                    text: "plate".into(),
                    previous: String::new()
                },
                Effect::Close
            ]
        );
    }

    #[test]
    fn naming_is_prefilled_when_renaming() {
        let id = NodeId::new();
        let popup = Popup::Naming(NamingPopup::new(Some(id), "PLATE".into()));
        assert_eq!(popup.view().text_field.as_deref(), Some("PLATE"));
    }

    #[test]
    fn focus_loss_closes_every_variant() {
        let mut popups = vec![
            picker(&["A"]).0,
            Popup::ConnectorOptions(ConnectorOptionsPopup::new(vec![NodeId::new()])),
            Popup::ChildrenOptions(ChildrenOptionsPopup::new(NodeId::new(), None)),
            Popup::Color(ColorPopup::new(vec![])),
            Popup::Naming(NamingPopup::new(None, String::new())),
        ];
        for popup in &mut popups {
            assert_eq!(popup.handle(&PopupEvent::FocusLost), vec![Effect::Close]);
        }
    }

    #[test]
    fn mutation_classification() {
        assert!(!Effect::PreviewShow { connector: NodeId::new() }.is_mutation());
        assert!(!Effect::Jump { node: NodeId::new() }.is_mutation());
        assert!(Effect::CreateMany { connectors: vec![] }.is_mutation());
        assert!(Effect::Open(PopupRequest::Picker { target: None }).closes());
    }
}
