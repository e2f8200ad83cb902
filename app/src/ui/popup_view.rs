//! egui rendering of a [`PopupView`] and translation of egui input into
//! [`PopupEvent`]s.

use egui::{Context, Grid, Id, Rect, RichText, Sense, Stroke, TextEdit, Ui, Vec2};
use label_connector::NodeId;
use label_connector::color::BUTTON_HIGHLIGHT_COLOR;
use label_connector::popup::{
    ButtonView, ClickTarget, GridCell, Key, Modifiers, MouseButton, PopupEvent, PopupKind,
    PopupView, SearchView,
};

use super::{hex_color32, packed_color32, text_color_on};

const BUTTON_SIZE: Vec2 = Vec2::new(96.0, 44.0);

#[derive(Clone, Default)]
struct PopupInputState {
    modifiers: Modifiers,
    hovered: Option<NodeId>,
    focused: Option<PopupKind>,
    /// Popup rect of the previous frame, clickable behind the widgets.
    area: Option<Rect>,
}

/// Forgets hover, modifier and focus tracking, so the next popup starts clean.
pub fn clear_popup_state(ctx: &Context, id_source: &str) {
    ctx.data_mut(|d| d.remove::<PopupInputState>(Id::new(id_source)));
}

/// Renders `view` and returns the input it received this frame, in order.
pub fn show_popup(ui: &mut Ui, id_source: &str, view: &PopupView) -> Vec<PopupEvent> {
    let id = Id::new(id_source);
    let mut state = ui.data_mut(|d| d.get_temp::<PopupInputState>(id).unwrap_or_default());
    let mut events = Vec::new();

    let modifiers = ui.input(|i| to_popup_modifiers(i.modifiers));
    if modifiers != state.modifiers {
        state.modifiers = modifiers;
        events.push(PopupEvent::ModifiersChanged(modifiers));
    }

    let background = state
        .area
        .map(|rect| ui.interact(rect, id.with("background"), Sense::click()));

    match &view.text_field {
        Some(text) => naming_field(ui, text, &mut state, view.kind, &mut events),
        None => button_grid(ui, id, view, &mut state, &mut events),
    }

    if background.is_some_and(|response| response.clicked()) {
        events.push(click(ClickTarget::Background, MouseButton::Primary, state.modifiers));
    }
    state.area = Some(ui.min_rect());

    collect_keys(ui, &mut events);
    ui.data_mut(|d| d.insert_temp(id, state));
    events
}

fn naming_field(
    ui: &mut Ui,
    text: &str,
    state: &mut PopupInputState,
    kind: PopupKind,
    events: &mut Vec<PopupEvent>,
) {
    ui.label(RichText::new("Connector label").strong());
    let mut edited = text.to_string();
    let response = ui.add(
        TextEdit::singleline(&mut edited)
            .hint_text("Enter label...")
            .desired_width(BUTTON_SIZE.x * 2.0),
    );
    request_focus_once(&response, state, kind);
    if response.changed() {
        events.push(PopupEvent::TextEdited(edited));
    }
}

fn button_grid(
    ui: &mut Ui,
    id: Id,
    view: &PopupView,
    state: &mut PopupInputState,
    events: &mut Vec<PopupEvent>,
) {
    let mut cells: Vec<GridCell> = view.buttons.iter().map(|b| b.cell).collect();
    if let Some(search) = &view.search {
        cells.push(search.field);
        cells.push(search.list);
    }
    let rows = cells.iter().map(|c| c.row + 1).max().unwrap_or(0);
    let columns = cells.iter().map(|c| c.column + 1).max().unwrap_or(0);

    Grid::new(id.with("grid"))
        .spacing([4.0, 4.0])
        .show(ui, |ui| {
            for row in 0..rows {
                for column in 0..columns {
                    let cell = GridCell::new(row, column);
                    if let Some(button) = view.buttons.iter().find(|b| b.cell == cell) {
                        popup_button(ui, button, state, events);
                    } else if let Some(search) = view.search.as_ref().filter(|s| s.field == cell) {
                        search_field(ui, search, state, view.kind, events);
                    } else if let Some(search) = view.search.as_ref().filter(|s| s.list == cell) {
                        completion_list(ui, search, state.modifiers, events);
                    } else {
                        ui.label("");
                    }
                }
                ui.end_row();
            }
        });
}

fn popup_button(
    ui: &mut Ui,
    button: &ButtonView,
    state: &mut PopupInputState,
    events: &mut Vec<PopupEvent>,
) {
    let fill = hex_color32(&button.color);
    let mut widget = egui::Button::new(RichText::new(&button.caption).color(text_color_on(fill)))
        .fill(fill)
        .min_size(BUTTON_SIZE);
    if button.selected {
        widget = widget.stroke(Stroke::new(2.0, egui::Color32::WHITE));
    } else if button.highlighted {
        widget = widget.stroke(Stroke::new(2.0, packed_color32(BUTTON_HIGHLIGHT_COLOR)));
    }
    let response = ui.add(widget);

    if let ClickTarget::Connector(id) = button.target {
        if response.hovered() && state.hovered != Some(id) {
            if let Some(previous) = state.hovered.replace(id) {
                events.push(PopupEvent::Unhover(previous));
            }
            events.push(PopupEvent::Hover(id));
        } else if !response.hovered() && state.hovered == Some(id) {
            state.hovered = None;
            events.push(PopupEvent::Unhover(id));
        }
    }

    if response.clicked() {
        events.push(click(button.target, MouseButton::Primary, state.modifiers));
    }
    if response.secondary_clicked() {
        events.push(click(button.target, MouseButton::Secondary, state.modifiers));
    }
}

fn search_field(
    ui: &mut Ui,
    search: &SearchView,
    state: &mut PopupInputState,
    kind: PopupKind,
    events: &mut Vec<PopupEvent>,
) {
    let mut text = search.text.clone();
    let response = ui.add(
        TextEdit::singleline(&mut text)
            .hint_text("Search...")
            .desired_width(BUTTON_SIZE.x),
    );
    request_focus_once(&response, state, kind);
    if response.changed() {
        events.push(PopupEvent::TextEdited(text));
    }
}

fn completion_list(
    ui: &mut Ui,
    search: &SearchView,
    modifiers: Modifiers,
    events: &mut Vec<PopupEvent>,
) {
    ui.vertical(|ui| {
        for (index, label) in search.completions.iter().enumerate() {
            let active = search.active == Some(index);
            if ui.selectable_label(active, label).clicked() {
                events.push(click(
                    ClickTarget::Completion(index),
                    MouseButton::Primary,
                    modifiers,
                ));
            }
        }
    });
}

fn request_focus_once(response: &egui::Response, state: &mut PopupInputState, kind: PopupKind) {
    if state.focused != Some(kind) {
        response.request_focus();
        state.focused = Some(kind);
    }
}

fn click(target: ClickTarget, button: MouseButton, modifiers: Modifiers) -> PopupEvent {
    PopupEvent::Click {
        target,
        button,
        modifiers,
    }
}

fn collect_keys(ui: &Ui, events: &mut Vec<PopupEvent>) {
    ui.input(|i| {
        for event in &i.events {
            let egui::Event::Key {
                key,
                pressed,
                modifiers,
                ..
            } = event
            else {
                continue;
            };
            let Some(key) = to_popup_key(*key) else {
                continue;
            };
            let modifiers = to_popup_modifiers(*modifiers);
            events.push(if *pressed {
                PopupEvent::KeyPressed { key, modifiers }
            } else {
                PopupEvent::KeyReleased { key, modifiers }
            });
        }
    });
}

fn to_popup_key(key: egui::Key) -> Option<Key> {
    match key {
        egui::Key::Escape => Some(Key::Escape),
        egui::Key::Enter => Some(Key::Enter),
        egui::Key::Tab => Some(Key::Tab),
        egui::Key::ArrowUp => Some(Key::Up),
        egui::Key::ArrowDown => Some(Key::Down),
        _ => None,
    }
}

pub fn to_popup_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.shift,
        alt: modifiers.alt,
        ctrl: modifiers.ctrl || modifiers.command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui_kittest::kittest::Queryable;
    use egui_kittest::Harness;
    use label_connector::popup::{
        ColorPopup, ConnectorButton, ConnectorOptionsPopup, PickerPopup, Popup,
    };
    use label_connector::Connector;

    fn connector(label: &str) -> Connector {
        Connector {
            id: NodeId::new(),
            name: format!("Connector_{}", label),
            label: label.to_string(),
            tile_color: 0,
        }
    }

    fn picker(labels: &[&str]) -> (Popup, Vec<NodeId>) {
        let buttons: Vec<ConnectorButton> = labels
            .iter()
            .map(|l| ConnectorButton {
                connector: connector(l),
                color: 0x2828_28FF,
            })
            .collect();
        let ids = buttons.iter().map(|b| b.connector.id).collect();
        (Popup::Picker(PickerPopup::new(None, buttons)), ids)
    }

    fn harness_for(view: PopupView) -> Harness<'static, Vec<PopupEvent>> {
        Harness::builder()
            .with_size(egui::vec2(600.0, 400.0))
            .build_ui_state(
                move |ui, events: &mut Vec<PopupEvent>| {
                    events.extend(show_popup(ui, "test_popup", &view));
                },
                Vec::new(),
            )
    }

    #[test]
    fn picker_shows_connectors_and_create_button() {
        let (popup, _) = picker(&["BG", "PLATE"]);
        let harness = harness_for(popup.view());
        assert!(harness.query_by_label("BG").is_some());
        assert!(harness.query_by_label("PLATE").is_some());
        assert!(harness.query_by_label("Create New\nParent...").is_some());
    }

    #[test]
    fn clicking_a_connector_reports_a_primary_click() {
        let (popup, ids) = picker(&["BG", "PLATE"]);
        let mut harness = harness_for(popup.view());

        harness.get_by_label("PLATE").click();
        harness.run();

        assert!(harness.state().contains(&PopupEvent::Click {
            target: ClickTarget::Connector(ids[1]),
            button: MouseButton::Primary,
            modifiers: Modifiers::NONE,
        }));
    }

    #[test]
    fn completions_are_listed_under_the_search_field() {
        let (mut popup, _) = picker(&["BG", "CLEANPLATE", "FG"]);
        popup.handle(&PopupEvent::TextEdited("cpl".into()));
        let mut harness = harness_for(popup.view());

        // Once as a button, once as a completion.
        assert_eq!(harness.query_all_by_label("CLEANPLATE").count(), 2);
        assert!(harness.query_all_by_label("BG").count() == 1);

        harness.get_all_by_label("CLEANPLATE").last().unwrap().click();
        harness.run();
        assert!(harness
            .state()
            .contains(&PopupEvent::click(ClickTarget::Completion(0))));
    }

    #[test]
    fn palette_click_reports_its_index() {
        let popup = Popup::Color(ColorPopup::new(vec![NodeId::new()]));
        let mut harness = harness_for(popup.view());

        harness.get_by_label("Cyan").click();
        harness.run();

        assert!(harness
            .state()
            .contains(&PopupEvent::click(ClickTarget::Palette(5))));
    }

    #[test]
    fn rename_is_offered_for_a_single_connector_only() {
        let single = Popup::ConnectorOptions(ConnectorOptionsPopup::new(vec![NodeId::new()]));
        let harness = harness_for(single.view());
        assert!(harness.query_by_label("Rename...").is_some());

        let many = Popup::ConnectorOptions(ConnectorOptionsPopup::new(vec![
            NodeId::new(),
            NodeId::new(),
        ]));
        let harness = harness_for(many.view());
        assert!(harness.query_by_label("Rename...").is_none());
        assert!(harness.query_by_label("Colorize...").is_some());
    }

    #[test]
    fn clicking_empty_space_reports_a_background_click() {
        let (popup, _) = picker(&["BG", "PLATE"]);
        let mut harness = harness_for(popup.view());
        let area = harness
            .ctx
            .data(|d| d.get_temp::<PopupInputState>(Id::new("test_popup")))
            .and_then(|state| state.area)
            .unwrap();
        // Row 2 only holds the completion list in the side column.
        let empty = area.left_bottom() + egui::vec2(1.0, -1.0);

        harness.input_mut().events.push(egui::Event::PointerMoved(empty));
        harness.run();
        for pressed in [true, false] {
            harness.input_mut().events.push(egui::Event::PointerButton {
                pos: empty,
                button: egui::PointerButton::Primary,
                pressed,
                modifiers: egui::Modifiers::NONE,
            });
            harness.run();
        }

        assert!(harness
            .state()
            .contains(&PopupEvent::click(ClickTarget::Background)));
    }

    #[test]
    fn clicking_a_button_is_not_a_background_click() {
        let (popup, _) = picker(&["BG", "PLATE"]);
        let mut harness = harness_for(popup.view());

        harness.get_by_label("BG").click();
        harness.run();

        assert!(!harness
            .state()
            .contains(&PopupEvent::click(ClickTarget::Background)));
    }

    #[test]
    fn modifier_keys_map_to_ctrl() {
        let mac = egui::Modifiers {
            command: true,
            mac_cmd: true,
            ..egui::Modifiers::NONE
        };
        assert_eq!(to_popup_modifiers(mac), Modifiers::CTRL);
        assert_eq!(to_popup_modifiers(egui::Modifiers::SHIFT), Modifiers::SHIFT);
        assert_eq!(to_popup_key(egui::Key::ArrowDown), Some(Key::Down));
        assert_eq!(to_popup_key(egui::Key::A), None);
    }
}
