use eframe::egui::{self, Visuals};
use label_connector::popup::PopupEvent;
use label_connector::{ConnectorSession, MemoryGraph, NodeGraphSource, NodeId, markers};
use log::{error, info, warn};

use crate::command::{CommandId, CommandRegistry};
use crate::config::{self, AppConfig};
use crate::scene::load_scene;
use crate::shortcut::ShortcutManager;
use crate::ui::graph_view::GraphView;
use crate::ui::popup_view::{clear_popup_state, show_popup};

const POPUP_ID: &str = "label_connector_popup";
const DEFAULT_POPUP_ANCHOR: egui::Pos2 = egui::pos2(200.0, 150.0);

pub struct LabelConnectorApp {
    graph: MemoryGraph,
    session: ConnectorSession,
    config: AppConfig,
    command_registry: CommandRegistry,
    shortcut_manager: ShortcutManager,
    graph_view: GraphView,
    /// Where the live popup is drawn; set when it opens.
    popup_anchor: Option<egui::Pos2>,
    messages: Vec<String>,
    show_settings: bool,
}

impl LabelConnectorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, scene_path: Option<&str>) -> Self {
        let mut visuals = Visuals::dark();
        visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(255, 120, 0);
        cc.egui_ctx.set_visuals(visuals);

        let config = config::load_config();
        let graph = match load_scene(scene_path) {
            Ok(graph) => graph,
            Err(e) => {
                error!("{:#}", e);
                MemoryGraph::new()
            }
        };
        info!("Loaded scene with {} nodes", graph.all_nodes().len());

        Self {
            graph,
            session: ConnectorSession::new(config.settings.clone()),
            command_registry: CommandRegistry::new(&config.shortcuts),
            config,
            shortcut_manager: ShortcutManager::new(),
            graph_view: GraphView::default(),
            popup_anchor: None,
            messages: Vec::new(),
            show_settings: false,
        }
    }

    fn execute(&mut self, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::MakeConnector => self.session.make_connector(&mut self.graph),
            CommandId::ConnectSelected => {
                self.session.connect_selected(&mut self.graph, false);
            }
            CommandId::ForceConnect => {
                self.session.connect_selected(&mut self.graph, true);
            }
            CommandId::JumpToSource => {
                let proxy = self
                    .graph
                    .selected_nodes()
                    .into_iter()
                    .find(|id| markers::is_proxy(&self.graph, *id));
                match proxy {
                    Some(proxy) => self.jump_to_source(proxy),
                    None => warn!("Jump to source needs a selected proxy"),
                }
            }
            CommandId::Undo => {
                self.session.close_popup(&mut self.graph);
                self.graph.undo();
            }
            CommandId::Redo => {
                self.session.close_popup(&mut self.graph);
                self.graph.redo();
            }
            CommandId::SaveSettings => self.save_settings(),
            CommandId::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
        if self.session.is_open() && self.popup_anchor.is_none() {
            self.popup_anchor = Some(popup_anchor(ctx));
        }
    }

    fn jump_to_source(&mut self, proxy: NodeId) {
        if let Err(e) = self.session.jump_to_source(&mut self.graph, proxy) {
            warn!("Jump to source failed: {}", e);
        }
    }

    fn save_settings(&mut self) {
        self.config.settings = self.session.settings().clone();
        if let Err(e) = config::save_config(&self.config) {
            error!("{:#}", e);
            self.messages.push(format!("Could not save settings: {}", e));
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        let registry = &self.command_registry;
        let mut triggered = None;
        let mut open_settings = false;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    for id in [CommandId::SaveSettings, CommandId::Quit] {
                        menu_item(ui, registry, id, &mut triggered);
                    }
                });
                ui.menu_button("Edit", |ui| {
                    for id in [CommandId::Undo, CommandId::Redo] {
                        menu_item(ui, registry, id, &mut triggered);
                    }
                    ui.separator();
                    if ui.button("Settings...").clicked() {
                        open_settings = true;
                        ui.close();
                    }
                });
                ui.menu_button("Label Connector", |ui| {
                    for id in [
                        CommandId::MakeConnector,
                        CommandId::ConnectSelected,
                        CommandId::ForceConnect,
                        CommandId::JumpToSource,
                    ] {
                        menu_item(ui, registry, id, &mut triggered);
                    }
                });
            });
        });
        self.show_settings |= open_settings;
        if let Some(id) = triggered {
            self.execute(ctx, id);
        }
    }

    fn popup_window(&mut self, ctx: &egui::Context) {
        let Some(view) = self.session.view() else {
            self.popup_anchor = None;
            clear_popup_state(ctx, POPUP_ID);
            return;
        };
        let anchor = *self.popup_anchor.get_or_insert_with(|| popup_anchor(ctx));

        let area = egui::Area::new(egui::Id::new(POPUP_ID))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .show(ui, |ui| show_popup(ui, POPUP_ID, &view))
                    .inner
            });

        let mut events = area.inner;
        let clicked_outside = ctx.input(|i| {
            i.pointer.any_pressed()
                && i.pointer
                    .interact_pos()
                    .is_some_and(|p| !area.response.rect.contains(p))
        });
        let window_unfocused = ctx.input(|i| {
            i.events
                .iter()
                .any(|e| matches!(e, egui::Event::WindowFocused(false)))
        });
        if clicked_outside || window_unfocused {
            events.push(PopupEvent::FocusLost);
        }

        for event in &events {
            self.session.handle_event(&mut self.graph, event);
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }
        let mut settings = self.session.settings().clone();
        let mut open = true;
        let mut save = false;
        egui::Window::new("Label Connector Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.checkbox(&mut settings.use_thumbnails, "Create thumbnail proxies");
                ui.checkbox(&mut settings.colorize_connected, "Color proxies like their connector");
                ui.checkbox(&mut settings.cascade_color, "Recolor proxies with their connector");
                ui.checkbox(&mut settings.bold_labels, "Bold connector labels");
                ui.checkbox(&mut settings.proxy_controls, "Add jump button to proxies");
                ui.horizontal(|ui| {
                    ui.label("Label font size");
                    ui.add(egui::DragValue::new(&mut settings.label_font_size).range(6..=96));
                });
                ui.label(format!("Ignored classes: {}", settings.ignore_classes.join(", ")));
                save = ui.button("Save").clicked();
            });
        if &settings != self.session.settings() {
            self.session.set_settings(settings);
        }
        if save {
            self.save_settings();
        }
        self.show_settings = open;
    }

    fn message_window(&mut self, ctx: &egui::Context) {
        self.messages.extend(self.graph.take_messages());
        let Some(message) = self.messages.first().cloned() else {
            return;
        };
        egui::Window::new("Label Connector")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.messages.remove(0);
                }
            });
    }
}

impl eframe::App for LabelConnectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(id) = self
            .shortcut_manager
            .handle_shortcuts(ctx, &self.command_registry)
        {
            self.execute(ctx, id);
        }

        self.menu_bar(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Undo steps: {}", self.graph.undo_steps()));
                ui.separator();
                ui.label(format!("Selected: {}", self.graph.selected_nodes().len()));
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if let Some(proxy) = self.graph_view.show(ui, &mut self.graph) {
                    self.jump_to_source(proxy);
                }
            });

        self.popup_window(ctx);
        self.settings_window(ctx);
        self.message_window(ctx);
    }
}

/// The popup opens where the pointer last was.
fn popup_anchor(ctx: &egui::Context) -> egui::Pos2 {
    ctx.input(|i| i.pointer.latest_pos())
        .unwrap_or(DEFAULT_POPUP_ANCHOR)
}

fn menu_item(
    ui: &mut egui::Ui,
    registry: &CommandRegistry,
    id: CommandId,
    triggered: &mut Option<CommandId>,
) {
    let Some(command) = registry.get(id) else {
        return;
    };
    if ui
        .add(egui::Button::new(command.text).shortcut_text(command.shortcut_text.as_str()))
        .clicked()
    {
        *triggered = Some(id);
        ui.close();
    }
}
