//! Host-level command handler.
//!
//! `ConnectorSession` owns at most one live popup and turns popup effects into
//! graph edits. Every gesture that edits the graph runs inside one [`UndoScope`].

use log::{debug, info, warn};

use crate::classifier::{PopupRequest, Resolution, resolve_context};
use crate::color::display_color;
use crate::error::{ConnectorError, Result};
use crate::host::HostGraph;
use crate::markers::is_connector;
use crate::model::{NodeId, UNDO_EVENT_TEXT};
use crate::mutator::{
    ViewerPreview, create_many, create_proxy_and_connect, jump_keeping_selection, jump_to_source,
    make_connector, select_dependents, set_connector_color, source_connector,
};
use crate::popup::{
    ChildrenOptionsPopup, ColorPopup, ConnectorButton, ConnectorOptionsPopup, Effect,
    NamingPopup, PickerPopup, Popup, PopupEvent, PopupView,
};
use crate::registry::{ConnectorRegistry, list_connectors};
use crate::settings::Settings;
use crate::transaction::UndoScope;

#[derive(Debug, Default)]
pub struct ConnectorSession {
    settings: Settings,
    popup: Option<Popup>,
    preview: Option<ViewerPreview>,
}

impl ConnectorSession {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            popup: None,
            preview: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn view(&self) -> Option<PopupView> {
        self.popup.as_ref().map(Popup::view)
    }

    /// "Make connector": names the selected node as a connector, renames it when it
    /// already is one, or creates a free connector when nothing is selected.
    pub fn make_connector<G: HostGraph + ?Sized>(&mut self, graph: &mut G) {
        let node = graph.selected_nodes().first().copied();
        self.open(graph, PopupRequest::Naming { node }, None);
    }

    /// "Connect connectors" and, with `force_ui`, "Force connect connectors".
    pub fn connect_selected<G: HostGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        force_ui: bool,
    ) -> Resolution {
        self.close_popup(graph);

        let registry = list_connectors(graph);
        report_duplicates(graph, &registry);
        let selection = graph.selected_nodes();

        let resolution = {
            let mut scope = UndoScope::begin(graph, UNDO_EVENT_TEXT);
            resolve_context(&mut *scope, &self.settings, &registry, &selection, force_ui)
        };

        if let Resolution::Open(request) = &resolution {
            self.open(graph, request.clone(), Some(registry));
        }
        resolution
    }

    /// Feeds one input event to the live popup and applies what it asks for.
    pub fn handle_event<G: HostGraph + ?Sized>(&mut self, graph: &mut G, event: &PopupEvent) {
        let Some(mut popup) = self.popup.take() else {
            return;
        };
        let mut effects = popup.handle(event);
        if effects.iter().any(Effect::closes) {
            effects.extend(popup.teardown());
        } else {
            self.popup = Some(popup);
        }
        self.apply(graph, effects);
    }

    /// Tears down the live popup, flushing pending work first.
    pub fn close_popup<G: HostGraph + ?Sized>(&mut self, graph: &mut G) {
        self.restore_preview(graph);
        if let Some(mut popup) = self.popup.take() {
            debug!("Closing {:?} popup", popup.kind());
            let effects = popup.teardown();
            self.apply(graph, effects);
        }
    }

    /// Frames the connector a proxy belongs to. Wired to the proxy's jump button.
    pub fn jump_to_source<G: HostGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        proxy: NodeId,
    ) -> Result<NodeId> {
        jump_to_source(graph, proxy)
    }

    fn open<G: HostGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        request: PopupRequest,
        registry: Option<ConnectorRegistry>,
    ) {
        self.close_popup(graph);

        let popup = match request {
            PopupRequest::Picker { target } => {
                let registry = registry.unwrap_or_else(|| {
                    let registry = list_connectors(graph);
                    report_duplicates(graph, &registry);
                    registry
                });
                let buttons = registry
                    .into_connectors()
                    .into_iter()
                    .map(|connector| {
                        let class_default = graph
                            .class(connector.id)
                            .map(|class| graph.default_node_color(&class))
                            .unwrap_or_default();
                        ConnectorButton {
                            color: display_color(connector.tile_color, class_default),
                            connector,
                        }
                    })
                    .collect();
                Popup::Picker(PickerPopup::new(target, buttons))
            }
            PopupRequest::ConnectorOptions { connectors } => {
                Popup::ConnectorOptions(ConnectorOptionsPopup::new(connectors))
            }
            PopupRequest::ChildrenOptions { proxy } => Popup::ChildrenOptions(
                ChildrenOptionsPopup::new(proxy, source_connector(graph, proxy)),
            ),
            PopupRequest::Color { connectors } => Popup::Color(ColorPopup::new(connectors)),
            PopupRequest::Naming { node } => {
                let previous = node
                    .filter(|id| is_connector(graph, *id))
                    .map(|id| graph.label(id))
                    .unwrap_or_default();
                Popup::Naming(NamingPopup::new(node, previous))
            }
        };
        debug!("Opened {:?} popup", popup.kind());
        self.popup = Some(popup);
    }

    /// Puts the viewer back the way it was before any preview.
    fn restore_preview<G: HostGraph + ?Sized>(&mut self, graph: &mut G) {
        if let Some(preview) = self.preview.take() {
            preview.restore(graph);
        }
    }

    fn apply<G: HostGraph + ?Sized>(&mut self, graph: &mut G, effects: Vec<Effect>) {
        // Restore ahead of the undo scope so its snapshot never holds a preview wire.
        let (restores, effects): (Vec<Effect>, Vec<Effect>) = effects
            .into_iter()
            .partition(|effect| matches!(effect, Effect::PreviewRestore));
        if !restores.is_empty() {
            self.restore_preview(graph);
        }
        if effects.is_empty() {
            return;
        }
        let next = if effects.iter().any(Effect::is_mutation) {
            let mut scope = UndoScope::begin(graph, UNDO_EVENT_TEXT);
            self.apply_all(&mut *scope, effects)
        } else {
            self.apply_all(graph, effects)
        };
        if let Some(request) = next {
            self.open(graph, request, None);
        }
    }

    /// Applies effects in order; returns the popup to open afterwards, if any.
    fn apply_all<G: HostGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        effects: Vec<Effect>,
    ) -> Option<PopupRequest> {
        let mut next = None;
        for effect in effects {
            match effect {
                Effect::Open(request) => next = Some(request),
                Effect::Close => {}
                effect => {
                    if let Err(e) = self.apply_one(graph, effect) {
                        report_error(graph, e);
                    }
                }
            }
        }
        next
    }

    fn apply_one<G: HostGraph + ?Sized>(&mut self, graph: &mut G, effect: Effect) -> Result<()> {
        match effect {
            Effect::Connect { connector, target } => {
                create_proxy_and_connect(graph, &self.settings, &connector, target)?;
            }
            Effect::Jump { node } => jump_keeping_selection(graph, node),
            Effect::CreateMany { connectors } => {
                let created = create_many(graph, &self.settings, &connectors)?;
                info!("Created {} connected nodes", created.len());
            }
            Effect::MakeConnector {
                node,
                text,
                previous,
            } => {
                make_connector(graph, &self.settings, node, &text, &previous)?;
            }
            Effect::SetColor { connectors, color } => {
                set_connector_color(graph, &self.settings, &connectors, color)?;
            }
            Effect::SelectDependents { connectors } => select_dependents(graph, &connectors),
            Effect::PreviewShow { connector } => match self.preview.as_mut() {
                Some(preview) => preview.switch(graph, connector)?,
                None => self.preview = Some(ViewerPreview::show(graph, connector)?),
            },
            Effect::PreviewRestore => self.restore_preview(graph),
            Effect::Open(_) | Effect::Close => {}
        }
        Ok(())
    }
}

fn report_duplicates<G: HostGraph + ?Sized>(graph: &mut G, registry: &ConnectorRegistry) {
    if !registry.duplicates().is_empty() {
        graph.message(&registry.duplicates().message());
    }
}

fn report_error<G: HostGraph + ?Sized>(graph: &mut G, error: ConnectorError) {
    match error {
        ConnectorError::LabelInUse(_) => {
            warn!("{}", error);
            graph.message(&error.to_string());
        }
        error if error.is_silent() => debug!("Ignored: {}", error),
        error => warn!("Label Connector: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryGraph, NodeGraphEditor, NodeGraphSource};
    use crate::model::Position;
    use crate::popup::{ClickTarget, Key, PopupAction, PopupKind};

    fn graph_with_connector(label: &str) -> (MemoryGraph, NodeId) {
        let mut graph = MemoryGraph::new();
        let id = graph
            .add_node("Dot", "Connector", label, Position::new(0, 0))
            .unwrap();
        (graph, id)
    }

    #[test]
    fn opening_a_popup_replaces_the_previous_one() {
        let (mut graph, _) = graph_with_connector("PLATE");
        let mut session = ConnectorSession::default();

        session.connect_selected(&mut graph, false);
        assert_eq!(session.popup().map(Popup::kind), Some(PopupKind::Picker));

        session.make_connector(&mut graph);
        assert_eq!(session.popup().map(Popup::kind), Some(PopupKind::Naming));
    }

    #[test]
    fn make_connector_prefills_the_label_of_a_selected_connector() {
        let (mut graph, id) = graph_with_connector("PLATE");
        graph.set_selected(id, true);
        let mut session = ConnectorSession::default();

        session.make_connector(&mut graph);

        assert_eq!(
            session.view().and_then(|v| v.text_field).as_deref(),
            Some("PLATE")
        );
    }

    #[test]
    fn label_in_use_is_reported_to_the_user() {
        let (mut graph, _) = graph_with_connector("PLATE");
        let mut session = ConnectorSession::default();

        session.make_connector(&mut graph);
        session.handle_event(&mut graph, &PopupEvent::TextEdited("plate".into()));
        session.handle_event(&mut graph, &PopupEvent::key(Key::Enter));

        assert_eq!(graph.messages(), &["Label already in use: PLATE".to_string()]);
        assert_eq!(graph.undo_steps(), 0);
        assert!(!session.is_open());
    }

    #[test]
    fn options_click_reopens_as_connector_options() {
        let (mut graph, id) = graph_with_connector("PLATE");
        let mut session = ConnectorSession::default();
        session.connect_selected(&mut graph, false);

        session.handle_event(
            &mut graph,
            &PopupEvent::click_with(
                ClickTarget::Connector(id),
                crate::popup::Modifiers::ALT,
            ),
        );

        assert_eq!(
            session.popup().map(Popup::kind),
            Some(PopupKind::ConnectorOptions)
        );
        session.handle_event(
            &mut graph,
            &PopupEvent::click(ClickTarget::Action(PopupAction::Colorize)),
        );
        assert_eq!(session.popup().map(Popup::kind), Some(PopupKind::Color));
    }

    #[test]
    fn duplicate_labels_are_reported_once_per_invocation() {
        let (mut graph, _) = graph_with_connector("PLATE");
        graph
            .add_node("Dot", "Connector", "PLATE", Position::default())
            .unwrap();
        let mut session = ConnectorSession::default();

        session.connect_selected(&mut graph, false);

        assert_eq!(graph.messages().len(), 1);
        assert!(graph.messages()[0].starts_with("Skipped following Connectors"));
    }

    #[test]
    fn viewer_preview_is_restored_on_escape_without_undo_step() {
        let (mut graph, id) = graph_with_connector("PLATE");
        let read = graph.create_node("Read").unwrap();
        let viewer = graph.create_node("Viewer").unwrap();
        assert!(graph.set_viewer_input(viewer, 0, Some(read)));
        graph.set_active_viewer(viewer, Some(0));
        let mut session = ConnectorSession::default();
        session.connect_selected(&mut graph, false);

        session.handle_event(&mut graph, &PopupEvent::right_click(ClickTarget::Connector(id)));
        assert_eq!(graph.input(viewer, 0), Some(id));

        session.handle_event(&mut graph, &PopupEvent::key(Key::Escape));
        assert_eq!(graph.input(viewer, 0), Some(read));
        assert!(!session.is_open());
        assert_eq!(graph.undo_steps(), 0);
    }

    #[test]
    fn preview_without_viewer_is_ignored() {
        let (mut graph, id) = graph_with_connector("PLATE");
        let mut session = ConnectorSession::default();
        session.connect_selected(&mut graph, false);

        session.handle_event(&mut graph, &PopupEvent::right_click(ClickTarget::Connector(id)));

        assert!(session.is_open());
        assert!(graph.messages().is_empty());
    }
}
