//! Graph mutations behind every popup action.
//!
//! Nothing here opens an undo transaction; the gesture owner wraps the calls in
//! one [`crate::transaction::UndoScope`].

use log::{debug, warn};

use crate::color::{PROXY_NEUTRAL_COLOR, PaletteColor, AUTO_COLOR, is_automatic};
use crate::error::{ConnectorError, Result};
use crate::host::HostGraph;
use crate::markers::{is_connector, is_proxy};
use crate::model::{
    CONNECTED_KEY, CONNECTOR_KEY, Connector, KnobValue, NodeId, Position, classes, knobs,
    normalize_label,
};
use crate::registry::list_connector_labels;
use crate::settings::Settings;

/// Gap between a `NoOp` proxy and the node it feeds.
pub const NOOP_OFFSET: i32 = 50;
/// Gap between a thumbnail proxy and the node it feeds.
pub const THUMBNAIL_OFFSET: i32 = 100;
/// Gap between a node and a connector created below it.
pub const CONNECTOR_OFFSET: i32 = 50;
/// Horizontal pitch between proxies created in one multi-create.
pub const MULTI_CREATE_PITCH: i32 = 110;

/// Creates a proxy for `connector`, or re-targets `anchor` when it already is a proxy.
///
/// When `anchor` is any other node, the new proxy is placed above it and wired into
/// its input 0. A thumbnail proxy that cannot take the connector's stream is
/// replaced by a `NoOp` once. On failure every node created here is deleted again.
pub fn create_proxy_and_connect<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    connector: &Connector,
    anchor: Option<NodeId>,
) -> Result<NodeId> {
    let reused = anchor.filter(|id| is_proxy(graph, *id));
    let downstream = anchor.filter(|_| reused.is_none());

    let proxy = match reused {
        Some(id) => {
            if !graph.set_input(id, 0, Some(connector.id)) {
                warn!(
                    "Cannot re-target {:?} to connector '{}'",
                    graph.name(id),
                    connector.label
                );
                return Err(ConnectorError::WiringRejected { node: id, input: 0 });
            }
            id
        }
        None => create_wired_proxy(graph, settings, connector)?,
    };

    if let Some(node) = downstream {
        place_above(graph, proxy, node)?;
    }
    decorate_proxy(graph, settings, proxy, connector)?;

    if let Some(node) = downstream {
        if !graph.set_input(node, 0, Some(proxy)) {
            warn!(
                "{:?} rejected proxy for '{}', removing it",
                graph.name(node),
                connector.label
            );
            graph.delete_node(proxy)?;
            return Err(ConnectorError::WiringRejected { node, input: 0 });
        }
    }

    if reused.is_none() {
        graph.clear_selection();
        graph.set_selected(proxy, true);
    }
    Ok(proxy)
}

fn create_wired_proxy<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    connector: &Connector,
) -> Result<NodeId> {
    let class = settings.proxy_class();
    let proxy = graph.create_node(class)?;
    if graph.set_input(proxy, 0, Some(connector.id)) {
        return Ok(proxy);
    }

    let position = graph
        .position(proxy)
        .unwrap_or_else(|| graph.default_position());
    graph.delete_node(proxy)?;

    if class != classes::POSTAGE_STAMP {
        return Err(ConnectorError::WiringRejected {
            node: proxy,
            input: 0,
        });
    }

    debug!(
        "Thumbnail proxy rejected by '{}', falling back to {}",
        connector.label,
        classes::NOOP
    );
    let fallback = graph.create_node(classes::NOOP)?;
    graph.set_position(fallback, position)?;
    if !graph.set_input(fallback, 0, Some(connector.id)) {
        graph.delete_node(fallback)?;
        return Err(ConnectorError::WiringRejected {
            node: fallback,
            input: 0,
        });
    }
    Ok(fallback)
}

fn place_above<G: HostGraph + ?Sized>(graph: &mut G, proxy: NodeId, node: NodeId) -> Result<()> {
    let anchor = graph
        .position(node)
        .ok_or(ConnectorError::NodeNotFound(node))?;
    let node_width = graph.screen_size(node).width;
    let proxy_width = graph.screen_size(proxy).width;
    let offset = if graph.class(proxy).as_deref() == Some(classes::NOOP) {
        NOOP_OFFSET
    } else {
        THUMBNAIL_OFFSET
    };
    graph.set_position(
        proxy,
        Position::new(
            anchor.x + node_width / 2 - proxy_width / 2,
            anchor.y - offset,
        ),
    )
}

fn proxy_color(settings: &Settings, connector: &Connector) -> u32 {
    if settings.colorize_connected {
        connector.tile_color
    } else {
        PROXY_NEUTRAL_COLOR
    }
}

fn decorate_proxy<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    proxy: NodeId,
    connector: &Connector,
) -> Result<()> {
    if !is_proxy(graph, proxy) {
        graph.set_name(proxy, CONNECTED_KEY)?;
    }
    graph.set_knob(proxy, knobs::LABEL, KnobValue::Text(connector.label.clone()))?;
    graph.set_knob(
        proxy,
        knobs::TILE_COLOR,
        KnobValue::Color(proxy_color(settings, connector)),
    )?;
    graph.set_knob(proxy, knobs::HIDE_INPUT, KnobValue::Bool(true))?;
    if settings.proxy_controls {
        graph.set_knob(proxy, knobs::JUMP_TO_SOURCE, KnobValue::Button)?;
        graph.set_hidden_knob(
            proxy,
            knobs::CONNECTOR_REF,
            KnobValue::Text(connector.name.clone()),
        )?;
    }
    Ok(())
}

/// Wires an existing node straight to a connector and mirrors its label.
///
/// Proxies also take the connector's color and back reference.
pub fn connect_to_connector<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    node: NodeId,
    connector: &Connector,
) -> Result<()> {
    if !graph.set_input(node, 0, Some(connector.id)) {
        return Err(ConnectorError::WiringRejected { node, input: 0 });
    }
    graph.set_knob(node, knobs::LABEL, KnobValue::Text(connector.label.clone()))?;
    if is_proxy(graph, node) {
        graph.set_knob(
            node,
            knobs::TILE_COLOR,
            KnobValue::Color(proxy_color(settings, connector)),
        )?;
        if settings.proxy_controls {
            graph.set_hidden_knob(
                node,
                knobs::CONNECTOR_REF,
                KnobValue::Text(connector.name.clone()),
            )?;
        }
    }
    Ok(())
}

/// Fails with `LabelInUse` when another connector already holds `label`.
pub fn ensure_label_free<G: HostGraph + ?Sized>(graph: &G, label: &str, previous: &str) -> Result<()> {
    let label = normalize_label(label);
    if label != normalize_label(previous) && list_connector_labels(graph).contains(&label) {
        return Err(ConnectorError::LabelInUse(label));
    }
    Ok(())
}

fn is_anchor_class<G: HostGraph + ?Sized>(graph: &G, id: NodeId) -> bool {
    graph
        .class(id)
        .is_some_and(|class| classes::CONNECTOR_CLASSES.contains(&class.as_str()))
}

fn style_label<G: HostGraph + ?Sized>(graph: &mut G, settings: &Settings, id: NodeId) -> Result<()> {
    if settings.bold_labels {
        graph.set_knob(id, knobs::NOTE_FONT, KnobValue::Text("Bold".to_string()))?;
    }
    Ok(())
}

fn designate_connector<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    id: NodeId,
    label: &str,
) -> Result<()> {
    graph.set_name(id, CONNECTOR_KEY)?;
    graph.set_knob(id, knobs::NOTE_FONT_SIZE, KnobValue::Int(settings.label_font_size))?;
    graph.set_knob(id, knobs::LABEL, KnobValue::Text(label.to_string()))?;
    style_label(graph, settings, id)
}

/// Creates a connector, designates `node` as one, or renames it when it already is.
///
/// `previous` is the label the naming field was pre-filled with.
pub fn make_connector<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    node: Option<NodeId>,
    text: &str,
    previous: &str,
) -> Result<NodeId> {
    let label = normalize_label(text);
    if label.is_empty() {
        return Err(ConnectorError::EmptyLabel);
    }
    ensure_label_free(graph, &label, previous)?;

    match node {
        Some(id) if is_anchor_class(graph, id) && is_connector(graph, id) => {
            rename_connector(graph, settings, id, &label, previous)?;
            Ok(id)
        }
        Some(id) if is_anchor_class(graph, id) && !is_proxy(graph, id) => {
            designate_connector(graph, settings, id, &label)?;
            Ok(id)
        }
        Some(id) => {
            let origin = graph.position(id).ok_or(ConnectorError::NodeNotFound(id))?;
            let node_size = graph.screen_size(id);
            let dot = graph.create_node(classes::DOT)?;
            if !graph.set_input(dot, 0, Some(id)) {
                graph.delete_node(dot)?;
                return Err(ConnectorError::WiringRejected { node: dot, input: 0 });
            }
            let dot_width = graph.screen_size(dot).width;
            graph.set_position(
                dot,
                Position::new(
                    origin.x + node_size.width / 2 - dot_width / 2,
                    origin.y + node_size.height + CONNECTOR_OFFSET,
                ),
            )?;
            designate_connector(graph, settings, dot, &label)?;
            Ok(dot)
        }
        None => {
            let dot = graph.create_node(classes::DOT)?;
            designate_connector(graph, settings, dot, &label)?;
            Ok(dot)
        }
    }
}

/// Relabels a connector and every dependent still carrying `old_label`.
///
/// Walks the connector's dependents, which costs O(graph size) on most hosts.
pub fn rename_connector<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    connector: NodeId,
    new_label: &str,
    old_label: &str,
) -> Result<()> {
    let label = normalize_label(new_label);
    if label.is_empty() {
        return Err(ConnectorError::EmptyLabel);
    }
    ensure_label_free(graph, &label, old_label)?;

    graph.set_knob(connector, knobs::LABEL, KnobValue::Text(label.clone()))?;
    for dependent in graph.dependents(connector) {
        if graph.label(dependent) == old_label {
            graph.set_knob(dependent, knobs::LABEL, KnobValue::Text(label.clone()))?;
        }
    }
    style_label(graph, settings, connector)
}

fn has_custom_color<G: HostGraph + ?Sized>(graph: &G, id: NodeId, inherited: u32) -> bool {
    let color = graph.tile_color(id);
    let class_default = graph
        .class(id)
        .map(|class| graph.default_node_color(&class))
        .unwrap_or(AUTO_COLOR);
    !(is_automatic(color, class_default) || color == PROXY_NEUTRAL_COLOR || color == inherited)
}

/// Sets the tile color of connectors, resolving the palette's `Default` per class.
pub fn set_connector_color<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    connectors: &[NodeId],
    color: PaletteColor,
) -> Result<()> {
    for &id in connectors {
        let class = graph.class(id).ok_or(ConnectorError::NodeNotFound(id))?;
        let previous = graph.tile_color(id);
        let resolved = match color {
            PaletteColor::Packed(c) => c,
            PaletteColor::Default => graph.default_node_color(&class),
        };
        graph.set_knob(id, knobs::TILE_COLOR, KnobValue::Color(resolved))?;

        if !settings.cascade_color {
            continue;
        }
        let proxy_color = match color {
            PaletteColor::Packed(c) => c,
            PaletteColor::Default => AUTO_COLOR,
        };
        for dependent in graph.dependents(id) {
            if is_proxy(graph, dependent) && !has_custom_color(graph, dependent, previous) {
                graph.set_knob(dependent, knobs::TILE_COLOR, KnobValue::Color(proxy_color))?;
            }
        }
    }
    Ok(())
}

/// Replaces the selection with every dependent of the given connectors.
pub fn select_dependents<G: HostGraph + ?Sized>(graph: &mut G, connectors: &[NodeId]) {
    graph.clear_selection();
    for &connector in connectors {
        for dependent in graph.dependents(connector) {
            graph.set_selected(dependent, true);
        }
    }
}

/// Frames `node` in the view, leaving the previous selection as it was.
pub fn jump_keeping_selection<G: HostGraph + ?Sized>(graph: &mut G, node: NodeId) {
    let previous = graph.selected_nodes();
    graph.clear_selection();
    graph.set_selected(node, true);
    graph.zoom_to_selection();
    graph.set_selected(node, false);
    for id in previous {
        graph.set_selected(id, true);
    }
}

/// The connector a proxy belongs to: its hidden reference first, input 0 otherwise.
pub fn source_connector<G: HostGraph + ?Sized>(graph: &G, proxy: NodeId) -> Option<NodeId> {
    let by_reference = graph
        .knob(proxy, knobs::CONNECTOR_REF)
        .and_then(|v| v.as_text().map(str::to_string))
        .and_then(|name| {
            graph
                .all_nodes()
                .into_iter()
                .find(|id| graph.name(*id).as_deref() == Some(name.as_str()))
        })
        .filter(|id| is_connector(graph, *id));
    by_reference.or_else(|| graph.input(proxy, 0))
}

pub fn jump_to_source<G: HostGraph + ?Sized>(graph: &mut G, proxy: NodeId) -> Result<NodeId> {
    let source = source_connector(graph, proxy).ok_or(ConnectorError::NodeNotFound(proxy))?;
    jump_keeping_selection(graph, source);
    Ok(source)
}

/// One free proxy per connector, laid out left to right from the first one.
///
/// All-or-nothing: a failure removes every proxy created by this call.
pub fn create_many<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    connectors: &[Connector],
) -> Result<Vec<NodeId>> {
    let mut created: Vec<NodeId> = Vec::with_capacity(connectors.len());
    let mut origin: Option<Position> = None;

    for (i, connector) in connectors.iter().enumerate() {
        let step = create_proxy_and_connect(graph, settings, connector, None).and_then(|id| {
            created.push(id);
            match origin {
                None => {
                    origin = Some(graph.position(id).unwrap_or_else(|| graph.default_position()));
                    Ok(())
                }
                Some(first) => graph.set_position(id, first.offset(MULTI_CREATE_PITCH * i as i32, 0)),
            }
        });
        if let Err(e) = step {
            for id in created {
                if let Err(rollback) = graph.delete_node(id) {
                    warn!("Could not remove {:?} while rolling back: {}", id, rollback);
                }
            }
            return Err(e);
        }
    }

    graph.clear_selection();
    for &id in &created {
        graph.set_selected(id, true);
    }
    Ok(created)
}

/// A viewer input temporarily showing a connector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerPreview {
    pub viewer: NodeId,
    pub slot: usize,
    pub previous: Option<NodeId>,
    pub showing: NodeId,
}

impl ViewerPreview {
    pub fn show<G: HostGraph + ?Sized>(graph: &mut G, connector: NodeId) -> Result<Self> {
        let viewer = graph.active_viewer().ok_or(ConnectorError::ViewerUnavailable)?;
        let slot = graph
            .active_viewer_input(viewer)
            .ok_or(ConnectorError::ViewerUnavailable)?;
        let previous = graph.input(viewer, slot);
        if !graph.set_viewer_input(viewer, slot, Some(connector)) {
            return Err(ConnectorError::ViewerUnavailable);
        }
        graph.activate_viewer_input(viewer, slot);
        Ok(Self {
            viewer,
            slot,
            previous,
            showing: connector,
        })
    }

    /// Shows another connector, keeping the original restore point.
    pub fn switch<G: HostGraph + ?Sized>(&mut self, graph: &mut G, connector: NodeId) -> Result<()> {
        if !graph.set_viewer_input(self.viewer, self.slot, Some(connector)) {
            return Err(ConnectorError::ViewerUnavailable);
        }
        self.showing = connector;
        Ok(())
    }

    pub fn restore<G: HostGraph + ?Sized>(self, graph: &mut G) {
        if graph.set_viewer_input(self.viewer, self.slot, self.previous) {
            graph.activate_viewer_input(self.viewer, self.slot);
        } else {
            debug!("Viewer {} is gone, nothing to restore", self.viewer);
        }
    }
}
