//! Canvas for the in-memory node graph: draws nodes and wires, handles
//! selection, node dragging and panning, and follows `zoom_to_selection`.

use egui::{Align2, Color32, FontId, PointerButton, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use label_connector::color::is_automatic;
use label_connector::model::{classes, knobs};
use label_connector::{KnobValue, MemoryGraph, NodeGraphEditor, NodeGraphSource, NodeId, Position};
use log::warn;

use super::{packed_color32, text_color_on};

const WIRE_COLOR: Color32 = Color32::from_gray(160);
const HIDDEN_WIRE_COLOR: Color32 = Color32::from_gray(70);
const SELECTION_COLOR: Color32 = Color32::from_rgb(255, 160, 40);

#[derive(Default)]
pub struct GraphView {
    pan: Vec2,
    framed: usize,
    drag_remainder: Vec2,
}

impl GraphView {
    /// Draws the graph. Returns the proxy whose jump control was double-clicked.
    pub fn show(&mut self, ui: &mut Ui, graph: &mut MemoryGraph) -> Option<NodeId> {
        let (rect, background) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(38));

        self.follow_zoom(graph, rect);
        if background.dragged_by(PointerButton::Primary) || background.dragged_by(PointerButton::Middle) {
            self.pan += background.drag_delta();
        }
        if background.clicked() {
            graph.clear_selection();
        }

        let origin = rect.min + self.pan;
        if let Some(pointer) = ui.input(|i| i.pointer.hover_pos()).filter(|p| rect.contains(*p)) {
            let local = pointer - origin;
            graph.set_cursor(Position::new(local.x.round() as i32, local.y.round() as i32));
        }

        let node_rects: Vec<(NodeId, Rect)> = graph
            .all_nodes()
            .into_iter()
            .filter_map(|id| Some((id, node_rect(graph, id, origin)?)))
            .collect();
        let rect_of = |id: NodeId| node_rects.iter().find(|(n, _)| *n == id).map(|(_, r)| *r);

        for (id, target) in &node_rects {
            let hidden = graph.knob(*id, knobs::HIDE_INPUT).and_then(|v| v.as_bool()) == Some(true);
            let color = if hidden { HIDDEN_WIRE_COLOR } else { WIRE_COLOR };
            let inputs = graph.node(*id).map(|n| n.inputs.len()).unwrap_or(0);
            for slot in 0..inputs {
                let Some(source) = graph.input(*id, slot).and_then(rect_of) else {
                    continue;
                };
                painter.line_segment([source.center_bottom(), target.center_top()], Stroke::new(1.5, color));
            }
        }

        let mut jump = None;
        for (id, node_rect) in &node_rects {
            self.draw_node(ui, &painter, graph, *id, *node_rect);
            let response = ui.interact(*node_rect, ui.id().with(id), Sense::click_and_drag());
            if response.clicked() {
                let additive = ui.input(|i| i.modifiers.shift);
                let selected = graph.node(*id).is_some_and(|n| n.selected);
                if !additive {
                    graph.clear_selection();
                }
                graph.set_selected(*id, !(additive && selected));
            }
            if response.double_clicked() && graph.has_knob(*id, knobs::JUMP_TO_SOURCE) {
                jump = Some(*id);
            }
            if response.dragged_by(PointerButton::Primary) {
                self.move_node(graph, *id, response.drag_delta());
            }
        }
        jump
    }

    fn draw_node(&self, ui: &Ui, painter: &egui::Painter, graph: &MemoryGraph, id: NodeId, rect: Rect) {
        let Some(record) = graph.node(id) else {
            return;
        };
        let class_default = graph.default_node_color(&record.class);
        let tile = graph.tile_color(id);
        let fill = packed_color32(if is_automatic(tile, class_default) {
            class_default
        } else {
            tile
        });
        let stroke = if record.selected {
            Stroke::new(2.0, SELECTION_COLOR)
        } else {
            Stroke::new(1.0, Color32::BLACK)
        };
        let label = graph.label(id);

        if record.class == classes::DOT {
            painter.circle(rect.center(), rect.width() / 2.0, fill, stroke);
            if !label.is_empty() {
                let size = graph
                    .knob(id, knobs::NOTE_FONT_SIZE)
                    .and_then(|v| match v {
                        KnobValue::Int(i) => Some(i as f32),
                        _ => None,
                    })
                    .unwrap_or(11.0);
                painter.text(
                    rect.right_center() + Vec2::new(6.0, 0.0),
                    Align2::LEFT_CENTER,
                    &label,
                    FontId::proportional(size * 0.6),
                    ui.visuals().strong_text_color(),
                );
            }
            return;
        }

        painter.rect_filled(rect, 3.0, fill);
        painter.rect_stroke(rect, 3.0, stroke, egui::StrokeKind::Inside);
        let text_color = text_color_on(fill);
        painter.text(
            Pos2::new(rect.center().x, rect.top() + 9.0),
            Align2::CENTER_CENTER,
            &record.name,
            FontId::proportional(11.0),
            text_color,
        );
        if !label.is_empty() {
            painter.text(
                Pos2::new(rect.center().x, rect.bottom() + 8.0),
                Align2::CENTER_CENTER,
                &label,
                FontId::proportional(11.0),
                ui.visuals().text_color(),
            );
        }
    }

    fn move_node(&mut self, graph: &mut MemoryGraph, id: NodeId, delta: Vec2) {
        self.drag_remainder += delta;
        let step = Vec2::new(self.drag_remainder.x.trunc(), self.drag_remainder.y.trunc());
        if step == Vec2::ZERO {
            return;
        }
        self.drag_remainder -= step;
        let Some(position) = graph.position(id) else {
            return;
        };
        if let Err(e) = graph.set_position(id, position.offset(step.x as i32, step.y as i32)) {
            warn!("Could not move node: {}", e);
        }
    }

    /// Centers the view on the newest `zoom_to_selection` request.
    fn follow_zoom(&mut self, graph: &MemoryGraph, rect: Rect) {
        let history = graph.zoom_history();
        if history.len() <= self.framed {
            return;
        }
        self.framed = history.len();
        let Some(bounds) = history
            .last()
            .into_iter()
            .flatten()
            .filter_map(|id| node_rect(graph, *id, Pos2::ZERO))
            .reduce(|a, b| a.union(b))
        else {
            return;
        };
        self.pan = rect.size() / 2.0 - bounds.center().to_vec2();
    }
}

fn node_rect(graph: &MemoryGraph, id: NodeId, origin: Pos2) -> Option<Rect> {
    let position = graph.position(id)?;
    let size = graph.screen_size(id);
    Some(Rect::from_min_size(
        origin + Vec2::new(position.x as f32, position.y as f32),
        Vec2::new(size.width as f32, size.height as f32),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_request_centers_the_selection() {
        let mut graph = MemoryGraph::new();
        let id = graph
            .add_node("Grade", "Grade1", "", Position::new(500, 300))
            .unwrap();
        graph.set_selected(id, true);
        graph.zoom_to_selection();

        let mut view = GraphView::default();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        view.follow_zoom(&graph, rect);

        let framed = node_rect(&graph, id, rect.min + view.pan).unwrap();
        assert_eq!(framed.center(), rect.center());
    }

    #[test]
    fn small_drags_accumulate_before_moving() {
        let mut graph = MemoryGraph::new();
        let id = graph
            .add_node("Grade", "Grade1", "", Position::new(0, 0))
            .unwrap();
        let mut view = GraphView::default();

        view.move_node(&mut graph, id, Vec2::new(0.6, 0.0));
        assert_eq!(graph.position(id), Some(Position::new(0, 0)));
        view.move_node(&mut graph, id, Vec2::new(0.6, 0.0));
        assert_eq!(graph.position(id), Some(Position::new(1, 0)));
    }
}
