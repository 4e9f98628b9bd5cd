//! Projection of the map onto the screen.
//!
//! [`build_scene`] turns the model, the viewport and the interaction state into a
//! flat list of positioned shapes. It is rebuilt every frame, so any mutation is
//! visible in the frame that made it. The geometry helpers here are shared with
//! hit testing so what is drawn is exactly what can be clicked.

use crate::constants::*;
use crate::interaction::{GestureMode, HitTarget, InteractionController, NodeAction, ZoneAction};
use crate::stage::{badge_text, Stage};
use crate::transform::Viewport;
use crate::types::*;
use egui::{pos2, vec2, Pos2, Rect};

/// Number of straight segments used to approximate a connection curve.
pub const CURVE_SEGMENTS: usize = 24;

/// One evolution stage column.
#[derive(Debug, Clone, PartialEq)]
pub struct BandShape {
    /// Which stage the column represents
    pub stage: Stage,
    /// Screen-space extent of the column
    pub rect: Rect,
    /// Title drawn at the top, if stage labels are enabled
    pub label: Option<&'static str>,
}

/// A clickable button drawn on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonShape<A> {
    /// What pressing the button does
    pub action: A,
    /// Screen-space bounds
    pub rect: Rect,
    /// Caption
    pub label: &'static str,
    /// Disabled buttons are drawn greyed out
    pub enabled: bool,
}

/// A zone rectangle with its hover affordances.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneShape {
    /// Zone id
    pub id: ZoneId,
    /// Zone kind, which selects its color
    pub zone_type: ZoneType,
    /// Screen-space bounds
    pub rect: Rect,
    /// Whether the pointer is over the zone
    pub hovered: bool,
    /// Note text shown as a badge
    pub note: Option<String>,
    /// Resize handles (only while hovered)
    pub handles: Vec<(Corner, Rect)>,
    /// Note/Delete buttons (only while hovered)
    pub buttons: Vec<ButtonShape<ZoneAction>>,
}

/// A dependency drawn as a cubic Bézier curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionShape {
    /// The connection being drawn
    pub connection: Connection,
    /// Start, two control points, end
    pub curve: [Pos2; 4],
    /// Whether the connection is selected
    pub selected: bool,
}

/// An evolution projection arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowShape {
    /// The evolving node
    pub node: NodeId,
    /// Start point on the node's edge
    pub from: Pos2,
    /// Arrow head at the evolution target
    pub to: Pos2,
    /// Target stage title
    pub label: &'static str,
    /// Whether the head is hovered or being dragged
    pub active: bool,
}

/// A component box.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    /// Node id
    pub id: NodeId,
    /// Screen-space bounds
    pub rect: Rect,
    /// Component name
    pub label: String,
    /// Stage badge text, e.g. `genesis → custom`
    pub badge: String,
    /// Note text shown as a badge
    pub note: Option<String>,
    /// Whether the pointer is over the node or its action bar
    pub hovered: bool,
    /// Whether the node is the source of a pending connection
    pub pending_source: bool,
    /// Whether the node is evolving
    pub evolving: bool,
    /// Action bar buttons (only while hovered and idle)
    pub actions: Vec<ButtonShape<NodeAction>>,
}

/// Everything needed to paint one frame of the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Current zoom, for scaling text and strokes
    pub zoom: f32,
    /// Stage columns, left to right
    pub bands: Vec<BandShape>,
    /// Zones, bottom-most first
    pub zones: Vec<ZoneShape>,
    /// Connection curves
    pub connections: Vec<ConnectionShape>,
    /// Evolution arrows
    pub arrows: Vec<ArrowShape>,
    /// Nodes, bottom-most first
    pub nodes: Vec<NodeShape>,
    /// Line from the pending connection source to the pointer
    pub preview: Option<(Pos2, Pos2)>,
}

impl Scene {
    /// Every piece of text in the scene, in paint order.
    pub fn texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self.bands.iter().filter_map(|b| b.label.map(str::to_string)).collect();
        for zone in &self.zones {
            texts.push(zone.zone_type.as_str().to_string());
            texts.extend(zone.note.clone());
        }
        for arrow in &self.arrows {
            texts.push(arrow.label.to_string());
        }
        for node in &self.nodes {
            texts.push(node.label.clone());
            texts.push(node.badge.clone());
            texts.extend(node.actions.iter().map(|a| a.label.to_string()));
        }
        texts
    }
}

/// Screen-space bounds of a node.
pub fn node_screen_rect(node: &Node, viewport: &Viewport) -> Rect {
    viewport.canvas_rect_to_screen(node.rect())
}

/// The hover action bar sitting directly on top of a node.
pub fn node_action_buttons(node: &Node, viewport: &Viewport) -> Vec<ButtonShape<NodeAction>> {
    let rect = node_screen_rect(node, viewport);
    let actions = [NodeAction::Evolve, NodeAction::Connect, NodeAction::Note, NodeAction::Delete];
    let total = ACTION_BUTTON_WIDTH * actions.len() as f32;
    let left = rect.center().x - total / 2.0;
    let top = rect.min.y - ACTION_BAR_HEIGHT;
    actions
        .into_iter()
        .enumerate()
        .map(|(i, action)| {
            let min = pos2(left + i as f32 * ACTION_BUTTON_WIDTH, top);
            let (label, enabled) = match action {
                NodeAction::Evolve if node.evolving => ("✓ Evolving", true),
                NodeAction::Evolve => ("Evolve", node.stage.next().is_some()),
                NodeAction::Connect => ("Connect", true),
                NodeAction::Note => ("Note", true),
                NodeAction::Delete => ("Delete", true),
            };
            ButtonShape {
                action,
                rect: Rect::from_min_size(min, vec2(ACTION_BUTTON_WIDTH, ACTION_BAR_HEIGHT)),
                label,
                enabled,
            }
        })
        .collect()
}

/// Resize handles centred on each corner of a zone.
pub fn zone_handles(zone: &Zone, viewport: &Viewport) -> Vec<(Corner, Rect)> {
    let rect = viewport.canvas_rect_to_screen(zone.rect());
    Corner::ALL
        .into_iter()
        .map(|corner| (corner, Rect::from_center_size(corner.point(rect), vec2(HANDLE_SIZE, HANDLE_SIZE))))
        .collect()
}

/// Note and Delete buttons inside the top-right corner of a zone.
pub fn zone_buttons(zone: &Zone, viewport: &Viewport) -> Vec<ButtonShape<ZoneAction>> {
    let rect = viewport.canvas_rect_to_screen(zone.rect());
    let size = vec2(ZONE_BUTTON_SIZE, ZONE_BUTTON_SIZE);
    let inset = 4.0;
    let delete = Rect::from_min_size(pos2(rect.max.x - inset - ZONE_BUTTON_SIZE, rect.min.y + inset), size);
    let note = delete.translate(vec2(-(ZONE_BUTTON_SIZE + inset), 0.0));
    vec![
        ButtonShape {
            action: ZoneAction::Note,
            rect: note,
            label: "📝",
            enabled: true,
        },
        ButtonShape {
            action: ZoneAction::Delete,
            rect: delete,
            label: "✕",
            enabled: true,
        },
    ]
}

/// Screen position of an evolving node's arrow head.
pub fn arrow_head(node: &Node, viewport: &Viewport) -> Option<Pos2> {
    let target_x = node.evolution_target_x.filter(|_| node.evolving)?;
    Some(viewport.canvas_to_screen(pos2(target_x, node.y)))
}

/// Where the segment from the center of `rect` toward `toward` leaves the rectangle.
pub fn boundary_point(rect: Rect, toward: Pos2) -> Pos2 {
    let center = rect.center();
    let d = toward - center;
    if d.x.abs() < f32::EPSILON && d.y.abs() < f32::EPSILON {
        return center;
    }
    let half = rect.size() / 2.0;
    let tx = if d.x.abs() > f32::EPSILON { half.x / d.x.abs() } else { f32::INFINITY };
    let ty = if d.y.abs() > f32::EPSILON { half.y / d.y.abs() } else { f32::INFINITY };
    let t = tx.min(ty).min(1.0);
    center + d * t
}

/// Bézier control points for a connection between two boxes.
///
/// The curve leaves and enters vertically, which reads naturally for the
/// top-to-bottom value chain of a map.
pub fn connection_curve(from: Rect, to: Rect) -> [Pos2; 4] {
    let a = boundary_point(from, to.center());
    let b = boundary_point(to, from.center());
    let dy = b.y - a.y;
    [a, pos2(a.x, a.y + dy / 2.0), pos2(b.x, b.y - dy / 2.0), b]
}

/// Evaluates a cubic Bézier curve at `t` in `[0, 1]`.
pub fn bezier_point(curve: &[Pos2; 4], t: f32) -> Pos2 {
    let u = 1.0 - t;
    let w = [u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t];
    let mut p = Pos2::ZERO;
    for (point, weight) in curve.iter().zip(w) {
        p += point.to_vec2() * weight;
    }
    p
}

/// Shortest distance from `point` to the segment `start`-`end`.
pub fn point_to_segment_distance(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let line_vec = end - start;
    let point_vec = point - start;
    let line_len_sq = line_vec.length_sq();
    if line_len_sq < 0.0001 {
        return point_vec.length();
    }
    // Project point onto the segment, clamped to its endpoints
    let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    (point - (start + line_vec * t)).length()
}

/// Shortest distance from `point` to a sampled Bézier curve.
pub fn curve_distance(curve: &[Pos2; 4], point: Pos2) -> f32 {
    let mut previous = curve[0];
    let mut best = f32::INFINITY;
    for i in 1..=CURVE_SEGMENTS {
        let next = bezier_point(curve, i as f32 / CURVE_SEGMENTS as f32);
        best = best.min(point_to_segment_distance(point, previous, next));
        previous = next;
    }
    best
}

/// Screen-space curve of a connection, if both endpoints exist.
pub fn connection_screen_curve(map: &WardleyMap, viewport: &Viewport, connection: &Connection) -> Option<[Pos2; 4]> {
    let from = map.node(connection.from)?;
    let to = map.node(connection.to)?;
    Some(connection_curve(
        node_screen_rect(from, viewport),
        node_screen_rect(to, viewport),
    ))
}

/// Builds the full scene for one frame.
///
/// # Arguments
///
/// * `map` - The document to draw
/// * `viewport` - Current pan and zoom
/// * `controller` - Hover, selection and gesture state
/// * `show_stage_labels` - Whether to title the stage columns
pub fn build_scene(
    map: &WardleyMap,
    viewport: &Viewport,
    controller: &InteractionController,
    show_stage_labels: bool,
) -> Scene {
    let idle = controller.mode() == GestureMode::Idle;
    let hover = controller.hover();

    let bands = Stage::ALL
        .into_iter()
        .map(|stage| {
            let (start, end) = stage.band();
            let rect = Rect::from_min_max(pos2(start, 0.0), pos2(end, CANVAS_HEIGHT));
            BandShape {
                stage,
                rect: viewport.canvas_rect_to_screen(rect),
                label: show_stage_labels.then(|| stage.label()),
            }
        })
        .collect();

    let zones = map
        .zones()
        .iter()
        .map(|zone| {
            let hovered = hover.zone == Some(zone.id);
            let show_controls = hovered && idle;
            ZoneShape {
                id: zone.id,
                zone_type: zone.zone_type,
                rect: viewport.canvas_rect_to_screen(zone.rect()),
                hovered,
                note: zone.note.clone(),
                handles: if show_controls { zone_handles(zone, viewport) } else { Vec::new() },
                buttons: if show_controls { zone_buttons(zone, viewport) } else { Vec::new() },
            }
        })
        .collect();

    let connections = map
        .connections()
        .iter()
        .filter_map(|connection| {
            let curve = connection_screen_curve(map, viewport, connection)?;
            Some(ConnectionShape {
                connection: *connection,
                curve,
                selected: controller.selected_connection() == Some(*connection),
            })
        })
        .collect();

    let arrows = map
        .nodes()
        .iter()
        .filter_map(|node| {
            let to = arrow_head(node, viewport)?;
            let rect = node_screen_rect(node, viewport);
            let from = if to.x >= rect.center().x {
                rect.right_center()
            } else {
                rect.left_center()
            };
            let active = matches!(hover.target, HitTarget::EvolutionArrow(id) if id == node.id)
                || controller.dragging_arrow() == Some(node.id);
            Some(ArrowShape {
                node: node.id,
                from,
                to,
                label: node.evolving_to.unwrap_or(node.stage).label(),
                active,
            })
        })
        .collect();

    let pending = controller.pending_source();
    let nodes = map
        .nodes()
        .iter()
        .map(|node| {
            let hovered = hover.node == Some(node.id);
            NodeShape {
                id: node.id,
                rect: node_screen_rect(node, viewport),
                label: node.label.clone(),
                badge: badge_text(node.stage, node.evolving_to.filter(|_| node.evolving)),
                note: node.note.clone(),
                hovered,
                pending_source: pending == Some(node.id),
                evolving: node.evolving,
                actions: if hovered && idle {
                    node_action_buttons(node, viewport)
                } else {
                    Vec::new()
                },
            }
        })
        .collect();

    let preview = pending.and_then(|id| {
        let node = map.node(id)?;
        let pointer = controller.pointer()?;
        Some((boundary_point(node_screen_rect(node, viewport), pointer), pointer))
    });

    Scene {
        zoom: viewport.zoom,
        bands,
        zones,
        connections,
        arrows,
        nodes,
        preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_for(map: &WardleyMap) -> Scene {
        build_scene(map, &Viewport::default(), &InteractionController::default(), true)
    }

    #[test]
    fn test_scene_has_four_labelled_bands() {
        let scene = scene_for(&WardleyMap::new());
        let labels: Vec<_> = scene.bands.iter().filter_map(|b| b.label).collect();
        assert_eq!(labels, vec!["Genesis", "Custom-Built", "Product", "Commodity"]);
        assert!(scene.nodes.is_empty());
    }

    #[test]
    fn test_scene_hides_labels_when_disabled() {
        let scene = build_scene(&WardleyMap::new(), &Viewport::default(), &InteractionController::default(), false);
        assert!(scene.bands.iter().all(|b| b.label.is_none()));
    }

    #[test]
    fn test_scene_follows_model() {
        let mut map = WardleyMap::new();
        let a = map.add_node("User", Stage::Genesis).unwrap();
        let b = map.add_node("Platform", Stage::Product).unwrap();
        map.add_connection(a, b);
        map.toggle_evolution(a).unwrap();
        let zone = map.add_zone(ZoneType::Opportunity);
        map.set_note(NoteTarget::Zone(zone), "grow here").unwrap();

        let scene = scene_for(&map);
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.connections.len(), 1);
        assert_eq!(scene.arrows.len(), 1);
        assert_eq!(scene.nodes[0].badge, "genesis → custom");
        assert_eq!(scene.arrows[0].label, "Custom-Built");
        let texts = scene.texts();
        assert!(texts.contains(&"User".to_string()));
        assert!(texts.contains(&"grow here".to_string()));
        assert!(texts.contains(&"opportunity".to_string()));
    }

    #[test]
    fn test_connection_recomputed_after_move() {
        let mut map = WardleyMap::new();
        let a = map.add_node("A", Stage::Genesis).unwrap();
        let b = map.add_node("B", Stage::Custom).unwrap();
        map.add_connection(a, b);
        let before = scene_for(&map).connections[0].curve;
        map.move_node(b, 900.0, 600.0).unwrap();
        let after = scene_for(&map).connections[0].curve;
        assert_ne!(before[3], after[3]);
        assert!(map.node(b).unwrap().rect().expand(0.5).contains(after[3]));
    }

    #[test]
    fn test_arrow_tracks_node_y() {
        let mut map = WardleyMap::new();
        let a = map.add_node("A", Stage::Custom).unwrap();
        map.toggle_evolution(a).unwrap();
        map.move_node(a, 700.0, 555.0).unwrap();
        let scene = scene_for(&map);
        assert_eq!(scene.arrows[0].to, pos2(Stage::Product.midpoint(), 555.0));
        assert_eq!(scene.arrows[0].from.y, 555.0);
    }

    #[test]
    fn test_scene_respects_zoom() {
        let mut map = WardleyMap::new();
        map.add_node("A", Stage::Genesis).unwrap();
        let mut viewport = Viewport::default();
        viewport.zoom_by(2.0, Pos2::ZERO);
        let scene = build_scene(&map, &viewport, &InteractionController::default(), true);
        assert!((scene.nodes[0].rect.width() - NODE_WIDTH * 2.0).abs() < 1e-3);
        assert!((scene.bands[0].rect.width() - STAGE_WIDTH * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_boundary_point_lies_on_edge() {
        let rect = Rect::from_center_size(pos2(0.0, 0.0), vec2(100.0, 40.0));
        assert_eq!(boundary_point(rect, pos2(0.0, 500.0)), pos2(0.0, 20.0));
        assert_eq!(boundary_point(rect, pos2(-500.0, 0.0)), pos2(-50.0, 0.0));
        assert_eq!(boundary_point(rect, pos2(10.0, 5.0)), pos2(10.0, 5.0));
    }

    #[test]
    fn test_curve_distance() {
        let curve = [pos2(0.0, 0.0), pos2(0.0, 50.0), pos2(0.0, 50.0), pos2(0.0, 100.0)];
        assert!(curve_distance(&curve, pos2(3.0, 40.0)) < 3.5);
        assert!(curve_distance(&curve, pos2(30.0, 40.0)) > 25.0);
    }

    #[test]
    fn test_action_bar_sits_above_node() {
        let mut map = WardleyMap::new();
        let id = map.add_node("A", Stage::Commodity).unwrap();
        let viewport = Viewport::default();
        let node = map.node(id).unwrap();
        let buttons = node_action_buttons(node, &viewport);
        let labels: Vec<_> = buttons.iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Evolve", "Connect", "Note", "Delete"]);
        assert!(!buttons[0].enabled, "commodity cannot evolve");
        let rect = node_screen_rect(node, &viewport);
        assert!(buttons.iter().all(|b| b.rect.max.y == rect.min.y));
    }
}
