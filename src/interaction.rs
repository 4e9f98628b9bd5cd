//! Pointer and keyboard gesture state machine.
//!
//! The controller turns low-level input (press, move, release, wheel, keys) at
//! canvas-local screen positions into model mutations. It never touches egui
//! input types, so it can be driven directly from tests.
//!
//! Exactly one gesture is active at a time. Drags update the model live and
//! produce a single [`UndoAction`] when the pointer is released.

use crate::constants::*;
use crate::render::{
    arrow_head, connection_screen_curve, curve_distance, node_action_buttons, node_screen_rect, zone_buttons,
    zone_handles,
};
use crate::transform::Viewport;
use crate::types::*;
use crate::undo::UndoAction;
use egui::{pos2, Pos2, Vec2};

/// Buttons in a node's hover action bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAction {
    /// Toggle the evolution projection
    Evolve,
    /// Start a connection from this node
    Connect,
    /// Edit the node's note
    Note,
    /// Delete the node
    Delete,
}

/// Buttons shown on a hovered zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneAction {
    /// Edit the zone's note
    Note,
    /// Delete the zone
    Delete,
}

/// What lies under a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Bare canvas
    Empty,
    /// A node body
    Node(NodeId),
    /// A button in a node's action bar
    NodeAction(NodeId, NodeAction),
    /// A zone body
    Zone(ZoneId),
    /// A zone resize handle
    ZoneHandle(ZoneId, Corner),
    /// A zone button
    ZoneAction(ZoneId, ZoneAction),
    /// The head of an evolution arrow
    EvolutionArrow(NodeId),
    /// A connection curve
    Connection(Connection),
}

/// The active gesture, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureMode {
    /// Nothing in progress
    Idle,
    /// Moving a node
    DraggingNode,
    /// Moving a zone
    DraggingZone,
    /// Resizing a zone from a corner
    ResizingZone,
    /// Moving the viewport
    Panning,
    /// Waiting for the target of a new connection
    Connecting,
    /// Moving an evolution arrow head
    DraggingEvolutionArrow,
}

/// Active gesture with the snapshot it started from.
#[derive(Debug, Clone, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    DraggingNode {
        origin: Node,
        grab: Pos2,
    },
    DraggingZone {
        origin: Zone,
        grab: Pos2,
    },
    ResizingZone {
        origin: Zone,
        corner: Corner,
        grab: Pos2,
    },
    Panning {
        last: Pos2,
    },
    Connecting {
        from: NodeId,
    },
    DraggingEvolutionArrow {
        origin: Node,
        grab: Pos2,
    },
}

/// Something the controller needs the surrounding UI to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    /// Open the note editor for a node or zone
    EditNote(NoteTarget),
}

/// Result of feeding one input event to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing changed
    Ignored,
    /// Visual state changed (hover, selection, live drag, viewport)
    Redraw,
    /// The document changed; the action reverses it
    Committed(UndoAction),
    /// The UI should open a dialog
    Request(UiRequest),
}

/// What the pointer is currently over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    /// Node whose action bar is showing
    pub node: Option<NodeId>,
    /// Zone whose handles are showing
    pub zone: Option<ZoneId>,
    /// Exact target under the pointer
    pub target: HitTarget,
}

impl Default for Hover {
    fn default() -> Self {
        Self {
            node: None,
            zone: None,
            target: HitTarget::Empty,
        }
    }
}

/// Finite-state machine over canvas gestures.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    gesture: Gesture,
    hover: Hover,
    selected_connection: Option<Connection>,
    pointer: Option<Pos2>,
    pointer_held: bool,
    space_held: bool,
}

impl InteractionController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active gesture mode.
    pub fn mode(&self) -> GestureMode {
        match self.gesture {
            Gesture::Idle => GestureMode::Idle,
            Gesture::DraggingNode { .. } => GestureMode::DraggingNode,
            Gesture::DraggingZone { .. } => GestureMode::DraggingZone,
            Gesture::ResizingZone { .. } => GestureMode::ResizingZone,
            Gesture::Panning { .. } => GestureMode::Panning,
            Gesture::Connecting { .. } => GestureMode::Connecting,
            Gesture::DraggingEvolutionArrow { .. } => GestureMode::DraggingEvolutionArrow,
        }
    }

    /// Current hover state.
    pub fn hover(&self) -> Hover {
        self.hover
    }

    /// The selected connection, if any.
    pub fn selected_connection(&self) -> Option<Connection> {
        self.selected_connection
    }

    /// Source node of a pending connection.
    pub fn pending_source(&self) -> Option<NodeId> {
        match self.gesture {
            Gesture::Connecting { from } => Some(from),
            _ => None,
        }
    }

    /// Node whose evolution arrow is being dragged.
    pub fn dragging_arrow(&self) -> Option<NodeId> {
        match &self.gesture {
            Gesture::DraggingEvolutionArrow { origin, .. } => Some(origin.id),
            _ => None,
        }
    }

    /// Last known pointer position.
    pub fn pointer(&self) -> Option<Pos2> {
        self.pointer
    }

    /// Whether the space key is held.
    pub fn space_held(&self) -> bool {
        self.space_held
    }

    /// Resolves what lies under `pos`, honouring hover-only affordances.
    ///
    /// Priority: hovered node's action bar, hovered zone's handles and buttons,
    /// evolution arrow heads, nodes (topmost first), connections, zones
    /// (topmost first), then empty canvas.
    pub fn hit_test(&self, map: &WardleyMap, viewport: &Viewport, pos: Pos2) -> HitTarget {
        if let Some(node) = self.hover.node.and_then(|id| map.node(id)) {
            if let Some(button) = node_action_buttons(node, viewport).iter().find(|b| b.rect.contains(pos)) {
                return HitTarget::NodeAction(node.id, button.action);
            }
        }
        if let Some(zone) = self.hover.zone.and_then(|id| map.zone(id)) {
            if let Some((corner, _)) = zone_handles(zone, viewport).iter().find(|(_, r)| r.contains(pos)) {
                return HitTarget::ZoneHandle(zone.id, *corner);
            }
            if let Some(button) = zone_buttons(zone, viewport).iter().find(|b| b.rect.contains(pos)) {
                return HitTarget::ZoneAction(zone.id, button.action);
            }
        }
        for node in map.nodes().iter().rev() {
            if let Some(head) = arrow_head(node, viewport) {
                if head.distance(pos) <= ARROW_GRAB_RADIUS {
                    return HitTarget::EvolutionArrow(node.id);
                }
            }
        }
        if let Some(node) = map.nodes().iter().rev().find(|n| node_screen_rect(n, viewport).contains(pos)) {
            return HitTarget::Node(node.id);
        }
        for connection in map.connections().iter().rev() {
            if let Some(curve) = connection_screen_curve(map, viewport, connection) {
                if curve_distance(&curve, pos) < CLICK_THRESHOLD {
                    return HitTarget::Connection(*connection);
                }
            }
        }
        if let Some(zone) = map
            .zones()
            .iter()
            .rev()
            .find(|z| viewport.canvas_rect_to_screen(z.rect()).contains(pos))
        {
            return HitTarget::Zone(zone.id);
        }
        HitTarget::Empty
    }

    fn update_hover(&mut self, map: &WardleyMap, viewport: &Viewport, pos: Pos2) -> bool {
        let target = self.hit_test(map, viewport, pos);
        let hover = Hover {
            node: match target {
                HitTarget::Node(id) | HitTarget::NodeAction(id, _) => Some(id),
                _ => None,
            },
            zone: match target {
                HitTarget::Zone(id) | HitTarget::ZoneHandle(id, _) | HitTarget::ZoneAction(id, _) => Some(id),
                _ => None,
            },
            target,
        };
        let changed = hover != self.hover;
        self.hover = hover;
        changed
    }

    /// Primary button went down at `pos`.
    pub fn pointer_pressed(&mut self, map: &mut WardleyMap, viewport: &Viewport, pos: Pos2) -> Outcome {
        if self.pointer_held {
            return Outcome::Ignored;
        }
        self.pointer_held = true;
        self.pointer = Some(pos);

        if let Gesture::Connecting { from } = self.gesture {
            self.gesture = Gesture::Idle;
            let target = match self.hit_test(map, viewport, pos) {
                HitTarget::Node(id) | HitTarget::NodeAction(id, _) if id != from => Some(id),
                _ => None,
            };
            return match target {
                Some(to) if map.add_connection(from, to) => {
                    log::debug!("connected {from} -> {to}");
                    Outcome::Committed(UndoAction::ConnectionCreated {
                        connection: Connection::new(from, to),
                    })
                }
                _ => Outcome::Redraw,
            };
        }
        if self.gesture != Gesture::Idle {
            return Outcome::Ignored;
        }

        self.update_hover(map, viewport, pos);
        match self.hover.target {
            HitTarget::NodeAction(id, action) => self.node_action(map, id, action),
            HitTarget::ZoneAction(id, ZoneAction::Note) => Outcome::Request(UiRequest::EditNote(NoteTarget::Zone(id))),
            HitTarget::ZoneAction(id, ZoneAction::Delete) => match map.delete_zone(id) {
                Ok((index, zone)) => {
                    self.hover = Hover::default();
                    Outcome::Committed(UndoAction::ZoneDeleted { zone, index })
                }
                Err(_) => Outcome::Ignored,
            },
            HitTarget::ZoneHandle(id, corner) => match map.zone(id) {
                Some(zone) => {
                    self.gesture = Gesture::ResizingZone {
                        origin: zone.clone(),
                        corner,
                        grab: pos,
                    };
                    Outcome::Redraw
                }
                None => Outcome::Ignored,
            },
            HitTarget::EvolutionArrow(id) => match map.node(id) {
                Some(node) => {
                    self.gesture = Gesture::DraggingEvolutionArrow {
                        origin: node.clone(),
                        grab: pos,
                    };
                    Outcome::Redraw
                }
                None => Outcome::Ignored,
            },
            HitTarget::Node(id) => match map.node(id) {
                Some(node) => {
                    self.selected_connection = None;
                    self.gesture = Gesture::DraggingNode {
                        origin: node.clone(),
                        grab: pos,
                    };
                    Outcome::Redraw
                }
                None => Outcome::Ignored,
            },
            HitTarget::Connection(connection) => {
                self.selected_connection = Some(connection);
                Outcome::Redraw
            }
            HitTarget::Zone(_) | HitTarget::Empty if self.space_held => {
                self.gesture = Gesture::Panning { last: pos };
                Outcome::Redraw
            }
            HitTarget::Zone(id) => match map.zone(id) {
                Some(zone) => {
                    self.selected_connection = None;
                    self.gesture = Gesture::DraggingZone {
                        origin: zone.clone(),
                        grab: pos,
                    };
                    Outcome::Redraw
                }
                None => Outcome::Ignored,
            },
            HitTarget::Empty => {
                if self.selected_connection.take().is_some() {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
        }
    }

    fn node_action(&mut self, map: &mut WardleyMap, id: NodeId, action: NodeAction) -> Outcome {
        match action {
            NodeAction::Evolve => {
                let Some(before) = map.node(id).cloned() else {
                    return Outcome::Ignored;
                };
                if map.toggle_evolution(id).is_err() {
                    return Outcome::Ignored;
                }
                match map.node(id) {
                    Some(after) if *after != before => Outcome::Committed(UndoAction::NodeChanged {
                        before,
                        after: after.clone(),
                    }),
                    _ => Outcome::Ignored,
                }
            }
            NodeAction::Connect => self.start_connecting(map, id),
            NodeAction::Note => Outcome::Request(UiRequest::EditNote(NoteTarget::Node(id))),
            NodeAction::Delete => match map.delete_node(id) {
                Ok((index, node, connections)) => {
                    self.hover = Hover::default();
                    if self.selected_connection.is_some_and(|c| c.touches(id)) {
                        self.selected_connection = None;
                    }
                    Outcome::Committed(UndoAction::NodeDeleted {
                        node,
                        connections,
                        index,
                    })
                }
                Err(_) => Outcome::Ignored,
            },
        }
    }

    /// Enters `Connecting` with `from` as the pending source.
    pub fn start_connecting(&mut self, map: &WardleyMap, from: NodeId) -> Outcome {
        if self.gesture != Gesture::Idle && self.pending_source().is_none() {
            return Outcome::Ignored;
        }
        if map.node(from).is_none() {
            return Outcome::Ignored;
        }
        self.gesture = Gesture::Connecting { from };
        self.selected_connection = None;
        Outcome::Redraw
    }

    /// Pointer moved to `pos`, with or without a button held.
    pub fn pointer_moved(&mut self, map: &mut WardleyMap, viewport: &mut Viewport, pos: Pos2) -> Outcome {
        let moved = self.pointer != Some(pos);
        self.pointer = Some(pos);
        match &mut self.gesture {
            Gesture::Idle => {
                if self.update_hover(map, viewport, pos) {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Gesture::Connecting { .. } => {
                self.update_hover(map, viewport, pos);
                if moved {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Gesture::Panning { last } => {
                let delta = pos - *last;
                *last = pos;
                viewport.pan(delta);
                Outcome::Redraw
            }
            _ => {
                self.drag_to(map, viewport, pos);
                Outcome::Redraw
            }
        }
    }

    /// Applies the current drag gesture for a pointer at `pos`, relative to its origin.
    fn drag_to(&self, map: &mut WardleyMap, viewport: &Viewport, pos: Pos2) {
        let delta = |grab: Pos2| -> Vec2 { viewport.screen_delta_to_canvas(pos - grab) };
        let result = match &self.gesture {
            Gesture::DraggingNode { origin, grab } => {
                let target = origin.position() + delta(*grab);
                map.move_node(
                    origin.id,
                    target.x.clamp(0.0, CANVAS_WIDTH),
                    target.y.clamp(0.0, CANVAS_HEIGHT),
                )
            }
            Gesture::DraggingZone { origin, grab } => {
                let target = pos2(origin.x, origin.y) + delta(*grab);
                map.move_zone(
                    origin.id,
                    target.x.clamp(0.0, (CANVAS_WIDTH - origin.width).max(0.0)),
                    target.y.clamp(0.0, (CANVAS_HEIGHT - origin.height).max(0.0)),
                )
            }
            Gesture::ResizingZone { origin, corner, grab } => {
                let rect = resize_bounds(origin.rect(), *corner, delta(*grab));
                map.set_zone_bounds(origin.id, rect)
            }
            Gesture::DraggingEvolutionArrow { origin, grab } => {
                let start = origin.evolution_target_x.unwrap_or(origin.x);
                map.set_evolution_target(origin.id, start + delta(*grab).x)
            }
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Connecting { .. } => Ok(()),
        };
        if let Err(err) = result {
            log::warn!("drag update failed: {err}");
        }
    }

    /// Primary button released at `pos`.
    pub fn pointer_released(&mut self, map: &mut WardleyMap, viewport: &mut Viewport, pos: Pos2) -> Outcome {
        if !self.pointer_held {
            return Outcome::Ignored;
        }
        self.pointer_held = false;
        self.pointer = Some(pos);
        if matches!(self.gesture, Gesture::Idle | Gesture::Connecting { .. }) {
            return Outcome::Ignored;
        }
        if let Gesture::Panning { .. } = self.gesture {
            self.pointer_moved(map, viewport, pos);
            self.gesture = Gesture::Idle;
            return Outcome::Redraw;
        }

        self.drag_to(map, viewport, pos);
        let outcome = match std::mem::take(&mut self.gesture) {
            Gesture::DraggingNode { origin, .. } | Gesture::DraggingEvolutionArrow { origin, .. } => {
                match map.node(origin.id) {
                    Some(after) if *after != origin => Outcome::Committed(UndoAction::NodeChanged {
                        before: origin,
                        after: after.clone(),
                    }),
                    _ => Outcome::Redraw,
                }
            }
            Gesture::DraggingZone { origin, .. } | Gesture::ResizingZone { origin, .. } => {
                match map.zone(origin.id) {
                    Some(after) if *after != origin => Outcome::Committed(UndoAction::ZoneChanged {
                        before: origin,
                        after: after.clone(),
                    }),
                    _ => Outcome::Redraw,
                }
            }
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Connecting { .. } => Outcome::Redraw,
        };
        self.update_hover(map, viewport, pos);
        outcome
    }

    /// Space key pressed (`true`) or released (`false`). Releasing ends panning.
    pub fn space_changed(&mut self, held: bool) -> Outcome {
        self.space_held = held;
        if !held && matches!(self.gesture, Gesture::Panning { .. }) {
            self.gesture = Gesture::Idle;
            return Outcome::Redraw;
        }
        Outcome::Ignored
    }

    /// Cancels the active gesture, restoring whatever it changed.
    pub fn escape(&mut self, map: &mut WardleyMap) -> Outcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {
                if self.selected_connection.take().is_some() {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
            Gesture::DraggingNode { origin, .. } | Gesture::DraggingEvolutionArrow { origin, .. } => {
                map.replace_node(origin);
                Outcome::Redraw
            }
            Gesture::DraggingZone { origin, .. } | Gesture::ResizingZone { origin, .. } => {
                map.replace_zone(origin);
                Outcome::Redraw
            }
            Gesture::Panning { .. } | Gesture::Connecting { .. } => Outcome::Redraw,
        }
    }

    /// Scroll wheel over the canvas: zoom one step around `pos`.
    pub fn wheel(&mut self, viewport: &mut Viewport, pos: Pos2, scroll: f32) -> Outcome {
        if scroll == 0.0 || !scroll.is_finite() {
            return Outcome::Ignored;
        }
        let before = viewport.zoom;
        let factor = if scroll > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        viewport.zoom_by(factor, pos);
        if viewport.zoom != before {
            Outcome::Redraw
        } else {
            Outcome::Ignored
        }
    }

    /// Deletes the selected connection.
    pub fn delete_selected(&mut self, map: &mut WardleyMap) -> Outcome {
        let Some(connection) = self.selected_connection.take() else {
            return Outcome::Ignored;
        };
        match map.delete_connection(connection.from, connection.to) {
            Some(index) => Outcome::Committed(UndoAction::ConnectionDeleted { connection, index }),
            None => Outcome::Redraw,
        }
    }

    /// Forgets hover, selection and any gesture (after undo, import or clear).
    pub fn reset(&mut self) {
        let space_held = self.space_held;
        *self = Self::default();
        self.space_held = space_held;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use egui::vec2;

    struct Fixture {
        map: WardleyMap,
        viewport: Viewport,
        controller: InteractionController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                map: WardleyMap::new(),
                viewport: Viewport::default(),
                controller: InteractionController::new(),
            }
        }

        fn press(&mut self, pos: Pos2) -> Outcome {
            self.controller.pointer_moved(&mut self.map, &mut self.viewport, pos);
            self.controller.pointer_pressed(&mut self.map, &self.viewport, pos)
        }

        fn drag(&mut self, pos: Pos2) -> Outcome {
            self.controller.pointer_moved(&mut self.map, &mut self.viewport, pos)
        }

        fn release(&mut self, pos: Pos2) -> Outcome {
            self.controller.pointer_released(&mut self.map, &mut self.viewport, pos)
        }

        fn click(&mut self, pos: Pos2) -> Outcome {
            let outcome = self.press(pos);
            self.release(pos);
            outcome
        }

        fn node_center(&self, id: NodeId) -> Pos2 {
            node_screen_rect(self.map.node(id).unwrap(), &self.viewport).center()
        }

        fn action_button(&self, id: NodeId, action: NodeAction) -> Pos2 {
            node_action_buttons(self.map.node(id).unwrap(), &self.viewport)
                .into_iter()
                .find(|b| b.action == action)
                .unwrap()
                .rect
                .center()
        }

        fn hover_node(&mut self, id: NodeId) {
            let center = self.node_center(id);
            self.drag(center);
            assert_eq!(self.controller.hover().node, Some(id));
        }
    }

    #[test]
    fn test_drag_node_commits_once() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        let start = f.node_center(id);

        assert_eq!(f.press(start), Outcome::Redraw);
        assert_eq!(f.controller.mode(), GestureMode::DraggingNode);
        f.drag(start + vec2(300.0, 50.0));
        assert_eq!(f.map.node(id).unwrap().stage, Stage::Custom, "stage updates live");
        f.drag(start + vec2(600.0, 80.0));

        match f.release(start + vec2(600.0, 80.0)) {
            Outcome::Committed(UndoAction::NodeChanged { before, after }) => {
                assert_eq!(before.x, 250.0);
                assert_eq!(after.x, 850.0);
                assert_eq!(after.stage, Stage::Custom);
            }
            other => panic!("expected a node change, got {other:?}"),
        }
        assert_eq!(f.controller.mode(), GestureMode::Idle);
        let node = f.map.node(id).unwrap();
        assert_eq!((node.x, node.y), (850.0, 200.0));
    }

    #[test]
    fn test_click_without_move_commits_nothing() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        let center = f.node_center(id);
        f.press(center);
        assert_eq!(f.release(center), Outcome::Redraw);
    }

    #[test]
    fn test_drag_respects_zoom() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        f.viewport.zoom_by(2.0, Pos2::ZERO);
        let start = f.node_center(id);
        f.press(start);
        f.release(start + vec2(100.0, 0.0));
        assert_eq!(f.map.node(id).unwrap().x, 300.0);
    }

    #[test]
    fn test_drag_clamps_to_canvas() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        let start = f.node_center(id);
        f.press(start);
        f.release(start + vec2(-5000.0, -5000.0));
        let node = f.map.node(id).unwrap();
        assert_eq!((node.x, node.y), (0.0, 0.0));
    }

    #[test]
    fn test_second_press_during_gesture_is_ignored() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        let start = f.node_center(id);
        f.press(start);
        assert_eq!(
            f.controller.pointer_pressed(&mut f.map, &f.viewport, pos2(1000.0, 700.0)),
            Outcome::Ignored
        );
        assert_eq!(f.controller.mode(), GestureMode::DraggingNode);
    }

    #[test]
    fn test_escape_restores_drag_origin() {
        let mut f = Fixture::new();
        let id = f.map.add_node("A", Stage::Genesis).unwrap();
        let before = f.map.node(id).unwrap().clone();
        let start = f.node_center(id);
        f.press(start);
        f.drag(start + vec2(900.0, 0.0));
        f.controller.escape(&mut f.map);
        assert_eq!(f.map.node(id).unwrap(), &before);
        assert_eq!(f.release(start + vec2(900.0, 0.0)), Outcome::Ignored);
    }

    #[test]
    fn test_connect_via_action_bar() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        let b = f.map.add_node("B", Stage::Custom).unwrap();

        f.hover_node(a);
        let connect = f.action_button(a, NodeAction::Connect);
        f.click(connect);
        assert_eq!(f.controller.mode(), GestureMode::Connecting);
        assert_eq!(f.controller.pending_source(), Some(a));

        let target = f.node_center(b);
        let outcome = f.click(target);
        assert_eq!(
            outcome,
            Outcome::Committed(UndoAction::ConnectionCreated {
                connection: Connection::new(a, b)
            })
        );
        assert_eq!(f.map.connections(), &[Connection::new(a, b)]);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_connecting_cancelled_by_empty_click_and_escape() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        f.controller.start_connecting(&f.map, a);
        assert_eq!(f.click(pos2(1100.0, 750.0)), Outcome::Redraw);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
        assert!(f.map.connections().is_empty());

        f.controller.start_connecting(&f.map, a);
        f.controller.escape(&mut f.map);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_connecting_to_self_does_nothing() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        f.controller.start_connecting(&f.map, a);
        let center = f.node_center(a);
        assert_eq!(f.click(center), Outcome::Redraw);
        assert!(f.map.connections().is_empty());
    }

    #[test]
    fn test_evolve_and_delete_buttons() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        let b = f.map.add_node("B", Stage::Custom).unwrap();
        f.map.add_connection(a, b);

        f.hover_node(a);
        let evolve = f.action_button(a, NodeAction::Evolve);
        assert!(matches!(f.click(evolve), Outcome::Committed(UndoAction::NodeChanged { .. })));
        assert!(f.map.node(a).unwrap().evolving);

        f.hover_node(a);
        let delete = f.action_button(a, NodeAction::Delete);
        match f.click(delete) {
            Outcome::Committed(UndoAction::NodeDeleted { node, connections, .. }) => {
                assert_eq!(node.id, a);
                assert_eq!(connections.len(), 1);
            }
            other => panic!("expected deletion, got {other:?}"),
        }
        assert!(f.map.connections().is_empty());
    }

    #[test]
    fn test_note_button_requests_editor() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        f.hover_node(a);
        let note = f.action_button(a, NodeAction::Note);
        assert_eq!(f.click(note), Outcome::Request(UiRequest::EditNote(NoteTarget::Node(a))));
    }

    #[test]
    fn test_action_bar_only_when_hovered() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        let delete = node_action_buttons(f.map.node(a).unwrap(), &f.viewport)[3].rect.center();
        assert_eq!(f.controller.hit_test(&f.map, &f.viewport, delete), HitTarget::Empty);
    }

    #[test]
    fn test_evolution_arrow_drag() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        f.map.toggle_evolution(a).unwrap();
        let head = arrow_head(f.map.node(a).unwrap(), &f.viewport).unwrap();

        f.press(head);
        assert_eq!(f.controller.mode(), GestureMode::DraggingEvolutionArrow);
        let outcome = f.release(head + vec2(500.0, 40.0));
        assert!(matches!(outcome, Outcome::Committed(UndoAction::NodeChanged { .. })));
        let node = f.map.node(a).unwrap();
        assert_eq!(node.evolution_target_x, Some(1250.0));
        assert_eq!(node.evolving_to, Some(Stage::Product));
        assert_eq!(node.y, 120.0, "arrow drag never moves the node");
    }

    #[test]
    fn test_zone_drag_and_resize() {
        let mut f = Fixture::new();
        let zone = f.map.add_zone(ZoneType::Opportunity);

        f.press(pos2(200.0, 200.0));
        assert_eq!(f.controller.mode(), GestureMode::DraggingZone);
        assert!(matches!(
            f.release(pos2(250.0, 260.0)),
            Outcome::Committed(UndoAction::ZoneChanged { .. })
        ));
        let moved = f.map.zone(zone).unwrap().clone();
        assert_eq!((moved.x, moved.y), (150.0, 160.0));

        let corner = moved.rect().right_bottom();
        f.drag(pos2(300.0, 300.0));
        f.press(corner);
        assert_eq!(f.controller.mode(), GestureMode::ResizingZone);
        f.release(corner + vec2(-1000.0, 40.0));
        let resized = f.map.zone(zone).unwrap();
        assert_eq!(resized.width, ZONE_MIN_SIZE);
        assert_eq!(resized.height, ZONE_DEFAULT_HEIGHT + 40.0);
        assert_eq!((resized.x, resized.y), (150.0, 160.0));
    }

    #[test]
    fn test_zone_delete_button() {
        let mut f = Fixture::new();
        let zone = f.map.add_zone(ZoneType::Threat);
        f.drag(pos2(200.0, 200.0));
        let delete = zone_buttons(f.map.zone(zone).unwrap(), &f.viewport)[1].rect.center();
        assert!(matches!(f.click(delete), Outcome::Committed(UndoAction::ZoneDeleted { .. })));
        assert!(f.map.zones().is_empty());
    }

    #[test]
    fn test_node_wins_over_zone() {
        let mut f = Fixture::new();
        f.map.add_zone_at(ZoneType::War, pos2(0.0, 0.0));
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        let center = f.node_center(a);
        assert_eq!(f.controller.hit_test(&f.map, &f.viewport, center), HitTarget::Node(a));
    }

    #[test]
    fn test_space_drag_pans() {
        let mut f = Fixture::new();
        f.controller.space_changed(true);
        f.press(pos2(600.0, 400.0));
        assert_eq!(f.controller.mode(), GestureMode::Panning);
        f.drag(pos2(800.0, 500.0));
        assert_eq!(f.viewport.pan, vec2(200.0, 100.0));
        f.controller.space_changed(false);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_panning_stops_at_genesis_edge() {
        let mut f = Fixture::new();
        f.controller.space_changed(true);
        f.press(pos2(1100.0, 400.0));
        f.drag(pos2(-900.0, 400.0));
        f.release(pos2(-900.0, 400.0));
        assert_eq!(f.viewport.pan.x, 0.0);
        assert_eq!(f.viewport.canvas_to_screen(pos2(0.0, 0.0)).x, 0.0);
    }

    #[test]
    fn test_press_on_empty_without_space_does_not_pan() {
        let mut f = Fixture::new();
        assert_eq!(f.press(pos2(600.0, 400.0)), Outcome::Ignored);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_wheel_zooms_at_pointer() {
        let mut f = Fixture::new();
        f.viewport.pan(vec2(200.0, 100.0));
        let anchor = pos2(400.0, 300.0);
        let under = f.viewport.screen_to_canvas(anchor);
        assert_eq!(f.controller.wheel(&mut f.viewport, anchor, 1.0), Outcome::Redraw);
        assert!(f.viewport.zoom > 1.0);
        let after = f.viewport.canvas_to_screen(under);
        assert!((after.x - anchor.x).abs() < 1e-3);
        assert_eq!(f.controller.mode(), GestureMode::Idle);
        assert_eq!(f.controller.wheel(&mut f.viewport, anchor, 0.0), Outcome::Ignored);
    }

    #[test]
    fn test_select_and_delete_connection() {
        let mut f = Fixture::new();
        let a = f.map.add_node("A", Stage::Genesis).unwrap();
        let b = f.map.add_node("B", Stage::Genesis).unwrap();
        f.map.move_node(b, 250.0, 500.0).unwrap();
        f.map.add_connection(a, b);

        f.click(pos2(250.0, 300.0));
        assert_eq!(f.controller.selected_connection(), Some(Connection::new(a, b)));
        assert_eq!(
            f.controller.delete_selected(&mut f.map),
            Outcome::Committed(UndoAction::ConnectionDeleted {
                connection: Connection::new(a, b),
                index: 0
            })
        );
        assert!(f.map.connections().is_empty());
        assert_eq!(f.controller.delete_selected(&mut f.map), Outcome::Ignored);
    }
}
