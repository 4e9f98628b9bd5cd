//! Core data types and the in-memory map model.
//!
//! This module defines the components (nodes), dependencies (connections) and
//! strategic zones of a Wardley map, and [`WardleyMap`], the single authoritative
//! store that keeps them consistent.

use crate::constants::*;
use crate::error::MapError;
use crate::stage::{classify, Stage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for map components.
pub type NodeId = u64;

/// Unique identifier for annotation zones.
pub type ZoneId = u64;

/// A component placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// User-displayable name
    pub label: String,
    /// Horizontal center in canvas units
    pub x: f32,
    /// Vertical center in canvas units
    pub y: f32,
    /// Evolution stage derived from `x`
    pub stage: Stage,
    /// Whether an evolution projection is shown
    pub evolving: bool,
    /// Projected future stage while evolving
    pub evolving_to: Option<Stage>,
    /// Horizontal position of the evolution arrow head
    pub evolution_target_x: Option<f32>,
    /// Free-form annotation
    pub note: Option<String>,
}

impl Node {
    /// Center of the node in canvas coordinates.
    pub fn position(&self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    /// Canvas-space bounds of the node.
    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_center_size(self.position(), egui::vec2(NODE_WIDTH, NODE_HEIGHT))
    }

    fn clear_evolution(&mut self) {
        self.evolving = false;
        self.evolving_to = None;
        self.evolution_target_x = None;
    }
}

/// A directed dependency between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// ID of the source node
    pub from: NodeId,
    /// ID of the destination node
    pub to: NodeId,
}

impl Connection {
    /// Creates a connection value (not yet part of any map).
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    /// Whether either end of this connection is the given node.
    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

/// Kind of strategic annotation a zone represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    /// An area of potential advantage
    Opportunity,
    /// Resistance to change
    Inertia,
    /// An area of risk
    Threat,
    /// Active competition
    War,
    /// Plain annotation
    Note,
}

impl ZoneType {
    /// All zone types in toolbar order.
    pub const ALL: [ZoneType; 5] = [
        ZoneType::Opportunity,
        ZoneType::Inertia,
        ZoneType::Threat,
        ZoneType::War,
        ZoneType::Note,
    ];

    /// Identifier used in the persisted document and as the zone's label.
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Opportunity => "opportunity",
            ZoneType::Inertia => "inertia",
            ZoneType::Threat => "threat",
            ZoneType::War => "war",
            ZoneType::Note => "note",
        }
    }
}

/// A rectangular annotation on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique identifier for this zone
    pub id: ZoneId,
    /// What the zone represents
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Left edge in canvas units
    pub x: f32,
    /// Top edge in canvas units
    pub y: f32,
    /// Width in canvas units
    pub width: f32,
    /// Height in canvas units
    pub height: f32,
    /// Free-form annotation
    pub note: Option<String>,
}

impl Zone {
    /// Canvas-space bounds of the zone.
    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(self.x, self.y), egui::vec2(self.width, self.height))
    }

    fn set_rect(&mut self, rect: egui::Rect) {
        self.x = rect.min.x;
        self.y = rect.min.y;
        self.width = rect.width().max(ZONE_MIN_SIZE);
        self.height = rect.height().max(ZONE_MIN_SIZE);
    }
}

/// Corner of a zone grabbed by a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left
    NorthWest,
    /// Top-right
    NorthEast,
    /// Bottom-left
    SouthWest,
    /// Bottom-right
    SouthEast,
}

impl Corner {
    /// All corners, clockwise from the top-left.
    pub const ALL: [Corner; 4] = [Corner::NorthWest, Corner::NorthEast, Corner::SouthEast, Corner::SouthWest];

    /// The corner's position on the given rectangle.
    pub fn point(self, rect: egui::Rect) -> egui::Pos2 {
        match self {
            Corner::NorthWest => rect.left_top(),
            Corner::NorthEast => rect.right_top(),
            Corner::SouthWest => rect.left_bottom(),
            Corner::SouthEast => rect.right_bottom(),
        }
    }
}

/// Moves one corner of `rect` by `delta`, keeping the opposite edges fixed.
///
/// Width and height never drop below [`ZONE_MIN_SIZE`]; when the floor is hit on a
/// north or west edge, the origin stops so the fixed edge stays put.
pub fn resize_bounds(rect: egui::Rect, corner: Corner, delta: egui::Vec2) -> egui::Rect {
    let (mut left, mut top, mut right, mut bottom) = (rect.min.x, rect.min.y, rect.max.x, rect.max.y);
    match corner {
        Corner::NorthWest | Corner::SouthWest => left = (left + delta.x).min(right - ZONE_MIN_SIZE),
        Corner::NorthEast | Corner::SouthEast => right = (right + delta.x).max(left + ZONE_MIN_SIZE),
    }
    match corner {
        Corner::NorthWest | Corner::NorthEast => top = (top + delta.y).min(bottom - ZONE_MIN_SIZE),
        Corner::SouthWest | Corner::SouthEast => bottom = (bottom + delta.y).max(top + ZONE_MIN_SIZE),
    }
    egui::Rect::from_min_max(egui::pos2(left, top), egui::pos2(right, bottom))
}

/// What a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteTarget {
    /// A component
    Node(NodeId),
    /// A zone
    Zone(ZoneId),
}

/// The persisted shape of a map: exactly what export, import and local storage exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    /// All components
    pub nodes: Vec<Node>,
    /// All dependencies
    pub connections: Vec<Connection>,
    /// All annotation zones
    pub zones: Vec<Zone>,
}

impl Document {
    /// Serialize the document to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// Import records: every optional field is defaulted explicitly, every required one
// is checked by serde. Unknown fields are ignored.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NodeId,
    label: String,
    x: f32,
    y: f32,
    #[serde(default)]
    stage: Option<Stage>,
    #[serde(default)]
    evolving: Option<bool>,
    #[serde(default)]
    evolving_to: Option<Stage>,
    #[serde(default)]
    evolution_target_x: Option<f32>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Deserialize)]
struct ZoneRecord {
    id: ZoneId,
    #[serde(rename = "type")]
    zone_type: ZoneType,
    x: f32,
    y: f32,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Deserialize)]
struct DocumentRecord {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    connections: Vec<Connection>,
    #[serde(default)]
    zones: Vec<ZoneRecord>,
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.filter(|text| !text.trim().is_empty())
}

fn check_id(kind: &str, id: u64) -> Result<(), MapError> {
    if id > MAX_IMPORTED_ID {
        return Err(MapError::Format(format!("{kind} id {id} is out of range")));
    }
    Ok(())
}

/// Coordinates outside f32 range come through serde as infinities and would
/// not survive the next export.
fn check_finite(kind: &str, id: u64, field: &str, value: f32) -> Result<f32, MapError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MapError::Format(format!("{kind} {id} has an invalid {field}")))
    }
}

impl NodeRecord {
    fn into_node(self) -> Result<Node, MapError> {
        check_id("component", self.id)?;
        let label = self.label.trim().to_string();
        if label.is_empty() {
            return Err(MapError::Format(format!("component {} has an empty label", self.id)));
        }
        let x = check_finite("component", self.id, "x", self.x)?;
        let y = check_finite("component", self.id, "y", self.y)?;
        let target_x = self
            .evolution_target_x
            .map(|value| check_finite("component", self.id, "evolutionTargetX", value))
            .transpose()?;
        let stage = self.stage.unwrap_or_else(|| classify(x));
        let mut node = Node {
            id: self.id,
            label,
            x,
            y,
            stage,
            evolving: false,
            evolving_to: None,
            evolution_target_x: None,
            note: normalize_note(self.note),
        };
        if self.evolving.unwrap_or(false) {
            if let Some(target) = self.evolving_to.or_else(|| stage.next()) {
                node.evolving = true;
                node.evolving_to = Some(target);
                node.evolution_target_x = Some(
                    target_x
                        .unwrap_or_else(|| target.midpoint())
                        .clamp(0.0, CANVAS_WIDTH),
                );
            }
        }
        Ok(node)
    }
}

impl ZoneRecord {
    fn into_zone(self) -> Result<Zone, MapError> {
        check_id("zone", self.id)?;
        let width = self.width.unwrap_or(ZONE_DEFAULT_WIDTH);
        let height = self.height.unwrap_or(ZONE_DEFAULT_HEIGHT);
        Ok(Zone {
            id: self.id,
            zone_type: self.zone_type,
            x: check_finite("zone", self.id, "x", self.x)?,
            y: check_finite("zone", self.id, "y", self.y)?,
            width: check_finite("zone", self.id, "width", width)?.max(ZONE_MIN_SIZE),
            height: check_finite("zone", self.id, "height", height)?.max(ZONE_MIN_SIZE),
            note: normalize_note(self.note),
        })
    }
}

/// The in-memory Wardley map: nodes, connections and zones plus id counters.
///
/// All mutation goes through the methods below so that the invariants hold after
/// every call: unique ids, `stage == classify(x)`, no dangling or duplicate
/// connections, zones at least [`ZONE_MIN_SIZE`] on each side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WardleyMap {
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) zones: Vec<Zone>,
    next_node_id: NodeId,
    next_zone_id: ZoneId,
}

impl WardleyMap {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// All components in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All connections in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// All zones in creation order (later zones draw on top).
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Looks up a component.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a zone.
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Whether the map has no nodes, connections or zones.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty() && self.zones.is_empty()
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, MapError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(MapError::UnknownNode(id))
    }

    fn zone_mut(&mut self, id: ZoneId) -> Result<&mut Zone, MapError> {
        self.zones
            .iter_mut()
            .find(|z| z.id == id)
            .ok_or(MapError::UnknownZone(id))
    }

    /// Adds a component in the default slot of the given stage.
    ///
    /// # Returns
    ///
    /// The new node's id, or a validation error if `label` is blank.
    pub fn add_node(&mut self, label: &str, stage: Stage) -> Result<NodeId, MapError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(MapError::Validation("Please enter a component name.".to_string()));
        }
        let (x, y) = self.default_node_position(stage);
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            label: label.to_string(),
            x,
            y,
            stage: classify(x),
            evolving: false,
            evolving_to: None,
            evolution_target_x: None,
            note: None,
        });
        Ok(id)
    }

    /// First free row in the stage's band, stepping down until nothing overlaps.
    fn default_node_position(&self, stage: Stage) -> (f32, f32) {
        let x = stage.midpoint();
        let mut y = DEFAULT_NODE_Y;
        let overlaps = |y: f32| {
            self.nodes
                .iter()
                .any(|n| (n.x - x).abs() < NODE_WIDTH && (n.y - y).abs() < NODE_HEIGHT)
        };
        while overlaps(y) {
            y += NODE_SPACING;
        }
        (x, y)
    }

    /// Moves a component and re-derives its stage from the new `x`.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> Result<(), MapError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MapError::Validation("position must be finite".to_string()));
        }
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        node.stage = classify(x);
        Ok(())
    }

    /// Removes a component and every connection touching it.
    ///
    /// # Returns
    ///
    /// The removed node, its former index and the cascaded connections paired
    /// with the indices they occupied.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(usize, Node, Vec<(usize, Connection)>), MapError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(MapError::UnknownNode(id))?;
        let node = self.nodes.remove(index);
        let removed: Vec<(usize, Connection)> = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.touches(id))
            .map(|(i, c)| (i, *c))
            .collect();
        self.connections.retain(|c| !c.touches(id));
        Ok((index, node, removed))
    }

    /// Adds a directed connection.
    ///
    /// Self-connections, exact duplicates and unknown endpoints are rejected
    /// without error. The reversed pair is a distinct edge and is allowed.
    ///
    /// # Returns
    ///
    /// `true` if the connection was added.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || self.node(from).is_none() || self.node(to).is_none() {
            return false;
        }
        let connection = Connection::new(from, to);
        if self.connections.contains(&connection) {
            return false;
        }
        self.connections.push(connection);
        true
    }

    /// Removes the exact `(from, to)` connection.
    ///
    /// # Returns
    ///
    /// The index it occupied, if it existed.
    pub fn delete_connection(&mut self, from: NodeId, to: NodeId) -> Option<usize> {
        let index = self.connections.iter().position(|c| c.from == from && c.to == to)?;
        self.connections.remove(index);
        Some(index)
    }

    /// Switches the evolution projection of a component on or off.
    ///
    /// Turning it on targets the next stage's band midpoint. Commodity components
    /// have no next stage, so the call leaves them unchanged.
    ///
    /// # Returns
    ///
    /// Whether the node is evolving after the call.
    pub fn toggle_evolution(&mut self, id: NodeId) -> Result<bool, MapError> {
        let node = self.node_mut(id)?;
        if node.evolving {
            node.clear_evolution();
            return Ok(false);
        }
        match node.stage.next() {
            Some(target) => {
                node.evolving = true;
                node.evolving_to = Some(target);
                node.evolution_target_x = Some(target.midpoint());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves the evolution arrow head of an evolving component.
    ///
    /// The target is clamped to the canvas and `evolving_to` follows the band it lands in.
    /// Non-evolving components are left untouched.
    pub fn set_evolution_target(&mut self, id: NodeId, x: f32) -> Result<(), MapError> {
        if !x.is_finite() {
            return Err(MapError::Validation("position must be finite".to_string()));
        }
        let node = self.node_mut(id)?;
        if node.evolving {
            let x = x.clamp(0.0, CANVAS_WIDTH);
            node.evolution_target_x = Some(x);
            node.evolving_to = Some(classify(x));
        }
        Ok(())
    }

    /// Adds a zone of the default size at the default position.
    ///
    /// Each existing zone pushes the new one down and right a little so they don't stack.
    pub fn add_zone(&mut self, zone_type: ZoneType) -> ZoneId {
        let step = (self.zones.len() % 10) as f32 * ZONE_CASCADE;
        let origin = egui::pos2(DEFAULT_ZONE_POSITION.0 + step, DEFAULT_ZONE_POSITION.1 + step);
        self.add_zone_at(zone_type, origin)
    }

    /// Adds a zone of the default size with its top-left corner at `origin`.
    pub fn add_zone_at(&mut self, zone_type: ZoneType, origin: egui::Pos2) -> ZoneId {
        let id = self.next_zone_id;
        self.next_zone_id += 1;
        self.zones.push(Zone {
            id,
            zone_type,
            x: origin.x,
            y: origin.y,
            width: ZONE_DEFAULT_WIDTH,
            height: ZONE_DEFAULT_HEIGHT,
            note: None,
        });
        id
    }

    /// Moves a zone's top-left corner.
    pub fn move_zone(&mut self, id: ZoneId, x: f32, y: f32) -> Result<(), MapError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MapError::Validation("position must be finite".to_string()));
        }
        let zone = self.zone_mut(id)?;
        zone.x = x;
        zone.y = y;
        Ok(())
    }

    /// Replaces a zone's bounds, enforcing the minimum size.
    pub fn set_zone_bounds(&mut self, id: ZoneId, rect: egui::Rect) -> Result<(), MapError> {
        self.zone_mut(id)?.set_rect(rect);
        Ok(())
    }

    /// Drags one corner of a zone by `delta` canvas units.
    pub fn resize_zone(&mut self, id: ZoneId, corner: Corner, delta: egui::Vec2) -> Result<(), MapError> {
        let zone = self.zone_mut(id)?;
        let rect = resize_bounds(zone.rect(), corner, delta);
        zone.set_rect(rect);
        Ok(())
    }

    /// Removes a zone.
    ///
    /// # Returns
    ///
    /// The removed zone and the index it occupied.
    pub fn delete_zone(&mut self, id: ZoneId) -> Result<(usize, Zone), MapError> {
        let index = self
            .zones
            .iter()
            .position(|z| z.id == id)
            .ok_or(MapError::UnknownZone(id))?;
        Ok((index, self.zones.remove(index)))
    }

    /// Attaches or overwrites a note. Blank text removes the note.
    pub fn set_note(&mut self, target: NoteTarget, text: &str) -> Result<(), MapError> {
        let note = normalize_note(Some(text.trim().to_string()));
        match target {
            NoteTarget::Node(id) => self.node_mut(id)?.note = note,
            NoteTarget::Zone(id) => self.zone_mut(id)?.note = note,
        }
        Ok(())
    }

    /// Current note of a node or zone.
    pub fn note(&self, target: NoteTarget) -> Option<&str> {
        match target {
            NoteTarget::Node(id) => self.node(id).and_then(|n| n.note.as_deref()),
            NoteTarget::Zone(id) => self.zone(id).and_then(|z| z.note.as_deref()),
        }
    }

    /// Empties the map and starts a fresh id sequence.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Snapshot of the whole map in its persisted shape.
    pub fn serialize(&self) -> Document {
        Document {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            zones: self.zones.clone(),
        }
    }

    /// Replaces the whole map with the given JSON document.
    ///
    /// The document is validated completely before anything is replaced; on error
    /// the current map is left untouched.
    pub fn deserialize(&mut self, value: &serde_json::Value) -> Result<(), MapError> {
        let object = value
            .as_object()
            .ok_or_else(|| MapError::Format("a map must be a JSON object".to_string()))?;
        if !object.get("nodes").is_some_and(|nodes| nodes.is_array()) {
            return Err(MapError::Format("missing required \"nodes\" array".to_string()));
        }
        let record: DocumentRecord = serde_json::from_value(value.clone())?;

        let mut nodes = Vec::with_capacity(record.nodes.len());
        let mut node_ids = HashSet::new();
        for node in record.nodes {
            if !node_ids.insert(node.id) {
                return Err(MapError::Format(format!("duplicate component id {}", node.id)));
            }
            nodes.push(node.into_node()?);
        }

        let mut zones = Vec::with_capacity(record.zones.len());
        let mut zone_ids = HashSet::new();
        for zone in record.zones {
            if !zone_ids.insert(zone.id) {
                return Err(MapError::Format(format!("duplicate zone id {}", zone.id)));
            }
            zones.push(zone.into_zone()?);
        }

        let mut connections: Vec<Connection> = Vec::with_capacity(record.connections.len());
        for connection in record.connections {
            let valid = connection.from != connection.to
                && node_ids.contains(&connection.from)
                && node_ids.contains(&connection.to)
                && !connections.contains(&connection);
            if valid {
                connections.push(connection);
            } else {
                log::warn!(
                    "dropping invalid connection {} -> {} from imported map",
                    connection.from,
                    connection.to
                );
            }
        }

        self.restore(Document {
            nodes,
            connections,
            zones,
        });
        Ok(())
    }

    /// Installs an already-validated document, keeping id counters monotonic.
    pub(crate) fn restore(&mut self, document: Document) {
        let next_node_id = document.nodes.iter().map(|n| n.id + 1).max().unwrap_or(0);
        let next_zone_id = document.zones.iter().map(|z| z.id + 1).max().unwrap_or(0);
        self.next_node_id = self.next_node_id.max(next_node_id);
        self.next_zone_id = self.next_zone_id.max(next_zone_id);
        self.nodes = document.nodes;
        self.connections = document.connections;
        self.zones = document.zones;
    }

    /// Re-inserts a node at a given index (undo of a deletion).
    pub(crate) fn insert_node(&mut self, index: usize, node: Node) {
        self.next_node_id = self.next_node_id.max(node.id + 1);
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    /// Overwrites a node with a previous version of itself (undo of an edit).
    pub(crate) fn replace_node(&mut self, node: Node) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(slot) => {
                *slot = node;
                true
            }
            None => false,
        }
    }

    /// Re-inserts a connection at a given index if both endpoints still exist.
    pub(crate) fn insert_connection(&mut self, index: usize, connection: Connection) -> bool {
        if self.node(connection.from).is_none()
            || self.node(connection.to).is_none()
            || self.connections.contains(&connection)
        {
            return false;
        }
        let index = index.min(self.connections.len());
        self.connections.insert(index, connection);
        true
    }

    /// Re-inserts a zone at a given index (undo of a deletion).
    pub(crate) fn insert_zone(&mut self, index: usize, zone: Zone) {
        self.next_zone_id = self.next_zone_id.max(zone.id + 1);
        let index = index.min(self.zones.len());
        self.zones.insert(index, zone);
    }

    /// Overwrites a zone with a previous version of itself (undo of an edit).
    pub(crate) fn replace_zone(&mut self, zone: Zone) -> bool {
        match self.zones.iter_mut().find(|z| z.id == zone.id) {
            Some(slot) => {
                *slot = zone;
                true
            }
            None => false,
        }
    }
}
