//! Undo/redo functionality for tracking and reversing map edits.
//!
//! Every committed edit is recorded as an [`UndoAction`] carrying enough state to
//! reverse itself. Applying an action returns its inverse, which goes onto the
//! opposite stack.

use crate::constants::MAX_UNDO_HISTORY;
use crate::types::*;

/// Represents different types of edits that can be undone.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// A component was added
    NodeCreated {
        /// The node as it was created
        node: Node,
    },
    /// A component was removed together with its connections
    NodeDeleted {
        /// The removed node
        node: Node,
        /// Connections removed by the cascade, with their former indices
        connections: Vec<(usize, Connection)>,
        /// Former position in the node list
        index: usize,
    },
    /// A component was moved, evolved, or annotated
    NodeChanged {
        /// State before the edit
        before: Node,
        /// State after the edit
        after: Node,
    },
    /// A dependency was added
    ConnectionCreated {
        /// The new connection
        connection: Connection,
    },
    /// A dependency was removed
    ConnectionDeleted {
        /// The removed connection
        connection: Connection,
        /// Former position in the connection list
        index: usize,
    },
    /// A zone was added
    ZoneCreated {
        /// The zone as it was created
        zone: Zone,
    },
    /// A zone was removed
    ZoneDeleted {
        /// The removed zone
        zone: Zone,
        /// Former position in the zone list
        index: usize,
    },
    /// A zone was moved, resized or annotated
    ZoneChanged {
        /// State before the edit
        before: Zone,
        /// State after the edit
        after: Zone,
    },
    /// The whole map was replaced by an import or cleared
    DocumentReplaced {
        /// Map before the replacement
        before: Document,
        /// Map after the replacement
        after: Document,
    },
}

impl UndoAction {
    /// Short description for tooltips and log lines.
    pub fn describe(&self) -> &'static str {
        match self {
            UndoAction::NodeCreated { .. } => "add component",
            UndoAction::NodeDeleted { .. } => "delete component",
            UndoAction::NodeChanged { .. } => "edit component",
            UndoAction::ConnectionCreated { .. } => "connect",
            UndoAction::ConnectionDeleted { .. } => "delete connection",
            UndoAction::ZoneCreated { .. } => "add zone",
            UndoAction::ZoneDeleted { .. } => "delete zone",
            UndoAction::ZoneChanged { .. } => "edit zone",
            UndoAction::DocumentReplaced { .. } => "replace map",
        }
    }
}

/// Manages undo/redo history for the application.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    /// Stack of actions that can be undone
    undo_stack: Vec<UndoAction>,
    /// Stack of actions that can be redone
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Adds an action to the undo history.
    ///
    /// This clears the redo stack since a new action invalidates any previously undone actions.
    ///
    /// # Arguments
    ///
    /// * `action` - The action to record
    pub fn push_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();

        // Limit undo history size
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent action from the undo stack.
    ///
    /// # Returns
    ///
    /// The action to undo, or None if the undo stack is empty
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    ///
    /// # Returns
    ///
    /// The action to redo, or None if the redo stack is empty
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Pushes an inverse action back onto the undo stack without clearing redo.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
    }

    /// Undoes the latest edit on `map`.
    ///
    /// # Returns
    ///
    /// `true` if something was undone.
    pub fn undo(&mut self, map: &mut WardleyMap) -> bool {
        while let Some(action) = self.pop_undo() {
            if let Some(inverse) = map.apply_undo(&action) {
                log::debug!("undo: {}", action.describe());
                self.push_redo(inverse);
                return true;
            }
            log::warn!("skipping stale undo entry: {}", action.describe());
        }
        false
    }

    /// Re-applies the latest undone edit on `map`.
    ///
    /// # Returns
    ///
    /// `true` if something was redone.
    pub fn redo(&mut self, map: &mut WardleyMap) -> bool {
        while let Some(action) = self.pop_redo() {
            if let Some(inverse) = map.apply_redo(&action) {
                log::debug!("redo: {}", action.describe());
                self.push_undo(inverse);
                return true;
            }
            log::warn!("skipping stale redo entry: {}", action.describe());
        }
        false
    }
}

/// Extension methods for applying undo/redo actions to a map.
pub trait UndoableMap {
    /// Applies an undo action to reverse it, returning the inverse action.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Applies a redo action to re-apply it, returning the inverse action.
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableMap for WardleyMap {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::NodeCreated { node } => {
                let (index, node, connections) = self.delete_node(node.id).ok()?;
                Some(UndoAction::NodeDeleted {
                    node,
                    connections,
                    index,
                })
            }
            UndoAction::NodeDeleted {
                node,
                connections,
                index,
            } => {
                if self.node(node.id).is_some() {
                    return None;
                }
                self.insert_node(*index, node.clone());
                // Ascending order puts every connection back at its old index
                for (position, connection) in connections {
                    self.insert_connection(*position, *connection);
                }
                Some(UndoAction::NodeCreated { node: node.clone() })
            }
            UndoAction::NodeChanged { before, after } => {
                if self.replace_node(before.clone()) {
                    Some(UndoAction::NodeChanged {
                        before: after.clone(),
                        after: before.clone(),
                    })
                } else {
                    None
                }
            }
            UndoAction::ConnectionCreated { connection } => {
                let index = self.delete_connection(connection.from, connection.to)?;
                Some(UndoAction::ConnectionDeleted {
                    connection: *connection,
                    index,
                })
            }
            UndoAction::ConnectionDeleted { connection, index } => {
                if self.insert_connection(*index, *connection) {
                    Some(UndoAction::ConnectionCreated {
                        connection: *connection,
                    })
                } else {
                    None
                }
            }
            UndoAction::ZoneCreated { zone } => {
                let (index, zone) = self.delete_zone(zone.id).ok()?;
                Some(UndoAction::ZoneDeleted { zone, index })
            }
            UndoAction::ZoneDeleted { zone, index } => {
                if self.zone(zone.id).is_some() {
                    return None;
                }
                self.insert_zone(*index, zone.clone());
                Some(UndoAction::ZoneCreated { zone: zone.clone() })
            }
            UndoAction::ZoneChanged { before, after } => {
                if self.replace_zone(before.clone()) {
                    Some(UndoAction::ZoneChanged {
                        before: after.clone(),
                        after: before.clone(),
                    })
                } else {
                    None
                }
            }
            UndoAction::DocumentReplaced { before, after } => {
                self.restore(before.clone());
                Some(UndoAction::DocumentReplaced {
                    before: after.clone(),
                    after: before.clone(),
                })
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is just applying the reverse of an undo
        self.apply_undo(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn record_node(map: &mut WardleyMap, history: &mut UndoHistory, label: &str, stage: Stage) -> NodeId {
        let id = map.add_node(label, stage).unwrap();
        let node = map.node(id).unwrap().clone();
        history.push_action(UndoAction::NodeCreated { node });
        id
    }

    #[test]
    fn test_undo_redo_node_creation() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        let id = record_node(&mut map, &mut history, "A", Stage::Genesis);

        assert!(history.undo(&mut map));
        assert!(map.node(id).is_none());
        assert!(history.can_redo());

        assert!(history.redo(&mut map));
        assert_eq!(map.node(id).unwrap().label, "A");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_delete_restores_node_and_connections_in_order() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        let a = record_node(&mut map, &mut history, "A", Stage::Genesis);
        let b = record_node(&mut map, &mut history, "B", Stage::Custom);
        let c = record_node(&mut map, &mut history, "C", Stage::Product);
        map.add_connection(a, b);
        map.add_connection(c, a);
        map.add_connection(b, c);
        let before = map.serialize();

        let (index, node, connections) = map.delete_node(b).unwrap();
        history.push_action(UndoAction::NodeDeleted {
            node,
            connections,
            index,
        });
        assert_eq!(map.connections().len(), 1);

        assert!(history.undo(&mut map));
        assert_eq!(map.serialize(), before);

        assert!(history.redo(&mut map));
        assert!(map.node(b).is_none());
        assert_eq!(map.connections(), &[Connection::new(c, a)]);
    }

    #[test]
    fn test_undo_node_change() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        let id = record_node(&mut map, &mut history, "A", Stage::Genesis);
        let before = map.node(id).unwrap().clone();
        map.move_node(id, 1800.0, 500.0).unwrap();
        let after = map.node(id).unwrap().clone();
        history.push_action(UndoAction::NodeChanged { before, after });

        history.undo(&mut map);
        assert_eq!(map.node(id).unwrap().stage, Stage::Genesis);
        history.redo(&mut map);
        assert_eq!(map.node(id).unwrap().stage, Stage::Commodity);
    }

    #[test]
    fn test_undo_connection_and_zone_edits() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        let a = record_node(&mut map, &mut history, "A", Stage::Genesis);
        let b = record_node(&mut map, &mut history, "B", Stage::Custom);
        map.add_connection(a, b);
        history.push_action(UndoAction::ConnectionCreated {
            connection: Connection::new(a, b),
        });
        let zone = map.add_zone(ZoneType::War);
        history.push_action(UndoAction::ZoneCreated {
            zone: map.zone(zone).unwrap().clone(),
        });

        history.undo(&mut map);
        assert!(map.zones().is_empty());
        history.undo(&mut map);
        assert!(map.connections().is_empty());
        history.redo(&mut map);
        history.redo(&mut map);
        assert_eq!(map.connections().len(), 1);
        assert_eq!(map.zones().len(), 1);
    }

    #[test]
    fn test_undo_document_replacement() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        record_node(&mut map, &mut history, "Before", Stage::Genesis);
        let before = map.serialize();
        map.clear();
        history.push_action(UndoAction::DocumentReplaced {
            before: before.clone(),
            after: map.serialize(),
        });

        history.undo(&mut map);
        assert_eq!(map.serialize(), before);
        history.redo(&mut map);
        assert!(map.is_empty());
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        record_node(&mut map, &mut history, "A", Stage::Genesis);
        history.undo(&mut map);
        assert!(history.can_redo());
        record_node(&mut map, &mut history, "B", Stage::Genesis);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        for i in 0..(MAX_UNDO_HISTORY + 20) {
            record_node(&mut map, &mut history, &format!("N{i}"), Stage::Product);
        }
        let mut undone = 0;
        while history.undo(&mut map) {
            undone += 1;
        }
        assert_eq!(undone, MAX_UNDO_HISTORY);
        assert_eq!(map.nodes().len(), 20);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut map = WardleyMap::new();
        let mut history = UndoHistory::new();
        assert!(!history.undo(&mut map));
        assert!(!history.redo(&mut map));
    }
}
