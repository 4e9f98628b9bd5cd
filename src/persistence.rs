//! Bridge between the map model and durable key-value storage.
//!
//! The whole document is written under one fixed key after every committed
//! change. Export and import use the same JSON shape as the storage slot.

use crate::error::MapError;
use crate::types::WardleyMap;
use std::collections::HashMap;

/// Storage key holding the current map document.
pub const DOCUMENT_KEY: &str = "wardleyMapData";

/// Storage key holding the AI coach conversation.
pub const COACH_KEY: &str = "wardleyMapCoachMessages";

/// Serializes the map and writes it to the document slot.
pub fn save_document(storage: &mut dyn eframe::Storage, map: &WardleyMap) -> Result<(), MapError> {
    let json = export_text(map)?;
    storage.set_string(DOCUMENT_KEY, json);
    storage.flush();
    log::debug!("saved map with {} components", map.nodes().len());
    Ok(())
}

/// Reads the document slot.
///
/// An absent slot yields an empty map. So does an unreadable one, after logging
/// the problem; a broken slot must never keep the editor from starting.
pub fn load_document(storage: &dyn eframe::Storage) -> WardleyMap {
    let mut map = WardleyMap::new();
    let Some(text) = storage.get_string(DOCUMENT_KEY) else {
        log::info!("no saved map found, starting empty");
        return map;
    };
    match import_text(&mut map, &text) {
        Ok(()) => log::info!(
            "restored map: {} components, {} connections, {} zones",
            map.nodes().len(),
            map.connections().len(),
            map.zones().len()
        ),
        Err(err) => log::error!("discarding unreadable saved map: {err}"),
    }
    map
}

/// The map as user-visible JSON text.
pub fn export_text(map: &WardleyMap) -> Result<String, MapError> {
    Ok(map.serialize().to_json()?)
}

/// Replaces the map with the document in `text`.
///
/// Malformed JSON or a document failing validation is a [`MapError::Format`]
/// and leaves `map` untouched.
pub fn import_text(map: &mut WardleyMap, text: &str) -> Result<(), MapError> {
    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    map.deserialize(&value)
}

/// In-memory [`eframe::Storage`], used by tests and when no native storage is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    /// Number of times `flush` was called
    pub flushes: usize,
}

impl eframe::Storage for MemoryStorage {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use eframe::Storage;

    #[test]
    fn test_absent_slot_loads_empty_map() {
        let storage = MemoryStorage::default();
        let map = load_document(&storage);
        assert!(map.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut map = WardleyMap::new();
        let a = map.add_node("User", Stage::Genesis).unwrap();
        let b = map.add_node("Compute", Stage::Commodity).unwrap();
        map.add_connection(a, b);

        let mut storage = MemoryStorage::default();
        save_document(&mut storage, &map).unwrap();
        assert_eq!(storage.flushes, 1);
        assert!(storage.get_string(DOCUMENT_KEY).is_some());

        let loaded = load_document(&storage);
        assert_eq!(loaded.serialize(), map.serialize());
    }

    #[test]
    fn test_corrupt_slot_loads_empty_map() {
        let mut storage = MemoryStorage::default();
        storage.set_string(DOCUMENT_KEY, "{ not json".to_string());
        assert!(load_document(&storage).is_empty());
    }

    #[test]
    fn test_export_clear_import_scenario() {
        let mut map = WardleyMap::new();
        let a = map.add_node("A", Stage::Genesis).unwrap();
        let b = map.add_node("B", Stage::Custom).unwrap();
        map.add_connection(a, b);

        let exported = export_text(&map).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["connections"], serde_json::json!([{"from": 0, "to": 1}]));

        map.clear();
        assert_eq!(
            (map.nodes().len(), map.connections().len(), map.zones().len()),
            (0, 0, 0)
        );

        import_text(&mut map, &exported).unwrap();
        assert_eq!(map.nodes().len(), 2);
        assert_eq!(map.connections().len(), 1);
        assert_eq!(map.nodes()[0].label, "A");
        assert_eq!(map.nodes()[0].stage, Stage::Genesis);
        assert_eq!(map.nodes()[1].label, "B");
        assert_eq!(map.nodes()[1].stage, Stage::Custom);
    }

    #[test]
    fn test_import_invalid_json_keeps_state() {
        let mut map = WardleyMap::new();
        map.add_node("Keep me", Stage::Product).unwrap();
        let before = map.serialize();

        let err = import_text(&mut map, "{ invalid json }").unwrap_err();
        assert!(matches!(err, MapError::Format(_)));
        assert!(err.to_string().contains("Invalid JSON"));
        assert_eq!(map.serialize(), before);
    }

    #[test]
    fn test_import_literal_payload() {
        let mut map = WardleyMap::new();
        let payload = r#"{"nodes":[{"id":0,"label":"Imported Component","x":300,"y":200,"stage":"product"}],"connections":[],"zones":[]}"#;
        import_text(&mut map, payload).unwrap();
        assert_eq!(map.nodes().len(), 1);
        assert_eq!(map.nodes()[0].label, "Imported Component");
    }
}
