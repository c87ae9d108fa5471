// src/models/registry.rs
//
// Owns every map entity and the containment relation between them.
// Insertion order of entities and of loaded ids is preserved.

use std::collections::{BTreeMap, HashMap};

use crate::models::MapEntity;

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<MapEntity>,
    index: HashMap<String, usize>,
    containment: BTreeMap<String, Vec<String>>,
}

impl EntityRegistry {
    /// Later duplicates of an id are dropped.
    pub fn new(entities: Vec<MapEntity>) -> Self {
        let mut registry = EntityRegistry::default();
        for entity in entities {
            registry.insert(entity);
        }
        registry
    }

    pub fn insert(&mut self, entity: MapEntity) -> bool {
        if self.index.contains_key(entity.id()) {
            return false;
        }
        self.index.insert(entity.id().to_string(), self.entities.len());
        self.entities.push(entity);
        true
    }

    pub fn get(&self, id: &str) -> Option<&MapEntity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MapEntity> {
        self.index.get(id).map(|&i| &mut self.entities[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapEntity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MapEntity> {
        self.entities.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(MapEntity::id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /************************* Containment ********************/

    pub fn load(&mut self, container: &str, loaded: &str) {
        let list = self.containment.entry(container.to_string()).or_default();
        if !list.iter().any(|id| id == loaded) {
            list.push(loaded.to_string());
        }
    }

    pub fn unload(&mut self, container: &str, loaded: &str) {
        if let Some(list) = self.containment.get_mut(container) {
            list.retain(|id| id != loaded);
            if list.is_empty() {
                self.containment.remove(container);
            }
        }
    }

    /// With `within`, membership in that container only; otherwise in any.
    pub fn is_loaded(&self, id: &str, within: Option<&str>) -> bool {
        match within {
            Some(container) => self
                .containment
                .get(container)
                .is_some_and(|list| list.iter().any(|l| l == id)),
            None => self.container_of(id).is_some(),
        }
    }

    pub fn container_of(&self, id: &str) -> Option<&str> {
        self.containment
            .iter()
            .find(|(_, list)| list.iter().any(|l| l == id))
            .map(|(container, _)| container.as_str())
    }

    pub fn containers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.containment
            .iter()
            .map(|(container, list)| (container.as_str(), list.as_slice()))
    }

    pub fn loaded_in(&self, container: &str) -> &[String] {
        self.containment
            .get(container)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn loaded_ids(&self) -> impl Iterator<Item = &str> {
        self.containment.values().flatten().map(String::as_str)
    }

    pub fn clear_containment(&mut self) {
        self.containment.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPosition;

    fn registry() -> EntityRegistry {
        let p = GeoPosition::new(45.0, 5.0, 0.0);
        EntityRegistry::new(vec![
            MapEntity::new("tru1", "tru1", "truck.svg", p),
            MapEntity::new("tru2", "tru2", "truck.svg", p),
            MapEntity::new("obj1", "obj1", "box.svg", p),
            MapEntity::new("obj1", "dup", "box.svg", p),
        ])
    }

    #[test]
    fn test_insertion_order_and_duplicates() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec!["tru1", "tru2", "obj1"]);
        assert_eq!(reg.get("obj1").map(MapEntity::name), Some("obj1"));
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut reg = registry();
        reg.load("tru1", "obj1");
        reg.load("tru1", "obj1");
        assert_eq!(reg.loaded_in("tru1"), &["obj1".to_string()]);
        assert!(reg.is_loaded("obj1", None));
        assert!(reg.is_loaded("obj1", Some("tru1")));
        assert!(!reg.is_loaded("obj1", Some("tru2")));
        assert_eq!(reg.container_of("obj1"), Some("tru1"));
    }

    #[test]
    fn test_unload_drops_empty_lists() {
        let mut reg = registry();
        reg.load("tru1", "obj1");
        reg.unload("tru1", "obj1");
        reg.unload("tru1", "obj1");
        assert!(!reg.is_loaded("obj1", None));
        assert_eq!(reg.containers().count(), 0);
        assert!(reg.loaded_in("tru1").is_empty());
    }

    #[test]
    fn test_clear_containment() {
        let mut reg = registry();
        reg.load("tru1", "obj1");
        reg.load("tru2", "tru1");
        assert_eq!(reg.loaded_ids().count(), 2);
        reg.clear_containment();
        assert_eq!(reg.loaded_ids().count(), 0);
    }
}
