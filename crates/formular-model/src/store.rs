//! Request-scoped entity index and relationship resolution

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::error::ModelError;

/// In-memory index of entities by id, built once per processing run
///
/// Iteration follows insertion order, so downstream results are
/// deterministic for a given input ordering.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: IndexMap<String, Entity>,
}

impl EntityStore {
    /// Index a batch of entities
    ///
    /// Duplicate ids are a configuration error supplied by the collaborator
    /// and reject the whole run.
    pub fn index(entities: Vec<Entity>) -> Result<Self, ModelError> {
        let mut map = IndexMap::with_capacity(entities.len());
        for entity in entities {
            if map.contains_key(&entity.id) {
                return Err(ModelError::duplicate_id(&entity.id));
            }
            map.insert(entity.id.clone(), entity);
        }
        Ok(Self { entities: map })
    }

    /// Look up an entity by id
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// All entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities carrying the given type tag, in insertion order
    pub fn of_type<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.entities.values().filter(move |e| e.has_type(tag))
    }

    /// Resolve the implicit relationship "child points at parent"
    ///
    /// Returns every entity tagged `target_type` that has at least one
    /// attribute whose raw value equals `source_id`. Multiple qualifying
    /// attributes on one entity still yield a single match. The resolver
    /// never infers the reverse direction.
    pub fn related(&self, source_id: &str, target_type: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| {
                e.has_type(target_type) && e.attributes.iter().any(|a| a.value == source_id)
            })
            .collect()
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Attribute;
    use pretty_assertions::assert_eq;

    fn sample() -> EntityStore {
        EntityStore::index(vec![
            Entity::new("C1", "Contract").with_attribute(Attribute::number("ISS", "0.05")),
            Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
            Entity::new("S2", "Servico").with_attribute(Attribute::text("contractId", "C2")),
            Entity::new("M1", "Medicao")
                .with_attribute(Attribute::text("serviceId", "S1"))
                .with_attribute(Attribute::text("backupRef", "S1")),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = EntityStore::index(vec![
            Entity::new("E1", "Produto"),
            Entity::new("E1", "Produto"),
        ])
        .unwrap_err();
        assert_eq!(err, ModelError::duplicate_id("E1"));
    }

    #[test]
    fn related_matches_on_attribute_value_and_type() {
        let store = sample();
        let children = store.related("C1", "Servico");
        assert_eq!(
            children.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["S1"]
        );
    }

    #[test]
    fn related_deduplicates_multiple_qualifying_attributes() {
        // M1 points at S1 through two attributes but matches once
        let store = sample();
        let children = store.related("S1", "Medicao");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "M1");
    }

    #[test]
    fn related_requires_the_target_type_tag() {
        let store = sample();
        assert!(store.related("C1", "Medicao").is_empty());
    }

    #[test]
    fn related_is_one_directional() {
        // S1 declares C1's id; nothing infers the reverse
        let store = sample();
        assert!(store.related("S1", "Contract").is_empty());
    }

    #[test]
    fn of_type_respects_multiple_tags() {
        let store = EntityStore::index(vec![Entity {
            id: "X1".to_string(),
            entity_type: vec!["Servico".to_string(), "Medicao".to_string()],
            attributes: Vec::new(),
        }])
        .unwrap();
        assert_eq!(store.of_type("Servico").count(), 1);
        assert_eq!(store.of_type("Medicao").count(), 1);
        assert_eq!(store.of_type("Contract").count(), 0);
    }
}
