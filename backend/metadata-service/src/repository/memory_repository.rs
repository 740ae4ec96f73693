use super::query::EntityQuery;
use super::r#trait::MetadataRepository;
use crate::domain::{
    Anchor, Classification, Entity, Guid, InstanceProperties, InstanceStatus, NewEntity,
    NewRelationship, Relationship,
};
use chrono::Utc;
use error_types::{MetadataError, MetadataResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    entities: HashMap<Guid, Entity>,
    relationships: HashMap<Guid, Relationship>,
}

impl Store {
    fn entity_mut(&mut self, guid: Guid, method: &str) -> MetadataResult<&mut Entity> {
        self.entities
            .get_mut(&guid)
            .ok_or_else(|| MetadataError::property_server(method, format!("entity {guid} is not stored")))
    }

    fn relationship_mut(&mut self, guid: Guid, method: &str) -> MetadataResult<&mut Relationship> {
        self.relationships.get_mut(&guid).ok_or_else(|| {
            MetadataError::property_server(method, format!("relationship {guid} is not stored"))
        })
    }
}

/// In-process metadata store (default backend and test double)
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MetadataRepository for InMemoryRepository {
    async fn create_entity(&self, entity: NewEntity) -> MetadataResult<Guid> {
        let guid = Uuid::new_v4();
        let entity = Entity::new(guid, entity, Utc::now());
        debug!(%guid, type_name = %entity.type_name, "Created entity in memory");
        self.store.write().await.entities.insert(guid, entity);
        Ok(guid)
    }

    async fn get_entity(&self, guid: Guid) -> MetadataResult<Option<Entity>> {
        Ok(self.store.read().await.entities.get(&guid).cloned())
    }

    async fn update_entity_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "update_entity_properties")?;
        entity.properties = properties;
        entity.touch(user_id);
        Ok(())
    }

    async fn update_entity_status(
        &self,
        guid: Guid,
        status: InstanceStatus,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "update_entity_status")?;
        entity.status = status;
        entity.touch(user_id);
        Ok(())
    }

    async fn set_entity_anchor(
        &self,
        guid: Guid,
        anchor: Option<Anchor>,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "set_entity_anchor")?;
        entity.anchor = anchor;
        entity.touch(user_id);
        Ok(())
    }

    async fn delete_entity(&self, guid: Guid, user_id: &str) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "delete_entity")?;
        entity.status = InstanceStatus::Deleted;
        entity.touch(user_id);

        for relationship in store
            .relationships
            .values_mut()
            .filter(|relationship| relationship.touches(guid) && !relationship.is_deleted())
        {
            relationship.status = InstanceStatus::Deleted;
            relationship.touch(user_id);
        }
        debug!(%guid, "Soft deleted entity in memory");
        Ok(())
    }

    async fn classify_entity(
        &self,
        guid: Guid,
        classification: Classification,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "classify_entity")?;
        entity.upsert_classification(classification);
        entity.touch(user_id);
        Ok(())
    }

    async fn declassify_entity(
        &self,
        guid: Guid,
        name: &str,
        user_id: &str,
    ) -> MetadataResult<bool> {
        let mut store = self.store.write().await;
        let entity = store.entity_mut(guid, "declassify_entity")?;
        let removed = entity.remove_classification(name);
        if removed {
            entity.touch(user_id);
        }
        Ok(removed)
    }

    async fn create_relationship(&self, relationship: NewRelationship) -> MetadataResult<Guid> {
        let guid = Uuid::new_v4();
        let relationship = Relationship::new(guid, relationship, Utc::now());
        debug!(
            %guid,
            type_name = %relationship.type_name,
            end1 = %relationship.end1_guid,
            end2 = %relationship.end2_guid,
            "Created relationship in memory"
        );
        self.store.write().await.relationships.insert(guid, relationship);
        Ok(guid)
    }

    async fn get_relationship(&self, guid: Guid) -> MetadataResult<Option<Relationship>> {
        Ok(self.store.read().await.relationships.get(&guid).cloned())
    }

    async fn get_relationships(
        &self,
        entity_guid: Guid,
        type_name: Option<&str>,
    ) -> MetadataResult<Vec<Relationship>> {
        let store = self.store.read().await;
        let mut relationships: Vec<Relationship> = store
            .relationships
            .values()
            .filter(|relationship| {
                relationship.touches(entity_guid)
                    && !relationship.is_deleted()
                    && type_name.map_or(true, |name| relationship.type_name == name)
            })
            .cloned()
            .collect();
        relationships.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.guid.cmp(&b.guid)));
        Ok(relationships)
    }

    async fn update_relationship_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let relationship = store.relationship_mut(guid, "update_relationship_properties")?;
        relationship.properties = properties;
        relationship.touch(user_id);
        Ok(())
    }

    async fn delete_relationship(&self, guid: Guid, user_id: &str) -> MetadataResult<()> {
        let mut store = self.store.write().await;
        let relationship = store.relationship_mut(guid, "delete_relationship")?;
        relationship.status = InstanceStatus::Deleted;
        relationship.touch(user_id);
        Ok(())
    }

    async fn find_entities(&self, query: &EntityQuery) -> MetadataResult<Vec<Entity>> {
        let store = self.store.read().await;
        let matches: Vec<Entity> = store
            .entities
            .values()
            .filter(|entity| query.matches_entity(entity))
            .cloned()
            .collect();
        Ok(query.page(matches))
    }

    async fn find_anchored(&self, anchor_guid: Guid) -> MetadataResult<Vec<Entity>> {
        let store = self.store.read().await;
        let mut anchored: Vec<Entity> = store
            .entities
            .values()
            .filter(|entity| {
                entity.guid != anchor_guid
                    && !entity.is_deleted()
                    && entity.anchor().map_or(false, |anchor| anchor.anchor_guid == anchor_guid)
            })
            .cloned()
            .collect();
        anchored.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.guid.cmp(&b.guid)));
        Ok(anchored)
    }
}
