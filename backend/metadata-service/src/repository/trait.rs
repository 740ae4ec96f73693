use super::query::EntityQuery;
use crate::domain::{
    Anchor, Classification, Entity, Guid, InstanceProperties, InstanceStatus, NewEntity,
    NewRelationship, Relationship,
};
use error_types::MetadataResult;

/// Trait defining the metadata store used by every handler.
/// Individual calls are atomic; sequences of calls are not.
#[async_trait::async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Store a new entity and return its guid
    async fn create_entity(&self, entity: NewEntity) -> MetadataResult<Guid>;

    /// Fetch an entity in any status, including `Deleted`
    async fn get_entity(&self, guid: Guid) -> MetadataResult<Option<Entity>>;

    /// Replace the entity's property bag
    async fn update_entity_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()>;

    async fn update_entity_status(
        &self,
        guid: Guid,
        status: InstanceStatus,
        user_id: &str,
    ) -> MetadataResult<()>;

    async fn set_entity_anchor(
        &self,
        guid: Guid,
        anchor: Option<Anchor>,
        user_id: &str,
    ) -> MetadataResult<()>;

    /// Soft delete: the entity and its relationships move to `Deleted`
    async fn delete_entity(&self, guid: Guid, user_id: &str) -> MetadataResult<()>;

    /// Insert or replace a classification by name
    async fn classify_entity(
        &self,
        guid: Guid,
        classification: Classification,
        user_id: &str,
    ) -> MetadataResult<()>;

    /// Returns false when the classification was not present
    async fn declassify_entity(&self, guid: Guid, name: &str, user_id: &str)
        -> MetadataResult<bool>;

    async fn create_relationship(&self, relationship: NewRelationship) -> MetadataResult<Guid>;

    async fn get_relationship(&self, guid: Guid) -> MetadataResult<Option<Relationship>>;

    /// Non-deleted relationships touching the entity at either end
    async fn get_relationships(
        &self,
        entity_guid: Guid,
        type_name: Option<&str>,
    ) -> MetadataResult<Vec<Relationship>>;

    async fn update_relationship_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()>;

    async fn delete_relationship(&self, guid: Guid, user_id: &str) -> MetadataResult<()>;

    async fn find_entities(&self, query: &EntityQuery) -> MetadataResult<Vec<Entity>>;

    /// Non-deleted entities whose anchor points at `anchor_guid` (excluding itself)
    async fn find_anchored(&self, anchor_guid: Guid) -> MetadataResult<Vec<Entity>>;

    /// Health check (optional)
    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }
}
