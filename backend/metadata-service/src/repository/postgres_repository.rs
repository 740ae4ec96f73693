use super::query::EntityQuery;
use super::r#trait::MetadataRepository;
use crate::domain::{
    Anchor, Classification, Entity, Guid, InstanceProperties, InstanceStatus, NewEntity,
    NewRelationship, Relationship,
};
use chrono::{DateTime, Utc};
use error_types::{ErrorContext, MetadataError, MetadataResult};
use sqlx::migrate::Migrator;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const ENTITY_COLUMNS: &str = "guid, type_name, status, properties, classifications, anchor, \
     created_by, updated_by, created_at, updated_at, version";

const RELATIONSHIP_COLUMNS: &str = "guid, type_name, end1_guid, end2_guid, properties, status, \
     created_by, updated_by, created_at, updated_at, version";

#[derive(sqlx::FromRow)]
struct EntityRow {
    guid: Uuid,
    type_name: String,
    status: String,
    properties: Json<InstanceProperties>,
    classifications: Json<Vec<Classification>>,
    anchor: Option<Json<Anchor>>,
    created_by: String,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<EntityRow> for Entity {
    type Error = MetadataError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Entity {
            guid: row.guid,
            type_name: row.type_name,
            status: parse_status(&row.status)?,
            properties: row.properties.0,
            classifications: row.classifications.0,
            anchor: row.anchor.map(|anchor| anchor.0),
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RelationshipRow {
    guid: Uuid,
    type_name: String,
    end1_guid: Uuid,
    end2_guid: Uuid,
    properties: Json<InstanceProperties>,
    status: String,
    created_by: String,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<RelationshipRow> for Relationship {
    type Error = MetadataError;

    fn try_from(row: RelationshipRow) -> Result<Self, Self::Error> {
        Ok(Relationship {
            guid: row.guid,
            type_name: row.type_name,
            end1_guid: row.end1_guid,
            end2_guid: row.end2_guid,
            properties: row.properties.0,
            status: parse_status(&row.status)?,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn parse_status(status: &str) -> MetadataResult<InstanceStatus> {
    status
        .parse::<InstanceStatus>()
        .map_err(|message| MetadataError::property_server("parse_status", message))
}

/// PostgreSQL-backed metadata store.
/// Property matching runs in-process after a type/status/scope prefilter.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> MetadataResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .context("Failed to run metadata migrations")
    }

    async fn lock_entity(
        tx: &mut Transaction<'_, Postgres>,
        guid: Guid,
        method: &str,
    ) -> MetadataResult<Entity> {
        let row: Option<EntityRow> = sqlx::query_as(&format!(
            "SELECT {ENTITY_COLUMNS} FROM metadata_entities WHERE guid = $1 FOR UPDATE"
        ))
        .bind(guid)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to lock entity in PostgreSQL")?;

        row.map(Entity::try_from)
            .transpose()?
            .ok_or_else(|| MetadataError::property_server(method, format!("entity {guid} is not stored")))
    }

    async fn store_classifications(
        tx: &mut Transaction<'_, Postgres>,
        entity: &Entity,
        user_id: &str,
    ) -> MetadataResult<()> {
        sqlx::query(
            r#"
            UPDATE metadata_entities
            SET classifications = $2, updated_by = $3, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(entity.guid)
        .bind(Json(&entity.classifications))
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .context("Failed to store classifications in PostgreSQL")?;
        Ok(())
    }

    fn ensure_updated(rows_affected: u64, kind: &str, guid: Guid, method: &str) -> MetadataResult<()> {
        if rows_affected == 0 {
            return Err(MetadataError::property_server(
                method,
                format!("{kind} {guid} is not stored"),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataRepository for PostgresRepository {
    async fn create_entity(&self, entity: NewEntity) -> MetadataResult<Guid> {
        let guid = Uuid::new_v4();
        let anchor_guid = entity.anchor.as_ref().map(|anchor| anchor.anchor_guid);
        let anchor_scope_guid = entity.anchor.as_ref().and_then(|anchor| anchor.anchor_scope_guid);

        sqlx::query(
            r#"
            INSERT INTO metadata_entities
                (guid, type_name, status, properties, classifications, anchor,
                 anchor_guid, anchor_scope_guid, created_by, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW(), 1)
            "#,
        )
        .bind(guid)
        .bind(&entity.type_name)
        .bind(entity.status.as_str())
        .bind(Json(&entity.properties))
        .bind(Json(&entity.classifications))
        .bind(entity.anchor.as_ref().map(Json))
        .bind(anchor_guid)
        .bind(anchor_scope_guid)
        .bind(&entity.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to create entity in PostgreSQL")?;

        debug!(%guid, type_name = %entity.type_name, "Created entity in PostgreSQL");
        Ok(guid)
    }

    async fn get_entity(&self, guid: Guid) -> MetadataResult<Option<Entity>> {
        let row: Option<EntityRow> = sqlx::query_as(&format!(
            "SELECT {ENTITY_COLUMNS} FROM metadata_entities WHERE guid = $1"
        ))
        .bind(guid)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get entity from PostgreSQL")?;

        row.map(Entity::try_from).transpose()
    }

    async fn update_entity_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE metadata_entities
            SET properties = $2, updated_by = $3, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(Json(&properties))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to update entity properties in PostgreSQL")?;

        Self::ensure_updated(result.rows_affected(), "entity", guid, "update_entity_properties")
    }

    async fn update_entity_status(
        &self,
        guid: Guid,
        status: InstanceStatus,
        user_id: &str,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE metadata_entities
            SET status = $2, updated_by = $3, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(status.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to update entity status in PostgreSQL")?;

        Self::ensure_updated(result.rows_affected(), "entity", guid, "update_entity_status")
    }

    async fn set_entity_anchor(
        &self,
        guid: Guid,
        anchor: Option<Anchor>,
        user_id: &str,
    ) -> MetadataResult<()> {
        let anchor_guid = anchor.as_ref().map(|anchor| anchor.anchor_guid);
        let anchor_scope_guid = anchor.as_ref().and_then(|anchor| anchor.anchor_scope_guid);

        let result = sqlx::query(
            r#"
            UPDATE metadata_entities
            SET anchor = $2, anchor_guid = $3, anchor_scope_guid = $4,
                updated_by = $5, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(anchor.as_ref().map(Json))
        .bind(anchor_guid)
        .bind(anchor_scope_guid)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to set entity anchor in PostgreSQL")?;

        Self::ensure_updated(result.rows_affected(), "entity", guid, "set_entity_anchor")
    }

    async fn delete_entity(&self, guid: Guid, user_id: &str) -> MetadataResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin PostgreSQL transaction")?;

        let result = sqlx::query(
            r#"
            UPDATE metadata_entities
            SET status = 'DELETED', updated_by = $2, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to soft delete entity in PostgreSQL")?;
        Self::ensure_updated(result.rows_affected(), "entity", guid, "delete_entity")?;

        sqlx::query(
            r#"
            UPDATE metadata_relationships
            SET status = 'DELETED', updated_by = $2, updated_at = NOW(), version = version + 1
            WHERE (end1_guid = $1 OR end2_guid = $1) AND status <> 'DELETED'
            "#,
        )
        .bind(guid)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to soft delete relationships in PostgreSQL")?;

        tx.commit()
            .await
            .context("Failed to commit PostgreSQL transaction")?;

        debug!(%guid, "Soft deleted entity in PostgreSQL");
        Ok(())
    }

    async fn classify_entity(
        &self,
        guid: Guid,
        classification: Classification,
        user_id: &str,
    ) -> MetadataResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin PostgreSQL transaction")?;

        let mut entity = Self::lock_entity(&mut tx, guid, "classify_entity").await?;
        entity.upsert_classification(classification);
        Self::store_classifications(&mut tx, &entity, user_id).await?;

        tx.commit()
            .await
            .context("Failed to commit PostgreSQL transaction")
    }

    async fn declassify_entity(
        &self,
        guid: Guid,
        name: &str,
        user_id: &str,
    ) -> MetadataResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin PostgreSQL transaction")?;

        let mut entity = Self::lock_entity(&mut tx, guid, "declassify_entity").await?;
        let removed = entity.remove_classification(name);
        if removed {
            Self::store_classifications(&mut tx, &entity, user_id).await?;
        }

        tx.commit()
            .await
            .context("Failed to commit PostgreSQL transaction")?;
        Ok(removed)
    }

    async fn create_relationship(&self, relationship: NewRelationship) -> MetadataResult<Guid> {
        let guid = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO metadata_relationships
                (guid, type_name, end1_guid, end2_guid, properties, status,
                 created_by, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, 'ACTIVE', $6, NOW(), NOW(), 1)
            "#,
        )
        .bind(guid)
        .bind(&relationship.type_name)
        .bind(relationship.end1_guid)
        .bind(relationship.end2_guid)
        .bind(Json(&relationship.properties))
        .bind(&relationship.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to create relationship in PostgreSQL")?;

        debug!(
            %guid,
            type_name = %relationship.type_name,
            end1 = %relationship.end1_guid,
            end2 = %relationship.end2_guid,
            "Created relationship in PostgreSQL"
        );
        Ok(guid)
    }

    async fn get_relationship(&self, guid: Guid) -> MetadataResult<Option<Relationship>> {
        let row: Option<RelationshipRow> = sqlx::query_as(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM metadata_relationships WHERE guid = $1"
        ))
        .bind(guid)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get relationship from PostgreSQL")?;

        row.map(Relationship::try_from).transpose()
    }

    async fn get_relationships(
        &self,
        entity_guid: Guid,
        type_name: Option<&str>,
    ) -> MetadataResult<Vec<Relationship>> {
        let rows: Vec<RelationshipRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RELATIONSHIP_COLUMNS} FROM metadata_relationships
            WHERE (end1_guid = $1 OR end2_guid = $1)
              AND status <> 'DELETED'
              AND ($2::TEXT IS NULL OR type_name = $2)
            ORDER BY created_at, guid
            "#
        ))
        .bind(entity_guid)
        .bind(type_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get relationships from PostgreSQL")?;

        rows.into_iter().map(Relationship::try_from).collect()
    }

    async fn update_relationship_properties(
        &self,
        guid: Guid,
        properties: InstanceProperties,
        user_id: &str,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE metadata_relationships
            SET properties = $2, updated_by = $3, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(Json(&properties))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to update relationship properties in PostgreSQL")?;

        Self::ensure_updated(
            result.rows_affected(),
            "relationship",
            guid,
            "update_relationship_properties",
        )
    }

    async fn delete_relationship(&self, guid: Guid, user_id: &str) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE metadata_relationships
            SET status = 'DELETED', updated_by = $2, updated_at = NOW(), version = version + 1
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete relationship in PostgreSQL")?;

        Self::ensure_updated(result.rows_affected(), "relationship", guid, "delete_relationship")
    }

    async fn find_entities(&self, query: &EntityQuery) -> MetadataResult<Vec<Entity>> {
        let statuses: Vec<String> = query
            .statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let rows: Vec<EntityRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ENTITY_COLUMNS} FROM metadata_entities
            WHERE (cardinality($1::TEXT[]) = 0 OR type_name = ANY($1))
              AND ((cardinality($2::TEXT[]) = 0 AND status <> 'DELETED') OR status = ANY($2))
              AND ($3::UUID IS NULL OR anchor_scope_guid = $3)
            ORDER BY created_at, guid
            "#
        ))
        .bind(&query.type_names)
        .bind(&statuses)
        .bind(query.anchor_scope_guid)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find entities in PostgreSQL")?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            let entity = Entity::try_from(row)?;
            if query.matches_entity(&entity) {
                matches.push(entity);
            }
        }
        Ok(query.page(matches))
    }

    async fn find_anchored(&self, anchor_guid: Guid) -> MetadataResult<Vec<Entity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ENTITY_COLUMNS} FROM metadata_entities
            WHERE anchor_guid = $1 AND guid <> $1 AND status <> 'DELETED'
            ORDER BY created_at, guid
            "#
        ))
        .bind(anchor_guid)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find anchored entities in PostgreSQL")?;

        rows.into_iter().map(Entity::try_from).collect()
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("PostgreSQL health check failed")?;
        Ok(())
    }
}
