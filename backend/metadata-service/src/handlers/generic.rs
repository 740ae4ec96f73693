//! Generic create/update/link/classify/search/remove primitives shared by
//! the typed handlers

use crate::domain::{
    property_names, Anchor, ArchiveProperties, Classification, Entity, Guid, InstanceProperties,
    InstanceStatus, NewEntity, NewRelationship, Relationship,
};
use crate::metrics;
use crate::repository::{EntityQuery, MetadataRepository, PropertyMatcher, PropertySearch};
use crate::security::{SecurityVerifier, ZoneSettings};
use crate::types::{AnchorRule, ClassificationTypeName, EntityTypeName, RelationshipTypeName, TypeRegistry, TypeStatus};
use crate::validation::InvalidParameterHandler;
use chrono::{DateTime, Utc};
use error_types::{MetadataError, MetadataResult};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Properties searched by value when a handler adds none of its own
pub const DEFAULT_SEARCH_PROPERTIES: &[&str] = &[
    property_names::QUALIFIED_NAME,
    property_names::DISPLAY_NAME,
    property_names::DESCRIPTION,
    property_names::ALIASES,
];

/// Properties matched exactly by name searches
pub const NAME_PROPERTIES: &[&str] = &[
    property_names::QUALIFIED_NAME,
    property_names::DISPLAY_NAME,
    property_names::ALIASES,
];

/// One end of a relationship to create
#[derive(Debug, Clone, Copy)]
pub struct LinkEnd {
    pub guid: Guid,
    pub parameter: &'static str,
    pub type_name: EntityTypeName,
}

impl LinkEnd {
    pub fn new(guid: Guid, parameter: &'static str, type_name: EntityTypeName) -> Self {
        Self {
            guid,
            parameter,
            type_name,
        }
    }
}

/// Search filters applied after the repository query
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions<'a> {
    pub statuses: &'a [InstanceStatus],
    pub effective_time: Option<DateTime<Utc>>,
    pub start_from: i32,
    pub page_size: i32,
}

impl<'a> SearchOptions<'a> {
    pub fn paged(start_from: i32, page_size: i32) -> Self {
        Self {
            start_from,
            page_size,
            ..Default::default()
        }
    }
}

/// Shared machinery behind every typed handler.
/// Holds only immutable configuration and `Arc`ed collaborators.
#[derive(Clone)]
pub struct GenericHandler {
    repository: Arc<dyn MetadataRepository>,
    security: Arc<dyn SecurityVerifier>,
    registry: Arc<TypeRegistry>,
    invalid_parameter_handler: InvalidParameterHandler,
    zones: Arc<ZoneSettings>,
    server_name: Arc<str>,
    handler_name: &'static str,
}

impl GenericHandler {
    pub fn new(
        repository: Arc<dyn MetadataRepository>,
        security: Arc<dyn SecurityVerifier>,
        registry: Arc<TypeRegistry>,
        invalid_parameter_handler: InvalidParameterHandler,
        zones: ZoneSettings,
        server_name: &str,
    ) -> Self {
        Self {
            repository,
            security,
            registry,
            invalid_parameter_handler,
            zones: Arc::new(zones),
            server_name: Arc::from(server_name),
            handler_name: "generic",
        }
    }

    /// Copy labelled with the owning handler's name for metrics
    pub fn named(&self, handler_name: &'static str) -> Self {
        Self {
            handler_name,
            ..self.clone()
        }
    }

    pub fn repository(&self) -> &Arc<dyn MetadataRepository> {
        &self.repository
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn invalid_parameter_handler(&self) -> &InvalidParameterHandler {
        &self.invalid_parameter_handler
    }

    pub fn zones(&self) -> &ZoneSettings {
        &self.zones
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Run one handler operation, recording its outcome
    pub async fn observe<T, F>(&self, operation: &'static str, future: F) -> MetadataResult<T>
    where
        F: Future<Output = MetadataResult<T>>,
    {
        let started = Instant::now();
        let result = future.await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => {
                debug!(handler = self.handler_name, operation, elapsed, "Handler operation completed");
                metrics::record_operation(self.handler_name, operation, "success", elapsed);
            }
            Err(error) => {
                error.log();
                metrics::record_operation(self.handler_name, operation, error.code(), elapsed);
            }
        }
        result
    }

    fn unknown_guid(&self, guid: Guid, parameter: &str, method: &str) -> MetadataError {
        MetadataError::invalid_parameter(
            parameter,
            method,
            format!("unknown guid {guid} on server {}", self.server_name),
        )
    }

    /// Stored type name as an enum; unknown stored types are server faults
    pub fn entity_type_of(&self, entity: &Entity, method: &str) -> MetadataResult<EntityTypeName> {
        entity.type_name.parse::<EntityTypeName>().map_err(|error| {
            MetadataError::property_server(method, format!("entity {} has {error}", entity.guid))
        })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Visible when the verifier accepts the entity and, for dependents, its anchor
    pub async fn is_visible(&self, user_id: &str, entity: &Entity) -> MetadataResult<bool> {
        if !self.security.is_visible(user_id, entity) {
            return Ok(false);
        }
        if let Some(anchor) = entity.anchor().filter(|_| entity.is_dependent()) {
            if let Some(anchor_entity) = self.repository.get_entity(anchor.anchor_guid).await? {
                return Ok(self.security.is_visible(user_id, &anchor_entity));
            }
        }
        Ok(true)
    }

    /// Fetch a live, visible entity of the expected (sub)type
    pub async fn get_entity(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        effective_time: Option<DateTime<Utc>>,
        method: &str,
    ) -> MetadataResult<Entity> {
        self.invalid_parameter_handler.validate_user_id(user_id, method)?;
        self.invalid_parameter_handler.validate_guid(guid, parameter, method)?;

        let entity = self
            .repository
            .get_entity(guid)
            .await?
            .filter(|entity| !entity.is_deleted())
            .ok_or_else(|| self.unknown_guid(guid, parameter, method))?;

        if !self.registry.is_subtype_name_of(&entity.type_name, expected_type) {
            return Err(MetadataError::invalid_parameter(
                parameter,
                method,
                format!("guid {guid} is a {} rather than a {expected_type}", entity.type_name),
            ));
        }

        if !entity.properties.effectivity().is_effective_at(effective_time) {
            return Err(self.unknown_guid(guid, parameter, method));
        }

        if !self.is_visible(user_id, &entity).await? {
            debug!(user_id, %guid, "Entity hidden by zone membership");
            return Err(self.unknown_guid(guid, parameter, method));
        }

        self.security.validate_user_for_read(user_id, &entity).await?;
        Ok(entity)
    }

    pub async fn get_entity_for_update(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        method: &str,
    ) -> MetadataResult<Entity> {
        let entity = self
            .get_entity(user_id, guid, parameter, expected_type, None, method)
            .await?;
        self.security.validate_user_for_write(user_id, &entity).await?;
        Ok(entity)
    }

    // ------------------------------------------------------------------
    // Property mapper
    // ------------------------------------------------------------------

    async fn check_unique_qualified_name(
        &self,
        qualified_name: &str,
        anchor_scope: Option<Guid>,
        existing_guid: Option<Guid>,
        method: &str,
    ) -> MetadataResult<()> {
        let query = EntityQuery::default()
            .with_search(PropertySearch::new(
                &[property_names::QUALIFIED_NAME],
                PropertyMatcher::Exact(qualified_name.to_string()),
            ))
            .in_scope(anchor_scope);

        let clash = self
            .repository
            .find_entities(&query)
            .await?
            .into_iter()
            .any(|entity| Some(entity.guid) != existing_guid);

        if clash {
            return Err(MetadataError::invalid_parameter(
                property_names::QUALIFIED_NAME,
                method,
                format!("qualified name {qualified_name} is already in use"),
            ));
        }
        Ok(())
    }

    fn check_type_active(&self, type_name: EntityTypeName, method: &str) -> MetadataResult<()> {
        if self.registry.entity_type_status(type_name) != TypeStatus::Active {
            return Err(MetadataError::invalid_parameter(
                "typeName",
                method,
                format!("type {type_name} is not active"),
            ));
        }
        Ok(())
    }

    /// Create an entity from a property bag. Assets without zones receive
    /// the default zones.
    pub async fn create_bean(
        &self,
        user_id: &str,
        type_name: EntityTypeName,
        mut properties: InstanceProperties,
        initial_status: Option<InstanceStatus>,
        anchor_scope: Option<Guid>,
        method: &str,
    ) -> MetadataResult<Guid> {
        self.invalid_parameter_handler.validate_user_id(user_id, method)?;
        self.check_type_active(type_name, method)?;

        let qualified_name = properties
            .string(property_names::QUALIFIED_NAME)
            .map(str::to_string);
        self.invalid_parameter_handler.validate_name(
            qualified_name.as_deref(),
            property_names::QUALIFIED_NAME,
            method,
        )?;

        let window = properties.effectivity();
        self.invalid_parameter_handler
            .validate_effectivity(window.effective_from, window.effective_to, method)?;

        let status = initial_status.unwrap_or_default();
        if status == InstanceStatus::Deleted {
            return Err(MetadataError::invalid_parameter(
                "initialStatus",
                method,
                "an element cannot be created in DELETED status",
            ));
        }

        self.security
            .validate_user_for_create(user_id, type_name.as_str())
            .await?;

        if let Some(qualified_name) = qualified_name.as_deref() {
            self.check_unique_qualified_name(qualified_name, anchor_scope, None, method)
                .await?;
        }

        if self.registry.is_subtype_of(type_name, EntityTypeName::Asset)
            && !properties.contains(property_names::ZONE_MEMBERSHIP)
            && !self.zones.default_zones.is_empty()
        {
            properties = properties
                .with_string_array(property_names::ZONE_MEMBERSHIP, &self.zones.default_zones);
        }

        let guid = self
            .repository
            .create_entity(NewEntity {
                type_name: type_name.as_str().to_string(),
                properties,
                classifications: Vec::new(),
                status,
                anchor: None,
                user_id: user_id.to_string(),
            })
            .await?;

        info!(user_id, %guid, type_name = %type_name, method, "Created element");
        Ok(guid)
    }

    /// Create an entity of the template's type from the template's
    /// properties overlaid with `overlay`. The template's qualified name and
    /// zones are never copied, nor is a Memento classification.
    pub async fn create_bean_from_template(
        &self,
        user_id: &str,
        template_guid: Guid,
        expected_base: EntityTypeName,
        overlay: InstanceProperties,
        anchor_scope: Option<Guid>,
        method: &str,
    ) -> MetadataResult<Guid> {
        let template = self
            .get_entity(user_id, template_guid, "templateGUID", expected_base, None, method)
            .await?;
        let type_name = self.entity_type_of(&template, method)?;

        if overlay.string(property_names::QUALIFIED_NAME).is_none() {
            return Err(MetadataError::invalid_parameter(
                property_names::QUALIFIED_NAME,
                method,
                "a qualified name must be supplied when copying a template",
            ));
        }

        let mut properties = template
            .properties
            .clone()
            .without(property_names::QUALIFIED_NAME)
            .without(property_names::ZONE_MEMBERSHIP);
        properties.merge(&overlay);

        let guid = self
            .create_bean(user_id, type_name, properties, None, anchor_scope, method)
            .await?;

        let memento = ClassificationTypeName::Memento.as_str();
        for classification in template.classifications.iter().filter(|c| c.name != memento) {
            self.repository
                .classify_entity(
                    guid,
                    Classification::new(
                        classification.name.clone(),
                        classification.properties.clone(),
                        user_id,
                    ),
                    user_id,
                )
                .await?;
        }

        debug!(user_id, %guid, %template_guid, "Copied element from template");
        Ok(guid)
    }

    /// Merge overlays the supplied values; replace swaps the whole bag but
    /// keeps the zone membership when none is supplied.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_bean(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        properties: InstanceProperties,
        is_merge_update: bool,
        method: &str,
    ) -> MetadataResult<()> {
        let entity = self
            .get_entity_for_update(user_id, guid, parameter, expected_type, method)
            .await?;

        let window = properties.effectivity();
        self.invalid_parameter_handler
            .validate_effectivity(window.effective_from, window.effective_to, method)?;

        let updated = if is_merge_update {
            let mut merged = entity.properties.clone();
            merged.merge(&properties);
            merged
        } else {
            self.invalid_parameter_handler.validate_name(
                properties.string(property_names::QUALIFIED_NAME),
                property_names::QUALIFIED_NAME,
                method,
            )?;
            let mut replacement = properties;
            if !replacement.contains(property_names::ZONE_MEMBERSHIP) {
                if let Some(zones) = entity.properties.get(property_names::ZONE_MEMBERSHIP) {
                    replacement.set(property_names::ZONE_MEMBERSHIP, zones.clone());
                }
            }
            replacement
        };

        let merged_window = updated.effectivity();
        self.invalid_parameter_handler.validate_effectivity(
            merged_window.effective_from,
            merged_window.effective_to,
            method,
        )?;

        if let Some(qualified_name) = updated.string(property_names::QUALIFIED_NAME) {
            if Some(qualified_name) != entity.qualified_name() {
                self.check_unique_qualified_name(
                    qualified_name,
                    entity.anchor_scope_guid(),
                    Some(guid),
                    method,
                )
                .await?;
            }
        }

        self.repository
            .update_entity_properties(guid, updated, user_id)
            .await?;

        info!(user_id, %guid, is_merge_update, method, "Updated element");
        Ok(())
    }

    pub async fn update_status(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        status: InstanceStatus,
        method: &str,
    ) -> MetadataResult<()> {
        if status == InstanceStatus::Deleted {
            return Err(MetadataError::invalid_parameter(
                "newStatus",
                method,
                "use the remove operation to delete an element",
            ));
        }
        self.get_entity_for_update(user_id, guid, parameter, expected_type, method)
            .await?;
        self.repository
            .update_entity_status(guid, status, user_id)
            .await?;

        info!(user_id, %guid, %status, method, "Updated element status");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Relationship linker
    // ------------------------------------------------------------------

    fn owner_anchor(owner: &Entity) -> Anchor {
        match owner.anchor() {
            Some(anchor) if owner.is_dependent() => anchor.clone(),
            _ => Anchor {
                anchor_guid: owner.guid,
                anchor_type_name: owner.type_name.clone(),
                anchor_scope_guid: owner.anchor_scope_guid(),
            },
        }
    }

    fn derived_anchor(owner: &Entity, dependent: &Entity, rule: AnchorRule) -> Anchor {
        match rule {
            AnchorRule::Anchors => Self::owner_anchor(owner),
            AnchorRule::AnchorsWithScope => Anchor {
                anchor_scope_guid: Some(owner.guid),
                ..Self::owner_anchor(owner)
            },
            AnchorRule::ScopesOnly => Anchor {
                anchor_guid: dependent.guid,
                anchor_type_name: dependent.type_name.clone(),
                anchor_scope_guid: Some(owner.guid),
            },
        }
    }

    /// Link two live entities; anchoring relationships re-derive the anchor
    /// of end2
    pub async fn link_elements(
        &self,
        user_id: &str,
        end1: LinkEnd,
        end2: LinkEnd,
        relationship: RelationshipTypeName,
        properties: InstanceProperties,
        method: &str,
    ) -> MetadataResult<Guid> {
        let end1_entity = self
            .get_entity_for_update(user_id, end1.guid, end1.parameter, end1.type_name, method)
            .await?;
        let end2_entity = self
            .get_entity_for_update(user_id, end2.guid, end2.parameter, end2.type_name, method)
            .await?;

        self.registry.validate_relationship_ends(
            relationship,
            &end1_entity.type_name,
            &end2_entity.type_name,
            method,
        )?;

        let window = properties.effectivity();
        self.invalid_parameter_handler
            .validate_effectivity(window.effective_from, window.effective_to, method)?;

        let relationship_guid = self
            .repository
            .create_relationship(NewRelationship {
                type_name: relationship.as_str().to_string(),
                end1_guid: end1.guid,
                end2_guid: end2.guid,
                properties,
                user_id: user_id.to_string(),
            })
            .await?;

        if let Some(rule) = self.registry.anchor_rule(relationship) {
            let anchor = Self::derived_anchor(&end1_entity, &end2_entity, rule);
            debug!(
                dependent = %end2.guid,
                anchor = %anchor.anchor_guid,
                scope = ?anchor.anchor_scope_guid,
                "Derived anchor"
            );
            self.repository
                .set_entity_anchor(end2.guid, Some(anchor), user_id)
                .await?;
        }

        info!(
            user_id,
            %relationship_guid,
            relationship = %relationship,
            end1 = %end1.guid,
            end2 = %end2.guid,
            method,
            "Linked elements"
        );
        Ok(relationship_guid)
    }

    /// Live relationships of `relationship` running from `end1` to `end2`
    pub async fn find_relationships_between(
        &self,
        end1_guid: Guid,
        end2_guid: Guid,
        relationship: RelationshipTypeName,
    ) -> MetadataResult<Vec<Relationship>> {
        Ok(self
            .repository
            .get_relationships(end1_guid, Some(relationship.as_str()))
            .await?
            .into_iter()
            .filter(|r| r.end1_guid == end1_guid && r.end2_guid == end2_guid)
            .collect())
    }

    /// Remove every matching relationship; none is a no-op. Returns the count.
    pub async fn unlink_elements(
        &self,
        user_id: &str,
        end1: LinkEnd,
        end2: LinkEnd,
        relationship: RelationshipTypeName,
        method: &str,
    ) -> MetadataResult<usize> {
        self.get_entity_for_update(user_id, end1.guid, end1.parameter, end1.type_name, method)
            .await?;
        let end2_entity = self
            .get_entity_for_update(user_id, end2.guid, end2.parameter, end2.type_name, method)
            .await?;

        let existing = self
            .find_relationships_between(end1.guid, end2.guid, relationship)
            .await?;
        for r in &existing {
            self.repository.delete_relationship(r.guid, user_id).await?;
        }

        if !existing.is_empty() && self.registry.anchor_rule(relationship).is_some() {
            let anchored_here = end2_entity.anchor().map_or(false, |anchor| {
                anchor.anchor_guid == end1.guid || anchor.anchor_scope_guid == Some(end1.guid)
            });
            if anchored_here {
                self.repository
                    .set_entity_anchor(end2.guid, None, user_id)
                    .await?;
            }
        }

        if existing.is_empty() {
            debug!(user_id, relationship = %relationship, end1 = %end1.guid, end2 = %end2.guid, "Nothing to unlink");
        } else {
            info!(user_id, relationship = %relationship, end1 = %end1.guid, end2 = %end2.guid, count = existing.len(), method, "Unlinked elements");
        }
        Ok(existing.len())
    }

    /// Update the properties of the relationship identified by its guid
    pub async fn update_relationship(
        &self,
        user_id: &str,
        relationship_guid: Guid,
        properties: InstanceProperties,
        is_merge_update: bool,
        method: &str,
    ) -> MetadataResult<()> {
        self.invalid_parameter_handler.validate_user_id(user_id, method)?;
        self.invalid_parameter_handler
            .validate_guid(relationship_guid, "relationshipGUID", method)?;

        let window = properties.effectivity();
        self.invalid_parameter_handler
            .validate_effectivity(window.effective_from, window.effective_to, method)?;

        let existing = self
            .repository
            .get_relationship(relationship_guid)
            .await?
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| self.unknown_guid(relationship_guid, "relationshipGUID", method))?;

        let updated = if is_merge_update {
            let mut merged = existing.properties.clone();
            merged.merge(&properties);
            merged
        } else {
            properties
        };

        let merged_window = updated.effectivity();
        self.invalid_parameter_handler.validate_effectivity(
            merged_window.effective_from,
            merged_window.effective_to,
            method,
        )?;

        self.repository
            .update_relationship_properties(relationship_guid, updated, user_id)
            .await?;

        info!(user_id, %relationship_guid, is_merge_update, method, "Updated relationship");
        Ok(())
    }

    /// Re-home an anchored entity. Every existing relationship of the
    /// anchoring type on the dependent is removed first, so exactly one
    /// remains afterwards, and the re-derived anchor is verified.
    pub async fn move_anchored(
        &self,
        user_id: &str,
        dependent: LinkEnd,
        new_owner: LinkEnd,
        relationship: RelationshipTypeName,
        method: &str,
    ) -> MetadataResult<Guid> {
        let moving = self
            .get_entity_for_update(user_id, dependent.guid, dependent.parameter, dependent.type_name, method)
            .await?;
        let owner = self
            .get_entity(user_id, new_owner.guid, new_owner.parameter, new_owner.type_name, None, method)
            .await?;

        if let Some(qualified_name) = moving.qualified_name() {
            let new_scope = self
                .registry
                .anchor_rule(relationship)
                .and_then(|rule| Self::derived_anchor(&owner, &moving, rule).anchor_scope_guid);
            self.check_unique_qualified_name(qualified_name, new_scope, Some(moving.guid), method)
                .await?;
        }

        let stale: Vec<Relationship> = self
            .repository
            .get_relationships(dependent.guid, Some(relationship.as_str()))
            .await?
            .into_iter()
            .filter(|r| r.end2_guid == dependent.guid)
            .collect();
        for r in &stale {
            self.repository.delete_relationship(r.guid, user_id).await?;
        }
        if stale.len() > 1 {
            debug!(dependent = %dependent.guid, count = stale.len(), "Removed duplicate anchor relationships");
        }
        self.repository
            .set_entity_anchor(dependent.guid, None, user_id)
            .await?;

        let relationship_guid = self
            .link_elements(user_id, new_owner, dependent, relationship, InstanceProperties::new(), method)
            .await?;

        let moved = self
            .repository
            .get_entity(dependent.guid)
            .await?
            .ok_or_else(|| self.unknown_guid(dependent.guid, dependent.parameter, method))?;
        let expected_anchor = Self::owner_anchor(&owner).anchor_guid;
        let actual_anchor = moved.anchor().map(|anchor| anchor.anchor_guid);
        if actual_anchor != Some(expected_anchor) {
            return Err(MetadataError::property_server(
                method,
                format!(
                    "anchor of {} is {actual_anchor:?} after move, expected {expected_anchor}",
                    dependent.guid
                ),
            ));
        }

        let remaining = self
            .repository
            .get_relationships(dependent.guid, Some(relationship.as_str()))
            .await?
            .into_iter()
            .filter(|r| r.end2_guid == dependent.guid)
            .count();
        if remaining != 1 {
            return Err(MetadataError::property_server(
                method,
                format!("{remaining} {relationship} relationships remain on {} after move", dependent.guid),
            ));
        }

        let reanchored = self.reanchor_descendants(dependent.guid, user_id).await?;

        info!(user_id, dependent = %dependent.guid, new_owner = %new_owner.guid, reanchored, method, "Moved anchored element");
        Ok(relationship_guid)
    }

    /// Re-derive the anchors of everything hanging off `root` through
    /// anchoring relationships. Returns how many were updated.
    async fn reanchor_descendants(&self, root: Guid, user_id: &str) -> MetadataResult<usize> {
        let mut seen: HashSet<Guid> = HashSet::from([root]);
        let mut queue: VecDeque<Guid> = VecDeque::from([root]);
        let mut updated = 0;

        while let Some(current) = queue.pop_front() {
            let Some(owner) = self.repository.get_entity(current).await? else {
                continue;
            };
            for r in self.repository.get_relationships(current, None).await? {
                if r.end1_guid != current || !seen.insert(r.end2_guid) {
                    continue;
                }
                let Some(rule) = r
                    .type_name
                    .parse::<RelationshipTypeName>()
                    .ok()
                    .and_then(|t| self.registry.anchor_rule(t))
                else {
                    continue;
                };
                let Some(child) = self.repository.get_entity(r.end2_guid).await? else {
                    continue;
                };
                let anchor = Self::derived_anchor(&owner, &child, rule);
                self.repository
                    .set_entity_anchor(child.guid, Some(anchor), user_id)
                    .await?;
                updated += 1;
                queue.push_back(child.guid);
            }
        }
        Ok(updated)
    }

    /// Recreate the template's relationships of the given types on the copy
    pub async fn copy_relationships(
        &self,
        user_id: &str,
        template_guid: Guid,
        copy_guid: Guid,
        relationships: &[RelationshipTypeName],
    ) -> MetadataResult<usize> {
        let mut copied = 0;
        for relationship in relationships {
            for r in self
                .repository
                .get_relationships(template_guid, Some(relationship.as_str()))
                .await?
            {
                let (end1_guid, end2_guid) = if r.end1_guid == template_guid {
                    (copy_guid, r.end2_guid)
                } else {
                    (r.end1_guid, copy_guid)
                };
                self.repository
                    .create_relationship(NewRelationship {
                        type_name: r.type_name.clone(),
                        end1_guid,
                        end2_guid,
                        properties: r.properties.clone(),
                        user_id: user_id.to_string(),
                    })
                    .await?;
                copied += 1;
            }
        }
        Ok(copied)
    }

    // ------------------------------------------------------------------
    // Classification toggle
    // ------------------------------------------------------------------

    /// Idempotent upsert of a classification
    #[allow(clippy::too_many_arguments)]
    pub async fn set_classification(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        classification: ClassificationTypeName,
        properties: InstanceProperties,
        is_merge_update: bool,
        method: &str,
    ) -> MetadataResult<()> {
        let entity = self
            .get_entity_for_update(user_id, guid, parameter, expected_type, method)
            .await?;
        self.registry
            .validate_classification(classification, &entity.type_name, method)?;

        let window = properties.effectivity();
        self.invalid_parameter_handler
            .validate_effectivity(window.effective_from, window.effective_to, method)?;

        let properties = match entity.classification(classification.as_str()) {
            Some(existing) if is_merge_update => {
                let mut merged = existing.properties.clone();
                merged.merge(&properties);
                merged
            }
            _ => properties,
        };

        let merged_window = properties.effectivity();
        self.invalid_parameter_handler.validate_effectivity(
            merged_window.effective_from,
            merged_window.effective_to,
            method,
        )?;

        self.repository
            .classify_entity(
                guid,
                Classification::new(classification.as_str(), properties, user_id),
                user_id,
            )
            .await?;

        info!(user_id, %guid, classification = %classification, method, "Set classification");
        Ok(())
    }

    /// Remove a classification; an absent classification is not an error
    pub async fn clear_classification(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        classification: ClassificationTypeName,
        method: &str,
    ) -> MetadataResult<()> {
        let entity = self
            .get_entity_for_update(user_id, guid, parameter, expected_type, method)
            .await?;
        self.registry
            .validate_classification(classification, &entity.type_name, method)?;

        let removed = self
            .repository
            .declassify_entity(guid, classification.as_str(), user_id)
            .await?;

        if removed {
            info!(user_id, %guid, classification = %classification, method, "Cleared classification");
        } else {
            debug!(user_id, %guid, classification = %classification, "Classification already absent");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    fn query_for(&self, base: EntityTypeName, statuses: &[InstanceStatus]) -> Option<EntityQuery> {
        let live: Vec<InstanceStatus> = statuses
            .iter()
            .copied()
            .filter(|status| *status != InstanceStatus::Deleted)
            .collect();
        if !statuses.is_empty() && live.is_empty() {
            return None;
        }

        Some(
            EntityQuery::for_types(self.registry.subtypes_of(base).iter().map(|t| t.as_str()))
                .with_statuses(&live)
                .excluding_classification(ClassificationTypeName::Memento.as_str()),
        )
    }

    /// Filter by effectivity and visibility, then page
    async fn visible_page(
        &self,
        user_id: &str,
        candidates: Vec<Entity>,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        let (start_from, page_size) = self.invalid_parameter_handler.validate_paging(
            options.start_from,
            options.page_size,
            method,
        )?;

        let mut visible = Vec::with_capacity(candidates.len());
        for entity in candidates {
            if !entity.properties.effectivity().is_effective_at(options.effective_time) {
                continue;
            }
            if !self.is_visible(user_id, &entity).await? {
                continue;
            }
            if self.security.validate_user_for_read(user_id, &entity).await.is_err() {
                continue;
            }
            visible.push(entity);
        }

        Ok(EntityQuery::default()
            .paged(start_from, page_size)
            .page(visible))
    }

    async fn search(
        &self,
        user_id: &str,
        base: EntityTypeName,
        search: Option<PropertySearch>,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        self.invalid_parameter_handler.validate_user_id(user_id, method)?;
        // Paging is validated before any repository call
        self.invalid_parameter_handler
            .validate_paging(options.start_from, options.page_size, method)?;

        let Some(mut query) = self.query_for(base, options.statuses) else {
            return Ok(Vec::new());
        };
        query.search = search;

        let candidates = self.repository.find_entities(&query).await?;
        let page = self.visible_page(user_id, candidates, options, method).await?;
        debug!(user_id, base = %base, count = page.len(), method, "Search returned");
        Ok(page)
    }

    /// Exact match of `name` against any of `properties` (OR)
    #[allow(clippy::too_many_arguments)]
    pub async fn find_beans_by_name(
        &self,
        user_id: &str,
        name: &str,
        parameter: &str,
        properties: &[&str],
        base: EntityTypeName,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        self.invalid_parameter_handler
            .validate_name(Some(name), parameter, method)?;
        let search = PropertySearch::new(properties, PropertyMatcher::Exact(name.to_string()));
        self.search(user_id, base, Some(search), options, method).await
    }

    /// Regular-expression match across the default search properties plus
    /// `extra_properties`
    #[allow(clippy::too_many_arguments)]
    pub async fn find_beans_by_value(
        &self,
        user_id: &str,
        search_string: &str,
        parameter: &str,
        extra_properties: &[&str],
        base: EntityTypeName,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        let pattern = self
            .invalid_parameter_handler
            .validate_search_string(search_string, parameter, method)?;

        let mut properties: Vec<&str> = DEFAULT_SEARCH_PROPERTIES.to_vec();
        properties.extend(extra_properties.iter().filter(|p| !DEFAULT_SEARCH_PROPERTIES.contains(p)));
        let search = PropertySearch::new(&properties, PropertyMatcher::Regex(pattern));
        self.search(user_id, base, Some(search), options, method).await
    }

    /// Every visible entity of the base type
    pub async fn get_beans_by_type(
        &self,
        user_id: &str,
        base: EntityTypeName,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        self.search(user_id, base, None, options, method).await
    }

    /// Entities at the other end of any of `relationships` (empty means any
    /// type), paired with the relationship
    #[allow(clippy::too_many_arguments)]
    pub async fn get_related_entities(
        &self,
        user_id: &str,
        starting_guid: Guid,
        parameter: &str,
        starting_type: EntityTypeName,
        relationships: &[RelationshipTypeName],
        related_type: EntityTypeName,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<(Relationship, Entity)>> {
        let (start_from, page_size) = self.invalid_parameter_handler.validate_paging(
            options.start_from,
            options.page_size,
            method,
        )?;
        self.get_entity(user_id, starting_guid, parameter, starting_type, options.effective_time, method)
            .await?;

        let type_filter = match relationships {
            [single] => Some(single.as_str()),
            _ => None,
        };
        let candidates = self
            .repository
            .get_relationships(starting_guid, type_filter)
            .await?
            .into_iter()
            .filter(|r| {
                relationships.is_empty()
                    || relationships.iter().any(|t| t.as_str() == r.type_name)
            });

        let memento = ClassificationTypeName::Memento.as_str();
        let mut related = Vec::new();
        for r in candidates {
            if !r.is_effective_at(options.effective_time) {
                continue;
            }
            let Some(other_guid) = r.other_end(starting_guid) else {
                continue;
            };
            let Some(other) = self.repository.get_entity(other_guid).await? else {
                continue;
            };
            if other.is_deleted()
                || other.is_classified(memento)
                || !self.registry.is_subtype_name_of(&other.type_name, related_type)
                || !other.properties.effectivity().is_effective_at(options.effective_time)
                || (!options.statuses.is_empty() && !options.statuses.contains(&other.status))
            {
                continue;
            }
            if !self.is_visible(user_id, &other).await?
                || self.security.validate_user_for_read(user_id, &other).await.is_err()
            {
                continue;
            }
            related.push((r, other));
        }

        let iter = related.into_iter().skip(start_from);
        Ok(if page_size == 0 {
            iter.collect()
        } else {
            iter.take(page_size).collect()
        })
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Entities reachable through anchoring relationships or anchored to `guid`
    async fn collect_dependents(&self, guid: Guid) -> MetadataResult<Vec<Guid>> {
        let anchoring: Vec<RelationshipTypeName> = self.registry.anchoring_relationships();
        let mut seen: HashSet<Guid> = HashSet::from([guid]);
        let mut queue: VecDeque<Guid> = VecDeque::from([guid]);
        let mut dependents = Vec::new();

        while let Some(current) = queue.pop_front() {
            let mut next: Vec<Guid> = self
                .repository
                .get_relationships(current, None)
                .await?
                .into_iter()
                .filter(|r| {
                    r.end1_guid == current
                        && r.type_name
                            .parse::<RelationshipTypeName>()
                            .map_or(false, |t| anchoring.contains(&t))
                })
                .map(|r| r.end2_guid)
                .collect();
            next.extend(
                self.repository
                    .find_anchored(current)
                    .await?
                    .into_iter()
                    .map(|entity| entity.guid),
            );

            for dependent in next {
                if seen.insert(dependent) {
                    dependents.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }
        Ok(dependents)
    }

    /// Soft delete the entity and its relationships; `cascade` also removes
    /// every dependent element
    pub async fn delete_bean(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        cascade: bool,
        method: &str,
    ) -> MetadataResult<()> {
        self.get_entity_for_update(user_id, guid, parameter, expected_type, method)
            .await?;

        let dependents = if cascade {
            self.collect_dependents(guid).await?
        } else {
            Vec::new()
        };

        for dependent in &dependents {
            self.repository.delete_entity(*dependent, user_id).await?;
        }
        self.repository.delete_entity(guid, user_id).await?;

        info!(user_id, %guid, cascade, dependents = dependents.len(), method, "Removed element");
        Ok(())
    }

    /// Mark the element as archived with a Memento classification
    pub async fn archive_bean(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        archive: &ArchiveProperties,
        method: &str,
    ) -> MetadataResult<()> {
        let properties = InstanceProperties::new()
            .with_date(
                property_names::ARCHIVE_DATE,
                Some(archive.archive_date.unwrap_or_else(Utc::now)),
            )
            .with_string(property_names::ARCHIVE_USER, Some(user_id))
            .with_string(property_names::ARCHIVE_PROCESS, archive.archive_process.as_deref())
            .with_string_map(property_names::ARCHIVE_PROPERTIES, &archive.archive_properties);

        self.set_classification(
            user_id,
            guid,
            parameter,
            expected_type,
            ClassificationTypeName::Memento,
            properties,
            false,
            method,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use mockall::mock;

    mock! {
        pub Verifier {}

        #[async_trait::async_trait]
        impl SecurityVerifier for Verifier {
            async fn validate_user_for_create(&self, user_id: &str, type_name: &str) -> MetadataResult<()>;
            async fn validate_user_for_read(&self, user_id: &str, entity: &Entity) -> MetadataResult<()>;
            async fn validate_user_for_write(&self, user_id: &str, entity: &Entity) -> MetadataResult<()>;
            fn is_visible(&self, user_id: &str, entity: &Entity) -> bool;
        }
    }

    const USER: &str = "garygeeke";
    const METHOD: &str = "generic_test";

    fn permissive() -> MockVerifier {
        let mut verifier = MockVerifier::new();
        verifier.expect_validate_user_for_create().returning(|_, _| Ok(()));
        verifier.expect_validate_user_for_read().returning(|_, _| Ok(()));
        verifier.expect_validate_user_for_write().returning(|_, _| Ok(()));
        verifier.expect_is_visible().returning(|_, _| true);
        verifier
    }

    fn handler(verifier: MockVerifier) -> GenericHandler {
        GenericHandler::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(verifier),
            Arc::new(TypeRegistry::open_metadata()),
            InvalidParameterHandler::new(50),
            ZoneSettings::default(),
            "test-server",
        )
    }

    fn named(qualified_name: &str) -> InstanceProperties {
        InstanceProperties::new().with_string(property_names::QUALIFIED_NAME, Some(qualified_name))
    }

    #[tokio::test]
    async fn test_create_requires_qualified_name() {
        let handler = handler(permissive());
        let error = handler
            .create_bean(USER, EntityTypeName::Glossary, InstanceProperties::new(), None, None, METHOD)
            .await
            .unwrap_err();
        assert!(error.is_invalid_parameter());
    }

    #[tokio::test]
    async fn test_duplicate_qualified_name_in_scope_is_rejected() {
        let handler = handler(permissive());
        handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Sales"), None, None, METHOD)
            .await
            .unwrap();
        let error = handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Sales"), None, None, METHOD)
            .await
            .unwrap_err();
        assert!(error.is_invalid_parameter());
    }

    #[tokio::test]
    async fn test_create_refused_by_verifier() {
        let mut verifier = MockVerifier::new();
        verifier
            .expect_validate_user_for_create()
            .returning(|user, type_name| Err(MetadataError::not_authorized(user, "create", type_name)));
        let handler = handler(verifier);

        let error = handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Sales"), None, None, METHOD)
            .await
            .unwrap_err();
        assert!(error.is_not_authorized());
    }

    #[tokio::test]
    async fn test_invisible_entity_reads_as_unknown_guid() {
        let mut verifier = MockVerifier::new();
        verifier.expect_validate_user_for_create().returning(|_, _| Ok(()));
        verifier.expect_validate_user_for_read().returning(|_, _| Ok(()));
        verifier.expect_is_visible().returning(|_, _| false);
        let handler = handler(verifier);

        let guid = handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Hidden"), None, None, METHOD)
            .await
            .unwrap();
        let error = handler
            .get_entity(USER, guid, "glossaryGUID", EntityTypeName::Glossary, None, METHOD)
            .await
            .unwrap_err();
        assert!(error.is_invalid_parameter());
    }

    #[tokio::test]
    async fn test_deleted_initial_status_is_rejected() {
        let handler = handler(permissive());
        let error = handler
            .create_bean(
                USER,
                EntityTypeName::Glossary,
                named("Glossary::Sales"),
                Some(InstanceStatus::Deleted),
                None,
                METHOD,
            )
            .await
            .unwrap_err();
        assert!(error.is_invalid_parameter());
    }

    #[tokio::test]
    async fn test_link_derives_anchor_with_scope() {
        let handler = handler(permissive());
        let glossary = handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Sales"), None, None, METHOD)
            .await
            .unwrap();
        let term = handler
            .create_bean(USER, EntityTypeName::GlossaryTerm, named("Term::Customer"), None, Some(glossary), METHOD)
            .await
            .unwrap();

        handler
            .link_elements(
                USER,
                LinkEnd::new(glossary, "glossaryGUID", EntityTypeName::Glossary),
                LinkEnd::new(term, "termGUID", EntityTypeName::GlossaryTerm),
                RelationshipTypeName::TermAnchor,
                InstanceProperties::new(),
                METHOD,
            )
            .await
            .unwrap();

        let stored = handler.repository().get_entity(term).await.unwrap().unwrap();
        let anchor = stored.anchor().unwrap();
        assert_eq!(anchor.anchor_guid, glossary);
        assert_eq!(anchor.anchor_scope_guid, Some(glossary));
    }

    #[tokio::test]
    async fn test_wrong_end_type_is_server_error() {
        let handler = handler(permissive());
        let category = handler
            .create_bean(USER, EntityTypeName::GlossaryCategory, named("Category::A"), None, None, METHOD)
            .await
            .unwrap();
        let term = handler
            .create_bean(USER, EntityTypeName::GlossaryTerm, named("Term::A"), None, None, METHOD)
            .await
            .unwrap();

        let error = handler
            .link_elements(
                USER,
                LinkEnd::new(category, "categoryGUID", EntityTypeName::Referenceable),
                LinkEnd::new(term, "termGUID", EntityTypeName::GlossaryTerm),
                RelationshipTypeName::TermAnchor,
                InstanceProperties::new(),
                METHOD,
            )
            .await
            .unwrap_err();
        assert!(error.is_property_server());
    }

    #[tokio::test]
    async fn test_set_classification_is_idempotent_and_clear_tolerates_absence() {
        let handler = handler(permissive());
        let term = handler
            .create_bean(USER, EntityTypeName::GlossaryTerm, named("Term::A"), None, None, METHOD)
            .await
            .unwrap();

        for _ in 0..2 {
            handler
                .set_classification(
                    USER,
                    term,
                    "termGUID",
                    EntityTypeName::GlossaryTerm,
                    ClassificationTypeName::SpineObject,
                    InstanceProperties::new(),
                    true,
                    METHOD,
                )
                .await
                .unwrap();
        }
        let stored = handler.repository().get_entity(term).await.unwrap().unwrap();
        assert_eq!(stored.classifications.len(), 1);

        for _ in 0..2 {
            handler
                .clear_classification(
                    USER,
                    term,
                    "termGUID",
                    EntityTypeName::GlossaryTerm,
                    ClassificationTypeName::SpineObject,
                    METHOD,
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_status_only_deleted_returns_nothing() {
        let handler = handler(permissive());
        handler
            .create_bean(USER, EntityTypeName::Glossary, named("Glossary::Sales"), None, None, METHOD)
            .await
            .unwrap();

        let options = SearchOptions {
            statuses: &[InstanceStatus::Deleted],
            ..SearchOptions::paged(0, 0)
        };
        let found = handler
            .get_beans_by_type(USER, EntityTypeName::Glossary, options, METHOD)
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
