//! Zone-based access checks applied by the handlers

use crate::domain::{property_names, Entity};
use error_types::{MetadataError, MetadataResult};
use std::collections::HashSet;
use tracing::warn;

/// Zone lists shared by the verifier and the handlers that publish assets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSettings {
    /// Zones whose members are visible; empty makes everything visible
    pub supported_zones: Vec<String>,
    /// Zones assigned to new assets when the caller gives none
    pub default_zones: Vec<String>,
    /// Zones assigned when an asset is published
    pub publish_zones: Vec<String>,
}

/// Decides whether a caller may see or change an entity
#[async_trait::async_trait]
pub trait SecurityVerifier: Send + Sync {
    async fn validate_user_for_create(&self, user_id: &str, type_name: &str) -> MetadataResult<()>;

    async fn validate_user_for_read(&self, user_id: &str, entity: &Entity) -> MetadataResult<()>;

    async fn validate_user_for_write(&self, user_id: &str, entity: &Entity) -> MetadataResult<()>;

    /// Invisible entities are reported as unknown rather than forbidden
    fn is_visible(&self, user_id: &str, entity: &Entity) -> bool;
}

/// Default verifier driven by zone membership and a deny-list of users
#[derive(Debug, Clone, Default)]
pub struct ZoneSecurityVerifier {
    zones: ZoneSettings,
    denied_users: HashSet<String>,
}

impl ZoneSecurityVerifier {
    pub fn new(zones: ZoneSettings, denied_users: impl IntoIterator<Item = String>) -> Self {
        Self {
            zones,
            denied_users: denied_users.into_iter().collect(),
        }
    }

    fn check_user(&self, user_id: &str, action: &str, target: &str) -> MetadataResult<()> {
        if self.denied_users.contains(user_id) {
            warn!(user_id, action, target, "User is on the deny list");
            return Err(MetadataError::not_authorized(user_id, action, target));
        }
        Ok(())
    }

    fn zones_of(entity: &Entity) -> Vec<String> {
        entity.properties.string_array(property_names::ZONE_MEMBERSHIP)
    }
}

#[async_trait::async_trait]
impl SecurityVerifier for ZoneSecurityVerifier {
    async fn validate_user_for_create(&self, user_id: &str, type_name: &str) -> MetadataResult<()> {
        self.check_user(user_id, "create", type_name)
    }

    async fn validate_user_for_read(&self, user_id: &str, entity: &Entity) -> MetadataResult<()> {
        self.check_user(user_id, "read", &entity.guid.to_string())
    }

    async fn validate_user_for_write(&self, user_id: &str, entity: &Entity) -> MetadataResult<()> {
        let target = entity.guid.to_string();
        self.check_user(user_id, "update", &target)?;

        let zones = Self::zones_of(entity);
        if zones.is_empty() {
            return Ok(());
        }
        let writable = zones.iter().any(|zone| {
            self.zones.default_zones.contains(zone) || self.zones.publish_zones.contains(zone)
        });
        if !writable {
            warn!(user_id, guid = %entity.guid, ?zones, "Entity is not in a writable zone");
            return Err(MetadataError::not_authorized(user_id, "update", target));
        }
        Ok(())
    }

    fn is_visible(&self, _user_id: &str, entity: &Entity) -> bool {
        if self.zones.supported_zones.is_empty() {
            return true;
        }
        let zones = Self::zones_of(entity);
        zones.is_empty() || zones.iter().any(|zone| self.zones.supported_zones.contains(zone))
    }
}
