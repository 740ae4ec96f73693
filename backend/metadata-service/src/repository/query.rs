use crate::domain::{Entity, Guid, InstanceStatus};
use regex::Regex;

/// How a property value is compared with the search term
#[derive(Debug, Clone)]
pub enum PropertyMatcher {
    Exact(String),
    Regex(Regex),
}

impl PropertyMatcher {
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            PropertyMatcher::Exact(value) => candidate == value,
            PropertyMatcher::Regex(pattern) => pattern.is_match(candidate),
        }
    }
}

/// Match when ANY of the named properties matches
#[derive(Debug, Clone)]
pub struct PropertySearch {
    pub property_names: Vec<String>,
    pub matcher: PropertyMatcher,
}

impl PropertySearch {
    pub fn new(property_names: &[&str], matcher: PropertyMatcher) -> Self {
        Self {
            property_names: property_names.iter().map(|name| name.to_string()).collect(),
            matcher,
        }
    }

    fn matches(&self, entity: &Entity) -> bool {
        self.property_names.iter().any(|name| {
            entity
                .properties
                .get(name)
                .map_or(false, |value| {
                    value.text_values().into_iter().any(|text| self.matcher.matches(text))
                })
        })
    }
}

/// Entity search evaluated by the repository
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    /// Exact type names; callers expand subtypes. Empty matches any type.
    pub type_names: Vec<String>,
    pub search: Option<PropertySearch>,
    /// Empty means every status except `Deleted`
    pub statuses: Vec<InstanceStatus>,
    pub anchor_scope_guid: Option<Guid>,
    pub excluded_classifications: Vec<String>,
    pub start_from: usize,
    /// `0` returns everything from `start_from`
    pub page_size: usize,
}

impl EntityQuery {
    pub fn for_types<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_names: type_names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: PropertySearch) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_statuses(mut self, statuses: &[InstanceStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn in_scope(mut self, anchor_scope_guid: Option<Guid>) -> Self {
        self.anchor_scope_guid = anchor_scope_guid;
        self
    }

    pub fn excluding_classification(mut self, name: &str) -> Self {
        self.excluded_classifications.push(name.to_string());
        self
    }

    pub fn paged(mut self, start_from: usize, page_size: usize) -> Self {
        self.start_from = start_from;
        self.page_size = page_size;
        self
    }

    pub fn matches_status(&self, status: InstanceStatus) -> bool {
        if self.statuses.is_empty() {
            status != InstanceStatus::Deleted
        } else {
            self.statuses.contains(&status)
        }
    }

    pub fn matches_entity(&self, entity: &Entity) -> bool {
        if !self.type_names.is_empty() && !self.type_names.contains(&entity.type_name) {
            return false;
        }
        if !self.matches_status(entity.status) {
            return false;
        }
        if let Some(scope) = self.anchor_scope_guid {
            if entity.anchor_scope_guid() != Some(scope) {
                return false;
            }
        }
        if self
            .excluded_classifications
            .iter()
            .any(|name| entity.is_classified(name))
        {
            return false;
        }
        self.search.as_ref().map_or(true, |search| search.matches(entity))
    }

    /// Deterministic ordering (creation time, then guid) followed by paging
    pub fn page(&self, mut entities: Vec<Entity>) -> Vec<Entity> {
        entities.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.guid.cmp(&b.guid))
        });
        let remaining = entities.into_iter().skip(self.start_from);
        if self.page_size == 0 {
            remaining.collect()
        } else {
            remaining.take(self.page_size).collect()
        }
    }
}
