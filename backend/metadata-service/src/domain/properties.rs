use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single typed value inside a property bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    String(String),
    Int(i32),
    Long(i64),
    Boolean(bool),
    Float(f64),
    Date(DateTime<Utc>),
    StringArray(Vec<String>),
    StringMap(BTreeMap<String, String>),
    Map(BTreeMap<String, PropertyValue>),
    Enum { ordinal: i32, symbolic_name: String },
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(value) => Some(*value),
            PropertyValue::Int(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            PropertyValue::StringArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_string_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            PropertyValue::StringMap(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_enum_ordinal(&self) -> Option<i32> {
        match self {
            PropertyValue::Enum { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }

    /// Text fragments searched by name/value queries
    pub fn text_values(&self) -> Vec<&str> {
        match self {
            PropertyValue::String(value) => vec![value.as_str()],
            PropertyValue::StringArray(values) => values.iter().map(String::as_str).collect(),
            PropertyValue::Enum { symbolic_name, .. } => vec![symbolic_name.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Enumerations stored in property bags by ordinal and symbolic name
pub trait PropertyEnum: Sized + Copy {
    fn ordinal(&self) -> i32;
    fn symbolic_name(&self) -> &'static str;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
}

/// Optional start/end bounding when a property bag or relationship is valid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivityWindow {
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl EffectivityWindow {
    pub fn new(effective_from: Option<DateTime<Utc>>, effective_to: Option<DateTime<Utc>>) -> Self {
        Self {
            effective_from,
            effective_to,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.effective_from.is_none() && self.effective_to.is_none()
    }

    /// `None` means "any time"; unbounded ends are always effective.
    pub fn is_effective_at(&self, time: Option<DateTime<Utc>>) -> bool {
        let Some(time) = time else {
            return true;
        };
        let started = self.effective_from.map_or(true, |from| from <= time);
        let not_ended = self.effective_to.map_or(true, |to| time < to);
        started && not_ended
    }
}

/// Ordered bag of named, typed properties plus an effectivity window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceProperties {
    values: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    window: EffectivityWindow,
}

impl InstanceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder helpers: a `None` (or empty collection) is omitted, never defaulted.

    pub fn with_string(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.set(name, PropertyValue::String(value.to_string()));
        }
        self
    }

    pub fn with_int(mut self, name: &str, value: Option<i32>) -> Self {
        if let Some(value) = value {
            self.set(name, PropertyValue::Int(value));
        }
        self
    }

    pub fn with_long(mut self, name: &str, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.set(name, PropertyValue::Long(value));
        }
        self
    }

    pub fn with_bool(mut self, name: &str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.set(name, PropertyValue::Boolean(value));
        }
        self
    }

    pub fn with_date(mut self, name: &str, value: Option<DateTime<Utc>>) -> Self {
        if let Some(value) = value {
            self.set(name, PropertyValue::Date(value));
        }
        self
    }

    pub fn with_string_array(mut self, name: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.set(name, PropertyValue::StringArray(values.to_vec()));
        }
        self
    }

    pub fn with_string_map(mut self, name: &str, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            self.set(name, PropertyValue::StringMap(values.clone()));
        }
        self
    }

    pub fn with_map(mut self, name: &str, values: &BTreeMap<String, PropertyValue>) -> Self {
        if !values.is_empty() {
            self.set(name, PropertyValue::Map(values.clone()));
        }
        self
    }

    pub fn with_enum<E: PropertyEnum>(mut self, name: &str, value: Option<E>) -> Self {
        if let Some(value) = value {
            self.set(
                name,
                PropertyValue::Enum {
                    ordinal: value.ordinal(),
                    symbolic_name: value.symbolic_name().to_string(),
                },
            );
        }
        self
    }

    /// Extended properties land as top-level properties of the subtype
    pub fn with_extended(mut self, extended: &BTreeMap<String, PropertyValue>) -> Self {
        for (name, value) in extended {
            self.values.entry(name.clone()).or_insert_with(|| value.clone());
        }
        self
    }

    pub fn with_effectivity(mut self, window: EffectivityWindow) -> Self {
        self.window = window;
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.values.remove(name);
        self
    }

    pub fn set(&mut self, name: &str, value: PropertyValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.values.iter()
    }

    pub fn effectivity(&self) -> EffectivityWindow {
        self.window
    }

    pub fn set_effectivity(&mut self, window: EffectivityWindow) {
        self.window = window;
    }

    /// Overlay `other` onto this bag: supplied values win, absent values keep
    /// their prior setting. Each end of the window is overlaid on its own.
    pub fn merge(&mut self, other: &InstanceProperties) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
        self.window = EffectivityWindow {
            effective_from: other.window.effective_from.or(self.window.effective_from),
            effective_to: other.window.effective_to.or(self.window.effective_to),
        };
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(PropertyValue::as_int)
    }

    pub fn long(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_long)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropertyValue::as_bool)
    }

    pub fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(PropertyValue::as_date)
    }

    pub fn string_array(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(PropertyValue::as_string_array)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    pub fn string_map(&self, name: &str) -> BTreeMap<String, String> {
        self.get(name)
            .and_then(PropertyValue::as_string_map)
            .cloned()
            .unwrap_or_default()
    }

    pub fn map(&self, name: &str) -> BTreeMap<String, PropertyValue> {
        self.get(name)
            .and_then(PropertyValue::as_map)
            .cloned()
            .unwrap_or_default()
    }

    pub fn enum_value<E: PropertyEnum>(&self, name: &str) -> Option<E> {
        self.get(name)
            .and_then(PropertyValue::as_enum_ordinal)
            .and_then(E::from_ordinal)
    }

    /// Properties not named in `known`, i.e. the subtype's extended properties
    pub fn extended(&self, known: &[&str]) -> BTreeMap<String, PropertyValue> {
        self.values
            .iter()
            .filter(|(name, _)| !known.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
