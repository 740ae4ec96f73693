//! Property names used in instance property bags

pub const QUALIFIED_NAME: &str = "qualifiedName";
pub const DISPLAY_NAME: &str = "displayName";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const ALIASES: &str = "aliases";
pub const ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const ZONE_MEMBERSHIP: &str = "zoneMembership";
pub const OWNER: &str = "owner";

// Glossary
pub const SUMMARY: &str = "summary";
pub const EXAMPLES: &str = "examples";
pub const ABBREVIATION: &str = "abbreviation";
pub const USAGE: &str = "usage";
pub const EXPRESSION: &str = "expression";
pub const STATUS: &str = "status";
pub const STEWARD: &str = "steward";
pub const SOURCE: &str = "source";
pub const CONFIDENCE: &str = "confidence";
pub const ACTIVITY_TYPE: &str = "activityType";
pub const SCOPE: &str = "scope";

// Relational
pub const CREATE_TIME: &str = "createTime";
pub const MODIFIED_TIME: &str = "modifiedTime";
pub const ENCODING_TYPE: &str = "encodingType";
pub const ENCODING_LANGUAGE: &str = "encodingLanguage";
pub const ENCODING_DESCRIPTION: &str = "encodingDescription";
pub const ENCODING_PROPERTIES: &str = "encodingProperties";
pub const DATABASE_TYPE: &str = "databaseType";
pub const DATABASE_VERSION: &str = "databaseVersion";
pub const DATABASE_INSTANCE: &str = "databaseInstance";
pub const DATABASE_IMPORTED_FROM: &str = "databaseImportedFrom";
pub const IS_DEPRECATED: &str = "isDeprecated";
pub const POSITION: &str = "position";
pub const MIN_CARDINALITY: &str = "minCardinality";
pub const MAX_CARDINALITY: &str = "maxCardinality";
pub const ALLOWS_DUPLICATE_VALUES: &str = "allowsDuplicateValues";
pub const ORDERED_VALUES: &str = "orderedValues";
pub const IS_NULLABLE: &str = "isNullable";
pub const MINIMUM_LENGTH: &str = "minimumLength";
pub const LENGTH: &str = "length";
pub const PRECISION: &str = "precision";
pub const DEFAULT_VALUE_OVERRIDE: &str = "defaultValueOverride";
pub const NATIVE_CLASS: &str = "nativeClass";
pub const SCHEMA_TYPE_NAME: &str = "schemaTypeName";
pub const DATA_TYPE: &str = "dataType";
pub const DEFAULT_VALUE: &str = "defaultValue";
pub const FIXED_VALUE: &str = "fixedValue";
pub const FORMULA: &str = "formula";
pub const KEY_PATTERN: &str = "keyPattern";

// Facets
pub const SCHEMA_VERSION: &str = "schemaVersion";
pub const PROPERTIES: &str = "properties";

// Valid values
pub const PREFERRED_VALUE: &str = "preferredValue";
pub const ATTRIBUTE_NAME: &str = "attributeName";
pub const STEWARD_TYPE_NAME: &str = "stewardTypeName";
pub const STEWARD_PROPERTY_NAME: &str = "stewardPropertyName";
pub const NOTES: &str = "notes";

// Memento
pub const ARCHIVE_DATE: &str = "archiveDate";
pub const ARCHIVE_USER: &str = "archiveUser";
pub const ARCHIVE_PROCESS: &str = "archiveProcess";
pub const ARCHIVE_PROPERTIES: &str = "archiveProperties";
