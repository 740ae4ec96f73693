use chrono::{DateTime, Utc};
use error_types::validation::rules;
use error_types::{MetadataError, MetadataResult};
use regex::Regex;
use uuid::Uuid;

use crate::domain::Guid;

/// Parameter checks shared by every handler.
/// Failures surface as `MetadataError::InvalidParameter` naming the
/// parameter and the calling method.
#[derive(Debug, Clone, Copy)]
pub struct InvalidParameterHandler {
    max_page_size: usize,
}

impl InvalidParameterHandler {
    pub fn new(max_page_size: usize) -> Self {
        Self { max_page_size }
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    pub fn validate_user_id(&self, user_id: &str, method: &str) -> MetadataResult<()> {
        rules::validate_required("userId", Some(user_id))
            .map_err(|error| MetadataError::from(error.for_method(method)))
    }

    /// The nil uuid stands in for a null guid
    pub fn validate_guid(&self, guid: Guid, parameter: &str, method: &str) -> MetadataResult<()> {
        if guid.is_nil() {
            return Err(MetadataError::invalid_parameter(parameter, method, "guid is null"));
        }
        Ok(())
    }

    pub fn parse_guid(&self, value: &str, parameter: &str, method: &str) -> MetadataResult<Guid> {
        let guid = Uuid::parse_str(value.trim()).map_err(|_| {
            MetadataError::invalid_parameter(parameter, method, format!("{value} is not a valid guid"))
        })?;
        self.validate_guid(guid, parameter, method)?;
        Ok(guid)
    }

    pub fn validate_name(&self, name: Option<&str>, parameter: &str, method: &str) -> MetadataResult<()> {
        rules::validate_required(parameter, name)
            .map_err(|error| MetadataError::from(error.for_method(method)))
    }

    /// Compile a search string; an invalid expression is the caller's fault
    pub fn validate_search_string(
        &self,
        search_string: &str,
        parameter: &str,
        method: &str,
    ) -> MetadataResult<Regex> {
        self.validate_name(Some(search_string), parameter, method)?;
        Regex::new(search_string).map_err(|error| {
            MetadataError::invalid_parameter(parameter, method, format!("invalid regular expression: {error}"))
        })
    }

    /// Returns `(start_from, page_size)`; a zero page size means the maximum
    pub fn validate_paging(
        &self,
        start_from: i32,
        page_size: i32,
        method: &str,
    ) -> MetadataResult<(usize, usize)> {
        rules::validate_range("startFrom", start_from, Some(0), None)
            .map_err(|error| MetadataError::from(error.for_method(method)))?;

        let max_page_size = i32::try_from(self.max_page_size).unwrap_or(i32::MAX);
        rules::validate_range("pageSize", page_size, Some(0), Some(max_page_size))
            .map_err(|error| MetadataError::from(error.for_method(method)))?;

        let page_size = match page_size {
            0 => self.max_page_size,
            size => size as usize,
        };
        Ok((start_from as usize, page_size))
    }

    pub fn validate_effectivity(
        &self,
        effective_from: Option<DateTime<Utc>>,
        effective_to: Option<DateTime<Utc>>,
        method: &str,
    ) -> MetadataResult<()> {
        if let (Some(from), Some(to)) = (effective_from, effective_to) {
            if from > to {
                return Err(MetadataError::invalid_parameter(
                    "effectiveTo",
                    method,
                    format!("effective window ends ({to}) before it starts ({from})"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for InvalidParameterHandler {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const METHOD: &str = "find_terms";

    #[test]
    fn test_blank_user_id_is_rejected() {
        let handler = InvalidParameterHandler::default();
        let error = handler.validate_user_id(" ", METHOD).unwrap_err();
        match error {
            MetadataError::InvalidParameter { parameter, method, .. } => {
                assert_eq!(parameter, "userId");
                assert_eq!(method, METHOD);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_paging_bounds() {
        let handler = InvalidParameterHandler::new(100);
        assert_eq!(handler.validate_paging(0, 0, METHOD).unwrap(), (0, 100));
        assert_eq!(handler.validate_paging(20, 10, METHOD).unwrap(), (20, 10));
        assert_eq!(handler.validate_paging(0, 100, METHOD).unwrap(), (0, 100));
        assert!(handler.validate_paging(-1, 10, METHOD).unwrap_err().is_invalid_parameter());
        assert!(handler.validate_paging(0, -5, METHOD).unwrap_err().is_invalid_parameter());
        assert!(handler.validate_paging(0, 101, METHOD).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_invalid_regex_is_invalid_parameter() {
        let handler = InvalidParameterHandler::default();
        assert!(handler.validate_search_string("Cust.*", "searchString", METHOD).is_ok());
        assert!(handler
            .validate_search_string("Cust(", "searchString", METHOD)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn test_nil_guid_is_null() {
        let handler = InvalidParameterHandler::default();
        assert!(handler.validate_guid(Uuid::nil(), "termGUID", METHOD).is_err());
        assert!(handler.parse_guid("not-a-guid", "termGUID", METHOD).is_err());
        assert!(handler.parse_guid(&Uuid::new_v4().to_string(), "termGUID", METHOD).is_ok());
    }

    #[test]
    fn test_effectivity_window_order() {
        let handler = InvalidParameterHandler::default();
        let now = Utc::now();
        assert!(handler.validate_effectivity(Some(now), Some(now + Duration::days(1)), METHOD).is_ok());
        assert!(handler.validate_effectivity(Some(now), None, METHOD).is_ok());
        assert!(handler
            .validate_effectivity(Some(now + Duration::days(1)), Some(now), METHOD)
            .is_err());
    }
}
