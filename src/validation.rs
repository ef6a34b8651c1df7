//! Storage-independent checks on feature flag and assignment payloads.
//!
//! Each check returns the first failing rule as a [`FieldError`] so the
//! caller can point at the offending form field or API property.

use crate::service::assignment::AssignmentRequest;
use crate::service::feature_flag::{FeatureFlagRequest, UpdateFeatureFlagRequest};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

/// Flag names are SCREAMING_SNAKE identifiers.
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("flag name pattern is valid"));

/// Calendar date format accepted for `expirationDate`.
pub const EXPIRATION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Payload property a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Description,
    ExpirationDate,
    PersonId,
    FeatureFlagId,
}

impl Field {
    /// Property name as it appears in JSON payloads and HTML forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::ExpirationDate => "expirationDate",
            Field::PersonId => "personId",
            Field::FeatureFlagId => "featureFlagId",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::ExpirationDate => "expiration",
            Field::PersonId => "person-id",
            Field::FeatureFlagId => "feature-flag-id",
        }
    }
}

/// Which rule the field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Format,
}

impl Rule {
    fn slug(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Format => "format",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub rule: Rule,
}

impl FieldError {
    pub fn required(field: Field) -> Self {
        Self {
            field,
            rule: Rule::Required,
        }
    }

    pub fn format(field: Field) -> Self {
        Self {
            field,
            rule: Rule::Format,
        }
    }

    /// Stable machine-readable code, e.g. `name-format`.
    pub fn code(&self) -> String {
        format!("{}-{}", self.field.slug(), self.rule.slug())
    }

    /// Human readable message shown next to the field.
    pub fn message(&self) -> String {
        match (self.field, self.rule) {
            (Field::Name, Rule::Format) => {
                "name must be uppercase and contain only letters, numbers, underscores".to_string()
            }
            (Field::ExpirationDate, Rule::Format) => {
                "expirationDate must be in YYYY-MM-DD format".to_string()
            }
            (field, Rule::Required) => format!("{} is required", field.as_str()),
            (field, Rule::Format) => format!("{} has an invalid format", field.as_str()),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FieldError {}

/// Parses an optional `YYYY-MM-DD` date. Empty means no expiration.
pub fn parse_expiration_date(value: &str) -> Result<Option<NaiveDate>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, EXPIRATION_DATE_FORMAT)
        .map(Some)
        .map_err(|_| FieldError::format(Field::ExpirationDate))
}

fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.is_empty() {
        return Err(FieldError::required(Field::Name));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(FieldError::format(Field::Name));
    }
    Ok(())
}

fn validate_details(description: &str, expiration_date: &str) -> Result<(), FieldError> {
    if description.is_empty() {
        return Err(FieldError::required(Field::Description));
    }
    parse_expiration_date(expiration_date)?;
    Ok(())
}

pub fn validate_feature_flag_create(request: &FeatureFlagRequest) -> Result<(), FieldError> {
    validate_name(&request.name)?;
    validate_details(&request.description, &request.expiration_date)
}

/// Same as create, minus the name: it cannot change after creation.
pub fn validate_feature_flag_update(request: &UpdateFeatureFlagRequest) -> Result<(), FieldError> {
    validate_details(&request.description, &request.expiration_date)
}

/// Both ids must be set (non-zero).
pub fn validate_assignment(request: &AssignmentRequest) -> Result<(), FieldError> {
    match request.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let failed = errors.field_errors();
            if failed.contains_key("person_id") {
                Err(FieldError::required(Field::PersonId))
            } else {
                Err(FieldError::required(Field::FeatureFlagId))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(name: &str, description: &str, expiration_date: &str) -> FeatureFlagRequest {
        FeatureFlagRequest {
            name: name.to_string(),
            description: description.to_string(),
            expiration_date: expiration_date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_create_request() {
        assert!(validate_feature_flag_create(&create_request("NEW_CHECKOUT_2", "d", "")).is_ok());
        assert!(
            validate_feature_flag_create(&create_request("FLAG", "d", "2030-01-31")).is_ok()
        );
    }

    #[test]
    fn test_empty_name_is_required() {
        let err = validate_feature_flag_create(&create_request("", "d", "")).unwrap_err();
        assert_eq!(err, FieldError::required(Field::Name));
        assert_eq!(err.code(), "name-required");
    }

    #[test]
    fn test_name_format_rejects_lowercase_and_symbols() {
        for name in ["test_flag", "TEST-FLAG", "TEST FLAG", "FLAG!", "Ünicode"] {
            let err = validate_feature_flag_create(&create_request(name, "d", "")).unwrap_err();
            assert_eq!(err.code(), "name-format", "name {:?}", name);
        }
    }

    #[test]
    fn test_name_checked_before_description() {
        let err = validate_feature_flag_create(&create_request("bad", "", "nope")).unwrap_err();
        assert_eq!(err.field, Field::Name);
    }

    #[test]
    fn test_description_is_required() {
        let err = validate_feature_flag_create(&create_request("FLAG", "", "")).unwrap_err();
        assert_eq!(err.code(), "description-required");
        assert_eq!(err.message(), "description is required");
    }

    #[test]
    fn test_expiration_date_format() {
        for date in ["31/01/2030", "2030-13-01", "2030-02-30", "tomorrow", "2030-01-31T00:00:00"] {
            let err = validate_feature_flag_create(&create_request("FLAG", "d", date)).unwrap_err();
            assert_eq!(err.code(), "expiration-format", "date {:?}", date);
        }
    }

    #[test]
    fn test_update_ignores_name() {
        let request = UpdateFeatureFlagRequest {
            description: "d".to_string(),
            ..Default::default()
        };
        assert!(validate_feature_flag_update(&request).is_ok());

        let request = UpdateFeatureFlagRequest::default();
        assert_eq!(
            validate_feature_flag_update(&request).unwrap_err().field,
            Field::Description
        );
    }

    #[test]
    fn test_assignment_ids_required() {
        let ok = AssignmentRequest {
            person_id: 1,
            feature_flag_id: 2,
        };
        assert!(validate_assignment(&ok).is_ok());

        let no_person = AssignmentRequest {
            person_id: 0,
            feature_flag_id: 2,
        };
        assert_eq!(
            validate_assignment(&no_person).unwrap_err().code(),
            "person-id-required"
        );

        let no_flag = AssignmentRequest {
            person_id: 1,
            feature_flag_id: 0,
        };
        assert_eq!(
            validate_assignment(&no_flag).unwrap_err().code(),
            "feature-flag-id-required"
        );

        let neither = AssignmentRequest::default();
        assert_eq!(validate_assignment(&neither).unwrap_err().field, Field::PersonId);
    }

    #[test]
    fn test_parse_expiration_date() {
        assert_eq!(parse_expiration_date("").unwrap(), None);
        assert_eq!(
            parse_expiration_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
