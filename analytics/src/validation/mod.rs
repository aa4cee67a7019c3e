//! JSON Schema validation for analytics configuration files.
//!
//! Configuration is validated against a Draft 7 schema before it is
//! deserialized, so a typo in a key or an out-of-range month is reported
//! instead of being silently ignored.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from `schemas/` directory:
//! - `analytics-config.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use sales_analytics::validation::validate_config;
//!
//! let config = json!({ "calendar": { "fiscal_start_month": 4 } });
//! assert!(validate_config(&config).is_ok());
//!
//! let config = json!({ "calendar": { "fiscal_start_month": 13 } });
//! assert!(validate_config(&config).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/analytics-config.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use sales_analytics::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" }
///     }
/// });
///
/// assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
/// assert!(validate(&schema, &json!({ "age": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a configuration document against the embedded config schema.
pub fn validate_config(data: &Value) -> Result<(), Vec<String>> {
    validate(&CONFIG_SCHEMA, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&json!({})).is_ok());
    }

    #[test]
    fn test_full_config_is_valid() {
        let config = json!({
            "columns": { "date": ["order date"], "amount": ["revenue"] },
            "cleaning": { "drop_duplicates": false, "unknown_label": "N/A", "min_year": 2000, "max_year": 2099 },
            "calendar": { "fiscal_start_month": 7, "buffer_months": 1 },
            "measures": { "top_n": 5, "current_year": null },
            "report": { "currency_symbol": "$", "dashboard": true }
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_out_of_range_month_rejected() {
        let config = json!({ "calendar": { "fiscal_start_month": 13 } });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("13"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let config = json!({ "measures": { "top": 3 } });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_synonym_list_rejected() {
        let config = json!({ "columns": { "date": [] } });
        assert!(validate_config(&config).is_err());
    }
}
