//! Schema validation with located error reporting

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// All schema violations found in one file
#[derive(Debug, Error, Diagnostic)]
#[error("{filename}: {summary}")]
#[diagnostic(code(pinv::schema::invalid))]
pub struct ValidationError {
    filename: String,
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl ValidationError {
    fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let summary = match violations.len() {
            1 => "1 schema error".to_string(),
            n => format!("{} schema errors", n),
        };
        Self {
            filename: filename.to_string(),
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Violation messages, one per entry
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

/// Schema validator with compiled schemas
pub struct Validator {
    compiled: HashMap<EntityPrefix, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for prefix in EntityPrefix::all() {
            let Some(text) = registry.get(*prefix) else {
                continue;
            };
            match serde_json::from_str::<JsonValue>(text)
                .map_err(|e| e.to_string())
                .and_then(|json| validator_for(&json).map_err(|e| e.to_string()))
            {
                Ok(validator) => {
                    compiled.insert(*prefix, validator);
                }
                Err(e) => tracing::warn!(record = %prefix, error = %e, "schema failed to compile"),
            }
        }

        Self { compiled }
    }

    /// Check YAML text against the schema of its record type
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        prefix: EntityPrefix,
    ) -> Result<(), ValidationError> {
        let yaml: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
            let span = line_span(content, e.location().map(|l| l.line()).unwrap_or(1));
            ValidationError::new(
                filename,
                content,
                vec![SchemaViolation {
                    span,
                    message: format!("YAML parse error: {}", e),
                    hint: "invalid YAML".to_string(),
                    help: Some("Check indentation, colons and quoting".to_string()),
                }],
            )
        })?;

        let json: JsonValue = serde_json::to_value(&yaml).map_err(|e| {
            ValidationError::new(
                filename,
                content,
                vec![SchemaViolation {
                    span: line_span(content, 1),
                    message: format!("cannot check record structure: {}", e),
                    hint: "unsupported value".to_string(),
                    help: None,
                }],
            )
        })?;

        let Some(schema) = self.compiled.get(&prefix) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&json)
            .map(|e| to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }

    /// Validate a file, inferring its record type from name or directory
    ///
    /// Files of unknown type pass.
    pub fn validate_file(&self, path: &Path) -> std::io::Result<Result<(), ValidationError>> {
        let content = std::fs::read_to_string(path)?;
        let filename = path.to_string_lossy();

        Ok(match EntityPrefix::from_path(path) {
            Some(prefix) => self.validate(&content, &filename, prefix),
            None => Ok(()),
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

fn to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    let at = if path.is_empty() {
        "record".to_string()
    } else {
        format!("'{}'", path.trim_start_matches('/'))
    };

    let (message, hint, help) = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            (
                format!("missing required field '{}'", name),
                "required field missing".to_string(),
                Some(format!("Add a '{}:' line", name)),
            )
        }
        ValidationErrorKind::Type { kind } => (
            format!("wrong type at {}: expected {:?}", at, kind),
            "wrong type".to_string(),
            None,
        ),
        ValidationErrorKind::Pattern { pattern } => {
            let help = if pattern.contains("[0-9]{4}") {
                Some("Dates use YYYY-MM-DD".to_string())
            } else if pattern.contains("LOC-") || pattern.contains("ITEM-") {
                Some("IDs are a type prefix and a 26-character ULID".to_string())
            } else {
                None
            };
            (
                format!("value at {} has the wrong format", at),
                "bad format".to_string(),
                help,
            )
        }
        ValidationErrorKind::Minimum { limit } => (
            format!("value at {} is below the minimum {}", at, limit),
            "too small".to_string(),
            None,
        ),
        ValidationErrorKind::AdditionalProperties { unexpected } => (
            format!("unknown field(s): {}", unexpected.join(", ")),
            "unknown field".to_string(),
            Some("Remove the field or check its spelling".to_string()),
        ),
        _ => (
            format!("invalid value at {}: {}", at, error),
            "invalid".to_string(),
            None,
        ),
    };

    let key = match &error.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected.first().cloned(),
        _ => path
            .rsplit('/')
            .find(|p| !p.is_empty() && p.parse::<usize>().is_err())
            .map(String::from),
    };
    let span = key
        .and_then(|k| key_span(content, &k))
        .unwrap_or_else(|| line_span(content, 1));

    SchemaViolation {
        span,
        message,
        hint,
        help,
    }
}

/// Span of a whole (1-based) line
fn line_span(content: &str, line: usize) -> SourceSpan {
    let mut offset = 0;
    for (i, text) in content.split('\n').enumerate() {
        if i + 1 == line {
            return (offset, text.len().max(1)).into();
        }
        offset += text.len() + 1;
    }
    (0, content.len().min(1)).into()
}

/// Span of a `key:` line at any indentation
fn key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let needle = format!("{}:", key);
    let mut offset = 0;
    for line in content.split('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&needle) {
            let start = offset + (line.len() - trimmed.len());
            return Some((start, trimmed.len()).into());
        }
        offset += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_LOCATION: &str = r#"
id: LOC-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: Kitchen
created: 2024-01-01T00:00:00Z
author: Test
"#;

    #[test]
    fn test_validator_compiles_all_schemas() {
        let validator = Validator::default();
        assert!(validator.compiled.contains_key(&EntityPrefix::Loc));
        assert!(validator.compiled.contains_key(&EntityPrefix::Item));
    }

    #[test]
    fn test_valid_location() {
        let validator = Validator::default();
        let result = validator.validate(GOOD_LOCATION, "loc.pinv.yaml", EntityPrefix::Loc);
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_missing_name_and_unknown_field() {
        let validator = Validator::default();
        let yaml = r#"
id: LOC-01HC2JB7SMQX7RS1Y0GFKBHPTD
colour: red
created: 2024-01-01T00:00:00Z
author: Test
"#;
        let err = validator
            .validate(yaml, "loc.pinv.yaml", EntityPrefix::Loc)
            .unwrap_err();
        assert_eq!(err.violation_count(), 2);
        let messages = err.messages().join("\n");
        assert!(messages.contains("name"));
        assert!(messages.contains("colour"));
    }

    #[test]
    fn test_item_value_and_date_checks() {
        let validator = Validator::default();
        let yaml = r#"
id: ITEM-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: Drill
value: -3
purchase_date: "last year"
created: 2024-01-01T00:00:00Z
author: Test
"#;
        let err = validator
            .validate(yaml, "item.pinv.yaml", EntityPrefix::Item)
            .unwrap_err();
        assert_eq!(err.violation_count(), 2);
    }

    #[test]
    fn test_yaml_syntax_error() {
        let validator = Validator::default();
        let err = validator
            .validate("name: [oops\n", "x.pinv.yaml", EntityPrefix::Loc)
            .unwrap_err();
        assert!(err.messages()[0].contains("YAML parse error"));
    }

    #[test]
    fn test_key_span() {
        let content = "id: x\n  name: y\n";
        let span = key_span(content, "name").unwrap();
        assert_eq!(span.offset(), 8);
    }
}
