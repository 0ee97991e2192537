//! YAML error diagnostics pointing at the offending line of a record file

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A record file that could not be read as YAML or did not fit the record shape
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(pinv::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Wrap a serde_yml error, locating it in `source`
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help: suggest_fix(&message),
            message,
        }
    }

    /// One-line summary without the source excerpt
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from reading a record file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl YamlError {
    /// Short description suitable for a table cell or log field
    pub fn summary(&self) -> String {
        match self {
            YamlError::Syntax(e) => e.message().to_string(),
            YamlError::Io(e) => e.to_string(),
        }
    }
}

/// Convert a 1-based line/column to a byte offset, clamped to the source length
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        match source
            .match_indices('\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)
        {
            Some(start) => start,
            None => return source.len().saturating_sub(1),
        }
    };

    let rest = &source[line_start..];
    let line_len = rest.find('\n').unwrap_or(rest.len());
    let col_offset = rest[..line_len]
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_len);

    line_start + col_offset
}

/// Hints for the mistakes people make when hand-editing records
fn suggest_fix(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("tab") {
        return Some("YAML indentation must use spaces, not tabs.".to_string());
    }

    if msg.contains("duplicate") {
        return Some("Each key can only appear once in a record.".to_string());
    }

    if msg.contains("mapping values are not allowed") || msg.contains("unexpected ':'") {
        return Some("Names containing ':' must be quoted, e.g. name: \"Shelf: top\"".to_string());
    }

    if msg.contains("premature end of input") || msg.contains("input contains invalid characters") {
        return Some("Dates use the YYYY-MM-DD format, e.g. purchase_date: 2024-05-01".to_string());
    }

    if msg.contains("invalid type") && msg.contains("f64") {
        return Some(
            "Values must be plain numbers without currency symbols, e.g. value: 249.99".to_string(),
        );
    }

    if msg.contains("missing field") {
        return Some("Every record needs at least: id, name, created, author.".to_string());
    }

    if msg.contains("invalid record prefix") || msg.contains("invalid ulid") {
        return Some("IDs look like LOC-<26 characters> or ITEM-<26 characters>.".to_string());
    }

    None
}
