//! Document type and id validation.
//!
//! Both names become segments of substrate keys and of glob scan patterns,
//! so they must:
//! - be non-empty
//! - not contain the key separator `/`
//! - not contain glob metacharacters (`*`, `?`, `[`, `]`, `\`)
//! - not contain whitespace or control characters

use crate::error::TypeError;

/// Characters that are forbidden anywhere in a type name or document id.
const FORBIDDEN_CHARS: &[char] = &['/', '*', '?', '[', ']', '\\'];

fn validate(kind: &'static str, name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".into()));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("contains whitespace or control character: {ch:?}")));
    }

    Ok(())
}

/// Validate a document type name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use revdoc_types::names::validate_type_name;
///
/// assert!(validate_type_name("workitems").is_ok());
/// assert!(validate_type_name("").is_err());
/// assert!(validate_type_name("work/items").is_err());
/// ```
pub fn validate_type_name(name: &str) -> Result<(), TypeError> {
    validate("type", name)
}

/// Validate a document id. Same rules as type names.
pub fn validate_doc_id(id: &str) -> Result<(), TypeError> {
    validate("id", id)
}
