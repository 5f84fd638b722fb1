//! Output naming policy.
//!
//! A business column keeps its internal name when the proposed external name
//! is identical (case-sensitive). Any other external name is an alias and
//! must be PascalCase.

use lakeform_types::TransformError;

/// Convert `snake_case`, `kebab-case` or space separated words to PascalCase.
///
/// Each segment's first character is uppercased and the rest kept, so
/// `"customer_ID"` becomes `"CustomerID"`.
pub fn to_pascal_case(internal: &str) -> String {
    internal
        .split(['_', '-', ' '])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Whether `name` is PascalCase: an uppercase first letter followed only by
/// letters and digits.
pub fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(char::is_alphanumeric),
        _ => false,
    }
}

/// Resolved external name of one business column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalName {
    pub name: String,
    /// `true` when `name` differs from the internal column name.
    pub aliased: bool,
}

/// Apply the naming policy to one column.
///
/// `proposed` is the caller's output name; `None` proposes the PascalCase
/// conversion of `internal`. `reference` is only used in error messages.
///
/// # Errors
///
/// `EmptyOutputName` for an empty proposal, `InvalidOutputName` for an alias
/// that is not PascalCase.
pub fn external_name(
    internal: &str,
    proposed: Option<&str>,
    reference: &str,
) -> Result<ExternalName, TransformError> {
    let proposed = match proposed {
        Some(name) => name.to_string(),
        None => to_pascal_case(internal),
    };

    if proposed.trim().is_empty() {
        return Err(TransformError::EmptyOutputName {
            reference: reference.to_string(),
        });
    }
    if proposed == internal {
        return Ok(ExternalName {
            name: proposed,
            aliased: false,
        });
    }
    if !is_pascal_case(&proposed) {
        return Err(TransformError::InvalidOutputName {
            name: proposed,
            reference: reference.to_string(),
        });
    }
    Ok(ExternalName {
        name: proposed,
        aliased: true,
    })
}
