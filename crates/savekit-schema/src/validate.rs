//! Ahead-of-time checks over saveable component types.
//!
//! Discovery silently skips unsupported fields and lets the last field win
//! when two share a save key. [`validate_component_types`] reports both so
//! they can be caught in tests or at startup.

use std::collections::HashMap;
use std::fmt;

use savekit_convert::registry::ConverterRegistry;
use savekit_convert::value::FieldType;

use crate::reflect::ComponentType;

/// What is wrong with a saved field.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// The declared type cannot be converted.
    UnsupportedType(FieldType),
    /// The save key is also used by an earlier field of the same type.
    DuplicateKey { key: String, shadowed: &'static str },
}

/// One problem found on a saved field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub component: &'static str,
    pub field: &'static str,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::UnsupportedType(ty) => {
                write!(f, "{}.{}: unsupported type {ty}", self.component, self.field)
            }
            IssueKind::DuplicateKey { key, shadowed } => write!(
                f,
                "{}.{}: save key '{key}' shadows field '{shadowed}'",
                self.component, self.field
            ),
        }
    }
}

/// Check every saved field of every type.
pub fn validate_component_types(types: &[ComponentType], converters: &ConverterRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for ty in types {
        let mut seen: HashMap<&'static str, &'static str> = HashMap::new();
        for (field, attr) in ty.saved_fields() {
            if !converters.is_supported(&field.field_type) {
                issues.push(ValidationIssue {
                    component: ty.name(),
                    field: field.name,
                    kind: IssueKind::UnsupportedType(field.field_type.clone()),
                });
            }
            let key = attr.effective_key(field.name);
            if let Some(previous) = seen.insert(key, field.name) {
                issues.push(ValidationIssue {
                    component: ty.name(),
                    field: field.name,
                    kind: IssueKind::DuplicateKey {
                        key: key.to_owned(),
                        shadowed: previous,
                    },
                });
            }
        }
    }
    issues
}
