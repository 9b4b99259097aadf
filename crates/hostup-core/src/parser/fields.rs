//! Prioritized field resolution over a generic key-value record.
//!
//! Managers spell the same logical field differently (`Id` vs `PackageId`);
//! each [`FieldRule`] lists the accepted keys in priority order and the first
//! key holding a non-empty scalar wins. JSON objects and table rows both
//! resolve through [`resolve_record`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::parser::{ParsedUpgrade, non_empty};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldRule {
    pub keys: &'static [&'static str],
}

pub const ID_RULE: FieldRule = FieldRule {
    keys: &["Id", "PackageId"],
};
pub const NAME_RULE: FieldRule = FieldRule {
    keys: &["Name", "PackageName"],
};
pub const CURRENT_VERSION_RULE: FieldRule = FieldRule {
    keys: &["Version"],
};
pub const AVAILABLE_VERSION_RULE: FieldRule = FieldRule {
    keys: &["AvailableVersion"],
};
pub const SOURCE_RULE: FieldRule = FieldRule { keys: &["Source"] };
pub const PINNED_RULE: FieldRule = FieldRule {
    keys: &["Pinned", "IsPinned"],
};

/// Read-only key-value view a record can be resolved from.
pub trait FieldView {
    fn scalar(&self, key: &str) -> Option<String>;
}

impl FieldView for Map<String, Value> {
    fn scalar(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(text) => non_empty(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

/// Fields cut out of one text-table row, keyed like the JSON reports.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RowFields {
    values: BTreeMap<&'static str, String>,
}

impl RowFields {
    pub fn with(mut self, key: &'static str, value: &str) -> Self {
        if let Some(value) = non_empty(value) {
            self.values.insert(key, value);
        }
        self
    }
}

impl FieldView for RowFields {
    fn scalar(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl FieldRule {
    pub fn resolve(&self, view: &dyn FieldView) -> Option<String> {
        self.keys.iter().find_map(|key| view.scalar(key))
    }
}

/// Pinned packages are held back by the manager itself and are never
/// offered for upgrade.
pub fn is_pinned(view: &dyn FieldView) -> bool {
    PINNED_RULE
        .resolve(view)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Builds a record from any view; `None` when the id or name is missing.
pub fn resolve_record(view: &dyn FieldView) -> Option<ParsedUpgrade> {
    let id = ID_RULE.resolve(view)?;
    let name = NAME_RULE.resolve(view)?;

    Some(ParsedUpgrade {
        name,
        id,
        current_version: CURRENT_VERSION_RULE.resolve(view),
        available_version: AVAILABLE_VERSION_RULE.resolve(view),
        source: SOURCE_RULE.resolve(view),
    })
}
