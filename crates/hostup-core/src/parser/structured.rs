use serde_json::{Map, Value};

use crate::parser::fields::{ID_RULE, is_pinned, resolve_record};
use crate::parser::{ParseFailure, ParsedUpgrade};

/// Extracts upgrade records from output that contains a JSON array or object
/// somewhere inside it.
///
/// The payload spans from the first `[` (or the first `{` when the text has
/// no `[`) to the last matching closer anywhere in the text. Items without a
/// resolvable id or name are dropped; an empty result is a failure so the
/// caller can fall back to the tabular query.
pub fn parse_structured(raw: &str) -> Result<Vec<ParsedUpgrade>, ParseFailure> {
    let payload = locate_payload(raw)?;

    let value: Value =
        serde_json::from_str(payload).map_err(|error| ParseFailure::NoUsableRecords {
            detail: Some(error.to_string()),
        })?;

    let records: Vec<ParsedUpgrade> = record_objects(&value)
        .into_iter()
        .filter(|object| !is_pinned(*object))
        .filter_map(|object| resolve_record(object))
        .collect();

    if records.is_empty() {
        return Err(ParseFailure::NoUsableRecords { detail: None });
    }

    Ok(records)
}

fn locate_payload(raw: &str) -> Result<&str, ParseFailure> {
    let (start, closing) = match (raw.find('['), raw.find('{')) {
        (Some(start), _) => (start, ']'),
        (None, Some(start)) => (start, '}'),
        (None, None) => return Err(ParseFailure::NoOpeningBracket),
    };

    match raw.rfind(closing) {
        Some(end) if end >= start => Ok(&raw[start..=end]),
        _ => Err(ParseFailure::NoMatchingBracket { closing, start }),
    }
}

fn record_objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(object) if ID_RULE.resolve(object).is_some() => vec![object],
        // Wrapper objects such as `{"Data": [...]}` carry the records one level down.
        Value::Object(object) => object
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_object)
            .collect(),
        _ => Vec::new(),
    }
}
