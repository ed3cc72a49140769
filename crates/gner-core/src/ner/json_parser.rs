//! Locating and repairing JSON in free-text model output.

use serde_json::Value;

use super::result::ExtractionFailure;

/// Key holding the entity list.
pub const NAMED_ENTITIES_KEY: &str = "named_entities";

/// Slice from the first `{` to the last `}` inclusive.
///
/// Returns `None` when there is no such span.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse JSON, falling back to a lenient repair pass.
pub fn parse_json_lenient(json_str: &str) -> Result<Value, ExtractionFailure> {
    match serde_json::from_str(json_str) {
        Ok(value) => Ok(value),
        Err(e) => {
            let repaired = repair_json(json_str);
            serde_json::from_str(&repaired).map_err(|_| ExtractionFailure::InvalidJson(e.to_string()))
        }
    }
}

/// Fix the common ways models break JSON.
fn repair_json(json_str: &str) -> String {
    json_str
        .replace('\'', "\"") // Single quotes to double
        .replace(",]", "]") // Trailing commas
        .replace(",}", "}")
        .replace(", ]", "]")
        .replace(", }", "}")
}

/// Pull the `named_entities` string list out of a parsed document.
pub fn named_entities_from_value(value: &Value) -> Result<Vec<String>, ExtractionFailure> {
    let list = value
        .as_object()
        .and_then(|obj| obj.get(NAMED_ENTITIES_KEY))
        .ok_or(ExtractionFailure::MissingNamedEntities)?;

    let items = list.as_array().ok_or(ExtractionFailure::NotAStringList)?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(ExtractionFailure::NotAStringList)
        })
        .collect()
}

/// Parse free-text output: locate the object, parse it, read the entities.
pub fn parse_named_entities(text: &str) -> Result<Vec<String>, ExtractionFailure> {
    let json_str = extract_json_object(text).ok_or(ExtractionFailure::NoJsonObject)?;
    let value = parse_json_lenient(json_str)?;
    named_entities_from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object() {
        let text = "Sure! Here you go:\n{\"named_entities\": [\"A\"]}\nHope that helps.";
        assert_eq!(extract_json_object(text), Some("{\"named_entities\": [\"A\"]}"));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_extract_from_code_block() {
        let text = "```json\n{\"named_entities\": [\"Bob\"]}\n```";
        assert_eq!(parse_named_entities(text).unwrap(), vec!["Bob"]);
    }

    #[test]
    fn test_lenient_single_quotes_and_trailing_comma() {
        let text = "{'named_entities': ['Paris', 'Rome',]}";
        assert_eq!(parse_named_entities(text).unwrap(), vec!["Paris", "Rome"]);
    }

    #[test]
    fn test_missing_key() {
        let err = parse_named_entities(r#"{"entities": ["A"]}"#).unwrap_err();
        assert_eq!(err, ExtractionFailure::MissingNamedEntities);
    }

    #[test]
    fn test_not_a_string_list() {
        let err = parse_named_entities(r#"{"named_entities": "A"}"#).unwrap_err();
        assert_eq!(err, ExtractionFailure::NotAStringList);
        let err = parse_named_entities(r#"{"named_entities": ["A", 3]}"#).unwrap_err();
        assert_eq!(err, ExtractionFailure::NotAStringList);
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_named_entities("{named_entities: [A B}").unwrap_err();
        assert!(matches!(err, ExtractionFailure::InvalidJson(_)));
    }

    #[test]
    fn test_no_object() {
        let err = parse_named_entities("I could not find any entities.").unwrap_err();
        assert_eq!(err, ExtractionFailure::NoJsonObject);
    }
}
