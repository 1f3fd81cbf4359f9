use eai_core::analysis::{ModelReply, decode_model_response};
use eai_core::events::TracingSink;
use eai_core::loader::{builtin_document, load_catalog};
use eai_core::{Locale, TurnAnalysis, validate};
use serde_json::{Value, json};

use crate::util::{print_json, read_text, report_error};

const ANALYSIS_KEYS: &[&str] = &[
    "process_phases",
    "coregulation_bands",
    "task_densities",
    "secondary_dimensions",
    "active_fix",
];

/// Accepts a full model response or a bare analysis object. An object is
/// only read as a bare analysis when it carries an analysis key of its own;
/// anything else must be a complete response.
fn decode(raw: &str) -> ModelReply {
    let bare = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map))
            if !map.contains_key("analysis")
                && ANALYSIS_KEYS.iter().any(|key| map.contains_key(*key)) =>
        {
            serde_json::from_value::<TurnAnalysis>(Value::Object(map)).ok()
        }
        _ => None,
    };

    match bare {
        Some(analysis) => ModelReply {
            text: String::new(),
            analysis,
            schema_error: None,
        },
        None => decode_model_response(raw),
    }
}

pub fn run(locale: Locale, file: &str) -> i32 {
    let raw = match read_text(file) {
        Ok(raw) => raw,
        Err(e) => return report_error("cli_error", &e, None, 1),
    };

    let catalog = load_catalog(builtin_document(locale), locale, &TracingSink);
    let reply = decode(&raw);
    let result = validate(&reply.analysis, &catalog);

    print_json(&json!({
        "locale": locale,
        "catalog_version": catalog.version,
        "schema_error": reply.schema_error,
        "analysis": reply.analysis,
        "validation": result,
    }));

    if result.ok { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use eai_core::loader::{builtin_document, parse_catalog};
    use eai_core::{Locale, validate};

    use super::decode;

    #[test]
    fn bare_analysis_object_is_accepted() {
        let raw = json!({ "coregulation_bands": ["C1"], "active_fix": "NONE" }).to_string();
        let reply = decode(&raw);
        assert!(reply.schema_error.is_none());
        assert_eq!(reply.analysis.coregulation_bands, vec!["C1"]);
        assert_eq!(reply.analysis.active_fix, None);
    }

    #[test]
    fn full_response_is_decoded() {
        let raw = json!({
            "conversational_response": "Hi",
            "analysis": { "process_phases": ["P1"] }
        })
        .to_string();
        let reply = decode(&raw);
        assert_eq!(reply.text, "Hi");
        assert_eq!(reply.analysis.process_phases, vec!["P1"]);
    }

    #[test]
    fn plain_text_degrades() {
        let reply = decode("not json");
        assert!(reply.schema_error.is_some());
        assert!(reply.analysis.is_degraded());
    }

    #[test]
    fn response_without_chat_text_is_a_schema_error() {
        let catalog = parse_catalog(builtin_document(Locale::En)).unwrap();
        for raw in [
            json!({ "analysis": { "coregulation_bands": ["C9"] } }),
            json!({}),
            json!({ "foo": 1 }),
        ] {
            let reply = decode(&raw.to_string());
            assert!(reply.schema_error.is_some(), "{raw}");
            assert!(reply.analysis.is_degraded());
            assert!(!validate(&reply.analysis, &catalog).ok);
        }
    }
}
