//! Inline-keyboard callback matching.
//!
//! Callback data is written as `action` or `action[params...]`, where the
//! bracketed suffix is a JSON array:
//!
//! ```text
//! vote[42, "up"]   ->  action "vote", params [42, "up"]
//! refresh          ->  action "refresh", params []
//! Buy [x2]         ->  action "Buy [x2]", params []
//! ```
//!
//! Data whose bracketed suffix is not a JSON array is ordinary button data:
//! the whole trimmed string becomes the action.

use serde_json::Value;
use sift_core::{
    BoxedChecker, Event, EventKind, ExtractResult, Extractor, Pattern, Scope, Subscription,
    checker,
};

/// Splits callback data into its action and JSON parameters.
///
/// The action is everything before the first `[`, trimmed, when the rest
/// parses as a JSON array; otherwise the whole trimmed data with no params.
pub fn parse_callback_data(data: &str) -> (&str, Vec<Value>) {
    let parsed = data.find('[').and_then(|offset| {
        serde_json::from_str::<Vec<Value>>(&data[offset..])
            .ok()
            .map(|params| (data[..offset].trim(), params))
    });
    parsed.unwrap_or_else(|| (data.trim(), Vec::new()))
}

/// Matches the action of a callback query.
///
/// Fires with the decoded parameters as handler values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackQueryExtractor;

impl Extractor for CallbackQueryExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([EventKind::CallbackQuery])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(data) = event.str_field("data") else {
            return Ok(None);
        };
        let (action, params) = parse_callback_data(data);

        Ok(Some(checker(move |pattern: &Pattern| {
            Ok(pattern.matches_str(action)?.then(|| params.clone()))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::ExtractorTable;

    static CALLBACK_QUERY: EventKind = EventKind::CallbackQuery;

    #[test]
    fn test_parse_callback_data() {
        assert_eq!(
            parse_callback_data(r#"vote [42, "up"]"#),
            ("vote", vec![json!(42), json!("up")])
        );
        assert_eq!(parse_callback_data(" refresh "), ("refresh", vec![]));
        assert_eq!(parse_callback_data("vote[42"), ("vote[42", vec![]));
        assert_eq!(parse_callback_data(r#"vote[{"a": 1}"#), (r#"vote[{"a": 1}"#, vec![]));
        assert_eq!(parse_callback_data(r#"cfg{"a": 1}"#), (r#"cfg{"a": 1}"#, vec![]));
    }

    #[test]
    fn test_action_match_fires_with_params() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({ "id": "1", "data": "page[2]" }));
        let check = CallbackQueryExtractor
            .activate(&event, &CALLBACK_QUERY, Scope::new(&table, 8))
            .unwrap()
            .unwrap();

        assert_eq!(check.test(&"page".into()).unwrap(), Some(vec![json!(2)]));
        assert!(check.test(&"page[2]".into()).unwrap().is_none());
    }

    #[test]
    fn test_bracketed_button_text_is_a_plain_action() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({ "id": "1", "data": "Buy [x2]" }));
        let check = CallbackQueryExtractor
            .activate(&event, &CALLBACK_QUERY, Scope::new(&table, 8))
            .unwrap()
            .unwrap();

        assert_eq!(check.test(&"Buy [x2]".into()).unwrap(), Some(vec![]));
        assert!(check.test(&"Buy".into()).unwrap().is_none());
    }
}
