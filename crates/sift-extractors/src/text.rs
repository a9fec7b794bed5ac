//! Exact and regex matching on message text.

use serde_json::Value;
use sift_core::{
    BoxedChecker, Event, EventKind, ExtractResult, Extractor, Pattern, Scope, Subscription,
    checker,
};

/// Matches the message text (or media caption).
///
/// Literals compare for equality, regexes search, predicates receive the
/// text as a JSON string. Fires with `[text]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([EventKind::Message, EventKind::ChannelPost])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(text) = event.text_or_caption() else {
            return Ok(None);
        };
        Ok(Some(checker(move |pattern: &Pattern| {
            Ok(pattern
                .matches_str(text)?
                .then(|| vec![Value::from(text)]))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::ExtractorTable;

    static MESSAGE: EventKind = EventKind::Message;

    #[test]
    fn test_text_and_caption() {
        let table = ExtractorTable::new();
        let scope = Scope::new(&table, 8);

        for event in [
            Event::new(json!({ "text": "ping" })),
            Event::new(json!({ "text": "", "caption": "ping" })),
        ] {
            let check = TextExtractor
                .activate(&event, &MESSAGE, scope)
                .unwrap()
                .unwrap();
            assert_eq!(
                check.test(&"ping".into()).unwrap(),
                Some(vec![json!("ping")])
            );
            assert!(check.test(&Pattern::regex("^p").unwrap()).unwrap().is_some());
            assert!(check.test(&"pong".into()).unwrap().is_none());
        }
    }

    #[test]
    fn test_no_text() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({ "sticker": {} }));
        let activated = TextExtractor
            .activate(&event, &MESSAGE, Scope::new(&table, 8))
            .unwrap();
        assert!(activated.is_none());
    }
}
