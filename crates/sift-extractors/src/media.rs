//! Media attachment matching.

use serde_json::Value;
use sift_core::{
    BoxedChecker, Event, EventKind, ExtractResult, Extractor, Pattern, Scope, Subscription,
    checker,
};

/// Media fields recognised on a message, in the order they are checked.
pub const MEDIA_TYPES: [&str; 8] = [
    "photo",
    "video",
    "audio",
    "document",
    "voice",
    "video_note",
    "animation",
    "sticker",
];

/// Matches the kind of media attached to a message.
///
/// Patterns are tested against media type names (`photo`, `sticker`, ...);
/// the first attached type that matches fires with `[media_type]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaExtractor;

impl Extractor for MediaExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([EventKind::Message])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let present: Vec<&'static str> = MEDIA_TYPES
            .into_iter()
            .filter(|field| event.has(field))
            .collect();
        if present.is_empty() {
            return Ok(None);
        }

        Ok(Some(checker(move |pattern: &Pattern| {
            for media in &present {
                if pattern.matches_str(media)? {
                    return Ok(Some(vec![Value::from(*media)]));
                }
            }
            Ok(None)
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
    fn test_matches_attached_media() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({
            "caption": "look",
            "photo": [{ "file_id": "a" }],
            "document": { "file_id": "b" }
        }));
        let check = MediaExtractor
            .activate(&event, &MESSAGE, Scope::new(&table, 8))
            .unwrap()
            .unwrap();

        assert_eq!(
            check.test(&"document".into()).unwrap(),
            Some(vec![json!("document")])
        );
        assert_eq!(
            check.test(&Pattern::regex(".").unwrap()).unwrap(),
            Some(vec![json!("photo")])
        );
        assert!(check.test(&"video".into()).unwrap().is_none());
    }

    #[test]
    fn test_plain_text_is_not_media() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({ "text": "photo", "sticker": null }));
        let activated = MediaExtractor
            .activate(&event, &MESSAGE, Scope::new(&table, 8))
            .unwrap();
        assert!(activated.is_none());
    }
}
