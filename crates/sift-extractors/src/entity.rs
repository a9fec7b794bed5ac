//! Extractors over message entities.
//!
//! Message entities are typed spans of the text (`bot_command`, `hashtag`,
//! `mention`, `url`, ...). Their offsets are counted in UTF-16 code units,
//! so slicing goes through
//! [`MessageEntity::slice`](sift_core::MessageEntity::slice).
//!
//! - [`EntityExtractor`] tests patterns against the entity *type*
//! - [`TaggedExtractor`] tests patterns against the text of entities of one
//!   type (hashtags, mentions)
//! - [`CommandExtractor`] collects every matching bot command

use serde_json::Value;
use sift_core::{
    BoxedChecker, Event, EventKind, ExtractResult, Extractor, Pattern, Scope, Subscription,
    checker,
};

const BOT_COMMAND: &str = "bot_command";
const HASHTAG: &str = "hashtag";
const MENTION: &str = "mention";

/// An entity's type and the text it covers.
#[derive(Debug, Clone)]
struct Span {
    kind: String,
    value: String,
}

/// Collects the entity spans of `event`, or `None` without text or entities.
///
/// Entities whose range falls outside the text are dropped.
fn spans(event: &Event) -> Option<Vec<Span>> {
    let text = event.text_or_caption()?;
    let entities = event.entities()?;

    Some(
        entities
            .into_iter()
            .filter_map(|entity| {
                let value = entity.slice(text)?;
                Some(Span {
                    kind: entity.kind,
                    value,
                })
            })
            .collect(),
    )
}

fn message_kinds() -> Subscription {
    Subscription::kinds([EventKind::Message, EventKind::ChannelPost])
}

// =============================================================================
// EntityExtractor
// =============================================================================

/// Matches entity types.
///
/// The first entity whose type matches fires with `[type, value]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl Extractor for EntityExtractor {
    fn subscription(&self) -> Subscription {
        message_kinds()
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(found) = spans(event).filter(|spans| !spans.is_empty()) else {
            return Ok(None);
        };
        Ok(Some(checker(move |pattern: &Pattern| {
            for span in &found {
                if pattern.matches_str(&span.kind)? {
                    return Ok(Some(vec![
                        Value::from(span.kind.as_str()),
                        Value::from(span.value.as_str()),
                    ]));
                }
            }
            Ok(None)
        })))
    }
}

// =============================================================================
// TaggedExtractor
// =============================================================================

/// Matches the text of entities of a single type.
///
/// The first entity whose text matches fires with `[value]`.
#[derive(Debug, Clone, Copy)]
pub struct TaggedExtractor {
    entity_type: &'static str,
}

impl TaggedExtractor {
    /// Matches entities of `entity_type`.
    pub const fn new(entity_type: &'static str) -> Self {
        Self { entity_type }
    }

    /// Matches `#hashtags`.
    pub const fn hashtag() -> Self {
        Self::new(HASHTAG)
    }

    /// Matches `@mentions`.
    pub const fn mention() -> Self {
        Self::new(MENTION)
    }

    /// The entity type this extractor reads.
    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }
}

impl Extractor for TaggedExtractor {
    fn subscription(&self) -> Subscription {
        message_kinds()
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let values: Vec<String> = spans(event)
            .unwrap_or_default()
            .into_iter()
            .filter(|span| span.kind == self.entity_type)
            .map(|span| span.value)
            .collect();
        if values.is_empty() {
            return Ok(None);
        }

        Ok(Some(checker(move |pattern: &Pattern| {
            for value in &values {
                if pattern.matches_str(value)? {
                    return Ok(Some(vec![Value::from(value.as_str())]));
                }
            }
            Ok(None)
        })))
    }
}

// =============================================================================
// CommandExtractor
// =============================================================================

/// Matches bot commands (`/start`, `/help@my_bot`, ...).
///
/// Every `bot_command` entity matching the pattern is collected; the route
/// fires once with all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExtractor;

impl Extractor for CommandExtractor {
    fn subscription(&self) -> Subscription {
        message_kinds()
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(found) = spans(event) else {
            return Ok(None);
        };
        let commands: Vec<String> = found
            .into_iter()
            .filter(|span| span.kind == BOT_COMMAND)
            .map(|span| span.value)
            .collect();

        Ok(Some(checker(move |pattern: &Pattern| {
            let mut matched = Vec::new();
            for command in &commands {
                if pattern.matches_str(command)? {
                    matched.push(Value::from(command.as_str()));
                }
            }
            Ok((!matched.is_empty()).then_some(matched))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::{ExtractorTable, PatternError};

    static MESSAGE: EventKind = EventKind::Message;

    fn activate<'a>(
        extractor: &'a dyn Extractor,
        table: &'a ExtractorTable,
        event: &'a Event,
    ) -> Option<BoxedChecker<'a>> {
        extractor
            .activate(event, &MESSAGE, Scope::new(table, 8))
            .unwrap()
    }

    fn message() -> Event {
        // "📣" is two UTF-16 code units, which shifts every later offset.
        Event::new(json!({
            "text": "📣 /start now #rust @ferris /help",
            "entities": [
                { "type": "bot_command", "offset": 3, "length": 6 },
                { "type": "hashtag", "offset": 14, "length": 5 },
                { "type": "mention", "offset": 20, "length": 7 },
                { "type": "bot_command", "offset": 28, "length": 5 }
            ]
        }))
    }

    #[test]
    fn test_entity_type_match() {
        let table = ExtractorTable::new();
        let event = message();
        let check = activate(&EntityExtractor, &table, &event).unwrap();

        assert_eq!(
            check.test(&"hashtag".into()).unwrap(),
            Some(vec![json!("hashtag"), json!("#rust")])
        );
        assert_eq!(
            check.test(&Pattern::regex("^bot_").unwrap()).unwrap(),
            Some(vec![json!("bot_command"), json!("/start")])
        );
        assert!(check.test(&"url".into()).unwrap().is_none());
    }

    #[test]
    fn test_hashtag_and_mention() {
        let table = ExtractorTable::new();
        let event = message();

        let hashtag = TaggedExtractor::hashtag();
        let check = activate(&hashtag, &table, &event).unwrap();
        assert_eq!(
            check.test(&"#rust".into()).unwrap(),
            Some(vec![json!("#rust")])
        );

        let mention = TaggedExtractor::mention();
        let check = activate(&mention, &table, &event).unwrap();
        assert!(check.test(&Pattern::regex("^@fer").unwrap()).unwrap().is_some());
        assert!(check.test(&"#rust".into()).unwrap().is_none());
    }

    #[test]
    fn test_commands_are_collected() {
        let table = ExtractorTable::new();
        let event = message();
        let check = activate(&CommandExtractor, &table, &event).unwrap();

        assert_eq!(
            check.test(&Pattern::regex("^/").unwrap()).unwrap(),
            Some(vec![json!("/start"), json!("/help")])
        );
        assert_eq!(
            check.test(&"/help".into()).unwrap(),
            Some(vec![json!("/help")])
        );
        assert_eq!(
            check.test(&Pattern::from(1_i64)).unwrap_err(),
            PatternError::unsupported("number")
        );
    }

    #[test]
    fn test_caption_entities_and_missing_entities() {
        let table = ExtractorTable::new();
        let captioned = Event::new(json!({
            "caption": "#sunset",
            "caption_entities": [{ "type": "hashtag", "offset": 0, "length": 7 }]
        }));
        let hashtag = TaggedExtractor::hashtag();
        assert!(activate(&hashtag, &table, &captioned).is_some());

        let plain = Event::new(json!({ "text": "#sunset" }));
        assert!(activate(&hashtag, &table, &plain).is_none());
        assert!(activate(&CommandExtractor, &table, &plain).is_none());
    }

    #[test]
    fn test_out_of_range_entity_is_dropped() {
        let table = ExtractorTable::new();
        let event = Event::new(json!({
            "text": "#a",
            "entities": [{ "type": "hashtag", "offset": 0, "length": 10 }]
        }));
        assert!(activate(&TaggedExtractor::hashtag(), &table, &event).is_none());
    }
}
