//! Chat and membership extractors.

use serde_json::Value;
use sift_core::{
    BoxedChecker, Event, EventKind, ExtractResult, Extractor, Pattern, PatternError, Scope,
    Subscription, checker,
};

// =============================================================================
// ChatExtractor
// =============================================================================

/// Matches the id of the chat an event belongs to.
///
/// | pattern | matches when |
/// |---|---|
/// | `Number(n)` | the chat id equals `n` |
/// | `Literal(s)` | the decimal chat id equals `s` |
/// | `Regex(re)` | `re` matches the decimal chat id |
/// | `Predicate(f)` | `f` accepts the chat id as a JSON number |
///
/// Fires with `[chat_id, kind]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatExtractor;

impl ChatExtractor {
    fn matches(chat_id: i64, pattern: &Pattern) -> Result<bool, PatternError> {
        match pattern {
            Pattern::Number(expected) => Ok(*expected == chat_id),
            Pattern::Predicate(f) => Ok(f(&Value::from(chat_id))),
            other => other.matches_str(&chat_id.to_string()),
        }
    }
}

impl Extractor for ChatExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([
            EventKind::Message,
            EventKind::EditedMessage,
            EventKind::ChannelPost,
            EventKind::EditedChannelPost,
            EventKind::CallbackQuery,
            EventKind::MyChatMember,
            EventKind::ChatMember,
            EventKind::ChatJoinRequest,
        ])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(chat_id) = event.chat_id() else {
            return Ok(None);
        };
        Ok(Some(checker(move |pattern: &Pattern| {
            Ok(Self::matches(chat_id, pattern)?
                .then(|| vec![Value::from(chat_id), Value::from(kind.as_str())]))
        })))
    }
}

// =============================================================================
// ChatMemberExtractor
// =============================================================================

/// Matches the new status in a membership update (`member`, `left`,
/// `administrator`, `kicked`, ...).
///
/// Fires with `[status]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatMemberExtractor;

impl Extractor for ChatMemberExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([EventKind::ChatMember, EventKind::MyChatMember])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(status) = event
            .pointer("/new_chat_member/status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };
        Ok(Some(checker(move |pattern: &Pattern| {
            Ok(pattern
                .matches_str(status)?
                .then(|| vec![Value::from(status)]))
        })))
    }
}
