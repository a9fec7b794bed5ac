//! # Sift Extractors
//!
//! The built-in extractors of the Sift event router.
//!
//! ## Overview
//!
//! | name | extractor | event kinds | handler values |
//! |---|---|---|---|
//! | `text` | [`TextExtractor`] | message, channel_post | `[text]` |
//! | `similarity` | [`SimilarityExtractor`] | message, channel_post | `[text, score]` |
//! | `command` | [`CommandExtractor`] | message, channel_post | every matching command |
//! | `entity` | [`EntityExtractor`] | message, channel_post | `[type, value]` |
//! | `hashtag` | [`TaggedExtractor::hashtag`] | message, channel_post | `[hashtag]` |
//! | `mention` | [`TaggedExtractor::mention`] | message, channel_post | `[mention]` |
//! | `media` | [`MediaExtractor`] | message | `[media_type]` |
//! | `chat` | [`ChatExtractor`] | chat-bound kinds | `[chat_id, kind]` |
//! | `chat_member` | [`ChatMemberExtractor`] | chat_member, my_chat_member | `[status]` |
//! | `callback_query` | [`CallbackQueryExtractor`] | callback_query | callback params |
//! | `all` / `any` | [`Composite`] | any | `[kind]` |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift_core::{Dispatcher, Matched, Pattern, SimilarityOptions, SimilarityOverrides};
//! use sift_extractors::register_standard;
//!
//! let mut dispatcher = Dispatcher::new();
//! register_standard(&mut dispatcher, SimilarityOptions::default().threshold(0.8))?;
//!
//! dispatcher
//!     .bind("similarity")?
//!     .add("hello", greet)
//!     .add(
//!         Pattern::from("goodbye").with_overrides(SimilarityOverrides::new().threshold(0.95)),
//!         farewell,
//!     )
//!     .bind("command")?
//!     .add("/start", start);
//! ```

pub mod callback;
pub mod chat;
pub mod composite;
pub mod entity;
pub mod media;
pub mod similarity;
pub mod text;

pub use callback::{CallbackQueryExtractor, parse_callback_data};
pub use chat::{ChatExtractor, ChatMemberExtractor};
pub use composite::{Composite, Mode};
pub use entity::{CommandExtractor, EntityExtractor, TaggedExtractor};
pub use media::{MEDIA_TYPES, MediaExtractor};
pub use similarity::SimilarityExtractor;
pub use text::TextExtractor;

use sift_core::{Dispatcher, RegistryResult, SimilarityOptions};
use tracing::debug;

/// Conventional registration names of the built-in extractors.
pub mod names {
    pub const TEXT: &str = "text";
    pub const SIMILARITY: &str = "similarity";
    pub const COMMAND: &str = "command";
    pub const ENTITY: &str = "entity";
    pub const HASHTAG: &str = "hashtag";
    pub const MENTION: &str = "mention";
    pub const MEDIA: &str = "media";
    pub const CHAT: &str = "chat";
    pub const CHAT_MEMBER: &str = "chat_member";
    pub const CALLBACK_QUERY: &str = "callback_query";
    pub const ALL: &str = "all";
    pub const ANY: &str = "any";
}

/// Registers every built-in extractor under its conventional name.
///
/// Fails on the first name that is already taken; extractors registered
/// before that point stay registered.
pub fn register_standard(
    dispatcher: &mut Dispatcher,
    similarity: SimilarityOptions,
) -> RegistryResult<()> {
    dispatcher.register(names::TEXT, TextExtractor)?;
    dispatcher.register(names::SIMILARITY, SimilarityExtractor::new(similarity))?;
    dispatcher.register(names::COMMAND, CommandExtractor)?;
    dispatcher.register(names::ENTITY, EntityExtractor)?;
    dispatcher.register(names::HASHTAG, TaggedExtractor::hashtag())?;
    dispatcher.register(names::MENTION, TaggedExtractor::mention())?;
    dispatcher.register(names::MEDIA, MediaExtractor)?;
    dispatcher.register(names::CHAT, ChatExtractor)?;
    dispatcher.register(names::CHAT_MEMBER, ChatMemberExtractor)?;
    dispatcher.register(names::CALLBACK_QUERY, CallbackQueryExtractor)?;
    dispatcher.register(names::ALL, Composite::all())?;
    dispatcher.register(names::ANY, Composite::any())?;

    debug!(count = dispatcher.extractor_names().len(), "Registered standard extractors");
    Ok(())
}
