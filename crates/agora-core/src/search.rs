//! The structured forum search descriptor and its canonical cache key.
//!
//! The cache key serialization is URL-safe, deterministic, and omits
//! fields left at their defaults, so semantically identical queries
//! always produce the same key and distinct queries never collide.
//! `parse` is the exact inverse and is also used by the redirect layer
//! to reconstruct a query from a history token.

use serde::{Deserialize, Serialize};

use crate::types::ids::{
    MessageId, UserId, ROOT_MESSAGE_ID, UNKNOWN_MESSAGE_ID, UNKNOWN_USER_ID,
};

/// Maximum accepted length of the free-text search string.
pub const MAX_TEXT_LENGTH: usize = 90;

/// Maximum number of messages on one page of search results.
pub const MAX_MESSAGES_PER_PAGE: usize = 10;

/// Smallest valid page index.
pub const FIRST_PAGE_INDEX: u32 = 1;

// Wire names of the serialized fields. These double as servlet request
// parameter names in the host application, so they must stay stable.
const PARAM_TEXT: &str = "ss";
const PARAM_BY_USER_LOGIN: &str = "ul";
const PARAM_BY_USER_ID: &str = "uis";
const PARAM_PAGE: &str = "pi";
const PARAM_BASE_MESSAGE: &str = "bmid";
const PARAM_ONLY_TOPICS: &str = "iot";
const PARAM_ONLY_IN_TOPIC: &str = "ioict";
const PARAM_SINGLE_MESSAGE: &str = "iom";
const PARAM_APPROVED_ONLY: &str = "iap";

const FIELD_DELIMITER: char = '&';
const NAME_VALUE_DELIMITER: char = '=';

/// A forum search request. The default value searches for everything;
/// the usual entry points are the convenience constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free-text search string; empty means "match all".
    pub text: String,
    /// Restrict to posts by this user id.
    pub by_user_id: UserId,
    /// Restrict to posts by this login name.
    pub by_user_login: String,
    /// Page of the result set to view, starting at 1.
    pub page: u32,
    /// The message whose replies are browsed, or the root topic message.
    pub base_message_id: MessageId,
    /// Only match topic messages.
    pub only_topics: bool,
    /// Only search within the current topic.
    pub only_in_topic: bool,
    /// Fetch exactly the message identified by `base_message_id`.
    pub single_message: bool,
    /// Only match messages approved for the news feed.
    pub approved_only: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            by_user_id: UNKNOWN_USER_ID,
            by_user_login: String::new(),
            page: FIRST_PAGE_INDEX,
            base_message_id: UNKNOWN_MESSAGE_ID,
            only_topics: false,
            only_in_topic: false,
            single_message: false,
            approved_only: false,
        }
    }
}

impl SearchQuery {
    /// Browse the top-level forum sections.
    pub fn section_browsing() -> Self {
        Self {
            base_message_id: ROOT_MESSAGE_ID,
            ..Self::default()
        }
    }

    /// Browse the news feed of approved messages.
    pub fn news_feed() -> Self {
        Self {
            approved_only: true,
            ..Self::default()
        }
    }

    /// Browse the replies of `base` (forum navigation).
    pub fn navigation(base: MessageId) -> Self {
        Self {
            base_message_id: base,
            ..Self::default()
        }
    }

    /// View the single message `id`.
    pub fn single_message(id: MessageId) -> Self {
        Self {
            base_message_id: id,
            single_message: true,
            ..Self::default()
        }
    }

    /// Serialize into the canonical cache key. Fields at their default
    /// value are omitted, string values are URL-component-encoded.
    pub fn cache_key(&self) -> String {
        let mut params = String::new();
        push_str_param(&mut params, PARAM_TEXT, &self.text);
        push_str_param(&mut params, PARAM_BY_USER_LOGIN, &self.by_user_login);
        push_num_param(&mut params, PARAM_BY_USER_ID, self.by_user_id, UNKNOWN_USER_ID);
        push_num_param(&mut params, PARAM_PAGE, self.page, FIRST_PAGE_INDEX);
        push_num_param(
            &mut params,
            PARAM_BASE_MESSAGE,
            self.base_message_id,
            UNKNOWN_MESSAGE_ID,
        );
        push_bool_param(&mut params, PARAM_ONLY_TOPICS, self.only_topics);
        push_bool_param(&mut params, PARAM_ONLY_IN_TOPIC, self.only_in_topic);
        push_bool_param(&mut params, PARAM_SINGLE_MESSAGE, self.single_message);
        push_bool_param(&mut params, PARAM_APPROVED_ONLY, self.approved_only);
        params
    }

    /// Reconstruct a query from its cache-key form. Unknown parameter
    /// names are skipped and malformed values fall back to defaults; an
    /// empty string yields the default section-browsing query.
    pub fn parse(serialized: &str) -> Self {
        let trimmed = serialized.trim();
        if trimmed.is_empty() {
            return Self::section_browsing();
        }

        let mut query = Self::default();
        let mut recognized_any = false;
        for token in trimmed.split(FIELD_DELIMITER) {
            let Some((name, value)) = token.split_once(NAME_VALUE_DELIMITER) else {
                continue;
            };
            recognized_any |= query.set_param(name.trim(), value.trim());
        }

        if recognized_any {
            query
        } else {
            Self::section_browsing()
        }
    }

    fn set_param(&mut self, name: &str, value: &str) -> bool {
        match name {
            PARAM_TEXT => self.text = decode_str(value),
            PARAM_BY_USER_LOGIN => self.by_user_login = decode_str(value),
            PARAM_BY_USER_ID => self.by_user_id = value.parse().unwrap_or(UNKNOWN_USER_ID),
            PARAM_PAGE => self.page = value.parse().unwrap_or(FIRST_PAGE_INDEX),
            PARAM_BASE_MESSAGE => {
                self.base_message_id = value.parse().unwrap_or(UNKNOWN_MESSAGE_ID)
            }
            PARAM_ONLY_TOPICS => self.only_topics = value == "1",
            PARAM_ONLY_IN_TOPIC => self.only_in_topic = value == "1",
            PARAM_SINGLE_MESSAGE => self.single_message = value == "1",
            PARAM_APPROVED_ONLY => self.approved_only = value == "1",
            _ => return false,
        }
        true
    }

    /// Browsing the news feed of approved messages. The page index does
    /// not participate in classification.
    pub fn is_news_feed(&self) -> bool {
        self.approved_only
            && self.base_message_id == UNKNOWN_MESSAGE_ID
            && !self.single_message
            && self.custom_fields_blank()
    }

    /// Navigating the forum tree: browsing replies of a base message.
    pub fn is_navigation(&self) -> bool {
        self.base_message_id != UNKNOWN_MESSAGE_ID
            && !self.single_message
            && !self.approved_only
            && self.custom_fields_blank()
    }

    /// Viewing one particular message.
    pub fn is_single_message_view(&self) -> bool {
        self.base_message_id != UNKNOWN_MESSAGE_ID
            && self.single_message
            && !self.approved_only
            && self.custom_fields_blank()
    }

    /// Navigation rooted at the forum root, i.e. the section listing.
    pub fn is_section_browsing(&self) -> bool {
        self.is_navigation() && self.base_message_id == ROOT_MESSAGE_ID
    }

    /// True when none of the free-form search fields are set. A query
    /// that matches no other classification is a custom search.
    fn custom_fields_blank(&self) -> bool {
        self.text.trim().is_empty()
            && self.by_user_id == UNKNOWN_USER_ID
            && self.by_user_login.trim().is_empty()
            && !self.only_topics
            && !self.only_in_topic
    }
}

fn push_param(params: &mut String, name: &str, value: impl std::fmt::Display) {
    use std::fmt::Write;
    if !params.is_empty() {
        params.push(FIELD_DELIMITER);
    }
    let _ = write!(params, "{name}{NAME_VALUE_DELIMITER}{value}");
}

fn push_str_param(params: &mut String, name: &str, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        push_param(params, name, urlencoding::encode(trimmed));
    }
}

fn push_num_param(params: &mut String, name: &str, value: u32, default: u32) {
    if value != default {
        push_param(params, name, value);
    }
}

fn push_bool_param(params: &mut String, name: &str, value: bool) {
    if value {
        push_param(params, name, 1);
    }
}

fn decode_str(value: &str) -> String {
    urlencoding::decode(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_serializes_empty() {
        assert_eq!(SearchQuery::default().cache_key(), "");
    }

    #[test]
    fn cache_key_omits_defaults() {
        let query = SearchQuery::navigation(10);
        assert_eq!(query.cache_key(), "bmid=10");

        let mut query = SearchQuery::news_feed();
        query.page = 3;
        assert_eq!(query.cache_key(), "pi=3&iap=1");
    }

    #[test]
    fn cache_key_encodes_text() {
        let query = SearchQuery {
            text: "hello world & more".into(),
            ..SearchQuery::default()
        };
        assert_eq!(query.cache_key(), "ss=hello%20world%20%26%20more");
    }

    #[test]
    fn distinct_queries_have_distinct_keys() {
        let queries = [
            SearchQuery::section_browsing(),
            SearchQuery::news_feed(),
            SearchQuery::navigation(10),
            SearchQuery::single_message(10),
            SearchQuery {
                text: "rust".into(),
                ..SearchQuery::default()
            },
            SearchQuery {
                by_user_id: 5,
                ..SearchQuery::default()
            },
        ];
        for (i, a) in queries.iter().enumerate() {
            for b in &queries[i + 1..] {
                assert_ne!(a.cache_key(), b.cache_key(), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn parse_round_trips() {
        let query = SearchQuery {
            text: "a&b=c".into(),
            by_user_id: 12,
            page: 4,
            base_message_id: 0,
            only_topics: true,
            ..SearchQuery::default()
        };
        assert_eq!(SearchQuery::parse(&query.cache_key()), query);
    }

    #[test]
    fn parse_empty_is_section_browsing() {
        assert_eq!(SearchQuery::parse(""), SearchQuery::section_browsing());
        assert_eq!(
            SearchQuery::parse("junk&more-junk"),
            SearchQuery::section_browsing()
        );
    }

    #[test]
    fn classification_is_mutually_exclusive() {
        let news = SearchQuery::news_feed();
        assert!(news.is_news_feed());
        assert!(!news.is_navigation());
        assert!(!news.is_single_message_view());

        let nav = SearchQuery::navigation(10);
        assert!(nav.is_navigation());
        assert!(!nav.is_news_feed());
        assert!(!nav.is_single_message_view());

        let one = SearchQuery::single_message(10);
        assert!(one.is_single_message_view());
        assert!(!one.is_navigation());

        let sections = SearchQuery::section_browsing();
        assert!(sections.is_section_browsing());
        assert!(sections.is_navigation());
    }

    #[test]
    fn text_makes_a_query_custom() {
        let custom = SearchQuery {
            text: "rust".into(),
            base_message_id: 10,
            ..SearchQuery::default()
        };
        assert!(!custom.is_news_feed());
        assert!(!custom.is_navigation());
        assert!(!custom.is_single_message_view());
    }

    #[test]
    fn page_index_does_not_affect_classification() {
        let mut news = SearchQuery::news_feed();
        news.page = 7;
        assert!(news.is_news_feed());
    }
}
