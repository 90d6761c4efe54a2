//! Pagination model: anchors, fetch windows, per-narrow fetch state, outcomes.

use crate::narrow::MessageId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The point around which a page of messages is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// A concrete message id.
    Message(MessageId),
    /// The user's first unread message in the narrow.
    #[default]
    FirstUnread,
    /// The newest message in the narrow.
    Newest,
    /// The oldest message in the narrow.
    Oldest,
}

impl Anchor {
    /// The value sent as the `anchor` request parameter.
    pub fn as_param(&self) -> String {
        match self {
            Anchor::Message(id) => id.to_string(),
            Anchor::FirstUnread => "first_unread".to_string(),
            Anchor::Newest => "newest".to_string(),
            Anchor::Oldest => "oldest".to_string(),
        }
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Anchor::Message(id) => serializer.serialize_i64(*id),
            Anchor::FirstUnread => serializer.serialize_str("first_unread"),
            Anchor::Newest => serializer.serialize_str("newest"),
            Anchor::Oldest => serializer.serialize_str("oldest"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnchor {
    Id(MessageId),
    Symbol(String),
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAnchor::deserialize(deserializer)? {
            RawAnchor::Id(id) => Ok(Anchor::Message(id)),
            RawAnchor::Symbol(symbol) => match symbol.as_str() {
                "first_unread" => Ok(Anchor::FirstUnread),
                "newest" => Ok(Anchor::Newest),
                "oldest" => Ok(Anchor::Oldest),
                other => Err(D::Error::custom(format!("unknown anchor: {other}"))),
            },
        }
    }
}

/// Pagination direction relative to what is already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Older,
    Newer,
}

/// Parameters of one paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchWindow {
    pub anchor: Anchor,
    pub num_before: u32,
    pub num_after: u32,
}

impl FetchWindow {
    /// A real request asks for at least one message.
    pub fn is_valid(&self) -> bool {
        self.num_before as u64 + self.num_after as u64 > 0
    }

    /// Returns true if this window reaches into older history.
    pub fn reaches_older(&self) -> bool {
        self.num_before > 0
    }

    /// Returns true if this window reaches into newer history.
    pub fn reaches_newer(&self) -> bool {
        self.num_after > 0
    }
}

/// Per-narrow fetch flags, owned by the session store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFetchState {
    pub fetching_older: bool,
    pub fetching_newer: bool,
    pub caught_up_older: bool,
    pub caught_up_newer: bool,
    pub first_message_id: Option<MessageId>,
    pub last_message_id: Option<MessageId>,
}

impl ScopeFetchState {
    pub fn is_fetching(&self, direction: Direction) -> bool {
        match direction {
            Direction::Older => self.fetching_older,
            Direction::Newer => self.fetching_newer,
        }
    }

    pub fn is_caught_up_in(&self, direction: Direction) -> bool {
        match direction {
            Direction::Older => self.caught_up_older,
            Direction::Newer => self.caught_up_newer,
        }
    }

    /// Known boundary message id on the given side, if any.
    pub fn boundary(&self, direction: Direction) -> Option<MessageId> {
        match direction {
            Direction::Older => self.first_message_id,
            Direction::Newer => self.last_message_id,
        }
    }

    /// No further history exists in either direction.
    pub fn is_fully_caught_up(&self) -> bool {
        self.caught_up_older && self.caught_up_newer
    }
}

/// A message as returned by the server.
///
/// Only the id is typed; everything else is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    pub fn new(id: MessageId) -> Self {
        Self {
            id,
            fields: serde_json::Map::new(),
        }
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub messages: Vec<Message>,
    pub found_newest: bool,
    pub found_oldest: bool,
    #[serde(default)]
    pub found_anchor: bool,
}
