//! Conversation narrows and their remote addressing form.

use serde::{Deserialize, Serialize};

/// Server-assigned user identifier.
pub type UserId = i64;

/// Server-assigned message identifier. Ids increase with send order.
pub type MessageId = i64;

/// A conversation view whose history is paginated independently.
///
/// Equality is structural, so a narrow can be used directly as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Narrow {
    /// Every message the user can see.
    AllMessages,
    /// All topics of one stream.
    Stream { stream: String },
    /// A single topic within a stream.
    Topic { stream: String, topic: String },
    /// A private conversation. `with` holds the other participants, sorted;
    /// an empty list is the conversation with oneself.
    PrivateMessages { with: Vec<UserId> },
    /// Every private conversation.
    AllPrivateMessages,
    /// Starred messages.
    Starred,
    /// Messages mentioning the user.
    Mentioned,
    /// Full-text search results.
    Search { query: String },
}

impl Narrow {
    /// Build a stream narrow.
    pub fn stream(stream: impl Into<String>) -> Self {
        Narrow::Stream {
            stream: stream.into(),
        }
    }

    /// Build a topic narrow.
    pub fn topic(stream: impl Into<String>, topic: impl Into<String>) -> Self {
        Narrow::Topic {
            stream: stream.into(),
            topic: topic.into(),
        }
    }

    /// Build a private-conversation narrow with a canonical participant list.
    pub fn private_with(users: impl IntoIterator<Item = UserId>) -> Self {
        let mut with: Vec<UserId> = users.into_iter().collect();
        with.sort_unstable();
        with.dedup();
        Narrow::PrivateMessages { with }
    }

    /// Returns true if translating this narrow needs the caller's own user id.
    pub fn needs_own_user_id(&self) -> bool {
        matches!(self, Narrow::PrivateMessages { with } if with.is_empty())
    }

    /// Translate into the remote filter list.
    ///
    /// `own_user_id` addresses the self-conversation; it is ignored for every
    /// other narrow.
    pub fn to_filters(&self, own_user_id: Option<UserId>) -> Vec<NarrowFilter> {
        match self {
            Narrow::AllMessages => Vec::new(),
            Narrow::Stream { stream } => vec![NarrowFilter::text("stream", stream)],
            Narrow::Topic { stream, topic } => vec![
                NarrowFilter::text("stream", stream),
                NarrowFilter::text("topic", topic),
            ],
            Narrow::PrivateMessages { with } => {
                let users = if with.is_empty() {
                    own_user_id.into_iter().collect()
                } else {
                    with.clone()
                };
                vec![NarrowFilter {
                    operator: "pm-with".to_string(),
                    operand: NarrowOperand::Users(users),
                }]
            }
            Narrow::AllPrivateMessages => vec![NarrowFilter::text("is", "private")],
            Narrow::Starred => vec![NarrowFilter::text("is", "starred")],
            Narrow::Mentioned => vec![NarrowFilter::text("is", "mentioned")],
            Narrow::Search { query } => vec![NarrowFilter::text("search", query)],
        }
    }
}

/// One `{operator, operand}` term of the remote narrow filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrowFilter {
    pub operator: String,
    pub operand: NarrowOperand,
}

impl NarrowFilter {
    fn text(operator: &str, operand: &str) -> Self {
        Self {
            operator: operator.to_string(),
            operand: NarrowOperand::Text(operand.to_string()),
        }
    }
}

/// Operand of a narrow filter term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NarrowOperand {
    Text(String),
    Users(Vec<UserId>),
}
