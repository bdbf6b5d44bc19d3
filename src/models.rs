use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Feed sort order. Query values match the comment API's `sortBy` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Newest,
    Oldest,
    MostLiked,
    MostDisliked,
}

impl SortKey {
    pub fn as_query(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::MostLiked => "mostLiked",
            SortKey::MostDisliked => "mostDisliked",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "mostliked" | "liked" => Ok(SortKey::MostLiked),
            "mostdisliked" | "disliked" => Ok(SortKey::MostDisliked),
            _ => Err(format!("unknown sort key '{s}'")),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub created_at: Option<DateTime<Utc>>,
    /// Reacting user ids; empty when the backend only sent counters.
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub replies: Vec<Reply>,
    pub reply_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub parent_id: String,
    pub content: String,
    pub author: Author,
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of the feed as reported by the list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub comments: Vec<Comment>,
    pub total_pages: u64,
    pub page: u64,
    pub total_comments: u64,
}

// ---------------- wire adapters ----------------
//
// Backends disagree on field names and nesting; every tolerated raw shape is
// normalized here, so the rest of the crate only ever sees canonical types.

/// First present field among `keys`.
pub(crate) fn field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| v.get(*k))
}

/// Identifier as a string; numeric ids are normalized to their decimal form.
pub(crate) fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier from either a bare id or an object carrying one.
pub(crate) fn entity_id(v: &Value) -> Option<String> {
    match v {
        Value::Object(_) => field(v, &["_id", "id", "commentId"]).and_then(id_string),
        other => id_string(other),
    }
}

fn timestamp(v: &Value) -> Option<DateTime<Utc>> {
    field(v, &["createdAt", "created_at"])
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn id_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(entity_id).collect())
        .unwrap_or_default()
}

impl Author {
    pub fn from_value(v: &Value) -> Author {
        match v {
            Value::Object(_) => Author {
                id: field(v, &["_id", "id"]).and_then(id_string).unwrap_or_default(),
                name: field(v, &["name", "username"])
                    .and_then(Value::as_str)
                    .unwrap_or("Anonymous")
                    .to_string(),
            },
            other => Author {
                id: id_string(other).unwrap_or_default(),
                name: "Anonymous".to_string(),
            },
        }
    }
}

impl Comment {
    /// Normalize a raw comment. Returns `None` when no identifier can be
    /// found; every other field degrades to a sensible default.
    pub fn from_value(v: &Value) -> Option<Comment> {
        if !v.is_object() {
            return None;
        }
        let id = field(v, &["_id", "id"]).and_then(id_string)?;
        let content = field(v, &["content", "text"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let author = field(v, &["user", "author"])
            .map(Author::from_value)
            .unwrap_or_default();
        let likes = id_list(v.get("likes"));
        let dislikes = id_list(v.get("dislikes"));
        let like_count = field(v, &["likeCount", "like_count"])
            .and_then(Value::as_u64)
            .unwrap_or(likes.len() as u64);
        let dislike_count = field(v, &["dislikeCount", "dislike_count"])
            .and_then(Value::as_u64)
            .unwrap_or(dislikes.len() as u64);
        let replies: Vec<Reply> = v
            .get("replies")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|r| Reply::from_value_with_parent(r, Some(&id)))
                    .collect()
            })
            .unwrap_or_default();
        let reply_count = field(v, &["replyCount", "reply_count"])
            .and_then(Value::as_u64)
            .unwrap_or(replies.len() as u64);
        Some(Comment {
            id,
            content,
            author,
            created_at: timestamp(v),
            likes,
            dislikes,
            like_count,
            dislike_count,
            replies,
            reply_count,
        })
    }

    /// Ownership check against the authenticated user. Ids were normalized to
    /// strings by the adapters, so a plain comparison suffices.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        !self.author.id.is_empty() && self.author.id == user_id
    }

    pub fn has_liked(&self, user_id: &str) -> bool {
        self.likes.iter().any(|u| u == user_id)
    }

    pub fn has_disliked(&self, user_id: &str) -> bool {
        self.dislikes.iter().any(|u| u == user_id)
    }
}

impl Reply {
    pub fn from_value(v: &Value) -> Option<Reply> {
        Self::from_value_with_parent(v, None)
    }

    /// Normalize a raw reply. The parent reference may be inline (under any
    /// of the tolerated keys, as an id or a populated object) or supplied by
    /// the caller when it is implied by the request that produced the reply.
    pub fn from_value_with_parent(v: &Value, fallback_parent: Option<&str>) -> Option<Reply> {
        if !v.is_object() {
            return None;
        }
        let id = field(v, &["_id", "id"]).and_then(id_string)?;
        let parent_id = field(v, &["parentComment", "parentCommentId", "parent_id"])
            .and_then(entity_id)
            .or_else(|| fallback_parent.map(str::to_string))?;
        let content = field(v, &["content", "text"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let author = field(v, &["user", "author"])
            .map(Author::from_value)
            .unwrap_or_default();
        Some(Reply {
            id,
            parent_id,
            content,
            author,
            created_at: timestamp(v),
        })
    }
}

impl FeedPage {
    /// Normalize a list response: either a bare array of comments or an
    /// envelope with items and pagination fields under varying names.
    pub fn from_value(v: &Value, requested_page: u64) -> FeedPage {
        if let Some(arr) = v.as_array() {
            let comments: Vec<Comment> = arr.iter().filter_map(Comment::from_value).collect();
            return FeedPage {
                total_pages: 1,
                page: requested_page,
                total_comments: comments.len() as u64,
                comments,
            };
        }
        let comments: Vec<Comment> = field(v, &["data", "comments", "items"])
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Comment::from_value).collect())
            .unwrap_or_default();
        let total_pages = field(v, &["pages", "totalPages", "pageCount"])
            .and_then(Value::as_u64)
            .unwrap_or(1);
        let page = field(v, &["page", "currentPage"])
            .and_then(Value::as_u64)
            .unwrap_or(requested_page);
        let total_comments = field(v, &["total", "totalComments", "totalCount"])
            .and_then(Value::as_u64)
            .unwrap_or(comments.len() as u64);
        FeedPage {
            comments,
            total_pages,
            page,
            total_comments,
        }
    }
}
