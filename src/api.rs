use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::error::{json_or_error, ClientError};
use crate::feed::FeedEvent;
use crate::models::{entity_id, field, Comment, FeedPage, Reply, SortKey};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

/// Result of a reaction round-trip: the server replies with either the full
/// updated comment or just the new counters.
#[derive(Debug, Clone)]
pub enum ReactionUpdate {
    Full(Comment),
    Counts {
        comment_id: String,
        like_count: u64,
        dislike_count: u64,
    },
}

impl ReactionUpdate {
    pub fn into_event(self) -> FeedEvent {
        match self {
            ReactionUpdate::Full(comment) => FeedEvent::Updated(comment),
            ReactionUpdate::Counts {
                comment_id,
                like_count,
                dislike_count,
            } => FeedEvent::ReactionCounts {
                comment_id,
                like_count,
                dislike_count,
            },
        }
    }
}

/// Authenticated HTTP client for the comment API. Translates page-level
/// intents into requests and normalizes the responses into canonical types.
///
/// The bearer token is re-read from the session store on every call rather
/// than cached. All mutating operations fail fast client-side when no token
/// is present; `list` merely omits the header.
pub struct CommentApi {
    http: Client,
    base_url: String,
    sessions: SessionStore,
}

impl CommentApi {
    pub fn new(base_url: impl Into<String>, sessions: SessionStore) -> Self {
        let base_url: String = base_url.into();
        CommentApi {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            sessions,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer header when a token exists, otherwise send as-is.
    fn maybe_authed(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.sessions.bearer_token() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.sessions.bearer_token().ok_or(ClientError::Unauthenticated)
    }

    /// `GET /comments?page&limit&sortBy` → one normalized feed page.
    pub async fn list(&self, page: u64, limit: u64, sort: SortKey) -> Result<FeedPage, ClientError> {
        let req = self.http.get(self.url("/comments")).query(&[
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("sortBy", sort.as_query().to_string()),
        ]);
        let body = json_or_error(self.maybe_authed(req).send().await?).await?;
        Ok(FeedPage::from_value(&body, page))
    }

    /// `POST /comments` → the created comment.
    pub async fn create(&self, content: &str) -> Result<Comment, ClientError> {
        let content = non_empty(content, "Comment cannot be empty")?;
        let token = self.require_token()?;
        let resp = self
            .http
            .post(self.url("/comments"))
            .bearer_auth(token)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        Comment::from_value(unwrap_data(&body)).ok_or(ClientError::Malformed("created comment"))
    }

    /// `PUT /comments/{id}` → the updated comment.
    pub async fn edit(&self, id: &str, content: &str) -> Result<Comment, ClientError> {
        let content = non_empty(content, "Comment cannot be empty")?;
        let token = self.require_token()?;
        let resp = self
            .http
            .put(self.url(&format!("/comments/{id}")))
            .bearer_auth(token)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        Comment::from_value(unwrap_data(&body)).ok_or(ClientError::Malformed("updated comment"))
    }

    /// `DELETE /comments/{id}`; echoes the id back for store removal. The
    /// irreversible-action confirmation happens in the view layer before
    /// this is invoked.
    pub async fn remove(&self, id: &str) -> Result<String, ClientError> {
        let token = self.require_token()?;
        let resp = self
            .http
            .delete(self.url(&format!("/comments/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        json_or_error(resp).await?;
        Ok(id.to_string())
    }

    /// `POST /comments/{id}/like` or `/dislike` with an empty body; the
    /// server infers the acting user and owns the toggle semantics.
    pub async fn react(&self, id: &str, kind: ReactionKind) -> Result<ReactionUpdate, ClientError> {
        let token = self.require_token()?;
        let resp = self
            .http
            .post(self.url(&format!("/comments/{id}/{}", kind.as_path())))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let data = unwrap_data(&body);
        // A full entity always carries its body; a counters-only response
        // must never be misread as a comment with empty content.
        if field(data, &["content", "text"]).is_some() {
            if let Some(comment) = Comment::from_value(data) {
                return Ok(ReactionUpdate::Full(comment));
            }
        }
        let like_count = field(data, &["likeCount", "like_count"]).and_then(Value::as_u64);
        let dislike_count = field(data, &["dislikeCount", "dislike_count"]).and_then(Value::as_u64);
        match (like_count, dislike_count) {
            (Some(like_count), Some(dislike_count)) => Ok(ReactionUpdate::Counts {
                comment_id: entity_id(data).unwrap_or_else(|| id.to_string()),
                like_count,
                dislike_count,
            }),
            _ => Comment::from_value(data)
                .map(ReactionUpdate::Full)
                .ok_or(ClientError::Malformed("reaction response")),
        }
    }

    /// `POST /comments/{id}/reply` → the created reply, its parent taken
    /// from the response or inferred from the request target.
    pub async fn reply(&self, id: &str, content: &str) -> Result<Reply, ClientError> {
        let content = non_empty(content, "Reply cannot be empty")?;
        let token = self.require_token()?;
        let resp = self
            .http
            .post(self.url(&format!("/comments/{id}/reply")))
            .bearer_auth(token)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        Reply::from_value_with_parent(unwrap_data(&body), Some(id))
            .ok_or(ClientError::Malformed("created reply"))
    }
}

/// Success payloads arrive bare or wrapped in a `data` envelope.
fn unwrap_data(v: &Value) -> &Value {
    match v.get("data") {
        Some(data) if !data.is_null() => data,
        _ => v,
    }
}

fn non_empty<'a>(content: &'a str, msg: &str) -> Result<&'a str, ClientError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(ClientError::validation(msg))
    } else {
        Ok(trimmed)
    }
}
