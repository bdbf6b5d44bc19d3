use tracing::debug;

use crate::models::{Comment, Reply};

/// The client-side view of the current feed page plus request-status flags.
///
/// This is the single mutable surface every inbound result writes through:
/// list fetches, the acting user's own mutation results, and realtime pushes
/// all funnel into the operation vocabulary below. Every operation is a
/// total function (an absent target is a no-op, never an error) and every
/// insertion deduplicates by identifier, so at-least-once delivery of the
/// same logical event (optimistic result plus its realtime echo) cannot
/// produce visible duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub comments: Vec<Comment>,
    pub total_pages: u64,
    pub current_page: u64,
    pub total_comments: u64,
    pub is_loading: bool,
    pub is_error: bool,
    pub message: String,
}

impl Default for FeedState {
    fn default() -> Self {
        FeedState {
            comments: Vec::new(),
            total_pages: 0,
            current_page: 1,
            total_comments: 0,
            is_loading: false,
            is_error: false,
            message: String::new(),
        }
    }
}

/// The source-agnostic mutation vocabulary. Both update paths, the direct
/// result of the current user's own action and a realtime push from someone
/// else's, are expressed in these terms before touching the store.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Created(Comment),
    Updated(Comment),
    Deleted {
        comment_id: String,
    },
    ReactionCounts {
        comment_id: String,
        like_count: u64,
        dislike_count: u64,
    },
    ReplyAdded {
        parent_id: String,
        reply: Reply,
    },
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale replace after a successful list fetch. No merge with prior
    /// content: the server's page wins.
    pub fn replace_page(
        &mut self,
        comments: Vec<Comment>,
        total_pages: u64,
        current_page: u64,
        total_comments: u64,
    ) {
        self.comments = comments;
        self.total_pages = total_pages;
        self.current_page = current_page;
        self.total_comments = total_comments;
        self.is_loading = false;
        self.is_error = false;
        self.message.clear();
    }

    /// Prepend a newly created top-level comment. A duplicate identifier is
    /// a no-op: the optimistic insert and the realtime echo of the same
    /// creation must not both land.
    pub fn insert_created(&mut self, comment: Comment) {
        if self.comments.iter().any(|c| c.id == comment.id) {
            debug!(id = %comment.id, "duplicate insert ignored");
            return;
        }
        self.comments.insert(0, comment);
        self.total_comments += 1;
    }

    /// Overwrite an existing comment in place. No-op when the id is not on
    /// the current page.
    pub fn replace_by_id(&mut self, comment: Comment) {
        if let Some(slot) = self.comments.iter_mut().find(|c| c.id == comment.id) {
            *slot = comment;
        }
    }

    /// Overwrite only the reaction counters, preserving everything else.
    /// Used when the realtime transport sends counts instead of a full
    /// entity, so a concurrent edit is never clobbered.
    pub fn patch_reaction_counts(&mut self, comment_id: &str, like_count: u64, dislike_count: u64) {
        if let Some(c) = self.comments.iter_mut().find(|c| c.id == comment_id) {
            c.like_count = like_count;
            c.dislike_count = dislike_count;
        }
    }

    /// Drop a top-level comment. The total only decrements when something
    /// was actually removed, so duplicate delete deliveries are safe.
    pub fn remove_by_id(&mut self, comment_id: &str) {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        if self.comments.len() < before {
            self.total_comments = self.total_comments.saturating_sub(1);
        }
    }

    /// Attach a reply to its parent, deduplicated by reply id. A reply whose
    /// parent is not on the current page is dropped, not queued.
    pub fn append_reply(&mut self, parent_id: &str, reply: Reply) {
        let Some(parent) = self.comments.iter_mut().find(|c| c.id == parent_id) else {
            debug!(parent = %parent_id, "reply parent not on current page, dropped");
            return;
        };
        if parent.replies.iter().any(|r| r.id == reply.id) {
            return;
        }
        parent.replies.push(reply);
        parent.reply_count += 1;
    }

    /// Back to the initial empty state; called on view teardown.
    pub fn reset(&mut self) {
        *self = FeedState::default();
    }

    pub fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    /// Record a user-visible failure. Surfaced once; the view layer clears
    /// it on the next attempted action.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.is_loading = false;
        self.is_error = true;
        self.message = message.into();
    }

    pub fn clear_status(&mut self) {
        self.is_loading = false;
        self.is_error = false;
        self.message.clear();
    }

    /// Map an event to exactly one store operation.
    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Created(comment) => self.insert_created(comment),
            FeedEvent::Updated(comment) => self.replace_by_id(comment),
            FeedEvent::Deleted { comment_id } => self.remove_by_id(&comment_id),
            FeedEvent::ReactionCounts {
                comment_id,
                like_count,
                dislike_count,
            } => self.patch_reaction_counts(&comment_id, like_count, dislike_count),
            FeedEvent::ReplyAdded { parent_id, reply } => self.append_reply(&parent_id, reply),
        }
    }
}
