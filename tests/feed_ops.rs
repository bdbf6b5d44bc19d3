use feedsync::feed::{FeedEvent, FeedState};
use feedsync::models::{Comment, Reply};
use serde_json::json;

fn comment(id: &str, content: &str) -> Comment {
    Comment::from_value(&json!({
        "_id": id,
        "content": content,
        "user": { "_id": "u1", "name": "Ada" },
        "likes": [],
        "dislikes": [],
    }))
    .unwrap()
}

fn reply(id: &str, parent: &str, content: &str) -> Reply {
    Reply::from_value(&json!({
        "_id": id,
        "parentComment": parent,
        "content": content,
        "user": { "_id": "u2", "name": "Grace" },
    }))
    .unwrap()
}

#[test]
fn insert_created_is_idempotent_per_id() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "hello"));
    let once = state.clone();

    // the realtime echo of the same creation arrives later
    state.insert_created(comment("c1", "hello"));
    assert_eq!(state, once);
    assert_eq!(state.comments.len(), 1);
    assert_eq!(state.total_comments, 1);
}

#[test]
fn insert_created_prepends() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "first"));
    state.insert_created(comment("c2", "second"));
    assert_eq!(state.comments[0].id, "c2");
    assert_eq!(state.comments[1].id, "c1");
    assert_eq!(state.total_comments, 2);
}

#[test]
fn replace_page_discards_prior_content() {
    let mut state = FeedState::new();
    state.insert_created(comment("old", "stale"));
    state.replace_page(vec![comment("c1", "a"), comment("c2", "b")], 3, 2, 25);

    assert_eq!(
        state.comments.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c1", "c2"]
    );
    assert_eq!(state.total_pages, 3);
    assert_eq!(state.current_page, 2);
    assert_eq!(state.total_comments, 25);
    assert!(!state.is_loading);
}

#[test]
fn unknown_targets_are_noops() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "hello"));
    let before = state.clone();

    state.replace_by_id(comment("ghost", "boo"));
    state.remove_by_id("ghost");
    state.patch_reaction_counts("ghost", 9, 9);
    state.append_reply("ghost", reply("r1", "ghost", "lost"));

    assert_eq!(state, before);
}

#[test]
fn patch_reaction_counts_touches_only_counters() {
    let mut state = FeedState::new();
    let mut c = comment("c1", "hello");
    c.replies.push(reply("r1", "c1", "hi"));
    c.reply_count = 1;
    state.insert_created(c);

    state.patch_reaction_counts("c1", 5, 2);

    let c = &state.comments[0];
    assert_eq!(c.like_count, 5);
    assert_eq!(c.dislike_count, 2);
    assert_eq!(c.content, "hello");
    assert_eq!(c.author.name, "Ada");
    assert_eq!(c.replies.len(), 1);
}

#[test]
fn remove_by_id_decrements_once() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "a"));
    state.insert_created(comment("c2", "b"));

    state.remove_by_id("c2");
    assert_eq!(state.comments.len(), 1);
    assert_eq!(state.total_comments, 1);

    // duplicate delivery of the same deletion
    state.remove_by_id("c2");
    assert_eq!(state.comments.len(), 1);
    assert_eq!(state.total_comments, 1);
}

#[test]
fn append_reply_dedups_and_counts() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "parent"));

    state.append_reply("c1", reply("r1", "c1", "hi"));
    state.append_reply("c1", reply("r1", "c1", "hi"));

    let parent = &state.comments[0];
    assert_eq!(parent.replies.len(), 1);
    assert_eq!(parent.reply_count, 1);
}

#[test]
fn reply_to_absent_parent_is_dropped() {
    let mut state = FeedState::new();
    state.insert_created(comment("c1", "parent"));
    let before = state.clone();

    // parent paged out: silently dropped, not queued
    state.append_reply("c9", reply("r1", "c9", "orphan"));
    assert_eq!(state, before);
}

#[test]
fn reaction_result_replaces_in_place() {
    // A like result carrying the full updated entity replaces c1 in
    // place; c2 keeps its position.
    let mut state = FeedState::new();
    state.replace_page(vec![comment("c1", "first"), comment("c2", "second")], 1, 1, 2);

    let liked = Comment::from_value(&json!({
        "_id": "c1",
        "content": "first",
        "user": { "_id": "u1", "name": "Ada" },
        "likes": ["u7"],
        "dislikes": [],
    }))
    .unwrap();
    state.apply(FeedEvent::Updated(liked));

    assert_eq!(state.comments[0].id, "c1");
    assert_eq!(state.comments[0].like_count, 1);
    assert!(state.comments[0].has_liked("u7"));
    assert_eq!(state.comments[1].id, "c2");
}

#[test]
fn realtime_delete_applies_once() {
    // A deletion push removes c2 and decrements the total; the duplicate
    // delivery is a no-op.
    let mut state = FeedState::new();
    state.replace_page(vec![comment("c1", "a"), comment("c2", "b")], 1, 1, 2);

    state.apply(FeedEvent::Deleted { comment_id: "c2".into() });
    assert_eq!(state.comments.len(), 1);
    assert_eq!(state.total_comments, 1);

    state.apply(FeedEvent::Deleted { comment_id: "c2".into() });
    assert_eq!(state.comments.len(), 1);
    assert_eq!(state.total_comments, 1);
}

#[test]
fn reset_returns_to_initial_state() {
    let mut state = FeedState::new();
    state.replace_page(vec![comment("c1", "a")], 4, 2, 31);
    state.fail("boom");

    state.reset();
    assert_eq!(state, FeedState::new());
    assert_eq!(state.current_page, 1);
}

#[test]
fn fail_and_clear_status() {
    let mut state = FeedState::new();
    state.begin_loading();
    state.fail("server exploded");
    assert!(state.is_error);
    assert!(!state.is_loading);
    assert_eq!(state.message, "server exploded");

    state.clear_status();
    assert!(!state.is_error);
    assert!(state.message.is_empty());
}
