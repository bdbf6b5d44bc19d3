use feedsync::controller::FeedController;
use feedsync::error::ClientError;
use feedsync::feed::FeedEvent;
use feedsync::models::{Comment, FeedPage, SortKey};
use serde_json::json;

fn comment(id: &str, content: &str) -> Comment {
    Comment::from_value(&json!({ "_id": id, "content": content })).unwrap()
}

fn page_of(ids: &[&str], total_pages: u64, page: u64, total: u64) -> FeedPage {
    FeedPage {
        comments: ids.iter().map(|id| comment(id, "body")).collect(),
        total_pages,
        page,
        total_comments: total,
    }
}

#[test]
fn sort_change_resets_to_first_page_and_replaces_wholesale() {
    // Realtime events that landed between the sort change and the list
    // response do not survive the replace.
    let mut ctl = FeedController::new(10);
    let seq = ctl.begin_list();
    ctl.apply_list(seq, Ok(page_of(&["c1", "c2"], 4, 3, 40)));
    assert_eq!(ctl.page(), 3);

    let seq = ctl.set_sort(SortKey::MostLiked);
    assert_eq!(ctl.page(), 1);
    assert_eq!(ctl.sort(), SortKey::MostLiked);

    // a push arrives while the list request is in flight
    ctl.apply_event(FeedEvent::Created(comment("c9", "interim")));
    assert_eq!(ctl.state.comments.len(), 3);

    assert!(ctl.apply_list(seq, Ok(page_of(&["c5", "c6"], 4, 1, 40))));
    assert_eq!(
        ctl.state.comments.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c5", "c6"]
    );
}

#[test]
fn stale_list_responses_are_discarded() {
    let mut ctl = FeedController::new(10);

    // the user flips page twice before the first response lands
    let first = ctl.begin_list();
    let second = ctl.set_page(2);

    // slow first response arrives after the second was issued
    assert!(!ctl.apply_list(first, Ok(page_of(&["old"], 1, 1, 1))));
    assert!(ctl.state.comments.is_empty());
    assert!(ctl.state.is_loading);

    assert!(ctl.apply_list(second, Ok(page_of(&["new"], 2, 2, 11))));
    assert_eq!(ctl.state.comments[0].id, "new");
    assert_eq!(ctl.state.current_page, 2);
}

#[test]
fn list_failure_sets_error_once_and_clears_on_next_action() {
    let mut ctl = FeedController::new(10);
    let seq = ctl.begin_list();
    ctl.apply_list(seq, Err(ClientError::Api("backend down".into())));

    assert!(ctl.state.is_error);
    assert_eq!(ctl.state.message, "backend down");
    assert!(!ctl.state.is_loading);

    // next attempted action clears the surfaced failure
    ctl.begin_list();
    assert!(!ctl.state.is_error);
    assert!(ctl.state.message.is_empty());
}

#[test]
fn page_navigation_respects_bounds() {
    let mut ctl = FeedController::new(10);
    let seq = ctl.begin_list();
    ctl.apply_list(seq, Ok(page_of(&["c1"], 2, 1, 11)));

    assert!(ctl.prev_page().is_none());
    let seq = ctl.next_page().expect("page 2 exists");
    ctl.apply_list(seq, Ok(page_of(&["c2"], 2, 2, 11)));
    assert_eq!(ctl.page(), 2);
    assert!(ctl.next_page().is_none());
}

#[test]
fn optimistic_and_echo_paths_converge() {
    // The acting user's own create result and the realtime echo of the same
    // action both funnel through the event vocabulary; the second is a no-op.
    let mut ctl = FeedController::new(10);
    let seq = ctl.begin_list();
    ctl.apply_list(seq, Ok(page_of(&["c1"], 1, 1, 1)));

    ctl.apply_event(FeedEvent::Created(comment("c2", "mine")));
    ctl.apply_event(FeedEvent::Created(comment("c2", "mine"))); // echo

    assert_eq!(ctl.state.comments.len(), 2);
    assert_eq!(ctl.state.total_comments, 2);
}

#[test]
fn teardown_resets_store_and_invalidates_inflight_lists() {
    let mut ctl = FeedController::new(10);
    let seq = ctl.begin_list();
    ctl.apply_list(seq, Ok(page_of(&["c1"], 1, 1, 1)));

    let inflight = ctl.set_page(2);
    ctl.teardown();

    assert!(ctl.state.comments.is_empty());
    assert_eq!(ctl.page(), 1);
    assert_eq!(ctl.sort(), SortKey::Newest);
    // the response of the abandoned view must not resurrect content
    assert!(!ctl.apply_list(inflight, Ok(page_of(&["zombie"], 1, 1, 1))));
    assert!(ctl.state.comments.is_empty());
}
