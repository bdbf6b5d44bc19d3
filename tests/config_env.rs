use feedsync::config::Config;
use serial_test::serial;

fn clear_env() {
    for key in [
        "FEEDSYNC_API_URL",
        "FEEDSYNC_REALTIME_URL",
        "FEEDSYNC_DATA_DIR",
        "FEEDSYNC_PAGE_SIZE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_apply_when_nothing_is_set() {
    clear_env();
    let cfg = Config::from_env();
    assert_eq!(cfg.api_url, "http://localhost:4000/api");
    assert_eq!(cfg.realtime_url, "ws://localhost:4000/realtime");
    assert_eq!(cfg.session_file, std::path::PathBuf::from("data/session.json"));
    assert_eq!(cfg.page_size, 10);
}

#[test]
#[serial]
fn env_overrides_are_honored() {
    clear_env();
    std::env::set_var("FEEDSYNC_API_URL", "https://api.example.com/v1/");
    std::env::set_var("FEEDSYNC_DATA_DIR", "/tmp/feedsync-test");
    std::env::set_var("FEEDSYNC_PAGE_SIZE", "25");

    let cfg = Config::from_env();
    // trailing slash trimmed so joined paths stay clean
    assert_eq!(cfg.api_url, "https://api.example.com/v1");
    assert_eq!(
        cfg.session_file,
        std::path::PathBuf::from("/tmp/feedsync-test/session.json")
    );
    assert_eq!(cfg.page_size, 25);
    clear_env();
}

#[test]
#[serial]
fn invalid_page_size_falls_back() {
    clear_env();
    std::env::set_var("FEEDSYNC_PAGE_SIZE", "lots");
    let cfg = Config::from_env();
    assert_eq!(cfg.page_size, 10);
    clear_env();
}
