use std::io::Write as _;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use feedsync::api::{CommentApi, ReactionKind};
use feedsync::auth::{AuthClient, Registration};
use feedsync::config::Config;
use feedsync::controller::FeedController;
use feedsync::error::ClientError;
use feedsync::feed::FeedEvent;
use feedsync::realtime::RealtimeListener;
use feedsync::session::SessionStore;

struct App {
    cfg: Config,
    sessions: SessionStore,
    api: CommentApi,
    auth: AuthClient,
    controller: FeedController,
    listener: RealtimeListener,
    events_tx: mpsc::UnboundedSender<FeedEvent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env automatically only in debug builds to reduce setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::from_env();
    info!("comment API at {}", cfg.api_url);
    info!("realtime channel at {}", cfg.realtime_url);

    let sessions = SessionStore::new(cfg.session_file.clone());
    match sessions.current_user() {
        Some(user) => info!("stored session for '{}'", user.name),
        None => info!("no stored session; login to post"),
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut app = App {
        api: CommentApi::new(cfg.api_url.clone(), sessions.clone()),
        auth: AuthClient::new(cfg.api_url.clone(), sessions.clone()),
        controller: FeedController::new(cfg.page_size),
        listener: RealtimeListener::new(),
        events_tx,
        sessions,
        cfg,
    };

    app.connect_realtime().await;
    app.refresh().await;
    app.render();
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        tokio::select! {
            event = events_rx.recv() => {
                if let Some(event) = event {
                    app.controller.apply_event(event);
                    app.render();
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !app.handle_command(line.trim(), &mut lines).await {
                            break;
                        }
                    }
                    None => break, // stdin closed
                }
            }
        }
    }

    app.listener.shutdown().await;
    app.controller.teardown();
    Ok(())
}

impl App {
    /// Fetch the current page/sort and reconcile the store.
    async fn refresh(&mut self) {
        let seq = self.controller.begin_list();
        let result = self
            .api
            .list(
                self.controller.page(),
                self.controller.page_size(),
                self.controller.sort(),
            )
            .await;
        self.controller.apply_list(seq, result);
    }

    /// (Re)establish the push subscription for the current credential.
    async fn connect_realtime(&mut self) {
        self.listener.shutdown().await;
        self.listener
            .subscribe(
                &self.cfg.realtime_url,
                self.sessions.bearer_token().as_deref(),
                self.events_tx.clone(),
            )
            .await;
    }

    /// Returns `false` when the user asked to quit.
    async fn handle_command(&mut self, line: &str, lines: &mut Lines<BufReader<Stdin>>) -> bool {
        if line.is_empty() {
            return true;
        }
        self.controller.clear_status();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match cmd {
            "quit" | "exit" => return false,
            "help" => print_help(),
            "refresh" => {
                self.refresh().await;
                self.render();
            }
            "next" => match self.controller.next_page() {
                Some(seq) => {
                    self.finish_list(seq).await;
                }
                None => println!("already on the last page"),
            },
            "prev" => match self.controller.prev_page() {
                Some(seq) => {
                    self.finish_list(seq).await;
                }
                None => println!("already on the first page"),
            },
            "sort" => match rest.trim().parse() {
                Ok(sort) => {
                    let seq = self.controller.set_sort(sort);
                    self.finish_list(seq).await;
                }
                Err(e) => println!("{e} (newest, oldest, most-liked, most-disliked)"),
            },
            "post" => match self.api.create(rest).await {
                Ok(comment) => {
                    self.controller.apply_event(FeedEvent::Created(comment));
                    self.render();
                }
                Err(e) => self.surface(e),
            },
            "edit" => {
                let Some((id, text)) = rest.split_once(char::is_whitespace) else {
                    println!("usage: edit <id> <text>");
                    return true;
                };
                match self.api.edit(id, text).await {
                    Ok(comment) => {
                        self.controller.apply_event(FeedEvent::Updated(comment));
                        self.render();
                    }
                    Err(e) => self.surface(e),
                }
            }
            "delete" => {
                let id = rest.trim();
                if id.is_empty() {
                    println!("usage: delete <id>");
                    return true;
                }
                // irreversible: confirm before any call goes out
                print!("Delete comment {id}? This cannot be undone. [y/N] ");
                let _ = std::io::stdout().flush();
                let confirmed = matches!(lines.next_line().await, Ok(Some(ref a)) if a.trim().eq_ignore_ascii_case("y"));
                if !confirmed {
                    println!("cancelled");
                    return true;
                }
                match self.api.remove(id).await {
                    Ok(comment_id) => {
                        self.controller.apply_event(FeedEvent::Deleted { comment_id });
                        self.render();
                    }
                    Err(e) => self.surface(e),
                }
            }
            "like" | "dislike" => {
                let id = rest.trim();
                if id.is_empty() {
                    println!("usage: {cmd} <id>");
                    return true;
                }
                let kind = if cmd == "like" { ReactionKind::Like } else { ReactionKind::Dislike };
                match self.api.react(id, kind).await {
                    Ok(update) => {
                        self.controller.apply_event(update.into_event());
                        self.render();
                    }
                    Err(e) => self.surface(e),
                }
            }
            "reply" => {
                let Some((id, text)) = rest.split_once(char::is_whitespace) else {
                    println!("usage: reply <id> <text>");
                    return true;
                };
                match self.api.reply(id, text).await {
                    Ok(reply) => {
                        self.controller.apply_event(FeedEvent::ReplyAdded {
                            parent_id: reply.parent_id.clone(),
                            reply,
                        });
                        self.render();
                    }
                    Err(e) => self.surface(e),
                }
            }
            "show" => {
                let id = rest.trim();
                match self.controller.state.comments.iter().find(|c| c.id == id) {
                    Some(comment) if comment.replies.is_empty() => println!("(no replies)"),
                    Some(comment) => {
                        for r in &comment.replies {
                            println!("  [{}] {}: {}", r.id, r.author.name, r.content);
                        }
                    }
                    None => println!("no comment '{id}' on this page"),
                }
            }
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(identifier), Some(password)) => {
                        match self.auth.login(identifier, password).await {
                            Ok(session) => {
                                println!("welcome, {}", session.user.name);
                                self.connect_realtime().await;
                                self.refresh().await;
                                self.render();
                            }
                            Err(e) => self.surface(e),
                        }
                    }
                    _ => println!("usage: login <identifier> <password>"),
                }
            }
            "register" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [name, email, phone, password, password_confirm] = parts.as_slice() else {
                    println!("usage: register <name> <email> <phone> <password> <password again>");
                    return true;
                };
                let registration = Registration {
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: phone.to_string(),
                    password: password.to_string(),
                    password_confirm: password_confirm.to_string(),
                };
                match self.auth.register(&registration).await {
                    Ok(session) => {
                        println!("welcome, {}", session.user.name);
                        self.connect_realtime().await;
                        self.refresh().await;
                        self.render();
                    }
                    Err(e) => self.surface(e),
                }
            }
            "logout" => {
                self.auth.logout();
                self.listener.shutdown().await;
                println!("logged out");
            }
            other => println!("unknown command '{other}' (try 'help')"),
        }
        true
    }

    async fn finish_list(&mut self, seq: u64) {
        let result = self
            .api
            .list(
                self.controller.page(),
                self.controller.page_size(),
                self.controller.sort(),
            )
            .await;
        self.controller.apply_list(seq, result);
        self.render();
    }

    /// Surface a failure once: error flag on the page state plus a line on
    /// the terminal.
    fn surface(&mut self, e: ClientError) {
        self.controller.report_error(&e);
        println!("error: {e}");
    }

    fn render(&self) {
        let st = &self.controller.state;
        let me = self.sessions.current_user();
        println!();
        println!(
            "=== comments: {} | page {}/{} | sort: {} ===",
            st.total_comments,
            st.current_page,
            st.total_pages.max(1),
            self.controller.sort()
        );
        for c in &st.comments {
            let date = c
                .created_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let mut markers = String::new();
            if let Some(me) = &me {
                if c.is_owned_by(&me.id) {
                    markers.push_str(" (you)");
                }
                if c.has_liked(&me.id) {
                    markers.push_str(" [liked]");
                } else if c.has_disliked(&me.id) {
                    markers.push_str(" [disliked]");
                }
            }
            println!(
                "[{}] {}{} {} +{} -{} ({} replies)",
                c.id, c.author.name, markers, date, c.like_count, c.dislike_count, c.reply_count
            );
            println!("    {}", c.content);
        }
        if st.comments.is_empty() && !st.is_loading {
            println!("(no comments)");
        }
        if st.is_error {
            println!("error: {}", st.message);
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("commands:");
    println!("  login <identifier> <password> | register <name> <email> <phone> <pw> <pw> | logout");
    println!("  post <text> | edit <id> <text> | delete <id> | reply <id> <text> | show <id>");
    println!("  like <id> | dislike <id>");
    println!("  next | prev | sort <newest|oldest|most-liked|most-disliked> | refresh");
    println!("  help | quit");
}
