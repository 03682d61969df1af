//! Interactive line-oriented chat over a `SessionStore`

use anyhow::Result;
use chrono::Local;
use console::style;
use dialoguer::Input;
use parley_core::{ChatSession, Message, RelayClient, Role, SessionStore};

const HELP: &str = "\
Commands:
  /new                  start a new chat
  /list                 list chats
  /switch <n>           switch to chat n
  /delete <n>           delete chat n
  /rename <n> [title]   rename chat n (prompts when no title is given)
  /help                 show this help
  /quit                 exit";

/// One parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    New,
    List,
    Switch(usize),
    Delete(usize),
    Rename(usize, Option<String>),
    Help,
    Quit,
    Invalid(String),
}

/// Parse a line. Anything not starting with `/` is a message.
pub fn parse_command(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatCommand::Send(line.to_string());
    };

    let mut parts = rest.splitn(3, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let index = parts.next().and_then(|n| n.trim().parse::<usize>().ok());
    let tail = parts.next().map(str::trim).filter(|t| !t.is_empty());

    match (name, index) {
        ("new", _) => ChatCommand::New,
        ("list", _) => ChatCommand::List,
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        ("switch", Some(n)) => ChatCommand::Switch(n),
        ("delete", Some(n)) => ChatCommand::Delete(n),
        ("rename", Some(n)) => ChatCommand::Rename(n, tail.map(ToString::to_string)),
        _ => ChatCommand::Invalid(trimmed.to_string()),
    }
}

/// Resolve a 1-based list position to a session id
fn session_id_at(store: &SessionStore, position: usize) -> Option<String> {
    position
        .checked_sub(1)
        .and_then(|i| store.sessions().get(i))
        .map(|s| s.id.clone())
}

/// Render the session list, marking the active one
pub fn format_session_list(sessions: &[ChatSession], active_id: &str) -> Vec<String> {
    sessions
        .iter()
        .enumerate()
        .map(|(i, session)| {
            let marker = if session.id == active_id { "*" } else { " " };
            format!(
                "{} {:>2}. {} ({} messages)",
                marker,
                i + 1,
                session.title,
                session.messages.len()
            )
        })
        .collect()
}

fn print_message(message: &Message) {
    let time = message
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    let label = match message.role {
        Role::User => style("You").cyan().bold(),
        Role::Assistant => style("Assistant").green().bold(),
        Role::System => style("System").yellow().bold(),
    };
    println!("{} {}", label, style(time).dim());
    println!("{}\n", message.content);
}

fn print_active(store: &SessionStore) {
    if let Some(session) = store.active_session() {
        println!("{}\n", style(&session.title).bold().underlined());
    }
    if store.active_messages().is_empty() {
        println!("{}\n", style("Start a conversation. Type /help for commands.").dim());
    }
    for message in store.active_messages() {
        print_message(message);
    }
}

fn print_list(store: &SessionStore) {
    for line in format_session_list(store.sessions(), store.active_id()) {
        println!("{}", line);
    }
}

fn rename(store: &mut SessionStore, position: usize, title: Option<String>) -> Result<()> {
    let Some(id) = session_id_at(store, position) else {
        println!("{}", style(format!("No chat #{}", position)).red());
        return Ok(());
    };
    let Some(current) = store.start_rename(&id) else {
        return Ok(());
    };

    let title = match title {
        Some(title) => title,
        None => Input::<String>::new()
            .with_prompt("New title")
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?,
    };

    if title.trim().is_empty() {
        store.cancel_rename();
    } else {
        store.commit_rename(&title);
    }
    Ok(())
}

/// Run the chat loop until the user quits
pub async fn run_chat(relay: &dyn RelayClient) -> Result<()> {
    let mut store = SessionStore::new();
    print_active(&store);

    loop {
        let line: String = Input::new()
            .with_prompt(style("You").cyan().to_string())
            .allow_empty(true)
            .interact_text()?;

        match parse_command(&line) {
            ChatCommand::Send(text) => {
                println!("{}", style("...").dim());
                if store.send_message(&text, relay).await {
                    if let Some(reply) = store.active_messages().last() {
                        print_message(reply);
                    }
                }
            }
            ChatCommand::New => {
                store.create_session();
                print_active(&store);
            }
            ChatCommand::List => print_list(&store),
            ChatCommand::Switch(n) => match session_id_at(&store, n) {
                Some(id) => {
                    store.select_session(&id);
                    print_active(&store);
                }
                None => println!("{}", style(format!("No chat #{}", n)).red()),
            },
            ChatCommand::Delete(n) => match session_id_at(&store, n) {
                Some(id) => {
                    store.delete_session(&id);
                    print_list(&store);
                }
                None => println!("{}", style(format!("No chat #{}", n)).red()),
            },
            ChatCommand::Rename(n, title) => {
                rename(&mut store, n, title)?;
                print_list(&store);
            }
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::Quit => break,
            ChatCommand::Invalid(input) => {
                println!("{} {}", style("Unknown command:").red(), input);
                println!("{}", HELP);
            }
        }
    }

    Ok(())
}
