//! Terminal front-end for the Super AI chat engine.
//!
//! Every line typed is sent to the active conversation. A line ending with
//! `\` continues on the next line (Shift+Enter). Commands:
//! `/new`, `/list [term]`, `/open <n>`, `/delete <n>`, `/quit`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use superai_chat::chat::view;
use superai_chat::chat::{ChatConfig, ChatService, Composer, Decision, Notifier, ReplyOutcome};
use superai_chat::start_superai;

/// Prints notifications as toasts on stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, description: &str) {
        println!("  [{title}] {description}");
    }
}

async fn print_listing(chat: &ChatService, composer: &mut Composer, term: &str) {
    let conversations = chat.filter_conversations(term).await;
    let active = chat.snapshot().await.active_id;
    let rows = view::summarize(&conversations, active, Utc::now());

    composer.set_listing(rows.iter().map(|r| r.id).collect());
    if rows.is_empty() {
        println!("  (no conversations)");
    }
    for (i, row) in rows.iter().enumerate() {
        let marker = if row.is_active { '*' } else { ' ' };
        println!(
            " {marker}{:>3}. {}  ({} messages, {})",
            i + 1,
            row.title,
            row.message_count,
            row.day_label
        );
    }
}

/// Sends `text` and prints the assistant reply once it lands.
///
/// Overlapping sends are never refused. Returns `None` for blank text.
async fn send(chat: &Arc<ChatService>, text: &str) -> Option<JoinHandle<()>> {
    let sent = chat.send_message(text).await?;
    if sent.receipt.created {
        println!("  (new conversation)");
    }

    let chat = Arc::clone(chat);
    Some(tokio::spawn(async move {
        let Ok(ReplyOutcome::Delivered {
            conversation_id,
            message_id,
        }) = sent.reply.await
        else {
            return;
        };
        let Some(conversation) = chat.conversation(conversation_id).await else {
            return;
        };
        if let Some(reply) = conversation.messages.iter().find(|m| m.id == message_id) {
            println!("assistant> {}", reply.text);
        }
    }))
}

async fn handle_command(chat: &Arc<ChatService>, composer: &mut Composer, line: &str) -> bool {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "/quit" | "/exit" => return false,
        "/new" => {
            chat.select_conversation(None).await;
            println!("  (new chat)");
        }
        "/list" => print_listing(chat, composer, arg).await,
        "/open" => {
            let mut selected = None;
            if let Some(id) = composer.pick(arg) {
                if chat.select_conversation(Some(id)).await {
                    selected = chat.conversation(id).await;
                }
            }
            match selected {
                Some(conversation) => {
                    println!("  == {} ==", conversation.title);
                    for message in view::message_views(&conversation.messages) {
                        let who = message.sender.as_str();
                        println!("  [{}] {who}> {}", message.time_label, message.text);
                    }
                }
                None => println!("  no such conversation; try /list"),
            }
        }
        "/delete" => match composer.pick(arg) {
            Some(id) => {
                let title = chat.request_delete(id).await;
                println!("  Delete \"{title}\"? This cannot be undone. [y/N]");
                composer.ask_confirmation();
            }
            None => println!("  no such conversation; try /list"),
        },
        _ => println!("  unknown command {command}"),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    start_superai::init_tracing();

    let config = ChatConfig::from_env().context("invalid chat configuration")?;
    let chat = Arc::new(ChatService::new(config, Arc::new(ConsoleNotifier)));
    let mut composer = Composer::new();

    println!("Super AI (Enter to send, end a line with \\ for a new line, /quit to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if composer.is_confirming() {
            match composer.answer(&line) {
                Decision::Confirmed => {
                    chat.confirm_delete().await;
                }
                Decision::Cancelled => {
                    chat.cancel_delete().await;
                    println!("  (kept)");
                }
            }
            continue;
        }

        if composer.is_command(&line) {
            if !handle_command(&chat, &mut composer, line.trim()).await {
                break;
            }
            continue;
        }

        if let Some(text) = composer.feed(&line) {
            send(&chat, &text).await;
        }
    }

    chat.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use superai_chat::chat::{ChatConfigBuilder, Sender};

    fn quiet_chat(delay_ms: u64) -> Arc<ChatService> {
        let config = ChatConfigBuilder::new().reply_delay_ms(delay_ms).build();
        Arc::new(ChatService::new(config, Arc::new(ConsoleNotifier)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_reply_pending_keeps_message() {
        let chat = quiet_chat(2000);
        let mut composer = Composer::new();

        let text = composer.feed("Plan my trip").unwrap();
        let first = send(&chat, &text).await.unwrap();
        assert!(chat.is_typing().await);

        let text = composer.feed("and book hotels").unwrap();
        let second = send(&chat, &text).await.unwrap();
        assert!(composer.draft().is_empty());

        let id = chat.snapshot().await.active_id.unwrap();
        let user_texts: Vec<_> = chat
            .conversation(id)
            .await
            .unwrap()
            .messages
            .into_iter()
            .filter(|m| m.sender == Sender::User)
            .map(|m| m.text)
            .collect();
        assert_eq!(user_texts, ["Plan my trip", "and book hotels"]);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(chat.conversation(id).await.unwrap().messages.len(), 4);
        assert!(!chat.is_typing().await);
    }

    #[tokio::test]
    async fn test_blank_send_spawns_nothing() {
        let chat = quiet_chat(10);
        assert!(send(&chat, "   ").await.is_none());
        assert!(chat.snapshot().await.conversations.is_empty());
    }

    #[tokio::test]
    async fn test_delete_command_waits_for_answer() {
        let chat = quiet_chat(10);
        send(&chat, "Keep me").await.unwrap();

        let mut composer = Composer::new();
        assert!(handle_command(&chat, &mut composer, "/list").await);
        assert!(handle_command(&chat, &mut composer, "/delete 1").await);
        assert!(composer.is_confirming());
        assert!(chat.pending_delete().is_some());

        assert_eq!(composer.answer("n"), Decision::Cancelled);
        assert!(chat.cancel_delete().await.is_some());
        assert_eq!(chat.snapshot().await.conversations.len(), 1);
    }

    #[tokio::test]
    async fn test_quit_command_stops_loop() {
        let chat = quiet_chat(10);
        let mut composer = Composer::new();
        assert!(!handle_command(&chat, &mut composer, "/quit").await);
        assert!(handle_command(&chat, &mut composer, "/new").await);
    }
}
