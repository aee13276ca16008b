//! `nexus chat`: talk to River Core from the terminal.

use anyhow::Result;
use chrono::Utc;
use nexus_core::chat::{respond, ChatSession};
use nexus_core::models::ChatMessage;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::analytics::{self, ChatEvent};
use crate::app::App;

/// One stateless exchange: the reply to `message` given `history`.
///
/// Assistant failures come back as the fixed friendly replies, never as
/// errors.
pub async fn reply(app: &App, history: &[ChatMessage], message: &str) -> String {
    analytics::track_chat(ChatEvent::Send);
    let reply = respond(app.assistant.as_ref(), history, message).await;
    analytics::track_chat(ChatEvent::Receive);
    reply
}

/// With `message`, print a single reply. Without it, run an interactive
/// transcript on stdin until end of input or `/exit`.
pub async fn run_chat(app: &App, message: Option<String>) -> Result<()> {
    let mut session = ChatSession::new(Arc::clone(&app.assistant), Utc::now());

    if let Some(message) = message {
        if let Some(reply) = exchange(&mut session, &message).await {
            println!("{}", reply);
        }
        return Ok(());
    }

    if let Some(greeting) = session.transcript().first() {
        println!("River Core > {}", greeting.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim() == "/exit" {
            break;
        }

        if let Some(reply) = exchange(&mut session, &line).await {
            println!("River Core > {}", reply);
        }
    }
    Ok(())
}

/// Send one line through the transcript. Blank input sends nothing.
async fn exchange(session: &mut ChatSession, line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }
    analytics::track_chat(ChatEvent::Send);
    let reply = session.send(line, Utc::now()).await?;
    analytics::track_chat(ChatEvent::Receive);
    Some(reply.content.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::DisabledProvider;
    use nexus_core::catalog::Catalog;
    use nexus_core::chat::CONNECTION_LOST_REPLY;
    use nexus_core::kv::MemoryStore;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn app() -> App {
        App::assemble(
            Config::minimal("unused.json"),
            Catalog::builtin(),
            Arc::new(DisabledProvider),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_reply_tracks_send_then_receive() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let answer = reply(&app(), &[], "推荐笔记工具").await;
        assert_eq!(answer, CONNECTION_LOST_REPLY);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("chat_interaction").count(), 2);
        let send = logs.find("\"send\"").expect("send event");
        let receive = logs.find("\"receive\"").expect("receive event");
        assert!(send < receive);
    }

    #[tokio::test]
    async fn test_blank_line_sends_nothing() {
        let app = app();
        let mut session = ChatSession::new(Arc::clone(&app.assistant), Utc::now());
        assert_eq!(exchange(&mut session, "   ").await, None);
        assert_eq!(session.transcript().len(), 1);

        let reply = exchange(&mut session, "hi").await;
        assert_eq!(reply.as_deref(), Some(CONNECTION_LOST_REPLY));
        assert_eq!(session.transcript().len(), 3);
    }
}
