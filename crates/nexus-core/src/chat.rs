//! Assistant chat transcript.
//!
//! The chat widget keeps an ordered transcript and forwards each new user
//! message, together with the prior transcript, to an [`Assistant`]. The
//! assistant's failures never reach the caller: they become fixed,
//! user-visible replies in the transcript.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::ChatMessage;
use crate::resolver::RemoteError;

/// Opening line of every new transcript.
pub const GREETING: &str = "你好，我是 River Core。晓河的数字流域已就绪，今天想探索哪个模块？";
/// Shown when the assistant call fails.
pub const CONNECTION_LOST_REPLY: &str = "流域连接中断，River Core 正在重连。";
/// Shown when the assistant answers with nothing.
pub const EMPTY_REPLY: &str = "信号在支流中迷失了，请重试。";

/// Remote conversational collaborator.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Produce a reply to `message` given the prior `history`.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, RemoteError>;
}

#[async_trait]
impl<A: Assistant + ?Sized> Assistant for Arc<A> {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, RemoteError> {
        (**self).reply(history, message).await
    }
}

/// Ask `assistant` for a reply, substituting the fixed messages on failure
/// or on an empty answer.
pub async fn respond<A>(assistant: &A, history: &[ChatMessage], message: &str) -> String
where
    A: Assistant + ?Sized,
{
    match assistant.reply(history, message).await {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) => EMPTY_REPLY.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "assistant reply failed");
            CONNECTION_LOST_REPLY.to_string()
        }
    }
}

/// A single chat widget's transcript.
pub struct ChatSession {
    assistant: Arc<dyn Assistant>,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a transcript containing only the greeting.
    pub fn new(assistant: Arc<dyn Assistant>, now: DateTime<Utc>) -> Self {
        Self {
            assistant,
            transcript: vec![ChatMessage::assistant(GREETING, now.timestamp_millis())],
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Append `input` and the assistant's reply.
    ///
    /// Blank input is ignored and returns `None`; otherwise the appended
    /// reply is returned.
    pub async fn send(&mut self, input: &str, now: DateTime<Utc>) -> Option<&ChatMessage> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }

        let reply = respond(self.assistant.as_ref(), &self.transcript, message).await;
        let ts = now.timestamp_millis();
        self.transcript.push(ChatMessage::user(message, ts));
        self.transcript.push(ChatMessage::assistant(reply, ts));
        self.transcript.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<Vec<Result<String, RemoteError>>>,
        seen_history: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, RemoteError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen_history: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Assistant for Scripted {
        async fn reply(&self, history: &[ChatMessage], _message: &str) -> Result<String, RemoteError> {
            self.seen_history.lock().unwrap().push(history.len());
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_reply_appended_after_user_message() {
        let bot = Scripted::new(vec![Ok("hello there".into())]);
        let mut session = ChatSession::new(bot.clone(), Utc::now());

        let reply = session.send("  hi  ", Utc::now()).await.unwrap();
        assert_eq!(reply.content, "hello there");

        let t = session.transcript();
        assert_eq!(t.len(), 3);
        assert_eq!(t[1].role, ChatRole::User);
        assert_eq!(t[1].content, "hi");
        assert_eq!(*bot.seen_history.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_failure_becomes_fixed_message() {
        let bot = Scripted::new(vec![Err(RemoteError::Timeout(std::time::Duration::from_secs(5)))]);
        let mut session = ChatSession::new(bot, Utc::now());
        let reply = session.send("hi", Utc::now()).await.unwrap();
        assert_eq!(reply.content, CONNECTION_LOST_REPLY);
        assert_eq!(reply.role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_empty_reply_substituted() {
        let bot = Scripted::new(vec![Ok("   ".into())]);
        let mut session = ChatSession::new(bot, Utc::now());
        assert_eq!(session.send("hi", Utc::now()).await.unwrap().content, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let bot = Scripted::new(vec![]);
        let mut session = ChatSession::new(bot.clone(), Utc::now());
        assert!(session.send("   ", Utc::now()).await.is_none());
        assert_eq!(session.transcript().len(), 1);
        assert!(bot.seen_history.lock().unwrap().is_empty());
    }
}
