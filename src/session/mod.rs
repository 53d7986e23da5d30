//! Chat session loop.
//!
//! A session owns the transcript of one conversation and forwards each user
//! message to its agent. At most one message is processed at a time; a
//! submission arriving while another is in flight is rejected rather than
//! queued.

mod transcript;

pub use transcript::{Message, Role, Transcript};

use crate::agent::Agent;
use crate::config::ChatPrompts;
use crate::content::ContentBlock;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info, warn};

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The turn ran and both messages were appended.
    Completed,
    /// Nothing was appended.
    Rejected(Rejection),
}

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The text was empty or whitespace only.
    Empty,
    /// Another submission is still in flight.
    Busy,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "message is empty"),
            Rejection::Busy => write!(f, "a previous message is still being answered"),
        }
    }
}

/// One chat conversation.
pub struct ChatSession {
    transcript: Mutex<Transcript>,
    busy: AtomicBool,
    agent: OnceLock<Agent>,
    replies: ChatPrompts,
}

impl ChatSession {
    /// Create a session without an agent yet. The transcript starts with the greeting.
    pub fn new(replies: ChatPrompts) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(
            Role::Assistant,
            vec![ContentBlock::text(replies.greeting.clone())],
        );

        Self {
            transcript: Mutex::new(transcript),
            busy: AtomicBool::new(false),
            agent: OnceLock::new(),
            replies,
        }
    }

    /// Create a session that is ready immediately.
    pub fn with_agent(agent: Agent, replies: ChatPrompts) -> Self {
        let session = Self::new(replies);
        let _ = session.agent.set(agent);
        session
    }

    /// Attach the agent once it has been built. Returns false if one is already attached.
    pub fn attach_agent(&self, agent: Agent) -> bool {
        self.agent.set(agent).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.agent.get().is_some()
    }

    /// True while a submission is being answered.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Snapshot of the transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.transcript().messages().to_vec()
    }

    /// Messages appended after the first `count`.
    pub fn messages_since(&self, count: usize) -> Vec<Message> {
        self.transcript().since(count).to_vec()
    }

    pub fn len(&self) -> usize {
        self.transcript().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript().is_empty()
    }

    /// Timestamp of the newest message.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.transcript()
            .messages()
            .last()
            .map(|message| message.timestamp)
            .unwrap_or_else(Utc::now)
    }

    /// Submit one user message and wait for the answer.
    ///
    /// Appends the user message immediately and the assistant message when
    /// the turn ends. Agent failures become an apology message; they are
    /// never returned to the caller. If the returned future is dropped
    /// mid-turn the apology is appended as well, so every user message
    /// gets a reply.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(Rejection::Empty);
        }

        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Rejecting submission while busy");
            return SubmitOutcome::Rejected(Rejection::Busy);
        };

        self.append(Role::User, vec![ContentBlock::text(text)]);
        let reply = PendingReply {
            session: self,
            done: false,
        };

        let content = match self.agent.get() {
            None => {
                warn!("Message submitted before the agent was ready");
                vec![ContentBlock::text(self.replies.not_ready.clone())]
            }
            Some(agent) => match AssertUnwindSafe(agent.invoke(text)).catch_unwind().await {
                Ok(Ok(response)) => {
                    info!(
                        "Turn completed in {} iteration(s) with {} block(s)",
                        response.iterations,
                        response.content.len()
                    );
                    response.content
                }
                Ok(Err(e)) => {
                    warn!("Agent turn failed: {}", e);
                    vec![ContentBlock::text(self.replies.apology.clone())]
                }
                Err(_) => {
                    warn!("Agent turn panicked");
                    vec![ContentBlock::text(self.replies.apology.clone())]
                }
            },
        };

        reply.complete(content);
        SubmitOutcome::Completed
    }

    fn append(&self, role: Role, content: Vec<ContentBlock>) {
        self.transcript().push(role, content);
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The assistant reply owed for a user message already in the transcript.
///
/// Dropped before the [`BusyGuard`] of the same turn, so the apology lands
/// while the session still counts as busy.
struct PendingReply<'a> {
    session: &'a ChatSession,
    done: bool,
}

impl PendingReply<'_> {
    fn complete(mut self, content: Vec<ContentBlock>) {
        self.session.append(Role::Assistant, content);
        self.done = true;
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if !self.done {
            warn!("Turn cancelled before the agent answered");
            self.session.append(
                Role::Assistant,
                vec![ContentBlock::text(self.session.replies.apology.clone())],
            );
        }
    }
}

/// Holds the busy flag for the duration of one turn.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
