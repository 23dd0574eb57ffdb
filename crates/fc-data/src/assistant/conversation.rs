//! Chat conversation with simulated typing
//!
//! A reply is produced immediately, held back for a "thinking" delay and then
//! revealed a few characters per tick. Both phases are scheduler tasks, so a
//! pending reply is cancelled like any other timer and never outlives the
//! conversation.

use std::sync::{Arc, Weak};
use std::time::Duration;

use fc_core::{CoreError, CoreResult, Scheduler, TaskHandle};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::classifier::UserMode;
use super::responder::ResponseGenerator;
use crate::session::{ChatEntry, ChatRole, PersistedSession, SESSION_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingSettings {
    pub thinking_delay: Duration,
    pub typing_interval: Duration,
    pub chars_per_tick: usize,
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            thinking_delay: Duration::from_millis(600),
            typing_interval: Duration::from_millis(20),
            chars_per_tick: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    Thinking,
    Typing { revealed: usize, total: usize },
}

struct PendingReply {
    text: Vec<char>,
    revealed: usize,
}

struct ConversationInner {
    mode: UserMode,
    transcript: Vec<ChatEntry>,
    pending: Option<PendingReply>,
    task: Option<TaskHandle>,

    /// Incremented whenever the transcript or mode changes
    revision: u64,
}

/// Chat transcript plus the in-flight assistant reply
pub struct Conversation {
    inner: Arc<Mutex<ConversationInner>>,
    scheduler: Arc<Scheduler>,
    responder: Arc<dyn ResponseGenerator>,
    settings: TypingSettings,
}

impl Conversation {
    pub fn new(
        scheduler: Arc<Scheduler>,
        responder: Arc<dyn ResponseGenerator>,
        settings: TypingSettings,
    ) -> CoreResult<Self> {
        if settings.typing_interval.is_zero() || settings.chars_per_tick == 0 {
            return Err(CoreError::invalid("typing needs a non-zero interval and step"));
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(ConversationInner {
                mode: UserMode::default(),
                transcript: Vec::new(),
                pending: None,
                task: None,
                revision: 0,
            })),
            scheduler,
            responder,
            settings,
        })
    }

    /// Replace mode and transcript with a stored session
    pub fn restore(&self, session: PersistedSession) {
        self.cancel();
        let mode = if session.mode.is_empty() {
            None
        } else {
            match session.mode.parse::<UserMode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    warn!("ignoring stored mode: {}", e);
                    None
                }
            }
        };

        let mut inner = self.inner.lock();
        if let Some(mode) = mode {
            inner.mode = mode;
        }
        inner.transcript = session.transcript;
        inner.revision += 1;
    }

    pub fn to_session(&self) -> PersistedSession {
        let inner = self.inner.lock();
        PersistedSession {
            version: SESSION_VERSION,
            mode: inner.mode.as_str().to_string(),
            transcript: inner.transcript.clone(),
        }
    }

    pub fn mode(&self) -> UserMode {
        self.inner.lock().mode
    }

    pub fn set_mode(&self, mode: UserMode) {
        let mut inner = self.inner.lock();
        if inner.mode != mode {
            inner.mode = mode;
            inner.revision += 1;
        }
    }

    pub fn transcript(&self) -> Vec<ChatEntry> {
        self.inner.lock().transcript.clone()
    }

    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    pub fn state(&self) -> ConversationState {
        let inner = self.inner.lock();
        match &inner.pending {
            None => ConversationState::Idle,
            Some(p) if p.revealed == 0 => ConversationState::Thinking,
            Some(p) => ConversationState::Typing {
                revealed: p.revealed,
                total: p.text.len(),
            },
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Text revealed so far of the reply being typed
    pub fn partial_reply(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner
            .pending
            .as_ref()
            .filter(|p| p.revealed > 0)
            .map(|p| p.text[..p.revealed].iter().collect())
    }

    /// Record a user message and start typing the reply.
    ///
    /// A reply still in progress is abandoned first.
    pub fn send(&self, message: &str) -> CoreResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::invalid("message is empty"));
        }
        self.cancel();

        let mode = self.mode();
        let reply = self.responder.generate_response(message, mode);

        let mut inner = self.inner.lock();
        inner.transcript.push(ChatEntry::new(ChatRole::User, message));
        inner.revision += 1;
        inner.pending = Some(PendingReply {
            text: reply.chars().collect(),
            revealed: 0,
        });

        let weak_inner = Arc::downgrade(&self.inner);
        let weak_scheduler = Arc::downgrade(&self.scheduler);
        let settings = self.settings;
        let handle = self.scheduler.schedule_once("chat-thinking", self.settings.thinking_delay, move || {
            start_typing(weak_inner, weak_scheduler, settings);
        });
        inner.task = Some(handle);
        debug!(mode = mode.as_str(), "reply scheduled");
        Ok(())
    }

    /// Abandon the reply in progress; partial text never reaches the transcript
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        let had_pending = inner.pending.take().is_some();
        if let Some(handle) = inner.task.take() {
            self.scheduler.cancel(handle);
        }
        if had_pending {
            debug!("reply cancelled");
        }
        had_pending
    }

    pub fn clear_history(&self) {
        self.cancel();
        let mut inner = self.inner.lock();
        inner.transcript.clear();
        inner.revision += 1;
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn start_typing(inner: Weak<Mutex<ConversationInner>>, scheduler: Weak<Scheduler>, settings: TypingSettings) {
    let (Some(shared), Some(scheduler_ref)) = (inner.upgrade(), scheduler.upgrade()) else {
        return;
    };
    let mut guard = shared.lock();
    if guard.pending.is_none() {
        return;
    }

    let tick_inner = inner.clone();
    let tick_scheduler = scheduler.clone();
    let step = settings.chars_per_tick;
    let scheduled = scheduler_ref.schedule_repeating("chat-typing", settings.typing_interval, move || {
        reveal(&tick_inner, &tick_scheduler, step);
    });

    match scheduled {
        Ok(handle) => guard.task = Some(handle),
        Err(e) => {
            // Typing is cosmetic: deliver the whole reply at once
            warn!("typing animation unavailable: {}", e);
            finish(&mut guard);
        }
    }
}

fn reveal(inner: &Weak<Mutex<ConversationInner>>, scheduler: &Weak<Scheduler>, step: usize) {
    let Some(shared) = inner.upgrade() else {
        return;
    };
    let mut guard = shared.lock();
    let done = match guard.pending.as_mut() {
        Some(pending) => {
            pending.revealed = (pending.revealed + step).min(pending.text.len());
            pending.revealed == pending.text.len()
        }
        None => true,
    };
    if done {
        if let (Some(handle), Some(scheduler)) = (guard.task.take(), scheduler.upgrade()) {
            scheduler.cancel(handle);
        }
        finish(&mut guard);
    }
}

fn finish(inner: &mut ConversationInner) {
    inner.task = None;
    if let Some(pending) = inner.pending.take() {
        let text: String = pending.text.into_iter().collect();
        inner.transcript.push(ChatEntry::new(ChatRole::Assistant, text));
        inner.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ResponseGenerator for Echo {
        fn generate_response(&self, message: &str, mode: UserMode) -> String {
            format!("{mode}: {message}")
        }
    }

    fn settings() -> TypingSettings {
        TypingSettings {
            thinking_delay: Duration::from_millis(100),
            typing_interval: Duration::from_millis(10),
            chars_per_tick: 4,
        }
    }

    fn conversation(scheduler: &Arc<Scheduler>) -> Conversation {
        Conversation::new(scheduler.clone(), Arc::new(Echo), settings()).unwrap()
    }

    #[test]
    fn test_reply_is_revealed_then_committed() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        chat.send("hi there").unwrap();

        // "scientist: hi there" is 19 chars
        assert_eq!(chat.state(), ConversationState::Thinking);
        assert_eq!(chat.transcript().len(), 1);

        scheduler.advance(Duration::from_millis(100));
        scheduler.advance(Duration::from_millis(10));
        assert_eq!(chat.partial_reply().as_deref(), Some("scie"));
        assert_eq!(chat.state(), ConversationState::Typing { revealed: 4, total: 19 });

        scheduler.advance(Duration::from_millis(100));
        assert_eq!(chat.state(), ConversationState::Idle);
        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, "scientist: hi there");
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_cancel_drops_partial_reply_and_tasks() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        chat.send("first").unwrap();
        scheduler.advance(Duration::from_millis(120));
        assert!(chat.partial_reply().is_some());

        assert!(chat.cancel());
        assert!(!chat.cancel());
        assert_eq!(scheduler.active_count(), 0);

        scheduler.advance(Duration::from_secs(5));
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_cancel_during_thinking() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        chat.send("first").unwrap();
        chat.cancel();
        scheduler.advance(Duration::from_secs(5));
        assert_eq!(chat.partial_reply(), None);
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_new_message_supersedes_pending_reply() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        chat.send("first").unwrap();
        chat.send("second").unwrap();
        scheduler.advance(Duration::from_secs(5));

        let contents: Vec<_> = chat.transcript().into_iter().map(|e| e.content).collect();
        assert_eq!(contents, vec!["first", "second", "scientist: second"]);
    }

    #[test]
    fn test_dropping_conversation_cancels_tasks() {
        let scheduler = Arc::new(Scheduler::new());
        {
            let chat = conversation(&scheduler);
            chat.send("bye").unwrap();
            assert_eq!(scheduler.active_count(), 1);
        }
        assert_eq!(scheduler.active_count(), 0);
        scheduler.advance(Duration::from_secs(1));
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        assert!(matches!(chat.send("   "), Err(CoreError::InvalidInput(_))));
        assert!(chat.transcript().is_empty());
    }

    #[test]
    fn test_session_round_trip_keeps_mode() {
        let scheduler = Arc::new(Scheduler::new());
        let chat = conversation(&scheduler);
        chat.set_mode(UserMode::Fisherman);
        chat.send("tides?").unwrap();
        scheduler.advance(Duration::from_secs(5));

        let restored = conversation(&scheduler);
        restored.restore(chat.to_session());
        assert_eq!(restored.mode(), UserMode::Fisherman);
        assert_eq!(restored.transcript(), chat.transcript());
    }
}
