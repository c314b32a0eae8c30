//! Coaching context: the object a dashboard owns for its lifetime.
//!
//! It holds the (optional) language-model client, at most one chat session,
//! and the transcript. Everything the presentation layer needs goes through
//! here: `open_session`, `send_message`, `generate_quick_tip`, plus the
//! transcript stream.

use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::biometrics::BiometricSnapshot;
use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::gemini::GeminiClient;
use crate::llm::{self, CompletionRequest, LanguageModel};
use crate::logging;
use crate::message::{Message, MetadataKind, Sender, Transcript};
use crate::profile::UserProfile;
use crate::prompts;
use crate::session::{ChatSession, SessionId};

pub const REPLY_FALLBACK: &str = "I encountered a connection error. Please try again.";
pub const EMPTY_REPLY_FALLBACK: &str = "I'm having trouble processing that right now.";
pub const OFFLINE_REPLY: &str = "Coaching is offline right now: no API key is configured.";
pub const TIP_FALLBACK: &str = "Take a moment to breathe.";
pub const EMPTY_TIP_FALLBACK: &str = "Take a deep breath and stretch.";
pub const TIP_PLACEHOLDER: &str = "Analyzing recent patterns...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoachSettings {
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Default for CoachSettings {
    fn default() -> Self {
        let config = CoachConfig::default();
        Self {
            temperature: config.temperature,
            request_timeout: config.request_timeout,
        }
    }
}

/// Clears the awaiting-reply flag when the exchange ends, even if the
/// caller drops the future mid-flight.
struct ReplyGuard<'a>(&'a AtomicBool);

impl<'a> ReplyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ReplyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CoachContext {
    model: Option<Arc<dyn LanguageModel>>,
    settings: CoachSettings,
    session: OnceCell<ChatSession>,
    transcript: watch::Sender<Transcript>,
    awaiting_reply: AtomicBool,
}

impl CoachContext {
    /// `model = None` means the service is unconfigured; every operation
    /// then degrades to its fallback.
    pub fn new(model: Option<Arc<dyn LanguageModel>>, settings: CoachSettings) -> Self {
        let (transcript, _rx) = watch::channel(Transcript::new());
        Self {
            model,
            settings,
            session: OnceCell::new(),
            transcript,
            awaiting_reply: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        let model: Option<Arc<dyn LanguageModel>> = match &config.api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(key, &config.model, config.request_timeout)?)),
            None => None,
        };
        let settings = CoachSettings {
            temperature: config.temperature,
            request_timeout: config.request_timeout,
        };
        Ok(Self::new(model, settings))
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.get().map(|s| s.id())
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply.load(Ordering::Acquire)
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.borrow().clone()
    }

    pub fn subscribe_transcript(&self) -> watch::Receiver<Transcript> {
        self.transcript.subscribe()
    }

    /// Starter prompts, offered only while the conversation is young
    pub fn suggested_prompts(&self) -> &'static [&'static str] {
        if self.transcript.borrow().len() < prompts::SUGGESTION_CUTOFF {
            &prompts::SUGGESTED_PROMPTS
        } else {
            &[]
        }
    }

    /// Open the dialogue for this profile and snapshot.
    ///
    /// A second call is a no-op returning the existing session id, whatever
    /// arguments it is given.
    pub fn open_session(
        &self,
        profile: &UserProfile,
        biometrics: &BiometricSnapshot,
    ) -> Result<SessionId, CoachError> {
        if let Some(existing) = self.session.get() {
            let id = existing.id().to_string();
            logging::log_session(Some(&id), "Session already open, reusing");
            return Ok(existing.id());
        }

        let Some(model) = &self.model else {
            logging::log_error(None, "Cannot open session: language-model service not configured");
            return Err(CoachError::Unconfigured);
        };

        let mut created = false;
        let session = self.session.get_or_init(|| {
            created = true;
            ChatSession::new(
                Arc::clone(model),
                prompts::session_instruction(profile, biometrics),
                self.settings.temperature,
                self.settings.request_timeout,
            )
        });

        if created {
            let id = session.id().to_string();
            logging::log_session(Some(&id), &format!(
                "Opened session for {} with {} ({} goals)",
                profile.name(),
                model.name(),
                profile.goals().len()
            ));
            self.append(Message::new(Sender::Bot, prompts::welcome_text(profile, biometrics)));
        }

        Ok(session.id())
    }

    /// Send one user message and return the reply text.
    ///
    /// Transport failures come back as fallback text, never as errors. Only
    /// one message may be outstanding at a time.
    pub async fn send_message(&self, text: &str) -> Result<String, CoachError> {
        if text.trim().is_empty() {
            return Err(CoachError::EmptyMessage);
        }

        let session = match self.session.get() {
            Some(session) => Some(session),
            None if self.model.is_none() => None,
            None => {
                logging::log_error(None, "Message sent before the session was opened");
                return Err(CoachError::SessionNotReady);
            }
        };

        let _guard = ReplyGuard::acquire(&self.awaiting_reply).ok_or(CoachError::AwaitingReply)?;

        self.append(Message::new(Sender::User, text));

        // Fallback replies carry an alert tag naming why the model was bypassed
        let (reply, fallback) = match session {
            None => {
                logging::log_error(None, "Reply skipped: language-model service not configured");
                (OFFLINE_REPLY.to_string(), Some("unconfigured"))
            }
            Some(session) => {
                let id = session.id().to_string();
                match session.send(text).await {
                    Ok(reply) if reply.trim().is_empty() => {
                        logging::log_error(Some(&id), "Model returned an empty reply");
                        (EMPTY_REPLY_FALLBACK.to_string(), Some("empty_reply"))
                    }
                    Ok(reply) => {
                        logging::log_chat(Some(&id), &format!(
                            "Reply received ({} chars, {} turns)",
                            reply.len(),
                            session.turn_count()
                        ));
                        (reply, None)
                    }
                    Err(e) => {
                        logging::log_error(Some(&id), &format!("Model call failed: {}", e));
                        (REPLY_FALLBACK.to_string(), Some("transport"))
                    }
                }
            }
        };

        let mut message = Message::new(Sender::Bot, reply.clone());
        if let Some(reason) = fallback {
            message = message.with_metadata(MetadataKind::Alert, json!({ "fallback": reason }));
        }
        self.append(message);
        Ok(reply)
    }

    /// One-sentence advice for a snapshot. Single attempt, never fails.
    pub async fn generate_quick_tip(&self, biometrics: &BiometricSnapshot) -> String {
        let Some(model) = &self.model else {
            logging::log_tip("Service not configured, using fallback tip");
            return TIP_FALLBACK.to_string();
        };

        let request = CompletionRequest::single(prompts::quick_tip_prompt(biometrics));
        match llm::complete_with_timeout(model.as_ref(), request, self.settings.request_timeout).await {
            Ok(text) if text.trim().is_empty() => {
                logging::log_tip("Empty tip from model");
                EMPTY_TIP_FALLBACK.to_string()
            }
            Ok(text) => {
                logging::log_tip("Quick tip generated");
                text.trim().to_string()
            }
            Err(e) => {
                logging::log_error(None, &format!("Quick tip failed: {}", e));
                TIP_FALLBACK.to_string()
            }
        }
    }

    /// Record a confirmed user action (e.g. a logged glass of water) in the transcript
    pub fn post_system_note(&self, text: &str, data: serde_json::Value) {
        self.append(Message::new(Sender::System, text).with_metadata(MetadataKind::Success, data));
    }

    fn append(&self, message: Message) {
        self.transcript.send_modify(|t| t.push(message));
    }
}
