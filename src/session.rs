//! One stateful dialogue with the language-model service.
//!
//! The service itself is stateless per request, so the session keeps the
//! system instruction and the accepted turns and replays them on every call.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::llm::{self, ChatTurn, CompletionRequest, LanguageModel, ServiceError};

pub type SessionId = Uuid;

pub struct ChatSession {
    id: SessionId,
    model: Arc<dyn LanguageModel>,
    system_instruction: String,
    temperature: f32,
    timeout: Duration,
    history: Mutex<Vec<ChatTurn>>,
}

impl ChatSession {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        system_instruction: String,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            system_instruction,
            temperature,
            timeout,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Number of accepted turns (user and model)
    pub fn turn_count(&self) -> usize {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Send one user turn and wait for the full reply.
    ///
    /// The exchange is committed to history only when the call succeeds, so a
    /// failed turn leaves the dialogue exactly as it was.
    pub async fn send(&self, text: &str) -> Result<String, ServiceError> {
        let mut turns = self.history.lock().unwrap_or_else(|e| e.into_inner()).clone();
        turns.push(ChatTurn::user(text));

        let request = CompletionRequest {
            system_instruction: Some(self.system_instruction.clone()),
            turns,
            temperature: Some(self.temperature),
        };

        let reply = llm::complete_with_timeout(self.model.as_ref(), request, self.timeout).await?;

        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.push(ChatTurn::user(text));
        history.push(ChatTurn::model(reply.clone()));

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    fn session(model: Arc<ScriptedModel>) -> ChatSession {
        ChatSession::new(model, "Coach.".to_string(), 0.7, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_history_is_replayed() {
        let model = Arc::new(ScriptedModel::replying(&["First reply", "Second reply"]));
        let chat = session(model.clone());

        assert_eq!(chat.send("one").await.unwrap(), "First reply");
        assert_eq!(chat.send("two").await.unwrap(), "Second reply");

        let request = model.last_request();
        assert_eq!(request.system_instruction.as_deref(), Some("Coach."));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(
            request.turns,
            vec![
                ChatTurn::user("one"),
                ChatTurn::model("First reply"),
                ChatTurn::user("two"),
            ]
        );
        assert_eq!(chat.turn_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_turn_is_not_committed() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ServiceError::Api { status: 500, message: "boom".into() }),
            Ok("Recovered".into()),
        ]));
        let chat = session(model.clone());

        assert!(chat.send("lost").await.is_err());
        assert_eq!(chat.turn_count(), 0);

        assert_eq!(chat.send("again").await.unwrap(), "Recovered");
        assert_eq!(model.last_request().turns, vec![ChatTurn::user("again")]);
    }
}
