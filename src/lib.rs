pub mod biometrics;
pub mod coach;
pub mod config;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod logging;
pub mod message;
pub mod profile;
pub mod prompts;
pub mod session;

pub use biometrics::{BiometricFeed, BiometricSnapshot, BiometricSource, JitterSource};
pub use coach::{CoachContext, CoachSettings};
pub use config::CoachConfig;
pub use error::CoachError;
pub use llm::{LanguageModel, ServiceError};
pub use message::{Message, Sender, Transcript};
pub use profile::{ActivityLevel, OnboardingDraft, UserProfile};
pub use session::SessionId;
