//! Per-chat conversation handling.
//!
//! A chat is either logged out or bound to one patient. While logged out, any plain text is
//! taken as a patient identifier; once logged in, plain text is a question about that patient.

use crate::sessions::SessionStore;
use crate::types::Update;
use medchat_core::validation::validate_question;
use medchat_core::{AssistantService, PatientError, PatientId};

const USAGE: &str = "Commands:\n\
/login <patient-id> - select a patient\n\
/whoami - show the selected patient\n\
/logout - clear the selection\n\
/help - show this message";

const NOT_LOGGED_IN: &str = "You are not logged in. Send /login <patient-id> to select a patient.";

const STORE_UNAVAILABLE: &str =
    "⚠️ Could not reach the records store right now. Please try again later.";

/// A parsed chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Login(Option<String>),
    Logout,
    WhoAmI,
    Unknown(String),
    Text(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return Command::Text(text.to_string());
        };

        let (head, arg) = match rest.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, Some(arg.trim())),
            None => (rest, None),
        };
        // Group chats address commands as `/cmd@BotName`.
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let arg = arg.filter(|a| !a.is_empty()).map(str::to_string);

        match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "login" => Command::Login(arg),
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            _ => Command::Unknown(name),
        }
    }
}

/// Routes chat messages through the session map and the assistant.
#[derive(Clone)]
pub struct Relay {
    assistant: AssistantService,
    sessions: SessionStore,
}

impl Relay {
    pub fn new(assistant: AssistantService, sessions: SessionStore) -> Self {
        Self {
            assistant,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Reply for an update, with the chat to send it to. Non-text updates get no reply.
    pub async fn handle_update(&self, update: &Update) -> Option<(i64, String)> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        let chat_id = message.chat.id;
        Some((chat_id, self.handle_text(chat_id, text).await))
    }

    pub async fn handle_text(&self, chat_id: i64, text: &str) -> String {
        let session = self.sessions.get(chat_id);

        match (Command::parse(text), session) {
            (Command::Start, _) => format!(
                "👋 Welcome to the Medical Data Assistant!\n\n\
                 Log in with a patient ID, then ask questions about that patient's records.\n\n{USAGE}"
            ),
            (Command::Help, _) => USAGE.to_string(),
            (Command::Login(None), _) => "Usage: /login <patient-id>".to_string(),
            (Command::Login(Some(raw)), _) => self.login(chat_id, &raw).await,
            (Command::Logout | Command::WhoAmI, None) => NOT_LOGGED_IN.to_string(),
            (Command::Logout, Some(_)) => match self.sessions.logout(chat_id) {
                Some(s) => format!("Logged out of patient {}.", s.patient_id),
                None => NOT_LOGGED_IN.to_string(),
            },
            (Command::WhoAmI, Some(s)) => format!(
                "You are logged in as patient {} (since {}).",
                s.patient_id,
                s.logged_in_at.format("%Y-%m-%d %H:%M UTC")
            ),
            (Command::Unknown(name), _) => format!("Unknown command /{name}.\n\n{USAGE}"),
            (Command::Text(raw), None) => self.login(chat_id, &raw).await,
            (Command::Text(raw), Some(s)) => self.answer(&s.patient_id, &raw).await,
        }
    }

    async fn login(&self, chat_id: i64, raw: &str) -> String {
        let patient_id = match PatientId::parse(raw) {
            Ok(id) => id,
            Err(e) => return format!("Invalid patient ID: {e}"),
        };

        match self.assistant.patient_exists(&patient_id).await {
            Ok(true) => {
                tracing::info!(chat_id, %patient_id, "chat logged in");
                let reply = format!(
                    "✅ Logged in as patient {patient_id}. Ask me anything about their records."
                );
                self.sessions.login(chat_id, patient_id);
                reply
            }
            Ok(false) => format!("No patient found with ID {patient_id}."),
            Err(e) => {
                tracing::error!(chat_id, "patient lookup error: {:?}", e);
                STORE_UNAVAILABLE.to_string()
            }
        }
    }

    async fn answer(&self, patient_id: &PatientId, raw: &str) -> String {
        let question = match validate_question(raw) {
            Ok(q) => q,
            Err(PatientError::InvalidInput(reason)) => return format!("⚠️ {reason}"),
            Err(_) => return "Please send a question about the patient's records.".to_string(),
        };

        match self.assistant.ask(patient_id, &question).await {
            Ok(answer) => answer.text,
            Err(e) => {
                tracing::error!(%patient_id, "chat question error: {:?}", e);
                STORE_UNAVAILABLE.to_string()
            }
        }
    }
}
