pub mod collaborator;
pub mod config;
pub mod dashboard;
pub mod gemini;
pub mod prompt;
pub mod session;

pub use collaborator::{
    Collaborator, CollaboratorError, CollaboratorReply, ScriptedCollaborator, TurnMechanics,
};
pub use config::CollaboratorArgs;
pub use dashboard::Dashboard;
pub use gemini::{GeminiCollaborator, http_client};
pub use session::{ChatMessage, CoachSession, Role, SessionError, TurnOutcome};
