use clap::Args;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_THINKING_BUDGET: u32 = 8192;
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the generative backend.
#[derive(Args, Clone, Debug, PartialEq)]
pub struct CollaboratorArgs {
    /// API key for the Generative Language endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(long, env = "EAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "EAI_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Token budget for the model's internal reasoning
    #[arg(long, env = "EAI_THINKING_BUDGET", default_value_t = DEFAULT_THINKING_BUDGET)]
    pub thinking_budget: u32,

    #[arg(long, env = "EAI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "EAI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Default for CollaboratorArgs {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
