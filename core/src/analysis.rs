use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::{BandId, CommandId};
use crate::profile::LearnerProfile;

/// Wire sentinel for "no intervention this turn".
pub const ACTIVE_FIX_NONE: &str = "NONE";
/// Band id written into every primary group when a response cannot be decoded.
pub const SCHEMA_ERROR_BAND: &str = "Error";
pub const NEUTRAL_BALANCE: f64 = 50.0;
const DEFAULT_REASONING: &str = "No reasoning provided.";

/// The three dimensions the collaborator must populate on every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryGroup {
    Process,
    Coregulation,
    TaskDensity,
}

impl PrimaryGroup {
    pub const ALL: [PrimaryGroup; 3] = [
        PrimaryGroup::Process,
        PrimaryGroup::Coregulation,
        PrimaryGroup::TaskDensity,
    ];

    /// Band-id prefix used by the group's dimension.
    pub fn code(self) -> &'static str {
        match self {
            PrimaryGroup::Process => "P",
            PrimaryGroup::Coregulation => "C",
            PrimaryGroup::TaskDensity => "TD",
        }
    }

    pub fn wire_key(self) -> &'static str {
        match self {
            PrimaryGroup::Process => "process_phases",
            PrimaryGroup::Coregulation => "coregulation_bands",
            PrimaryGroup::TaskDensity => "task_densities",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EpistemicStatus {
    #[serde(rename = "FACT", alias = "FEIT")]
    Fact,
    #[serde(rename = "INTERPRETATION", alias = "INTERPRETATIE")]
    Interpretation,
    #[serde(rename = "SPECULATION", alias = "SPECULATIE")]
    Speculation,
    #[default]
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CognitiveMode {
    #[serde(rename = "ANALYTIC", alias = "ANALYTISCH")]
    Analytic,
    #[serde(rename = "REFLECTIVE", alias = "REFLECTIEF")]
    Reflective,
    #[serde(rename = "SYSTEMIC", alias = "SYSTEMISCH")]
    Systemic,
    #[serde(rename = "PRAGMATIC", alias = "PRAGMATISCH")]
    Pragmatic,
    #[serde(rename = "CREATIVE", alias = "CREATIEF")]
    Creative,
    #[serde(rename = "NORMATIVE", alias = "NORMATIEF")]
    Normative,
    #[default]
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

impl CognitiveMode {
    pub fn is_known(self) -> bool {
        self != CognitiveMode::Unknown
    }
}

/// Classification of one collaborator turn against the rubric.
///
/// Decoding is lenient: missing arrays are empty, a missing balance is
/// neutral, unknown enum tags become `UNKNOWN`, and `"NONE"` or `null` for
/// `active_fix` mean no command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "RawAnalysis")]
pub struct TurnAnalysis {
    pub process_phases: Vec<BandId>,
    pub coregulation_bands: Vec<BandId>,
    pub task_densities: Vec<BandId>,
    /// Recognized bands outside the three primary groups
    pub secondary_dimensions: Vec<BandId>,
    pub active_fix: Option<CommandId>,
    pub reasoning: String,
    /// Profile fragment detected so far; each field independently absent
    pub current_profile: LearnerProfile,
    /// 0 = fully AI-authored, 100 = fully learner-authored
    pub task_density_balance: f64,
    pub epistemic_status: EpistemicStatus,
    pub cognitive_mode: CognitiveMode,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawAnalysis {
    process_phases: Option<Vec<String>>,
    coregulation_bands: Option<Vec<String>>,
    task_densities: Option<Vec<String>>,
    secondary_dimensions: Option<Vec<String>>,
    active_fix: Option<String>,
    reasoning: Option<String>,
    current_profile: Option<LearnerProfile>,
    task_density_balance: Option<f64>,
    epistemic_status: Option<EpistemicStatus>,
    cognitive_mode: Option<CognitiveMode>,
}

/// Trimmed band ids with blanks dropped, so the kernel and the validator see
/// the same values.
fn band_list(ids: Option<Vec<String>>) -> Vec<BandId> {
    ids.unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

impl From<RawAnalysis> for TurnAnalysis {
    fn from(raw: RawAnalysis) -> Self {
        TurnAnalysis {
            process_phases: band_list(raw.process_phases),
            coregulation_bands: band_list(raw.coregulation_bands),
            task_densities: band_list(raw.task_densities),
            secondary_dimensions: band_list(raw.secondary_dimensions),
            active_fix: raw
                .active_fix
                .map(|fix| fix.trim().to_string())
                .filter(|fix| !fix.is_empty() && fix != ACTIVE_FIX_NONE),
            reasoning: raw
                .reasoning
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
            current_profile: raw.current_profile.unwrap_or_default().normalized(),
            task_density_balance: raw
                .task_density_balance
                .unwrap_or(NEUTRAL_BALANCE)
                .clamp(0.0, 100.0),
            epistemic_status: raw.epistemic_status.unwrap_or_default(),
            cognitive_mode: raw.cognitive_mode.unwrap_or_default(),
        }
    }
}

impl Default for TurnAnalysis {
    fn default() -> Self {
        RawAnalysis::default().into()
    }
}

impl TurnAnalysis {
    /// Degraded analysis for a response that could not be decoded.
    pub fn schema_error(reason: &str) -> Self {
        let sentinel = || vec![SCHEMA_ERROR_BAND.to_string()];
        TurnAnalysis {
            process_phases: sentinel(),
            coregulation_bands: sentinel(),
            task_densities: sentinel(),
            reasoning: format!("Raw parsing error: {reason}"),
            ..Default::default()
        }
    }

    pub fn primary(&self, group: PrimaryGroup) -> &[BandId] {
        match group {
            PrimaryGroup::Process => &self.process_phases,
            PrimaryGroup::Coregulation => &self.coregulation_bands,
            PrimaryGroup::TaskDensity => &self.task_densities,
        }
    }

    pub fn primary_band_ids(&self) -> impl Iterator<Item = &str> {
        PrimaryGroup::ALL
            .into_iter()
            .flat_map(move |group| self.primary(group).iter().map(String::as_str))
    }

    /// Primary ids followed by secondary ids, in input order.
    pub fn band_ids(&self) -> impl Iterator<Item = &str> {
        self.primary_band_ids()
            .chain(self.secondary_dimensions.iter().map(String::as_str))
    }

    pub fn is_degraded(&self) -> bool {
        self.primary_band_ids().any(|id| id == SCHEMA_ERROR_BAND)
    }

    /// Whether a dashboard cycle step (by dimension code) is lit by this turn.
    pub fn is_step_active(&self, code: &str) -> bool {
        self.primary_band_ids().any(|id| band_code(id) == code)
    }
}

/// Letters before the level number: "TD" for "TD3".
pub fn band_code(band_id: &str) -> &str {
    let end = band_id
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(band_id.len());
    &band_id[..end]
}

/// Decoded collaborator reply: chat text plus the turn's analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub analysis: TurnAnalysis,
    /// Set when the body did not match the response schema
    pub schema_error: Option<String>,
}

#[derive(Deserialize)]
struct RawModelResponse {
    conversational_response: String,
    analysis: TurnAnalysis,
}

/// Decode a raw collaborator body. Never fails: a body that is not the
/// expected JSON document keeps its raw text as the chat message and gets
/// the degraded analysis.
pub fn decode_model_response(body: &str) -> ModelReply {
    match serde_json::from_str::<RawModelResponse>(body) {
        Ok(parsed) => ModelReply {
            text: parsed.conversational_response,
            analysis: parsed.analysis,
            schema_error: None,
        },
        Err(err) => {
            let reason = err.to_string();
            ModelReply {
                text: body.to_string(),
                analysis: TurnAnalysis::schema_error(&reason),
                schema_error: Some(reason),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        CognitiveMode, EpistemicStatus, NEUTRAL_BALANCE, PrimaryGroup, TurnAnalysis, band_code,
        decode_model_response,
    };

    #[test]
    fn non_json_body_degrades_to_error_sentinels() {
        let reply = decode_model_response("not json");
        assert!(reply.schema_error.is_some());
        assert_eq!(reply.text, "not json");
        for group in PrimaryGroup::ALL {
            assert_eq!(reply.analysis.primary(group), ["Error".to_string()]);
        }
        assert_eq!(reply.analysis.task_density_balance, NEUTRAL_BALANCE);
        assert_eq!(reply.analysis.cognitive_mode, CognitiveMode::Unknown);
        assert_eq!(reply.analysis.epistemic_status, EpistemicStatus::Unknown);
        assert!(reply.analysis.reasoning.starts_with("Raw parsing error"));
        assert!(reply.analysis.is_degraded());
    }

    #[test]
    fn missing_analysis_is_a_schema_error() {
        let reply = decode_model_response(r#"{"conversational_response": "hi"}"#);
        assert!(reply.schema_error.is_some());
        assert!(reply.analysis.is_degraded());
    }

    #[test]
    fn decodes_full_response() {
        let body = json!({
            "conversational_response": "What is your goal?",
            "analysis": {
                "process_phases": ["P1"],
                "coregulation_bands": ["C1"],
                "task_densities": ["TD4"],
                "secondary_dimensions": ["V1", "E2"],
                "active_fix": "/checkin",
                "reasoning": "Learner waits passively.",
                "current_profile": { "name": "Anna", "subject": "", "level": null },
                "task_density_balance": 30,
                "epistemic_status": "FACT",
                "cognitive_mode": "REFLECTIVE"
            }
        })
        .to_string();

        let reply = decode_model_response(&body);
        assert_eq!(reply.schema_error, None);
        assert_eq!(reply.text, "What is your goal?");
        let analysis = reply.analysis;
        assert_eq!(analysis.active_fix.as_deref(), Some("/checkin"));
        assert_eq!(analysis.secondary_dimensions, vec!["V1", "E2"]);
        assert_eq!(analysis.current_profile.name.as_deref(), Some("Anna"));
        assert_eq!(analysis.current_profile.subject, None);
        assert_eq!(analysis.task_density_balance, 30.0);
        assert_eq!(analysis.epistemic_status, EpistemicStatus::Fact);
        assert_eq!(analysis.cognitive_mode, CognitiveMode::Reflective);
    }

    #[test]
    fn none_sentinel_and_dutch_tags_are_understood() {
        let analysis: TurnAnalysis = serde_json::from_value(json!({
            "active_fix": "NONE",
            "epistemic_status": "INTERPRETATIE",
            "cognitive_mode": "PRAGMATISCH"
        }))
        .unwrap();
        assert_eq!(analysis.active_fix, None);
        assert_eq!(analysis.epistemic_status, EpistemicStatus::Interpretation);
        assert_eq!(analysis.cognitive_mode, CognitiveMode::Pragmatic);
        assert_eq!(analysis.reasoning, "No reasoning provided.");
        assert_eq!(analysis.task_density_balance, NEUTRAL_BALANCE);
    }

    #[test]
    fn unknown_tags_fall_back_and_balance_is_clamped() {
        let analysis: TurnAnalysis = serde_json::from_value(json!({
            "cognitive_mode": "WHIMSICAL",
            "task_density_balance": 180
        }))
        .unwrap();
        assert_eq!(analysis.cognitive_mode, CognitiveMode::Unknown);
        assert_eq!(analysis.task_density_balance, 100.0);
    }

    #[test]
    fn step_activity_matches_whole_band_code() {
        let analysis = TurnAnalysis {
            task_densities: vec!["TD3".to_string()],
            ..Default::default()
        };
        assert!(analysis.is_step_active("TD"));
        assert!(!analysis.is_step_active("T"));
        assert_eq!(band_code("C12"), "C");
    }
}
