use serde::Serialize;
use utoipa::ToSchema;

use crate::analysis::TurnAnalysis;
use crate::catalog::{BandId, CommandId, RubricCatalog};

/// Advisory grounding check of a turn against the catalog vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationResult {
    pub ok: bool,
    /// Distinct band ids the catalog does not define, in first-seen order
    pub unknown_band_ids: Vec<BandId>,
    pub unknown_command_id: Option<CommandId>,
}

/// Check every band id (primary and secondary) and the active command of
/// `turn` against `catalog`. Pure and infallible; callers fold the turn
/// regardless of the outcome.
pub fn validate(turn: &TurnAnalysis, catalog: &RubricCatalog) -> ValidationResult {
    let mut unknown_band_ids: Vec<BandId> = Vec::new();
    for id in turn.band_ids() {
        if !catalog.contains_band(id) && !unknown_band_ids.iter().any(|seen| seen == id) {
            unknown_band_ids.push(id.to_string());
        }
    }

    let unknown_command_id = turn
        .active_fix
        .as_ref()
        .filter(|command| catalog.command(command).is_none())
        .cloned();

    ValidationResult {
        ok: unknown_band_ids.is_empty() && unknown_command_id.is_none(),
        unknown_band_ids,
        unknown_command_id,
    }
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::analysis::TurnAnalysis;
    use crate::kernel::{SessionState, fold};
    use crate::test_support::sample_catalog;

    fn turn(coregulation: &[&str]) -> TurnAnalysis {
        TurnAnalysis {
            coregulation_bands: coregulation.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn known_band_is_ok() {
        let result = validate(&turn(&["C1"]), &sample_catalog());
        assert!(result.ok);
        assert!(result.unknown_band_ids.is_empty());
        assert_eq!(result.unknown_command_id, None);
    }

    #[test]
    fn padded_ids_are_judged_like_the_kernel_stores_them() {
        let analysis: TurnAnalysis = serde_json::from_value(serde_json::json!({
            "coregulation_bands": [" C1 ", "  "],
            "secondary_dimensions": ["V1\n"]
        }))
        .unwrap();
        assert_eq!(analysis.coregulation_bands, vec!["C1"]);
        assert_eq!(analysis.secondary_dimensions, vec!["V1"]);

        let catalog = sample_catalog();
        assert!(validate(&analysis, &catalog).ok);
        let state = fold(&SessionState::empty(), &analysis, &catalog);
        assert_eq!(state.current_band("C"), Some("C1"));
        assert_eq!(state.current_band("V"), Some("V1"));
    }

    #[test]
    fn unknown_band_is_reported() {
        let result = validate(&turn(&["C9"]), &sample_catalog());
        assert!(!result.ok);
        assert_eq!(result.unknown_band_ids, vec!["C9"]);
    }

    #[test]
    fn secondary_ids_are_checked_and_deduplicated() {
        let mut analysis = turn(&["X1"]);
        analysis.secondary_dimensions = vec!["V1".to_string(), "X1".to_string(), "Z2".to_string()];
        let result = validate(&analysis, &sample_catalog());
        assert_eq!(result.unknown_band_ids, vec!["X1", "Z2"]);
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut analysis = turn(&["C1"]);
        analysis.active_fix = Some("/ghost".to_string());
        let result = validate(&analysis, &sample_catalog());
        assert!(!result.ok);
        assert_eq!(result.unknown_command_id.as_deref(), Some("/ghost"));

        analysis.active_fix = Some("/checkin".to_string());
        assert!(validate(&analysis, &sample_catalog()).ok);
    }

    #[test]
    fn degraded_turn_reports_sentinel() {
        let result = validate(&TurnAnalysis::schema_error("boom"), &sample_catalog());
        assert!(!result.ok);
        assert_eq!(result.unknown_band_ids, vec!["Error"]);
    }
}
