use eai_core::{
    CognitiveMode, LearnerProfile, Locale, RubricCatalog, SessionState, TurnAnalysis,
    ValidationResult,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::collaborator::TurnMechanics;

/// Everything recorded about the most recent folded turn.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LastTurn {
    pub analysis: TurnAnalysis,
    pub validation: ValidationResult,
    pub mechanics: TurnMechanics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CycleStepView {
    pub dimension_id: String,
    pub code: String,
    pub name: String,
    /// Lit when the last turn placed a primary band in this step
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CurrentBand {
    pub dimension_id: String,
    pub dimension_name: Option<String>,
    pub band_id: String,
    /// Absent when the band is not defined by the catalog
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BandDetail {
    pub dimension_id: String,
    pub band_id: String,
    pub label: String,
    pub description: String,
    pub didactic_principle: String,
    pub fix_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TurnSummary {
    #[serde(flatten)]
    pub turn: LastTurn,
    pub active_fix_description: Option<String>,
    pub active_bands: Vec<BandDetail>,
}

/// Read model of a session for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    pub session_id: Uuid,
    pub locale: Locale,
    pub catalog_version: String,
    pub system_name: String,
    pub turn_counter: u64,
    pub cognitive_mode: Option<CognitiveMode>,
    pub cycle: Vec<CycleStepView>,
    /// Current band per dimension, cycle dimensions first
    pub current_bands: Vec<CurrentBand>,
    pub last_turn: Option<TurnSummary>,
    pub profile: LearnerProfile,
    pub busy: bool,
}

impl Dashboard {
    pub fn build(
        session_id: Uuid,
        locale: Locale,
        catalog: &RubricCatalog,
        state: &SessionState,
        profile: &LearnerProfile,
        last_turn: Option<&LastTurn>,
        busy: bool,
    ) -> Self {
        let cycle = catalog
            .cycle_steps()
            .into_iter()
            .map(|step| CycleStepView {
                active: last_turn.is_some_and(|t| t.analysis.is_step_active(&step.code)),
                dimension_id: step.dimension_id,
                code: step.code,
                name: step.name,
            })
            .collect();

        Self {
            session_id,
            locale,
            catalog_version: catalog.version.clone(),
            system_name: catalog.system_name.clone(),
            turn_counter: state.turn_counter,
            cognitive_mode: state.cognitive_mode,
            cycle,
            current_bands: current_bands(catalog, state),
            last_turn: last_turn.map(|turn| summarize(catalog, turn)),
            profile: profile.clone(),
            busy,
        }
    }
}

fn current_bands(catalog: &RubricCatalog, state: &SessionState) -> Vec<CurrentBand> {
    let in_cycle = |id: &String| catalog.cycle_order.contains(id);
    let ordered = catalog
        .cycle_order
        .iter()
        .filter_map(|id| state.current_band_by_dimension.get_key_value(id))
        .chain(
            state
                .current_band_by_dimension
                .iter()
                .filter(|(id, _)| !in_cycle(*id)),
        );

    ordered
        .map(|(dimension_id, band_id)| CurrentBand {
            dimension_id: dimension_id.clone(),
            dimension_name: catalog.dimension(dimension_id).map(|d| d.name.clone()),
            band_id: band_id.clone(),
            label: catalog.band(band_id).map(|b| b.label.clone()),
        })
        .collect()
}

fn summarize(catalog: &RubricCatalog, turn: &LastTurn) -> TurnSummary {
    let active_bands = catalog
        .resolve_bands(turn.analysis.band_ids())
        .into_iter()
        .map(|active| BandDetail {
            dimension_id: active.dimension.id.clone(),
            band_id: active.band.id.clone(),
            label: active.band.label.clone(),
            description: active.band.description.clone(),
            didactic_principle: active.band.didactic_principle.clone(),
            fix_text: active.band.fix_text.clone(),
        })
        .collect();

    TurnSummary {
        turn: turn.clone(),
        active_fix_description: turn
            .analysis
            .active_fix
            .as_deref()
            .and_then(|id| catalog.command(id))
            .map(str::to_string),
        active_bands,
    }
}
