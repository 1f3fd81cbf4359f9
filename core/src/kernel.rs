use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::analysis::{CognitiveMode, PrimaryGroup, SCHEMA_ERROR_BAND, TurnAnalysis};
use crate::catalog::{BandId, DimensionId, RubricCatalog, dimension_code};

/// Accumulated classification of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionState {
    /// Number of turns folded so far
    pub turn_counter: u64,
    /// Most recent band observed per dimension; a missing key means none yet
    pub current_band_by_dimension: BTreeMap<DimensionId, BandId>,
    pub cognitive_mode: Option<CognitiveMode>,
}

impl SessionState {
    /// State at session start.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn current_band(&self, dimension_id: &str) -> Option<&str> {
        self.current_band_by_dimension
            .get(dimension_id)
            .map(String::as_str)
    }
}

/// Dimension a primary group's band folds into: the dimension that owns the
/// id, else the catalog dimension carrying the group's code, else the code.
pub fn primary_dimension(
    group: PrimaryGroup,
    band_id: &str,
    catalog: &RubricCatalog,
) -> DimensionId {
    catalog
        .dimension_of_band(band_id)
        .or_else(|| catalog.dimension_for_code(group.code()))
        .map(|d| d.id.clone())
        .unwrap_or_else(|| group.code().to_string())
}

/// Fold one turn into the session state, producing the next state.
///
/// Ids the catalog does not know are still stored for primary groups; the
/// validator reports them separately. The schema-error sentinel is never
/// stored. Secondary ids are only applied when the catalog maps them to a
/// dimension.
pub fn fold(prev: &SessionState, turn: &TurnAnalysis, catalog: &RubricCatalog) -> SessionState {
    let mut next = prev.clone();
    next.turn_counter = prev.turn_counter.saturating_add(1);

    for group in PrimaryGroup::ALL {
        // First usable id wins; an empty group carries the previous band forward.
        let Some(band_id) = turn
            .primary(group)
            .iter()
            .find(|id| id.as_str() != SCHEMA_ERROR_BAND)
        else {
            continue;
        };
        let dimension = primary_dimension(group, band_id, catalog);
        next.current_band_by_dimension
            .insert(dimension, band_id.clone());
    }

    for band_id in &turn.secondary_dimensions {
        if let Some(dimension) = catalog.dimension_of_band(band_id) {
            next.current_band_by_dimension
                .insert(dimension.id.clone(), band_id.clone());
        }
    }

    if turn.cognitive_mode.is_known() {
        next.cognitive_mode = Some(turn.cognitive_mode);
    }

    next
}

/// Re-file `prev` under the dimension ids of `to`.
///
/// Locales name the same dimension differently ("C_CoRegulation" and
/// "C_CoRegulatie"), so each entry moves to the dimension of `to` that owns
/// its band, else the one sharing its code. Entries with no counterpart keep
/// their key. Turn counter and cognitive mode are unchanged.
pub fn rekey(prev: &SessionState, from: &RubricCatalog, to: &RubricCatalog) -> SessionState {
    let mut next = SessionState {
        current_band_by_dimension: BTreeMap::new(),
        ..prev.clone()
    };

    for (dimension_id, band_id) in &prev.current_band_by_dimension {
        let code = from
            .dimension(dimension_id)
            .map(|d| d.code())
            .unwrap_or_else(|| dimension_code(dimension_id));
        let target = to
            .dimension_of_band(band_id)
            .or_else(|| to.dimension_for_code(code))
            .map(|d| d.id.clone())
            .unwrap_or_else(|| dimension_id.clone());
        next.current_band_by_dimension.insert(target, band_id.clone());
    }

    next
}
