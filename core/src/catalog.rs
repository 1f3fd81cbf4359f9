use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::CatalogLoadError;

pub type DimensionId = String;
pub type BandId = String;
pub type CommandId = String;

/// One discrete level within a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Band {
    /// Globally unique across the whole catalog (e.g. "C3", "TD1")
    pub id: BandId,
    pub label: String,
    pub description: String,
    /// Learner behaviours that justify assigning this band
    pub learner_observations: Vec<String>,
    /// AI behaviours typical for this band
    pub ai_observations: Vec<String>,
    pub didactic_principle: String,
    /// Intervention text to apply when this band is detected
    pub fix_text: String,
    /// Command library entry implementing the fix, if the band declares one
    pub fix_command_id: Option<CommandId>,
}

/// One axis of assessment. Bands are ordered from lowest to highest maturity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Dimension {
    pub id: DimensionId,
    pub name: String,
    /// Free-text facet the rubric measures (e.g. "regieverdeling"), when declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,
    pub bands: Vec<Band>,
}

impl Dimension {
    /// Short code shared by the dimension's band ids: "TD" for "TD_TaskDensity".
    pub fn code(&self) -> &str {
        dimension_code(&self.id)
    }
}

pub fn dimension_code(dimension_id: &str) -> &str {
    dimension_id
        .split_once('_')
        .map(|(code, _)| code)
        .unwrap_or(dimension_id)
}

/// Order in which the coach is told to look at dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckPlan {
    pub cycle_priority: Vec<DimensionId>,
    pub secondary_check: Vec<DimensionId>,
    pub interrupt_check: Vec<DimensionId>,
}

/// One entry of the dashboard cycle, derived from `cycle_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CycleStep {
    pub dimension_id: DimensionId,
    pub code: String,
    /// Dimension name, or the id when the catalog does not define it
    pub name: String,
}

/// A band together with the dimension that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveBand<'a> {
    pub dimension: &'a Dimension,
    pub band: &'a Band,
}

/// Versioned rubric and command library. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RubricCatalog {
    pub version: String,
    pub system_name: String,
    /// Canonical assessment order, used for display only
    pub cycle_order: Vec<DimensionId>,
    /// Command id -> description
    pub commands: BTreeMap<CommandId, String>,
    pub dimensions: Vec<Dimension>,
    pub check_plan: CheckPlan,
    /// band id -> (dimension index, band index)
    #[serde(skip)]
    band_index: HashMap<BandId, (usize, usize)>,
}

pub const EMPTY_CATALOG_VERSION: &str = "0.0.0";

impl RubricCatalog {
    /// Build a catalog and its band index. Fails when two bands share an id.
    pub fn new(
        version: String,
        system_name: String,
        cycle_order: Vec<DimensionId>,
        commands: BTreeMap<CommandId, String>,
        dimensions: Vec<Dimension>,
        check_plan: CheckPlan,
    ) -> Result<Self, CatalogLoadError> {
        let mut band_index: HashMap<BandId, (usize, usize)> = HashMap::new();
        for (dim_idx, dimension) in dimensions.iter().enumerate() {
            for (band_idx, band) in dimension.bands.iter().enumerate() {
                if let Some((first_dim, _)) = band_index.get(&band.id) {
                    return Err(CatalogLoadError::DuplicateBand {
                        band_id: band.id.clone(),
                        first: dimensions[*first_dim].id.clone(),
                        second: dimension.id.clone(),
                    });
                }
                band_index.insert(band.id.clone(), (dim_idx, band_idx));
            }
        }

        Ok(Self {
            version,
            system_name,
            cycle_order,
            commands,
            dimensions,
            check_plan,
            band_index,
        })
    }

    /// The degraded catalog returned when a document cannot be loaded.
    pub fn empty() -> Self {
        Self {
            version: EMPTY_CATALOG_VERSION.to_string(),
            system_name: "Error".to_string(),
            cycle_order: Vec::new(),
            commands: BTreeMap::new(),
            dimensions: Vec::new(),
            check_plan: CheckPlan::default(),
            band_index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn band(&self, band_id: &str) -> Option<&Band> {
        self.band_index
            .get(band_id)
            .map(|&(d, b)| &self.dimensions[d].bands[b])
    }

    pub fn contains_band(&self, band_id: &str) -> bool {
        self.band_index.contains_key(band_id)
    }

    pub fn dimension(&self, dimension_id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == dimension_id)
    }

    /// Dimension that defines `band_id`.
    pub fn dimension_of_band(&self, band_id: &str) -> Option<&Dimension> {
        self.band_index
            .get(band_id)
            .map(|&(d, _)| &self.dimensions[d])
    }

    /// Dimension whose short code equals `code` ("C" matches "C_CoRegulation").
    pub fn dimension_for_code(&self, code: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.code() == code)
    }

    pub fn command(&self, command_id: &str) -> Option<&str> {
        self.commands.get(command_id).map(String::as_str)
    }

    pub fn band_ids(&self) -> impl Iterator<Item = &str> {
        self.dimensions
            .iter()
            .flat_map(|d| d.bands.iter().map(|b| b.id.as_str()))
    }

    pub fn cycle_steps(&self) -> Vec<CycleStep> {
        self.cycle_order
            .iter()
            .map(|dimension_id| CycleStep {
                dimension_id: dimension_id.clone(),
                code: dimension_code(dimension_id).to_string(),
                name: self
                    .dimension(dimension_id)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| dimension_id.clone()),
            })
            .collect()
    }

    /// Resolve band ids to their definitions, in input order. Unknown ids are skipped.
    pub fn resolve_bands<'a, I, S>(&'a self, band_ids: I) -> Vec<ActiveBand<'a>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        band_ids
            .into_iter()
            .filter_map(|id| {
                let &(d, b) = self.band_index.get(id.as_ref())?;
                let dimension = &self.dimensions[d];
                Some(ActiveBand {
                    dimension,
                    band: &dimension.bands[b],
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{Band, CheckPlan, Dimension, RubricCatalog, dimension_code};
    use crate::error::CatalogLoadError;
    use crate::test_support::sample_catalog;

    fn band(id: &str) -> Band {
        Band {
            id: id.to_string(),
            label: id.to_string(),
            description: String::new(),
            learner_observations: Vec::new(),
            ai_observations: Vec::new(),
            didactic_principle: String::new(),
            fix_text: String::new(),
            fix_command_id: None,
        }
    }

    #[test]
    fn dimension_code_takes_prefix_before_underscore() {
        assert_eq!(dimension_code("TD_TaskDensity"), "TD");
        assert_eq!(dimension_code("C"), "C");
    }

    #[test]
    fn band_lookup_goes_through_index() {
        let catalog = sample_catalog();
        assert_eq!(catalog.band("C3").map(|b| b.label.as_str()), Some("Shared start"));
        assert_eq!(catalog.dimension_of_band("TD2").map(|d| d.id.as_str()), Some("TD"));
        assert!(catalog.band("C9").is_none());
    }

    #[test]
    fn duplicate_band_ids_are_rejected() {
        let dims = vec![
            Dimension {
                id: "A".to_string(),
                name: "A".to_string(),
                facet: None,
                bands: vec![band("X1")],
            },
            Dimension {
                id: "B".to_string(),
                name: "B".to_string(),
                facet: None,
                bands: vec![band("X1")],
            },
        ];
        let err = RubricCatalog::new(
            "1".to_string(),
            "s".to_string(),
            Vec::new(),
            BTreeMap::new(),
            dims,
            CheckPlan::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogLoadError::DuplicateBand { ref band_id, .. } if band_id == "X1"));
    }

    #[test]
    fn cycle_steps_follow_cycle_order() {
        let catalog = sample_catalog();
        let codes: Vec<String> = catalog.cycle_steps().into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["P", "TD", "C", "V"]);
    }

    #[test]
    fn resolve_bands_skips_unknown_ids_and_keeps_order() {
        let catalog = sample_catalog();
        let resolved = catalog.resolve_bands(["C2", "nope", "P1"]);
        let ids: Vec<&str> = resolved.iter().map(|a| a.band.id.as_str()).collect();
        assert_eq!(ids, vec!["C2", "P1"]);
        assert_eq!(resolved[0].dimension.id, "C");
    }

    #[test]
    fn empty_catalog_has_defined_shape() {
        let catalog = RubricCatalog::empty();
        assert_eq!(catalog.version, "0.0.0");
        assert!(catalog.commands.is_empty());
        assert!(catalog.dimensions.is_empty());
        assert!(catalog.cycle_order.is_empty());
    }
}
