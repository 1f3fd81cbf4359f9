use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::catalog::{Band, CheckPlan, Dimension, RubricCatalog};
use crate::error::CatalogLoadError;
use crate::events::{EventSink, KernelEvent};
use crate::locale::Locale;

const BUILTIN_NL: &str = include_str!("../catalogs/nl.json");
const BUILTIN_EN: &str = include_str!("../catalogs/en.json");

/// Raw catalog document shipped with the coach for `locale`.
pub fn builtin_document(locale: Locale) -> &'static str {
    match locale {
        Locale::Nl => BUILTIN_NL,
        Locale::En => BUILTIN_EN,
    }
}

// Wire shape of the rubric document. Required keys have no default so a
// document missing them fails to parse as a whole.

#[derive(Deserialize)]
struct RawCatalog {
    version: String,
    metadata: RawMetadata,
    #[serde(default)]
    global_logic: Option<RawGlobalLogic>,
    command_library: RawCommandLibrary,
    rubrics: Vec<RawRubric>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    system: String,
    cycle: RawCycle,
}

#[derive(Deserialize)]
struct RawCycle {
    order: Vec<String>,
}

#[derive(Deserialize, Default)]
struct RawGlobalLogic {
    #[serde(default)]
    cycle_priority: Vec<String>,
    #[serde(default)]
    secondary_check: Vec<String>,
    #[serde(default)]
    interrupt_check: Vec<String>,
}

#[derive(Deserialize)]
struct RawCommandLibrary {
    commands: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawRubric {
    rubric_id: String,
    name: String,
    #[serde(default)]
    dimension: Option<String>,
    #[serde(default)]
    bands: Vec<RawBand>,
}

#[derive(Deserialize)]
struct RawBand {
    band_id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    learner_obs: Vec<String>,
    #[serde(default)]
    ai_obs: Vec<String>,
    #[serde(default)]
    didactic_principle: String,
    #[serde(default)]
    fix: String,
    #[serde(default)]
    fix_ref: Option<String>,
}

impl From<RawBand> for Band {
    fn from(raw: RawBand) -> Self {
        Band {
            id: raw.band_id,
            label: raw.label,
            description: raw.description,
            learner_observations: raw.learner_obs,
            ai_observations: raw.ai_obs,
            didactic_principle: raw.didactic_principle,
            fix_text: raw.fix,
            fix_command_id: raw.fix_ref.filter(|c| !c.trim().is_empty()),
        }
    }
}

/// Strict parse. Callers that must not fail use [`load_catalog`].
pub fn parse_catalog(raw_text: &str) -> Result<RubricCatalog, CatalogLoadError> {
    let raw: RawCatalog = serde_json::from_str(raw_text)?;

    let dimensions = raw
        .rubrics
        .into_iter()
        .map(|r| Dimension {
            id: r.rubric_id,
            name: r.name,
            facet: r.dimension,
            bands: r.bands.into_iter().map(Band::from).collect(),
        })
        .collect();

    let logic = raw.global_logic.unwrap_or_default();
    RubricCatalog::new(
        raw.version,
        raw.metadata.system,
        raw.metadata.cycle.order,
        raw.command_library.commands,
        dimensions,
        CheckPlan {
            cycle_priority: logic.cycle_priority,
            secondary_check: logic.secondary_check,
            interrupt_check: logic.interrupt_check,
        },
    )
}

/// Parse a catalog document, degrading to [`RubricCatalog::empty`] on any failure.
/// The failure is reported through `events`; this never returns an error.
pub fn load_catalog(raw_text: &str, locale: Locale, events: &dyn EventSink) -> RubricCatalog {
    match parse_catalog(raw_text) {
        Ok(catalog) => {
            tracing::debug!(
                %locale,
                version = %catalog.version,
                dimensions = catalog.dimensions.len(),
                commands = catalog.commands.len(),
                "catalog loaded"
            );
            catalog
        }
        Err(err) => {
            events.emit(KernelEvent::CatalogLoadFailed {
                locale,
                reason: err.to_string(),
            });
            RubricCatalog::empty()
        }
    }
}

type DocumentSource = dyn Fn(Locale) -> String + Send + Sync;

/// Loads catalogs on demand and keeps one parsed catalog per locale.
/// A locale that has been loaded once, even into the degraded empty catalog,
/// is never parsed again.
pub struct CatalogLoader {
    source: Box<DocumentSource>,
    events: Arc<dyn EventSink>,
    cache: Mutex<HashMap<Locale, Arc<RubricCatalog>>>,
}

impl CatalogLoader {
    pub fn new<F>(source: F, events: Arc<dyn EventSink>) -> Self
    where
        F: Fn(Locale) -> String + Send + Sync + 'static,
    {
        Self {
            source: Box::new(source),
            events,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Loader over the catalogs embedded in this crate.
    pub fn builtin(events: Arc<dyn EventSink>) -> Self {
        Self::new(|locale| builtin_document(locale).to_string(), events)
    }

    pub fn get(&self, locale: Locale) -> Arc<RubricCatalog> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(catalog) = cache.get(&locale) {
            return Arc::clone(catalog);
        }
        let raw = (self.source)(locale);
        let catalog = Arc::new(load_catalog(&raw, locale, self.events.as_ref()));
        cache.insert(locale, Arc::clone(&catalog));
        catalog
    }

    pub fn is_cached(&self, locale: Locale) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&locale)
    }
}
