pub mod analysis;
pub mod catalog;
pub mod error;
pub mod events;
pub mod integrity;
pub mod kernel;
pub mod loader;
pub mod locale;
pub mod profile;
pub mod store;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use analysis::{CognitiveMode, EpistemicStatus, PrimaryGroup, TurnAnalysis};
pub use catalog::{Band, BandId, CommandId, Dimension, DimensionId, RubricCatalog};
pub use kernel::{SessionState, fold};
pub use locale::Locale;
pub use profile::{LearnerProfile, ProfileMerge, merge_profile};
pub use validation::{ValidationResult, validate};
