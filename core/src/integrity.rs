use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::RubricCatalog;
use crate::events::{EventSink, KernelEvent};
use crate::locale::Locale;

/// A structural gap found in a loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IntegrityIssue {
    NoDimensions,
    EmptyDimension { dimension_id: String },
    /// A band names a fix command the command library does not contain
    DanglingFixCommand { band_id: String, command_id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IntegrityReport {
    pub ok: bool,
    pub issues: Vec<IntegrityIssue>,
}

/// Collect every structural issue of `catalog`. Pure.
pub fn inspect_catalog(catalog: &RubricCatalog) -> IntegrityReport {
    let mut issues = Vec::new();

    if catalog.dimensions.is_empty() {
        issues.push(IntegrityIssue::NoDimensions);
    }

    for dimension in &catalog.dimensions {
        if dimension.bands.is_empty() {
            issues.push(IntegrityIssue::EmptyDimension {
                dimension_id: dimension.id.clone(),
            });
        }
        // A band without a fix command is fine; only a dangling reference fails.
        for band in &dimension.bands {
            let Some(command_id) = &band.fix_command_id else {
                continue;
            };
            if !catalog.commands.contains_key(command_id) {
                issues.push(IntegrityIssue::DanglingFixCommand {
                    band_id: band.id.clone(),
                    command_id: command_id.clone(),
                });
            }
        }
    }

    IntegrityReport {
        ok: issues.is_empty(),
        issues,
    }
}

pub fn check_catalog_integrity(catalog: &RubricCatalog) -> bool {
    inspect_catalog(catalog).ok
}

/// Startup probe: inspect and report, never fail. Returns the verdict.
pub fn probe_catalog(catalog: &RubricCatalog, locale: Locale, events: &dyn EventSink) -> bool {
    let report = inspect_catalog(catalog);
    if report.ok {
        tracing::info!(%locale, version = %catalog.version, "catalog integrity check ok");
    } else {
        events.emit(KernelEvent::CatalogIntegrityWarning {
            locale,
            issues: report.issues,
        });
    }
    report.ok
}

#[cfg(test)]
mod tests {
    use super::{IntegrityIssue, check_catalog_integrity, inspect_catalog, probe_catalog};
    use crate::catalog::RubricCatalog;
    use crate::events::EventLog;
    use crate::loader::{builtin_document, parse_catalog};
    use crate::locale::Locale;
    use crate::test_support::sample_catalog;

    #[test]
    fn sample_and_builtin_catalogs_pass() {
        assert!(check_catalog_integrity(&sample_catalog()));
        for locale in Locale::ALL {
            let catalog = parse_catalog(builtin_document(locale)).unwrap();
            assert!(check_catalog_integrity(&catalog), "{locale} catalog incomplete");
        }
    }

    #[test]
    fn dangling_fix_command_fails() {
        let doc = r#"{
          "version": "1", "metadata": { "cycle": { "order": ["C"] } },
          "command_library": { "commands": { "/checkin": "x" } },
          "rubrics": [{ "rubric_id": "C", "name": "C", "bands": [
            { "band_id": "C1", "fix_ref": "/checkin" },
            { "band_id": "C2", "fix_ref": "/ghost" },
            { "band_id": "C3" }
          ]}]
        }"#;
        let catalog = parse_catalog(doc).unwrap();
        let report = inspect_catalog(&catalog);
        assert!(!report.ok);
        assert_eq!(
            report.issues,
            vec![IntegrityIssue::DanglingFixCommand {
                band_id: "C2".to_string(),
                command_id: "/ghost".to_string(),
            }]
        );
    }

    #[test]
    fn empty_dimension_fails() {
        let doc = r#"{
          "version": "1", "metadata": { "cycle": { "order": [] } },
          "command_library": { "commands": {} },
          "rubrics": [{ "rubric_id": "X", "name": "X" }]
        }"#;
        let report = inspect_catalog(&parse_catalog(doc).unwrap());
        assert_eq!(
            report.issues,
            vec![IntegrityIssue::EmptyDimension {
                dimension_id: "X".to_string()
            }]
        );
    }

    #[test]
    fn empty_catalog_fails_and_is_reported() {
        let events = EventLog::new();
        assert!(!probe_catalog(&RubricCatalog::empty(), Locale::En, &events));
        assert_eq!(events.len(), 1);
        assert_eq!(events.snapshot()[0].kind(), "catalog_integrity_warning");
    }
}
