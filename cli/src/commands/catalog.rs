use clap::{Args, Subcommand};
use eai_core::events::EventLog;
use eai_core::integrity::inspect_catalog;
use eai_core::loader::{builtin_document, load_catalog, parse_catalog};
use eai_core::Locale;
use serde_json::json;

use crate::util::{print_json, read_text, report_error};

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Run the integrity self-check (exit 0 iff the catalog is complete)
    Check(CatalogSource),
    /// Print the parsed catalog as JSON
    Show(CatalogSource),
}

#[derive(Args)]
pub struct CatalogSource {
    /// Catalog document to load instead of the built-in one ("-" for stdin)
    #[arg(long)]
    pub file: Option<String>,
}

impl CatalogSource {
    fn document(&self, locale: Locale) -> Result<String, String> {
        match &self.file {
            Some(path) => read_text(path),
            None => Ok(builtin_document(locale).to_string()),
        }
    }
}

pub fn run(locale: Locale, command: CatalogCommands) -> i32 {
    match command {
        CatalogCommands::Check(source) => check(locale, &source),
        CatalogCommands::Show(source) => show(locale, &source),
    }
}

fn check(locale: Locale, source: &CatalogSource) -> i32 {
    let raw = match source.document(locale) {
        Ok(raw) => raw,
        Err(e) => return report_error("cli_error", &e, None, 1),
    };

    let events = EventLog::new();
    let catalog = load_catalog(&raw, locale, &events);
    let report = inspect_catalog(&catalog);

    print_json(&json!({
        "locale": locale,
        "version": catalog.version,
        "ok": report.ok,
        "issues": report.issues,
        "events": events.snapshot(),
    }));

    if report.ok { 0 } else { 1 }
}

fn show(locale: Locale, source: &CatalogSource) -> i32 {
    let raw = match source.document(locale) {
        Ok(raw) => raw,
        Err(e) => return report_error("cli_error", &e, None, 1),
    };

    match parse_catalog(&raw) {
        Ok(catalog) => {
            print_json(&catalog);
            0
        }
        Err(e) => report_error(
            "catalog_load_failed",
            &e.to_string(),
            Some("Expected keys: version, metadata.cycle.order, command_library.commands, rubrics"),
            1,
        ),
    }
}
