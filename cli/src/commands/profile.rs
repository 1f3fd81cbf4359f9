use clap::Subcommand;
use eai_core::events::TracingSink;
use eai_core::store::{JsonFileStore, ProfileStore, load_profile};
use serde_json::json;

use crate::util::{print_json, report_error};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Print the stored learner profile
    Show,
    /// Delete the stored learner profile
    Clear,
}

pub fn run(store: &JsonFileStore, command: ProfileCommands) -> i32 {
    match command {
        ProfileCommands::Show => {
            let profile = load_profile(store, &TracingSink);
            print_json(&json!({
                "path": store.path().display().to_string(),
                "profile": profile,
            }));
            0
        }
        ProfileCommands::Clear => match store.clear() {
            Ok(()) => {
                print_json(&json!({
                    "path": store.path().display().to_string(),
                    "cleared": true,
                }));
                0
            }
            Err(e) => report_error("profile_store_error", &e.to_string(), None, 2),
        },
    }
}

#[cfg(test)]
mod tests {
    use eai_core::LearnerProfile;
    use eai_core::store::{JsonFileStore, ProfileStore};

    use super::{ProfileCommands, run};

    #[test]
    fn clear_removes_stored_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        store
            .save(&LearnerProfile {
                name: Some("Anna".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(run(&store, ProfileCommands::Show), 0);
        assert_eq!(run(&store, ProfileCommands::Clear), 0);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(run(&store, ProfileCommands::Clear), 0);
    }
}
