use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the coach knows about the learner. Every field is optional; the same
/// shape is used for the partial fragment reported with each turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LearnerProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

impl LearnerProfile {
    /// Drop blank values so "" and absent mean the same thing.
    pub fn normalized(self) -> Self {
        Self {
            name: present(self.name),
            subject: present(self.subject),
            level: present(self.level),
            grade: present(self.grade),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.name, &self.subject, &self.level, &self.grade]
            .iter()
            .all(|field| field.as_deref().is_none_or(|v| v.trim().is_empty()))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileMerge {
    pub profile: LearnerProfile,
    /// True iff at least one field differs from the previous profile
    pub changed: bool,
}

/// Merge a turn's profile fragment into the stored profile. Non-empty incoming
/// values overwrite; absent or empty values never erase stored data.
pub fn merge_profile(prev: &LearnerProfile, fragment: &LearnerProfile) -> ProfileMerge {
    fn pick(prev: &Option<String>, incoming: &Option<String>) -> Option<String> {
        match incoming.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v.to_string()),
            _ => prev.clone(),
        }
    }

    let profile = LearnerProfile {
        name: pick(&prev.name, &fragment.name),
        subject: pick(&prev.subject, &fragment.subject),
        level: pick(&prev.level, &fragment.level),
        grade: pick(&prev.grade, &fragment.grade),
    };
    let changed = profile != *prev;
    ProfileMerge { profile, changed }
}

#[cfg(test)]
mod tests {
    use super::{LearnerProfile, merge_profile};

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn new_value_fills_absent_field() {
        let prev = LearnerProfile {
            name: some("Anna"),
            ..Default::default()
        };
        let fragment = LearnerProfile {
            subject: some("Math"),
            ..Default::default()
        };
        let merged = merge_profile(&prev, &fragment);
        assert!(merged.changed);
        assert_eq!(merged.profile.name, some("Anna"));
        assert_eq!(merged.profile.subject, some("Math"));
    }

    #[test]
    fn empty_fragment_changes_nothing() {
        let prev = LearnerProfile {
            name: some("Anna"),
            level: some("VWO"),
            ..Default::default()
        };
        let merged = merge_profile(&prev, &LearnerProfile::default());
        assert!(!merged.changed);
        assert_eq!(merged.profile, prev);
    }

    #[test]
    fn blank_strings_never_erase() {
        let prev = LearnerProfile {
            grade: some("4"),
            ..Default::default()
        };
        let fragment = LearnerProfile {
            grade: some("  "),
            ..Default::default()
        };
        let merged = merge_profile(&prev, &fragment);
        assert!(!merged.changed);
        assert_eq!(merged.profile.grade, some("4"));
    }

    #[test]
    fn repeating_the_stored_value_is_not_a_change() {
        let prev = LearnerProfile {
            name: some("Anna"),
            ..Default::default()
        };
        let merged = merge_profile(&prev, &prev.clone());
        assert!(!merged.changed);
    }

    #[test]
    fn normalized_drops_blank_fields() {
        let profile = LearnerProfile {
            name: some(""),
            subject: some("History"),
            ..Default::default()
        }
        .normalized();
        assert_eq!(profile.name, None);
        assert!(!profile.is_empty());
        assert!(LearnerProfile::default().is_empty());
    }
}
