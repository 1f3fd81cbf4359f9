use eai_core::loader::builtin_document;
use eai_core::{LearnerProfile, Locale};
use serde_json::{Value, json};

const PROTOCOL_NL: &str = include_str!("../prompts/nl.txt");
const PROTOCOL_EN: &str = include_str!("../prompts/en.txt");

fn protocol(locale: Locale) -> &'static str {
    match locale {
        Locale::Nl => PROTOCOL_NL,
        Locale::En => PROTOCOL_EN,
    }
}

/// Coaching protocol followed by the rubric document it refers to.
pub fn system_instruction(locale: Locale) -> String {
    format!(
        "{}\n{}",
        protocol(locale).trim_end(),
        builtin_document(locale)
    )
}

/// Opening message sent on behalf of the learner after profile setup.
pub fn start_message(locale: Locale, profile: &LearnerProfile, goal: &str) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let name = field(&profile.name);
    let level = field(&profile.level);
    let grade = field(&profile.grade);
    let subject = field(&profile.subject);
    let goal = goal.trim();

    match locale {
        Locale::Nl => format!(
            "[Systeem Start]\nNaam: {name}\nNiveau: {level}, Leerjaar {grade}\nVak: {subject}\nDoel: {goal}\n\n\
             INSTRUCTIE: Je blijft gedurende de HELE sessie in de rol die past bij dit niveau. \
             Pas je antwoorden en vragen strikt aan op {level} leerjaar {grade}."
        ),
        Locale::En => format!(
            "[System Start]\nName: {name}\nLevel: {level}, Grade {grade}\nSubject: {subject}\nGoal: {goal}\n\n\
             INSTRUCTION: Stay for the ENTIRE session in the role that fits this level. \
             Adapt your answers and questions strictly to {level} grade {grade}."
        ),
    }
}

fn enum_tags(locale: Locale) -> (Vec<&'static str>, Vec<&'static str>) {
    match locale {
        Locale::Nl => (
            vec!["FEIT", "INTERPRETATIE", "SPECULATIE", "ONBEKEND"],
            vec![
                "ANALYTISCH",
                "REFLECTIEF",
                "SYSTEMISCH",
                "PRAGMATISCH",
                "CREATIEF",
                "NORMATIEF",
                "ONBEKEND",
            ],
        ),
        Locale::En => (
            vec!["FACT", "INTERPRETATION", "SPECULATION", "UNKNOWN"],
            vec![
                "ANALYTIC",
                "REFLECTIVE",
                "SYSTEMIC",
                "PRAGMATIC",
                "CREATIVE",
                "NORMATIVE",
                "UNKNOWN",
            ],
        ),
    }
}

/// JSON-mode response schema: chat text plus the turn analysis.
pub fn response_schema(locale: Locale) -> Value {
    let (epistemic, cognitive) = enum_tags(locale);
    let band_list = |description: &str| {
        json!({
            "type": "ARRAY",
            "items": { "type": "STRING" },
            "description": description,
        })
    };
    let nullable_string = || json!({ "type": "STRING", "nullable": true });

    json!({
        "type": "OBJECT",
        "properties": {
            "conversational_response": {
                "type": "STRING",
                "description": "The direct response to the user acting as the Learning Coach.",
            },
            "analysis": {
                "type": "OBJECT",
                "description": "The EAI architectural analysis of the current turn.",
                "properties": {
                    "process_phases": band_list("The detected Process Phases (P0-P5)."),
                    "coregulation_bands": band_list("The Co-regulation Bands (C0-C5) detected."),
                    "task_densities": band_list("The Task Density Bands (TD0-TD5)."),
                    "secondary_dimensions": band_list("Any other detected bands from the SSOT (V, T, E, L)."),
                    "active_fix": {
                        "type": "STRING",
                        "nullable": true,
                        "description": "The command id of the fix applied, or 'NONE'.",
                    },
                    "reasoning": {
                        "type": "STRING",
                        "description": "Why this band and fix were chosen, citing the recognized learner_obs.",
                    },
                    "current_profile": {
                        "type": "OBJECT",
                        "properties": {
                            "name": nullable_string(),
                            "subject": nullable_string(),
                            "level": nullable_string(),
                            "grade": nullable_string(),
                        },
                    },
                    "task_density_balance": {
                        "type": "NUMBER",
                        "description": "0 (AI generates everything) to 100 (learner generates everything).",
                    },
                    "epistemic_status": { "type": "STRING", "enum": epistemic },
                    "cognitive_mode": { "type": "STRING", "enum": cognitive },
                },
                "required": [
                    "process_phases",
                    "coregulation_bands",
                    "task_densities",
                    "secondary_dimensions",
                    "reasoning",
                    "current_profile",
                    "task_density_balance",
                    "epistemic_status",
                    "cognitive_mode",
                ],
            },
        },
        "required": ["conversational_response", "analysis"],
    })
}

#[cfg(test)]
mod tests {
    use eai_core::{LearnerProfile, Locale};

    use super::{response_schema, start_message, system_instruction};

    #[test]
    fn system_instruction_ends_with_catalog_document() {
        let instruction = system_instruction(Locale::En);
        assert!(instruction.starts_with("You are the \"EAI Learning Coach\""));
        let (_, catalog) = instruction.split_once("CONTEXT (SSOT):\n").unwrap();
        let doc: serde_json::Value = serde_json::from_str(catalog).unwrap();
        assert_eq!(doc["version"], "12.4.0");
    }

    #[test]
    fn start_message_carries_profile_and_goal() {
        let profile = LearnerProfile {
            name: Some("Anna".to_string()),
            level: Some("VWO".to_string()),
            grade: Some("4".to_string()),
            subject: None,
        };
        let nl = start_message(Locale::Nl, &profile, " Ik wil breuken snappen ");
        assert!(nl.starts_with("[Systeem Start]\nNaam: Anna\nNiveau: VWO, Leerjaar 4\nVak: -\n"));
        assert!(nl.contains("Doel: Ik wil breuken snappen\n"));
        assert!(nl.ends_with("strikt aan op VWO leerjaar 4."));

        let en = start_message(Locale::En, &profile, "fractions");
        assert!(en.contains("Goal: fractions"));
    }

    #[test]
    fn schema_uses_locale_enum_tags() {
        let nl = response_schema(Locale::Nl);
        let tags = &nl["properties"]["analysis"]["properties"]["epistemic_status"]["enum"];
        assert_eq!(tags[0], "FEIT");

        let en = response_schema(Locale::En);
        let modes = &en["properties"]["analysis"]["properties"]["cognitive_mode"]["enum"];
        assert_eq!(modes[6], "UNKNOWN");
    }
}
