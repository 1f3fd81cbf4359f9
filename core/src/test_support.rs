use crate::catalog::RubricCatalog;
use crate::loader::parse_catalog;

pub(crate) const SAMPLE_CATALOG_JSON: &str = r#"{
  "version": "1.2.0",
  "metadata": {
    "system": "Sample Architecture",
    "cycle": { "order": ["P", "TD", "C", "V"], "loop": true }
  },
  "global_logic": {
    "cycle_priority": ["P", "TD", "C"],
    "secondary_check": ["V"]
  },
  "command_library": {
    "commands": {
      "/checkin": "Ask for the concrete goal.",
      "/meta": "Zoom out and reflect on the approach.",
      "/intro": "Activate prior knowledge.",
      "/keuze": "Offer routes A/B, learner chooses."
    }
  },
  "rubrics": [
    {
      "rubric_id": "P",
      "name": "Process phase",
      "bands": [
        { "band_id": "P1", "label": "Orientation", "fix": "Activate prior knowledge.", "fix_ref": "/intro" },
        { "band_id": "P2", "label": "Activating" }
      ]
    },
    {
      "rubric_id": "TD",
      "name": "Task density",
      "bands": [
        { "band_id": "TD1", "label": "Learner-dominant" },
        { "band_id": "TD2", "label": "Learner-led" }
      ]
    },
    {
      "rubric_id": "C",
      "name": "Co-regulation",
      "dimension": "control distribution",
      "bands": [
        {
          "band_id": "C1",
          "label": "AI monologue",
          "description": "AI runs the conversation.",
          "learner_obs": ["Waits passively."],
          "ai_obs": ["Starts on its own."],
          "didactic_principle": "Activating didactics",
          "fix": "Stop broadcasting.",
          "fix_ref": "/checkin"
        },
        { "band_id": "C2", "label": "AI-led", "fix_ref": "/keuze" },
        { "band_id": "C3", "label": "Shared start", "fix_ref": "/meta" }
      ]
    },
    {
      "rubric_id": "V",
      "name": "Skill potential",
      "bands": [
        { "band_id": "V1", "label": "Dependent" }
      ]
    }
  ]
}"#;

pub(crate) fn sample_catalog() -> RubricCatalog {
    parse_catalog(SAMPLE_CATALOG_JSON).expect("sample catalog should parse")
}
