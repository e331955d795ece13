//! Scripted user sessions: the orderables and concepts the backend serves,
//! existing drug drafts, and the interactions to replay.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use order_core::{FormEvent, LabEntryForm};
use serde::Deserialize;
use shared::domain::{
    CategoryId, ConceptCatalog, ConceptId, DraftKind, DraftOrderEntry, OrderableCategory,
};
use tracing::warn;

use crate::backend_bridge::runtime::BackendFixtures;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub reject_submissions: Option<String>,
    #[serde(default)]
    pub orderables: Vec<OrderableCategory>,
    #[serde(default)]
    pub catalogs: Vec<ConceptCatalog>,
    #[serde(default)]
    pub drug_drafts: Vec<DraftOrderEntry>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    TogglePanel {
        id: ConceptId,
    },
    ToggleTest {
        id: ConceptId,
    },
    SwitchCategory {
        id: CategoryId,
    },
    Discard {
        #[serde(default)]
        id: Option<ConceptId>,
        #[serde(default)]
        kind: Option<DraftKind>,
    },
    ToggleUrgency {
        id: ConceptId,
        kind: DraftKind,
    },
    Submit,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid scenario '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn fixtures(&self) -> BackendFixtures {
        BackendFixtures {
            catalogs: self.catalogs.clone(),
            drug_orders: self.drug_drafts.clone(),
            reject_submissions: self.reject_submissions.clone(),
        }
    }
}

impl Step {
    /// Resolves the step against what the form currently shows. Steps naming
    /// something the form cannot see resolve to `None`.
    pub fn to_event(&self, form: &LabEntryForm) -> Option<FormEvent> {
        let event = match self {
            Step::TogglePanel { id } => form
                .catalog()
                .and_then(|catalog| catalog.panel(id))
                .cloned()
                .map(FormEvent::TogglePanel),
            Step::ToggleTest { id } => form
                .catalog()
                .and_then(|catalog| {
                    catalog.test(id).cloned().or_else(|| {
                        catalog
                            .panels
                            .iter()
                            .flat_map(|panel| panel.members.iter())
                            .find(|test| &test.id == id)
                            .cloned()
                    })
                })
                .map(FormEvent::ToggleTest),
            Step::SwitchCategory { id } => form
                .orderables()
                .iter()
                .find(|orderable| &orderable.id == id)
                .map(|orderable| FormEvent::SwitchCategory {
                    category_id: orderable.id.clone(),
                    display_name: orderable.display_name.clone(),
                }),
            Step::Discard { id: None, .. } => Some(FormEvent::Discard(None)),
            Step::Discard { id: Some(id), kind } => {
                find_draft(form, id, *kind).map(|entry| FormEvent::Discard(Some(entry)))
            }
            Step::ToggleUrgency { id, kind } => {
                find_draft(form, id, Some(*kind)).map(FormEvent::ToggleUrgency)
            }
            Step::Submit => Some(FormEvent::Submit),
        };

        if event.is_none() {
            warn!(step = ?self, "scenario step does not match anything on the form; skipping");
        }
        event
    }
}

fn find_draft(
    form: &LabEntryForm,
    id: &ConceptId,
    kind: Option<DraftKind>,
) -> Option<DraftOrderEntry> {
    form.all_draft_orders()
        .into_iter()
        .find(|entry| &entry.id == id && kind.map_or(true, |k| entry.kind == k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_core::FormOptions;
    use shared::domain::PatientId;

    const DEMO: &str = include_str!("../demos/hematology_session.toml");

    #[test]
    fn parses_demo_session() {
        let scenario = Scenario::parse(DEMO).expect("demo scenario");
        assert_eq!(scenario.orderables.len(), 2);
        assert_eq!(scenario.catalogs[0].panels[0].members.len(), 3);
        assert_eq!(scenario.drug_drafts[0].kind, DraftKind::Drug);
        assert_eq!(
            scenario.steps[0],
            Step::TogglePanel {
                id: ConceptId::from("cbc-panel")
            }
        );
        assert!(scenario.steps.contains(&Step::Submit));
    }

    #[test]
    fn category_switch_carries_the_display_name() {
        let scenario = Scenario::parse(DEMO).expect("demo scenario");
        let options = FormOptions::new(PatientId::from("patient-1"), "custom:(uuid)");
        let (form, _) = LabEntryForm::new(scenario.orderables.clone(), options).expect("form");
        assert_eq!(form.active_category().1, "HEME");

        let step = Step::SwitchCategory {
            id: CategoryId::from("hematology"),
        };
        assert_eq!(
            step.to_event(&form),
            Some(FormEvent::SwitchCategory {
                category_id: CategoryId::from("hematology"),
                display_name: "Hematology".to_string(),
            })
        );
    }

    #[test]
    fn discard_step_without_id_targets_everything() {
        let scenario = Scenario::parse(
            r#"
[[steps]]
action = "discard"
"#,
        )
        .expect("scenario");
        assert_eq!(
            scenario.steps,
            vec![Step::Discard {
                id: None,
                kind: None
            }]
        );
    }

    #[test]
    fn rejects_unknown_actions() {
        let err = Scenario::parse(
            r#"
[[steps]]
action = "dance"
"#,
        );
        assert!(err.is_err());
    }
}
