//! Maps a user toggle on a panel or standalone test to a draft mutation.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{ConceptPanel, ConceptTest, DraftOrderEntry},
    protocol::DraftCommand,
};

use crate::selection::SelectionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleKind {
    Panel,
    Single,
}

/// The item a toggle applies to. Panels and tests are toggled through the
/// same entry point and distinguished by [`ToggleKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleTarget {
    Panel(ConceptPanel),
    Test(ConceptTest),
}

impl ToggleTarget {
    pub fn kind(&self) -> ToggleKind {
        match self {
            ToggleTarget::Panel(_) => ToggleKind::Panel,
            ToggleTarget::Test(_) => ToggleKind::Single,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleCommand {
    AddPanel(ConceptPanel),
    RemovePanel(ConceptPanel),
    AddTest(ConceptTest),
    RemoveTest(ConceptTest),
    NoOp,
}

impl ToggleCommand {
    pub fn into_draft_command(self) -> Option<DraftCommand> {
        match self {
            ToggleCommand::AddPanel(panel) => Some(DraftCommand::AddPanel(panel)),
            ToggleCommand::RemovePanel(panel) => Some(DraftCommand::RemovePanel(panel)),
            ToggleCommand::AddTest(test) => Some(DraftCommand::AddTest(test)),
            ToggleCommand::RemoveTest(test) => Some(DraftCommand::RemoveTest(test)),
            ToggleCommand::NoOp => None,
        }
    }

    /// The command that undoes this one, as far as panel/test membership goes.
    pub fn inverse(&self) -> ToggleCommand {
        match self {
            ToggleCommand::AddPanel(panel) => ToggleCommand::RemovePanel(panel.clone()),
            ToggleCommand::RemovePanel(panel) => ToggleCommand::AddPanel(panel.clone()),
            ToggleCommand::AddTest(test) => ToggleCommand::RemoveTest(test.clone()),
            ToggleCommand::RemoveTest(test) => ToggleCommand::AddTest(test.clone()),
            ToggleCommand::NoOp => ToggleCommand::NoOp,
        }
    }
}

/// Decides the single draft mutation for a toggle.
///
/// Panels are a strict toggle on the snapshot. A standalone test that a
/// selected panel currently supplies is frozen (`NoOp`) until that panel is
/// deselected; otherwise the test is removed if any draft entry carries its
/// id and added if none does.
pub fn decide(
    target: &ToggleTarget,
    snapshot: &SelectionSnapshot,
    draft: &[DraftOrderEntry],
) -> ToggleCommand {
    match target {
        ToggleTarget::Panel(panel) => {
            if snapshot.is_panel_selected(&panel.id) {
                ToggleCommand::RemovePanel(panel.clone())
            } else {
                ToggleCommand::AddPanel(panel.clone())
            }
        }
        ToggleTarget::Test(test) => {
            if snapshot.is_panel_owned(&test.id) {
                return ToggleCommand::NoOp;
            }
            let in_draft = draft.iter().any(|entry| entry.id == test.id);
            if in_draft {
                ToggleCommand::RemoveTest(test.clone())
            } else {
                ToggleCommand::AddTest(test.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::reconcile;

    fn p1() -> ConceptPanel {
        ConceptPanel::new(
            "p1",
            "Complete Blood Count",
            vec![ConceptTest::new("t1", "Hemoglobin"), ConceptTest::new("t2", "Platelets")],
        )
    }

    #[test]
    fn panel_toggle_depends_only_on_snapshot() {
        let panel = p1();
        let empty = SelectionSnapshot::default();
        let selected = reconcile(&[panel.clone()], &panel.members);
        let draft = vec![DraftOrderEntry::panel(&panel)];

        assert_eq!(
            decide(&ToggleTarget::Panel(panel.clone()), &empty, &draft),
            ToggleCommand::AddPanel(panel.clone())
        );
        assert_eq!(
            decide(&ToggleTarget::Panel(panel.clone()), &selected, &[]),
            ToggleCommand::RemovePanel(panel)
        );
    }

    #[test]
    fn panel_owned_test_is_frozen() {
        let panel = p1();
        let snapshot = reconcile(&[panel.clone()], &panel.members);
        let t1 = ConceptTest::new("t1", "Hemoglobin");

        assert_eq!(
            decide(&ToggleTarget::Test(t1.clone()), &snapshot, &[]),
            ToggleCommand::NoOp
        );
        assert_eq!(
            decide(
                &ToggleTarget::Test(t1.clone()),
                &snapshot,
                &[DraftOrderEntry::single(&t1)]
            ),
            ToggleCommand::NoOp
        );
    }

    #[test]
    fn standalone_test_is_added_then_removed() {
        let snapshot = SelectionSnapshot::default();
        let t3 = ConceptTest::new("t3", "Sodium");
        let target = ToggleTarget::Test(t3.clone());

        assert_eq!(decide(&target, &snapshot, &[]), ToggleCommand::AddTest(t3.clone()));
        let draft = vec![DraftOrderEntry::single(&t3)];
        assert_eq!(decide(&target, &snapshot, &draft), ToggleCommand::RemoveTest(t3));
    }

    #[test]
    fn test_matches_draft_entries_of_any_kind() {
        let snapshot = SelectionSnapshot::default();
        let test = ConceptTest::new("shared-id", "Glucose");
        let draft = vec![DraftOrderEntry::drug("shared-id", "Glucose tablets")];

        assert_eq!(
            decide(&ToggleTarget::Test(test.clone()), &snapshot, &draft),
            ToggleCommand::RemoveTest(test)
        );
    }

    #[test]
    fn noop_has_no_draft_command() {
        assert_eq!(ToggleCommand::NoOp.into_draft_command(), None);
        assert_eq!(ToggleCommand::NoOp.inverse(), ToggleCommand::NoOp);
    }
}
