use super::*;
use crate::registry::{apply, DraftOrderRegistry, InMemoryDraftRegistry};
use chrono::{TimeZone, Utc};
use shared::{
    domain::{ConceptId, ConceptName, ConceptNameType},
    error::{ErrorCode, SubmissionError},
    protocol::{LoadConcepts, SubmissionResult},
};

const REP: &str = "custom:(uuid,display,setMembers)";

fn orderables() -> Vec<OrderableCategory> {
    vec![
        OrderableCategory::new("catA", "Hematology"),
        OrderableCategory::new("catB", "Chemistry"),
    ]
}

fn t(id: &str) -> ConceptTest {
    ConceptTest::new(id, format!("Test {id}"))
}

fn p1() -> ConceptPanel {
    ConceptPanel::new("p1", "Panel One", vec![t("t1"), t("t2")])
}

fn catalog_a() -> ConceptCatalog {
    ConceptCatalog {
        category_id: CategoryId::from("catA"),
        panels: vec![p1()],
        tests: vec![t("t1"), t("t2"), t("t3")],
    }
}

fn form() -> LabEntryForm {
    let options = FormOptions::new(PatientId::from("patient-1"), REP);
    let (mut form, _) = LabEntryForm::new(orderables(), options).expect("form");
    form.handle(FormEvent::ConceptsLoaded(catalog_a()));
    form
}

/// Applies draft commands to the store and feeds the new store state back.
fn run(
    form: &mut LabEntryForm,
    registry: &mut InMemoryDraftRegistry,
    event: FormEvent,
) -> Vec<FormCommand> {
    let commands = form.handle(event);
    for cmd in &commands {
        if let FormCommand::Draft(draft_cmd) = cmd {
            apply(registry, draft_cmd);
        }
    }
    form.handle(FormEvent::DraftChanged(registry.state()));
    commands
}

#[test]
fn construction_requires_orderables() {
    let options = FormOptions::new(PatientId::from("patient-1"), REP);
    let err = LabEntryForm::new(Vec::new(), options).err();
    assert_eq!(err, Some(InitializationError::NoOrderables));
}

#[test]
fn construction_loads_first_category() {
    let options = FormOptions::new(PatientId::from("patient-1"), REP);
    let (form, commands) = LabEntryForm::new(orderables(), options).expect("form");
    assert_eq!(
        commands,
        vec![FormCommand::LoadConcepts(LoadConcepts {
            category_id: CategoryId::from("catA"),
            representation: REP.to_string(),
        })]
    );
    assert_eq!(form.active_category().1, "Hematology");
    assert!(form.snapshot().is_empty());
}

#[test]
fn panel_selection_scenario() {
    let mut form = form();
    let mut registry = InMemoryDraftRegistry::new();

    let commands = run(&mut form, &mut registry, FormEvent::TogglePanel(p1()));
    assert_eq!(commands, vec![FormCommand::Draft(DraftCommand::AddPanel(p1()))]);
    assert!(form.snapshot().is_panel_selected(&ConceptId::from("p1")));
    assert!(form.snapshot().is_panel_owned(&ConceptId::from("t1")));
    assert!(form.snapshot().is_panel_owned(&ConceptId::from("t2")));

    assert!(form.handle(FormEvent::ToggleTest(t("t1"))).is_empty());

    let commands = run(&mut form, &mut registry, FormEvent::ToggleTest(t("t3")));
    assert_eq!(commands, vec![FormCommand::Draft(DraftCommand::AddTest(t("t3")))]);

    let commands = run(&mut form, &mut registry, FormEvent::ToggleTest(t("t3")));
    assert_eq!(commands, vec![FormCommand::Draft(DraftCommand::RemoveTest(t("t3")))]);
}

#[test]
fn deselecting_panel_releases_member_tests() {
    let mut form = form();
    let mut registry = InMemoryDraftRegistry::new();

    run(&mut form, &mut registry, FormEvent::TogglePanel(p1()));
    let commands = run(&mut form, &mut registry, FormEvent::TogglePanel(p1()));

    assert_eq!(commands, vec![FormCommand::Draft(DraftCommand::RemovePanel(p1()))]);
    assert!(form.snapshot().is_empty());
    assert_eq!(
        form.handle(FormEvent::ToggleTest(t("t1"))),
        vec![FormCommand::Draft(DraftCommand::AddTest(t("t1")))]
    );
}

#[test]
fn category_switch_loads_once_and_drops_stale_concepts() {
    let mut form = form();
    let switch = FormEvent::SwitchCategory {
        category_id: CategoryId::from("catB"),
        display_name: "Chemistry".to_string(),
    };

    assert_eq!(form.handle(switch.clone()).len(), 1);
    assert!(form.handle(switch).is_empty());
    assert!(form.catalog().is_none());

    form.handle(FormEvent::ConceptsLoaded(catalog_a()));
    assert!(form.catalog().is_none());
    assert!(form.field_set().panels.is_empty());
}

#[test]
fn unknown_category_switch_is_ignored() {
    let mut form = form();
    let commands = form.handle(FormEvent::SwitchCategory {
        category_id: CategoryId::from("nope"),
        display_name: "Nope".to_string(),
    });
    assert!(commands.is_empty());
    assert_eq!(form.active_category().0, &CategoryId::from("catA"));
}

#[test]
fn panels_from_another_category_are_not_selected() {
    let mut form = form();
    let foreign = ConceptPanel::new("px", "Foreign", vec![t("t9")]);
    form.handle(FormEvent::DraftChanged(DraftState {
        lab_orders: vec![DraftOrderEntry::panel(&foreign)],
        selected_panels: vec![foreign.clone()],
        default_tests: foreign.members.clone(),
    }));

    assert!(form.snapshot().selected_panel_ids().is_empty());
    assert!(form.snapshot().is_panel_owned(&ConceptId::from("t9")));
}

#[test]
fn field_set_marks_locked_and_checked_tests() {
    let mut form = form();
    let mut registry = InMemoryDraftRegistry::new();
    run(&mut form, &mut registry, FormEvent::TogglePanel(p1()));
    run(&mut form, &mut registry, FormEvent::ToggleTest(t("t3")));

    let view = form.field_set();
    assert_eq!(view.category_name, "Hematology");
    assert!(view.panels[0].selected);
    let rows: Vec<(&str, bool, bool)> = view
        .tests
        .iter()
        .map(|row| (row.test.id.as_str(), row.checked, row.locked))
        .collect();
    assert_eq!(
        rows,
        vec![("t1", true, true), ("t2", true, true), ("t3", true, false)]
    );
}

#[test]
fn discard_and_urgency_route_to_draft_commands() {
    let mut form = form();
    let entry = DraftOrderEntry::single(&t("t3"));

    assert_eq!(
        form.handle(FormEvent::Discard(None)),
        vec![FormCommand::Draft(DraftCommand::DeleteAllDraftLabOrders)]
    );
    assert_eq!(
        form.handle(FormEvent::Discard(Some(entry.clone()))),
        vec![FormCommand::Draft(DraftCommand::RemoveTest(ConceptTest::new(
            "t3", "Test t3"
        )))]
    );
    assert_eq!(
        form.handle(FormEvent::ToggleUrgency(entry.clone())),
        vec![FormCommand::Draft(DraftCommand::ToggleUrgency(entry))]
    );
    assert!(form
        .handle(FormEvent::ToggleUrgency(DraftOrderEntry::drug("asp", "Aspirin")))
        .is_empty());
}

#[test]
fn submit_then_success_resets_once() {
    let mut form = form();
    let mut registry = InMemoryDraftRegistry::new();
    assert!(form.handle(FormEvent::Submit).is_empty());

    run(&mut form, &mut registry, FormEvent::ToggleTest(t("t3")));
    form.handle(FormEvent::DrugDraftsChanged(vec![DraftOrderEntry::drug(
        "asp", "Aspirin",
    )]));
    assert!(!form.can_return());
    assert_eq!(form.draft_list().discard_label, "Discard All");

    let submitted = form.handle(FormEvent::Submit);
    assert!(matches!(
        submitted.as_slice(),
        [FormCommand::SubmitOrders { attempt: 1, orders, .. }] if orders.len() == 2
    ));
    assert_eq!(form.submission_phase(), SubmissionPhase::Pending);

    let outcome = OutcomeSignal::succeeded(
        1,
        SubmissionResult {
            order_ids: Vec::new(),
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
        },
    );
    let names: Vec<&str> = form
        .handle(FormEvent::OutcomeChanged(outcome.clone()))
        .iter()
        .map(FormCommand::name)
        .collect();
    assert_eq!(
        names,
        vec!["notify_success", "refresh_order_list", "reset_selected_order"]
    );
    assert!(form.handle(FormEvent::OutcomeChanged(outcome)).is_empty());
    assert_eq!(form.submission_phase(), SubmissionPhase::Idle);
}

#[test]
fn failed_submission_notifies_error() {
    let mut form = form();
    form.handle(FormEvent::DrugDraftsChanged(vec![DraftOrderEntry::drug(
        "asp", "Aspirin",
    )]));
    form.handle(FormEvent::Submit);

    let err = SubmissionError::new(ErrorCode::Internal, "order service unavailable");
    assert_eq!(
        form.handle(FormEvent::OutcomeChanged(OutcomeSignal::failed(1, &err))),
        vec![FormCommand::NotifyError(
            "order service unavailable".to_string()
        )]
    );
    assert_eq!(form.submission_phase(), SubmissionPhase::Idle);
}

#[test]
fn leaving_a_category_drops_its_panels_until_concepts_arrive() {
    let mut form = form();
    let mut registry = InMemoryDraftRegistry::new();
    run(&mut form, &mut registry, FormEvent::TogglePanel(p1()));

    form.handle(FormEvent::SwitchCategory {
        category_id: CategoryId::from("catB"),
        display_name: "Chemistry".to_string(),
    });
    assert!(form.snapshot().selected_panel_ids().is_empty());
    assert!(form.snapshot().is_panel_owned(&ConceptId::from("t1")));

    form.handle(FormEvent::DraftChanged(registry.state()));
    assert!(form.snapshot().selected_panel_ids().is_empty());

    form.handle(FormEvent::SwitchCategory {
        category_id: CategoryId::from("catA"),
        display_name: "Hematology".to_string(),
    });
    form.handle(FormEvent::ConceptsLoaded(catalog_a()));
    assert!(form.snapshot().is_panel_selected(&ConceptId::from("p1")));
}

#[test]
fn undelivered_submit_returns_the_form_to_idle() {
    let mut form = form();
    form.handle(FormEvent::DrugDraftsChanged(vec![DraftOrderEntry::drug(
        "asp", "Aspirin",
    )]));
    assert_eq!(form.handle(FormEvent::Submit).len(), 1);
    assert!(form.handle(FormEvent::Submit).is_empty());

    let commands = form.handle(FormEvent::SubmitDispatchFailed {
        attempt: 1,
        reason: "UI command queue is full; please retry".to_string(),
    });
    assert_eq!(
        commands,
        vec![FormCommand::NotifyError(
            "UI command queue is full; please retry".to_string()
        )]
    );
    assert_eq!(form.submission_phase(), SubmissionPhase::Idle);
    assert!(matches!(
        form.handle(FormEvent::Submit).as_slice(),
        [FormCommand::SubmitOrders { attempt: 2, .. }]
    ));
}

#[test]
fn rows_are_labelled_with_locale_short_names() {
    let options = FormOptions {
        locale: "fr".to_string(),
        ..FormOptions::new(PatientId::from("patient-1"), REP)
    };
    let (mut form, _) = LabEntryForm::new(orderables(), options).expect("form");
    let short = |name: &str| ConceptName {
        name: name.to_string(),
        kind: ConceptNameType::Short,
        locale: "fr".to_string(),
    };
    let mut catalog = catalog_a();
    catalog.panels[0].names = vec![short("P-UN")];
    catalog.tests[2].names = vec![short("T-TROIS")];
    form.handle(FormEvent::ConceptsLoaded(catalog));

    let view = form.field_set();
    assert_eq!(view.panels[0].label, "P-UN");
    let labels: Vec<&str> = view.tests.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["Test t1", "Test t2", "T-TROIS"]);
}
