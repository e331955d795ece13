//! One-shot side effects for order submission outcomes.

use serde::Serialize;
use shared::{
    domain::{DraftOrderEntry, PatientId},
    protocol::{FormCommand, OutcomeSignal},
};
use tracing::{debug, info, warn};

pub const DEFAULT_ORDER_CREATED_MESSAGE: &str = "Order Successfully Created";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Succeeded,
    Failed,
}

/// A new successful result: `added` is set and the outcome belongs to a
/// different attempt, or carries a different result, than before.
fn is_new_success(previous: &OutcomeSignal, current: &OutcomeSignal) -> bool {
    current.added && (current.attempt != previous.attempt || current.result != previous.result)
}

fn is_new_error(previous: &OutcomeSignal, current: &OutcomeSignal) -> bool {
    current.error
        && (!previous.error
            || current.attempt != previous.attempt
            || current.error_message != previous.error_message)
}

/// Commands for an outcome transition. Success emits notify, refresh and
/// reset in that order; an error emits one notification. Both fire when both
/// flags are set. A re-published outcome emits nothing.
pub fn on_outcome_changed(
    previous: &OutcomeSignal,
    current: &OutcomeSignal,
    patient_id: &PatientId,
    success_message: &str,
) -> Vec<FormCommand> {
    let mut commands = Vec::new();

    if is_new_success(previous, current) {
        commands.push(FormCommand::NotifySuccess(success_message.to_string()));
        commands.push(FormCommand::RefreshOrderList {
            filter: None,
            patient_id: patient_id.clone(),
        });
        commands.push(FormCommand::ResetSelectedOrder);
    }
    if is_new_error(previous, current) {
        commands.push(FormCommand::NotifyError(current.error_message.clone()));
    }

    commands
}

/// Tracks the last observed outcome and the submission cycle
/// (`Idle -> Pending -> Idle`).
#[derive(Debug)]
pub struct SubmissionFlowController {
    patient_id: PatientId,
    success_message: String,
    last_signal: OutcomeSignal,
    phase: SubmissionPhase,
    next_attempt: u64,
    last_outcome: Option<SubmissionOutcome>,
}

impl SubmissionFlowController {
    pub fn new(patient_id: PatientId, success_message: impl Into<String>) -> Self {
        Self {
            patient_id,
            success_message: success_message.into(),
            last_signal: OutcomeSignal::default(),
            phase: SubmissionPhase::Idle,
            next_attempt: 1,
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<SubmissionOutcome> {
        self.last_outcome
    }

    /// Starts a submission of the combined draft. Nothing is submitted while
    /// another submission is pending or when the draft is empty.
    pub fn begin_submission(&mut self, orders: Vec<DraftOrderEntry>) -> Option<FormCommand> {
        if self.phase == SubmissionPhase::Pending {
            warn!("submission already pending; ignoring");
            return None;
        }
        if orders.is_empty() {
            debug!("nothing to submit");
            return None;
        }

        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.phase = SubmissionPhase::Pending;
        info!(attempt, orders = orders.len(), "submitting draft orders");
        Some(FormCommand::SubmitOrders {
            attempt,
            patient_id: self.patient_id.clone(),
            orders,
        })
    }

    /// The submit command for `attempt` never reached the order service.
    /// Returns to `Idle` so the user can retry; a superseded attempt is
    /// ignored.
    pub fn abandon(&mut self, attempt: u64, reason: &str) -> Vec<FormCommand> {
        let current = self.next_attempt - 1;
        if self.phase != SubmissionPhase::Pending || attempt != current {
            debug!(attempt, current, "ignoring failure of a superseded submission");
            return Vec::new();
        }
        warn!(attempt, reason, "order submission was not delivered");
        self.phase = SubmissionPhase::Idle;
        self.last_outcome = Some(SubmissionOutcome::Failed);
        vec![FormCommand::NotifyError(reason.to_string())]
    }

    /// Feeds the latest published outcome and returns the one-shot commands
    /// it triggers.
    pub fn observe(&mut self, current: OutcomeSignal) -> Vec<FormCommand> {
        let commands = on_outcome_changed(
            &self.last_signal,
            &current,
            &self.patient_id,
            &self.success_message,
        );

        if is_new_success(&self.last_signal, &current) {
            info!(attempt = current.attempt, "order submission succeeded");
            self.last_outcome = Some(SubmissionOutcome::Succeeded);
            self.phase = SubmissionPhase::Idle;
        } else if is_new_error(&self.last_signal, &current) {
            warn!(
                attempt = current.attempt,
                error = %current.error_message,
                "order submission failed"
            );
            self.last_outcome = Some(SubmissionOutcome::Failed);
            self.phase = SubmissionPhase::Idle;
        }
        if current.attempt >= self.next_attempt {
            self.next_attempt = current.attempt + 1;
        }

        self.last_signal = current;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::{
        error::{ErrorCode, SubmissionError},
        protocol::SubmissionResult,
    };

    fn patient() -> PatientId {
        PatientId::from("patient-1")
    }

    fn result() -> SubmissionResult {
        SubmissionResult {
            order_ids: vec![uuid::Uuid::nil()],
            submitted_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        }
    }

    fn success_commands() -> Vec<FormCommand> {
        vec![
            FormCommand::NotifySuccess(DEFAULT_ORDER_CREATED_MESSAGE.to_string()),
            FormCommand::RefreshOrderList {
                filter: None,
                patient_id: patient(),
            },
            FormCommand::ResetSelectedOrder,
        ]
    }

    #[test]
    fn success_fires_exactly_once() {
        let mut flow = SubmissionFlowController::new(patient(), DEFAULT_ORDER_CREATED_MESSAGE);
        let succeeded = OutcomeSignal::succeeded(1, result());

        assert!(flow.observe(OutcomeSignal::default()).is_empty());
        assert_eq!(flow.observe(succeeded.clone()), success_commands());
        assert!(flow.observe(succeeded).is_empty());
        assert_eq!(flow.last_outcome(), Some(SubmissionOutcome::Succeeded));
    }

    #[test]
    fn error_notifies_once_per_attempt() {
        let mut flow = SubmissionFlowController::new(patient(), DEFAULT_ORDER_CREATED_MESSAGE);
        let err = SubmissionError::new(ErrorCode::Validation, "encounter missing");

        assert_eq!(
            flow.observe(OutcomeSignal::failed(1, &err)),
            vec![FormCommand::NotifyError("encounter missing".to_string())]
        );
        assert!(flow.observe(OutcomeSignal::failed(1, &err)).is_empty());
        assert_eq!(
            flow.observe(OutcomeSignal::failed(2, &err)),
            vec![FormCommand::NotifyError("encounter missing".to_string())]
        );
        assert_eq!(flow.last_outcome(), Some(SubmissionOutcome::Failed));
    }

    #[test]
    fn simultaneous_flags_fire_success_then_error() {
        let mut current = OutcomeSignal::succeeded(3, result());
        current.error = true;
        current.error_message = "partial failure".into();

        let mut expected = success_commands();
        expected.push(FormCommand::NotifyError("partial failure".to_string()));
        assert_eq!(
            on_outcome_changed(
                &OutcomeSignal::default(),
                &current,
                &patient(),
                DEFAULT_ORDER_CREATED_MESSAGE
            ),
            expected
        );
    }

    #[test]
    fn submission_cycle_moves_through_pending() {
        let mut flow = SubmissionFlowController::new(patient(), DEFAULT_ORDER_CREATED_MESSAGE);
        assert_eq!(flow.begin_submission(Vec::new()), None);

        let orders = vec![DraftOrderEntry::drug("d1", "Aspirin")];
        let cmd = flow.begin_submission(orders.clone()).expect("submit");
        assert_eq!(
            cmd,
            FormCommand::SubmitOrders {
                attempt: 1,
                patient_id: patient(),
                orders: orders.clone(),
            }
        );
        assert_eq!(flow.phase(), SubmissionPhase::Pending);
        assert_eq!(flow.begin_submission(orders.clone()), None);

        flow.observe(OutcomeSignal::succeeded(1, result()));
        assert_eq!(flow.phase(), SubmissionPhase::Idle);

        let next = flow.begin_submission(orders).expect("second submit");
        assert!(matches!(next, FormCommand::SubmitOrders { attempt: 2, .. }));
    }

    #[test]
    fn undelivered_submission_can_be_retried() {
        let mut flow = SubmissionFlowController::new(patient(), DEFAULT_ORDER_CREATED_MESSAGE);
        let orders = vec![DraftOrderEntry::drug("d1", "Aspirin")];
        flow.begin_submission(orders.clone()).expect("submit");

        assert!(flow.abandon(7, "queue full").is_empty());
        assert_eq!(flow.phase(), SubmissionPhase::Pending);

        assert_eq!(
            flow.abandon(1, "queue full"),
            vec![FormCommand::NotifyError("queue full".to_string())]
        );
        assert_eq!(flow.phase(), SubmissionPhase::Idle);
        assert_eq!(flow.last_outcome(), Some(SubmissionOutcome::Failed));
        assert!(flow.abandon(1, "queue full").is_empty());

        let retry = flow.begin_submission(orders).expect("retry");
        assert!(matches!(retry, FormCommand::SubmitOrders { attempt: 2, .. }));
    }
}
