//! Status state machines for every workflow entity.
//!
//! Each status enum carries its database string form and an explicit
//! allowed-transition table. Handlers never compare raw strings; they
//! parse the stored value and call [`Transition::check`] before writing.
//!
//! Variant order is the kanban column order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Behaviour shared by all status enums.
pub trait Transition: Copy + Eq + fmt::Display + FromStr<Err = CoreError> + 'static {
    /// Entity name used in error messages and audit rows.
    const ENTITY: &'static str;

    /// All variants in display order.
    fn all() -> &'static [Self];

    /// Statuses reachable from `self` in one step.
    fn allowed_next(self) -> &'static [Self];

    /// Database string form.
    fn as_str(self) -> &'static str;

    /// Whether no further transitions exist.
    fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Reject illegal transitions with [`CoreError::InvalidTransition`].
    fn check(self, next: Self) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

macro_rules! define_status {
    (
        $(#[$meta:meta])*
        $name:ident ($entity:literal) {
            $( $variant:ident = $text:literal => [$($next:ident),* $(,)?] ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant ),+
        }

        impl Transition for $name {
            const ENTITY: &'static str = $entity;

            fn all() -> &'static [Self] {
                &[$( $name::$variant ),+]
            }

            fn allowed_next(self) -> &'static [Self] {
                match self {
                    $( $name::$variant => &[$( $name::$next ),*] ),+
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} status '{other}'",
                        $entity
                    ))),
                }
            }
        }
    };
}

define_status! {
    /// Campaign lifecycle.
    CampaignStatus ("campaign") {
        Draft = "draft" => [Open, Archived],
        Open = "open" => [Closed],
        Closed = "closed" => [Open, Archived],
        Archived = "archived" => [],
    }
}

define_status! {
    /// A creator's bid on a campaign.
    ApplicationStatus ("application") {
        Submitted = "submitted" => [Approved, Rejected],
        Approved = "approved" => [],
        Rejected = "rejected" => [],
    }
}

define_status! {
    /// One deliverable per creator per campaign.
    TaskStatus ("task") {
        Selected = "selected" => [InProduction],
        InProduction = "in_production" => [Uploaded],
        Uploaded = "uploaded" => [NeedsEdits, Approved, Disputed],
        NeedsEdits = "needs_edits" => [Uploaded, Disputed],
        Approved = "approved" => [Paid, Disputed],
        Paid = "paid" => [],
        Disputed = "disputed" => [Approved, NeedsEdits],
    }
}

define_status! {
    /// Payout for an approved task.
    PaymentStatus ("payment") {
        Pending = "pending" => [Paid, Failed],
        Paid = "paid" => [],
        Failed = "failed" => [Pending],
    }
}

define_status! {
    /// A creator's request for physical product.
    ShipmentRequestStatus ("shipment_request") {
        Pending = "pending" => [Approved, Rejected],
        Approved = "approved" => [],
        Rejected = "rejected" => [],
    }
}

define_status! {
    /// Fulfilment of an approved shipment request.
    ShipmentStatus ("shipment") {
        Preparing = "preparing" => [Shipped, Lost],
        Shipped = "shipped" => [Delivered, Lost],
        Delivered = "delivered" => [],
        Lost = "lost" => [],
    }
}

define_status! {
    /// Dispute raised against a task.
    DisputeStatus ("dispute") {
        Open = "open" => [UnderReview, Resolved, Rejected],
        UnderReview = "under_review" => [Resolved, Rejected],
        Resolved = "resolved" => [],
        Rejected = "rejected" => [],
    }
}

impl TaskStatus {
    /// Transitions a creator may perform on their own task.
    pub fn creator_may_set(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Selected, TaskStatus::InProduction)
                | (TaskStatus::InProduction, TaskStatus::Uploaded)
                | (TaskStatus::NeedsEdits, TaskStatus::Uploaded)
        )
    }

    /// Statuses that can only be reached through another entity
    /// (a payment or a dispute) and never through the task endpoint.
    pub fn is_derived(self) -> bool {
        matches!(self, TaskStatus::Paid | TaskStatus::Disputed)
    }

    /// Whether an upload should advance the task to `uploaded`.
    pub fn accepts_upload(self) -> bool {
        matches!(self, TaskStatus::InProduction | TaskStatus::NeedsEdits)
    }
}

impl DisputeStatus {
    /// Task status applied when the dispute reaches `self`.
    pub fn task_outcome(self) -> Option<TaskStatus> {
        match self {
            DisputeStatus::Resolved => Some(TaskStatus::Approved),
            DisputeStatus::Rejected => Some(TaskStatus::NeedsEdits),
            DisputeStatus::Open | DisputeStatus::UnderReview => None,
        }
    }
}

/// Parse a stored status string, mapping unknown values to an internal
/// error (the database CHECK constraint should make this unreachable).
pub fn parse_stored<S: Transition>(raw: &str) -> Result<S, CoreError> {
    raw.parse::<S>()
        .map_err(|_| CoreError::Internal(format!("Corrupt {} status '{raw}'", S::ENTITY)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn task_happy_path_is_allowed() {
        let path = [
            TaskStatus::Selected,
            TaskStatus::InProduction,
            TaskStatus::Uploaded,
            TaskStatus::Approved,
            TaskStatus::Paid,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].check(pair[1]).is_ok(), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn task_cannot_skip_review() {
        let err = TaskStatus::InProduction
            .check(TaskStatus::Approved)
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition { entity: "task", ref from, ref to }
                if from == "in_production" && to == "approved"
        );
    }

    #[test]
    fn paid_task_is_terminal() {
        assert!(TaskStatus::Paid.is_terminal());
        for next in TaskStatus::all() {
            assert!(TaskStatus::Paid.check(*next).is_err());
        }
    }

    #[test]
    fn edit_loop_is_allowed() {
        assert!(TaskStatus::Uploaded.check(TaskStatus::NeedsEdits).is_ok());
        assert!(TaskStatus::NeedsEdits.check(TaskStatus::Uploaded).is_ok());
    }

    #[test]
    fn creator_transitions_are_a_subset_of_the_table() {
        for from in TaskStatus::all() {
            for to in TaskStatus::all() {
                if from.creator_may_set(*to) {
                    assert!(from.can_transition_to(*to), "{from} -> {to}");
                }
            }
        }
        assert!(!TaskStatus::Uploaded.creator_may_set(TaskStatus::Approved));
    }

    #[test]
    fn string_forms_round_trip() {
        for status in TaskStatus::all() {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
        for status in DisputeStatus::all() {
            assert_eq!(status.to_string().parse::<DisputeStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn unknown_string_is_validation_error() {
        assert_matches!("shipped".parse::<TaskStatus>(), Err(CoreError::Validation(_)));
        assert_matches!(parse_stored::<TaskStatus>("bogus"), Err(CoreError::Internal(_)));
    }

    #[test]
    fn campaign_can_reopen_but_not_unarchive() {
        assert!(CampaignStatus::Closed.check(CampaignStatus::Open).is_ok());
        assert!(CampaignStatus::Archived.check(CampaignStatus::Open).is_err());
        assert!(CampaignStatus::Open.check(CampaignStatus::Draft).is_err());
    }

    #[test]
    fn application_decisions_are_final() {
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Submitted.check(ApplicationStatus::Approved).is_ok());
    }

    #[test]
    fn failed_payment_can_be_retried() {
        assert!(PaymentStatus::Failed.check(PaymentStatus::Pending).is_ok());
        assert!(PaymentStatus::Paid.check(PaymentStatus::Pending).is_err());
    }

    #[test]
    fn dispute_outcomes_map_to_task_statuses() {
        assert_eq!(DisputeStatus::Resolved.task_outcome(), Some(TaskStatus::Approved));
        assert_eq!(DisputeStatus::Rejected.task_outcome(), Some(TaskStatus::NeedsEdits));
        assert_eq!(DisputeStatus::UnderReview.task_outcome(), None);
        for status in DisputeStatus::all() {
            if let Some(task) = status.task_outcome() {
                assert!(TaskStatus::Disputed.can_transition_to(task));
            }
        }
    }

    #[test]
    fn shipment_cannot_be_delivered_before_shipping() {
        assert!(ShipmentStatus::Preparing.check(ShipmentStatus::Delivered).is_err());
        assert!(ShipmentStatus::Shipped.check(ShipmentStatus::Delivered).is_ok());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::NeedsEdits).unwrap();
        assert_eq!(json, "\"needs_edits\"");
        let parsed: ShipmentRequestStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(parsed, ShipmentRequestStatus::Approved);
    }
}
