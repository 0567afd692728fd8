//! # Message Processor
//!
//! Runs one received message through decode, filter, dispatch and
//! acknowledgment, and records the outcome.
//!
//! Every stage returns a typed outcome rather than an error, so a bad
//! message can never abort the rest of its batch. Delete is only reachable
//! through a confirmed dispatch or an explicit `discard` rejection policy.

use super::acknowledger::{AckOutcome, Acknowledger};
use super::dispatcher::{DispatchFailure, DispatchOutcome, Dispatcher};
use crate::clock::Clock;
use crate::config::{RejectionAction, RejectionPolicyConfig};
use crate::ingest::{decode, Rejection, TelemetryFilter};
use crate::logging::log_message_outcome;
use crate::messaging::TelemetryMessage;
use std::sync::Arc;

/// What happened to one message
#[derive(Debug)]
pub enum MessageOutcome {
    /// Execution confirmed; `ack` says whether the delete went through
    Dispatched {
        dispatch: DispatchOutcome,
        ack: AckOutcome,
    },
    /// Decode or filter rejection; `ack` reflects the rejection policy
    Rejected { rejection: Rejection, ack: AckOutcome },
    /// Workflow service did not confirm the execution; message retained
    DispatchFailed(DispatchFailure),
}

impl MessageOutcome {
    pub fn ack(&self) -> Option<&AckOutcome> {
        match self {
            MessageOutcome::Dispatched { ack, .. } | MessageOutcome::Rejected { ack, .. } => {
                Some(ack)
            }
            MessageOutcome::DispatchFailed(_) => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.ack(), Some(AckOutcome::Deleted))
    }
}

pub struct MessageProcessor {
    filter: TelemetryFilter,
    dispatcher: Dispatcher,
    acknowledger: Acknowledger,
    rejection_policy: RejectionPolicyConfig,
    clock: Arc<dyn Clock>,
}

impl MessageProcessor {
    pub fn new(
        filter: TelemetryFilter,
        dispatcher: Dispatcher,
        acknowledger: Acknowledger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            filter,
            dispatcher,
            acknowledger,
            rejection_policy: RejectionPolicyConfig::default(),
            clock,
        }
    }

    pub fn with_rejection_policy(mut self, policy: RejectionPolicyConfig) -> Self {
        self.rejection_policy = policy;
        self
    }

    pub async fn process(&self, message: &TelemetryMessage) -> MessageOutcome {
        let (outcome, device_id) = self.evaluate(message).await;
        log_message_outcome(message, device_id.as_deref(), &outcome);
        outcome
    }

    async fn evaluate(&self, message: &TelemetryMessage) -> (MessageOutcome, Option<String>) {
        let record = match decode(&message.body) {
            Ok(record) => record,
            Err(reason) => return (self.reject(message, reason.into()).await, None),
        };
        let device_id = record.device_id.clone();

        let accepted = match self.filter.evaluate(record, self.clock.now()) {
            Ok(accepted) => accepted,
            Err(reason) => return (self.reject(message, reason.into()).await, Some(device_id)),
        };

        let outcome = match self.dispatcher.dispatch(accepted, &message.id).await {
            Ok(dispatch) => MessageOutcome::Dispatched {
                ack: self.acknowledger.acknowledge(message).await,
                dispatch,
            },
            Err(failure) => MessageOutcome::DispatchFailed(failure),
        };
        (outcome, Some(device_id))
    }

    async fn reject(&self, message: &TelemetryMessage, rejection: Rejection) -> MessageOutcome {
        let ack = match self.rejection_policy.action_for(rejection.kind()) {
            RejectionAction::Retain => AckOutcome::Retained,
            RejectionAction::Discard => self.acknowledger.acknowledge(message).await,
        };
        MessageOutcome::Rejected { rejection, ack }
    }
}
