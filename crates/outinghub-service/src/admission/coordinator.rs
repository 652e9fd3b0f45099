//! Transition coordinator.
//!
//! Each operation is one unit of work: lock the outing, plan the transition
//! on the locked snapshot, commit the state change together with its
//! outbox intents, release. Intents are then delivered inline on a best
//! effort basis; whatever fails stays in the outbox for the drain worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use outinghub_core::config::AdmissionConfig;
use outinghub_core::error::{AppError, ErrorKind};
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{OutingId, ParticipationId, UserId};
use outinghub_database::store::{ChangeSet, OutingSnapshot, OutingStore};
use outinghub_entity::outing::{NewOuting, Outing, OutingPatch, OutingStatus};
use outinghub_entity::participation::ParticipationRequest;

use super::state_machine;
use super::{OutingChangeOutcome, OutingChangeReason, SubmitRequest};
use crate::outbox::OutboxDrain;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Runs every state transition of outings and participation requests.
#[derive(Clone)]
pub struct TransitionCoordinator {
    /// Outing store providing the per-outing lock.
    outings: Arc<dyn OutingStore>,
    /// Inline delivery of freshly committed intents.
    drain: Option<OutboxDrain>,
    /// Bound on waiting for an outing's lock.
    lock_timeout: Duration,
    /// Retry policy for retryable failures.
    retry: RetryPolicy,
}

impl TransitionCoordinator {
    /// Creates a new coordinator.
    pub fn new(outings: Arc<dyn OutingStore>, drain: Option<OutboxDrain>, config: &AdmissionConfig) -> Self {
        Self {
            outings,
            drain,
            lock_timeout: config.lock_timeout(),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Publish a new open outing.
    pub async fn create_outing(&self, new: NewOuting) -> AppResult<Outing> {
        state_machine::validate_new_outing(&new)?;
        let outing = Outing::open(new, Utc::now());
        retry_with_backoff(self.retry, "create_outing", || self.outings.create_outing(&outing)).await?;

        info!(
            outing_id = %outing.id,
            owner_id = %outing.owner_id,
            capacity = outing.capacity,
            "Outing created"
        );
        Ok(outing)
    }

    /// Edit an open outing's title, description or capacity.
    pub async fn update_outing(
        &self,
        outing_id: OutingId,
        actor_id: UserId,
        patch: OutingPatch,
    ) -> AppResult<Outing> {
        let outing = self
            .run_unit(outing_id, "update_outing", |snapshot, now| {
                state_machine::plan_update(snapshot, actor_id, &patch, now)
            })
            .await?;

        info!(outing_id = %outing_id, actor_id = %actor_id, "Outing updated");
        Ok(outing)
    }

    /// Submit a new participation request.
    pub async fn submit(&self, outing_id: OutingId, cmd: SubmitRequest) -> AppResult<ParticipationRequest> {
        if cmd.places < 1 {
            return Err(AppError::invalid_input("At least one place must be requested"));
        }

        let request = self
            .run_unit(outing_id, "submit", |snapshot, now| {
                state_machine::plan_submit(snapshot, &cmd, now)
            })
            .await?;

        info!(
            outing_id = %outing_id,
            request_id = %request.id,
            requester_id = %request.requester_id,
            places = request.places,
            "Participation requested"
        );
        Ok(request)
    }

    /// Accept a pending request if the outing still has room.
    pub async fn accept(&self, request_id: ParticipationId, actor_id: UserId) -> AppResult<ParticipationRequest> {
        let outing_id = self.outing_of(request_id).await?;
        let request = self
            .run_unit(outing_id, "accept", |snapshot, now| {
                state_machine::plan_accept(snapshot, request_id, actor_id, now)
            })
            .await?;

        info!(
            outing_id = %outing_id,
            request_id = %request_id,
            places = request.places,
            "Participation accepted"
        );
        Ok(request)
    }

    /// Refuse a pending request.
    pub async fn refuse(&self, request_id: ParticipationId, actor_id: UserId) -> AppResult<ParticipationRequest> {
        let outing_id = self.outing_of(request_id).await?;
        let request = self
            .run_unit(outing_id, "refuse", |snapshot, now| {
                state_machine::plan_refuse(snapshot, request_id, actor_id, now)
            })
            .await?;

        info!(outing_id = %outing_id, request_id = %request_id, "Participation refused");
        Ok(request)
    }

    /// Withdraw a pending or accepted request on behalf of its requester.
    pub async fn cancel(&self, request_id: ParticipationId, actor_id: UserId) -> AppResult<ParticipationRequest> {
        let outing_id = self.outing_of(request_id).await?;
        let request = self
            .run_unit(outing_id, "cancel", |snapshot, now| {
                state_machine::plan_cancel(snapshot, request_id, actor_id, now)
            })
            .await?;

        info!(
            outing_id = %outing_id,
            request_id = %request_id,
            released_places = request.places,
            "Participation cancelled by requester"
        );
        Ok(request)
    }

    /// Close or cancel an outing, cascading every live request to
    /// `Cancelled`.
    pub async fn change_outing_status(
        &self,
        outing_id: OutingId,
        actor_id: UserId,
        new_status: OutingStatus,
        reason: Option<OutingChangeReason>,
    ) -> AppResult<OutingChangeOutcome> {
        let outcome = self
            .run_unit(outing_id, "change_outing_status", |snapshot, now| {
                state_machine::plan_outing_change(snapshot, actor_id, new_status, reason, now)
            })
            .await?;

        if outcome.changed {
            info!(
                outing_id = %outing_id,
                status = %new_status,
                affected = outcome.affected.len(),
                "Outing status changed"
            );
        } else {
            info!(outing_id = %outing_id, status = %new_status, "Outing already in requested status");
        }
        Ok(outcome)
    }

    async fn outing_of(&self, request_id: ParticipationId) -> AppResult<OutingId> {
        retry_with_backoff(self.retry, "outing_of_request", || {
            self.outings.outing_of_request(request_id)
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("Participation request {request_id} not found")))
    }

    /// Lock, plan, commit, with bounded retries on retryable failures.
    ///
    /// The plan always runs against a snapshot read under the lock, so the
    /// capacity check and the write it guards can never be split by another
    /// writer of the same outing.
    ///
    /// A commit that reports `StorageFailure` may still have landed. Before
    /// planning again, the committed state is checked and a change set that
    /// is already in place counts as success; its intents are then left to
    /// the outbox worker.
    async fn run_unit<T, F>(&self, outing_id: OutingId, operation: &str, plan: F) -> AppResult<T>
    where
        F: Fn(&OutingSnapshot, DateTime<Utc>) -> AppResult<(T, ChangeSet)> + Send + Sync,
        T: Send,
    {
        let plan = &plan;
        let (value, written) = retry_with_backoff(self.retry, operation, || async move {
            let guard = self.outings.lock_outing(outing_id, self.lock_timeout).await?;
            // An Err here drops the guard, which rolls back.
            let (value, changes) = plan(guard.snapshot(), Utc::now())?;
            if changes.is_empty() {
                return Ok((value, Vec::new()));
            }
            let expected = changes.clone();
            match guard.commit(changes).await {
                Ok(written) => Ok((value, written)),
                Err(err) if err.kind == ErrorKind::StorageFailure => {
                    if self.commit_landed(outing_id, &expected).await {
                        warn!(
                            outing_id = %outing_id,
                            operation,
                            error = %err,
                            "Commit reported a failure but its changes are in place"
                        );
                        Ok((value, Vec::new()))
                    } else {
                        Err(err)
                    }
                }
                Err(err) => Err(err),
            }
        })
        .await?;

        if let (Some(drain), false) = (&self.drain, written.is_empty()) {
            let report = drain.deliver(&written).await;
            if report.failed > 0 {
                warn!(
                    outing_id = %outing_id,
                    operation,
                    failed = report.failed,
                    "Inline notification delivery failed, left for the outbox worker"
                );
            }
        }

        Ok(value)
    }

    async fn commit_landed(&self, outing_id: OutingId, expected: &ChangeSet) -> bool {
        match self.outings.read_snapshot(outing_id).await {
            Ok(Some(current)) => expected.is_reflected_in(&current),
            Ok(None) => false,
            Err(err) => {
                warn!(outing_id = %outing_id, error = %err, "Could not verify commit outcome");
                false
            }
        }
    }
}
