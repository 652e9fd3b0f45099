//! Participation state machine.
//!
//! Every function here is pure: it reads an [`OutingSnapshot`] taken under
//! the outing's lock and returns the value to hand back to the caller plus
//! the [`ChangeSet`] to commit. Rejections leave the snapshot untouched, so
//! an illegal transition never writes anything.

use chrono::{DateTime, Utc};
use tracing::debug;

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{ParticipationId, UserId};
use outinghub_database::store::{ChangeSet, OutingSnapshot};
use outinghub_entity::outing::{NewOuting, Outing, OutingPatch, OutingStatus};
use outinghub_entity::participation::{ParticipationRequest, ParticipationStatus};

use super::ledger;
use super::{OutingChangeOutcome, OutingChangeReason, SubmitRequest};
use crate::notification::formatter;

/// A planned transition: the caller-facing result and the writes.
pub type Plan<T> = (T, ChangeSet);

/// Validate the data of a new outing.
pub fn validate_new_outing(new: &NewOuting) -> AppResult<()> {
    if new.title.trim().is_empty() {
        return Err(AppError::invalid_input("Outing title must not be blank"));
    }
    if new.capacity < 1 {
        return Err(AppError::invalid_input("Outing capacity must be at least 1"));
    }
    if new.questions.iter().any(|q| q.trim().is_empty()) {
        return Err(AppError::invalid_input("Outing questions must not be blank"));
    }
    Ok(())
}

/// Plan a new `Pending` request.
pub fn plan_submit(
    snapshot: &OutingSnapshot,
    cmd: &SubmitRequest,
    now: DateTime<Utc>,
) -> AppResult<Plan<ParticipationRequest>> {
    let outing = &snapshot.outing;

    if cmd.places < 1 {
        return Err(AppError::invalid_input("At least one place must be requested"));
    }
    if outing.is_owned_by(cmd.requester_id) {
        return Err(AppError::forbidden("The organizer cannot request to join their own outing"));
    }
    if !outing.status.is_open() {
        return Err(AppError::closed(format!("Outing {} is {}", outing.id, outing.status)));
    }
    if let Some(live) = snapshot.live_request_of(cmd.requester_id) {
        return Err(AppError::conflict(format!(
            "Request {} is still {} for this outing",
            live.id, live.status
        )));
    }
    if cmd.answers.len() != outing.question_arity() {
        return Err(AppError::invalid_input(format!(
            "Expected {} answers, got {}",
            outing.question_arity(),
            cmd.answers.len()
        )));
    }
    if cmd.places > outing.capacity {
        return Err(AppError::invalid_input(format!(
            "{} places requested for an outing of {}",
            cmd.places, outing.capacity
        )));
    }

    let request = ParticipationRequest::pending(
        outing.id,
        cmd.requester_id,
        cmd.places,
        cmd.answers.clone(),
        now,
    );
    let changes = ChangeSet {
        inserted: vec![request.clone()],
        intents: vec![formatter::participation_requested(outing, &request)],
        ..ChangeSet::default()
    };
    Ok((request, changes))
}

/// Find a request of the locked outing and check the actor owns the outing.
fn owner_decision<'a>(
    snapshot: &'a OutingSnapshot,
    request_id: ParticipationId,
    actor_id: UserId,
) -> AppResult<&'a ParticipationRequest> {
    let request = snapshot
        .request(request_id)
        .ok_or_else(|| AppError::not_found(format!("Participation request {request_id} not found")))?;
    if request.status != ParticipationStatus::Pending {
        return Err(AppError::invalid_state(format!(
            "Request {request_id} is {}, only pending requests can be decided",
            request.status
        )));
    }
    if !snapshot.outing.is_owned_by(actor_id) {
        return Err(AppError::forbidden("Only the organizer can decide on requests"));
    }
    Ok(request)
}

/// Plan `Pending -> Accepted`, checking capacity against the locked ledger.
pub fn plan_accept(
    snapshot: &OutingSnapshot,
    request_id: ParticipationId,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> AppResult<Plan<ParticipationRequest>> {
    let outing = &snapshot.outing;
    let request = owner_decision(snapshot, request_id, actor_id)?;

    if !outing.status.is_open() {
        return Err(AppError::closed(format!("Outing {} is {}", outing.id, outing.status)));
    }

    let remaining = ledger::remaining_capacity(outing, &snapshot.requests)?;
    if remaining < i64::from(request.places) {
        debug!(
            outing_id = %outing.id,
            request_id = %request_id,
            remaining,
            places = request.places,
            "Accept rejected for capacity"
        );
        return Err(AppError::capacity_exceeded(format!(
            "{} places requested, {remaining} remaining",
            request.places
        )));
    }

    let accepted = request.with_status(ParticipationStatus::Accepted, now);
    let changes = ChangeSet {
        updated: vec![accepted.clone()],
        intents: vec![formatter::participation_accepted(outing, &accepted)],
        ..ChangeSet::default()
    };
    Ok((accepted, changes))
}

/// Plan `Pending -> Refused`.
pub fn plan_refuse(
    snapshot: &OutingSnapshot,
    request_id: ParticipationId,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> AppResult<Plan<ParticipationRequest>> {
    let request = owner_decision(snapshot, request_id, actor_id)?;

    let refused = request.with_status(ParticipationStatus::Refused, now);
    let changes = ChangeSet {
        updated: vec![refused.clone()],
        intents: vec![formatter::participation_refused(&snapshot.outing, &refused)],
        ..ChangeSet::default()
    };
    Ok((refused, changes))
}

/// Plan a requester withdrawal from `Pending` or `Accepted`.
///
/// Places held by an accepted request are released by the same commit.
pub fn plan_cancel(
    snapshot: &OutingSnapshot,
    request_id: ParticipationId,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> AppResult<Plan<ParticipationRequest>> {
    let request = snapshot
        .request(request_id)
        .ok_or_else(|| AppError::not_found(format!("Participation request {request_id} not found")))?;
    if request.requester_id != actor_id {
        return Err(AppError::forbidden("Only the requester can cancel a request"));
    }
    if !request.status.can_transition_to(ParticipationStatus::Cancelled) {
        return Err(AppError::invalid_state(format!(
            "Request {request_id} is {} and cannot be cancelled",
            request.status
        )));
    }

    let mut cancelled = request.with_status(ParticipationStatus::Cancelled, now);
    cancelled.cancelled_by = Some(actor_id);
    let changes = ChangeSet {
        updated: vec![cancelled.clone()],
        intents: vec![formatter::participation_cancelled(&snapshot.outing, &cancelled)],
        ..ChangeSet::default()
    };
    Ok((cancelled, changes))
}

/// Plan the owner moving the outing to `Closed` or `Cancelled`, cascading
/// every live request to `Cancelled` with one notification per requester.
///
/// Asking for the status the outing already has is a successful no-op.
pub fn plan_outing_change(
    snapshot: &OutingSnapshot,
    actor_id: UserId,
    new_status: OutingStatus,
    reason: Option<OutingChangeReason>,
    now: DateTime<Utc>,
) -> AppResult<Plan<OutingChangeOutcome>> {
    let outing = &snapshot.outing;

    if !outing.is_owned_by(actor_id) {
        return Err(AppError::forbidden("Only the organizer can change the outing status"));
    }
    if new_status == OutingStatus::Open {
        return Err(AppError::invalid_input("An outing cannot be reopened"));
    }
    if outing.status == new_status {
        return Ok((
            OutingChangeOutcome {
                outing: outing.clone(),
                affected: Vec::new(),
                changed: false,
            },
            ChangeSet::default(),
        ));
    }
    if !outing.status.can_transition_to(new_status) {
        return Err(AppError::invalid_state(format!(
            "Outing {} cannot move from {} to {new_status}",
            outing.id, outing.status
        )));
    }

    let reason = reason.unwrap_or_else(|| OutingChangeReason::default_for(new_status));
    let mut next = outing.clone();
    next.status = new_status;
    next.updated_at = now;

    let mut changes = ChangeSet {
        outing: Some(next.clone()),
        ..ChangeSet::default()
    };
    for request in snapshot.requests.iter().filter(|r| r.status.is_live()) {
        let mut cancelled = request.with_status(ParticipationStatus::Cancelled, now);
        cancelled.cancelled_by = Some(actor_id);
        changes
            .intents
            .push(formatter::outing_changed(&next, request.requester_id, reason.kind()));
        changes.updated.push(cancelled);
    }

    let outcome = OutingChangeOutcome {
        outing: next,
        affected: changes.updated.clone(),
        changed: true,
    };
    Ok((outcome, changes))
}

/// Plan an edit of an open outing.
///
/// Capacity is frozen once any request is accepted. Accepted requesters
/// are told about the edit.
pub fn plan_update(
    snapshot: &OutingSnapshot,
    actor_id: UserId,
    patch: &OutingPatch,
    now: DateTime<Utc>,
) -> AppResult<Plan<Outing>> {
    let outing = &snapshot.outing;

    if !outing.is_owned_by(actor_id) {
        return Err(AppError::forbidden("Only the organizer can edit the outing"));
    }
    if !outing.status.is_open() {
        return Err(AppError::closed(format!("Outing {} is {}", outing.id, outing.status)));
    }
    if patch.is_empty() {
        return Ok((outing.clone(), ChangeSet::default()));
    }

    let mut next = outing.clone();
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::invalid_input("Outing title must not be blank"));
        }
        next.title = title.clone();
    }
    if let Some(description) = &patch.description {
        next.description = Some(description.clone());
    }
    if let Some(capacity) = patch.capacity {
        if capacity < 1 {
            return Err(AppError::invalid_input("Outing capacity must be at least 1"));
        }
        if capacity != outing.capacity && ledger::accepted_places(outing.id, &snapshot.requests) > 0 {
            return Err(AppError::invalid_state(
                "Capacity cannot change once a request has been accepted",
            ));
        }
        next.capacity = capacity;
    }
    next.updated_at = now;

    let intents = snapshot
        .with_status(ParticipationStatus::Accepted)
        .map(|r| formatter::outing_changed(&next, r.requester_id, OutingChangeReason::Updated.kind()))
        .collect();
    let changes = ChangeSet {
        outing: Some(next.clone()),
        intents,
        ..ChangeSet::default()
    };
    Ok((next, changes))
}
