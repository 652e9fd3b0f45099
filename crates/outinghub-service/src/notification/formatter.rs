//! Builds the notification event for each transition.

use serde_json::json;

use outinghub_core::types::id::UserId;
use outinghub_entity::notification::{NotificationEvent, NotificationKind, SubjectRef};
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::ParticipationRequest;

fn places_label(places: i32) -> String {
    if places == 1 {
        "1 place".to_string()
    } else {
        format!("{places} places")
    }
}

fn participation_metadata(outing: &Outing, request: &ParticipationRequest) -> serde_json::Value {
    json!({
        "outingId": outing.id,
        "outingTitle": outing.title,
        "participationId": request.id,
        "places": request.places,
    })
}

/// Sent to the owner when a request is submitted.
pub fn participation_requested(outing: &Outing, request: &ParticipationRequest) -> NotificationEvent {
    NotificationEvent {
        recipient_id: outing.owner_id,
        sender_id: Some(request.requester_id),
        kind: NotificationKind::ParticipationRequested,
        subject: SubjectRef::participation(request.id),
        title: "New participation request".to_string(),
        body: format!(
            "A participant asked for {} in \"{}\".",
            places_label(request.places),
            outing.title
        ),
        metadata: Some(participation_metadata(outing, request)),
    }
}

/// Sent to the requester when the owner accepts.
pub fn participation_accepted(outing: &Outing, request: &ParticipationRequest) -> NotificationEvent {
    NotificationEvent {
        recipient_id: request.requester_id,
        sender_id: Some(outing.owner_id),
        kind: NotificationKind::ParticipationAccepted,
        subject: SubjectRef::participation(request.id),
        title: "Participation accepted".to_string(),
        body: format!(
            "Your request for {} in \"{}\" was accepted.",
            places_label(request.places),
            outing.title
        ),
        metadata: Some(participation_metadata(outing, request)),
    }
}

/// Sent to the requester when the owner refuses.
pub fn participation_refused(outing: &Outing, request: &ParticipationRequest) -> NotificationEvent {
    NotificationEvent {
        recipient_id: request.requester_id,
        sender_id: Some(outing.owner_id),
        kind: NotificationKind::ParticipationRefused,
        subject: SubjectRef::participation(request.id),
        title: "Participation refused".to_string(),
        body: format!("Your request to join \"{}\" was refused.", outing.title),
        metadata: Some(participation_metadata(outing, request)),
    }
}

/// Sent to the owner when a requester withdraws.
pub fn participation_cancelled(outing: &Outing, request: &ParticipationRequest) -> NotificationEvent {
    NotificationEvent {
        recipient_id: outing.owner_id,
        sender_id: Some(request.requester_id),
        kind: NotificationKind::ParticipationCancelled,
        subject: SubjectRef::participation(request.id),
        title: "Participation cancelled".to_string(),
        body: format!(
            "A participant withdrew from \"{}\" ({} released).",
            outing.title,
            places_label(request.places)
        ),
        metadata: Some(participation_metadata(outing, request)),
    }
}

/// Sent to an affected requester when the outing itself changes.
///
/// `kind` is one of the `Sortie*` kinds.
pub fn outing_changed(outing: &Outing, recipient_id: UserId, kind: NotificationKind) -> NotificationEvent {
    let (title, body) = match kind {
        NotificationKind::SortieCancelled => (
            "Outing cancelled",
            format!("\"{}\" has been cancelled by its organizer.", outing.title),
        ),
        NotificationKind::SortieDeleted => (
            "Outing deleted",
            format!("\"{}\" has been removed by its organizer.", outing.title),
        ),
        _ => (
            "Outing updated",
            format!("\"{}\" has been modified by its organizer.", outing.title),
        ),
    };

    NotificationEvent {
        recipient_id,
        sender_id: Some(outing.owner_id),
        kind,
        subject: SubjectRef::outing(outing.id),
        title: title.to_string(),
        body,
        metadata: Some(json!({
            "outingId": outing.id,
            "outingTitle": outing.title,
            "status": outing.status,
        })),
    }
}
