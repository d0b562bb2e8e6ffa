//! Applies backend events to the session shown by the UI.

use client_core::Session;

use crate::controller::events::UiEvent;

pub fn apply_event(session: &mut Session, status: &mut String, event: UiEvent) {
    match event {
        UiEvent::Progress(progress) => session.advance(progress),
        UiEvent::Finished(outcome) => {
            status.clear();
            session.complete(outcome);
        }
        UiEvent::BackendUnavailable(reason) => {
            tracing::error!("{reason}");
            *status = reason;
        }
    }
}
