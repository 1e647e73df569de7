//! # Change Stream
//!
//! Server-sent events carrying every [`ChangeEvent`] published after the
//! client connects. `?topic=entries` or `?topic=options` narrows the feed.
//! A client that falls behind the bus capacity silently skips the events
//! it missed and should refetch.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use utoipa::{IntoParams, ToSchema};

use crate::events::{ChangeEvent, Topic};
use crate::state::AppState;

/// Query parameters of `GET /v1/events`.
#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// `entries` or `options`; absent means both.
    pub topic: Option<Topic>,
}

/// Build the change-stream router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/events", get(stream_events))
}

fn accepts(topic: Option<Topic>, event: &ChangeEvent) -> bool {
    topic.map_or(true, |t| event.topic() == t)
}

fn to_sse(event: &ChangeEvent) -> Option<Event> {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "failed to encode change event");
            None
        }
    }
}

/// GET /v1/events - Live change feed (text/event-stream).
#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Server-sent event stream of ChangeEvent payloads", content_type = "text/event-stream"),
    ),
    tag = "events"
)]
async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topic = query.topic;
    tracing::debug!(?topic, "change stream subscriber connected");

    let stream = BroadcastStream::new(state.bus.subscribe()).filter_map(move |msg| match msg {
        Ok(event) if accepts(topic, &event) => to_sse(&event).map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "change stream subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
