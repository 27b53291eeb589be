//! The streaming gateway: one logical "analyze" operation that absorbs
//! upstream cold starts.
//!
//! The gateway runs a sequential attempt loop against the upstream and
//! narrates its progress as [`StreamEvent`]s on an unbounded channel. The
//! channel's receiving half is owned by the HTTP layer; when the client
//! disconnects the receiver is dropped, the next send fails, and the loop
//! stops instead of holding upstream resources through further retries.
//!
//! Event grammar per request: `status(connecting)`, then per wake-up cycle a
//! `status(waking)` / `status(retrying)` pair, then either `status(done)`
//! followed by `result`, or a single terminal `error`.

use tokio::sync::mpsc;

use kc_core::{AnalyzeRequest, ErrorEvent, ResultEvent, StatusEvent, StatusPhase, StreamEvent};

use crate::schedule::RetrySchedule;
use crate::upstream::{AttemptOutcome, ChatCompletions};
use crate::{GatewayError, GatewayResult};

/// Where gateway progress and the terminal event are written.
pub type EventSink = mpsc::UnboundedSender<StreamEvent>;

const CONNECTING_MESSAGE: &str = "Connecting to MedGemma...";
const DONE_MESSAGE: &str = "Got your results! Preparing your explanation...";

/// Validate an analyze request before any streaming begins.
///
/// # Errors
///
/// Returns [`GatewayError::EmptyPrompt`] for a missing or whitespace-only
/// prompt. Invalid requests must never reach the upstream.
pub fn validate_request(request: &AnalyzeRequest) -> GatewayResult<()> {
    if request.prompt.trim().is_empty() {
        return Err(GatewayError::EmptyPrompt);
    }
    Ok(())
}

/// The streaming inference gateway.
pub struct Gateway<C> {
    client: C,
    schedule: RetrySchedule,
}

impl<C: ChatCompletions> Gateway<C> {
    pub fn new(client: C, schedule: RetrySchedule) -> Self {
        Self { client, schedule }
    }

    /// Run one analyze request to its terminal event.
    ///
    /// All outcomes, including failures, are reported on `events`; the
    /// return value only signals whether the receiver went away mid-run.
    pub async fn run(&self, request: &AnalyzeRequest, events: &EventSink) {
        if send(events, connecting_status()).is_err() {
            return;
        }

        let max_retries = self.schedule.max_retries();
        for attempt in 0..=max_retries {
            match self.client.complete(request).await {
                Ok(AttemptOutcome::Completed(text)) => {
                    let _ = send(events, done_status())
                        .and_then(|_| send(events, StreamEvent::Result(ResultEvent { result: text })));
                    return;
                }
                Ok(AttemptOutcome::Unavailable { body }) => {
                    let Some(delay) = self.schedule.delay(attempt) else {
                        // Schedule exhausted: the last attempt also got a 503.
                        tracing::warn!(attempts = attempt + 1, "upstream never woke up");
                        let _ = send(events, error_event(&GatewayError::Exhausted));
                        return;
                    };
                    tracing::info!(
                        attempt = attempt + 1,
                        max_attempts = self.schedule.max_attempts(),
                        retry_in_secs = delay.as_secs(),
                        body = %body,
                        "upstream endpoint waking up, retrying"
                    );
                    if send(events, waking_status(&self.schedule, attempt)).is_err() {
                        return;
                    }
                    tokio::time::sleep(delay).await;
                    if send(events, retrying_status(&self.schedule, attempt)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracing::error!("upstream call failed: {err}");
                    let _ = send(events, error_event(&err));
                    return;
                }
            }
        }
    }
}

fn send(
    events: &EventSink,
    event: StreamEvent,
) -> Result<(), mpsc::error::SendError<StreamEvent>> {
    events.send(event)
}

fn connecting_status() -> StreamEvent {
    StreamEvent::Status(StatusEvent {
        message: CONNECTING_MESSAGE.to_string(),
        phase: StatusPhase::Connecting,
        attempt: None,
        max_attempts: None,
        retry_sec: None,
    })
}

fn done_status() -> StreamEvent {
    StreamEvent::Status(StatusEvent {
        message: DONE_MESSAGE.to_string(),
        phase: StatusPhase::Done,
        attempt: None,
        max_attempts: None,
        retry_sec: None,
    })
}

fn waking_status(schedule: &RetrySchedule, attempt: usize) -> StreamEvent {
    let delay = schedule.delay(attempt).unwrap_or_default();
    StreamEvent::Status(StatusEvent {
        message: schedule.wake_message(attempt).to_string(),
        phase: StatusPhase::Waking,
        attempt: Some(attempt as u32 + 1),
        max_attempts: Some(schedule.max_attempts()),
        retry_sec: Some(delay.as_secs()),
    })
}

fn retrying_status(schedule: &RetrySchedule, attempt: usize) -> StreamEvent {
    StreamEvent::Status(StatusEvent {
        message: format!(
            "Trying again (attempt {} of {})...",
            attempt + 2,
            schedule.max_attempts()
        ),
        phase: StatusPhase::Retrying,
        attempt: Some(attempt as u32 + 2),
        max_attempts: Some(schedule.max_attempts()),
        retry_sec: None,
    })
}

fn error_event(err: &GatewayError) -> StreamEvent {
    let details = match err {
        GatewayError::Upstream { body, .. } | GatewayError::Speech { body, .. } => {
            (!body.is_empty()).then(|| body.clone())
        }
        _ => None,
    };
    StreamEvent::Error(ErrorEvent {
        error: err.to_string(),
        details,
    })
}
