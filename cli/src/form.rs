//! Terminal form driver: one-shot and interactive submissions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Both modes own a single [`FormSession`]. The interactive loop is one task
//! that `select!`s between stdin lines and finished requests; each request
//! runs on its own spawned task and reports back over an mpsc channel with
//! its ticket, so the session's ordering policy decides which completion
//! is displayed.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use std::io::Write;
use std::sync::Arc;

use recommend::{FormSession, RecommendationResult, RequestFailure, Resolution, SubmitRejected, Ticket};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::render;
use crate::transport::{RecommendApi, Route};

/// Line that ends an interactive session.
pub const QUIT_COMMAND: &str = ":quit";

/// Submit the session's current query, write the loading view to
/// `progress`, and wait for the outcome.
///
/// # Errors
///
/// Returns [`SubmitRejected`] if the form would not submit; no request is made.
pub async fn submit_once<W: Write>(
    session: &mut FormSession,
    api: &dyn RecommendApi,
    route: Route,
    progress: &mut W,
    color: bool,
) -> Result<Resolution, SubmitRejected> {
    let submission = session.submit()?;
    tracing::debug!(ticket = %submission.ticket, ?route, "submitting");
    if let Err(e) = print_view(progress, session, color) {
        tracing::warn!(error = %e, "failed to write progress view");
    }
    let outcome = api.send(route, &submission.request).await;
    Ok(session.resolve(submission.ticket, outcome))
}

/// Options for [`run_interactive`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractiveOptions {
    /// Accept new lines while a request is in flight instead of treating the
    /// submit control as disabled.
    pub allow_overlap: bool,
    /// Apply terminal colours to rendered output.
    pub color: bool,
}

type Completion = (Ticket, Result<RecommendationResult, RequestFailure>);

/// Run the prompt loop until `:quit` or end of input, then drain in-flight
/// requests and return the final session.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn run_interactive<R, W>(
    input: R,
    out: &mut W,
    api: Arc<dyn RecommendApi>,
    mut session: FormSession,
    options: InteractiveOptions,
) -> std::io::Result<FormSession>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut lines = input.lines();
    let mut input_open = true;
    let mut in_flight = 0_usize;

    writeln!(out, "Enter a job description per line ({QUIT_COMMAND} to exit).")?;

    while input_open || in_flight > 0 {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                if line.trim() == QUIT_COMMAND {
                    input_open = false;
                    continue;
                }
                if session.is_loading() && !options.allow_overlap {
                    writeln!(out, "A request is already in flight; wait for it to finish.")?;
                    continue;
                }
                session.set_query(line);
                match session.submit() {
                    Ok(submission) => {
                        in_flight += 1;
                        tracing::debug!(ticket = %submission.ticket, in_flight, "submitting");
                        let api = Arc::clone(&api);
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let outcome = api.send(Route::Query, &submission.request).await;
                            let _ = tx.send((submission.ticket, outcome));
                        });
                        print_view(out, &session, options.color)?;
                    }
                    Err(rejected) => writeln!(out, "{rejected}")?,
                }
            }
            Some((ticket, outcome)) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                match session.resolve(ticket, outcome) {
                    Resolution::Applied => print_view(out, &session, options.color)?,
                    Resolution::Stale => tracing::debug!(%ticket, "discarding superseded response"),
                }
            }
        }
    }

    Ok(session)
}

/// Write the current form view, followed by a blank separator line.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn print_view<W: Write>(out: &mut W, session: &FormSession, color: bool) -> std::io::Result<()> {
    let style = if color { render::Style::COLOR } else { render::Style::PLAIN };
    writeln!(out, "{}", render::render_view(&session.view(), style))
}
