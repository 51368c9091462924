use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::service::AnsweringService;
use crate::session::{SubmissionOutcome, SubmissionRequest};

/// Cancellation token of the submission currently in flight, keyed by the
/// session generation it was started in.
#[derive(Debug, Default)]
pub struct InFlight {
    current: Option<(u64, CancellationToken)>,
}

impl InFlight {
    pub fn start(&mut self, generation: u64) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some((previous, old)) = self.current.replace((generation, token.clone())) {
            tracing::debug!(previous, "replacing untracked in-flight submission");
            old.cancel();
        }
        token
    }

    /// Fires the token if it belongs to `generation`. Returns whether it did.
    pub fn cancel(&mut self, generation: u64) -> bool {
        match self.current.take() {
            Some((g, token)) if g == generation => {
                token.cancel();
                true
            }
            other => {
                self.current = other;
                false
            }
        }
    }

    /// Forgets the token once its submission has completed. Completions from
    /// other generations leave the current token alone.
    pub fn finish(&mut self, generation: u64) {
        if matches!(self.current, Some((g, _)) if g == generation) {
            self.current = None;
        }
    }

    #[cfg(test)]
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|(g, _)| *g)
    }
}

/// Runs one submission against the answering service. Always resolves to an
/// outcome, so the session gets exactly one completion per request.
pub async fn run_submission(
    service: Arc<dyn AnsweringService>,
    request: SubmissionRequest,
    cancel: CancellationToken,
) -> SubmissionOutcome {
    let call = service.answer(&request.file, &request.prompt);

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!(generation = request.generation, "submission cancelled");
            SubmissionOutcome::Cancelled
        }
        result = call => match result {
            Ok(answer) => {
                tracing::info!(generation = request.generation, "answer received");
                SubmissionOutcome::Answered(answer.text)
            }
            Err(e) => {
                tracing::error!(generation = request.generation, error = %e, "submission failed");
                SubmissionOutcome::Failed(e.to_string())
            }
        }
    }
}
