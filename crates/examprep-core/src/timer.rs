//! Exam countdown.
//!
//! The countdown is a spawned task that calls [`ExamSession::tick`] once per
//! period. The session owns a [`CancelToken`] for the task and fires it when
//! it finishes, so the task stops instead of ticking a finished exam.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::session::ExamSession;

/// Countdown granularity.
pub const TICK: Duration = Duration::from_secs(1);

/// Held by the session; firing or dropping it stops the countdown.
#[derive(Debug)]
pub struct CancelToken(oneshot::Sender<()>);

impl CancelToken {
    pub fn cancel(self) {
        // The task may already be gone.
        let _ = self.0.send(());
    }
}

/// Held by the countdown task.
#[derive(Debug)]
pub struct Cancelled(oneshot::Receiver<()>);

impl Cancelled {
    /// Resolves once the token is fired or dropped.
    pub async fn wait(&mut self) {
        let _ = (&mut self.0).await;
    }
}

/// A connected token/signal pair.
pub fn cancellation() -> (CancelToken, Cancelled) {
    let (tx, rx) = oneshot::channel();
    (CancelToken(tx), Cancelled(rx))
}

/// Start the exam and spawn its countdown, ticking every `period`.
///
/// Returns `None` if the exam is already finished or its lock is poisoned.
/// The task ends when the session finishes, whether by running out of time or
/// by an explicit [`ExamSession::finish`].
pub fn spawn_countdown(session: Arc<Mutex<ExamSession>>, period: Duration) -> Option<JoinHandle<()>> {
    let mut cancelled = {
        let mut guard = session.lock().ok()?;
        guard.start();
        guard.arm_timer()?
    };

    Some(tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                biased;
                _ = cancelled.wait() => break,
                _ = interval.tick() => {
                    if !tick(&session) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("countdown stopped");
    }))
}

fn tick(session: &Mutex<ExamSession>) -> bool {
    match session.lock() {
        Ok(mut guard) => {
            guard.tick();
            true
        }
        Err(_) => {
            tracing::error!("exam session lock poisoned, stopping countdown");
            false
        }
    }
}

/// Format seconds as `HH:MM:SS`.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
