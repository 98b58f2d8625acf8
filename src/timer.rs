//! Cancellable delayed callbacks.
//!
//! A scheduled callback is a future that only starts running once its delay
//! has elapsed. Cancelling aborts the pending sleep; a callback that has
//! already started is detached from its token and runs to completion, so it
//! must re-check the state it acts on.

use std::{future::Future, time::Duration};

use serde::Serialize;
use tokio::task::AbortHandle;

/// Handle to a pending callback
#[derive(Debug)]
pub struct TimerToken {
    handle: AbortHandle,
}

impl TimerToken {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Run `callback` after `delay` unless cancelled first
pub fn schedule<F>(delay: Duration, callback: F) -> TimerToken
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Detach so that cancelling from inside the callback cannot abort it
        tokio::spawn(callback);
    });
    TimerToken {
        handle: task.abort_handle(),
    }
}

pub fn cancel(token: TimerToken) {
    token.cancel();
}

/// Timers a round can have outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    ClueReminder,
    GuessWarning,
    GuessTimeout,
    /// Pause between a resolved round and the next one
    NextRound,
}

/// Outstanding timers for one game
#[derive(Debug, Default)]
pub struct RoundTimers {
    clue_reminder: Option<TimerToken>,
    guess_warning: Option<TimerToken>,
    guess_timeout: Option<TimerToken>,
    next_round: Option<TimerToken>,
}

impl RoundTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerToken> {
        match kind {
            TimerKind::ClueReminder => &mut self.clue_reminder,
            TimerKind::GuessWarning => &mut self.guess_warning,
            TimerKind::GuessTimeout => &mut self.guess_timeout,
            TimerKind::NextRound => &mut self.next_round,
        }
    }

    /// Store a new token, cancelling whatever was armed for the same kind
    pub fn arm(&mut self, kind: TimerKind, token: TimerToken) {
        if let Some(previous) = self.slot(kind).replace(token) {
            previous.cancel();
        }
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(token) = self.slot(kind).take() {
            token.cancel();
        }
    }

    /// Forget a token whose callback has fired
    pub fn clear(&mut self, kind: TimerKind) {
        self.slot(kind).take();
    }

    pub fn cancel_all(&mut self) {
        self.cancel(TimerKind::ClueReminder);
        self.cancel(TimerKind::GuessWarning);
        self.cancel(TimerKind::GuessTimeout);
        self.cancel(TimerKind::NextRound);
    }

    pub fn armed(&self) -> Vec<TimerKind> {
        [
            (TimerKind::ClueReminder, &self.clue_reminder),
            (TimerKind::GuessWarning, &self.guess_warning),
            (TimerKind::GuessTimeout, &self.guess_timeout),
            (TimerKind::NextRound, &self.next_round),
        ]
        .into_iter()
        .filter(|(_, slot)| slot.is_some())
        .map(|(kind, _)| kind)
        .collect()
    }
}
