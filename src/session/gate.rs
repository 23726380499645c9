//! Result gate: at most one finalized result per session, handed from the
//! frame worker to the consumer thread over a single-slot channel.

use super::{SessionEvent, SessionShared, SessionState};
use crate::models::DecodeResult;
use log::{debug, info, warn};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::time::{Duration, Instant};

/// Receives finalized results and decides whether scanning continues
pub trait ScanConsumer {
    /// Handle a result. Return `true` to intercept (keep scanning) or
    /// `false` to accept it and finish the session.
    fn on_result(&mut self, result: &DecodeResult) -> bool;
}

impl<F> ScanConsumer for F
where
    F: FnMut(&DecodeResult) -> bool,
{
    fn on_result(&mut self, result: &DecodeResult) -> bool {
        self(result)
    }
}

/// What happened to a result handed to a consumer
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The consumer accepted; the session stays finalized
    Accepted(DecodeResult),
    /// The consumer intercepted; the gate reopened
    Intercepted,
    /// The session was stopped or restarted before the consumer's decision
    /// could apply; the result was dropped
    Discarded,
}

/// A finalized result tagged with the session run that produced it
pub(crate) struct Posted {
    generation: u64,
    result: DecodeResult,
}

/// Outcome of [`ResultGate::finalize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Posting {
    /// Posted to the consumer
    Posted,
    /// Another result already holds the gate
    Closed,
    /// The consumer has not taken the previous result yet; the gate stays open
    Busy,
    /// The session stopped or the consumer is gone
    Dropped,
}

pub(crate) fn result_channel() -> (Arc<SessionShared>, ResultGate, ResultReceiver) {
    let (slot, inbox) = mpsc::sync_channel(1);
    let shared = Arc::new(SessionShared::new(inbox));
    let gate = ResultGate {
        shared: Arc::clone(&shared),
        slot,
    };
    let receiver = ResultReceiver {
        shared: Arc::clone(&shared),
        received: Cell::new(shared.generation()),
    };
    (shared, gate, receiver)
}

/// Worker side of the gate
pub(crate) struct ResultGate {
    shared: Arc<SessionShared>,
    slot: SyncSender<Posted>,
}

impl ResultGate {
    pub(crate) fn is_finalized(&self) -> bool {
        self.shared.finalized.load(Ordering::Acquire)
    }

    fn reopen(&self) {
        self.shared.finalized.store(false, Ordering::Release);
        self.shared.transition(SessionState::Finalized, SessionState::Analyzing);
    }

    /// Claim the gate and post `result` for the current session run
    pub(crate) fn finalize(&self, result: DecodeResult) -> Posting {
        if self
            .shared
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("result gate already closed, dropping {result}");
            return Posting::Closed;
        }

        if !self.shared.transition(SessionState::Analyzing, SessionState::Finalized) {
            self.shared.finalized.store(false, Ordering::Release);
            info!("session no longer analysing, dropping {result}");
            return Posting::Dropped;
        }

        info!("finalized {result}");
        let posted = Posted {
            generation: self.shared.generation(),
            result,
        };
        match self.slot.try_send(posted) {
            Ok(()) => Posting::Posted,
            Err(TrySendError::Full(posted)) => {
                warn!("result slot still occupied, dropping {}", posted.result);
                self.reopen();
                Posting::Busy
            }
            Err(TrySendError::Disconnected(posted)) => {
                warn!("result consumer is gone, dropping {}", posted.result);
                Posting::Dropped
            }
        }
    }
}

/// Consumer side of the gate.
///
/// Results left over from an earlier run of the session are never handed
/// out: `start` drains them when it can, and the receive calls skip any that
/// slip through.
pub struct ResultReceiver {
    shared: Arc<SessionShared>,
    received: Cell<u64>,
}

impl ResultReceiver {
    fn current(&self, posted: Posted) -> Option<DecodeResult> {
        if posted.generation == self.shared.generation() {
            self.received.set(posted.generation);
            Some(posted.result)
        } else {
            debug!("skipping {} from an earlier session run", posted.result);
            None
        }
    }

    /// Block for the next finalized result; `None` once the session is dropped
    pub fn recv(&self) -> Option<DecodeResult> {
        let inbox = self.shared.lock_inbox();
        loop {
            let posted = inbox.recv().ok()?;
            if let Some(result) = self.current(posted) {
                return Some(result);
            }
        }
    }

    /// Like [`recv`](Self::recv) with a deadline
    pub fn recv_timeout(&self, timeout: Duration) -> Option<DecodeResult> {
        let deadline = Instant::now() + timeout;
        let inbox = self.shared.lock_inbox();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let posted = match inbox.recv_timeout(remaining) {
                Ok(posted) => posted,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            };
            if let Some(result) = self.current(posted) {
                return Some(result);
            }
        }
    }

    /// Pending result, if any
    pub fn try_recv(&self) -> Option<DecodeResult> {
        let inbox = self.shared.lock_inbox();
        loop {
            let posted = inbox.try_recv().ok()?;
            if let Some(result) = self.current(posted) {
                return Some(result);
            }
        }
    }

    fn same_run(&self) -> bool {
        self.received.get() == self.shared.generation()
    }

    /// Hand `result` to `consumer` and apply its decision to the session
    pub fn deliver<C: ScanConsumer + ?Sized>(&self, result: DecodeResult, consumer: &mut C) -> Delivery {
        if !self.same_run() {
            info!("session restarted before delivery, discarding {result}");
            self.shared.emit(&SessionEvent::Discarded);
            return Delivery::Discarded;
        }
        if !self.shared.analyze.load(Ordering::Acquire) {
            info!("session stopped before delivery, discarding {result}");
            self.shared.finalized.store(false, Ordering::Release);
            self.shared.emit(&SessionEvent::Discarded);
            return Delivery::Discarded;
        }

        if !consumer.on_result(&result) {
            self.shared.emit(&SessionEvent::Finalized(&result));
            return Delivery::Accepted(result);
        }

        // The consumer may have stopped or restarted the session meanwhile
        let reopened = self.same_run()
            && self.shared.analyze.load(Ordering::Acquire)
            && self.shared.transition(SessionState::Finalized, SessionState::Analyzing);
        if reopened {
            info!("consumer intercepted {result}, scanning continues");
            self.shared.finalized.store(false, Ordering::Release);
            self.shared.emit(&SessionEvent::Reopened);
            Delivery::Intercepted
        } else {
            info!("session stopped while the consumer held {result}, not reopening");
            self.shared.emit(&SessionEvent::Discarded);
            Delivery::Discarded
        }
    }

    /// Deliver results until one is accepted. Returns `None` if the session
    /// is dropped first.
    pub fn run<C: ScanConsumer + ?Sized>(&self, consumer: &mut C) -> Option<DecodeResult> {
        loop {
            let result = self.recv()?;
            if let Delivery::Accepted(result) = self.deliver(result, consumer) {
                return Some(result);
            }
        }
    }
}
