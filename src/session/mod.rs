//! Live frame analysis session.
//!
//! A session moves through `Idle -> Analyzing -> (ZoomPending -> Analyzing)*
//! -> Finalized`. Frames are pushed one at a time on a worker thread with
//! [`FrameSession::process_frame`]; each one is turned upright, cropped to the
//! region of interest and handed to the [`Analyzer`]. The first read passes
//! the auto-zoom controller and then the result gate, which posts it to the
//! [`ResultReceiver`] on the consumer thread. An intercepting consumer reopens
//! the gate; an accepting one leaves the session finalized.
//!
//! Nothing here spawns threads. The worker and consumer loops belong to the
//! caller.

pub mod gate;
pub mod zoom;

pub use gate::{Delivery, ResultReceiver, ScanConsumer};
pub use zoom::{AutoZoom, ZoomDecision, finder_span};

use crate::camera::CameraControl;
use crate::config::{DecodeConfig, SessionConfig};
use crate::decoder::Analyzer;
use crate::models::{DecodeResult, Frame};
use crate::roi::select_region;
use gate::{Posted, Posting, ResultGate, result_channel};
use log::{debug, info};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::{Duration, Instant};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or stopped
    Idle,
    /// Accepting frames
    Analyzing,
    /// A zoom request is being issued
    ZoomPending,
    /// A result is finalized; frames are ignored until reopened or restarted
    Finalized,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Analyzing,
            2 => Self::ZoomPending,
            3 => Self::Finalized,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Analyzing => 1,
            Self::ZoomPending => 2,
            Self::Finalized => 3,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::ZoomPending => "zoom-pending",
            Self::Finalized => "finalized",
        })
    }
}

/// Lifecycle notifications for side-effect collaborators (beep, vibrate,
/// flashlight affordance)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent<'a> {
    /// The session started or restarted
    Started,
    /// The session stopped
    Stopped,
    /// One zoom step was requested from the camera
    ZoomRequested,
    /// The consumer accepted a result
    Finalized(&'a DecodeResult),
    /// The consumer intercepted a result and scanning resumed
    Reopened,
    /// A result was dropped because the session was no longer analysing
    Discarded,
}

/// Subscriber to [`SessionEvent`]s. Called on whichever thread raised the event.
pub trait SessionObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &SessionEvent<'_>);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        self(event)
    }
}

/// State visible to the worker, the consumer and any handles
pub(crate) struct SessionShared {
    state: AtomicU8,
    analyze: AtomicBool,
    finalized: AtomicBool,
    /// Bumped on every start; results carry the run they were read in
    generation: AtomicU64,
    inbox: Mutex<Receiver<Posted>>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}

impl SessionShared {
    pub(crate) fn new(inbox: Receiver<Posted>) -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle.as_u8()),
            analyze: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            inbox: Mutex::new(inbox),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn lock_inbox(&self) -> MutexGuard<'_, Receiver<Posted>> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Throw away results nobody picked up. Skipped while the consumer is
    /// blocked receiving, in which case it filters them itself.
    fn drain_inbox(&self) -> usize {
        let inbox = match self.inbox.try_lock() {
            Ok(inbox) => inbox,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return 0,
        };
        inbox.try_iter().count()
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Move from `from` to `to`; false if the state was anything else
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn emit(&self, event: &SessionEvent<'_>) {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer.on_event(event);
        }
    }

    fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    fn stop(&self) {
        self.analyze.store(false, Ordering::Release);
        let previous = SessionState::from_u8(
            self.state.swap(SessionState::Idle.as_u8(), Ordering::AcqRel),
        );
        if previous != SessionState::Idle {
            info!("session stopped");
            self.emit(&SessionEvent::Stopped);
        }
    }
}

/// Cloneable control handle for threads other than the worker
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Stop the session; frames in flight are discarded
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Pause or resume analysis without ending the session
    pub fn set_analyze(&self, analyze: bool) {
        self.shared.analyze.store(analyze, Ordering::Release);
    }

    /// Whether frames are currently analysed
    pub fn is_analyzing(&self) -> bool {
        self.shared.analyze.load(Ordering::Acquire)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.shared.subscribe(observer);
    }
}

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Dropped before decoding: session idle, paused or already finalized
    Skipped,
    /// Decoded nothing
    NoResult,
    /// Read a code, but the session stopped while decoding
    Discarded,
    /// Read a code and posted it to the consumer
    Delivered {
        /// A zoom step was requested for this read
        zoomed: bool,
    },
    /// Read a code, but the gate was already closed
    Duplicate,
    /// Read a code, but the consumer had not taken the previous one; the
    /// gate stays open for the next frame
    Backlogged,
}

/// Per-session frame pipeline, owned by the worker thread
pub struct FrameSession<A, C> {
    config: DecodeConfig,
    analyzer: A,
    camera: C,
    zoom: AutoZoom,
    gate: ResultGate,
    shared: Arc<SessionShared>,
}

impl<A: Analyzer, C: CameraControl> FrameSession<A, C> {
    /// Build an idle session and the receiver its results are posted to
    pub fn new(config: SessionConfig, analyzer: A, camera: C) -> (Self, ResultReceiver) {
        let (shared, gate, receiver) = result_channel();
        let zoom = AutoZoom::new(config.auto_zoom, Duration::from_millis(config.zoom_cooldown_ms));
        let session = Self {
            config: config.decode,
            analyzer,
            camera,
            zoom,
            gate,
            shared,
        };
        (session, receiver)
    }

    /// Start (or restart) analysis, clearing any finalized result. Results
    /// of an earlier run that the consumer never took are dropped.
    pub fn start(&mut self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let stale = self.shared.drain_inbox();
        if stale > 0 {
            debug!("dropped {stale} unread result(s) from the previous run");
        }
        self.zoom.reset();
        self.shared.finalized.store(false, Ordering::Release);
        self.shared.set_state(SessionState::Analyzing);
        self.shared.analyze.store(true, Ordering::Release);
        info!("session run {generation} started");
        self.shared.emit(&SessionEvent::Started);
    }

    /// Stop analysis
    pub fn stop(&mut self) {
        self.shared.stop();
    }

    /// Control handle for other threads
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.shared.subscribe(observer);
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Region and hint settings in use
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// The camera collaborator
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Auto-zoom controller state
    pub fn auto_zoom(&self) -> &AutoZoom {
        &self.zoom
    }

    fn accepting_frames(&self) -> bool {
        self.shared.analyze.load(Ordering::Acquire)
            && self.shared.state() == SessionState::Analyzing
            && !self.gate.is_finalized()
    }

    /// Analyse one frame now
    pub fn process_frame(&mut self, frame: Frame) -> FrameOutcome {
        self.process_frame_at(frame, Instant::now())
    }

    /// Analyse one frame, using `now` for the zoom cooldown
    pub fn process_frame_at(&mut self, frame: Frame, now: Instant) -> FrameOutcome {
        if !self.accepting_frames() {
            return FrameOutcome::Skipped;
        }

        let frame = frame.upright();
        let (width, height) = (frame.width(), frame.height());
        let region = select_region(width, height, &self.config);
        let Some(pixels) = frame.crop(&region) else {
            debug!("region {region:?} outside {width}x{height} frame");
            return FrameOutcome::NoResult;
        };
        drop(frame);

        let result = self
            .analyzer
            .analyze(&pixels, region.width as usize, region.height as usize);
        let Some(result) = result else {
            return FrameOutcome::NoResult;
        };

        if !self.shared.analyze.load(Ordering::Acquire) {
            info!("session stopped while decoding, discarding {result}");
            self.shared.emit(&SessionEvent::Discarded);
            return FrameOutcome::Discarded;
        }

        let zoomed = match self.zoom.evaluate(&result, width, height, now) {
            ZoomDecision::ZoomAndFinalize => {
                self.shared.set_state(SessionState::ZoomPending);
                info!("{result} spans little of the frame, zooming in");
                self.camera.zoom_in();
                self.shared.emit(&SessionEvent::ZoomRequested);
                self.shared.set_state(SessionState::Analyzing);
                true
            }
            ZoomDecision::Finalize => false,
        };

        match self.gate.finalize(result) {
            Posting::Posted => FrameOutcome::Delivered { zoomed },
            Posting::Closed => FrameOutcome::Duplicate,
            Posting::Busy => FrameOutcome::Backlogged,
            Posting::Dropped => {
                self.shared.emit(&SessionEvent::Discarded);
                FrameOutcome::Discarded
            }
        }
    }

    /// Process `frames` in order until they run out or the session is
    /// stopped. Returns the number of frames that reached the decoder.
    pub fn run<I>(&mut self, frames: I) -> usize
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut analysed = 0;
        for frame in frames {
            if self.shared.state() == SessionState::Idle {
                break;
            }
            if self.process_frame(frame) != FrameOutcome::Skipped {
                analysed += 1;
            }
        }
        analysed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SimulatedCamera;
    use crate::models::{Point, Rotation, Symbology};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn frame(width: usize, height: usize) -> Frame {
        Frame::from_luma(vec![255; width * height], width, height, Rotation::Deg0).unwrap()
    }

    fn qr_with_side(side: f32) -> DecodeResult {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
        ];
        DecodeResult::new("hello", Symbology::QrCode, points)
    }

    fn session_with<A: Analyzer>(analyzer: A) -> (FrameSession<A, SimulatedCamera>, ResultReceiver) {
        FrameSession::new(SessionConfig::default(), analyzer, SimulatedCamera::new(1.0, 8.0))
    }

    #[test]
    fn test_no_code_stays_analyzing() {
        let (mut session, receiver) = session_with(|_: &[u8], _: usize, _: usize| -> Option<DecodeResult> { None });
        session.start();
        for _ in 0..3 {
            assert_eq!(session.process_frame(frame(64, 48)), FrameOutcome::NoResult);
        }
        assert_eq!(session.state(), SessionState::Analyzing);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_idle_session_skips_frames() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (mut session, _receiver) = session_with(move |_: &[u8], _: usize, _: usize| -> Option<DecodeResult> {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });
        assert_eq!(session.process_frame(frame(8, 8)), FrameOutcome::Skipped);
        session.start();
        session.handle().set_analyze(false);
        assert_eq!(session.process_frame(frame(8, 8)), FrameOutcome::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_analyzer_sees_cropped_region() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let (mut session, _receiver) = session_with(move |pixels: &[u8], w: usize, h: usize| -> Option<DecodeResult> {
            *sink.lock().unwrap() = Some((pixels.len(), w, h));
            None
        });
        session.start();
        session.process_frame(frame(640, 480));
        // floor(480 * 0.6) = 288
        assert_eq!(*seen.lock().unwrap(), Some((288 * 288, 288, 288)));
    }

    #[test]
    fn test_portrait_frame_turned_upright() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let config = SessionConfig {
            decode: DecodeConfig::default().with_full_area_scan(true),
            ..SessionConfig::default()
        };
        let analyzer = move |_: &[u8], w: usize, h: usize| -> Option<DecodeResult> {
            *sink.lock().unwrap() = Some((w, h));
            None
        };
        let (mut session, _receiver) = FrameSession::new(config, analyzer, SimulatedCamera::new(1.0, 2.0));
        session.start();
        let portrait = Frame::from_luma(vec![0; 640 * 480], 640, 480, Rotation::Deg90).unwrap();
        session.process_frame(portrait);
        assert_eq!(*seen.lock().unwrap(), Some((480, 640)));
    }

    #[test]
    fn test_out_of_bounds_region_is_a_miss() {
        let config = SessionConfig {
            decode: DecodeConfig::default().with_analyze_area(crate::models::Region::new(600, 0, 100, 100)),
            ..SessionConfig::default()
        };
        let analyzer = |_: &[u8], _: usize, _: usize| Some(qr_with_side(10.0));
        let (mut session, _receiver) = FrameSession::new(config, analyzer, SimulatedCamera::new(1.0, 2.0));
        session.start();
        assert_eq!(session.process_frame(frame(640, 480)), FrameOutcome::NoResult);
    }

    #[test]
    fn test_small_code_zooms_and_still_delivers() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(20.0)));
        session.start();
        let outcome = session.process_frame(frame(800, 600));
        assert_eq!(outcome, FrameOutcome::Delivered { zoomed: true });
        assert_eq!(session.camera().requests(), 1);
        assert!(session.auto_zoom().last_zoom().is_some());
        assert_eq!(receiver.try_recv(), Some(qr_with_side(20.0)));
        assert_eq!(session.state(), SessionState::Finalized);
    }

    #[test]
    fn test_large_code_delivers_without_zoom() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(400.0)));
        session.start();
        assert_eq!(session.process_frame(frame(800, 600)), FrameOutcome::Delivered { zoomed: false });
        assert_eq!(session.camera().requests(), 0);
        assert!(receiver.try_recv().is_some());
    }

    #[test]
    fn test_finalized_session_skips_until_intercept() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(400.0)));
        session.start();
        let now = Instant::now();
        assert!(matches!(session.process_frame_at(frame(800, 600), now), FrameOutcome::Delivered { .. }));
        assert_eq!(session.process_frame_at(frame(800, 600), now), FrameOutcome::Skipped);

        let first = receiver.recv().unwrap();
        assert_eq!(receiver.deliver(first, &mut |_: &DecodeResult| true), Delivery::Intercepted);
        assert!(matches!(session.process_frame_at(frame(800, 600), now), FrameOutcome::Delivered { .. }));
    }

    #[test]
    fn test_zoom_rate_limited() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(20.0)));
        session.start();
        let t0 = Instant::now();
        assert_eq!(session.process_frame_at(frame(800, 600), t0), FrameOutcome::Delivered { zoomed: true });

        let first = receiver.recv().unwrap();
        receiver.deliver(first, &mut |_: &DecodeResult| true);
        let t1 = t0 + Duration::from_millis(40);
        assert_eq!(session.process_frame_at(frame(800, 600), t1), FrameOutcome::Delivered { zoomed: false });
        assert_eq!(session.camera().requests(), 1);
    }

    #[test]
    fn test_stop_during_decode_discards() {
        let handle_slot: Arc<Mutex<Option<SessionHandle>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&handle_slot);
        let analyzer = move |_: &[u8], _: usize, _: usize| {
            if let Some(handle) = slot.lock().unwrap().as_ref() {
                handle.stop();
            }
            Some(qr_with_side(400.0))
        };
        let (mut session, receiver) = session_with(analyzer);
        *handle_slot.lock().unwrap() = Some(session.handle());
        session.start();

        assert_eq!(session.process_frame(frame(64, 64)), FrameOutcome::Discarded);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_observers_and_restart() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&events);
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(20.0)));
        session.subscribe(Arc::new(move |event: &SessionEvent<'_>| {
            let name = match event {
                SessionEvent::Started => "started",
                SessionEvent::Stopped => "stopped",
                SessionEvent::ZoomRequested => "zoom",
                SessionEvent::Finalized(_) => "finalized",
                SessionEvent::Reopened => "reopened",
                SessionEvent::Discarded => "discarded",
            };
            log.lock().unwrap().push(name);
        }));

        session.start();
        session.process_frame(frame(800, 600));
        let result = receiver.recv().unwrap();
        assert!(matches!(receiver.deliver(result, &mut |_: &DecodeResult| false), Delivery::Accepted(_)));
        session.stop();
        session.start();
        assert_eq!(session.state(), SessionState::Analyzing);

        assert_eq!(
            *events.lock().unwrap(),
            vec!["started", "zoom", "finalized", "stopped", "started"]
        );
    }

    #[test]
    fn test_restart_drops_unread_result() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let analyzer = move |_: &[u8], _: usize, _: usize| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let points = vec![Point::new(0.0, 0.0), Point::new(400.0, 0.0)];
            Some(DecodeResult::new(format!("run{n}"), Symbology::QrCode, points))
        };
        let (mut session, receiver) = session_with(analyzer);

        session.start();
        assert_eq!(session.process_frame(frame(800, 600)), FrameOutcome::Delivered { zoomed: false });
        session.stop();
        session.start();
        assert_eq!(session.state(), SessionState::Analyzing);
        assert_eq!(session.process_frame(frame(800, 600)), FrameOutcome::Delivered { zoomed: false });
        assert_eq!(session.process_frame(frame(800, 600)), FrameOutcome::Skipped);

        assert_eq!(receiver.try_recv().map(DecodeResult::into_text).as_deref(), Some("run1"));
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_result_taken_before_restart_is_discarded() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(400.0)));
        session.start();
        session.process_frame(frame(800, 600));
        let old = receiver.recv().unwrap();
        session.stop();
        session.start();

        let mut called = false;
        let delivery = receiver.deliver(old, &mut |_: &DecodeResult| {
            called = true;
            true
        });
        assert_eq!(delivery, Delivery::Discarded);
        assert!(!called);
        assert_eq!(session.state(), SessionState::Analyzing);
        assert!(matches!(session.process_frame(frame(800, 600)), FrameOutcome::Delivered { .. }));
    }

    #[test]
    fn test_stop_while_consumer_decides() {
        let (mut session, receiver) =
            session_with(|_: &[u8], _: usize, _: usize| Some(qr_with_side(400.0)));
        let handle = session.handle();
        session.start();
        session.process_frame(frame(800, 600));

        let result = receiver.recv().unwrap();
        let delivery = receiver.deliver(result, &mut |_: &DecodeResult| {
            handle.stop();
            true
        });
        assert_eq!(delivery, Delivery::Discarded);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!handle.is_analyzing());
        assert_eq!(session.run((0..5).map(|_| frame(8, 8))), 0);
    }

    #[test]
    fn test_run_stops_with_session() {
        let (mut session, _receiver) = session_with(|_: &[u8], _: usize, _: usize| -> Option<DecodeResult> { None });
        session.start();
        let handle = session.handle();
        let frames = (0..10).map(|i| {
            if i == 4 {
                handle.stop();
            }
            frame(16, 16)
        });
        assert_eq!(session.run(frames), 4);
    }
}
