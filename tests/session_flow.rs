//! Live-session behaviour with real decoding: worker and consumer threads,
//! intercept and reopen, and auto-zoom on small codes.

mod common;

use common::{frame_of, place_centered, render_qr};
use rust_qr_scan::camera::SimulatedCamera;
use rust_qr_scan::{
    Delivery, DecodeResult, FrameOutcome, FrameSession, HintSet, MultiFormatAnalyzer,
    SessionConfig, SessionEvent, SessionState, Symbology,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn qr_session() -> (
    FrameSession<MultiFormatAnalyzer, SimulatedCamera>,
    rust_qr_scan::ResultReceiver,
) {
    let config = SessionConfig::default();
    let analyzer = MultiFormatAnalyzer::new(HintSet::qr_code());
    FrameSession::new(config, analyzer, SimulatedCamera::new(1.0, 8.0))
}

#[test]
fn test_blank_frames_never_finalize() {
    let (mut session, receiver) = qr_session();
    session.start();
    let blank = frame_of(&image::GrayImage::from_pixel(320, 240, image::Luma([200])));
    for _ in 0..3 {
        assert_eq!(session.process_frame(blank.clone()), FrameOutcome::NoResult);
    }
    assert_eq!(session.state(), SessionState::Analyzing);
    assert!(receiver.try_recv().is_none());
}

#[test]
fn test_small_code_zooms_once_within_cooldown() {
    // Finder centres 14 modules * 4 px apart: span ~79 px, * 4 < 600
    let frame = frame_of(&place_centered(&render_qr("small", 4), 800, 600));
    let (mut session, receiver) = qr_session();
    session.start();

    let t0 = Instant::now();
    assert_eq!(session.process_frame_at(frame.clone(), t0), FrameOutcome::Delivered { zoomed: true });
    let first = receiver.recv().unwrap();
    assert_eq!(first.text(), "small");
    assert_eq!(receiver.deliver(first, &mut |_: &DecodeResult| true), Delivery::Intercepted);

    let t1 = t0 + Duration::from_millis(60);
    assert_eq!(session.process_frame_at(frame, t1), FrameOutcome::Delivered { zoomed: false });
    assert_eq!(session.camera().requests(), 1);
    assert!((session.camera().state().ratio - 1.1).abs() < 1e-5);
}

#[test]
fn test_large_code_finalizes_without_zoom() {
    // Finder centres 14 modules * 10 px apart: span ~198 px, * 4 >= 600
    let frame = frame_of(&place_centered(&render_qr("large", 10), 800, 600));
    let (mut session, receiver) = qr_session();
    session.start();

    assert_eq!(session.process_frame(frame), FrameOutcome::Delivered { zoomed: false });
    assert_eq!(session.camera().requests(), 0);
    let result = receiver.recv().unwrap();
    assert_eq!(result.symbology(), Symbology::QrCode);
    assert_eq!(result.text(), "large");
}

#[test]
fn test_worker_and_consumer_threads() {
    let frame = frame_of(&place_centered(&render_qr("threaded", 8), 640, 480));
    let (mut session, receiver) = qr_session();

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&events);
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
    let handle = session.handle();

    let worker = thread::spawn(move || {
        session.start();
        let frames = std::iter::repeat_with(|| {
            thread::sleep(Duration::from_millis(5));
            frame.clone()
        })
        .take(2000);
        session.run(frames);
        session
    });

    let mut seen = Vec::new();
    let accepted = receiver.run(&mut |result: &DecodeResult| {
        seen.push(result.text().to_string());
        // Intercept the first read, accept the second
        seen.len() < 2
    });
    handle.stop();
    let session = worker.join().unwrap();

    assert_eq!(accepted.map(|r| r.into_text()).as_deref(), Some("threaded"));
    assert_eq!(seen, vec!["threaded", "threaded"]);
    assert_eq!(session.state(), SessionState::Idle);

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&"started"));
    assert!(events.contains(&"reopened"));
    assert_eq!(&events[events.len() - 2..], &["finalized", "stopped"]);
}

#[test]
fn test_medium_code_measured_between_finder_centres() {
    // 29 * 6 = 174 px symbol: corner diagonal ~178 px would not zoom, finder
    // centre span ~118 px does
    let frame = frame_of(&place_centered(&render_qr("medium", 6), 800, 600));
    let (mut session, receiver) = qr_session();
    session.start();

    assert_eq!(session.process_frame(frame), FrameOutcome::Delivered { zoomed: true });
    let result = receiver.recv().unwrap();
    assert_eq!(result.points().len(), 3);
    let span = rust_qr_scan::session::finder_span(result.points()).unwrap();
    assert!((100..140).contains(&span), "span {span}");
}

#[test]
fn test_restart_delivers_only_the_new_run() {
    let first = frame_of(&place_centered(&render_qr("first run", 10), 800, 600));
    let second = frame_of(&place_centered(&render_qr("second run", 10), 800, 600));
    let (mut session, receiver) = qr_session();

    session.start();
    assert_eq!(session.process_frame(first), FrameOutcome::Delivered { zoomed: false });
    session.stop();
    session.start();
    assert_eq!(session.process_frame(second.clone()), FrameOutcome::Delivered { zoomed: false });
    assert_eq!(session.process_frame(second), FrameOutcome::Skipped);

    let accepted = receiver.run(&mut |_: &DecodeResult| false);
    assert_eq!(accepted.map(|r| r.into_text()).as_deref(), Some("second run"));
    assert_eq!(session.state(), SessionState::Finalized);
}

#[test]
fn test_stop_from_consumer_ends_worker() {
    let frame = frame_of(&place_centered(&render_qr("stop me", 8), 640, 480));
    let (mut session, receiver) = qr_session();
    let handle = session.handle();
    let consumer_handle = handle.clone();

    let worker = thread::spawn(move || {
        session.start();
        let frames = std::iter::repeat_with(|| {
            thread::sleep(Duration::from_millis(2));
            frame.clone()
        })
        .take(5000);
        let analysed = session.run(frames);
        (session, analysed)
    });

    let result = receiver.recv().expect("one read before stopping");
    let delivery = receiver.deliver(result, &mut |_: &DecodeResult| {
        consumer_handle.stop();
        true
    });
    assert_eq!(delivery, Delivery::Discarded);

    let (session, analysed) = worker.join().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!handle.is_analyzing());
    assert!(analysed < 5000);
}
