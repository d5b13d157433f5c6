//! Face perception
//!
//! The detector is slow and asynchronous, so the game loop never waits on it.
//! Each frame the driver calls [`PerceptionSampler::collect`] to pick up any
//! finished sample, then [`PerceptionSampler::sample`] to maybe start a new
//! one. Results travel back through a shared slot that the sensor fills via
//! [`SampleReply::complete`].

mod face;
mod scripted;

pub use face::{DetectorKind, Detection, Face, FaceBox};
pub use scripted::ScriptedSensor;

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::PlayArea;
use crate::consts::{FACE_SAMPLE_INTERVAL_MS, FACE_SAMPLE_TIMEOUT_MS, FACE_SEEN_WINDOW_MS};
use crate::error::SensorError;

pub type SampleOutcome = Result<Detection, SensorError>;

type ReplyQueue = Rc<RefCell<Vec<(u64, SampleOutcome)>>>;

/// Whether the sensor can take a sample right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorReadiness {
    CameraOff,
    ModelLoading,
    Ready,
}

/// An asynchronous face detector.
///
/// `begin_detect` must return promptly; the result is delivered later (or
/// immediately) through `reply`. The sampler never has more than one call
/// outstanding, even when a call hangs past the timeout.
pub trait FaceSensor {
    fn readiness(&self) -> SensorReadiness;
    fn begin_detect(&mut self, reply: SampleReply);
}

/// One-shot handle a sensor uses to hand back its result
pub struct SampleReply {
    queue: ReplyQueue,
    ticket: u64,
}

impl SampleReply {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn complete(self, outcome: SampleOutcome) {
        self.queue.borrow_mut().push((self.ticket, outcome));
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    /// Unpaused ms spent waiting so far
    waited_ms: f64,
    last_polled: f64,
    discard: bool,
    timed_out: bool,
}

/// What the player should be told about face tracking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Diagnostic {
    CameraOff,
    ModelLoading,
    SensorError(String),
    FaceNotFound,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        match self {
            Diagnostic::CameraOff => "Camera is off. Turn it on to play.".to_string(),
            Diagnostic::ModelLoading => "Loading face tracking...".to_string(),
            Diagnostic::SensorError(e) => format!("Face tracking error: {e}"),
            Diagnostic::FaceNotFound => {
                "Can't find your face. Move into the camera view.".to_string()
            }
        }
    }
}

/// Diagnostic state recorded by the sampler. Never stops the simulation.
#[derive(Debug, Clone, Default)]
pub struct FaceStatus {
    readiness: Option<SensorReadiness>,
    last_seen_at: Option<f64>,
    last_miss_at: Option<f64>,
    last_error: Option<String>,
    detector: Option<DetectorKind>,
}

impl FaceStatus {
    pub fn last_seen_at(&self) -> Option<f64> {
        self.last_seen_at
    }

    pub fn last_miss_at(&self) -> Option<f64> {
        self.last_miss_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Detector that produced the most recent face
    pub fn detector(&self) -> Option<DetectorKind> {
        self.detector
    }

    pub fn face_seen_recently(&self, now: f64) -> bool {
        self.last_seen_at.is_some_and(|t| now - t <= FACE_SEEN_WINDOW_MS)
    }

    /// Highest-priority problem to show, if any
    pub fn diagnostic(&self, now: f64) -> Option<Diagnostic> {
        match self.readiness {
            Some(SensorReadiness::CameraOff) => return Some(Diagnostic::CameraOff),
            Some(SensorReadiness::ModelLoading) => return Some(Diagnostic::ModelLoading),
            _ => {}
        }
        if let Some(e) = &self.last_error {
            return Some(Diagnostic::SensorError(e.clone()));
        }
        if !self.face_seen_recently(now) {
            return Some(Diagnostic::FaceNotFound);
        }
        None
    }

    fn record_seen(&mut self, now: f64, detector: DetectorKind) {
        self.last_seen_at = Some(now);
        self.last_error = None;
        self.detector = Some(detector);
    }

    fn record_miss(&mut self, now: f64) {
        self.last_miss_at = Some(now);
        self.last_error = None;
    }

    fn record_error(&mut self, now: f64, err: &SensorError) {
        let text = err.to_string();
        if self.last_error.as_deref() != Some(text.as_str()) {
            if err.is_transient() {
                log::debug!("Face sample failed: {}", text);
            } else {
                log::warn!("Face sample failed: {}", text);
            }
        }
        self.last_miss_at = Some(now);
        self.last_error = Some(text);
    }
}

/// Rate-limited, non-blocking face sampler
pub struct PerceptionSampler {
    replies: ReplyQueue,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    last_attempt: Option<f64>,
    interval_ms: f64,
    timeout_ms: f64,
    status: FaceStatus,
}

impl Default for PerceptionSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptionSampler {
    pub fn new() -> Self {
        Self::with_timing(FACE_SAMPLE_INTERVAL_MS, FACE_SAMPLE_TIMEOUT_MS)
    }

    pub fn with_timing(interval_ms: f64, timeout_ms: f64) -> Self {
        Self {
            replies: Rc::new(RefCell::new(Vec::new())),
            in_flight: None,
            next_ticket: 1,
            last_attempt: None,
            interval_ms,
            timeout_ms,
            status: FaceStatus::default(),
        }
    }

    pub fn status(&self) -> &FaceStatus {
        &self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a sample unless the sensor isn't ready, one is outstanding, or
    /// the last attempt was less than the minimum interval ago.
    ///
    /// Returns true if a detector call was issued.
    pub fn sample(&mut self, now: f64, sensor: &mut dyn FaceSensor) -> bool {
        let readiness = sensor.readiness();
        if self.status.readiness != Some(readiness) {
            log::info!("Face sensor: {:?}", readiness);
            self.status.readiness = Some(readiness);
        }
        if readiness != SensorReadiness::Ready {
            return false;
        }

        if let Some(flight) = self.in_flight.as_mut() {
            flight.waited_ms += (now - flight.last_polled).max(0.0);
            flight.last_polled = now;
            if flight.waited_ms >= self.timeout_ms && !flight.timed_out {
                // Give up on the result but stay gated until the call returns
                flight.timed_out = true;
                flight.discard = true;
                let err = SensorError::Timeout {
                    waited_ms: flight.waited_ms,
                };
                self.status.record_error(now, &err);
            }
            return false;
        }

        if self.last_attempt.is_some_and(|t| now - t < self.interval_ms) {
            return false;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.last_attempt = Some(now);
        self.in_flight = Some(InFlight {
            ticket,
            waited_ms: 0.0,
            last_polled: now,
            discard: false,
            timed_out: false,
        });
        sensor.begin_detect(SampleReply {
            queue: Rc::clone(&self.replies),
            ticket,
        });
        true
    }

    /// Apply any finished sample. Returns the new pursuit target in play-area
    /// pixels, or `None` when nothing usable arrived.
    pub fn collect(&mut self, now: f64, mirror: bool, area: &PlayArea) -> Option<Vec2> {
        let replies = std::mem::take(&mut *self.replies.borrow_mut());
        let mut target = None;

        for (ticket, outcome) in replies {
            let Some(flight) = self.in_flight.filter(|f| f.ticket == ticket) else {
                log::trace!("Dropping stale face sample #{}", ticket);
                continue;
            };
            self.in_flight = None;
            if flight.discard {
                continue;
            }
            match outcome {
                Ok(detection) if !detection.has_faces() => self.status.record_miss(now),
                Ok(detection) => {
                    // Non-finite or degenerate results are ignored without a status change
                    if let Some(n) = detection.normalized_center() {
                        self.status.record_seen(now, detection.detector);
                        target = Some(map_to_area(n, mirror, area));
                    }
                }
                Err(e) => self.status.record_error(now, &e),
            }
        }
        target
    }

    /// Stop the outstanding sample's timeout from counting the time up to
    /// `now`. Called on frames where sampling is suspended (game paused).
    pub fn hold(&mut self, now: f64) {
        if let Some(flight) = self.in_flight.as_mut() {
            flight.last_polled = now;
        }
    }

    /// Drop the outstanding sample's result when it arrives and allow a
    /// fresh sample immediately.
    pub fn cancel(&mut self) {
        if let Some(flight) = self.in_flight.as_mut() {
            flight.discard = true;
        }
        self.replies.borrow_mut().clear();
        self.last_attempt = None;
    }
}

/// Normalized image point to play-area pixels, flipping horizontally in mirror mode
pub fn map_to_area(normalized: Vec2, mirror: bool, area: &PlayArea) -> Vec2 {
    let x = if mirror { 1.0 - normalized.x } else { normalized.x };
    area.from_normalized(Vec2::new(x, normalized.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection_at(x: f32, y: f32) -> Detection {
        Detection {
            faces: vec![Face::from_keypoints(vec![Vec2::new(x, y)])],
            frame_width: 100.0,
            frame_height: 100.0,
            detector: DetectorKind::Mesh,
        }
    }

    fn area() -> PlayArea {
        PlayArea::new(1000.0, 500.0)
    }

    #[test]
    fn test_not_ready_skips() {
        let mut sensor = ScriptedSensor::new();
        sensor.set_readiness(SensorReadiness::ModelLoading);
        let mut sampler = PerceptionSampler::new();
        assert!(!sampler.sample(0.0, &mut sensor));
        assert_eq!(sensor.calls(), 0);
        assert_eq!(sampler.status().diagnostic(0.0), Some(Diagnostic::ModelLoading));
    }

    #[test]
    fn test_in_flight_gates_reentry() {
        let mut sensor = ScriptedSensor::new();
        let mut sampler = PerceptionSampler::new();
        assert!(sampler.sample(0.0, &mut sensor));
        assert!(!sampler.sample(200.0, &mut sensor));
        assert!(!sampler.sample(400.0, &mut sensor));
        assert_eq!(sensor.calls(), 1);

        sensor.resolve_next(Ok(detection_at(50.0, 50.0)));
        assert!(sampler.collect(450.0, false, &area()).is_some());
        assert!(sampler.sample(460.0, &mut sensor));
        assert_eq!(sensor.calls(), 2);
    }

    #[test]
    fn test_minimum_interval() {
        let mut sensor = ScriptedSensor::auto(vec![
            Ok(detection_at(10.0, 10.0)),
            Ok(detection_at(10.0, 10.0)),
        ]);
        let mut sampler = PerceptionSampler::new();
        assert!(sampler.sample(0.0, &mut sensor));
        sampler.collect(1.0, false, &area());
        assert!(!sampler.sample(119.0, &mut sensor));
        assert!(sampler.sample(120.0, &mut sensor));
    }

    #[test]
    fn test_mapping_and_mirror() {
        let mut sensor = ScriptedSensor::auto(vec![
            Ok(detection_at(25.0, 50.0)),
            Ok(detection_at(25.0, 50.0)),
        ]);
        let mut sampler = PerceptionSampler::new();

        sampler.sample(0.0, &mut sensor);
        assert_eq!(
            sampler.collect(0.0, false, &area()),
            Some(Vec2::new(250.0, 250.0))
        );
        sampler.sample(200.0, &mut sensor);
        assert_eq!(
            sampler.collect(200.0, true, &area()),
            Some(Vec2::new(750.0, 250.0))
        );
        assert_eq!(sampler.status().detector(), Some(DetectorKind::Mesh));
        assert_eq!(sampler.status().diagnostic(300.0), None);
    }

    #[test]
    fn test_zero_faces_and_errors_keep_target() {
        let empty = Detection {
            faces: Vec::new(),
            frame_width: 100.0,
            frame_height: 100.0,
            detector: DetectorKind::Box,
        };
        let mut sensor = ScriptedSensor::auto(vec![
            Ok(empty),
            Err(SensorError::Detection("backend lost".into())),
        ]);
        let mut sampler = PerceptionSampler::new();

        sampler.sample(0.0, &mut sensor);
        assert_eq!(sampler.collect(10.0, false, &area()), None);
        assert_eq!(sampler.status().last_miss_at(), Some(10.0));
        assert_eq!(sampler.status().diagnostic(10.0), Some(Diagnostic::FaceNotFound));

        sampler.sample(200.0, &mut sensor);
        assert_eq!(sampler.collect(210.0, false, &area()), None);
        assert!(matches!(
            sampler.status().diagnostic(210.0),
            Some(Diagnostic::SensorError(_))
        ));
    }

    #[test]
    fn test_non_finite_discarded_silently() {
        let mut sensor = ScriptedSensor::auto(vec![Ok(detection_at(f32::INFINITY, 1.0))]);
        let mut sampler = PerceptionSampler::new();
        sampler.sample(0.0, &mut sensor);
        assert_eq!(sampler.collect(0.0, false, &area()), None);
        assert_eq!(sampler.status().last_miss_at(), None);
        assert_eq!(sampler.status().last_seen_at(), None);
        assert!(!sampler.is_in_flight());
    }

    #[test]
    fn test_timeout_keeps_single_call_and_drops_late_reply() {
        let mut sensor = ScriptedSensor::new();
        let mut sampler = PerceptionSampler::new();
        assert!(sampler.sample(0.0, &mut sensor));
        assert!(!sampler.sample(1499.0, &mut sensor));
        assert!(!sampler.sample(1600.0, &mut sensor));
        assert_eq!(sensor.calls(), 1);
        assert_eq!(sensor.pending(), 1);
        assert!(matches!(
            sampler.status().diagnostic(1600.0),
            Some(Diagnostic::SensorError(ref m)) if m.contains("timed out")
        ));

        // Still hung: no second call, however long it takes
        assert!(!sampler.sample(5000.0, &mut sensor));
        assert_eq!(sensor.calls(), 1);

        // The late answer is thrown away and lifts the gate
        sensor.resolve_next(Ok(detection_at(90.0, 90.0)));
        assert_eq!(sampler.collect(5100.0, false, &area()), None);
        assert!(!sampler.is_in_flight());
        assert!(sampler.sample(5100.0, &mut sensor));
        assert_eq!(sensor.calls(), 2);

        sensor.resolve_next(Ok(detection_at(50.0, 50.0)));
        assert_eq!(
            sampler.collect(5200.0, false, &area()),
            Some(Vec2::new(500.0, 250.0))
        );
        assert_eq!(sampler.status().diagnostic(5200.0), None);
    }

    #[test]
    fn test_held_time_does_not_count_toward_timeout() {
        let mut sensor = ScriptedSensor::new();
        let mut sampler = PerceptionSampler::new();
        assert!(sampler.sample(0.0, &mut sensor));
        assert!(!sampler.sample(1000.0, &mut sensor));
        // Five seconds of suspended frames
        let mut now = 1000.0;
        while now < 6000.0 {
            sampler.hold(now);
            now += 16.0;
        }
        assert!(!sampler.sample(now, &mut sensor));
        assert_eq!(sampler.status().last_error(), None);

        sensor.resolve_next(Ok(detection_at(50.0, 50.0)));
        assert!(sampler.collect(now + 16.0, false, &area()).is_some());
        assert_eq!(sensor.calls(), 1);
    }

    #[test]
    fn test_cancel_discards_in_flight_result() {
        let mut sensor = ScriptedSensor::new();
        let mut sampler = PerceptionSampler::new();
        sampler.sample(0.0, &mut sensor);
        sampler.cancel();
        // Still gated until the outstanding call returns
        assert!(!sampler.sample(10.0, &mut sensor));

        sensor.resolve_next(Ok(detection_at(50.0, 50.0)));
        assert_eq!(sampler.collect(20.0, false, &area()), None);
        assert!(!sampler.is_in_flight());
        assert!(sampler.sample(30.0, &mut sensor));
    }

    #[test]
    fn test_diagnostic_priority() {
        let mut status = FaceStatus::default();
        assert_eq!(status.diagnostic(0.0), Some(Diagnostic::FaceNotFound));
        status.record_seen(0.0, DetectorKind::Box);
        assert_eq!(status.diagnostic(1500.0), None);
        assert_eq!(status.diagnostic(1501.0), Some(Diagnostic::FaceNotFound));
        status.record_error(1600.0, &SensorError::Timeout { waited_ms: 1500.0 });
        assert!(matches!(status.diagnostic(1600.0), Some(Diagnostic::SensorError(_))));
        status.readiness = Some(SensorReadiness::CameraOff);
        assert_eq!(status.diagnostic(1600.0), Some(Diagnostic::CameraOff));
    }
}
