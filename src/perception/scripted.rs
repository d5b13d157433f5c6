//! Deterministic sensor for headless runs and tests

use std::collections::VecDeque;

use super::{FaceSensor, SampleOutcome, SampleReply, SensorReadiness};

/// A [`FaceSensor`] fed from a script.
///
/// In auto mode each call is answered immediately with the next scripted
/// outcome (an empty script answers with the last one again, if any).
/// Otherwise calls stay pending until [`ScriptedSensor::resolve_next`].
pub struct ScriptedSensor {
    readiness: SensorReadiness,
    script: VecDeque<SampleOutcome>,
    repeat_last: Option<super::Detection>,
    pending: VecDeque<SampleReply>,
    auto: bool,
    calls: usize,
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSensor {
    /// Manual sensor: every call waits for `resolve_next`
    pub fn new() -> Self {
        Self {
            readiness: SensorReadiness::Ready,
            script: VecDeque::new(),
            repeat_last: None,
            pending: VecDeque::new(),
            auto: false,
            calls: 0,
        }
    }

    /// Sensor that answers each call right away from `script`
    pub fn auto(script: Vec<SampleOutcome>) -> Self {
        Self {
            script: script.into(),
            auto: true,
            ..Self::new()
        }
    }

    pub fn set_readiness(&mut self, readiness: SensorReadiness) {
        self.readiness = readiness;
    }

    pub fn push(&mut self, outcome: SampleOutcome) {
        self.script.push_back(outcome);
    }

    /// Number of detector calls received
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Answer the oldest pending call. Returns false if none was pending.
    pub fn resolve_next(&mut self, outcome: SampleOutcome) -> bool {
        match self.pending.pop_front() {
            Some(reply) => {
                reply.complete(outcome);
                true
            }
            None => false,
        }
    }

    fn next_outcome(&mut self) -> Option<SampleOutcome> {
        match self.script.pop_front() {
            Some(Ok(det)) => {
                self.repeat_last = Some(det.clone());
                Some(Ok(det))
            }
            Some(Err(e)) => Some(Err(e)),
            None => self.repeat_last.clone().map(Ok),
        }
    }
}

impl FaceSensor for ScriptedSensor {
    fn readiness(&self) -> SensorReadiness {
        self.readiness
    }

    fn begin_detect(&mut self, reply: SampleReply) {
        self.calls += 1;
        if self.auto {
            if let Some(outcome) = self.next_outcome() {
                reply.complete(outcome);
                return;
            }
        }
        self.pending.push_back(reply);
    }
}
