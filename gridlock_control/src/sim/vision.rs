//! Simulated game-piece camera.

use std::time::Duration;

use crate::robot::{Pipeline, VisionSource};

/// Camera that reports a fixed target once a game-piece pipeline has been
/// active for the acquisition delay.
#[derive(Debug, Clone)]
pub struct SimVision {
    pipeline: Pipeline,
    active_for: Duration,
    acquire_delay: Duration,
    /// Horizontal offset of the target in view, if any [deg].
    target: Option<f64>,
}

impl SimVision {
    pub fn new(acquire_delay: Duration, target: Option<f64>) -> Self {
        Self {
            pipeline: Pipeline::default(),
            active_for: Duration::ZERO,
            acquire_delay,
            target,
        }
    }

    /// Place or remove the simulated game piece.
    pub fn set_target(&mut self, target: Option<f64>) {
        self.target = target;
    }
}

impl VisionSource for SimVision {
    fn set_pipeline(&mut self, pipeline: Pipeline) {
        if pipeline != self.pipeline {
            self.pipeline = pipeline;
            self.active_for = Duration::ZERO;
        }
    }

    fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    fn has_valid_target(&self) -> bool {
        self.pipeline != Pipeline::AprilTag
            && self.target.is_some()
            && self.active_for >= self.acquire_delay
    }

    fn target_offset(&self) -> Option<f64> {
        self.target.filter(|_| self.has_valid_target())
    }

    fn periodic(&mut self, dt: Duration) {
        self.active_for += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_acquired_after_delay() {
        let mut vision = SimVision::new(Duration::from_millis(500), Some(3.0));
        vision.periodic(Duration::from_secs(1));
        assert!(!vision.has_valid_target(), "AprilTag pipeline never sees pieces");

        vision.set_pipeline(Pipeline::Cube);
        vision.periodic(Duration::from_millis(400));
        assert!(!vision.has_valid_target());
        vision.periodic(Duration::from_millis(100));
        assert!(vision.has_valid_target());
        assert_eq!(vision.target_offset(), Some(3.0));
    }

    #[test]
    fn no_piece_no_target() {
        let mut vision = SimVision::new(Duration::ZERO, None);
        vision.set_pipeline(Pipeline::Cone);
        vision.periodic(Duration::from_secs(1));
        assert!(!vision.has_valid_target());
        assert_eq!(vision.target_offset(), None);
    }
}
