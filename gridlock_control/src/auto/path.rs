//! Pre-loaded path segments and the path-follow seam.
//!
//! A routine never plans paths. It receives a `PathGroup` (ordered segments
//! loaded before the match) and a `PathFollowerFactory` that turns one segment
//! into a drivetrain action.

use std::time::Duration;

use serde::Serialize;

use super::RoutineError;
use crate::action::{Action, ActionContext, InterruptPolicy};
use crate::robot::Pose2d;
use gridlock_common::resource::ResourceSet;

// ─── Segments ───────────────────────────────────────────────────────

/// One drivable segment of a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    name: String,
    total_duration: Duration,
    initial_pose: Pose2d,
    final_pose: Pose2d,
}

impl PathSegment {
    pub fn new(
        name: impl Into<String>,
        total_duration: Duration,
        initial_pose: Pose2d,
        final_pose: Pose2d,
    ) -> Self {
        Self {
            name: name.into(),
            total_duration,
            initial_pose,
            final_pose,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time the follower needs for this segment.
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn initial_pose(&self) -> Pose2d {
        self.initial_pose
    }

    pub fn final_pose(&self) -> Pose2d {
        self.final_pose
    }

    /// The same segment driven on the red alliance.
    pub fn mirrored(&self) -> Self {
        Self {
            name: self.name.clone(),
            total_duration: self.total_duration,
            initial_pose: self.initial_pose.mirrored(),
            final_pose: self.final_pose.mirrored(),
        }
    }

    /// Linearly interpolated pose `elapsed` into the segment.
    pub fn pose_at(&self, elapsed: Duration) -> Pose2d {
        if self.total_duration.is_zero() {
            return self.final_pose;
        }
        let t = (elapsed.as_secs_f64() / self.total_duration.as_secs_f64()).clamp(0.0, 1.0);
        let (a, b) = (self.initial_pose, self.final_pose);
        Pose2d::new(
            a.x + (b.x - a.x) * t,
            a.y + (b.y - a.y) * t,
            a.heading + (b.heading - a.heading) * t,
        )
    }
}

/// Ordered segments of one named path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathGroup {
    name: String,
    segments: Vec<PathSegment>,
}

impl PathGroup {
    pub fn new(name: impl Into<String>, segments: Vec<PathSegment>) -> Self {
        Self {
            name: name.into(),
            segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Segment `index`, or `MissingPathSegment` when the group is too short.
    pub fn segment(&self, index: usize) -> Result<&PathSegment, RoutineError> {
        self.segments
            .get(index)
            .ok_or_else(|| RoutineError::MissingPathSegment {
                path: self.name.clone(),
                index,
                available: self.segments.len(),
            })
    }

    /// Every segment mirrored onto the red alliance side.
    pub fn mirrored(&self) -> Self {
        Self {
            name: self.name.clone(),
            segments: self.segments.iter().map(PathSegment::mirrored).collect(),
        }
    }

    /// Start pose of the first segment.
    pub fn initial_pose(&self) -> Result<Pose2d, RoutineError> {
        self.segment(0).map(PathSegment::initial_pose)
    }

    /// Waypoints for the field plot: every segment's endpoints, in order.
    pub fn plot_poses(&self) -> Vec<Pose2d> {
        let mut poses = Vec::with_capacity(self.segments.len() + 1);
        if let Some(first) = self.segments.first() {
            poses.push(first.initial_pose);
        }
        poses.extend(self.segments.iter().map(|s| s.final_pose));
        poses
    }
}

/// A path group looked up for one alliance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPath<'a> {
    group: &'a PathGroup,
    mirror: bool,
}

impl<'a> ResolvedPath<'a> {
    /// A group already in the coordinates it will be driven in.
    pub fn exact(group: &'a PathGroup) -> Self {
        Self {
            group,
            mirror: false,
        }
    }

    /// A blue-side group to be driven on the red alliance.
    pub fn mirrored(group: &'a PathGroup) -> Self {
        Self {
            group,
            mirror: true,
        }
    }

    pub fn group(&self) -> &'a PathGroup {
        self.group
    }

    #[inline]
    pub fn is_mirrored(&self) -> bool {
        self.mirror
    }

    /// The segments to drive.
    pub fn to_group(&self) -> PathGroup {
        if self.mirror {
            self.group.mirrored()
        } else {
            self.group.clone()
        }
    }
}

// ─── Follower Seam ──────────────────────────────────────────────────

/// Drivetrain action that follows one segment.
pub trait PathFollow<C: ActionContext>: Action<C> {
    /// Time left until the segment's nominal end, as of `now`. Before the
    /// first start this is the whole time the follower needs.
    fn remaining_duration(&self, now: Duration) -> Duration;
}

impl<C: ActionContext> Action<C> for Box<dyn PathFollow<C>> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn requirements(&self) -> ResourceSet {
        (**self).requirements()
    }
    fn interrupt_policy(&self) -> InterruptPolicy {
        (**self).interrupt_policy()
    }
    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }
    fn start(&mut self, ctx: &mut C) {
        (**self).start(ctx)
    }
    fn step(&mut self, ctx: &mut C) {
        (**self).step(ctx)
    }
    fn is_finished(&self, ctx: &C) -> bool {
        (**self).is_finished(ctx)
    }
    fn stop(&mut self, ctx: &mut C, interrupted: bool) {
        (**self).stop(ctx, interrupted)
    }
}

/// Builds follow actions from segments.
pub trait PathFollowerFactory<C: ActionContext> {
    fn follow(&self, segment: &PathSegment) -> Box<dyn PathFollow<C>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> PathGroup {
        PathGroup::new(
            "Test",
            vec![
                PathSegment::new(
                    "Test.0",
                    Duration::from_secs(2),
                    Pose2d::new(0.0, 0.0, 0.0),
                    Pose2d::new(2.0, 1.0, 0.0),
                ),
                PathSegment::new(
                    "Test.1",
                    Duration::from_secs(1),
                    Pose2d::new(2.0, 1.0, 0.0),
                    Pose2d::new(3.0, 1.0, 0.0),
                ),
            ],
        )
    }

    #[test]
    fn missing_segment_is_an_error() {
        let group = group();
        assert!(group.segment(1).is_ok());
        assert_eq!(
            group.segment(2).unwrap_err(),
            RoutineError::MissingPathSegment {
                path: "Test".to_string(),
                index: 2,
                available: 2,
            }
        );
        let empty = PathGroup::new("Empty", Vec::new());
        assert!(empty.initial_pose().is_err());
        assert!(empty.plot_poses().is_empty());
    }

    #[test]
    fn pose_interpolation_clamps() {
        let group = group();
        let seg = group.segment(0).unwrap();
        assert_eq!(seg.pose_at(Duration::from_secs(1)), Pose2d::new(1.0, 0.5, 0.0));
        assert_eq!(seg.pose_at(Duration::from_secs(5)), seg.final_pose());
    }

    #[test]
    fn resolved_path_mirrors_only_on_request() {
        let group = group();
        assert_eq!(ResolvedPath::exact(&group).to_group(), group);

        let red = ResolvedPath::mirrored(&group).to_group();
        assert_eq!(red.name(), "Test");
        assert_eq!(
            red.initial_pose().unwrap(),
            group.initial_pose().unwrap().mirrored()
        );
    }

    #[test]
    fn plot_poses_chain_endpoints() {
        let poses = group().plot_poses();
        assert_eq!(poses.len(), 3);
        assert_eq!(poses[2], Pose2d::new(3.0, 1.0, 0.0));
    }
}
