//! Per-server session state.
//!
//! One instance per process, shared by every connection. Commands mutate it
//! directly; the waypoint executor and the query commands read it. Two
//! clients writing concurrently race by design — last write wins, the mutex
//! only prevents torn reads.

use crate::backend::{BaseType, BlendType, TeleopMode};

/// Valid speed/acceleration levels.
pub const LEVEL_MIN: i32 = 1;
pub const LEVEL_MAX: i32 = 9;

/// Level → percent-of-maximum velocity, indexed by level − 1.
pub const LEVEL_VEL_RATIO: [f64; 9] = [5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 60.0, 80.0];
/// Level → percent-of-maximum acceleration, indexed by level − 1.
pub const LEVEL_ACC_RATIO: [f64; 9] = [10.0, 20.0, 40.0, 60.0, 80.0, 100.0, 150.0, 200.0, 300.0];

/// Blend radii this close to zero select no blending.
pub const BLEND_ZERO_TOLERANCE: f64 = 1e-6;

pub fn velocity_ratio(level: i32) -> f64 {
    LEVEL_VEL_RATIO[(level.clamp(LEVEL_MIN, LEVEL_MAX) - 1) as usize]
}

pub fn accel_ratio(level: i32) -> f64 {
    LEVEL_ACC_RATIO[(level.clamp(LEVEL_MIN, LEVEL_MAX) - 1) as usize]
}

/// A queued intermediate pose.
///
/// Base type and blend radius are snapshotted from session state when the
/// waypoint is pushed, so later parameter changes do not rewrite history.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub base: BaseType,
    pub blend_radius: f64,
    pub pose: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub joint_speed_level: i32,
    pub task_speed_level: i32,
    pub joint_accel_level: i32,
    pub task_accel_level: i32,
    pub joint_blend_type: BlendType,
    pub task_blend_type: BlendType,
    pub joint_blend_radius: f64,
    pub task_blend_radius: f64,
    /// Seconds per waypoint move; zero selects ratio-based timing.
    pub joint_waypoint_time: f64,
    pub task_waypoint_time: f64,
    pub task_base_mode: BaseType,
    pub circle_angle: f64,
    pub circle_speed_ratio: f64,
    pub circle_accel_ratio: f64,
    pub teleop_mode: TeleopMode,
    pub joint_waypoints: Vec<Waypoint>,
    pub task_waypoints: Vec<Waypoint>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            joint_speed_level: 3,
            task_speed_level: 3,
            joint_accel_level: 3,
            task_accel_level: 3,
            joint_blend_type: BlendType::NoBlend,
            task_blend_type: BlendType::NoBlend,
            joint_blend_radius: 0.0,
            task_blend_radius: 0.0,
            joint_waypoint_time: 0.0,
            task_waypoint_time: 0.0,
            task_base_mode: BaseType::Absolute,
            circle_angle: 0.0,
            circle_speed_ratio: 25.0,
            circle_accel_ratio: 100.0,
            teleop_mode: TeleopMode::Off,
            joint_waypoints: Vec::new(),
            task_waypoints: Vec::new(),
        }
    }
}
