//! Snapshot and command types exchanged with the backend controller.

use int_enum::IntEnum;
use serde::{Deserialize, Serialize};

/// Controller operating state as the backend reports it.
#[repr(i32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    SystemOff = 0,
    SystemBooting = 1,
    Idle = 2,
    Moving = 3,
    Teaching = 4,
    DirectTeaching = 5,
    Recovering = 6,
    Violated = 7,
    EmergencyStopped = 8,
    Collided = 9,
}

#[repr(i32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    None = 0,
    Running = 1,
    Paused = 2,
    Stopped = 3,
}

/// How a motion target is interpreted.
#[repr(i32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Absolute = 0,
    Relative = 1,
    /// Task motions only: relative to the current tool frame.
    RelativeTool = 2,
}

/// Trajectory blending at a motion's end point.
#[repr(i32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum BlendType {
    NoBlend = 0,
    DuplicateBlend = 1,
}

#[repr(i32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum TeleopMode {
    Off = 0,
    Joint = 1,
    Task = 2,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControlData {
    pub op_state: OpState,
    /// Seconds since the control cycle started.
    pub running_time: f64,
    pub home_pose: Vec<f64>,
    pub pendant_connected: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServoData {
    pub q: Vec<f64>,
    pub qdot: Vec<f64>,
    pub torque: Vec<f64>,
    pub servo_on: Vec<bool>,
    pub brake_on: Vec<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotionData {
    pub in_motion: bool,
    /// Latched by the backend when the last commanded motion settled.
    pub move_finished: bool,
    pub control_mode: i32,
    pub task_pos: Vec<f64>,
    pub task_vel: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub state: ProgramState,
    pub default_index: i32,
}

/// Last violation/emergency record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViolationData {
    pub code: i32,
    pub axis: i32,
    pub args: [f64; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IoData {
    pub di: Vec<bool>,
    pub dout: Vec<bool>,
    pub ai: Vec<i32>,
    pub ao: Vec<i32>,
    /// Raw FT sensor registers on the robot-side EtherCAT segment.
    pub ft_robot_raw: Vec<i32>,
    /// Raw FT sensor registers on the control-box segment.
    pub ft_cb_raw: Vec<i32>,
}

/// Tool/frame/limit configuration held by the backend config service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigData {
    pub default_tcp: Vec<f64>,
    pub comp_tcp: Vec<f64>,
    pub ref_frame: Vec<f64>,
    pub collision_level: i32,
    pub joint_boundary: Vec<f64>,
    pub task_boundary: Vec<f64>,
    pub speed_ratio: i32,
}

/// Parameters resolved from session state and attached to every move call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotionOptions {
    pub base: BaseType,
    pub blend: BlendType,
    pub blend_radius: f64,
    /// Percent of the configured maximum velocity.
    pub vel_ratio: f64,
    /// Percent of the configured maximum acceleration.
    pub acc_ratio: f64,
    /// Seconds; zero selects ratio-based timing, non-zero duration-based.
    pub move_time: f64,
}
