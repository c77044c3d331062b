//! Scripted backend for integration tests.
//!
//! Drains the facade channel against a plain state struct the test mutates
//! directly, and records every command-type call (moves, stops, writes) in
//! arrival order so tests can assert what did — and did not — reach the
//! controller.

use dcp_protocol::{CommandCode, DcpErrorCode, DirectValue, DirectVarType, Frame};
use dcp_server::backend::{
    Backend, BackendRequest, ConfigData, ControlData, IoData, MotionData, OpState, ProgramData,
    ProgramState, ServoData, ViolationData,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ROBOT_NAME: &str = "NTX-ARM6";
pub const DOF: usize = 6;

#[derive(Clone)]
pub struct MockState {
    pub op_state: OpState,
    pub in_motion: bool,
    pub move_finished: bool,
    /// When set, a dispatched move flips `in_motion` on, as the real
    /// controller would.
    pub moves_start_motion: bool,
    pub q: Vec<f64>,
    pub home_pose: Vec<f64>,
    pub pendant_connected: bool,
    pub program: ProgramState,
    pub default_index: i32,
    pub di: Vec<bool>,
    pub dout: Vec<bool>,
    pub ai: Vec<i32>,
    pub ao: Vec<i32>,
    pub vars: HashMap<(DirectVarType, i32), DirectValue>,
    pub config: ConfigData,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            op_state: OpState::Idle,
            in_motion: false,
            move_finished: true,
            moves_start_motion: false,
            q: vec![0.0; DOF],
            home_pose: vec![0.0, -15.0, 90.0, 0.0, 75.0, 0.0],
            pendant_connected: false,
            program: ProgramState::None,
            default_index: -1,
            di: vec![false; 32],
            dout: vec![false; 32],
            ai: vec![0; 16],
            ao: vec![0; 16],
            vars: HashMap::new(),
            config: ConfigData {
                default_tcp: vec![0.0; 6],
                comp_tcp: vec![0.0; 6],
                ref_frame: vec![0.0; 6],
                collision_level: 3,
                joint_boundary: vec![30.0, 100.0],
                task_boundary: vec![250.0, 1000.0],
                speed_ratio: 100,
            },
        }
    }
}

pub struct Mock {
    pub backend: Backend,
    pub state: Arc<Mutex<MockState>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl Mock {
    pub fn command_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn spawn_mock(initial: MockState) -> Mock {
    let state = Arc::new(Mutex::new(initial));
    let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let (backend, mut rx) = Backend::channel(64, Duration::from_millis(500));

    let task_state = state.clone();
    let task_calls = calls.clone();
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let mut s = task_state.lock().unwrap();
            let record = |name: String| task_calls.lock().unwrap().push(name);
            match request {
                BackendRequest::GetControlData(reply) => {
                    let _ = reply.send(Ok(ControlData {
                        op_state: s.op_state,
                        running_time: 1.0,
                        home_pose: s.home_pose.clone(),
                        pendant_connected: s.pendant_connected,
                    }));
                }
                BackendRequest::GetServoData(reply) => {
                    let _ = reply.send(Ok(ServoData {
                        q: s.q.clone(),
                        qdot: vec![0.0; DOF],
                        torque: vec![0.0; DOF],
                        servo_on: vec![true; DOF],
                        brake_on: vec![false; DOF],
                    }));
                }
                BackendRequest::GetMotionData(reply) => {
                    let _ = reply.send(Ok(MotionData {
                        in_motion: s.in_motion,
                        move_finished: s.move_finished,
                        control_mode: 0,
                        task_pos: vec![0.0; 6],
                        task_vel: vec![0.0; 6],
                    }));
                }
                BackendRequest::GetProgramData(reply) => {
                    let _ = reply.send(Ok(ProgramData {
                        state: s.program,
                        default_index: s.default_index,
                    }));
                }
                BackendRequest::GetViolationData(reply) => {
                    let _ = reply.send(Ok(ViolationData {
                        code: 0,
                        axis: -1,
                        args: [0.0, 0.0],
                    }));
                }
                BackendRequest::GetIoData(reply) => {
                    let _ = reply.send(Ok(IoData {
                        di: s.di.clone(),
                        dout: s.dout.clone(),
                        ai: s.ai.clone(),
                        ao: s.ao.clone(),
                        ft_robot_raw: vec![0; 6],
                        ft_cb_raw: vec![0; 6],
                    }));
                }
                BackendRequest::GetConfigData(reply) => {
                    let _ = reply.send(Ok(s.config.clone()));
                }
                BackendRequest::MoveHome(reply) => {
                    record("move_home".to_string());
                    if s.moves_start_motion {
                        s.in_motion = true;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::MoveZero(reply) => {
                    record("move_zero".to_string());
                    if s.moves_start_motion {
                        s.in_motion = true;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::MoveJoint { target, reply, .. } => {
                    record(format!("move_joint {:?}", target));
                    if s.moves_start_motion {
                        s.in_motion = true;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::MoveTask { target, reply, .. } => {
                    record(format!("move_task {:?}", target));
                    if s.moves_start_motion {
                        s.in_motion = true;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::MoveCircle { reply, .. } => {
                    record("move_circle".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::TeleopMoveJoint { reply, .. } => {
                    record("teleop_move_joint".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::TeleopMoveTask { reply, .. } => {
                    record("teleop_move_task".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::Stop(reply) => {
                    record("stop".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::EmergencyStop(reply) => {
                    record("emergency_stop".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::Recover(reply) => {
                    record("recover".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetServo { reply, .. } => {
                    record("set_servo".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetBrake { reply, .. } => {
                    record("set_brake".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::StartProgram { index, reply } => {
                    record(format!("start_program {:?}", index));
                    s.program = ProgramState::Running;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::PauseProgram(reply) => {
                    record("pause_program".to_string());
                    s.program = ProgramState::Paused;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::ResumeProgram(reply) => {
                    record("resume_program".to_string());
                    s.program = ProgramState::Running;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::StopProgram(reply) => {
                    record("stop_program".to_string());
                    s.program = ProgramState::Stopped;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::RegisterDefaultProgram { index, reply } => {
                    record(format!("register_default_program {}", index));
                    s.default_index = index;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::StartDirectTeaching(reply) => {
                    record("start_direct_teaching".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::FinishDirectTeaching(reply) => {
                    record("finish_direct_teaching".to_string());
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetTeleopMode { mode, reply } => {
                    record(format!("set_teleop_mode {:?}", mode));
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetDefaultTcp { pose, reply } => {
                    record("set_default_tcp".to_string());
                    s.config.default_tcp = pose;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::ResetDefaultTcp(reply) => {
                    record("reset_default_tcp".to_string());
                    s.config.default_tcp = vec![0.0; 6];
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetCompTcp { pose, reply } => {
                    record("set_comp_tcp".to_string());
                    s.config.comp_tcp = pose;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::ResetCompTcp(reply) => {
                    record("reset_comp_tcp".to_string());
                    s.config.comp_tcp = vec![0.0; 6];
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetRefFrame { pose, reply } => {
                    record("set_ref_frame".to_string());
                    s.config.ref_frame = pose;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::ResetRefFrame(reply) => {
                    record("reset_ref_frame".to_string());
                    s.config.ref_frame = vec![0.0; 6];
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetCollisionLevel { level, reply } => {
                    record(format!("set_collision_level {}", level));
                    s.config.collision_level = level;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetSpeedRatio { ratio, reply } => {
                    record(format!("set_speed_ratio {}", ratio));
                    s.config.speed_ratio = ratio;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetJointBoundary { bound, reply } => {
                    record("set_joint_boundary".to_string());
                    s.config.joint_boundary = bound;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetTaskBoundary { bound, reply } => {
                    record("set_task_boundary".to_string());
                    s.config.task_boundary = bound;
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetDigitalOutput { addr, value, reply } => {
                    record(format!("set_digital_output {} {}", addr, value));
                    if let Some(slot) = s.dout.get_mut(addr as usize) {
                        *slot = value;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetDigitalOutputs { values, reply } => {
                    record("set_digital_outputs".to_string());
                    for (i, v) in values.iter().enumerate().take(s.dout.len()) {
                        s.dout[i] = *v;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::SetAnalogOutput { addr, value, reply } => {
                    record(format!("set_analog_output {} {}", addr, value));
                    if let Some(slot) = s.ao.get_mut(addr as usize) {
                        *slot = value;
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::ReadDirectVariables {
                    var_type,
                    addr,
                    count,
                    reply,
                } => {
                    let values = (0..count)
                        .map(|i| {
                            s.vars
                                .get(&(var_type, addr + i))
                                .copied()
                                .unwrap_or_else(|| DirectValue::zero(var_type))
                        })
                        .collect();
                    let _ = reply.send(Ok(values));
                }
                BackendRequest::WriteDirectVariables {
                    var_type,
                    addr,
                    values,
                    reply,
                } => {
                    record(format!("write_direct {:?} {} x{}", var_type, addr, values.len()));
                    for (i, value) in values.into_iter().enumerate() {
                        s.vars.insert((var_type, addr + i as i32), value);
                    }
                    let _ = reply.send(Ok(()));
                }
                BackendRequest::InverseKinematics { pose, reply, .. } => {
                    let q = pose.into_iter().take(DOF).collect();
                    let _ = reply.send(Ok(q));
                }
            }
        }
    });

    Mock {
        backend,
        state,
        calls,
    }
}

/// Request frame in the configured robot's name.
pub fn request(cmd: CommandCode, payload: Vec<u8>) -> Frame {
    Frame::request(ROBOT_NAME, 7, i32::from(cmd), payload)
}

/// Extracts the numeric reason of an error frame, if the frame is one.
pub fn error_reason(frame: &Frame) -> Option<DcpErrorCode> {
    if frame.header.cmd != dcp_protocol::frame::CMD_ERROR {
        return None;
    }
    let raw = i32::from_le_bytes([
        frame.payload[0],
        frame.payload[1],
        frame.payload[2],
        frame.payload[3],
    ]);
    DcpErrorCode::try_from(raw as u32).ok()
}

pub fn i32_payload(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn f64_payload(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
