//! Simulated controller backend.
//!
//! Services the [`BackendRequest`] channel against an in-memory robot model
//! so the DCP server runs without hardware. Motions are applied instantly
//! and reported as in-motion for a simulated duration; kinematics is a
//! placeholder. None of this is the DCP core — it stands in for the real
//! controller services.

use dcp_protocol::{DirectValue, DirectVarType};
use dcp_server::backend::{
    BackendRequest, ConfigData, ControlData, IoData, MotionData, OpState, ProgramData,
    ProgramState, ServoData, TeleopMode, ViolationData,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const DIGITAL_BANK: usize = 32;
const ANALOG_BANK: usize = 16;
const FT_REGISTERS: usize = 6;
/// Fallback motion duration when the session requests ratio-based timing.
const DEFAULT_MOVE_TIME: Duration = Duration::from_millis(250);
const RECOVER_TIME: Duration = Duration::from_millis(200);

/// The simulated robot.
pub struct SimRobot {
    dof: usize,
    started: Instant,
    q: Vec<f64>,
    qdot: Vec<f64>,
    torque: Vec<f64>,
    task_pos: Vec<f64>,
    task_vel: Vec<f64>,
    home_pose: Vec<f64>,
    servo_on: Vec<bool>,
    brake_on: Vec<bool>,
    emergency: bool,
    collided: bool,
    violated: bool,
    recovering_until: Option<Instant>,
    direct_teaching: bool,
    teleop: TeleopMode,
    moving_until: Option<Instant>,
    move_finished: bool,
    last_violation: ViolationData,
    program: ProgramState,
    default_program: i32,
    di: Vec<bool>,
    dout: Vec<bool>,
    ai: Vec<i32>,
    ao: Vec<i32>,
    ft_robot_raw: Vec<i32>,
    ft_cb_raw: Vec<i32>,
    vars: HashMap<(DirectVarType, i32), DirectValue>,
    config: ConfigData,
}

impl SimRobot {
    pub fn new(dof: usize) -> SimRobot {
        SimRobot {
            dof,
            started: Instant::now(),
            q: vec![0.0; dof],
            qdot: vec![0.0; dof],
            torque: vec![0.0; dof],
            task_pos: vec![0.0; 6],
            task_vel: vec![0.0; 6],
            home_pose: vec![0.0, -15.0, 90.0, 0.0, 75.0, 0.0]
                .into_iter()
                .chain(std::iter::repeat(0.0))
                .take(dof)
                .collect(),
            servo_on: vec![true; dof],
            brake_on: vec![false; dof],
            emergency: false,
            collided: false,
            violated: false,
            recovering_until: None,
            direct_teaching: false,
            teleop: TeleopMode::Off,
            moving_until: None,
            move_finished: true,
            last_violation: ViolationData {
                code: 0,
                axis: -1,
                args: [0.0, 0.0],
            },
            program: ProgramState::None,
            default_program: -1,
            di: vec![false; DIGITAL_BANK],
            dout: vec![false; DIGITAL_BANK],
            ai: vec![0; ANALOG_BANK],
            ao: vec![0; ANALOG_BANK],
            ft_robot_raw: vec![0; FT_REGISTERS],
            ft_cb_raw: vec![0; FT_REGISTERS],
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

    /// Expires timed states before a request is answered.
    fn tick(&mut self) {
        let now = Instant::now();
        if let Some(until) = self.moving_until {
            if now >= until {
                self.moving_until = None;
                self.move_finished = true;
                self.qdot.iter_mut().for_each(|v| *v = 0.0);
                self.task_vel.iter_mut().for_each(|v| *v = 0.0);
            }
        }
        if let Some(until) = self.recovering_until {
            if now >= until {
                self.recovering_until = None;
            }
        }
    }

    fn op_state(&self) -> OpState {
        if self.emergency {
            OpState::EmergencyStopped
        } else if self.collided {
            OpState::Collided
        } else if self.violated {
            OpState::Violated
        } else if self.recovering_until.is_some() {
            OpState::Recovering
        } else if self.direct_teaching {
            OpState::DirectTeaching
        } else if self.moving_until.is_some() {
            OpState::Moving
        } else {
            OpState::Idle
        }
    }

    fn in_motion(&self) -> bool {
        self.moving_until.is_some()
    }

    fn check_can_move(&self) -> Result<(), String> {
        if self.emergency {
            return Err("emergency stop active".to_string());
        }
        if self.violated || self.collided {
            return Err("robot needs recovery".to_string());
        }
        Ok(())
    }

    fn begin_motion(&mut self, move_time: f64) {
        let duration = if move_time > 0.0 {
            Duration::from_secs_f64(move_time)
        } else {
            DEFAULT_MOVE_TIME
        };
        self.moving_until = Some(Instant::now() + duration);
        self.move_finished = false;
    }

    fn apply_joint_target(&mut self, target: &[f64], relative: bool) {
        for (i, value) in target.iter().take(self.dof).enumerate() {
            if relative {
                self.q[i] += value;
            } else {
                self.q[i] = *value;
            }
        }
    }

    fn apply_task_target(&mut self, target: &[f64], relative: bool) {
        for (i, value) in target.iter().take(6).enumerate() {
            if relative {
                self.task_pos[i] += value;
            } else {
                self.task_pos[i] = *value;
            }
        }
    }

    /// Answers one facade request against the model.
    pub fn handle(&mut self, request: BackendRequest) {
        use dcp_server::backend::BaseType;
        match request {
            BackendRequest::GetControlData(reply) => {
                let _ = reply.send(Ok(ControlData {
                    op_state: self.op_state(),
                    running_time: self.started.elapsed().as_secs_f64(),
                    home_pose: self.home_pose.clone(),
                    pendant_connected: false,
                }));
            }
            BackendRequest::GetServoData(reply) => {
                let _ = reply.send(Ok(ServoData {
                    q: self.q.clone(),
                    qdot: self.qdot.clone(),
                    torque: self.torque.clone(),
                    servo_on: self.servo_on.clone(),
                    brake_on: self.brake_on.clone(),
                }));
            }
            BackendRequest::GetMotionData(reply) => {
                let _ = reply.send(Ok(MotionData {
                    in_motion: self.in_motion(),
                    move_finished: self.move_finished,
                    control_mode: 0,
                    task_pos: self.task_pos.clone(),
                    task_vel: self.task_vel.clone(),
                }));
            }
            BackendRequest::GetProgramData(reply) => {
                let _ = reply.send(Ok(ProgramData {
                    state: self.program,
                    default_index: self.default_program,
                }));
            }
            BackendRequest::GetViolationData(reply) => {
                let _ = reply.send(Ok(self.last_violation.clone()));
            }
            BackendRequest::GetIoData(reply) => {
                let _ = reply.send(Ok(IoData {
                    di: self.di.clone(),
                    dout: self.dout.clone(),
                    ai: self.ai.clone(),
                    ao: self.ao.clone(),
                    ft_robot_raw: self.ft_robot_raw.clone(),
                    ft_cb_raw: self.ft_cb_raw.clone(),
                }));
            }
            BackendRequest::GetConfigData(reply) => {
                let _ = reply.send(Ok(self.config.clone()));
            }
            BackendRequest::MoveHome(reply) => {
                let result = self.check_can_move().map(|_| {
                    let home = self.home_pose.clone();
                    self.apply_joint_target(&home, false);
                    self.begin_motion(0.0);
                });
                let _ = reply.send(result);
            }
            BackendRequest::MoveZero(reply) => {
                let result = self.check_can_move().map(|_| {
                    self.q.iter_mut().for_each(|v| *v = 0.0);
                    self.begin_motion(0.0);
                });
                let _ = reply.send(result);
            }
            BackendRequest::MoveJoint {
                target,
                options,
                reply,
            } => {
                let result = self.check_can_move().map(|_| {
                    self.apply_joint_target(&target, options.base == BaseType::Relative);
                    self.begin_motion(options.move_time);
                });
                let _ = reply.send(result);
            }
            BackendRequest::MoveTask {
                target,
                options,
                reply,
            } => {
                let result = self.check_can_move().map(|_| {
                    self.apply_task_target(&target, options.base != BaseType::Absolute);
                    self.begin_motion(options.move_time);
                });
                let _ = reply.send(result);
            }
            BackendRequest::MoveCircle {
                via: _,
                target,
                angle: _,
                options,
                reply,
            } => {
                let result = self.check_can_move().map(|_| {
                    self.apply_task_target(&target, false);
                    self.begin_motion(options.move_time);
                });
                let _ = reply.send(result);
            }
            BackendRequest::TeleopMoveJoint { target, reply } => {
                let result = self.check_can_move().map(|_| {
                    self.apply_joint_target(&target, false);
                });
                let _ = reply.send(result);
            }
            BackendRequest::TeleopMoveTask { target, reply } => {
                let result = self.check_can_move().map(|_| {
                    self.apply_task_target(&target, false);
                });
                let _ = reply.send(result);
            }
            BackendRequest::Stop(reply) => {
                self.moving_until = None;
                self.move_finished = true;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::EmergencyStop(reply) => {
                self.emergency = true;
                self.moving_until = None;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::Recover(reply) => {
                self.emergency = false;
                self.collided = false;
                self.violated = false;
                self.recovering_until = Some(Instant::now() + RECOVER_TIME);
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetServo { on, reply } => {
                for (i, flag) in on.iter().take(self.dof).enumerate() {
                    self.servo_on[i] = *flag;
                }
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetBrake { on, reply } => {
                for (i, flag) in on.iter().take(self.dof).enumerate() {
                    self.brake_on[i] = *flag;
                }
                let _ = reply.send(Ok(()));
            }
            BackendRequest::StartProgram { index: _, reply } => {
                self.program = ProgramState::Running;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::PauseProgram(reply) => {
                let result = if self.program == ProgramState::Running {
                    self.program = ProgramState::Paused;
                    Ok(())
                } else {
                    Err("no running program".to_string())
                };
                let _ = reply.send(result);
            }
            BackendRequest::ResumeProgram(reply) => {
                let result = if self.program == ProgramState::Paused {
                    self.program = ProgramState::Running;
                    Ok(())
                } else {
                    Err("no paused program".to_string())
                };
                let _ = reply.send(result);
            }
            BackendRequest::StopProgram(reply) => {
                self.program = ProgramState::Stopped;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::RegisterDefaultProgram { index, reply } => {
                self.default_program = index;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::StartDirectTeaching(reply) => {
                self.direct_teaching = true;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::FinishDirectTeaching(reply) => {
                self.direct_teaching = false;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetTeleopMode { mode, reply } => {
                self.teleop = mode;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetDefaultTcp { pose, reply } => {
                self.config.default_tcp = pose;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::ResetDefaultTcp(reply) => {
                self.config.default_tcp = vec![0.0; 6];
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetCompTcp { pose, reply } => {
                self.config.comp_tcp = pose;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::ResetCompTcp(reply) => {
                self.config.comp_tcp = vec![0.0; 6];
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetRefFrame { pose, reply } => {
                self.config.ref_frame = pose;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::ResetRefFrame(reply) => {
                self.config.ref_frame = vec![0.0; 6];
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetCollisionLevel { level, reply } => {
                self.config.collision_level = level;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetSpeedRatio { ratio, reply } => {
                self.config.speed_ratio = ratio;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetJointBoundary { bound, reply } => {
                self.config.joint_boundary = bound;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetTaskBoundary { bound, reply } => {
                self.config.task_boundary = bound;
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetDigitalOutput { addr, value, reply } => {
                let result = match self.dout.get_mut(addr.max(0) as usize) {
                    Some(slot) if addr >= 0 => {
                        *slot = value;
                        Ok(())
                    }
                    _ => Err(format!("digital output {} out of range", addr)),
                };
                let _ = reply.send(result);
            }
            BackendRequest::SetDigitalOutputs { values, reply } => {
                for (i, value) in values.iter().take(self.dout.len()).enumerate() {
                    self.dout[i] = *value;
                }
                let _ = reply.send(Ok(()));
            }
            BackendRequest::SetAnalogOutput { addr, value, reply } => {
                let result = match self.ao.get_mut(addr.max(0) as usize) {
                    Some(slot) if addr >= 0 => {
                        *slot = value;
                        Ok(())
                    }
                    _ => Err(format!("analog output {} out of range", addr)),
                };
                let _ = reply.send(result);
            }
            BackendRequest::ReadDirectVariables {
                var_type,
                addr,
                count,
                reply,
            } => {
                let values = (0..count)
                    .map(|i| {
                        self.vars
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
                for (i, value) in values.into_iter().enumerate() {
                    self.vars.insert((var_type, addr + i as i32), value);
                }
                let _ = reply.send(Ok(()));
            }
            BackendRequest::InverseKinematics {
                pose,
                init_q: _,
                reply,
            } => {
                // Placeholder: echo the pose into joint space. Real inverse
                // kinematics lives in the controller, not here.
                let q = pose
                    .into_iter()
                    .chain(std::iter::repeat(0.0))
                    .take(self.dof)
                    .collect();
                let _ = reply.send(Ok(q));
            }
        }
    }
}

/// Drains the facade channel against one simulated robot until every
/// [`dcp_server::Backend`] handle is gone.
pub async fn run_backend(mut rx: mpsc::Receiver<BackendRequest>, dof: usize) {
    let mut robot = SimRobot::new(dof);
    tracing::info!(dof, "simulated backend ready");
    while let Some(request) = rx.recv().await {
        robot.tick();
        robot.handle(request);
    }
    tracing::info!("simulated backend shutting down");
}
