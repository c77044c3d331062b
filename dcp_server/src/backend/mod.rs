//! The Backend Facade.
//!
//! The actual controller services (motion, device I/O, configuration,
//! EtherCAT, real-time data) live outside this process. Everything the DCP
//! core needs from them goes through one typed request channel: each call
//! enqueues a [`BackendRequest`] carrying a oneshot reply sender and awaits
//! the reply under a bounded timeout. The service side — the production
//! bridge or the `sim` crate's model — drains the receiver.
//!
//! [`Backend`] is a cheap clone; every connection task and the waypoint
//! executor hold their own handle.

mod types;

pub use types::*;

use dcp_protocol::{DcpError, DirectValue, DirectVarType};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// Reply channel carried inside each request. The error string is the
/// backend's rejection reason; transport failures are the facade's own.
pub type Reply<T> = oneshot::Sender<Result<T, String>>;

/// Every operation the DCP core may ask of the controller.
#[derive(Debug)]
pub enum BackendRequest {
    GetControlData(Reply<ControlData>),
    GetServoData(Reply<ServoData>),
    GetMotionData(Reply<MotionData>),
    GetProgramData(Reply<ProgramData>),
    GetViolationData(Reply<ViolationData>),
    GetIoData(Reply<IoData>),
    GetConfigData(Reply<ConfigData>),

    MoveHome(Reply<()>),
    MoveZero(Reply<()>),
    MoveJoint {
        target: Vec<f64>,
        options: MotionOptions,
        reply: Reply<()>,
    },
    MoveTask {
        target: Vec<f64>,
        options: MotionOptions,
        reply: Reply<()>,
    },
    MoveCircle {
        via: Vec<f64>,
        target: Vec<f64>,
        angle: f64,
        options: MotionOptions,
        reply: Reply<()>,
    },
    TeleopMoveJoint {
        target: Vec<f64>,
        reply: Reply<()>,
    },
    TeleopMoveTask {
        target: Vec<f64>,
        reply: Reply<()>,
    },

    Stop(Reply<()>),
    EmergencyStop(Reply<()>),
    Recover(Reply<()>),
    SetServo {
        on: Vec<bool>,
        reply: Reply<()>,
    },
    SetBrake {
        on: Vec<bool>,
        reply: Reply<()>,
    },

    StartProgram {
        index: Option<i32>,
        reply: Reply<()>,
    },
    PauseProgram(Reply<()>),
    ResumeProgram(Reply<()>),
    StopProgram(Reply<()>),
    RegisterDefaultProgram {
        index: i32,
        reply: Reply<()>,
    },

    StartDirectTeaching(Reply<()>),
    FinishDirectTeaching(Reply<()>),
    SetTeleopMode {
        mode: TeleopMode,
        reply: Reply<()>,
    },

    SetDefaultTcp {
        pose: Vec<f64>,
        reply: Reply<()>,
    },
    ResetDefaultTcp(Reply<()>),
    SetCompTcp {
        pose: Vec<f64>,
        reply: Reply<()>,
    },
    ResetCompTcp(Reply<()>),
    SetRefFrame {
        pose: Vec<f64>,
        reply: Reply<()>,
    },
    ResetRefFrame(Reply<()>),
    SetCollisionLevel {
        level: i32,
        reply: Reply<()>,
    },
    SetSpeedRatio {
        ratio: i32,
        reply: Reply<()>,
    },
    SetJointBoundary {
        bound: Vec<f64>,
        reply: Reply<()>,
    },
    SetTaskBoundary {
        bound: Vec<f64>,
        reply: Reply<()>,
    },

    SetDigitalOutput {
        addr: i32,
        value: bool,
        reply: Reply<()>,
    },
    SetDigitalOutputs {
        values: Vec<bool>,
        reply: Reply<()>,
    },
    SetAnalogOutput {
        addr: i32,
        value: i32,
        reply: Reply<()>,
    },

    ReadDirectVariables {
        var_type: DirectVarType,
        addr: i32,
        count: i32,
        reply: Reply<Vec<DirectValue>>,
    },
    WriteDirectVariables {
        var_type: DirectVarType,
        addr: i32,
        values: Vec<DirectValue>,
        reply: Reply<()>,
    },

    InverseKinematics {
        pose: Vec<f64>,
        init_q: Vec<f64>,
        reply: Reply<Vec<f64>>,
    },
}

/// Clonable handle over the backend request channel.
#[derive(Debug, Clone)]
pub struct Backend {
    tx: mpsc::Sender<BackendRequest>,
    call_timeout: Duration,
}

impl Backend {
    /// Creates the handle and the service-side receiver.
    pub fn channel(
        capacity: usize,
        call_timeout: Duration,
    ) -> (Backend, mpsc::Receiver<BackendRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Backend { tx, call_timeout }, rx)
    }

    async fn call<T, F>(&self, make: F) -> Result<T, DcpError>
    where
        F: FnOnce(Reply<T>) -> BackendRequest,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| DcpError::Backend("backend channel closed".to_string()))?;
        match timeout(self.call_timeout, reply_rx).await {
            Err(_) => Err(DcpError::Backend("backend call timed out".to_string())),
            Ok(Err(_)) => Err(DcpError::Backend("backend dropped the reply".to_string())),
            Ok(Ok(Err(reason))) => Err(DcpError::Backend(reason)),
            Ok(Ok(Ok(value))) => Ok(value),
        }
    }

    pub async fn get_control_data(&self) -> Result<ControlData, DcpError> {
        self.call(BackendRequest::GetControlData).await
    }

    pub async fn get_servo_data(&self) -> Result<ServoData, DcpError> {
        self.call(BackendRequest::GetServoData).await
    }

    pub async fn get_motion_data(&self) -> Result<MotionData, DcpError> {
        self.call(BackendRequest::GetMotionData).await
    }

    pub async fn get_program_data(&self) -> Result<ProgramData, DcpError> {
        self.call(BackendRequest::GetProgramData).await
    }

    pub async fn get_violation_data(&self) -> Result<ViolationData, DcpError> {
        self.call(BackendRequest::GetViolationData).await
    }

    pub async fn get_io_data(&self) -> Result<IoData, DcpError> {
        self.call(BackendRequest::GetIoData).await
    }

    pub async fn get_config_data(&self) -> Result<ConfigData, DcpError> {
        self.call(BackendRequest::GetConfigData).await
    }

    pub async fn move_home(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::MoveHome).await
    }

    pub async fn move_zero(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::MoveZero).await
    }

    pub async fn move_joint(
        &self,
        target: Vec<f64>,
        options: MotionOptions,
    ) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::MoveJoint {
            target,
            options,
            reply,
        })
        .await
    }

    pub async fn move_task(
        &self,
        target: Vec<f64>,
        options: MotionOptions,
    ) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::MoveTask {
            target,
            options,
            reply,
        })
        .await
    }

    pub async fn move_circle(
        &self,
        via: Vec<f64>,
        target: Vec<f64>,
        angle: f64,
        options: MotionOptions,
    ) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::MoveCircle {
            via,
            target,
            angle,
            options,
            reply,
        })
        .await
    }

    pub async fn teleop_move_joint(&self, target: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::TeleopMoveJoint { target, reply })
            .await
    }

    pub async fn teleop_move_task(&self, target: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::TeleopMoveTask { target, reply })
            .await
    }

    pub async fn stop(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::Stop).await
    }

    pub async fn emergency_stop(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::EmergencyStop).await
    }

    pub async fn recover(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::Recover).await
    }

    pub async fn set_servo(&self, on: Vec<bool>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetServo { on, reply }).await
    }

    pub async fn set_brake(&self, on: Vec<bool>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetBrake { on, reply }).await
    }

    pub async fn start_program(&self, index: Option<i32>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::StartProgram { index, reply })
            .await
    }

    pub async fn pause_program(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::PauseProgram).await
    }

    pub async fn resume_program(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::ResumeProgram).await
    }

    pub async fn stop_program(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::StopProgram).await
    }

    pub async fn register_default_program(&self, index: i32) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::RegisterDefaultProgram { index, reply })
            .await
    }

    pub async fn start_direct_teaching(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::StartDirectTeaching).await
    }

    pub async fn finish_direct_teaching(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::FinishDirectTeaching).await
    }

    pub async fn set_teleop_mode(&self, mode: TeleopMode) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetTeleopMode { mode, reply })
            .await
    }

    pub async fn set_default_tcp(&self, pose: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetDefaultTcp { pose, reply })
            .await
    }

    pub async fn reset_default_tcp(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::ResetDefaultTcp).await
    }

    pub async fn set_comp_tcp(&self, pose: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetCompTcp { pose, reply })
            .await
    }

    pub async fn reset_comp_tcp(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::ResetCompTcp).await
    }

    pub async fn set_ref_frame(&self, pose: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetRefFrame { pose, reply })
            .await
    }

    pub async fn reset_ref_frame(&self) -> Result<(), DcpError> {
        self.call(BackendRequest::ResetRefFrame).await
    }

    pub async fn set_collision_level(&self, level: i32) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetCollisionLevel { level, reply })
            .await
    }

    pub async fn set_speed_ratio(&self, ratio: i32) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetSpeedRatio { ratio, reply })
            .await
    }

    pub async fn set_joint_boundary(&self, bound: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetJointBoundary { bound, reply })
            .await
    }

    pub async fn set_task_boundary(&self, bound: Vec<f64>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetTaskBoundary { bound, reply })
            .await
    }

    pub async fn set_digital_output(&self, addr: i32, value: bool) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetDigitalOutput { addr, value, reply })
            .await
    }

    pub async fn set_digital_outputs(&self, values: Vec<bool>) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetDigitalOutputs { values, reply })
            .await
    }

    pub async fn set_analog_output(&self, addr: i32, value: i32) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::SetAnalogOutput { addr, value, reply })
            .await
    }

    pub async fn read_direct_variables(
        &self,
        var_type: DirectVarType,
        addr: i32,
        count: i32,
    ) -> Result<Vec<DirectValue>, DcpError> {
        self.call(|reply| BackendRequest::ReadDirectVariables {
            var_type,
            addr,
            count,
            reply,
        })
        .await
    }

    pub async fn write_direct_variables(
        &self,
        var_type: DirectVarType,
        addr: i32,
        values: Vec<DirectValue>,
    ) -> Result<(), DcpError> {
        self.call(|reply| BackendRequest::WriteDirectVariables {
            var_type,
            addr,
            values,
            reply,
        })
        .await
    }

    pub async fn inverse_kinematics(
        &self,
        pose: Vec<f64>,
        init_q: Vec<f64>,
    ) -> Result<Vec<f64>, DcpError> {
        self.call(|reply| BackendRequest::InverseKinematics {
            pose,
            init_q,
            reply,
        })
        .await
    }
}
