//! Command dispatch.
//!
//! A total function from (command code, payload) to a response frame. The
//! numeric code decodes into [`CommandCode`]; the exhaustive match below is
//! the dispatch table. Handlers return `Result<DcpValue, DcpErrorCode>` —
//! every failure, from a short payload to an unreachable backend, becomes an
//! error frame on the requesting connection and nothing else.

use crate::backend::{BaseType, BlendType, MotionOptions, TeleopMode};
use crate::server::ServerContext;
use crate::session::{self, Waypoint, LEVEL_MAX, LEVEL_MIN};
use crate::status;
use crate::waypoint::WaypointKind;
use dcp_protocol::{
    variables, CommandCode, DcpError, DcpErrorCode, DcpValue, DirectVarType, Frame, PayloadReader,
    TASK_DOF,
};

/// Executes one request frame and builds the reply, status field included.
///
/// The status bit-vector is synthesized after the handler ran, so the reply
/// reflects the state the command left behind.
pub async fn dispatch(ctx: &ServerContext, frame: &Frame) -> Frame {
    let invoke_id = frame.header.invoke_id;
    let result = handle(ctx, frame).await;
    let status = status::synthesize(&ctx.backend).await;
    match result {
        Ok(value) => Frame::response(
            &ctx.config.robot_name,
            invoke_id,
            frame.header.cmd,
            status.pack(),
            value.encode(),
        ),
        Err(code) => {
            tracing::debug!(
                cmd = frame.header.cmd,
                invoke_id,
                reason = ?code,
                "request failed"
            );
            Frame::error(&ctx.config.robot_name, invoke_id, status.pack(), code)
        }
    }
}

async fn handle(ctx: &ServerContext, frame: &Frame) -> Result<DcpValue, DcpErrorCode> {
    frame.header.validate(&ctx.config.robot_name)?;

    let code = CommandCode::try_from(frame.header.cmd)
        .map_err(|_| DcpErrorCode::UnknownCommand)?;
    if code == CommandCode::Error {
        return Err(DcpErrorCode::UnknownCommand);
    }
    if code.is_unsupported() {
        return Err(DcpErrorCode::NotSupportCommand);
    }
    if code.is_motion() {
        ensure_not_moving(ctx).await?;
    }

    let dof = ctx.config.dof;
    let mut r = PayloadReader::new(&frame.payload);

    match code {
        // -- control ------------------------------------------------------
        CommandCode::Check => Ok(DcpValue::Unit),
        CommandCode::EmergencyStop => unit(ctx.backend.emergency_stop().await),
        CommandCode::ResetRobot => unit(ctx.backend.recover().await),
        CommandCode::SetServo => {
            let on = r.read_bool_array(dof).map_err(parse)?;
            unit(ctx.backend.set_servo(on).await)
        }
        CommandCode::SetBrake => {
            let on = r.read_bool_array(dof).map_err(parse)?;
            unit(ctx.backend.set_brake(on).await)
        }
        CommandCode::Stop => unit(ctx.backend.stop().await),

        // -- motion -------------------------------------------------------
        CommandCode::MoveHome => unit(ctx.backend.move_home().await),
        CommandCode::MoveZero => unit(ctx.backend.move_zero().await),
        CommandCode::JointMoveTo => {
            let target = r.read_f64_array(dof).map_err(parse)?;
            let options = joint_options(ctx, BaseType::Absolute).await;
            unit(ctx.backend.move_joint(target, options).await)
        }
        CommandCode::JointMoveBy => {
            let target = r.read_f64_array(dof).map_err(parse)?;
            let options = joint_options(ctx, BaseType::Relative).await;
            unit(ctx.backend.move_joint(target, options).await)
        }
        CommandCode::TaskMoveTo => {
            let target = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let options = task_options(ctx, BaseType::Absolute).await;
            unit(ctx.backend.move_task(target, options).await)
        }
        CommandCode::TaskMoveBy => {
            let target = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let options = task_options(ctx, BaseType::Relative).await;
            unit(ctx.backend.move_task(target, options).await)
        }
        CommandCode::MoveCircle => {
            let via = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let target = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let (angle, options) = {
                let state = ctx.session.lock().await;
                (
                    state.circle_angle,
                    MotionOptions {
                        base: BaseType::Absolute,
                        blend: state.task_blend_type,
                        blend_radius: state.task_blend_radius,
                        vel_ratio: state.circle_speed_ratio,
                        acc_ratio: state.circle_accel_ratio,
                        move_time: state.task_waypoint_time,
                    },
                )
            };
            unit(ctx.backend.move_circle(via, target, angle, options).await)
        }
        CommandCode::TeleopMoveJoint => {
            {
                let state = ctx.session.lock().await;
                if state.teleop_mode != TeleopMode::Joint {
                    return Err(DcpErrorCode::RobotState);
                }
            }
            let target = r.read_f64_array(dof).map_err(parse)?;
            unit(ctx.backend.teleop_move_joint(target).await)
        }
        CommandCode::TeleopMoveTask => {
            {
                let state = ctx.session.lock().await;
                if state.teleop_mode != TeleopMode::Task {
                    return Err(DcpErrorCode::RobotState);
                }
            }
            let target = r.read_f64_array(TASK_DOF).map_err(parse)?;
            unit(ctx.backend.teleop_move_task(target).await)
        }

        // -- programs -----------------------------------------------------
        CommandCode::StartCurrentProgram => unit(ctx.backend.start_program(None).await),
        CommandCode::PauseCurrentProgram => unit(ctx.backend.pause_program().await),
        CommandCode::ResumeCurrentProgram => unit(ctx.backend.resume_program().await),
        CommandCode::StopCurrentProgram => unit(ctx.backend.stop_program().await),
        CommandCode::StartDefaultProgram => {
            let program = ctx.backend.get_program_data().await.map_err(backend)?;
            if program.default_index < 0 {
                return Err(DcpErrorCode::NoDefaultProgram);
            }
            unit(ctx.backend.start_program(Some(program.default_index)).await)
        }
        CommandCode::RegisterDefaultProgram => {
            let index = r.read_i32().map_err(parse)?;
            unit(ctx.backend.register_default_program(index).await)
        }
        CommandCode::GetRegisteredDefaultProgram => {
            let program = ctx.backend.get_program_data().await.map_err(backend)?;
            Ok(DcpValue::Int(program.default_index))
        }

        // -- boolean state queries ---------------------------------------
        CommandCode::IsRobotRunning
        | CommandCode::IsReady
        | CommandCode::IsEmergencyStopped
        | CommandCode::IsCollided
        | CommandCode::IsErrorState
        | CommandCode::IsBusy
        | CommandCode::IsMoveFinished
        | CommandCode::IsHome
        | CommandCode::IsZero
        | CommandCode::IsResetting
        | CommandCode::IsDirectTeaching
        | CommandCode::IsTeaching
        | CommandCode::IsProgramRunning
        | CommandCode::IsProgramPaused
        | CommandCode::IsPendantConnected => {
            let bits = status::synthesize(&ctx.backend).await;
            let value = match code {
                CommandCode::IsRobotRunning => bits.running,
                CommandCode::IsReady => bits.ready,
                CommandCode::IsEmergencyStopped => bits.emergency,
                CommandCode::IsCollided => bits.collided,
                CommandCode::IsErrorState => bits.errored,
                CommandCode::IsBusy => bits.busy,
                CommandCode::IsMoveFinished => bits.move_finished,
                CommandCode::IsHome => bits.home,
                CommandCode::IsZero => bits.zero,
                CommandCode::IsResetting => bits.resetting,
                CommandCode::IsDirectTeaching => bits.direct_teaching,
                CommandCode::IsTeaching => bits.teaching,
                CommandCode::IsProgramRunning => bits.program_running,
                CommandCode::IsProgramPaused => bits.program_paused,
                _ => bits.pendant_connected,
            };
            Ok(DcpValue::Bool(value))
        }

        // -- teaching / teleop mode --------------------------------------
        CommandCode::StartDirectTeaching => unit(ctx.backend.start_direct_teaching().await),
        CommandCode::FinishDirectTeaching => unit(ctx.backend.finish_direct_teaching().await),
        CommandCode::SetTeleopMode => {
            let raw = r.read_i32().map_err(parse)?;
            let mode =
                TeleopMode::try_from(raw).map_err(|_| DcpErrorCode::NoMatchedParameter)?;
            ctx.backend.set_teleop_mode(mode).await.map_err(backend)?;
            ctx.session.lock().await.teleop_mode = mode;
            Ok(DcpValue::Unit)
        }

        // -- waypoint queues ---------------------------------------------
        CommandCode::JointPushWaypoint => {
            let relative = r.read_bool().map_err(parse)?;
            let pose = r.read_f64_array(dof).map_err(parse)?;
            let mut state = ctx.session.lock().await;
            let waypoint = Waypoint {
                base: if relative {
                    BaseType::Relative
                } else {
                    BaseType::Absolute
                },
                blend_radius: state.joint_blend_radius,
                pose,
            };
            state.joint_waypoints.push(waypoint);
            Ok(DcpValue::Unit)
        }
        CommandCode::JointPopWaypoint => {
            ctx.session.lock().await.joint_waypoints.pop();
            Ok(DcpValue::Unit)
        }
        CommandCode::JointClearWaypoint => {
            ctx.session.lock().await.joint_waypoints.clear();
            Ok(DcpValue::Unit)
        }
        CommandCode::JointExecuteWaypoints => {
            ensure_not_moving(ctx).await?;
            ctx.waypoints.try_execute(
                WaypointKind::Joint,
                ctx.session.clone(),
                ctx.backend.clone(),
            )?;
            Ok(DcpValue::Unit)
        }
        CommandCode::TaskPushWaypoint => {
            let raw = r.read_u8().map_err(parse)?;
            let base = BaseType::try_from(raw as i32)
                .map_err(|_| DcpErrorCode::NoMatchedParameter)?;
            let pose = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let mut state = ctx.session.lock().await;
            let waypoint = Waypoint {
                base,
                blend_radius: state.task_blend_radius,
                pose,
            };
            state.task_waypoints.push(waypoint);
            Ok(DcpValue::Unit)
        }
        CommandCode::TaskPopWaypoint => {
            ctx.session.lock().await.task_waypoints.pop();
            Ok(DcpValue::Unit)
        }
        CommandCode::TaskClearWaypoint => {
            ctx.session.lock().await.task_waypoints.clear();
            Ok(DcpValue::Unit)
        }
        CommandCode::TaskExecuteWaypoints => {
            ensure_not_moving(ctx).await?;
            ctx.waypoints.try_execute(
                WaypointKind::Task,
                ctx.session.clone(),
                ctx.backend.clone(),
            )?;
            Ok(DcpValue::Unit)
        }

        // -- tool / frame / limits ---------------------------------------
        CommandCode::SetDefaultTcp => {
            let pose = r.read_f64_array(TASK_DOF).map_err(parse)?;
            unit(ctx.backend.set_default_tcp(pose).await)
        }
        CommandCode::ResetDefaultTcp => unit(ctx.backend.reset_default_tcp().await),
        CommandCode::SetCompensationTcp => {
            let pose = r.read_f64_array(TASK_DOF).map_err(parse)?;
            unit(ctx.backend.set_comp_tcp(pose).await)
        }
        CommandCode::ResetCompensationTcp => unit(ctx.backend.reset_comp_tcp().await),
        CommandCode::SetRefFrame => {
            let pose = r.read_f64_array(TASK_DOF).map_err(parse)?;
            unit(ctx.backend.set_ref_frame(pose).await)
        }
        CommandCode::ResetRefFrame => unit(ctx.backend.reset_ref_frame().await),
        CommandCode::SetCollisionLevel => {
            let level = r.read_i32().map_err(parse)?;
            if !(1..=5).contains(&level) {
                return Err(DcpErrorCode::NoMatchedParameter);
            }
            unit(ctx.backend.set_collision_level(level).await)
        }
        CommandCode::SetJointBoundary => {
            let bound = r.read_f64_array(2).map_err(parse)?;
            unit(ctx.backend.set_joint_boundary(bound).await)
        }
        CommandCode::SetTaskBoundary => {
            let bound = r.read_f64_array(2).map_err(parse)?;
            unit(ctx.backend.set_task_boundary(bound).await)
        }
        CommandCode::SetSpeedRatio => {
            let ratio = r.read_i32().map_err(parse)?;
            if !(0..=100).contains(&ratio) {
                return Err(DcpErrorCode::NoMatchedParameter);
            }
            unit(ctx.backend.set_speed_ratio(ratio).await)
        }

        // -- session parameter setters -----------------------------------
        CommandCode::SetJointWaypointTime => {
            let time = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.joint_waypoint_time = time;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskWaypointTime => {
            let time = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.task_waypoint_time = time;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskBaseMode => {
            let raw = r.read_i32().map_err(parse)?;
            let mode = BaseType::try_from(raw).map_err(|_| DcpErrorCode::NoMatchedParameter)?;
            ctx.session.lock().await.task_base_mode = mode;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetJointBlendRadius => {
            let radius = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.joint_blend_radius = radius;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskBlendRadius => {
            let radius = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.task_blend_radius = radius;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetJointSpeedLevel => {
            let level = level_arg(&mut r)?;
            ctx.session.lock().await.joint_speed_level = level;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskSpeedLevel => {
            let level = level_arg(&mut r)?;
            ctx.session.lock().await.task_speed_level = level;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetJointAccelLevel => {
            let level = level_arg(&mut r)?;
            ctx.session.lock().await.joint_accel_level = level;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskAccelLevel => {
            let level = level_arg(&mut r)?;
            ctx.session.lock().await.task_accel_level = level;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetJointBlendType => {
            let blend = blend_arg(&mut r)?;
            ctx.session.lock().await.joint_blend_type = blend;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetTaskBlendType => {
            let blend = blend_arg(&mut r)?;
            ctx.session.lock().await.task_blend_type = blend;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetCircleAngle => {
            let angle = r.read_f64().map_err(parse)?;
            ctx.session.lock().await.circle_angle = angle;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetCircleSpeedRatio => {
            let ratio = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.circle_speed_ratio = ratio;
            Ok(DcpValue::Unit)
        }
        CommandCode::SetCircleAccelRatio => {
            let ratio = non_negative(r.read_f64().map_err(parse)?)?;
            ctx.session.lock().await.circle_accel_ratio = ratio;
            Ok(DcpValue::Unit)
        }

        // -- config / session getters ------------------------------------
        CommandCode::GetDefaultTcp => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(config.default_tcp))
        }
        CommandCode::GetCompensationTcp => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(config.comp_tcp))
        }
        CommandCode::GetRefFrame => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(config.ref_frame))
        }
        CommandCode::GetCollisionLevel => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::Int(config.collision_level))
        }
        CommandCode::GetJointBoundary => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(config.joint_boundary))
        }
        CommandCode::GetTaskBoundary => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(config.task_boundary))
        }
        CommandCode::GetSpeedRatio => {
            let config = ctx.backend.get_config_data().await.map_err(backend)?;
            Ok(DcpValue::Int(config.speed_ratio))
        }
        CommandCode::GetJointWaypointTime => {
            Ok(DcpValue::Float(ctx.session.lock().await.joint_waypoint_time))
        }
        CommandCode::GetTaskWaypointTime => {
            Ok(DcpValue::Float(ctx.session.lock().await.task_waypoint_time))
        }
        CommandCode::GetTaskBaseMode => {
            Ok(DcpValue::Int(i32::from(
                ctx.session.lock().await.task_base_mode,
            )))
        }
        CommandCode::GetJointBlendRadius => {
            Ok(DcpValue::Float(ctx.session.lock().await.joint_blend_radius))
        }
        CommandCode::GetTaskBlendRadius => {
            Ok(DcpValue::Float(ctx.session.lock().await.task_blend_radius))
        }
        CommandCode::GetJointSpeedLevel => {
            Ok(DcpValue::Int(ctx.session.lock().await.joint_speed_level))
        }
        CommandCode::GetTaskSpeedLevel => {
            Ok(DcpValue::Int(ctx.session.lock().await.task_speed_level))
        }
        CommandCode::GetJointAccelLevel => {
            Ok(DcpValue::Int(ctx.session.lock().await.joint_accel_level))
        }
        CommandCode::GetTaskAccelLevel => {
            Ok(DcpValue::Int(ctx.session.lock().await.task_accel_level))
        }
        CommandCode::GetJointBlendType => {
            Ok(DcpValue::Int(i32::from(
                ctx.session.lock().await.joint_blend_type,
            )))
        }
        CommandCode::GetTaskBlendType => {
            Ok(DcpValue::Int(i32::from(
                ctx.session.lock().await.task_blend_type,
            )))
        }

        // -- state queries ------------------------------------------------
        CommandCode::GetRunningTime => {
            let control = ctx.backend.get_control_data().await.map_err(backend)?;
            Ok(DcpValue::Float(control.running_time))
        }
        CommandCode::GetControlMode => {
            let motion = ctx.backend.get_motion_data().await.map_err(backend)?;
            Ok(DcpValue::Int(motion.control_mode))
        }
        CommandCode::GetJointServoState => {
            let servo = ctx.backend.get_servo_data().await.map_err(backend)?;
            let mut state = servo.servo_on;
            state.extend_from_slice(&servo.brake_on);
            Ok(DcpValue::BoolArray(state))
        }
        CommandCode::GetJointPosition => {
            let servo = ctx.backend.get_servo_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(servo.q))
        }
        CommandCode::GetJointVelocity => {
            let servo = ctx.backend.get_servo_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(servo.qdot))
        }
        CommandCode::GetTaskPosition => {
            let motion = ctx.backend.get_motion_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(motion.task_pos))
        }
        CommandCode::GetTaskVelocity => {
            let motion = ctx.backend.get_motion_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(motion.task_vel))
        }
        CommandCode::GetTorque => {
            let servo = ctx.backend.get_servo_data().await.map_err(backend)?;
            Ok(DcpValue::FloatArray(servo.torque))
        }
        CommandCode::GetInverseKinematics => {
            let pose = r.read_f64_array(TASK_DOF).map_err(parse)?;
            let servo = ctx.backend.get_servo_data().await.map_err(backend)?;
            let q = ctx
                .backend
                .inverse_kinematics(pose, servo.q)
                .await
                .map_err(backend)?;
            Ok(DcpValue::FloatArray(q))
        }
        CommandCode::GetLastEmergencyInfo => {
            let violation = ctx.backend.get_violation_data().await.map_err(backend)?;
            let mut out = Vec::with_capacity(24);
            out.extend_from_slice(&violation.code.to_le_bytes());
            out.extend_from_slice(&violation.axis.to_le_bytes());
            for arg in violation.args {
                out.extend_from_slice(&arg.to_le_bytes());
            }
            Ok(DcpValue::Raw(out))
        }

        // -- smart I/O ----------------------------------------------------
        CommandCode::GetDigitalInput => {
            let addr = r.read_i32().map_err(parse)?;
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            bank_get(&io.di, addr).map(DcpValue::Bool)
        }
        CommandCode::GetDigitalInputs => {
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            Ok(DcpValue::BoolArray(io.di))
        }
        CommandCode::SetDigitalOutput => {
            let addr = r.read_i32().map_err(parse)?;
            let value = r.read_bool().map_err(parse)?;
            unit(ctx.backend.set_digital_output(addr, value).await)
        }
        CommandCode::SetDigitalOutputs => {
            let values: Vec<bool> = r.read_rest().iter().map(|b| *b != 0).collect();
            unit(ctx.backend.set_digital_outputs(values).await)
        }
        CommandCode::GetAnalogInput => {
            let addr = r.read_i32().map_err(parse)?;
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            bank_get(&io.ai, addr).map(DcpValue::Int)
        }
        CommandCode::SetAnalogOutput => {
            let addr = r.read_i32().map_err(parse)?;
            let value = r.read_i32().map_err(parse)?;
            unit(ctx.backend.set_analog_output(addr, value).await)
        }
        CommandCode::GetDigitalOutput => {
            let addr = r.read_i32().map_err(parse)?;
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            bank_get(&io.dout, addr).map(DcpValue::Bool)
        }
        CommandCode::GetDigitalOutputs => {
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            Ok(DcpValue::BoolArray(io.dout))
        }
        CommandCode::GetAnalogOutput => {
            let addr = r.read_i32().map_err(parse)?;
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            bank_get(&io.ao, addr).map(DcpValue::Int)
        }

        // -- EtherCAT raw -------------------------------------------------
        CommandCode::GetFtSensorRobotRaw => {
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            Ok(DcpValue::IntArray(io.ft_robot_raw))
        }
        CommandCode::GetFtSensorControlBoxRaw => {
            let io = ctx.backend.get_io_data().await.map_err(backend)?;
            Ok(DcpValue::IntArray(io.ft_cb_raw))
        }

        // -- direct variables --------------------------------------------
        CommandCode::ReadDirectVariable => {
            let var_type = var_type_arg(&mut r)?;
            let addr = r.read_i32().map_err(parse)?;
            read_direct(ctx, var_type, addr, 1).await
        }
        CommandCode::ReadDirectVariables => {
            let var_type = var_type_arg(&mut r)?;
            let addr = r.read_i32().map_err(parse)?;
            let count = r.read_i32().map_err(parse)?;
            read_direct(ctx, var_type, addr, count).await
        }
        CommandCode::WriteDirectVariable => {
            let var_type = var_type_arg(&mut r)?;
            let addr = r.read_i32().map_err(parse)?;
            write_direct(ctx, var_type, addr, 1, r.read_rest()).await
        }
        CommandCode::WriteDirectVariables => {
            let var_type = var_type_arg(&mut r)?;
            let addr = r.read_i32().map_err(parse)?;
            let count = r.read_i32().map_err(parse)?;
            write_direct(ctx, var_type, addr, count, r.read_rest()).await
        }

        // Unsupported codes were filtered above; Error never dispatches.
        CommandCode::ExecuteMoveCommand
        | CommandCode::SetSyncMode
        | CommandCode::ForExtended
        | CommandCode::ForStreaming
        | CommandCode::SendKeyCommand
        | CommandCode::ReadMemory
        | CommandCode::WriteMemory
        | CommandCode::Error => Err(DcpErrorCode::NotSupportCommand),
    }
}

async fn ensure_not_moving(ctx: &ServerContext) -> Result<(), DcpErrorCode> {
    let motion = ctx.backend.get_motion_data().await.map_err(backend)?;
    if motion.in_motion {
        return Err(DcpErrorCode::RobotMovingState);
    }
    Ok(())
}

async fn joint_options(ctx: &ServerContext, base: BaseType) -> MotionOptions {
    let state = ctx.session.lock().await;
    MotionOptions {
        base,
        blend: state.joint_blend_type,
        blend_radius: state.joint_blend_radius,
        vel_ratio: session::velocity_ratio(state.joint_speed_level),
        acc_ratio: session::accel_ratio(state.joint_accel_level),
        move_time: state.joint_waypoint_time,
    }
}

async fn task_options(ctx: &ServerContext, base: BaseType) -> MotionOptions {
    let state = ctx.session.lock().await;
    MotionOptions {
        base,
        blend: state.task_blend_type,
        blend_radius: state.task_blend_radius,
        vel_ratio: session::velocity_ratio(state.task_speed_level),
        acc_ratio: session::accel_ratio(state.task_accel_level),
        move_time: state.task_waypoint_time,
    }
}

async fn read_direct(
    ctx: &ServerContext,
    var_type: DirectVarType,
    addr: i32,
    count: i32,
) -> Result<DcpValue, DcpErrorCode> {
    variables::validate_range(addr, count)?;
    let values = ctx
        .backend
        .read_direct_variables(var_type, addr, count)
        .await
        .map_err(backend)?;
    Ok(DcpValue::Raw(variables::pack_values(&values)))
}

async fn write_direct(
    ctx: &ServerContext,
    var_type: DirectVarType,
    addr: i32,
    count: i32,
    bytes: &[u8],
) -> Result<DcpValue, DcpErrorCode> {
    variables::validate_range(addr, count)?;
    let values = variables::unpack_values(var_type, count as usize, bytes)
        .map_err(|_| DcpErrorCode::NoMatchedDataSize)?;
    ctx.backend
        .write_direct_variables(var_type, addr, values)
        .await
        .map_err(backend)?;
    Ok(DcpValue::Unit)
}

fn var_type_arg(r: &mut PayloadReader<'_>) -> Result<DirectVarType, DcpErrorCode> {
    let raw = r.read_i32().map_err(parse)?;
    DirectVarType::try_from(raw).map_err(|_| DcpErrorCode::DirectVariableInvalidFormat)
}

fn level_arg(r: &mut PayloadReader<'_>) -> Result<i32, DcpErrorCode> {
    let level = r.read_i32().map_err(parse)?;
    if !(LEVEL_MIN..=LEVEL_MAX).contains(&level) {
        return Err(DcpErrorCode::NoMatchedParameter);
    }
    Ok(level)
}

fn blend_arg(r: &mut PayloadReader<'_>) -> Result<BlendType, DcpErrorCode> {
    let raw = r.read_i32().map_err(parse)?;
    BlendType::try_from(raw).map_err(|_| DcpErrorCode::NoMatchedParameter)
}

fn non_negative(value: f64) -> Result<f64, DcpErrorCode> {
    if !value.is_finite() || value < 0.0 {
        return Err(DcpErrorCode::NoMatchedParameter);
    }
    Ok(value)
}

fn bank_get<T: Copy>(bank: &[T], addr: i32) -> Result<T, DcpErrorCode> {
    usize::try_from(addr)
        .ok()
        .and_then(|i| bank.get(i).copied())
        .ok_or(DcpErrorCode::NoMatchedParameter)
}

fn unit(result: Result<(), DcpError>) -> Result<DcpValue, DcpErrorCode> {
    result.map(|_| DcpValue::Unit).map_err(backend)
}

fn parse(_: DcpError) -> DcpErrorCode {
    DcpErrorCode::ParseFailed
}

fn backend(e: DcpError) -> DcpErrorCode {
    tracing::warn!("backend call failed: {}", e);
    DcpErrorCode::ProcessFailed
}
