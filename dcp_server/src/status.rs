//! Status synthesis.
//!
//! Every response carries a 15-predicate bit-vector derived from live
//! backend state. The predicates are pure comparisons over four polled
//! snapshots; nothing here is cached between responses.

use crate::backend::{Backend, ControlData, MotionData, OpState, ProgramData, ProgramState, ServoData};
use dcp_protocol::StatusBits;

/// Joint deviation below this (degrees) counts as "at" a reference pose.
pub const POSE_TOLERANCE_DEG: f64 = 0.05;

/// Polls the backend and folds the snapshots into the status bit-vector.
///
/// A failed poll yields the all-false vector: responses must always carry a
/// well-formed reserved field, even when the backend is unreachable.
pub async fn synthesize(backend: &Backend) -> StatusBits {
    let (control, servo, motion, program) = tokio::join!(
        backend.get_control_data(),
        backend.get_servo_data(),
        backend.get_motion_data(),
        backend.get_program_data(),
    );
    match (control, servo, motion, program) {
        (Ok(control), Ok(servo), Ok(motion), Ok(program)) => {
            derive(&control, &servo, &motion, &program)
        }
        (control, servo, motion, program) => {
            let failed = [
                control.err().map(|e| e.to_string()),
                servo.err().map(|e| e.to_string()),
                motion.err().map(|e| e.to_string()),
                program.err().map(|e| e.to_string()),
            ];
            tracing::warn!(?failed, "status poll failed, sending empty status");
            StatusBits::default()
        }
    }
}

/// Pure derivation from already-polled snapshots.
pub fn derive(
    control: &ControlData,
    servo: &ServoData,
    motion: &MotionData,
    program: &ProgramData,
) -> StatusBits {
    StatusBits {
        running: !matches!(control.op_state, OpState::SystemOff | OpState::SystemBooting),
        ready: control.op_state == OpState::Idle,
        emergency: control.op_state == OpState::EmergencyStopped,
        collided: control.op_state == OpState::Collided,
        errored: control.op_state == OpState::Violated,
        busy: motion.in_motion,
        move_finished: motion.move_finished,
        home: near_pose(&servo.q, &control.home_pose),
        zero: servo.q.iter().all(|v| v.abs() < POSE_TOLERANCE_DEG),
        resetting: control.op_state == OpState::Recovering,
        teaching: control.op_state == OpState::Teaching,
        direct_teaching: control.op_state == OpState::DirectTeaching,
        program_running: program.state == ProgramState::Running,
        program_paused: program.state == ProgramState::Paused,
        pendant_connected: control.pendant_connected,
    }
}

fn near_pose(q: &[f64], reference: &[f64]) -> bool {
    q.len() == reference.len()
        && q.iter()
            .zip(reference)
            .all(|(a, b)| (a - b).abs() < POSE_TOLERANCE_DEG)
}
