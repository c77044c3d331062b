//! Waypoint execution.
//!
//! An execute command snapshots the relevant queue and spawns one detached
//! task that feeds the backend a move per waypoint. A single process-wide
//! busy flag serializes runs across every connection; a second execute while
//! busy is rejected outright, never queued.
//!
//! There is no cancellation path. Stop and emergency-stop act on the backend
//! directly and leave both the queue and the busy flag alone; a stopped run
//! keeps the flag until its completion poll sees the robot not moving. Known
//! limitation: if the backend never settles, only a restart releases the
//! flag.

use crate::backend::{Backend, BlendType, MotionOptions};
use crate::session::{self, SessionState, Waypoint, BLEND_ZERO_TOLERANCE};
use dcp_protocol::DcpErrorCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Pause between dispatched moves so the backend motion queue is not overrun.
const DISPATCH_PAUSE: Duration = Duration::from_millis(50);
/// Poll interval while waiting for the backend to report not-moving.
const COMPLETION_POLL: Duration = Duration::from_millis(100);

/// Which queue an execution run drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointKind {
    Joint,
    Task,
}

/// The busy flag. Only `try_start` and `release` exist; there is no blocking
/// acquire, because a busy executor rejects rather than queues.
#[derive(Debug, Default)]
pub struct WaypointGuard {
    busy: AtomicBool,
}

impl WaypointGuard {
    pub fn try_start(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct WaypointExecutor {
    guard: Arc<WaypointGuard>,
}

impl WaypointExecutor {
    pub fn new() -> WaypointExecutor {
        WaypointExecutor {
            guard: Arc::new(WaypointGuard::default()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Starts a detached run over the given queue, or reports robot-moving
    /// when one is already active. Returns as soon as the task is spawned;
    /// the requesting connection never blocks on execution.
    pub fn try_execute(
        &self,
        kind: WaypointKind,
        session: Arc<Mutex<SessionState>>,
        backend: Backend,
    ) -> Result<(), DcpErrorCode> {
        if !self.guard.try_start() {
            return Err(DcpErrorCode::RobotMovingState);
        }
        let guard = self.guard.clone();
        tokio::spawn(async move {
            run(kind, session, backend, guard).await;
        });
        Ok(())
    }
}

impl Default for WaypointExecutor {
    fn default() -> Self {
        WaypointExecutor::new()
    }
}

async fn run(
    kind: WaypointKind,
    session: Arc<Mutex<SessionState>>,
    backend: Backend,
    guard: Arc<WaypointGuard>,
) {
    let (waypoints, vel_ratio, acc_ratio, move_time) = {
        let state = session.lock().await;
        match kind {
            WaypointKind::Joint => (
                state.joint_waypoints.clone(),
                session::velocity_ratio(state.joint_speed_level),
                session::accel_ratio(state.joint_accel_level),
                state.joint_waypoint_time,
            ),
            WaypointKind::Task => (
                state.task_waypoints.clone(),
                session::velocity_ratio(state.task_speed_level),
                session::accel_ratio(state.task_accel_level),
                state.task_waypoint_time,
            ),
        }
    };

    tracing::debug!(?kind, count = waypoints.len(), "waypoint run started");

    let mut dispatched = 0usize;
    for waypoint in &waypoints {
        let options = options_for(waypoint, vel_ratio, acc_ratio, move_time);
        let sent = match kind {
            WaypointKind::Joint => backend.move_joint(waypoint.pose.clone(), options).await,
            WaypointKind::Task => backend.move_task(waypoint.pose.clone(), options).await,
        };
        if let Err(e) = sent {
            // Abort dispatching but keep the queue so the client can retry
            // after clearing the fault.
            tracing::warn!(?kind, dispatched, "waypoint dispatch failed: {}", e);
            guard.release();
            return;
        }
        dispatched += 1;
        sleep(DISPATCH_PAUSE).await;
    }

    // The backend has no completion callback; poll until it settles.
    loop {
        match backend.get_motion_data().await {
            Ok(motion) if !motion.in_motion => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(?kind, "completion poll failed: {}", e);
                break;
            }
        }
        sleep(COMPLETION_POLL).await;
    }

    {
        let mut state = session.lock().await;
        match kind {
            WaypointKind::Joint => state.joint_waypoints.clear(),
            WaypointKind::Task => state.task_waypoints.clear(),
        }
    }
    guard.release();
    tracing::debug!(?kind, dispatched, "waypoint run finished");
}

fn options_for(waypoint: &Waypoint, vel_ratio: f64, acc_ratio: f64, move_time: f64) -> MotionOptions {
    let blend = if waypoint.blend_radius.abs() < BLEND_ZERO_TOLERANCE {
        BlendType::NoBlend
    } else {
        BlendType::DuplicateBlend
    };
    MotionOptions {
        base: waypoint.base,
        blend,
        blend_radius: waypoint.blend_radius,
        vel_ratio,
        acc_ratio,
        move_time,
    }
}
