mod support;

use dcp_protocol::frame::{CMD_ERROR, SOF_SERVER, SW_VERSION};
use dcp_protocol::{variables, CommandCode, DcpErrorCode, Frame, StatusBits};
use dcp_server::backend::OpState;
use dcp_server::{dispatch, DcpServer, DcpServerConfig};
use support::{error_reason, f64_payload, i32_payload, request, spawn_mock, MockState, ROBOT_NAME};

fn test_config() -> DcpServerConfig {
    DcpServerConfig {
        robot_name: ROBOT_NAME.to_string(),
        ..DcpServerConfig::default()
    }
}

fn server_with(state: MockState) -> (DcpServer, support::Mock) {
    let mock = spawn_mock(state);
    let server = DcpServer::new(test_config(), mock.backend.clone());
    (server, mock)
}

#[tokio::test]
async fn check_echoes_invoke_id_and_stamps_header() {
    let (server, _mock) = server_with(MockState::default());
    let req = request(CommandCode::Check, Vec::new());
    let reply = dispatch::dispatch(server.context(), &req).await;

    assert_eq!(reply.header.invoke_id, req.header.invoke_id);
    assert_eq!(reply.header.cmd, i32::from(CommandCode::Check));
    assert_eq!(reply.header.source_of_frame, SOF_SERVER);
    assert_eq!(reply.header.sw_version, SW_VERSION);
    assert!(reply.payload.is_empty());
}

#[tokio::test]
async fn robot_name_mismatch_makes_no_command_calls() {
    let (server, mock) = server_with(MockState::default());
    let req = Frame::request("OTHER-ARM", 3, i32::from(CommandCode::MoveHome), Vec::new());
    let reply = dispatch::dispatch(server.context(), &req).await;

    assert_eq!(error_reason(&reply), Some(DcpErrorCode::NoMatchedRobot));
    assert_eq!(reply.header.invoke_id, 3);
    assert!(mock.command_calls().is_empty());
}

#[tokio::test]
async fn step_info_mismatch_is_answered() {
    let (server, _mock) = server_with(MockState::default());
    let mut req = request(CommandCode::Check, Vec::new());
    req.header.step_info = 0x09;
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::NoMatchedStep));
}

#[tokio::test]
async fn oversized_payload_is_rejected() {
    let (server, _mock) = server_with(MockState::default());
    let req = request(CommandCode::Check, vec![0u8; 201]);
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::OverDataSize));
}

#[tokio::test]
async fn unknown_code_and_unsupported_set() {
    let (server, mock) = server_with(MockState::default());

    let req = Frame::request(ROBOT_NAME, 1, 12345, Vec::new());
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::UnknownCommand));

    for cmd in [
        CommandCode::ExecuteMoveCommand,
        CommandCode::SetSyncMode,
        CommandCode::ForStreaming,
        CommandCode::ReadMemory,
    ] {
        let reply = dispatch::dispatch(server.context(), &request(cmd, Vec::new())).await;
        assert_eq!(error_reason(&reply), Some(DcpErrorCode::NotSupportCommand));
    }
    assert!(mock.command_calls().is_empty());
}

#[tokio::test]
async fn error_frames_carry_the_error_command_code() {
    let (server, _mock) = server_with(MockState::default());
    let req = Frame::request(ROBOT_NAME, 9, 12345, Vec::new());
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(reply.header.cmd, CMD_ERROR);
    assert_eq!(reply.header.invoke_id, 9);
    assert_eq!(reply.payload.len(), 4);
}

#[tokio::test]
async fn session_parameter_set_is_idempotent() {
    let (server, _mock) = server_with(MockState::default());
    let set = request(CommandCode::SetJointSpeedLevel, i32_payload(&[5]));

    let reply = dispatch::dispatch(server.context(), &set).await;
    assert_eq!(reply.header.cmd, i32::from(CommandCode::SetJointSpeedLevel));
    let after_first = server.context().session.lock().await.clone();

    let reply = dispatch::dispatch(server.context(), &set).await;
    assert_eq!(reply.header.cmd, i32::from(CommandCode::SetJointSpeedLevel));
    let after_second = server.context().session.lock().await.clone();

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.joint_speed_level, 5);

    let get = request(CommandCode::GetJointSpeedLevel, Vec::new());
    let reply = dispatch::dispatch(server.context(), &get).await;
    assert_eq!(reply.payload, 5i32.to_le_bytes().to_vec());
}

#[tokio::test]
async fn out_of_range_level_is_rejected_without_store() {
    let (server, _mock) = server_with(MockState::default());
    let set = request(CommandCode::SetJointSpeedLevel, i32_payload(&[12]));
    let reply = dispatch::dispatch(server.context(), &set).await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::NoMatchedParameter));
    assert_eq!(server.context().session.lock().await.joint_speed_level, 3);
}

#[tokio::test]
async fn short_payload_is_a_parse_failure() {
    let (server, _mock) = server_with(MockState::default());
    let set = request(CommandCode::SetJointSpeedLevel, vec![1, 0]);
    let reply = dispatch::dispatch(server.context(), &set).await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::ParseFailed));
}

#[tokio::test]
async fn move_while_moving_is_rejected_before_the_backend() {
    let state = MockState {
        in_motion: true,
        op_state: OpState::Moving,
        ..MockState::default()
    };
    let (server, mock) = server_with(state);
    let req = request(CommandCode::MoveHome, Vec::new());
    let reply = dispatch::dispatch(server.context(), &req).await;

    assert_eq!(error_reason(&reply), Some(DcpErrorCode::RobotMovingState));
    assert!(mock.command_calls().is_empty());
}

#[tokio::test]
async fn joint_move_reaches_the_backend_with_the_target() {
    let (server, mock) = server_with(MockState::default());
    let target = [10.0, -20.0, 30.0, 0.0, 15.0, 5.0];
    let req = request(CommandCode::JointMoveTo, f64_payload(&target));
    let reply = dispatch::dispatch(server.context(), &req).await;

    assert_eq!(reply.header.cmd, i32::from(CommandCode::JointMoveTo));
    let calls = mock.command_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("move_joint"), "got {:?}", calls);
}

#[tokio::test]
async fn teleop_move_requires_matching_mode() {
    let (server, mock) = server_with(MockState::default());
    let target = f64_payload(&[1.0; 6]);

    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::TeleopMoveJoint, target.clone()))
            .await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::RobotState));
    assert!(mock.command_calls().is_empty());

    let set = request(CommandCode::SetTeleopMode, i32_payload(&[1]));
    dispatch::dispatch(server.context(), &set).await;
    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::TeleopMoveJoint, target)).await;
    assert_eq!(reply.header.cmd, i32::from(CommandCode::TeleopMoveJoint));
    assert!(mock
        .command_calls()
        .iter()
        .any(|c| c == "teleop_move_joint"));
}

#[tokio::test]
async fn status_bits_follow_backend_state() {
    let state = MockState {
        op_state: OpState::EmergencyStopped,
        ..MockState::default()
    };
    let (server, _mock) = server_with(state);
    let reply = dispatch::dispatch(server.context(), &request(CommandCode::Check, Vec::new())).await;
    let bits = StatusBits::unpack(&reply.header.reserved);
    assert!(bits.emergency);
    assert!(!bits.ready);
    assert!(bits.zero, "joints at zero in the mock");
    assert!(bits.running);
}

#[tokio::test]
async fn boolean_queries_return_one_byte() {
    let state = MockState {
        op_state: OpState::Idle,
        ..MockState::default()
    };
    let (server, _mock) = server_with(state);
    let reply = dispatch::dispatch(server.context(), &request(CommandCode::IsReady, Vec::new())).await;
    assert_eq!(reply.payload, vec![1]);
    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::IsEmergencyStopped, Vec::new()))
            .await;
    assert_eq!(reply.payload, vec![0]);
}

#[tokio::test]
async fn direct_variable_boundaries() {
    let (server, _mock) = server_with(MockState::default());
    let limit = variables::ADDRESS_LIMIT;

    // Last valid address, batch of one.
    let req = request(
        CommandCode::ReadDirectVariables,
        i32_payload(&[2, limit - 1, 1]),
    );
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(reply.header.cmd, i32::from(CommandCode::ReadDirectVariables));
    assert_eq!(reply.payload.len(), 4);

    // First invalid address.
    let req = request(CommandCode::ReadDirectVariables, i32_payload(&[2, limit, 1]));
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(
        error_reason(&reply),
        Some(DcpErrorCode::DirectVariableInvalidAddress)
    );

    // Oversized batch reports the refnum limit regardless of address.
    let req = request(
        CommandCode::ReadDirectVariables,
        i32_payload(&[2, -7, variables::REFNUM_LIMIT + 1]),
    );
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(
        error_reason(&reply),
        Some(DcpErrorCode::DirectVariableRefnumLimit)
    );

    // Unknown type tag.
    let req = request(CommandCode::ReadDirectVariable, i32_payload(&[8, 0]));
    let reply = dispatch::dispatch(server.context(), &req).await;
    assert_eq!(
        error_reason(&reply),
        Some(DcpErrorCode::DirectVariableInvalidFormat)
    );
}

#[tokio::test]
async fn direct_variable_write_read_roundtrip_every_type() {
    let (server, _mock) = server_with(MockState::default());

    // (type tag, one encoded value)
    let cases: Vec<(i32, Vec<u8>)> = vec![
        (0, vec![1u8]),
        (1, (-1234i16).to_le_bytes().to_vec()),
        (2, 70000i32.to_le_bytes().to_vec()),
        (3, (-9_000_000_000i64).to_le_bytes().to_vec()),
        (4, 1.5f32.to_le_bytes().to_vec()),
        (5, (-2.25f64).to_le_bytes().to_vec()),
        (10, 40001u16.to_le_bytes().to_vec()),
    ];

    for (tag, encoded) in cases {
        for count in [1usize, 3, variables::REFNUM_LIMIT as usize] {
            let mut payload = i32_payload(&[tag, 50, count as i32]);
            let mut written = Vec::new();
            for _ in 0..count {
                written.extend_from_slice(&encoded);
            }
            payload.extend_from_slice(&written);
            let reply = dispatch::dispatch(
                server.context(),
                &request(CommandCode::WriteDirectVariables, payload),
            )
            .await;
            assert_eq!(
                reply.header.cmd,
                i32::from(CommandCode::WriteDirectVariables),
                "write failed for tag {} count {}",
                tag,
                count
            );

            let reply = dispatch::dispatch(
                server.context(),
                &request(
                    CommandCode::ReadDirectVariables,
                    i32_payload(&[tag, 50, count as i32]),
                ),
            )
            .await;
            assert_eq!(reply.payload, written, "tag {} count {}", tag, count);
        }
    }
}

#[tokio::test]
async fn io_and_state_queries_use_default_encodings() {
    let mut state = MockState::default();
    state.di[4] = true;
    state.ai[2] = -500;
    state.q = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let (server, _mock) = server_with(state);

    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::GetDigitalInput, i32_payload(&[4])))
            .await;
    assert_eq!(reply.payload, vec![1]);

    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::GetAnalogInput, i32_payload(&[2])))
            .await;
    assert_eq!(reply.payload, (-500i32).to_le_bytes().to_vec());

    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::GetJointPosition, Vec::new()))
            .await;
    assert_eq!(reply.payload.len(), 48);
    assert_eq!(
        f64::from_le_bytes(reply.payload[0..8].try_into().unwrap()),
        1.0
    );
}

#[tokio::test]
async fn default_program_flow() {
    let (server, _mock) = server_with(MockState::default());

    // Nothing registered yet.
    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::StartDefaultProgram, Vec::new()))
            .await;
    assert_eq!(error_reason(&reply), Some(DcpErrorCode::NoDefaultProgram));

    dispatch::dispatch(
        server.context(),
        &request(CommandCode::RegisterDefaultProgram, i32_payload(&[4])),
    )
    .await;
    let reply = dispatch::dispatch(
        server.context(),
        &request(CommandCode::GetRegisteredDefaultProgram, Vec::new()),
    )
    .await;
    assert_eq!(reply.payload, 4i32.to_le_bytes().to_vec());

    let reply =
        dispatch::dispatch(server.context(), &request(CommandCode::StartDefaultProgram, Vec::new()))
            .await;
    assert_eq!(reply.header.cmd, i32::from(CommandCode::StartDefaultProgram));
}
