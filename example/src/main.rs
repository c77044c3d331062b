//! Minimal DCP client walking a server through a representative session:
//! ping, a couple of queries, session parameters, a waypoint run, and a
//! direct-variable round trip. Run the `sim` binary first, then this.

use dcp_protocol::{CommandCode, DcpError, Frame, StatusBits};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

struct DcpClient {
    stream: TcpStream,
    robot_name: String,
    invoke_id: i32,
}

impl DcpClient {
    async fn connect(addr: &str, robot_name: &str) -> Result<DcpClient, DcpError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| DcpError::FailedToSend(e.to_string()))?;
        Ok(DcpClient {
            stream,
            robot_name: robot_name.to_string(),
            invoke_id: 1,
        })
    }

    async fn call(&mut self, cmd: CommandCode, payload: Vec<u8>) -> Result<Frame, DcpError> {
        let request = Frame::request(&self.robot_name, self.invoke_id, i32::from(cmd), payload);
        self.invoke_id += 1;
        self.stream
            .write_all(&request.encode())
            .await
            .map_err(|e| DcpError::FailedToSend(e.to_string()))?;

        let mut acc = Vec::new();
        let mut buf = vec![0u8; 1024];
        loop {
            if let Some(frame) = Frame::take_from(&mut acc)? {
                return Ok(frame);
            }
            let n = self
                .stream
                .read(&mut buf)
                .await
                .map_err(|e| DcpError::FailedToReceive(e.to_string()))?;
            if n == 0 {
                return Err(DcpError::Disconnected);
            }
            acc.extend_from_slice(&buf[..n]);
        }
    }
}

fn f64_payload(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode_f64s(payload: &[u8]) -> Vec<f64> {
    payload
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), DcpError> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6066".to_string());
    let mut client = DcpClient::connect(&addr, "NTX-ARM6").await?;
    println!("connected to {}", addr);

    let reply = client.call(CommandCode::Check, Vec::new()).await?;
    let status = StatusBits::unpack(&reply.header.reserved);
    println!(
        "check ok, invoke {} echoed, ready={} zero={}",
        reply.header.invoke_id, status.ready, status.zero
    );

    let reply = client.call(CommandCode::GetJointPosition, Vec::new()).await?;
    println!("joint position: {:?}", decode_f64s(&reply.payload));

    // Session parameters: speed level 5, a small blend radius for the run.
    client
        .call(CommandCode::SetJointSpeedLevel, 5i32.to_le_bytes().to_vec())
        .await?;
    client
        .call(
            CommandCode::SetJointBlendRadius,
            f64_payload(&[0.0]),
        )
        .await?;

    // Two absolute joint waypoints, then a detached execution run.
    for pose in [
        [10.0, 0.0, 45.0, 0.0, 30.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ] {
        let mut payload = vec![0u8]; // absolute
        payload.extend_from_slice(&f64_payload(&pose));
        client.call(CommandCode::JointPushWaypoint, payload).await?;
    }
    let reply = client
        .call(CommandCode::JointExecuteWaypoints, Vec::new())
        .await?;
    println!("waypoint run started (cmd echo {})", reply.header.cmd);

    loop {
        let reply = client.call(CommandCode::IsBusy, Vec::new()).await?;
        if reply.payload == [0] {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    println!("waypoint run finished");

    // Direct variables: write three i32 values, read them back.
    let mut payload = Vec::new();
    payload.extend_from_slice(&2i32.to_le_bytes()); // DWord
    payload.extend_from_slice(&100i32.to_le_bytes()); // address
    payload.extend_from_slice(&3i32.to_le_bytes()); // count
    for v in [11i32, 22, 33] {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    client
        .call(CommandCode::WriteDirectVariables, payload)
        .await?;

    let mut payload = Vec::new();
    payload.extend_from_slice(&2i32.to_le_bytes());
    payload.extend_from_slice(&100i32.to_le_bytes());
    payload.extend_from_slice(&3i32.to_le_bytes());
    let reply = client.call(CommandCode::ReadDirectVariables, payload).await?;
    let values: Vec<i32> = reply
        .payload
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    println!("direct variables read back: {:?}", values);

    Ok(())
}
