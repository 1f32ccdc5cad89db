//! SAPIEN Replay - feed recorded skeleton frames through a session
//!
//! Reads JSON lines from stdin. Each line is either a joint frame
//! (`{"sequence": 1, "joints": {...}}`) or an elevation request
//! (`{"elevation": 10}`). Writes go to a simulated motor.
//!
//! Usage: sapien-replay [config.json] < frames.jsonl

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use sapien_actuator::SimulatedDriver;
use sapien_core::JointFrame;
use sapien_gesture::GestureFired;
use sapien_runtime::{init_tracing, Session, SessionConfig};

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Elevation { elevation: i32 },
    Frame(JointFrame),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    init_tracing(&config.log)?;

    let driver = Arc::new(SimulatedDriver::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel::<GestureFired>();
    let session = Session::new(config, Arc::clone(&driver), tx)?;

    let robot = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(
                limb = %event.limb,
                from = %event.previous,
                to = %event.status,
                seq = event.sequence,
                "robot command"
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match serde_json::from_str::<ReplayLine>(line) {
            Ok(ReplayLine::Frame(frame)) => {
                session.on_frame(&frame);
            }
            Ok(ReplayLine::Elevation { elevation }) => session.request_elevation(elevation),
            Err(e) => warn!(line = line_no, "skipping unreadable line: {}", e),
        }
    }

    session.shutdown().await;
    robot.await?;

    info!(writes = driver.write_count(), "replay finished");
    Ok(())
}
