//! Attention Monitor - Demo Entry Point
//!
//! Wires the pipeline to a scripted landmark stream: calibrates, then
//! walks through focused, distracted, and drowsy stretches while
//! logging emitted state records.

mod synthetic;

use attention::{
    run, AttentionConfig, AttentionEngine, FocusZone, PipelineCommand,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use synthetic::SyntheticFace;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const FRAME_INTERVAL_MS: u64 = 66; // ~15 Hz sensor target
const CALIBRATION_MS: u64 = 3_000;
const SESSION_MS: u64 = 26_000;

pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Attention Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config = AttentionConfig {
        zone: attention::config::ZoneConfig {
            rect: Some(FocusZone::new(0.25, 0.25, 0.75, 0.75)),
            ..Default::default()
        },
        ..Default::default()
    };

    let engine = AttentionEngine::new(config);
    let mut states = engine.subscribe_states();

    let (frame_tx, frame_rx) = mpsc::channel(32);
    let (cmd_tx, cmd_rx) = mpsc::channel(8);

    let pipeline = tokio::spawn(run(engine, frame_rx, cmd_rx));

    // Log every emitted state record
    let logger = tokio::spawn(async move {
        while let Ok(record) = states.recv().await {
            if record.reasons.is_empty() {
                info!(state = ?record.state, score = record.score, "state");
            } else {
                info!(
                    state = ?record.state,
                    score = record.score,
                    reasons = %record.reasons.join("; "),
                    "state changed"
                );
            }
        }
    });

    // Kick off calibration while frames stream
    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send(PipelineCommand::Calibrate {
            duration_ms: CALIBRATION_MS,
            reply: reply_tx,
        })
        .await?;

    let started = now_ms();
    let face = SyntheticFace::new(started);
    let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));
    let mut calibration_reply = Some(reply_rx);

    loop {
        ticker.tick().await;
        let now = now_ms();
        if now.saturating_sub(started) >= SESSION_MS {
            break;
        }

        frame_tx.send(face.frame(now)).await?;

        if let Some(rx) = &mut calibration_reply {
            match rx.try_recv() {
                Ok(Ok(baseline)) => {
                    info!(
                        ear0 = baseline.ear0,
                        threshold = baseline.closure_threshold,
                        "calibration complete"
                    );
                    calibration_reply = None;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "calibration failed; using default threshold");
                    calibration_reply = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => calibration_reply = None,
            }
        }
    }

    drop(frame_tx);
    drop(cmd_tx);
    pipeline.await?;
    logger.abort();

    info!("session complete");
    Ok(())
}
