// src/console.rs
//
// Line-oriented operator console on stdin. Stands in for the dashboard's
// buttons and polling; every command maps onto one facade call.

use crate::status::StatusFacade;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// How long `frames` waits for each frame before giving up.
pub const FRAME_WAIT: Duration = Duration::from_secs(5);

pub const USAGE: &str = "commands: ev | incident | mode <auto|manual> | brightness <a|b> <0-255> | \
signal | light | dashboard | metrics | frames <n> <dir> | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TriggerEvRoute,
    TriggerIncident,
    SetMode(String),
    SetBrightness { channel: String, value: i64 },
    Signal,
    Light,
    Dashboard,
    Metrics,
    Frames { count: usize, dir: PathBuf },
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((head, args)) = parts.split_first() else {
            return Err(USAGE.to_string());
        };

        let command = match (head.to_lowercase().as_str(), args) {
            ("ev", []) => Command::TriggerEvRoute,
            ("incident", []) => Command::TriggerIncident,
            ("mode", [mode]) => Command::SetMode(mode.to_string()),
            ("brightness", [channel, value]) => {
                let value = value
                    .parse::<i64>()
                    .map_err(|_| format!("brightness value must be an integer, got {:?}", value))?;
                Command::SetBrightness {
                    channel: channel.to_string(),
                    value,
                }
            }
            ("signal", []) => Command::Signal,
            ("light", []) => Command::Light,
            ("dashboard", []) => Command::Dashboard,
            ("metrics", []) => Command::Metrics,
            ("frames", [count, dir]) => {
                let count = count
                    .parse::<usize>()
                    .map_err(|_| format!("frame count must be a number, got {:?}", count))?;
                Command::Frames {
                    count,
                    dir: PathBuf::from(dir),
                }
            }
            ("help", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => return Err(format!("unrecognized {:?}; {}", line.trim(), USAGE)),
        };
        Ok(command)
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

fn error_json(message: impl std::fmt::Display) -> String {
    to_json(&serde_json::json!({ "status": "error", "message": message.to_string() }))
}

/// Run one command and render its response as JSON.
pub async fn execute(facade: &StatusFacade, command: Command) -> Result<String> {
    let response = match command {
        Command::TriggerEvRoute => match facade.trigger_ev_route() {
            Ok(ack) => to_json(&ack),
            Err(e) => error_json(e),
        },
        Command::TriggerIncident => match facade.trigger_incident() {
            Ok(ack) => to_json(&ack),
            Err(e) => error_json(e),
        },
        Command::SetMode(mode) => match facade.set_streetlight_mode(&mode) {
            Ok(mode) => to_json(&serde_json::json!({ "mode": mode })),
            Err(e) => error_json(e),
        },
        Command::SetBrightness { channel, value } => {
            match facade.set_brightness(&channel, value) {
                Ok(brightness) => to_json(&brightness),
                Err(e) => error_json(e),
            }
        }
        Command::Signal => to_json(&facade.signal_snapshot()),
        Command::Light => to_json(&facade.streetlight_snapshot()),
        Command::Dashboard => to_json(&facade.dashboard_snapshot()),
        Command::Metrics => to_json(&facade.metrics()),
        Command::Frames { count, dir } => {
            let written = save_frames(facade, count, &dir).await?;
            to_json(&serde_json::json!({ "frames_written": written, "dir": dir }))
        }
        Command::Help => USAGE.to_string(),
        Command::Quit => to_json(&serde_json::json!({ "status": "bye" })),
    };
    Ok(response)
}

async fn save_frames(facade: &StatusFacade, count: usize, dir: &Path) -> Result<usize> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut stream = facade.stream_frames();
    for i in 0..count {
        let jpeg = tokio::time::timeout(FRAME_WAIT, stream.next_jpeg())
            .await
            .with_context(|| format!("No camera frame within {}s", FRAME_WAIT.as_secs()))?;
        let path = dir.join(format!("frame_{:04}.jpg", i));
        tokio::fs::write(&path, &jpeg)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(count)
}

/// Blocking stdin reads live on their own thread so they never hold up
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Console read failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Read commands until `quit`, EOF, or shutdown.
pub async fn run(facade: StatusFacade, shutdown_tx: watch::Sender<bool>) {
    let mut lines = spawn_stdin_reader();
    let mut shutdown_rx = shutdown_tx.subscribe();
    info!("⌨️  Console ready. {}", USAGE);

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = shutdown_rx.changed() => break,
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => {
                let _ = shutdown_tx.send(true);
                break;
            }
            Ok(command) => match execute(&facade, command).await {
                Ok(response) => println!("{}", response),
                Err(e) => println!("{}", error_json(format!("{:#}", e))),
            },
            Err(usage) => println!("{}", usage),
        }
    }
}
