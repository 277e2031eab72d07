// src/streetlight/hardware.rs
//
// Brightness sinks. The microcontroller speaks a line protocol:
//   LED1:<0-255>\n
//   LED2:<0-255>\n

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::{info, warn};

pub trait LightSink: Send {
    fn write_channels(&mut self, a: u8, b: u8) -> Result<()>;
}

/// Line-protocol sink over any writer (a tty opened as a file in production).
pub struct SerialLightSink<W: Write + Send> {
    port: W,
}

impl<W: Write + Send> SerialLightSink<W> {
    pub fn new(port: W) -> Self {
        Self { port }
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

impl<W: Write + Send> LightSink for SerialLightSink<W> {
    fn write_channels(&mut self, a: u8, b: u8) -> Result<()> {
        writeln!(self.port, "LED1:{}", a).context("LED1 write failed")?;
        writeln!(self.port, "LED2:{}", b).context("LED2 write failed")?;
        self.port.flush().context("Serial flush failed")?;
        Ok(())
    }
}

/// No hardware attached; writes succeed and go nowhere.
pub struct NullLightSink;

impl LightSink for NullLightSink {
    fn write_channels(&mut self, _a: u8, _b: u8) -> Result<()> {
        Ok(())
    }
}

/// Open the configured port, or fall back to a null sink if it is missing.
pub fn open_sink(serial_port: Option<&str>) -> Box<dyn LightSink> {
    let Some(path) = serial_port else {
        info!("⚪ No serial port configured, brightness stays in memory");
        return Box::new(NullLightSink);
    };

    match OpenOptions::new().write(true).open(path) {
        Ok(file) => {
            info!("✓ Streetlight controller connected on {}", path);
            Box::new(SerialLightSink::new(file))
        }
        Err(e) => {
            warn!(
                "⚠️  Could not open serial port {}: {}. Continuing without hardware.",
                path, e
            );
            Box::new(NullLightSink)
        }
    }
}
