use std::{
    collections::VecDeque,
    fs::{self, File},
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{BotError, BotResult};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const SERIAL_BY_ID_DIR: &str = "/dev/serial/by-id";
const DEVICE_NAME_MARKERS: [&str; 3] = ["Arduino", "USB-SERIAL", "CH340"];

/// Line-oriented byte stream coming from the sensor board.
///
/// Implementations block; the cache drives them from the blocking pool.
pub trait SensorSource: Send {
    /// Drop everything the device sent since the last read.
    fn discard_buffered(&mut self) -> BotResult<()>;

    /// Next raw line, or `Ok(None)` when nothing arrived within the read timeout.
    fn read_line(&mut self) -> BotResult<Option<Vec<u8>>>;
}

type LineResult = io::Result<Vec<u8>>;

/// Reads lines from a character device on a dedicated thread.
///
/// The thread pushes complete lines into a channel, which gives every read a
/// timeout and lets `discard_buffered` drop queued lines without touching the
/// device. The thread is detached: a blocked `read` on a tty cannot be
/// interrupted, so it exits on the next line after the receiver is dropped.
pub struct DeviceLineReader {
    lines: Receiver<LineResult>,
    read_timeout: Duration,
    closed: bool,
}

impl DeviceLineReader {
    pub fn open(path: &Path, read_timeout: Duration) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open sensor device {}", path.display()))?;
        log_info!("Reading sensor lines from {}", path.display());
        Self::from_reader(file, read_timeout)
    }

    pub fn from_reader<R>(reader: R, read_timeout: Duration) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (line_tx, line_rx) = mpsc::channel::<LineResult>();

        thread::Builder::new()
            .name("sensorbot-device".into())
            .spawn(move || {
                let mut reader = BufReader::new(reader);
                loop {
                    let mut line = Vec::new();
                    match reader.read_until(b'\n', &mut line) {
                        Ok(0) => break,
                        Ok(_) => {
                            if line_tx.send(Ok(line)).is_err() {
                                break;
                            }
                        }
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(err) => {
                            let _ = line_tx.send(Err(err));
                            break;
                        }
                    }
                }
            })
            .context("failed to spawn sensor reader thread")?;

        Ok(Self {
            lines: line_rx,
            read_timeout,
            closed: false,
        })
    }

    fn closed_error(&self) -> BotError {
        BotError::DeviceRead("sensor stream closed".into())
    }
}

impl SensorSource for DeviceLineReader {
    fn discard_buffered(&mut self) -> BotResult<()> {
        loop {
            match self.lines.try_recv() {
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => {
                    self.closed = true;
                    return Err(BotError::DeviceRead(err.to_string()));
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return Err(self.closed_error());
                }
            }
        }
    }

    fn read_line(&mut self) -> BotResult<Option<Vec<u8>>> {
        if self.closed {
            return Err(self.closed_error());
        }

        match self.lines.recv_timeout(self.read_timeout) {
            Ok(Ok(line)) => Ok(Some(line)),
            Ok(Err(err)) => {
                self.closed = true;
                Err(BotError::DeviceRead(err.to_string()))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Err(self.closed_error())
            }
        }
    }
}

/// Stand-in board producing plausible indoor values.
pub struct SimulatedSource {
    rng: StdRng,
    pending: VecDeque<String>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            pending: VecDeque::new(),
        }
    }

    fn sample(&mut self, low: f64, high: f64) -> f64 {
        let raw: f64 = self.rng.gen_range(low..=high);
        (raw * 10.0).round() / 10.0
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SimulatedSource {
    fn discard_buffered(&mut self) -> BotResult<()> {
        self.pending.clear();
        Ok(())
    }

    fn read_line(&mut self) -> BotResult<Option<Vec<u8>>> {
        if self.pending.is_empty() {
            let temperature = self.sample(18.0, 30.0);
            let humidity = self.sample(30.0, 70.0);
            self.pending.push_back(format!("T:{temperature:.1}\r\n"));
            self.pending.push_back(format!("H:{humidity:.1}\r\n"));
        }
        Ok(self.pending.pop_front().map(String::into_bytes))
    }
}

/// Find a USB serial adapter that looks like the sensor board.
pub fn discover_device() -> Option<PathBuf> {
    discover_device_in(Path::new(SERIAL_BY_ID_DIR))
}

pub fn discover_device_in(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log_warn!("cannot list {}: {err}", dir.display());
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| DEVICE_NAME_MARKERS.iter().any(|marker| name.contains(marker)))
                .unwrap_or(false)
        })
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}
