//! Rolling Logger
//!
//! Routes `log` and `tracing` records through one subscriber. Every formatted
//! line lands in a fixed-size circular buffer (readable with `recent_lines`
//! for bug reports) and is echoed to stderr natively or to the browser
//! console under wasm.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

static BUFFER: OnceLock<RollingBuffer> = OnceLock::new();

/// Circular line buffer; oldest lines are evicted once `capacity` is reached
#[derive(Clone)]
pub struct RollingBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, line: &str) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct BufferWriter(RollingBuffer);

impl<'a> MakeWriter<'a> for RollingBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(self.clone())
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.0.push(&format!("[{}] {}", stamp, line));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
struct ConsoleWriter;

#[cfg(target_arch = "wasm32")]
impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(text.trim_end()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install the global subscriber. Also bridges `log` records, so crates
/// using the `log` macros end up in the same buffer.
pub fn init_logger(app_name: &str, capacity: usize) -> Result<(), String> {
    let buffer = BUFFER.get_or_init(|| RollingBuffer::new(capacity)).clone();

    let buffer_layer = tracing_subscriber::fmt::layer()
        .with_writer(buffer)
        .with_ansi(false)
        .without_time();

    #[cfg(not(target_arch = "wasm32"))]
    let output_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    #[cfg(target_arch = "wasm32")]
    let output_layer = tracing_subscriber::fmt::layer()
        .with_writer(|| ConsoleWriter)
        .with_ansi(false)
        .without_time();

    tracing_subscriber::registry()
        .with(buffer_layer)
        .with(output_layer)
        .try_init()
        .map_err(|e| format!("Failed to init logger: {}", e))?;

    log::info!("{} logger ready (keeping {} lines)", app_name, capacity);
    Ok(())
}

/// Lines currently held by the global buffer, oldest first
pub fn recent_lines() -> Vec<String> {
    BUFFER.get().map(RollingBuffer::lines).unwrap_or_default()
}

pub fn info(message: &str) -> Result<(), String> {
    if BUFFER.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    log::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    if BUFFER.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    log::error!("{}", message);
    Ok(())
}
