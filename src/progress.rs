//! Upload progress bars and a log writer that keeps them pinned.

use crate::models::{ProgressStatus, UploadProgressEntry};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Print a line above any live bars
pub fn print_line(line: impl Into<String>) {
    let _ = multi_progress().println(line.into());
}

/// Print a line to stdout with the bars suspended
pub fn print_stdout(line: impl AsRef<str>) {
    multi_progress().suspend(|| println!("{}", line.as_ref()));
}

fn upload_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} [{bar:30}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// One bar per upload entry, kept in step with the session's progress list
#[derive(Default)]
pub struct UploadBars {
    bars: HashMap<String, ProgressBar>,
}

impl UploadBars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, uploads: &[UploadProgressEntry]) {
        for entry in uploads {
            let bar = self.bars.entry(entry.id.clone()).or_insert_with(|| {
                let bar = multi_progress().add(ProgressBar::new(100));
                bar.set_style(upload_style());
                bar.set_prefix("upload");
                bar.set_message(entry.name.clone());
                bar
            });
            bar.set_position(entry.percent as u64);
            if entry.status == ProgressStatus::Complete && !bar.is_finished() {
                bar.finish_with_message(format!("✓ {}", entry.name));
            }
        }

        let live: Vec<&str> = uploads.iter().map(|e| e.id.as_str()).collect();
        self.bars.retain(|id, bar| {
            if live.contains(&id.as_str()) {
                true
            } else {
                bar.finish_and_clear();
                multi_progress().remove(bar);
                false
            }
        });
    }

    pub fn clear(&mut self) {
        for (_, bar) in self.bars.drain() {
            bar.finish_and_clear();
            multi_progress().remove(&bar);
        }
    }
}

#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    buffer: String,
}

impl LogWriter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = self.buffer.trim_end_matches('\n').trim_end_matches('\r');
        print_line(line);
        self.buffer.clear();
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf);
        self.buffer.push_str(&chunk);

        while let Some(idx) = self.buffer.find('\n') {
            let line = self.buffer[..idx].trim_end_matches('\r').to_string();
            print_line(line);
            self.buffer.drain(..idx + 1);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer();
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::new()
    }
}
