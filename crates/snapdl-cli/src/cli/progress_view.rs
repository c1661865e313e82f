//! Live download panel: one bar per video plus the overall counter.
//!
//! The panel is redrawn in place with ANSI cursor movement. Result lines
//! ("Video has been saved in ...", "Download failed: ...") are printed above
//! it, so they stay in the scrollback after the panel goes away.
//!
//! Every panel line is kept narrower than the terminal. A wrapped line would
//! occupy two rows while `erase` only clears one per line.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use snapdl_core::downloader::{BatchProgress, ProgressEvent, TaskProgress};
use tokio::sync::mpsc::UnboundedReceiver;

const REFRESH: Duration = Duration::from_millis(100);
const BAR_WIDTH: usize = 30;
const MIN_BAR_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Erase the whole panel when the batch ends.
    pub transient: bool,
    /// Drop a task's line as soon as it finishes.
    pub instant_clear: bool,
}

pub struct ProgressView<W: Write> {
    out: W,
    opts: ViewOptions,
    progress: BatchProgress,
    started: HashMap<usize, Instant>,
    /// Terminal columns.
    width: usize,
    /// Panel lines currently on screen.
    drawn: usize,
}

impl<W: Write> ProgressView<W> {
    pub fn new(out: W, opts: ViewOptions, width: usize) -> Self {
        Self {
            out,
            opts,
            progress: BatchProgress::new(0),
            started: HashMap::new(),
            width,
            drawn: 0,
        }
    }

    pub fn apply(&mut self, event: &ProgressEvent) -> io::Result<()> {
        self.progress.apply(event);
        if let ProgressEvent::Started { index, .. } = event {
            self.started.insert(*index, Instant::now());
        }
        if let Some(line) = event.result_line() {
            self.erase()?;
            writeln!(self.out, "{line}")?;
            self.draw()?;
        }
        Ok(())
    }

    pub fn draw(&mut self) -> io::Result<()> {
        self.erase()?;
        let lines = self.panel_lines();
        for line in &lines {
            writeln!(self.out, "{line}")?;
        }
        self.drawn = lines.len();
        self.out.flush()
    }

    /// Final frame: erased when transient, otherwise left on screen.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.opts.transient {
            self.erase()?;
            self.out.flush()
        } else {
            self.draw()
        }
    }

    pub fn into_progress(self) -> BatchProgress {
        self.progress
    }

    fn erase(&mut self) -> io::Result<()> {
        for _ in 0..self.drawn {
            write!(self.out, "\x1b[1A\x1b[2K")?;
        }
        self.drawn = 0;
        Ok(())
    }

    fn panel_lines(&self) -> Vec<String> {
        if self.progress.total == 0 {
            return Vec::new();
        }
        let mut lines: Vec<String> = self
            .progress
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| !(self.opts.instant_clear && task.finished))
            .map(|(index, task)| task_line(task, self.started.get(&index), self.width))
            .collect();
        let overall = self.progress.completed as f64 / self.progress.total as f64;
        let line = format!(
            "Overall Progress {} ({} of {} videos downloaded)",
            bar(overall, bar_width(self.width)),
            self.progress.completed,
            self.progress.total
        );
        lines.push(fit(line, self.width));
        lines
    }
}

fn task_line(task: &TaskProgress, started: Option<&Instant>, width: usize) -> String {
    let fraction = task.fraction();
    let size = if task.total == 0 {
        format!("{}/?", format_bytes(task.downloaded))
    } else {
        format!(
            "{}/{}",
            format_bytes(task.downloaded),
            format_bytes(task.total)
        )
    };
    let speed = match started {
        Some(at) if !task.finished => {
            let secs = at.elapsed().as_secs_f64();
            if secs > 0.0 {
                format!("{}/s", format_bytes((task.downloaded as f64 / secs) as u64))
            } else {
                "-".to_string()
            }
        }
        _ => "-".to_string(),
    };
    let state = match (task.finished, task.failed) {
        (true, true) => "failed",
        (true, false) => "done",
        (false, _) if started.is_some() => "downloading",
        _ => "waiting",
    };
    let head = format!(
        "{:>3.0}% {} {} • {} • {}",
        fraction * 100.0,
        bar(fraction, bar_width(width)),
        size,
        speed,
        state
    );
    let room = width.saturating_sub(head.chars().count() + 2);
    let name = name_tail(&task.filename, room);
    if name.is_empty() {
        fit(head, width)
    } else {
        fit(format!("{head} {name}"), width)
    }
}

/// Bar cells for a terminal of `width` columns.
fn bar_width(width: usize) -> usize {
    width.saturating_sub(70).clamp(MIN_BAR_WIDTH, BAR_WIDTH)
}

/// The last `max` characters of `name`, marked with a leading ellipsis when cut.
/// Keeps the timestamp and extension, which is where generated names differ.
fn name_tail(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        return name.to_string();
    }
    if max < 2 {
        return String::new();
    }
    let tail: String = name.chars().skip(len - (max - 1)).collect();
    format!("…{tail}")
}

/// Cuts `line` to at most `width - 1` characters so it never reaches the last
/// column and wraps.
fn fit(line: String, width: usize) -> String {
    let max = width.saturating_sub(1);
    if line.chars().count() <= max {
        return line;
    }
    let mut cut: String = line.chars().take(max.saturating_sub(1)).collect();
    if max > 0 {
        cut.push('…');
    }
    cut
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Renders events to stdout until every sender is dropped. Returns the final
/// aggregate.
pub async fn run(
    mut rx: UnboundedReceiver<ProgressEvent>,
    opts: ViewOptions,
    width: usize,
) -> BatchProgress {
    let mut view = ProgressView::new(io::stdout(), opts, width);
    let mut tick = tokio::time::interval(REFRESH);
    loop {
        let res = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => view.apply(&event),
                None => break,
            },
            _ = tick.tick() => view.draw(),
        };
        if let Err(e) = res {
            tracing::debug!("progress view write failed: {}", e);
        }
    }
    if let Err(e) = view.finish() {
        tracing::debug!("progress view write failed: {}", e);
    }
    view.into_progress()
}
