//! Terminal progress bar fed by the worker pool.
//!
//! Console log lines are routed through [`BarWriter`] so they are printed
//! above the bar instead of through it.

use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tilemirror::distributor::ProgressCallback;
use tilemirror::logging::MakeWriter;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) eta {eta}";

/// Bar that stays invisible until [`start`] is called.
pub fn bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
    let style = ProgressStyle::default_bar()
        .template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}

/// Size the bar for `total` tiles and draw it on stderr.
pub fn start(bar: &ProgressBar, total: usize) {
    bar.set_length(total as u64);
    bar.set_draw_target(ProgressDrawTarget::stderr());
}

/// Callback that moves `bar` to the number of completed tiles.
pub fn callback(bar: ProgressBar) -> ProgressCallback {
    Box::new(move |completed, _total| bar.set_position(completed as u64))
}

/// Stderr writer that hides the bar while a line is written.
#[derive(Clone)]
pub struct BarWriter {
    bar: ProgressBar,
}

impl BarWriter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Write for BarWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for BarWriter {
    type Writer = BarWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_moves_bar() {
        let bar = ProgressBar::hidden();
        bar.set_length(10);
        let cb = callback(bar.clone());

        cb(3, 10);
        cb(7, 10);

        assert_eq!(bar.position(), 7);
    }

    #[test]
    fn test_start_sets_length() {
        let bar = bar();
        start(&bar, 12);
        assert_eq!(bar.length(), Some(12));
        bar.finish_and_clear();
    }

    #[test]
    fn test_writer_reports_whole_line_written() {
        let bar = bar();
        start(&bar, 3);
        bar.set_position(1);
        let mut writer = BarWriter::new(bar.clone()).make_writer();

        let line = b"Completed 1 of 3 (33.3 %)\n";
        assert_eq!(writer.write(line).unwrap(), line.len());
        writer.flush().unwrap();
        assert_eq!(bar.position(), 1);
        bar.finish_and_clear();
    }
}
