//! Progress extraction from ffmpeg's stderr stream.
//!
//! ffmpeg announces each input's `Duration:` once, then rewrites a status line
//! containing `time=` in place using carriage returns. The ratio is elapsed
//! output time over the first input's duration.

use regex::{Captures, Regex};

/// Parses stderr lines into progress ratios.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    duration: Regex,
    time: Regex,
    total: Option<f64>,
}

impl ProgressParser {
    /// Compile the line patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            duration: Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)")?,
            time: Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)")?,
            total: None,
        })
    }

    /// A parser sharing the compiled patterns with no duration recorded.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self {
            duration: self.duration.clone(),
            time: self.time.clone(),
            total: None,
        }
    }

    /// Feed one line; returns a ratio in `0.0..=1.0` for status lines once a
    /// duration is known.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        if let Some(captures) = self.duration.captures(line) {
            if self.total.is_none() {
                self.total = seconds(&captures).filter(|total| *total > 0.0);
            }
            return None;
        }

        let total = self.total?;
        let elapsed = seconds(&self.time.captures(line)?)?;
        Some((elapsed / total).clamp(0.0, 1.0))
    }
}

fn seconds(captures: &Captures<'_>) -> Option<f64> {
    let hours: f64 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = captures.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = captures.get(3)?.as_str().parse().ok()?;
    Some(hours.mul_add(3600.0, minutes.mul_add(60.0, seconds)))
}

/// Splits a byte stream into lines on `\n` or `\r`.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Append `bytes`, returning every completed non-empty line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self
            .pending
            .iter()
            .position(|byte| matches!(byte, b'\n' | b'\r'))
        {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            push_line(&mut lines, &raw[..end]);
        }
        lines
    }

    /// Flush the trailing partial line, if any.
    #[must_use]
    pub fn finish(self) -> Option<String> {
        let mut lines = Vec::new();
        push_line(&mut lines, &self.pending);
        lines.pop()
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if !text.is_empty() {
        lines.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

    #[test]
    fn ratio_follows_time_over_duration() -> TestResult<()> {
        let mut parser = ProgressParser::new()?;
        assert_eq!(
            parser.feed("frame=  10 fps=0.0 q=28.0 size=0kB time=00:00:01.00 bitrate=N/A"),
            None
        );
        assert_eq!(
            parser.feed("  Duration: 00:00:04.00, start: 0.000000, bitrate: 1205 kb/s"),
            None
        );
        assert_eq!(
            parser.feed("frame=  50 fps=0.0 q=28.0 size=256kB time=00:00:01.00 bitrate=N/A"),
            Some(0.25)
        );
        assert_eq!(
            parser.feed("  Duration: 00:01:00.00, start: 0.000000, bitrate: 1205 kb/s"),
            None
        );
        assert_eq!(parser.feed("size=512kB time=00:00:05.00 bitrate=N/A"), Some(1.0));
        assert_eq!(parser.feed("time=N/A"), None);
        Ok(())
    }

    #[test]
    fn hours_and_minutes_are_accounted_for() -> TestResult<()> {
        let mut parser = ProgressParser::new()?;
        let _ = parser.feed("Duration: 01:00:00.00");
        let ratio = parser.feed("time=00:30:00.00").ok_or("expected ratio")?;
        assert!((ratio - 0.5).abs() < f64::EPSILON);

        let mut fresh = parser.fresh();
        assert_eq!(fresh.feed("time=00:30:00.00"), None);
        Ok(())
    }

    #[test]
    fn zero_duration_never_reports() -> TestResult<()> {
        let mut parser = ProgressParser::new()?;
        let _ = parser.feed("Duration: 00:00:00.00");
        assert_eq!(parser.feed("time=00:00:01.00"), None);
        Ok(())
    }

    #[test]
    fn splitter_handles_carriage_returns_across_chunks() {
        let mut splitter = LineSplitter::default();
        assert!(splitter.push(b"frame=1 ti").is_empty());
        assert_eq!(splitter.push(b"me=00:00:01.00\rframe=2\r\n  Dur"), vec![
            "frame=1 time=00:00:01.00",
            "frame=2"
        ]);
        assert_eq!(splitter.finish(), Some("Dur".to_string()));
    }
}
