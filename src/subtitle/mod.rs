pub mod srt;
pub mod vtt;

use crate::config::SubtitleFormat;

/// One numbered caption. Times are seconds from the start of its clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

pub trait SubtitleFormatter {
    fn format(&self, entries: &[SubtitleEntry]) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: SubtitleFormat) -> Box<dyn SubtitleFormatter> {
    match format {
        SubtitleFormat::Srt => Box::new(srt::SrtFormatter),
        SubtitleFormat::Vtt => Box::new(vtt::VttFormatter),
    }
}

/// Split a clip-relative time into (hours, minutes, seconds, millis), rounded to
/// the nearest millisecond. Negative or non-finite input reads as zero.
fn clock_parts(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let total_secs = total_ms / 1000;
    (
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        total_ms % 1000,
    )
}
