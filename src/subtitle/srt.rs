// SRT subtitle format
use super::{clock_parts, SubtitleEntry, SubtitleFormatter};

pub struct SrtFormatter;

impl SubtitleFormatter for SrtFormatter {
    fn format(&self, entries: &[SubtitleEntry]) -> String {
        entries
            .iter()
            .map(|entry| {
                format!(
                    "{}\n{} --> {}\n{}\n",
                    entry.index,
                    format_timestamp(entry.start),
                    format_timestamp(entry.end),
                    entry.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extension(&self) -> &'static str {
        "srt"
    }
}

fn format_timestamp(seconds: f64) -> String {
    let (hours, minutes, seconds, millis) = clock_parts(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
