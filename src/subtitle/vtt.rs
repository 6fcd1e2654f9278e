// WebVTT subtitle format
use super::{clock_parts, SubtitleEntry, SubtitleFormatter};

pub struct VttFormatter;

impl SubtitleFormatter for VttFormatter {
    fn format(&self, entries: &[SubtitleEntry]) -> String {
        let mut output = String::from("WEBVTT\n\n");

        for entry in entries {
            output.push_str(&format!(
                "{} --> {}\n{}\n\n",
                format_timestamp(entry.start),
                format_timestamp(entry.end),
                entry.text
            ));
        }

        output
    }

    fn extension(&self) -> &'static str {
        "vtt"
    }
}

fn format_timestamp(seconds: f64) -> String {
    let (hours, minutes, seconds, millis) = clock_parts(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1.5), "00:00:01.500");
    }

    #[test]
    fn test_vtt_format() {
        let entries = vec![SubtitleEntry {
            index: 1,
            start: 1.5,
            end: 4.0,
            text: "你好！".to_string(),
        }];

        let output = VttFormatter.format(&entries);

        assert!(output.starts_with("WEBVTT\n\n"));
        assert!(output.contains("00:00:01.500 --> 00:00:04.000\n你好！"));
    }
}
