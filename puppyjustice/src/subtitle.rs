//! Captions from transcript text blocks.
//!
//! A text block is split into word-aligned chunks that fit on screen, and the block's time
//! interval is divided between them in proportion to their length. Times are kept relative to
//! the transcript; they are shifted past the title card only when rendered as timecodes.

use crate::build::{Config, Error};
use crate::transcript::Transcript;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub start_ms: f64,
    pub end_ms: f64,
    pub text: String,
}

/// Split `text` over `[start_ms, end_ms)` into captions of at most `max_chars` characters.
///
/// Each chunk's share of the interval is its length plus the space that follows it, over the
/// length of the whole block, so consecutive captions meet exactly and the last one ends at
/// `end_ms`. A word longer than `max_chars` gets a caption to itself.
pub fn block_parts(text: &str, start_ms: f64, end_ms: f64, max_chars: usize) -> Vec<Caption> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if current_len > 0 {
        chunks.push(current);
    }

    let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    let total: usize = lengths.iter().sum::<usize>() + lengths.len().saturating_sub(1);
    let duration = end_ms - start_ms;

    let mut out = Vec::with_capacity(chunks.len());
    let mut prior = start_ms;
    let mut consumed = 0;
    let last = chunks.len().saturating_sub(1);
    for (i, (chunk, len)) in chunks.into_iter().zip(lengths).enumerate() {
        let sub_end = if i == last {
            end_ms
        } else {
            consumed += len + 1;
            start_ms + duration * consumed as f64 / total as f64
        };
        out.push(Caption {
            start_ms: prior,
            end_ms: sub_end,
            text: chunk,
        });
        prior = sub_end;
    }
    out
}

/// Captions for every text block of a transcript, in order.
///
/// The first block of each attributed turn is prefixed with the speaker's last name.
pub fn transcript_captions(transcript: &Transcript, config: &Config) -> Vec<Caption> {
    let mut out = Vec::new();
    for section in &transcript.sections {
        for turn in &section.turns {
            for (block_num, block) in turn.text_blocks.iter().enumerate() {
                let text = match (&turn.speaker, block_num) {
                    (Some(speaker), 0) => format!("{}: {}", speaker.caption_name(), block.text),
                    _ => block.text.clone(),
                };
                out.extend(block_parts(
                    &text,
                    block.start * 1000.0,
                    block.stop * 1000.0,
                    config.max_characters_per_subtitle,
                ));
            }
        }
    }
    out
}

fn split_ms(ms: f64, config: &Config) -> (u64, u64, u64, u64) {
    let ms = (ms + config.program_offset() * 1000.0).max(0.0).floor() as u64;
    let milli = ms % 1000;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / (1000 * 60)) % 60;
    let hours = (ms / (1000 * 60 * 60)) % 24;
    (hours, minutes, seconds, milli)
}

/// `HH:MM:SS.mmm` in the final video for a transcript time in milliseconds.
pub fn timecode(ms: f64, config: &Config) -> String {
    let (hours, minutes, seconds, milli) = split_ms(ms, config);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milli)
}

/// `HH:MM:SS` in the final video for a transcript time in milliseconds.
pub fn short_timecode(ms: f64, config: &Config) -> String {
    let (hours, minutes, seconds, _) = split_ms(ms, config);
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Write captions as `start,end` / text / blank line records.
pub fn write_captions<W: Write>(
    captions: &[Caption],
    config: &Config,
    out: &mut W,
) -> Result<(), Error> {
    for caption in captions {
        if caption.text.is_empty() {
            continue;
        }
        write!(
            out,
            "{},{}\n{}\n\n",
            timecode(caption.start_ms, config),
            timecode(caption.end_ms, config),
            caption.text
        )
        .map_err(|e| Error::IOError(e.to_string()))?;
    }
    Ok(())
}

/// One `Section N: HH:MM:SS` line per section that has a start time.
pub fn section_chapters(transcript: &Transcript, config: &Config) -> Vec<String> {
    transcript
        .sections
        .iter()
        .enumerate()
        .filter_map(|(i, section)| {
            section.start.map(|start| {
                format!(
                    "Section {}: {}",
                    i + 1,
                    short_timecode(start * 1000.0, config)
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::is_close;

    /// "abcd abcd ..." cut to at most `total` characters
    fn words_of_len(total: usize) -> String {
        let mut s = String::new();
        while s.len() < total {
            if !s.is_empty() {
                s.push(' ');
            }
            s.push_str("abcd");
        }
        s.truncate(total);
        s.truncate(s.trim_end().len());
        s
    }

    #[test]
    fn test_single_caption_fits_budget() {
        let text = words_of_len(84);
        let text = format!("{}x", text);
        assert_eq!(text.chars().count(), 85);

        let parts = block_parts(&text, 0.0, 10000.0, 85);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].start_ms, 0.0);
        assert_eq!(parts[0].end_ms, 10000.0);
        assert_eq!(parts[0].text, text);
    }

    #[test]
    fn test_two_captions_split_proportionally() {
        let text = format!("{} {}", "a".repeat(84), "b".repeat(85));
        assert_eq!(text.chars().count(), 170);

        let parts = block_parts(&text, 0.0, 10000.0, 85);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].start_ms, 0.0);
        assert!(is_close(parts[0].end_ms, 5000.0));
        assert_eq!(parts[0].end_ms, parts[1].start_ms);
        assert_eq!(parts[1].end_ms, 10000.0);
    }

    #[test]
    fn test_long_block_no_gaps() {
        let text = words_of_len(1000);
        let parts = block_parts(&text, 1500.0, 91500.0, 85);
        assert!(parts.len() >= 12);
        assert_eq!(parts[0].start_ms, 1500.0);
        assert_eq!(parts.last().unwrap().end_ms, 91500.0);
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
            assert!(pair[0].start_ms < pair[0].end_ms);
        }
        for part in &parts {
            assert!(part.text.chars().count() <= 85);
        }
    }

    #[test]
    fn test_oversized_word_and_empty_text() {
        let word = "z".repeat(100);
        let parts = block_parts(&format!("hi {}", word), 0.0, 1000.0, 85);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].text, word);

        assert!(block_parts("   ", 0.0, 1000.0, 85).is_empty());
    }

    #[test]
    fn test_timecode_offset() {
        let config = Config::default();
        // Title card minus crossfade is 5 seconds
        assert_eq!(timecode(0.0, &config), "00:00:05.000");
        assert_eq!(timecode(3_723_456.0, &config), "01:02:08.456");
        assert_eq!(short_timecode(55_000.0, &config), "00:01:00");
    }

    #[test]
    fn test_write_captions() {
        let config = Config::default();
        let captions = vec![
            Caption {
                start_ms: 0.0,
                end_ms: 1500.0,
                text: "Kagan: Hello.".to_string(),
            },
            Caption {
                start_ms: 1500.0,
                end_ms: 2000.0,
                text: String::new(),
            },
        ];
        let mut out = Vec::new();
        write_captions(&captions, &config, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "00:00:05.000,00:00:06.500\nKagan: Hello.\n\n"
        );
    }

    #[test]
    fn test_transcript_captions_prefix_first_block() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"title": "A v. B", "sections": [{"start": 0, "turns": [
                {"speaker": {"ID": 1, "name": "Elena Kagan", "last_name": "Kagan"},
                 "start": 0, "stop": 4,
                 "text_blocks": [
                    {"start": 0, "stop": 2, "text": "First."},
                    {"start": 2, "stop": 4, "text": "Second."}
                 ]},
                {"speaker": null, "start": 4, "stop": 5,
                 "text_blocks": [{"start": 4, "stop": 5, "text": "(Inaudible)"}]}
            ]}, {"start": 65.5, "turns": []}]}"#,
        )
        .unwrap();
        let config = Config::default();

        let captions = transcript_captions(&transcript, &config);
        let texts: Vec<&str> = captions.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Kagan: First.", "Second.", "(Inaudible)"]);
        assert_eq!(captions[1].start_ms, 2000.0);

        assert_eq!(
            section_chapters(&transcript, &config),
            vec!["Section 1: 00:00:05", "Section 2: 00:01:10"]
        );
    }
}
