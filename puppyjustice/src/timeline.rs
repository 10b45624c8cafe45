//! The finished edit: title card, scheduled footage, and an optional ending.
//!
//! A timeline is an edit decision list, not media. A [`Sink`] hands it to whatever renders
//! the final file.

use crate::build::{Config, Error};
use crate::overlay::{Layer, Position};
use crate::scheduler::ClipSegment;
use log::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TITLE_SEPARATOR: &str = " v. ";

/// Opening card showing the case name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCard {
    pub text: String,
    pub layers: Vec<Layer>,
    pub duration: f64,
}

impl TitleCard {
    /// Lay out `"A v. B"` as three centered lines over the intro background.
    pub fn new(title: &str, config: &Config) -> Result<Self, Error> {
        if title.matches(TITLE_SEPARATOR).count() != 1 {
            return Err(Error::InvalidTitle(title.to_string()));
        }
        let text = title.replace(TITLE_SEPARATOR, "\nv.\n");

        let layers = vec![
            Layer::Image {
                path: config.assets.intro_background.clone(),
                position: Position::At(0, 0),
            },
            Layer::Text {
                text: text.clone(),
                style: config.layout.card_style.clone(),
                position: Position::Center,
            },
        ];

        Ok(TitleCard {
            text,
            layers,
            duration: config.intro_duration,
        })
    }
}

/// Clip appended after the scheduled footage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub path: PathBuf,
    /// Unknown until probed
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub title_card: TitleCard,
    /// The first segment fades in over this long at the end of the title card
    pub crossfade: f64,
    pub segments: Vec<ClipSegment>,
    pub ending: Option<Ending>,
    /// Where the argument audio starts in the output
    pub audio_offset: f64,
    pub frame_size: (u32, u32),
}

impl Timeline {
    pub fn assemble(
        title: &str,
        segments: Vec<ClipSegment>,
        config: &Config,
    ) -> Result<Timeline, Error> {
        if segments.is_empty() {
            return Err(Error::EmptyTimeline);
        }
        let title_card = TitleCard::new(title, config)?;
        let ending = config.assets.ending.as_ref().map(|path| Ending {
            path: path.clone(),
            duration: None,
        });

        Ok(Timeline {
            title_card,
            crossfade: config.crossfade_duration,
            segments,
            ending,
            audio_offset: config.program_offset(),
            frame_size: config.layout.frame_size,
        })
    }

    /// Time at which the first segment begins fading in.
    pub fn crossfade_start(&self) -> f64 {
        self.title_card.duration - self.crossfade
    }

    pub fn program_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration()).sum()
    }

    /// Total output length. An ending of unknown length counts as zero.
    pub fn duration(&self) -> f64 {
        let ending = self
            .ending
            .as_ref()
            .and_then(|e| e.duration)
            .unwrap_or(0.0);
        self.title_card.duration + self.program_duration() - self.crossfade + ending
    }

    /// Start time of every segment in the output.
    pub fn segment_starts(&self) -> Vec<f64> {
        let mut t = self.crossfade_start();
        self.segments
            .iter()
            .map(|s| {
                let start = t;
                t += s.duration();
                start
            })
            .collect()
    }
}

/// Something that turns a timeline into output.
pub trait Sink {
    fn emit(&mut self, timeline: &Timeline, output: &Path) -> Result<(), Error>;
}

/// Writes the timeline as JSON for an external encoder.
#[derive(Default)]
pub struct JsonSink {
    pub pretty: bool,
}

impl Sink for JsonSink {
    fn emit(&mut self, timeline: &Timeline, output: &Path) -> Result<(), Error> {
        let body = if self.pretty {
            serde_json::to_string_pretty(timeline)
        } else {
            serde_json::to_string(timeline)
        }
        .map_err(|e| Error::ParseError(e.to_string()))?;

        std::fs::write(output, body)
            .map_err(|e| Error::IOError(format!("failed to write `{}`: {}", output.display(), e)))?;
        info!(
            "Wrote timeline with {} segments ({:.1}s) to `{}`",
            timeline.segments.len(),
            timeline.duration(),
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(source: &str, start: f64, end: f64) -> ClipSegment {
        ClipSegment {
            source: PathBuf::from(source),
            start,
            end,
            overlay: None,
        }
    }

    #[test]
    fn test_title_card() {
        let config = Config::default();
        let card = TitleCard::new("Roe v. Wade", &config).unwrap();
        assert_eq!(card.text, "Roe\nv.\nWade");
        assert_eq!(card.duration, 6.0);
        assert_eq!(card.layers.len(), 2);

        assert!(matches!(
            TitleCard::new("Roe versus Wade", &config),
            Err(Error::InvalidTitle(_))
        ));
        assert!(matches!(
            TitleCard::new("A v. B v. C", &config),
            Err(Error::InvalidTitle(_))
        ));
    }

    #[test]
    fn test_assemble() {
        let config = Config::default();
        let timeline = Timeline::assemble(
            "Roe v. Wade",
            vec![segment("a", 0.0, 4.0), segment("b", 1.0, 3.5)],
            &config,
        )
        .unwrap();

        assert_eq!(timeline.crossfade_start(), 5.0);
        assert_eq!(timeline.audio_offset, 5.0);
        assert_eq!(timeline.program_duration(), 6.5);
        assert_eq!(timeline.duration(), 11.5);
        assert_eq!(timeline.segment_starts(), vec![5.0, 9.0]);

        let mut timeline = timeline;
        if let Some(ending) = timeline.ending.as_mut() {
            ending.duration = Some(10.0);
        }
        assert_eq!(timeline.duration(), 21.5);
    }

    #[test]
    fn test_assemble_empty() {
        let config = Config::default();
        assert!(matches!(
            Timeline::assemble("Roe v. Wade", vec![], &config),
            Err(Error::EmptyTimeline)
        ));
    }

    #[test]
    fn test_json_sink() {
        let config = Config::default();
        let timeline =
            Timeline::assemble("Roe v. Wade", vec![segment("a", 0.0, 4.0)], &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timeline.json");
        JsonSink { pretty: true }.emit(&timeline, &output).unwrap();

        let body = std::fs::read_to_string(&output).unwrap();
        let parsed: Timeline = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, timeline);
    }
}
