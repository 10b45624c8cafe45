use crate::catalog::Catalog;
use crate::overlay::{OverlayLayout, SpeakerOverlay};
use crate::scheduler::{self, ClipSegment, ScheduleOutcome, ScheduleRequest};
use crate::segmenter::{Segmenter, Step};
use crate::speaker::{IntroducedSpeakers, SpeakerMapping};
use crate::timeline::Timeline;
use crate::transcript::{Case, Transcript};
use log::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Speaker `{0}` not found in case")]
    SpeakerNotFound(i64),
    #[error("Resource `{0}` not found")]
    ResourceNotFound(String),
    #[error("Resource `{0}` has no clips")]
    EmptyPool(String),
    #[error("Invalid title `{0}`: expected exactly one ` v. `")]
    InvalidTitle(String),
    #[error("Nothing was scheduled")]
    EmptyTimeline,
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IOError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Probe error: {0}")]
    ProbeError(String),
}

/// Config for a build
///
/// Durations are in seconds. Every field has a default, so a partial TOML file only needs to
/// name what it overrides.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Shortest clip worth cutting to; also the largest overshoot a turn can carry forward
    pub min_clip_duration: f64,
    /// Longest stretch of filler footage between two speaker clips
    pub max_misc_time: f64,
    /// How many turns back an interrupting speaker counts as recent
    pub recent_speaker_threshold: usize,
    /// Shortest introduction, even if the turn is shorter
    pub min_speaker_intro_duration: f64,
    /// A speaker is introduced on their first turn longer than this
    pub introduction_min_duration: f64,
    /// Turns shorter than this are dropped
    pub empty_turn_duration: f64,
    pub max_characters_per_subtitle: usize,
    /// Length of the title card
    pub intro_duration: f64,
    /// Overlap between the title card and the first clip
    pub crossfade_duration: f64,
    /// Always place at least one clip for a turn, even a very short one
    pub force_clip_per_turn: bool,

    pub assets: Assets,
    pub layout: OverlayLayout,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_clip_duration: 1.8,
            max_misc_time: 4.0,
            recent_speaker_threshold: 6,
            min_speaker_intro_duration: 3.0,
            introduction_min_duration: 2.0,
            empty_turn_duration: 0.001,
            max_characters_per_subtitle: 85,
            intro_duration: 6.0,
            crossfade_duration: 1.0,
            force_clip_per_turn: true,
            assets: Assets::default(),
            layout: OverlayLayout::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_clip_duration <= 0.0 {
            return Err(Error::ConfigError(
                "min_clip_duration must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("min_speaker_intro_duration", self.min_speaker_intro_duration),
            ("introduction_min_duration", self.introduction_min_duration),
            ("empty_turn_duration", self.empty_turn_duration),
        ] {
            if value < 0.0 {
                return Err(Error::ConfigError(format!("{} must not be negative", name)));
            }
        }
        if self.max_misc_time <= 0.0 {
            return Err(Error::ConfigError(
                "max_misc_time must be positive".to_string(),
            ));
        }
        if self.recent_speaker_threshold == 0 {
            return Err(Error::ConfigError(
                "recent_speaker_threshold must be at least 1".to_string(),
            ));
        }
        if self.max_characters_per_subtitle == 0 {
            return Err(Error::ConfigError(
                "max_characters_per_subtitle must be at least 1".to_string(),
            ));
        }
        if self.crossfade_duration < 0.0 || self.crossfade_duration > self.intro_duration {
            return Err(Error::ConfigError(format!(
                "crossfade_duration must be within [0, {}]",
                self.intro_duration
            )));
        }
        Ok(())
    }

    /// Offset of the transcript's zero point in the final video.
    pub fn program_offset(&self) -> f64 {
        self.intro_duration - self.crossfade_duration
    }
}

/// Still images and clips that frame the generated footage
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Assets {
    pub intro_background: PathBuf,
    pub speaker_background: PathBuf,
    pub ending: Option<PathBuf>,
}

impl Default for Assets {
    fn default() -> Self {
        Assets {
            intro_background: PathBuf::from("resources/intro_background.png"),
            speaker_background: PathBuf::from("resources/speaker_background.png"),
            ending: Some(PathBuf::from("resources/disclaimer.mp4")),
        }
    }
}

/// Duration owed to (positive) or borrowed from (negative) the next turn.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RemainderLedger {
    value: f64,
}

impl RemainderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Time that produced no request (e.g. an unattributed turn) is owed to the next one.
    pub fn carry(&mut self, duration: f64) {
        self.value += duration;
    }

    /// Update after a scheduler call for `requested` seconds, which already included the
    /// previous ledger value.
    pub fn settle(&mut self, outcome: &ScheduleOutcome, requested: f64) {
        self.value = match outcome {
            ScheduleOutcome::Scheduled { leftover, .. } => *leftover,
            ScheduleOutcome::Skipped => requested,
        };
    }
}

/// Mutable state of a single build pass.
pub struct BuildContext {
    pub speakers: SpeakerMapping,
    pub introduced: IntroducedSpeakers,
    pub ledger: RemainderLedger,
    pub rng: StdRng,
}

impl BuildContext {
    pub fn new(seed: u64) -> Self {
        BuildContext {
            speakers: SpeakerMapping::new(),
            introduced: IntroducedSpeakers::new(),
            ledger: RemainderLedger::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Stats from a build
#[derive(Debug, Default, Serialize, Clone)]
pub struct Stats {
    pub turns: usize,
    pub requests: usize,
    pub merged_interruptions: usize,
    pub introductions: usize,
    pub skipped_requests: usize,
    pub unattributed_turns: usize,
    pub segments: usize,
    pub requested_seconds: f64,
    pub scheduled_seconds: f64,
    pub final_remainder: f64,
}

#[derive(Debug)]
pub struct Build {
    pub timeline: Timeline,
    pub stats: Stats,
}

/// Schedule every section of a transcript into clip segments.
///
/// This is the part of a build that is independent of the title card and ending, so it can be
/// driven with any context (e.g. one carried over from a previous call).
pub fn schedule_transcript(
    ctx: &mut BuildContext,
    case: &Case,
    transcript: &Transcript,
    catalog: &Catalog,
    config: &Config,
    stats: &mut Stats,
) -> Result<Vec<ClipSegment>, Error> {
    let mut out: Vec<ClipSegment> = Vec::new();

    for (section_idx, section) in transcript.sections.iter().enumerate() {
        debug!(
            "Section {}: {} turns, remainder {:.3}",
            section_idx,
            section.turns.len(),
            ctx.ledger.value()
        );
        stats.turns += section.turns.len();

        let segmenter = Segmenter::new(&section.turns, config, &mut ctx.speakers);
        for step in segmenter {
            let request = match step {
                Step::Unattributed { duration } => {
                    trace!("Unattributed turn, carrying {:.3}s", duration);
                    stats.unattributed_turns += 1;
                    stats.requested_seconds += duration;
                    ctx.ledger.carry(duration);
                    continue;
                }
                Step::Speak(request) => request,
            };

            stats.requests += 1;
            stats.requested_seconds += request.duration;
            if request.turns_consumed > 1 {
                stats.merged_interruptions += 1;
            }

            let introduction =
                if request.introduction && !ctx.introduced.contains(request.speaker_id) {
                    Some(SpeakerOverlay::for_speaker(case, request.speaker_id, config)?)
                } else {
                    None
                };

            let schedule_request = ScheduleRequest {
                resource_id: request.resource.resource_id().to_string(),
                duration: request.duration + ctx.ledger.value(),
                no_skip: config.force_clip_per_turn,
                introduction,
            };

            let outcome = scheduler::schedule(&schedule_request, catalog, config, &mut ctx.rng)?;
            ctx.ledger.settle(&outcome, schedule_request.duration);

            // A request that placed nothing leaves the introduction for a later turn
            if outcome.segments().iter().any(|s| s.overlay.is_some()) {
                ctx.introduced.insert(request.speaker_id);
                stats.introductions += 1;
            } else if schedule_request.introduction.is_some() {
                debug!(
                    "Introduction of speaker {} deferred, nothing scheduled for turn {}",
                    request.speaker_id, request.first_turn
                );
            }

            match outcome {
                ScheduleOutcome::Scheduled { segments, leftover } => {
                    trace!(
                        "Turn {} ({}): {} segments for {:.3}s, leftover {:.3}",
                        request.first_turn,
                        request.resource,
                        segments.len(),
                        schedule_request.duration,
                        leftover
                    );
                    out.extend(segments);
                }
                ScheduleOutcome::Skipped => {
                    debug!(
                        "Turn {} ({}) skipped, carrying {:.3}s",
                        request.first_turn, request.resource, schedule_request.duration
                    );
                    stats.skipped_requests += 1;
                }
            }
        }
    }

    stats.segments += out.len();
    stats.scheduled_seconds += out.iter().map(|s| s.duration()).sum::<f64>();
    stats.final_remainder = ctx.ledger.value();
    Ok(out)
}

/// Build the full edit for one oral argument.
///
/// The same seed, catalog, and inputs always produce the same timeline.
pub fn build_video(
    title: &str,
    case: &Case,
    transcript: &Transcript,
    catalog: &Catalog,
    config: &Config,
    seed: u64,
) -> Result<Build, Error> {
    info!("Building `{}` with seed {}", title, seed);

    let mut ctx = BuildContext::new(seed);
    let mut stats = Stats::default();
    let segments = schedule_transcript(&mut ctx, case, transcript, catalog, config, &mut stats)?;
    let timeline = Timeline::assemble(title, segments, config)?;

    info!(
        "Scheduled {} segments ({:.1}s of {:.1}s requested, remainder {:.3}s)",
        stats.segments, stats.scheduled_seconds, stats.requested_seconds, stats.final_remainder
    );

    Ok(Build { timeline, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.program_offset(), 5.0);
    }

    #[test]
    fn test_invalid_config() {
        let config = Config {
            crossfade_duration: 10.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = Config {
            min_clip_duration: 0.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = Config {
            min_speaker_intro_duration: -1.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = Config {
            empty_turn_duration: -0.001,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = Config {
            introduction_min_duration: -2.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        // Zero is allowed: introduce on any turn, keep every turn
        let config = Config {
            introduction_min_duration: 0.0,
            empty_turn_duration: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ledger_settle() {
        let mut ledger = RemainderLedger::new();
        ledger.carry(1.5);
        assert_eq!(ledger.value(), 1.5);

        let outcome = ScheduleOutcome::Scheduled {
            segments: vec![],
            leftover: -2.0,
        };
        ledger.settle(&outcome, 3.5);
        assert_eq!(ledger.value(), -2.0);

        // A skipped request keeps its whole budget for the next turn
        ledger.settle(&ScheduleOutcome::Skipped, 1.2);
        assert_eq!(ledger.value(), 1.2);

        let outcome = ScheduleOutcome::Scheduled {
            segments: vec![],
            leftover: 0.0,
        };
        ledger.settle(&outcome, 4.0);
        assert_eq!(ledger.value(), 0.0);
    }
}
