//! Fills a requested duration with clip footage.
//!
//! A turn is covered by alternating a speaker clip with a filler clip until less than
//! `min_clip_duration` is left. The last speaker clip is cut down to fit, so a request is met
//! exactly unless the loop stops early (undershoot) or an introduction is extended to its
//! minimum length (overshoot). Either way the difference is returned as the leftover, which the
//! caller carries into the next request.

use crate::build::{Config, Error};
use crate::catalog::{Catalog, Clip};
use crate::overlay::SpeakerOverlay;
use crate::util::is_close;
use log::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A span of one source clip in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSegment {
    pub source: PathBuf,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<SpeakerOverlay>,
}

impl ClipSegment {
    pub fn whole(clip: &Clip) -> Self {
        ClipSegment {
            source: clip.path.clone(),
            start: 0.0,
            end: clip.duration,
            overlay: None,
        }
    }

    /// A randomly positioned span of exactly `duration` seconds.
    pub fn sub_range<R: Rng>(clip: &Clip, duration: f64, rng: &mut R) -> Self {
        debug_assert!(duration <= clip.duration);
        let slack = clip.duration - duration;
        let start = if slack > 0.0 {
            rng.random_range(0.0..slack)
        } else {
            0.0
        };
        ClipSegment {
            source: clip.path.clone(),
            start,
            end: start + duration,
            overlay: None,
        }
    }

    pub fn with_overlay(mut self, overlay: Option<SpeakerOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub resource_id: String,
    /// Seconds to fill, including any remainder carried from the previous request
    pub duration: f64,
    /// Place at least one clip, however short the request
    pub no_skip: bool,
    /// Name plate for the first clip, if this is the speaker's introduction
    pub introduction: Option<SpeakerOverlay>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// Segments placed, and the requested time they did not cover (negative on overshoot).
    ///
    /// A negative request is passed straight through as an empty schedule.
    Scheduled {
        segments: Vec<ClipSegment>,
        leftover: f64,
    },
    /// Nothing was placed; the whole request is still owed.
    Skipped,
}

impl ScheduleOutcome {
    pub fn segments(&self) -> &[ClipSegment] {
        match self {
            ScheduleOutcome::Scheduled { segments, .. } => segments,
            ScheduleOutcome::Skipped => &[],
        }
    }
}

fn pick<'a, R: Rng>(clips: &'a [Clip], rng: &mut R) -> &'a Clip {
    &clips[rng.random_range(0..clips.len())]
}

pub fn schedule<R: Rng>(
    request: &ScheduleRequest,
    catalog: &Catalog,
    config: &Config,
    rng: &mut R,
) -> Result<ScheduleOutcome, Error> {
    let speaker_clips = catalog.pool(&request.resource_id)?;
    let misc_clips = catalog.misc()?;

    let mut remaining = request.duration;
    if remaining < 0.0 {
        trace!(
            "Negative request of {:.3}s for `{}`, passing through",
            remaining,
            request.resource_id
        );
        return Ok(ScheduleOutcome::Scheduled {
            segments: Vec::new(),
            leftover: remaining,
        });
    }

    let mut no_skip = request.no_skip;
    let mut segments: Vec<ClipSegment> = Vec::new();

    while remaining > config.min_clip_duration || no_skip {
        no_skip = false;

        let (clip, overlay) = match &request.introduction {
            Some(intro) if segments.is_empty() => (&speaker_clips[0], Some(intro.clone())),
            _ => (pick(speaker_clips, rng), None),
        };

        if clip.duration > remaining {
            if request.introduction.is_some() && remaining < config.min_speaker_intro_duration {
                let floor = config.min_speaker_intro_duration.min(clip.duration);
                segments.push(ClipSegment::sub_range(clip, floor, rng).with_overlay(overlay));
                remaining -= floor;
            } else {
                segments.push(ClipSegment::sub_range(clip, remaining, rng).with_overlay(overlay));
                remaining = 0.0;
            }
            continue;
        }

        segments.push(ClipSegment::whole(clip).with_overlay(overlay));
        remaining -= clip.duration;

        let filler = pick(misc_clips, rng);
        if filler.duration > remaining {
            // Leave room for some speaker footage after the filler, or finish the turn on it
            if remaining > config.max_misc_time + config.min_clip_duration {
                segments.push(ClipSegment::sub_range(filler, config.max_misc_time, rng));
                remaining -= config.max_misc_time;
            } else {
                if remaining > 0.0 {
                    segments.push(ClipSegment::sub_range(filler, remaining, rng));
                }
                remaining = 0.0;
            }
        } else if filler.duration > config.max_misc_time {
            segments.push(ClipSegment::sub_range(filler, config.max_misc_time, rng));
            remaining -= config.max_misc_time;
        } else {
            segments.push(ClipSegment::whole(filler));
            remaining -= filler.duration;
        }
    }

    if segments.is_empty() {
        return Ok(ScheduleOutcome::Skipped);
    }

    debug_assert!(is_close(
        segments.iter().map(|s| s.duration()).sum::<f64>() + remaining,
        request.duration
    ));

    Ok(ScheduleOutcome::Scheduled {
        segments,
        leftover: remaining,
    })
}
