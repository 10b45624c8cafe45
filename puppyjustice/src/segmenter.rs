//! Turns a section's speaker turns into scheduling requests.
//!
//! Each spoken turn becomes one request for its speaker's clip pool, with two exceptions:
//! near-empty turns produce nothing, and a brief interjection sandwiched between two turns of
//! the same speaker is folded into a single request so the video doesn't cut away and back.

use crate::build::Config;
use crate::speaker::{SpeakerMapping, SpeakerResource};
use crate::transcript::Turn;
use log::*;

#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub resource: SpeakerResource,
    pub speaker_id: i64,
    /// Seconds of speech, before any carried remainder
    pub duration: f64,
    /// Long enough to carry the speaker's name plate, if they haven't had one yet
    pub introduction: bool,
    /// Index of the first turn this request covers
    pub first_turn: usize,
    /// 1, or 3 when an interruption was merged
    pub turns_consumed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Speak(TurnRequest),
    /// A turn with no speaker; its time is owed to the next request
    Unattributed { duration: f64 },
}

pub struct Segmenter<'a> {
    turns: &'a [Turn],
    cursor: usize,
    config: &'a Config,
    speakers: &'a mut SpeakerMapping,
}

impl<'a> Segmenter<'a> {
    pub fn new(
        turns: &'a [Turn],
        config: &'a Config,
        speakers: &'a mut SpeakerMapping,
    ) -> Self {
        Segmenter {
            turns,
            cursor: 0,
            config,
            speakers,
        }
    }

    /// Whether `speaker` appears among the last few turns up to and including `turn_num`.
    ///
    /// Skipped and merged turns count too.
    fn has_spoken_recently(&self, turn_num: usize, speaker: Option<&str>) -> bool {
        let prior = &self.turns[..=turn_num];
        let window = &prior[prior.len().saturating_sub(self.config.recent_speaker_threshold)..];
        window.iter().any(|t| t.speaker_name() == speaker)
    }

    /// A short turn by a recent speaker, followed by a return to `speaker`.
    ///
    /// NOTE: recency is checked for the interrupting speaker, not for `speaker`.
    fn is_interrupted(&self, turn_num: usize, speaker: &str) -> bool {
        let (Some(next), Some(after)) = (self.turns.get(turn_num + 1), self.turns.get(turn_num + 2))
        else {
            return false;
        };

        next.duration() < self.config.min_clip_duration
            && self.has_spoken_recently(turn_num, next.speaker_name())
            && after.speaker_name() == Some(speaker)
    }
}

impl Iterator for Segmenter<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        loop {
            let turn_num = self.cursor;
            let turn = self.turns.get(turn_num)?;

            let speaker = match &turn.speaker {
                Some(speaker) => speaker,
                None => {
                    self.cursor += 1;
                    return Some(Step::Unattributed {
                        duration: turn.duration(),
                    });
                }
            };

            let resource = self.speakers.resolve(speaker);
            let mut duration = turn.duration();

            if duration < self.config.empty_turn_duration {
                trace!("Skipping empty turn {} ({})", turn_num, speaker.name);
                self.cursor += 1;
                continue;
            }

            let mut turns_consumed = 1;
            if self.is_interrupted(turn_num, &speaker.name) {
                duration += self.turns[turn_num + 1].duration();
                duration += self.turns[turn_num + 2].duration();
                turns_consumed = 3;
                debug!(
                    "Merged interruption at turn {} into {:.3}s for {}",
                    turn_num, duration, speaker.name
                );
            }
            self.cursor += turns_consumed;

            let introduction = duration > self.config.introduction_min_duration;

            return Some(Step::Speak(TurnRequest {
                resource,
                speaker_id: speaker.id,
                duration,
                introduction,
                first_turn: turn_num,
                turns_consumed,
            }));
        }
    }
}
