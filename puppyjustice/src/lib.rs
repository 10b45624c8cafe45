//! puppyjustice cuts stock footage of dogs to the speaker turns of a Supreme Court oral argument.
//!
//! Each turn of the transcript is covered with clips from its speaker's pool, interleaved with
//! filler footage, so that cuts land on speaker changes. Durations that can't be matched
//! exactly are carried to the next turn, keeping the footage in sync with the audio over the
//! whole argument. The result is a [`timeline::Timeline`] and a caption file; encoding is done
//! by an external tool.

pub mod catalog;
pub mod overlay;
pub mod scheduler;
pub mod segmenter;
pub mod speaker;
pub mod subtitle;
pub mod timeline;
pub mod transcript;

mod build;
mod util;

pub use build::{
    build_video, schedule_transcript, Assets, Build, BuildContext, Config, Error,
    RemainderLedger, Stats,
};
pub use util::is_close;
