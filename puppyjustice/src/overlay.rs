//! Overlays describe text and images composited over footage.
//!
//! There are two: the title card that opens a video, and the name plate shown over a
//! speaker's first qualifying appearance. Both are plain data; drawing them is left to the
//! encoder that consumes the timeline.

use crate::build::{Config, Error};
use crate::transcript::Case;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Position {
    /// Top-left corner, in pixels
    At(i32, i32),
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: String,
    pub font_size: u32,
    pub color: String,
    pub stroke_color: Option<String>,
    pub stroke_width: u32,
    /// Wrap width in pixels, if the text should be laid out as a caption
    pub wrap_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    Image {
        path: PathBuf,
        position: Position,
    },
    Text {
        text: String,
        style: TextStyle,
        position: Position,
    },
}

/// Where and how overlays are drawn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    pub frame_size: (u32, u32),
    pub plate_position: (i32, i32),
    pub name_position: (i32, i32),
    pub name_style: TextStyle,
    pub title_position: (i32, i32),
    pub title_style: TextStyle,
    pub card_style: TextStyle,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        OverlayLayout {
            frame_size: (1280, 720),
            plate_position: (60, 540),
            name_position: (80, 550),
            name_style: TextStyle {
                font: "Bookman-URW-Demi-Bold".to_string(),
                font_size: 40,
                color: "white".to_string(),
                stroke_color: Some("black".to_string()),
                stroke_width: 2,
                wrap_width: None,
            },
            title_position: (80, 600),
            title_style: TextStyle {
                font: "Bookman-URW-Light-Italic".to_string(),
                font_size: 20,
                color: "white".to_string(),
                stroke_color: None,
                stroke_width: 0,
                wrap_width: None,
            },
            card_style: TextStyle {
                font: "Bookman-URW-Demi-Bold".to_string(),
                font_size: 65,
                color: "white".to_string(),
                stroke_color: Some("black".to_string()),
                stroke_width: 2,
                wrap_width: Some(900),
            },
        }
    }
}

/// A name plate over a speaker's introduction clip.
///
/// It has no duration of its own; it lasts exactly as long as the segment it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerOverlay {
    pub speaker_id: i64,
    pub name: String,
    pub title: Option<String>,
    pub layers: Vec<Layer>,
}

/// Display name and role of a speaker in a case.
///
/// Advocates are searched before the justices of each court.
pub fn speaker_info(case: &Case, speaker_id: i64) -> Result<(String, Option<String>), Error> {
    if let Some(entry) = case.advocates().find(|a| a.advocate.id == speaker_id) {
        return Ok((
            entry.advocate.name.clone(),
            entry.advocate_description.clone(),
        ));
    }

    if let Some(justice) = case.justices().find(|m| m.id == speaker_id) {
        let title = justice
            .roles
            .as_ref()
            .and_then(|roles| roles.first())
            .and_then(|role| role.role_title.clone());
        return Ok((justice.name.clone(), title));
    }

    Err(Error::SpeakerNotFound(speaker_id))
}

impl SpeakerOverlay {
    pub fn for_speaker(case: &Case, speaker_id: i64, config: &Config) -> Result<Self, Error> {
        let (name, title) = speaker_info(case, speaker_id)?;
        let title = title.filter(|t| !t.trim().is_empty());
        let layout = &config.layout;

        let mut layers = vec![
            Layer::Image {
                path: config.assets.speaker_background.clone(),
                position: Position::At(layout.plate_position.0, layout.plate_position.1),
            },
            Layer::Text {
                text: name.clone(),
                style: layout.name_style.clone(),
                position: Position::At(layout.name_position.0, layout.name_position.1),
            },
        ];
        if let Some(title) = &title {
            layers.push(Layer::Text {
                text: title.clone(),
                style: layout.title_style.clone(),
                position: Position::At(layout.title_position.0, layout.title_position.1),
            });
        }

        Ok(SpeakerOverlay {
            speaker_id,
            name,
            title,
            layers,
        })
    }
}
