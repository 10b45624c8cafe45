//! Transcript and case documents.
//!
//! These mirror the JSON served for an oral argument: a transcript is a list of sections,
//! each a list of speaker turns with timed text blocks. A case lists the courts that heard it
//! and the advocates who argued it. Both are immutable inputs to a build.

use serde::{Deserialize, Serialize};

use crate::util::{de_opt_seconds, de_seconds};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, deserialize_with = "de_opt_seconds")]
    pub start: Option<f64>,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Option<Speaker>,
    #[serde(deserialize_with = "de_seconds")]
    pub start: f64,
    #[serde(deserialize_with = "de_seconds")]
    pub stop: f64,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
}

impl Turn {
    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    pub fn speaker_name(&self) -> Option<&str> {
        self.speaker.as_ref().map(|s| s.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    #[serde(default)]
    pub last_name: String,
}

impl Speaker {
    /// The name shown in captions: the final word of the last name.
    pub fn caption_name(&self) -> &str {
        self.last_name
            .split_whitespace()
            .last()
            .unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub role_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(deserialize_with = "de_seconds")]
    pub start: f64,
    #[serde(deserialize_with = "de_seconds")]
    pub stop: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub heard_by: Vec<Court>,
    #[serde(default)]
    pub advocates: Option<Vec<AdvocateEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvocateEntry {
    pub advocate: Advocate,
    #[serde(default)]
    pub advocate_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advocate {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
}

impl Case {
    pub fn advocates(&self) -> impl Iterator<Item = &AdvocateEntry> {
        self.advocates.iter().flatten()
    }

    pub fn justices(&self) -> impl Iterator<Item = &Member> {
        self.heard_by.iter().flat_map(|court| court.members.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_turn_with_string_times() {
        let turn: Turn = serde_json::from_str(
            r#"{"speaker": null, "start": "1.5", "stop": 4.0, "text_blocks": []}"#,
        )
        .unwrap();
        assert!(turn.speaker.is_none());
        assert_eq!(turn.duration(), 2.5);
    }

    #[test]
    fn test_caption_name() {
        let speaker: Speaker = serde_json::from_str(
            r#"{"ID": 1, "name": "John G. Roberts, Jr.", "roles": null, "last_name": "Roberts, Jr."}"#,
        )
        .unwrap();
        assert_eq!(speaker.caption_name(), "Jr.");

        let speaker: Speaker = serde_json::from_str(
            r#"{"ID": 2, "name": "Ruth Bader Ginsburg", "last_name": "Ginsburg"}"#,
        )
        .unwrap();
        assert_eq!(speaker.caption_name(), "Ginsburg");
    }

    #[test]
    fn test_case_null_advocates() {
        let case: Case =
            serde_json::from_str(r#"{"heard_by": [{"members": []}], "advocates": null}"#).unwrap();
        assert_eq!(case.advocates().count(), 0);
        assert_eq!(case.justices().count(), 0);
    }
}
