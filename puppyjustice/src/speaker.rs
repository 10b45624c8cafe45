//! Speaker to resource resolution.
//!
//! Every speaker in a transcript is drawn from a clip pool. Justices have their own pool,
//! keyed by surname. Everyone else is an advocate and is assigned one of a small number of
//! rotating advocate pools the first time they speak.

use log::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::transcript::{Case, Speaker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Justice {
    Roberts,
    Scalia,
    Ginsburg,
    Sotomayor,
    Kagan,
    Breyer,
    Kennedy,
    Alito,
    Thomas,
}

const JUSTICE_NAMES: [(&str, Justice); 9] = [
    ("John G. Roberts, Jr.", Justice::Roberts),
    ("Antonin Scalia", Justice::Scalia),
    ("Ruth Bader Ginsburg", Justice::Ginsburg),
    ("Sonia Sotomayor", Justice::Sotomayor),
    ("Elena Kagan", Justice::Kagan),
    ("Stephen G. Breyer", Justice::Breyer),
    ("Anthony M. Kennedy", Justice::Kennedy),
    ("Samuel A. Alito, Jr.", Justice::Alito),
    ("Clarence Thomas", Justice::Thomas),
];

impl Justice {
    /// Look up a justice by the display name used in transcripts.
    pub fn from_name(name: &str) -> Option<Justice> {
        JUSTICE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, j)| *j)
    }

    pub fn resource_id(&self) -> &'static str {
        match self {
            Justice::Roberts => "roberts",
            Justice::Scalia => "scalia",
            Justice::Ginsburg => "ginsburg",
            Justice::Sotomayor => "sotomayor",
            Justice::Kagan => "kagan",
            Justice::Breyer => "breyer",
            Justice::Kennedy => "kennedy",
            Justice::Alito => "alito",
            Justice::Thomas => "thomas",
        }
    }

    pub fn all() -> impl Iterator<Item = Justice> {
        JUSTICE_NAMES.iter().map(|(_, j)| *j)
    }
}

/// Resource ids of the rotating advocate pools.
pub const ADVOCATE_RESOURCES: [&str; 2] = ["lawyer0", "lawyer1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerResource {
    Justice(Justice),
    /// Index into [`ADVOCATE_RESOURCES`]
    Advocate(usize),
}

impl SpeakerResource {
    pub fn resource_id(&self) -> &'static str {
        match self {
            SpeakerResource::Justice(j) => j.resource_id(),
            SpeakerResource::Advocate(slot) => ADVOCATE_RESOURCES[*slot % ADVOCATE_RESOURCES.len()],
        }
    }
}

impl fmt::Display for SpeakerResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_id())
    }
}

/// Names of non-justice speakers and the advocate pool each was given.
///
/// Append-only for the lifetime of a build: a speaker keeps their pool across sections.
#[derive(Debug, Default)]
pub struct SpeakerMapping {
    advocates: BTreeMap<String, usize>,
}

impl SpeakerMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, speaker: &Speaker) -> SpeakerResource {
        if let Some(justice) = Justice::from_name(&speaker.name) {
            return SpeakerResource::Justice(justice);
        }

        if speaker.roles.as_ref().is_some_and(|r| !r.is_empty()) {
            warn!(
                "Speaker `{}` has roles but is not a known justice, treating as advocate",
                speaker.name
            );
        }

        let next_slot = self.advocates.len() % ADVOCATE_RESOURCES.len();
        let slot = *self
            .advocates
            .entry(speaker.name.clone())
            .or_insert_with(|| {
                debug!(
                    "Assigned `{}` to {}",
                    speaker.name, ADVOCATE_RESOURCES[next_slot]
                );
                next_slot
            });
        SpeakerResource::Advocate(slot)
    }

    pub fn len(&self) -> usize {
        self.advocates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advocates.is_empty()
    }
}

/// Speaker ids that have already been shown their name overlay.
#[derive(Debug, Default)]
pub struct IntroducedSpeakers {
    ids: BTreeSet<i64>,
}

impl IntroducedSpeakers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an introduction. Returns false if the speaker was already introduced.
    pub fn insert(&mut self, speaker_id: i64) -> bool {
        self.ids.insert(speaker_id)
    }

    pub fn contains(&self, speaker_id: i64) -> bool {
        self.ids.contains(&speaker_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Whether every justice on the first hearing court has a clip pool.
pub fn can_handle_case(case: &Case) -> bool {
    match case.heard_by.first() {
        Some(court) => court
            .members
            .iter()
            .all(|member| Justice::from_name(&member.name).is_some()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(id: i64, name: &str) -> Speaker {
        Speaker {
            id,
            name: name.to_string(),
            roles: None,
            last_name: name.split_whitespace().last().unwrap_or("").to_string(),
        }
    }

    #[test]
    fn test_justice_lookup() {
        assert_eq!(
            Justice::from_name("Elena Kagan").map(|j| j.resource_id()),
            Some("kagan")
        );
        assert_eq!(Justice::from_name("Elena"), None);
        assert_eq!(Justice::all().count(), 9);
    }

    #[test]
    fn test_advocates_alternate_and_memoize() {
        let mut mapping = SpeakerMapping::new();
        let a = mapping.resolve(&speaker(10, "Jane Doe"));
        let b = mapping.resolve(&speaker(11, "Richard Roe"));
        let c = mapping.resolve(&speaker(12, "Sam Poe"));
        assert_eq!(a.resource_id(), "lawyer0");
        assert_eq!(b.resource_id(), "lawyer1");
        assert_eq!(c.resource_id(), "lawyer0");

        // Memoized, and justices never take a slot
        assert_eq!(mapping.resolve(&speaker(11, "Richard Roe")), b);
        assert_eq!(
            mapping.resolve(&speaker(1, "Clarence Thomas")),
            SpeakerResource::Justice(Justice::Thomas)
        );
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_introduced_once() {
        let mut introduced = IntroducedSpeakers::new();
        assert!(introduced.insert(7));
        assert!(!introduced.insert(7));
        assert!(introduced.contains(7));
    }

    #[test]
    fn test_can_handle_case() {
        let case: Case = serde_json::from_str(
            r#"{"heard_by": [{"members": [
                {"ID": 1, "name": "Elena Kagan", "roles": []},
                {"ID": 2, "name": "Clarence Thomas", "roles": []}
            ]}], "advocates": []}"#,
        )
        .unwrap();
        assert!(can_handle_case(&case));

        let case: Case = serde_json::from_str(
            r#"{"heard_by": [{"members": [{"ID": 3, "name": "Neil Gorsuch"}]}]}"#,
        )
        .unwrap();
        assert!(!can_handle_case(&case));

        let case: Case = serde_json::from_str(r#"{"heard_by": []}"#).unwrap();
        assert!(!can_handle_case(&case));
    }
}
