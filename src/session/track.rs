use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A vacancy with its fixed, ordered list of interview questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

impl Track {
    pub fn new(name: impl Into<String>, questions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            questions,
        }
    }

    pub fn question(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// Read-only set of tracks offered to applicants, in display order
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    tracks: Vec<Arc<Track>>,
}

impl TrackCatalog {
    /// Build a catalog, rejecting an empty table or duplicate names
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            bail!("At least one track must be configured");
        }

        let mut seen = HashSet::new();
        for track in &tracks {
            if track.name.trim().is_empty() {
                bail!("Track names must not be empty");
            }
            if !seen.insert(track.name.as_str()) {
                bail!("Duplicate track name: {}", track.name);
            }
        }

        Ok(Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
        })
    }

    /// Exact, case-sensitive lookup by track name
    pub fn find(&self, name: &str) -> Option<Arc<Track>> {
        self.tracks.iter().find(|t| t.name == name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.name.as_str())
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// The three vacancies offered out of the box
pub fn default_tracks() -> Vec<Track> {
    vec![
        Track::new(
            "Frontend Developer",
            vec![
                "What is your work experience?".to_string(),
                "Which technologies do you know?".to_string(),
                "Tell us about your latest project".to_string(),
            ],
        ),
        Track::new(
            "Backend Developer",
            vec![
                "What is your work experience?".to_string(),
                "Which programming languages do you use?".to_string(),
                "Tell us about a challenging project you worked on".to_string(),
            ],
        ),
        Track::new(
            "Project Manager",
            vec![
                "What is your project management experience?".to_string(),
                "How many people were in the largest team you led?".to_string(),
                "Tell us about a project you completed successfully".to_string(),
            ],
        ),
    ]
}
