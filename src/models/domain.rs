use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

/// A profile eligible for a swipe decision, as shown on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub photo: String,
    pub location: Location,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub bio: String,
}

/// Row of the `profiles` table
///
/// Everything except the id and name is optional because a freshly created
/// account only carries those two fields until the user edits the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Profile {
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 18, max = 120))]
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[validate(url)]
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Minimal profile written right after sign-up
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age: None,
            gender: None,
            photo: None,
            city: None,
            country: None,
            interests: Vec::new(),
            languages: Vec::new(),
            bio: None,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    /// Add an interest; blank and duplicate entries are rejected
    pub fn add_interest(&mut self, interest: &str) -> bool {
        push_unique(&mut self.interests, interest)
    }

    pub fn remove_interest(&mut self, interest: &str) {
        self.interests.retain(|i| i != interest);
    }

    /// Add a language; blank and duplicate entries are rejected
    pub fn add_language(&mut self, language: &str) -> bool {
        push_unique(&mut self.languages, language)
    }

    pub fn remove_language(&mut self, language: &str) {
        self.languages.retain(|l| l != language);
    }

    /// Convert into a card candidate. Profiles without an age or photo
    /// cannot be shown and yield `None`.
    pub fn into_candidate(self) -> Option<Candidate> {
        let age = self.age?;
        let photo = self.photo.filter(|p| !p.is_empty())?;

        Some(Candidate {
            id: self.id,
            name: self.name,
            age,
            gender: self.gender.unwrap_or(Gender::Other),
            photo,
            location: Location {
                city: self.city.unwrap_or_default(),
                country: self.country.unwrap_or_default(),
            },
            interests: self.interests,
            languages: self.languages,
            bio: self.bio.unwrap_or_default(),
        })
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

/// Outcome of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Swiped right
    Accept,
    /// Swiped left
    Reject,
}

impl Direction {
    /// Negative horizontal velocity rejects, anything else accepts
    #[inline]
    pub fn from_velocity(vx: f64) -> Self {
        if vx < 0.0 {
            Direction::Reject
        } else {
            Direction::Accept
        }
    }

    /// -1.0 for reject (left), 1.0 for accept (right)
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Accept => 1.0,
            Direction::Reject => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Accept => "accept",
            Direction::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal swipe decision for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub direction: Direction,
    #[serde(rename = "decidedAt")]
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(candidate_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            direction,
            decided_at: Utc::now(),
        }
    }
}

/// Row of the `swipes` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeRecord {
    pub id: String,
    pub user_id: String,
    pub target_id: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

impl SwipeRecord {
    pub fn from_decision(user_id: &str, decision: &Decision) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            target_id: decision.candidate_id.clone(),
            direction: decision.direction,
            created_at: decision.decided_at,
        }
    }
}
