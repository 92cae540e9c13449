//! The structured resume record and the paths that address its fields.
//!
//! Wire names are camelCase and match the structuring service contract exactly.
//! Every mutation helper here is a pure transform: it takes the previous record by
//! reference and returns the next one, so controller snapshots never alias live state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Authoring guidance for list sections. Not enforced structurally.
pub const RECOMMENDED_MAX_LIST_ITEMS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRecord {
    pub name: String,
    pub designation: String,
    pub nationality: String,
    pub total_experience: String,
    pub relevant_experience: String,
    pub education: String,
    pub key_competencies: String,
    pub personal_scorecard: Vec<String>,
    pub professional_experiences: Vec<String>,
    pub project_experiences: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Field identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarField {
    Name,
    Designation,
    Nationality,
    TotalExperience,
    RelevantExperience,
    Education,
    KeyCompetencies,
}

impl ScalarField {
    pub const ALL: [ScalarField; 7] = [
        ScalarField::Name,
        ScalarField::Designation,
        ScalarField::Nationality,
        ScalarField::TotalExperience,
        ScalarField::RelevantExperience,
        ScalarField::Education,
        ScalarField::KeyCompetencies,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScalarField::Name => "name",
            ScalarField::Designation => "designation",
            ScalarField::Nationality => "nationality",
            ScalarField::TotalExperience => "totalExperience",
            ScalarField::RelevantExperience => "relevantExperience",
            ScalarField::Education => "education",
            ScalarField::KeyCompetencies => "keyCompetencies",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScalarField::Name => "Name",
            ScalarField::Designation => "Designation",
            ScalarField::Nationality => "Nationality",
            ScalarField::TotalExperience => "Total Experience",
            ScalarField::RelevantExperience => "Relevant Experience",
            ScalarField::Education => "Education",
            ScalarField::KeyCompetencies => "Key Competencies",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListField {
    PersonalScorecard,
    ProfessionalExperiences,
    ProjectExperiences,
}

impl ListField {
    pub const ALL: [ListField; 3] = [
        ListField::PersonalScorecard,
        ListField::ProfessionalExperiences,
        ListField::ProjectExperiences,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ListField::PersonalScorecard => "personalScorecard",
            ListField::ProfessionalExperiences => "professionalExperiences",
            ListField::ProjectExperiences => "projectExperiences",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListField::PersonalScorecard => "Personal Scorecard",
            ListField::ProfessionalExperiences => "Professional Experiences",
            ListField::ProjectExperiences => "Relevant Project Experiences",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// True when `key` names one of the ten schema fields.
pub fn is_schema_key(key: &str) -> bool {
    ScalarField::from_key(key).is_some() || ListField::from_key(key).is_some()
}

// ────────────────────────────────────────────────────────────────────────────
// Field paths
// ────────────────────────────────────────────────────────────────────────────

/// Addresses one location in a record: `name`, `personalScorecard`, `personalScorecard[2]`.
///
/// `Unknown` only appears in reports about structuring-service responses that carried
/// keys outside the schema; it is never accepted as an edit target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    Scalar(ScalarField),
    List(ListField),
    ListItem(ListField, usize),
    Unknown(String),
}

impl FieldPath {
    /// The list this path belongs to, if any.
    pub fn list(&self) -> Option<ListField> {
        match self {
            FieldPath::List(list) | FieldPath::ListItem(list, _) => Some(*list),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Scalar(field) => f.write_str(field.key()),
            FieldPath::List(list) => f.write_str(list.key()),
            FieldPath::ListItem(list, index) => write!(f, "{}[{}]", list.key(), index),
            FieldPath::Unknown(key) => f.write_str(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a field of the resume schema")]
pub struct UnknownFieldPath(pub String);

impl FromStr for FieldPath {
    type Err = UnknownFieldPath;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let unknown = || UnknownFieldPath(raw.to_string());

        if let Some((key, rest)) = raw.split_once('[') {
            let index = rest
                .strip_suffix(']')
                .filter(|i| is_canonical_index(i))
                .and_then(|i| i.parse::<usize>().ok())
                .ok_or_else(unknown)?;
            let list = ListField::from_key(key).ok_or_else(unknown)?;
            return Ok(FieldPath::ListItem(list, index));
        }

        if let Some(field) = ScalarField::from_key(raw) {
            return Ok(FieldPath::Scalar(field));
        }
        ListField::from_key(raw)
            .map(FieldPath::List)
            .ok_or_else(unknown)
    }
}

/// Plain decimal digits with no sign and no leading zero, so `Display` gives back the same text.
fn is_canonical_index(raw: &str) -> bool {
    !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'))
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Accessors and pure transforms
// ────────────────────────────────────────────────────────────────────────────

impl StructuredRecord {
    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Name => &self.name,
            ScalarField::Designation => &self.designation,
            ScalarField::Nationality => &self.nationality,
            ScalarField::TotalExperience => &self.total_experience,
            ScalarField::RelevantExperience => &self.relevant_experience,
            ScalarField::Education => &self.education,
            ScalarField::KeyCompetencies => &self.key_competencies,
        }
    }

    pub(crate) fn scalar_mut(&mut self, field: ScalarField) -> &mut String {
        match field {
            ScalarField::Name => &mut self.name,
            ScalarField::Designation => &mut self.designation,
            ScalarField::Nationality => &mut self.nationality,
            ScalarField::TotalExperience => &mut self.total_experience,
            ScalarField::RelevantExperience => &mut self.relevant_experience,
            ScalarField::Education => &mut self.education,
            ScalarField::KeyCompetencies => &mut self.key_competencies,
        }
    }

    pub fn list(&self, list: ListField) -> &[String] {
        match list {
            ListField::PersonalScorecard => &self.personal_scorecard,
            ListField::ProfessionalExperiences => &self.professional_experiences,
            ListField::ProjectExperiences => &self.project_experiences,
        }
    }

    pub(crate) fn list_mut(&mut self, list: ListField) -> &mut Vec<String> {
        match list {
            ListField::PersonalScorecard => &mut self.personal_scorecard,
            ListField::ProfessionalExperiences => &mut self.professional_experiences,
            ListField::ProjectExperiences => &mut self.project_experiences,
        }
    }

    /// Returns a copy with the scalar replaced.
    pub fn with_scalar(&self, field: ScalarField, value: String) -> Self {
        let mut next = self.clone();
        *next.scalar_mut(field) = value;
        next
    }

    /// Returns a copy with one list item replaced, or `None` if `index` is out of bounds.
    pub fn with_list_item(&self, list: ListField, index: usize, value: String) -> Option<Self> {
        if index >= self.list(list).len() {
            return None;
        }
        let mut next = self.clone();
        next.list_mut(list)[index] = value;
        Some(next)
    }

    /// Returns a copy with an empty item appended to `list`.
    pub fn with_appended_item(&self, list: ListField) -> Self {
        let mut next = self.clone();
        next.list_mut(list).push(String::new());
        next
    }

    /// Returns a copy with the item at `index` removed and the rest shifted down,
    /// or `None` if `index` is out of bounds.
    pub fn without_item(&self, list: ListField, index: usize) -> Option<Self> {
        let items = self.list(list);
        if index >= items.len() {
            return None;
        }
        let remaining: Vec<String> = items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, item)| item.clone())
            .collect();
        let mut next = self.clone();
        *next.list_mut(list) = remaining;
        Some(next)
    }
}
