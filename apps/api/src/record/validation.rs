use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::record::schema::{is_schema_key, FieldPath, ListField, ScalarField, StructuredRecord};

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Missing,
    WrongType { expected: &'static str },
    Empty,
    Unexpected,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => f.write_str("is required"),
            Violation::WrongType { expected } => write!(f, "must be {expected}"),
            Violation::Empty => f.write_str("cannot be empty"),
            Violation::Unexpected => f.write_str("is not part of the resume schema"),
        }
    }
}

/// Per-field validation outcome. An empty report means the record is valid.
///
/// Ordered by field path so the same record always yields the same report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    violations: BTreeMap<FieldPath, Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[cfg(test)]
    pub fn get(&self, path: &FieldPath) -> Option<&Violation> {
        self.violations.get(path)
    }

    fn insert(&mut self, path: FieldPath, violation: Violation) {
        self.violations.insert(path, violation);
    }

    /// Re-checks one scalar or list item, leaving every other entry as it was.
    pub fn revalidate_path(&mut self, record: &StructuredRecord, path: &FieldPath) {
        self.violations.remove(path);
        match path {
            FieldPath::Scalar(field) => {
                if is_blank(record.scalar(*field)) {
                    self.insert(path.clone(), Violation::Empty);
                }
            }
            FieldPath::ListItem(list, index) => {
                if record.list(*list).get(*index).is_some_and(|item| is_blank(item)) {
                    self.insert(path.clone(), Violation::Empty);
                }
            }
            FieldPath::List(list) => self.revalidate_list(record, *list),
            FieldPath::Unknown(_) => {}
        }
    }

    /// Drops every entry under `list` and re-checks its items at their current indices.
    pub fn revalidate_list(&mut self, record: &StructuredRecord, list: ListField) {
        self.violations.retain(|path, _| path.list() != Some(list));
        for (index, item) in record.list(list).iter().enumerate() {
            if is_blank(item) {
                self.insert(FieldPath::ListItem(list, index), Violation::Empty);
            }
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, violation) in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{path} {violation}")?;
            first = false;
        }
        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validates a typed record against the non-empty constraint.
pub fn validate_record(record: &StructuredRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    for field in ScalarField::ALL {
        report.revalidate_path(record, &FieldPath::Scalar(field));
    }
    for list in ListField::ALL {
        report.revalidate_list(record, list);
    }
    report
}

/// Validates a raw structuring-service response.
///
/// The response must carry exactly the ten schema fields with the right JSON types and
/// non-empty values. Nothing is repaired: any violation rejects the whole response.
pub fn validate_response(value: &Value) -> Result<StructuredRecord, ValidationReport> {
    let mut report = ValidationReport::default();
    let mut record = StructuredRecord::default();
    let empty = serde_json::Map::new();
    let object = value.as_object().unwrap_or(&empty);

    for field in ScalarField::ALL {
        let path = FieldPath::Scalar(field);
        match object.get(field.key()) {
            None => report.insert(path, Violation::Missing),
            Some(Value::String(text)) => {
                if is_blank(text) {
                    report.insert(path, Violation::Empty);
                }
                *record.scalar_mut(field) = text.clone();
            }
            Some(_) => report.insert(path, Violation::WrongType { expected: "a string" }),
        }
    }

    for list in ListField::ALL {
        match object.get(list.key()) {
            None => report.insert(FieldPath::List(list), Violation::Missing),
            Some(Value::Array(items)) => {
                let mut texts = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let path = FieldPath::ListItem(list, index);
                    match item {
                        Value::String(text) => {
                            if is_blank(text) {
                                report.insert(path, Violation::Empty);
                            }
                            texts.push(text.clone());
                        }
                        _ => report.insert(path, Violation::WrongType { expected: "a string" }),
                    }
                }
                *record.list_mut(list) = texts;
            }
            Some(_) => report.insert(
                FieldPath::List(list),
                Violation::WrongType {
                    expected: "an array of strings",
                },
            ),
        }
    }

    for key in object.keys().filter(|k| !is_schema_key(k)) {
        report.insert(FieldPath::Unknown(key.clone()), Violation::Unexpected);
    }

    if report.is_valid() {
        Ok(record)
    } else {
        Err(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conforming_response() -> Value {
        json!({
            "name": "John Doe",
            "designation": "Software Engineer",
            "nationality": "Indian",
            "totalExperience": "13+ years",
            "relevantExperience": "4+ years",
            "education": "B.Tech, IIT Delhi",
            "keyCompetencies": "Rust, Distributed Systems",
            "personalScorecard": ["Reliable", "Team lead"],
            "professionalExperiences": ["Led the payments platform rewrite"],
            "projectExperiences": []
        })
    }

    #[test]
    fn test_conforming_response_is_valid() {
        let record = validate_response(&conforming_response()).unwrap();
        assert_eq!(record.name, "John Doe");
        assert_eq!(record.personal_scorecard.len(), 2);
        assert!(validate_record(&record).is_valid());
    }

    #[test]
    fn test_not_specified_placeholders_and_empty_lists_are_accepted() {
        let mut response = conforming_response();
        response["nationality"] = json!("Not specified");
        response["personalScorecard"] = json!([]);
        let record = validate_response(&response).unwrap();
        assert_eq!(record.nationality, "Not specified");
        assert!(record.personal_scorecard.is_empty());
    }

    #[test]
    fn test_each_missing_field_is_named() {
        let keys: Vec<&str> = ScalarField::ALL
            .iter()
            .map(|f| f.key())
            .chain(ListField::ALL.iter().map(|l| l.key()))
            .collect();
        assert_eq!(keys.len(), 10);

        for key in keys {
            let mut response = conforming_response();
            response.as_object_mut().unwrap().remove(key);
            let report = validate_response(&response).unwrap_err();
            let path: FieldPath = key.parse().unwrap();
            assert_eq!(report.get(&path), Some(&Violation::Missing), "field {key}");
            assert_eq!(report.len(), 1);
        }
    }

    #[test]
    fn test_mistyped_fields_are_rejected() {
        let mut response = conforming_response();
        response["totalExperience"] = json!(13);
        response["personalScorecard"] = json!("Reliable");
        response["professionalExperiences"] = json!(["ok", 7]);
        let report = validate_response(&response).unwrap_err();
        assert_eq!(
            report.get(&FieldPath::Scalar(ScalarField::TotalExperience)),
            Some(&Violation::WrongType { expected: "a string" })
        );
        assert!(matches!(
            report.get(&FieldPath::List(ListField::PersonalScorecard)),
            Some(Violation::WrongType { .. })
        ));
        assert!(report
            .get(&FieldPath::ListItem(ListField::ProfessionalExperiences, 1))
            .is_some());
    }

    #[test]
    fn test_extra_keys_are_rejected() {
        let mut response = conforming_response();
        response["salary"] = json!("100k");
        let report = validate_response(&response).unwrap_err();
        assert_eq!(
            report.get(&FieldPath::Unknown("salary".into())),
            Some(&Violation::Unexpected)
        );
    }

    #[test]
    fn test_non_object_response_reports_every_field_missing() {
        let report = validate_response(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(report.len(), 10);
    }

    #[test]
    fn test_whitespace_only_values_count_as_empty() {
        let mut response = conforming_response();
        response["nationality"] = json!("   ");
        response["personalScorecard"] = json!(["fine", ""]);
        let report = validate_response(&response).unwrap_err();
        assert_eq!(
            report.get(&FieldPath::Scalar(ScalarField::Nationality)),
            Some(&Violation::Empty)
        );
        assert_eq!(
            report.get(&FieldPath::ListItem(ListField::PersonalScorecard, 1)),
            Some(&Violation::Empty)
        );
    }

    #[test]
    fn test_partial_validity_is_expressible() {
        let mut record = validate_response(&conforming_response()).unwrap();
        record.education.clear();
        record.project_experiences.push(String::new());
        let report = validate_record(&record);
        assert_eq!(report.len(), 2);
        assert!(report.get(&FieldPath::Scalar(ScalarField::Name)).is_none());
    }

    #[test]
    fn test_revalidate_list_shifts_entries() {
        let mut record = validate_response(&conforming_response()).unwrap();
        record.personal_scorecard = vec!["a".into(), String::new(), String::new()];
        let mut report = validate_record(&record);
        assert_eq!(report.len(), 2);

        record.personal_scorecard.remove(0);
        report.revalidate_list(&record, ListField::PersonalScorecard);
        assert!(report
            .get(&FieldPath::ListItem(ListField::PersonalScorecard, 0))
            .is_some());
        assert!(report
            .get(&FieldPath::ListItem(ListField::PersonalScorecard, 2))
            .is_none());
    }

    #[test]
    fn test_report_display_is_ordered() {
        let mut record = validate_response(&conforming_response()).unwrap();
        record.name.clear();
        record.key_competencies.clear();
        let report = validate_record(&record);
        assert_eq!(
            report.to_string(),
            "name cannot be empty; keyCompetencies cannot be empty"
        );
    }

    #[test]
    fn test_report_serializes_as_path_map() {
        let mut record = validate_response(&conforming_response()).unwrap();
        record.professional_experiences.push(" ".into());
        let json = serde_json::to_value(validate_record(&record)).unwrap();
        assert_eq!(
            json,
            json!({ "professionalExperiences[1]": { "kind": "empty" } })
        );
    }
}
