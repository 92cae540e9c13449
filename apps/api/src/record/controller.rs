//! Editable Record Controller: the single owner of the current structured record.
//!
//! Every mutation builds the next record from the previous one, re-validates only what
//! it touched, and republishes the full snapshot on a `watch` channel. The lock is never
//! held across an `.await`, so `snapshot()` never blocks on a pending operation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::record::schema::{FieldPath, ListField, StructuredRecord};
use crate::record::validation::{validate_record, ValidationReport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("No structured resume is loaded")]
    NoActiveRecord,

    #[error("Index {index} is out of range for {list} (length {len})")]
    IndexOutOfRange {
        list: ListField,
        index: usize,
        len: usize,
    },

    #[error("'{0}' cannot be edited directly")]
    NotEditable(FieldPath),
}

/// The current record together with its per-field validation map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSnapshot {
    pub record: StructuredRecord,
    pub validation: ValidationReport,
    pub valid: bool,
}

#[derive(Default)]
struct Current {
    record: Option<StructuredRecord>,
    validation: ValidationReport,
}

impl Current {
    fn snapshot(&self) -> Option<RecordSnapshot> {
        self.record.as_ref().map(|record| RecordSnapshot {
            record: record.clone(),
            validation: self.validation.clone(),
            valid: self.validation.is_valid(),
        })
    }
}

pub struct RecordController {
    current: Mutex<Current>,
    publisher: watch::Sender<Option<RecordSnapshot>>,
}

impl Default for RecordController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordController {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            current: Mutex::new(Current::default()),
            publisher,
        }
    }

    /// Receives every republished snapshot; `None` means no record is loaded.
    pub fn subscribe(&self) -> watch::Receiver<Option<RecordSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> Option<RecordSnapshot> {
        self.lock().snapshot()
    }

    /// Installs a freshly structured record, discarding whatever was loaded before.
    pub fn replace(&self, record: StructuredRecord) -> RecordSnapshot {
        let validation = validate_record(&record);
        let mut current = self.lock();
        self.commit(&mut current, record, validation)
    }

    /// Drops the current record. Called as soon as a new upload starts.
    pub fn clear(&self) {
        let mut current = self.lock();
        current.record = None;
        current.validation = ValidationReport::default();
        self.publisher.send_replace(None);
    }

    /// Replaces one scalar or list item and re-validates that path only.
    pub fn set_field(&self, path: &FieldPath, value: String) -> Result<RecordSnapshot, RecordError> {
        self.mutate(|record, validation| {
            let next = match path {
                FieldPath::Scalar(field) => record.with_scalar(*field, value),
                FieldPath::ListItem(list, index) => record
                    .with_list_item(*list, *index, value)
                    .ok_or_else(|| out_of_range(record, *list, *index))?,
                FieldPath::List(_) | FieldPath::Unknown(_) => {
                    return Err(RecordError::NotEditable(path.clone()))
                }
            };
            validation.revalidate_path(&next, path);
            Ok(next)
        })
    }

    /// Appends an empty item, which stays invalid until it is filled in.
    pub fn append_list_item(&self, list: ListField) -> Result<RecordSnapshot, RecordError> {
        self.mutate(|record, validation| {
            let next = record.with_appended_item(list);
            validation.revalidate_list(&next, list);
            Ok(next)
        })
    }

    pub fn remove_list_item(
        &self,
        list: ListField,
        index: usize,
    ) -> Result<RecordSnapshot, RecordError> {
        self.mutate(|record, validation| {
            let next = record
                .without_item(list, index)
                .ok_or_else(|| out_of_range(record, list, index))?;
            validation.revalidate_list(&next, list);
            Ok(next)
        })
    }

    fn mutate<F>(&self, apply: F) -> Result<RecordSnapshot, RecordError>
    where
        F: FnOnce(&StructuredRecord, &mut ValidationReport) -> Result<StructuredRecord, RecordError>,
    {
        let mut current = self.lock();
        let record = current.record.as_ref().ok_or(RecordError::NoActiveRecord)?;

        // Validation is updated on a copy so a rejected edit leaves both halves untouched.
        let mut validation = current.validation.clone();
        let next = apply(record, &mut validation)?;

        debug!(violations = validation.len(), "record updated");
        Ok(self.commit(&mut current, next, validation))
    }

    fn commit(
        &self,
        current: &mut Current,
        record: StructuredRecord,
        validation: ValidationReport,
    ) -> RecordSnapshot {
        let snapshot = RecordSnapshot {
            valid: validation.is_valid(),
            record: record.clone(),
            validation: validation.clone(),
        };
        current.record = Some(record);
        current.validation = validation;
        self.publisher.send_replace(Some(snapshot.clone()));
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn out_of_range(record: &StructuredRecord, list: ListField, index: usize) -> RecordError {
    RecordError::IndexOutOfRange {
        list,
        index,
        len: record.list(list).len(),
    }
}
