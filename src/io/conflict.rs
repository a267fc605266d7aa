//! Import conflict detection.
//!
//! A conflict is an imported record whose name already exists in the
//! store and whose mode-relevant fields differ from the stored values.
//! Only fields the imported record actually carries are compared, so a
//! projection that omits a column never conflicts on it.

use crate::Result;
use crate::io::fields::{self, Field, PROBLEM_COMPARE_FIELDS, USER_COMPARE_FIELDS};
use crate::models::{BundleRecord, Mode};
use crate::storage::ProgressStore;

/// One field that differs between the store and an imported record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// The differing field.
    pub field: Field,
    /// Stored value, as serialized text.
    pub existing: String,
    /// Imported value, as serialized text.
    pub imported: String,
}

/// An imported record that collides with stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    /// Problem name, the record identity.
    pub name: String,
    /// Every differing field, in canonical field order.
    pub changes: Vec<FieldChange>,
}

/// Finds every imported record that conflicts with the store.
///
/// `list_id` addresses the batch; records carrying their own `list_id`
/// override it. Records naming problems the store does not hold are new,
/// not conflicting.
pub fn detect_conflicts(
    store: &dyn ProgressStore,
    list_id: Option<&str>,
    imported: &[BundleRecord],
    mode: Mode,
) -> Result<Vec<ConflictEntry>> {
    let mut conflicts = Vec::new();
    for record in imported {
        if record.name.is_empty() {
            continue;
        }
        let Some(existing) = existing_record(store, list_id, record)? else {
            continue;
        };
        let changes = compare_records(&existing, record, mode);
        if !changes.is_empty() {
            conflicts.push(ConflictEntry {
                name: record.name.clone(),
                changes,
            });
        }
    }
    Ok(conflicts)
}

/// Builds the stored counterpart of an imported record, or `None` when
/// the store has no problem with that name.
///
/// Missing progress reads as defaults (unsolved, blank notes), matching
/// what an export of the untouched row would contain.
pub fn existing_record(
    store: &dyn ProgressStore,
    list_id: Option<&str>,
    record: &BundleRecord,
) -> Result<Option<BundleRecord>> {
    let target_list = record.list_id.as_deref().or(list_id);
    let problem = match target_list {
        Some(list) => store
            .get_problems_for_list(list)?
            .into_iter()
            .find(|p| p.name == record.name),
        None => store
            .get_problems_by_name(&record.name)?
            .into_iter()
            .next(),
    };
    let Some(problem) = problem else {
        return Ok(None);
    };

    let progress = store.get_progress(&problem.id)?.unwrap_or_default();
    Ok(Some(BundleRecord::from(&problem).with_progress(&progress)))
}

/// Compares the mode-relevant fields two records share.
///
/// A field is compared only when the imported record carries it; the
/// stored side reads absent values as blanks.
#[must_use]
pub fn compare_records(
    existing: &BundleRecord,
    imported: &BundleRecord,
    mode: Mode,
) -> Vec<FieldChange> {
    let compared: Vec<Field> = match mode {
        Mode::Problems => PROBLEM_COMPARE_FIELDS.to_vec(),
        Mode::User => USER_COMPARE_FIELDS.to_vec(),
        Mode::Full => PROBLEM_COMPARE_FIELDS
            .iter()
            .chain(USER_COMPARE_FIELDS.iter())
            .copied()
            .collect(),
    };

    let mut changes = Vec::new();
    for field in compared {
        if !fields::field_is_set(imported, field) {
            continue;
        }
        let existing_text = fields::field_text(existing, field);
        let imported_text = fields::field_text(imported, field);
        if existing_text != imported_text {
            changes.push(FieldChange {
                field,
                existing: existing_text,
                imported: imported_text,
            });
        }
    }
    changes
}
