//! Shared metadata handling for colored collections.
//!
//! Calendars and task lists carry the same metadata columns (name,
//! display color, collection tombstone) and settle them against the
//! log identically; both adapters delegate here. Address books differ
//! (no color column) and keep their own handling.

use crate::adapter::ApplyOutcome;
use crate::entry_codec::{format_color, parse_color};
use pimsync_model::{CollectionId, LogEntry, ProgressTracker, Value};
use tracing::{debug, warn};

/// Mutable view over one colored store's metadata columns.
///
/// The color shadow lives in the progress tracker, next to the
/// counters it is persisted with.
pub(crate) struct ColoredMeta<'a> {
    pub id: &'a CollectionId,
    pub name: &'a mut String,
    pub shadow_name: &'a mut Option<String>,
    pub color: &'a mut Option<i32>,
    pub deleted: &'a mut bool,
    pub tombstone_pushed: &'a mut bool,
    pub progress: &'a ProgressTracker,
    pub revision: &'a mut u64,
}

impl ColoredMeta<'_> {
    /// Applies one pulled info entry.
    ///
    /// Bumps the revision and reports `Applied` only on a real change,
    /// but settles the matching shadow either way so an equal value is
    /// never re-pushed.
    pub fn apply_info_entry(&mut self, key: &str, value: &Value) -> ApplyOutcome {
        match key {
            "name" => match value.as_str() {
                Some(name) => {
                    let changed = name != self.name.as_str();
                    if changed {
                        *self.name = name.to_string();
                        *self.revision += 1;
                    }
                    *self.shadow_name = Some(name.to_string());
                    if changed {
                        ApplyOutcome::Applied
                    } else {
                        ApplyOutcome::Unchanged
                    }
                }
                None => {
                    warn!(collection = %self.id, ?value, "ignoring non-text name");
                    ApplyOutcome::Unchanged
                }
            },
            "color" => match parse_color(value) {
                Some(color) => {
                    let changed = *self.color != Some(color);
                    if changed {
                        *self.color = Some(color);
                        *self.revision += 1;
                    }
                    self.progress.set_shadow_color(Some(color));
                    if changed {
                        ApplyOutcome::Applied
                    } else {
                        ApplyOutcome::Unchanged
                    }
                }
                None => {
                    warn!(collection = %self.id, ?value, "ignoring unparseable color");
                    ApplyOutcome::Unchanged
                }
            },
            "deleted" => match value.as_bool() {
                Some(true) => {
                    let changed = !*self.deleted;
                    *self.deleted = true;
                    *self.tombstone_pushed = true;
                    if changed {
                        *self.revision += 1;
                        ApplyOutcome::Applied
                    } else {
                        ApplyOutcome::Unchanged
                    }
                }
                _ => ApplyOutcome::Unchanged,
            },
            other => {
                debug!(collection = %self.id, key = other, "ignoring unknown info key");
                ApplyOutcome::Unchanged
            }
        }
    }

    /// Info entries for every local metadata change the log has not
    /// seen yet.
    pub fn changed_entries(&self) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        if self.shadow_name.as_deref() != Some(self.name.as_str()) {
            entries.push(LogEntry::info("name", Value::String(self.name.clone())));
        }
        if let Some(color) = *self.color {
            if self.progress.shadow_color() != Some(color) {
                entries.push(LogEntry::info("color", format_color(color)));
            }
        }
        if *self.deleted && !*self.tombstone_pushed {
            entries.push(LogEntry::info("deleted", Value::Bool(true)));
        }
        entries
    }

    /// Records one pushed entry as durable, settling its shadow.
    pub fn commit_entry(&mut self, entry: &LogEntry) {
        match entry.key.as_str() {
            "name" => *self.shadow_name = entry.value.as_str().map(str::to_string),
            "color" => self.progress.set_shadow_color(parse_color(&entry.value)),
            "deleted" => *self.tombstone_pushed = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_settle_shadows_without_revision_bump() {
        let id = CollectionId::new("tasks-1");
        let mut name = "Inbox".to_string();
        let mut shadow_name = None;
        let mut color = Some(0x112233);
        let mut deleted = false;
        let mut tombstone_pushed = false;
        let progress = ProgressTracker::new();
        let mut revision = 0;

        let mut meta = ColoredMeta {
            id: &id,
            name: &mut name,
            shadow_name: &mut shadow_name,
            color: &mut color,
            deleted: &mut deleted,
            tombstone_pushed: &mut tombstone_pushed,
            progress: &progress,
            revision: &mut revision,
        };

        assert_eq!(
            meta.apply_info_entry("name", &Value::String("Inbox".into())),
            ApplyOutcome::Unchanged
        );
        assert_eq!(
            meta.apply_info_entry("color", &Value::String("#112233".into())),
            ApplyOutcome::Unchanged
        );
        assert!(meta.changed_entries().is_empty());
        assert_eq!(*meta.revision, 0);
    }

    #[test]
    fn local_changes_surface_until_committed() {
        let id = CollectionId::new("cal-1");
        let mut name = "Work".to_string();
        let mut shadow_name = Some("Work".to_string());
        let mut color = Some(0xFF0000);
        let mut deleted = true;
        let mut tombstone_pushed = false;
        let progress = ProgressTracker::new();
        let mut revision = 0;

        let mut meta = ColoredMeta {
            id: &id,
            name: &mut name,
            shadow_name: &mut shadow_name,
            color: &mut color,
            deleted: &mut deleted,
            tombstone_pushed: &mut tombstone_pushed,
            progress: &progress,
            revision: &mut revision,
        };

        let entries = meta.changed_entries();
        let keys: Vec<_> = entries.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, vec!["color", "deleted"]);

        for entry in &entries {
            meta.commit_entry(entry);
        }
        assert!(meta.changed_entries().is_empty());
    }
}
