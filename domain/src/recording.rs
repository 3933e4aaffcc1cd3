//! Recording reconciliation.
//!
//! Local recording rows only ever hold metadata; the remote catalog holds
//! the truth about playback and publication state. Reconciliation merges
//! the two into the unified view the rest of the system consumes, applying
//! the imported-link override rules along the way.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::gateway::catalog::{scalar_to_string, RemoteCatalog, RemoteRecording};
use entity::{recordings, Id};
use entity_api::recording;
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

pub use entity_api::recording::RecordingFilter;

/// The merge of one local recording row with its remote catalog entry.
/// Exists only while the catalog still knows the recording; a local row
/// whose remote counterpart vanished is silently excluded from listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnifiedRecording {
    pub local_id: Id,
    pub recording_id: String,
    pub activity_id: Id,
    pub course_id: i64,
    pub imported: bool,
    pub remote: RemoteRecording,
}

/// Sort order for recording listings. Always passed explicitly; there is no
/// ambient sort setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            _ => Err(Error::from_kind(DomainErrorKind::Internal(
                InternalErrorKind::Entity(EntityErrorKind::Invalid),
            ))),
        }
    }
}

/// Merges local recording rows matching the filter with their remote catalog
/// entries, indexed by recording id.
///
/// The remote catalog is consulted once, for exactly the set of recording
/// ids the local query produced. Local rows without a live catalog entry are
/// skipped. Imported rows borrow the remote playback data but override any
/// `meta_*` field with the value frozen at import time.
pub async fn reconcile(
    db: &DatabaseConnection,
    catalog: &dyn RemoteCatalog,
    filter: &RecordingFilter,
) -> Result<HashMap<String, UnifiedRecording>, Error> {
    let locals = recording::find_all_by(db, filter).await?;

    let mut ids: Vec<String> = Vec::new();
    for local in &locals {
        if !ids.contains(&local.recording_id) {
            ids.push(local.recording_id.clone());
        }
    }

    let remotes = catalog.fetch_by_ids(&ids).await?;

    let mut unified = HashMap::new();
    for local in locals {
        let Some(remote) = remotes.get(&local.recording_id) else {
            debug!(
                "Skipping recording no longer in the catalog: {}",
                local.recording_id
            );
            continue;
        };

        let mut remote = remote.clone();
        if local.imported {
            overlay_imported_metadata(&mut remote, &local);
        }

        unified.insert(
            local.recording_id.clone(),
            UnifiedRecording {
                local_id: local.id,
                recording_id: local.recording_id,
                activity_id: local.activity_id,
                course_id: local.course_id,
                imported: local.imported,
                remote,
            },
        );
    }

    Ok(unified)
}

/// Copies every `meta_*` field frozen in an imported row's payload over the
/// remote metadata. The local value wins; everything else (playbacks,
/// publication state) stays the catalog's.
fn overlay_imported_metadata(remote: &mut RemoteRecording, local: &recordings::Model) {
    if let serde_json::Value::Object(payload) = &local.payload {
        for (key, value) in payload {
            if key.starts_with("meta_") {
                remote.metadata.insert(key.clone(), scalar_to_string(value));
            }
        }
    }
}

/// Drops entries whose recording id already has an imported pointer for the
/// given (course, activity) scope. Used before presenting import-candidate
/// listings so the same recording is not offered twice.
pub async fn remove_already_imported(
    db: &DatabaseConnection,
    mut recordings: HashMap<String, UnifiedRecording>,
    course_id: i64,
    activity_id: Id,
) -> Result<HashMap<String, UnifiedRecording>, Error> {
    let imported = recording::find_imported_recording_ids(db, course_id, activity_id).await?;

    for recording_id in imported {
        recordings.remove(&recording_id);
    }

    Ok(recordings)
}

/// Orders recordings by their remote start time. The sort is stable; ties
/// keep their prior relative order.
pub fn sort_by_start_time(recordings: &mut [UnifiedRecording], direction: SortDirection) {
    recordings.sort_by(|a, b| compare_by_start_time(a, b, direction));
}

/// Compares two recordings for the given sort direction; ties compare equal.
pub fn compare_by_start_time(
    a: &UnifiedRecording,
    b: &UnifiedRecording,
    direction: SortDirection,
) -> Ordering {
    let ordering = a.remote.start_time.cmp(&b.remote.start_time);
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Creates an imported pointer row for a recording owned elsewhere. The
/// row's payload freezes the remote `meta_*` fields as they are right now;
/// later edits to the link touch only this frozen copy.
pub async fn import(
    db: &DatabaseConnection,
    catalog: &dyn RemoteCatalog,
    course_id: i64,
    activity_id: Id,
    recording_id: &str,
) -> Result<recordings::Model, Error> {
    let remotes = catalog.fetch_by_ids(&[recording_id.to_string()]).await?;
    let remote = remotes.get(recording_id).ok_or_else(|| {
        warn!("Cannot import a recording unknown to the catalog: {recording_id}");
        Error::from_kind(DomainErrorKind::Internal(InternalErrorKind::Entity(
            EntityErrorKind::NotFound,
        )))
    })?;

    let payload = serde_json::Value::Object(
        remote
            .metadata
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect(),
    );

    Ok(recording::create_imported(db, recording_id, activity_id, course_id, payload).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_recording, remote_recording, StubCatalog};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn reconcile_merges_local_rows_with_live_catalog_entries() -> Result<(), Error> {
        let local = local_recording("r1", 5, false);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![local.clone()]])
            .into_connection();
        let catalog = StubCatalog::with_recordings(vec![remote_recording("r1", "activity-1", 100)]);

        let filter = RecordingFilter {
            course_id: 5,
            ..Default::default()
        };
        let unified = reconcile(&db, &catalog, &filter).await?;

        assert_eq!(unified.len(), 1);
        let merged = &unified["r1"];
        assert_eq!(merged.local_id, local.id);
        assert_eq!(merged.remote.record_id, "r1");
        assert!(!merged.imported);

        // Exactly one batch fetch, for exactly the local row's id.
        assert_eq!(catalog.calls(), vec!["fetch_by_ids r1"]);

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_excludes_rows_whose_remote_counterpart_vanished() -> Result<(), Error> {
        let live = local_recording("r1", 5, false);
        let vanished = local_recording("r2", 5, false);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![live, vanished]])
            .into_connection();
        let catalog = StubCatalog::with_recordings(vec![remote_recording("r1", "activity-1", 100)]);

        let filter = RecordingFilter {
            course_id: 5,
            ..Default::default()
        };
        let unified = reconcile(&db, &catalog, &filter).await?;

        assert_eq!(unified.len(), 1);
        assert!(unified.contains_key("r1"));
        assert!(!unified.contains_key("r2"));

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_overlays_frozen_meta_fields_on_imported_rows() -> Result<(), Error> {
        let mut local = local_recording("r1", 5, true);
        local.payload = serde_json::json!({"meta_title": "A", "note": "not meta"});

        let mut remote = remote_recording("r1", "activity-1", 100);
        remote
            .metadata
            .insert("meta_title".to_string(), "B".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![local]])
            .into_connection();
        let catalog = StubCatalog::with_recordings(vec![remote.clone()]);

        let filter = RecordingFilter {
            course_id: 5,
            include_imported: true,
            ..Default::default()
        };
        let unified = reconcile(&db, &catalog, &filter).await?;

        let merged = &unified["r1"];
        // The frozen local value wins for meta_* fields only.
        assert_eq!(merged.remote.metadata["meta_title"], "A");
        assert!(!merged.remote.metadata.contains_key("note"));
        // Playback truth stays the catalog's.
        assert_eq!(merged.remote.playbacks, remote.playbacks);

        Ok(())
    }

    #[tokio::test]
    async fn remove_already_imported_drops_scoped_duplicates() -> Result<(), Error> {
        let already_imported = local_recording("r1", 5, true);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![already_imported.clone()]])
            .into_connection();

        let mut unified = HashMap::new();
        for remote in [
            remote_recording("r1", "activity-1", 100),
            remote_recording("r2", "activity-2", 200),
        ] {
            let local = local_recording(&remote.record_id, 5, false);
            unified.insert(
                remote.record_id.clone(),
                UnifiedRecording {
                    local_id: local.id,
                    recording_id: remote.record_id.clone(),
                    activity_id: local.activity_id,
                    course_id: 5,
                    imported: false,
                    remote,
                },
            );
        }

        let filtered =
            remove_already_imported(&db, unified, 5, already_imported.activity_id).await?;

        assert!(!filtered.contains_key("r1"));
        assert!(filtered.contains_key("r2"));

        Ok(())
    }

    #[test]
    fn sort_by_start_time_is_stable_in_both_directions() {
        let build = |record_id: &str, start_time: i64| {
            let local = local_recording(record_id, 5, false);
            UnifiedRecording {
                local_id: local.id,
                recording_id: record_id.to_string(),
                activity_id: local.activity_id,
                course_id: 5,
                imported: false,
                remote: remote_recording(record_id, "activity-1", start_time),
            }
        };

        let mut listing = vec![build("r2", 200), build("r1", 100), build("r3", 200)];

        sort_by_start_time(&mut listing, SortDirection::Ascending);
        let ids: Vec<&str> = listing.iter().map(|r| r.recording_id.as_str()).collect();
        // r2 and r3 tie on start time and keep their prior relative order.
        assert_eq!(ids, vec!["r1", "r2", "r3"]);

        sort_by_start_time(&mut listing, SortDirection::Descending);
        let ids: Vec<&str> = listing.iter().map(|r| r.recording_id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r1"]);
    }

    #[tokio::test]
    async fn import_freezes_the_remote_meta_fields() -> Result<(), Error> {
        let mut remote = remote_recording("r1", "activity-1", 100);
        remote
            .metadata
            .insert("meta_title".to_string(), "Week 1".to_string());

        let created = local_recording("r1", 5, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![created.clone()]])
            .into_connection();
        let catalog = StubCatalog::with_recordings(vec![remote]);

        let row = import(&db, &catalog, 5, created.activity_id, "r1").await?;

        assert!(row.imported);

        Ok(())
    }

    #[tokio::test]
    async fn import_fails_for_a_recording_unknown_to_the_catalog() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let catalog = StubCatalog::with_recordings(vec![]);

        let result = import(&db, &catalog, 5, Id::new_v4(), "missing").await;

        assert!(result.is_err());
    }
}
