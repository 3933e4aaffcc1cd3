use crate::params::SortOrder;
use domain::action::RecordingAction;
use domain::recording::RecordingFilter;
use domain::Id;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    pub(crate) course_id: i64,
    #[param(value_type = Option<Uuid>)]
    pub(crate) activity_id: Option<Id>,
    /// With `activity_id`: list that activity's own recordings instead of
    /// the import-candidate scope (other activities in the same course).
    #[serde(default)]
    pub(crate) only_from_instance: bool,
    #[serde(default)]
    pub(crate) include_deleted: bool,
    #[serde(default)]
    pub(crate) include_imported: bool,
    #[serde(default)]
    pub(crate) only_imported: bool,
    /// Drop recordings this activity has already imported. Requires
    /// `activity_id`; used to build import-candidate listings.
    #[serde(default)]
    pub(crate) importable: bool,
    pub(crate) sort_order: Option<SortOrder>,
}

impl IndexParams {
    pub(crate) fn filter(&self) -> RecordingFilter {
        RecordingFilter {
            course_id: self.course_id,
            activity_id: self.activity_id,
            only_from_instance: self.only_from_instance,
            include_deleted: self.include_deleted,
            include_imported: self.include_imported,
            only_imported: self.only_imported,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ActionParams {
    /// One of publish, unpublish, protect, unprotect, edit, delete
    #[param(value_type = String)]
    pub(crate) action: RecordingAction,
    /// JSON-encoded object of metadata fields, required by `edit`
    pub(crate) meta: Option<String>,
    pub(crate) course_id: i64,
    #[param(value_type = Option<Uuid>)]
    pub(crate) activity_id: Option<Id>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ImportParams {
    pub(crate) course_id: i64,
    #[param(value_type = Uuid)]
    pub(crate) activity_id: Id,
}
