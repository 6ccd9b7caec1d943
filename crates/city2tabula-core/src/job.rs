use city2tabula_sql::LodLevel;
use std::path::PathBuf;
use uuid::Uuid;

/// Parameters carried by a job: the batch of building IDs it runs against.
/// Setup and supplementary jobs carry an empty list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobParams {
    pub building_ids: Vec<i64>,
}

impl JobParams {
    pub fn new(building_ids: Vec<i64>) -> Self {
        Self { building_ids }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// An immutable descriptor of one database statement. Created once via [`Job::new`]
/// and never mutated afterwards (spec §3/§4.3).
#[derive(Clone, Debug)]
pub struct Job {
    pub id: Uuid,
    /// Free-form label; the substring `LOD2`/`LOD3` designates scope for callers that
    /// still rely on the historical string-matching behaviour (spec §9).
    pub type_label: String,
    /// Typed LOD scope, carried alongside the label per spec §9's REDESIGN FLAGS.
    pub lod: Option<LodLevel>,
    pub params: JobParams,
    pub script_path: PathBuf,
    /// Lower values run earlier within their owning pipeline.
    pub priority: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Creates a new job, deriving `lod` from `type_label` via [`LodLevel::from_label`]
    /// so a caller who only sets the label (the historical convention) still gets a
    /// correctly-typed LOD.
    pub fn new(type_label: impl Into<String>, params: JobParams, script_path: PathBuf, priority: i32) -> Self {
        let type_label = type_label.into();
        let lod = LodLevel::from_label(&type_label);
        Self {
            id: Uuid::new_v4(),
            type_label,
            lod,
            params,
            script_path,
            priority,
            created_at: chrono::Utc::now(),
        }
    }

    /// As [`Job::new`], but the LOD is supplied explicitly rather than inferred,
    /// for callers building jobs outside the `LOD2:`/`LOD3:` label convention.
    pub fn with_lod(
        type_label: impl Into<String>,
        lod: Option<LodLevel>,
        params: JobParams,
        script_path: PathBuf,
        priority: i32,
    ) -> Self {
        let mut job = Self::new(type_label, params, script_path, priority);
        job.lod = lod;
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_lod_from_label_on_construction() {
        let job = Job::new("LOD2: 01_harvest.sql", JobParams::empty(), "sql/x.sql".into(), 1);
        assert_eq!(job.lod, Some(LodLevel::Lod2));
    }

    #[test]
    fn non_lod_job_has_no_lod() {
        let job = Job::new("setup: 01_functions.sql", JobParams::empty(), "sql/x.sql".into(), 1);
        assert_eq!(job.lod, None);
    }
}
