use city2tabula_sql::LodLevel;

/// Source of building feature IDs for a given LOD (spec §2/§4.3, component C10).
/// A trait rather than a concrete struct so orchestrator tests can substitute an
/// in-memory fake instead of driving a live Postgres instance, the same seam the
/// teacher exposes for its control-plane dependency at the API boundary.
#[async_trait::async_trait]
pub trait BuildingIdSource: Send + Sync {
    /// Returns every building feature ID present in the source schema for `lod`.
    /// The "no buildings found" semantic fault (spec §7, taxonomy item 6) is
    /// detected by callers checking whether the returned vec is empty.
    async fn fetch_building_ids(&self, lod: LodLevel) -> sqlx::Result<Vec<i64>>;
}

#[async_trait::async_trait]
impl BuildingIdSource for sqlx::PgPool {
    async fn fetch_building_ids(&self, lod: LodLevel) -> sqlx::Result<Vec<i64>> {
        let schema = lod.as_schema_name();
        let query = format!("SELECT id FROM {schema}.building_feature ORDER BY id");
        sqlx::query_scalar(&query).fetch_all(self).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// In-memory [`BuildingIdSource`] fake used by orchestrator/runner unit tests.
    #[derive(Default)]
    pub struct FakeBuildingIdSource {
        pub ids: HashMap<&'static str, Vec<i64>>,
    }

    #[async_trait::async_trait]
    impl BuildingIdSource for FakeBuildingIdSource {
        async fn fetch_building_ids(&self, lod: LodLevel) -> sqlx::Result<Vec<i64>> {
            Ok(self.ids.get(lod.as_schema_name()).cloned().unwrap_or_default())
        }
    }
}
