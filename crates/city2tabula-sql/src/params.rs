use crate::config::{Config, SchemaConfig};
use crate::lod::LodLevel;

/// The fixed set of named slots bound into every job's SQL text, per spec §3's
/// template-parameter table. There is no reflection-over-field-tags in Rust, so the
/// slot set is enumerated explicitly here rather than derived (see spec §9).
#[derive(Clone, Debug, Default)]
pub struct TemplateParams {
    pub building_ids: Vec<i64>,
    pub lod_schema: String,
    pub lod_level: i32,
    pub city2tabula_schema: String,
    pub tabula_schema: String,
    pub public_schema: String,
    pub citydb_schema: String,
    pub citydb_pkg_schema: String,
    pub srid: String,
    pub country: String,
    pub tabula_table: String,
    pub tabula_variant_table: String,
    pub room_height: f64,
}

impl TemplateParams {
    /// Builds the base parameter set from config, with no building IDs and no LOD
    /// scoping bound yet. Callers apply `with_building_ids` / `with_lod` per job.
    pub fn from_config(config: &Config) -> Self {
        let SchemaConfig {
            city2tabula_schema,
            tabula_schema,
            public_schema,
            citydb_schema,
            citydb_pkg_schema,
            tabula_table,
            tabula_variant_table,
        } = config.schema.clone();

        Self {
            building_ids: Vec::new(),
            lod_schema: String::new(),
            lod_level: 0,
            city2tabula_schema,
            tabula_schema,
            public_schema,
            citydb_schema,
            citydb_pkg_schema,
            srid: config.srid.clone(),
            country: config.country.clone(),
            tabula_table,
            tabula_variant_table,
            room_height: config.room_height,
        }
    }

    pub fn with_building_ids(mut self, building_ids: Vec<i64>) -> Self {
        self.building_ids = building_ids;
        self
    }

    pub fn with_lod(mut self, lod: Option<LodLevel>) -> Self {
        match lod {
            Some(lod) => {
                self.lod_schema = lod.as_schema_name().to_string();
                self.lod_level = lod.as_level_int();
            }
            None => {
                self.lod_schema = String::new();
                self.lod_level = 0;
            }
        }
        self
    }

    /// Substitutes every `{slot}` placeholder present in `sql`. Every known slot is
    /// rendered regardless of whether it appears in the text (idempotent substitution,
    /// per spec §4.2): rendering a slot absent from the template is simply a no-op.
    pub fn render(&self, sql: &str) -> String {
        let mut rendered = sql.to_string();
        rendered = rendered.replace("{building_ids}", &render_building_ids(&self.building_ids));
        rendered = rendered.replace("{lod_schema}", &self.lod_schema);
        rendered = rendered.replace("{lod_level}", &self.lod_level.to_string());
        rendered = rendered.replace("{city2tabula_schema}", &self.city2tabula_schema);
        rendered = rendered.replace("{tabula_schema}", &self.tabula_schema);
        rendered = rendered.replace("{public_schema}", &self.public_schema);
        rendered = rendered.replace("{citydb_schema}", &self.citydb_schema);
        rendered = rendered.replace("{citydb_pkg_schema}", &self.citydb_pkg_schema);
        rendered = rendered.replace("{srid}", &self.srid);
        rendered = rendered.replace("{country}", &self.country);
        rendered = rendered.replace("{tabula_table}", &self.tabula_table);
        rendered = rendered.replace("{tabula_variant_table}", &self.tabula_variant_table);
        rendered = rendered.replace("{room_height}", &self.room_height.to_string());
        rendered
    }
}

/// Renders a list of building IDs as a SQL tuple. An empty list renders as `(-1)`,
/// a tuple that is syntactically valid but matches no row — the intended no-op
/// semantics resolved in spec §9 (the source had drifted between `()` and `(-1)`).
pub fn render_building_ids(ids: &[i64]) -> String {
    if ids.is_empty() {
        return "(-1)".to_string();
    }
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    format!("({joined})")
}
