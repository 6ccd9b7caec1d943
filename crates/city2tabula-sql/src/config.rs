use crate::error::ConfigError;
use std::path::PathBuf;

/// Database connection and pool-tuning settings, loaded once from the environment.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    /// Derived as `city2tabula_<country>`.
    pub database: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .field("database", &self.database)
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .finish()
    }
}

impl DbConfig {
    /// Assembles a `postgres://` URL suitable for `PgConnectOptions::from_str` or `PgPoolOptions::connect`.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{database}?sslmode={ssl_mode}",
            user = self.user,
            password = self.password,
            host = self.host,
            port = self.port,
            database = self.database,
            ssl_mode = self.ssl_mode,
        )
    }
}

/// Schema and table names used across the application-owned half of the database
/// (the `tabula` reference schema and the `city2tabula` output schema).
#[derive(Clone, Debug)]
pub struct SchemaConfig {
    pub city2tabula_schema: String,
    pub tabula_schema: String,
    pub public_schema: String,
    pub citydb_schema: String,
    pub citydb_pkg_schema: String,
    pub tabula_table: String,
    pub tabula_variant_table: String,
}

/// Locations of the four `.sql` script directories, scanned in lexical order by [`crate::loader::ScriptLoader`].
#[derive(Clone, Debug)]
pub struct ScriptPaths {
    pub functions_dir: PathBuf,
    pub schema_dir: PathBuf,
    pub scripts_main_dir: PathBuf,
    pub scripts_supplementary_dir: PathBuf,
}

/// Immutable, process-wide configuration assembled once at startup from environment
/// variables (spec §6) and never mutated afterwards. Cheap to clone; callers typically
/// wrap it in an `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    pub db: DbConfig,
    pub schema: SchemaConfig,
    pub scripts: ScriptPaths,

    pub citydb_tool_path: String,
    pub srid: String,
    pub srs_name: String,

    pub country: String,

    pub thread_count: usize,
    pub room_height: f64,
    pub batch_size: usize,

    pub log_level: String,

    /// Open question in spec §9: whether a failed pipeline should cause the driver
    /// to exit non-zero. Default `false` preserves the source's historical behaviour
    /// of logging per-worker failures without failing the overall run.
    pub fail_on_pipeline_error: bool,
}

impl std::fmt::Debug for SchemaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaConfig")
            .field("city2tabula_schema", &self.city2tabula_schema)
            .field("tabula_schema", &self.tabula_schema)
            .field("public_schema", &self.public_schema)
            .field("citydb_schema", &self.citydb_schema)
            .field("citydb_pkg_schema", &self.citydb_pkg_schema)
            .field("tabula_table", &self.tabula_table)
            .field("tabula_variant_table", &self.tabula_variant_table)
            .finish()
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional_var(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|err: T::Err| ConfigError::InvalidVar {
            name,
            value,
            reason: err.to_string(),
        }),
    }
}

impl Config {
    /// Reads the full environment-variable table from spec §6 and validates it.
    /// Unset tuning knobs fall back to the documented defaults; unset DB/identity
    /// variables are fatal (`ConfigError::MissingVar`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let country = require_var("COUNTRY")?;

        let db = DbConfig {
            host: require_var("DB_HOST")?,
            port: parse_var("DB_PORT", 5432u16)?,
            user: require_var("DB_USER")?,
            password: require_var("DB_PASSWORD")?,
            ssl_mode: optional_var("DB_SSL_MODE", "prefer"),
            database: format!("city2tabula_{country}"),
            max_open_conns: parse_var("DB_MAX_OPEN_CONNS", default_thread_count() as u32)?,
            max_idle_conns: parse_var("DB_MAX_IDLE_CONNS", 2u32)?,
        };

        let schema = SchemaConfig {
            city2tabula_schema: optional_var("CITY2TABULA_SCHEMA", "city2tabula"),
            tabula_schema: optional_var("TABULA_SCHEMA", "tabula"),
            public_schema: optional_var("PUBLIC_SCHEMA", "public"),
            citydb_schema: optional_var("CITYDB_SCHEMA", "citydb"),
            citydb_pkg_schema: optional_var("CITYDB_PKG_SCHEMA", "citydb_pkg"),
            tabula_table: optional_var("TABULA_TABLE", "tabula"),
            tabula_variant_table: optional_var("TABULA_VARIANT_TABLE", "tabula_variant"),
        };

        let scripts_root = PathBuf::from(optional_var("SQL_ROOT", "sql"));
        let scripts = ScriptPaths {
            functions_dir: scripts_root.join("functions"),
            schema_dir: scripts_root.join("schema"),
            scripts_main_dir: scripts_root.join("scripts/main"),
            scripts_supplementary_dir: scripts_root.join("scripts/supplementary"),
        };

        Ok(Self {
            db,
            schema,
            scripts,
            citydb_tool_path: require_var("CITYDB_TOOL_PATH")?,
            srid: require_var("CITYDB_SRID")?,
            srs_name: require_var("CITYDB_SRS_NAME")?,
            country,
            thread_count: parse_var("THREAD_COUNT", default_thread_count())?,
            room_height: parse_var("ROOM_HEIGHT", 2.5f64)?,
            batch_size: parse_var("BATCH_SIZE", 1000usize)?,
            log_level: optional_var("LOG_LEVEL", "INFO"),
            fail_on_pipeline_error: parse_var("FAIL_ON_PIPELINE_ERROR", false)?,
        })
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key == "COUNTRY"
                || key.starts_with("DB_")
                || key.starts_with("CITYDB_")
                || key == "THREAD_COUNT"
                || key == "ROOM_HEIGHT"
                || key == "BATCH_SIZE"
                || key == "LOG_LEVEL"
                || key == "FAIL_ON_PIPELINE_ERROR"
            {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn missing_required_var_is_reported() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("COUNTRY")));
    }

    #[test]
    fn derives_database_name_from_country() {
        clear_env();
        std::env::set_var("COUNTRY", "de");
        std::env::set_var("DB_HOST", "localhost");
        std::env::set_var("DB_USER", "city2tabula");
        std::env::set_var("DB_PASSWORD", "secret");
        std::env::set_var("CITYDB_TOOL_PATH", "/opt/importer");
        std::env::set_var("CITYDB_SRID", "25832");
        std::env::set_var("CITYDB_SRS_NAME", "urn:ogc:def:crs:EPSG::25832");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.db.database, "city2tabula_de");
        assert_eq!(cfg.room_height, 2.5);
        clear_env();
    }
}
