use anyhow::Context;
use city2tabula_core::{channel_from_queue, run_worker_pool, BuildingIdSource, Orchestrator};
use city2tabula_sql::lod::LodLevel;
use city2tabula_sql::{Config, ScriptLoader};
use std::sync::Arc;

/// Opens a `PgPool` sized per spec §5 ("pool size defaults to the worker count"),
/// mirroring the teacher's `PgPoolOptions` setup in `agent/src/main.rs`.
pub async fn connect(config: &Config) -> anyhow::Result<sqlx::PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db.max_open_conns)
        .min_connections(config.db.max_idle_conns)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&config.db.connection_url())
        .await
        .context("connecting to database")
}

/// `--extract-features`: fetch building IDs for both LOD levels, batch them, build the
/// feature-extraction queue, and run workers to completion (spec §6).
pub async fn extract_features(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let scripts = ScriptLoader::load(&config.scripts).context("loading SQL scripts")?;

    let lod2_ids = pool.fetch_building_ids(LodLevel::Lod2).await.context("fetching LOD2 building ids")?;
    let lod3_ids = pool.fetch_building_ids(LodLevel::Lod3).await.context("fetching LOD3 building ids")?;

    if lod2_ids.is_empty() {
        tracing::warn!("no buildings found in the LOD2 schema; LOD2 produces zero pipelines");
    }
    if lod3_ids.is_empty() {
        tracing::warn!("no buildings found in the LOD3 schema; LOD3 produces zero pipelines");
    }

    let batch_size = config.batch_size as i64;
    let lod2_batches = city2tabula_core::create_batches(&lod2_ids, batch_size);
    let lod3_batches = city2tabula_core::create_batches(&lod3_ids, batch_size);

    let queue = Orchestrator::build_feature_extraction_queue(&scripts, &lod2_batches, &lod3_batches);
    let pipeline_count = queue.len();
    tracing::info!(pipeline_count, worker_count = config.thread_count, "starting feature extraction");

    let receiver = channel_from_queue(&queue);
    let outcome = run_worker_pool(config.thread_count, receiver, pool, config.clone()).await;

    tracing::info!(failed_pipelines = outcome.failed_pipelines, "feature extraction finished");
    if config.fail_on_pipeline_error && outcome.failed_pipelines > 0 {
        anyhow::bail!("{} pipeline(s) failed", outcome.failed_pipelines);
    }
    Ok(())
}

/// Runs the core DB-setup queue (functions, then LOD2 and LOD3 table schemas) with a
/// single worker, per spec §4.5/§9: these scripts modify schema-level objects that
/// aren't safely interleavable.
pub async fn run_db_setup(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let scripts = ScriptLoader::load(&config.scripts).context("loading SQL scripts")?;
    let queue = Orchestrator::build_main_setup_queue(&scripts);
    let receiver = channel_from_queue(&queue);
    let outcome = run_worker_pool(1, receiver, pool, config).await;
    anyhow::ensure!(outcome.failed_pipelines == 0, "database setup pipeline failed");
    Ok(())
}

/// Runs the supplementary queue with a single worker (spec §4.5).
pub async fn run_supplementary(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let scripts = ScriptLoader::load(&config.scripts).context("loading SQL scripts")?;
    let queue = Orchestrator::build_supplementary_queue(&scripts);
    let receiver = channel_from_queue(&queue);
    let outcome = run_worker_pool(1, receiver, pool, config).await;
    anyhow::ensure!(outcome.failed_pipelines == 0, "supplementary pipeline failed");
    Ok(())
}

/// `--create-db`: external import + core DB-setup queue + data import + supplementary
/// queue (spec §6). The external-tool calls are thin stubs (see `crate::external`);
/// orchestrating actual 3D file import and CSV ingestion is out of the core's scope.
pub async fn create_db(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    import_source_data(&config).await?;
    run_db_setup(config.clone(), pool.clone()).await?;
    run_supplementary(config, pool).await
}

/// Drops the source 3D schemas (`lod2`/`lod3`, plus the shared `citydb`/`citydb_pkg`
/// support schemas the importer populates) so `--reset-citydb` starts from a clean
/// slate before re-importing.
async fn drop_citydb_schemas(config: &Config, pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for schema in [
        LodLevel::Lod2.as_schema_name(),
        LodLevel::Lod3.as_schema_name(),
        config.schema.citydb_schema.as_str(),
        config.schema.citydb_pkg_schema.as_str(),
    ] {
        let sql = format!("DROP SCHEMA IF EXISTS {schema} CASCADE");
        tracing::warn!(schema, "dropping schema");
        sqlx::raw_sql(&sql).execute(pool).await.with_context(|| format!("dropping schema {schema}"))?;
    }
    Ok(())
}

/// Drops the application schemas (`city2tabula`/`tabula`) so `--reset-city2tabula` can
/// recreate them from scratch without touching the imported source data.
async fn drop_city2tabula_schemas(config: &Config, pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for schema in [config.schema.city2tabula_schema.as_str(), config.schema.tabula_schema.as_str()] {
        let sql = format!("DROP SCHEMA IF EXISTS {schema} CASCADE");
        tracing::warn!(schema, "dropping schema");
        sqlx::raw_sql(&sql).execute(pool).await.with_context(|| format!("dropping schema {schema}"))?;
    }
    Ok(())
}

/// `--reset-all`: drop every managed schema (source and application alike), then run
/// complete setup as `--create-db` would.
pub async fn reset_all(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    drop_citydb_schemas(&config, &pool).await?;
    drop_city2tabula_schemas(&config, &pool).await?;
    create_db(config, pool).await
}

/// `--reset-citydb`: drop and re-import only the source 3D schemas, leaving the
/// application schemas (and anything already computed into them) untouched.
pub async fn reset_citydb(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    drop_citydb_schemas(&config, &pool).await?;
    import_source_data(&config).await
}

/// `--reset-city2tabula`: drop and recreate only the application schemas, re-running
/// DB setup and the supplementary queue against the still-imported source data.
pub async fn reset_city2tabula(config: Arc<Config>, pool: sqlx::PgPool) -> anyhow::Result<()> {
    drop_city2tabula_schemas(&config, &pool).await?;
    run_db_setup(config.clone(), pool.clone()).await?;
    run_supplementary(config, pool).await
}

/// Shells out to the 3D-city importer binary for each LOD's `data/` directory
/// (spec §6's filesystem layout). Out of the core's scope beyond this invocation.
async fn import_source_data(config: &Config) -> anyhow::Result<()> {
    for lod_dir in ["lod2", "lod3"] {
        let mut cmd = async_process::Command::new(&config.citydb_tool_path);
        cmd.arg("import").arg(format!("data/{lod_dir}/{}", config.country));
        crate::external::run_capturing(&format!("citydb-importer:{lod_dir}"), &mut cmd).await?;
    }
    Ok(())
}
