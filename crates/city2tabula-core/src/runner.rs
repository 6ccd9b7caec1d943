use crate::error::RunnerError;
use crate::job::Job;
use crate::pipeline::Pipeline;
use crate::retry::{DbErrorClass, GeneralRetryPolicy, DeadlockRetryPolicy, RetryPolicy};
use city2tabula_sql::{Config, TemplateParams};
use std::sync::Arc;

/// A single SQL statement sink. Implemented for `sqlx::PgPool` in production; unit
/// tests substitute an in-memory fake so the retry/ordering contract can be verified
/// without a live Postgres connection.
#[async_trait::async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<(), sqlx::Error>;
}

#[async_trait::async_trait]
impl StatementExecutor for sqlx::PgPool {
    async fn execute(&self, sql: &str) -> Result<(), sqlx::Error> {
        // Scripts ship as whole files and routinely contain more than one
        // semicolon-separated statement, so this goes over the simple query
        // protocol rather than sqlx::query's prepared/extended protocol, which
        // only accepts a single statement.
        sqlx::raw_sql(sql).execute(self).await.map(|_| ())
    }
}

/// Executes a pipeline's jobs in priority order, applying the retry policy to each
/// job's statement (spec §4.8). One `Runner` is owned by exactly one worker for the
/// lifetime of a pipeline.
pub struct Runner {
    config: Arc<Config>,
    general_retry: GeneralRetryPolicy,
    deadlock_retry: DeadlockRetryPolicy,
}

impl Runner {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            general_retry: GeneralRetryPolicy::default(),
            deadlock_retry: DeadlockRetryPolicy::default(),
        }
    }

    pub fn with_policies(config: Arc<Config>, general_retry: GeneralRetryPolicy, deadlock_retry: DeadlockRetryPolicy) -> Self {
        Self { config, general_retry, deadlock_retry }
    }

    /// Copies and stably sorts the job list by ascending priority, then runs each job
    /// in turn. Stops and returns on the first job error — later jobs in the same
    /// pipeline are never attempted (spec §4.8 step 2, invariant 5 / scenario S4).
    pub async fn run_pipeline<E: StatementExecutor>(
        &self,
        pipeline: &Pipeline,
        executor: &E,
        worker_id: usize,
    ) -> Result<(), RunnerError> {
        let mut jobs = pipeline.jobs.clone();
        jobs.sort_by_key(|job| job.priority);

        for job in &jobs {
            self.run_job_with_retry(job, executor, worker_id).await?;
        }
        Ok(())
    }

    /// Runs one job to completion or retry exhaustion: reads its script, binds
    /// parameters, submits the rendered statement, and retries according to whichever
    /// policy the first observed error classifies into (spec §4.8).
    pub async fn run_job_with_retry<E: StatementExecutor>(
        &self,
        job: &Job,
        executor: &E,
        worker_id: usize,
    ) -> Result<(), RunnerError> {
        let sql_text = std::fs::read_to_string(&job.script_path).map_err(|source| RunnerError::ScriptRead {
            type_label: job.type_label.clone(),
            path: job.script_path.clone(),
            source,
        })?;

        let params = TemplateParams::from_config(&self.config)
            .with_building_ids(job.params.building_ids.clone())
            .with_lod(job.lod);
        let rendered = params.render(&sql_text);

        let mut policy: Option<&dyn RetryPolicy> = None;
        let mut attempt = 0u32;

        loop {
            match executor.execute(&rendered).await {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(worker_id, job = %job.type_label, retries = attempt, "job succeeded after {attempt} retries");
                    }
                    return Ok(());
                }
                Err(err) => {
                    let class = DbErrorClass::classify(&err);
                    let active_policy = policy.get_or_insert(match class {
                        DbErrorClass::Deadlock => &self.deadlock_retry,
                        DbErrorClass::Other => &self.general_retry,
                    });

                    if attempt >= active_policy.max_attempts() {
                        return Err(RunnerError::RetryExhausted {
                            type_label: job.type_label.clone(),
                            attempts: attempt + 1,
                            source: err,
                        });
                    }

                    let delay = active_policy.delay_for_attempt(attempt);
                    tracing::warn!(worker_id, job = %job.type_label, ?class, attempt, ?delay, error = %err, "job attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobParams;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            db: city2tabula_sql::config::DbConfig {
                host: "localhost".into(),
                port: 5432,
                user: "u".into(),
                password: "p".into(),
                ssl_mode: "prefer".into(),
                database: "city2tabula_test".into(),
                max_open_conns: 4,
                max_idle_conns: 2,
            },
            schema: city2tabula_sql::config::SchemaConfig {
                city2tabula_schema: "city2tabula".into(),
                tabula_schema: "tabula".into(),
                public_schema: "public".into(),
                citydb_schema: "citydb".into(),
                citydb_pkg_schema: "citydb_pkg".into(),
                tabula_table: "tabula".into(),
                tabula_variant_table: "tabula_variant".into(),
            },
            scripts: city2tabula_sql::config::ScriptPaths {
                functions_dir: "sql/functions".into(),
                schema_dir: "sql/schema".into(),
                scripts_main_dir: "sql/scripts/main".into(),
                scripts_supplementary_dir: "sql/scripts/supplementary".into(),
            },
            citydb_tool_path: "/bin/true".into(),
            srid: "25832".into(),
            srs_name: "EPSG:25832".into(),
            country: "de".into(),
            thread_count: 4,
            room_height: 2.5,
            batch_size: 1000,
            log_level: "INFO".into(),
            fail_on_pipeline_error: false,
        })
    }

    struct ScriptedExecutor {
        results: Mutex<Vec<Result<(), sqlx::Error>>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StatementExecutor for ScriptedExecutor {
        async fn execute(&self, _sql: &str) -> Result<(), sqlx::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(())
            } else {
                results.remove(0)
            }
        }
    }

    fn deadlock_err() -> sqlx::Error {
        sqlx::Error::Protocol("ERROR: deadlock detected".to_string())
    }

    fn syntax_err() -> sqlx::Error {
        sqlx::Error::Protocol("ERROR: syntax error at or near".to_string())
    }

    fn write_script(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn s3_deadlock_recovers_after_one_retry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_script(tmp.path(), "job.sql", "SELECT 1");
        let job = Job::new("LOD2: job.sql", JobParams::empty(), path, 1);

        let executor = ScriptedExecutor {
            results: Mutex::new(vec![Err(deadlock_err())]),
            calls: AtomicUsize::new(0),
        };

        let runner = Runner::new(test_config());
        let start = std::time::Instant::now();
        runner.run_job_with_retry(&job, &executor, 0).await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(50));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn s4_permanent_failure_propagates_after_max_retries_plus_one() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_script(tmp.path(), "job.sql", "SELECT 1");
        let job = Job::new("setup: job.sql", JobParams::empty(), path, 1);

        let executor = ScriptedExecutor {
            results: Mutex::new(vec![Err(syntax_err()), Err(syntax_err()), Err(syntax_err()), Err(syntax_err())]),
            calls: AtomicUsize::new(0),
        };

        let runner = Runner::with_policies(
            test_config(),
            GeneralRetryPolicy {
                max_retries: 3,
                initial_delay: std::time::Duration::from_millis(1),
                backoff_factor: 2.0,
                max_delay: std::time::Duration::from_millis(10),
            },
            DeadlockRetryPolicy::default(),
        );

        let err = runner.run_job_with_retry(&job, &executor, 0).await.unwrap_err();
        assert!(matches!(err, RunnerError::RetryExhausted { attempts: 4, .. }));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn s6_pipeline_runs_jobs_in_stable_priority_order() {
        let tmp = tempfile::tempdir().unwrap();
        // Each script carries a unique marker so the executed SQL itself reveals
        // which job actually ran, in what order — not just how many ran.
        let p1a = write_script(tmp.path(), "p1a.sql", "SELECT 1 -- p1a");
        let p1b = write_script(tmp.path(), "p1b.sql", "SELECT 1 -- p1b");
        let p2 = write_script(tmp.path(), "p2.sql", "SELECT 1 -- p2");
        let p3 = write_script(tmp.path(), "p3.sql", "SELECT 1 -- p3");

        let jobs = vec![
            Job::new("p3", JobParams::empty(), p3, 3),
            Job::new("p1a", JobParams::empty(), p1a, 1),
            Job::new("p2", JobParams::empty(), p2, 2),
            Job::new("p1b", JobParams::empty(), p1b, 1),
        ];
        let pipeline = Pipeline::new(vec![], jobs);

        let order = Arc::new(Mutex::new(Vec::new()));
        struct RecordingExecutor(Arc<Mutex<Vec<String>>>);

        #[async_trait::async_trait]
        impl StatementExecutor for RecordingExecutor {
            async fn execute(&self, sql: &str) -> Result<(), sqlx::Error> {
                self.0.lock().unwrap().push(sql.to_string());
                Ok(())
            }
        }

        let executor = RecordingExecutor(order.clone());
        let runner = Runner::new(test_config());
        runner.run_pipeline(&pipeline, &executor, 0).await.unwrap();

        let executed = order.lock().unwrap();
        let markers: Vec<&str> = executed
            .iter()
            .map(|sql| sql.rsplit("-- ").next().unwrap())
            .collect();
        // p1a and p1b share priority 1; Runner::run_pipeline's sort is stable, so
        // their original relative order (p1a before p1b) is preserved.
        assert_eq!(markers, vec!["p1a", "p1b", "p2", "p3"]);
    }

    #[tokio::test]
    async fn stop_on_first_failure_skips_remaining_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let p1 = write_script(tmp.path(), "p1.sql", "SELECT 1");
        let p2 = write_script(tmp.path(), "p2.sql", "SELECT 1");

        let jobs = vec![
            Job::new("p1", JobParams::empty(), p1, 1),
            Job::new("p2", JobParams::empty(), p2, 2),
        ];
        let pipeline = Pipeline::new(vec![], jobs);

        let executor = ScriptedExecutor {
            results: Mutex::new(vec![
                Err(syntax_err()),
                Err(syntax_err()),
                Err(syntax_err()),
                Err(syntax_err()),
            ]),
            calls: AtomicUsize::new(0),
        };

        let runner = Runner::with_policies(
            test_config(),
            GeneralRetryPolicy {
                max_retries: 3,
                initial_delay: std::time::Duration::from_millis(1),
                backoff_factor: 1.0,
                max_delay: std::time::Duration::from_millis(5),
            },
            DeadlockRetryPolicy::default(),
        );

        let err = runner.run_pipeline(&pipeline, &executor, 0).await.unwrap_err();
        assert_eq!(err.type_label(), "p1");
        // p1 exhausts all 4 attempts; p2 is never attempted.
        assert_eq!(executor.calls.load(Ordering::SeqCst), 4);
    }
}
