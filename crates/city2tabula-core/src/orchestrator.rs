use crate::job::{Job, JobParams};
use crate::pipeline::Pipeline;
use crate::queue::PipelineQueue;
use city2tabula_sql::lod::LodLevel;
use city2tabula_sql::loader::{LoadedScripts, ScriptFile};

/// Builds the three pipeline queues the system needs (spec §4.5), from a set of
/// loaded scripts and already-batched building-ID lists. Pure and stateless: it
/// performs no I/O of its own, only arranging data that's already been loaded.
pub struct Orchestrator;

impl Orchestrator {
    /// One pipeline per batch: LOD2 batches first, then LOD3, each pipeline's jobs
    /// being the main feature-extraction scripts in loader order, labelled
    /// `LOD2: <filename>` / `LOD3: <filename>` and prioritised by script position.
    /// Empty batch lists contribute no pipelines (spec §4.5, scenario S1).
    pub fn build_feature_extraction_queue(
        scripts: &LoadedScripts,
        lod2_batches: &[Vec<i64>],
        lod3_batches: &[Vec<i64>],
    ) -> PipelineQueue {
        let queue = PipelineQueue::new();
        for batch in lod2_batches {
            queue.enqueue(Self::feature_extraction_pipeline(
                batch,
                &scripts.main_feature_extraction,
                LodLevel::Lod2,
            ));
        }
        for batch in lod3_batches {
            queue.enqueue(Self::feature_extraction_pipeline(
                batch,
                &scripts.main_feature_extraction,
                LodLevel::Lod3,
            ));
        }
        queue
    }

    fn feature_extraction_pipeline(ids: &[i64], scripts: &[ScriptFile], lod: LodLevel) -> Pipeline {
        let jobs = scripts
            .iter()
            .enumerate()
            .map(|(index, script)| {
                Job::with_lod(
                    format!("{}: {}", lod.label_prefix(), script.name),
                    Some(lod),
                    JobParams::new(ids.to_vec()),
                    script.path.clone(),
                    (index + 1) as i32,
                )
            })
            .collect();
        Pipeline::new(ids.to_vec(), jobs)
    }

    /// Single pipeline: all function scripts, then the main-table schema scripts once
    /// for LOD2 and once for LOD3, priorities continuing monotonically across the
    /// three groups (spec §4.5). Table scripts are LOD-scoped so the same script
    /// creates both per-LOD variants of each table.
    pub fn build_main_setup_queue(scripts: &LoadedScripts) -> PipelineQueue {
        let queue = PipelineQueue::new();
        let mut jobs = Vec::new();
        let mut priority = 1;

        for script in &scripts.functions {
            jobs.push(Job::new(
                format!("setup: {}", script.name),
                JobParams::empty(),
                script.path.clone(),
                priority,
            ));
            priority += 1;
        }
        for lod in [LodLevel::Lod2, LodLevel::Lod3] {
            for script in &scripts.main_table_schemas {
                jobs.push(Job::with_lod(
                    format!("{} setup: {}", lod.label_prefix(), script.name),
                    Some(lod),
                    JobParams::empty(),
                    script.path.clone(),
                    priority,
                ));
                priority += 1;
            }
        }

        queue.enqueue(Pipeline::new(Vec::new(), jobs));
        queue
    }

    /// A single pipeline whose jobs are the supplementary scripts in loader order.
    /// Callers must run the worker pool servicing this queue with parallelism 1
    /// (spec §4.5/§9): these scripts are not partitioned by building and several
    /// modify schema-level objects that aren't safely interleavable.
    pub fn build_supplementary_queue(scripts: &LoadedScripts) -> PipelineQueue {
        let queue = PipelineQueue::new();
        let jobs = scripts
            .supplementary
            .iter()
            .enumerate()
            .map(|(index, script)| {
                Job::new(
                    format!("supplementary: {}", script.name),
                    JobParams::empty(),
                    script.path.clone(),
                    (index + 1) as i32,
                )
            })
            .collect();
        queue.enqueue(Pipeline::new(Vec::new(), jobs));
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script(name: &str) -> ScriptFile {
        ScriptFile {
            path: PathBuf::from(format!("sql/main/{name}")),
            name: name.to_string(),
        }
    }

    fn loaded_scripts() -> LoadedScripts {
        LoadedScripts {
            functions: vec![script("01_fn.sql")],
            main_table_schemas: vec![script("01_building.sql")],
            supplementary_table_schemas: vec![],
            main_feature_extraction: vec![script("01_harvest.sql"), script("02_dump.sql")],
            supplementary: vec![script("01_import_tabula.sql")],
        }
    }

    #[test]
    fn s1_empty_lod2_produces_only_lod3_pipelines() {
        let scripts = loaded_scripts();
        let queue = Orchestrator::build_feature_extraction_queue(&scripts, &[], &[vec![101, 102]]);
        assert_eq!(queue.len(), 1);
        let pipeline = queue.dequeue().unwrap();
        assert_eq!(pipeline.building_ids, vec![101, 102]);
        assert_eq!(pipeline.jobs[0].type_label, "LOD3: 01_harvest.sql");
    }

    #[test]
    fn s2_batch_boundary_yields_three_pipelines_per_lod() {
        use crate::batch::create_batches;

        let ids: Vec<i64> = (1..=2500).collect();
        let batches = create_batches(&ids, 1000);
        let scripts = loaded_scripts();
        let queue = Orchestrator::build_feature_extraction_queue(&scripts, &batches, &batches);
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn lod2_pipelines_are_enqueued_before_lod3() {
        let scripts = loaded_scripts();
        let queue = Orchestrator::build_feature_extraction_queue(&scripts, &[vec![1]], &[vec![2]]);
        assert_eq!(queue.dequeue().unwrap().jobs[0].type_label, "LOD2: 01_harvest.sql");
        assert_eq!(queue.dequeue().unwrap().jobs[0].type_label, "LOD3: 01_harvest.sql");
    }

    #[test]
    fn main_setup_queue_orders_functions_then_lod2_then_lod3() {
        let scripts = loaded_scripts();
        let queue = Orchestrator::build_main_setup_queue(&scripts);
        assert_eq!(queue.len(), 1);
        let pipeline = queue.dequeue().unwrap();
        let labels: Vec<_> = pipeline.jobs.iter().map(|j| j.type_label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["setup: 01_fn.sql", "LOD2 setup: 01_building.sql", "LOD3 setup: 01_building.sql"]
        );
        let priorities: Vec<_> = pipeline.jobs.iter().map(|j| j.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3]);
    }

    #[test]
    fn supplementary_queue_is_a_single_pipeline_in_loader_order() {
        let scripts = loaded_scripts();
        let queue = Orchestrator::build_supplementary_queue(&scripts);
        assert_eq!(queue.len(), 1);
        let pipeline = queue.dequeue().unwrap();
        assert_eq!(pipeline.jobs.len(), 1);
        assert_eq!(pipeline.jobs[0].type_label, "supplementary: 01_import_tabula.sql");
    }
}
