//! End-to-end generation scenarios through the orchestrator, query service
//! and API, each against its own temp output directory and ledger.

mod common;

use std::io::Cursor;
use std::path::Path;

use common::{ScriptedGenerator, TestHarness};
use synthgen::api::GenerateRequest;
use synthgen::db::job_repo::Order;
use synthgen::storage::ARTIFACT_EXTENSIONS;
use synthgen::{JobLedger, JobStatus, OrchestratorError, QueryError};

fn zip_entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_successful_batch_is_recorded_once() {
    let harness = TestHarness::new();

    let summary = harness.orchestrator.submit("cat", 0.1, 2).unwrap();

    assert_eq!(summary.label, "cat");
    assert_eq!(summary.output_size, 2);
    assert_eq!(summary.preview.len(), 2);
    assert_eq!(summary.download_link, format!("/download/{}", summary.id));

    let rows = harness.db.list_all(Order::NewestFirst).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, summary.id);
    assert_eq!(row.job_status().unwrap(), JobStatus::Succeeded);
    assert_eq!(row.succeeded_count, 2);
    assert_eq!(row.device_used, "cpu");
    assert!(row.error_detail.is_none());

    let files = harness
        .store()
        .list_artifacts(Path::new(&row.artifact_directory), ARTIFACT_EXTENSIONS)
        .unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["cat_001.png", "cat_002.png"]);
}

#[test]
fn test_first_item_failure_records_failed_job() {
    let harness = TestHarness::with_generator(ScriptedGenerator::failing_on(1));

    let err = harness.orchestrator.submit("cat", 0.1, 3).unwrap_err();
    let job_id = match err {
        OrchestratorError::GenerationFailed {
            job_id,
            detail,
            ledger_warning,
        } => {
            assert!(detail.contains("out of memory"));
            assert!(ledger_warning.is_none());
            job_id
        }
        other => panic!("unexpected error: {:?}", other),
    };

    let row = harness.db.find_by_id(&job_id).unwrap().unwrap();
    assert_eq!(row.job_status().unwrap(), JobStatus::Failed);
    assert_eq!(row.succeeded_count, 0);
    assert!(row.error_detail.unwrap().contains("out of memory"));
    assert_eq!(harness.generator.calls(), 1);
}

#[test]
fn test_mid_batch_failure_stops_and_zeroes_count() {
    let harness = TestHarness::with_generator(ScriptedGenerator::failing_on(2));

    assert!(harness.orchestrator.submit("dog", 0.3, 3).is_err());

    // The third item is never attempted.
    assert_eq!(harness.generator.calls(), 2);

    let rows = harness.db.list_all(Order::NewestFirst).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].succeeded_count, 0);
    assert_eq!(rows[0].job_status().unwrap(), JobStatus::Failed);

    // The first artifact stays on disk but is never downloadable.
    let files = harness
        .store()
        .list_artifacts(Path::new(&rows[0].artifact_directory), ARTIFACT_EXTENSIONS)
        .unwrap();
    assert_eq!(files.len(), 1);
    assert!(matches!(
        harness.queries().download(&rows[0].id),
        Err(QueryError::NotFound(_))
    ));
}

#[test]
fn test_rejected_requests_leave_no_trace() {
    let harness = TestHarness::new();
    let api = harness.api();

    let cases = [("", 0.1, 2), ("cat", 1.5, 2), ("cat", 0.1, 0), ("cat", 0.1, 11)];
    for (label, noise_level, output_size) in cases {
        let request = GenerateRequest {
            label: label.to_string(),
            noise_level,
            output_size,
        };
        let err = api.generate(&request).unwrap_err();
        assert_eq!(err.status, 400, "case {:?}", (label, noise_level, output_size));
    }

    assert!(matches!(
        harness.orchestrator.submit("   ", 0.1, 1),
        Err(OrchestratorError::InvalidRequest(_))
    ));

    assert_eq!(harness.db.count_total().unwrap(), 0);
    assert_eq!(harness.job_dir_count(), 0);
    assert_eq!(harness.generator.calls(), 0);
}

#[test]
fn test_preview_is_stable_across_calls() {
    let harness = TestHarness::new();
    let summary = harness.orchestrator.submit("bird", 0.2, 5).unwrap();
    let queries = harness.queries();

    let first = queries.preview(&summary.id, 3).unwrap();
    let second = queries.preview(&summary.id, 3).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(first, summary.preview);
}

#[test]
fn test_preview_never_exceeds_succeeded_count() {
    let harness = TestHarness::new();

    for count in 1..=4 {
        let summary = harness.orchestrator.submit("fish", 0.0, count).unwrap();
        let preview = harness.queries().preview(&summary.id, 3).unwrap();
        assert_eq!(preview.len(), (count as usize).min(3));
    }
}

#[test]
fn test_bundle_contains_exactly_the_listed_artifacts() {
    let harness = TestHarness::new();
    let summary = harness.orchestrator.submit("tree", 0.4, 3).unwrap();

    let bundle = harness.queries().download(&summary.id).unwrap();
    assert_eq!(bundle.filename, format!("tree_{}.zip", summary.id));
    assert_eq!(bundle.content_type, "application/zip");

    let dir = harness.store().job_directory(&summary.id);
    let listed: Vec<String> = harness
        .store()
        .list_artifacts(&dir, ARTIFACT_EXTENSIONS)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(zip_entry_names(&bundle.bytes), listed);
}

#[test]
fn test_download_name_of_path_like_label_stays_flat() {
    let harness = TestHarness::new();
    let summary = harness.orchestrator.submit("../../escape", 0.1, 1).unwrap();

    let download = harness.api().download(&summary.id).unwrap();
    assert!(!download.filename.contains('/'));
    assert!(!download.filename.starts_with('.'));

    let out_dir = harness.temp_path().join("out");
    let target = out_dir.join(&download.filename);
    assert_eq!(target.parent(), Some(out_dir.as_path()));
}

#[test]
fn test_download_after_directory_removed_is_not_found() {
    let harness = TestHarness::new();
    let summary = harness.orchestrator.submit("car", 0.1, 2).unwrap();

    let store = harness.store();
    store.remove(&store.job_directory(&summary.id)).unwrap();

    assert!(matches!(
        harness.queries().download(&summary.id),
        Err(QueryError::NotFound(_))
    ));
    assert_eq!(harness.api().download(&summary.id).unwrap_err().status, 404);

    // The ledger still knows the job.
    assert_eq!(harness.api().datasets().unwrap().len(), 1);
}

#[test]
fn test_download_of_emptied_directory_has_no_artifacts() {
    let harness = TestHarness::new();
    let summary = harness.orchestrator.submit("boat", 0.1, 1).unwrap();

    let dir = harness.store().job_directory(&summary.id);
    for entry in std::fs::read_dir(&dir).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    assert!(matches!(
        harness.queries().download(&summary.id),
        Err(QueryError::NoArtifacts(_))
    ));
}

#[test]
fn test_stats_reflect_mixed_outcomes() {
    let harness = TestHarness::with_generator(ScriptedGenerator::failing_on(4));
    let api = harness.api();

    harness.orchestrator.submit("cat", 0.1, 2).unwrap();
    harness.orchestrator.submit("cat", 0.1, 1).unwrap();
    assert!(harness.orchestrator.submit("dog", 0.1, 2).is_err());

    let stats = api.stats().unwrap();
    assert_eq!(stats.total_generations, 3);
    assert_eq!(stats.successful_generations, 2);
    assert_eq!(stats.failed_generations, 1);
    assert_eq!(stats.total_images, 3);
    assert_eq!(stats.popular_labels.len(), 1);
    assert_eq!(stats.popular_labels[0].label, "cat");
    assert_eq!(stats.popular_labels[0].count, 2);

    let samples = api.samples().unwrap();
    assert_eq!(samples.samples.len(), 2);
    assert!(samples.samples.iter().all(|s| s.label == "cat"));
}

#[test]
fn test_datasets_are_newest_first() {
    let harness = TestHarness::new();
    let first = harness.orchestrator.submit("one", 0.1, 1).unwrap();
    let second = harness.orchestrator.submit("two", 0.1, 1).unwrap();

    let datasets = harness.api().datasets().unwrap();
    let ids: Vec<_> = datasets.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn test_concurrent_submissions_get_distinct_jobs() {
    let harness = TestHarness::new();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let orchestrator = harness.orchestrator.clone();
            std::thread::spawn(move || orchestrator.submit(&format!("label{}", i), 0.1, 2))
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().id)
        .collect();
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 4);
    assert_eq!(harness.db.count_total().unwrap(), 4);
    assert_eq!(harness.job_dir_count(), 4);
}
