//! End-to-end runner scenarios against a scripted generator.

use crate::core::{PipelineEvent, StageId};
use crate::document::{DocumentOrder, DocumentStore};
use crate::errors::{CopyflowError, GenerationError, UpstreamError, SERVICE_UNAVAILABLE_MESSAGE};
use crate::pipeline::{PausePolicy, PipelineRunner, ResumeRequest, RunOutcome, StartRequest};
use crate::testing::{CollectingEventSink, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BRIEF: &str = "We sell eco-friendly packaging";

fn runner(generator: &Arc<ScriptedGenerator>, dir: &TempDir) -> PipelineRunner {
    PipelineRunner::new(
        generator.clone(),
        DocumentStore::new(dir.path().join("briefs"), dir.path().join("output")),
    )
}

fn shape(events: &[PipelineEvent]) -> Vec<(&'static str, Option<u8>)> {
    events.iter().map(|e| (e.event_type(), e.stage())).collect()
}

fn resume_request() -> ResumeRequest {
    ResumeRequest::new("Acme Corp", BRIEF, "ANALYSIS", "PAIN POINTS")
}

#[tokio::test]
async fn test_start_emits_phase_one_then_pauses() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let outcome = runner(&generator, &dir)
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap();

    assert_eq!(
        shape(&sink.events()),
        vec![
            ("started", Some(1)),
            ("completed", Some(1)),
            ("started", Some(2)),
            ("completed", Some(2)),
            ("paused", None),
        ]
    );
    assert!(matches!(outcome, RunOutcome::Paused(_)));
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_resume_emits_phase_two_then_done() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with_response("COPY TEXT")
            .with_response("STRATEGY TEXT"),
    );
    let sink = CollectingEventSink::new();

    let outcome = runner(&generator, &dir)
        .resume(resume_request(), &sink)
        .await
        .unwrap();

    assert_eq!(
        shape(&sink.events()),
        vec![
            ("started", Some(3)),
            ("completed", Some(3)),
            ("started", Some(4)),
            ("completed", Some(4)),
            ("done", None),
        ]
    );

    let RunOutcome::Completed { path } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert!(path.to_string_lossy().ends_with("-acme-corp.md"));
    assert_eq!(
        sink.events().last(),
        Some(&PipelineEvent::Done {
            output_path: path.display().to_string()
        })
    );

    let document = std::fs::read_to_string(&path).unwrap();
    for text in ["ANALYSIS", "PAIN POINTS", "COPY TEXT", "STRATEGY TEXT"] {
        assert!(document.contains(text), "document missing {text}");
    }
}

#[tokio::test]
async fn test_resume_twice_is_independent() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let runner = runner(&generator, &dir);

    let first_sink = CollectingEventSink::new();
    let second_sink = CollectingEventSink::new();
    let first = runner.resume(resume_request(), &first_sink).await.unwrap();
    let second = runner.resume(resume_request(), &second_sink).await.unwrap();

    assert_eq!(shape(&first_sink.events()), shape(&second_sink.events()));
    assert_eq!(generator.call_count(), 4);

    // Same client, same day: the second document replaces the first.
    assert_eq!(first, second);
    let RunOutcome::Completed { path } = second else {
        panic!("expected completion");
    };
    let document = std::fs::read_to_string(path).unwrap();
    assert!(document.contains("generated output 3"));
    assert!(!document.contains("generated output 1"));

    // Each resume threads only its own stage 3 output into stage 4.
    let requests = generator.requests();
    assert!(requests[1].messages[0].content.contains("generated output 1"));
    assert!(requests[3].messages[0].content.contains("generated output 3"));
    assert!(!requests[3].messages[0].content.contains("generated output 1"));
}

#[tokio::test]
async fn test_start_with_empty_brief_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let err = runner(&generator, &dir)
        .start(StartRequest::new("Acme Corp", ""), &sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "InvalidInput");
    assert_eq!(err.to_dict()["field"], "brief");
    assert_eq!(generator.call_count(), 0);
    assert!(sink.is_empty());
    assert!(!dir.path().join("briefs").exists());
}

#[tokio::test]
async fn test_resume_missing_pain_points_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let err = runner(&generator, &dir)
        .resume(resume_request().with_pain_points("  "), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, CopyflowError::InvalidInput(ref e) if e.field == "pain_points"));
    assert_eq!(generator.call_count(), 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_acme_corp_start_then_resume_with_edits() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with_response("INDUSTRY: Packaging")
            .with_response("1. Plastic guilt"),
    );
    let runner = runner(&generator, &dir);
    let sink = CollectingEventSink::new();

    runner
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap();

    let brief_path = dir.path().join("briefs").join("acme-corp.md");
    assert_eq!(std::fs::read_to_string(brief_path).unwrap(), BRIEF);

    let Some(PipelineEvent::Paused { context }) = sink.events().last().cloned() else {
        panic!("expected a paused event last");
    };
    assert_eq!(context.client_name, "Acme Corp");
    assert_eq!(context.brief, BRIEF);
    assert!(!context.analysis.is_empty());
    assert!(!context.pain_points.is_empty());

    let request = ResumeRequest::from(context).with_pain_points("1. Shipping damage");
    let resume_sink = CollectingEventSink::new();
    runner.resume(request, &resume_sink).await.unwrap();

    let requests = generator.requests();
    let copy_request = &requests[2];
    assert!(copy_request.messages[0].content.contains("1. Shipping damage"));
    assert!(!copy_request.messages[0].content.contains("Plastic guilt"));
    assert!(copy_request.messages[0].content.contains("INDUSTRY: Packaging"));
}

#[tokio::test]
async fn test_stage_failure_is_last_event() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with_response("analysis")
            .with_error(UpstreamError::with_status(400, "prompt too long").into()),
    );
    let sink = CollectingEventSink::new();

    let err = runner(&generator, &dir)
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CopyflowError::Stage {
            stage: StageId::PainPoints,
            ..
        }
    ));
    assert_eq!(
        sink.event_types(),
        vec!["started", "completed", "started", "failed"]
    );
    let Some(PipelineEvent::Failed { error }) = sink.events().last().cloned() else {
        panic!("expected failed last");
    };
    assert!(error.contains("prompt too long"));
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_surface_friendly_message() {
    let dir = TempDir::new().unwrap();
    let generator =
        Arc::new(ScriptedGenerator::new().with_error(GenerationError::service_unavailable(5)));
    let sink = CollectingEventSink::new();

    let err = runner(&generator, &dir)
        .resume(resume_request(), &sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ServiceUnavailable");
    let Some(PipelineEvent::Failed { error }) = sink.events().last().cloned() else {
        panic!("expected failed last");
    };
    assert!(error.contains(SERVICE_UNAVAILABLE_MESSAGE));
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn test_never_policy_runs_all_four_stages() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let outcome = runner(&generator, &dir)
        .with_pause_policy(PausePolicy::Never)
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap();

    let stages: Vec<u8> = sink
        .events()
        .iter()
        .filter(|e| e.event_type() == "completed")
        .filter_map(PipelineEvent::stage)
        .collect();
    assert_eq!(stages, vec![1, 2, 3, 4]);
    assert_eq!(sink.event_types().last(), Some(&"done"));
    assert!(!sink.event_types().contains(&"paused"));
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_keepalives_during_slow_stage() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new().with_delay(Duration::from_millis(80)));
    let sink = CollectingEventSink::new();

    runner(&generator, &dir)
        .with_keepalive_interval(Duration::from_millis(10))
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap();

    assert!(sink.keepalive_count() > 0);
    assert_eq!(sink.len(), 5);
}

#[tokio::test]
async fn test_disconnect_stops_further_stages() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::closing_after(2);

    let err = runner(&generator, &dir)
        .start(StartRequest::new("Acme Corp", BRIEF), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, CopyflowError::Disconnected));
    assert_eq!(sink.event_types(), vec!["started", "completed"]);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn test_unwritable_output_fails_after_generation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("output"), "blocker").unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let err = runner(&generator, &dir)
        .resume(resume_request(), &sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "PersistenceFailure");
    assert_eq!(
        sink.event_types(),
        vec!["started", "completed", "started", "completed", "failed"]
    );
}

#[tokio::test]
async fn test_deliverable_first_document() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    let outcome = runner(&generator, &dir)
        .with_document_order(DocumentOrder::DeliverableFirst)
        .resume(resume_request(), &sink)
        .await
        .unwrap();

    let RunOutcome::Completed { path } = outcome else {
        panic!("expected completion");
    };
    let document = std::fs::read_to_string(path).unwrap();
    let strategy = document.find("## Strategy").unwrap();
    let analysis = document.find("## Analysis").unwrap();
    assert!(strategy < analysis);
}

#[tokio::test]
async fn test_brand_guidelines_reach_every_stage() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let sink = CollectingEventSink::new();

    runner(&generator, &dir)
        .with_pause_policy(PausePolicy::Never)
        .start(
            StartRequest::new("Acme Corp", BRIEF).with_brand_guidelines("Always say 'planet-first'."),
            &sink,
        )
        .await
        .unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 4);
    for request in requests {
        assert!(request.system.contains("Always say 'planet-first'."));
    }
}
