//! Integration tests for the read pipeline
//!
//! Collaborators are mocked; storage is in-memory SQLite or a failing stub.

use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

use bsi_read_analysis::analysis::{
    AnalysisRecord, ContradictionFlag, ContradictionPattern, Factor, PrecedentData, PromptType,
    ReasoningPattern, ValidationReport,
};
use bsi_read_analysis::error::{LangbaseError, LangbaseResult, StorageError, StorageResult};
use bsi_read_analysis::services::{ContradictionDetector, PrecedentSource};
use bsi_read_analysis::storage::{ReportSummary, SqliteStorage, Storage};
use bsi_read_analysis::{EvaluationRequest, ReadPipeline};

mock! {
    pub Detector {}

    #[async_trait]
    impl ContradictionDetector for Detector {
        async fn detect(&self, narrative: &str) -> LangbaseResult<Vec<ContradictionFlag>>;
    }
}

mock! {
    pub Precedents {}

    #[async_trait]
    impl PrecedentSource for Precedents {
        async fn lookup(&self, record: &AnalysisRecord) -> LangbaseResult<PrecedentData>;
    }
}

/// Storage whose writes always fail.
struct ReadOnlyStorage;

#[async_trait]
impl Storage for ReadOnlyStorage {
    async fn save_report(&self, _report: &ValidationReport) -> StorageResult<()> {
        Err(StorageError::Query {
            message: "attempt to write a readonly database".to_string(),
        })
    }

    async fn get_report(&self, _id: &str) -> StorageResult<Option<ValidationReport>> {
        Ok(None)
    }

    async fn list_reports(&self, _limit: u32) -> StorageResult<Vec<ReportSummary>> {
        Ok(Vec::new())
    }

    async fn delete_report(&self, id: &str) -> StorageResult<()> {
        Err(StorageError::ReportNotFound {
            report_id: id.to_string(),
        })
    }
}

fn reference_record() -> AnalysisRecord {
    AnalysisRecord::new("Anisimova vs Sabalenka, Wimbledon semi-final")
        .with_factor(Factor::SymbolicAlignment, 6.5)
        .with_factor(Factor::BeliefIntensity, 7.2)
        .with_factor(Factor::SentimentIntensity, 6.8)
        .with_factor(Factor::NarrativeBreathability, 5.9)
        .with_cascade([75.0, 45.0, 60.0, 30.0])
}

fn strong_record(narrative: &str) -> AnalysisRecord {
    Factor::ALL
        .iter()
        .fold(AnalysisRecord::new(narrative), |r, &f| r.with_factor(f, 8.5))
}

fn quiet_detector() -> MockDetector {
    let mut detector = MockDetector::new();
    detector.expect_detect().returning(|_| Ok(Vec::new()));
    detector
}

fn quiet_precedents() -> MockPrecedents {
    let mut precedents = MockPrecedents::new();
    precedents
        .expect_lookup()
        .returning(|_| Ok(PrecedentData::default()));
    precedents
}

#[tokio::test]
async fn test_detector_flags_flow_into_patterns_and_checklist() {
    let mut detector = MockDetector::new();
    detector
        .expect_detect()
        .withf(|narrative| narrative.contains("Wimbledon"))
        .times(1)
        .returning(|_| {
            Ok((0..3)
                .map(|i| {
                    ContradictionFlag::new(
                        format!("statement {}", i),
                        ContradictionPattern::FundamentalTraitVsArbitraryLimitation,
                        "Which one is it?",
                    )
                })
                .collect())
        });

    let pipeline = ReadPipeline::new(Arc::new(detector), Arc::new(quiet_precedents()));
    let evaluation = pipeline
        .evaluate(EvaluationRequest::new(reference_record()))
        .await;

    assert!(evaluation.warnings.is_empty());
    assert!(evaluation
        .repath
        .patterns_detected
        .contains(ReasoningPattern::HighContradictionCount));
    assert_eq!(evaluation.repath.prompts[1].prompt_type, PromptType::ContradictionResolution);
    assert_eq!(evaluation.report.repath_prompts, evaluation.repath.prompts);
    assert!(evaluation.report.detailed_results.precedent.score.is_none());
}

#[tokio::test]
async fn test_collaborator_failures_become_warnings() {
    let mut detector = MockDetector::new();
    detector.expect_detect().returning(|_| {
        Err(LangbaseError::Api {
            status: 500,
            message: "boom".to_string(),
        })
    });
    let mut precedents = MockPrecedents::new();
    precedents.expect_lookup().returning(|_| {
        Err(LangbaseError::InvalidResponse {
            message: "not json".to_string(),
        })
    });

    let pipeline = ReadPipeline::new(Arc::new(detector), Arc::new(precedents));
    let evaluation = pipeline
        .evaluate(EvaluationRequest::new(reference_record()))
        .await;

    assert_eq!(evaluation.warnings.len(), 2);
    assert!(evaluation.warnings[0].starts_with("Contradiction detection failed"));
    assert!(evaluation.warnings[1].starts_with("Precedent lookup failed"));
    assert!(evaluation.repath.repath_required);
}

struct StalledDetector;

#[async_trait]
impl ContradictionDetector for StalledDetector {
    async fn detect(&self, _narrative: &str) -> LangbaseResult<Vec<ContradictionFlag>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_stalled_detector_times_out() {
    let pipeline = ReadPipeline::new(Arc::new(StalledDetector), Arc::new(quiet_precedents()))
        .with_collaborator_timeout(Duration::from_millis(50));
    let evaluation = pipeline
        .evaluate(EvaluationRequest::new(reference_record()))
        .await;

    assert_eq!(
        evaluation.warnings,
        vec!["Contradiction detection timed out after 50ms".to_string()]
    );
}

#[tokio::test]
async fn test_reports_are_persisted() {
    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let pipeline = ReadPipeline::new(Arc::new(quiet_detector()), Arc::new(quiet_precedents()))
        .with_storage(storage.clone());

    let evaluation = pipeline
        .evaluate(EvaluationRequest::new(reference_record()))
        .await;

    let stored = storage
        .get_report(&evaluation.report.id.to_string())
        .await
        .unwrap()
        .expect("report should be stored");
    assert_eq!(stored.id, evaluation.report.id);
    assert_eq!(stored.validation_status, evaluation.report.validation_status);
}

#[tokio::test]
async fn test_storage_failure_is_a_warning() {
    let pipeline = ReadPipeline::new(Arc::new(quiet_detector()), Arc::new(quiet_precedents()))
        .with_storage(Arc::new(ReadOnlyStorage));

    let evaluation = pipeline
        .evaluate(EvaluationRequest::new(reference_record()))
        .await;

    assert_eq!(evaluation.warnings.len(), 1);
    assert!(evaluation.warnings[0].starts_with("Report not persisted"));
}

#[test]
fn test_batch_preserves_input_order() {
    let mut detector = MockDetector::new();
    detector.expect_detect().times(3).returning(|_| Ok(Vec::new()));
    let mut precedents = MockPrecedents::new();
    precedents
        .expect_lookup()
        .times(2)
        .returning(|_| Ok(PrecedentData::default()));

    let pipeline = ReadPipeline::new(Arc::new(detector), Arc::new(precedents));
    let requests = vec![
        EvaluationRequest::new(strong_record("first")),
        EvaluationRequest::new(reference_record()),
        EvaluationRequest::new(strong_record("third")).with_precedents(PrecedentData {
            precedent_accuracy: Some(0.5),
            ..PrecedentData::default()
        }),
    ];

    let evaluations = tokio_test::block_on(pipeline.evaluate_batch(requests)).unwrap();

    assert_eq!(evaluations.len(), 3);
    assert!(!evaluations[0].repath.repath_required);
    assert!(evaluations[1].repath.repath_required);
    assert!(!evaluations[2].repath.repath_required);
    assert_eq!(
        evaluations[2].report.detailed_results.precedent.score,
        Some(5.0)
    );
}

#[test]
fn test_empty_batch() {
    let pipeline = ReadPipeline::new(Arc::new(MockDetector::new()), Arc::new(MockPrecedents::new()));
    let evaluations = tokio_test::block_on(pipeline.evaluate_batch(Vec::new())).unwrap();
    assert!(evaluations.is_empty());
}
