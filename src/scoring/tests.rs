use super::consistency::{ConsistencyChecker, evaluate_consistency};
use super::relevance::{RelevanceClassifier, evaluate_relevance};
use super::thresholds::{ThresholdError, Thresholds};
use super::types::{RelevanceDecision, RelevanceFailure};
use crate::embedding::mock::{anchor, blend_with_anchor};
use crate::embedding::{EmbeddingProvider, EmbeddingVector, MockEmbeddingProvider, PixelTensor};
use crate::prompts::{PromptBank, PromptCategory, PromptEmbeddingTable};

const DIM: usize = 16;

/// Default bank with one scripted score per prompt (3 positives, 5 negatives).
fn scored_table(scores: [f32; 8]) -> (EmbeddingVector, PromptEmbeddingTable) {
    let bank = PromptBank::default();
    let provider = MockEmbeddingProvider::new(DIM).with_prompt_scores(&bank, &scores);
    let table = PromptEmbeddingTable::build(bank, &provider).unwrap();
    let image = provider
        .encode_images(&[PixelTensor::from_chw(vec![0.0; 12], 2).unwrap()])
        .unwrap()
        .remove(0);
    (image, table)
}

fn classifier() -> RelevanceClassifier {
    RelevanceClassifier::new(Thresholds::default())
}

#[test]
fn test_rule_accepts_clear_road_damage() {
    assert_eq!(
        evaluate_relevance(0.34, 0.18, &Thresholds::default()),
        RelevanceDecision::Relevant
    );
}

#[test]
fn test_rule_rejects_weak_positive() {
    assert_eq!(
        evaluate_relevance(0.29, 0.10, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::BelowMinValid)
    );
}

#[test]
fn test_rule_rejects_when_negative_dominates() {
    assert_eq!(
        evaluate_relevance(0.31, 0.33, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::PositiveNotDominant)
    );
    // A tie does not count as dominance.
    assert_eq!(
        evaluate_relevance(0.31, 0.31, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::PositiveNotDominant)
    );
}

#[test]
fn test_rule_rejects_high_negative_even_when_positive_wins() {
    assert_eq!(
        evaluate_relevance(0.40, 0.27, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::NegativeTooHigh)
    );
}

#[test]
fn test_rule_reports_first_failed_condition() {
    // Fails all three; the min-valid check is reported.
    assert_eq!(
        evaluate_relevance(0.10, 0.50, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::BelowMinValid)
    );
    // Fails 2 and 3; dominance is reported.
    assert_eq!(
        evaluate_relevance(0.32, 0.40, &Thresholds::default()),
        RelevanceDecision::NotRelevant(RelevanceFailure::PositiveNotDominant)
    );
}

#[test]
fn test_rule_boundaries_are_inclusive() {
    let t = Thresholds::default();
    assert!(evaluate_relevance(t.min_valid, t.max_invalid, &t).is_relevant());
    assert!(!evaluate_relevance(t.min_valid - 1e-4, 0.0, &t).is_relevant());
    assert!(!evaluate_relevance(0.5, t.max_invalid + 1e-4, &t).is_relevant());
}

#[test]
fn test_rule_rejects_nan() {
    let t = Thresholds::default();
    assert!(!evaluate_relevance(f32::NAN, 0.0, &t).is_relevant());
    assert!(!evaluate_relevance(0.5, f32::NAN, &t).is_relevant());
}

#[test]
fn test_rule_is_monotonic() {
    let t = Thresholds::default();
    let grid: Vec<f32> = (0..=40).map(|i| -0.2 + i as f32 * 0.02).collect();

    for &pos in &grid {
        for &neg in &grid {
            if !evaluate_relevance(pos, neg, &t).is_relevant() {
                continue;
            }
            // Raising the positive or lowering the negative keeps it relevant.
            assert!(evaluate_relevance(pos + 0.05, neg, &t).is_relevant());
            assert!(evaluate_relevance(pos, neg - 0.05, &t).is_relevant());
        }
    }
}

#[test]
fn test_classifier_picks_best_of_each_partition() {
    let (image, table) = scored_table([0.20, 0.34, 0.31, 0.05, 0.18, 0.12, 0.02, 0.09]);
    let result = classifier().classify(&image, &table);

    assert!(result.is_relevant);
    assert_eq!(result.failure, None);
    assert_eq!(result.best_positive.index, 1);
    assert_eq!(result.best_positive.category, PromptCategory::Positive);
    assert_eq!(
        result.best_positive.prompt,
        "a photo of a broken or cracked road surface"
    );
    assert!((result.positive_score() - 0.34).abs() < 1e-5);

    assert_eq!(result.best_negative.index, 4);
    assert_eq!(result.best_negative.category, PromptCategory::Negative);
    assert_eq!(result.best_negative.prompt, "a photo of an animal on the road");
    assert!((result.negative_score() - 0.18).abs() < 1e-5);

    assert_eq!(result.candidates_considered, 8);
}

#[test]
fn test_classifier_rejects_dog_photo() {
    let (image, table) = scored_table([0.22, 0.19, 0.21, 0.31, 0.27, 0.10, 0.08, 0.12]);
    let result = classifier().classify(&image, &table);

    assert!(!result.is_relevant);
    assert_eq!(result.failure, Some(RelevanceFailure::BelowMinValid));
    assert_eq!(result.best_negative.prompt, "a photo of a dog");
}

#[test]
fn test_classifier_negative_too_high() {
    let (image, table) = scored_table([0.35, 0.30, 0.28, 0.10, 0.27, 0.05, 0.05, 0.05]);
    let result = classifier().classify(&image, &table);

    assert!(!result.is_relevant);
    assert_eq!(result.failure, Some(RelevanceFailure::NegativeTooHigh));
    assert_eq!(result.best_negative.index, 4);
}

#[test]
fn test_classifier_ties_go_to_first_prompt() {
    let (image, table) = scored_table([0.33, 0.33, 0.33, 0.10, 0.10, 0.10, 0.10, 0.10]);
    let result = classifier().classify(&image, &table);

    assert_eq!(result.best_positive.index, 0);
    assert_eq!(result.best_negative.index, 3);
}

#[test]
fn test_classifier_is_deterministic() {
    let (image, table) = scored_table([0.31, 0.29, 0.33, 0.22, 0.11, 0.25, 0.01, 0.19]);
    let c = classifier();
    let first = c.classify(&image, &table);
    for _ in 0..5 {
        assert_eq!(c.classify(&image, &table), first);
    }
}

#[test]
fn test_classifier_honours_custom_thresholds() {
    let (image, table) = scored_table([0.26, 0.20, 0.21, 0.10, 0.10, 0.10, 0.10, 0.10]);

    assert!(!classifier().classify(&image, &table).is_relevant);

    let relaxed = RelevanceClassifier::new(Thresholds::default().with_min_valid(0.25));
    assert!(relaxed.classify(&image, &table).is_relevant);
}

#[test]
fn test_classifier_with_custom_bank() {
    let bank = PromptBank::new(["a sinkhole"], ["a cat", "a kitchen"]).unwrap();
    let provider = MockEmbeddingProvider::new(DIM).with_prompt_scores(&bank, &[0.5, 0.2, 0.4]);
    let table = PromptEmbeddingTable::build(bank, &provider).unwrap();

    let result = classifier().classify(&anchor(DIM), &table);
    assert_eq!(result.best_positive.prompt, "a sinkhole");
    assert_eq!(result.best_negative.prompt, "a kitchen");
    assert_eq!(result.failure, Some(RelevanceFailure::NegativeTooHigh));
    assert_eq!(result.candidates_considered, 3);
}

#[test]
fn test_consistency_rule() {
    assert!(evaluate_consistency(0.28, 0.28));
    assert!(evaluate_consistency(0.40, 0.28));
    assert!(!evaluate_consistency(0.2799, 0.28));
    assert!(!evaluate_consistency(f32::NAN, 0.28));
}

#[test]
fn test_consistency_checker() {
    let checker = ConsistencyChecker::new(0.28);
    let image = anchor(DIM);

    let matching = checker.check(&image, &blend_with_anchor(DIM, 0.31, 2));
    assert!(matching.is_consistent);
    assert!((matching.similarity - 0.31).abs() < 1e-5);

    let mismatched = checker.check(&image, &blend_with_anchor(DIM, 0.12, 2));
    assert!(!mismatched.is_consistent);
    assert!((mismatched.similarity - 0.12).abs() < 1e-5);
}

#[test]
fn test_thresholds_default_and_validate() {
    let t = Thresholds::default();
    assert_eq!(t.min_valid, 0.30);
    assert_eq!(t.max_invalid, 0.25);
    assert_eq!(t.min_description_match, 0.28);
    assert!(t.validate().is_ok());

    assert_eq!(
        Thresholds::default().with_max_invalid(1.5).validate(),
        Err(ThresholdError::OutOfRange {
            name: "MAX_INVALID",
            value: 1.5
        })
    );
    assert!(
        Thresholds::default()
            .with_min_description_match(f32::NAN)
            .validate()
            .is_err()
    );
}
