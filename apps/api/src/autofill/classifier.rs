//! Semantic Field Classifier — scores a field descriptor against every catalog type.
//!
//! score = (w_kw * keywordCoverage + w_pat * patternHit + w_ctx * contextScore
//!          + w_type * typeBonus) * baseWeight, clamped to [0, 1].
//! Any exclusion term in the search string forces the score to 0.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::autofill::collector::FieldDescriptor;
use crate::autofill::field_types::{FieldType, FieldTypeCatalog, FieldTypeId};
use crate::autofill::platform::PlatformProfile;

/// Per-signal weights. Tunable; the defaults are a starting point, not a calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub pattern: f64,
    pub context: f64,
    pub type_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: 0.4,
            pattern: 0.3,
            context: 0.2,
            type_bonus: 0.1,
        }
    }
}

/// Neutral context score for types that declare no context tags.
const NEUTRAL_CONTEXT: f64 = 0.5;
const MISMATCHED_TYPE_BONUS: f64 = 0.5;
const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub field_type: FieldTypeId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Accepted type, or `None` when the best score is under the threshold.
    pub field_type: Option<FieldTypeId>,
    /// Score of the best type with keyword or pattern evidence, accepted or not. Falls back
    /// to the top-ranked candidate when no type has such evidence.
    pub confidence: f64,
    /// Up to three best non-zero candidates, highest first.
    pub candidates: Vec<Candidate>,
    pub evidence: String,
}

/// Signal values for one field type, kept for the evidence string.
#[derive(Debug, Clone, Copy)]
struct Signals {
    keywords_found: usize,
    keywords_total: usize,
    pattern_hit: bool,
    context: f64,
    type_match: bool,
    excluded: bool,
}

impl Signals {
    fn keyword_coverage(&self) -> f64 {
        if self.keywords_total == 0 {
            return 0.0;
        }
        self.keywords_found as f64 / self.keywords_total as f64
    }

    fn has_textual_evidence(&self) -> bool {
        self.keywords_found > 0 || self.pattern_hit
    }

    fn score(&self, weights: &ScoringWeights, base_weight: f64) -> f64 {
        if self.excluded {
            return 0.0;
        }
        let pattern = if self.pattern_hit { 1.0 } else { 0.0 };
        let type_bonus = if self.type_match {
            1.0
        } else {
            MISMATCHED_TYPE_BONUS
        };
        let raw = weights.keyword * self.keyword_coverage()
            + weights.pattern * pattern
            + weights.context * self.context
            + weights.type_bonus * type_bonus;
        (raw * base_weight).clamp(0.0, 1.0)
    }

    fn describe(&self, id: FieldTypeId, score: f64) -> String {
        format!(
            "{id}: keywords {}/{}, pattern {}, context {:.2}, type {} => {score:.3}",
            self.keywords_found,
            self.keywords_total,
            if self.pattern_hit { "hit" } else { "miss" },
            self.context,
            if self.type_match { "match" } else { "mismatch" },
        )
    }
}

pub struct FieldClassifier {
    catalog: Arc<FieldTypeCatalog>,
    weights: ScoringWeights,
    default_threshold: f64,
}

impl FieldClassifier {
    pub fn new(catalog: Arc<FieldTypeCatalog>, weights: ScoringWeights, default_threshold: f64) -> Self {
        Self {
            catalog,
            weights,
            default_threshold,
        }
    }

    pub fn catalog(&self) -> &FieldTypeCatalog {
        &self.catalog
    }

    pub fn classify(&self, descriptor: &FieldDescriptor, platform: &PlatformProfile) -> MatchResult {
        let search = descriptor.search_text();
        let section = descriptor
            .section_hint
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        let control_type = descriptor.control_type();
        let linkedin_only = search.contains("linkedin");

        let mut scored: Vec<(FieldTypeId, f64, Signals)> = self
            .catalog
            .iter()
            .filter(|ft| !linkedin_only || ft.id == FieldTypeId::Linkedin)
            .map(|ft| {
                let signals = collect_signals(ft, &search, &section, &control_type, platform);
                (ft.id, signals.score(&self.weights, ft.base_weight), signals)
            })
            .filter(|(_, score, _)| *score > 0.0)
            .collect();

        // Stable sort: equal scores keep catalog order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let threshold = platform.confidence_threshold(self.default_threshold);
        let candidates: Vec<Candidate> = scored
            .iter()
            .take(MAX_CANDIDATES)
            .map(|(id, score, _)| Candidate {
                field_type: *id,
                score: *score,
            })
            .collect();

        // Context and type priors rank a type but never get it accepted on their own.
        let Some((best_id, best_score, best_signals)) = scored
            .iter()
            .find(|(_, _, signals)| signals.has_textual_evidence())
            .copied()
        else {
            return MatchResult {
                field_type: None,
                confidence: scored.first().map_or(0.0, |(_, score, _)| *score),
                candidates,
                evidence: format!("no keyword or pattern evidence for '{search}'"),
            };
        };

        let accepted = best_score >= threshold;
        let evidence = if accepted {
            best_signals.describe(best_id, best_score)
        } else {
            format!(
                "below threshold {threshold:.2}; best was {}",
                best_signals.describe(best_id, best_score)
            )
        };

        MatchResult {
            field_type: accepted.then_some(best_id),
            confidence: best_score,
            candidates,
            evidence,
        }
    }
}

fn collect_signals(
    field_type: &FieldType,
    search: &str,
    section: &str,
    control_type: &str,
    platform: &PlatformProfile,
) -> Signals {
    let excluded = field_type
        .exclusions
        .iter()
        .any(|term| search.contains(term.as_str()));

    let keywords_found = field_type
        .keywords
        .iter()
        .filter(|k| search.contains(k.as_str()))
        .count();

    let pattern_hit = field_type.patterns.iter().any(|re| re.is_match(search))
        || platform
            .field_pattern_override(field_type.id)
            .is_some_and(|extra| extra.iter().any(|re| re.is_match(search)));

    let context = if field_type.context.is_empty() {
        NEUTRAL_CONTEXT
    } else {
        let present = field_type
            .context
            .iter()
            .filter(|tag| search.contains(tag.as_str()) || section.contains(tag.as_str()))
            .count();
        present as f64 / field_type.context.len() as f64
    };

    let type_match = field_type.input_types.iter().any(|t| t == control_type);

    Signals {
        keywords_found,
        keywords_total: field_type.keywords.len(),
        pattern_hit,
        context,
        type_match,
        excluded,
    }
}
