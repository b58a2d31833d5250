//! Optional ranking layer over [`SpaceAnalysis`] alignment suggestions.
//!
//! The analysis itself stays heuristic and deterministic; the decorator
//! only reorders its output with a pluggable [`ScoringStrategy`] and learns
//! which alignments the user tends to accept.

use canvas_geometry::clamp_unit;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::{AlignmentKind, AlignmentSuggestion, SpaceAnalysis};

/// Inputs to a [`ScoringStrategy`], each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub confidence: f64,
    /// Higher when applying the suggestion moves items less.
    pub quality: f64,
    pub user_fit: f64,
}

pub trait ScoringStrategy {
    fn score(&self, inputs: &ScoreInputs) -> f64;
}

/// Linear blend; the defaults are tunable starting points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedScoring {
    pub confidence: f64,
    pub quality: f64,
    pub user_fit: f64,
    /// Spread at which a suggestion's quality reaches zero.
    pub spread_scale: f64,
}

impl Default for WeightedScoring {
    fn default() -> Self {
        Self {
            confidence: 0.4,
            quality: 0.4,
            user_fit: 0.2,
            spread_scale: 400.0,
        }
    }
}

impl ScoringStrategy for WeightedScoring {
    fn score(&self, i: &ScoreInputs) -> f64 {
        self.confidence * i.confidence + self.quality * i.quality + self.user_fit * i.user_fit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlignment {
    pub suggestion: AlignmentSuggestion,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Feedback {
    accepted: u32,
    shown: u32,
}

#[derive(Debug, Clone)]
pub struct SuggestionDecorator<S = WeightedScoring> {
    strategy: S,
    spread_scale: f64,
    feedback: FxHashMap<AlignmentKind, Feedback>,
}

impl Default for SuggestionDecorator<WeightedScoring> {
    fn default() -> Self {
        let strategy = WeightedScoring::default();
        Self::new(strategy, strategy.spread_scale)
    }
}

impl<S: ScoringStrategy> SuggestionDecorator<S> {
    pub fn new(strategy: S, spread_scale: f64) -> Self {
        Self {
            strategy,
            spread_scale: spread_scale.max(f64::EPSILON),
            feedback: FxHashMap::default(),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Share of accepted suggestions of this kind, smoothed towards 0.5.
    pub fn user_fit(&self, kind: AlignmentKind) -> f64 {
        let f = self.feedback.get(&kind).copied().unwrap_or_default();
        (f.accepted as f64 + 1.0) / (f.shown as f64 + 2.0)
    }

    pub fn record_feedback(&mut self, kind: AlignmentKind, accepted: bool) {
        let entry = self.feedback.entry(kind).or_default();
        entry.shown += 1;
        if accepted {
            entry.accepted += 1;
        }
    }

    /// Alignment suggestions of `analysis`, best first.
    pub fn rank(&self, analysis: &SpaceAnalysis) -> Vec<RankedAlignment> {
        let mut ranked: Vec<RankedAlignment> = analysis
            .alignments
            .iter()
            .map(|s| {
                let inputs = ScoreInputs {
                    confidence: s.confidence,
                    quality: 1.0 - clamp_unit(s.spread / self.spread_scale),
                    user_fit: self.user_fit(s.kind),
                };
                RankedAlignment {
                    suggestion: s.clone(),
                    score: self.strategy.score(&inputs),
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.suggestion.kind.cmp(&b.suggestion.kind))
        });
        ranked
    }
}
