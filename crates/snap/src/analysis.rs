//! Read-only analysis of how a set of items relates spatially: alignment
//! and distribution suggestions, overlaps and proximity clusters.

use canvas_geometry::{
    BoundingBox, CacheStats, EPSILON, ResultCache, SnapshotKey, SpatialHashGrid, clamp_unit,
    precise_round,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::item::{Axis, SelectionItem, validate_items};

const DECIMALS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentKind {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// How the common coordinate of an alignment is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStrategy {
    Min,
    Average,
    Max,
}

impl AlignmentKind {
    pub const ALL: [AlignmentKind; 6] = [
        AlignmentKind::Left,
        AlignmentKind::Center,
        AlignmentKind::Right,
        AlignmentKind::Top,
        AlignmentKind::Middle,
        AlignmentKind::Bottom,
    ];

    /// Axis along which aligned items move.
    pub fn axis(self) -> Axis {
        match self {
            AlignmentKind::Left | AlignmentKind::Center | AlignmentKind::Right => Axis::Horizontal,
            AlignmentKind::Top | AlignmentKind::Middle | AlignmentKind::Bottom => Axis::Vertical,
        }
    }

    pub fn strategy(self) -> ReferenceStrategy {
        match self {
            AlignmentKind::Left | AlignmentKind::Top => ReferenceStrategy::Min,
            AlignmentKind::Center | AlignmentKind::Middle => ReferenceStrategy::Average,
            AlignmentKind::Right | AlignmentKind::Bottom => ReferenceStrategy::Max,
        }
    }

    /// The coordinate of `bounds` this alignment compares.
    pub fn coordinate(self, bounds: &BoundingBox) -> f64 {
        let axis = self.axis();
        match self.strategy() {
            ReferenceStrategy::Min => axis.start(bounds),
            ReferenceStrategy::Average => axis.mid(bounds),
            ReferenceStrategy::Max => axis.end(bounds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSuggestion {
    pub kind: AlignmentKind,
    /// Coordinate every item's [`AlignmentKind::coordinate`] moves to.
    pub reference: f64,
    /// Current max minus min of the compared coordinate.
    pub spread: f64,
    pub confidence: f64,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapSeverity {
    Low,
    Medium,
    High,
}

impl OverlapSeverity {
    /// Bands on intersection over union.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.5 {
            OverlapSeverity::High
        } else if ratio > 0.1 {
            OverlapSeverity::Medium
        } else {
            OverlapSeverity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapInfo {
    pub first: String,
    pub second: String,
    pub area: f64,
    /// Intersection over union.
    pub ratio: f64,
    pub severity: OverlapSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub item_ids: Vec<String>,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSuggestion {
    pub axis: Axis,
    /// Items in order along `axis`.
    pub item_ids: Vec<String>,
    pub average_gap: f64,
    /// Largest gap minus smallest gap.
    pub gap_variation: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceAnalysis {
    pub clusters: Vec<Cluster>,
    pub alignments: Vec<AlignmentSuggestion>,
    pub distributions: Vec<DistributionSuggestion>,
    pub overlaps: Vec<OverlapInfo>,
    /// Set when the input exceeded `max_analysis_items`.
    pub truncated: bool,
    pub analyzed_items: usize,
}

/// Memoised space-relation analysis.
#[derive(Debug)]
pub struct SpaceAnalyzer {
    config: AnalysisConfig,
    cache: ResultCache<SpaceAnalysis>,
    runs: u64,
}

impl Default for SpaceAnalyzer {
    fn default() -> Self {
        let config = AnalysisConfig::default();
        Self {
            cache: ResultCache::new(config.cache_capacity),
            config,
            runs: 0,
        }
    }
}

impl SpaceAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: ResultCache::new(config.cache_capacity),
            config,
            runs: 0,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of analyses actually computed (cache misses).
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn analyze_space_relations(&mut self, items: &[SelectionItem]) -> Result<SpaceAnalysis> {
        validate_items(items)?;
        let key = items
            .iter()
            .fold(
                SnapshotKey::builder("space").context(&self.config),
                |key, item| key.item(&item.id, &item.bounds),
            )
            .build();

        let config = &self.config;
        let runs = &mut self.runs;
        Ok(self.cache.get_or_compute(key, || {
            *runs += 1;
            analyze(items, config)
        }))
    }
}

fn analyze(items: &[SelectionItem], config: &AnalysisConfig) -> SpaceAnalysis {
    let truncated = items.len() > config.max_analysis_items;
    let items = if truncated {
        warn!(
            requested = items.len(),
            limit = config.max_analysis_items,
            "space analysis truncated"
        );
        &items[..config.max_analysis_items]
    } else {
        items
    };

    let analysis = SpaceAnalysis {
        clusters: clusters(items, config.cluster_distance),
        alignments: alignments(items, config.alignment_spread_scale),
        distributions: distributions(items, config),
        overlaps: overlaps(items),
        truncated,
        analyzed_items: items.len(),
    };
    debug!(
        items = items.len(),
        alignments = analysis.alignments.len(),
        overlaps = analysis.overlaps.len(),
        clusters = analysis.clusters.len(),
        "space analysed"
    );
    analysis
}

/// One suggestion per alignment kind whose coordinates are not already
/// equal. Confidence grows with the current spread.
pub fn alignments(items: &[SelectionItem], spread_scale: f64) -> Vec<AlignmentSuggestion> {
    if items.len() < 2 {
        return Vec::new();
    }
    let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    AlignmentKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let values: Vec<f64> = items.iter().map(|i| kind.coordinate(&i.bounds)).collect();
            let (min, max) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(*v), hi.max(*v))
                });
            let spread = max - min;
            if spread <= EPSILON {
                return None;
            }
            let reference = match kind.strategy() {
                ReferenceStrategy::Min => min,
                ReferenceStrategy::Average => values.iter().sum::<f64>() / values.len() as f64,
                ReferenceStrategy::Max => max,
            };
            Some(AlignmentSuggestion {
                kind,
                reference: precise_round(reference, DECIMALS),
                spread: precise_round(spread, DECIMALS),
                confidence: (spread / spread_scale).min(1.0),
                item_ids: ids.clone(),
            })
        })
        .collect()
}

/// Every strictly intersecting pair.
pub fn overlaps(items: &[SelectionItem]) -> Vec<OverlapInfo> {
    items
        .iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            let area = a.bounds.intersection_area(&b.bounds);
            if area <= EPSILON {
                return None;
            }
            let union = a.bounds.area() + b.bounds.area() - area;
            let ratio = if union > EPSILON { area / union } else { 1.0 };
            Some(OverlapInfo {
                first: a.id.clone(),
                second: b.id.clone(),
                area: precise_round(area, DECIMALS),
                ratio: precise_round(ratio, DECIMALS),
                severity: OverlapSeverity::from_ratio(ratio),
            })
        })
        .collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Groups of two or more items chained together by gaps of at most
/// `distance`.
pub fn clusters(items: &[SelectionItem], distance: f64) -> Vec<Cluster> {
    let mut grid = SpatialHashGrid::new(distance.max(1.0) * 2.0);
    for (i, item) in items.iter().enumerate() {
        grid.insert(i, item.bounds);
    }

    let mut parent: Vec<usize> = (0..items.len()).collect();
    for (i, item) in items.iter().enumerate() {
        for j in grid.query(&item.bounds.expand(distance)) {
            if j <= i || item.bounds.gap_distance(&items[j].bounds) > distance {
                continue;
            }
            let (a, b) = (find(&mut parent, i), find(&mut parent, j));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..items.len() {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|(_, members)| {
            let bounds = BoundingBox::union_all(members.iter().map(|&i| items[i].bounds))?;
            Some(Cluster {
                item_ids: members.iter().map(|&i| items[i].id.clone()).collect(),
                bounds,
            })
        })
        .collect()
}

/// Rows or columns of three or more items whose gaps vary by more than the
/// configured tolerance.
pub fn distributions(
    items: &[SelectionItem],
    config: &AnalysisConfig,
) -> Vec<DistributionSuggestion> {
    if items.len() < 3 {
        return Vec::new();
    }
    [Axis::Horizontal, Axis::Vertical]
        .into_iter()
        .filter_map(|axis| {
            let sorted: Vec<&SelectionItem> = items
                .iter()
                .sorted_by(|a, b| {
                    axis.start(&a.bounds)
                        .total_cmp(&axis.start(&b.bounds))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .collect();
            let gaps: Vec<f64> = sorted
                .iter()
                .tuple_windows()
                .map(|(a, b)| axis.start(&b.bounds) - axis.end(&a.bounds))
                .collect();
            // items overlapping along the axis are not a row
            if gaps.iter().any(|g| *g < 0.0) {
                return None;
            }
            let (min, max) = gaps
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| {
                    (lo.min(*g), hi.max(*g))
                });
            let variation = max - min;
            if variation <= config.distribution_tolerance {
                return None;
            }
            Some(DistributionSuggestion {
                axis,
                item_ids: sorted.iter().map(|i| i.id.clone()).collect(),
                average_gap: precise_round(gaps.iter().sum::<f64>() / gaps.len() as f64, DECIMALS),
                gap_variation: precise_round(variation, DECIMALS),
                confidence: clamp_unit(variation / config.alignment_spread_scale),
            })
        })
        .collect()
}
