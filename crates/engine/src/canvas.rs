use canvas_geometry::{EventBus, Vec2};
use canvas_layout::{
    Connection, LayoutEngine, LayoutEvent, LayoutResult, LayoutSuggestion, LayoutType, NodeSpec,
};
use canvas_snap::{
    AlignmentKind, AlignmentSuggestion, Axis, BatchDragUpdate, DistributionConfig, DragSession,
    MagneticLayer, MagneticProbe, MagneticResult, PositionUpdate, RankedAlignment, SelectionItem,
    SnapDirection, SnapEngine, SnapResult, SnapTarget, SpaceAnalysis, SpaceAnalyzer,
    SuggestionDecorator,
};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;

/// What happened inside a [`CanvasEngine`]. Layout events have their own
/// bus, see [`CanvasEngine::layout_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    ItemsRegistered {
        items: usize,
        targets: usize,
        grid_truncated: bool,
    },
    SpaceAnalysed {
        items: usize,
        truncated: bool,
    },
    MagneticTruncated {
        limit: usize,
    },
    PositionsUpdated {
        updates: Vec<PositionUpdate>,
    },
}

/// Snap candidates for the items of a finished layout.
pub fn items_from_layout(result: &LayoutResult) -> Vec<SelectionItem> {
    result
        .nodes
        .iter()
        .map(|node| SelectionItem::new(&node.id, node.bounds()).locked(node.fixed))
        .collect()
}

/// The editing session's view of the canvas: layout, snapping, space
/// analysis and magnetic attraction behind one handle.
///
/// The magnetic layer mirrors the snap engine's targets; registering items,
/// adding guides and finishing a drag keep the two in step.
pub struct CanvasEngine {
    config: EngineConfig,
    layout: LayoutEngine,
    snap: SnapEngine,
    analyzer: SpaceAnalyzer,
    magnetic: MagneticLayer,
    decorator: SuggestionDecorator,
    events: EventBus<CanvasEvent>,
}

impl CanvasEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: LayoutEngine::new(config.resolved_layout()),
            snap: SnapEngine::new(config.snap.clone())?,
            analyzer: SpaceAnalyzer::new(config.resolved_analysis())?,
            magnetic: MagneticLayer::new(config.magnetic.clone())?,
            decorator: SuggestionDecorator::default(),
            events: EventBus::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&mut self) -> &mut EventBus<CanvasEvent> {
        &mut self.events
    }

    pub fn layout_events(&mut self) -> &mut EventBus<LayoutEvent> {
        self.layout.events()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn snap(&self) -> &SnapEngine {
        &self.snap
    }

    pub fn analyzer(&self) -> &SpaceAnalyzer {
        &self.analyzer
    }

    pub fn magnetic(&self) -> &MagneticLayer {
        &self.magnetic
    }

    pub fn magnetic_mut(&mut self) -> &mut MagneticLayer {
        &mut self.magnetic
    }

    pub fn set_layout_nodes(&mut self, nodes: &[NodeSpec], connections: &[Connection]) -> Result<()> {
        Ok(self.layout.set_layout_nodes(nodes, connections)?)
    }

    pub fn execute_layout(&mut self, kind: LayoutType) -> LayoutResult {
        self.layout.execute_layout(kind)
    }

    pub fn execute_layout_named(&mut self, name: &str) -> Result<LayoutResult> {
        Ok(self.layout.execute_layout_named(name)?)
    }

    pub fn generate_layout_suggestions(
        &self,
        nodes: &[NodeSpec],
        connections: &[Connection],
    ) -> Result<Vec<LayoutSuggestion>> {
        Ok(self.layout.generate_layout_suggestions(nodes, connections)?)
    }

    pub fn record_layout_choice(&mut self, kind: LayoutType) {
        self.layout.record_choice(kind);
    }

    pub fn register_items(&mut self, items: &[SelectionItem]) -> Result<()> {
        self.snap.register_items(items)?;
        self.sync_magnetic();
        self.events.publish(CanvasEvent::ItemsRegistered {
            items: items.len(),
            targets: self.snap.target_count(),
            grid_truncated: self.snap.grid_truncated(),
        });
        Ok(())
    }

    pub fn add_guide(&mut self, direction: SnapDirection, coordinate: f64) -> Result<()> {
        self.snap.add_guide(direction, coordinate)?;
        self.sync_magnetic();
        Ok(())
    }

    pub fn add_snap_target(&mut self, target: SnapTarget) {
        self.snap.add_target(target);
        self.sync_magnetic();
    }

    pub fn clear_guides(&mut self) {
        self.snap.clear_guides();
        self.sync_magnetic();
    }

    fn sync_magnetic(&mut self) {
        let imported = self.magnetic.import_snap_targets(self.snap.targets());
        debug!(imported, "magnetic targets synchronised");
    }

    pub fn calculate_snap_position(
        &self,
        position: Vec2,
        item_id: Option<&str>,
        exclude_ids: &[&str],
    ) -> Result<SnapResult> {
        Ok(self
            .snap
            .calculate_snap_position(position, item_id, exclude_ids)?)
    }

    pub fn calculate_magnetic(&mut self, probe: &MagneticProbe) -> Result<MagneticResult> {
        let result = self.magnetic.calculate(probe)?;
        if result.truncated {
            self.events.publish(CanvasEvent::MagneticTruncated {
                limit: self.magnetic.config().max_simultaneous_snaps,
            });
        }
        Ok(result)
    }

    pub fn analyze_space_relations(&mut self, items: &[SelectionItem]) -> Result<SpaceAnalysis> {
        let analysis = self.analyzer.analyze_space_relations(items)?;
        self.events.publish(CanvasEvent::SpaceAnalysed {
            items: analysis.analyzed_items,
            truncated: analysis.truncated,
        });
        Ok(analysis)
    }

    /// Alignment suggestions of `analysis`, ranked by the suggestion
    /// decorator.
    pub fn ranked_alignments(&self, analysis: &SpaceAnalysis) -> Vec<RankedAlignment> {
        self.decorator.rank(analysis)
    }

    pub fn record_alignment_feedback(&mut self, kind: AlignmentKind, accepted: bool) {
        self.decorator.record_feedback(kind, accepted);
    }

    pub fn apply_alignment(
        &mut self,
        items: &[SelectionItem],
        suggestion: &AlignmentSuggestion,
    ) -> Vec<PositionUpdate> {
        let updates = canvas_snap::apply_alignment(items, suggestion);
        self.events.publish(CanvasEvent::PositionsUpdated {
            updates: updates.clone(),
        });
        updates
    }

    pub fn apply_distribution(
        &mut self,
        items: &[SelectionItem],
        config: &DistributionConfig,
        axis: Axis,
    ) -> Result<Vec<PositionUpdate>> {
        let updates = canvas_snap::apply_distribution(items, config, axis)?;
        self.events.publish(CanvasEvent::PositionsUpdated {
            updates: updates.clone(),
        });
        Ok(updates)
    }

    pub fn begin_batch_drag(&self, ids: &[&str], pointer: Vec2) -> Result<DragSession> {
        Ok(self.snap.begin_batch_drag(ids, pointer)?)
    }

    pub fn update_batch_drag(
        &self,
        session: &mut DragSession,
        pointer: Vec2,
    ) -> Result<BatchDragUpdate> {
        Ok(self.snap.update_batch_drag(session, pointer)?)
    }

    pub fn end_batch_drag(&mut self, session: DragSession) -> Result<Vec<PositionUpdate>> {
        let updates = self.snap.end_batch_drag(session)?;
        self.sync_magnetic();
        self.magnetic.reset_snap_counts();
        self.events.publish(CanvasEvent::PositionsUpdated {
            updates: updates.clone(),
        });
        Ok(updates)
    }
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            layout: LayoutEngine::default(),
            snap: SnapEngine::default(),
            analyzer: SpaceAnalyzer::default(),
            magnetic: MagneticLayer::default(),
            decorator: SuggestionDecorator::default(),
            events: EventBus::new(),
        }
    }
}
