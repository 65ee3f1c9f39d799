//! Candidate scoring. Lower scores are more ad-like.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::geometry::Rect;
use crate::dom::{ContentSummary, FrameAccess, NodeId, RenderedTree};
use crate::resolve::ResolverConfig;

/// Common ad unit shapes as open width/height ranges: banner, square, rectangle, skyscraper.
const AD_ASPECT_BANDS: [(f32, f32); 4] = [(2.5, 8.5), (0.8, 1.2), (1.7, 2.3), (0.25, 0.4)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Overlap,
    CenterDistance,
    OversizeDifference,
    UndersizeDifference,
    TopBand,
    Pinned,
    Frame,
    InaccessibleFrame,
    BackgroundContainer,
    AdAspectRatio,
    FewControls,
    SingleImage,
    Isolated,
}

/// Weight applied to each feature's magnitude; flags have magnitude 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub overlap: f32,
    pub center_distance: f32,
    pub oversize_difference: f32,
    pub undersize_difference: f32,
    pub top_band: f32,
    pub pinned: f32,
    pub frame: f32,
    pub inaccessible_frame: f32,
    pub background_container: f32,
    pub ad_aspect_ratio: f32,
    pub few_controls: f32,
    pub single_image: f32,
    pub isolated: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            overlap: -12.0,
            center_distance: 0.005,
            oversize_difference: 1.5,
            undersize_difference: 3.0,
            top_band: -1.0,
            pinned: -2.0,
            frame: -4.0,
            inaccessible_frame: -2.0,
            background_container: -3.0,
            ad_aspect_ratio: -2.0,
            few_controls: -1.0,
            single_image: -1.5,
            isolated: -1.0,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, feature: Feature) -> f32 {
        match feature {
            Feature::Overlap => self.overlap,
            Feature::CenterDistance => self.center_distance,
            Feature::OversizeDifference => self.oversize_difference,
            Feature::UndersizeDifference => self.undersize_difference,
            Feature::TopBand => self.top_band,
            Feature::Pinned => self.pinned,
            Feature::Frame => self.frame,
            Feature::InaccessibleFrame => self.inaccessible_frame,
            Feature::BackgroundContainer => self.background_container,
            Feature::AdAspectRatio => self.ad_aspect_ratio,
            Feature::FewControls => self.few_controls,
            Feature::SingleImage => self.single_image,
            Feature::Isolated => self.isolated,
        }
    }

    pub fn score(&self, features: &[(Feature, f32)]) -> f32 {
        features
            .iter()
            .map(|(feature, magnitude)| self.weight(*feature) * magnitude)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub rect: Rect,
    pub overlap_percentage: f32,
    pub center_distance: f32,
    pub size_difference: f32,
    pub features: Vec<(Feature, f32)>,
    pub score: f32,
}

pub fn is_ad_aspect_ratio(ratio: f32) -> bool {
    AD_ASPECT_BANDS
        .iter()
        .any(|(low, high)| ratio > *low && ratio < *high)
}

/// Scores one node against a viewport-space region. Returns `None` when the
/// node is not rendered or overlaps less than `min_overlap`.
pub fn score_node<T: RenderedTree + ?Sized>(
    tree: &T,
    node: NodeId,
    region: &Rect,
    min_overlap: f32,
    config: &ResolverConfig,
) -> Option<Candidate> {
    let rect = tree.rect(node)?;
    score_at(tree, node, rect, region, min_overlap, config)
}

fn score_at<T: RenderedTree + ?Sized>(
    tree: &T,
    node: NodeId,
    rect: Rect,
    region: &Rect,
    min_overlap: f32,
    config: &ResolverConfig,
) -> Option<Candidate> {
    let overlap = region.overlap(&rect);
    if overlap.percentage < min_overlap {
        return None;
    }

    let center_distance = region.center_distance(&rect);
    let region_area = region.area();
    let node_area = rect.area();
    let largest = region_area.max(node_area);
    let size_difference = if largest > 0.0 {
        (region_area - node_area).abs() / largest
    } else {
        0.0
    };

    let features = extract_features(
        tree,
        node,
        &rect,
        overlap.percentage,
        center_distance,
        size_difference,
        node_area > region_area,
        config,
    );
    let score = config.weights.score(&features);

    Some(Candidate {
        node,
        rect,
        overlap_percentage: overlap.percentage,
        center_distance,
        size_difference,
        features,
        score,
    })
}

#[allow(clippy::too_many_arguments)]
fn extract_features<T: RenderedTree + ?Sized>(
    tree: &T,
    node: NodeId,
    rect: &Rect,
    overlap: f32,
    center_distance: f32,
    size_difference: f32,
    node_is_larger: bool,
    config: &ResolverConfig,
) -> Vec<(Feature, f32)> {
    let mut features = vec![
        (Feature::Overlap, overlap),
        (Feature::CenterDistance, center_distance),
    ];

    if node_is_larger {
        features.push((Feature::OversizeDifference, size_difference));
    } else {
        features.push((Feature::UndersizeDifference, size_difference));
    }

    if rect.top < config.top_band {
        features.push((Feature::TopBand, 1.0));
    }

    let style = tree.style(node);
    if style.position.is_pinned() {
        features.push((Feature::Pinned, 1.0));
    }

    match tree.frame_access(node) {
        FrameAccess::Inaccessible => {
            features.push((Feature::Frame, 1.0));
            features.push((Feature::InaccessibleFrame, 1.0));
        }
        FrameAccess::Accessible => features.push((Feature::Frame, 1.0)),
        FrameAccess::NotAFrame => {}
    }

    let summary = ContentSummary::of(tree, node);
    let child_count = tree.children(node).len();

    if tree.tag(node) == "div" && style.has_background_image && child_count < 3 && summary.text_len < 50 {
        features.push((Feature::BackgroundContainer, 1.0));
    }

    if is_ad_aspect_ratio(rect.aspect_ratio()) {
        features.push((Feature::AdAspectRatio, 1.0));
    }

    if summary.interactive <= 1 {
        features.push((Feature::FewControls, 1.0));
    }

    if summary.images == 1 && child_count < 3 {
        features.push((Feature::SingleImage, 1.0));
    }

    if let Some(parent) = tree.parent(node) {
        if parent != tree.root() && tree.children(parent).len() < 3 {
            features.push((Feature::Isolated, 1.0));
        }
    }

    features
}

/// Scores the still-rendered members of `pool` and sorts them best first.
/// Ties keep document order.
pub fn rank<T: RenderedTree + ?Sized>(
    tree: &T,
    pool: &[NodeId],
    region: &Rect,
    config: &ResolverConfig,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = pool
        .iter()
        .filter(|node| !tree.is_ad_removed(**node))
        .filter_map(|node| score_node(tree, *node, region, config.min_overlap, config))
        .collect();
    sort_best_first(&mut candidates);
    candidates
}

/// Scores nodes an earlier removal already settled, using the box they
/// occupied before being hidden.
pub fn rank_settled<T: RenderedTree + ?Sized>(
    tree: &T,
    settled: &[NodeId],
    region: &Rect,
    config: &ResolverConfig,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = settled
        .iter()
        .filter_map(|node| {
            let rect = tree.layout_rect(*node)?;
            score_at(tree, *node, rect, region, config.min_overlap, config)
        })
        .collect();
    sort_best_first(&mut candidates);
    candidates
}

fn sort_best_first(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ScrollOffset;
    use crate::dom::{PageSnapshot, Position, SnapshotNode, Viewport};

    fn snapshot(root: SnapshotNode) -> PageSnapshot {
        PageSnapshot::new(
            Some("https://example.com/"),
            Viewport {
                width: 1280.0,
                height: 800.0,
                scroll: ScrollOffset::default(),
            },
            root,
        )
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn aspect_bands_are_open() {
        assert!(is_ad_aspect_ratio(728.0 / 90.0));
        assert!(is_ad_aspect_ratio(1.0));
        assert!(is_ad_aspect_ratio(2.0));
        assert!(is_ad_aspect_ratio(160.0 / 600.0));
        assert!(!is_ad_aspect_ratio(2.5));
        assert!(!is_ad_aspect_ratio(1.5));
        assert!(!is_ad_aspect_ratio(10.0));
    }

    #[test]
    fn cross_origin_top_frame_scores_every_bonus() {
        let tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("iframe").rect(0.0, 0.0, 728.0, 90.0).cross_origin()),
        );
        let region = Rect::from_origin(0.0, 0.0, 728.0, 90.0);
        let candidate = score_node(&tree, NodeId(1), &region, 0.15, &ResolverConfig::default()).unwrap();

        // overlap, top band, frame, cross-origin, aspect, few controls
        assert!(close(candidate.score, -12.0 - 1.0 - 4.0 - 2.0 - 2.0 - 1.0));
        assert!(close(candidate.size_difference, 0.0));
    }

    #[test]
    fn smaller_nodes_pay_more_for_size_mismatch() {
        let tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("span").rect(500.0, 1000.0, 100.0, 300.0))
                .child(SnapshotNode::new("span").rect(500.0, 1000.0, 400.0, 300.0)),
        );
        let region = Rect::from_origin(500.0, 1000.0, 200.0, 300.0);
        let config = ResolverConfig::default();
        let small = score_node(&tree, NodeId(1), &region, 0.15, &config).unwrap();
        let large = score_node(&tree, NodeId(2), &region, 0.15, &config).unwrap();

        assert!(close(small.size_difference, 0.5));
        assert!(close(large.size_difference, 0.5));
        assert!(small.features.contains(&(Feature::UndersizeDifference, 0.5)));
        assert!(large.features.contains(&(Feature::OversizeDifference, 0.5)));
    }

    #[test]
    fn weak_overlap_is_not_admitted() {
        let tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("div").rect(0.0, 0.0, 100.0, 100.0)),
        );
        let region = Rect::from_origin(90.0, 90.0, 100.0, 100.0);
        assert!(score_node(&tree, NodeId(1), &region, 0.15, &ResolverConfig::default()).is_none());
    }

    #[test]
    fn structural_signals_accumulate() {
        let wrapper = SnapshotNode::new("div")
            .rect(300.0, 600.0, 250.0, 250.0)
            .position(Position::Sticky)
            .background_image()
            .child(SnapshotNode::new("img").rect(300.0, 600.0, 250.0, 250.0));
        let tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("section").rect(300.0, 600.0, 250.0, 250.0).child(wrapper)),
        );
        let region = Rect::from_origin(300.0, 600.0, 250.0, 250.0);
        let candidate = score_node(&tree, NodeId(2), &region, 0.15, &ResolverConfig::default()).unwrap();

        let features: Vec<_> = candidate.features.iter().map(|(f, _)| *f).collect();
        for expected in [
            Feature::Pinned,
            Feature::BackgroundContainer,
            Feature::AdAspectRatio,
            Feature::FewControls,
            Feature::SingleImage,
            Feature::Isolated,
        ] {
            assert!(features.contains(&expected), "missing {expected:?}");
        }
        assert!(!features.contains(&Feature::TopBand));
        assert!(close(candidate.score, -12.0 - 2.0 - 3.0 - 2.0 - 1.0 - 1.5 - 1.0));
    }

    #[test]
    fn settled_nodes_score_by_their_former_box() {
        let mut tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("iframe").rect(0.0, 500.0, 300.0, 250.0)),
        );
        tree.commit(NodeId(1), crate::dom::CommitAction::Hide).unwrap();
        let region = Rect::from_origin(0.0, 500.0, 300.0, 250.0);
        let config = ResolverConfig::default();

        assert!(rank(&tree, &[NodeId(1)], &region, &config).is_empty());
        let settled = rank_settled(&tree, &[NodeId(1)], &region, &config);
        assert_eq!(settled.len(), 1);
        assert!(close(settled[0].overlap_percentage, 1.0));
    }

    #[test]
    fn rank_orders_best_first() {
        let tree = snapshot(
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 3000.0)
                .child(SnapshotNode::new("p").text("story").rect(0.0, 400.0, 1000.0, 600.0))
                .child(SnapshotNode::new("iframe").rect(0.0, 500.0, 300.0, 250.0)),
        );
        let region = Rect::from_origin(0.0, 500.0, 300.0, 250.0);
        let pool = vec![NodeId(1), NodeId(2)];
        let ranked = rank(&tree, &pool, &region, &ResolverConfig::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].node, NodeId(2));
        assert!(ranked[0].score < ranked[1].score);
    }
}
