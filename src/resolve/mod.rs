//! Region-to-node resolution: find the rendered node behind each flagged
//! region and remove it without touching primary content.

pub mod collect;
pub mod commit;
pub mod descend;
pub mod guard;
pub mod score;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::core::geometry::Rect;
use crate::core::model::{AdRegion, FilterReason, RegionOutcome, RemovalPath, ResolutionReport};
use crate::dom::{ContentSummary, NodeId, RenderedTree};
use crate::resolve::score::{Candidate, ScoreWeights};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    pub weights: ScoreWeights,
    /// Minimum overlap for a pooled node to be scored at all.
    pub min_overlap: f32,
    /// Best scores at or above this are not ad-like enough.
    pub accept_below: f32,
    pub parent_min_overlap: f32,
    pub parent_max_children: usize,
    pub descent_min_overlap: f32,
    pub fallback_min_overlap: f32,
    pub fallback_min_aspect: f32,
    /// Boxes starting above this viewport offset count as top-of-page slots.
    pub top_band: f32,
    /// Fraction of both viewport dimensions beyond which a node is treated as scaffolding.
    pub large_fraction: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            min_overlap: 0.15,
            accept_below: 3.0,
            parent_min_overlap: 0.5,
            parent_max_children: 5,
            descent_min_overlap: 0.2,
            fallback_min_overlap: 0.3,
            fallback_min_aspect: 2.5,
            top_band: 200.0,
            large_fraction: 0.9,
        }
    }
}

impl ResolverConfig {
    /// Reads tuning overrides; fields left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read resolver config: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse resolver config: {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Target {
    node: NodeId,
    score: f32,
    path: RemovalPath,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
    settings: Settings,
}

impl Resolver {
    pub fn new(config: ResolverConfig, settings: Settings) -> Self {
        Self { config, settings }
    }

    /// Resolves every region in order. Removals are applied as they are made,
    /// so later regions see earlier ones.
    pub fn resolve<T: RenderedTree + ?Sized>(&self, tree: &mut T, regions: &[AdRegion]) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        if regions.is_empty() {
            return report;
        }

        let pool = collect::collect_candidates(tree, &self.config);

        for (idx, region) in regions.iter().enumerate() {
            let outcome = self.resolve_region(tree, &pool, region);
            match &outcome {
                RegionOutcome::Removed { node, score, path, .. } => {
                    info!(region = idx, node = node.0, score, ?path, "removed ad element");
                }
                RegionOutcome::Filtered { reason } => {
                    info!(region = idx, ?reason, "region filtered");
                }
            }
            report.record(outcome);
        }

        info!(removed = report.removed, filtered = report.filtered, "resolution pass finished");
        report
    }

    fn resolve_region<T: RenderedTree + ?Sized>(&self, tree: &mut T, pool: &[NodeId], region: &AdRegion) -> RegionOutcome {
        let region_rect = region.viewport_rect(tree.viewport().scroll);
        let ranked = score::rank(tree, pool, &region_rect, &self.config);

        let settled = score::rank_settled(tree, &collect::collect_settled(tree), &region_rect, &self.config);
        if self.already_resolved(&settled, ranked.first(), &region_rect) {
            return RegionOutcome::Filtered {
                reason: FilterReason::AlreadyRemoved,
            };
        }

        let chosen = match ranked.first() {
            Some(best) if best.score < self.config.accept_below => {
                let promoted = self.promote(tree, best, &region_rect);
                self.unprotect(tree, promoted, &region_rect)
            }
            _ => self.fallback(tree, &ranked, &region_rect),
        };

        match chosen {
            Ok(target) => self.commit(tree, target),
            Err(reason) => RegionOutcome::Filtered { reason },
        }
    }

    /// An earlier removal accounts for the region when it outranks every live
    /// candidate, or covers at least as much of the region as the best one.
    fn already_resolved(&self, settled: &[Candidate], best: Option<&Candidate>, region: &Rect) -> bool {
        let Some(prior) = settled.first() else {
            return false;
        };
        if prior.score >= self.config.accept_below {
            return false;
        }
        let Some(best) = best else {
            return true;
        };
        let best_coverage = coverage(region, &best.rect);
        prior.score <= best.score
            || settled
                .iter()
                .any(|candidate| coverage(region, &candidate.rect) >= best_coverage)
    }

    /// Prefers a thin unprotected wrapper over the single element inside it.
    fn promote<T: RenderedTree + ?Sized>(&self, tree: &T, best: &Candidate, region: &Rect) -> Target {
        let direct = Target {
            node: best.node,
            score: best.score,
            path: RemovalPath::Direct,
        };

        let Some(parent) = tree.parent(best.node) else {
            return direct;
        };
        if parent == tree.root() {
            return direct;
        }
        let Some(parent_rect) = tree.rect(parent) else {
            return direct;
        };

        let overlap = region.overlap(&parent_rect).percentage;
        if overlap >= self.config.parent_min_overlap
            && tree.children(parent).len() < self.config.parent_max_children
            && !guard::is_protected(tree, parent)
        {
            debug!(from = best.node.0, to = parent.0, overlap, "promoted to parent");
            return Target {
                node: parent,
                score: best.score,
                path: RemovalPath::Promoted,
            };
        }

        direct
    }

    /// Replaces a protected target with its best unprotected descendant.
    fn unprotect<T: RenderedTree + ?Sized>(&self, tree: &T, target: Target, region: &Rect) -> Result<Target, FilterReason> {
        let target = if let Some(protection) = guard::protection(tree, target.node) {
            debug!(node = target.node.0, ?protection, "target is protected, searching children");
            match descend::best_unprotected_descendant(tree, target.node, region, &self.config) {
                Some(child) => Target {
                    node: child.node,
                    score: child.score,
                    path: RemovalPath::Descended,
                },
                None => return Err(FilterReason::ProtectedWithoutAdChild),
            }
        } else {
            target
        };

        // Descent never yields a protected node; this veto only fires if the
        // guard and descent disagree.
        debug_assert!(!guard::is_protected(tree, target.node));
        if guard::is_protected(tree, target.node) {
            return Err(FilterReason::ProtectedTarget);
        }
        Ok(target)
    }

    /// Banner-shaped rescue for regions the general scorer under-ranks.
    fn fallback<T: RenderedTree + ?Sized>(&self, tree: &T, ranked: &[Candidate], region: &Rect) -> Result<Target, FilterReason> {
        let banner = ranked.iter().find(|candidate| {
            let wide = candidate.rect.aspect_ratio() > self.config.fallback_min_aspect;
            let top = candidate.rect.top < self.config.top_band;
            let framed = tree.tag(candidate.node) == "iframe";
            let single_image = || ContentSummary::of(tree, candidate.node).images == 1;
            wide && candidate.overlap_percentage >= self.config.fallback_min_overlap && (top || framed || single_image())
        });

        let Some(banner) = banner else {
            return Err(FilterReason::NoCandidate);
        };

        debug!(node = banner.node.0, score = banner.score, "fallback banner candidate");
        let target = self.unprotect(
            tree,
            Target {
                node: banner.node,
                score: banner.score,
                path: RemovalPath::Fallback,
            },
            region,
        )?;
        Ok(target)
    }

    fn commit<T: RenderedTree + ?Sized>(&self, tree: &mut T, target: Target) -> RegionOutcome {
        // targets are drawn from rendered nodes
        let Some(rect) = tree.rect(target.node) else {
            return RegionOutcome::Filtered {
                reason: FilterReason::AlreadyRemoved,
            };
        };

        match commit::commit_removal(tree, target.node, &self.settings) {
            Ok(_) => RegionOutcome::Removed {
                node: target.node,
                score: target.score,
                path: target.path,
                rect,
            },
            Err(err) => {
                warn!(node = target.node.0, error = %err, "failed to commit removal");
                RegionOutcome::Filtered {
                    reason: FilterReason::CommitFailed,
                }
            }
        }
    }
}

/// Fraction of the region's area that `rect` covers.
fn coverage(region: &Rect, rect: &Rect) -> f32 {
    let area = region.area();
    if area > 0.0 {
        region.overlap(rect).area / area
    } else {
        0.0
    }
}
