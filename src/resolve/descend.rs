use std::cmp::Ordering;

use crate::core::geometry::Rect;
use crate::dom::{NodeId, RenderedTree};
use crate::resolve::collect::is_non_visual;
use crate::resolve::guard::is_protected;
use crate::resolve::score::{score_node, Candidate};
use crate::resolve::ResolverConfig;

/// Depth-first search under a protected node for the best unprotected
/// descendant that still covers the region. Protected children are searched
/// through, never selected.
pub fn best_unprotected_descendant<T: RenderedTree + ?Sized>(
    tree: &T,
    parent: NodeId,
    region: &Rect,
    config: &ResolverConfig,
) -> Option<Candidate> {
    visible_children(tree, parent)
        .into_iter()
        .filter_map(|child| {
            if is_protected(tree, child) {
                best_unprotected_descendant(tree, child, region, config)
            } else {
                score_node(tree, child, region, config.descent_min_overlap, config)
            }
        })
        .min_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
}

fn visible_children<T: RenderedTree + ?Sized>(tree: &T, parent: NodeId) -> Vec<NodeId> {
    tree.children(parent)
        .into_iter()
        .filter(|child| {
            let style = tree.style(*child);
            tree.is_rendered(*child)
                && !style.visibility_hidden
                && !tree.is_placeholder(*child)
                && !is_non_visual(tree.tag(*child))
        })
        .collect()
}
