use tracing::debug;

use crate::dom::{NodeId, RenderedTree};
use crate::resolve::ResolverConfig;

const NON_VISUAL_TAGS: [&str; 6] = ["script", "style", "meta", "link", "head", "html"];
const CONTENT_ROLES: [&str; 2] = ["main", "article"];

pub fn is_non_visual(tag: &str) -> bool {
    NON_VISUAL_TAGS.contains(&tag)
}

/// Nodes that may be matched against a region during this pass, in document order.
pub fn collect_candidates<T: RenderedTree + ?Sized>(tree: &T, config: &ResolverConfig) -> Vec<NodeId> {
    let viewport = tree.viewport();
    let root = tree.root();

    let pool: Vec<NodeId> = tree
        .nodes()
        .into_iter()
        .filter(|node| {
            if *node == root || tree.is_placeholder(*node) || tree.is_ad_removed(*node) {
                return false;
            }
            if is_non_visual(tree.tag(*node)) {
                return false;
            }
            if tree.role(*node).is_some_and(|role| CONTENT_ROLES.contains(&role)) {
                return false;
            }
            let Some(rect) = tree.rect(*node) else {
                return false;
            };
            let is_large = rect.width() >= viewport.width * config.large_fraction
                && rect.height() >= viewport.height * config.large_fraction;
            !is_large || tree.tag(*node) == "iframe"
        })
        .collect();

    debug!(candidates = pool.len(), "collected candidate pool");
    pool
}

/// Nodes an earlier removal already acted on: hidden ads and their placeholders.
pub fn collect_settled<T: RenderedTree + ?Sized>(tree: &T) -> Vec<NodeId> {
    tree.nodes()
        .into_iter()
        .filter(|node| tree.is_ad_removed(*node) || tree.is_placeholder(*node))
        .collect()
}
