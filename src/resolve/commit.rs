use tracing::debug;

use crate::config::Settings;
use crate::core::error::TreeError;
use crate::dom::{CommitAction, NodeId, RenderedTree};

/// Chooses the removal form from the placeholder preference.
pub fn removal_action<T: RenderedTree + ?Sized>(tree: &T, node: NodeId, settings: &Settings) -> CommitAction {
    match tree.rect(node) {
        Some(rect) if settings.create_placeholders => CommitAction::ReplaceWithPlaceholder {
            width: rect.width(),
            height: rect.height(),
        },
        _ => CommitAction::Hide,
    }
}

pub fn commit_removal<T: RenderedTree + ?Sized>(
    tree: &mut T,
    node: NodeId,
    settings: &Settings,
) -> Result<CommitAction, TreeError> {
    let action = removal_action(tree, node, settings);
    tree.commit(node, action)?;
    debug!(node = node.0, ?action, "committed removal");
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ScrollOffset;
    use crate::dom::{PageSnapshot, SnapshotNode, Viewport};
    use pretty_assertions::assert_eq;

    fn snapshot() -> PageSnapshot {
        PageSnapshot::new(
            None,
            Viewport {
                width: 1280.0,
                height: 800.0,
                scroll: ScrollOffset::default(),
            },
            SnapshotNode::new("body")
                .rect(0.0, 0.0, 1280.0, 2000.0)
                .child(SnapshotNode::new("iframe").rect(0.0, 0.0, 728.0, 90.0)),
        )
    }

    #[test]
    fn placeholder_matches_target_size() {
        let mut tree = snapshot();
        let action = commit_removal(&mut tree, NodeId(1), &Settings::default()).unwrap();
        assert_eq!(
            action,
            CommitAction::ReplaceWithPlaceholder {
                width: 728.0,
                height: 90.0
            }
        );
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn disabled_placeholders_hide_in_place() {
        let mut tree = snapshot();
        let settings = Settings::default().with_placeholders(false);
        let action = commit_removal(&mut tree, NodeId(1), &settings).unwrap();
        assert_eq!(action, CommitAction::Hide);
        assert_eq!(tree.len(), 2);
        assert!(tree.is_ad_removed(NodeId(1)));
    }
}
