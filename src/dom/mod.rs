//! Read access to a rendered page tree plus its single mutation entry point.

pub mod snapshot;
pub mod summary;

pub use snapshot::{PageSnapshot, SnapshotNode};
pub use summary::ContentSummary;

use serde::{Deserialize, Serialize};

use crate::core::error::TreeError;
use crate::core::geometry::Rect;
use crate::core::model::ScrollOffset;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Position::Fixed | Position::Sticky)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStyle {
    pub position: Position,
    pub has_background_image: bool,
    pub display_none: bool,
    pub visibility_hidden: bool,
}

/// Whether the content of an embedded frame can be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAccess {
    NotAFrame,
    Accessible,
    Inaccessible,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub scroll: ScrollOffset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitAction {
    /// Hide the node in place; surrounding content reflows.
    Hide,
    /// Insert an invisible spacer of the given size before the node, then hide it.
    ReplaceWithPlaceholder { width: f32, height: f32 },
}

pub trait RenderedTree {
    /// The page root container (the document body).
    fn root(&self) -> NodeId;
    /// Every node in document order.
    fn nodes(&self) -> Vec<NodeId>;
    fn viewport(&self) -> Viewport;
    fn page_url(&self) -> Option<&str>;

    /// Lowercase tag name.
    fn tag(&self, node: NodeId) -> &str;
    fn role(&self, node: NodeId) -> Option<&str>;
    fn input_type(&self, node: NodeId) -> Option<&str>;
    fn href(&self, node: NodeId) -> Option<&str>;
    /// Text directly owned by the node, excluding descendants.
    fn own_text(&self, node: NodeId) -> &str;

    /// Current viewport-relative box, or `None` when the node is not rendered.
    fn rect(&self, node: NodeId) -> Option<Rect>;
    /// Viewport-relative box from the stored layout, still available after
    /// the node was hidden.
    fn layout_rect(&self, node: NodeId) -> Option<Rect>;
    fn style(&self, node: NodeId) -> NodeStyle;
    fn frame_access(&self, node: NodeId) -> FrameAccess;

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn is_ad_removed(&self, node: NodeId) -> bool;
    fn is_placeholder(&self, node: NodeId) -> bool;

    /// Apply a removal and mark the node as ad-removed.
    fn commit(&mut self, node: NodeId, action: CommitAction) -> Result<(), TreeError>;

    fn is_rendered(&self, node: NodeId) -> bool {
        self.rect(node).is_some()
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }
}

pub fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}
