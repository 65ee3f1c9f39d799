use serde::{Deserialize, Serialize};

use crate::core::error::TreeError;
use crate::core::geometry::Rect;
use crate::core::model::ScrollOffset;
use crate::dom::{CommitAction, FrameAccess, NodeId, NodeStyle, Position, RenderedTree, Viewport};

pub const PLACEHOLDER_CLASS: &str = "placeholder-element";

/// One element of a captured page. `rect` is in page coordinates, except for
/// fixed-position subtrees, whose boxes are viewport coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub background_image: bool,
    #[serde(default)]
    pub display_none: bool,
    #[serde(default)]
    pub visibility_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default)]
    pub cross_origin: bool,
    #[serde(default)]
    pub removed_ad: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.rect = Some(Rect::from_origin(x, y, width, height));
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn background_image(mut self) -> Self {
        self.background_image = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.display_none = true;
        self
    }

    pub fn input_type(mut self, kind: &str) -> Self {
        self.input_type = Some(kind.to_string());
        self
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn cross_origin(mut self) -> Self {
        self.cross_origin = true;
        self
    }

    pub fn child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = SnapshotNode>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub viewport: Viewport,
    pub root: SnapshotNode,
}

#[derive(Debug, Clone)]
struct Slot {
    node: SnapshotNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned page tree that implements [`RenderedTree`]; the root node plays
/// the role of the document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument", into = "SnapshotDocument")]
pub struct PageSnapshot {
    url: Option<String>,
    viewport: Viewport,
    slots: Vec<Slot>,
}

impl From<SnapshotDocument> for PageSnapshot {
    fn from(document: SnapshotDocument) -> Self {
        let mut snapshot = PageSnapshot {
            url: document.url,
            viewport: document.viewport,
            slots: Vec::new(),
        };
        snapshot.insert(document.root, None);
        snapshot
    }
}

impl From<PageSnapshot> for SnapshotDocument {
    fn from(snapshot: PageSnapshot) -> Self {
        let root = snapshot.rebuild(NodeId(0));
        SnapshotDocument {
            url: snapshot.url,
            viewport: snapshot.viewport,
            root,
        }
    }
}

impl PageSnapshot {
    pub fn new(url: Option<&str>, viewport: Viewport, root: SnapshotNode) -> Self {
        PageSnapshot::from(SnapshotDocument {
            url: url.map(str::to_string),
            viewport,
            root,
        })
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&SnapshotDocument::from(self.clone()))
    }

    pub fn set_scroll(&mut self, scroll: ScrollOffset) {
        self.viewport.scroll = scroll;
    }

    pub fn node(&self, id: NodeId) -> Option<&SnapshotNode> {
        self.slots.get(id.0).map(|slot| &slot.node)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First node, in document order, whose own text matches exactly.
    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        self.nodes()
            .into_iter()
            .find(|id| self.own_text(*id) == text)
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.nodes()
            .into_iter()
            .filter(|id| self.tag(*id) == tag)
            .collect()
    }

    fn insert(&mut self, mut node: SnapshotNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.slots.len());
        let children = std::mem::take(&mut node.children);
        self.slots.push(Slot {
            node,
            parent,
            children: Vec::new(),
        });
        for child in children {
            let child_id = self.insert(child, Some(id));
            self.slots[id.0].children.push(child_id);
        }
        id
    }

    fn rebuild(&self, id: NodeId) -> SnapshotNode {
        let slot = &self.slots[id.0];
        let mut node = slot.node.clone();
        node.children = slot.children.iter().map(|child| self.rebuild(*child)).collect();
        node
    }

    fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = &Slot> {
        std::iter::successors(self.slots.get(id.0), move |slot| {
            slot.parent.and_then(|parent| self.slots.get(parent.0))
        })
    }

    fn viewport_anchored(&self, id: NodeId) -> bool {
        self.ancestors_and_self(id)
            .any(|slot| slot.node.position == Position::Fixed)
    }

    fn display_suppressed(&self, id: NodeId) -> bool {
        self.ancestors_and_self(id)
            .any(|slot| slot.node.display_none || slot.node.removed_ad)
    }
}

impl RenderedTree for PageSnapshot {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn nodes(&self) -> Vec<NodeId> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        let mut out = vec![self.root()];
        out.extend(self.descendants(self.root()));
        out
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn page_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn tag(&self, node: NodeId) -> &str {
        self.node(node).map(|n| n.tag.as_str()).unwrap_or_default()
    }

    fn role(&self, node: NodeId) -> Option<&str> {
        self.node(node).and_then(|n| n.role.as_deref())
    }

    fn input_type(&self, node: NodeId) -> Option<&str> {
        self.node(node).and_then(|n| n.input_type.as_deref())
    }

    fn href(&self, node: NodeId) -> Option<&str> {
        self.node(node).and_then(|n| n.href.as_deref())
    }

    fn own_text(&self, node: NodeId) -> &str {
        self.node(node).map(|n| n.text.as_str()).unwrap_or_default()
    }

    fn rect(&self, node: NodeId) -> Option<Rect> {
        if self.display_suppressed(node) {
            return None;
        }
        self.layout_rect(node)
    }

    fn layout_rect(&self, node: NodeId) -> Option<Rect> {
        let stored = match self.node(node)?.rect {
            Some(rect) => rect,
            None if node == self.root() => Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
                .translate(self.viewport.scroll.x, self.viewport.scroll.y),
            None => return None,
        };
        if self.viewport_anchored(node) {
            Some(stored)
        } else {
            Some(stored.translate(-self.viewport.scroll.x, -self.viewport.scroll.y))
        }
    }

    fn style(&self, node: NodeId) -> NodeStyle {
        self.node(node)
            .map(|n| NodeStyle {
                position: n.position,
                has_background_image: n.background_image,
                display_none: n.display_none,
                visibility_hidden: n.visibility_hidden,
            })
            .unwrap_or_default()
    }

    fn frame_access(&self, node: NodeId) -> FrameAccess {
        match self.node(node) {
            Some(n) if n.tag == "iframe" && n.cross_origin => FrameAccess::Inaccessible,
            Some(n) if n.tag == "iframe" => FrameAccess::Accessible,
            _ => FrameAccess::NotAFrame,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slots.get(node.0).and_then(|slot| slot.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.slots
            .get(node.0)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    fn is_ad_removed(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.removed_ad)
    }

    fn is_placeholder(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|n| n.class_name.as_deref() == Some(PLACEHOLDER_CLASS))
    }

    fn commit(&mut self, node: NodeId, action: CommitAction) -> Result<(), TreeError> {
        let target = self.node(node).cloned().ok_or(TreeError::UnknownNode(node))?;

        if let CommitAction::ReplaceWithPlaceholder { width, height } = action {
            let parent = self.parent(node).ok_or(TreeError::Detached(node))?;
            let origin = target.rect.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
            let mut spacer = SnapshotNode::new("div").rect(origin.left, origin.top, width, height);
            spacer.position = target.position;
            spacer.class_name = Some(PLACEHOLDER_CLASS.to_string());

            let spacer_id = self.insert(spacer, Some(parent));
            let siblings = &mut self.slots[parent.0].children;
            let at = siblings.iter().position(|id| *id == node).unwrap_or(siblings.len());
            siblings.insert(at, spacer_id);
        }

        let slot = &mut self.slots[node.0];
        slot.node.display_none = true;
        slot.node.removed_ad = true;
        Ok(())
    }
}
