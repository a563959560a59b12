//! In-memory scene graph.
//!
//! Nodes are stored in paint order: a node added later is drawn above
//! every node added before it, and a child is always added after its
//! parent. This is enough to answer the hit resolver's queries without a
//! real UI toolkit behind it.

use serde::{Deserialize, Serialize};

use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::geometry::{Rect, ViewportSize};

use crate::hit_test::{SceneQuery, TaggableElement};

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One element of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Human-readable name, for logs and debugging.
    pub name: String,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// A selectable tile in the demo grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub id: String,
    pub label: String,
    /// Base color as `#RRGGBB`.
    pub color: String,
}

impl TileSpec {
    pub fn new(id: &str, label: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// The twelve tiles of the demo board.
pub fn default_tiles() -> Vec<TileSpec> {
    [
        ("t1", "Red", "#FCA5A5"),
        ("t2", "Yellow", "#FDE68A"),
        ("t3", "Green", "#86EFAC"),
        ("t4", "Blue", "#93C5FD"),
        ("t5", "Indigo", "#C4B5FD"),
        ("t6", "Pink", "#F9A8D4"),
        ("t7", "Orange", "#FDBA74"),
        ("t8", "Teal", "#A7F3D0"),
        ("t9", "Sky", "#BFDBFE"),
        ("t10", "Violet", "#DDD6FE"),
        ("t11", "Rose", "#FBCFE8"),
        ("t12", "Lime", "#BBF7D0"),
    ]
    .into_iter()
    .map(|(id, label, color)| TileSpec::new(id, label, color))
    .collect()
}

/// Layout parameters for [`SceneGraph::tile_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: usize,
    /// Space around the grid, in pixels.
    pub padding: f64,
    /// Space between tiles, in pixels.
    pub gap: f64,
    /// Inset of each tile's label from the tile edges.
    pub label_inset: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            padding: 24.0,
            gap: 16.0,
            label_inset: 12.0,
        }
    }
}

/// Arena-backed scene graph in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SceneNode>", into = "Vec<SceneNode>")]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an explicit node list, checking that every parent
    /// precedes its children.
    pub fn from_nodes(nodes: Vec<SceneNode>) -> GazeResult<Self> {
        for (idx, node) in nodes.iter().enumerate() {
            if let Some(NodeId(parent)) = node.parent {
                if parent >= idx {
                    return Err(GazeError::config(format!(
                        "scene node {idx} ({}) must come after its parent {parent}",
                        node.name
                    )));
                }
            }
        }
        Ok(Self { nodes })
    }

    /// Add a top-level node.
    pub fn add_root(&mut self, name: impl Into<String>, rect: Rect) -> NodeId {
        self.push(name.into(), rect, None)
    }

    /// Add a node inside `parent`, painted above everything added so far.
    ///
    /// A `parent` that does not exist yet makes the node a root.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, rect: Rect) -> NodeId {
        let parent = (parent.0 < self.nodes.len()).then_some(parent);
        self.push(name.into(), rect, parent)
    }

    pub fn set_tile(&mut self, id: NodeId, tag: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.tile = Some(tag.into());
        }
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.visible = visible;
        }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef {
            graph: self,
            index: id.0,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rectangle of the first node carrying `tag`.
    pub fn tile_rect(&self, tag: &str) -> Option<Rect> {
        self.nodes
            .iter()
            .find(|n| n.tile.as_deref() == Some(tag))
            .map(|n| n.rect)
    }

    /// Lay tiles out in rows of `layout.columns` filling the viewport.
    ///
    /// Each tile is a tagged node with an untagged label child, all inside
    /// an untagged board that covers the viewport.
    pub fn tile_grid(viewport: ViewportSize, tiles: &[TileSpec], layout: GridLayout) -> Self {
        let mut graph = SceneGraph::new();
        let board = graph.add_root("board", viewport.bounds());
        if tiles.is_empty() {
            return graph;
        }

        let columns = layout.columns.max(1);
        let rows = tiles.len().div_ceil(columns);
        let inner = viewport.bounds().inset(layout.padding);
        let tile_w = (inner.width - layout.gap * (columns - 1) as f64) / columns as f64;
        let tile_h = (inner.height - layout.gap * (rows - 1) as f64) / rows as f64;

        for (idx, tile) in tiles.iter().enumerate() {
            let col = idx % columns;
            let row = idx / columns;
            let rect = Rect::new(
                inner.left + col as f64 * (tile_w + layout.gap),
                inner.top + row as f64 * (tile_h + layout.gap),
                tile_w,
                tile_h,
            );
            let node = graph.add_child(board, format!("tile {}", tile.id), rect);
            graph.set_tile(node, tile.id.clone());
            graph.add_child(node, format!("label {}", tile.label), rect.inset(layout.label_inset));
        }

        graph
    }

    fn push(&mut self, name: String, rect: Rect, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name,
            rect,
            tile: None,
            parent,
            visible: true,
        });
        id
    }

    fn is_rendered(&self, index: usize) -> bool {
        let mut current = Some(index);
        while let Some(idx) = current {
            let Some(node) = self.nodes.get(idx) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent.map(|p| p.0);
        }
        true
    }
}

impl TryFrom<Vec<SceneNode>> for SceneGraph {
    type Error = GazeError;

    fn try_from(nodes: Vec<SceneNode>) -> Result<Self, Self::Error> {
        SceneGraph::from_nodes(nodes)
    }
}

impl From<SceneGraph> for Vec<SceneNode> {
    fn from(graph: SceneGraph) -> Self {
        graph.nodes
    }
}

/// Borrowed handle to a node.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    graph: &'a SceneGraph,
    index: usize,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        NodeId(self.index)
    }

    pub fn node(&self) -> &'a SceneNode {
        &self.graph.nodes[self.index]
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }
}

impl TaggableElement for NodeRef<'_> {
    fn tile_tag(&self) -> Option<&str> {
        self.node().tile.as_deref()
    }

    fn parent(&self) -> Option<Self> {
        self.node().parent.and_then(|p| self.graph.get(p))
    }
}

impl SceneQuery for SceneGraph {
    type Element<'a> = NodeRef<'a>;

    fn element_at(&self, x: f64, y: f64) -> Option<NodeRef<'_>> {
        (0..self.nodes.len())
            .rev()
            .find(|&idx| self.nodes[idx].rect.contains(x, y) && self.is_rendered(idx))
            .map(|index| NodeRef { graph: self, index })
    }

    fn bounding_rect(&self, element: &NodeRef<'_>) -> Rect {
        element.node().rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit_test::{resolve, HitResult};

    fn demo_grid() -> SceneGraph {
        SceneGraph::tile_grid(
            ViewportSize::new(1000.0, 700.0),
            &default_tiles(),
            GridLayout {
                columns: 4,
                padding: 20.0,
                gap: 20.0,
                label_inset: 10.0,
            },
        )
    }

    #[test]
    fn test_tile_grid_structure() {
        let graph = demo_grid();
        // board + 12 tiles + 12 labels
        assert_eq!(graph.len(), 25);

        // inner 960x660, 4 columns => tile width 225, 3 rows => tile height 206.67
        let t1 = graph.tile_rect("t1").unwrap();
        assert_eq!(t1.left, 20.0);
        assert_eq!(t1.top, 20.0);
        assert!((t1.width - 225.0).abs() < 1e-9);

        let t12 = graph.tile_rect("t12").unwrap();
        assert!((t12.right() - 980.0).abs() < 1e-9);
        assert!((t12.bottom() - 680.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_resolves_to_enclosing_tile() {
        let graph = demo_grid();
        let t6 = graph.tile_rect("t6").unwrap();
        let center = t6.center();

        let leaf = graph.element_at(center.x, center.y).unwrap();
        assert!(leaf.name().starts_with("label"));
        assert_eq!(leaf.tile_tag(), None);

        let hit = resolve(center.x, center.y, &graph);
        assert_eq!(hit.element_id.as_deref(), Some("t6"));
        assert_eq!(hit.bounding_rect, Some(t6.inset(10.0)));
    }

    #[test]
    fn test_gap_hits_untagged_board() {
        let graph = demo_grid();
        // Between t1 and t2 horizontally.
        let hit = resolve(255.0, 100.0, &graph);
        assert_eq!(hit.element_id, None);
        assert_eq!(hit.bounding_rect, Some(Rect::new(0.0, 0.0, 1000.0, 700.0)));
    }

    #[test]
    fn test_outside_viewport_is_nothing() {
        let graph = demo_grid();
        assert_eq!(resolve(-5.0, 10.0, &graph), HitResult::NONE);
        assert_eq!(resolve(1200.0, 10.0, &graph), HitResult::NONE);
    }

    #[test]
    fn test_hidden_subtree_is_skipped() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root("root", Rect::new(0.0, 0.0, 100.0, 100.0));
        graph.set_tile(root, "base");
        let overlay = graph.add_child(root, "overlay", Rect::new(0.0, 0.0, 50.0, 50.0));
        graph.set_tile(overlay, "popup");
        graph.add_child(overlay, "button", Rect::new(10.0, 10.0, 10.0, 10.0));

        assert_eq!(resolve(15.0, 15.0, &graph).element_id.as_deref(), Some("popup"));

        graph.set_visible(overlay, false);
        let hit = resolve(15.0, 15.0, &graph);
        assert_eq!(hit.element_id.as_deref(), Some("base"));
        assert_eq!(hit.bounding_rect, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_from_nodes_rejects_forward_parent() {
        let nodes = vec![SceneNode {
            name: "orphan".into(),
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            tile: None,
            parent: Some(NodeId(3)),
            visible: true,
        }];
        assert!(SceneGraph::from_nodes(nodes).is_err());
    }

    #[test]
    fn test_scene_json_roundtrip_preserves_hits() {
        let graph = demo_grid();
        let json = serde_json::to_string(&graph).unwrap();
        let loaded: SceneGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_scene_json_minimal_nodes() {
        let json = r#"[
            {"name": "root", "rect": {"left": 0, "top": 0, "width": 10, "height": 10}},
            {"name": "a", "rect": {"left": 0, "top": 0, "width": 5, "height": 5}, "tile": "a", "parent": 0}
        ]"#;
        let graph: SceneGraph = serde_json::from_str(json).unwrap();
        assert_eq!(resolve(1.0, 1.0, &graph).element_id.as_deref(), Some("a"));
        assert_eq!(resolve(7.0, 7.0, &graph).element_id, None);
    }
}
