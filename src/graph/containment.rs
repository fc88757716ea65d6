use super::NodeId;
use ahash::AHashMap;

/// An axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Whether `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Bounds) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.left + other.width <= self.left + self.width
            && other.top + other.height <= self.top + self.height
    }
}

/// A candidate container: an iterator node's content box plus its layout
/// ceiling and the stamp of its last geometry edit.
#[derive(Debug, Clone)]
pub struct IteratorBox {
    pub id: NodeId,
    pub bounds: Bounds,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
    pub touch: u64,
}

/// A candidate child: any non-iterator node's bounding box.
#[derive(Debug, Clone)]
pub struct NodeBox {
    pub id: NodeId,
    pub bounds: Bounds,
}

/// Computes the parent assignment for every candidate child.
///
/// A node is a child of an iterator when its box, after clamping its size
/// to the iterator's `max_width`/`max_height` ceiling, lies entirely within
/// the iterator's content box. When several overlapping iterators qualify,
/// the most recently touched one wins (highest `touch` stamp, ties broken
/// by id), so reassignment is deterministic. The function is pure and
/// idempotent: unchanged geometry yields an unchanged assignment.
pub fn assign_parents(
    iterators: &[IteratorBox],
    nodes: &[NodeBox],
) -> AHashMap<NodeId, Option<NodeId>> {
    let mut assignment = AHashMap::with_capacity(nodes.len());
    for node in nodes {
        let parent = iterators
            .iter()
            .filter(|it| {
                let clamped = Bounds {
                    left: node.bounds.left,
                    top: node.bounds.top,
                    width: match it.max_width {
                        Some(max) => node.bounds.width.min(max),
                        None => node.bounds.width,
                    },
                    height: match it.max_height {
                        Some(max) => node.bounds.height.min(max),
                        None => node.bounds.height,
                    },
                };
                it.bounds.contains(&clamped)
            })
            .max_by(|a, b| a.touch.cmp(&b.touch).then_with(|| a.id.cmp(&b.id)))
            .map(|it| it.id.clone());
        assignment.insert(node.id.clone(), parent);
    }
    assignment
}
