use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::geometry::point::Point3d;

new_key_type! {
    pub struct HalfEdgeId;
}

/// Per-half-edge flag bits. Flags are independent per half of an edge pair;
/// operations that want pair-level semantics set them on both mates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeMask(u32);

impl EdgeMask {
    pub const NONE: EdgeMask = EdgeMask(0);
    /// Half-edge lies on an input loop.
    pub const BOUNDARY: EdgeMask = EdgeMask(1 << 0);
    /// Half-edge's face is outside the region of interest.
    pub const EXTERIOR: EdgeMask = EdgeMask(1 << 1);
    /// Half-edge came directly from caller geometry rather than construction.
    pub const PRIMARY: EdgeMask = EdgeMask(1 << 2);
    /// Scratch bit for traversals.
    pub const VISITED: EdgeMask = EdgeMask(1 << 3);
    /// Half-edge's face is a finished triangle.
    pub const TRIANGULATED: EdgeMask = EdgeMask(1 << 4);
    /// Half-edge belongs to a degenerate (fewer than three vertices) hole
    /// loop kept as a Steiner point.
    pub const STEINER: EdgeMask = EdgeMask(1 << 5);

    pub fn contains(self, other: EdgeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: EdgeMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: EdgeMask) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: EdgeMask) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EdgeMask {
    type Output = EdgeMask;
    fn bitor(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EdgeMask {
    fn bitor_assign(&mut self, rhs: EdgeMask) {
        self.0 |= rhs.0;
    }
}

/// One directed half of an edge. The half-edge originates at `point` and
/// runs toward `face_successor`'s origin; `mate` is the opposite direction
/// of the same undirected edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalfEdge {
    pub point: Point3d,
    /// Caller-facing vertex label. Half-edges created by face splits copy
    /// the label of the vertex they sit at.
    pub vertex_id: usize,
    pub mask: EdgeMask,
    pub face_successor: HalfEdgeId,
    pub face_predecessor: HalfEdgeId,
    pub mate: HalfEdgeId,
    /// Transient Morton key for the triangulation's proximity index.
    /// Rebuilt from scratch on every triangulation run, never persisted.
    #[serde(skip)]
    pub(crate) z_key: u32,
    #[serde(skip)]
    pub(crate) prev_z: Option<HalfEdgeId>,
    #[serde(skip)]
    pub(crate) next_z: Option<HalfEdgeId>,
}

impl HalfEdge {
    /// A fresh half-edge linked entirely to itself. The graph rewires the
    /// links immediately after insertion.
    pub(crate) fn isolated(point: Point3d, vertex_id: usize, key: HalfEdgeId) -> Self {
        Self {
            point,
            vertex_id,
            mask: EdgeMask::NONE,
            face_successor: key,
            face_predecessor: key,
            mate: key,
            z_key: 0,
            prev_z: None,
            next_z: None,
        }
    }
}
