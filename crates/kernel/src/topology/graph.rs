use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::debug;

use super::half_edge::{EdgeMask, HalfEdge, HalfEdgeId};
use crate::geometry::point::Point3d;

// ─── Graph Container ─────────────────────────────────────────────────────────

/// Arena-based planar half-edge graph. Connectivity is carried entirely by
/// the per-node `face_successor` / `face_predecessor` / `mate` links; faces
/// and vertices exist only as the cycles those links trace out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HalfEdgeGraph {
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
}

impl HalfEdgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.half_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.half_edges.is_empty()
    }

    pub fn half_edge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.half_edges.keys()
    }

    pub fn node(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id]
    }

    pub fn point(&self, id: HalfEdgeId) -> Point3d {
        self.half_edges[id].point
    }

    pub fn face_successor(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id].face_successor
    }

    pub fn face_predecessor(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id].face_predecessor
    }

    pub fn edge_mate(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id].mate
    }

    /// Next outbound half-edge around this half-edge's origin vertex.
    pub fn vertex_successor(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.edge_mate(self.face_predecessor(id))
    }

    /// Previous outbound half-edge around this half-edge's origin vertex.
    pub fn vertex_predecessor(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.face_successor(self.edge_mate(id))
    }

    // ─── Construction Primitives ─────────────────────────────────────────────

    /// Create a mated pair of half-edges forming a trivial one-edge face
    /// loop: each half is the other's successor, predecessor, and mate.
    /// Returns the half at `point_a`; its mate sits at `point_b`.
    pub fn create_edge_pair(
        &mut self,
        point_a: Point3d,
        id_a: usize,
        point_b: Point3d,
        id_b: usize,
    ) -> HalfEdgeId {
        let a = self
            .half_edges
            .insert_with_key(|key| HalfEdge::isolated(point_a, id_a, key));
        let b = self
            .half_edges
            .insert_with_key(|key| HalfEdge::isolated(point_b, id_b, key));
        self.half_edges[a].face_successor = b;
        self.half_edges[a].face_predecessor = b;
        self.half_edges[a].mate = b;
        self.half_edges[b].face_successor = a;
        self.half_edges[b].face_predecessor = a;
        self.half_edges[b].mate = a;
        a
    }

    /// Insert a new vertex at `point` after `base`'s origin, splitting the
    /// edge that `base` begins. With `base == None` the pair forms an
    /// isolated one-edge loop with both halves at `point`.
    ///
    /// Returns the new half-edge originating at `point` on `base`'s side.
    pub fn split_edge(
        &mut self,
        base: Option<HalfEdgeId>,
        point: Point3d,
        vertex_id: usize,
    ) -> HalfEdgeId {
        let a = self.create_edge_pair(point, vertex_id, point, vertex_id);
        let Some(base) = base else {
            return a;
        };
        let b = self.half_edges[a].mate;

        let base_successor = self.half_edges[base].face_successor;
        let mate = self.half_edges[base].mate;
        let mate_successor = self.half_edges[mate].face_successor;

        self.link_face(base, a);
        self.link_face(a, base_successor);
        self.link_face(mate, b);
        self.link_face(b, mate_successor);

        self.link_mates(base, b);
        self.link_mates(a, mate);
        a
    }

    fn link_face(&mut self, from: HalfEdgeId, to: HalfEdgeId) {
        self.half_edges[from].face_successor = to;
        self.half_edges[to].face_predecessor = from;
    }

    fn link_mates(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        self.half_edges[a].mate = b;
        self.half_edges[b].mate = a;
    }

    /// Exchange the face-predecessor links of `a` and `b`.
    ///
    /// If `a` and `b` sit on the same face loop the loop splits in two; if
    /// they sit on different loops the loops merge. The operation is its own
    /// inverse and does not touch mate links or coordinates.
    pub fn pinch(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        if a == b {
            return;
        }
        let pred_a = self.half_edges[a].face_predecessor;
        let pred_b = self.half_edges[b].face_predecessor;
        self.half_edges[a].face_predecessor = pred_b;
        self.half_edges[b].face_predecessor = pred_a;
        self.half_edges[pred_a].face_successor = b;
        self.half_edges[pred_b].face_successor = a;
    }

    /// Join the origins of `a` and `b` with a new edge pair.
    ///
    /// When `a` and `b` share a face loop this cuts the face in two along
    /// the new edge; when they sit on different loops it merges the loops
    /// through a zero-width slit. Returns the new half-edge at `b`'s origin,
    /// which lands on the loop still containing `a`.
    pub fn split_face(&mut self, a: HalfEdgeId, b: HalfEdgeId) -> HalfEdgeId {
        let (pa, ia) = {
            let n = &self.half_edges[a];
            (n.point, n.vertex_id)
        };
        let (pb, ib) = {
            let n = &self.half_edges[b];
            (n.point, n.vertex_id)
        };
        let a2 = self.create_edge_pair(pa, ia, pb, ib);
        let b2 = self.half_edges[a2].mate;
        self.pinch(a, a2);
        self.pinch(b, b2);
        b2
    }

    /// Detach `id` from its face loop, leaving it as an isolated self-loop.
    /// The surrounding loop heals around the gap.
    pub fn yank(&mut self, id: HalfEdgeId) {
        let successor = self.half_edges[id].face_successor;
        self.pinch(id, successor);
    }

    /// Remove a mated pair from the graph entirely. Both face loops heal
    /// around the excised halves. Masks and coordinates of the survivors
    /// are left untouched; callers needing coordinate fixups do them first.
    pub fn remove_edge_pair(&mut self, id: HalfEdgeId) {
        let mate = self.half_edges[id].mate;
        debug!(?id, ?mate, "removing edge pair");
        self.yank(id);
        self.yank(mate);
        self.half_edges.remove(id);
        self.half_edges.remove(mate);
    }

    // ─── Mask Operations ─────────────────────────────────────────────────────

    pub fn set_mask(&mut self, id: HalfEdgeId, mask: EdgeMask) {
        self.half_edges[id].mask.insert(mask);
    }

    pub fn clear_mask(&mut self, id: HalfEdgeId, mask: EdgeMask) {
        self.half_edges[id].mask.remove(mask);
    }

    pub fn is_mask_set(&self, id: HalfEdgeId, mask: EdgeMask) -> bool {
        self.half_edges[id].mask.intersects(mask)
    }

    pub fn set_mask_around_face(&mut self, seed: HalfEdgeId, mask: EdgeMask) {
        let mut h = seed;
        loop {
            self.half_edges[h].mask.insert(mask);
            h = self.half_edges[h].face_successor;
            if h == seed {
                break;
            }
        }
    }

    pub fn clear_mask_around_face(&mut self, seed: HalfEdgeId, mask: EdgeMask) {
        let mut h = seed;
        loop {
            self.half_edges[h].mask.remove(mask);
            h = self.half_edges[h].face_successor;
            if h == seed {
                break;
            }
        }
    }

    pub fn set_mask_around_vertex(&mut self, seed: HalfEdgeId, mask: EdgeMask) {
        let mut h = seed;
        loop {
            self.half_edges[h].mask.insert(mask);
            h = self.vertex_successor(h);
            if h == seed {
                break;
            }
        }
    }

    pub fn clear_mask_around_vertex(&mut self, seed: HalfEdgeId, mask: EdgeMask) {
        let mut h = seed;
        loop {
            self.half_edges[h].mask.remove(mask);
            h = self.vertex_successor(h);
            if h == seed {
                break;
            }
        }
    }

    pub fn clear_mask_all(&mut self, mask: EdgeMask) {
        for (_, he) in self.half_edges.iter_mut() {
            he.mask.remove(mask);
        }
    }

    // ─── Loop Traversal ──────────────────────────────────────────────────────

    pub fn face_loop(&self, seed: HalfEdgeId) -> FaceLoopIter<'_> {
        FaceLoopIter {
            graph: self,
            seed,
            current: Some(seed),
        }
    }

    pub fn vertex_loop(&self, seed: HalfEdgeId) -> VertexLoopIter<'_> {
        VertexLoopIter {
            graph: self,
            seed,
            current: Some(seed),
        }
    }

    pub fn face_loop_len(&self, seed: HalfEdgeId) -> usize {
        self.face_loop(seed).count()
    }

    /// Signed shoelace area of the face loop through `seed`, positive for
    /// counter-clockwise loops.
    pub fn signed_face_area(&self, seed: HalfEdgeId) -> f64 {
        let mut sum = 0.0;
        let mut h = seed;
        loop {
            let next = self.half_edges[h].face_successor;
            let p = self.half_edges[h].point;
            let q = self.half_edges[next].point;
            sum += p.x * q.y - q.x * p.y;
            h = next;
            if h == seed {
                break;
            }
        }
        0.5 * sum
    }
}

impl std::ops::Index<HalfEdgeId> for HalfEdgeGraph {
    type Output = HalfEdge;
    fn index(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id]
    }
}

pub struct FaceLoopIter<'a> {
    graph: &'a HalfEdgeGraph,
    seed: HalfEdgeId,
    current: Option<HalfEdgeId>,
}

impl Iterator for FaceLoopIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let current = self.current?;
        let next = self.graph.face_successor(current);
        self.current = if next == self.seed { None } else { Some(next) };
        Some(current)
    }
}

pub struct VertexLoopIter<'a> {
    graph: &'a HalfEdgeGraph,
    seed: HalfEdgeId,
    current: Option<HalfEdgeId>,
}

impl Iterator for VertexLoopIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let current = self.current?;
        let next = self.graph.vertex_successor(current);
        self.current = if next == self.seed { None } else { Some(next) };
        Some(current)
    }
}
