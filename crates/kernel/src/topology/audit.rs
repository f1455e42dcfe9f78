use tracing::{info, instrument};

use super::graph::HalfEdgeGraph;
use super::half_edge::HalfEdgeId;

/// Result of a structural consistency check over a half-edge graph.
#[derive(Debug, Clone)]
pub struct GraphAudit {
    pub mates_consistent: bool,
    pub face_loops_closed: bool,
    pub vertex_loops_closed: bool,
    /// Face loops with fewer than three half-edges. Legal for freshly
    /// created pairs and degenerate slits, so reported as a count rather
    /// than an error.
    pub short_faces: usize,
    pub errors: Vec<GraphAuditError>,
}

#[derive(Debug, Clone)]
pub enum GraphAuditError {
    /// mate(mate(h)) != h, or a half-edge is its own mate.
    MateMismatch { half_edge: HalfEdgeId },
    /// face_predecessor(face_successor(h)) != h.
    LinkMismatch { half_edge: HalfEdgeId },
    /// Walking face successors from this half-edge never returns to it.
    OpenFaceLoop { seed: HalfEdgeId },
    /// Walking vertex successors from this half-edge never returns to it.
    OpenVertexLoop { seed: HalfEdgeId },
}

impl GraphAudit {
    pub fn all_valid(&self) -> bool {
        self.mates_consistent && self.face_loops_closed && self.vertex_loops_closed
    }
}

/// Check every half-edge's link structure. Cost is O(n^2) in the worst case
/// because each loop is walked to completion; intended for tests and
/// debugging, not hot paths.
#[instrument(skip(graph), fields(half_edges = graph.len()))]
pub fn audit_graph(graph: &HalfEdgeGraph) -> GraphAudit {
    let n = graph.len();
    let mut errors = Vec::new();
    let mut mates_consistent = true;
    let mut face_loops_closed = true;
    let mut vertex_loops_closed = true;
    let mut short_faces = 0;

    for (id, he) in &graph.half_edges {
        if he.mate == id || graph.half_edges.get(he.mate).map(|m| m.mate) != Some(id) {
            mates_consistent = false;
            errors.push(GraphAuditError::MateMismatch { half_edge: id });
        }
        if graph.face_predecessor(graph.face_successor(id)) != id {
            face_loops_closed = false;
            errors.push(GraphAuditError::LinkMismatch { half_edge: id });
        }

        // Bounded walks: a closed loop returns to its seed within n steps.
        let mut h = id;
        let mut closed = false;
        for _ in 0..n {
            h = graph.face_successor(h);
            if h == id {
                closed = true;
                break;
            }
        }
        if !closed {
            face_loops_closed = false;
            errors.push(GraphAuditError::OpenFaceLoop { seed: id });
        } else if graph.face_loop_len(id) < 3 {
            short_faces += 1;
        }

        let mut h = id;
        let mut closed = false;
        for _ in 0..n {
            h = graph.vertex_successor(h);
            if h == id {
                closed = true;
                break;
            }
        }
        if !closed {
            vertex_loops_closed = false;
            errors.push(GraphAuditError::OpenVertexLoop { seed: id });
        }
    }

    info!(
        mates_consistent,
        face_loops_closed,
        vertex_loops_closed,
        short_faces,
        error_count = errors.len(),
        "graph audit complete"
    );

    GraphAudit {
        mates_consistent,
        face_loops_closed,
        vertex_loops_closed,
        short_faces,
        errors,
    }
}

impl HalfEdgeGraph {
    /// Convenience wrapper for [`audit_graph`].
    pub fn audit(&self) -> GraphAudit {
        audit_graph(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;

    #[test]
    fn test_audit_empty_graph() {
        let graph = HalfEdgeGraph::new();
        let audit = audit_graph(&graph);
        assert!(audit.all_valid());
        assert!(audit.errors.is_empty());
    }

    #[test]
    fn test_audit_closed_loop() {
        let mut graph = HalfEdgeGraph::new();
        let first = graph.split_edge(None, Point3d::xy(0.0, 0.0), 0);
        let mut base = first;
        base = graph.split_edge(Some(base), Point3d::xy(1.0, 0.0), 1);
        graph.split_edge(Some(base), Point3d::xy(0.0, 1.0), 2);
        let mate = graph.edge_mate(first);
        graph.pinch(first, mate);

        let audit = audit_graph(&graph);
        assert!(audit.all_valid(), "errors: {:?}", audit.errors);
        assert_eq!(audit.short_faces, 0);
    }

    #[test]
    fn test_audit_counts_short_faces() {
        let mut graph = HalfEdgeGraph::new();
        graph.create_edge_pair(Point3d::xy(0.0, 0.0), 0, Point3d::xy(1.0, 0.0), 1);
        let audit = audit_graph(&graph);
        assert!(audit.all_valid());
        assert_eq!(audit.short_faces, 2);
    }
}
