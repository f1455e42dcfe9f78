pub mod classify;
pub mod flip;
pub mod geometry;
pub mod topology;
pub mod triangulate;

// Re-export the types most callers need at the crate root.
pub use classify::collect_connected_components;
pub use flip::flip_triangles;
pub use geometry::point::Point3d;
pub use topology::graph::HalfEdgeGraph;
pub use topology::half_edge::{EdgeMask, HalfEdge, HalfEdgeId};
pub use triangulate::{
    Triangulation, TriangulationError, build_merged_loops, triangulate_single_loop,
    triangulate_with_holes,
};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Areas smaller than this (squared length units) are considered zero.
    pub area: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            area: 1e-14,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &geometry::point::Point3d, b: &geometry::point::Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_area(&self, area: f64) -> bool {
        area.abs() < self.area
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
