/// The element-shape-function library is treated as an external
/// collaborator; this trait is the seam the core consumes it through. It
/// ships one concrete, deliberately minimal implementation ([`BilinearQuad`])
/// so the spatial index and interpolation layers have something real to test
/// against.
pub trait ShapeFunction: Send + Sync {
    fn nb_nodes(&self) -> usize;
    fn dim(&self) -> usize;

    fn centroid(&self, coords: &[[f64; 3]]) -> [f64; 3];

    fn is_coord_in_element(&self, point: &[f64; 3], coords: &[[f64; 3]]) -> bool;

    /// Maps a global coordinate to local (reference) coordinates, e.g. via
    /// Newton iteration. `None` if the element's mapping does not converge
    /// or `point` falls outside it.
    fn local_coord(&self, point: &[f64; 3], coords: &[[f64; 3]]) -> Option<Vec<f64>>;

    /// Shape function values at a local coordinate; `len() == nb_nodes()`.
    fn values_at(&self, local: &[f64]) -> Vec<f64>;
}

/// Axis-ordered 4-node bilinear quadrilateral (nodes wound counter-clockwise
/// starting from the corner nearest the origin). Good enough to exercise the
/// octree, stencil and interpolation layers against a structured 2-D mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearQuad;

impl ShapeFunction for BilinearQuad {
    fn nb_nodes(&self) -> usize {
        4
    }

    fn dim(&self) -> usize {
        2
    }

    fn centroid(&self, coords: &[[f64; 3]]) -> [f64; 3] {
        let mut c = [0.0; 3];
        for p in coords {
            for d in 0..3 {
                c[d] += p[d];
            }
        }
        for v in &mut c {
            *v /= coords.len() as f64;
        }
        c
    }

    fn is_coord_in_element(&self, point: &[f64; 3], coords: &[[f64; 3]]) -> bool {
        // Convex-polygon point test via same-sign cross products along the
        // CCW-wound boundary.
        let n = coords.len();
        let mut sign = 0.0;
        for i in 0..n {
            let a = coords[i];
            let b = coords[(i + 1) % n];
            let edge = [b[0] - a[0], b[1] - a[1]];
            let to_point = [point[0] - a[0], point[1] - a[1]];
            let cross = edge[0] * to_point[1] - edge[1] * to_point[0];
            if cross.abs() < 1e-12 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    fn local_coord(&self, point: &[f64; 3], coords: &[[f64; 3]]) -> Option<Vec<f64>> {
        // Valid for axis-aligned rectangles: a closed-form inverse, no
        // Newton iteration required.
        let xmin = coords.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let xmax = coords.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
        let ymin = coords.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let ymax = coords.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);
        if xmax <= xmin || ymax <= ymin {
            return None;
        }
        let xi = 2.0 * (point[0] - xmin) / (xmax - xmin) - 1.0;
        let eta = 2.0 * (point[1] - ymin) / (ymax - ymin) - 1.0;
        Some(vec![xi, eta])
    }

    fn values_at(&self, local: &[f64]) -> Vec<f64> {
        let (xi, eta) = (local[0], local[1]);
        vec![
            0.25 * (1.0 - xi) * (1.0 - eta),
            0.25 * (1.0 + xi) * (1.0 - eta),
            0.25 * (1.0 + xi) * (1.0 + eta),
            0.25 * (1.0 - xi) * (1.0 + eta),
        ]
    }
}
