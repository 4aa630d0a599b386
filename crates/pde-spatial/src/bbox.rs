/// Axis-aligned hull of a set of points, in up to 3 dimensions (unused
/// trailing dimensions are pinned at 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self { min: [f64::INFINITY; 3], max: [f64::NEG_INFINITY; 3] }
    }

    pub fn from_points<'a>(points: impl Iterator<Item = &'a [f64; 3]>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.extend(p);
        }
        bbox
    }

    pub fn extend(&mut self, p: &[f64; 3]) {
        for d in 0..3 {
            self.min[d] = self.min[d].min(p[d]);
            self.max[d] = self.max[d].max(p[d]);
        }
    }

    pub fn extents(&self) -> [f64; 3] {
        let mut e = [0.0; 3];
        for d in 0..3 {
            e[d] = self.max[d] - self.min[d];
        }
        e
    }

    pub fn volume(&self, dim: usize) -> f64 {
        self.extents()[..dim].iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_grows_to_contain_every_point() {
        let points = [[0.0, 0.0, 0.0], [10.0, -2.0, 0.0], [3.0, 4.0, 0.0]];
        let bbox = BoundingBox::from_points(points.iter());
        assert_eq!(bbox.min, [0.0, -2.0, 0.0]);
        assert_eq!(bbox.max, [10.0, 4.0, 0.0]);
    }
}
