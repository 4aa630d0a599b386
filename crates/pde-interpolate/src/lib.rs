//! Transfers a field from a source mesh's degrees of freedom to arbitrary
//! destination coordinates.

use pde_comm::Comm;
use pde_mesh::{Dictionary, UnifiedElements};
use pde_spatial::Octree;
use pde_table::Table;

const NOT_FOUND: u64 = u64::MAX;

/// The source side of an interpolation: an octree over a mesh's volume
/// elements, the dictionary holding the field to sample, and the field's
/// name.
pub struct InterpolationSource<'a> {
    pub octree: &'a Octree,
    pub unified: &'a UnifiedElements<'a>,
    pub node_coords: &'a Table<f64>,
    pub dictionary: &'a Dictionary,
    pub field_name: &'a str,
}

impl<'a> InterpolationSource<'a> {
    /// Locates `point` and, if found, returns the shape-function-weighted
    /// sum of the field at its element's degrees of freedom.
    fn sample_locally(&self, point: &[f64; 3]) -> Option<Vec<f64>> {
        let idx = self.octree.find_element(point, self.unified, self.node_coords)?;
        let (entities, local) = self.unified.get(idx);
        let space = self.dictionary.space(&entities.name).ok()?;
        let field = self.dictionary.field(self.field_name).ok()?;
        let width = field.descriptor.total_width();

        let elem_coords = entities.element_coords(local, self.node_coords);
        let local_coord = entities.shape.local_coord(point, &elem_coords)?;
        let weights = entities.shape.values_at(&local_coord);
        let dofs = space.dof_indices(local);

        let mut value = vec![0.0; width];
        for (&w, &dof) in weights.iter().zip(dofs) {
            let row = field.data.get_row(dof as usize).ok()?;
            for (acc, v) in value.iter_mut().zip(row) {
                *acc += w * v;
            }
        }
        Some(value)
    }

    fn field_width(&self) -> usize {
        self.dictionary.field(self.field_name).map(|f| f.descriptor.total_width()).unwrap_or(0)
    }
}

/// Interpolates `source`'s field at every point in `dest_coords`. Points not
/// found on this rank are resolved via a broadcast round robin: each rank in
/// turn broadcasts its still-missing points, every rank replies with its
/// locally sampled value (or a not-found sentinel), and a rank-id
/// min-reduction breaks ties deterministically. Points unresolved on every
/// rank come back as zero, with a warning.
pub fn interpolate(source: &InterpolationSource<'_>, dest_coords: &[[f64; 3]], comm: &dyn Comm) -> Vec<Vec<f64>> {
    let width = source.field_width();
    let mut results: Vec<Option<Vec<f64>>> = vec![None; dest_coords.len()];
    let mut missing_indices = Vec::new();

    for (i, p) in dest_coords.iter().enumerate() {
        match source.sample_locally(p) {
            Some(v) => results[i] = Some(v),
            None => missing_indices.push(i),
        }
    }

    for r in 0..comm.size() {
        let my_missing_flat: Vec<f64> = if comm.rank() == r {
            missing_indices.iter().flat_map(|&i| dest_coords[i]).collect()
        } else {
            Vec::new()
        };
        let flat = comm.broadcast_f64(&my_missing_flat, r);
        let n_points = flat.len() / 3;

        let mut found_flags = Vec::with_capacity(n_points);
        let mut value_flat = Vec::with_capacity(n_points * width);
        for i in 0..n_points {
            let p = [flat[3 * i], flat[3 * i + 1], flat[3 * i + 2]];
            match source.sample_locally(&p) {
                Some(v) => {
                    found_flags.push(comm.rank() as u64);
                    value_flat.extend(v);
                }
                None => {
                    found_flags.push(NOT_FOUND);
                    value_flat.extend(std::iter::repeat(0.0).take(width));
                }
            }
        }

        let gathered_flags = comm.gather_u64(&found_flags, r);
        let gathered_values = comm.gather_f64(&value_flat, r);

        if let (Some(flags), Some(values)) = (gathered_flags, gathered_values) {
            for (local_i, &dest_i) in missing_indices.iter().enumerate() {
                let owner = (0..comm.size()).map(|k| flags[k * n_points + local_i]).min().unwrap_or(NOT_FOUND);
                if owner == NOT_FOUND {
                    tracing::warn!(point = ?dest_coords[dest_i], "interpolation point not found on any rank, defaulting to zero");
                    results[dest_i] = Some(vec![0.0; width]);
                } else {
                    let owner = owner as usize;
                    let start = owner * n_points * width + local_i * width;
                    results[dest_i] = Some(values[start..start + width].to_vec());
                }
            }
        }
    }

    results.into_iter().map(|v| v.unwrap_or_else(|| vec![0.0; width])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_mesh::{BilinearQuad, Dimensionality, Entities, Mesh, Space, VariablesDescriptor};
    use pde_comm::LocalCluster;
    use std::sync::Arc;

    fn unit_square_mesh_with_field() -> Mesh {
        let mut mesh = Mesh::new(2, 0);
        mesh.geometry.resize(4);
        let coords = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (i, c) in coords.iter().enumerate() {
            let row = mesh.geometry.coordinates.get_row_mut(i).unwrap();
            row[0] = c[0];
            row[1] = c[1];
        }
        let mut descriptor = VariablesDescriptor::new();
        descriptor.push("u", Dimensionality::Scalar);
        let field = mesh.geometry.create_field("solution", descriptor);
        for (i, v) in [1.0, 3.0, 5.0, 7.0].iter().enumerate() {
            field.data.set_row(i, &[*v]).unwrap();
        }

        let mut quad = Entities::new("quad", Arc::new(BilinearQuad), true);
        quad.resize(1);
        let row = quad.node_connectivity.get_row_mut(0).unwrap();
        row[0] = 0;
        row[1] = 1;
        row[2] = 2;
        row[3] = 3;

        let mut space = Space::new(Arc::new(BilinearQuad));
        space.connectivity.resize(1);
        space.connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        mesh.geometry.add_space("quad", space);

        mesh.topology.add_entities(quad);
        mesh
    }

    #[test]
    fn single_rank_interpolation_reproduces_bilinear_values() {
        let mesh = unit_square_mesh_with_field();
        let unified = mesh.unified_volume_elements();
        let octree = pde_spatial::Octree::build_from(&unified, &mesh.geometry.coordinates, 2, pde_spatial::CellCounts::Explicit([1, 1, 1]));
        let source = InterpolationSource {
            octree: &octree,
            unified: &unified,
            node_coords: &mesh.geometry.coordinates,
            dictionary: &mesh.geometry,
            field_name: "solution",
        };

        let cluster = LocalCluster::new(1);
        let comm = cluster.comm(0);
        let values = interpolate(&source, &[[0.5, 0.5, 0.0]], &comm);
        assert_eq!(values.len(), 1);
        assert!((values[0][0] - 4.0).abs() < 1e-9);
    }
}
