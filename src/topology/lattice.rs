//! Regular lattices: 3D cubic (face or Moore neighborhood) and 2D axial hex.
//!
//! Cubic nodes are laid out row-major in z,y,x order (x changes fastest), hex
//! nodes in r,q order. Boundary nodes simply have fewer in-bounds neighbors.

use crate::error::{FieldError, Result};

use super::{Topology, TopologyKind};

/// Neighborhood used by the cubic lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// 6 axial neighbors.
    Face,
    /// 26 neighbors (3x3x3 cube excluding the center).
    Moore,
}

impl Connectivity {
    pub fn degree(self) -> usize {
        match self {
            Connectivity::Face => 6,
            Connectivity::Moore => 26,
        }
    }

    fn offsets(self) -> Vec<[i64; 3]> {
        match self {
            Connectivity::Face => vec![
                [1, 0, 0],
                [-1, 0, 0],
                [0, 1, 0],
                [0, -1, 0],
                [0, 0, 1],
                [0, 0, -1],
            ],
            Connectivity::Moore => {
                let mut offsets = Vec::with_capacity(26);
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            // Skip the center cell
                            if dx == 0 && dy == 0 && dz == 0 {
                                continue;
                            }
                            offsets.push([dx, dy, dz]);
                        }
                    }
                }
                offsets
            }
        }
    }
}

/// Axial hex neighbor offsets `(dq, dr)`, counter-clockwise from +q.
const HEX_OFFSETS: [[i64; 2]; 6] = [[1, 0], [1, -1], [0, -1], [-1, 0], [-1, 1], [0, 1]];

/// Calculate the linear index for a 3D coordinate.
#[inline]
pub fn index_of(width: usize, height: usize, x: usize, y: usize, z: usize) -> usize {
    z * height * width + y * width + x
}

/// Check if signed coordinates are within lattice bounds.
#[inline]
pub fn in_bounds(dims: [usize; 3], x: i64, y: i64, z: i64) -> bool {
    x >= 0
        && (x as usize) < dims[0]
        && y >= 0
        && (y as usize) < dims[1]
        && z >= 0
        && (z as usize) < dims[2]
}

fn unit(v: [f64; 3]) -> [f64; 3] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / norm, v[1] / norm, v[2] / norm]
}

fn check_extent(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        Err(FieldError::config(format!("lattice {name} must be positive")))
    } else {
        Ok(())
    }
}

impl Topology {
    /// Cubic lattice of `width * height * depth` nodes.
    pub fn cubic(
        width: usize,
        height: usize,
        depth: usize,
        connectivity: Connectivity,
    ) -> Result<Self> {
        check_extent("width", width)?;
        check_extent("height", height)?;
        check_extent("depth", depth)?;
        let dims = [width, height, depth];
        let size = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(depth))
            .ok_or_else(|| FieldError::config("lattice size overflows usize"))?;

        let offsets = connectivity.offsets();
        let units: Vec<[f64; 3]> = offsets
            .iter()
            .map(|o| unit([o[0] as f64, o[1] as f64, o[2] as f64]))
            .collect();

        let mut lists = Vec::with_capacity(size);
        let mut directions = Vec::with_capacity(size);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let mut neighbors = Vec::with_capacity(offsets.len());
                    let mut dirs = Vec::with_capacity(offsets.len());
                    for (offset, dir) in offsets.iter().zip(&units) {
                        let nx = x as i64 + offset[0];
                        let ny = y as i64 + offset[1];
                        let nz = z as i64 + offset[2];
                        if in_bounds(dims, nx, ny, nz) {
                            neighbors.push(index_of(
                                width,
                                height,
                                nx as usize,
                                ny as usize,
                                nz as usize,
                            ));
                            dirs.push(*dir);
                        }
                    }
                    lists.push(neighbors);
                    directions.push(dirs);
                }
            }
        }

        Ok(Self::from_parts(
            TopologyKind::Cubic {
                width,
                height,
                depth,
                connectivity,
            },
            connectivity.degree(),
            lists,
            Some(directions),
        ))
    }

    /// Regular 3D lattice graph where each node links to its 6 axial neighbors.
    pub fn lattice_graph(width: usize, height: usize, depth: usize) -> Result<Self> {
        Self::cubic(width, height, depth, Connectivity::Face)
    }

    /// Rhombic patch of an axial-coordinate hex lattice, `width` columns (q) by
    /// `height` rows (r).
    pub fn hex(width: usize, height: usize) -> Result<Self> {
        check_extent("width", width)?;
        check_extent("height", height)?;
        let dims = [width, height, 1];
        let half_sqrt3 = 3f64.sqrt() / 2.0;

        let mut lists = Vec::with_capacity(width * height);
        let mut directions = Vec::with_capacity(width * height);
        for r in 0..height {
            for q in 0..width {
                let mut neighbors = Vec::with_capacity(6);
                let mut dirs = Vec::with_capacity(6);
                for [dq, dr] in HEX_OFFSETS {
                    let nq = q as i64 + dq;
                    let nr = r as i64 + dr;
                    if in_bounds(dims, nq, nr, 0) {
                        neighbors.push(nr as usize * width + nq as usize);
                        // axial -> cartesian; every offset already has unit length
                        dirs.push([dq as f64 + dr as f64 / 2.0, dr as f64 * half_sqrt3, 0.0]);
                    }
                }
                lists.push(neighbors);
                directions.push(dirs);
            }
        }

        Ok(Self::from_parts(
            TopologyKind::Hex { width, height },
            6,
            lists,
            Some(directions),
        ))
    }

    /// Lattice extents as `[x, y, z]`; hex lattices report depth 1.
    pub fn lattice_dims(&self) -> Option<[usize; 3]> {
        match self.kind() {
            TopologyKind::Cubic {
                width,
                height,
                depth,
                ..
            } => Some([*width, *height, *depth]),
            TopologyKind::Hex { width, height } => Some([*width, *height, 1]),
            _ => None,
        }
    }

    /// Node index for lattice coordinates (`[q, r, 0]` on hex lattices).
    pub fn node_at(&self, coords: [usize; 3]) -> Option<usize> {
        let [w, h, d] = self.lattice_dims()?;
        let [x, y, z] = coords;
        if x < w && y < h && z < d {
            Some(index_of(w, h, x, y, z))
        } else {
            None
        }
    }

    /// Lattice coordinates of a node.
    pub fn coords_of(&self, node: usize) -> Option<[usize; 3]> {
        let [w, h, _] = self.lattice_dims()?;
        if !self.contains(node) {
            return None;
        }
        Some([node % w, (node / w) % h, node / (w * h)])
    }
}
