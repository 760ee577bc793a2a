//! Axis-aligned plane meshes over a simulation box.

use hwa_core::Real;

use crate::{InputError, InputResult, PointSet};

/// Upper bound on generated mesh points.
pub const MAX_MESH_POINTS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    YZ,
    XZ,
}

impl Plane {
    /// Plane perpendicular to `normal`. The normal must be non-zero and
    /// parallel to one coordinate axis.
    pub fn from_normal(normal: [Real; 3]) -> InputResult<Self> {
        let length = normal.iter().map(|c| c * c).sum::<Real>().sqrt();
        if length == 0.0 || !length.is_finite() {
            return Err(InputError::InvalidPlane {
                message: "normal vector has zero length".into(),
            });
        }
        match normal.map(|c| c != 0.0) {
            [true, false, false] => Ok(Plane::YZ),
            [false, true, false] => Ok(Plane::XZ),
            [false, false, true] => Ok(Plane::XY),
            _ => Err(InputError::InvalidPlane {
                message: "normal vector must be parallel to a coordinate axis".into(),
            }),
        }
    }

    /// (first varying axis, second varying axis, fixed axis)
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::YZ => (1, 2, 0),
            Plane::XZ => (0, 2, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [Real; 3],
    pub max: [Real; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStructure {
    Constant,
    /// Adaptive grid with this many refinement levels.
    Adaptive { levels: u32 },
}

/// Size of the coarsest grid cell, given the finest cell size.
pub fn basic_cell_size(finest: Real, structure: GridStructure) -> Real {
    match structure {
        GridStructure::Constant => finest,
        GridStructure::Adaptive { levels } => finest * (2.0 as Real).powi(levels as i32),
    }
}

fn steps(min: Real, max: Real, resolution: Real) -> usize {
    if max < min {
        return 0;
    }
    ((max - min) / resolution + 1e-9).floor() as usize + 1
}

/// Square mesh of spacing `resolution` spanning `bbox` in `plane`, through `point`.
pub fn plane_mesh(
    bbox: &BoundingBox,
    plane: Plane,
    point: [Real; 3],
    resolution: Real,
) -> InputResult<PointSet> {
    if !(resolution > 0.0 && resolution.is_finite()) {
        return Err(InputError::InvalidPlane {
            message: format!("mesh resolution must be positive, got {resolution}"),
        });
    }
    let (a, b, fixed) = plane.axes();
    let na = steps(bbox.min[a], bbox.max[a], resolution);
    let nb = steps(bbox.min[b], bbox.max[b], resolution);
    let total = na.saturating_mul(nb);
    if total > MAX_MESH_POINTS {
        return Err(InputError::InvalidPlane {
            message: format!("mesh of {total} points exceeds the limit of {MAX_MESH_POINTS}"),
        });
    }

    let mut positions = Vec::with_capacity(total);
    for i in 0..na {
        for j in 0..nb {
            let mut p = [0.0; 3];
            p[a] = bbox.min[a] + i as Real * resolution;
            p[b] = bbox.min[b] + j as Real * resolution;
            p[fixed] = point[fixed];
            positions.push(p);
        }
    }
    tracing::debug!(?plane, points = positions.len(), resolution, "plane mesh generated");
    PointSet::from_positions(&positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_selects_plane() {
        assert_eq!(Plane::from_normal([0.0, 0.0, 2.0]).unwrap(), Plane::XY);
        assert_eq!(Plane::from_normal([-1.0, 0.0, 0.0]).unwrap(), Plane::YZ);
        assert_eq!(Plane::from_normal([0.0, 0.3, 0.0]).unwrap(), Plane::XZ);
        assert!(Plane::from_normal([0.0, 0.0, 0.0]).is_err());
        assert!(Plane::from_normal([1.0, 1.0, 0.0]).is_err());
    }

    #[test]
    fn adaptive_cell_size() {
        assert_eq!(basic_cell_size(1000.0, GridStructure::Constant), 1000.0);
        assert_eq!(
            basic_cell_size(1000.0, GridStructure::Adaptive { levels: 3 }),
            8000.0
        );
    }

    #[test]
    fn xy_mesh_spans_box_at_fixed_z() {
        let bbox = BoundingBox {
            min: [0.0, -1.0, -5.0],
            max: [2.0, 1.0, 5.0],
        };
        let set = plane_mesh(&bbox, Plane::XY, [9.0, 9.0, 4.0], 1.0).unwrap();
        let pts = set.positions();
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0], [0.0, -1.0, 4.0]);
        assert_eq!(pts[8], [2.0, 1.0, 4.0]);
        assert!(pts.iter().all(|p| p[2] == 4.0));
    }

    #[test]
    fn xz_mesh_keeps_y() {
        let bbox = BoundingBox {
            min: [0.0, 0.0, 0.0],
            max: [1.0, 1.0, 1.0],
        };
        let set = plane_mesh(&bbox, Plane::XZ, [0.0, 0.5, 0.0], 0.5).unwrap();
        assert_eq!(set.len(), 9);
        assert!(set.positions().iter().all(|p| p[1] == 0.5));
    }

    #[test]
    fn rejects_bad_resolution_and_huge_meshes() {
        let bbox = BoundingBox {
            min: [0.0; 3],
            max: [1.0e9; 3],
        };
        assert!(plane_mesh(&bbox, Plane::XY, [0.0; 3], 0.0).is_err());
        assert!(plane_mesh(&bbox, Plane::XY, [0.0; 3], 1.0).is_err());
    }
}
