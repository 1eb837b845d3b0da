//! Generators producing raw vertex and triangle lists for primitive shapes.
//!
//! Generators are pure producers: they only build a [`RawTriMesh`] and know
//! nothing about half edges. Feed the result to
//! [`HalfEdgeMesh::from_raw`][crate::mesh::HalfEdgeMesh::from_raw] to get a
//! connected mesh.

use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::{handle::hsize, math::VectorExt, raw::RawTriMesh};


/// Selects which sides of a cube (or cube parameterized sphere) to
/// generate. Deselecting sides produces an open mesh with boundary loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeSides {
    pub positive_x: bool,
    pub negative_x: bool,
    pub positive_y: bool,
    pub negative_y: bool,
    pub positive_z: bool,
    pub negative_z: bool,
}

impl CubeSides {
    pub const ALL: Self = Self {
        positive_x: true,
        negative_x: true,
        positive_y: true,
        negative_y: true,
        positive_z: true,
        negative_z: true,
    };

    pub const NONE: Self = Self {
        positive_x: false,
        negative_x: false,
        positive_y: false,
        negative_y: false,
        positive_z: false,
        negative_z: false,
    };
}

impl Default for CubeSides {
    fn default() -> Self {
        Self::ALL
    }
}


/// An axis aligned cube with 2 triangles per generated side, wound counter
/// clockwise as seen from outside.
#[derive(Debug)]
pub struct Cube {
    /// The corner with the smallest coordinates. *Default*: `[0, 0, 0]`.
    pub origin: Point3<f64>,

    /// Edge length. *Default*: 1.0.
    pub size: f64,

    /// Which sides to generate. *Default*: all.
    pub sides: CubeSides,
}

impl Default for Cube {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            size: 1.0,
            sides: CubeSides::ALL,
        }
    }
}

impl Cube {
    pub fn build(&self) -> RawTriMesh {
        let corners = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ];
        let positions = corners
            .iter()
            .map(|&(x, y, z)| self.origin + Vector3::new(x, y, z) * self.size)
            .collect();

        let mut triangles: Vec<[hsize; 3]> = Vec::new();
        if self.sides.negative_z {
            triangles.push([0, 2, 1]);
            triangles.push([0, 3, 2]);
        }
        if self.sides.positive_z {
            triangles.push([4, 5, 6]);
            triangles.push([4, 6, 7]);
        }
        if self.sides.negative_y {
            triangles.push([0, 1, 5]);
            triangles.push([0, 5, 4]);
        }
        if self.sides.positive_x {
            triangles.push([1, 2, 6]);
            triangles.push([1, 6, 5]);
        }
        if self.sides.positive_y {
            triangles.push([2, 3, 7]);
            triangles.push([2, 7, 6]);
        }
        if self.sides.negative_x {
            triangles.push([3, 0, 4]);
            triangles.push([3, 4, 7]);
        }

        RawTriMesh {
            positions,
            uvs: None,
            normals: None,
            triangles,
        }
    }
}


/// A sphere parameterized over the surface grid of a cube: the shell points
/// of a `resolution³` grid are projected onto the sphere, each cube side
/// contributing a `resolution²` quad patch. Compared to a latitude or
/// longitude parameterization this avoids pole pinching and keeps the quads
/// reasonably uniform.
#[derive(Debug)]
pub struct Sphere {
    /// The center point. *Default*: `[0, 0, 0]`.
    pub center: Point3<f64>,

    /// The radius. *Default*: 1.0.
    pub radius: f64,

    /// Grid cells per cube side. Has to be at least 1. *Default*: 8.
    pub resolution: usize,

    /// Which cube sides to generate; deselecting sides yields an open
    /// partial sphere. *Default*: all.
    pub sides: CubeSides,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            radius: 1.0,
            resolution: 8,
            sides: CubeSides::ALL,
        }
    }
}

impl Sphere {
    pub fn build(&self) -> RawTriMesh {
        let n = self.resolution;
        assert!(n >= 1, "trying to build a sphere with resolution 0");

        // All grid points on the shell of the cube, each tagged with the
        // sides it belongs to. Points on cube edges and corners are shared
        // between sides, which is what stitches the patches together.
        let mut positions = Vec::new();
        let mut tags: Vec<CubeSides> = Vec::new();
        for z in 0..=n {
            for y in 0..=n {
                for x in 0..=n {
                    let on_shell = x == 0 || x == n || y == 0 || y == n || z == 0 || z == n;
                    if !on_shell {
                        continue;
                    }

                    let mut tag = CubeSides::NONE;
                    tag.negative_x = x == 0;
                    tag.positive_x = x == n;
                    tag.negative_y = y == 0;
                    tag.positive_y = y == n;
                    tag.negative_z = z == 0;
                    tag.positive_z = z == n;

                    let dir = Vector3::new(
                        x as f64 / n as f64 - 0.5,
                        y as f64 / n as f64 - 0.5,
                        z as f64 / n as f64 - 0.5,
                    )
                    .normalized();
                    positions.push(self.center + dir * self.radius);
                    tags.push(tag);
                }
            }
        }

        // The points of one side, in row major order of its two free grid
        // axes. The loops above visit z, then y, then x in ascending order,
        // so filtering preserves exactly that ordering.
        let side_points = |select: fn(&CubeSides) -> bool| -> Vec<hsize> {
            tags.iter()
                .enumerate()
                .filter(|(_, tag)| select(tag))
                .map(|(i, _)| i as hsize)
                .collect()
        };

        let mut triangles: Vec<[hsize; 3]> = Vec::new();
        {
            let mut emit = |points: Vec<hsize>, flip: bool| {
                for i in 0..n * n {
                    // Skip the last point of each row; a side has n + 1
                    // points per row but only n quads.
                    let idx = i + i / n;
                    let q00 = points[idx];
                    let q10 = points[idx + 1];
                    let q01 = points[idx + n + 1];
                    let q11 = points[idx + n + 2];

                    if flip {
                        triangles.push([q00, q11, q10]);
                        triangles.push([q00, q01, q11]);
                    } else {
                        triangles.push([q00, q10, q11]);
                        triangles.push([q00, q11, q01]);
                    }
                }
            };

            if self.sides.negative_z {
                emit(side_points(|t| t.negative_z), true);
            }
            if self.sides.positive_z {
                emit(side_points(|t| t.positive_z), false);
            }
            if self.sides.negative_y {
                emit(side_points(|t| t.negative_y), false);
            }
            if self.sides.positive_y {
                emit(side_points(|t| t.positive_y), true);
            }
            if self.sides.negative_x {
                emit(side_points(|t| t.negative_x), true);
            }
            if self.sides.positive_x {
                emit(side_points(|t| t.positive_x), false);
            }
        }

        RawTriMesh {
            positions,
            uvs: None,
            normals: None,
            triangles,
        }
    }
}


/// A flat round disc in the XY plane with normals pointing up (+z).
#[derive(Debug)]
pub struct Disc {
    /// The number of triangles generated for the disc. Has to be at least
    /// 3 or else building panics. *Default*: 16.
    pub faces: usize,

    /// The center point. *Default*: `[0, 0, 0]`.
    pub center: Point3<f64>,

    /// The outer radius. *Default*: 1.0.
    pub radius: f64,
}

impl Default for Disc {
    fn default() -> Self {
        Self {
            faces: 16,
            center: Point3::origin(),
            radius: 1.0,
        }
    }
}

impl Disc {
    pub fn build(&self) -> RawTriMesh {
        assert!(
            self.faces >= 3,
            "trying to build a disc with {} faces (minimum is 3)",
            self.faces,
        );

        // Vertex 0 is the center, vertex 1 the first outer one at
        // [r, 0, 0], the rest follow counter clockwise.
        let mut positions = vec![self.center, self.center + Vector3::new(self.radius, 0.0, 0.0)];
        let mut triangles: Vec<[hsize; 3]> = Vec::new();

        for i in 1..self.faces {
            let angle = (i as f64 / self.faces as f64) * 2.0 * std::f64::consts::PI;
            positions.push(self.center + Vector3::new(
                self.radius * angle.cos(),
                self.radius * angle.sin(),
                0.0,
            ));

            triangles.push([0, i as hsize, i as hsize + 1]);
        }
        triangles.push([0, self.faces as hsize, 1]);

        RawTriMesh {
            positions,
            uvs: None,
            normals: None,
            triangles,
        }
    }
}


/// A small flat patch of nine triangles whose insertion order drives every
/// wiring path of `add_triangle`: fresh triangles touching the mesh at
/// zero, one and two vertices, adoption of one and two existing edges, and
/// two exact hole fills. Useful as a fixture when testing connectivity
/// code.
///
/// ```text
///                         (8)
///                        /   \
///          (5)---------(6)---(7)
///         /   \       /   \  /
///       (2)---(4)---(3)    \/
///      /   \  /   \  /
///    (0)---(1)----( )        (vertex 1 sits between 0 and 3)
/// ```
pub fn connectivity_sample() -> RawTriMesh {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(3.0, 1.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
        Point3::new(4.0, 2.0, 0.0),
        Point3::new(6.0, 2.0, 0.0),
        Point3::new(5.0, 3.0, 0.0),
    ];
    let triangles = vec![
        [0, 1, 2],
        [3, 4, 1],
        [4, 5, 2],
        [5, 4, 6],
        [8, 6, 7],
        [4, 3, 7],
        [5, 6, 8],
        [4, 2, 1],
        [4, 7, 6],
    ];

    RawTriMesh {
        positions,
        uvs: None,
        normals: None,
        triangles,
    }
}


#[cfg(test)]
mod tests {
    use crate::mesh::HalfEdgeMesh;
    use super::*;

    #[test]
    fn cube_is_closed_with_unit_volume() {
        let mesh = HalfEdgeMesh::from_raw(&Cube::default().build()).unwrap();
        mesh.check_integrity();

        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.num_half_edges(), 36);
        assert!(mesh.is_closed());
        approx::assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn scaled_cube_volume() {
        let cube = Cube {
            origin: Point3::new(-1.0, 2.0, 0.5),
            size: 2.0,
            ..Cube::default()
        };
        let mesh = HalfEdgeMesh::from_raw(&cube.build()).unwrap();

        approx::assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn open_cube_has_boundary() {
        let cube = Cube {
            sides: CubeSides { positive_z: false, ..CubeSides::ALL },
            ..Cube::default()
        };
        let mesh = HalfEdgeMesh::from_raw(&cube.build()).unwrap();
        mesh.check_integrity();

        assert!(!mesh.is_closed());
        assert_eq!(mesh.volume(), 0.0);
        // The missing lid leaves one boundary loop of four edges.
        assert_eq!(mesh.boundary_edges().count(), 4);
    }

    #[test]
    fn sphere_is_closed() {
        let sphere = Sphere { resolution: 4, ..Sphere::default() };
        let mesh = HalfEdgeMesh::from_raw(&sphere.build()).unwrap();
        mesh.check_integrity();

        assert!(mesh.is_closed());

        // 6n² + 2 shell points, 12n² triangles.
        assert_eq!(mesh.num_vertices(), 6 * 16 + 2);
        assert_eq!(mesh.num_triangles(), 12 * 16);

        // Inscribed in the unit sphere: volume below 4/3 π but near it.
        let volume = mesh.volume();
        assert!(volume > 3.5 && volume < 4.0 * std::f64::consts::PI / 3.0, "volume {}", volume);
    }

    #[test]
    fn half_sphere_has_one_boundary_loop() {
        let sphere = Sphere {
            resolution: 3,
            sides: CubeSides { positive_z: false, ..CubeSides::ALL },
            ..Sphere::default()
        };
        let mesh = HalfEdgeMesh::from_raw(&sphere.build()).unwrap();
        mesh.check_integrity();

        assert!(!mesh.is_closed());
        // The missing cap leaves the 4n edges of its rim as boundary.
        assert_eq!(mesh.boundary_edges().count(), 12);
    }

    #[test]
    fn disc_boundary_is_its_rim() {
        let disc = Disc { faces: 8, ..Disc::default() };
        let mesh = HalfEdgeMesh::from_raw(&disc.build()).unwrap();
        mesh.check_integrity();

        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_triangles(), 8);
        assert_eq!(mesh.boundary_edges().count(), 8);

        // The center vertex is interior, every rim vertex on the border.
        let center = mesh.vertex_handles().next().unwrap();
        assert!(!mesh.vertex(center).is_on_border());
        for vh in mesh.vertex_handles().skip(1) {
            assert!(mesh.vertex(vh).is_on_border());
        }
    }
}
