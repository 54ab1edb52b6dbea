//! Triangle mesh data.
//!
//! [`TriangleMesh`] is the borrowed view an accelerator builds from: flat
//! single-precision positions (three per vertex) and 0-based `u32` vertex
//! indices (three per triangle). The view does not own anything; the
//! accelerator copies what it keeps, so the backing storage only needs to
//! outlive the build call.
//!
//! [`Mesh`] is the demo-side owner of that storage: it reads Wavefront
//! OBJ files (positions and faces only, convex polygons triangulated as
//! fans), tracks the model's bounding box, and can append a ground plane
//! under the model.

// std
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
// others
use thiserror::Error;
// bvh
use crate::core::bvh::Float;
use crate::core::geometry::{pnt3_max_pnt3, pnt3_min_pnt3, Point3f, Vector3f};

/// Borrowed description of an indexed triangle mesh.
///
/// All indices must be `< n_vertices`; the view does not validate them.
#[derive(Debug, Copy, Clone)]
pub struct TriangleMesh<'a> {
    pub n_vertices: u32,
    pub n_triangles: u32,
    pub positions: &'a [Float],
    pub indices: &'a [u32],
}

impl<'a> TriangleMesh<'a> {
    pub fn new(positions: &'a [Float], indices: &'a [u32]) -> Self {
        assert_eq!(positions.len() % 3, 0);
        assert_eq!(indices.len() % 3, 0);
        TriangleMesh {
            n_vertices: (positions.len() / 3) as u32,
            n_triangles: (indices.len() / 3) as u32,
            positions,
            indices,
        }
    }
    pub fn position(&self, vertex: u32) -> Point3f {
        let i = 3 * vertex as usize;
        Point3f::from_slice(&self.positions[i..i + 3])
    }
    /// The three vertex positions of one triangle.
    pub fn triangle(&self, triangle: u32) -> (Point3f, Point3f, Point3f) {
        let i = 3 * triangle as usize;
        (
            self.position(self.indices[i]),
            self.position(self.indices[i + 1]),
            self.position(self.indices[i + 2]),
        )
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// An owned triangle mesh loaded from an OBJ file.
pub struct Mesh {
    // bounds exclude any added ground plane
    p_min: Point3f,
    p_max: Point3f,
    positions: Vec<Float>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Read a Wavefront OBJ file.
    ///
    /// Only `v` and `f` records are interpreted; faces with more than
    /// three vertices are fanned into triangles. Negative (relative) face
    /// indices are resolved against the vertices read so far.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, MeshError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut mesh = Mesh {
            p_min: Point3f::new(
                std::f32::INFINITY,
                std::f32::INFINITY,
                std::f32::INFINITY,
            ),
            p_max: Point3f::new(
                std::f32::NEG_INFINITY,
                std::f32::NEG_INFINITY,
                std::f32::NEG_INFINITY,
            ),
            positions: Vec::new(),
            indices: Vec::new(),
        };

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let p = parse_position(&mut tokens, number + 1)?;
                    mesh.p_min = pnt3_min_pnt3(&mesh.p_min, &p);
                    mesh.p_max = pnt3_max_pnt3(&mesh.p_max, &p);
                    mesh.push_position(&p);
                }
                Some("f") => {
                    let n = mesh.vertices();
                    let mut corners = tokens
                        .map(|token| parse_face_index(token, n, number + 1));
                    let i0 = match corners.next() {
                        Some(i) => i?,
                        None => {
                            return Err(parse_error(number + 1, "face with no vertices"));
                        }
                    };
                    let mut i1 = match corners.next() {
                        Some(i) => i?,
                        None => {
                            return Err(parse_error(number + 1, "face with one vertex"));
                        }
                    };
                    // fan-triangulate, assuming convex polygons
                    for corner in corners {
                        let i2 = corner?;
                        mesh.add_triangle(i0, i1, i2);
                        i1 = i2;
                    }
                }
                // normals, texcoords, groups, materials, comments
                _ => {}
            }
        }

        Ok(mesh)
    }

    pub fn vertices(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    pub fn triangles(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    pub fn position(&self, vertex: u32) -> Point3f {
        let i = 3 * vertex as usize;
        Point3f::from_slice(&self.positions[i..i + 3])
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Borrow the mesh as accelerator input.
    pub fn view(&self) -> TriangleMesh<'_> {
        TriangleMesh::new(&self.positions, &self.indices)
    }

    /// Centre of the model's bounding box.
    pub fn centre(&self) -> Point3f {
        (self.p_min + self.p_max) * 0.5
    }

    /// Radius of the model's bounding sphere.
    pub fn radius(&self) -> Float {
        (self.p_max - self.p_min).length() * 0.5
    }

    /// Append a square two-triangle ground plane under the model on the
    /// given axis, `size` times the model's extent on each side.
    pub fn add_plane(&mut self, axis: usize, size: Float) {
        assert!(axis < 3);
        let x = (axis + 1) % 3;
        let y = (axis + 2) % 3;

        let delta = self.p_max - self.p_min;
        let mut dx = Vector3f::new(0.0, 0.0, 0.0);
        let mut dy = Vector3f::new(0.0, 0.0, 0.0);
        dx[x] = 0.5 * size * delta[x];
        dy[y] = 0.5 * size * delta[y];

        let mut c = self.centre();
        c[axis] = self.p_min[axis];

        let first = self.vertices();
        self.push_position(&(c - dx - dy));
        self.push_position(&(c + dx - dy));
        self.push_position(&(c + dx + dy));
        self.push_position(&(c - dx + dy));

        self.add_triangle(first, first + 1, first + 2);
        self.add_triangle(first, first + 2, first + 3);
    }

    fn push_position(&mut self, p: &Point3f) {
        self.positions.push(p.x);
        self.positions.push(p.y);
        self.positions.push(p.z);
    }

    fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }
}

fn parse_error(line: usize, message: &str) -> MeshError {
    MeshError::Parse {
        line,
        message: String::from(message),
    }
}

fn parse_position<'a, I>(tokens: &mut I, line: usize) -> Result<Point3f, MeshError>
where
    I: Iterator<Item = &'a str>,
{
    let mut p = Point3f::default();
    for i in 0..3 {
        let token = tokens
            .next()
            .ok_or_else(|| parse_error(line, "vertex with fewer than three coordinates"))?;
        p[i] = token
            .parse::<Float>()
            .map_err(|_| parse_error(line, "malformed vertex coordinate"))?;
    }
    Ok(p)
}

/// Resolve one face corner (`17`, `17/3`, `17//5`, `-1`, ...) to a
/// 0-based vertex index.
fn parse_face_index(token: &str, n_vertices: u32, line: usize) -> Result<u32, MeshError> {
    let index = token
        .split('/')
        .next()
        .unwrap_or("")
        .parse::<i64>()
        .map_err(|_| parse_error(line, "malformed face index"))?;
    let resolved = if index < 0 {
        n_vertices as i64 + index
    } else {
        index - 1
    };
    if resolved < 0 || resolved >= n_vertices as i64 {
        return Err(parse_error(line, "face index out of range"));
    }
    Ok(resolved as u32)
}
