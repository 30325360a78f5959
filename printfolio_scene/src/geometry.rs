//! Procedural triangle meshes for the printer parts, letter blocks and the
//! filament tube. Everything is built in local space centered on the origin
//! so node transforms can place it directly.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

const DEFAULT_CYLINDER_SEGMENTS: u32 = 16;

/// Face order for [`Shape::Cuboid`]: +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BoxFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl BoxFace {
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Describes a primitive before it is tessellated into a [`TriangleMesh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Cuboid {
        size: Vec3,
    },
    /// Y-aligned; `radius_top == 0` yields a cone.
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    /// Lies in the XY plane around the Z axis.
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    /// Flat annulus in the XY plane facing +Z.
    Ring {
        inner: f32,
        outer: f32,
        segments: u32,
    },
    /// Flat rectangle in the XY plane facing +Z.
    Plane {
        width: f32,
        height: f32,
    },
}

impl Shape {
    pub fn cuboid(x: f32, y: f32, z: f32) -> Self {
        Shape::Cuboid {
            size: Vec3::new(x, y, z),
        }
    }

    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        Shape::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height,
            segments,
        }
    }

    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        Shape::Cylinder {
            radius_top: 0.0,
            radius_bottom: radius,
            height,
            segments,
        }
    }

    pub fn tessellate(&self) -> TriangleMesh {
        match *self {
            Shape::Cuboid { size } => build_cuboid(size),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                segments,
            } => build_cylinder(radius_top, radius_bottom, height, segments),
            Shape::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => build_torus(radius, tube, radial_segments, tubular_segments),
            Shape::Ring {
                inner,
                outer,
                segments,
            } => build_ring(inner, outer, segments),
            Shape::Plane { width, height } => build_plane(width, height),
        }
    }
}

/// Axis-aligned bounds in whatever space the points were given in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Aabb {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners().map(|corner| matrix.transform_point3(corner));
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Box face per vertex; `u8::MAX` for non-box geometry.
    pub face_ids: Vec<u8>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2, face: u8) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        self.face_ids.push(face);
        index
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Builds a mesh from raw triangle soup with flat per-face normals.
    pub fn from_triangles(vertices: &[Vec3], faces: &[[usize; 3]]) -> Self {
        let mut mesh = TriangleMesh::default();
        for face in faces {
            let [a, b, c] = face.map(|i| vertices.get(i).copied().unwrap_or(Vec3::ZERO));
            let normal = (b - a).cross(c - a).normalize_or_zero();
            for corner in [a, b, c] {
                let index = mesh.push_vertex(corner, normal, Vec2::ZERO, u8::MAX);
                mesh.indices.push(index);
            }
        }
        mesh
    }

    /// Applies `matrix` to every vertex in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        let normal_matrix = matrix.inverse().transpose();
        for position in &mut self.positions {
            *position = matrix.transform_point3(*position);
        }
        for normal in &mut self.normals {
            *normal = normal_matrix.transform_vector3(*normal).normalize_or_zero();
        }
    }
}

fn build_cuboid(size: Vec3) -> TriangleMesh {
    let h = size * 0.5;
    #[rustfmt::skip]
    let faces: [(BoxFace, Vec3, [Vec3; 4]); 6] = [
        (BoxFace::PosX, Vec3::X, [
            Vec3::new(h.x, h.y, h.z), Vec3::new(h.x, h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z), Vec3::new(h.x, -h.y, h.z),
        ]),
        (BoxFace::NegX, Vec3::NEG_X, [
            Vec3::new(-h.x, h.y, -h.z), Vec3::new(-h.x, h.y, h.z),
            Vec3::new(-h.x, -h.y, h.z), Vec3::new(-h.x, -h.y, -h.z),
        ]),
        (BoxFace::PosY, Vec3::Y, [
            Vec3::new(-h.x, h.y, -h.z), Vec3::new(h.x, h.y, -h.z),
            Vec3::new(h.x, h.y, h.z), Vec3::new(-h.x, h.y, h.z),
        ]),
        (BoxFace::NegY, Vec3::NEG_Y, [
            Vec3::new(-h.x, -h.y, h.z), Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, -h.z), Vec3::new(-h.x, -h.y, -h.z),
        ]),
        (BoxFace::PosZ, Vec3::Z, [
            Vec3::new(-h.x, h.y, h.z), Vec3::new(h.x, h.y, h.z),
            Vec3::new(h.x, -h.y, h.z), Vec3::new(-h.x, -h.y, h.z),
        ]),
        (BoxFace::NegZ, Vec3::NEG_Z, [
            Vec3::new(h.x, h.y, -h.z), Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, -h.z), Vec3::new(h.x, -h.y, -h.z),
        ]),
    ];
    let uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    let mut mesh = TriangleMesh::default();
    for (face, normal, corners) in faces {
        let base = mesh.vertex_count() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            mesh.push_vertex(corner, normal, uv, face.index());
        }
        mesh.indices
            .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }
    mesh
}

fn build_cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> TriangleMesh {
    let segments = if segments < 3 {
        DEFAULT_CYLINDER_SEGMENTS
    } else {
        segments
    };
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);
    let mut mesh = TriangleMesh::default();

    let side_base = mesh.vertex_count() as u32;
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let angle = u * TAU;
        let (sin, cos) = angle.sin_cos();
        let normal = Vec3::new(sin, slope, cos).normalize_or_zero();
        mesh.push_vertex(
            Vec3::new(radius_top * sin, half, radius_top * cos),
            normal,
            Vec2::new(u, 0.0),
            u8::MAX,
        );
        mesh.push_vertex(
            Vec3::new(radius_bottom * sin, -half, radius_bottom * cos),
            normal,
            Vec2::new(u, 1.0),
            u8::MAX,
        );
    }
    for i in 0..segments {
        let top = side_base + i * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        mesh.indices
            .extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
    }

    for (radius, y, normal) in [(radius_top, half, Vec3::Y), (radius_bottom, -half, Vec3::NEG_Y)] {
        if radius <= 0.0 {
            continue;
        }
        let center = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5), u8::MAX);
        let rim = mesh.vertex_count() as u32;
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            mesh.push_vertex(
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                Vec2::new(0.5 + sin * 0.5, 0.5 + cos * 0.5),
                u8::MAX,
            );
        }
        for i in 0..segments {
            if normal.y > 0.0 {
                mesh.indices.extend_from_slice(&[center, rim + i, rim + i + 1]);
            } else {
                mesh.indices.extend_from_slice(&[center, rim + i + 1, rim + i]);
            }
        }
    }
    mesh
}

fn build_torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> TriangleMesh {
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);
    let mut mesh = TriangleMesh::default();
    for j in 0..=radial {
        let v = j as f32 / radial as f32 * TAU;
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            mesh.push_vertex(
                position,
                (position - center).normalize_or_zero(),
                Vec2::new(i as f32 / tubular as f32, j as f32 / radial as f32),
                u8::MAX,
            );
        }
    }
    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

fn build_ring(inner: f32, outer: f32, segments: u32) -> TriangleMesh {
    let segments = segments.max(3);
    let mut mesh = TriangleMesh::default();
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        for radius in [inner, outer] {
            let position = Vec3::new(radius * cos, radius * sin, 0.0);
            let uv = Vec2::new(
                position.x / outer.max(f32::EPSILON) * 0.5 + 0.5,
                position.y / outer.max(f32::EPSILON) * 0.5 + 0.5,
            );
            mesh.push_vertex(position, Vec3::Z, uv, u8::MAX);
        }
    }
    for i in 0..segments {
        let a = i * 2;
        let b = a + 1;
        let c = a + 2;
        let d = a + 3;
        mesh.indices.extend_from_slice(&[a, b, d, a, d, c]);
    }
    mesh
}

fn build_plane(width: f32, height: f32) -> TriangleMesh {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let mut mesh = TriangleMesh::default();
    let corners = [
        (Vec3::new(-hw, hh, 0.0), Vec2::new(0.0, 0.0)),
        (Vec3::new(hw, hh, 0.0), Vec2::new(1.0, 0.0)),
        (Vec3::new(hw, -hh, 0.0), Vec2::new(1.0, 1.0)),
        (Vec3::new(-hw, -hh, 0.0), Vec2::new(0.0, 1.0)),
    ];
    for (position, uv) in corners {
        mesh.push_vertex(position, Vec3::Z, uv, u8::MAX);
    }
    mesh.indices.extend_from_slice(&[0, 3, 2, 0, 2, 1]);
    mesh
}

/// Samples an open uniform Catmull-Rom spline through `points` at `t` in
/// `0.0..=1.0`. End segments use reflected phantom points.
pub fn catmull_rom(points: &[Vec3], t: f32) -> Vec3 {
    match points.len() {
        0 => return Vec3::ZERO,
        1 => return points[0],
        _ => {}
    }
    let segments = (points.len() - 1) as f32;
    let scaled = t.clamp(0.0, 1.0) * segments;
    let index = (scaled.floor() as usize).min(points.len() - 2);
    let local = scaled - index as f32;

    let p1 = points[index];
    let p2 = points[index + 1];
    let p0 = if index == 0 {
        p1 * 2.0 - p2
    } else {
        points[index - 1]
    };
    let p3 = if index + 2 < points.len() {
        points[index + 2]
    } else {
        p2 * 2.0 - p1
    };

    let t2 = local * local;
    let t3 = t2 * local;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * local
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Sweeps a circle of `radius` along the spline through `points`, using
/// parallel-transported frames so the tube does not twist.
pub fn build_tube(points: &[Vec3], segments: u32, radius: f32, radial_segments: u32) -> TriangleMesh {
    let segments = segments.max(1);
    let radial = radial_segments.max(3);
    let samples: Vec<Vec3> = (0..=segments)
        .map(|i| catmull_rom(points, i as f32 / segments as f32))
        .collect();

    let tangents: Vec<Vec3> = (0..samples.len())
        .map(|i| {
            let prev = samples[i.saturating_sub(1)];
            let next = samples[(i + 1).min(samples.len() - 1)];
            let tangent = (next - prev).normalize_or_zero();
            if tangent == Vec3::ZERO { Vec3::Y } else { tangent }
        })
        .collect();

    let mut normals = Vec::with_capacity(samples.len());
    let first = tangents[0];
    let seed = if first.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    normals.push(first.cross(seed).normalize_or_zero());
    for i in 1..samples.len() {
        let previous = normals[i - 1];
        let axis = tangents[i - 1].cross(tangents[i]);
        let normal = if axis.length_squared() > 1e-10 {
            let angle = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
            glam::Quat::from_axis_angle(axis.normalize(), angle) * previous
        } else {
            previous
        };
        normals.push(normal);
    }

    let mut mesh = TriangleMesh::default();
    for (i, center) in samples.iter().enumerate() {
        let normal = normals[i];
        let binormal = tangents[i].cross(normal).normalize_or_zero();
        for j in 0..=radial {
            let angle = j as f32 / radial as f32 * TAU;
            let direction = (normal * angle.cos() + binormal * angle.sin()).normalize_or_zero();
            mesh.push_vertex(
                *center + direction * radius,
                direction,
                Vec2::new(i as f32 / segments as f32, j as f32 / radial as f32),
                u8::MAX,
            );
        }
    }
    let row = radial + 1;
    for i in 1..=segments {
        for j in 1..=radial {
            let a = row * (i - 1) + (j - 1);
            let b = row * i + (j - 1);
            let c = row * i + j;
            let d = row * (i - 1) + j;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

/// Rotation that lays an XY-plane primitive flat on the ground.
pub fn ground_rotation() -> Vec3 {
    Vec3::new(-PI / 2.0, 0.0, 0.0)
}
