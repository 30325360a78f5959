//! Ray casting against the scene graph.

use glam::{Mat4, Vec3};

use crate::geometry::Aabb;
use crate::graph::{NodeId, SceneGraph};

const TRIANGLE_EPSILON: f32 = 1e-8;
const MIN_DETERMINANT: f32 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Hit point on the horizontal plane `y = height`, if in front of the ray.
    pub fn intersect_horizontal_plane(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < f32::EPSILON {
            return None;
        }
        let distance = (height - self.origin.y) / self.direction.y;
        (distance >= 0.0).then(|| self.at(distance))
    }

    fn transformed(&self, matrix: &Mat4) -> Ray {
        let origin = matrix.transform_point3(self.origin);
        let direction = matrix.transform_vector3(self.direction);
        Ray { origin, direction }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

/// Möller–Trumbore, double-sided. Returns the ray parameter of the hit.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < TRIANGLE_EPSILON {
        return None;
    }
    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    (t > TRIANGLE_EPSILON).then_some(t)
}

/// Slab test; returns the entry parameter (0 when starting inside).
pub fn ray_aabb(ray: &Ray, bounds: &Aabb) -> Option<f32> {
    let mut t_min = 0.0f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
        if direction.abs() < f32::EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let mut t0 = (lo - origin) * inv;
        let mut t1 = (hi - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_max < t_min {
            return None;
        }
    }
    Some(t_min)
}

/// Nearest intersection with a single node's own geometry (children are not
/// visited).
pub fn intersect_node(graph: &SceneGraph, node: NodeId, ray: &Ray) -> Option<Hit> {
    let visual = graph.node(node)?.visual.as_ref()?;
    let world = graph.world_matrix(node);
    if world.determinant().abs() < MIN_DETERMINANT {
        return None;
    }
    let local_ray = ray.transformed(&world.inverse());
    let bounds = graph.geometry_bounds(visual.geometry)?;
    ray_aabb(&local_ray, &bounds)?;

    let mesh = graph.geometry(visual.geometry)?;
    let mut nearest: Option<Hit> = None;
    for [a, b, c] in mesh.triangles() {
        let Some(t) = ray_triangle(&local_ray, a, b, c) else {
            continue;
        };
        let point = world.transform_point3(local_ray.origin + local_ray.direction * t);
        let distance = (point - ray.origin).length();
        if nearest.is_none_or(|hit| distance < hit.distance) {
            nearest = Some(Hit {
                node,
                distance,
                point,
            });
        }
    }
    nearest
}

/// Nearest hit across the subtrees rooted at `roots`, considering only nodes
/// that are effectively visible.
pub fn pick_nearest(graph: &SceneGraph, roots: &[NodeId], ray: &Ray) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;
    for root in roots {
        if !graph.is_effectively_visible(*root) {
            continue;
        }
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if let Some(hit) = intersect_node(graph, id, ray) {
                if nearest.is_none_or(|best| hit.distance < best.distance) {
                    nearest = Some(hit);
                }
            }
            stack.extend(node.children().iter().copied());
        }
    }
    nearest
}
