//! Arena-backed scene graph.
//!
//! Nodes live in a [`SlotMap`] and refer to each other by [`NodeId`], so the
//! printers, name blocks and decorative model can be mutated in place every
//! frame without reference cycles. Tessellated geometry sits in a second arena
//! keyed by [`GeometryId`]; removing a node releases the geometry it owns.

use std::ops::{Index, IndexMut};

use glam::{EulerRot, Mat4, Quat, Vec3};
use slotmap::SlotMap;

use crate::color::Rgb;
use crate::geometry::{Aabb, BoxFace, Shape, TriangleMesh};
use crate::letters::TextureId;

slotmap::new_key_type! {
    pub struct NodeId;
    pub struct GeometryId;
}

/// Local transform; rotation is Euler angles applied in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Ignores scene lighting when set.
    pub unlit: bool,
}

impl Material {
    pub fn standard(color: Rgb, metalness: f32, roughness: f32) -> Self {
        Self {
            color,
            emissive: Rgb::BLACK,
            emissive_intensity: 0.0,
            metalness,
            roughness,
            opacity: 1.0,
            unlit: false,
        }
    }

    pub fn unlit(color: Rgb, opacity: f32) -> Self {
        Self {
            unlit: true,
            opacity,
            ..Self::standard(color, 0.0, 1.0)
        }
    }

    pub fn with_emissive(mut self, emissive: Rgb, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Replaces one box face's material with a letter raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceTexture {
    pub face: BoxFace,
    pub texture: TextureId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub geometry: GeometryId,
    pub material: Material,
    pub face_texture: Option<FaceTexture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InteractiveRole {
    Spool,
    SpeedButton,
    NameBlock,
    LabelBlock,
    PrinterBody,
    DecorativeModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTag {
    pub role: InteractiveRole,
    pub printer: Option<usize>,
}

impl RoleTag {
    pub fn printer(role: InteractiveRole, index: usize) -> Self {
        Self {
            role,
            printer: Some(index),
        }
    }

    pub fn free(role: InteractiveRole) -> Self {
        Self {
            role,
            printer: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMeta {
    pub glyph: Option<char>,
    pub original_position: Option<Vec3>,
    pub hover_offset: f32,
    pub original_width: Option<f32>,
    pub layer_index: Option<usize>,
    pub strip_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub visible: bool,
    pub visual: Option<Visual>,
    pub role: Option<RoleTag>,
    pub meta: NodeMeta,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn empty(parent: Option<NodeId>) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            visible: true,
            visual: None,
            role: None,
            meta: NodeMeta::default(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        self.visual.as_mut().map(|visual| &mut visual.material)
    }
}

struct GeometryEntry {
    mesh: TriangleMesh,
    bounds: Option<Aabb>,
}

/// One visible mesh flattened to world space.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub world: Mat4,
    pub material: Material,
    pub face_texture: Option<FaceTexture>,
}

pub struct SceneGraph {
    root: NodeId,
    nodes: SlotMap<NodeId, SceneNode>,
    geometries: SlotMap<GeometryId, GeometryEntry>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root_node = SceneNode::empty(None);
        root_node.name = Some("scene".to_string());
        let root = nodes.insert(root_node);
        Self {
            root,
            nodes,
            geometries: SlotMap::with_key(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn attach(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            self.root
        };
        let mut node = node;
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    pub fn add_group(&mut self, parent: NodeId, name: &str) -> NodeId {
        let mut node = SceneNode::empty(None);
        node.name = Some(name.to_string());
        self.attach(parent, node)
    }

    pub fn add_mesh(&mut self, parent: NodeId, shape: Shape, material: Material) -> NodeId {
        self.add_custom_mesh(parent, shape.tessellate(), material)
    }

    pub fn add_custom_mesh(
        &mut self,
        parent: NodeId,
        mesh: TriangleMesh,
        material: Material,
    ) -> NodeId {
        let geometry = self.insert_geometry(mesh);
        let mut node = SceneNode::empty(None);
        node.visual = Some(Visual {
            geometry,
            material,
            face_texture: None,
        });
        self.attach(parent, node)
    }

    pub fn insert_geometry(&mut self, mesh: TriangleMesh) -> GeometryId {
        let bounds = mesh.bounds();
        self.geometries.insert(GeometryEntry { mesh, bounds })
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&TriangleMesh> {
        self.geometries.get(id).map(|entry| &entry.mesh)
    }

    pub fn geometry_bounds(&self, id: GeometryId) -> Option<Aabb> {
        self.geometries.get(id).and_then(|entry| entry.bounds)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn contains_geometry(&self, id: GeometryId) -> bool {
        self.geometries.contains_key(id)
    }

    /// Detaches `id` and drops it with its whole subtree and their geometry.
    /// The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.nodes.contains_key(id) {
            return;
        }
        if let Some(parent) = self.nodes.get(id).and_then(|node| node.parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }
        for node_id in self.descendants(id) {
            if let Some(node) = self.nodes.remove(node_id) {
                if let Some(visual) = node.visual {
                    self.geometries.remove(visual.geometry);
                }
            }
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = match self.nodes.get(id) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove(child);
        }
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// `id` followed by each parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.nodes.contains_key(id).then_some(id);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.nodes.get(current).and_then(|node| node.parent);
            Some(current)
        })
    }

    pub fn find_by_name(&self, under: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(under).into_iter().find(|id| {
            self.nodes
                .get(*id)
                .and_then(|node| node.name.as_deref())
                .is_some_and(|candidate| candidate == name)
        })
    }

    /// Role tags from `id` upwards, nearest first.
    pub fn role_chain(&self, id: NodeId) -> Vec<RoleTag> {
        self.ancestors(id)
            .filter_map(|ancestor| self.nodes.get(ancestor).and_then(|node| node.role))
            .collect()
    }

    pub fn printer_of(&self, id: NodeId) -> Option<usize> {
        self.role_chain(id).into_iter().find_map(|tag| tag.printer)
    }

    pub fn nearest_with_role(&self, id: NodeId, role: InteractiveRole) -> Option<NodeId> {
        self.ancestors(id).find(|ancestor| {
            self.nodes
                .get(*ancestor)
                .and_then(|node| node.role)
                .is_some_and(|tag| tag.role == role)
        })
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        for ancestor in self.ancestors(id) {
            if let Some(node) = self.nodes.get(ancestor) {
                matrix = node.transform.matrix() * matrix;
            }
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    /// Visible only when the node and every ancestor are visible.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut any = false;
        for ancestor in self.ancestors(id) {
            any = true;
            if !self.nodes[ancestor].visible {
                return false;
            }
        }
        any
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            if let Some(visual) = &node.visual {
                if self.geometries.contains_key(visual.geometry) {
                    items.push(DrawItem {
                        node: id,
                        geometry: visual.geometry,
                        world,
                        material: visual.material,
                        face_texture: visual.face_texture,
                    });
                }
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        items
    }
}

impl Index<NodeId> for SceneGraph {
    type Output = SceneNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for SceneGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plastic() -> Material {
        Material::standard(Rgb::from_hex(0xf5f5f5), 0.1, 0.6)
    }

    #[test]
    fn remove_releases_subtree_geometry() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_group(root, "tubeGroup");
        let tube = graph.add_mesh(group, Shape::cuboid(1.0, 1.0, 1.0), plastic());
        graph.add_mesh(tube, Shape::cylinder(0.1, 1.0, 8), plastic());
        assert_eq!(graph.geometry_count(), 2);

        graph.clear_children(group);
        assert_eq!(graph.geometry_count(), 0);
        assert!(!graph.contains(tube));
        assert!(graph[group].children().is_empty());
    }

    #[test]
    fn roles_resolve_through_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let printer = graph.add_group(root, "printer");
        graph[printer].role = Some(RoleTag::printer(InteractiveRole::PrinterBody, 2));
        let spool = graph.add_group(printer, "spoolGroup");
        graph[spool].role = Some(RoleTag::printer(InteractiveRole::Spool, 2));
        let winding = graph.add_mesh(spool, Shape::cuboid(0.1, 0.1, 0.1), plastic());

        let chain: Vec<_> = graph.role_chain(winding).iter().map(|t| t.role).collect();
        assert_eq!(
            chain,
            vec![InteractiveRole::Spool, InteractiveRole::PrinterBody]
        );
        assert_eq!(graph.printer_of(winding), Some(2));
        assert_eq!(graph.find_by_name(root, "spoolGroup"), Some(spool));
    }

    #[test]
    fn world_matrix_composes_parent_transforms() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.add_group(root, "toolhead");
        graph[parent].transform = Transform::at(Vec3::new(1.0, 2.0, 3.0));
        graph[parent].transform.scale = Vec3::splat(2.0);
        let child = graph.add_group(parent, "nozzle");
        graph[child].transform = Transform::at(Vec3::new(0.0, -0.5, 0.0));

        let world = graph.world_position(child);
        assert!((world - Vec3::new(1.0, 1.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn hidden_ancestor_hides_draw_items() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_group(root, "layers");
        let strip = graph.add_mesh(group, Shape::cuboid(1.2, 0.05, 0.15), plastic());
        assert_eq!(graph.draw_list().len(), 1);

        graph.set_visible(group, false);
        assert!(!graph.is_effectively_visible(strip));
        assert!(graph.draw_list().is_empty());
    }
}
