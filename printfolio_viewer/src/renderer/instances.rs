use std::cmp::Ordering;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use printfolio_scene::DrawItem;
use printfolio_scene::graph::GeometryId;
use printfolio_scene::letters::TextureId;

use super::shaders::{linear_rgb, linear_rgba};

const OPAQUE_THRESHOLD: f32 = 0.999;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct SceneInstance {
    pub model: [[f32; 4]; 4],
    /// Linear base color plus opacity.
    pub color: [f32; 4],
    /// Linear emissive times intensity; `w` is 1 for unlit materials.
    pub emissive: [f32; 4],
    /// Metalness, roughness, letter layer (-1 when untextured), textured face.
    pub surface: [f32; 4],
}

impl SceneInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn from_item<F>(item: &DrawItem, layer_of: &F) -> Self
    where
        F: Fn(TextureId) -> Option<u32>,
    {
        let material = &item.material;
        let [er, eg, eb] = linear_rgb(material.emissive);
        let glow = material.emissive_intensity;
        let (layer, face) = item
            .face_texture
            .and_then(|face_texture| {
                layer_of(face_texture.texture)
                    .map(|layer| (layer as f32, face_texture.face.index() as f32))
            })
            .unwrap_or((-1.0, -1.0));
        Self {
            model: item.world.to_cols_array_2d(),
            color: linear_rgba(material.color, material.opacity.clamp(0.0, 1.0)),
            emissive: [
                er * glow,
                eg * glow,
                eb * glow,
                if material.unlit { 1.0 } else { 0.0 },
            ],
            surface: [material.metalness, material.roughness, layer, face],
        }
    }
}

/// Instances in draw order: opaque items first, then translucent ones from
/// far to near.
pub(super) struct DrawBatch {
    pub instances: Vec<SceneInstance>,
    pub geometries: Vec<GeometryId>,
    pub opaque_count: usize,
}

impl DrawBatch {
    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

pub(super) fn build_batch<F>(items: &[DrawItem], eye: Vec3, layer_of: F) -> DrawBatch
where
    F: Fn(TextureId) -> Option<u32>,
{
    let (mut opaque, mut translucent): (Vec<&DrawItem>, Vec<&DrawItem>) = items
        .iter()
        .filter(|item| item.material.opacity > 0.0)
        .partition(|item| item.material.opacity >= OPAQUE_THRESHOLD);
    opaque.sort_by_key(|item| item.geometry);
    translucent.sort_by(|a, b| {
        let da = a.world.w_axis.truncate().distance_squared(eye);
        let db = b.world.w_axis.truncate().distance_squared(eye);
        db.partial_cmp(&da).unwrap_or(Ordering::Equal)
    });

    let opaque_count = opaque.len();
    let ordered = opaque.into_iter().chain(translucent);
    let mut instances = Vec::with_capacity(items.len());
    let mut geometries = Vec::with_capacity(items.len());
    for item in ordered {
        instances.push(SceneInstance::from_item(item, &layer_of));
        geometries.push(item.geometry);
    }
    DrawBatch {
        instances,
        geometries,
        opaque_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::{PortfolioScene, SceneConfig, Viewport};

    fn scene() -> PortfolioScene {
        PortfolioScene::new(SceneConfig::default(), "/", Viewport::new(1280.0, 720.0))
            .expect("default scene builds")
    }

    #[test]
    fn every_visible_item_becomes_one_instance() {
        let scene = scene();
        let items = scene.draw_list();
        let batch = build_batch(&items, scene.camera_pose().eye, |_| Some(0));
        let drawable = items.iter().filter(|item| item.material.opacity > 0.0).count();
        assert_eq!(batch.len(), drawable);
        assert_eq!(batch.geometries.len(), batch.len());
        assert!(batch.opaque_count <= batch.len());
    }

    #[test]
    fn translucent_items_follow_opaque_ones_far_to_near() {
        let scene = scene();
        let eye = scene.camera_pose().eye;
        let items = scene.draw_list();
        let batch = build_batch(&items, eye, |_| None);
        let translucent = &batch.instances[batch.opaque_count..];
        assert!(translucent.iter().all(|i| i.color[3] < OPAQUE_THRESHOLD));
        assert!(
            batch.instances[..batch.opaque_count]
                .iter()
                .all(|i| i.color[3] >= OPAQUE_THRESHOLD)
        );
        let distances: Vec<f32> = translucent
            .iter()
            .map(|i| Vec3::from_slice(&i.model[3][..3]).distance_squared(eye))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn label_faces_pick_up_their_atlas_layer() {
        let scene = scene();
        let items = scene.draw_list();
        let textured = items.iter().filter(|item| item.face_texture.is_some()).count();
        assert!(textured > 0);

        let batch = build_batch(&items, scene.camera_pose().eye, |_| Some(3));
        let layered = batch.instances.iter().filter(|i| i.surface[2] == 3.0).count();
        assert_eq!(layered, textured);

        let untextured = build_batch(&items, scene.camera_pose().eye, |_| None);
        assert!(untextured.instances.iter().all(|i| i.surface[2] == -1.0));
    }
}
