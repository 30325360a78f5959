use glam::Vec3;

use crate::color::Rgb;
use crate::geometry::{BoxFace, Shape};
use crate::graph::{FaceTexture, InteractiveRole, Material, NodeId, RoleTag, SceneGraph, Transform};
use crate::letters::{TextureStore, rasterize_letter};
use crate::printer::row_start;

const BLOCK_SIZE: f32 = 0.4;
const BLOCK_DEPTH: f32 = 0.15;
const GAP: f32 = 0.08;
const SPACE: f32 = BLOCK_SIZE * 0.6;
const EMISSIVE: f32 = 0.3;
pub const NAME_GROUP_POSITION: Vec3 = Vec3::new(0.0, 3.2, -1.0);

#[derive(Debug, Clone)]
pub struct NameBlocks {
    pub group: NodeId,
    pub blocks: Vec<NodeId>,
}

/// Builds the floating row of letter blocks spelling `text`, one hoverable
/// block per non-space character with the glyph on its front face.
pub fn build_name_blocks(
    graph: &mut SceneGraph,
    textures: &mut TextureStore,
    text: &str,
    color: Rgb,
) -> NameBlocks {
    let root = graph.root();
    let group = graph.add_group(root, "nameGroup");
    graph[group].transform = Transform::at(NAME_GROUP_POSITION);

    let material = Material::standard(color, 0.1, 0.3).with_emissive(color, EMISSIVE);
    let mut cursor = row_start(text, BLOCK_SIZE, GAP, SPACE);
    let mut blocks = Vec::new();
    for glyph in text.chars() {
        if glyph == ' ' {
            cursor += SPACE;
            continue;
        }
        let block = graph.add_mesh(group, Shape::cuboid(BLOCK_SIZE, BLOCK_SIZE, BLOCK_DEPTH), material);
        let texture = textures.insert(rasterize_letter(glyph, color));
        let position = Vec3::new(cursor + BLOCK_SIZE / 2.0, 0.0, 0.0);
        let node = &mut graph[block];
        node.transform.position = position;
        if let Some(visual) = node.visual.as_mut() {
            visual.face_texture = Some(FaceTexture {
                face: BoxFace::PosZ,
                texture,
            });
        }
        node.role = Some(RoleTag::free(InteractiveRole::NameBlock));
        node.meta.glyph = Some(glyph);
        node.meta.original_position = Some(position);
        blocks.push(block);
        cursor += BLOCK_SIZE + GAP;
    }

    NameBlocks { group, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_is_centered_and_spaced() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let name = build_name_blocks(&mut graph, &mut textures, "JOYCE TING", Rgb::from_hex(0xf58e2f));
        assert_eq!(name.blocks.len(), 9);
        assert_eq!(textures.len(), 9);

        let first = graph[name.blocks[0]].transform.position.x;
        let last = graph[name.blocks[8]].transform.position.x;
        assert!((first + last).abs() < 1e-5, "row centered on the group");

        // gap between E and T includes the space
        let e = graph[name.blocks[4]].transform.position.x;
        let t = graph[name.blocks[5]].transform.position.x;
        assert!((t - e - (BLOCK_SIZE + GAP + SPACE)).abs() < 1e-5);
    }

    #[test]
    fn blocks_are_tagged_without_printer() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let name = build_name_blocks(&mut graph, &mut textures, "AB", Rgb::BLACK);
        let tag = graph[name.blocks[1]].role.expect("tagged");
        assert_eq!(tag.role, InteractiveRole::NameBlock);
        assert_eq!(tag.printer, None);
        assert_eq!(graph[name.blocks[1]].meta.glyph, Some('B'));
    }
}
