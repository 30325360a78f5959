//! Lift animation for the letter block under the pointer.

use crate::graph::{NodeId, SceneGraph};
use crate::printer::Printer;
use crate::transition::LABEL_RISE;

pub const HOVER_LIFT: f32 = 0.15;
/// Fraction of the remaining distance covered each frame.
pub const HOVER_EASE: f32 = 0.15;

fn ease_block(graph: &mut SceneGraph, block: NodeId, hovered: Option<NodeId>, base_y: f32) {
    let target = if hovered == Some(block) { HOVER_LIFT } else { 0.0 };
    let node = &mut graph[block];
    node.meta.hover_offset += (target - node.meta.hover_offset) * HOVER_EASE;
    if let Some(original) = node.meta.original_position {
        node.transform.position.y = original.y + base_y + node.meta.hover_offset;
    }
}

/// Eases the focused printer's risen label blocks toward their hover height.
pub fn animate_label_hover(graph: &mut SceneGraph, printer: &Printer, hovered: Option<NodeId>) {
    for block in &printer.label_blocks {
        ease_block(graph, *block, hovered, LABEL_RISE.y);
    }
}

pub fn animate_name_hover(graph: &mut SceneGraph, blocks: &[NodeId], hovered: Option<NodeId>) {
    for block in blocks {
        ease_block(graph, *block, hovered, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::letters::TextureStore;
    use crate::name_blocks::build_name_blocks;

    #[test]
    fn hovered_block_rises_and_settles_back() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let name = build_name_blocks(&mut graph, &mut textures, "HI", Rgb::BLACK);
        let (h, i) = (name.blocks[0], name.blocks[1]);

        for _ in 0..200 {
            animate_name_hover(&mut graph, &name.blocks, Some(h));
        }
        assert!((graph[h].transform.position.y - HOVER_LIFT).abs() < 1e-4);
        assert_eq!(graph[i].transform.position.y, 0.0);

        animate_name_hover(&mut graph, &name.blocks, None);
        let after_one = graph[h].meta.hover_offset;
        assert!(after_one < HOVER_LIFT && after_one > 0.1);

        for _ in 0..200 {
            animate_name_hover(&mut graph, &name.blocks, None);
        }
        assert!(graph[h].meta.hover_offset < 1e-4);
    }
}
