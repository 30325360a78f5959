use crate::color::{ColorPair, Rgb};
use crate::graph::{NodeId, SceneGraph};
use crate::letters::{TextureStore, rasterize_letter};
use crate::printer::{DARK_GRAY, FLANGE_GRAY, Printer};

fn tint_subtree(graph: &mut SceneGraph, root: NodeId, color: Rgb, keep: &[Rgb]) {
    for id in graph.descendants(root) {
        if let Some(material) = graph[id].material_mut() {
            if !keep.contains(&material.color) {
                material.color = color;
            }
        }
    }
}

/// Recolors an existing printer in place. Geometry and transforms are left
/// alone; label rasters are regenerated and the old ones released.
pub fn apply_printer_colors(
    graph: &mut SceneGraph,
    textures: &mut TextureStore,
    printer: &mut Printer,
    colors: ColorPair,
) {
    let ColorPair { color, print_color } = colors;

    if let Some(material) = graph[printer.screen_glow].material_mut() {
        material.color = color;
    }
    if let Some(material) = graph[printer.speed_button].material_mut() {
        material.color = color;
        material.emissive = color;
    }
    if let Some(material) = graph[printer.build_surface].material_mut() {
        material.color = color;
    }
    if let Some(material) = graph[printer.bed_platform].material_mut() {
        material.color = color.pale();
    }

    tint_subtree(graph, printer.spool, print_color, &[DARK_GRAY, FLANGE_GRAY]);
    tint_subtree(graph, printer.tube_group, print_color, &[]);
    tint_subtree(graph, printer.layers, print_color, &[]);

    for block in &printer.label_blocks {
        let node = &mut graph[*block];
        let glyph = node.meta.glyph;
        let Some(visual) = node.visual.as_mut() else {
            continue;
        };
        visual.material.color = color;
        visual.material.emissive = color;
        if let (Some(glyph), Some(face)) = (glyph, visual.face_texture.as_mut()) {
            textures.release(face.texture);
            face.texture = textures.insert(rasterize_letter(glyph, color));
        }
    }

    printer.colors = colors;
    log::debug!(
        "[colors] printer {} now {} / {}",
        printer.index,
        color,
        print_color
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{COLOR_OPTIONS, default_sections};
    use crate::printer::build_printer;

    fn material_color(graph: &SceneGraph, id: NodeId) -> Rgb {
        graph[id].visual.as_ref().expect("mesh").material.color
    }

    #[test]
    fn recolor_touches_only_colored_parts() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let sections = default_sections();
        let mut printer = build_printer(&mut graph, &mut textures, &sections[0], 0);
        let blue = COLOR_OPTIONS[3].colors;
        let nodes_before = graph.node_count();
        let textures_before = textures.len();

        apply_printer_colors(&mut graph, &mut textures, &mut printer, blue);

        assert_eq!(graph.node_count(), nodes_before);
        assert_eq!(textures.len(), textures_before);
        assert_eq!(material_color(&graph, printer.screen_glow), blue.color);
        assert_eq!(material_color(&graph, printer.bed_platform), blue.color.pale());
        assert_eq!(material_color(&graph, printer.strips[0][0]), blue.print_color);

        let spool_colors: Vec<Rgb> = graph
            .descendants(printer.spool)
            .into_iter()
            .filter_map(|id| graph[id].visual.as_ref().map(|v| v.material.color))
            .collect();
        assert!(spool_colors.contains(&DARK_GRAY));
        assert!(spool_colors.contains(&FLANGE_GRAY));
        assert!(spool_colors.contains(&blue.print_color));

        let face = graph[printer.label_blocks[0]]
            .visual
            .as_ref()
            .and_then(|v| v.face_texture)
            .expect("textured face");
        let raster = textures.get(face.texture).expect("live raster");
        assert_eq!(raster.background, blue.color);
    }

    #[test]
    fn recolor_is_idempotent() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let sections = default_sections();
        let mut printer = build_printer(&mut graph, &mut textures, &sections[1], 1);
        let green = COLOR_OPTIONS[2].colors;

        apply_printer_colors(&mut graph, &mut textures, &mut printer, green);
        let once: Vec<_> = graph.draw_list().into_iter().map(|item| item.material).collect();
        apply_printer_colors(&mut graph, &mut textures, &mut printer, green);
        let twice: Vec<_> = graph.draw_list().into_iter().map(|item| item.material).collect();
        assert_eq!(once, twice);
        assert_eq!(printer.colors, green);
    }
}
