//! Geometry for one bed-slinger printer and the handles the animators need.
//!
//! Everything is placed relative to the printer root, which sits at the
//! section position. Named groups (`toolhead`, `gantry`, `heatbed`, `layers`,
//! `spoolGroup`, `tubeGroup`, `label`) are the parts that move at runtime.

use std::f32::consts::PI;

use glam::Vec3;

use crate::color::{ColorPair, Rgb};
use crate::config::SectionDescriptor;
use crate::geometry::{BoxFace, Shape};
use crate::graph::{FaceTexture, InteractiveRole, Material, NodeId, RoleTag, SceneGraph, Transform};
use crate::letters::{TextureStore, rasterize_letter};

pub const LAYER_COUNT: usize = 30;
pub const STRIPS_PER_LAYER: usize = 8;
pub const LAYER_HEIGHT: f32 = 0.05;
pub const LAYERS_BASE_Y: f32 = -1.38;
pub const PRINT_SIZE: f32 = 1.2;
pub const STRIP_DEPTH: f32 = PRINT_SIZE / STRIPS_PER_LAYER as f32;
pub const TOOLHEAD_Z: f32 = -0.85;
pub const NOZZLE_LENGTH: f32 = 0.28;
pub const SPOOL_POSITION: Vec3 = Vec3::new(0.4, 1.7, -1.05);
pub const SPOOL_OUTER_RADIUS: f32 = 0.27;

pub const DARK_GRAY: Rgb = Rgb::from_hex(0x2a2a2a);
pub const FLANGE_GRAY: Rgb = Rgb::from_hex(0x444444);

const UPRIGHT_X: f32 = 1.25;
const UPRIGHT_Z: f32 = -1.05;
const GANTRY_Y: f32 = 1.2;
const HEATBED_Y: f32 = -1.45;

const LABEL_BLOCK_SIZE: f32 = 0.28;
const LABEL_BLOCK_HEIGHT: f32 = 0.12;
const LABEL_GAP: f32 = 0.06;
const LABEL_ROW_Y: f32 = -2.08 + LABEL_BLOCK_HEIGHT / 2.0;
const LABEL_ROW_Z: f32 = 1.9;
pub const LABEL_EMISSIVE: f32 = 0.15;

pub const BUTTON_IDLE_EMISSIVE: f32 = 0.2;
pub const BUTTON_BOOST_EMISSIVE: f32 = 0.8;

/// Handles into one printer's subtree.
#[derive(Debug, Clone)]
pub struct Printer {
    pub index: usize,
    pub section_id: String,
    pub colors: ColorPair,
    pub root: NodeId,
    pub toolhead: NodeId,
    pub gantry: NodeId,
    pub heatbed: NodeId,
    pub bed_platform: NodeId,
    pub build_surface: NodeId,
    pub layers: NodeId,
    /// `strips[layer][strip]`.
    pub strips: Vec<Vec<NodeId>>,
    pub spool: NodeId,
    pub tube_group: NodeId,
    pub speed_button: NodeId,
    pub screen_glow: NodeId,
    pub label: NodeId,
    pub label_blocks: Vec<NodeId>,
}

struct Materials {
    white_plastic: Material,
    dark_gray: Material,
    light_gray: Material,
    aluminum: Material,
}

impl Materials {
    fn new() -> Self {
        Self {
            white_plastic: Material::standard(Rgb::from_hex(0xf5f5f5), 0.1, 0.6),
            dark_gray: Material::standard(DARK_GRAY, 0.3, 0.5),
            light_gray: Material::standard(Rgb::from_hex(0x808080), 0.5, 0.4),
            aluminum: Material::standard(Rgb::from_hex(0xc0c0c0), 0.8, 0.2),
        }
    }
}

fn place(
    graph: &mut SceneGraph,
    parent: NodeId,
    shape: Shape,
    material: Material,
    position: Vec3,
) -> NodeId {
    let id = graph.add_mesh(parent, shape, material);
    graph[id].transform.position = position;
    id
}

fn named(graph: &mut SceneGraph, id: NodeId, name: &str) -> NodeId {
    graph[id].name = Some(name.to_string());
    id
}

pub fn strip_z(strip: usize) -> f32 {
    STRIP_DEPTH / 2.0 + strip as f32 * STRIP_DEPTH - PRINT_SIZE / 2.0
}

pub fn filament_material(print_color: Rgb) -> Material {
    Material::standard(print_color, 0.1, 0.6)
}

pub fn tube_material(print_color: Rgb) -> Material {
    Material::standard(print_color, 0.1, 0.5)
}

fn print_material(print_color: Rgb) -> Material {
    Material::standard(print_color, 0.15, 0.6)
}

pub fn label_material(color: Rgb) -> Material {
    Material::standard(color, 0.1, 0.3).with_emissive(color, LABEL_EMISSIVE)
}

/// X of the left edge of the first block for a row of `text`.
pub fn row_start(text: &str, block: f32, gap: f32, space: f32) -> f32 {
    let letters = text.chars().filter(|c| *c != ' ').count() as f32;
    let spaces = text.chars().filter(|c| *c == ' ').count() as f32;
    let width = letters * (block + gap) - gap + spaces * space;
    -width / 2.0
}

pub fn build_printer(
    graph: &mut SceneGraph,
    textures: &mut TextureStore,
    section: &SectionDescriptor,
    index: usize,
) -> Printer {
    let colors = section.colors();
    let mats = Materials::new();
    let scene_root = graph.root();
    let root = graph.add_group(scene_root, &format!("printer_{}", section.id));
    graph[root].transform = Transform::at(section.position);
    graph[root].role = Some(RoleTag::printer(InteractiveRole::PrinterBody, index));

    // frame
    place(graph, root, Shape::cuboid(2.8, 0.35, 2.4), mats.white_plastic, Vec3::new(0.0, -1.85, 0.0));
    place(graph, root, Shape::cuboid(2.82, 0.05, 2.42), mats.dark_gray, Vec3::new(0.0, -1.65, 0.0));

    let button_material = Material::standard(colors.color, 0.3, 0.4)
        .with_emissive(colors.color, BUTTON_IDLE_EMISSIVE);
    let speed_button = place(
        graph,
        root,
        Shape::cylinder(0.12, 0.05, 32),
        button_material,
        Vec3::new(1.2, -1.57, 1.0),
    );
    named(graph, speed_button, "speedButton");
    graph[speed_button].role = Some(RoleTag::printer(InteractiveRole::SpeedButton, index));

    place(graph, root, Shape::cuboid(0.4, 0.15, 2.3), mats.white_plastic, Vec3::new(0.0, -1.55, 0.0));

    let lead_screw = Material::standard(Rgb::from_hex(0xb8860b), 0.9, 0.2);
    for side in [-1.0f32, 1.0] {
        place(
            graph,
            root,
            Shape::cuboid(0.25, 3.4, 0.25),
            mats.aluminum,
            Vec3::new(side * UPRIGHT_X, 0.0, UPRIGHT_Z),
        );
        place(
            graph,
            root,
            Shape::cylinder(0.025, 3.2, 8),
            lead_screw,
            Vec3::new(side * (UPRIGHT_X - 0.18), 0.0, UPRIGHT_Z),
        );
    }

    let gantry = graph.add_group(root, "gantry");
    graph[gantry].transform = Transform::at(Vec3::new(0.0, GANTRY_Y, 0.0));
    let gantry_width = UPRIGHT_X * 2.0;
    place(graph, gantry, Shape::cuboid(gantry_width, 0.18, 0.15), mats.aluminum, Vec3::new(0.0, 0.0, UPRIGHT_Z));
    place(
        graph,
        gantry,
        Shape::cuboid(gantry_width - 0.1, 0.05, 0.06),
        mats.light_gray,
        Vec3::new(0.0, 0.0, UPRIGHT_Z + 0.1),
    );
    for side in [-1.0f32, 1.0] {
        place(
            graph,
            gantry,
            Shape::cuboid(0.28, 0.22, 0.2),
            mats.dark_gray,
            Vec3::new(side * UPRIGHT_X, 0.0, UPRIGHT_Z),
        );
    }
    place(
        graph,
        gantry,
        Shape::cuboid(0.15, 0.08, 0.12),
        mats.dark_gray,
        Vec3::new(-UPRIGHT_X - 0.18, -0.05, UPRIGHT_Z + 0.1),
    );

    place(
        graph,
        root,
        Shape::cuboid(gantry_width + 0.25, 0.08, 0.08),
        mats.aluminum,
        Vec3::new(0.0, SPOOL_POSITION.y, UPRIGHT_Z),
    );

    let toolhead = build_toolhead(graph, root, &mats);
    let (heatbed, bed_platform, build_surface) = build_heatbed(graph, root, colors.color);
    let spool = build_spool(graph, root, &mats, colors.print_color, index);
    let tube_group = graph.add_group(root, "tubeGroup");
    let (layers, strips) = build_layers(graph, root, colors.print_color);

    place(
        graph,
        root,
        Shape::cuboid(0.5, 0.35, 0.03),
        Material::standard(Rgb::from_hex(0x1a1a1a), 0.8, 0.2),
        Vec3::new(0.0, -1.75, 1.22),
    );
    let screen_glow = place(
        graph,
        root,
        Shape::cuboid(0.45, 0.3, 0.01),
        Material::unlit(colors.color, 0.5),
        Vec3::new(0.0, -1.75, 1.24),
    );
    named(graph, screen_glow, "screenGlow");

    let (label, label_blocks) = build_label(graph, textures, root, &section.title, colors.color, index);

    log::debug!(
        "[printer] built {} ({} label blocks, {} strips)",
        section.id,
        label_blocks.len(),
        LAYER_COUNT * STRIPS_PER_LAYER
    );

    Printer {
        index,
        section_id: section.id.clone(),
        colors,
        root,
        toolhead,
        gantry,
        heatbed,
        bed_platform,
        build_surface,
        layers,
        strips,
        spool,
        tube_group,
        speed_button,
        screen_glow,
        label,
        label_blocks,
    }
}

fn build_toolhead(graph: &mut SceneGraph, root: NodeId, mats: &Materials) -> NodeId {
    let toolhead = graph.add_group(root, "toolhead");
    graph[toolhead].transform = Transform::at(Vec3::new(0.0, GANTRY_Y, UPRIGHT_Z + 0.2));

    place(graph, toolhead, Shape::cuboid(0.2, 0.2, 0.12), mats.dark_gray, Vec3::new(0.0, 0.0, -0.2));
    place(graph, toolhead, Shape::cuboid(0.12, 0.1, 0.25), mats.dark_gray, Vec3::new(0.0, 0.0, -0.08));
    place(graph, toolhead, Shape::cuboid(0.32, 0.4, 0.2), mats.dark_gray, Vec3::ZERO);
    for fin in 0..4 {
        place(
            graph,
            toolhead,
            Shape::cuboid(0.3, 0.02, 0.18),
            mats.light_gray,
            Vec3::new(0.0, 0.25 + fin as f32 * 0.04, 0.0),
        );
    }
    place(graph, toolhead, Shape::cuboid(0.34, 0.12, 0.08), mats.dark_gray, Vec3::new(0.0, -0.08, 0.12));

    let nozzle = place(
        graph,
        toolhead,
        Shape::cone(0.04, 0.12, 8),
        Material::standard(Rgb::from_hex(0xd4a017), 0.95, 0.1),
        Vec3::new(0.0, -0.26, 0.0),
    );
    graph[nozzle].transform.rotation.x = PI;
    named(graph, nozzle, "nozzle");

    place(graph, toolhead, Shape::cylinder(0.04, 0.08, 8), mats.dark_gray, Vec3::new(0.0, 0.45, 0.0));
    toolhead
}

fn build_heatbed(graph: &mut SceneGraph, root: NodeId, color: Rgb) -> (NodeId, NodeId, NodeId) {
    let heatbed = graph.add_group(root, "heatbed");
    graph[heatbed].transform = Transform::at(Vec3::new(0.0, HEATBED_Y, 0.0));

    let platform = place(
        graph,
        heatbed,
        Shape::cuboid(2.1, 0.06, 2.1),
        Material::standard(color.pale(), 0.1, 0.6),
        Vec3::ZERO,
    );
    named(graph, platform, "bedPlatform");
    let surface = place(
        graph,
        heatbed,
        Shape::cuboid(2.0, 0.02, 2.0),
        Material::standard(color, 0.2, 0.8),
        Vec3::new(0.0, 0.04, 0.0),
    );
    named(graph, surface, "buildSurface");

    let grid = Material::unlit(Rgb::BLACK, 0.15);
    for step in 0..10 {
        let offset = -0.9 + step as f32 * 0.2;
        place(graph, heatbed, Shape::cuboid(0.006, 0.002, 1.9), grid, Vec3::new(offset, 0.06, 0.0));
        place(graph, heatbed, Shape::cuboid(1.9, 0.002, 0.006), grid, Vec3::new(0.0, 0.06, offset));
    }

    place(
        graph,
        heatbed,
        Shape::cuboid(0.15, 0.05, 0.08),
        Material::standard(Rgb::from_hex(0xff6b35), 0.0, 0.9),
        Vec3::new(0.85, 0.08, -0.95),
    );
    (heatbed, platform, surface)
}

fn build_spool(
    graph: &mut SceneGraph,
    root: NodeId,
    mats: &Materials,
    print_color: Rgb,
    index: usize,
) -> NodeId {
    let spool = graph.add_group(root, "spoolGroup");
    graph[spool].transform = Transform::at(SPOOL_POSITION);
    graph[spool].role = Some(RoleTag::printer(InteractiveRole::Spool, index));

    let hub = place(graph, spool, Shape::cylinder(0.08, 0.22, 16), mats.dark_gray, Vec3::ZERO);
    graph[hub].transform.rotation.z = PI / 2.0;

    for winding in 0..7 {
        let torus = place(
            graph,
            spool,
            Shape::Torus {
                radius: 0.1 + winding as f32 * 0.025,
                tube: 0.012,
                radial_segments: 8,
                tubular_segments: 32,
            },
            filament_material(print_color),
            Vec3::ZERO,
        );
        graph[torus].transform.rotation.y = PI / 2.0;
    }

    let wind_line = Material::standard(print_color, 0.15, 0.5);
    for line in 0..9 {
        let id = place(
            graph,
            spool,
            Shape::cylinder(SPOOL_OUTER_RADIUS, 0.008, 24),
            wind_line,
            Vec3::new(-0.08 + line as f32 * 0.02, 0.0, 0.0),
        );
        graph[id].transform.rotation.z = PI / 2.0;
    }

    let flange = Material::standard(FLANGE_GRAY, 0.2, 0.5);
    for side in [1.0f32, -1.0] {
        let id = place(
            graph,
            spool,
            Shape::Ring {
                inner: 0.08,
                outer: 0.3,
                segments: 24,
            },
            flange,
            Vec3::new(side * 0.11, 0.0, 0.0),
        );
        graph[id].transform.rotation.y = PI / 2.0;
    }
    spool
}

fn build_layers(graph: &mut SceneGraph, root: NodeId, print_color: Rgb) -> (NodeId, Vec<Vec<NodeId>>) {
    let layers = graph.add_group(root, "layers");
    graph[layers].transform = Transform::at(Vec3::new(0.0, LAYERS_BASE_Y, 0.0));
    let material = print_material(print_color);

    let mut strips = Vec::with_capacity(LAYER_COUNT);
    for layer in 0..LAYER_COUNT {
        let group = graph.add_group(layers, &format!("layer_{layer}"));
        graph[group].transform = Transform::at(Vec3::new(0.0, layer as f32 * LAYER_HEIGHT, 0.0));
        let mut row = Vec::with_capacity(STRIPS_PER_LAYER);
        for strip in 0..STRIPS_PER_LAYER {
            let id = place(
                graph,
                group,
                Shape::cuboid(PRINT_SIZE, LAYER_HEIGHT, STRIP_DEPTH),
                material,
                Vec3::new(0.0, 0.0, strip_z(strip)),
            );
            let node = &mut graph[id];
            node.visible = false;
            node.meta.layer_index = Some(layer);
            node.meta.strip_index = Some(strip);
            node.meta.original_width = Some(PRINT_SIZE);
            row.push(id);
        }
        strips.push(row);
    }
    (layers, strips)
}

fn build_label(
    graph: &mut SceneGraph,
    textures: &mut TextureStore,
    root: NodeId,
    title: &str,
    color: Rgb,
    index: usize,
) -> (NodeId, Vec<NodeId>) {
    let label = graph.add_group(root, "label");
    let text = title.to_uppercase();
    let mut cursor = row_start(&text, LABEL_BLOCK_SIZE, LABEL_GAP, LABEL_BLOCK_SIZE * 0.5);
    let mut blocks = Vec::new();

    for glyph in text.chars() {
        if glyph == ' ' {
            cursor += LABEL_BLOCK_SIZE * 0.5;
            continue;
        }
        let position = Vec3::new(cursor + LABEL_BLOCK_SIZE / 2.0, LABEL_ROW_Y, LABEL_ROW_Z);
        let block = place(
            graph,
            label,
            Shape::cuboid(LABEL_BLOCK_SIZE, LABEL_BLOCK_HEIGHT, LABEL_BLOCK_SIZE),
            label_material(color),
            position,
        );
        let texture = textures.insert(rasterize_letter(glyph, color));
        let node = &mut graph[block];
        if let Some(visual) = node.visual.as_mut() {
            visual.face_texture = Some(FaceTexture {
                face: BoxFace::PosY,
                texture,
            });
        }
        node.role = Some(RoleTag::printer(InteractiveRole::LabelBlock, index));
        node.meta.glyph = Some(glyph);
        node.meta.original_position = Some(position);
        blocks.push(block);
        cursor += LABEL_BLOCK_SIZE + LABEL_GAP;
    }
    (label, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sections;

    fn build(index: usize) -> (SceneGraph, TextureStore, Printer) {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let sections = default_sections();
        let printer = build_printer(&mut graph, &mut textures, &sections[index], index);
        (graph, textures, printer)
    }

    #[test]
    fn named_parts_are_reachable() {
        let (graph, _, printer) = build(0);
        for name in [
            "toolhead",
            "gantry",
            "heatbed",
            "layers",
            "spoolGroup",
            "tubeGroup",
            "speedButton",
            "screenGlow",
            "label",
        ] {
            assert!(graph.find_by_name(printer.root, name).is_some(), "{name}");
        }
        assert_eq!(graph.find_by_name(printer.root, "spoolGroup"), Some(printer.spool));
    }

    #[test]
    fn layers_start_hidden() {
        let (graph, _, printer) = build(1);
        assert_eq!(printer.strips.len(), LAYER_COUNT);
        assert!(printer.strips.iter().all(|row| row.len() == STRIPS_PER_LAYER));
        assert!(printer.strips.iter().flatten().all(|id| !graph[*id].visible));
        let strip = &graph[printer.strips[3][5]];
        assert_eq!(strip.meta.layer_index, Some(3));
        assert_eq!(strip.meta.strip_index, Some(5));
        assert!((strip.transform.position.z - strip_z(5)).abs() < 1e-6);
    }

    #[test]
    fn label_skips_spaces_and_textures_top_face() {
        let (graph, textures, printer) = build(0);
        let glyphs: String = printer
            .label_blocks
            .iter()
            .filter_map(|id| graph[*id].meta.glyph)
            .collect();
        assert_eq!(glyphs, "ABOUTME");
        assert_eq!(textures.len(), 7);

        let first = &graph[printer.label_blocks[0]];
        let visual = first.visual.as_ref().expect("label block has a mesh");
        assert_eq!(visual.face_texture.map(|t| t.face), Some(BoxFace::PosY));
        // 7 letters + 1 space: 7 * 0.34 - 0.06 + 0.14 = 2.46
        assert!((first.transform.position.x - (-1.23 + 0.14)).abs() < 1e-5);
        assert_eq!(first.meta.original_position, Some(first.transform.position));
    }

    #[test]
    fn interactive_parts_resolve_to_printer() {
        let (graph, _, printer) = build(2);
        let winding = graph[printer.spool].children()[1];
        let chain = graph.role_chain(winding);
        assert_eq!(chain[0].role, InteractiveRole::Spool);
        assert_eq!(graph.printer_of(winding), Some(2));
        assert_eq!(
            graph.role_chain(printer.speed_button)[0],
            RoleTag::printer(InteractiveRole::SpeedButton, 2)
        );
        assert_eq!(
            graph.role_chain(printer.label_blocks[0])[0].role,
            InteractiveRole::LabelBlock
        );
    }
}
