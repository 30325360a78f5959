use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use printfolio_scene::color::Rgb;
use printfolio_scene::environment::SceneEnvironment;

pub(super) const SCENE_SHADER_SOURCE: &str = r#"
struct Globals {
    view_projection: mat4x4<f32>,
    eye: vec4<f32>,
    key_direction: vec4<f32>,
    key_color: vec4<f32>,
    fill_direction: vec4<f32>,
    fill_color: vec4<f32>,
    ambient: vec4<f32>,
    fog_color: vec4<f32>,
    fog_range: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(1)
var letter_texture: texture_2d_array<f32>;
@group(0) @binding(2)
var letter_sampler: sampler;

struct VertexIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) face: f32,
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
    @location(8) color: vec4<f32>,
    @location(9) emissive: vec4<f32>,
    @location(10) surface: vec4<f32>,
};

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) face: f32,
    @location(4) color: vec4<f32>,
    @location(5) emissive: vec4<f32>,
    @location(6) surface: vec4<f32>,
};

@vertex
fn scene_vs_main(input: VertexIn) -> VertexOut {
    let model = mat4x4<f32>(input.model_0, input.model_1, input.model_2, input.model_3);
    let world = model * vec4<f32>(input.position, 1.0);
    let normal_matrix = mat3x3<f32>(model[0].xyz, model[1].xyz, model[2].xyz);
    var out: VertexOut;
    out.position = globals.view_projection * world;
    out.world_position = world.xyz;
    out.normal = normal_matrix * input.normal;
    out.uv = input.uv;
    out.face = input.face;
    out.color = input.color;
    out.emissive = input.emissive;
    out.surface = input.surface;
    return out;
}

fn directional(normal: vec3<f32>, view_dir: vec3<f32>, direction: vec3<f32>, color: vec3<f32>, roughness: f32, metalness: f32) -> vec3<f32> {
    let to_light = -direction;
    let diffuse = max(dot(normal, to_light), 0.0);
    let half_vector = normalize(to_light + view_dir);
    let shininess = mix(96.0, 4.0, roughness);
    let specular = pow(max(dot(normal, half_vector), 0.0), shininess) * mix(0.04, 0.6, metalness);
    return color * (diffuse * (1.0 - metalness * 0.5) + specular);
}

@fragment
fn scene_fs_main(input: VertexOut) -> @location(0) vec4<f32> {
    let layer = i32(input.surface.z);
    let textured = layer >= 0 && abs(input.face - input.surface.w) < 0.5;
    let letter = textureSample(letter_texture, letter_sampler, input.uv, max(layer, 0));
    let base = select(input.color.rgb, letter.rgb, textured);

    var color = base;
    if input.emissive.w < 0.5 {
        let normal = normalize(input.normal);
        let view_dir = normalize(globals.eye.xyz - input.world_position);
        var light = globals.ambient.rgb;
        light += directional(normal, view_dir, globals.key_direction.xyz, globals.key_color.rgb, input.surface.y, input.surface.x);
        light += directional(normal, view_dir, globals.fill_direction.xyz, globals.fill_color.rgb, input.surface.y, input.surface.x);
        color = base * light + input.emissive.rgb;
    }

    let distance = length(globals.eye.xyz - input.world_position);
    let fog_span = max(globals.fog_range.y - globals.fog_range.x, 0.0001);
    let fog = clamp((distance - globals.fog_range.x) / fog_span, 0.0, 1.0);
    return vec4<f32>(mix(color, globals.fog_color.rgb, fog), input.color.a);
}
"#;

/// Scale applied to three.js-style light intensities (diffuse BRDF is `albedo / PI`).
const LIGHT_SCALE: f32 = 1.0 / std::f32::consts::PI;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct SceneGlobals {
    pub view_projection: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub key_direction: [f32; 4],
    pub key_color: [f32; 4],
    pub fill_direction: [f32; 4],
    pub fill_color: [f32; 4],
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_range: [f32; 4],
}

impl SceneGlobals {
    pub fn new(view_projection: Mat4, eye: Vec3, env: &SceneEnvironment) -> Self {
        let scaled = |color: Rgb, intensity: f32| {
            let [r, g, b] = linear_rgb(color);
            let k = intensity * LIGHT_SCALE;
            [r * k, g * k, b * k, 1.0]
        };
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            key_direction: env.key_light.direction().extend(0.0).to_array(),
            key_color: scaled(env.key_light.color, env.key_light.intensity),
            fill_direction: env.fill_light.direction().extend(0.0).to_array(),
            fill_color: scaled(env.fill_light.color, env.fill_light.intensity),
            ambient: scaled(env.ambient_color, env.ambient_intensity),
            fog_color: linear_rgba(env.fog.color, 1.0),
            fog_range: [env.fog.near, env.fog.far, 0.0, 0.0],
        }
    }
}

pub(super) fn linear_rgb(color: Rgb) -> [f32; 3] {
    color.to_array().map(srgb_to_linear)
}

pub(super) fn linear_rgba(color: Rgb, alpha: f32) -> [f32; 4] {
    let [r, g, b] = linear_rgb(color);
    [r, g, b, alpha]
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::SceneConfig;

    #[test]
    fn srgb_endpoints_map_to_linear_endpoints() {
        assert_eq!(linear_rgb(Rgb::BLACK), [0.0, 0.0, 0.0]);
        let white = linear_rgb(Rgb::WHITE);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
        let mid = linear_rgb(Rgb::from_hex(0x808080))[0];
        assert!((mid - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn globals_carry_fog_and_light_direction() {
        let env = SceneEnvironment::from_config(&SceneConfig::default());
        let globals = SceneGlobals::new(Mat4::IDENTITY, Vec3::new(0.0, 5.0, 10.0), &env);
        assert_eq!(globals.fog_range[..2], [18.0, 35.0]);
        assert!(globals.key_direction[1] < 0.0);
        assert_eq!(globals.key_direction[3], 0.0);
        assert!(globals.ambient[0] > 0.0);
    }
}
