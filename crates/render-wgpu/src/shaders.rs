/// WGSL shader for the shadow pass: depth only, from the light's view.
pub const SHADOW_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

@vertex
fn vs_shadow(vertex: VertexInput, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return globals.light_view_proj * model * vec4<f32>(vertex.position, 1.0);
}
"#;

/// WGSL shader for the beauty pass: instanced cubes with diffuse shading and
/// a shadow factor sampled from the light's depth map.
pub const SOLID_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var shadow_map: texture_depth_2d;
@group(1) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    return out;
}

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    let light_pos = globals.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = light_pos.xyz / light_pos.w;
    let uv = ndc.xy * vec2<f32>(0.5, -0.5) + 0.5;
    let sampled = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, ndc.z - 0.002);
    // Fragments outside the light frustum are lit.
    let in_bounds = uv.x >= 0.0 && uv.x <= 1.0 && uv.y >= 0.0 && uv.y <= 1.0;
    return select(1.0, sampled, in_bounds);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let ambient = 0.35;
    let to_light = normalize(-globals.light_dir.xyz);
    let diffuse = max(dot(in.world_normal, to_light), 0.0);
    let shadow = shadow_factor(in.world_pos);
    let lighting = ambient + (1.0 - ambient) * diffuse * shadow;
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;

/// WGSL shader for the sky background: a full-screen triangle at maximum
/// depth shading by world-space view ray.
pub const SKY_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let xy = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u)) * 2.0 - 1.0;
    var out: SkyOutput;
    out.clip_position = vec4<f32>(xy, 1.0, 1.0);
    out.ndc = xy;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let near = globals.inv_view_proj * vec4<f32>(in.ndc, 0.0, 1.0);
    let far = globals.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let ray = normalize(far.xyz / far.w - near.xyz / near.w);
    let horizon = vec3<f32>(0.74, 0.81, 0.89);
    let zenith = vec3<f32>(0.25, 0.45, 0.75);
    let t = clamp(ray.y * 0.5 + 0.5, 0.0, 1.0);
    return vec4<f32>(mix(horizon, zenith, t), 1.0);
}
"#;

/// WGSL shader for the post pass: samples the off-screen scene color with a
/// time-animated chromatic aberration offset while the effect flag is set.
pub const POST_SHADER: &str = r#"
struct PostParams {
    time: f32,
    effect: u32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> params: PostParams;
@group(0) @binding(1)
var scene_tex: texture_2d<f32>;
@group(0) @binding(2)
var scene_sampler: sampler;

struct PostOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_post(@builtin(vertex_index) index: u32) -> PostOutput {
    let xy = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u)) * 2.0 - 1.0;
    var out: PostOutput;
    out.clip_position = vec4<f32>(xy, 0.0, 1.0);
    out.uv = vec2<f32>(xy.x, -xy.y) * 0.5 + 0.5;
    return out;
}

@fragment
fn fs_post(in: PostOutput) -> @location(0) vec4<f32> {
    var eps = 0.0;
    if (params.effect != 0u) {
        eps = -0.009 * sin(params.time * 5.0);
    }
    let r = textureSample(scene_tex, scene_sampler, vec2<f32>(in.uv.x, in.uv.y - eps)).r;
    let g = textureSample(scene_tex, scene_sampler, in.uv).g;
    let b = textureSample(scene_tex, scene_sampler, vec2<f32>(in.uv.x, in.uv.y + eps)).b;
    return vec4<f32>(r, g, b, 1.0);
}
"#;
