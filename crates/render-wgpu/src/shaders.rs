/// WGSL shader for textured, lit meshes.
///
/// Lambert or Blinn-Phong shading from the ambient term, one shadowed
/// directional light and one ranged point light, followed by emissive and
/// linear fog.
pub const MESH_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    // xyz position, w range (0 disables the light)
    point_pos: vec4<f32>,
    point_color: vec4<f32>,
    fog_color: vec4<f32>,
    // x near, y far, z enabled
    fog_params: vec4<f32>,
    light_view_proj: mat4x4<f32>,
    // x enabled, y depth bias, z texel size
    shadow_params: vec4<f32>,
};

struct Item {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    // rgb specular color, w shininess
    specular: vec4<f32>,
    emissive: vec4<f32>,
    // xy uv repeat, z shading mode (0 lambert, 1 phong, 2 unlit), w receives shadows
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> item: Item;

@group(2) @binding(0)
var base_map: texture_2d<f32>;
@group(2) @binding(1)
var base_sampler: sampler;

@group(3) @binding(0)
var shadow_map: texture_depth_2d;
@group(3) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = item.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (item.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv * item.params.xy;
    return out;
}

fn specular_term(n: vec3<f32>, l: vec3<f32>, v: vec3<f32>) -> f32 {
    let h = normalize(l + v);
    return pow(max(dot(n, h), 0.0), max(item.specular.w, 1.0));
}

// Fraction of sunlight reaching `world_pos`, 3x3 percentage-closer filtered.
fn sun_visibility(world_pos: vec3<f32>) -> f32 {
    if globals.shadow_params.x < 0.5 || item.params.w < 0.5 {
        return 1.0;
    }
    let clip = globals.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0 {
        return 1.0;
    }
    let depth = ndc.z - globals.shadow_params.y;
    let texel = globals.shadow_params.z;
    var lit = 0.0;
    for (var x = -1; x <= 1; x += 1) {
        for (var y = -1; y <= 1; y += 1) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
        }
    }
    return lit / 9.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(base_map, base_sampler, in.uv);
    let base = item.color.rgb * texel.rgb;
    let mode = item.params.z;

    var color = base;
    if mode < 1.5 {
        let n = normalize(in.world_normal);
        let v = normalize(globals.camera_pos.xyz - in.world_pos);
        let phong = mode > 0.5;

        var diffuse = globals.ambient.rgb;
        var highlight = vec3<f32>(0.0);

        let l = normalize(globals.sun_dir.xyz);
        let sun = max(dot(n, l), 0.0) * sun_visibility(in.world_pos);
        diffuse += globals.sun_color.rgb * sun;
        if phong && sun > 0.0 {
            highlight += globals.sun_color.rgb * specular_term(n, l, v);
        }

        let range = globals.point_pos.w;
        let to_point = globals.point_pos.xyz - in.world_pos;
        let dist = length(to_point);
        if range > 0.0 && dist < range {
            let pl = to_point / max(dist, 0.0001);
            let fade = 1.0 - dist / range;
            let falloff = fade * fade;
            let lit = max(dot(n, pl), 0.0);
            diffuse += globals.point_color.rgb * lit * falloff;
            if phong && lit > 0.0 {
                highlight += globals.point_color.rgb * specular_term(n, pl, v) * falloff;
            }
        }

        color = base * diffuse + highlight * item.specular.rgb;
    }
    color += item.emissive.rgb;

    if globals.fog_params.z > 0.5 {
        let depth = distance(globals.camera_pos.xyz, in.world_pos);
        let fog = smoothstep(globals.fog_params.x, globals.fog_params.y, depth);
        color = mix(color, globals.fog_color.rgb, fog);
    }

    return vec4<f32>(color, item.color.a * texel.a);
}
"#;

/// WGSL shader for colored line overlays, fogged like the meshes.
pub const LINE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    point_pos: vec4<f32>,
    point_color: vec4<f32>,
    fog_color: vec4<f32>,
    fog_params: vec4<f32>,
    light_view_proj: mat4x4<f32>,
    shadow_params: vec4<f32>,
};

struct Item {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    specular: vec4<f32>,
    emissive: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> item: Item;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    let world_pos = item.model * vec4<f32>(vertex.position, 1.0);
    var out: LineOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.color = vertex.color * item.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    var color = in.color.rgb;
    if globals.fog_params.z > 0.5 {
        let depth = distance(globals.camera_pos.xyz, in.world_pos);
        let fog = smoothstep(globals.fog_params.x, globals.fog_params.y, depth);
        color = mix(color, globals.fog_color.rgb, fog);
    }
    return vec4<f32>(color, in.color.a);
}
"#;

/// Depth-only WGSL shader that renders shadow casters from the sun.
pub const SHADOW_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    point_pos: vec4<f32>,
    point_color: vec4<f32>,
    fog_color: vec4<f32>,
    fog_params: vec4<f32>,
    light_view_proj: mat4x4<f32>,
    shadow_params: vec4<f32>,
};

struct Item {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    specular: vec4<f32>,
    emissive: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> item: Item;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.light_view_proj * item.model * vec4<f32>(position, 1.0);
}
"#;
