/// Build script for ibl_render
///
/// # Shader Strategy:
/// - WGSL sources are embedded with `include_str!` and validated by wgpu at pipeline creation
fn main() {
    // Trigger rebuild if shader files change
    for shader in [
        "common.wgsl",
        "sampling.wgsl",
        "cube_face.wgsl",
        "fullscreen.wgsl",
        "simple_forward.wgsl",
        "sample_env_map.wgsl",
        "equirect_to_cube.wgsl",
        "irradiance.wgsl",
        "prefilter.wgsl",
        "brdf_lut.wgsl",
        "mipmap.wgsl",
    ] {
        println!("cargo:rerun-if-changed=src/renderer/shaders/{}", shader);
    }
}
