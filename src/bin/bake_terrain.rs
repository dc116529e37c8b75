//! Terrain baker: builds a texture map for a heightmap and smoke-tests the patch grid.
//!
//! Usage: cargo run --release --bin bake_terrain -- [OPTIONS]
//!
//! Options:
//!   --heightmap <PATH>     Raw square u8 heightmap to load
//!   --generate <SIZE>      Generate a SIZE x SIZE noise heightmap instead (default: 257)
//!   --seed <SEED>          Noise seed for --generate (default: 12345)
//!   --save-heightmap <P>   Write the (generated) heightmap as raw bytes
//!   --tile <PATH>          Texture tile, lowest band first (repeat up to 4 times)
//!   --texture-size <N>     Texture map edge length (default: config texture_size)
//!   --patch-size <N>       Vertices per patch edge (default: config patch_size)
//!   --slope                Use slope lighting instead of height lighting
//!   --config <PATH>        JSON terrain config
//!   --out <PATH>           Output TGA (default: "terrain.tga")

use std::path::PathBuf;
use std::time::Instant;

use ridgeline::core::logging;
use ridgeline::core::types::{Mat4, Result, Vec3};
use ridgeline::heightfield::{HeightmapGenerator, HeightmapParams, SlopeLight};
use ridgeline::render::{RecordingDevice, RenderDevice};
use ridgeline::terrain::{TerrainConfig, TerrainSurface};
use ridgeline::texture::{save_texture_map, MAX_TILES};

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("bake_terrain failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => TerrainConfig::from_json_file(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(patch_size) = parse_u32_arg(&args, "--patch-size") {
        config.patch_size = patch_size;
    }
    if let Some(texture_size) = parse_u32_arg(&args, "--texture-size") {
        config.texture_size = texture_size;
    }
    config.validate()?;

    let out = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "terrain.tga".to_string()));
    let tiles = parse_all_str_args(&args, "--tile");
    if tiles.len() > MAX_TILES {
        log::warn!("{} tiles given, only the first {} are used", tiles.len(), MAX_TILES);
    }

    println!("=== Ridgeline Terrain Baker ===");
    println!("Patch size:   {}", config.patch_size);
    println!("Texture size: {}", config.texture_size);
    println!("Tiles:        {}", tiles.len().min(MAX_TILES));
    println!("Output:       {}", out.display());
    println!();

    let mut terrain = TerrainSurface::with_config(RecordingDevice::new(), config.clone());

    let start = Instant::now();
    match parse_str_arg(&args, "--heightmap") {
        Some(path) => terrain.heightfield_mut().load_heightmap(path)?,
        None => {
            let size = parse_u32_arg(&args, "--generate").unwrap_or(257);
            let params = HeightmapParams {
                seed: parse_u32_arg(&args, "--seed").unwrap_or(12345),
                ..HeightmapParams::default()
            };
            *terrain.heightfield_mut() = HeightmapGenerator::new(params).generate(size)?;
        }
    }
    if let Some(path) = parse_str_arg(&args, "--save-heightmap") {
        terrain.heightfield_mut().save_heightmap(path)?;
    }
    if args.iter().any(|a| a == "--slope") {
        terrain.heightfield_mut().set_slope_lighting(SlopeLight::default())?;
    }
    let size = terrain.heightfield().size();
    println!("Heightmap {}x{} ready in {:.1?}", size, size, start.elapsed());

    for (level, path) in tiles.iter().take(MAX_TILES).enumerate() {
        terrain.tiles_mut().load_tile(level, path)?;
    }

    let start = Instant::now();
    let image = terrain.generate_texture_map(config.texture_size)?;
    save_texture_map(&image, &out)?;
    println!("Texture map baked in {:.1?}", start.elapsed());

    let skin = terrain.device_mut().register_skin(&out)?;
    let start = Instant::now();
    terrain.init_from_config(skin)?;
    println!(
        "Terrain: {}x{} patches, max LOD {}, built in {:.1?}",
        terrain.patches_per_side(),
        terrain.patches_per_side(),
        terrain.max_lod(),
        start.elapsed()
    );

    // One frame from above the centre, looking down
    let scale = terrain.heightfield().scale();
    let extent = Vec3::new(size as f32 * scale.x, 0.0, size as f32 * scale.z);
    let centre = extent * 0.5;
    let eye = centre + Vec3::new(0.0, 255.0 * scale.y + extent.x.max(extent.z), 0.0);
    let view = Mat4::look_at_rh(eye, centre, Vec3::Z);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, eye.y * 4.0);

    terrain.update(eye, &view, &proj)?;
    let draws = terrain.render()?;
    let triangles: u32 = terrain.device().draws().iter().map(|d| d.primitive_count).sum();
    println!("Frame: {} draws, {} triangles", draws, triangles);

    terrain.shutdown();
    Ok(())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_all_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}
