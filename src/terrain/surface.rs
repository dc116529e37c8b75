//! Terrain surface: patch grid, per-frame culling and LOD, render dispatch, picking

use image::RgbImage;

use crate::core::types::{Mat4, Result, UVec2, Vec3};
use crate::core::Error;
use crate::heightfield::HeightField;
use crate::math::{Frustum, Ray};
use crate::render::{BufferId, DrawCall, PrimitiveType, RenderDevice, SkinId, VertexFormat};
use crate::texture::TextureTileBlend;
use super::config::TerrainConfig;
use super::indices::{FanVariant, PatchIndexBuilder};
use super::lod::lod_from_distance;
use super::patch::Patch;
use super::pick::{pick_fan_vertex, ray_intersects_patch, PickRegion};

/// A height-field terrain split into equally sized patches.
///
/// Lifecycle: [`init`](Self::init) builds patches from the loaded heightmap,
/// [`update`](Self::update) culls and picks LODs for the frame,
/// [`render`](Self::render) submits the visible patches, and
/// [`shutdown`](Self::shutdown) frees everything again.
pub struct TerrainSurface<D: RenderDevice> {
    device: D,
    config: TerrainConfig,
    heightfield: HeightField,
    tiles: TextureTileBlend,
    patches: Vec<Patch>,
    patch_size: u32,
    patches_per_side: u32,
    /// Heightmap size the patches were built from
    grid_size: u32,
    max_lod: u32,
    vertex_format: VertexFormat,
    skin: SkinId,
    indices: Option<PatchIndexBuilder>,
    index_buffer: Option<BufferId>,
    /// Terrain-local frustum from the last `update`
    frustum: Option<Frustum>,
}

impl<D: RenderDevice> TerrainSurface<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, TerrainConfig::default())
    }

    pub fn with_config(device: D, config: TerrainConfig) -> Self {
        Self {
            device,
            config,
            heightfield: HeightField::new(),
            tiles: TextureTileBlend::new(),
            patches: Vec::new(),
            patch_size: 0,
            patches_per_side: 0,
            grid_size: 0,
            max_lod: 0,
            vertex_format: VertexFormat::default(),
            skin: SkinId::default(),
            indices: None,
            index_buffer: None,
            frustum: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn heightfield(&self) -> &HeightField {
        &self.heightfield
    }

    /// Height and lighting edits go here; call [`update_data`](Self::update_data) afterwards.
    ///
    /// Replacing the heightmap with one of another size leaves the terrain
    /// `NotReady` until the next [`init`](Self::init).
    pub fn heightfield_mut(&mut self) -> &mut HeightField {
        &mut self.heightfield
    }

    pub fn tiles(&self) -> &TextureTileBlend {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TextureTileBlend {
        &mut self.tiles
    }

    /// Detail texture repetitions, applied at the next `init`
    pub fn set_detail_density(&mut self, density: f32) -> Result<()> {
        if !(density > 0.0) {
            return Err(Error::InvalidParameter(format!("detail density {} must be positive", density)));
        }
        self.config.detail_density = density;
        Ok(())
    }

    /// Toggle LOD 0 for every visible patch; takes effect at the next `update`
    pub fn set_brute_force(&mut self, enabled: bool) {
        self.config.brute_force = enabled;
    }

    pub fn is_ready(&self) -> bool {
        self.indices.is_some()
    }

    /// Build the patch grid from the loaded heightmap.
    ///
    /// Any previous state is shut down first. `heightmap size / patch_size`
    /// patches fit per side; samples beyond that are not covered.
    pub fn init(&mut self, patch_size: u32, format: VertexFormat, skin: SkinId) -> Result<()> {
        self.shutdown();

        if !self.heightfield.is_loaded() {
            return Err(Error::NotReady("terrain init requires a heightmap"));
        }
        if patch_size < 2 {
            return Err(Error::InvalidParameter(format!("patch size {} must be at least 2", patch_size)));
        }
        let size = self.heightfield.size();
        if patch_size > size {
            return Err(Error::OutOfRange(format!(
                "patch size {} exceeds heightmap size {}",
                patch_size, size
            )));
        }
        if !(self.config.detail_density > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "detail density {} must be positive",
                self.config.detail_density
            )));
        }

        let patches_per_side = size / patch_size;
        let covered = patches_per_side * (patch_size - 1) + 1;
        if covered < size {
            log::warn!(
                "{} patches of {} cover {} of {} samples per side; the rest is not rendered",
                patches_per_side,
                patch_size,
                covered,
                size
            );
        }

        if let Err(e) = self.build_patches(patch_size, patches_per_side, format) {
            self.shutdown();
            return Err(e);
        }
        self.skin = skin;

        log::info!(
            "Terrain initialized: {}x{} patches of {} vertices ({:?}), max LOD {}",
            patches_per_side,
            patches_per_side,
            patch_size,
            format,
            self.max_lod
        );
        Ok(())
    }

    /// Initialize with the patch size and vertex format from the config
    pub fn init_from_config(&mut self, skin: SkinId) -> Result<()> {
        self.config.validate()?;
        self.init(self.config.patch_size, self.config.vertex_format, skin)
    }

    fn build_patches(&mut self, patch_size: u32, patches_per_side: u32, format: VertexFormat) -> Result<()> {
        let count = (patches_per_side * patches_per_side) as usize;
        self.patches.try_reserve_exact(count)?;
        for pz in 0..patches_per_side {
            for px in 0..patches_per_side {
                let patch = Patch::build(
                    &mut self.heightfield,
                    UVec2::new(px, pz),
                    patch_size,
                    format,
                    self.config.detail_density,
                )?;
                self.patches.push(patch);
            }
        }

        let indices = PatchIndexBuilder::build(patch_size)?;
        self.index_buffer = Some(self.device.create_static_index_buffer(indices.indices())?);
        self.max_lod = indices.max_lod();
        self.indices = Some(indices);
        self.patch_size = patch_size;
        self.patches_per_side = patches_per_side;
        self.grid_size = self.heightfield.size();
        self.vertex_format = format;
        Ok(())
    }

    /// Free all patches and the shared index buffer
    pub fn shutdown(&mut self) {
        if let Some(buffer) = self.index_buffer.take() {
            self.device.release_index_buffer(buffer);
        }
        if self.is_ready() {
            log::info!("Terrain shut down ({} patches released)", self.patches.len());
        }
        self.patches = Vec::new();
        self.indices = None;
        self.frustum = None;
        self.patch_size = 0;
        self.patches_per_side = 0;
        self.grid_size = 0;
        self.max_lod = 0;
    }

    /// Ready, and the heightmap still has the size the patches were built for
    fn check_grid(&self) -> Result<()> {
        if !self.heightfield.is_loaded() {
            return Err(Error::NotReady("no heightmap loaded"));
        }
        if !self.is_ready() {
            return Err(Error::NotReady("terrain not initialized"));
        }
        if self.heightfield.size() != self.grid_size {
            return Err(Error::NotReady("heightmap size changed since init"));
        }
        Ok(())
    }

    /// Cull patches against the camera frustum and choose their LOD
    pub fn update(&mut self, camera_pos: Vec3, view: &Mat4, proj: &Mat4) -> Result<()> {
        self.check_grid()?;

        // Planes in terrain-local space, so patch bounds are tested untransformed
        let world = self.device.world_transform();
        let frustum = Frustum::from_matrices(&(*view * world), proj);

        let mut visible = 0;
        for patch in &mut self.patches {
            patch.culled = !frustum.intersects_aabb(patch.aabb());
            if patch.culled {
                continue;
            }
            visible += 1;

            if self.config.brute_force {
                patch.lod = 0;
            } else {
                patch.distance = camera_pos.distance(world.transform_point3(patch.aabb().center()));
                patch.lod = lod_from_distance(patch.distance, &self.config.lod_distances).min(self.max_lod);
            }
        }
        self.frustum = Some(frustum);

        log::trace!("Terrain update: {}/{} patches visible", visible, self.patches.len());
        Ok(())
    }

    /// Submit every visible patch; returns the number of draws issued.
    ///
    /// Only the full-fan variant is drawn. LODs without generated indices
    /// use the LOD 0 range.
    pub fn render(&mut self) -> Result<u32> {
        self.check_grid()?;
        let (Some(indices), Some(index_buffer)) = (self.indices.as_ref(), self.index_buffer) else {
            return Err(Error::NotReady("terrain not initialized"));
        };
        if self.frustum.is_none() {
            return Err(Error::NotReady("update must run before render"));
        }
        let finest = indices
            .lookup(0, FanVariant::Full)
            .ok_or(Error::NotReady("no index range generated"))?;

        let mut submitted = 0;
        for patch in self.patches.iter().filter(|p| !p.culled) {
            let range = indices.lookup(patch.lod, FanVariant::Full).unwrap_or(finest);
            self.device.draw_indexed(&DrawCall {
                primitive: PrimitiveType::TriangleList,
                vertices: patch.vertices().as_slice(),
                index_buffer,
                index_offset: range.offset,
                primitive_count: range.count / 3,
                skin: self.skin,
            })?;
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Refresh colour and scaled height of every vertex after height or lighting edits
    pub fn update_data(&mut self) -> Result<()> {
        self.check_grid()?;
        for patch in &mut self.patches {
            patch.refresh(&mut self.heightfield)?;
        }
        log::debug!("Refreshed vertex data of {} patches", self.patches.len());
        Ok(())
    }

    /// Bake a `size × size` texture map from the loaded tiles
    pub fn generate_texture_map(&mut self, size: u32) -> Result<RgbImage> {
        self.tiles.generate(&self.heightfield, size)
    }

    pub fn patch_size(&self) -> u32 {
        self.patch_size
    }

    pub fn patches_per_side(&self) -> u32 {
        self.patches_per_side
    }

    pub fn max_lod(&self) -> u32 {
        self.max_lod
    }

    pub fn vertex_format(&self) -> VertexFormat {
        self.vertex_format
    }

    pub fn skin(&self) -> SkinId {
        self.skin
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patch(&self, patch_x: u32, patch_z: u32) -> Option<&Patch> {
        self.patch_index(patch_x, patch_z).ok().map(|i| &self.patches[i])
    }

    pub fn index_builder(&self) -> Option<&PatchIndexBuilder> {
        self.indices.as_ref()
    }

    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }

    fn patch_index(&self, patch_x: u32, patch_z: u32) -> Result<usize> {
        if patch_x >= self.patches_per_side || patch_z >= self.patches_per_side {
            return Err(Error::OutOfRange(format!(
                "patch ({}, {}) outside {}x{} grid",
                patch_x, patch_z, self.patches_per_side, self.patches_per_side
            )));
        }
        Ok((patch_z * self.patches_per_side + patch_x) as usize)
    }

    /// World-space ray into terrain-local space
    fn local_ray(&self, origin: Vec3, direction: Vec3) -> Result<(Ray, Mat4)> {
        if direction.length_squared() == 0.0 {
            return Err(Error::InvalidParameter("pick ray has no direction".into()));
        }
        let world = self.device.world_transform();
        if world.determinant().abs() < f32::EPSILON {
            return Err(Error::InvalidParameter("world transform is not invertible".into()));
        }
        let to_local = world.inverse();
        Ok((Ray::new(origin, direction.normalize()).transform(&to_local), to_local))
    }

    /// Append every leaf region of patch (patch_x, patch_z) that the world-space ray crosses
    pub fn is_patch_picked(
        &self,
        patch_x: u32,
        patch_z: u32,
        origin: Vec3,
        direction: Vec3,
        hits: &mut Vec<PickRegion>,
    ) -> Result<bool> {
        self.check_grid()?;
        let index = self.patch_index(patch_x, patch_z)?;
        let (ray, _) = self.local_ray(origin, direction)?;

        let bounds = self.patches[index].bounds();
        let mut nodes = Vec::new();
        let hit = ray_intersects_patch(bounds, bounds.root(), &ray, &mut nodes);
        hits.extend(nodes.into_iter().map(|node| PickRegion { patch: index, node }));
        Ok(hit)
    }

    /// Heightmap coordinate of the vertex picked inside `region`, if the ray hits its fan
    pub fn is_vertex_picked(
        &self,
        region: PickRegion,
        origin: Vec3,
        direction: Vec3,
        view_point: Vec3,
    ) -> Result<Option<UVec2>> {
        self.check_grid()?;
        let indices = self.indices.as_ref().ok_or(Error::NotReady("terrain not initialized"))?;
        let patch = self.patches.get(region.patch).ok_or_else(|| {
            Error::OutOfRange(format!("patch {} outside {} patches", region.patch, self.patches.len()))
        })?;
        let (ray, to_local) = self.local_ray(origin, direction)?;
        pick_fan_vertex(patch, indices, region.node, &ray, to_local.transform_point3(view_point))
    }

    /// Pick the terrain vertex closest to the ray origin across all patches
    pub fn pick_vertex(&self, origin: Vec3, direction: Vec3) -> Result<Option<UVec2>> {
        self.check_grid()?;
        let mut regions = Vec::new();
        for pz in 0..self.patches_per_side {
            for px in 0..self.patches_per_side {
                self.is_patch_picked(px, pz, origin, direction, &mut regions)?;
            }
        }

        let world = self.device.world_transform();
        let scale = self.heightfield.scale();
        let mut best: Option<(f32, UVec2)> = None;
        for region in regions {
            let Some(coord) = self.is_vertex_picked(region, origin, direction, origin)? else {
                continue;
            };
            let local = Vec3::new(
                coord.x as f32 * scale.x,
                self.heightfield.scaled_height(coord.x, coord.y)?,
                coord.y as f32 * scale.z,
            );
            let dist = world.transform_point3(local).distance_squared(origin);
            if best.is_none_or(|(best_dist, _)| dist < best_dist) {
                best = Some((dist, coord));
            }
        }
        Ok(best.map(|(_, coord)| coord))
    }
}
