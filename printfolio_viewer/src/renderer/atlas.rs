//! Letter rasters packed into one `texture_2d_array`, one layer per raster.
//! The store's revision tells us when a color change replaced rasters.

use std::collections::HashMap;

use printfolio_scene::letters::{LETTER_RASTER_SIZE, TextureId, TextureStore};

const MIN_LAYERS: u32 = 8;

/// Dense layer numbering for every live raster of the expected size.
pub(super) fn assign_layers(store: &TextureStore) -> HashMap<TextureId, u32> {
    store
        .iter()
        .filter(|(_, raster)| {
            raster.size == LETTER_RASTER_SIZE
                && raster.pixels.len() == (raster.size * raster.size * 4) as usize
        })
        .enumerate()
        .map(|(layer, (id, _))| (id, layer as u32))
        .collect()
}

fn layer_capacity(needed: u32, max_layers: u32) -> u32 {
    needed.max(MIN_LAYERS).next_power_of_two().min(max_layers.max(1))
}

pub(super) struct LetterAtlas {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    capacity: u32,
    layers: HashMap<TextureId, u32>,
    revision: Option<u64>,
}

impl LetterAtlas {
    pub fn new(device: &wgpu::Device) -> Self {
        let capacity = MIN_LAYERS;
        let (texture, view) = create_array_texture(device, capacity);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("letter-atlas-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
            capacity,
            layers: HashMap::new(),
            revision: None,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn layer(&self, id: TextureId) -> Option<u32> {
        self.layers.get(&id).copied()
    }

    /// Re-uploads every raster when the store changed. Returns `true` when
    /// the texture was recreated and bind groups need rebuilding.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, store: &TextureStore) -> bool {
        if self.revision == Some(store.revision()) {
            return false;
        }
        self.revision = Some(store.revision());
        self.layers = assign_layers(store);

        let needed = self.layers.len() as u32;
        let max_layers = device.limits().max_texture_array_layers;
        let mut recreated = false;
        if needed > self.capacity {
            self.capacity = layer_capacity(needed, max_layers);
            let (texture, view) = create_array_texture(device, self.capacity);
            self.texture = texture;
            self.view = view;
            recreated = true;
            log::debug!("[viewer] letter atlas grown to {} layers", self.capacity);
        }
        if needed > self.capacity {
            log::warn!(
                "[viewer] {} letter rasters exceed the {} atlas layers; extra blocks render untextured",
                needed,
                self.capacity
            );
            let capacity = self.capacity;
            self.layers.retain(|_, layer| *layer < capacity);
        }

        for (id, layer) in &self.layers {
            let Some(raster) = store.get(*id) else {
                continue;
            };
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &self.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: *layer,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &raster.pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(raster.size * 4),
                    rows_per_image: Some(raster.size),
                },
                wgpu::Extent3d {
                    width: raster.size,
                    height: raster.size,
                    depth_or_array_layers: 1,
                },
            );
        }
        recreated
    }
}

fn create_array_texture(device: &wgpu::Device, layers: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("letter-atlas-texture"),
        size: wgpu::Extent3d {
            width: LETTER_RASTER_SIZE,
            height: LETTER_RASTER_SIZE,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("letter-atlas-view"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    });
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::color::Rgb;
    use printfolio_scene::letters::rasterize_letter;

    #[test]
    fn layers_are_dense_after_release() {
        let mut store = TextureStore::new();
        let a = store.insert(rasterize_letter('A', Rgb::from_hex(0xf06292)));
        let b = store.insert(rasterize_letter('B', Rgb::from_hex(0xf06292)));
        let c = store.insert(rasterize_letter('C', Rgb::from_hex(0xf06292)));
        store.release(b);

        let layers = assign_layers(&store);
        assert_eq!(layers.len(), 2);
        assert!(layers.contains_key(&a) && layers.contains_key(&c));
        let mut used: Vec<u32> = layers.values().copied().collect();
        used.sort_unstable();
        assert_eq!(used, vec![0, 1]);
    }

    #[test]
    fn capacity_grows_in_powers_of_two_within_limits() {
        assert_eq!(layer_capacity(3, 256), 8);
        assert_eq!(layer_capacity(9, 256), 16);
        assert_eq!(layer_capacity(40, 256), 64);
        assert_eq!(layer_capacity(300, 256), 256);
    }
}
