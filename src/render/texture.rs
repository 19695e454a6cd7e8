use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::error;
use thiserror::Error;

/// Failure modes of the best-effort texture loader.
///
/// None of these abort rendering: the renderer logs the error and binds the
/// fallback texture instead, so a missing or broken image shows up as a
/// flat white surface rather than a crash.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to read image file")]
    Io(#[from] std::io::Error),
    #[error("unable to decode image")]
    Decode(#[from] image::ImageError),
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),
}

/// Maps a decoded channel count to the GPU texture format used for upload.
///
/// One channel stays a single-channel texture; three-channel images are
/// expanded to RGBA at upload time since the GPU has no 24-bit sampled
/// format. Anything else is rejected.
pub fn format_for_channels(channels: u8) -> Result<wgpu::TextureFormat, TextureError> {
    match channels {
        1 => Ok(wgpu::TextureFormat::R8Unorm),
        3 | 4 => Ok(wgpu::TextureFormat::Rgba8UnormSrgb),
        other => Err(TextureError::UnsupportedChannels(other)),
    }
}

/// CPU-side result of decoding an image, ready for `write_texture`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub bytes_per_pixel: u32,
    pub pixels: Vec<u8>,
}

/// Decodes an image from memory into a tightly packed pixel buffer.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, TextureError> {
    let image = image::load_from_memory(bytes)?;
    let channels = image.color().channel_count();
    let format = format_for_channels(channels)?;
    let (width, height) = (image.width(), image.height());
    let (pixels, bytes_per_pixel) = match format {
        wgpu::TextureFormat::R8Unorm => (image.to_luma8().into_raw(), 1),
        _ => (image.to_rgba8().into_raw(), 4),
    };
    Ok(DecodedImage {
        width,
        height,
        format,
        bytes_per_pixel,
        pixels,
    })
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Texture store with a 1x1 white fallback for missing or broken images.
///
/// Load failures are remembered so a bad path is reported once, not every
/// frame.
pub struct TextureCache {
    root: PathBuf,
    cache: HashMap<String, GpuTexture>,
    missing: HashSet<String>,
    fallback: GpuTexture,
    sampler: wgpu::Sampler,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, root: PathBuf) -> Self {
        let fallback = upload(
            device,
            queue,
            &DecodedImage {
                width: 1,
                height: 1,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                bytes_per_pixel: 4,
                pixels: vec![255, 255, 255, 255],
            },
            "fallback-texture",
        );
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            root,
            cache: HashMap::new(),
            missing: HashSet::new(),
            fallback,
            sampler,
        }
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Loads and caches the image at `path`, degrading to the fallback on
    /// failure.
    pub fn ensure_loaded(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, path: &str) {
        if self.cache.contains_key(path) || self.missing.contains(path) {
            return;
        }
        match load(device, queue, &self.root, path) {
            Ok(texture) => {
                self.cache.insert(path.to_string(), texture);
            }
            Err(err) => {
                error!("failed to load texture {path}: {err}");
                self.missing.insert(path.to_string());
            }
        }
    }

    /// Returns the cached view for `path`, or the fallback view when the
    /// path is absent or failed to load.
    pub fn view(&self, path: Option<&str>) -> &wgpu::TextureView {
        path.and_then(|p| self.cache.get(p))
            .map(|texture| &texture.view)
            .unwrap_or(&self.fallback.view)
    }
}

fn load(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    root: &Path,
    path: &str,
) -> Result<GpuTexture, TextureError> {
    let bytes = std::fs::read(root.join(path))?;
    let decoded = decode_image(&bytes)?;
    Ok(upload(device, queue, &decoded, path))
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &DecodedImage,
    label: &str,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: image.format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * image.bytes_per_pixel),
            rows_per_image: Some(image.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts_map_to_formats() {
        assert_eq!(
            format_for_channels(1).unwrap(),
            wgpu::TextureFormat::R8Unorm
        );
        assert_eq!(
            format_for_channels(3).unwrap(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            format_for_channels(4).unwrap(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
    }

    #[test]
    fn odd_channel_counts_are_rejected() {
        for channels in [0, 2, 5] {
            assert!(matches!(
                format_for_channels(channels),
                Err(TextureError::UnsupportedChannels(c)) if c == channels
            ));
        }
    }

    #[test]
    fn decodes_rgb_png_to_rgba() {
        let mut bytes = Vec::new();
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(decoded.bytes_per_pixel, 4);
        assert_eq!(decoded.pixels.len(), 2 * 2 * 4);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decodes_grayscale_to_single_channel() {
        let mut bytes = Vec::new();
        let img = image::GrayImage::from_pixel(1, 1, image::Luma([128]));
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.format, wgpu::TextureFormat::R8Unorm);
        assert_eq!(decoded.pixels, vec![128]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(TextureError::Decode(_))
        ));
    }
}
