use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrellisError};
use crate::gpu::{Gpu, SamplerParams, TextureFilter, TextureId, TextureWrap};

/// Raw RGBA8 pixels handed over by an image decoder.
///
/// Row 0 is the bottom row of the picture, as GL texture coordinates
/// expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// Converts a decoded image to RGBA8 and flips it vertically.
    #[must_use]
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() == expected {
            Ok(())
        } else {
            Err(TrellisError::config(format!(
                "{}x{} RGBA texture needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )))
        }
    }
}

/// Texture filtering and wrapping, serializable for configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::LinearMipmapLinear,
            wrap: TextureWrap::Repeat,
        }
    }
}

const BORDER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A 2D texture object with mipmaps.
#[derive(Debug)]
pub struct Texture {
    gpu: Gpu,
    id: TextureId,
    width: u32,
    height: u32,
    settings: TextureSettings,
}

impl Texture {
    pub fn new(gpu: &Gpu, data: &TextureData, settings: TextureSettings) -> Result<Self> {
        data.validate()?;

        let id = gpu.create_texture().map_err(TrellisError::Device)?;
        let texture = Self {
            gpu: gpu.clone(),
            id,
            width: data.width,
            height: data.height,
            settings,
        };

        gpu.bind_texture_2d(Some(id));
        gpu.tex_image_2d_rgba(data.width, data.height, &data.pixels);
        gpu.generate_mipmap();
        gpu.tex_parameters(SamplerParams {
            mag_filter: settings.mag_filter,
            min_filter: settings.min_filter,
            wrap: settings.wrap,
            border_color: BORDER_COLOR,
        });

        log::debug!("Uploaded {}x{} texture {id:?}", data.width, data.height);
        Ok(texture)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gpu.delete_texture(self.id);
    }
}
