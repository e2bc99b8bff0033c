//! PNG/JPEG texture loading.

use std::sync::Arc;

use image::RgbaImage;
use nuiview_core::math::UVec2;

use crate::error::AssetResult;
use crate::loader::{AssetLoader, LoadContext};
use crate::urn::Urn;

/// A decoded texture, stored as RGBA8.
#[derive(Debug, Clone)]
pub struct TextureRegion {
    urn: Urn,
    image: Arc<RgbaImage>,
}

impl TextureRegion {
    pub fn new(urn: Urn, image: RgbaImage) -> Self {
        Self {
            urn,
            image: Arc::new(image),
        }
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }
}

/// Decodes `.png` and `.jpeg` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLoader;

/// Decode image bytes of any supported format to RGBA8.
pub(crate) fn decode_rgba(ctx: &LoadContext<'_>, bytes: &[u8]) -> AssetResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ctx.error(format!("image decode failed: {}", e)))
}

impl AssetLoader for ImageLoader {
    type Asset = TextureRegion;
    type Env = ();

    fn extensions(&self) -> &[&str] {
        &["png", "jpeg"]
    }

    fn load(&self, ctx: LoadContext<'_>, _env: &()) -> AssetResult<TextureRegion> {
        let image = decode_rgba(&ctx, ctx.bytes)?;
        Ok(TextureRegion::new(ctx.urn.clone(), image))
    }

    fn name(&self) -> &'static str {
        "image"
    }
}
