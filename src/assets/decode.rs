use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::MosaiqResult;

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> MosaiqResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(px: image::Rgba<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, px);
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn decode_premultiplies_alpha() {
        let bytes = png_bytes(image::Rgba([255, 255, 255, 128]));
        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(&img.rgba8_premul[0..4], &[128, 128, 128, 128]);
    }

    #[test]
    fn decode_zero_alpha_clears_color() {
        let bytes = png_bytes(image::Rgba([200, 100, 50, 0]));
        let img = decode_image(&bytes).unwrap();
        assert_eq!(&img.rgba8_premul[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }
}
