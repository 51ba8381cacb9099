//! Preview image decoding off the UI thread.

const PREVIEW_MAX_EDGE: u32 = 1024;

#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic
        .thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
        .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgba};

    use super::*;

    #[test]
    fn decodes_png_into_rgba() {
        let source: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let mut png = Cursor::new(Vec::new());
        source.write_to(&mut png, ImageFormat::Png).expect("encode");

        let preview = decode_preview_image(png.get_ref()).expect("decode");
        assert_eq!((preview.width, preview.height), (4, 2));
        assert_eq!(preview.rgba.len(), 4 * 2 * 4);
        assert_eq!(&preview.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_preview_image(b"<html>not an image</html>").is_err());
    }
}
