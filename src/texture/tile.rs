//! Tile image loading and texture map output

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::tga::TgaEncoder;
use image::{ColorType, ExtendedColorType, ImageEncoder, ImageError, RgbImage};

use crate::core::types::Result;
use crate::core::Error;

fn map_image_error(err: ImageError, path: &Path) -> Error {
    match err {
        ImageError::IoError(e) => Error::from_io(e, path),
        other => Error::BadFile(format!("{}: {}", path.display(), other)),
    }
}

/// Decode a tile image; only 8-bit grey, 24-bit and 32-bit colour are accepted
pub fn load_tile_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let img = image::open(path).map_err(|e| map_image_error(e, path))?;
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 | ColorType::Rgba8 => {}
        other => {
            return Err(Error::BadFile(format!(
                "{}: unsupported pixel format {:?}",
                path.display(),
                other
            )));
        }
    }
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::BadFile(format!("{}: empty image", path.display())));
    }
    Ok(img.to_rgb8())
}

/// Write `image` as uncompressed 24-bit TGA
pub fn save_texture_map(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::from_io(e, path))?;

    TgaEncoder::new(BufWriter::new(file))
        .disable_rle()
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(|e| map_image_error(e, path))?;

    log::info!(
        "Saved {}x{} texture map to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb};

    #[test]
    fn test_tga_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("map.tga");

        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 1, Rgb([10, 20, 30]));
        save_texture_map(&img, &path).expect("save");

        let loaded = load_tile_image(&path).expect("load");
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_tga_is_uncompressed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("map.tga");
        let img = RgbImage::from_pixel(4, 4, Rgb([7, 7, 7]));
        save_texture_map(&img, &path).expect("save");

        let bytes = std::fs::read(&path).expect("read");
        // Image type 2: uncompressed true-colour
        assert_eq!(bytes[2], 2);
        assert_eq!(bytes[16], 24);
        assert!(bytes.len() >= 18 + 4 * 4 * 3);
    }

    #[test]
    fn test_grey_tile_expands_to_rgb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("grey.png");
        GrayImage::from_pixel(2, 2, Luma([90])).save(&path).expect("save png");

        let loaded = load_tile_image(&path).expect("load");
        assert_eq!(loaded.get_pixel(1, 1), &Rgb([90, 90, 90]));
    }

    #[test]
    fn test_missing_tile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_tile_image(dir.path().join("nope.tga"));
        assert!(matches!(err, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_garbage_tile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.tga");
        std::fs::write(&path, b"definitely not an image").expect("write");
        assert!(matches!(load_tile_image(&path), Err(Error::BadFile(_))));
    }

    #[test]
    fn test_sixteen_bit_tile_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deep.png");
        ImageBuffer::<Rgb<u16>, Vec<u16>>::from_pixel(2, 2, Rgb([1000, 2000, 3000]))
            .save(&path)
            .expect("save png");
        assert!(matches!(load_tile_image(&path), Err(Error::BadFile(_))));
    }
}
