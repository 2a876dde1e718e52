use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{NAME, PIXELS, RowCollection, SIZE, TYPE};
use super::pixels::PixelMatrix;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

/// Decoded image, flattened row-major (channels interleaved for colour).
#[derive(Debug, Clone, PartialEq)]
pub struct FlatImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub extension: String,
}

/// Decode one image as 8-bit grayscale or RGB.
pub fn load_image(path: &Path, grayscale: bool) -> Result<FlatImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniffing format of {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;
    let (width, height) = (img.width(), img.height());
    let pixels = if grayscale {
        img.to_luma8().into_raw()
    } else {
        img.to_rgb8().into_raw()
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    Ok(FlatImage {
        pixels,
        width,
        height,
        extension,
    })
}

/// Row cells for one image: `name` (file stem), `type`, `size` (`WxH`),
/// `pixels` (flat list).
pub fn image_to_cells(path: &Path, grayscale: bool) -> Result<BTreeMap<String, String>> {
    let image = load_image(path, grayscale)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();
    let pixels = PixelMatrix::flat(image.pixels.iter().map(|&p| f64::from(p)).collect());

    Ok(BTreeMap::from([
        (NAME.to_string(), name),
        (TYPE.to_string(), image.extension),
        (SIZE.to_string(), format!("{}x{}", image.width, image.height)),
        (PIXELS.to_string(), pixels.render()),
    ]))
}

/// Walk `folder` recursively and flatten every supported image into a row.
///
/// Files are visited in sorted path order so the output is deterministic.
pub fn process_folder(folder: &Path, grayscale: bool) -> Result<RowCollection> {
    let mut paths = Vec::new();
    collect_images(folder, &mut paths)?;
    paths.sort();

    let mut collection = RowCollection::new(
        [NAME, TYPE, SIZE, PIXELS]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    for path in &paths {
        collection.push(image_to_cells(path, grayscale)?);
    }

    log::info!(
        "flattened {} images from {}",
        collection.len(),
        folder.display()
    );
    Ok(collection)
}

fn collect_images(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn grayscale_image_becomes_flat_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.png");
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(2, 1, Luma([250]));
        img.save(&path).unwrap();

        let cells = image_to_cells(&path, true).unwrap();
        assert_eq!(cells[NAME], "cat");
        assert_eq!(cells[TYPE], "png");
        assert_eq!(cells[SIZE], "3x2");
        assert_eq!(cells[PIXELS], "[10, 0, 0, 0, 0, 250]");
    }

    #[test]
    fn colour_image_interleaves_channels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dot.png");
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([1, 2, 3]));
        img.save(&path).unwrap();

        let image = load_image(&path, false).unwrap();
        assert_eq!(image.pixels, vec![1, 2, 3]);
        assert_eq!((image.width, image.height), (1, 1));
    }

    #[test]
    fn folder_walk_is_recursive_and_filters_extensions() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        GrayImage::new(2, 2).save(dir.path().join("b.png")).unwrap();
        GrayImage::new(2, 2).save(nested.join("a.png")).unwrap();
        std::fs::rename(nested.join("a.png"), nested.join("a.PNG")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let rows = process_folder(dir.path(), true).unwrap();
        assert_eq!(rows.len(), 2);
        let names: Vec<_> = rows.rows.iter().map(|r| r.get(NAME).unwrap()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(rows.rows[1].get(TYPE), Some("PNG"));
    }

    #[test]
    fn empty_folder_yields_empty_collection() {
        let dir = TempDir::new().unwrap();
        let rows = process_folder(dir.path(), true).unwrap();
        assert!(rows.is_empty());
        assert_eq!(rows.columns, vec!["name", "type", "size", "pixels"]);
    }
}
