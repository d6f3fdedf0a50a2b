// PNG output for each drawn rectangle: the whole image with the region
// greyed out, and the region cropped on its own.

use crate::occlusion::{Occlusion, Region};
use anyhow::{Context, Result};
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::{info, warn};
use std::path::{Path, PathBuf};

pub fn masked_file_name(index: usize) -> String {
    format!("output_rectangle_{}.png", index)
}

pub fn cropped_file_name(index: usize) -> String {
    format!("cropped_rectangle_{}.png", index)
}

/// Copy of `image` with `occlusion` painted over it.
pub fn mask(image: &RgbaImage, occlusion: &Occlusion) -> RgbaImage {
    let mut out = image.clone();
    let r = occlusion.region.clamp_to(out.width(), out.height());
    let fill = Rgba(occlusion.color);
    for y in r.y..r.y + r.height {
        for x in r.x..r.x + r.width {
            out.put_pixel(x, y, fill);
        }
    }
    out
}

pub fn crop(image: &RgbaImage, region: &Region) -> Option<RgbaImage> {
    let r = region.clamp_to(image.width(), image.height());
    if r.is_empty() {
        return None;
    }
    Some(imageops::crop_imm(image, r.x, r.y, r.width, r.height).to_image())
}

fn save(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Unable to save image {}", path.display()))
}

/// Writes the masked and cropped variant for each occlusion into `dir`.
/// A failing file is logged and skipped; the written paths are returned.
pub fn write_all(image: &DynamicImage, occlusions: &[Occlusion], dir: &Path) -> Vec<PathBuf> {
    let rgba = image.to_rgba8();
    let mut written = Vec::new();

    for (i, occlusion) in occlusions.iter().enumerate() {
        let index = i + 1;

        let masked_path = dir.join(masked_file_name(index));
        match save(&mask(&rgba, occlusion), &masked_path) {
            Ok(()) => {
                info!("Image saved successfully: {}", masked_path.display());
                written.push(masked_path);
            }
            Err(e) => warn!("{:#}", e),
        }

        let Some(cropped) = crop(&rgba, &occlusion.region) else {
            warn!("Rectangle {} lies outside the image, nothing to crop", index);
            continue;
        };
        let cropped_path = dir.join(cropped_file_name(index));
        match save(&cropped, &cropped_path) {
            Ok(()) => {
                info!("Image saved successfully: {}", cropped_path.display());
                written.push(cropped_path);
            }
            Err(e) => warn!("{:#}", e),
        }
    }
    written
}
