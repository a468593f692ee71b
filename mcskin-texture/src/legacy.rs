//! Upgrade of legacy 64x32 skins to the modern 64x64 layout.
//!
//! The legacy format stores textures for one arm and one leg only; modern
//! skins carry dedicated left-limb variants in the lower half. The upgrade
//! synthesizes those by copying each limb block into its modern slot,
//! mirroring every face column, and swapping the front and back faces that a
//! uniform mirror leaves transposed.

use image::RgbaImage;
use tracing::debug;

use crate::errors::{Result, SkinTextureError};
use crate::ops::{copy_region, flip_region_horizontal, swap_regions};

pub const SKIN_WIDTH: u32 = 64;
pub const LEGACY_SKIN_HEIGHT: u32 = 32;
pub const MODERN_SKIN_HEIGHT: u32 = 64;

/// Normalizes a decoded skin for rendering: modern 64x64 skins pass through
/// untouched, legacy 64x32 skins are upgraded, anything else is rejected.
pub fn process_skin(skin: RgbaImage, thin_arms: bool) -> Result<RgbaImage> {
    match skin.dimensions() {
        (SKIN_WIDTH, MODERN_SKIN_HEIGHT) => Ok(skin),
        (SKIN_WIDTH, LEGACY_SKIN_HEIGHT) => upgrade_legacy_skin(&skin, thin_arms),
        (width, height) => Err(SkinTextureError::DimensionMismatch(width, height)),
    }
}

/// Builds a 64x64 skin from a legacy 64x32 one.
///
/// The top half of the output is a verbatim copy of the input; the lower half
/// receives mirrored copies of the leg and arm blocks in the modern left-leg
/// and left-arm slots. Everything not written by those copies stays fully
/// transparent.
pub fn upgrade_legacy_skin(skin: &RgbaImage, thin_arms: bool) -> Result<RgbaImage> {
    let (width, height) = skin.dimensions();
    if (width, height) != (SKIN_WIDTH, LEGACY_SKIN_HEIGHT) {
        return Err(SkinTextureError::DimensionMismatch(width, height));
    }

    // Slim-arm limb blocks are 14px wide and do not line up with the region
    // table below.
    if thin_arms {
        return Err(SkinTextureError::UnsupportedSkinVariant);
    }

    debug!("upgrading legacy 64x32 skin to the modern 64x64 layout");

    let mut upgraded = RgbaImage::new(SKIN_WIDTH, MODERN_SKIN_HEIGHT);
    {
        let src: &[u8] = skin;
        let dst: &mut [u8] = &mut upgraded;
        dst[..src.len()].copy_from_slice(src);
    }

    // Leg block, then arm block.
    mirror_limb_block(&mut upgraded, 0, 16)?;
    mirror_limb_block(&mut upgraded, 40, 32)?;

    Ok(upgraded)
}

/// Copies the 16x16 limb block at (`src_x`, 16) into the modern slot at
/// (`dst_x`, 48) and mirrors it.
///
/// Each 4px face column of the limb unwrap is flipped in place (the two
/// middle columns carry the top and bottom faces with them), then the front
/// and back faces are swapped: mirroring every column individually leaves
/// those two transposed.
fn mirror_limb_block(image: &mut RgbaImage, src_x: u32, dst_x: u32) -> Result<()> {
    copy_region(image, src_x, 16, 16, 16, dst_x, 48)?;

    flip_region_horizontal(image, dst_x, 52, 4, 12)?;
    flip_region_horizontal(image, dst_x + 4, 48, 4, 16)?;
    flip_region_horizontal(image, dst_x + 8, 48, 4, 16)?;
    flip_region_horizontal(image, dst_x + 12, 52, 4, 12)?;

    swap_regions(image, dst_x, 52, dst_x + 8, 52, 4, 12)
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn coordinate_skin() -> RgbaImage {
        RgbaImage::from_fn(SKIN_WIDTH, LEGACY_SKIN_HEIGHT, |x, y| {
            Rgba([x as u8, y as u8, (x ^ y) as u8, 0xff])
        })
    }

    #[test]
    fn output_is_64x64_with_legacy_half_preserved() {
        let legacy = coordinate_skin();
        let upgraded = upgrade_legacy_skin(&legacy, false).unwrap();

        assert_eq!(upgraded.dimensions(), (64, 64));
        for y in 0..32 {
            for x in 0..64 {
                assert_eq!(upgraded.get_pixel(x, y), legacy.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn unwritten_areas_stay_transparent() {
        let upgraded = upgrade_legacy_skin(&coordinate_skin(), false).unwrap();

        let blank = Rgba([0u8; 4]);
        for y in 32..48 {
            for x in 0..64 {
                assert_eq!(upgraded.get_pixel(x, y), &blank, "({x}, {y})");
            }
        }
        for y in 48..64 {
            for x in (0..16).chain(48..64) {
                assert_eq!(upgraded.get_pixel(x, y), &blank, "({x}, {y})");
            }
        }
    }

    #[test]
    fn leg_faces_are_mirrored_into_the_new_slot() {
        let legacy = coordinate_skin();
        let upgraded = upgrade_legacy_skin(&legacy, false).unwrap();

        // The x=20 column is mirrored and untouched by the front/back swap;
        // the x=24 column keeps its mirrored top-face rows only (the rows
        // below are handed to the swap, checked separately).
        for dy in 0..16 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(20 + dx, 48 + dy),
                    legacy.get_pixel(4 + 3 - dx, 16 + dy)
                );
            }
        }
        for dy in 0..4 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(24 + dx, 48 + dy),
                    legacy.get_pixel(8 + 3 - dx, 16 + dy)
                );
            }
        }
        for dy in 0..12 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(28 + dx, 52 + dy),
                    legacy.get_pixel(12 + 3 - dx, 20 + dy)
                );
            }
        }
    }

    #[test]
    fn leg_front_and_back_faces_are_cross_exchanged() {
        let legacy = coordinate_skin();
        let upgraded = upgrade_legacy_skin(&legacy, false).unwrap();

        // Relative to a mirror-only reference the two 4x12 faces at x=16 and
        // x=24 trade places: each ends up holding the mirrored content of the
        // other's source column.
        for dy in 0..12 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(16 + dx, 52 + dy),
                    legacy.get_pixel(8 + 3 - dx, 20 + dy)
                );
                assert_eq!(
                    upgraded.get_pixel(24 + dx, 52 + dy),
                    legacy.get_pixel(3 - dx, 20 + dy)
                );
            }
        }
    }

    #[test]
    fn arm_block_follows_the_same_layout_shifted() {
        let legacy = coordinate_skin();
        let upgraded = upgrade_legacy_skin(&legacy, false).unwrap();

        for dy in 0..16 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(36 + dx, 48 + dy),
                    legacy.get_pixel(44 + 3 - dx, 16 + dy)
                );
            }
        }
        for dy in 0..12 {
            for dx in 0..4 {
                assert_eq!(
                    upgraded.get_pixel(32 + dx, 52 + dy),
                    legacy.get_pixel(48 + 3 - dx, 20 + dy)
                );
                assert_eq!(
                    upgraded.get_pixel(40 + dx, 52 + dy),
                    legacy.get_pixel(40 + 3 - dx, 20 + dy)
                );
            }
        }
    }

    #[test]
    fn rejects_unrecognized_dimensions() {
        let err = upgrade_legacy_skin(&RgbaImage::new(64, 64), false).unwrap_err();
        assert!(matches!(err, SkinTextureError::DimensionMismatch(64, 64)));

        let err = upgrade_legacy_skin(&RgbaImage::new(32, 32), false).unwrap_err();
        assert!(matches!(err, SkinTextureError::DimensionMismatch(32, 32)));
    }

    #[test]
    fn rejects_thin_arm_legacy_skins() {
        let err = upgrade_legacy_skin(&coordinate_skin(), true).unwrap_err();
        assert!(matches!(err, SkinTextureError::UnsupportedSkinVariant));
    }

    #[test]
    fn process_skin_passes_modern_skins_through() {
        let modern = RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 4]));
        let processed = process_skin(modern.clone(), false).unwrap();
        assert_eq!(processed, modern);
    }

    #[test]
    fn process_skin_upgrades_legacy_skins() {
        let processed = process_skin(coordinate_skin(), false).unwrap();
        assert_eq!(processed.dimensions(), (64, 64));
    }

    #[test]
    fn process_skin_rejects_other_sizes() {
        let err = process_skin(RgbaImage::new(128, 128), false).unwrap_err();
        assert!(matches!(err, SkinTextureError::DimensionMismatch(128, 128)));
    }
}
