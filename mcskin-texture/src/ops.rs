//! Rectangular region primitives over packed RGBA images.
//!
//! All operations address the image through its raw byte buffer using the
//! row-major `y * width * 4 + x * 4 + channel` convention. Region arguments
//! that fall outside the image fail with
//! [`SkinTextureError::BufferBoundsViolation`] before any byte is written;
//! zero-sized regions are no-ops.

use image::RgbaImage;

use crate::errors::{Result, SkinTextureError};

const BYTES_PER_PIXEL: usize = 4;

fn check_region(
    op: &'static str,
    image: &RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<()> {
    if x as u64 + width as u64 > image.width() as u64
        || y as u64 + height as u64 > image.height() as u64
    {
        return Err(SkinTextureError::BufferBoundsViolation {
            op,
            x,
            y,
            width,
            height,
            image_width: image.width(),
            image_height: image.height(),
        });
    }

    Ok(())
}

#[inline]
fn row_start(stride: usize, x: u32, y: u32) -> usize {
    y as usize * stride + x as usize * BYTES_PER_PIXEL
}

/// Copies a `width`x`height` region from (`src_x`, `src_y`) to
/// (`dst_x`, `dst_y`) within the same image.
///
/// The source rectangle is staged into a temporary buffer before the first
/// destination byte is written, so overlapping source and destination
/// rectangles are safe.
pub fn copy_region(
    image: &mut RgbaImage,
    src_x: u32,
    src_y: u32,
    width: u32,
    height: u32,
    dst_x: u32,
    dst_y: u32,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Ok(());
    }

    check_region("copy source", image, src_x, src_y, width, height)?;
    check_region("copy destination", image, dst_x, dst_y, width, height)?;

    let stride = image.width() as usize * BYTES_PER_PIXEL;
    let row_len = width as usize * BYTES_PER_PIXEL;
    let buf: &mut [u8] = image;

    let mut staging = vec![0u8; row_len * height as usize];
    for row in 0..height {
        let src = row_start(stride, src_x, src_y + row);
        staging[row as usize * row_len..][..row_len].copy_from_slice(&buf[src..src + row_len]);
    }

    for row in 0..height {
        let dst = row_start(stride, dst_x, dst_y + row);
        buf[dst..dst + row_len].copy_from_slice(&staging[row as usize * row_len..][..row_len]);
    }

    Ok(())
}

/// Reverses the pixel column order within the region in place, leaving row
/// order and channel order intact.
pub fn flip_region_horizontal(
    image: &mut RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Ok(());
    }

    check_region("horizontal flip", image, x, y, width, height)?;

    let stride = image.width() as usize * BYTES_PER_PIXEL;
    let row_len = width as usize * BYTES_PER_PIXEL;
    let buf: &mut [u8] = image;

    let mut staging = vec![0u8; row_len * height as usize];
    for row in 0..height {
        let src = row_start(stride, x, y + row);
        for col in 0..width {
            let mirrored = (width - 1 - col) as usize * BYTES_PER_PIXEL;
            staging[row as usize * row_len + mirrored..][..BYTES_PER_PIXEL].copy_from_slice(
                &buf[src + col as usize * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL],
            );
        }
    }

    for row in 0..height {
        let dst = row_start(stride, x, y + row);
        buf[dst..dst + row_len].copy_from_slice(&staging[row as usize * row_len..][..row_len]);
    }

    Ok(())
}

/// Exchanges the contents of two equally sized regions row by row.
///
/// The regions may be adjacent but must not overlap.
pub fn swap_regions(
    image: &mut RgbaImage,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    width: u32,
    height: u32,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Ok(());
    }

    check_region("swap", image, x1, y1, width, height)?;
    check_region("swap", image, x2, y2, width, height)?;
    debug_assert!(
        x1 + width <= x2 || x2 + width <= x1 || y1 + height <= y2 || y2 + height <= y1,
        "swap regions overlap"
    );

    let stride = image.width() as usize * BYTES_PER_PIXEL;
    let row_len = width as usize * BYTES_PER_PIXEL;
    let buf: &mut [u8] = image;

    let mut row_tmp = vec![0u8; row_len];
    for row in 0..height {
        let a = row_start(stride, x1, y1 + row);
        let b = row_start(stride, x2, y2 + row);
        row_tmp.copy_from_slice(&buf[a..a + row_len]);
        buf.copy_within(b..b + row_len, a);
        buf[b..b + row_len].copy_from_slice(&row_tmp);
    }

    Ok(())
}

/// Returns a new image whose row order is fully reversed, each row copied
/// verbatim.
pub fn flip_vertical(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let stride = width as usize * BYTES_PER_PIXEL;

    let mut flipped = RgbaImage::new(width, height);
    {
        let src: &[u8] = image;
        let dst: &mut [u8] = &mut flipped;
        for row in 0..height as usize {
            let mirrored = height as usize - 1 - row;
            dst[row * stride..][..stride].copy_from_slice(&src[mirrored * stride..][..stride]);
        }
    }

    flipped
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    /// Every pixel encodes its own coordinates, so any misplaced byte is
    /// attributable to an exact source position.
    fn coordinate_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, (x ^ y) as u8, 0xff])
        })
    }

    #[test]
    fn copy_region_moves_rows_verbatim() {
        let mut image = coordinate_image(16, 16);
        copy_region(&mut image, 1, 2, 4, 3, 9, 10).unwrap();

        for dy in 0..3 {
            for dx in 0..4 {
                assert_eq!(
                    image.get_pixel(9 + dx, 10 + dy),
                    &Rgba([(1 + dx) as u8, (2 + dy) as u8, ((1 + dx) ^ (2 + dy)) as u8, 0xff])
                );
            }
        }
    }

    #[test]
    fn copy_region_tolerates_overlap() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();
        copy_region(&mut image, 0, 0, 8, 8, 4, 4).unwrap();

        // Destination must read the source as it was before the copy began.
        for dy in 0..8 {
            for dx in 0..8 {
                assert_eq!(image.get_pixel(4 + dx, 4 + dy), original.get_pixel(dx, dy));
            }
        }
    }

    #[test]
    fn flip_region_horizontal_reverses_columns_only() {
        let mut image = coordinate_image(16, 16);
        flip_region_horizontal(&mut image, 4, 2, 6, 5).unwrap();

        for dy in 0..5 {
            for dx in 0..6 {
                assert_eq!(
                    image.get_pixel(4 + dx, 2 + dy),
                    &Rgba([(4 + 5 - dx) as u8, (2 + dy) as u8, ((4 + 5 - dx) ^ (2 + dy)) as u8, 0xff])
                );
            }
        }
    }

    #[test]
    fn flip_region_horizontal_is_an_involution() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();
        flip_region_horizontal(&mut image, 3, 1, 7, 9).unwrap();
        flip_region_horizontal(&mut image, 3, 1, 7, 9).unwrap();
        assert_eq!(image, original);
    }

    #[test]
    fn swap_regions_exchanges_contents() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();
        swap_regions(&mut image, 0, 0, 8, 8, 4, 4).unwrap();

        for dy in 0..4 {
            for dx in 0..4 {
                assert_eq!(image.get_pixel(dx, dy), original.get_pixel(8 + dx, 8 + dy));
                assert_eq!(image.get_pixel(8 + dx, 8 + dy), original.get_pixel(dx, dy));
            }
        }
    }

    #[test]
    fn swap_regions_twice_restores_both() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();
        swap_regions(&mut image, 1, 2, 9, 2, 4, 6).unwrap();
        swap_regions(&mut image, 1, 2, 9, 2, 4, 6).unwrap();
        assert_eq!(image, original);
    }

    #[test]
    fn swap_regions_handles_adjacent_regions() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();
        swap_regions(&mut image, 0, 0, 4, 0, 4, 4).unwrap();

        for dy in 0..4 {
            for dx in 0..4 {
                assert_eq!(image.get_pixel(dx, dy), original.get_pixel(4 + dx, dy));
            }
        }
    }

    #[test]
    fn flip_vertical_reverses_row_order() {
        let image = coordinate_image(8, 6);
        let flipped = flip_vertical(&image);

        for y in 0..6 {
            for x in 0..8 {
                assert_eq!(flipped.get_pixel(x, y), image.get_pixel(x, 5 - y));
            }
        }
    }

    #[test]
    fn flip_vertical_round_trips() {
        let image = coordinate_image(8, 6);
        assert_eq!(flip_vertical(&flip_vertical(&image)), image);
    }

    #[test]
    fn zero_sized_regions_are_no_ops() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();

        copy_region(&mut image, 0, 0, 0, 5, 8, 8).unwrap();
        copy_region(&mut image, 0, 0, 5, 0, 8, 8).unwrap();
        flip_region_horizontal(&mut image, 0, 0, 0, 5).unwrap();
        swap_regions(&mut image, 0, 0, 8, 8, 5, 0).unwrap();

        assert_eq!(image, original);
    }

    #[test]
    fn out_of_bounds_regions_fail_without_writing() {
        let original = coordinate_image(16, 16);
        let mut image = original.clone();

        let err = copy_region(&mut image, 12, 0, 8, 4, 0, 0).unwrap_err();
        assert!(matches!(err, SkinTextureError::BufferBoundsViolation { .. }));

        let err = flip_region_horizontal(&mut image, 0, 14, 4, 4).unwrap_err();
        assert!(matches!(err, SkinTextureError::BufferBoundsViolation { .. }));

        let err = swap_regions(&mut image, 0, 0, 14, 14, 4, 4).unwrap_err();
        assert!(matches!(err, SkinTextureError::BufferBoundsViolation { .. }));

        assert_eq!(image, original);
    }
}
