//! Thumbnail dimension math and dimension pooling.
//!
//! Requests sized by longest side produce many distinct `(width, height)`
//! pairs across a heterogeneous batch. Pooling groups pixel sets by their
//! exact target size so each size costs one bulk query.

use std::collections::BTreeMap;

use thumbhub_core::error::AppError;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::PixelsId;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::thumbnail::Dimensions;

/// Pixel sets grouped by the exact thumbnail size they need.
pub type DimensionPools = BTreeMap<Dimensions, Vec<PixelsId>>;

/// Thumbnail size preserving the aspect ratio of `pixels`, with
/// `longest_side` on the longer axis.
///
/// The short side is rounded to the nearest pixel and never drops below 1.
pub fn calculate_xy_widths(pixels: &Pixels, longest_side: i32) -> Dimensions {
    let long = f64::from(longest_side);
    if pixels.size_x > pixels.size_y {
        let ratio = long / f64::from(pixels.size_x);
        let height = (f64::from(pixels.size_y) * ratio).round() as i32;
        Dimensions::new(longest_side, height.max(1))
    } else {
        let ratio = long / f64::from(pixels.size_y);
        let width = (f64::from(pixels.size_x) * ratio).round() as i32;
        Dimensions::new(width.max(1), longest_side)
    }
}

/// Check a requested longest side against the configured maximum.
pub fn validate_longest_side(longest_side: u32, max_longest_side: u32) -> AppResult<i32> {
    if longest_side == 0 {
        return Err(AppError::api_usage("Thumbnail longest side must be positive"));
    }
    if longest_side > max_longest_side {
        return Err(AppError::api_usage(format!(
            "Thumbnail longest side {longest_side} exceeds maximum {max_longest_side}"
        )));
    }
    i32::try_from(longest_side)
        .map_err(|_| AppError::api_usage(format!("Thumbnail longest side {longest_side} is too large")))
}

/// Check fixed dimensions against a source pixel set.
pub fn validate_fixed(pixels: &Pixels, dimensions: Dimensions) -> AppResult<()> {
    if dimensions.width <= 0 || dimensions.height <= 0 {
        return Err(AppError::api_usage(format!(
            "Thumbnail dimensions {dimensions} must be positive"
        )));
    }
    if dimensions.width > pixels.size_x || dimensions.height > pixels.size_y {
        return Err(AppError::api_usage(format!(
            "Thumbnail dimensions {dimensions} exceed pixel set {} of {}x{}",
            pixels.id, pixels.size_x, pixels.size_y
        )));
    }
    Ok(())
}

/// Pool pixel sets by the size `size_of` assigns them.
///
/// Every pixel set lands in exactly one pool; ids keep their input order
/// within a pool and duplicates are dropped.
pub fn pool_by<'a, I, F>(pixels: I, size_of: F) -> DimensionPools
where
    I: IntoIterator<Item = &'a Pixels>,
    F: Fn(&Pixels) -> Dimensions,
{
    let mut pools = DimensionPools::new();
    for p in pixels {
        let pool = pools.entry(size_of(p)).or_default();
        if !pool.contains(&p.id) {
            pool.push(p.id);
        }
    }
    pools
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbhub_core::ErrorKind;
    use thumbhub_core::types::{GroupId, ImageId, UserId};

    fn pixels(size_x: i32, size_y: i32) -> Pixels {
        Pixels {
            id: PixelsId::new(),
            image_id: ImageId::new(),
            owner_id: UserId::new(),
            group_id: GroupId::new(),
            size_x,
            size_y,
            size_z: 1,
            size_c: 1,
            size_t: 1,
        }
    }

    #[test]
    fn test_landscape_and_portrait() {
        assert_eq!(calculate_xy_widths(&pixels(600, 400), 96), Dimensions::new(96, 64));
        assert_eq!(calculate_xy_widths(&pixels(400, 600), 96), Dimensions::new(64, 96));
        assert_eq!(calculate_xy_widths(&pixels(512, 512), 96), Dimensions::new(96, 96));
    }

    #[test]
    fn test_short_side_never_zero() {
        assert_eq!(calculate_xy_widths(&pixels(10_000, 1), 96), Dimensions::new(96, 1));
        assert_eq!(calculate_xy_widths(&pixels(1, 10_000), 96), Dimensions::new(1, 96));
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        for (x, y) in [(600, 400), (1024, 77), (3, 7), (4096, 4095), (250, 1000)] {
            for longest in [16, 96, 128, 512] {
                let p = pixels(x, y);
                let dims = calculate_xy_widths(&p, longest);
                assert_eq!(dims.longest_side(), longest);

                // One pixel of rounding on the short side.
                let (long_src, short_src, short_dst) = if x > y {
                    (x, y, dims.height)
                } else {
                    (y, x, dims.width)
                };
                let exact = f64::from(short_src) * f64::from(longest) / f64::from(long_src);
                assert!((f64::from(short_dst) - exact.max(1.0)).abs() <= 0.5 + f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_validate_longest_side() {
        assert_eq!(validate_longest_side(96, 1024).unwrap(), 96);
        assert_eq!(validate_longest_side(0, 1024).unwrap_err().kind, ErrorKind::ApiUsage);
        assert_eq!(validate_longest_side(2048, 1024).unwrap_err().kind, ErrorKind::ApiUsage);
    }

    #[test]
    fn test_longest_side_may_exceed_source() {
        // Only the configured maximum bounds the longest side; small sources upscale.
        let p = pixels(60, 40);
        let longest = validate_longest_side(512, 1024).unwrap();
        assert_eq!(calculate_xy_widths(&p, longest), Dimensions::new(512, 341));
    }

    #[test]
    fn test_validate_fixed() {
        let p = pixels(600, 400);
        assert!(validate_fixed(&p, Dimensions::new(96, 64)).is_ok());
        assert!(validate_fixed(&p, Dimensions::new(600, 400)).is_ok());
        assert_eq!(
            validate_fixed(&p, Dimensions::new(0, 64)).unwrap_err().kind,
            ErrorKind::ApiUsage
        );
        assert_eq!(
            validate_fixed(&p, Dimensions::new(-1, 64)).unwrap_err().kind,
            ErrorKind::ApiUsage
        );
        assert_eq!(
            validate_fixed(&p, Dimensions::new(96, 401)).unwrap_err().kind,
            ErrorKind::ApiUsage
        );
    }

    #[test]
    fn test_every_id_in_exactly_one_pool() {
        let batch = vec![
            pixels(600, 400),
            pixels(1200, 800),
            pixels(400, 600),
            pixels(100, 100),
            pixels(300, 300),
        ];
        let pools = pool_by(&batch, |p| calculate_xy_widths(p, 96));

        assert_eq!(pools.len(), 3);
        let total: usize = pools.values().map(Vec::len).sum();
        assert_eq!(total, batch.len());
        for p in &batch {
            let key = calculate_xy_widths(p, 96);
            let holders: Vec<_> = pools.iter().filter(|(_, ids)| ids.contains(&p.id)).collect();
            assert_eq!(holders.len(), 1);
            assert_eq!(*holders[0].0, key);
        }
    }

    #[test]
    fn test_duplicate_ids_pooled_once() {
        let p = pixels(600, 400);
        let pools = pool_by([&p, &p], |p| calculate_xy_widths(p, 96));
        assert_eq!(pools[&Dimensions::new(96, 64)], vec![p.id]);
    }
}
