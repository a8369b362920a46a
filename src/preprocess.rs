use image::{imageops::FilterType, DynamicImage};

/// Rescale a line image to a fixed height, preserving aspect ratio.
///
/// Returns the input untouched when it already has the target height. The
/// width is rounded to the nearest pixel and never drops below one.
pub fn resize_to_height(image: DynamicImage, target_height: u32) -> DynamicImage {
    if image.height() == target_height {
        return image;
    }

    let scale = target_height as f64 / image.height() as f64;
    let new_width = ((image.width() as f64 * scale).round() as u32).max(1);
    image.resize_exact(new_width, target_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    #[test]
    fn matching_height_is_identity() {
        let input = blank(300, 128);
        let bytes_before = input.as_bytes().to_vec();
        let output = resize_to_height(input, 128);
        assert_eq!(output.width(), 300);
        assert_eq!(output.height(), 128);
        assert_eq!(output.as_bytes(), bytes_before.as_slice());
    }

    #[test]
    fn upscaling_doubles_width_with_height() {
        let output = resize_to_height(blank(200, 64), 128);
        assert_eq!(output.height(), 128);
        assert_eq!(output.width(), 400);
    }

    #[test]
    fn downscaling_keeps_aspect_ratio() {
        let output = resize_to_height(blank(1000, 256), 128);
        assert_eq!(output.height(), 128);
        assert_eq!(output.width(), 500);
    }

    #[test]
    fn width_rounds_to_nearest_pixel() {
        // 3 * (3/2) = 4.5, rounds away from zero
        let output = resize_to_height(blank(3, 2), 3);
        assert_eq!(output.width(), 5);
    }

    #[test]
    fn width_never_collapses_to_zero() {
        let output = resize_to_height(blank(1, 100), 10);
        assert_eq!(output.height(), 10);
        assert_eq!(output.width(), 1);
    }
}
