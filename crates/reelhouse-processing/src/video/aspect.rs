use reelhouse_core::AspectClassification;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;
const RATIO_TOLERANCE: f64 = 0.01;

/// Bucket a frame size by aspect ratio.
///
/// Landscape is checked before portrait. A zero dimension is `Other`.
pub fn classify(width: u32, height: u32) -> AspectClassification {
    if width == 0 || height == 0 {
        return AspectClassification::Other;
    }

    let ratio = f64::from(width) / f64::from(height);
    if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
        AspectClassification::Landscape
    } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
        AspectClassification::Portrait
    } else {
        AspectClassification::Other
    }
}
