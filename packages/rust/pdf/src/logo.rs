//! Optional header logo.

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use contractgen_shared::{ContractGenError, Result};

/// Scale `(width, height)` to fit inside `(max_width, max_height)`,
/// preserving aspect ratio. Images are never enlarged.
pub fn fit_within(width: u32, height: u32, max_width: f32, max_height: f32) -> Option<(f32, f32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (max_width / w).min(max_height / h).min(1.0);
    Some((w * scale, h * scale))
}

/// Decode the logo at `path`. Callers treat the error as recoverable and
/// render without the logo.
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).map_err(|e| ContractGenError::asset(path, e.to_string()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| ContractGenError::asset(path, e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ContractGenError::asset(path, "image has no pixels"));
    }
    debug!(path = %path.display(), width = img.width(), height = img.height(), "logo loaded");
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_logo_is_width_bound() {
        let (w, h) = fit_within(1000, 200, 144.0, 72.0).unwrap();
        assert!((w - 144.0).abs() < 1e-3);
        assert!((h - 28.8).abs() < 1e-3);
    }

    #[test]
    fn tall_logo_is_height_bound() {
        let (w, h) = fit_within(300, 600, 144.0, 72.0).unwrap();
        assert!((h - 72.0).abs() < 1e-3);
        assert!((w - 36.0).abs() < 1e-3);
    }

    #[test]
    fn small_logo_keeps_size() {
        assert_eq!(fit_within(50, 20, 144.0, 72.0), Some((50.0, 20.0)));
    }

    #[test]
    fn empty_image_is_rejected() {
        assert_eq!(fit_within(0, 20, 144.0, 72.0), None);
    }

    #[test]
    fn corrupt_logo_is_an_asset_failure() {
        let path = std::env::temp_dir().join(format!("cg-logo-{}.png", uuid::Uuid::now_v7()));
        std::fs::write(&path, b"not an image").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(
            matches!(&err, ContractGenError::AssetLoadFailure { path: p, .. } if p == &path),
            "{err:?}"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_logo_is_an_asset_failure() {
        let err = decode(Path::new("/no/such/logo.png")).unwrap_err();
        assert!(matches!(err, ContractGenError::AssetLoadFailure { .. }));
    }
}
