//! PNG thumbnails of world snapshots

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use sandsim_core::world::Snapshot;

/// Build an RGBA image of a snapshot
///
/// Empty cells stay fully transparent; every occupied cell is drawn opaque so
/// faded gases still show up. `scale` is an integer nearest-neighbor upscale.
pub fn thumbnail(snapshot: &Snapshot, scale: u32) -> Result<RgbaImage> {
    let width = u32::try_from(snapshot.width).context("Snapshot too wide for an image")?;
    let height = u32::try_from(snapshot.height).context("Snapshot too tall for an image")?;

    let mut pixels = Vec::with_capacity(snapshot.cells.len() * 4);
    for cell in &snapshot.cells {
        if cell.is_empty() {
            pixels.extend([0, 0, 0, 0]);
        } else {
            let [r, g, b, _] = cell.color;
            pixels.extend([r, g, b, u8::MAX]);
        }
    }

    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("Failed to create image buffer"))?;

    let scale = scale.max(1);
    if scale == 1 {
        return Ok(img);
    }
    Ok(ImageBuffer::from_fn(width * scale, height * scale, |x, y| {
        *img.get_pixel(x / scale, y / scale)
    }))
}

/// Render a snapshot and write it as PNG
pub fn save_thumbnail(snapshot: &Snapshot, scale: u32, path: &Path) -> Result<()> {
    let img = thumbnail(snapshot, scale)?;
    img.save(path)
        .with_context(|| format!("Failed to write thumbnail {}", path.display()))?;
    log::info!(
        "Thumbnail saved to {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandsim_core::simulation::MaterialKind;
    use sandsim_core::world::World;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        let mut world = World::with_seed(4, 3, 1);
        world.place(1, 2, MaterialKind::Stone);
        world.place(3, 0, MaterialKind::Smoke);
        world
            .grid_mut()
            .modify(3, 0, |c| c.color[3] = 10);
        Snapshot::capture(&world)
    }

    #[test]
    fn test_empty_is_transparent_and_cells_opaque() {
        let snap = snapshot();
        let img = thumbnail(&snap, 1).unwrap();

        assert_eq!((img.width(), img.height()), (4, 3));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);

        let stone = snap.cells[2 * 4 + 1].color;
        assert_eq!(img.get_pixel(1, 2).0, [stone[0], stone[1], stone[2], 255]);
        assert_eq!(img.get_pixel(3, 0).0[3], 255);
    }

    #[test]
    fn test_scaled_thumbnail() {
        let snap = snapshot();
        let img = thumbnail(&snap, 3).unwrap();

        assert_eq!((img.width(), img.height()), (12, 9));
        let stone = img.get_pixel(3, 6).0;
        for (x, y) in [(3, 6), (5, 8), (4, 7)] {
            assert_eq!(img.get_pixel(x, y).0, stone);
        }
        assert_eq!(img.get_pixel(2, 6).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_save_thumbnail_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thumb.png");

        save_thumbnail(&snapshot(), 2, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
