//! Snapshot persistence.
//!
//! Each capture overwrites `credit_card_detected.png` in the output
//! directory. Writes go through a temp file and rename so readers never see
//! a half-written image.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE_NAME: &str = "credit_card_detected.png";
pub const DEFAULT_OUTPUT_DIR: &str = "captures";

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    root: PathBuf,
    saved: u64,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating snapshot directory {}", root.display()))?;
        Ok(Self { root, saved: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE_NAME)
    }

    /// Number of snapshots written by this store.
    pub fn saved(&self) -> u64 {
        self.saved
    }

    /// Encode `canvas` as PNG and replace the snapshot file.
    pub fn save(&mut self, canvas: &RgbImage) -> Result<PathBuf> {
        let mut encoded = Cursor::new(Vec::new());
        canvas
            .write_to(&mut encoded, ImageFormat::Png)
            .context("encoding snapshot as PNG")?;

        let path = self.snapshot_path();
        write_atomic(&path, encoded.get_ref())
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        self.saved += 1;
        Ok(path)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn save_writes_decodable_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SnapshotStore::new(dir.path().join("out"))?;
        let mut canvas = RgbImage::new(8, 6);
        canvas.put_pixel(3, 2, Rgb([0, 255, 0]));

        let path = store.save(&canvas)?;
        assert_eq!(path, dir.path().join("out").join(SNAPSHOT_FILE_NAME));
        assert_eq!(store.saved(), 1);

        let decoded = image::open(&path)?.into_rgb8();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(*decoded.get_pixel(3, 2), Rgb([0, 255, 0]));
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_snapshot() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = SnapshotStore::new(dir.path())?;

        store.save(&RgbImage::new(4, 4))?;
        let path = store.save(&RgbImage::new(10, 2))?;

        let decoded = image::open(&path)?;
        assert_eq!((decoded.width(), decoded.height()), (10, 2));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }
}
