//! Captured frames played back as a looping sprite

use image::RgbaImage;
use rigbake_core::{Result, RigError};

/// A sequence of equally spaced frames covering one loop of an animation
#[derive(Debug, Clone)]
pub struct SpriteAnimation {
    pub frames: Vec<RgbaImage>,
    pub width: u32,
    pub height: u32,
    /// Loop length in seconds
    pub duration: f32,
}

impl SpriteAnimation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame showing at `elapsed` seconds. Time wraps at `duration`.
    pub fn frame_index_at(&self, elapsed: f32) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        if self.duration <= 0.0 || !elapsed.is_finite() {
            return Some(0);
        }
        let mut t = elapsed.rem_euclid(self.duration);
        // rem_euclid rounds tiny negative inputs up to exactly `duration`
        if t >= self.duration {
            t = 0.0;
        }
        let phase = t / self.duration;
        let index = (phase * self.frames.len() as f32).floor() as usize;
        Some(index.min(last))
    }

    pub fn frame_at(&self, elapsed: f32) -> Option<&RgbaImage> {
        self.frame_index_at(elapsed).map(|i| &self.frames[i])
    }

    /// Lay every frame out on one image, row-major, `columns` frames per row
    pub fn to_sheet(&self, columns: u32) -> Result<RgbaImage> {
        if columns == 0 {
            return Err(RigError::InvalidArgument(
                "sprite sheet needs at least one column".into(),
            ));
        }
        if self.frames.is_empty() {
            return Err(RigError::InvalidArgument("sprite has no frames".into()));
        }

        let count = self.frames.len() as u32;
        let columns = columns.min(count);
        let rows = count.div_ceil(columns);
        let mut sheet = RgbaImage::new(columns * self.width, rows * self.height);

        for (i, frame) in self.frames.iter().enumerate() {
            let i = i as u32;
            let x = (i % columns) * self.width;
            let y = (i / columns) * self.height;
            image::imageops::replace(&mut sheet, frame, x as i64, y as i64);
        }
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sprite(n: u8) -> SpriteAnimation {
        SpriteAnimation {
            frames: (0..n)
                .map(|i| RgbaImage::from_pixel(2, 2, Rgba([i, 0, 0, 255])))
                .collect(),
            width: 2,
            height: 2,
            duration: 2.0,
        }
    }

    #[test]
    fn frame_lookup_wraps() {
        let s = sprite(4);
        assert_eq!(s.frame_index_at(0.0), Some(0));
        assert_eq!(s.frame_index_at(0.49), Some(0));
        assert_eq!(s.frame_index_at(0.5), Some(1));
        assert_eq!(s.frame_index_at(1.99), Some(3));
        assert_eq!(s.frame_index_at(2.0), Some(0));
        assert_eq!(s.frame_index_at(5.0), Some(2));
        assert_eq!(s.frame_index_at(-0.5), Some(3));
        assert_eq!(s.frame_index_at(-1e-9), Some(0));
        assert_eq!(s.frame_index_at(-2.0), Some(0));
        assert_eq!(s.frame_at(1.0).unwrap().get_pixel(0, 0)[0], 2);
    }

    #[test]
    fn empty_sprite_has_no_frame() {
        assert_eq!(sprite(0).frame_index_at(1.0), None);
        assert!(sprite(0).to_sheet(2).is_err());
    }

    #[test]
    fn sheet_is_row_major() {
        let sheet = sprite(5).to_sheet(3).unwrap();
        assert_eq!(sheet.dimensions(), (6, 4));
        assert_eq!(sheet.get_pixel(0, 0)[0], 0);
        assert_eq!(sheet.get_pixel(4, 0)[0], 2);
        assert_eq!(sheet.get_pixel(2, 2)[0], 4);
        // Unused cell stays transparent
        assert_eq!(sheet.get_pixel(4, 2)[3], 0);
    }

    #[test]
    fn columns_are_capped_by_frame_count() {
        assert_eq!(sprite(2).to_sheet(8).unwrap().dimensions(), (4, 2));
        assert!(sprite(2).to_sheet(0).is_err());
    }
}
