//! Best-effort debug snapshot of a decided shot.
//!
//! Draws the buffered trajectory and the decided hit point onto the
//! camera's most recent frame and writes a dated JPEG. Strictly
//! diagnostic: every failure is reported to the caller, which logs and
//! moves on.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use image::{Rgb, RgbImage};

use crate::domain::events::{ArrowSample, HitResult};
use crate::domain::geometry::Point;
use crate::frame::CameraFrame;
use crate::{BowError, Result};

const HIT_MARKER: Rgb<u8> = Rgb([255, 0, 0]);
const TIP_DOT: Rgb<u8> = Rgb([255, 0, 0]);

/// Render the trajectory and verdict into `dir/YYYY-MM-DD/HH-MM-SS-<cam>.jpg`.
pub fn snapshot(
    dir: &Path,
    cam_id: &str,
    frame: Option<Arc<CameraFrame>>,
    buffer: &VecDeque<ArrowSample>,
    result: &HitResult,
) -> Result<PathBuf> {
    let frame = frame.ok_or_else(|| BowError::Visualize("no frame available".into()))?;
    if buffer.is_empty() {
        return Err(BowError::Visualize("empty trajectory buffer".into()));
    }

    let mut img = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
        .ok_or_else(|| BowError::Visualize("frame buffer does not match its dimensions".into()))?;

    // Shaft lines fade from red (oldest) to green (newest).
    let n = buffer.len();
    for (i, sample) in buffer.iter().enumerate() {
        let alpha = (i + 1) as f64 / n as f64;
        let color = Rgb([(255.0 * (1.0 - alpha)) as u8, (255.0 * alpha) as u8, 0]);
        draw_line(&mut img, sample.tail, sample.tip, color);
        draw_disc(&mut img, sample.tip, 3, TIP_DOT);
    }

    draw_cross(&mut img, result.point, 12, HIT_MARKER);

    let now = Utc::now();
    let day_dir = dir.join(now.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir)?;
    let path = day_dir.join(format!("{}-{cam_id}.jpg", now.format("%H-%M-%S%.3f")));
    img.save(&path)
        .map_err(|e| BowError::Visualize(format!("saving {}: {e}", path.display())))?;
    Ok(path)
}

fn put_pixel_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Plot a line by stepping one pixel at a time along the longer axis.
fn draw_line(img: &mut RgbImage, a: Point, b: Point, color: Rgb<u8>) {
    let steps = (b[0] - a[0]).abs().max((b[1] - a[1]).abs()).ceil() as i64;
    if steps == 0 {
        put_pixel_clipped(img, a[0] as i64, a[1] as i64, color);
        return;
    }
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        let x = a[0] + (b[0] - a[0]) * t;
        let y = a[1] + (b[1] - a[1]) * t;
        put_pixel_clipped(img, x.round() as i64, y.round() as i64, color);
    }
}

fn draw_disc(img: &mut RgbImage, center: Point, radius: i64, color: Rgb<u8>) {
    let (cx, cy) = (center[0].round() as i64, center[1].round() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_clipped(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_cross(img: &mut RgbImage, center: Point, arm: i64, color: Rgb<u8>) {
    let (cx, cy) = (center[0].round() as i64, center[1].round() as i64);
    for d in -arm..=arm {
        put_pixel_clipped(img, cx + d, cy + d, color);
        put_pixel_clipped(img, cx + d, cy - d, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{DetectionCase, HitKind};

    fn frame(width: u32, height: u32) -> Arc<CameraFrame> {
        Arc::new(CameraFrame {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
            captured_at: Utc::now(),
        })
    }

    fn buffer() -> VecDeque<ArrowSample> {
        vec![
            ArrowSample {
                tip: [20.0, 40.0],
                tail: [10.0, 10.0],
                timestamp: 0.0,
                case: DetectionCase::BoxOnly,
            },
            ArrowSample {
                tip: [25.0, 55.0],
                tail: [15.0, 25.0],
                timestamp: 0.1,
                case: DetectionCase::BoxOnly,
            },
        ]
        .into()
    }

    fn result() -> HitResult {
        HitResult { point: [25.0, 55.0], inside: true, kind: HitKind::InflectionHit, h: 15.0 }
    }

    #[test]
    fn test_snapshot_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            snapshot(dir.path(), "cam1", Some(frame(64, 64)), &buffer(), &result()).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    #[test]
    fn test_snapshot_without_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = snapshot(dir.path(), "cam1", None, &buffer(), &result()).unwrap_err();
        assert!(matches!(err, BowError::Visualize(_)));
    }

    #[test]
    fn test_snapshot_with_mismatched_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bad = Arc::new(CameraFrame {
            width: 64,
            height: 64,
            pixels: vec![0; 16],
            captured_at: Utc::now(),
        });
        let err = snapshot(dir.path(), "cam1", Some(bad), &buffer(), &result()).unwrap_err();
        assert!(matches!(err, BowError::Visualize(_)));
    }

    /// Off-frame trajectory points must not panic, just clip.
    #[test]
    fn test_snapshot_clips_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = buffer();
        buf.push_back(ArrowSample {
            tip: [500.0, -50.0],
            tail: [-500.0, 500.0],
            timestamp: 0.2,
            case: DetectionCase::BoxOnly,
        });
        snapshot(dir.path(), "cam1", Some(frame(64, 64)), &buf, &result()).unwrap();
    }
}
