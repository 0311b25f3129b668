use std::fmt;

use glam::DVec2;

/// Pan/zoom transform: a point `p` is drawn at `p * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    #[inline]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.k + DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn invert(&self, p: DVec2) -> DVec2 {
        (p - DVec2::new(self.x, self.y)) / self.k
    }

    /// Rescale to `k` keeping the surface point under `anchor` in place.
    pub fn scale_at(&self, k: f64, anchor: DVec2) -> Self {
        let p = self.invert(anchor);
        Self {
            k,
            x: anchor.x - p.x * k,
            y: anchor.y - p.y * k,
        }
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Same text as the SVG `transform` attribute.
impl fmt::Display for ZoomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

/// The visible window onto the drawing surface, plus its zoom behaviour.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub transform: ZoomTransform,
    /// Surface pixel width
    pub width: usize,
    /// Surface pixel height
    pub height: usize,
    pub scale_extent: (f64, f64),
    /// Multiplier per zoom step
    pub step: f64,
}

impl Viewport {
    pub fn new(width: usize, height: usize, scale_extent: [f64; 2], step: f64) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            width,
            height,
            scale_extent: (scale_extent[0], scale_extent[1]),
            step,
        }
    }

    /// Clamp a requested scale into the zoom extent
    pub fn constrain_scale(&self, k: f64) -> f64 {
        k.clamp(self.scale_extent.0, self.scale_extent.1)
    }

    fn center(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Pan the view by pixel delta; the map moves the opposite way
    pub fn pan(&mut self, dx: i32, dy: i32) -> ZoomTransform {
        self.transform.x -= dx as f64;
        self.transform.y -= dy as f64;
        self.transform
    }

    /// Zoom to `k` (clamped) around the surface centre
    pub fn scale_to(&mut self, k: f64) -> ZoomTransform {
        self.scale_to_at(k, self.center())
    }

    fn scale_to_at(&mut self, k: f64, anchor: DVec2) -> ZoomTransform {
        let k = self.constrain_scale(k);
        self.transform = self.transform.scale_at(k, anchor);
        self.transform
    }

    pub fn zoom_in(&mut self) -> ZoomTransform {
        self.scale_to(self.transform.k * self.step)
    }

    pub fn zoom_out(&mut self) -> ZoomTransform {
        self.scale_to(self.transform.k / self.step)
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) -> ZoomTransform {
        self.zoom_at(px, py, self.step)
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) -> ZoomTransform {
        self.zoom_at(px, py, 1.0 / self.step)
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) -> ZoomTransform {
        let anchor = DVec2::new(px as f64, py as f64);
        self.scale_to_at(self.transform.k * factor, anchor)
    }

    pub fn reset(&mut self) -> ZoomTransform {
        self.transform = ZoomTransform::IDENTITY;
        self.transform
    }

    /// Surface point currently drawn at pixel (px, py)
    pub fn invert(&self, px: i32, py: i32) -> DVec2 {
        self.transform.invert(DVec2::new(px as f64, py as f64))
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(200, 100, [1.0, 20.0], 1.5)
    }

    #[test]
    fn test_scale_clamped_to_extent() {
        let mut vp = viewport();
        assert_eq!(vp.scale_to(25.0).k, 20.0);
        assert_eq!(vp.scale_to(0.5).k, 1.0);
    }

    #[test]
    fn test_repeated_zoom_saturates() {
        let mut vp = viewport();
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.transform.k, 20.0);
        for _ in 0..20 {
            vp.zoom_out();
        }
        assert_eq!(vp.transform.k, 1.0);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut vp = viewport();
        let before = vp.invert(40, 30);
        vp.zoom_in_at(40, 30);
        let after = vp.invert(40, 30);
        assert!((before - after).length() < 1e-9);
        assert_eq!(vp.transform.k, 1.5);
    }

    #[test]
    fn test_pan() {
        let mut vp = viewport();
        let t = vp.pan(10, -4);
        assert_eq!((t.x, t.y), (-10.0, 4.0));
        assert_eq!(vp.reset(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn test_transform_display_matches_svg_syntax() {
        let t = ZoomTransform {
            k: 2.0,
            x: -15.5,
            y: 3.0,
        };
        assert_eq!(t.to_string(), "translate(-15.5,3) scale(2)");
    }

    #[test]
    fn test_apply_invert_inverse() {
        let t = ZoomTransform {
            k: 4.0,
            x: 12.0,
            y: -8.0,
        };
        let p = DVec2::new(3.0, 7.0);
        assert!((t.invert(t.apply(p)) - p).length() < 1e-12);
    }
}
