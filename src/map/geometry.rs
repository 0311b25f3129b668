use crate::braille::BrailleCanvas;
use crate::map::viewport::Viewport;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, (x0, y0): (i32, i32), (x1, y1): (i32, i32)) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a line `width` pixels wide by offsetting parallel copies
pub fn draw_wide_line(canvas: &mut BrailleCanvas, p0: (i32, i32), p1: (i32, i32), width: u32) {
    draw_line(canvas, p0, p1);
    // Offset across the dominant axis so the stroke thickens sideways.
    let steep = (p1.1 - p0.1).abs() > (p1.0 - p0.0).abs();
    for i in 1..width as i32 {
        let (ox, oy) = if steep { (i, 0) } else { (0, i) };
        draw_line(canvas, (p0.0 + ox, p0.1 + oy), (p1.0 + ox, p1.1 + oy));
    }
}

/// Draw a filled circle
pub fn draw_circle(canvas: &mut BrailleCanvas, (cx, cy): (i32, i32), radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw connected segments, skipping those that cannot be on screen or
/// that jump across most of the view.
pub fn draw_polyline(canvas: &mut BrailleCanvas, points: &[(i32, i32)], viewport: &Viewport) {
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dist = ((b.0 - a.0).abs() + (b.1 - a.1).abs()) as usize;
        if dist < viewport.width.max(viewport.height) * 2 && viewport.line_might_be_visible(a, b) {
            draw_line(canvas, a, b);
        }
    }
}
