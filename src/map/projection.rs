use glam::DVec2;
use rayon::prelude::*;

use crate::map::LineString;

const EPSILON: f64 = 1e-6;

/// Natural Earth I pseudo-cylindrical projection.
///
/// Maps longitude/latitude in degrees to surface pixels: the unit
/// projection is scaled by `scale`, its y axis flipped, then offset by
/// `translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub scale: f64,
    pub translate: DVec2,
}

impl Projection {
    /// Unit scale centred on the origin.
    pub fn natural_earth() -> Self {
        Self {
            scale: 1.0,
            translate: DVec2::ZERO,
        }
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn translate(mut self, translate: [f64; 2]) -> Self {
        self.translate = DVec2::from_array(translate);
        self
    }

    /// Project a geographic coordinate (lon, lat) to surface coordinates
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let raw = raw_forward(lon.to_radians(), lat.to_radians());
        DVec2::new(
            self.translate.x + raw.x * self.scale,
            self.translate.y - raw.y * self.scale,
        )
    }

    /// Surface coordinates back to (lon, lat)
    pub fn invert(&self, point: DVec2) -> (f64, f64) {
        let x = (point.x - self.translate.x) / self.scale;
        let y = (self.translate.y - point.y) / self.scale;
        let (lambda, phi) = raw_invert(x, y);
        (lambda.to_degrees(), phi.to_degrees())
    }

    pub fn project_line(&self, line: &[(f64, f64)]) -> Vec<DVec2> {
        line.iter().map(|&(lon, lat)| self.project(lon, lat)).collect()
    }

    /// Project many lines at once; rings are independent so this fans out
    /// over the rayon pool.
    pub fn project_lines(&self, lines: &[LineString]) -> Vec<Vec<DVec2>> {
        lines.par_iter().map(|line| self.project_line(line)).collect()
    }

    /// Choose scale and translation so every point lands inside the
    /// rectangle `[min, max]`, centred on both axes.
    ///
    /// Returns the projection unchanged when there are no points or they
    /// all coincide.
    pub fn fit_extent<'a, I>(self, min: DVec2, max: DVec2, points: I) -> Self
    where
        I: IntoIterator<Item = &'a (f64, f64)>,
    {
        let unit = Self::natural_earth();
        let mut lo = DVec2::splat(f64::INFINITY);
        let mut hi = DVec2::splat(f64::NEG_INFINITY);
        for &(lon, lat) in points {
            let p = unit.project(lon, lat);
            lo = lo.min(p);
            hi = hi.max(p);
        }

        let span = hi - lo;
        if !span.is_finite() || span.x <= 0.0 && span.y <= 0.0 {
            return self;
        }

        let extent = max - min;
        let kx = if span.x > 0.0 { extent.x / span.x } else { f64::INFINITY };
        let ky = if span.y > 0.0 { extent.y / span.y } else { f64::INFINITY };
        let k = kx.min(ky);

        let offset = min + (extent - (lo + hi) * k) / 2.0;
        Self {
            scale: k,
            translate: offset,
        }
    }
}

/// Natural Earth polynomial in radians.
fn raw_forward(lambda: f64, phi: f64) -> DVec2 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    DVec2::new(
        lambda
            * (0.8707 - 0.131979 * phi2
                + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
        phi * (1.007226
            + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
    )
}

/// Newton iteration on the latitude polynomial, then solve for longitude.
fn raw_invert(x: f64, y: f64) -> (f64, f64) {
    let mut phi = y;
    for _ in 0..25 {
        let phi2 = phi * phi;
        let phi4 = phi2 * phi2;
        let delta = (phi
            * (1.007226
                + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
            - y)
            / (1.007226
                + phi2
                    * (0.015085 * 3.0
                        + phi4
                            * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2
                                - 0.005916 * 11.0 * phi4)));
        phi -= delta;
        if delta.abs() <= EPSILON {
            break;
        }
    }

    let phi2 = phi * phi;
    let lambda = x
        / (0.8707
            + phi2 * (-0.131979 + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2))));
    (lambda, phi)
}
