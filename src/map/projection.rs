use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Raw projection families available to map configurations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Equal-area conic with two standard parallels (degrees).
    Albers { parallels: [f64; 2] },
    Mercator,
    Equirectangular,
}

/// A d3-style projection pipeline: rotate the longitude, apply the raw
/// projection, offset so the configured center lands on `translate`,
/// then scale with the y axis flipped into screen space.
///
/// Configurations carry an unscaled projection; the renderer applies the
/// per-render scale and translation with [`Projection::with_scale`] and
/// [`Projection::with_translate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    kind: ProjectionKind,
    rotate_lng: f64,
    center: [f64; 2],
    scale: f64,
    translate: [f64; 2],
}

impl Projection {
    pub fn albers(parallels: [f64; 2]) -> Self {
        Self::new(ProjectionKind::Albers { parallels })
    }

    pub fn mercator() -> Self {
        Self::new(ProjectionKind::Mercator)
    }

    pub fn equirectangular() -> Self {
        Self::new(ProjectionKind::Equirectangular)
    }

    fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            rotate_lng: 0.0,
            center: [0.0, 0.0],
            scale: 150.0,
            translate: [0.0, 0.0],
        }
    }

    /// Degrees added to every longitude before projecting.
    pub fn rotate_lng(mut self, degrees: f64) -> Self {
        self.rotate_lng = degrees;
        self
    }

    /// Geographic point that projects onto `translate`.
    pub fn center(mut self, center: [f64; 2]) -> Self {
        self.center = center;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_translate(mut self, translate: [f64; 2]) -> Self {
        self.translate = translate;
        self
    }

    /// Project (lng, lat) degrees to pixel coordinates.
    pub fn project(&self, lnglat: [f64; 2]) -> [f64; 2] {
        let [x, y] = self.raw(
            normalize_lng(lnglat[0] + self.rotate_lng).to_radians(),
            lnglat[1].to_radians(),
        );
        let [cx, cy] = self.raw_center();
        [
            self.translate[0] + self.scale * (x - cx),
            self.translate[1] - self.scale * (y - cy),
        ]
    }

    /// Invert pixel coordinates back to (lng, lat) degrees. `None` when
    /// the pixel lies outside the projection's image.
    pub fn invert(&self, pixel: [f64; 2]) -> Option<[f64; 2]> {
        let [cx, cy] = self.raw_center();
        let x = (pixel[0] - self.translate[0]) / self.scale + cx;
        let y = cy - (pixel[1] - self.translate[1]) / self.scale;
        let [lambda, phi] = self.raw_invert(x, y)?;
        Some([
            normalize_lng(lambda.to_degrees() - self.rotate_lng),
            phi.to_degrees(),
        ])
    }

    fn raw_center(&self) -> [f64; 2] {
        self.raw(
            normalize_lng(self.center[0] + self.rotate_lng).to_radians(),
            self.center[1].to_radians(),
        )
    }

    fn raw(&self, lambda: f64, phi: f64) -> [f64; 2] {
        match self.kind {
            ProjectionKind::Equirectangular => [lambda, phi],
            ProjectionKind::Mercator => {
                // Clamp near the poles where the projection diverges.
                let phi = phi.clamp(-MERCATOR_PHI_MAX, MERCATOR_PHI_MAX);
                [lambda, (FRAC_PI_4 + phi / 2.0).tan().ln()]
            }
            ProjectionKind::Albers { parallels } => {
                let (n, c, rho0) = conic_constants(parallels);
                let rho = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
                [rho * (lambda * n).sin(), rho0 - rho * (lambda * n).cos()]
            }
        }
    }

    fn raw_invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        match self.kind {
            ProjectionKind::Equirectangular => Some([x, y]),
            ProjectionKind::Mercator => Some([x, 2.0 * y.exp().atan() - FRAC_PI_2]),
            ProjectionKind::Albers { parallels } => {
                let (n, c, rho0) = conic_constants(parallels);
                let rho0y = rho0 - y;
                let rho = (x * x + rho0y * rho0y).sqrt();
                let sin_phi = (c - (rho * n).powi(2)) / (2.0 * n);
                if !(-1.0..=1.0).contains(&sin_phi) {
                    return None;
                }
                Some([x.atan2(rho0y) / n, sin_phi.asin()])
            }
        }
    }
}

const MERCATOR_PHI_MAX: f64 = 85.05113 * PI / 180.0;

fn conic_constants(parallels: [f64; 2]) -> (f64, f64, f64) {
    let phi1 = parallels[0].to_radians();
    let phi2 = parallels[1].to_radians();
    let n = (phi1.sin() + phi2.sin()) / 2.0;
    let c = 1.0 + phi1.sin() * (2.0 * n - phi1.sin());
    (n, c, c.sqrt() / n)
}

fn normalize_lng(degrees: f64) -> f64 {
    let mut lng = degrees % 360.0;
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }
    lng
}
