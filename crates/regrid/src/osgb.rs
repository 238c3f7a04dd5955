//! Transverse Mercator projection onto the Ordnance Survey National Grid.
//!
//! Implements the forward projection from the OS "A guide to coordinate
//! systems in Great Britain" (appendix C), on the Airy 1830 ellipsoid. The
//! datum shift from WGS84 latitudes/longitudes is ignored: it is at most a
//! hundred metres or so, well below the 2 km cell size the output grid uses.

/// Airy 1830 semi-major axis (m).
const A: f64 = 6_377_563.396;
/// Airy 1830 semi-minor axis (m).
const B: f64 = 6_356_256.909;
/// Central meridian scale factor.
const F0: f64 = 0.999_601_271_7;
/// True origin latitude (degrees).
const LAT0_DEG: f64 = 49.0;
/// True origin longitude (degrees).
const LON0_DEG: f64 = -2.0;
/// False easting of the true origin (m).
const E0: f64 = 400_000.0;
/// False northing of the true origin (m).
const N0: f64 = -100_000.0;

/// National Grid projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsgbProjection;

impl OsgbProjection {
    pub fn new() -> Self {
        Self
    }

    /// Project geographic coordinates (degrees) to `(easting, northing)` in
    /// metres.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let lat0 = LAT0_DEG.to_radians();
        let lon0 = LON0_DEG.to_radians();

        let e2 = 1.0 - (B * B) / (A * A);
        let n = (A - B) / (A + B);

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let nu = A * F0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let rho = A * F0 * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5);
        let eta2 = nu / rho - 1.0;

        // Meridional arc from the true origin.
        let m = B * F0
            * ((1.0 + n + 1.25 * n * n + 1.25 * n * n * n) * (lat - lat0)
                - (3.0 * n + 3.0 * n * n + 21.0 / 8.0 * n * n * n)
                    * (lat - lat0).sin()
                    * (lat + lat0).cos()
                + (15.0 / 8.0 * n * n + 15.0 / 8.0 * n * n * n)
                    * (2.0 * (lat - lat0)).sin()
                    * (2.0 * (lat + lat0)).cos()
                - 35.0 / 24.0
                    * n
                    * n
                    * n
                    * (3.0 * (lat - lat0)).sin()
                    * (3.0 * (lat + lat0)).cos());

        let i = m + N0;
        let ii = nu / 2.0 * sin_lat * cos_lat;
        let iii = nu / 24.0
            * sin_lat
            * cos_lat.powi(3)
            * (5.0 - tan_lat * tan_lat + 9.0 * eta2);
        let iiia = nu / 720.0
            * sin_lat
            * cos_lat.powi(5)
            * (61.0 - 58.0 * tan_lat * tan_lat + tan_lat.powi(4));
        let iv = nu * cos_lat;
        let v = nu / 6.0 * cos_lat.powi(3) * (nu / rho - tan_lat * tan_lat);
        let vi = nu / 120.0
            * cos_lat.powi(5)
            * (5.0 - 18.0 * tan_lat * tan_lat + tan_lat.powi(4) + 14.0 * eta2
                - 58.0 * tan_lat * tan_lat * eta2);

        let dl = lon - lon0;
        let northing = i + ii * dl * dl + iii * dl.powi(4) + iiia * dl.powi(6);
        let easting = E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);

        (easting, northing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_coords_approx_eq;

    #[test]
    fn matches_os_worked_example() {
        // The worked example from the OS coordinate systems guide:
        // 52 39' 27.2531" N, 1 43' 4.5177" E.
        let proj = OsgbProjection::new();
        let (e, n) = proj.project(52.657_570_305_6, 1.717_921_583_3);
        assert_coords_approx_eq!((e, n), (651_409.903, 313_177.270), 0.01);
    }

    #[test]
    fn true_origin_maps_to_false_origin() {
        let proj = OsgbProjection::new();
        let (e, n) = proj.project(49.0, -2.0);
        assert_coords_approx_eq!((e, n), (400_000.0, -100_000.0), 1e-6);
    }

    #[test]
    fn easting_grows_eastwards() {
        let proj = OsgbProjection::new();
        let (e_west, _) = proj.project(54.0, -4.0);
        let (e_east, _) = proj.project(54.0, -2.0);
        assert!(e_east > e_west);
    }

    #[test]
    fn northing_grows_northwards() {
        let proj = OsgbProjection::new();
        let (_, n_south) = proj.project(51.0, -2.0);
        let (_, n_north) = proj.project(58.0, -2.0);
        assert!(n_north > n_south);
    }
}
