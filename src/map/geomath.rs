use crate::map::feature::fmt_number;
use crate::map::projection::Projection;

const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance in miles between two (lng, lat) points.
pub fn haversine_miles(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lng1, lat1) = (a[0].to_radians(), a[1].to_radians());
    let (lng2, lat2) = (b[0].to_radians(), b[1].to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Pixel endpoint of a horizontal scale bar starting at `start` whose
/// back-projected ground length approximates `miles`.
///
/// The search runs in geographic space: both endpoints are inverted
/// through the projection and compared by great-circle distance, so the
/// bar stays correct on projections whose scale varies with latitude.
/// A flat pixels-per-mile constant would not.
pub fn scale_bar_end_point(projection: &Projection, start: [f64; 2], miles: f64) -> [f64; 2] {
    let Some(start_geo) = projection.invert(start) else {
        return start;
    };

    let ground_miles = |dx: f64| {
        projection
            .invert([start[0] + dx, start[1]])
            .map(|geo| haversine_miles(start_geo, geo))
            .unwrap_or(f64::INFINITY)
    };

    // Bracket the target distance, then bisect.
    let mut hi = 1.0;
    while ground_miles(hi) < miles && hi < 1e7 {
        hi *= 2.0;
    }
    let mut lo = 0.0;
    for _ in 0..64 {
        let mid = (lo + hi) / 2.0;
        if ground_miles(mid) < miles {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    [start[0] + (lo + hi) / 2.0, start[1]]
}

/// Scale bar caption, singular for exactly one mile.
pub fn scale_bar_label(miles: f64) -> String {
    if miles == 1.0 {
        "1 mile".to_string()
    } else {
        format!("{} miles", fmt_number(miles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn haversine_matches_known_distance() {
        // New York to Los Angeles, roughly 2,450 miles.
        let d = haversine_miles([-74.006, 40.713], [-118.244, 34.052]);
        assert!((2400.0..2500.0).contains(&d), "got {d}");
    }

    #[test]
    fn scale_bar_endpoint_hits_target_distance() {
        let projection = Projection::equirectangular()
            .with_scale(800.0)
            .with_translate([400.0, 250.0]);
        let start = [10.0, 465.0];
        let end = scale_bar_end_point(&projection, start, 500.0);
        assert!(end[0] > start[0]);
        assert_relative_eq!(end[1], start[1], epsilon = 1e-12);

        let start_geo = projection.invert(start).unwrap();
        let end_geo = projection.invert(end).unwrap();
        assert_relative_eq!(
            haversine_miles(start_geo, end_geo),
            500.0,
            max_relative = 1e-3
        );
    }

    #[test]
    fn scale_bar_endpoint_tracks_latitude_on_mercator() {
        // The same ground distance spans more pixels away from the
        // equator under Mercator.
        let projection = Projection::mercator()
            .with_scale(800.0)
            .with_translate([400.0, 250.0]);
        let equator = scale_bar_end_point(&projection, [10.0, 250.0], 200.0);
        let north = scale_bar_end_point(&projection, [10.0, 50.0], 200.0);
        assert!(north[0] - 10.0 > equator[0] - 10.0);
    }

    #[test]
    fn scale_bar_label_pluralizes() {
        assert_eq!(scale_bar_label(1.0), "1 mile");
        assert_eq!(scale_bar_label(2.0), "2 miles");
        assert_eq!(scale_bar_label(0.5), "0.5 miles");
    }
}
