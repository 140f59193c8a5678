use crate::models::GeoPoint;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude in kilometers
const KM_PER_DEGREE: f64 = 111.0;

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Longitude bounds that spill past ±180 wrap around, so they cannot
    /// be compared directly.
    pub fn wraps_longitude(&self) -> bool {
        self.min_lon < -180.0 || self.max_lon > 180.0
    }

    /// The box places no restriction on longitude
    pub fn spans_all_longitudes(&self) -> bool {
        self.min_lon <= -180.0 && self.max_lon >= 180.0
    }
}

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two [`GeoPoint`]s in kilometers
#[inline]
pub fn distance_between(from: GeoPoint, to: GeoPoint) -> f64 {
    haversine_distance(from.lat, from.lng, to.lat, to.lng)
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km; the longitude half-width is the exact tangent
/// longitude of the circle, `asin(sin(d) / cos(lat))` for angular radius `d`.
///
/// The box contains the whole circle, so a point outside it is always
/// farther than `radius_km`. A circle that reaches a pole spans every
/// longitude.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;

    let all_longitudes = BoundingBox {
        min_lat: min_lat.max(-90.0),
        max_lat: max_lat.min(90.0),
        min_lon: -180.0,
        max_lon: 180.0,
    };

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return all_longitudes;
    }

    let angular_radius = radius_km / EARTH_RADIUS_KM;
    if angular_radius >= std::f64::consts::FRAC_PI_2 {
        return all_longitudes;
    }

    let ratio = angular_radius.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return all_longitudes;
    }

    // Small relative margin absorbs rounding at the tangent points
    let lon_delta = ratio.asin().to_degrees() * BOX_MARGIN + 1e-9;
    if lon_delta >= 180.0 {
        return all_longitudes;
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Relative widening applied to the longitude span
const BOX_MARGIN: f64 = 1.001;

/// Check if a point is within a bounding box
///
/// Boxes that cross the antimeridian are compared against the wrapped
/// longitude as well.
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }

    let in_range = |lon: f64| lon >= bbox.min_lon && lon <= bbox.max_lon;
    in_range(lon) || in_range(lon + 360.0) || in_range(lon - 360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_distance_between_points_is_symmetric() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(40.7580, -73.9855);

        let ab = distance_between(a, b);
        let ba = distance_between(b, a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_antipodal_distance_is_finite() {
        let distance = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        assert!(bbox.min_lat < 40.7128);
        assert!(bbox.max_lat > 40.7128);
        assert!(bbox.min_lon < -74.0060);
        assert!(bbox.max_lon > -74.0060);

        // Check approximate size (20km / 111km per degree = ~0.18 degrees)
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        assert!(is_within_bounding_box(40.7128, -74.0060, &bbox));
        assert!(is_within_bounding_box(40.71, -74.0, &bbox));
        assert!(!is_within_bounding_box(50.0, -80.0, &bbox));
    }

    #[test]
    fn test_bbox_across_antimeridian() {
        let bbox = calculate_bounding_box(0.0, 179.95, 20.0);

        assert!(bbox.wraps_longitude());
        assert!(is_within_bounding_box(0.0, -179.95, &bbox));
    }

    #[test]
    fn test_bbox_at_pole() {
        let bbox = calculate_bounding_box(90.0, 0.0, 5.0);
        assert!(bbox.spans_all_longitudes());
        assert!(is_within_bounding_box(89.99, 120.0, &bbox));
    }

    #[test]
    fn test_bbox_across_antimeridian_rejects_far_longitudes() {
        let bbox = calculate_bounding_box(0.0, 179.95, 20.0);

        assert!(is_within_bounding_box(0.0, -179.9, &bbox));
        assert!(!is_within_bounding_box(0.0, 0.0, &bbox));
        assert!(!is_within_bounding_box(0.0, -170.0, &bbox));
    }

    /// Point reached by travelling `distance_km` from `origin` on `bearing_deg`
    fn destination(origin: GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
        let d = distance_km / EARTH_RADIUS_KM;
        let bearing = bearing_deg.to_radians();
        let lat1 = origin.lat.to_radians();
        let lon1 = origin.lng.to_radians();

        let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let lon2 = lon1
            + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

        let lng = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
        GeoPoint::new(lat2.to_degrees(), lng)
    }

    #[test]
    fn test_bbox_contains_circle_at_high_latitude() {
        for (origin, radius_km) in [
            (GeoPoint::new(70.0, 19.0), 500.0),
            (GeoPoint::new(70.0, 19.0), 300.0),
            (GeoPoint::new(-75.0, 160.0), 1200.0),
            (GeoPoint::new(45.0, 179.0), 800.0),
        ] {
            let bbox = calculate_bounding_box(origin.lat, origin.lng, radius_km);

            for bearing in 0..360 {
                let point = destination(origin, bearing as f64, radius_km * 0.999);
                assert!(
                    is_within_bounding_box(point.lat, point.lng, &bbox),
                    "{:?} at bearing {} escapes the box {:?}",
                    point,
                    bearing,
                    bbox
                );
            }
        }
    }

    #[test]
    fn test_bbox_for_circle_over_pole_spans_all_longitudes() {
        let bbox = calculate_bounding_box(80.0, -74.0, 1500.0);

        assert!(bbox.spans_all_longitudes());
        assert!(is_within_bounding_box(88.0, 106.0, &bbox));
    }
}
