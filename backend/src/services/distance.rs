use serde::{Serialize, Serializer};
use std::fmt;

// WGS-84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
// IUGG mean radius
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Distance between two users, or `Unknown` when it can't be computed.
///
/// Serializes as a bare number of kilometers or the string `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Km(f64),
    Unknown,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Km(km) => write!(f, "{:.1} km", km),
            Distance::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Distance::Km(km) => serializer.serialize_f64(*km),
            Distance::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Geodesic distance in kilometers rounded to one decimal place.
///
/// Any missing, non-finite or out-of-range coordinate yields
/// `Distance::Unknown`. Nearly antipodal pairs, where Vincenty does not
/// converge, fall back to the great-circle distance on the mean sphere.
pub fn distance_km(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> Distance {
    let (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) = (lat1, lon1, lat2, lon2) else {
        return Distance::Unknown;
    };
    if !valid_latitude(lat1) || !valid_latitude(lat2) || !valid_longitude(lon1) || !valid_longitude(lon2) {
        return Distance::Unknown;
    }

    let meters = vincenty_inverse_m(lat1, lon1, lat2, lon2)
        .unwrap_or_else(|| great_circle_m(lat1, lon1, lat2, lon2));
    Distance::Km((meters / 100.0).round() / 10.0)
}

fn valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

fn valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=180.0).contains(&lon)
}

/// Vincenty's inverse formula. Returns meters, `None` if it doesn't converge.
fn vincenty_inverse_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - WGS84_F) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - lambda_prev).abs() < CONVERGENCE_THRESHOLD {
            let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            let meters = WGS84_B * a * (sigma - delta_sigma);
            return meters.is_finite().then_some(meters);
        }
    }

    None
}

/// Haversine distance in meters.
fn great_circle_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = phi2 - phi1;
    let d_lambda = (lon2 - lon1).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_coordinates_are_unknown() {
        let cases = [
            (None, Some(73.8), Some(19.0), Some(72.8)),
            (Some(18.5), None, Some(19.0), Some(72.8)),
            (Some(18.5), Some(73.8), None, Some(72.8)),
            (Some(18.5), Some(73.8), Some(19.0), None),
            (None, None, None, None),
        ];
        for (a, b, c, d) in cases {
            assert_eq!(distance_km(a, b, c, d), Distance::Unknown);
        }
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        assert_eq!(distance_km(Some(91.0), Some(0.0), Some(0.0), Some(0.0)), Distance::Unknown);
        assert_eq!(distance_km(Some(0.0), Some(0.0), Some(0.0), Some(-181.0)), Distance::Unknown);
        assert_eq!(distance_km(Some(f64::NAN), Some(0.0), Some(0.0), Some(0.0)), Distance::Unknown);
    }

    #[test]
    fn test_zero_is_a_real_coordinate() {
        assert_eq!(distance_km(Some(0.0), Some(0.0), Some(0.0), Some(0.0)), Distance::Km(0.0));
    }

    #[test]
    fn test_known_distances() {
        // Pune to Mumbai, roughly 120 km as the crow flies
        assert_eq!(
            distance_km(Some(18.5204), Some(73.8567), Some(19.0760), Some(72.8777)),
            Distance::Km(120.1)
        );

        // One degree of longitude on the equator is 111.3 km on WGS-84
        assert_eq!(distance_km(Some(0.0), Some(0.0), Some(0.0), Some(1.0)), Distance::Km(111.3));
    }

    #[test]
    fn test_rounded_to_one_decimal() {
        let Distance::Km(km) = distance_km(Some(28.6139), Some(77.2090), Some(12.9716), Some(77.5946)) else {
            panic!("expected a distance");
        };
        assert_eq!((km * 10.0).round() / 10.0, km);
    }

    #[test]
    fn test_nearly_antipodal_still_measured() {
        assert!(vincenty_inverse_m(0.0, 0.0, 0.5, 179.7).is_none());
        let Distance::Km(km) = distance_km(Some(0.0), Some(0.0), Some(0.5), Some(179.7)) else {
            panic!("expected a distance");
        };
        assert!((19_800.0..20_100.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_great_circle_agrees_with_vincenty_nearby() {
        let vincenty = vincenty_inverse_m(18.5204, 73.8567, 19.0760, 72.8777).unwrap();
        let sphere = great_circle_m(18.5204, 73.8567, 19.0760, 72.8777);
        assert!((vincenty - sphere).abs() / vincenty < 0.005);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_value(Distance::Km(12.5)).unwrap(), serde_json::json!(12.5));
        assert_eq!(serde_json::to_value(Distance::Unknown).unwrap(), serde_json::json!("unknown"));
        assert_eq!(Distance::Km(3.0).to_string(), "3.0 km");
    }
}
