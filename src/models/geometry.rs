// src/models/geometry.rs
// Position types for entities placed on the map

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    /// Same horizontal position, different altitude.
    pub fn with_alt(self, alt: f64) -> Self {
        Self { alt, ..self }
    }

    pub fn lerp(&self, to: &GeoPosition, ratio: f64) -> GeoPosition {
        GeoPosition {
            lat: self.lat + (to.lat - self.lat) * ratio,
            lon: self.lon + (to.lon - self.lon) * ratio,
            alt: self.alt + (to.alt - self.alt) * ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints_and_middle() {
        let a = GeoPosition::new(45.0, 5.0, 100.0);
        let b = GeoPosition::new(46.0, 7.0, 200.0);

        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);

        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, GeoPosition::new(45.5, 6.0, 150.0));
    }

    #[test]
    fn test_with_alt() {
        let p = GeoPosition::new(1.0, 2.0, 3.0).with_alt(9.0);
        assert_eq!(p, GeoPosition::new(1.0, 2.0, 9.0));
    }
}
