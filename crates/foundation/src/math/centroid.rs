use crate::coords::LatLng;

/// Arithmetic mean of the ring's vertices.
///
/// This is a marker anchor, not an area-weighted centroid: for concave or
/// elongated rings the mean can fall outside the polygon.
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let mut sum_lat = 0.0;
    let mut sum_lng = 0.0;
    for p in points {
        sum_lat += p.lat;
        sum_lng += p.lng;
    }
    let n = points.len() as f64;
    Some(LatLng::new(sum_lat / n, sum_lng / n))
}

#[cfg(test)]
mod tests {
    use super::centroid;
    use crate::coords::LatLng;

    fn regular_ngon(center: LatLng, radius_deg: f64, n: usize) -> Vec<LatLng> {
        (0..n)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / n as f64;
                LatLng::new(
                    center.lat + radius_deg * angle.sin(),
                    center.lng + radius_deg * angle.cos(),
                )
            })
            .collect()
    }

    #[test]
    fn regular_polygons_center_on_their_origin() {
        let center = LatLng::new(48.1486, 17.1077);
        for n in [3, 6, 12] {
            let c = centroid(&regular_ngon(center, 0.001, n)).unwrap();
            assert!((c.lat - center.lat).abs() < 1e-12, "n={n} lat {}", c.lat);
            assert!((c.lng - center.lng).abs() < 1e-12, "n={n} lng {}", c.lng);
        }
    }

    #[test]
    fn empty_ring_has_no_centroid() {
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn concave_ring_mean_is_not_area_weighted() {
        // An L shape with extra vertices along one arm pulls the mean there.
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(0.0, 3.0),
            LatLng::new(1.0, 3.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(3.0, 1.0),
            LatLng::new(3.0, 0.0),
        ];
        let c = centroid(&ring).unwrap();
        assert_eq!(c, LatLng::new(1.0, 11.0 / 8.0));
    }
}
