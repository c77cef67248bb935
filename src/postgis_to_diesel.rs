// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//postgis stores x = longitude, y = latitude

pub fn lat_lon_to_diesel(lat: f64, lon: f64) -> postgis_diesel::types::Point {
    postgis_diesel::types::Point::new(lon, lat, Some(crate::WGS_84_SRID))
}

pub fn diesel_point_to_lat_lon(point: &postgis_diesel::types::Point) -> (f64, f64) {
    (point.y, point.x)
}
