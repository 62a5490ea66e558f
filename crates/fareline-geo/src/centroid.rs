use crate::GeoError;

/// Parses a WKT-ish `POINT(<lon> <lat>)` centroid into `(lat, lon)`.
///
/// The upstream emits inconsistent casing and spacing, so the string is
/// case-folded and whitespace-normalized before the coordinates are read.
///
/// # Errors
///
/// Returns [`GeoError::NotAPoint`] when the keyword, the parentheses, or the
/// coordinate pair cannot be found, and when a coordinate is not a float.
pub fn parse_point(centroid: &str) -> Result<(f64, f64), GeoError> {
    let normalized = centroid.trim().to_lowercase();

    if !normalized.starts_with("point") {
        return Err(GeoError::NotAPoint("POINT keyword not found".to_string()));
    }
    let open = normalized.find('(');
    let close = normalized.find(')');
    let (Some(open), Some(close)) = (open, close) else {
        return Err(GeoError::NotAPoint("( and/or ) not found".to_string()));
    };
    if open >= close {
        return Err(GeoError::NotAPoint("( and/or ) misplaced".to_string()));
    }

    let mut coords = normalized[open + 1..close].split_whitespace();
    let (Some(lon_str), Some(lat_str)) = (coords.next(), coords.next()) else {
        return Err(GeoError::NotAPoint("wrong coord format".to_string()));
    };

    let lon: f64 = lon_str
        .parse()
        .map_err(|_| GeoError::NotAPoint(format!("cannot parse lon from {lon_str:?}")))?;
    let lat: f64 = lat_str
        .parse()
        .map_err(|_| GeoError::NotAPoint(format!("cannot parse lat from {lat_str:?}")))?;
    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_point() {
        let (lat, lon) = parse_point("POINT(37.610621 55.750376)").expect("point");
        assert!((lat - 55.750376).abs() < f64::EPSILON);
        assert!((lon - 37.610621).abs() < f64::EPSILON);
    }

    #[test]
    fn tolerates_case_and_extra_whitespace() {
        let (lat, lon) = parse_point("  Point(  30.648476   46.298108 ) ").expect("point");
        assert!((lat - 46.298108).abs() < f64::EPSILON);
        assert!((lon - 30.648476).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_negative_coordinates() {
        let (lat, lon) = parse_point("POINT(-0.127758 51.507351)").expect("point");
        assert!((lat - 51.507351).abs() < f64::EPSILON);
        assert!((lon + 0.127758).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_missing_keyword() {
        assert!(matches!(
            parse_point("(37.6 55.7)"),
            Err(GeoError::NotAPoint(_))
        ));
    }

    #[test]
    fn rejects_missing_parens() {
        assert!(matches!(
            parse_point("POINT 37.6 55.7"),
            Err(GeoError::NotAPoint(_))
        ));
    }

    #[test]
    fn rejects_single_coordinate() {
        assert!(matches!(
            parse_point("POINT(37.6)"),
            Err(GeoError::NotAPoint(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        assert!(matches!(
            parse_point("POINT(abc 55.7)"),
            Err(GeoError::NotAPoint(_))
        ));
    }
}
