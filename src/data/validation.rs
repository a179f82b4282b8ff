/// Boundary validation for coordinates. Rejects non-finite values outright,
/// so NaN and infinities never reach the calculator.
fn bounded(label: &str, value: f64, limit: f64) -> Result<f64, String> {
    if value.is_finite() && value.abs() <= limit {
        Ok(value)
    } else {
        Err(format!(
            "{} {} out of range [-{}, {}]",
            label, value, limit, limit
        ))
    }
}

pub fn check_latitude(value: f64) -> Result<f64, String> {
    bounded("Latitude", value, 90.0)
}

pub fn check_longitude(value: f64) -> Result<f64, String> {
    bounded("Longitude", value, 180.0)
}

pub fn check_latitude_span(range: (f64, f64, f64)) -> Result<(f64, f64, f64), String> {
    check_latitude(range.0)?;
    check_latitude(range.1)?;
    Ok(range)
}

pub fn check_longitude_span(range: (f64, f64, f64)) -> Result<(f64, f64, f64), String> {
    check_longitude(range.0)?;
    check_longitude(range.1)?;
    Ok(range)
}
