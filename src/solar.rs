//! Apparent solar time from the equation-of-time approximation.
//!
//! Follows the five-term trigonometric fit given in the NOAA solar calculation
//! notes (Spencer-style Fourier expansion of the equation of time). Apparent
//! solar time is UTC clock time corrected by the equation of time and by
//! 4 minutes per degree of longitude. The fit is accurate to well under a
//! minute against the true equation of time, which itself stays within about
//! ±16 minutes of mean time over the year.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::f64::consts::PI;

/// Scale factor converting the Fourier fit to minutes (1440/2π).
const EOT_SCALE: f64 = 229.18;

/// Minutes of clock time per degree of longitude.
const MINUTES_PER_DEGREE: f64 = 4.0;

/// Degrees of hand rotation per hour on a 12-hour dial face.
const DEGREES_PER_HOUR: f64 = 30.0;

/// Ordinal day of the year (January 1 = 1) of the instant's calendar date.
///
/// The date is taken in the instant's own timezone, so the day boundary falls
/// where the supplied offset says it does. Using the same zone rules for the
/// start-of-year reference and the instant keeps day numbering stable across
/// DST transitions.
pub fn day_of_year<Tz: TimeZone>(datetime: &DateTime<Tz>) -> u32 {
    datetime.date_naive().ordinal()
}

/// Fractional year angle γ in radians for the given instant.
///
/// γ = (2π/365)(N − 1 + (UTC hour − 12)/24), with N the ordinal day and the
/// hour taken in UTC. The year length is fixed at 365 days; leap years shift
/// γ by at most one day's angle, which is below the accuracy of the fit.
pub fn fractional_year<Tz: TimeZone>(datetime: &DateTime<Tz>) -> f64 {
    let n = f64::from(day_of_year(datetime));
    let utc_hour = f64::from(datetime.naive_utc().hour());
    2.0 * PI / 365.0 * (n - 1.0 + (utc_hour - 12.0) / 24.0)
}

/// Equation of time in minutes for a fractional year angle γ.
///
/// Positive values mean the sun is ahead of mean time.
pub fn equation_of_time(gamma: f64) -> f64 {
    EOT_SCALE
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin())
}

/// Apparent solar time as fractional hours in [0, 24).
///
/// This is true solar time at the given meridian: UTC time of day plus the
/// equation of time plus 4 minutes per degree of longitude. It is not
/// referenced to any timezone meridian.
///
/// Latitude is accepted for interface symmetry with the location inputs but
/// does not enter the formula; the equation-of-time method needs only the
/// date and the longitude.
pub fn solar_time<Tz: TimeZone>(datetime: &DateTime<Tz>, _latitude: f64, longitude: f64) -> f64 {
    let utc = datetime.naive_utc();
    let clock_minutes = f64::from(utc.hour() * 60 + utc.minute());
    let eot = equation_of_time(fractional_year(datetime));
    let solar_minutes = clock_minutes + eot + MINUTES_PER_DEGREE * longitude;
    (solar_minutes / 60.0).rem_euclid(24.0)
}

/// Rotation of a 12-hour dial hand in degrees, [0, 360), for a solar time.
pub fn hand_angle(solar_hours: f64) -> f64 {
    (solar_hours % 12.0) * DEGREES_PER_HOUR
}

/// Zero-padded `HH:MM` label for a solar time in fractional hours.
pub fn clock_label(solar_hours: f64) -> String {
    let hours = solar_hours.floor();
    let minutes = ((solar_hours - hours) * 60.0).floor();
    format!("{:02}:{:02}", hours as u32, minutes as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn result_stays_in_day_range() {
        for day in [1u32, 80, 172, 266, 365] {
            for hour in [0u32, 5, 12, 18, 23] {
                for lon in [-180.0, -75.5, -0.25, 0.0, 13.4, 75.5, 180.0] {
                    let date = chrono::NaiveDate::from_yo_opt(2023, day).unwrap();
                    let dt = Utc
                        .from_local_datetime(&date.and_hms_opt(hour, 30, 0).unwrap())
                        .unwrap();
                    let lst = solar_time(&dt, 0.0, lon);
                    assert!(
                        (0.0..24.0).contains(&lst),
                        "day {} hour {} lon {} gave {}",
                        day,
                        hour,
                        lon,
                        lst
                    );
                }
            }
        }
    }

    #[test]
    fn pure_function_repeats_exactly() {
        let dt = utc(2024, 7, 4, 16, 45);
        let first = solar_time(&dt, 40.7, -74.0);
        for _ in 0..10 {
            assert_eq!(first, solar_time(&dt, 40.7, -74.0));
        }
    }

    #[test]
    fn latitude_does_not_enter_the_formula() {
        let dt = utc(2024, 2, 11, 9, 15);
        assert_eq!(solar_time(&dt, 89.9, 2.35), solar_time(&dt, -45.0, 2.35));
    }

    #[test]
    fn greenwich_noon_stays_within_eot_bounds() {
        // Day 81 (2023-03-22). The equation of time is about -7.5 minutes
        // here, so the result sits below 12:00 but inside the ±16 minute
        // envelope the equation of time can ever produce.
        let dt = utc(2023, 3, 22, 12, 0);
        assert_eq!(day_of_year(&dt), 81);
        let lst = solar_time(&dt, 0.0, 0.0);
        assert!((lst - 12.0).abs() < 16.0 / 60.0, "got {}", lst);
    }

    #[test]
    fn fifteen_degrees_is_one_hour() {
        let dt = utc(2024, 10, 2, 3, 7);
        for lon in [-180.0, -97.5, 0.0, 45.0, 165.0] {
            let here = solar_time(&dt, 0.0, lon);
            let east = solar_time(&dt, 0.0, lon + 15.0);
            let shift = (east - here).rem_euclid(24.0);
            assert!((shift - 1.0).abs() < 1e-9, "lon {} shifted {}", lon, shift);
        }
    }

    #[test]
    fn day_numbers_respect_the_year_boundary() {
        assert_eq!(day_of_year(&utc(2023, 12, 31, 23, 59)), 365);
        assert_eq!(day_of_year(&utc(2024, 12, 31, 23, 59)), 366);
        assert_eq!(day_of_year(&utc(2025, 1, 1, 0, 0)), 1);
    }

    #[test]
    fn day_number_follows_the_instant_offset() {
        // 2024-01-01T02:00+03:00 is still 2023-12-31 in UTC but day 1 locally.
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(day_of_year(&dt), 1);
        assert_eq!(day_of_year(&dt.with_timezone(&Utc)), 365);
    }

    #[test]
    fn march_equinox_scenario() {
        let dt = utc(2024, 3, 20, 12, 0);
        assert_eq!(day_of_year(&dt), 80);
        let lst = solar_time(&dt, 51.5, 0.0);
        assert!(
            (11.0 + 50.0 / 60.0..=12.0 + 10.0 / 60.0).contains(&lst),
            "got {}",
            lst
        );
    }

    #[test]
    fn date_line_midnight_wraps_to_noon() {
        let dt = utc(2024, 6, 21, 0, 0);
        let lst = solar_time(&dt, 0.0, 180.0);
        let expected =
            ((720.0 + equation_of_time(fractional_year(&dt))) / 60.0).rem_euclid(24.0);
        assert_eq!(lst, expected);
        assert!((lst - 12.0).abs() < 0.25, "got {}", lst);
    }

    #[test]
    fn western_midnight_normalizes_positive() {
        // 00:30 UTC at -180° pushes raw minutes well below zero.
        let dt = utc(2024, 1, 15, 0, 30);
        let lst = solar_time(&dt, 0.0, -180.0);
        assert!((0.0..24.0).contains(&lst), "got {}", lst);
        assert!((lst - 12.5).abs() < 0.25, "got {}", lst);
    }

    #[test]
    fn equation_of_time_stays_within_known_bounds() {
        for day in 1..=365u32 {
            let gamma = 2.0 * PI / 365.0 * (f64::from(day) - 1.0);
            let eot = equation_of_time(gamma);
            assert!(eot.abs() < 17.0, "day {} gave {} min", day, eot);
        }
    }

    #[test]
    fn hand_angle_maps_twelve_hour_face() {
        assert_eq!(hand_angle(0.0), 0.0);
        assert_eq!(hand_angle(3.0), 90.0);
        assert_eq!(hand_angle(13.5), 45.0);
        assert!((hand_angle(23.99) - 359.7).abs() < 1e-9);
    }

    #[test]
    fn clock_label_is_zero_padded() {
        assert_eq!(clock_label(0.0), "00:00");
        assert_eq!(clock_label(9.075), "09:04");
        assert_eq!(clock_label(23.999), "23:59");
    }
}
