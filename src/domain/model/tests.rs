// Unit tests for domain models

use super::*;

#[test]
fn parse_plain_seconds() {
    assert_eq!(TimeSpec::parse("12.5").unwrap().seconds, 12.5);
    assert_eq!(TimeSpec::parse("0").unwrap().seconds, 0.0);
}

#[test]
fn parse_minute_second_form() {
    assert_eq!(TimeSpec::parse("2:30.5").unwrap().seconds, 150.5);
    assert_eq!(TimeSpec::parse("0:05").unwrap().seconds, 5.0);
}

#[test]
fn parse_hour_minute_second_form() {
    assert_eq!(TimeSpec::parse("1:02:03").unwrap().seconds, 3723.0);
    assert_eq!(TimeSpec::parse("0:00:00.250").unwrap().seconds, 0.25);
}

#[test]
fn parse_rejects_bad_input() {
    assert!(TimeSpec::parse("-5").is_err());
    assert!(TimeSpec::parse("1:75").is_err());
    assert!(TimeSpec::parse("1:99:00").is_err());
    assert!(TimeSpec::parse("abc").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn format_round_trips_components() {
    assert_eq!(TimeSpec::from_seconds(3723.5).format_hms(), "1:02:03.500");
    assert_eq!(TimeSpec::from_seconds(150.5).format_hms(), "2:30.500");
}

#[test]
fn time_range_requires_ordering() {
    let ok = TimeRange::new(TimeSpec::from_seconds(2.0), TimeSpec::from_seconds(5.0)).unwrap();
    assert_eq!(ok.duration_seconds(), 3.0);

    let inverted = TimeRange::new(TimeSpec::from_seconds(5.0), TimeSpec::from_seconds(2.0));
    assert!(matches!(
        inverted,
        Err(KeyclipError::InputValidation { .. })
    ));

    let empty = TimeRange::new(TimeSpec::from_seconds(2.0), TimeSpec::from_seconds(2.0));
    assert!(empty.is_err());
}

#[test]
fn point_parses_from_comma_pair() {
    let p: Point = "12.5, 7".parse().unwrap();
    assert_eq!(p, Point::new(12.5, 7.0));
    assert!("12".parse::<Point>().is_err());
    assert!("1,2,3".parse::<Point>().is_err());
    assert!("a,b".parse::<Point>().is_err());
}

#[test]
fn frame_corner_quad_is_not_degenerate() {
    let quad = QuadPoints::frame_corners(640, 480);
    assert_eq!(quad.top_left, Point::new(0.0, 0.0));
    assert_eq!(quad.bottom_right, Point::new(640.0, 480.0));
    assert!(quad.degenerate_reason().is_none());
}

#[test]
fn collinear_corners_are_degenerate() {
    // Three corners on the x axis
    let quad = QuadPoints::new(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(20.0, 0.0),
        Point::new(5.0, 5.0),
    );
    assert!(quad.degenerate_reason().is_some());
}

#[test]
fn identical_corners_are_degenerate() {
    let p = Point::new(3.0, 3.0);
    let quad = QuadPoints::new(p, p, p, p);
    assert!(quad.degenerate_reason().is_some());
}

#[test]
fn skewed_quad_is_accepted() {
    let quad = QuadPoints::new(
        Point::new(10.0, 20.0),
        Point::new(600.0, 5.0),
        Point::new(0.0, 470.0),
        Point::new(630.0, 460.0),
    );
    assert!(quad.degenerate_reason().is_none());
}

#[test]
fn duration_derives_from_frame_count() {
    let info = VideoInfo {
        width: 640,
        height: 480,
        frame_rate: 30.0,
        frame_count: 300,
        has_audio: true,
    };
    assert!((info.duration_seconds() - 10.0).abs() < 1e-9);
}

#[test]
fn zero_frame_rate_yields_zero_duration() {
    let info = VideoInfo {
        width: 640,
        height: 480,
        frame_rate: 0.0,
        frame_count: 300,
        has_audio: false,
    };
    assert_eq!(info.duration_seconds(), 0.0);
}

#[test]
fn quality_profile_parses_known_levels() {
    assert_eq!(QualityProfile::parse("highest").unwrap(), QualityProfile::Highest);
    assert_eq!(QualityProfile::parse("HIGH").unwrap(), QualityProfile::High);
    assert_eq!(QualityProfile::parse("standard").unwrap(), QualityProfile::Standard);
    assert_eq!(QualityProfile::parse("fast").unwrap(), QualityProfile::Fast);
    assert!(QualityProfile::parse("extreme").is_err());
}
