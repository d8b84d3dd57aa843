// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use indoc::indoc;

use super::*;

const OBS_LISTING: &str = indoc! {"
    SWIFT_590206-140305.raw
     SWIFT_590206 field observation with calibrator J1753+1853
     Tracking    : 17 53 12.34   18 53 00.0 J2000
     Observed on : 05/03/2014
     Start time  : 13.55.49 UT   01.23.45 ST   56721.580428 MJD
     Stop time   : 15.00.50 UT   02.28.57 ST   56721.625579 MJD
"};

#[test]
fn test_coords_negative_dec() {
    let lines = ["Tracking : 12 34 56.7  -01 02 03 REF"];
    let pointing = parse_coords("test.raw", &lines).unwrap();
    assert_eq!(pointing.ra, "12 34 56.7");
    assert_eq!(pointing.dec, "-01 02 03");

    let radec = convert_to_decimal_degrees(&pointing).unwrap();
    // 15 * (12 + 34/60 + 56.7/3600)
    assert_abs_diff_eq!(radec.ra, 188.73625, epsilon = 1e-6);
    // -(1 + 2/60 + 3/3600)
    assert_abs_diff_eq!(radec.dec, -1.0341666667, epsilon = 1e-6);
}

#[test]
fn test_coords_positive_dec() {
    let lines = ["Tracking : 12 34 56.7   01 02 03 REF"];
    let pointing = parse_coords("test.raw", &lines).unwrap();
    assert_eq!(pointing.ra, "12 34 56.7");
    assert_eq!(pointing.dec, "01 02 03");

    let radec = convert_to_decimal_degrees(&pointing).unwrap();
    assert_abs_diff_eq!(radec.ra, 188.73625, epsilon = 1e-6);
    assert_abs_diff_eq!(radec.dec, 1.0341666667, epsilon = 1e-6);
}

#[test]
fn test_coords_missing() {
    let lines = ["Nothing to see here", "Start time  : 13.55.49"];
    let result = parse_coords("test.raw", &lines);
    assert!(matches!(result, Err(ParseError::MissingCoords { .. })));
    assert!(result.unwrap_err().to_string().contains("test.raw"));
}

#[test]
fn test_full_listing() {
    let lines = response_lines(OBS_LISTING);
    assert_eq!(
        parse_calibrator(&lines).as_deref(),
        Some("J1753+1853"),
        "{lines:?}"
    );
    assert_eq!(parse_field(&lines).as_deref(), Some("SWIFT_590206"));
    assert!(!parse_raster(&lines));

    let pointing = parse_coords("SWIFT_590206-140305.raw", &lines).unwrap();
    let radec = convert_to_decimal_degrees(&pointing).unwrap();
    assert_abs_diff_eq!(radec.ra, 268.3014166667, epsilon = 1e-6);
    assert_abs_diff_eq!(radec.dec, 18.8833333333, epsilon = 1e-6);

    let times = parse_obs_times(&lines).unwrap();
    let date = NaiveDate::from_ymd_opt(2014, 3, 5).unwrap();
    assert_eq!(times.utc.0, date.and_hms_opt(13, 55, 49).unwrap());
    assert_eq!(times.utc.1, date.and_hms_opt(15, 0, 50).unwrap());
    assert_eq!(times.sidereal, ("01:23:45".to_string(), "02:28:57".to_string()));
    assert_abs_diff_eq!(times.mjd.0, 56721.580428);
    assert_abs_diff_eq!(times.mjd.1, 56721.625579);
    assert_abs_diff_eq!(times.duration_hours, 1.08361, epsilon = 1e-5);
}

#[test]
fn test_missing_calibrator_and_field() {
    let lines = ["Tracking    : 17 53 12.34   18 53 00.0 J2000"];
    assert!(parse_calibrator(&lines).is_none());
    assert!(parse_field(&lines).is_none());
}

#[test]
fn test_raster() {
    let lines = ["J0000+0000 raster observation"];
    assert!(parse_raster(&lines));
}

#[test]
fn test_duration_crossing_midnight() {
    let lines = response_lines(indoc! {"
        Tracking    : 17 53 12.34   18 53 00.0 J2000
        Observed on : 26/03/2015
        Start time  : 23.55.00 UT   01.23.45 ST   57107.996528 MJD
        Stop time   : 00.05.00 UT   01.33.47 ST   57108.003472 MJD
    "});
    let times = parse_obs_times(&lines).unwrap();
    assert_abs_diff_eq!(times.duration_hours, 0.1667, epsilon = 1e-4);
    assert_abs_diff_eq!(times.duration_hours, 10.0 / 60.0, epsilon = 1e-10);

    let start = NaiveDate::from_ymd_opt(2015, 3, 26).unwrap();
    let stop = NaiveDate::from_ymd_opt(2015, 3, 27).unwrap();
    assert_eq!(times.utc.0, start.and_hms_opt(23, 55, 0).unwrap());
    assert_eq!(times.utc.1, stop.and_hms_opt(0, 5, 0).unwrap());
}

#[test]
fn test_zero_duration() {
    let lines = response_lines(indoc! {"
        Tracking    : 17 53 12.34   18 53 00.0 J2000
        Observed on : 26/03/2015
        Start time  : 00.21.13 UT   01.23.45 ST   57107.014734 MJD
        Stop time   : 00.21.13 UT   01.23.45 ST   57107.014734 MJD
    "});
    let times = parse_obs_times(&lines).unwrap();
    assert_eq!(times.duration_hours, 0.0);
}

#[test]
fn test_missing_time_lines() {
    let lines = response_lines(indoc! {"
        Tracking    : 17 53 12.34   18 53 00.0 J2000
        Observed on : 26/03/2015
        Start time  : 00.21.13 UT   01.23.45 ST   57107.014734 MJD
    "});
    assert!(matches!(
        parse_obs_times(&lines),
        Err(ParseError::MissingTimeLine("Stop time"))
    ));

    let lines = ["Start time  : 00.21.13 UT   01.23.45 ST   57107.014734 MJD"];
    assert!(matches!(
        parse_obs_times(&lines),
        Err(ParseError::MissingTimeLine("Tracking"))
    ));

    let lines = response_lines(indoc! {"
        Tracking    : 17 53 12.34   18 53 00.0 J2000
        Observed on : 26/03/2015
        Start time  : 25.61.13 UT   01.23.45 ST   57107.014734 MJD
    "});
    assert!(matches!(
        parse_obs_times(&lines),
        Err(ParseError::BadTime { .. })
    ));
}

#[test]
fn test_rain() {
    let lines = ["apply rain \\", "  Mean amplitude correction factor =  1.0234"];
    assert_abs_diff_eq!(parse_rain_results(&lines).unwrap(), 1.0234);

    let lines = ["apply rain \\", "nothing"];
    assert!(matches!(
        parse_rain_results(&lines),
        Err(ParseError::MissingRain)
    ));
}

#[test]
fn test_flagging() {
    let lines = ["Total of    51234 samples flagged =  12.50%"];
    assert_eq!(parse_flagging_results(&lines).unwrap(), Some(12.5));

    let lines = ["Total of    51234 samples flagged (7.25%)"];
    assert_eq!(parse_flagging_results(&lines).unwrap(), Some(7.25));

    // Not every flagging command reports a total.
    let lines = ["flag int \\", "   51234 samples flagged"];
    assert_eq!(parse_flagging_results(&lines).unwrap(), None);
}

#[test]
fn test_noise() {
    let lines = ["Overall estimated noise:  0.00452 Jy"];
    assert_abs_diff_eq!(parse_reweight_results(&lines).unwrap(), 0.00452);

    let lines = ["reweight \\"];
    assert!(matches!(
        parse_reweight_results(&lines),
        Err(ParseError::MissingNoise)
    ));
}

#[test]
fn test_cal_inter() {
    let lines = ["Archive calibration obs. for J1753+1853 is 2.50 days apart"];
    assert_eq!(parse_cal_inter_results(&lines).unwrap(), (true, Some(2.5)));

    let lines = ["Archive fluxes for this source not available"];
    assert_eq!(parse_cal_inter_results(&lines).unwrap(), (false, None));

    let lines = ["cal inter \\"];
    assert_eq!(parse_cal_inter_results(&lines).unwrap(), (true, None));
}

#[test]
fn test_dispatch_by_command() {
    let mut record = ObservationRecord::default();

    parse_command_output(
        "apply rain \\",
        &["Mean amplitude correction factor =  0.98"],
        &mut record,
    )
    .unwrap();
    assert_eq!(record.rain_amp_correction, Some(0.98));
    // "apply rain" isn't a flagging command.
    assert!(record.flagged_max_percent.is_none());

    // A flagging command without a report still defines the running maximum.
    parse_command_output("flag int \\", &["ok"], &mut record).unwrap();
    assert_eq!(record.flagged_max_percent, Some(FLAGGING_SEED_PERCENT));

    parse_command_output(
        "flag amp field no 0.95 1 yes \\",
        &["Total of 10 samples flagged =  12.50%"],
        &mut record,
    )
    .unwrap();
    assert_eq!(record.flagged_max_percent, Some(12.5));

    // The running maximum never decreases.
    parse_command_output(
        "show flagging no yes \\",
        &["Total of 5 samples flagged =  3.00%"],
        &mut record,
    )
    .unwrap();
    assert_eq!(record.flagged_max_percent, Some(12.5));

    parse_command_output(
        "reweight \\",
        &["Overall estimated noise:  0.004 Jy"],
        &mut record,
    )
    .unwrap();
    assert_eq!(record.est_noise_jy, Some(0.004));

    parse_command_output(
        "cal inter \\",
        &["Archive fluxes for this source not available"],
        &mut record,
    )
    .unwrap();
    assert_eq!(record.archive_cal_available, Some(false));
    assert_eq!(record.archive_cal_days_apart, None);
}

#[test]
fn test_dispatch_required_absent() {
    let mut record = ObservationRecord::default();
    let result = parse_command_output("apply rain \\", &["no factor"], &mut record);
    assert!(matches!(result, Err(ParseError::MissingRain)));
}
