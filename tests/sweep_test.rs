mod common;

use chrono::{TimeZone, Utc};
use common::{FixedIndices, MockModel, CANNED_OUTPUT};
use msise00_rust::grid::{AltitudeInput, LatLonInput};
use msise00_rust::model::{parse_point_output, ModelError};
use msise00_rust::time_utils::TimeInput;
use msise00_rust::{sweep, Error};
use ndarray::array;

#[test]
fn fast_path_single_point_three_altitudes() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let dataset = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21T12:00:00"),
        &AltitudeInput::Column(vec![100.0, 200.0, 300.0]),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap();

    // one driver call per altitude, all with the same driving parameters
    assert_eq!(model.call_count(), 3);
    let calls = model.recorded();
    assert!(calls.iter().all(|c| c.f107_avg81 == 150.0 && c.ap_index == 4.0));
    assert_eq!(indices.call_count(), 1);

    assert_eq!(
        dataset.times(),
        &[Utc.with_ymd_and_hms(2015, 3, 21, 12, 0, 0).unwrap()]
    );
    assert_eq!(dataset.alt_km(), &[100.0, 200.0, 300.0]);
    assert_eq!(dataset.lat(), &[45.0]);
    assert_eq!(dataset.lon(), &[-93.0]);

    let attrs = dataset.attrs().unwrap();
    assert_eq!(attrs.ap, 4.0);
    assert_eq!(attrs.f107, 140.0);
    assert_eq!(attrs.f107a, 150.0);
}

#[test]
fn fast_path_and_degenerate_grid_path_agree() {
    let t = "2015-03-21T12:00:00";
    let alt = AltitudeInput::Column(vec![100.0, 200.0]);

    let fast = sweep::run(
        &MockModel::canned(),
        &FixedIndices::new(),
        &TimeInput::single(t),
        &alt,
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap();

    // 1x1 grids plus a length-1 time sequence force the grid path
    let grid = sweep::run(
        &MockModel::canned(),
        &FixedIndices::new(),
        &TimeInput::sequence([t]),
        &alt,
        &LatLonInput::Grid(array![[45.0]]),
        &LatLonInput::Grid(array![[-93.0]]),
    )
    .unwrap();

    assert_eq!(fast, grid);
}

#[test]
fn round_trip_matches_parsed_records() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let dataset = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21T12:00:00"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap();

    let expected = parse_point_output(CANNED_OUTPUT, "test").unwrap();

    for (i, species) in dataset.species().iter().enumerate() {
        let values = dataset.variable(species).unwrap();
        assert_eq!(values.shape(), &[1, 1, 1, 1]);
        assert_eq!(values[[0, 0, 0, 0]], expected.densities[i], "{species}");
    }
    assert_eq!(
        dataset.variable("Texo").unwrap()[[0, 0, 0, 0]],
        expected.temperatures[0]
    );
    assert_eq!(
        dataset.variable("Tn").unwrap()[[0, 0, 0, 0]],
        expected.temperatures[1]
    );

    let t = Utc.with_ymd_and_hms(2015, 3, 21, 12, 0, 0).unwrap();
    let tn = dataset.column("Tn", t, 45.0, -93.0).unwrap();
    assert_eq!(tn.to_vec(), vec![expected.temperatures[1]]);
}

#[test]
fn grid_path_row_major_over_cells() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let dataset = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Grid(array![[10.0, 20.0]]),
        &LatLonInput::Grid(array![[30.0, 30.0]]),
    )
    .unwrap();

    let calls = model.recorded();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].latitude, 10.0);
    assert_eq!(calls[1].latitude, 20.0);
    // bare date normalizes to midnight
    assert!(calls.iter().all(|c| c.hour == 0 && c.minute == 0));

    assert_eq!(dataset.lat(), &[10.0, 20.0]);
    assert_eq!(dataset.lon(), &[30.0]);
    assert_eq!(dataset.alt_km(), &[200.0]);
}

#[test]
fn hourly_range_sweeps_24_instants() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let dataset = sweep::run(
        &model,
        &indices,
        &TimeInput::sequence(["2020-01-01", "2020-01-02"]),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap();

    assert_eq!(model.call_count(), 24);
    assert_eq!(dataset.times().len(), 24);
    assert_eq!(
        dataset.times()[0],
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        dataset.times()[23],
        Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap()
    );
}

#[test]
fn dimension_mismatch_fails_before_any_external_call() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let err = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Grid(ndarray::Array2::zeros((3, 4))),
        &LatLonInput::Grid(ndarray::Array2::zeros((4, 3))),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Grid(_)));
    assert_eq!(model.call_count(), 0);
    assert_eq!(indices.call_count(), 0);
}

#[test]
fn truncated_density_record_aborts_query() {
    let model = MockModel::truncated();
    let indices = FixedIndices::new();

    let err = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21T12:00:00"),
        &AltitudeInput::Column(vec![100.0, 200.0]),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Model(ModelError::OutputParse { .. })));
}

#[test]
fn nan_coordinate_in_grid_aborts_instead_of_panicking() {
    let model = MockModel::canned();
    let indices = FixedIndices::new();

    let err = sweep::run(
        &model,
        &indices,
        &TimeInput::single("2015-03-21"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Grid(array![[f64::NAN, 45.0]]),
        &LatLonInput::Grid(array![[-93.0, -93.0]]),
    )
    .unwrap_err();

    assert!(matches!(err, Error::InvalidPointInput(_)));
    // the bad cell is rejected before its driver call
    assert_eq!(model.call_count(), 0);
}

#[test]
fn missing_driver_fails_before_anything_runs() {
    let config = msise00_rust::config::Config {
        model_exe: "/nonexistent/msise00_driver".into(),
        ..Default::default()
    };

    let err = sweep::run_with_config(
        &config,
        &TimeInput::single("2015-03-21"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn unsupported_time_type_surfaces() {
    let err = sweep::run(
        &MockModel::canned(),
        &FixedIndices::new(),
        &TimeInput::single("garbage"),
        &AltitudeInput::Scalar(200.0),
        &LatLonInput::Scalar(45.0),
        &LatLonInput::Scalar(-93.0),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Time(_)));
}
