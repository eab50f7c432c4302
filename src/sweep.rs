use crate::config::Config;
use crate::dataset::AtmosphereDataset;
use crate::grid::{self, AltitudeInput, LatLonInput};
use crate::indices::{FileIndexProvider, IndexProvider};
use crate::model::{PointModel, SubprocessModel};
use crate::point::evaluate_column;
use crate::time_utils::{self, TimeInput};
use crate::Error;
use log::info;
use ndarray::Array2;

/// Route chosen for a query, decided purely from input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPlan {
    /// Single instant at a single location: evaluate directly.
    SinglePoint,
    /// Anything else: full time x lat/lon sweep.
    GridSweep,
}

/// Classify a query. Side-effect free: the fast path applies only when both
/// location grids hold exactly one element and the time input is a single
/// time-like value rather than a sequence or range.
pub fn classify(lat: &Array2<f64>, lon: &Array2<f64>, time: &TimeInput) -> QueryPlan {
    if lat.len() == 1 && lon.len() == 1 && time.is_single() {
        QueryPlan::SinglePoint
    } else {
        QueryPlan::GridSweep
    }
}

/// Public entry point: compute atmospheric state over arbitrary time,
/// altitude, and location inputs, returning the merged labeled dataset.
///
/// Fails all-or-nothing: any evaluation error aborts the query and no
/// partial dataset is returned.
pub fn run(
    model: &dyn PointModel,
    indices: &dyn IndexProvider,
    time: &TimeInput,
    altitude_km: &AltitudeInput,
    latitude: &LatLonInput,
    longitude: &LatLonInput,
) -> Result<AtmosphereDataset, Error> {
    let (lat, lon) = grid::normalize_latlon(latitude, longitude)?;

    match classify(&lat, &lon, time) {
        QueryPlan::SinglePoint => {
            let fragment = evaluate_column(model, indices, time, altitude_km, latitude, longitude)?;
            let attrs = fragment.attrs;
            let mut dataset = AtmosphereDataset::new();
            dataset.merge(&fragment)?;
            dataset.set_attrs(attrs);
            Ok(dataset)
        }
        QueryPlan::GridSweep => sweep(model, indices, time, altitude_km, &lat, &lon),
    }
}

/// `run` wired to the configured driver executable and indices table.
pub fn run_with_config(
    config: &Config,
    time: &TimeInput,
    altitude_km: &AltitudeInput,
    latitude: &LatLonInput,
    longitude: &LatLonInput,
) -> Result<AtmosphereDataset, Error> {
    config.validate()?;
    let indices = FileIndexProvider::open(&config.indices_path)?;
    let model = SubprocessModel::new(config.model_exe.clone(), config.model_timeout);
    run(&model, &indices, time, altitude_km, latitude, longitude)
}

/// Sequential grid/time loop and merge engine.
///
/// Iterates instants in input order and grid cells row-major, evaluating
/// one column per cell and merging each fragment as it arrives. The final
/// dataset carries the attributes of the last fragment processed.
pub fn sweep(
    model: &dyn PointModel,
    indices: &dyn IndexProvider,
    time: &TimeInput,
    altitude_km: &AltitudeInput,
    lat: &Array2<f64>,
    lon: &Array2<f64>,
) -> Result<AtmosphereDataset, Error> {
    let instants = time_utils::to_instant_sequence(time)?;

    let mut dataset = AtmosphereDataset::new();
    let mut last_attrs = None;

    for instant in &instants {
        for i in 0..lat.nrows() {
            for j in 0..lat.ncols() {
                info!(
                    "computing {} at lat={} lon={}",
                    instant,
                    lat[[i, j]],
                    lon[[i, j]]
                );
                let fragment = evaluate_column(
                    model,
                    indices,
                    &TimeInput::single(*instant),
                    altitude_km,
                    &LatLonInput::Scalar(lat[[i, j]]),
                    &LatLonInput::Scalar(lon[[i, j]]),
                )?;
                last_attrs = Some(fragment.attrs);
                dataset.merge(&fragment)?;
            }
        }
    }

    if let Some(attrs) = last_attrs {
        dataset.set_attrs(attrs);
    }

    Ok(dataset)
}
