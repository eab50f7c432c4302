use crate::dataset::AtmosphereDataset;
use crate::grid::{self, AltitudeInput, LatLonInput};
use crate::indices::IndexProvider;
use crate::model::PointModel;
use crate::point::evaluate_column;
use crate::sweep::{classify, QueryPlan};
use crate::time_utils::{self, TimeInput};
use crate::Error;
use chrono::{DateTime, Utc};
use log::info;
use ndarray::Array2;
use rayon::prelude::*;

/// Parallel counterpart of `sweep::run`. Semantics are identical to the
/// sequential engine; only the evaluation of independent points is spread
/// across the rayon pool.
pub fn run_parallel(
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
            // degenerate sweep: nothing to parallelize
            crate::sweep::run(model, indices, time, altitude_km, latitude, longitude)
        }
        QueryPlan::GridSweep => sweep_parallel(model, indices, time, altitude_km, &lat, &lon),
    }
}

/// Evaluate every (instant, cell) point of the sweep on the rayon pool,
/// then merge in the same time-outer, row-major order the sequential
/// engine uses. Collecting before merging keeps the coordinate axes and
/// the last-fragment attribute tie-break reproducible regardless of
/// completion order.
pub fn sweep_parallel(
    model: &dyn PointModel,
    indices: &dyn IndexProvider,
    time: &TimeInput,
    altitude_km: &AltitudeInput,
    lat: &Array2<f64>,
    lon: &Array2<f64>,
) -> Result<AtmosphereDataset, Error> {
    let instants = time_utils::to_instant_sequence(time)?;

    let mut points: Vec<(DateTime<Utc>, f64, f64)> = Vec::new();
    for instant in &instants {
        for i in 0..lat.nrows() {
            for j in 0..lat.ncols() {
                points.push((*instant, lat[[i, j]], lon[[i, j]]));
            }
        }
    }

    let fragments = points
        .par_iter()
        .map(|(instant, cell_lat, cell_lon)| {
            info!("computing {} at lat={} lon={}", instant, cell_lat, cell_lon);
            evaluate_column(
                model,
                indices,
                &TimeInput::single(*instant),
                altitude_km,
                &LatLonInput::Scalar(*cell_lat),
                &LatLonInput::Scalar(*cell_lon),
            )
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut dataset = AtmosphereDataset::new();
    let mut last_attrs = None;
    for fragment in &fragments {
        last_attrs = Some(fragment.attrs);
        dataset.merge(fragment)?;
    }
    if let Some(attrs) = last_attrs {
        dataset.set_attrs(attrs);
    }

    Ok(dataset)
}
