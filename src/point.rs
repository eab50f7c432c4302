use crate::dataset::{DatasetAttrs, Fragment};
use crate::grid::{AltitudeInput, LatLonInput};
use crate::indices::{IndexProvider, SMOOTH_DAYS};
use crate::model::{ModelRequest, PointModel, SPECIES, TTYPES};
use crate::time_utils::{self, TimeInput};
use crate::Error;
use chrono::{Datelike, Timelike};
use ndarray::Array2;

/// Collapse a lat/lon input to a finite numeric scalar. A 1x1 grid
/// squeezes; any larger grid or a non-finite value is a contract violation
/// at this call site.
fn to_scalar(name: &str, input: &LatLonInput) -> Result<f64, Error> {
    let value = match input {
        LatLonInput::Scalar(v) => *v,
        LatLonInput::Grid(g) if g.len() == 1 => g[[0, 0]],
        LatLonInput::Grid(g) => {
            return Err(Error::InvalidPointInput(format!(
                "{name} must be scalar for point evaluation, got shape {:?}",
                g.shape()
            )))
        }
    };

    // NaN or infinite coordinates cannot be placed on a sorted axis
    if !value.is_finite() {
        return Err(Error::InvalidPointInput(format!(
            "{name} must be finite, got {value}"
        )));
    }

    Ok(value)
}

/// Evaluate the atmosphere at one (instant, lat, lon) over a column of
/// altitudes. This is the atomic operation every sweep loops over.
///
/// Fetches driving parameters once, then invokes the point model once per
/// altitude. The 81-day smoothed flux is passed in both flux slots of the
/// model call; the daily value is recorded in the fragment attributes only.
/// Any model failure aborts the whole column: no partial-altitude results.
pub fn evaluate_column(
    model: &dyn PointModel,
    indices: &dyn IndexProvider,
    time: &TimeInput,
    altitude_km: &AltitudeInput,
    latitude: &LatLonInput,
    longitude: &LatLonInput,
) -> Result<Fragment, Error> {
    let instant = time_utils::to_instant(time)?;
    let lat = to_scalar("latitude", latitude)?;
    let lon = to_scalar("longitude", longitude)?;

    let params = indices.get(instant, SMOOTH_DAYS)?;

    let alt_km = altitude_km.to_column();
    let mut densities = Array2::<f64>::zeros((alt_km.len(), SPECIES.len()));
    let mut temperatures = Array2::<f64>::zeros((alt_km.len(), TTYPES.len()));

    for (i, alt) in alt_km.iter().enumerate() {
        let request = ModelRequest {
            day_of_year: instant.ordinal(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
            latitude: lat,
            longitude: lon,
            f107_avg81: params.f107_avg81,
            ap_index: params.ap_index,
            altitude_km: *alt,
        };

        let result = model.eval(&request)?;
        for (j, value) in result.densities.iter().enumerate() {
            densities[[i, j]] = *value;
        }
        for (j, value) in result.temperatures.iter().enumerate() {
            temperatures[[i, j]] = *value;
        }
    }

    let mut values = Vec::with_capacity(SPECIES.len() + TTYPES.len());
    for (j, name) in SPECIES.iter().enumerate() {
        values.push((name.to_string(), densities.column(j).to_owned()));
    }
    for (j, name) in TTYPES.iter().enumerate() {
        values.push((name.to_string(), temperatures.column(j).to_owned()));
    }

    Ok(Fragment {
        time: instant,
        latitude: lat,
        longitude: lon,
        alt_km,
        values,
        attrs: DatasetAttrs {
            ap: params.ap_index,
            f107: params.f107_daily,
            f107a: params.f107_avg81,
        },
    })
}
