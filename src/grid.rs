use ndarray::{Array1, Array2};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("latitude/longitude dimension mismatch: lat {lat:?} vs lon {lon:?}")]
    DimensionMismatch { lat: Vec<usize>, lon: Vec<usize> },
}

/// Latitude or longitude argument: a scalar or a 2-D grid.
#[derive(Debug, Clone, PartialEq)]
pub enum LatLonInput {
    Scalar(f64),
    Grid(Array2<f64>),
}

impl From<f64> for LatLonInput {
    fn from(v: f64) -> Self {
        LatLonInput::Scalar(v)
    }
}

impl From<Array2<f64>> for LatLonInput {
    fn from(a: Array2<f64>) -> Self {
        LatLonInput::Grid(a)
    }
}

impl LatLonInput {
    /// Coerce to at least two dimensions: a scalar becomes a 1x1 grid.
    pub fn to_grid(&self) -> Array2<f64> {
        match self {
            LatLonInput::Scalar(v) => Array2::from_elem((1, 1), *v),
            LatLonInput::Grid(a) => a.clone(),
        }
    }
}

/// Altitude argument: a scalar or a 1-D column of altitudes in km.
#[derive(Debug, Clone, PartialEq)]
pub enum AltitudeInput {
    Scalar(f64),
    Column(Vec<f64>),
}

impl From<f64> for AltitudeInput {
    fn from(v: f64) -> Self {
        AltitudeInput::Scalar(v)
    }
}

impl From<Vec<f64>> for AltitudeInput {
    fn from(v: Vec<f64>) -> Self {
        AltitudeInput::Column(v)
    }
}

impl From<Array1<f64>> for AltitudeInput {
    fn from(a: Array1<f64>) -> Self {
        AltitudeInput::Column(a.to_vec())
    }
}

impl AltitudeInput {
    /// Coerce to at least one dimension.
    pub fn to_column(&self) -> Array1<f64> {
        match self {
            AltitudeInput::Scalar(v) => Array1::from_elem(1, *v),
            AltitudeInput::Column(v) => Array1::from_vec(v.clone()),
        }
    }
}

/// Canonical 2-D lat/lon axes, validated for shape agreement.
///
/// Fails fast, before any external call is made, when the two grids do not
/// have exactly the same shape.
pub fn normalize_latlon(
    latitude: &LatLonInput,
    longitude: &LatLonInput,
) -> Result<(Array2<f64>, Array2<f64>), GridError> {
    let lat = latitude.to_grid();
    let lon = longitude.to_grid();

    if lat.shape() != lon.shape() {
        return Err(GridError::DimensionMismatch {
            lat: lat.shape().to_vec(),
            lon: lon.shape().to_vec(),
        });
    }

    Ok((lat, lon))
}
