use crate::model::{SPECIES, TTYPES};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array4};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("fragment variable set {found:?} does not match dataset variables {expected:?}")]
    VariableMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("fragment altitude axis {found:?} does not match dataset alt_km {expected:?}")]
    AltitudeMismatch { expected: Vec<f64>, found: Vec<f64> },

    #[error("variable {name} has {found} values for {expected} altitudes")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Driving-parameter provenance attached to fragments and, after the final
/// merge, to the whole dataset (last fragment wins).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetAttrs {
    pub ap: f64,
    pub f107: f64,
    pub f107a: f64,
}

/// Single-point dataset produced by one point evaluation, before merging.
///
/// Coordinates: `time = [instant]`, `lat = [latitude]`, `lon = [longitude]`,
/// plus the full altitude column. One value column per variable, in fixed
/// species-then-temperature order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub alt_km: Array1<f64>,
    pub values: Vec<(String, Array1<f64>)>,
    pub attrs: DatasetAttrs,
}

impl Fragment {
    pub fn variable_names(&self) -> Vec<String> {
        self.values.iter().map(|(name, _)| name.clone()).collect()
    }
}

type CellKey = (DateTime<Utc>, u64, u64);

/// Labeled 4-D atmosphere dataset indexed by (time, alt_km, lat, lon).
///
/// Built incrementally: coordinate indexes per axis stay sorted and
/// deduplicated, cells are stored sparsely per (time, lat, lon), and the
/// dense array is materialized only on read. Merging a fragment whose
/// coordinates are already present overwrites that cell; disjoint
/// coordinates extend the axis union.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtmosphereDataset {
    time: Vec<DateTime<Utc>>,
    alt_km: Vec<f64>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    variables: Vec<String>,
    cells: HashMap<CellKey, Vec<Array1<f64>>>,
    attrs: Option<DatasetAttrs>,
}

impl AtmosphereDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn alt_km(&self) -> &[f64] {
        &self.alt_km
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn attrs(&self) -> Option<&DatasetAttrs> {
        self.attrs.as_ref()
    }

    /// Fixed species vocabulary, as a dataset attribute.
    pub fn species(&self) -> &'static [&'static str] {
        &SPECIES
    }

    pub fn set_attrs(&mut self, attrs: DatasetAttrs) {
        self.attrs = Some(attrs);
    }

    /// Merge one fragment, aligning coordinates with what is already here.
    ///
    /// The first fragment establishes the variable set and the altitude
    /// axis; later fragments must match both exactly.
    pub fn merge(&mut self, fragment: &Fragment) -> Result<(), MergeError> {
        let names = fragment.variable_names();
        let frag_alt = fragment.alt_km.to_vec();

        if self.cells.is_empty() {
            self.variables = names;
            self.alt_km = frag_alt;
        } else {
            if names != self.variables {
                return Err(MergeError::VariableMismatch {
                    expected: self.variables.clone(),
                    found: names,
                });
            }
            if frag_alt != self.alt_km {
                return Err(MergeError::AltitudeMismatch {
                    expected: self.alt_km.clone(),
                    found: frag_alt,
                });
            }
        }

        for (name, column) in &fragment.values {
            if column.len() != self.alt_km.len() {
                return Err(MergeError::ColumnLength {
                    name: name.clone(),
                    expected: self.alt_km.len(),
                    found: column.len(),
                });
            }
        }

        insert_sorted_time(&mut self.time, fragment.time);
        insert_sorted(&mut self.lat, fragment.latitude);
        insert_sorted(&mut self.lon, fragment.longitude);

        let key = (
            fragment.time,
            fragment.latitude.to_bits(),
            fragment.longitude.to_bits(),
        );
        let columns = fragment
            .values
            .iter()
            .map(|(_, column)| column.clone())
            .collect();
        self.cells.insert(key, columns);

        Ok(())
    }

    /// Dense 4-D array for one variable, shaped [time, alt_km, lat, lon].
    /// Cells never visited by a fragment are NaN.
    pub fn variable(&self, name: &str) -> Option<Array4<f64>> {
        let var_idx = self.variables.iter().position(|v| v == name)?;

        let shape = (
            self.time.len(),
            self.alt_km.len(),
            self.lat.len(),
            self.lon.len(),
        );
        let mut dense = Array4::from_elem(shape, f64::NAN);

        for ((time, lat_bits, lon_bits), columns) in &self.cells {
            let ti = self.time.binary_search(time).ok()?;
            let lati = self.lat.iter().position(|v| v.to_bits() == *lat_bits)?;
            let loni = self.lon.iter().position(|v| v.to_bits() == *lon_bits)?;

            for (ai, value) in columns[var_idx].iter().enumerate() {
                dense[[ti, ai, lati, loni]] = *value;
            }
        }

        Some(dense)
    }

    /// Per-altitude column for one variable at one (time, lat, lon) cell.
    pub fn column(
        &self,
        name: &str,
        time: DateTime<Utc>,
        lat: f64,
        lon: f64,
    ) -> Option<&Array1<f64>> {
        let var_idx = self.variables.iter().position(|v| v == name)?;
        self.cells
            .get(&(time, lat.to_bits(), lon.to_bits()))
            .map(|columns| &columns[var_idx])
    }

    /// Expected variable vocabulary for fragments of this system.
    pub fn expected_variables() -> Vec<String> {
        SPECIES
            .iter()
            .chain(TTYPES.iter())
            .map(|s| s.to_string())
            .collect()
    }
}

fn insert_sorted_time(axis: &mut Vec<DateTime<Utc>>, value: DateTime<Utc>) {
    if let Err(pos) = axis.binary_search(&value) {
        axis.insert(pos, value);
    }
}

fn insert_sorted(axis: &mut Vec<f64>, value: f64) {
    match axis.binary_search_by(|probe| probe.partial_cmp(&value).expect("NaN coordinate")) {
        Ok(_) => {}
        Err(pos) => axis.insert(pos, value),
    }
}
