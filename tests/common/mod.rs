//! Shared mocks for integration tests: an in-process point model and a
//! fixed index provider, substituted through the crate's trait seams.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use msise00_rust::indices::{DrivingParameters, IndexProvider, IndicesError};
use msise00_rust::model::{parse_point_output, ModelError, ModelRequest, PointModel, PointResult};
use std::sync::Mutex;

/// Canned driver response used by round-trip tests.
pub const CANNED_OUTPUT: &str =
    "5.0e13 1.0e16 2.0e17 3.0e16 4.0e14 7.0e-8 6.0e13 2.0e12 1.0e11\n1027.3 886.5\n";

/// Point model that records every request and replies from a closure.
pub struct MockModel {
    pub calls: Mutex<Vec<ModelRequest>>,
    respond: Box<dyn Fn(&ModelRequest) -> Result<PointResult, ModelError> + Send + Sync>,
}

impl MockModel {
    pub fn new(
        respond: impl Fn(&ModelRequest) -> Result<PointResult, ModelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Replies with the parsed canned two-record response.
    pub fn canned() -> Self {
        Self::new(|request| parse_point_output(CANNED_OUTPUT, &request.context()))
    }

    /// Replies with text that is missing one density value.
    pub fn truncated() -> Self {
        Self::new(|request| {
            parse_point_output(
                "5.0e13 1.0e16 2.0e17 3.0e16 4.0e14 7.0e-8 6.0e13 2.0e12\n1027.3 886.5\n",
                &request.context(),
            )
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl PointModel for MockModel {
    fn eval(&self, request: &ModelRequest) -> Result<PointResult, ModelError> {
        self.calls.lock().unwrap().push(*request);
        (self.respond)(request)
    }
}

/// Index provider returning the same parameters for every date.
pub struct FixedIndices {
    pub params: DrivingParameters,
    pub calls: Mutex<usize>,
}

impl FixedIndices {
    pub fn new() -> Self {
        Self {
            params: DrivingParameters {
                f107_avg81: 150.0,
                f107_daily: 140.0,
                ap_index: 4.0,
            },
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Default for FixedIndices {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexProvider for FixedIndices {
    fn get(
        &self,
        _time: DateTime<Utc>,
        _smooth_days: u32,
    ) -> Result<DrivingParameters, IndicesError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.params)
    }
}
