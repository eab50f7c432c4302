use crossbeam_channel::{bounded, RecvTimeoutError};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Species reported by the point model, in output order.
pub const SPECIES: [&str; 9] = ["He", "O", "N2", "O2", "Ar", "Total", "H", "N", "AnomalousO"];

/// Temperature variables reported by the point model, in output order.
pub const TTYPES: [&str; 2] = ["Texo", "Tn"];

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("point-model invocation failed ({context}): {detail}")]
    Invocation { context: String, detail: String },

    #[error("point-model output parse error ({context}): {detail}")]
    OutputParse { context: String, detail: String },
}

/// One invocation of the atmosphere point model.
///
/// Both flux slots carry the 81-day smoothed value; the daily flux is not
/// threaded through at this call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRequest {
    pub day_of_year: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub f107_avg81: f64,
    pub ap_index: f64,
    pub altitude_km: f64,
}

impl ModelRequest {
    /// Positional argument list in the driver's expected order.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            format!("{:03}", self.day_of_year),
            self.hour.to_string(),
            self.minute.to_string(),
            self.second.to_string(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.f107_avg81.to_string(),
            self.f107_avg81.to_string(),
            self.ap_index.to_string(),
            self.altitude_km.to_string(),
        ]
    }

    /// Reproduction context carried in error messages.
    pub fn context(&self) -> String {
        format!(
            "doy={} {:02}:{:02}:{:02} lat={} lon={} alt_km={}",
            self.day_of_year,
            self.hour,
            self.minute,
            self.second,
            self.latitude,
            self.longitude,
            self.altitude_km
        )
    }
}

/// Parsed result of one point-model invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResult {
    /// Number densities per species, in `SPECIES` order
    pub densities: [f64; SPECIES.len()],
    /// Temperatures in `TTYPES` order (exospheric, local)
    pub temperatures: [f64; TTYPES.len()],
}

/// The external numeric kernel, treated as a pure stateless function.
///
/// Implemented over a subprocess by `SubprocessModel`; tests substitute
/// in-process mocks through this seam.
pub trait PointModel: Sync {
    fn eval(&self, request: &ModelRequest) -> Result<PointResult, ModelError>;
}

/// Parse the driver's two-line response: a fixed-width density record
/// followed by a fixed-width temperature record.
pub fn parse_point_output(text: &str, context: &str) -> Result<PointResult, ModelError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let densities = parse_record::<{ SPECIES.len() }>(lines.next(), "density", context)?;
    let temperatures = parse_record::<{ TTYPES.len() }>(lines.next(), "temperature", context)?;

    Ok(PointResult {
        densities,
        temperatures,
    })
}

fn parse_record<const N: usize>(
    line: Option<&str>,
    record: &str,
    context: &str,
) -> Result<[f64; N], ModelError> {
    let line = line.ok_or_else(|| ModelError::OutputParse {
        context: context.to_string(),
        detail: format!("missing {record} record"),
    })?;

    let values: Vec<f64> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|e| ModelError::OutputParse {
            context: context.to_string(),
            detail: format!("non-numeric value in {record} record: {e}"),
        })?;

    values.try_into().map_err(|v: Vec<f64>| ModelError::OutputParse {
        context: context.to_string(),
        detail: format!("{record} record has {} values, expected {N}", v.len()),
    })
}

/// Point model backed by the compiled MSISE-00 driver executable.
pub struct SubprocessModel {
    exe: PathBuf,
    timeout: Duration,
}

impl SubprocessModel {
    pub fn new(exe: PathBuf, timeout: Duration) -> Self {
        Self { exe, timeout }
    }
}

impl PointModel for SubprocessModel {
    fn eval(&self, request: &ModelRequest) -> Result<PointResult, ModelError> {
        let context = request.context();
        let invocation = |detail: String| ModelError::Invocation {
            context: context.clone(),
            detail,
        };

        let mut child = Command::new(&self.exe)
            .args(request.to_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| invocation(format!("{}: {e}", self.exe.display())))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| invocation("could not capture driver stdout".to_string()))?;

        // Reader thread owns only the pipe; the child handle stays here so
        // an unresponsive driver can be killed on timeout.
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let mut buf = String::new();
            let result = stdout.read_to_string(&mut buf).map(|_| buf);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) => {
                let status = child.wait().map_err(|e| invocation(e.to_string()))?;
                if !status.success() {
                    return Err(invocation(format!("driver exited with {status}")));
                }
                parse_point_output(&text, &context)
            }
            Ok(Err(e)) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(invocation(format!("unreadable driver output: {e}")))
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(invocation(format!(
                    "driver timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}
