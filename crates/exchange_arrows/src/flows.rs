use crate::constants::FLOW_CSV_HEADERS;
use crate::error::{ArrowError, Result};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// One cross-border exchange as delivered by the data layer.
///
/// `net_flow` is signed: positive flows run against `base_rotation`,
/// negative flows along it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub identity: String,
    pub geo_position: Option<GeoPoint>,
    pub net_flow: f64,
    pub carbon_intensity: f64,
    pub base_rotation: f64,
}

impl FlowRecord {
    pub fn new(identity: impl Into<String>, geo_position: Option<GeoPoint>, net_flow: f64) -> Self {
        Self {
            identity: identity.into(),
            geo_position,
            net_flow,
            carbon_intensity: 0.0,
            base_rotation: 0.0,
        }
    }

    pub fn with_carbon_intensity(mut self, carbon_intensity: f64) -> Self {
        self.carbon_intensity = carbon_intensity;
        self
    }

    pub fn with_base_rotation(mut self, base_rotation: f64) -> Self {
        self.base_rotation = base_rotation;
        self
    }

    pub fn abs_flow(&self) -> f64 {
        self.net_flow.abs()
    }
}

/// Reads flow records from a CSV file
///
/// # Errors
/// Returns error if the file cannot be opened or a row is malformed
pub fn read_flows_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FlowRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let flows = read_flows_from_reader(file)?;
    debug!("Read {} flow records from {}", flows.len(), path.display());
    Ok(flows)
}

/// Read CSV with `Key,Longitude,Latitude,NetFlow,CarbonIntensity,Rotation` format.
/// - Empty longitude or latitude means the exchange has no map position
/// - A NaN or infinite coordinate is treated the same way
/// - Empty carbon intensity means unknown (NaN)
/// - Empty rotation defaults to 0
pub fn read_flows_from_reader<R: Read>(reader: R) -> Result<Vec<FlowRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    validate_headers(&mut rdr)?;

    let mut flows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2; // 1-indexed, +1 for header
        flows.push(parse_record(&rec, row)?);
    }
    Ok(flows)
}

fn validate_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<()> {
    let headers = rdr.headers()?;
    if headers.len() < FLOW_CSV_HEADERS.len() {
        return Err(ArrowError::CsvHeader(format!(
            "expected {}, got {}",
            FLOW_CSV_HEADERS.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }
    for (i, expected) in FLOW_CSV_HEADERS.iter().enumerate() {
        let got = headers.get(i).unwrap_or_default();
        if !got.eq_ignore_ascii_case(expected) {
            return Err(ArrowError::CsvHeader(format!(
                "column {} should be '{}', got '{}'",
                i + 1,
                expected,
                got
            )));
        }
    }
    Ok(())
}

fn parse_record(rec: &StringRecord, row: usize) -> Result<FlowRecord> {
    if rec.len() < FLOW_CSV_HEADERS.len() {
        return Err(ArrowError::CsvRow {
            row,
            expected: FLOW_CSV_HEADERS.len(),
            got: rec.len(),
        });
    }

    let identity = rec.get(0).unwrap_or_default().to_string();
    let lon = parse_optional(rec.get(1), row, "Longitude")?;
    let lat = parse_optional(rec.get(2), row, "Latitude")?;
    let geo_position = match (lon, lat) {
        (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => {
            Some(GeoPoint::new(lon, lat))
        }
        (Some(lon), Some(lat)) => {
            warn!("Row {row} ({identity}): non-finite position ({lon}, {lat}), treating as unpositioned");
            None
        }
        (None, None) => None,
        _ => {
            warn!("Row {row} ({identity}): only one of longitude/latitude given, treating as unpositioned");
            None
        }
    };

    let net_flow = parse_required(rec.get(3), row, "NetFlow")?;
    let carbon_intensity = parse_optional(rec.get(4), row, "CarbonIntensity")?.unwrap_or(f64::NAN);
    let base_rotation = parse_optional(rec.get(5), row, "Rotation")?.unwrap_or(0.0);

    Ok(FlowRecord {
        identity,
        geo_position,
        net_flow,
        carbon_intensity,
        base_rotation,
    })
}

fn parse_optional(field: Option<&str>, row: usize, column: &'static str) -> Result<Option<f64>> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|source| ArrowError::ValueParse {
            row,
            column,
            value: s.to_string(),
            source,
        }),
    }
}

fn parse_required(field: Option<&str>, row: usize, column: &'static str) -> Result<f64> {
    let s = field.map(str::trim).unwrap_or_default();
    s.parse::<f64>().map_err(|source| ArrowError::ValueParse {
        row,
        column,
        value: s.to_string(),
        source,
    })
}
