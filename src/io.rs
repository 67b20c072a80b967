//! Safetensors Loader / Writer for [`Dataset`]s.
//!
//! Layout: 8-byte little-endian header length, JSON header, raw tensor bytes.
//! Dimension names and attributes ride in the standard `__metadata__` map:
//!
//! ```text
//! "dims.aa"  : "time,lat,lon"
//! "attrs.aa" : "{\"units\":\"K\"}"
//! ```
//!
//! Tensors without a `dims.<name>` entry get `dim_0, dim_1, …`.
use ndarray::{ArrayD, IxDyn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dataset::{DType, Dataset, Variable};

const METADATA_KEY: &str = "__metadata__";

/// Loader / Writer failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input file does not exist.
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Malformed(String),

    #[error("variable {0:?} has unsupported dtype {1}")]
    UnsupportedDtype(String, String),

    #[error("variable {0:?} not found in dataset")]
    MissingVariable(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("dataset header: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Read every tensor of a safetensors file into a [`Dataset`].
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DatasetError::NotFound(path.to_path_buf()),
        _ => DatasetError::Io { path: path.to_path_buf(), source: e },
    })?;
    let (header, data_start) = parse_header(&bytes)?;
    let metadata = header.get(METADATA_KEY).and_then(Value::as_object);

    let mut ds = Dataset::new();
    for (name, entry) in &header {
        if name == METADATA_KEY {
            continue;
        }
        let tag = entry["dtype"]
            .as_str()
            .ok_or_else(|| DatasetError::Malformed(format!("{name}: missing dtype")))?;
        let dtype = DType::parse(tag)
            .ok_or_else(|| DatasetError::UnsupportedDtype(name.clone(), tag.to_string()))?;
        let shape = shape_of(name, entry)?;
        let raw = tensor_bytes(&bytes, data_start, name, entry)?;

        let n_elem: usize = shape.iter().product();
        if raw.len() != n_elem * dtype.size() {
            return Err(DatasetError::Malformed(format!(
                "{name}: {} bytes for shape {shape:?} of {}",
                raw.len(),
                dtype.as_str()
            )));
        }
        let data = ArrayD::from_shape_vec(IxDyn(&shape), decode(raw, dtype))?;

        let dims = match meta_str(metadata, &format!("dims.{name}")) {
            Some("") => vec![],
            Some(s) => s.split(',').map(str::to_string).collect(),
            None => (0..shape.len()).map(|i| format!("dim_{i}")).collect(),
        };
        let mut var = Variable::new(dims, data, dtype)?;
        if let Some(s) = meta_str(metadata, &format!("attrs.{name}")) {
            var.attrs = serde_json::from_str(s)?;
        }
        ds.insert(name, var);
    }
    Ok(ds)
}

fn parse_header(bytes: &[u8]) -> Result<(Map<String, Value>, usize), DatasetError> {
    let len_bytes: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| DatasetError::Malformed("file too small".into()))?;
    let n = u64::from_le_bytes(len_bytes) as usize;
    let too_long = || DatasetError::Malformed(format!("header length {n} exceeds file"));
    let end = n.checked_add(8).ok_or_else(too_long)?;
    let body = bytes.get(8..end).ok_or_else(too_long)?;
    let header: Map<String, Value> = serde_json::from_slice(body)?;
    Ok((header, end))
}

fn shape_of(name: &str, entry: &Value) -> Result<Vec<usize>, DatasetError> {
    entry["shape"]
        .as_array()
        .ok_or_else(|| DatasetError::Malformed(format!("{name}: missing shape")))?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|d| d as usize)
                .ok_or_else(|| DatasetError::Malformed(format!("{name}: bad shape entry {v}")))
        })
        .collect()
}

fn tensor_bytes<'a>(
    bytes: &'a [u8],
    data_start: usize,
    name: &str,
    entry: &Value,
) -> Result<&'a [u8], DatasetError> {
    let bad = || DatasetError::Malformed(format!("{name}: bad data_offsets"));
    let offsets = entry["data_offsets"].as_array().ok_or_else(bad)?;
    let (s, e) = match offsets.as_slice() {
        [s, e] => (
            s.as_u64().ok_or_else(bad)? as usize,
            e.as_u64().ok_or_else(bad)? as usize,
        ),
        _ => return Err(bad()),
    };
    let start = data_start.checked_add(s).ok_or_else(bad)?;
    let end = data_start.checked_add(e).ok_or_else(bad)?;
    if start > end {
        return Err(bad());
    }
    bytes.get(start..end).ok_or_else(bad)
}

fn decode(raw: &[u8], dtype: DType) -> Vec<f64> {
    match dtype {
        DType::F32 => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        DType::F64 => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        DType::I32 => raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        DType::I64 => raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
            .collect(),
    }
}

fn meta_str<'a>(metadata: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    metadata?.get(key)?.as_str()
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Write every variable of `ds`, in its stored dtype, to `path`.
pub fn write_dataset(ds: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let mut w = StWriter::new();
    for (name, var) in &ds.variables {
        w.add_variable(name, var)?;
    }
    w.write(path)
}

/// Safetensors file builder with a `__metadata__` string map.
///
/// Usage:
/// ```rust,no_run
/// use climlpf::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("aa", &[1.0f32, 2.0, 3.0], &[3]);
/// w.add_metadata("dims.aa", "time");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, DType, Vec<usize>)>,
    metadata: BTreeMap<String, String>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, DType::F32, shape.to_vec()));
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, DType::F64, shape.to_vec()));
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, DType::I32, shape.to_vec()));
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, DType::I64, shape.to_vec()));
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Add a variable cast to its stored dtype, plus its dims and attrs.
    pub fn add_variable(&mut self, name: &str, var: &Variable) -> Result<(), DatasetError> {
        let shape = var.shape().to_vec();
        let values = var.data.iter().copied();
        match var.dtype {
            DType::F32 => self.add_f32(name, &values.map(|v| v as f32).collect::<Vec<_>>(), &shape),
            DType::F64 => self.add_f64(name, &values.collect::<Vec<_>>(), &shape),
            DType::I32 => self.add_i32(name, &values.map(|v| v as i32).collect::<Vec<_>>(), &shape),
            DType::I64 => self.add_i64(name, &values.map(|v| v as i64).collect::<Vec<_>>(), &shape),
        }
        self.add_metadata(&format!("dims.{name}"), &var.dims.join(","));
        if !var.attrs.is_empty() {
            self.add_metadata(&format!("attrs.{name}"), &serde_json::to_string(&var.attrs)?);
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<(), DatasetError> {
        let io_err = |source| DatasetError::Io { path: path.to_path_buf(), source };

        let mut header_map = Map::new();
        if !self.metadata.is_empty() {
            header_map.insert(METADATA_KEY.to_string(), serde_json::to_value(&self.metadata)?);
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype.as_str(),
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes
            .into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();

        let mut f = std::fs::File::create(path).map_err(io_err)?;
        f.write_all(&(padded.len() as u64).to_le_bytes()).map_err(io_err)?;
        f.write_all(&padded).map_err(io_err)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data).map_err(io_err)?;
        }
        Ok(())
    }
}
