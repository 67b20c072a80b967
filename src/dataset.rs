//! In-memory gridded dataset: named variables over named dimensions.
//!
//! Values are held as `f64` regardless of the on-disk type; [`DType`]
//! remembers the storage type so the writer can cast back.
use ndarray::{ArrayD, Axis};
use std::collections::BTreeMap;

use crate::io::DatasetError;

/// Storage type of a variable on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
}

impl DType {
    /// safetensors dtype tag.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "F32",
            DType::F64 => "F64",
            DType::I32 => "I32",
            DType::I64 => "I64",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "F32" => Some(DType::F32),
            "F64" => Some(DType::F64),
            "I32" => Some(DType::I32),
            "I64" => Some(DType::I64),
            _ => None,
        }
    }

    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }
}

/// A named-dimension array with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// One name per array axis, in axis order.
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub dtype: DType,
    pub attrs: BTreeMap<String, String>,
}

impl Variable {
    /// Build a variable; `dims` must name every axis of `data`.
    pub fn new(dims: Vec<String>, data: ArrayD<f64>, dtype: DType) -> Result<Self, DatasetError> {
        if dims.len() != data.ndim() {
            return Err(DatasetError::Malformed(format!(
                "{} dimension names for an array of rank {}",
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self { dims, data, dtype, attrs: BTreeMap::new() })
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Axis index of the dimension called `dim`.
    pub fn axis_of(&self, dim: &str) -> Option<Axis> {
        self.dims.iter().position(|d| d == dim).map(Axis)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// A set of variables keyed by name.
///
/// A 1-D variable whose name equals its only dimension is that dimension's
/// coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub variables: BTreeMap<String, Variable>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, var: Variable) {
        self.variables.insert(name.to_string(), var);
    }

    pub fn variable(&self, name: &str) -> Result<&Variable, DatasetError> {
        self.variables
            .get(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    /// Coordinate variables for the dimensions of `name`.
    pub fn coords_for(&self, name: &str) -> Result<Vec<(&str, &Variable)>, DatasetError> {
        let var = self.variable(name)?;
        Ok(var
            .dims
            .iter()
            .filter(|d| d.as_str() != name)
            .filter_map(|d| {
                self.variables
                    .get_key_value(d)
                    .filter(|(_, c)| c.dims.len() == 1 && &c.dims[0] == d)
                    .map(|(k, c)| (k.as_str(), c))
            })
            .collect())
    }

    /// New dataset holding `name` and its coordinates only.
    pub fn select(&self, name: &str) -> Result<Dataset, DatasetError> {
        let mut out = Dataset::new();
        for (coord_name, coord) in self.coords_for(name)? {
            out.insert(coord_name, coord.clone());
        }
        out.insert(name, self.variable(name)?.clone());
        Ok(out)
    }
}
