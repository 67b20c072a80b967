mod common;
use climlpf::{
    filter_dataset, load_dataset, run, write_dataset, DType, Dataset, DatasetError,
    LowpassConfig, StWriter, Variable,
};
use common::sine;
use ndarray::{Array1, Array3};
use tempfile::TempDir;

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// 20 years of monthly data on a 2 × 3 grid with a gap, plus coordinates.
fn sample_dataset() -> Dataset {
    let cycle = sine(240, 6.0, 1.0);
    let mut aa = Array3::from_shape_fn((240, 2, 3), |(t, y, x)| {
        cycle[t] + 0.01 * t as f64 + (y * 3 + x) as f64
    });
    aa.slice_mut(ndarray::s![100..=105, 1, 2]).fill(f64::NAN);

    let mut ds = Dataset::new();
    ds.insert(
        "aa",
        Variable::new(dims(&["time", "lat", "lon"]), aa.mapv(|v| v as f32 as f64).into_dyn(), DType::F32)
            .unwrap()
            .with_attr("units", "mm/day"),
    );
    ds.insert(
        "time",
        Variable::new(dims(&["time"]), Array1::range(0.0, 240.0, 1.0).into_dyn(), DType::I32)
            .unwrap()
            .with_attr("units", "months since 1850-01-01"),
    );
    ds.insert("lat", Variable::new(dims(&["lat"]), Array1::from(vec![-30.0, 30.0]).into_dyn(), DType::F64).unwrap());
    ds.insert("lon", Variable::new(dims(&["lon"]), Array1::from(vec![0.0, 120.0, 240.0]).into_dyn(), DType::F64).unwrap());
    ds.insert("bb", Variable::new(dims(&["time"]), Array1::zeros(240).into_dyn(), DType::F64).unwrap());
    ds
}

#[test]
fn dataset_survives_write_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("in.safetensors");
    let ds = sample_dataset();
    write_dataset(&ds, &path).unwrap();

    let back = load_dataset(&path).unwrap();
    assert_eq!(back.variables.len(), ds.variables.len());

    let aa = back.variable("aa").unwrap();
    assert_eq!(aa.dims, dims(&["time", "lat", "lon"]));
    assert_eq!(aa.dtype, DType::F32);
    assert_eq!(aa.attrs["units"], "mm/day");
    for (a, b) in aa.data.iter().zip(ds.variable("aa").unwrap().data.iter()) {
        assert!(a == b || (a.is_nan() && b.is_nan()), "{a} != {b}");
    }

    let time = back.variable("time").unwrap();
    assert_eq!(time.dtype, DType::I32);
    assert_eq!(time.data[[239]], 239.0);
}

#[test]
fn tensors_without_dims_get_default_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.safetensors");
    let mut w = StWriter::new();
    w.add_f64("x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
    w.write(&path).unwrap();

    let ds = load_dataset(&path).unwrap();
    assert_eq!(ds.variable("x").unwrap().dims, dims(&["dim_0", "dim_1"]));
}

#[test]
fn missing_input_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.safetensors");
    assert!(matches!(load_dataset(&path), Err(DatasetError::NotFound(p)) if p == path));
}

#[test]
fn unsupported_dtype_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bf16.safetensors");
    let header = br#"{"x":{"dtype":"BF16","shape":[2],"data_offsets":[0,4]}}"#;
    let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
    bytes.extend_from_slice(header);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(load_dataset(&path), Err(DatasetError::UnsupportedDtype(n, t)) if n == "x" && t == "BF16"));
}

#[test]
fn filter_dataset_keeps_coords_and_drops_others() {
    let out = filter_dataset(&sample_dataset(), "aa", &LowpassConfig {
        period_months: 120.0,
        ..LowpassConfig::default()
    })
    .unwrap();

    let names: Vec<&str> = out.variables.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["aa", "lat", "lon", "time"]);
    assert_eq!(out.variable("time").unwrap(), sample_dataset().variable("time").unwrap());

    let aa = out.variable("aa").unwrap();
    assert_eq!(aa.shape(), &[240, 2, 3]);
    assert_eq!(aa.attrs["lowpass_period_months"], "120");
    assert!(aa.data[[102, 1, 2]].is_nan());
    assert!(aa.data[[102, 0, 2]].is_finite());
}

#[test]
fn filter_dataset_unknown_variable_fails() {
    let err = filter_dataset(&sample_dataset(), "tas", &LowpassConfig::default()).unwrap_err();
    assert!(matches!(err.downcast_ref::<DatasetError>(), Some(DatasetError::MissingVariable(_))), "{err:#}");
}

#[test]
fn run_writes_filtered_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tmp.safetensors");
    let output = dir.path().join("tmp2.safetensors");
    write_dataset(&sample_dataset(), &input).unwrap();

    let cfg = LowpassConfig { period_months: 120.0, ..LowpassConfig::default() };
    run(&input, &output, "aa", &cfg).unwrap();

    let out = load_dataset(&output).unwrap();
    let aa = out.variable("aa").unwrap();
    assert_eq!(aa.dtype, DType::F32);
    assert_eq!(aa.dims, dims(&["time", "lat", "lon"]));

    // The 6-month cycle is gone; what remains follows the 0.01/month ramp.
    let mid = aa.data[[120, 0, 0]];
    assert!((mid - 1.2).abs() < 0.05, "mid-series trend value {mid}");
}

#[test]
fn run_rejects_bad_period_without_writing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tmp.safetensors");
    let output = dir.path().join("tmp2.safetensors");
    write_dataset(&sample_dataset(), &input).unwrap();

    let cfg = LowpassConfig { period_months: 2.0, ..LowpassConfig::default() };
    let err = run(&input, &output, "aa", &cfg).unwrap_err();
    assert!(
        err.chain().any(|e| e.downcast_ref::<climlpf::FilterError>().is_some_and(|f| f.is_invalid_spec())),
        "{err:#}"
    );
    assert!(!output.exists());
}

#[test]
fn run_missing_input_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = run(
        &dir.path().join("absent.safetensors"),
        &dir.path().join("out.safetensors"),
        "aa",
        &LowpassConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err.downcast_ref::<DatasetError>(), Some(DatasetError::NotFound(_))), "{err:#}");
}
