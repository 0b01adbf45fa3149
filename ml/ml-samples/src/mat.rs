//! MAT-file envelope (MATLAB Level 5).
//!
//! # Layout
//!
//! ```text
//! HEADER   116 bytes text | 8 bytes subsystem offset | u16 version 0x0100 | "IM"
//! ELEMENT  u32 type | u32 byte count | payload padded to 8 bytes
//! ```
//!
//! Each variable is an `miMATRIX` element holding array flags, dimensions,
//! a name and the real part. `features` is written as a single-precision
//! array with dims `[N, ..feature_shape]` in column-major order;
//! `targets` as an int64 row vector `1 x N`, as `scipy.io.savemat` does
//! for 1-D arrays.
//!
//! Only little-endian, uncompressed files are read. Any numeric element
//! type is accepted for either variable; floating-point targets must hold
//! whole numbers, as MATLAB saves `targets = [0 1 0]` as double.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::array::{ArrayData, to_column_major, to_row_major};
use crate::envelope::{FEATURES, TARGETS};
use crate::error::{Result, SamplesError};
use crate::samples::Samples;

const HEADER_TEXT_LEN: usize = 116;
const HEADER_LEN: usize = 128;
const VERSION: u16 = 0x0100;

// Data element types.
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

// Array classes.
const MX_SINGLE_CLASS: u8 = 7;
const MX_INT64_CLASS: u8 = 14;

/// Writes `samples` as a MAT-file, replacing any existing file.
///
/// # Errors
///
/// Returns an IO error, or [`SamplesError::InvalidShape`] if a dimension
/// does not fit the format's 32-bit sizes.
pub fn save_mat(samples: &Samples, path: &Path) -> Result<()> {
    let features = samples.features_array();
    let feature_dims = mat_dims(&features.shape);
    let feature_bytes: Vec<u8> = to_column_major(&features.data, &feature_dims)
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let target_dims = vec![1, samples.len()];
    let target_bytes: Vec<u8> = samples
        .targets()
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&header())?;
    write_matrix(
        &mut writer,
        FEATURES,
        MX_SINGLE_CLASS,
        &feature_dims,
        MI_SINGLE,
        &feature_bytes,
    )?;
    write_matrix(
        &mut writer,
        TARGETS,
        MX_INT64_CLASS,
        &target_dims,
        MI_INT64,
        &target_bytes,
    )?;
    writer.flush()?;
    Ok(())
}

/// Reads a MAT-file envelope.
///
/// # Errors
///
/// Returns [`SamplesError::MissingKey`] if `features` or `targets` is
/// absent, or [`SamplesError::InvalidEnvelope`] for malformed or
/// unsupported content.
pub fn load_mat(path: &Path) -> Result<Samples> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    let variables = parse(&bytes)?;
    let find = |name: &str| {
        variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| SamplesError::missing_key(name))
    };

    let features = find(FEATURES)?;
    let feature_data = to_row_major(&features.floats()?, &features.dims);
    let features = ArrayData::new(features.dims.clone(), feature_data)?;
    let targets = ArrayData::vector(find(TARGETS)?.ints()?);

    Samples::from_arrays(features, targets)
}

/// MAT arrays have at least two dimensions.
fn mat_dims(shape: &[usize]) -> Vec<usize> {
    let mut dims = shape.to_vec();
    while dims.len() < 2 {
        dims.push(1);
    }
    dims
}

fn header() -> [u8; HEADER_LEN] {
    let mut header = [b' '; HEADER_LEN];
    let text = b"MATLAB 5.0 MAT-file, Platform: rust, Created by: ml-samples";
    header[..text.len()].copy_from_slice(text);
    header[HEADER_TEXT_LEN..HEADER_TEXT_LEN + 8].fill(0);
    header[124..126].copy_from_slice(&VERSION.to_le_bytes());
    header[126..128].copy_from_slice(b"IM");
    header
}

fn padding(len: usize) -> usize {
    (8 - len % 8) % 8
}

fn to_u32(value: usize, shape: &[usize]) -> Result<u32> {
    u32::try_from(value).map_err(|_| SamplesError::invalid_shape(shape, value))
}

fn element(data_type: u32, payload: &[u8], dims: &[usize]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + payload.len() + 8);
    out.extend_from_slice(&data_type.to_le_bytes());
    out.extend_from_slice(&to_u32(payload.len(), dims)?.to_le_bytes());
    out.extend_from_slice(payload);
    out.resize(out.len() + padding(payload.len()), 0);
    Ok(out)
}

fn write_matrix<W: Write>(
    writer: &mut W,
    name: &str,
    class: u8,
    dims: &[usize],
    data_type: u32,
    data: &[u8],
) -> Result<()> {
    let mut flags = [0u8; 8];
    flags[0] = class;

    let mut dim_bytes = Vec::with_capacity(dims.len() * 4);
    for &d in dims {
        let d = i32::try_from(d).map_err(|_| SamplesError::invalid_shape(dims, d))?;
        dim_bytes.extend_from_slice(&d.to_le_bytes());
    }

    let mut body = element(MI_UINT32, &flags, dims)?;
    body.extend(element(MI_INT32, &dim_bytes, dims)?);
    body.extend(element(MI_INT8, name.as_bytes(), dims)?);
    body.extend(element(data_type, data, dims)?);

    writer.write_all(&MI_MATRIX.to_le_bytes())?;
    writer.write_all(&to_u32(body.len(), dims)?.to_le_bytes())?;
    writer.write_all(&body)?;
    Ok(())
}

/// A numeric variable; data in file (column-major) order.
#[derive(Debug)]
struct Variable {
    name: String,
    dims: Vec<usize>,
    data_type: u32,
    data: Vec<u8>,
}

impl Variable {
    fn floats(&self) -> Result<Vec<f32>> {
        if self.data_type == MI_SINGLE {
            return Ok(self
                .data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect());
        }
        #[allow(clippy::cast_possible_truncation)]
        let values = decode(self.data_type, &self.data)?
            .into_iter()
            .map(|v| v as f32)
            .collect();
        Ok(values)
    }

    /// Integer values; floating-point data must hold whole numbers.
    fn ints(&self) -> Result<Vec<i64>> {
        if self.data_type == MI_INT64 {
            return Ok(self
                .data
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes(eight(c)))
                .collect());
        }
        decode(self.data_type, &self.data)?
            .into_iter()
            .map(|v| {
                integral(v).ok_or_else(|| {
                    SamplesError::invalid_envelope(format!(
                        "variable {} holds {v}, expected integers",
                        self.name
                    ))
                })
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(value: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Cursor over little-endian MAT bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                SamplesError::invalid_envelope(format!(
                    "unexpected end of MAT data at byte {}",
                    self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads one tagged element, handling the small-element form.
    fn element(&mut self) -> Result<(u32, &'a [u8])> {
        let tag = self.u32()?;
        if tag >> 16 != 0 {
            // Small data element: 2-byte count, 2-byte type, 4 bytes of data.
            let len = (tag >> 16) as usize;
            let data = self.take(4)?;
            return Ok((tag & 0xFFFF, &data[..len.min(4)]));
        }
        let len = self.u32()? as usize;
        let data = self.take(len)?;
        self.take(padding(len).min(self.bytes.len() - self.pos))?;
        Ok((tag, data))
    }
}

fn parse(bytes: &[u8]) -> Result<Vec<Variable>> {
    if bytes.len() < HEADER_LEN {
        return Err(SamplesError::invalid_envelope("file too small to be a MAT-file"));
    }
    if &bytes[126..128] != b"IM" {
        return Err(SamplesError::invalid_envelope(
            "unsupported MAT-file: not a little-endian Level 5 file",
        ));
    }

    let mut reader = Reader::new(&bytes[HEADER_LEN..]);
    let mut variables = Vec::new();
    while !reader.at_end() {
        let (data_type, payload) = reader.element()?;
        match data_type {
            MI_MATRIX => {
                if let Some(variable) = parse_matrix(payload)? {
                    variables.push(variable);
                }
            }
            MI_COMPRESSED => {
                return Err(SamplesError::invalid_envelope(
                    "compressed MAT-file elements are not supported",
                ));
            }
            _ => {}
        }
    }
    Ok(variables)
}

/// Parses an `miMATRIX` payload; non-numeric arrays yield `None`.
fn parse_matrix(payload: &[u8]) -> Result<Option<Variable>> {
    let mut reader = Reader::new(payload);

    let (_, flags) = reader.element()?;
    let class = flags.first().copied().unwrap_or(0);
    // Cell, struct, object and char arrays carry no envelope data.
    if !(6..=15).contains(&class) {
        return Ok(None);
    }
    if flags.get(1).is_some_and(|f| f & 0x08 != 0) {
        return Err(SamplesError::invalid_envelope(
            "complex MAT arrays are not supported",
        ));
    }

    let (_, dim_bytes) = reader.element()?;
    let dims = dim_bytes
        .chunks_exact(4)
        .map(|c| {
            let d = i32::from_le_bytes([c[0], c[1], c[2], c[3]]);
            usize::try_from(d)
                .map_err(|_| SamplesError::invalid_envelope(format!("negative dimension {d}")))
        })
        .collect::<Result<Vec<usize>>>()?;

    let (_, name) = reader.element()?;
    let name = String::from_utf8_lossy(name).into_owned();

    let (data_type, data) = reader.element()?;
    let count = data.len() / element_size(data_type)?;
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            SamplesError::invalid_envelope(format!("variable {name}: dims {dims:?} overflow"))
        })?;
    if count != expected {
        return Err(SamplesError::invalid_envelope(format!(
            "variable {name}: {count} values for dims {dims:?}"
        )));
    }

    Ok(Some(Variable {
        name,
        dims,
        data_type,
        data: data.to_vec(),
    }))
}

fn element_size(data_type: u32) -> Result<usize> {
    match data_type {
        MI_INT8 | MI_UINT8 => Ok(1),
        MI_INT16 | MI_UINT16 => Ok(2),
        MI_INT32 | MI_UINT32 | MI_SINGLE => Ok(4),
        MI_DOUBLE | MI_INT64 | MI_UINT64 => Ok(8),
        other => Err(SamplesError::invalid_envelope(format!(
            "unsupported MAT data type {other}"
        ))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn decode(data_type: u32, data: &[u8]) -> Result<Vec<f64>> {
    let values = match data_type {
        MI_INT8 => data.iter().map(|&b| f64::from(i8::from_le_bytes([b]))).collect(),
        MI_UINT8 => data.iter().map(|&b| f64::from(b)).collect(),
        MI_INT16 => data
            .chunks_exact(2)
            .map(|c| f64::from(i16::from_le_bytes([c[0], c[1]])))
            .collect(),
        MI_UINT16 => data
            .chunks_exact(2)
            .map(|c| f64::from(u16::from_le_bytes([c[0], c[1]])))
            .collect(),
        MI_INT32 => data
            .chunks_exact(4)
            .map(|c| f64::from(i32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        MI_UINT32 => data
            .chunks_exact(4)
            .map(|c| f64::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        MI_SINGLE => data
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        MI_DOUBLE => data.chunks_exact(8).map(|c| f64::from_le_bytes(eight(c))).collect(),
        MI_INT64 => data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(eight(c)) as f64)
            .collect(),
        MI_UINT64 => data
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(eight(c)) as f64)
            .collect(),
        other => {
            return Err(SamplesError::invalid_envelope(format!(
                "unsupported MAT data type {other}"
            )));
        }
    };
    Ok(values)
}

fn eight(c: &[u8]) -> [u8; 8] {
    [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> Samples {
        Samples::new(
            (0..12).map(|i| i as f32 * 0.5).collect(),
            vec![2, 3],
            vec![4, -2],
        )
        .unwrap()
    }

    #[test]
    fn header_layout() {
        let h = header();
        assert!(h.starts_with(b"MATLAB 5.0 MAT-file"));
        assert_eq!(&h[124..126], &[0x00, 0x01]);
        assert_eq!(&h[126..128], b"IM");
    }

    #[test]
    fn padding_to_eight() {
        assert_eq!(padding(0), 0);
        assert_eq!(padding(3), 5);
        assert_eq!(padding(8), 0);
        assert_eq!(padding(12), 4);
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.mat");

        let original = sample_set();
        save_mat(&original, &path).unwrap();
        let loaded = load_mat(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn roundtrip_vector_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vec.mat");

        let original = Samples::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0, 1]).unwrap();
        save_mat(&original, &path).unwrap();
        assert_eq!(load_mat(&path).unwrap(), original);
    }

    #[test]
    fn features_written_column_major() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cm.mat");

        let samples = Samples::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0, 1]).unwrap();
        save_mat(&samples, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let variables = parse(&bytes).unwrap();
        let features = variables.iter().find(|v| v.name == FEATURES).unwrap();
        assert_eq!(features.dims, vec![2, 2]);
        assert_eq!(features.floats().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);

        let targets = variables.iter().find(|v| v.name == TARGETS).unwrap();
        assert_eq!(targets.dims, vec![1, 2]);
    }

    #[test]
    fn missing_targets_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.mat");

        let mut bytes = header().to_vec();
        write_matrix(&mut bytes, FEATURES, MX_SINGLE_CLASS, &[1, 1], MI_SINGLE, &1.0f32.to_le_bytes())
            .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = load_mat(&path).unwrap_err();
        assert!(matches!(err, SamplesError::MissingKey(ref k) if k == TARGETS));
    }

    #[test]
    fn reads_double_and_small_elements() {
        // Targets stored as doubles; the name uses the small-element form.
        let mut matrix = element(MI_UINT32, &[6, 0, 0, 0, 0, 0, 0, 0], &[]).unwrap();
        let mut dims = Vec::new();
        dims.extend_from_slice(&1i32.to_le_bytes());
        dims.extend_from_slice(&2i32.to_le_bytes());
        matrix.extend(element(MI_INT32, &dims, &[]).unwrap());
        matrix.extend(element(MI_INT8, b"targets", &[]).unwrap());
        let mut doubles = Vec::new();
        doubles.extend_from_slice(&3.0f64.to_le_bytes());
        doubles.extend_from_slice(&5.0f64.to_le_bytes());
        matrix.extend(element(MI_DOUBLE, &doubles, &[]).unwrap());

        let mut small_name_matrix = element(MI_UINT32, &[6, 0, 0, 0, 0, 0, 0, 0], &[]).unwrap();
        small_name_matrix.extend(element(MI_INT32, &dims, &[]).unwrap());
        // Small element: count 1, type miINT8, data "x".
        small_name_matrix.extend_from_slice(&((1u32 << 16) | MI_INT8).to_le_bytes());
        small_name_matrix.extend_from_slice(&[b'x', 0, 0, 0]);
        small_name_matrix.extend(element(MI_DOUBLE, &doubles, &[]).unwrap());

        let mut bytes = header().to_vec();
        for body in [&matrix, &small_name_matrix] {
            bytes.extend_from_slice(&MI_MATRIX.to_le_bytes());
            bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
            bytes.extend_from_slice(body);
        }

        let variables = parse(&bytes).unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].name, "targets");
        assert_eq!(variables[0].floats().unwrap(), vec![3.0, 5.0]);
        assert_eq!(variables[0].ints().unwrap(), vec![3, 5]);
        assert_eq!(variables[1].name, "x");
    }

    fn doubles(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn loads_double_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matlab.mat");

        let features: Vec<u8> = [0.5f32, 1.5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut bytes = header().to_vec();
        write_matrix(&mut bytes, FEATURES, MX_SINGLE_CLASS, &[2, 1], MI_SINGLE, &features).unwrap();
        write_matrix(&mut bytes, TARGETS, 6, &[1, 2], MI_DOUBLE, &doubles(&[0.0, 1.0])).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let loaded = load_mat(&path).unwrap();
        assert_eq!(loaded.targets(), &[0, 1]);
        assert_eq!(loaded.feature(1), &[1.5]);
    }

    #[test]
    fn rejects_fractional_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractional.mat");

        let mut bytes = header().to_vec();
        write_matrix(&mut bytes, FEATURES, MX_SINGLE_CLASS, &[2, 1], MI_DOUBLE, &doubles(&[0.0, 1.0]))
            .unwrap();
        write_matrix(&mut bytes, TARGETS, 6, &[1, 2], MI_DOUBLE, &doubles(&[0.0, 0.5])).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = load_mat(&path).unwrap_err();
        assert!(err.to_string().contains("expected integers"));
    }

    #[test]
    fn integral_bounds() {
        assert_eq!(integral(-3.0), Some(-3));
        assert_eq!(integral(0.25), None);
        assert_eq!(integral(f64::NAN), None);
        assert_eq!(integral(f64::INFINITY), None);
        assert_eq!(integral(9.3e18), None);
    }

    #[test]
    fn rejects_overflowing_dims() {
        let huge = usize::try_from(i32::MAX).unwrap();
        let mut bytes = header().to_vec();
        write_matrix(&mut bytes, FEATURES, MX_SINGLE_CLASS, &[huge, huge, huge], MI_SINGLE, &[])
            .unwrap();
        assert!(matches!(
            parse(&bytes),
            Err(SamplesError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn rejects_compressed() {
        let mut bytes = header().to_vec();
        bytes.extend(element(MI_COMPRESSED, &[0; 8], &[]).unwrap());
        assert!(matches!(
            parse(&bytes),
            Err(SamplesError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn rejects_big_endian() {
        let mut bytes = header().to_vec();
        bytes[126..128].copy_from_slice(b"MI");
        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_file() {
        assert!(parse(&[0u8; 10]).is_err());

        let mut bytes = header().to_vec();
        bytes.extend_from_slice(&MI_MATRIX.to_le_bytes());
        bytes.extend_from_slice(&64u32.to_le_bytes());
        assert!(parse(&bytes).is_err());
    }
}
