//! # NetCDF Classic Container
//!
//! Typed access to the NetCDF classic (CDF-1) and 64-bit-offset (CDF-2)
//! files ARGO profiles are distributed in. Decoding is done by the
//! pure-Rust [`netcdf3`] crate; this module widens its payloads into the
//! [`NumericArray`] and [`CharArray`] views the pipeline stages consume and
//! turns corrupt or truncated files into [`NcError`] values.
//!
//! ```rust,no_run
//! use argo_dataops::netcdf::NcFile;
//!
//! let file = NcFile::open("D1900722_001.nc")?;
//! let temp = file.read_numeric("TEMP")?;
//! println!("TEMP shape {:?}", temp.shape);
//! # Ok::<(), argo_dataops::netcdf::NcError>(())
//! ```
//!
//! [`NcWriter`] produces classic files with fixed-size dimensions; it backs
//! the `demo` command and the synthetic fixtures used in tests.

mod error;
mod types;
mod writer;

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use netcdf3::FileReader;

pub use error::NcError;
pub use types::{Attribute, Dimension, FormatVersion, NcType, NcValues, Variable};
pub use writer::NcWriter;
/// Numeric variable widened to `f64`, row-major
#[derive(Debug, Clone)]
pub struct NumericArray {
    /// Variable shape
    pub shape: Vec<usize>,
    /// Values in row-major order
    pub values: Vec<f64>,
    /// Fill value marking missing entries
    pub fill: f64,
}

impl NumericArray {
    /// True when `value` is the fill value or not a finite number
    pub fn is_missing(&self, value: f64) -> bool {
        !value.is_finite() || value == self.fill
    }

    /// Value at a flat index, `None` when missing or out of bounds
    pub fn get_flat(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .copied()
            .filter(|v| !self.is_missing(*v))
    }

    /// Value at `[row, col]` of a two-dimensional array
    pub fn get2(&self, row: usize, col: usize) -> Option<f64> {
        let cols = *self.shape.get(1)?;
        if col >= cols {
            return None;
        }
        self.get_flat(row * cols + col)
    }

    /// Length of the leading dimension (1 for scalars)
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Length of the second dimension (1 for vectors)
    pub fn cols(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(1)
    }
}

/// Character variable, row-major raw bytes
#[derive(Debug, Clone)]
pub struct CharArray {
    /// Variable shape; the last dimension is the string length
    pub shape: Vec<usize>,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

impl CharArray {
    /// Width of one string (last dimension, 1 for a vector of single chars)
    pub fn string_len(&self) -> usize {
        if self.shape.len() <= 1 {
            1
        } else {
            self.shape.last().copied().unwrap_or(1)
        }
    }

    /// The `index`-th fixed-width string (flattened over all leading dimensions)
    pub fn string_at(&self, index: usize) -> Option<&[u8]> {
        let width = self.string_len();
        let start = index.checked_mul(width)?;
        self.bytes.get(start..start + width)
    }

    /// Single character at a flat index (for 1-D or 2-D arrays of flags)
    pub fn char_at(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Character at `[row, col]` of a two-dimensional flag array
    pub fn char2(&self, row: usize, col: usize) -> Option<u8> {
        let cols = *self.shape.get(1)?;
        if col >= cols {
            return None;
        }
        self.char_at(row * cols + col)
    }
}

/// An opened NetCDF classic file, fully loaded into memory
#[derive(Debug, Clone)]
pub struct NcFile {
    version: FormatVersion,
    size_bytes: u64,
    dimensions: Vec<Dimension>,
    attributes: Vec<Attribute>,
    variables: Vec<Variable>,
    data: HashMap<String, NcValues>,
}

impl NcFile {
    /// Read and decode a file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NcError> {
        let path = path.as_ref();
        check_magic(path)?;
        let size_bytes = std::fs::metadata(path)?.len();
        // The header decoder does unchecked size arithmetic, so forged
        // dimension lengths can panic inside it.
        let reader = panic::catch_unwind(|| FileReader::open(path)).map_err(|_| {
            NcError::Malformed(format!("{}: inconsistent header sizes", path.display()))
        })??;
        let loaded = panic::catch_unwind(AssertUnwindSafe(|| Self::load(reader, size_bytes)));
        loaded.map_err(|_| NcError::Malformed(format!("{}: inconsistent data layout", path.display())))?
    }

    /// Decode an in-memory image
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, NcError> {
        let mut staged = tempfile::NamedTempFile::new()?;
        staged.write_all(bytes.as_ref())?;
        staged.flush()?;
        Self::open(staged.path())
    }

    fn load(mut reader: FileReader, size_bytes: u64) -> Result<Self, NcError> {
        let version = FormatVersion::from(reader.version());
        let (dimensions, attributes, variables) = {
            let data_set = reader.data_set();
            let dimensions: Vec<Dimension> = data_set.get_dims().iter().map(|d| Dimension::from(&**d)).collect();
            let attributes: Vec<Attribute> = data_set.get_global_attrs().into_iter().map(Attribute::from).collect();
            let variables: Vec<Variable> = data_set.get_vars().into_iter().map(Variable::from).collect();
            (dimensions, attributes, variables)
        };

        // Payloads are allocated from the declared shape before any byte is
        // read, so a variable larger than the file is rejected up front.
        for var in &variables {
            let declared = var.element_count().saturating_mul(var.nc_type.size()) as u64;
            if declared > size_bytes {
                return Err(NcError::Truncated(var.name.clone()));
            }
        }

        let mut data = HashMap::with_capacity(variables.len());
        for var in &variables {
            let values = reader.read_var(&var.name).map_err(|e| match e {
                netcdf3::ReadError::IOErrorKind(std::io::ErrorKind::UnexpectedEof) => {
                    NcError::Truncated(var.name.clone())
                }
                other => NcError::from(other),
            })?;
            data.insert(var.name.clone(), NcValues::from(values));
        }

        Ok(Self {
            version,
            size_bytes,
            dimensions,
            attributes,
            variables,
            data,
        })
    }

    /// Format variant
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Size of the file in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Declared dimensions
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Dimension by name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Declared variables
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Whether a variable is declared
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Global attributes
    pub fn global_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Global attribute by name
    pub fn global_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn payload(&self, var: &Variable) -> Result<&NcValues, NcError> {
        self.data
            .get(&var.name)
            .ok_or_else(|| NcError::VariableNotFound(var.name.clone()))
    }

    /// Read a numeric variable widened to `f64`
    pub fn read_numeric(&self, name: &str) -> Result<NumericArray, NcError> {
        let var = self
            .variable(name)
            .ok_or_else(|| NcError::VariableNotFound(name.to_string()))?;
        if !var.nc_type.is_numeric() {
            return Err(NcError::TypeMismatch {
                variable: name.to_string(),
                expected: "numeric",
                found: var.nc_type.name(),
            });
        }
        Ok(NumericArray {
            shape: var.shape.clone(),
            values: self.payload(var)?.to_f64(),
            fill: var.fill_value(),
        })
    }

    /// Read a character variable
    pub fn read_chars(&self, name: &str) -> Result<CharArray, NcError> {
        let var = self
            .variable(name)
            .ok_or_else(|| NcError::VariableNotFound(name.to_string()))?;
        match self.payload(var)? {
            NcValues::Chars(bytes) => Ok(CharArray {
                shape: var.shape.clone(),
                bytes: bytes.clone(),
            }),
            _ => Err(NcError::TypeMismatch {
                variable: name.to_string(),
                expected: "char",
                found: var.nc_type.name(),
            }),
        }
    }
}

/// Reject HDF5, CDF-5 and foreign files before handing them to the decoder
fn check_magic(path: &Path) -> Result<(), NcError> {
    let mut magic = [0u8; 4];
    File::open(path)?
        .read_exact(&mut magic)
        .map_err(|_| NcError::Truncated("magic".to_string()))?;
    match &magic {
        b"CDF\x01" | b"CDF\x02" => Ok(()),
        b"CDF\x05" => Err(NcError::Unsupported("CDF-5 (64-bit data)".to_string())),
        [0x89, b'H', b'D', b'F'] => Err(NcError::Unsupported("NetCDF-4 (HDF5 container)".to_string())),
        _ => Err(NcError::NotNetcdf(magic)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> NcFile {
        let mut writer = NcWriter::new();
        writer.add_dimension("N_PROF", 2).unwrap();
        writer.add_dimension("N_LEVELS", 3).unwrap();
        writer.add_dimension("STRING8", 8).unwrap();
        writer.add_global_attribute("title", NcValues::text("Argo float vertical profile"));
        writer
            .add_variable(
                "TEMP",
                &["N_PROF", "N_LEVELS"],
                NcValues::Floats(vec![10.0, 9.5, 99999.0, 11.0, 10.5, 10.0]),
            )
            .unwrap();
        writer
            .add_variable_attribute("TEMP", "_FillValue", NcValues::Floats(vec![99999.0]))
            .unwrap();
        writer
            .add_variable_attribute("TEMP", "units", NcValues::text("degree_Celsius"))
            .unwrap();
        writer
            .add_variable("TEMP_QC", &["N_PROF", "N_LEVELS"], NcValues::text("114111"))
            .unwrap();
        writer
            .add_variable(
                "PLATFORM_NUMBER",
                &["N_PROF", "STRING8"],
                NcValues::text("1900722 1900722 "),
            )
            .unwrap();
        writer
            .add_variable("JULD", &["N_PROF"], NcValues::Doubles(vec![25000.5, 25010.25]))
            .unwrap();
        NcFile::from_bytes(writer.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_read_back_numeric() {
        let file = sample_file();
        let temp = file.read_numeric("TEMP").unwrap();
        assert_eq!(temp.shape, vec![2, 3]);
        assert_eq!(temp.get2(0, 1), Some(9.5));
        assert_eq!(temp.get2(0, 2), None, "fill value must read as missing");
        assert_eq!(temp.get2(1, 0), Some(11.0));
        assert_eq!(file.variable("TEMP").unwrap().units().as_deref(), Some("degree_Celsius"));

        let juld = file.read_numeric("JULD").unwrap();
        assert_eq!(juld.values, vec![25000.5, 25010.25]);
    }

    #[test]
    fn test_read_back_chars() {
        let file = sample_file();
        let qc = file.read_chars("TEMP_QC").unwrap();
        assert_eq!(qc.char2(0, 2), Some(b'4'));
        let platform = file.read_chars("PLATFORM_NUMBER").unwrap();
        assert_eq!(platform.string_at(1), Some(&b"1900722 "[..]));
        assert_eq!(
            file.global_attribute("title").and_then(|a| a.value.as_text()).as_deref(),
            Some("Argo float vertical profile")
        );
    }

    #[test]
    fn test_type_mismatch() {
        let file = sample_file();
        assert!(matches!(
            file.read_numeric("TEMP_QC"),
            Err(NcError::TypeMismatch { .. })
        ));
        assert!(matches!(
            file.read_chars("JULD"),
            Err(NcError::TypeMismatch { .. })
        ));
        assert!(matches!(
            file.read_numeric("DOXY"),
            Err(NcError::VariableNotFound(_))
        ));
    }

    #[test]
    fn test_truncated_data_section() {
        let mut bytes = {
            let mut writer = NcWriter::new();
            writer.add_dimension("N", 4).unwrap();
            writer
                .add_variable("X", &["N"], NcValues::Doubles(vec![1.0, 2.0, 3.0, 4.0]))
                .unwrap();
            writer.to_bytes().unwrap()
        };
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(NcFile::from_bytes(bytes), Err(NcError::Truncated(_))));
    }

    #[test]
    fn test_rejects_foreign_magic() {
        assert!(matches!(NcFile::from_bytes(b"CD"), Err(NcError::Truncated(_))));
        assert!(matches!(
            NcFile::from_bytes(b"PK\x03\x04rest"),
            Err(NcError::NotNetcdf(_))
        ));
        assert!(matches!(
            NcFile::from_bytes(b"\x89HDF\r\n\x1a\n"),
            Err(NcError::Unsupported(_))
        ));
        assert!(matches!(
            NcFile::from_bytes(b"CDF\x05\0\0\0\0"),
            Err(NcError::Unsupported(_))
        ));
    }

    #[test]
    fn test_header_metadata() {
        let file = sample_file();
        assert_eq!(file.version(), FormatVersion::Classic);
        assert_eq!(file.dimension("N_LEVELS").map(|d| d.length), Some(3));
        let temp = file.variable("TEMP").unwrap();
        assert_eq!(temp.dimensions, vec!["N_PROF", "N_LEVELS"]);
        assert_eq!(temp.fill_value(), 99999.0);
        assert!(!temp.is_record);
        assert_eq!(file.variable("JULD").unwrap().fill_value(), netcdf3::NC_FILL_F64);
    }
}
