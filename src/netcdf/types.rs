use netcdf3::{DataType, DataVector, Version};
use serde::Serialize;

/// On-disk format variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatVersion {
    /// CDF-1, 32-bit offsets
    Classic,
    /// CDF-2, 64-bit offsets
    Offset64,
}

impl FormatVersion {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            FormatVersion::Classic => "CDF-1 (classic)",
            FormatVersion::Offset64 => "CDF-2 (64-bit offset)",
        }
    }
}

impl From<Version> for FormatVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::Classic => FormatVersion::Classic,
            Version::Offset64Bit => FormatVersion::Offset64,
        }
    }
}

/// External data types of the classic format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NcType {
    /// 8-bit signed integer (NC_BYTE)
    Byte,
    /// 8-bit character (NC_CHAR)
    Char,
    /// 16-bit signed integer (NC_SHORT)
    Short,
    /// 32-bit signed integer (NC_INT)
    Int,
    /// 32-bit IEEE float (NC_FLOAT)
    Float,
    /// 64-bit IEEE float (NC_DOUBLE)
    Double,
}

impl NcType {
    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            NcType::Byte | NcType::Char => 1,
            NcType::Short => 2,
            NcType::Int | NcType::Float => 4,
            NcType::Double => 8,
        }
    }

    /// CDL name of the type
    pub fn name(self) -> &'static str {
        match self {
            NcType::Byte => "byte",
            NcType::Char => "char",
            NcType::Short => "short",
            NcType::Int => "int",
            NcType::Float => "float",
            NcType::Double => "double",
        }
    }

    /// Default fill value used by the NetCDF library when `_FillValue` is absent
    pub fn default_fill(self) -> f64 {
        match self {
            NcType::Byte => netcdf3::NC_FILL_I8 as f64,
            NcType::Char => netcdf3::NC_FILL_U8 as f64,
            NcType::Short => netcdf3::NC_FILL_I16 as f64,
            NcType::Int => netcdf3::NC_FILL_I32 as f64,
            NcType::Float => netcdf3::NC_FILL_F32 as f64,
            NcType::Double => netcdf3::NC_FILL_F64,
        }
    }

    /// Whether the type holds numbers rather than characters
    pub fn is_numeric(self) -> bool {
        !matches!(self, NcType::Char)
    }
}

impl From<DataType> for NcType {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::I8 => NcType::Byte,
            DataType::U8 => NcType::Char,
            DataType::I16 => NcType::Short,
            DataType::I32 => NcType::Int,
            DataType::F32 => NcType::Float,
            DataType::F64 => NcType::Double,
        }
    }
}

/// Typed value vector shared by attributes and variable payloads
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    /// NC_BYTE values
    Bytes(Vec<i8>),
    /// NC_CHAR values (raw bytes, not necessarily UTF-8)
    Chars(Vec<u8>),
    /// NC_SHORT values
    Shorts(Vec<i16>),
    /// NC_INT values
    Ints(Vec<i32>),
    /// NC_FLOAT values
    Floats(Vec<f32>),
    /// NC_DOUBLE values
    Doubles(Vec<f64>),
}

impl NcValues {
    /// Convenience constructor for character data
    pub fn text(value: &str) -> Self {
        NcValues::Chars(value.as_bytes().to_vec())
    }

    /// The NetCDF type these values are stored as
    pub fn nc_type(&self) -> NcType {
        match self {
            NcValues::Bytes(_) => NcType::Byte,
            NcValues::Chars(_) => NcType::Char,
            NcValues::Shorts(_) => NcType::Short,
            NcValues::Ints(_) => NcType::Int,
            NcValues::Floats(_) => NcType::Float,
            NcValues::Doubles(_) => NcType::Double,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            NcValues::Bytes(v) => v.len(),
            NcValues::Chars(v) => v.len(),
            NcValues::Shorts(v) => v.len(),
            NcValues::Ints(v) => v.len(),
            NcValues::Floats(v) => v.len(),
            NcValues::Doubles(v) => v.len(),
        }
    }

    /// True when no elements are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First element widened to f64 (numeric types only)
    pub fn first_f64(&self) -> Option<f64> {
        match self {
            NcValues::Bytes(v) => v.first().map(|x| *x as f64),
            NcValues::Chars(_) => None,
            NcValues::Shorts(v) => v.first().map(|x| *x as f64),
            NcValues::Ints(v) => v.first().map(|x| *x as f64),
            NcValues::Floats(v) => v.first().map(|x| *x as f64),
            NcValues::Doubles(v) => v.first().copied(),
        }
    }

    /// Every element widened to f64, empty for character data
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            NcValues::Bytes(v) => v.iter().map(|x| *x as f64).collect(),
            NcValues::Chars(_) => Vec::new(),
            NcValues::Shorts(v) => v.iter().map(|x| *x as f64).collect(),
            NcValues::Ints(v) => v.iter().map(|x| *x as f64).collect(),
            NcValues::Floats(v) => v.iter().map(|x| *x as f64).collect(),
            NcValues::Doubles(v) => v.clone(),
        }
    }

    /// Character payload as lossy text with trailing NUL/space padding removed
    pub fn as_text(&self) -> Option<String> {
        match self {
            NcValues::Chars(bytes) => Some(
                String::from_utf8_lossy(bytes)
                    .trim_end_matches(&['\0', ' '][..])
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl From<DataVector> for NcValues {
    fn from(data: DataVector) -> Self {
        match data {
            DataVector::I8(v) => NcValues::Bytes(v),
            DataVector::U8(v) => NcValues::Chars(v),
            DataVector::I16(v) => NcValues::Shorts(v),
            DataVector::I32(v) => NcValues::Ints(v),
            DataVector::F32(v) => NcValues::Floats(v),
            DataVector::F64(v) => NcValues::Doubles(v),
        }
    }
}

/// A named dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    /// Dimension name
    pub name: String,
    /// Declared length (current record count for the record dimension)
    pub length: usize,
    /// Whether this is the unlimited (record) dimension
    pub is_record: bool,
}

impl From<&netcdf3::Dimension> for Dimension {
    fn from(dim: &netcdf3::Dimension) -> Self {
        Self {
            name: dim.name(),
            length: dim.size(),
            is_record: dim.is_unlimited(),
        }
    }
}

/// A named attribute attached to the file or to a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute payload
    pub value: NcValues,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(name: impl Into<String>, value: NcValues) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl From<&netcdf3::Attribute> for Attribute {
    fn from(attr: &netcdf3::Attribute) -> Self {
        let value = match attr.data_type() {
            DataType::I8 => NcValues::Bytes(attr.get_i8().unwrap_or_default().to_vec()),
            DataType::U8 => NcValues::Chars(attr.get_u8().unwrap_or_default().to_vec()),
            DataType::I16 => NcValues::Shorts(attr.get_i16().unwrap_or_default().to_vec()),
            DataType::I32 => NcValues::Ints(attr.get_i32().unwrap_or_default().to_vec()),
            DataType::F32 => NcValues::Floats(attr.get_f32().unwrap_or_default().to_vec()),
            DataType::F64 => NcValues::Doubles(attr.get_f64().unwrap_or_default().to_vec()),
        };
        Self::new(attr.name(), value)
    }
}

/// A variable declared in the header
#[derive(Debug, Clone)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Dimension names, outermost first
    pub dimensions: Vec<String>,
    /// Resolved shape (record dimension replaced by the record count)
    pub shape: Vec<usize>,
    /// Variable attributes
    pub attributes: Vec<Attribute>,
    /// External type
    pub nc_type: NcType,
    /// Whether the leading dimension is the record dimension
    pub is_record: bool,
}

impl Variable {
    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Total number of elements across all dimensions
    pub fn element_count(&self) -> usize {
        self.shape.iter().fold(1usize, |acc, d| acc.saturating_mul(*d))
    }

    /// Fill value: `_FillValue` when declared, otherwise the type default
    pub fn fill_value(&self) -> f64 {
        self.attribute("_FillValue")
            .and_then(|a| a.value.first_f64())
            .unwrap_or_else(|| self.nc_type.default_fill())
    }

    /// `units` attribute, if present
    pub fn units(&self) -> Option<String> {
        self.attribute("units").and_then(|a| a.value.as_text())
    }
}

impl From<&netcdf3::Variable> for Variable {
    fn from(var: &netcdf3::Variable) -> Self {
        let dims = var.get_dims();
        Self {
            name: var.name().to_string(),
            dimensions: dims.iter().map(|d| d.name()).collect(),
            shape: dims.iter().map(|d| d.size()).collect(),
            attributes: var.get_attrs().into_iter().map(Attribute::from).collect(),
            nc_type: NcType::from(var.data_type()),
            is_record: var.is_record_var(),
        }
    }
}
