use std::path::Path;

use netcdf3::{DataSet, DataType, FileWriter, Version};

use super::error::NcError;
use super::types::{Attribute, NcType, NcValues};

struct PendingVariable {
    name: String,
    dims: Vec<String>,
    attributes: Vec<Attribute>,
    data: NcValues,
}

/// Builder for CDF-1 files with fixed-size dimensions
#[derive(Default)]
pub struct NcWriter {
    dimensions: Vec<(String, usize)>,
    attributes: Vec<Attribute>,
    variables: Vec<PendingVariable>,
}

impl NcWriter {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fixed-size dimension
    pub fn add_dimension(&mut self, name: &str, length: usize) -> Result<&mut Self, NcError> {
        if length == 0 {
            return Err(NcError::InvalidDefinition(format!(
                "dimension {name}: unlimited dimensions are not supported by the writer"
            )));
        }
        if self.dimensions.iter().any(|(n, _)| n == name) {
            return Err(NcError::InvalidDefinition(format!("duplicate dimension {name}")));
        }
        self.dimensions.push((name.to_string(), length));
        Ok(self)
    }

    /// Attach a global attribute
    pub fn add_global_attribute(&mut self, name: &str, value: NcValues) -> &mut Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Declare a variable with its full payload
    pub fn add_variable(
        &mut self,
        name: &str,
        dims: &[&str],
        data: NcValues,
    ) -> Result<&mut Self, NcError> {
        if self.variables.iter().any(|v| v.name == name) {
            return Err(NcError::InvalidDefinition(format!("duplicate variable {name}")));
        }
        let mut expected = 1usize;
        for dim in dims {
            let (_, length) = self
                .dimensions
                .iter()
                .find(|(n, _)| n == dim)
                .ok_or_else(|| {
                    NcError::InvalidDefinition(format!("variable {name}: unknown dimension {dim}"))
                })?;
            expected *= length;
        }
        if data.len() != expected {
            return Err(NcError::InvalidDefinition(format!(
                "variable {name}: {} values for shape of {expected} elements",
                data.len()
            )));
        }
        self.variables.push(PendingVariable {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Vec::new(),
            data,
        });
        Ok(self)
    }

    /// Attach an attribute to a declared variable
    pub fn add_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: NcValues,
    ) -> Result<&mut Self, NcError> {
        let var = self
            .variables
            .iter_mut()
            .find(|v| v.name == variable)
            .ok_or_else(|| NcError::VariableNotFound(variable.to_string()))?;
        var.attributes.push(Attribute::new(name, value));
        Ok(self)
    }

    fn data_set(&self) -> Result<DataSet, NcError> {
        let mut data_set = DataSet::new();
        for (name, length) in &self.dimensions {
            data_set.add_fixed_dim(name, *length)?;
        }
        for attr in &self.attributes {
            let name = attr.name.as_str();
            match attr.value.clone() {
                NcValues::Bytes(v) => data_set.add_global_attr_i8(name, v),
                NcValues::Chars(v) => data_set.add_global_attr_u8(name, v),
                NcValues::Shorts(v) => data_set.add_global_attr_i16(name, v),
                NcValues::Ints(v) => data_set.add_global_attr_i32(name, v),
                NcValues::Floats(v) => data_set.add_global_attr_f32(name, v),
                NcValues::Doubles(v) => data_set.add_global_attr_f64(name, v),
            }?;
        }
        for var in &self.variables {
            data_set.add_var(&var.name, var.dims.as_slice(), data_type(var.data.nc_type()))?;
            for attr in &var.attributes {
                let (var_name, name) = (var.name.as_str(), attr.name.as_str());
                match attr.value.clone() {
                    NcValues::Bytes(v) => data_set.add_var_attr_i8(var_name, name, v),
                    NcValues::Chars(v) => data_set.add_var_attr_u8(var_name, name, v),
                    NcValues::Shorts(v) => data_set.add_var_attr_i16(var_name, name, v),
                    NcValues::Ints(v) => data_set.add_var_attr_i32(var_name, name, v),
                    NcValues::Floats(v) => data_set.add_var_attr_f32(var_name, name, v),
                    NcValues::Doubles(v) => data_set.add_var_attr_f64(var_name, name, v),
                }?;
            }
        }
        Ok(data_set)
    }

    /// Serialize the file image
    pub fn to_bytes(&self) -> Result<Vec<u8>, NcError> {
        let staged = tempfile::NamedTempFile::new()?;
        self.write_to_path(staged.path())?;
        Ok(std::fs::read(staged.path())?)
    }

    /// Write the file, returning the number of bytes written
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<u64, NcError> {
        let path = path.as_ref();
        let data_set = self.data_set()?;
        let mut writer = FileWriter::open(path)?;
        writer.set_def(&data_set, Version::Classic, 0)?;
        for var in &self.variables {
            let name = var.name.as_str();
            match &var.data {
                NcValues::Bytes(v) => writer.write_var_i8(name, v),
                NcValues::Chars(v) => writer.write_var_u8(name, v),
                NcValues::Shorts(v) => writer.write_var_i16(name, v),
                NcValues::Ints(v) => writer.write_var_i32(name, v),
                NcValues::Floats(v) => writer.write_var_f32(name, v),
                NcValues::Doubles(v) => writer.write_var_f64(name, v),
            }?;
        }
        writer.close()?;
        Ok(std::fs::metadata(path)?.len())
    }
}

fn data_type(nc_type: NcType) -> DataType {
    match nc_type {
        NcType::Byte => DataType::I8,
        NcType::Char => DataType::U8,
        NcType::Short => DataType::I16,
        NcType::Int => DataType::I32,
        NcType::Float => DataType::F32,
        NcType::Double => DataType::F64,
    }
}
