#![no_main]

use argo_dataops::config::PipelineConfig;
use argo_dataops::netcdf::NcFile;
use argo_dataops::preprocess::Preprocessor;
use argo_dataops::schema::{explore, RawInstrumentFile};
use argo_dataops::validator::Validator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either fail to parse or flow through every
    // in-memory stage. None of them may panic.
    let Ok(nc) = NcFile::from_bytes(data.to_vec()) else {
        return;
    };
    let file = RawInstrumentFile::from_netcdf("R1900722_001.nc", nc);
    let schema = explore(&file);
    if !schema.is_readable() {
        return;
    }

    let config = PipelineConfig::default();
    let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
    let _ = Preprocessor::new(&config).preprocess(&file, &schema, &validation);
});
