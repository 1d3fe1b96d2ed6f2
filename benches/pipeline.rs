use argo_dataops::argo::FileCategory;
use argo_dataops::config::PipelineConfig;
use argo_dataops::export::{ExportInput, Exporter, ProcessingLog};
use argo_dataops::netcdf::NcFile;
use argo_dataops::preprocess::Preprocessor;
use argo_dataops::schema::{explore, RawInstrumentFile};
use argo_dataops::synthetic::SyntheticFile;
use argo_dataops::validator::Validator;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

/// Multi-profile BGC file held in memory
fn bgc_file(n_profiles: usize, n_levels: usize) -> RawInstrumentFile {
    let bytes = SyntheticFile::demo(FileCategory::Biogeochemical, n_profiles, n_levels)
        .to_bytes()
        .unwrap();
    RawInstrumentFile::from_netcdf("1900722_Bprof.nc", NcFile::from_bytes(bytes).unwrap())
}

/// Benchmark schema exploration (header parse plus text decoding)
fn bench_explore(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore");

    for n_profiles in [10, 100] {
        let file = bgc_file(n_profiles, 100);
        group.throughput(Throughput::Elements(n_profiles as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}profiles", n_profiles)), &file, |b, file| {
            b.iter(|| black_box(explore(file)));
        });
    }

    group.finish();
}

/// Benchmark validation of a whole file
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let validator = Validator::default();

    for n_profiles in [10, 100] {
        let file = bgc_file(n_profiles, 100);
        let schema = explore(&file);
        group.throughput(Throughput::Elements((n_profiles * 100) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}profiles", n_profiles)), &file, |b, file| {
            b.iter(|| black_box(validator.validate(file, &schema)));
        });
    }

    group.finish();
}

/// Benchmark preprocessing; throughput counted in levels
fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");
    let config = PipelineConfig::default();
    let preprocessor = Preprocessor::new(&config);

    for n_levels in [100, 1000] {
        let file = bgc_file(50, n_levels);
        let schema = explore(&file);
        let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
        group.throughput(Throughput::Elements((50 * n_levels) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}levels", n_levels)), &file, |b, file| {
            b.iter(|| black_box(preprocessor.preprocess(file, &schema, &validation).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark Parquet export of a preprocessed file
fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.sample_size(20);
    let config = PipelineConfig::default();
    let exporter = Exporter::new(&config);

    let file = bgc_file(50, 500);
    let schema = explore(&file);
    let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
    let preprocessed = Preprocessor::new(&config)
        .preprocess(&file, &schema, &validation)
        .unwrap();
    let input = ExportInput {
        file: &file,
        schema: &schema,
        validation: &validation,
        preprocessed: &preprocessed,
    };
    let temp_dir = TempDir::new().unwrap();

    group.throughput(Throughput::Elements(preprocessed.observations.len() as u64));
    group.bench_function("50profiles_500levels", |b| {
        b.iter(|| {
            let artifacts = exporter
                .export(input, temp_dir.path(), ProcessingLog::start(&config))
                .unwrap();
            black_box(artifacts);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_explore, bench_validate, bench_preprocess, bench_export);
criterion_main!(benches);
