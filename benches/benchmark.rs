//! Benchmarks for rapid_featurize

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rapid_featurize::clusters::{FeatureClusterJointCounter, HighestProbabilityOnly};
use rapid_featurize::*;

/// Sample text for benchmarking
const SAMPLE_TEXT: &str = r#"
Just watched the match!!! The striker was unbelievable tonight, two goals
and an assist. Full highlights at https://example.com/highlights?id=42 ...
Can't believe the referee missed that handball??? Worst decision of the season.
"#;

fn options() -> Vec<PipelineOption> {
    vec![
        PipelineOption::new("tokeniser", "basic"),
        PipelineOption::new("lower_case", true),
        PipelineOption::new("normalise_urls", true),
        PipelineOption::new("normalise_repeated_qe_marks", true),
        PipelineOption::new("filter_punctuation", true),
        PipelineOption::new("unigrams", true),
        PipelineOption::new("bigrams", true),
    ]
}

/// Synthetic clustered collection: feature ids skewed towards a
/// per-cluster band so rankings are non-trivial.
fn synthetic_documents(n: usize, clusters: usize) -> Vec<ClusteredProcessedInstance> {
    (0..n)
        .map(|i| {
            let cluster = i % clusters;
            let features = (0..30u32)
                .map(|j| {
                    let shared = (i as u32 * 31 + j * 17) % 500;
                    if j % 3 == 0 {
                        cluster as u32 * 1000 + shared % 50
                    } else {
                        shared
                    }
                })
                .collect();
            let mut vector = vec![0.05; clusters];
            vector[cluster] = 0.8;
            ClusteredProcessedInstance::from_features(features, vector)
        })
        .collect()
}

fn benchmark_tokenization(c: &mut Criterion) {
    let tokenizer = Tokenizer::new();

    c.bench_function("tokenize_sample", |b| {
        b.iter(|| tokenizer.tokenize_text(black_box(SAMPLE_TEXT)))
    });

    let mut group = c.benchmark_group("tokenize_by_size");
    for size in [1, 10, 50].iter() {
        let text = SAMPLE_TEXT.repeat(*size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| tokenizer.tokenize_text(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let builder = PipelineBuilder::new().unwrap();
    let opts = options();

    c.bench_function("pipeline_build", |b| {
        b.iter(|| builder.build(black_box(&opts)).unwrap())
    });

    let mut pipeline = builder.build(&opts).unwrap();
    let instance = Instance::new("bench", SAMPLE_TEXT);
    c.bench_function("extract_features", |b| {
        b.iter(|| pipeline.extract_features(black_box(&instance)))
    });
}

fn benchmark_counting(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_by_documents");
    for n in [1_000, 10_000, 50_000].iter() {
        let docs = synthetic_documents(*n, 8);
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &docs, |b, docs| {
            b.iter(|| {
                let mut counter = FeatureClusterJointCounter::default();
                counter
                    .count(black_box(docs), &HighestProbabilityOnly)
                    .unwrap();
                counter
            })
        });
    }
    group.finish();
}

fn benchmark_top_k(c: &mut Criterion) {
    let docs = synthetic_documents(20_000, 8);
    let config = AnalysisConfig::new().with_min_feature_count(2);
    let analysis = ClusterFeatureAnalysis::with_config(&docs, None, &config).unwrap();

    let mut group = c.benchmark_group("top_k");
    for k in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            b.iter(|| analysis.top_features(black_box(3), k).unwrap())
        });
    }
    group.finish();

    c.bench_function("top_k_in_out_ratio", |b| {
        b.iter(|| {
            analysis
                .top_features_by(black_box(3), 50, OrderingMethod::LikelihoodInClusterOverLikelihoodOut)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_tokenization,
    benchmark_pipeline,
    benchmark_counting,
    benchmark_top_k
);
criterion_main!(benches);
