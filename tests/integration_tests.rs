//! Integration tests for rapid_featurize

use rapid_featurize::*;

/// Two topics: sports talk and cooking talk.
const SPORTS: &[&str] = &[
    "Great match tonight!!! The striker scored twice",
    "The striker was offside again, terrible match",
    "What a goal by the striker, best match of the season",
    "Match report: striker injured, coach worried",
];

const COOKING: &[&str] = &[
    "Bake the bread for forty minutes, the oven must be hot",
    "My bread recipe uses a very hot oven",
    "The oven broke while the bread was baking???",
    "Fresh bread from the oven, see https://example.com/recipe",
];

fn basic_options() -> Vec<PipelineOption> {
    vec![
        PipelineOption::new("tokeniser", "basic"),
        PipelineOption::new("lower_case", true),
        PipelineOption::new("normalise_urls", true),
        PipelineOption::new("normalise_repeated_qe_marks", true),
        PipelineOption::new("unigrams", true),
        PipelineOption::new("filter_punctuation", true),
    ]
}

/// Extract features for both topics; sports documents go to cluster 0.
fn clustered_corpus() -> (FeatureExtractionPipeline, Vec<ClusteredProcessedInstance>) {
    let mut pipeline = PipelineBuilder::new().unwrap().build(&basic_options()).unwrap();

    let mut documents = Vec::new();
    for (i, text) in SPORTS.iter().enumerate() {
        let processed = pipeline.extract_features(&Instance::new(format!("s{i}"), *text));
        documents.push(ClusteredProcessedInstance::new(processed, vec![0.9, 0.1]));
    }
    for (i, text) in COOKING.iter().enumerate() {
        let processed = pipeline.extract_features(&Instance::new(format!("c{i}"), *text));
        documents.push(ClusteredProcessedInstance::new(processed, vec![0.2, 0.8]));
    }
    (pipeline, documents)
}

#[test]
fn test_full_workflow() {
    let (pipeline, documents) = clustered_corpus();

    let config = AnalysisConfig::new().with_min_feature_count(3);
    let analysis = ClusterFeatureAnalysis::with_config(&documents, None, &config).unwrap();
    assert_eq!(analysis.num_clusters(), 2);

    let sports = analysis
        .top_feature_strings(0, 2, OrderingMethod::default(), &pipeline)
        .unwrap();
    assert_eq!(sports, vec!["match", "striker"]);

    let cooking = analysis
        .top_feature_strings(1, 2, OrderingMethod::default(), &pipeline)
        .unwrap();
    assert_eq!(cooking, vec!["bread", "oven"]);
}

#[test]
fn test_pipeline_normalisation() {
    let mut pipeline = PipelineBuilder::new().unwrap().build(&basic_options()).unwrap();
    let processed = pipeline.extract_features(&Instance::new(
        "1",
        "WOW!!!!! Really??? see http://t.co/abc",
    ));
    let strings: Vec<&str> = processed
        .features
        .iter()
        .filter_map(|&f| pipeline.feature_string(f))
        .collect();
    assert_eq!(strings, vec!["wow", "really", "see", "HTTPLINK"]);
}

#[test]
fn test_option_order_determines_stage_order() {
    let builder = PipelineBuilder::new().unwrap();

    // Inferrers always see the fully normalised document, but the stage
    // list keeps option order.
    let pipeline = builder
        .build(&[
            PipelineOption::new("tokeniser", "basic"),
            PipelineOption::new("bigrams", true),
            PipelineOption::new("lower_case", true),
        ])
        .unwrap();
    assert_eq!(pipeline.stage_names(), vec!["bigrams", "lower_case"]);
}

#[test]
fn test_build_failures_return_no_pipeline() {
    let builder = PipelineBuilder::new().unwrap();

    let err = builder
        .build(&[PipelineOption::new("lower_case", true)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingTokenizer);

    let err = builder
        .build(&[
            PipelineOption::new("tokeniser", "basic"),
            PipelineOption::new("geolocate", true),
        ])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnrecognisedOption);

    let err = builder
        .build(&[PipelineOption::new("tokeniser", serde_json::json!({"type": "neural"}))])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OptionTypeMismatch);
    assert_eq!(err.path, "/options/0/value");
}

#[test]
fn test_json_option_list() {
    let builder = PipelineBuilder::new().unwrap();
    let mut pipeline = builder
        .build_from_json(
            r#"[
                {"key": "tokeniser", "value": {"type": "basic", "min_length": 2}},
                {"key": "lower_case", "value": true},
                {"key": "bigrams", "value": "true"},
                {"key": "filter_punctuation", "value": true}
            ]"#,
        )
        .unwrap();
    let processed = pipeline.extract_features(&Instance::new("1", "Hot , oven"));
    assert_eq!(processed.features.len(), 1);
    assert_eq!(pipeline.feature_string(processed.features[0]), Some("hot oven"));
}

#[test]
fn test_custom_handler_registration() {
    struct Shout;

    impl ConfigHandler for Shout {
        fn key(&self) -> &str {
            "shout"
        }

        fn handle(
            &self,
            pipeline: &mut FeatureExtractionPipeline,
            value: &serde_json::Value,
            _options: &[PipelineOption],
        ) -> std::result::Result<(), ConfigError> {
            if rapid_featurize::pipeline::options::decode_flag("shout", value)? {
                pipeline.add_normaliser("shout", Box::new(Upper));
            }
            Ok(())
        }
    }

    struct Upper;

    impl pipeline::TokenNormaliser for Upper {
        fn normalise(&self, token: &mut AnnotatedToken) {
            token.form = token.form.to_uppercase();
        }
    }

    fn shout() -> std::result::Result<Box<dyn ConfigHandler>, String> {
        Ok(Box::new(Shout))
    }

    let registry = HandlerRegistry::builder()
        .register_all(pipeline::default_factories())
        .register(shout)
        .build()
        .unwrap();
    assert!(registry.contains("shout"));

    let builder = PipelineBuilder::with_registry(std::sync::Arc::new(registry));
    let mut shouting = builder
        .build(&[
            PipelineOption::new("tokeniser", "basic"),
            PipelineOption::new("shout", true),
            PipelineOption::new("unigrams", true),
        ])
        .unwrap();
    let processed = shouting.extract_features(&Instance::new("1", "quiet"));
    assert_eq!(shouting.feature_string(processed.features[0]), Some("QUIET"));

    // Registering a built-in twice is rejected.
    let err = HandlerRegistry::builder()
        .register_all(pipeline::default_factories())
        .register_all(pipeline::default_factories())
        .build()
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateHandlerKey);
}

#[test]
fn test_background_analysis() {
    let (mut pipeline, documents) = clustered_corpus();

    // A background where "the" is everywhere and topic words are rare.
    let background: Vec<ProcessedInstance> = (0..12)
        .map(|i| {
            let text = match i % 3 {
                0 => "the weather is nice",
                1 => "the bread and the match",
                _ => "the oven the striker",
            };
            pipeline.extract_features(&Instance::new(format!("b{i}"), text))
        })
        .collect();

    let config = AnalysisConfig::new()
        .with_min_background_feature_count(4)
        .with_min_cluster_feature_count(2);
    let analysis = ClusterFeatureAnalysis::with_config(&documents, Some(&background), &config).unwrap();
    assert!(analysis.counts().is_background_counted());

    let sports = analysis
        .top_feature_strings(0, 3, OrderingMethod::default(), &pipeline)
        .unwrap();
    assert!(sports.contains(&"striker"));
    assert!(sports.contains(&"match"));
    assert!(!sports.contains(&"bread"));
}

#[test]
fn test_analysis_errors() {
    let (_, documents) = clustered_corpus();
    let analysis = ClusterFeatureAnalysis::new(&documents).unwrap();

    assert!(matches!(
        analysis.top_features(5, 3),
        Err(AnalysisError::ClusterIndexOutOfRange { index: 5, clusters: 2 })
    ));
    assert!(matches!(
        analysis.top_features_named(0, 3, "chi_squared"),
        Err(AnalysisError::UnknownOrderingMethod { .. })
    ));
    assert!(matches!(
        ClusterFeatureAnalysis::new(&[]),
        Err(AnalysisError::EmptyDocumentCollection { .. })
    ));
}

#[test]
fn test_analysis_is_shareable_across_threads() {
    let (_, documents) = clustered_corpus();
    let config = AnalysisConfig::new().without_pruning();
    let analysis = ClusterFeatureAnalysis::with_config(&documents, None, &config).unwrap();

    let expected = analysis.top_features(0, 5).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| analysis.top_features(0, 5).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
