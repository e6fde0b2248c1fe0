// tests/config_validation.rs

use std::io::Write;

use sitepipe::config::{default_stages, load_and_validate, load_or_default};
use sitepipe::errors::PipelineError;
use sitepipe::types::TriggerWhileRunningBehaviour;
use sitepipe_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn config_from_toml(contents: &str) -> sitepipe::errors::Result<sitepipe::config::ConfigFile> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    load_and_validate(file.path())
}

#[test]
fn empty_file_yields_default_pipeline() {
    let cfg = config_from_toml("").unwrap();
    assert_eq!(cfg.stages(), &default_stages());
    assert_eq!(cfg.behaviour, TriggerWhileRunningBehaviour::Queue);
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.images.webp_quality, 70);
}

#[test]
fn default_stages_follow_the_fixed_order() {
    let stages = default_stages();
    assert!(stages["clean"].is_empty());
    for task in ["css", "html", "images"] {
        assert_eq!(stages[task], vec!["clean".to_string()]);
    }
    assert_eq!(stages["js"], vec!["css", "html", "images"]);
    assert_eq!(stages["fonts"], vec!["js"]);
    assert!(!stages.contains_key("otf2ttf"));
}

#[test]
fn stage_cycle_returns_structured_error() {
    let result = config_from_toml(
        r#"
[task.js]
after = ["fonts"]
"#,
    );

    match result {
        Err(PipelineError::StageCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
        }
        Err(e) => panic!("Expected StageCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_task_section_is_rejected() {
    let result = config_from_toml(
        r#"
[task.sprites]
after = ["clean"]
"#,
    );

    match result {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("sprites")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn unknown_dependency_is_rejected() {
    let result = config_from_toml(
        r#"
[task.css]
after = ["clean", "nonexistent"]
"#,
    );

    match result {
        Err(PipelineError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("nonexistent"));
        }
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn transforms_must_follow_clean() {
    let err = ConfigFileBuilder::new()
        .with_after("images", &[])
        .try_build()
        .unwrap_err();
    assert!(err.to_string().contains("must run after 'clean'"), "{err}");

    let err = ConfigFileBuilder::new()
        .with_after("clean", &["css"])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::StageCycle(_) | PipelineError::ConfigError(_)));
}

#[test]
fn reordering_that_keeps_clean_first_is_accepted() {
    let cfg = ConfigFileBuilder::new()
        .with_after("fonts", &["clean"])
        .with_after("js", &["css"])
        .build();
    assert_eq!(cfg.stages()["fonts"], vec!["clean"]);
    assert_eq!(cfg.stages()["js"], vec!["css"]);
}

#[test]
fn out_of_range_quality_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_webp_quality(101)
        .try_build()
        .unwrap_err();
    assert!(err.to_string().contains("webp_quality"), "{err}");
}

#[test]
fn bad_behaviour_and_queue_length_are_rejected() {
    assert!(
        ConfigFileBuilder::new()
            .with_behaviour("restart")
            .try_build()
            .is_err()
    );
    assert!(
        ConfigFileBuilder::new()
            .with_queue_length(0)
            .try_build()
            .is_err()
    );
}

#[test]
fn missing_project_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(None, dir.path()).unwrap();
    assert_eq!(cfg.stages(), &default_stages());

    let missing = dir.path().join("nope.toml");
    assert!(load_or_default(Some(&missing), dir.path()).is_err());
}

#[test]
fn project_config_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Sitepipe.toml"),
        "[server]\nport = 8080\n[watch]\nuse_hash = true\n",
    )
    .unwrap();

    let cfg = load_or_default(None, dir.path()).unwrap();
    assert_eq!(cfg.server.port, 8080);
    assert!(cfg.watch.use_hash);
}
