// tests/build_scenarios.rs
#![cfg(unix)]

use std::fs;

use sitepipe::compose;
use sitepipe::config::ConfigFile;
use sitepipe::errors::PipelineError;
use sitepipe_test_utils::builders::ConfigFileBuilder;
use sitepipe_test_utils::fixture::ProjectFixture;
use sitepipe_test_utils::{init_tracing, with_timeout};

/// Stand-ins for the JS bundler/minifier that only need a POSIX shell.
fn shell_js_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_js_commands("touch bundled.marker && cat {entry}", "cat")
        .build()
}

#[tokio::test(flavor = "multi_thread")]
async fn build_produces_the_full_output_tree() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    let report = with_timeout(compose::build(fx.paths(), shell_js_config()))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 6);
    assert_eq!(
        fx.output_files(),
        vec![
            "css/style.css",
            "css/style.min.css",
            "fonts/body.woff",
            "fonts/body.woff2",
            "img/cat.png",
            "img/cat.webp",
            "index.html",
            "js/script.min.js",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn building_twice_is_byte_identical() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    with_timeout(compose::build(fx.paths(), shell_js_config()))
        .await
        .unwrap();
    let first = fx.snapshot_output();

    with_timeout(compose::build(fx.paths(), shell_js_config()))
        .await
        .unwrap();
    let second = fx.snapshot_output();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_outputs_are_removed_by_the_build() {
    let fx = ProjectFixture::sample_site();
    fx.write("site/old-page.html", "stale");

    with_timeout(compose::build(fx.paths(), shell_js_config()))
        .await
        .unwrap();
    assert!(!fx.output("old-page.html").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn page_images_point_at_existing_webp_files() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    with_timeout(compose::build(fx.paths(), shell_js_config()))
        .await
        .unwrap();

    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains(r#"srcset="img/cat.webp""#), "{index}");
    assert!(index.contains(r#"<img src="img/cat.png" alt="cat">"#), "{index}");
    assert!(fx.output("img/cat.webp").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn scss_error_fails_build_before_js_runs() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    fx.write("src/assets/scss/style.scss", ".a { color: red;\n");

    let result = with_timeout(compose::build(fx.paths(), shell_js_config())).await;

    match result {
        Err(PipelineError::BuildFailed { failed }) => {
            assert_eq!(failed[0], "css");
            assert!(failed.contains(&"js".to_string()), "{failed:?}");
            assert!(failed.contains(&"fonts".to_string()), "{failed:?}");
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }

    assert!(!fx.root().join("bundled.marker").exists(), "js stage was attempted");
    assert!(!fx.output("css/style.css").exists());
    // Independent stages still ran.
    assert!(fx.output("index.html").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn single_task_ignores_stage_ordering() {
    let fx = ProjectFixture::sample_site();

    let report = with_timeout(compose::run_task(
        sitepipe::types::TaskKind::Fonts,
        fx.paths(),
        ConfigFile::default(),
    ))
    .await
    .unwrap();

    assert_eq!(report.succeeded, vec!["fonts"]);
    assert_eq!(fx.output_files(), vec!["fonts/body.woff", "fonts/body.woff2"]);
}
