// tests/tasks_outputs.rs

use std::fs;
use std::sync::Arc;

use sitepipe::config::ConfigFile;
use sitepipe::reload::ReloadNotifier;
use sitepipe::tasks::{TaskContext, build_task};
use sitepipe::types::TaskKind;
use sitepipe_test_utils::builders::ConfigFileBuilder;
use sitepipe_test_utils::fixture::ProjectFixture;
use sitepipe_test_utils::init_tracing;
use sitepipe_test_utils::reload::RecordingReload;

fn context(fx: &ProjectFixture, config: ConfigFile) -> (TaskContext, Arc<RecordingReload>) {
    let reload = Arc::new(RecordingReload::new());
    let notifier: Arc<dyn ReloadNotifier> = reload.clone();
    (TaskContext::new(fx.paths(), config, notifier), reload)
}

fn run(kind: TaskKind, ctx: &TaskContext) -> anyhow::Result<sitepipe::tasks::TaskReport> {
    build_task(kind, ctx)?.run()
}

#[test]
fn every_task_succeeds_without_inputs() {
    init_tracing();

    let fx = ProjectFixture::empty();
    let (ctx, reload) = context(&fx, ConfigFile::default());

    for kind in [
        TaskKind::Clean,
        TaskKind::Css,
        TaskKind::Html,
        TaskKind::Images,
        TaskKind::Js,
        TaskKind::Fonts,
        TaskKind::Otf2Ttf,
    ] {
        let report = run(kind, &ctx).unwrap_or_else(|e| panic!("{kind} failed: {e:#}"));
        assert!(report.is_empty(), "{kind} wrote {:?}", report.written);
    }

    assert!(fx.output_files().is_empty());
    assert!(reload.paths().is_empty());
}

#[test]
fn css_writes_expanded_and_minified_stylesheets() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    let (ctx, reload) = context(&fx, ConfigFile::default());

    let report = run(TaskKind::Css, &ctx).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(fx.output_files(), vec!["css/style.css", "css/style.min.css"]);

    let expanded = fs::read_to_string(fx.output("css/style.css")).unwrap();
    assert!(expanded.contains("#c00") || expanded.contains("#cc0000"), "{expanded}");
    assert!(expanded.contains("@media"));
    assert!(!expanded.contains("$accent"));

    let minified = fs::read_to_string(fx.output("css/style.min.css")).unwrap();
    assert!(minified.len() < expanded.len());

    // One notification per written stylesheet.
    assert_eq!(reload.batches().len(), 2);
}

#[test]
fn only_the_entry_stylesheet_is_compiled() {
    let fx = ProjectFixture::empty();
    fx.write("src/assets/scss/_only_partial.scss", "a { color: red; }");
    fx.write("src/assets/scss/other.scss", "a { color: red; }");
    let (ctx, _) = context(&fx, ConfigFile::default());

    let report = run(TaskKind::Css, &ctx).unwrap();
    assert!(report.is_empty());
}

#[test]
fn scss_syntax_error_fails_the_task() {
    let fx = ProjectFixture::empty();
    fx.write("src/assets/scss/style.scss", ".a { color: red;\n");
    let (ctx, _) = context(&fx, ConfigFile::default());

    let err = run(TaskKind::Css, &ctx).unwrap_err();
    assert!(format!("{err:#}").contains("style.scss"), "{err:#}");
    assert!(fx.output_files().is_empty());
}

#[test]
fn raster_image_yields_webp_and_optimized_original() {
    init_tracing();

    let fx = ProjectFixture::empty();
    fx.write_png("src/assets/img/icons/dot.png", 8, 8);
    fx.write("src/assets/img/logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
    let (ctx, reload) = context(&fx, ConfigFile::default());

    let report = run(TaskKind::Images, &ctx).unwrap();
    assert_eq!(report.written.len(), 3);
    assert_eq!(
        fx.output_files(),
        vec!["img/icons/dot.png", "img/icons/dot.webp", "img/logo.svg"]
    );

    let webp = fs::read(fx.output("img/icons/dot.webp")).unwrap();
    assert_eq!(&webp[..4], b"RIFF");
    assert_eq!(&webp[8..12], b"WEBP");

    let svg = fs::read_to_string(fx.output("img/logo.svg")).unwrap();
    assert!(svg.starts_with("<svg"));

    assert_eq!(reload.batches().len(), 1);
}

#[test]
fn corrupt_image_fails_the_task() {
    let fx = ProjectFixture::empty();
    fx.write("src/assets/img/broken.png", b"not a png");
    let (ctx, _) = context(&fx, ConfigFile::default());

    assert!(run(TaskKind::Images, &ctx).is_err());
}

#[test]
fn ttf_yields_woff_and_woff2() {
    init_tracing();

    let fx = ProjectFixture::empty();
    fx.write_ttf("src/assets/fonts/body.ttf");
    let (ctx, _) = context(&fx, ConfigFile::default());

    let report = run(TaskKind::Fonts, &ctx).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(fx.output_files(), vec!["fonts/body.woff", "fonts/body.woff2"]);

    let woff = fs::read(fx.output("fonts/body.woff")).unwrap();
    assert_eq!(&woff[..4], b"wOFF");
    let woff2 = fs::read(fx.output("fonts/body.woff2")).unwrap();
    assert_eq!(&woff2[..4], b"wOF2");
}

#[test]
fn html_renders_pages_with_partials() {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    fx.write("src/templates/pages/about.html", "<p>about</p>");
    let (ctx, reload) = context(&fx, ConfigFile::default());

    let report = run(TaskKind::Html, &ctx).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(fx.output_files(), vec!["about.html", "index.html"]);

    let index = fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(index.contains("<nav>home</nav>"), "{index}");
    assert!(index.contains(r#"<source srcset="img/cat.webp" type="image/webp">"#), "{index}");
    assert!(!index.contains("{%"));

    assert_eq!(reload.paths().len(), 2);
}

#[test]
fn template_error_fails_the_task() {
    let fx = ProjectFixture::empty();
    fx.write("src/templates/pages/index.html", "{% include \"missing.html\" %}");
    let (ctx, _) = context(&fx, ConfigFile::default());

    assert!(run(TaskKind::Html, &ctx).is_err());
}

#[cfg(unix)]
#[test]
fn js_runs_bundle_then_minify() {
    let fx = ProjectFixture::sample_site();
    let config = ConfigFileBuilder::new()
        .with_js_commands("cat {entry}", "tr -d ' '")
        .build();
    let (ctx, _) = context(&fx, config);

    let report = run(TaskKind::Js, &ctx).unwrap();
    assert_eq!(report.written.len(), 1);
    assert_eq!(fx.output_files(), vec!["js/script.min.js"]);
    let js = fs::read_to_string(fx.output("js/script.min.js")).unwrap();
    assert_eq!(js, "console.log('hello');\n");
}

#[cfg(unix)]
#[test]
fn failing_bundler_fails_the_task() {
    let fx = ProjectFixture::sample_site();
    let config = ConfigFileBuilder::new()
        .with_js_commands("echo bundler exploded >&2; exit 3", "cat")
        .build();
    let (ctx, _) = context(&fx, config);

    let err = run(TaskKind::Js, &ctx).unwrap_err();
    assert!(format!("{err:#}").contains("bundler exploded"), "{err:#}");
}

#[test]
fn clean_is_idempotent() {
    let fx = ProjectFixture::sample_site();
    fx.write("site/stale.html", "old");
    let (ctx, _) = context(&fx, ConfigFile::default());

    run(TaskKind::Clean, &ctx).unwrap();
    assert!(!fx.output("").exists());
    run(TaskKind::Clean, &ctx).unwrap();
    assert!(fx.root().join("src").is_dir());
}

#[cfg(unix)]
#[test]
fn otf2ttf_writes_next_to_the_sources() {
    let fx = ProjectFixture::empty();
    fx.write("src/assets/fonts/Display.Bold.otf", b"OTTO");
    let config = ConfigFileBuilder::new()
        .with_otf2ttf_cmd("cp {input} {output}")
        .build();
    let (ctx, _) = context(&fx, config);

    let report = run(TaskKind::Otf2Ttf, &ctx).unwrap();
    assert_eq!(report.written.len(), 1);
    assert!(fx.root().join("src/assets/fonts/Display.Bold.ttf").is_file());
    assert!(fx.output_files().is_empty());
}
