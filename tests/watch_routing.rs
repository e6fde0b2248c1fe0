// tests/watch_routing.rs

use std::error::Error;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::time::{Duration, sleep, timeout};

use sitepipe::engine::{RuntimeEvent, TriggerReason};
use sitepipe::paths::PathTable;
use sitepipe::watch::{
    WatchOptions, WatcherHandle, bindings_from_paths, compute_hash_for_paths, spawn_watcher,
    tasks_for_path,
};
use sitepipe_test_utils::fixture::ProjectFixture;
use sitepipe_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn nested_scss_routes_to_css_only() -> TestResult {
    let bindings = bindings_from_paths(&PathTable::for_project("/work/site"))?;

    assert_eq!(tasks_for_path(&bindings, "src/assets/scss/a/b.scss"), vec!["css"]);
    assert_eq!(tasks_for_path(&bindings, "src/templates/base.html"), vec!["html"]);
    assert!(tasks_for_path(&bindings, "src/assets/fonts/body.ttf").is_empty());
    assert!(tasks_for_path(&bindings, "src/assets/scss/style.css").is_empty());
    Ok(())
}

#[test]
fn aggregate_hash_is_order_insensitive() -> TestResult {
    let fx = ProjectFixture::empty();
    let a = fx.write("src/assets/scss/a.scss", "a{}");
    let b = fx.write("src/assets/scss/b.scss", "b{}");

    let h1 = compute_hash_for_paths([&a, &b])?;
    let h2 = compute_hash_for_paths([&b, &a])?;
    assert_eq!(h1, h2);

    fx.write("src/assets/scss/a.scss", "a{color:red}");
    assert_ne!(h1, compute_hash_for_paths([&a, &b])?);
    Ok(())
}

async fn next_trigger(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Option<(String, TriggerReason)> {
    match timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(RuntimeEvent::TaskTriggered { task, reason })) => Some((task, reason)),
        _ => None,
    }
}

type Started = (mpsc::Receiver<RuntimeEvent>, WatcherHandle);

fn start(fx: &ProjectFixture, use_hash: bool) -> Result<Started, Box<dyn Error>> {
    let paths = fx.paths();
    let (tx, rx) = mpsc::channel(16);
    let handle = spawn_watcher(
        paths.project_root(),
        paths.source_root(),
        bindings_from_paths(&paths)?,
        tx,
        WatchOptions {
            debounce: Duration::from_millis(50),
            use_hash,
        },
    )?;
    Ok((rx, handle))
}

#[tokio::test]
async fn burst_of_changes_triggers_the_task_once() -> TestResult {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    let (mut rx, _handle) = start(&fx, false)?;
    sleep(Duration::from_millis(200)).await;

    fx.write("src/assets/scss/_vars.scss", "$accent: #0c0;\n");
    fx.write("src/assets/scss/extra/_more.scss", ".x { color: red; }\n");

    let (task, reason) = next_trigger(&mut rx).await.ok_or("no trigger received")?;
    assert_eq!(task, "css");
    assert_eq!(reason, TriggerReason::FileWatch);

    // Nothing else matched, and the burst was collapsed into one trigger.
    assert!(timeout(Duration::from_millis(500), rx.recv()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn unchanged_content_is_skipped_with_hashing() -> TestResult {
    init_tracing();

    let fx = ProjectFixture::sample_site();
    let partial: PathBuf = fx.root().join("src/templates/partials/nav.html");
    let (mut rx, _handle) = start(&fx, true)?;
    sleep(Duration::from_millis(200)).await;

    // Same bytes: no trigger.
    std::fs::write(&partial, "<nav>home</nav>\n")?;
    assert!(timeout(Duration::from_millis(500), rx.recv()).await.is_err());

    // Different bytes: html triggers.
    std::fs::write(&partial, "<nav>about</nav>\n")?;
    let (task, _) = next_trigger(&mut rx).await.ok_or("no trigger received")?;
    assert_eq!(task, "html");
    Ok(())
}
