// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::TaskName;
use crate::errors::PipelineError;
use crate::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Stage ordering: task name → names it must run after.
pub type StageMap = BTreeMap<TaskName, Vec<TaskName>>;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
///
/// [server]
/// port = 3000
///
/// [images]
/// webp_quality = 70
///
/// [task.fonts]
/// after = ["clean"]
/// ```
///
/// All sections are optional and have the defaults of the fixed pipeline.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub css: CssSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub js: JsSection,

    #[serde(default)]
    pub fonts: FontsSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// Per-task overrides from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section: what happens when a watch trigger arrives for a task
/// that is already part of the current run.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"queue"` or `"cancel"`.
    #[serde(default = "default_triggered_while_running_behaviour")]
    pub triggered_while_running_behaviour: String,

    /// Maximum number of queued runs to remember.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_triggered_while_running_behaviour() -> String {
    "queue".to_string()
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: default_triggered_while_running_behaviour(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[css]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CssSection {
    /// Browserslist queries used for vendor prefixing.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["last 5 versions".to_string()]
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    /// Lossy WebP quality, 0–100.
    #[serde(default = "default_webp_quality")]
    pub webp_quality: u8,
    /// Quality used when re-encoding JPEGs for the optimized copy, 0–100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_webp_quality() -> u8 {
    70
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            webp_quality: default_webp_quality(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[js]` section. Both commands run through the platform shell in the
/// project directory.
#[derive(Debug, Clone, Deserialize)]
pub struct JsSection {
    /// Bundler command; `{entry}` is replaced by the entry file path. The
    /// bundle is read from stdout.
    #[serde(default = "default_bundle_cmd")]
    pub bundle_cmd: String,
    /// Minifier command; reads the bundle on stdin, writes to stdout.
    #[serde(default = "default_minify_cmd")]
    pub minify_cmd: String,
    /// Bundle file name before the `.min.js` rename.
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,
}

fn default_bundle_cmd() -> String {
    "esbuild {entry} --bundle --target=es2015 --log-level=error".to_string()
}

fn default_minify_cmd() -> String {
    "esbuild --minify --log-level=error".to_string()
}

fn default_bundle_name() -> String {
    "script.js".to_string()
}

impl Default for JsSection {
    fn default() -> Self {
        Self {
            bundle_cmd: default_bundle_cmd(),
            minify_cmd: default_minify_cmd(),
            bundle_name: default_bundle_name(),
        }
    }
}

/// `[fonts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FontsSection {
    /// OTF → TTF converter; `{input}` and `{output}` are replaced by paths.
    #[serde(default = "default_otf2ttf_cmd")]
    pub otf2ttf_cmd: String,
}

fn default_otf2ttf_cmd() -> String {
    "fontforge -lang=ff -c 'Open($1); Generate($2)' {input} {output}".to_string()
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            otf2ttf_cmd: default_otf2ttf_cmd(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiet window used to batch filesystem events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Only trigger when the aggregated content hash of a binding's files
    /// actually changed.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            use_hash: false,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Replaces the default dependency list for this task.
    #[serde(default)]
    pub after: Option<Vec<String>>,
}

/// Default build ordering: clean → (css ∥ html ∥ images) → js → fonts.
pub fn default_stages() -> StageMap {
    let mut stages = StageMap::new();
    let after = |deps: &[TaskKind]| deps.iter().map(|d| d.to_string()).collect::<Vec<_>>();

    stages.insert(TaskKind::Clean.to_string(), Vec::new());
    for kind in [TaskKind::Css, TaskKind::Html, TaskKind::Images] {
        stages.insert(kind.to_string(), after(&[TaskKind::Clean]));
    }
    stages.insert(
        TaskKind::Js.to_string(),
        after(&[TaskKind::Css, TaskKind::Html, TaskKind::Images]),
    );
    stages.insert(TaskKind::Fonts.to_string(), after(&[TaskKind::Js]));
    stages
}

/// Validated configuration handed to the rest of the application.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub behaviour: TriggerWhileRunningBehaviour,
    pub queue_length: usize,
    pub server: ServerSection,
    pub css: CssSection,
    pub images: ImagesSection,
    pub js: JsSection,
    pub fonts: FontsSection,
    pub watch: WatchSection,
    stages: StageMap,
}

impl ConfigFile {
    /// Effective stage ordering for `build` / `watch-changes`.
    pub fn stages(&self) -> &StageMap {
        &self.stages
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        // The default raw config always validates.
        Self {
            behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            server: ServerSection::default(),
            css: CssSection::default(),
            images: ImagesSection::default(),
            js: JsSection::default(),
            fonts: FontsSection::default(),
            watch: WatchSection::default(),
            stages: default_stages(),
        }
    }
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        crate::config::validate::validate_config(&raw)?;

        let behaviour = raw
            .config
            .triggered_while_running_behaviour
            .parse::<TriggerWhileRunningBehaviour>()
            .map_err(PipelineError::ConfigError)?;

        let mut stages = default_stages();
        for (name, task) in raw.task.iter() {
            if let Some(after) = &task.after {
                stages.insert(name.clone(), after.clone());
            }
        }
        crate::config::validate::validate_stages(&stages)?;

        Ok(Self {
            behaviour,
            queue_length: raw.config.queue_length,
            server: raw.server,
            css: raw.css,
            images: raw.images,
            js: raw.js,
            fonts: raw.fonts,
            watch: raw.watch,
            stages,
        })
    }
}
