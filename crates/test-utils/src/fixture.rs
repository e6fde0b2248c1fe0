//! On-disk project fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use sitepipe::paths::PathTable;
use tempfile::TempDir;

/// Name of the project directory inside the temp dir. The output root is
/// therefore `<project>/site`.
pub const PROJECT_NAME: &str = "site";

/// A temporary project directory with helpers to lay out `src/`.
pub struct ProjectFixture {
    _dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    /// Empty project: no `src/` at all.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().join(PROJECT_NAME);
        fs::create_dir_all(&root).expect("create project dir");
        let root = root.canonicalize().expect("canonicalize project dir");
        Self { _dir: dir, root }
    }

    /// A small but complete site: one page with a partial and an image
    /// reference, SCSS with a partial, a JS entry, one PNG and one font.
    pub fn sample_site() -> Self {
        let fx = Self::empty();
        fx.write(
            "src/templates/base.html",
            "<html><head><link rel=\"stylesheet\" href=\"css/style.min.css\"></head>\
             <body>{% block body %}{% endblock %}</body></html>\n",
        );
        fx.write("src/templates/partials/nav.html", "<nav>home</nav>\n");
        fx.write(
            "src/templates/pages/index.html",
            "{% extends \"base.html\" %}{% block body %}{% include \"partials/nav.html\" %}\
             <img src=\"img/cat.png\" alt=\"cat\">{% endblock %}\n",
        );
        fx.write("src/assets/scss/_vars.scss", "$accent: #c00;\n");
        fx.write(
            "src/assets/scss/style.scss",
            "@import 'vars';\n.a { color: $accent; display: flex; }\n@media (min-width: 600px) { .b { color: blue; } }\n",
        );
        fx.write("src/js/index.js", "console.log('hello');\n");
        fx.write_png("src/assets/img/cat.png", 16, 16);
        fx.write_ttf("src/assets/fonts/body.ttf");
        fx
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> PathTable {
        PathTable::for_project(&self.root)
    }

    /// Absolute path of a file below the output root.
    pub fn output(&self, rel: &str) -> PathBuf {
        self.root.join(PROJECT_NAME).join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// A gradient PNG of the given size.
    pub fn write_png(&self, rel: &str, width: u32, height: u32) -> PathBuf {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 16 % 256) as u8, (y * 16 % 256) as u8, 128])
        });
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png)
            .expect("encode fixture png");
        self.write(rel, bytes.into_inner())
    }

    /// A structurally valid TrueType file with a few opaque tables.
    pub fn write_ttf(&self, rel: &str) -> PathBuf {
        self.write(rel, minimal_ttf())
    }

    /// Every file below the output root, relative to it, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let root = self.root.join(PROJECT_NAME);
        let mut files = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries {
                let path = entry.expect("read output entry").path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(&root).expect("under output root");
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        files
    }

    /// Contents of every output file, keyed by relative path.
    pub fn snapshot_output(&self) -> Vec<(String, Vec<u8>)> {
        self.output_files()
            .into_iter()
            .map(|rel| {
                let bytes = fs::read(self.output(&rel)).expect("read output file");
                (rel, bytes)
            })
            .collect()
    }
}

/// sfnt with `head`, `name` and `OS/2` tables.
pub fn minimal_ttf() -> Vec<u8> {
    let tables: [(&[u8; 4], Vec<u8>); 3] = [
        (b"OS/2", vec![2u8; 10]),
        (b"head", vec![1u8; 54]),
        (b"name", b"sample font".to_vec()),
    ];

    let header_len = 12 + 16 * tables.len();
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let mut body = Vec::new();
    for (tag, data) in &tables {
        let offset = header_len + body.len();
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }
    out.extend_from_slice(&body);
    out
}
