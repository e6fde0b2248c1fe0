// src/transform/picture.rs

use std::sync::LazyLock;

use anyhow::Result;
use regex::{Captures, Regex};

use super::{Asset, Step};

/// `<img ...>` tags whose `src` points at a raster format we emit WebP for.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+?)\.(jpe?g|png|gif)(["'])[^>]*>"#)
        .expect("valid img regex")
});

static PICTURE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<picture\b.*?</picture>").expect("valid picture regex")
});

/// Point browsers that support WebP at the `.webp` sibling of each image.
///
/// Every `<img>` referencing a jpg/jpeg/png/gif that is not already inside a
/// `<picture>` element becomes
/// `<picture><source srcset="x.webp" type="image/webp"><img ...></picture>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriteImageRefs;

impl RewriteImageRefs {
    pub fn rewrite(html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for block in PICTURE_BLOCK.find_iter(html) {
            out.push_str(&wrap_images(&html[last..block.start()]));
            out.push_str(block.as_str());
            last = block.end();
        }
        out.push_str(&wrap_images(&html[last..]));
        out
    }
}

fn wrap_images(fragment: &str) -> String {
    IMG_TAG
        .replace_all(fragment, |caps: &Captures<'_>| {
            format!(
                r#"<picture><source srcset="{}.webp" type="image/webp">{}</picture>"#,
                &caps[1], &caps[0]
            )
        })
        .into_owned()
}

impl Step for RewriteImageRefs {
    fn name(&self) -> &'static str {
        "rewrite-image-refs"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let html = Self::rewrite(asset.text()?);
        Ok(asset.with_contents(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_raster_images() {
        let html = r#"<p><img src="img/cat.jpg" alt="cat"></p>"#;
        assert_eq!(
            RewriteImageRefs::rewrite(html),
            r#"<p><picture><source srcset="img/cat.webp" type="image/webp"><img src="img/cat.jpg" alt="cat"></picture></p>"#
        );
    }

    #[test]
    fn leaves_svg_and_existing_pictures_alone() {
        let html = concat!(
            r#"<img src="logo.svg">"#,
            r#"<picture><source srcset="a.avif"><img src="a.png"></picture>"#,
        );
        assert_eq!(RewriteImageRefs::rewrite(html), html);
    }

    #[test]
    fn handles_single_quotes_and_uppercase_extensions() {
        let out = RewriteImageRefs::rewrite("<IMG class='x' src='b.PNG'>");
        assert!(out.starts_with(r#"<picture><source srcset="b.webp""#), "{out}");
    }
}
