// src/transform/css.rs

//! Stylesheet post-processing on the `lightningcss` AST.

use anyhow::{Result, anyhow};
use lightningcss::rules::CssRule;
use lightningcss::rules::media::MediaRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::traits::ToCss;

use super::{Asset, Step};

/// Merge top-level `@media` blocks with identical queries and move them to
/// the end of the stylesheet, keeping first-seen order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupMediaQueries;

impl GroupMediaQueries {
    pub fn group(code: &str) -> Result<String> {
        let mut sheet = StyleSheet::parse(code, ParserOptions::default())
            .map_err(|err| anyhow!("parsing stylesheet: {err}"))?;

        let mut plain = Vec::with_capacity(sheet.rules.0.len());
        let mut media: Vec<(String, MediaRule<'_>)> = Vec::new();

        for rule in std::mem::take(&mut sheet.rules.0) {
            match rule {
                CssRule::Media(rule) => {
                    let key = rule
                        .query
                        .to_css_string(PrinterOptions::default())
                        .map_err(|err| anyhow!("printing media query: {err}"))?;
                    match media.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, existing)) => existing.rules.0.extend(rule.rules.0),
                        None => media.push((key, rule)),
                    }
                }
                other => plain.push(other),
            }
        }

        plain.extend(media.into_iter().map(|(_, rule)| CssRule::Media(rule)));
        sheet.rules.0 = plain;

        let out = sheet
            .to_css(PrinterOptions::default())
            .map_err(|err| anyhow!("printing stylesheet: {err}"))?;
        Ok(out.code)
    }
}

impl Step for GroupMediaQueries {
    fn name(&self) -> &'static str {
        "group-media-queries"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let css = Self::group(asset.text()?)?;
        Ok(asset.with_contents(css))
    }
}

/// Add vendor prefixes required by a browserslist query.
#[derive(Debug, Clone)]
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    pub fn new(browsers: &[String]) -> Result<Self> {
        let browsers = Browsers::from_browserslist(browsers)
            .map_err(|err| anyhow!("invalid browserslist query {browsers:?}: {err}"))?;
        Ok(Self {
            targets: Targets {
                browsers,
                ..Targets::default()
            },
        })
    }

    pub fn prefix(&self, code: &str) -> Result<String> {
        let mut sheet = StyleSheet::parse(code, ParserOptions::default())
            .map_err(|err| anyhow!("parsing stylesheet: {err}"))?;
        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|err| anyhow!("prefixing stylesheet: {err}"))?;
        let out = sheet
            .to_css(PrinterOptions {
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|err| anyhow!("printing stylesheet: {err}"))?;
        Ok(out.code)
    }
}

impl Step for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let css = self.prefix(asset.text()?)?;
        Ok(asset.with_contents(css))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MinifyCss;

impl MinifyCss {
    pub fn minify(code: &str) -> Result<String> {
        let mut sheet = StyleSheet::parse(code, ParserOptions::default())
            .map_err(|err| anyhow!("parsing stylesheet: {err}"))?;
        sheet
            .minify(MinifyOptions::default())
            .map_err(|err| anyhow!("minifying stylesheet: {err}"))?;
        let out = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|err| anyhow!("printing stylesheet: {err}"))?;
        Ok(out.code)
    }
}

impl Step for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let css = Self::minify(asset.text()?)?;
        Ok(asset.with_contents(css))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css_asset(code: &str) -> Asset {
        Asset::new("/p/style.scss", "style.css", code.as_bytes().to_vec())
    }

    #[test]
    fn identical_media_queries_are_merged_and_moved_last() {
        let input = "@media (max-width: 600px) { .a { color: red } }\n\
                     .b { color: blue }\n\
                     @media (max-width: 600px) { .c { color: green } }\n";
        let out = GroupMediaQueries::group(input).unwrap();

        assert_eq!(out.matches("@media").count(), 1, "{out}");
        let media_at = out.find("@media").unwrap();
        assert!(out.find(".b").unwrap() < media_at, "{out}");
        assert!(out.find(".a").unwrap() > media_at, "{out}");
        assert!(out.find(".c").unwrap() > out.find(".a").unwrap(), "{out}");
    }

    #[test]
    fn old_browsers_get_prefixes() {
        let step = Autoprefix::new(&["safari 5".to_string()]).unwrap();
        let out = step
            .apply(css_asset(".a { user-select: none }"))
            .unwrap();
        assert!(out.text().unwrap().contains("-webkit-user-select"), "{}", out.text().unwrap());
    }

    #[test]
    fn minified_output_has_no_newlines() {
        let out = MinifyCss
            .apply(css_asset(".a {\n  color: #ff0000;\n}\n\n.b {\n  margin: 0px;\n}\n"))
            .unwrap();
        let text = out.text().unwrap();
        assert!(!text.contains('\n'), "{text}");
        assert!(text.starts_with(".a{color:"), "{text}");
    }
}
