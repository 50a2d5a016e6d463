//! Site adapters.
//!
//! A site is described entirely by data: where it lives, which selectors
//! locate each detail field, which inline-script patterns carry the tokens
//! for the release request, and how release rows are laid out. The raw
//! description ([`AdapterSpec`]) is compiled once into a [`SiteAdapter`];
//! every selector and pattern is checked there so a scrape call never has to.

use std::ops::RangeInclusive;

use regex::Regex;
use reqwest::header::HeaderValue;
use scraper::Selector;
use url::Url;

use crate::error::{AdapterError, ScrapeError};

/// Single-valued detail fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Premiered,
    Runtime,
    Director,
    Studio,
    Publisher,
    Series,
    Cover,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Premiered => "premiered",
            Field::Runtime => "runtime",
            Field::Director => "director",
            Field::Studio => "studio",
            Field::Publisher => "publisher",
            Field::Series => "series",
            Field::Cover => "cover",
        }
    }
}

/// Where a field's node is found.
#[derive(Debug, Clone)]
pub enum Locate {
    /// First element matching a css selector.
    Css(String),
    /// Text following a label span: `<span>長度:</span> 120分鐘`.
    LabelTail(String),
    /// First link sharing a parent with a label span:
    /// `<p><span>導演:</span> <a>name</a></p>`.
    LabelLink(String),
}

/// What to read off the located node.
#[derive(Debug, Clone)]
pub enum Take {
    Text,
    Attr(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostProcess {
    None,
    StripSuffix(String),
    AbsoluteUrl,
}

impl PostProcess {
    pub(crate) fn apply(&self, value: &str, base: &Url) -> Option<String> {
        match self {
            PostProcess::None => Some(value.to_string()),
            PostProcess::StripSuffix(suffix) => {
                Some(value.strip_suffix(suffix.as_str()).unwrap_or(value).trim().to_string())
            }
            PostProcess::AbsoluteUrl => resolve_url(base, value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub locate: Locate,
    pub take: Take,
    pub post: PostProcess,
    pub required: bool,
}

impl FieldSpec {
    pub fn text(field: Field, locate: Locate) -> Self {
        FieldSpec { field, locate, take: Take::Text, post: PostProcess::None, required: false }
    }

    pub fn attr(field: Field, locate: Locate, attr: &str) -> Self {
        FieldSpec { field, locate, take: Take::Attr(attr.to_string()), post: PostProcess::None, required: false }
    }

    pub fn post(mut self, post: PostProcess) -> Self {
        self.post = post;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Inline-script patterns; each must have one capture group.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub gid: String,
    pub uc: String,
    pub img: String,
}

#[derive(Debug, Clone)]
pub struct RowSpec {
    pub row: String,
    /// Zero-based `<td>` positions.
    pub name_cell: usize,
    pub size_cell: usize,
    pub date_cell: usize,
    pub hd_label: String,
    pub zh_label: String,
    pub uncensored_markers: Vec<String>,
}

/// Raw, unchecked description of a site.
#[derive(Debug, Clone)]
pub struct AdapterSpec {
    pub name: String,
    pub host: String,
    pub label: String,
    pub fields: Vec<FieldSpec>,
    pub tags: String,
    pub actors: String,
    /// Avatar path, `{code}` replaced by the last segment of the actor link.
    pub actor_thumb: String,
    pub tokens: TokenSpec,
    pub ajax_path: String,
    pub lang: String,
    pub floor: (u32, u32),
    pub fragment_charset: String,
    pub rows: RowSpec,
}

#[derive(Debug)]
pub(crate) enum Locator {
    Css(Selector),
    LabelTail(String),
    LabelLink(String),
}

#[derive(Debug)]
pub(crate) struct FieldRule {
    pub(crate) field: Field,
    pub(crate) locator: Locator,
    pub(crate) take: Take,
    pub(crate) post: PostProcess,
    pub(crate) required: bool,
}

/// Compiled selector table for the detail page.
#[derive(Debug)]
pub struct DetailTable {
    pub(crate) rules: Vec<FieldRule>,
    pub(crate) label: Selector,
    pub(crate) link: Selector,
    pub(crate) tags: Selector,
    pub(crate) actors: Selector,
    pub(crate) actor_thumb: String,
}

#[derive(Debug)]
pub struct TokenPatterns {
    pub(crate) gid: Regex,
    pub(crate) uc: Regex,
    pub(crate) img: Regex,
}

#[derive(Debug)]
pub struct RowLayout {
    pub(crate) row: Selector,
    pub(crate) name_cell: usize,
    pub(crate) size_cell: usize,
    pub(crate) date_cell: usize,
    pub(crate) hd_label: String,
    pub(crate) zh_label: String,
    pub(crate) uncensored_markers: Vec<String>,
}

/// A validated site description the pipeline runs against.
#[derive(Debug)]
pub struct SiteAdapter {
    pub name: String,
    pub host: Url,
    pub(crate) referer: HeaderValue,
    pub detail: DetailTable,
    pub tokens: TokenPatterns,
    pub(crate) ajax_url: Url,
    pub lang: String,
    pub floor: RangeInclusive<u32>,
    pub fragment_charset: String,
    pub rows: RowLayout,
}

impl AdapterSpec {
    pub fn compile(self) -> Result<SiteAdapter, AdapterError> {
        let host = Url::parse(&self.host).map_err(|source| AdapterError::BaseUrl {
            url: self.host.clone(),
            source,
        })?;
        let referer = HeaderValue::from_str(host.as_str())
            .map_err(|e| AdapterError::Header(e.to_string()))?;
        let ajax_url = host.join(&self.ajax_path).map_err(|source| AdapterError::BaseUrl {
            url: self.ajax_path.clone(),
            source,
        })?;

        let mut rules: Vec<FieldRule> = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            if rules.iter().any(|r| r.field == spec.field) {
                return Err(AdapterError::DuplicateField(spec.field.name()));
            }
            let locator = match spec.locate {
                Locate::Css(s) => Locator::Css(selector(&s)?),
                Locate::LabelTail(l) => Locator::LabelTail(l),
                Locate::LabelLink(l) => Locator::LabelLink(l),
            };
            rules.push(FieldRule {
                field: spec.field,
                locator,
                take: spec.take,
                post: spec.post,
                required: spec.required,
            });
        }
        if !rules.iter().any(|r| r.field == Field::Title && r.required) {
            return Err(AdapterError::MissingTitle);
        }

        let (lo, hi) = self.floor;
        if lo > hi {
            return Err(AdapterError::EmptyFloorRange(lo, hi));
        }

        Ok(SiteAdapter {
            name: self.name,
            host,
            referer,
            detail: DetailTable {
                rules,
                label: selector(&self.label)?,
                link: selector("a")?,
                tags: selector(&self.tags)?,
                actors: selector(&self.actors)?,
                actor_thumb: self.actor_thumb,
            },
            tokens: TokenPatterns {
                gid: pattern(&self.tokens.gid)?,
                uc: pattern(&self.tokens.uc)?,
                img: pattern(&self.tokens.img)?,
            },
            ajax_url,
            lang: self.lang,
            floor: lo..=hi,
            fragment_charset: self.fragment_charset,
            rows: RowLayout {
                row: selector(&self.rows.row)?,
                name_cell: self.rows.name_cell,
                size_cell: self.rows.size_cell,
                date_cell: self.rows.date_cell,
                hd_label: self.rows.hd_label,
                zh_label: self.rows.zh_label,
                uncensored_markers: self.rows.uncensored_markers,
            },
        })
    }
}

impl SiteAdapter {
    /// Detail page url for an identifier, relative to the base host.
    pub fn detail_url(&self, num: &str) -> Result<Url, ScrapeError> {
        let num = num.trim();
        if num.is_empty() {
            return Err(ScrapeError::NotFound("empty identifier".to_string()));
        }
        self.host
            .join(&urlencoding::encode(num))
            .map_err(|e| ScrapeError::NotFound(format!("{num}: {e}")))
    }

    pub fn ajax_url(&self) -> &Url {
        &self.ajax_url
    }
}

/// Resolves `href` against `base`. Absolute urls come back as they are.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

fn selector(s: &str) -> Result<Selector, AdapterError> {
    Selector::parse(s).map_err(|e| AdapterError::Selector {
        selector: s.to_string(),
        reason: format!("{e:?}"),
    })
}

fn pattern(p: &str) -> Result<Regex, AdapterError> {
    let re = Regex::new(p).map_err(|source| AdapterError::Pattern { pattern: p.to_string(), source })?;
    if re.captures_len() < 2 {
        return Err(AdapterError::PatternWithoutCapture(p.to_string()));
    }
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> AdapterSpec {
        AdapterSpec {
            name: "Test".into(),
            host: "https://example.test/".into(),
            label: "span".into(),
            fields: vec![FieldSpec::text(Field::Title, Locate::Css("h3".into())).required()],
            tags: "a.tag".into(),
            actors: "a.star".into(),
            actor_thumb: "/pics/{code}.jpg".into(),
            tokens: TokenSpec {
                gid: r"gid=(\d+)".into(),
                uc: r"uc=(\d+)".into(),
                img: r"img=(\S+)".into(),
            },
            ajax_path: "/ajax/list.php".into(),
            lang: "en".into(),
            floor: (1, 10),
            fragment_charset: "utf-8".into(),
            rows: RowSpec {
                row: "tr".into(),
                name_cell: 0,
                size_cell: 1,
                date_cell: 2,
                hd_label: "HD".into(),
                zh_label: "SUB".into(),
                uncensored_markers: vec!["uncensored".into()],
            },
        }
    }

    #[test]
    fn compiles_minimal_adapter() {
        let adapter = minimal().compile().unwrap();
        assert_eq!(adapter.ajax_url().as_str(), "https://example.test/ajax/list.php");
        assert_eq!(adapter.floor, 1..=10);
    }

    #[test]
    fn rejects_bad_selector() {
        let mut spec = minimal();
        spec.tags = "a[".into();
        assert!(matches!(spec.compile(), Err(AdapterError::Selector { .. })));
    }

    #[test]
    fn rejects_pattern_without_group() {
        let mut spec = minimal();
        spec.tokens.uc = r"uc=\d+".into();
        assert!(matches!(spec.compile(), Err(AdapterError::PatternWithoutCapture(_))));
    }

    #[test]
    fn requires_title_rule() {
        let mut spec = minimal();
        spec.fields = vec![FieldSpec::text(Field::Title, Locate::Css("h3".into()))];
        assert!(matches!(spec.compile(), Err(AdapterError::MissingTitle)));
    }

    #[test]
    fn rejects_duplicate_fields() {
        let mut spec = minimal();
        spec.fields.push(FieldSpec::text(Field::Title, Locate::Css("h1".into())));
        assert!(matches!(spec.compile(), Err(AdapterError::DuplicateField("title"))));
    }

    #[test]
    fn rejects_inverted_floor() {
        let mut spec = minimal();
        spec.floor = (10, 1);
        assert!(matches!(spec.compile(), Err(AdapterError::EmptyFloorRange(10, 1))));
    }

    #[test]
    fn detail_url_joins_identifier() {
        let adapter = minimal().compile().unwrap();
        assert_eq!(adapter.detail_url(" ABP-123 ").unwrap().as_str(), "https://example.test/ABP-123");
        assert!(matches!(adapter.detail_url(""), Err(ScrapeError::NotFound(_))));
    }

    #[test]
    fn resolve_is_idempotent() {
        let base = Url::parse("https://example.test/").unwrap();
        let abs = resolve_url(&base, "/pics/cover/a_b.jpg").unwrap();
        assert_eq!(abs, "https://example.test/pics/cover/a_b.jpg");
        assert_eq!(resolve_url(&base, &abs).unwrap(), abs);
        assert_eq!(
            resolve_url(&base, "https://cdn.test/x.jpg").unwrap(),
            "https://cdn.test/x.jpg"
        );
        assert!(resolve_url(&base, "  ").is_none());
    }

    #[test]
    fn strip_suffix_trims() {
        let base = Url::parse("https://example.test/").unwrap();
        let post = PostProcess::StripSuffix("分鐘".into());
        assert_eq!(post.apply("120分鐘", &base).unwrap(), "120");
        assert_eq!(post.apply("95", &base).unwrap(), "95");
    }
}
