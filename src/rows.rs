use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::adapter::{RowLayout, TokenPatterns};
use crate::error::ScrapeError;
use crate::types::SubscribeScrape;

/// Per-page values the release endpoint wants back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub gid: String,
    pub uc: String,
    pub img: String,
}

/// Pulls the three inline-script tokens out of a raw page body.
pub fn harvest_tokens(body: &str, patterns: &TokenPatterns) -> Result<Tokens, ScrapeError> {
    Ok(Tokens {
        gid: capture(&patterns.gid, body, "gid")?,
        uc: capture(&patterns.uc, body, "uc")?,
        img: capture(&patterns.img, body, "img")?,
    })
}

fn capture(re: &Regex, body: &str, what: &str) -> Result<String, ScrapeError> {
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ScrapeError::Protocol(format!("token `{what}` not found (pattern `{}`)", re.as_str())))
}

/// Parses the `<tr>` fragment returned by the release endpoint.
///
/// Rows without a link in the name cell are headers or separators and are
/// skipped. A data row missing its size or date link fails the whole call.
pub fn parse_release_rows(
    fragment: &str,
    layout: &RowLayout,
    website: &str,
    url: &str,
) -> Result<Vec<SubscribeScrape>, ScrapeError> {
    let doc = Html::parse_fragment(&format!("<table>{fragment}</table>"));
    let mut out = Vec::new();

    for (idx, row) in doc.select(&layout.row).enumerate() {
        let cells: Vec<ElementRef> = children_named(row, "td").collect();
        let links: Vec<ElementRef> = match cells.get(layout.name_cell) {
            Some(cell) => children_named(*cell, "a").collect(),
            None => Vec::new(),
        };
        let Some(name_link) = links.first() else {
            debug!(row = idx, "skipping non-data row");
            continue;
        };

        let name = text_of(*name_link);
        let magnet = name_link
            .value()
            .attr("href")
            .map(|h| h.trim().to_string())
            .ok_or_else(|| ScrapeError::MalformedRow(format!("row {idx}: name link has no href")))?;

        let mut item = SubscribeScrape {
            is_uncensored: layout.uncensored_markers.iter().any(|m| name.contains(m.as_str())),
            website: website.to_string(),
            url: url.to_string(),
            magnet,
            ..Default::default()
        };
        for marker in &links[1..] {
            let label = text_of(*marker);
            if label == layout.hd_label {
                item.is_hd = true;
            }
            if label == layout.zh_label {
                item.is_zh = true;
            }
        }
        item.size = cell_link_text(&cells, layout.size_cell)
            .ok_or_else(|| ScrapeError::MalformedRow(format!("row {idx} ({name}): size cell missing")))?;
        item.publish_date = cell_link_text(&cells, layout.date_cell)
            .ok_or_else(|| ScrapeError::MalformedRow(format!("row {idx} ({name}): date cell missing")))?;
        item.name = name;

        out.push(item);
    }

    Ok(out)
}

fn children_named<'a>(el: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == tag)
}

fn cell_link_text(cells: &[ElementRef], index: usize) -> Option<String> {
    let cell = cells.get(index)?;
    children_named(*cell, "a").next().map(text_of)
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
