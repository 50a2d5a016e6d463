use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::adapter::{resolve_url, DetailTable, Field, FieldRule, Locator, Take};
use crate::error::ScrapeError;
use crate::types::{VideoActor, VideoDetail};

/// Builds a detail record from a parsed page.
///
/// Only a missing required field (the title) is an error; every other field
/// is read independently and left absent when its selector finds nothing.
pub fn extract(doc: &Html, table: &DetailTable, base: &Url, num: &str) -> Result<VideoDetail, ScrapeError> {
    let missing = |field: Field| ScrapeError::NotFound(format!("{num}: required field `{}` missing", field.name()));

    for rule in table.rules.iter().filter(|r| r.required && r.field != Field::Title) {
        if read_field(doc, table, rule, base).is_none() {
            return Err(missing(rule.field));
        }
    }

    let title = table
        .rules
        .iter()
        .find(|r| r.field == Field::Title)
        .and_then(|rule| read_field(doc, table, rule, base))
        .ok_or_else(|| missing(Field::Title))?;
    let mut detail = VideoDetail::new(num, title).ok_or_else(|| missing(Field::Title))?;

    for rule in table.rules.iter().filter(|r| r.field != Field::Title) {
        let value = read_field(doc, table, rule, base);
        if value.is_none() {
            debug!(num, field = rule.field.name(), "field absent");
        }
        match rule.field {
            Field::Title => {}
            Field::Premiered => detail.premiered = value,
            Field::Runtime => detail.runtime = value,
            Field::Director => detail.director = value,
            Field::Studio => detail.studio = value,
            Field::Publisher => detail.publisher = value,
            Field::Series => detail.series = value,
            Field::Cover => detail.cover = value,
        }
    }

    for a in doc.select(&table.tags) {
        detail.push_tag(a.text().collect::<String>().trim());
    }

    for a in doc.select(&table.actors) {
        let name = a.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let thumb = a
            .value()
            .attr("href")
            .and_then(actor_code)
            .and_then(|code| resolve_url(base, &table.actor_thumb.replace("{code}", code)));
        match thumb {
            Some(thumb) => detail.actors.push(VideoActor { name, thumb }),
            None => debug!(num, actor = %name, "actor link has no code, skipped"),
        }
    }

    Ok(detail)
}

fn read_field(doc: &Html, table: &DetailTable, rule: &FieldRule, base: &Url) -> Option<String> {
    let raw = match &rule.locator {
        Locator::Css(sel) => doc.select(sel).next().and_then(|el| take(el, &rule.take)),
        Locator::LabelTail(label) => find_label(doc, table, label).and_then(tail_text),
        Locator::LabelLink(label) => find_label(doc, table, label)
            .and_then(|span| span.parent())
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.select(&table.link).next())
            .and_then(|a| take(a, &rule.take)),
    }?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    rule.post.apply(raw, base).filter(|v| !v.is_empty())
}

fn take(el: ElementRef<'_>, what: &Take) -> Option<String> {
    match what {
        Take::Text => Some(el.text().collect()),
        Take::Attr(name) => el.value().attr(name).map(String::from),
    }
}

fn find_label<'a>(doc: &'a Html, table: &DetailTable, label: &str) -> Option<ElementRef<'a>> {
    doc.select(&table.label)
        .find(|el| el.text().collect::<String>().trim() == label)
}

/// Text node directly after the element, like `<span>x:</span> value`.
fn tail_text(el: ElementRef<'_>) -> Option<String> {
    el.next_sibling()
        .and_then(|node| node.value().as_text().map(|t| t.trim().to_string()))
}

/// Last path segment of an actor link, e.g. `.../star/okq` -> `okq`.
fn actor_code(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}
