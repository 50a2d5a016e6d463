use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetail {
    pub num: String,
    pub title: String,
    pub premiered: Option<String>,
    /// Minutes, unit suffix already stripped.
    pub runtime: Option<String>,
    pub director: Option<String>,
    pub studio: Option<String>,
    pub publisher: Option<String>,
    pub series: Option<String>,
    pub cover: Option<String>,
    pub tags: Vec<String>,
    pub actors: Vec<VideoActor>,
    /// Source urls this record was built from, in visit order.
    pub website: Vec<String>,
}

impl VideoDetail {
    /// A record needs both its identifier and a title; everything else may
    /// be filled in afterwards.
    pub fn new(num: impl Into<String>, title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return None;
        }
        Some(VideoDetail {
            num: num.into(),
            title,
            premiered: None,
            runtime: None,
            director: None,
            studio: None,
            publisher: None,
            series: None,
            cover: None,
            tags: Vec::new(),
            actors: Vec::new(),
            website: Vec::new(),
        })
    }

    /// Adds a tag unless it is blank or already present.
    pub fn push_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoActor {
    pub name: String,
    pub thumb: String,
}

/// One downloadable release as listed on a detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscribeScrape {
    pub is_hd: bool,
    pub is_zh: bool,
    pub is_uncensored: bool,
    pub name: String,
    /// Adapter display name, not a url.
    pub website: String,
    pub url: String,
    pub size: String,
    pub magnet: String,
    /// Left as the site prints it.
    pub publish_date: String,
}
