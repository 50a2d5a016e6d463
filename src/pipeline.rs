use rand::Rng;
use reqwest::header::REFERER;
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::adapter::SiteAdapter;
use crate::error::ScrapeError;
use crate::extract::extract;
use crate::rows::{harvest_tokens, parse_release_rows};
use crate::transport::{Request, Response, Transport};
use crate::types::{SubscribeScrape, VideoDetail};

/// Runs the detail and release scrapes for one site over an injected
/// transport. Holds no per-call state, so one instance can serve many
/// concurrent calls if the transport allows it.
pub struct Spider<T> {
    transport: T,
    adapter: SiteAdapter,
}

impl<T: Transport> Spider<T> {
    pub fn new(transport: T, adapter: SiteAdapter) -> Self {
        Spider { transport, adapter }
    }

    pub fn adapter(&self) -> &SiteAdapter {
        &self.adapter
    }

    /// Fetches the detail page for `num` and extracts its metadata.
    pub async fn fetch_detail(&self, num: &str) -> Result<VideoDetail, ScrapeError> {
        let url = self.adapter.detail_url(num)?;
        info!(site = %self.adapter.name, %url, "fetching detail");
        let response = check_status(self.transport.get(Request::get(url.clone())).await?)?;
        if response.status.is_redirection() {
            debug!(status = %response.status, "detail page answered with a redirect");
        }

        let mut detail = {
            let doc = Html::parse_document(&response.body);
            extract(&doc, &self.adapter.detail, &self.adapter.host, num.trim())?
        };
        detail.website.push(url.to_string());
        Ok(detail)
    }

    /// Fetches the release rows listed on `url`.
    ///
    /// The page itself only carries the tokens; the rows come from a second,
    /// token-gated request.
    pub async fn fetch_releases(&self, url: &str) -> Result<Vec<SubscribeScrape>, ScrapeError> {
        let page_url = Url::parse(url).map_err(|e| ScrapeError::Transport(format!("invalid url {url}: {e}")))?;
        info!(site = %self.adapter.name, url = %page_url, "fetching release listing");
        let page = check_status(self.transport.get(Request::get(page_url)).await?)?;

        let tokens = harvest_tokens(&page.body, &self.adapter.tokens).inspect_err(|e| {
            warn!(site = %self.adapter.name, error = %e, "release tokens missing");
        })?;
        debug!(gid = %tokens.gid, uc = %tokens.uc, img = %tokens.img, "harvested tokens");

        let floor = rand::thread_rng().gen_range(self.adapter.floor.clone());
        let request = Request::get(self.adapter.ajax_url().clone())
            .follow_redirects(true)
            .header(REFERER, self.adapter.referer.clone())
            .query("gid", tokens.gid)
            .query("lang", self.adapter.lang.clone())
            .query("img", tokens.img)
            .query("uc", tokens.uc)
            .query("floor", floor.to_string())
            .charset(&self.adapter.fragment_charset);
        let fragment = check_status(self.transport.get(request).await?)?;

        let releases = parse_release_rows(&fragment.body, &self.adapter.rows, &self.adapter.name, url)?;
        info!(count = releases.len(), "parsed release rows");
        Ok(releases)
    }
}

fn check_status(response: Response) -> Result<Response, ScrapeError> {
    let status = response.status;
    if status.is_client_error() || status.is_server_error() {
        return Err(ScrapeError::Transport(format!("{} answered {}", response.final_url, status)));
    }
    Ok(response)
}
