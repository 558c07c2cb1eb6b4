pub mod expand;
pub mod puppeteer;

use std::sync::Arc;

use compact_str::{CompactString, format_compact};
use headless_chrome::Tab;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};

use crate::util::dedup_strs;

/// Log in when credentials are configured. The public listing still renders
/// logged out, so callers treat a failure here as a warning, not an abort.
pub async fn maybe_login(tab: &Arc<Tab>, username: &str, password: &str) -> anyhow::Result<()> {
    if username.is_empty() || password.is_empty() {
        return Ok(());
    }

    puppeteer::navigate_to(tab, "https://www.facebook.com/login".to_owned()).await?;
    puppeteer::type_into(tab, "input#email", username.to_owned()).await?;
    puppeteer::type_into(tab, "input#pass", password.to_owned()).await?;
    if !puppeteer::click_first(tab, r#"button[name="login"]"#).await? {
        anyhow::bail!("login button not found");
    }
    puppeteer::wait_navigated(tab).await?;

    tracing::info!(target: "scrape", "logged in as {username}");
    Ok(())
}

/// Navigate to the events listing, expand it until the past-events section
/// surfaces, and collect every upcoming event link.
pub async fn get_event_links(tab: &Arc<Tab>, page: &str) -> anyhow::Result<Vec<CompactString>> {
    puppeteer::navigate_to(tab, page.to_owned()).await?;

    expand::expand(&expand::TabFeed {
        tab: Arc::clone(tab),
    })
    .await?;

    let html = puppeteer::page_content(tab).await?;
    Ok(event_links_from_html(&html))
}

/// Pull `/events/<id>/` links out of listing HTML, canonicalized to
/// www.facebook.com and deduplicated in first-seen order.
#[must_use]
pub fn event_links_from_html(html: &str) -> Vec<CompactString> {
    let base = Url::parse("https://www.facebook.com/").unwrap();
    let reg_event = Regex::new(r"/events/\d+/").unwrap();
    let sel_a = Selector::parse("a").unwrap();

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for anchor in document.select(&sel_a) {
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            tracing::warn!(target: "scrape", "unparsable href: {href}");
            continue;
        };
        if reg_event.is_match(resolved.path()) {
            links.push(format_compact!("https://www.facebook.com{}", resolved.path()));
        }
    }

    dedup_strs(links)
}

#[cfg(test)]
mod tests {
    use super::event_links_from_html;

    const LISTING: &str = r#"<html><body>
        <a href="/events/123456789/?acontext=x">Gig night</a>
        <a href="https://www.facebook.com/events/123456789/">Gig night again</a>
        <a href="/events/987654321/">Another gig</a>
        <a href="/example/about/">About</a>
        <a href="/events/calendar">Not an event id</a>
        <a>No href at all</a>
        <a href="https://l.facebook.com/events/555000111/">Tracked redirect</a>
    </body></html>"#;

    #[test]
    fn extracts_canonical_deduplicated_links() {
        assert_eq!(
            event_links_from_html(LISTING),
            [
                "https://www.facebook.com/events/123456789/",
                "https://www.facebook.com/events/987654321/",
                "https://www.facebook.com/events/555000111/",
            ]
        );
    }

    #[test]
    fn no_links_in_unrelated_page() {
        assert!(event_links_from_html("<p>nothing to see</p>").is_empty());
    }
}
