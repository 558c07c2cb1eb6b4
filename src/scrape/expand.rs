use core::time::Duration;
use std::sync::Arc;

use headless_chrome::Tab;

use super::puppeteer;

/// The expander control at the bottom of the upcoming-events list.
pub const SEE_MORE: &str = r#"div[aria-label="See more"]"#;
/// Exact visible text of the heading that opens the past-events section.
pub const PAST_EVENTS: &str = "Past events";
/// Fixed delay between polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// One poll's view of the listing: viewport Y of the expander and of the
/// past-events heading, where present. Both are looked up fresh every poll;
/// the page re-renders freely, so element identity never survives a poll.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Survey {
    pub see_more: Option<f64>,
    pub past_events: Option<f64>,
}

impl Survey {
    /// Whether another click would still reveal upcoming events.
    ///
    /// No expander: nothing left to reveal. Expander but no heading: the past
    /// section has not scrolled in yet, keep going. Both visible: keep going
    /// only while the expander sits strictly above the heading.
    #[must_use]
    pub fn wants_more(self) -> bool {
        match (self.see_more, self.past_events) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(more), Some(past)) => more < past,
        }
    }
}

/// An events listing that can be surveyed and expanded. The browser
/// implementation is [`TabFeed`]; tests drive the loop with a scripted feed.
pub trait Feed {
    async fn survey(&self) -> anyhow::Result<Survey>;
    async fn reveal(&self) -> anyhow::Result<()>;
}

pub struct TabFeed {
    pub tab: Arc<Tab>,
}

impl Feed for TabFeed {
    async fn survey(&self) -> anyhow::Result<Survey> {
        Ok(Survey {
            see_more: puppeteer::locate_y(&self.tab, SEE_MORE).await?,
            past_events: puppeteer::locate_labeled_y(&self.tab, "span", PAST_EVENTS).await?,
        })
    }

    async fn reveal(&self) -> anyhow::Result<()> {
        if !puppeteer::click_first(&self.tab, SEE_MORE).await? {
            // A re-render can drop the expander between the survey and the
            // click; the next poll observes that and stops.
            tracing::warn!(target: "expand", "expander vanished before the click");
        }
        Ok(())
    }
}

/// Click "See more" until the past-events heading sits at or above the
/// expander, polling every [`POLL_INTERVAL`]. Resolves exactly once, with the
/// number of clicks performed.
pub async fn expand<F: Feed>(feed: &F) -> anyhow::Result<u32> {
    let mut clicks = 0u32;
    loop {
        let survey = feed.survey().await?;
        if !survey.wants_more() {
            tracing::info!(target: "expand", "\x1b[36mlisting expanded after {clicks} clicks\x1b[0m");
            return Ok(clicks);
        }
        feed.reveal().await?;
        clicks += 1;
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
