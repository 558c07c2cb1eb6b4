use std::time::SystemTime;

use reqwest::{Client, StatusCode, Url, header::DATE};

const CONSENT_URL: &str =
    "https://mbasic.facebook.com/cookie/consent/?next_uri=https%3A%2F%2Fmbasic.facebook.com%2F";

/// Client for the lightweight mbasic frontend, which still serves event pages
/// as plain HTML with an embedded ld+json block. Holds the consent cookies.
pub struct MBasic {
    client: Client,
}

impl MBasic {
    /// Build the client and accept the essential-cookies consent form once;
    /// the session cookies live in the client's store from then on.
    pub async fn connect() -> anyhow::Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(const { core::time::Duration::from_secs(8) })
            .build()?;

        client
            .post(CONSENT_URL)
            .form(&[("accept_only_essential", "1")])
            .send()
            .await?;
        log::debug!(target: "mbasic", "cookie consent accepted");

        Ok(Self { client })
    }

    /// Fetch one event page through mbasic. Returns the body and the server
    /// date when the response carries one.
    pub async fn get(&self, url: &str) -> anyhow::Result<(String, Option<SystemTime>)> {
        let mut url = Url::parse(url)?;
        if url.set_host(Some("mbasic.facebook.com")).is_err() {
            anyhow::bail!("cannot rewrite host of {url}");
        }

        let res = self.client.get(url.clone()).send().await?;
        if res.status() != StatusCode::OK {
            anyhow::bail!("status code error: {} for {url}", res.status());
        }

        let date = res
            .headers()
            .get(DATE)
            .and_then(|s| s.to_str().ok())
            .and_then(|s| httpdate::parse_http_date(s).ok());
        let body = res.text().await?;
        log::debug!(target: "mbasic", "{url}: {} bytes", body.len());

        Ok((body, date))
    }
}
