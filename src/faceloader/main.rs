use std::path::PathBuf;

use compact_str::CompactString;
use fldr::{config::Config, event, ical, mbasic::MBasic, scrape};

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Config file (default: ./.faceloader.json, then ~/.faceloader.json).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// URL of the page's events listing.
    #[arg(long, env = "FACELOADER_PAGE")]
    page: Option<String>,
    /// Chrome binary to launch.
    #[arg(long, env = "FACELOADER_CHROME")]
    chrome: Option<PathBuf>,
    #[arg(long, env = "FACELOADER_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "FACELOADER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Keep the browser visible.
    #[arg(long)]
    debug: bool,
    /// Write the calendar here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn merge(args: &Args, mut config: Config) -> Config {
    if let Some(page) = &args.page {
        config.facebook_page.clone_from(page);
    }
    if let Some(chrome) = &args.chrome {
        config.chrome_path = Some(chrome.clone());
    }
    if let Some(username) = &args.username {
        config.username.clone_from(username);
    }
    if let Some(password) = &args.password {
        config.password.clone_from(password);
    }
    config.debug |= args.debug;
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    let config = merge(&args, Config::load(args.config.as_deref())?);
    if config.facebook_page.is_empty() {
        anyhow::bail!("no events page configured; pass --page or set FacebookPage in .faceloader.json");
    }

    let browser = scrape::puppeteer::puppeteer(config.headless(), config.chrome_path.clone())?;
    let tab = scrape::puppeteer::first_tab(&browser)?;

    if let Err(e) = scrape::maybe_login(&tab, &config.username, &config.password).await {
        tracing::warn!(target: "main", "login failed, continuing logged out: {e:?}");
    }

    let links = scrape::get_event_links(&tab, &config.facebook_page).await?;
    tracing::info!(
        target: "main",
        "\x1b[36m{} event links on {}\x1b[0m",
        links.len(),
        config.facebook_page,
    );
    drop(tab);
    drop(browser);

    let client = MBasic::connect().await?;
    let futs = links.iter().map(|link| fetch_event(&client, link));
    let events = futures_util::future::join_all(futs).await;

    let calendar = ical::calendar(events.into_iter().flatten());
    match args.output {
        Some(path) => std::fs::write(&path, calendar.to_string())?,
        None => print!("{calendar}"),
    }

    Ok(())
}

async fn fetch_event(client: &MBasic, link: &CompactString) -> Option<icalendar::Event> {
    let (html, date) = match client.get(link).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(target: "main", "{link}: fetch failed: {e:?}");
            return None;
        }
    };

    let Some(scheme) = event::events_from_html(&html).into_iter().next() else {
        tracing::warn!(target: "main", "{link}: no ld+json event found");
        return None;
    };

    match ical::to_ical_event(&scheme, date) {
        Ok(ev) => Some(ev),
        Err(e) => {
            tracing::warn!(target: "main", "{link}: {e}");
            None
        }
    }
}
