use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use serde::Deserialize;

/// The key parts a Facebook json+ld event includes.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventScheme {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub schema_type: String,
    pub description: String,
    pub end_date: String,
    pub event_attendance_mode: String,
    pub image: String,
    pub location: Location,
    pub name: String,
    pub performers: Vec<serde_json::Value>,
    pub start_date: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "@type")]
    pub schema_type: String,
    pub address: Address,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "@type")]
    pub schema_type: String,
    pub address_country: String,
    pub address_locality: String,
    pub postal_code: String,
    pub street_address: String,
}

/// Every ld+json event embedded in a page. A script block may hold one object
/// or an array of them, and legacy pages wrap the JSON in CDATA markers;
/// blocks that do not decode are logged and skipped.
#[must_use]
pub fn events_from_html(html: &str) -> Vec<EventScheme> {
    let sel_ld = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

    let document = Html::parse_document(html);
    let mut events = Vec::new();
    for script in document.select(&sel_ld) {
        let text = script.text().collect::<String>();
        let text = text.trim();
        let text = text.strip_prefix("//<![CDATA[").unwrap_or(text);
        let text = text
            .strip_suffix("//]]>")
            .or_else(|| text.strip_suffix("//]]"))
            .unwrap_or(text);

        match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(serde_json::Value::Array(items)) => {
                for item in items {
                    push_event(&mut events, item);
                }
            }
            Ok(value) => push_event(&mut events, value),
            Err(e) => tracing::warn!(target: "event", "ld+json block is not JSON: {e}"),
        }
    }

    events
}

fn push_event(events: &mut Vec<EventScheme>, value: serde_json::Value) {
    match serde_json::from_value(value) {
        Ok(event) => events.push(event),
        Err(e) => tracing::warn!(target: "event", "ld+json entry is not an event: {e}"),
    }
}

/// Forgiving parse for the date shapes Facebook emits: RFC 3339, offsets
/// without a colon, minute precision, naive timestamps, bare dates.
#[must_use]
pub fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%#z", "%Y-%m-%dT%H:%M%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
