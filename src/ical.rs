use std::time::SystemTime;

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Event, EventLike, Property};
use regex::Regex;

use crate::event::{self, EventScheme};

/// Assemble the outgoing calendar.
pub fn calendar(events: impl IntoIterator<Item = Event>) -> Calendar {
    let mut cal = Calendar::new();
    cal.append_property(Property::new("METHOD", "REQUEST"));
    for event in events {
        cal.push(event);
    }
    cal
}

/// Convert one scraped event into a VEVENT. `stamp` is the server time of the
/// fetch that produced it; wall clock when the server sent none.
pub fn to_ical_event(scheme: &EventScheme, stamp: Option<SystemTime>) -> anyhow::Result<Event> {
    let start = event::parse_any(&scheme.start_date)
        .ok_or_else(|| anyhow::anyhow!("unparsable start date: {:?}", scheme.start_date))?;

    let mut ev = Event::new();
    ev.uid(&event_uid(&scheme.url)?)
        .summary(&scheme.name)
        .description(&scheme.description)
        .location(&join_location(scheme))
        .url(&scheme.url)
        .starts(start);
    if let Some(end) = event::parse_any(&scheme.end_date) {
        ev.ends(end);
    } else if !scheme.end_date.is_empty() {
        tracing::warn!(target: "ical", "unparsable end date: {:?}", scheme.end_date);
    }
    let stamp: DateTime<Utc> = stamp.map_or_else(Utc::now, Into::into);
    ev.timestamp(stamp);

    Ok(ev.done())
}

/// The event UID is the numeric id taken from the event URL.
fn event_uid(url: &str) -> anyhow::Result<String> {
    let reg_id = Regex::new(r"\d+").unwrap();
    reg_id
        .find(url)
        .map(|id| id.as_str().to_owned())
        .ok_or_else(|| anyhow::anyhow!("no event id in {url:?}"))
}

/// Join the non-empty location parts, most specific first.
fn join_location(scheme: &EventScheme) -> String {
    let address = &scheme.location.address;
    [
        scheme.location.name.as_str(),
        address.street_address.as_str(),
        address.address_locality.as_str(),
        address.postal_code.as_str(),
        address.address_country.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use crate::event::{Address, EventScheme, Location};

    use super::{calendar, event_uid, join_location, to_ical_event};

    fn scheme() -> EventScheme {
        EventScheme {
            name: "NoiseNight".to_owned(),
            description: "An evening of noise.".to_owned(),
            start_date: "2026-06-10T19:00:00+0100".to_owned(),
            end_date: "2026-06-10T23:00:00+0100".to_owned(),
            url: "https://www.facebook.com/events/123456789/".to_owned(),
            location: Location {
                name: "The Peer Hat".to_owned(),
                address: Address {
                    address_country: "United Kingdom".to_owned(),
                    address_locality: "Manchester".to_owned(),
                    postal_code: "M4 1LE".to_owned(),
                    street_address: "14-16 Faraday St".to_owned(),
                    ..Address::default()
                },
                ..Location::default()
            },
            ..EventScheme::default()
        }
    }

    #[test]
    fn event_serializes_with_uid_and_utc_times() {
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_750_000_000);
        let ev = to_ical_event(&scheme(), Some(stamp)).unwrap();
        let out = calendar([ev]).to_string();

        assert!(out.contains("METHOD:REQUEST"));
        assert!(out.contains("UID:123456789"));
        assert!(out.contains("SUMMARY:NoiseNight"));
        assert!(out.contains("DTSTART:20260610T180000Z"));
        assert!(out.contains("DTEND:20260610T220000Z"));
        assert!(out.contains("DTSTAMP:20250615T150640Z"));
        assert!(out.contains("LOCATION:"));
    }

    #[test]
    fn unparsable_start_fails_the_event() {
        let mut bad = scheme();
        bad.start_date = "whenever".to_owned();
        assert!(to_ical_event(&bad, None).is_err());
    }

    #[test]
    fn unparsable_end_is_dropped() {
        let mut partial = scheme();
        partial.end_date = "late".to_owned();
        let ev = to_ical_event(&partial, None).unwrap();
        let out = calendar([ev]).to_string();
        assert!(out.contains("DTSTART:"));
        assert!(!out.contains("DTEND:"));
    }

    #[test]
    fn uid_is_the_digits_run() {
        assert_eq!(
            event_uid("https://www.facebook.com/events/42/").unwrap(),
            "42"
        );
        assert!(event_uid("https://www.facebook.com/events/").is_err());
    }

    #[test]
    fn location_skips_empty_parts() {
        let mut sparse = scheme();
        sparse.location.address.street_address = String::new();
        sparse.location.address.postal_code = String::new();
        assert_eq!(
            join_location(&sparse),
            "The Peer Hat, Manchester, United Kingdom"
        );
    }

    #[test]
    fn location_of_online_event_is_empty() {
        let online = EventScheme::default();
        assert_eq!(join_location(&online), "");
    }
}
