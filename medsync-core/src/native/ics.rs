//! ICS generation for native events.

use chrono::{DateTime, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Trigger};

use crate::native::NativeEventRequest;

/// Generate .ics content for a native event.
pub fn generate_ics(native_id: &str, request: &NativeEventRequest, stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(native_id);
    ics_event.summary(&request.title);
    ics_event.add_property("DTSTAMP", stamp.format("%Y%m%dT%H%M%SZ").to_string());
    ics_event.starts(request.start);
    ics_event.ends(request.end);

    if !request.description.is_empty() {
        ics_event.description(&request.description);
    }

    if let Some(ref loc) = request.location {
        ics_event.location(loc);
    }

    // RFC 7986 COLOR
    if let Some(ref color) = request.color {
        ics_event.add_property("COLOR", color);
    }

    for minutes in &request.alerts {
        let trigger = Trigger::before_start(chrono::Duration::minutes(*minutes));
        ics_event.alarm(Alarm::display(&request.title, trigger));
    }

    cal.push(ics_event.done());
    let cal = cal.done();

    normalize_output(&cal.to_string())
}

const PRODUCT_ID: &str = concat!(
    "PRODID:-//medsync//medsync-core ",
    env!("CARGO_PKG_VERSION"),
    "//FR"
);

/// Normalize the icalendar crate's output: our own product id, no default
/// calendar scale, and alarms without a stamp or uid of their own.
fn normalize_output(ics: &str) -> String {
    let mut alarm_depth = 0usize;

    let kept = ics.lines().filter_map(|line| {
        match line {
            "BEGIN:VALARM" => alarm_depth += 1,
            "END:VALARM" => alarm_depth = alarm_depth.saturating_sub(1),
            "CALSCALE:GREGORIAN" => return None,
            _ if line.starts_with("PRODID:") => return Some(PRODUCT_ID),
            _ if alarm_depth > 0 && is_alarm_noise(line) => return None,
            _ => {}
        }
        Some(line)
    });

    kept.fold(String::with_capacity(ics.len()), |mut out, line| {
        out.push_str(line);
        out.push_str("\r\n");
        out
    })
}

fn is_alarm_noise(line: &str) -> bool {
    ["DTSTAMP:", "UID:"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(alerts: Vec<i64>) -> NativeEventRequest {
        NativeEventRequest {
            title: "Visite pharmacie - Centrale".to_string(),
            description: "Visite #2".to_string(),
            start: Utc.with_ymd_and_hms(2025, 11, 20, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 11, 20, 10, 0, 0).unwrap(),
            calendar_id: "medsync".to_string(),
            location: Some("Place du marché".to_string()),
            color: Some("#06B6D4".to_string()),
            alerts,
        }
    }

    #[test]
    fn test_one_valarm_per_alert() {
        let stamp = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let ics = generate_ics("abc-123", &request(vec![1440, 60]), stamp);

        assert_eq!(ics.matches("BEGIN:VALARM").count(), 2);
        assert!(ics.contains("UID:abc-123"));
        assert!(ics.contains("COLOR:#06B6D4"));
        assert!(ics.contains("DTSTART:20251120T090000Z"));
        assert!(ics.contains("PRODID:-//medsync//medsync-core "));
        assert!(!ics.contains("CALSCALE"));
        // Alarms keep no stamp of their own: only the event's DTSTAMP remains
        assert_eq!(ics.matches("DTSTAMP:").count(), 1);
        assert_eq!(ics.matches("UID:").count(), 1);
    }

    #[test]
    fn test_no_alarms_without_alerts() {
        let stamp = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let ics = generate_ics("abc-123", &request(vec![]), stamp);

        assert!(!ics.contains("VALARM"));
        assert!(ics.contains("LOCATION:Place du marché"));
    }
}
