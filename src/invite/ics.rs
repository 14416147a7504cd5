use chrono::{DateTime, Utc};

/// One calendar event ready to be attached to an invite notification.
#[derive(Debug, Clone)]
pub struct CalendarInvite {
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub organizer_name: String,
    pub organizer_address: String,
    pub attendees: Vec<String>,
    /// The meeting join URL.
    pub location: String,
    pub uid: String,
}

impl CalendarInvite {
    /// Render as an iCalendar (RFC 5545) document with CRLF line endings.
    pub fn to_ics(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push("BEGIN:VCALENDAR".to_string());
        lines.push("PRODID:-//incident-meetings//EN".to_string());
        lines.push("VERSION:2.0".to_string());
        lines.push("METHOD:REQUEST".to_string());
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", self.uid));
        lines.push(format!("DTSTAMP:{}", format_utc(Utc::now())));
        lines.push(format!("DTSTART:{}", format_utc(self.start)));
        lines.push(format!("DTEND:{}", format_utc(self.end)));
        lines.push(format!("SUMMARY:{}", escape_text(&self.subject)));
        lines.push(format!("LOCATION:{}", escape_text(&self.location)));
        lines.push(format!(
            "ORGANIZER;CN={};ROLE=CHAIR:mailto:{}",
            escape_param(&self.organizer_name),
            self.organizer_address
        ));
        for attendee in &self.attendees {
            lines.push(format!(
                "ATTENDEE;CN={cn};ROLE=REQ-PARTICIPANT;PARTSTAT=NEEDS-ACTION:mailto:{addr}",
                cn = escape_param(attendee),
                addr = attendee
            ));
        }
        lines.push("END:VEVENT".to_string());
        lines.push("END:VCALENDAR".to_string());

        let mut out = lines.join("\r\n");
        out.push_str("\r\n");
        out
    }
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// TEXT value escaping per RFC 5545 3.3.11.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Parameter values cannot carry escapes; strip the structural characters.
fn escape_param(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | ',' | ':' | '"' | '\n' | '\r'))
        .collect()
}
