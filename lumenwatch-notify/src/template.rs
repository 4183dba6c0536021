//! Fixed message templates.
//!
//! Each template renders an HTML and a plain-text body from the same data.
//! Rendering is deterministic: the same inputs always give the same message.

use chrono::{DateTime, Utc};

use lumenwatch_types::{CrossingEvent, RecoveryEvent};

use crate::MailMessage;

pub const CROSSING_SUBJECT: &str = "Light Level Alert - Low Light Detected";
pub const RECOVERY_SUBJECT: &str = "Light Level Recovered";
pub const DIAGNOSTIC_SUBJECT: &str = "Test Email - IoT Smart Home System";

const FOOTER: &str = "Automated alert from IoT Smart Home system.";

/// Format Unix milliseconds as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} ms", timestamp_ms))
}

/// Render the low-light alert for a crossing.
pub fn crossing(event: &CrossingEvent, from: &str, to: &str) -> MailMessage {
    let time = format_timestamp(event.timestamp_ms);

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
  <h2 style="color: #FF6B6B;">Light Level Alert</h2>
  <p>The light level has dropped below the threshold!</p>
  <div style="background-color: #F8F9FA; padding: 20px;">
    <h3>Sensor Details:</h3>
    <p><strong>Current Light Level:</strong> <span style="color: #FF6B6B;">{current}</span></p>
    <p><strong>Previous Light Level:</strong> {previous}</p>
    <p><strong>Threshold:</strong> {threshold}</p>
    <p><strong>Alert Time:</strong> {time}</p>
  </div>
  <p style="color: #666;">{footer}</p>
</div>
"#,
        current = event.new_value,
        previous = event.previous_value,
        threshold = event.threshold,
        time = escape_html(&time),
        footer = FOOTER,
    );

    let text = format!(
        "Light Level Alert\n\n\
         The light level has dropped below the threshold!\n\n\
         Current Light Level: {current}\n\
         Previous Light Level: {previous}\n\
         Threshold: {threshold}\n\
         Alert Time: {time}\n\n\
         {footer}\n",
        current = event.new_value,
        previous = event.previous_value,
        threshold = event.threshold,
        time = time,
        footer = FOOTER,
    );

    MailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: CROSSING_SUBJECT.to_string(),
        html,
        text,
    }
}

/// Render the notice sent when the level returns to or above the threshold.
pub fn recovery(event: &RecoveryEvent, from: &str, to: &str) -> MailMessage {
    let time = format_timestamp(event.timestamp_ms);

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
  <h2 style="color: #27AE60;">Light Level Recovered</h2>
  <p>The light level is back at or above the threshold.</p>
  <div style="background-color: #F8F9FA; padding: 20px;">
    <p><strong>Current Light Level:</strong> {current}</p>
    <p><strong>Previous Light Level:</strong> {previous}</p>
    <p><strong>Threshold:</strong> {threshold}</p>
    <p><strong>Recovery Time:</strong> {time}</p>
  </div>
  <p style="color: #666;">{footer}</p>
</div>
"#,
        current = event.new_value,
        previous = event.previous_value,
        threshold = event.threshold,
        time = escape_html(&time),
        footer = FOOTER,
    );

    let text = format!(
        "Light Level Recovered\n\n\
         The light level is back at or above the threshold.\n\n\
         Current Light Level: {current}\n\
         Previous Light Level: {previous}\n\
         Threshold: {threshold}\n\
         Recovery Time: {time}\n\n\
         {footer}\n",
        current = event.new_value,
        previous = event.previous_value,
        threshold = event.threshold,
        time = time,
        footer = FOOTER,
    );

    MailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: RECOVERY_SUBJECT.to_string(),
        html,
        text,
    }
}

/// Render the self-test message.
pub fn diagnostic(timestamp_ms: u64, threshold: f64, from: &str, to: &str) -> MailMessage {
    let time = format_timestamp(timestamp_ms);

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; padding: 20px; border: 2px solid #4CAF50; border-radius: 8px;">
  <h2 style="color: #4CAF50;">Test Email Successful!</h2>
  <p>This is a test email from your IoT Smart Home alerting service.</p>
  <div style="background-color: #F8F9FA; padding: 15px; border-radius: 5px; margin: 15px 0;">
    <p><strong>Timestamp:</strong> {time}</p>
    <p><strong>From:</strong> {from}</p>
    <p><strong>To:</strong> {to}</p>
  </div>
  <p style="color: #666; font-size: 0.9em;">If you received this email, your email notification system is working correctly!</p>
  <p style="color: #666; font-size: 0.9em;">Your IoT Smart Home system will send alerts when the light sensor value drops below {threshold}.</p>
</div>
"#,
        time = escape_html(&time),
        from = escape_html(from),
        to = escape_html(to),
        threshold = threshold,
    );

    let text = format!(
        "Test Email - IoT Smart Home System\n\n\
         This is a test email from your IoT Smart Home alerting service.\n\n\
         Timestamp: {time}\n\
         From: {from}\n\
         To: {to}\n\n\
         If you received this email, your email notification system\n\
         is working correctly!\n\n\
         Your IoT Smart Home system will send alerts when the light\n\
         sensor value drops below {threshold}.\n",
        time = time,
        from = from,
        to = to,
        threshold = threshold,
    );

    MailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: DIAGNOSTIC_SUBJECT.to_string(),
        html,
        text,
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
