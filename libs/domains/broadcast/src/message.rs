//! Daily message content.

use chrono::NaiveDate;
use domain_subscribers::Recipient;

const SUBJECT: &str = "Sua mensagem diária";
const GREETING: &str = "Olá";
const BODY: &str = "Esta é sua mensagem diária. Tenha um excelente dia!";

/// Subject and bodies for one recipient. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Render the daily message for `recipient`.
///
/// `date` is the only time-varying input; callers pass "today" in the
/// schedule's timezone so the output is a pure function of its arguments.
pub fn build_message(recipient: &Recipient, date: NaiveDate) -> RenderedMessage {
    let name = recipient.name.trim();
    let stamp = date.format("%d/%m/%Y");

    let (text_greeting, html_greeting) = if name.is_empty() {
        (format!("{GREETING},"), format!("{GREETING},"))
    } else {
        (
            format!("{GREETING} {name},"),
            format!("{GREETING} {},", escape_html(name)),
        )
    };

    RenderedMessage {
        subject: format!("{SUBJECT} ({stamp})"),
        text_body: format!("{text_greeting}\n\n{BODY}\n\n{stamp}"),
        html_body: format!("<p>{html_greeting}</p><p>{BODY}</p><p><small>{stamp}</small></p>"),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
