use scraper::{Html, Selector};

/// Get the headline of the alert swapped into the alert container.
#[track_caller]
pub(crate) fn must_get_alert_message(html: &Html) -> String {
    html.select(&Selector::parse("div[role=alert] p").unwrap())
        .next()
        .expect("No alert found")
        .text()
        .collect::<String>()
        .trim()
        .to_owned()
}

#[track_caller]
pub(crate) fn assert_alert_message(html: &Html, want_message: &str) {
    let got_message = must_get_alert_message(html);

    assert_eq!(
        got_message, want_message,
        "want alert \"{want_message}\", got \"{got_message}\""
    );
}
