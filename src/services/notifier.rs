// src/services/notifier.rs

//! Notification message composition.
//!
//! One digest message per user per pass, summarizing every site that
//! changed. The transport that actually delivers the message lives in
//! `crate::mail`.

use crate::mail::EmailMessage;
use crate::models::{Site, User};

/// Compose the digest message for a user's changed sites.
///
/// Callers only invoke this with a non-empty batch; an empty batch
/// means no notification at all.
pub fn compose(user: &User, changed: &[Site]) -> EmailMessage {
    let subject = format!("{} Updated", joined_names(changed));

    let mut plain_body = format!(
        "Dear {},\nAn update was recently made to {}.\n",
        user.name,
        update_phrase(changed)
    );
    let mut html_body = format!(
        "<h2>{}</h2>Dear {},<br>An update was recently made to {}.\n",
        subject,
        user.name,
        update_phrase_html(changed)
    );

    html_body.push_str("<ul>");
    for site in changed {
        plain_body.push_str(&format!("    {} - {}\n", site.name, site.url));
        html_body.push_str(&format!("<li><a href=\"{}\">{}</a></li>", site.url, site.name));
    }
    html_body.push_str("</ul>");

    plain_body.push_str("-------\nTo unsubscribe from these notifications, click here.\n");
    html_body.push_str(
        "<hr><small>To unsubscribe from these notifications, click <a href=\"#\">here</a>.</small>",
    );

    EmailMessage {
        subject,
        plain_body,
        html_body,
    }
}

/// Comma-joined site names, in batch order.
fn joined_names(sites: &[Site]) -> String {
    sites
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary phrase for the plain-text body: name the site when exactly
/// one changed, stay generic otherwise.
fn update_phrase(sites: &[Site]) -> String {
    match sites {
        [only] => format!("the {} website", only.name),
        _ => "a few of the sites you're subscribed to".to_string(),
    }
}

/// Summary phrase for the HTML body; the single-site form links to it.
fn update_phrase_html(sites: &[Site]) -> String {
    match sites {
        [only] => format!("the <a href=\"{}\">{}</a> website", only.url, only.name),
        _ => "a few of the sites you're subscribed to".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            name: "Erin".to_string(),
            email: "erin@example.com".to_string(),
        }
    }

    fn site(id: i64, name: &str) -> Site {
        Site {
            id,
            user_id: 1,
            name: name.to_string(),
            url: format!("https://{}.example.com/", name.to_lowercase()),
            selector: String::new(),
        }
    }

    #[test]
    fn test_subject_joins_site_names() {
        let message = compose(&user(), &[site(1, "B"), site(2, "C")]);
        assert_eq!(message.subject, "B, C Updated");
    }

    #[test]
    fn test_single_site_phrasing_names_the_site() {
        let message = compose(&user(), &[site(1, "Example")]);
        assert!(message.plain_body.contains("the Example website"));
        assert!(
            message
                .html_body
                .contains("the <a href=\"https://example.example.com/\">Example</a> website")
        );
    }

    #[test]
    fn test_multi_site_phrasing_is_generic() {
        let message = compose(&user(), &[site(1, "A"), site(2, "B")]);
        assert!(
            message
                .plain_body
                .contains("a few of the sites you're subscribed to")
        );
        assert!(!message.plain_body.contains("the A website"));
    }

    #[test]
    fn test_body_lists_every_changed_site() {
        let message = compose(&user(), &[site(1, "A"), site(2, "B")]);

        assert!(message.plain_body.contains("A - https://a.example.com/"));
        assert!(message.plain_body.contains("B - https://b.example.com/"));
        assert!(
            message
                .html_body
                .contains("<li><a href=\"https://a.example.com/\">A</a></li>")
        );
        assert!(
            message
                .html_body
                .contains("<li><a href=\"https://b.example.com/\">B</a></li>")
        );
    }

    #[test]
    fn test_greeting_and_unsubscribe_notice() {
        let message = compose(&user(), &[site(1, "A")]);
        assert!(message.plain_body.starts_with("Dear Erin,"));
        assert!(message.plain_body.contains("To unsubscribe"));
        assert!(message.html_body.contains("To unsubscribe"));
    }
}
