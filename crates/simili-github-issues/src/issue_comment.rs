pub const HTML_COMMENT_PREFIX: &str = "<!--";
pub const HTML_COMMENT_SUFFIX: &str = "-->";

/// Sentinel embedded in every triage report comment.
pub const TRIAGE_REPORT_MARKER: &str = "<!-- simili-bot-report -->";
pub const TRIAGE_REPORT_TOKEN: &str = "simili-bot-report";
/// Title line rendered at the top of triage reports.
pub const TRIAGE_REPORT_TITLE: &str = "🤖 Simili Triage Report";
/// Heading text used by plain-text triage reports.
pub const TRIAGE_REPORT_HEADING: &str = "Simili Triage Report";

/// Sentinel embedded in auto-close notices. Not a triage report.
pub const AUTO_CLOSE_MARKER: &str = "<!-- simili-bot-auto-close -->";
pub const AUTO_CLOSE_TITLE: &str = "🤖 Simili Auto-Close";

/// Return the trimmed inner text of every complete HTML comment in `body`.
pub fn html_comment_tokens(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut cursor = body;
    while let Some(start) = cursor.find(HTML_COMMENT_PREFIX) {
        let after_start = &cursor[start + HTML_COMMENT_PREFIX.len()..];
        let Some(end) = after_start.find(HTML_COMMENT_SUFFIX) else {
            break;
        };
        tokens.push(after_start[..end].trim());
        cursor = &after_start[end + HTML_COMMENT_SUFFIX.len()..];
    }
    tokens
}

/// The emoji title may stand alone or as a heading; the bare heading text
/// only counts as a heading. Nothing may follow either.
fn is_triage_title_line(line: &str) -> bool {
    let trimmed = line.trim();
    let text = trimmed.trim_start_matches('#').trim();
    text == TRIAGE_REPORT_TITLE || (trimmed.starts_with('#') && text == TRIAGE_REPORT_HEADING)
}

/// Return true when `body` is a triage report posted by Simili.
///
/// Markers are matched as whole tokens: the auto-close sentinel and title
/// share a prefix with the triage markers but are never reports.
pub fn is_triage_report(body: &str) -> bool {
    if html_comment_tokens(body)
        .into_iter()
        .any(|token| token == TRIAGE_REPORT_TOKEN)
    {
        return true;
    }
    body.lines().any(is_triage_title_line)
}

/// Render the notice posted right before an issue is auto-closed.
pub fn render_auto_close_notice(triage_label: &str, grace_period: &str) -> String {
    format!(
        "{AUTO_CLOSE_MARKER}\n## {AUTO_CLOSE_TITLE}\n\nThis issue was labeled `{}` and saw no human activity during the {} grace period, so it is being closed as a duplicate.\n\nIf this is not a duplicate, reopen the issue or leave a comment and it will be kept open.",
        triage_label.trim(),
        grace_period.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        html_comment_tokens, is_triage_report, render_auto_close_notice, AUTO_CLOSE_MARKER,
        TRIAGE_REPORT_MARKER, TRIAGE_REPORT_TITLE,
    };

    #[test]
    fn unit_html_comment_tokens_extracts_complete_comments_only() {
        let body = "<!-- one -->text<!--two-->tail <!-- unterminated";
        assert_eq!(html_comment_tokens(body), vec!["one", "two"]);
    }

    #[test]
    fn unit_is_triage_report_matches_sentinel_title_and_heading() {
        assert!(is_triage_report(&format!(
            "{TRIAGE_REPORT_MARKER}\nSimilar threads..."
        )));
        assert!(is_triage_report(&format!(
            "## {TRIAGE_REPORT_TITLE}\n\n| # | score |"
        )));
        assert!(is_triage_report("intro\n### Simili Triage Report\nbody"));
        assert!(is_triage_report(&format!("  {TRIAGE_REPORT_TITLE}  \nbody")));
        assert!(is_triage_report("<!--   simili-bot-report   -->"));
    }

    #[test]
    fn functional_is_triage_report_rejects_auto_close_notice() {
        let notice = render_auto_close_notice("potential-duplicate", "72 hours");
        assert!(notice.starts_with(AUTO_CLOSE_MARKER));
        assert!(!is_triage_report(&notice));
    }

    #[test]
    fn regression_is_triage_report_rejects_near_miss_markers() {
        assert!(!is_triage_report("<!-- simili-bot-auto-close -->"));
        assert!(!is_triage_report("<!-- simili-bot-report-closed -->"));
        assert!(!is_triage_report("<!-- simili-bot -->"));
        assert!(!is_triage_report("## Simili Triage Report archive"));
        assert!(!is_triage_report("Simili Triage Report mentioned inline"));
        assert!(!is_triage_report(&format!("## {TRIAGE_REPORT_TITLE} archive")));
        assert!(!is_triage_report(&format!(
            "I disagree with the {TRIAGE_REPORT_TITLE}er here"
        )));
        assert!(!is_triage_report(&format!("see the {TRIAGE_REPORT_TITLE}")));
        assert!(!is_triage_report("I agree this looks like a duplicate."));
    }

    #[test]
    fn unit_render_auto_close_notice_mentions_label_and_grace_period() {
        let notice = render_auto_close_notice("  potential-duplicate ", "5 minutes");
        assert!(notice.contains("`potential-duplicate`"));
        assert!(notice.contains("5 minutes grace period"));
    }
}
