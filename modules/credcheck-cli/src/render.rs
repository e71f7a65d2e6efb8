//! Plain-text rendering of session snapshots and history listings.

use std::fmt::Write as _;

use credcheck_common::{HealthReport, HistoryResponse, RecentCheck, MAX_DISPLAY_KEYWORDS};
use credcheck_engine::{Phase, ScoreAvailability, SessionState, SimilarAvailability};

pub fn credibility_label(score: f64) -> &'static str {
    if score >= 80.0 {
        "Highly Credible"
    } else if score >= 60.0 {
        "Moderately Credible"
    } else if score >= 40.0 {
        "Low Credibility"
    } else {
        "Not Credible"
    }
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Initializing => "Starting analysis",
        Phase::Fetching => "Fetching article",
        Phase::Processing => "Analyzing article",
        Phase::Completed => "Analysis complete",
        Phase::Error => "Analysis failed",
    }
}

/// One status line for the live progress view.
pub fn progress_line(state: &SessionState) -> String {
    let mut line = format!("[{}]", phase_label(state.phase));

    if matches!(state.phase, Phase::Fetching | Phase::Processing) && state.primary.retry_count > 0
    {
        let _ = write!(line, " attempt {}", state.primary.retry_count + 1);
    }
    if let Some(notice) = &state.primary.notice {
        let _ = write!(line, " {notice}");
    }
    if state.phase == Phase::Completed {
        let score = match state.score.availability() {
            ScoreAvailability::Pending => "pending",
            ScoreAvailability::Provisional => "provisional",
            ScoreAvailability::Final => "ready",
            ScoreAvailability::NotAvailable => "not available",
            ScoreAvailability::Failed => "failed",
        };
        let similar = match state.similar.availability() {
            SimilarAvailability::Pending => "pending",
            SimilarAvailability::Searching => "searching",
            SimilarAvailability::Found => "found",
            SimilarAvailability::NoneFound => "none found",
            SimilarAvailability::Failed => "failed",
        };
        let _ = write!(line, " score: {score}, similar news: {similar}");
    }
    line
}

/// Full report for a settled session.
pub fn report(state: &SessionState) -> String {
    let mut out = String::new();
    let fields = &state.primary.fields;

    let _ = writeln!(out, "{}", phase_label(state.phase));
    if !state.url.is_empty() {
        let _ = writeln!(out, "URL:        {}", state.url);
    }
    if let Some(uid) = &state.uid {
        let _ = writeln!(out, "Analysis:   {uid}");
    }
    if let Some(error) = &state.primary.error {
        let _ = writeln!(out, "Error:      {} ({})", error.message, error.kind.as_str());
    }
    if let Some(title) = &fields.title {
        let _ = writeln!(out, "\n{title}");
    }
    if let Some(summary) = &fields.summary {
        let _ = writeln!(out, "\n{summary}");
    }
    if let Some(keywords) = fields.keywords.as_ref().filter(|k| !k.is_empty()) {
        let shown: Vec<&str> = keywords
            .iter()
            .take(MAX_DISPLAY_KEYWORDS)
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "\nKeywords:   {}", shown.join(", "));
    }
    if let Some(url) = &fields.screenshot_url {
        let _ = writeln!(out, "Screenshot: {url}");
    }

    if state.phase == Phase::Completed {
        let _ = writeln!(out, "\n{}", score_section(state));
        let _ = write!(out, "\n{}", similar_section(state));
    }
    out
}

fn score_section(state: &SessionState) -> String {
    let slice = &state.score;
    let mut out = match (slice.availability(), slice.score) {
        (ScoreAvailability::Final, Some(score)) => {
            format!("Score:      {score:.0}/100 {}", credibility_label(score))
        }
        (ScoreAvailability::Provisional, Some(score)) => {
            format!("Score:      {score:.0}/100 {} (provisional)", credibility_label(score))
        }
        (ScoreAvailability::Failed, _) => format!(
            "Score:      failed: {}",
            slice.error.as_deref().unwrap_or("unknown error")
        ),
        (ScoreAvailability::NotAvailable, _) => "Score:      not available".to_string(),
        _ => "Score:      pending".to_string(),
    };
    if let Some(explanation) = &slice.explanation {
        let _ = write!(out, "\n            {explanation}");
    }
    if let Some(notice) = &slice.notice {
        let _ = write!(out, "\n            {notice}");
    }
    out
}

fn similar_section(state: &SessionState) -> String {
    let slice = &state.similar;
    match slice.availability() {
        SimilarAvailability::Found => {
            let mut out = String::from("Similar news:\n");
            for article in &slice.articles {
                let title = if article.title.is_empty() {
                    &article.target_url
                } else {
                    &article.title
                };
                let _ = writeln!(out, "  - {title}\n    {}", article.target_url);
            }
            out
        }
        SimilarAvailability::NoneFound => format!(
            "Similar news: {}\n",
            slice
                .notice
                .as_deref()
                .unwrap_or("No similar news found for this article")
        ),
        SimilarAvailability::Failed => format!(
            "Similar news: failed: {}\n",
            slice.error.as_deref().unwrap_or("unknown error")
        ),
        SimilarAvailability::Pending | SimilarAvailability::Searching => {
            "Similar news: searching\n".to_string()
        }
    }
}

pub fn recent_checks(checks: &[RecentCheck]) -> String {
    if checks.is_empty() {
        return "No recent checks.\n".to_string();
    }
    let mut out = String::new();
    for check in checks {
        let _ = writeln!(
            out,
            "{}  {:<10} {}  {}",
            check.timestamp.format("%Y-%m-%d %H:%M"),
            check.status,
            check.uid,
            check.url
        );
    }
    out
}

pub fn remote_history(page: &HistoryResponse) -> String {
    let mut out = String::new();
    if let Some(message) = &page.message {
        let _ = writeln!(out, "{message}");
    }
    for item in &page.history {
        let _ = writeln!(out, "{}  {}  {}", item.create_date, item.uid, item.title);
    }
    if page.history.is_empty() && page.message.is_none() {
        out.push_str("No analysis history.\n");
    } else if !page.history.is_empty() {
        let _ = writeln!(out, "({} page(s))", page.total_pages);
    }
    out
}

pub fn health(report: &HealthReport) -> String {
    let probe = |p: &credcheck_common::EndpointProbe| {
        let mut s = p.status.clone();
        if let Some(code) = p.status_code {
            let _ = write!(s, " ({code})");
        }
        if let Some(note) = &p.note {
            let _ = write!(s, " {note}");
        }
        s
    };
    format!(
        "Proxy:      {}\nBackend:    {} {}\nSubmission: {} {}\nChecked at: {}\n",
        report.proxy,
        report.base_url,
        probe(&report.backend_base),
        report.add_target_endpoint,
        probe(&report.backend_add_target),
        report.timestamp.to_rfc3339(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use credcheck_engine::SimilarArticle;

    fn completed() -> SessionState {
        let mut state = SessionState::new(Some("abc123".into()), "https://news.example/a");
        state.phase = Phase::Completed;
        state.primary.fields.title = Some("Headline".into());
        state.primary.fields.keywords = Some((1..=15).map(|i| format!("k{i}")).collect());
        state
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(credibility_label(95.0), "Highly Credible");
        assert_eq!(credibility_label(80.0), "Highly Credible");
        assert_eq!(credibility_label(79.9), "Moderately Credible");
        assert_eq!(credibility_label(40.0), "Low Credibility");
        assert_eq!(credibility_label(12.0), "Not Credible");
    }

    #[test]
    fn report_caps_keywords() {
        let text = report(&completed());
        assert!(text.contains("k12"));
        assert!(!text.contains("k13"));
    }

    #[test]
    fn report_shows_score_and_similar() {
        let mut state = completed();
        state.score.score = Some(72.0);
        state.score.status = Some(200);
        state.score.done = true;
        state.similar.done = true;
        state.similar.articles = vec![SimilarArticle {
            target_url: "https://other.example/b".into(),
            title: "Other story".into(),
        }];

        let text = report(&state);
        assert!(text.contains("72/100 Moderately Credible"));
        assert!(text.contains("  - Other story"));
    }

    #[test]
    fn provisional_score_is_marked() {
        let mut state = completed();
        state.score.score = Some(85.0);
        state.score.status = Some(300);
        assert!(report(&state).contains("(provisional)"));
    }

    #[test]
    fn progress_line_counts_attempts() {
        let mut state = SessionState::new(Some("abc".into()), "");
        state.phase = Phase::Processing;
        state.primary.retry_count = 2;
        assert_eq!(progress_line(&state), "[Analyzing article] attempt 3");
    }

    #[test]
    fn empty_recent_list() {
        assert_eq!(recent_checks(&[]), "No recent checks.\n");
    }
}
