use terravet_harness::ScenarioReport;

/// Render a scenario report as human-readable text.
pub fn render_report(report: &ScenarioReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("scenario        {}\n", report.scenario));
    out.push_str(&format!("suffix          {}\n", report.suffix));
    out.push_str(&format!("resource group  {}\n", report.resource_group));
    out.push_str(&format!(
        "duration        {}s\n",
        report.duration().num_seconds()
    ));
    match &report.cleanup_error {
        None => out.push_str("cleanup         ok\n"),
        Some(e) => out.push_str(&format!("cleanup         FAILED: {}\n", e)),
    }
    out
}

/// Last `n` non-empty lines of a tool log, indented for the terminal.
pub fn tail(log: &str, n: usize) -> String {
    let lines: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..]
        .iter()
        .map(|l| format!("  {}\n", l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn report_rendering_includes_identity_and_cleanup_state() {
        let report = ScenarioReport {
            scenario: "vnet-standard".into(),
            suffix: "abc123".into(),
            resource_group: "rg-vet-abc123".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            cleanup_error: Some("destroy exited with code 1".into()),
        };
        let text = render_report(&report);
        assert!(text.contains("rg-vet-abc123"));
        assert!(text.contains("FAILED: destroy exited with code 1"));
    }

    #[test]
    fn tail_keeps_only_the_last_lines() {
        let log = "one\ntwo\n\nthree\nfour\n";
        assert_eq!(tail(log, 2), "  three\n  four\n");
    }
}
