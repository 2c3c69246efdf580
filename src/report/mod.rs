//! Run report rendering.
//!
//! The driver produces one [`RepoReport`] per configured repository; this
//! module renders them as a Markdown summary table plus a detail section of
//! per-repository changes and warnings, and computes the process exit
//! status. Warnings appear in the details but never affect the exit status.

use std::fmt::Write as _;

use crate::types::{
    FileSyncOutcome, PermissionGap, RepoReport, SettingsOutcome, ToggleStatus, TopicsStatus,
};

/// True when every repository succeeded (sub-resource warnings included).
pub fn overall_success(reports: &[RepoReport]) -> bool {
    reports.iter().all(RepoReport::success)
}

/// Renders the whole run as Markdown.
pub fn render_markdown(reports: &[RepoReport]) -> String {
    let mut out = String::new();

    let dry_run = reports.first().is_some_and(|r| r.dry_run);
    if dry_run {
        out.push_str("# Reconciliation report (dry run)\n\n");
        out.push_str("No changes were applied; statuses show what a real run would do.\n\n");
    } else {
        out.push_str("# Reconciliation report\n\n");
    }

    out.push_str("| Repository | Settings | Files | Ruleset | Autolinks | package.json | Result |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for report in reports {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            report.repo,
            settings_cell(report),
            files_cell(report),
            option_cell(report.ruleset.as_ref().map(|r| format!("{:?}", r.status))),
            option_cell(report.autolinks.as_ref().map(|a| format!("{:?}", a.status))),
            option_cell(report.package_json.as_ref().map(|p| format!("{:?}", p.status))),
            if report.success() { "ok" } else { "FAILED" },
        );
    }
    out.push('\n');

    for report in reports {
        let details = repo_details(report);
        if !details.is_empty() {
            let _ = writeln!(out, "## {}\n", report.repo);
            out.push_str(&details);
            out.push('\n');
        }
    }

    let failed = reports.iter().filter(|r| !r.success()).count();
    let _ = writeln!(
        out,
        "{} repositories, {} succeeded, {} failed.",
        reports.len(),
        reports.len() - failed,
        failed
    );

    out
}

fn option_cell(cell: Option<String>) -> String {
    cell.map(|s| kebab(&s)).unwrap_or_else(|| "-".to_string())
}

fn settings_cell(report: &RepoReport) -> String {
    match &report.settings {
        None => "-".to_string(),
        Some(s) if s.access_denied => "access-denied".to_string(),
        Some(s) => match s.insufficient_permissions {
            Some(PermissionGap::NoAccess) => "no-access".to_string(),
            Some(PermissionGap::SettingsUnreadable) => "settings-unreadable".to_string(),
            None => kebab(&format!("{:?}", s.status)),
        },
    }
}

fn files_cell(report: &RepoReport) -> String {
    if report.files.is_empty() {
        return "-".to_string();
    }
    report
        .files
        .iter()
        .map(|(key, outcome)| format!("{key}: {}", kebab(&format!("{:?}", outcome.status))))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// CamelCase debug name to the kebab-case wire form used everywhere else.
fn kebab(debug: &str) -> String {
    let mut out = String::with_capacity(debug.len() + 4);
    for (i, c) in debug.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn repo_details(report: &RepoReport) -> String {
    let mut out = String::new();

    if let Some(error) = &report.error {
        let _ = writeln!(out, "- error: {error}");
    }

    if let Some(settings) = &report.settings {
        settings_details(&mut out, settings);
    }

    for (key, outcome) in &report.files {
        file_details(&mut out, key, outcome);
    }

    if let Some(ruleset) = &report.ruleset {
        if let Some(error) = &ruleset.error {
            let _ = writeln!(out, "- ruleset error: {error}");
        }
        if !ruleset.deleted.is_empty() {
            let verb = if ruleset.dry_run { "would delete" } else { "deleted" };
            let _ = writeln!(out, "- ruleset: {verb} {}", ruleset.deleted.join(", "));
        }
        for warning in &ruleset.delete_warnings {
            let _ = writeln!(out, "- ruleset warning: {warning}");
        }
    }

    if let Some(autolinks) = &report.autolinks {
        if let Some(error) = &autolinks.error {
            let _ = writeln!(out, "- autolinks error: {error}");
        }
        if !autolinks.created.is_empty() || !autolinks.deleted.is_empty() {
            let _ = writeln!(
                out,
                "- autolinks: +[{}] -[{}]",
                autolinks.created.join(", "),
                autolinks.deleted.join(", ")
            );
        }
    }

    if let Some(outcome) = &report.package_json {
        file_details(&mut out, "package.json", outcome);
    }

    out
}

fn settings_details(out: &mut String, settings: &SettingsOutcome) {
    if let Some(error) = &settings.error {
        let _ = writeln!(out, "- settings error: {error}");
    }
    for change in &settings.changes {
        let verb = if settings.dry_run { "would set" } else { "set" };
        let _ = writeln!(
            out,
            "- {verb} {}: {} -> {}",
            change.field, change.from, change.to
        );
    }
    if let Some(topics) = &settings.topics {
        if topics.status != TopicsStatus::Unchanged {
            let _ = writeln!(
                out,
                "- topics: +[{}] -[{}]",
                topics.added.join(", "),
                topics.removed.join(", ")
            );
        }
        if let Some(warning) = &topics.warning {
            let _ = writeln!(out, "- topics warning: {warning}");
        }
    }
    if let Some(cs) = &settings.code_scanning {
        if let Some(warning) = &cs.warning {
            let _ = writeln!(out, "- code scanning warning: {warning}");
        }
    }
    for toggle in &settings.toggles {
        if toggle.status != ToggleStatus::Unchanged {
            let _ = writeln!(
                out,
                "- {}: {}",
                toggle.field,
                kebab(&format!("{:?}", toggle.status))
            );
        }
        if let Some(warning) = &toggle.warning {
            let _ = writeln!(out, "- {} warning: {warning}", toggle.field);
        }
    }
}

fn file_details(out: &mut String, key: &str, outcome: &FileSyncOutcome) {
    if let Some(error) = &outcome.error {
        let _ = writeln!(out, "- {key} error: {error}");
    }
    if let Some(number) = outcome.pr_number {
        let _ = writeln!(out, "- {key}: PR #{number} ({})", outcome.paths.join(", "));
    }
}
