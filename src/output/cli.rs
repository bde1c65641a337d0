use crate::model::{DependencyStatus, GitStatus, ProjectStatus, ScanReport};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Behind")]
    behind: String,
    #[tabled(rename = "Dirty")]
    dirty: String,
    #[tabled(rename = "Manager")]
    manager: String,
}

#[derive(Tabled)]
struct DependencyRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Dependency")]
    dependency: String,
    #[tabled(rename = "Declared")]
    declared: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Safe Version")]
    safe_version: String,
}

pub fn print_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scanned {} at {}",
        report.root.display(),
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!("Found {} projects:", report.projects.len());
    println!();

    let rows: Vec<ProjectRow> = report
        .projects
        .iter()
        .map(|p| ProjectRow {
            project: truncate(&p.display_path, 50),
            branch: p.git.current_branch.clone().unwrap_or_else(unknown),
            behind: format_behind(&p.git),
            dirty: format_count(p.git.uncommitted_files),
            manager: p.package_manager.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    let dependency_rows: Vec<DependencyRow> = report
        .projects
        .iter()
        .flat_map(|p| p.dependencies.iter().map(move |(name, dep)| (p, name, dep)))
        .map(|(project, name, dep)| dependency_row(project, name, dep))
        .collect();

    if !dependency_rows.is_empty() {
        println!();
        println!("Tracked dependencies:");
        println!();
        let table = Table::new(dependency_rows)
            .with(Style::rounded())
            .to_string();
        println!("{}", table);
    }

    println!();
    print_summary(report);

    Ok(())
}

fn dependency_row(project: &ProjectStatus, name: &str, dep: &DependencyStatus) -> DependencyRow {
    DependencyRow {
        project: truncate(&project.display_path, 50),
        dependency: name.to_string(),
        declared: dep.declared.raw.clone(),
        status: if dep.vulnerable { "VULNERABLE" } else { "ok" }.to_string(),
        safe_version: dep
            .safe_version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn print_summary(report: &ScanReport) {
    let vulnerable = report.vulnerable_count();
    if vulnerable == 0 {
        println!("No vulnerable projects.");
    } else {
        println!(
            "{} of {} projects need remediation.",
            vulnerable,
            report.projects.len()
        );
    }
}

/// Branch lag column, e.g. "main +3 / prod +1". Unknown counts render as
/// "?" so they cannot be mistaken for up-to-date.
fn format_behind(git: &GitStatus) -> String {
    let mut parts = Vec::new();
    if let Some(branch) = &git.default_branch {
        parts.push(format!(
            "{branch} +{}",
            format_count(git.commits_behind_default)
        ));
    }
    if let Some(branch) = &git.production_branch {
        parts.push(format!(
            "{branch} +{}",
            format_count(git.commits_behind_production)
        ));
    }
    if parts.is_empty() {
        unknown()
    } else {
        parts.join(" / ")
    }
}

fn format_count(count: Option<u64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
}

fn unknown() -> String {
    "-".to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_behind_distinguishes_unknown() {
        let mut git = GitStatus {
            default_branch: Some("main".to_string()),
            commits_behind_default: Some(0),
            ..GitStatus::unknown()
        };
        assert_eq!(format_behind(&git), "main +0");

        git.commits_behind_default = None;
        assert_eq!(format_behind(&git), "main +?");

        assert_eq!(format_behind(&GitStatus::unknown()), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-rather-long-path", 10), "a-rathe...");
    }
}
