use console::style;

use crate::apps::BatchReport;
use crate::environment::CustomCommand;
use crate::git::RepositoryBranch;
use crate::{display_eprintln, display_println};

pub fn print_success(message: &str) {
    display_println!("{} {}", style("✅").green(), message);
}

pub fn print_error(message: &str) {
    display_eprintln!("{} {}", style("❌").red(), message);
}

pub fn print_warning(message: &str) {
    display_println!("{} {}", style("⚠️").yellow(), message);
}

pub fn print_info(message: &str) {
    display_println!("{} {}", style("ℹ️").blue(), message);
}

pub fn format_path(path: &str) -> String {
    style(path).dim().to_string()
}

pub fn format_branch(branch: &str) -> String {
    style(branch).yellow().to_string()
}

fn print_table_header(columns: &[(&str, usize)]) {
    let header = columns
        .iter()
        .map(|(col, width)| {
            style(format!("{col:<width$}"))
                .bold()
                .underlined()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("  ");

    display_println!("{header}");
}

fn column_width<'a>(title: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).chain([title.len()]).max().unwrap_or(0)
}

/// Plain numbered list, used for names of failed repositories or apps
pub fn print_name_table(names: &[String]) {
    display_println!("{}", "─".repeat(21));
    for (index, name) in names.iter().enumerate() {
        display_println!("{:>3}  {}", style(index).dim(), name);
    }
}

pub fn print_repository_table(entries: &[RepositoryBranch]) {
    if entries.is_empty() {
        print_warning("No repositories found");
        return;
    }

    let name_width = column_width("Repository", entries.iter().map(|e| e.name.as_str()));
    print_table_header(&[("Repository", name_width), ("Branch", 6)]);
    for entry in entries {
        display_println!(
            "{}  {}",
            style(format!("{:<name_width$}", entry.name)).cyan().bold(),
            format_branch(&entry.branch)
        );
    }
}

pub fn print_custom_commands(commands: &[CustomCommand]) {
    let alias_width = column_width("Alias", commands.iter().map(|c| c.alias.as_str()));
    let command_width = column_width("Command", commands.iter().map(|c| c.command.as_str()));
    print_table_header(&[
        ("Alias", alias_width),
        ("Command", command_width),
        ("Description", 11),
    ]);
    for c in commands {
        display_println!(
            "{}  {:<command_width$}  {}",
            style(format!("{:<alias_width$}", c.alias)).cyan(),
            c.command,
            style(&c.description).dim()
        );
    }
}

/// Summary printed after a bulk run or install
pub fn print_batch_report(report: &BatchReport, verb: &str) {
    if !report.succeeded.is_empty() {
        print_success(&format!(
            "{} app(s) {}: {}",
            report.succeeded.len(),
            verb,
            report.succeeded.join(", ")
        ));
    }

    if !report.cancelled.is_empty() {
        print_warning(&format!("Cancelled: {}", report.cancelled.join(", ")));
    }

    if !report.failed.is_empty() {
        print_info(&format!("The following apps failed to {verb}"));
        let width = column_width("App", report.failed.iter().map(|f| f.name.as_str()));
        print_table_header(&[("App", width), ("Reason", 6)]);
        for failure in &report.failed {
            display_println!(
                "{}  {}",
                style(format!("{:<width$}", failure.name)).red(),
                failure.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_width_uses_longest_value() {
        let names = ["api", "billing-service"];
        assert_eq!(column_width("Repository", names.iter().copied()), 15);
        assert_eq!(column_width("Repository", std::iter::empty()), 10);
    }
}
