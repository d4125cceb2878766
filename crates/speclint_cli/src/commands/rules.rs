//! Rules command - List the rule catalog.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use speclint_lint::{catalog, Rule, RuleScope, Severity};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RuleRow {
    id: &'static str,
    severity: Severity,
    scope: RuleScope,
    requires_fetch: bool,
    description: &'static str,
}

impl From<&Rule> for RuleRow {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            severity: rule.severity,
            scope: rule.scope(),
            requires_fetch: rule.requires_fetch,
            description: rule.description,
        }
    }
}

pub fn execute(args: RulesArgs) -> Result<()> {
    let rows: Vec<RuleRow> = catalog().iter().map(RuleRow::from).collect();

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialize rules")?;
        println!("{}", json);
        return Ok(());
    }

    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn format_row(row: &RuleRow) -> String {
    let scope = match row.scope {
        RuleScope::WholeSpec => "spec",
        RuleScope::PerPlatform => "platform",
    };
    let fetch = if row.requires_fetch { "deep" } else { "quick" };
    format!(
        "{:<28} {:<5} {:<8} {:<5} {}",
        row.id,
        row.severity.label(),
        scope,
        fetch,
        row.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row() {
        let rule = catalog().iter().find(|r| r.id == "source_files_present").unwrap();
        let line = format_row(&RuleRow::from(rule));
        assert!(line.starts_with("source_files_present "));
        assert!(line.contains(" ERROR platform deep "));
    }

    #[test]
    fn test_rows_serialize() {
        let rows: Vec<RuleRow> = catalog().iter().map(RuleRow::from).collect();
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["id"], "name_matches_file");
        assert_eq!(json[0]["scope"], "whole_spec");
        assert_eq!(json[0]["severity"], "error");
    }
}
