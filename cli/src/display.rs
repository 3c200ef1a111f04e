//! Terminal formatting
//!
//! Renders API records as aligned text tables. Every formatter returns a
//! `String` so the command handlers decide where it goes.

use firefly_core::import::ImportReport;
use firefly_core::{Account, Budget, Category, NewCategory, Pagination, SystemInfo, TransactionGroup};

/// Column width in chars, which is what `{:<w$}` pads by.
fn width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.chars().count())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn format_system_info(info: &SystemInfo) -> String {
    format!(
        "Firefly III {} (API {})\nPHP {} on {}, database driver {}",
        info.version, info.api_version, info.php_version, info.os, info.driver
    )
}

/// Format accounts as an id/name/type/balance table
pub fn format_account_list(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No accounts found.".to_string();
    }

    let id_width = width(accounts.iter().map(|a| a.id.as_str()), "ID");
    let name_width = width(accounts.iter().map(|a| a.attributes.name.as_str()), "Name");
    let type_width = width(accounts.iter().map(|a| a.attributes.account_type.as_str()), "Type");

    let mut output = format!(
        "{:<id_width$}  {:<name_width$}  {:<type_width$}  {:>14}  {}\n",
        "ID", "Name", "Type", "Balance", "Currency"
    );
    output.push_str(&format!(
        "{:-<id_width$}  {:-<name_width$}  {:-<type_width$}  {:->14}  {:-<8}\n",
        "", "", "", "", ""
    ));

    for account in accounts {
        let attrs = &account.attributes;
        output.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {:<type_width$}  {:>14}  {}\n",
            account.id,
            attrs.name,
            attrs.account_type,
            or_dash(attrs.current_balance.as_deref()),
            or_dash(attrs.currency_code.as_deref()),
        ));
    }

    output
}

pub fn format_account_details(account: &Account) -> String {
    let attrs = &account.attributes;
    let active = match attrs.active {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", attrs.name));
    output.push_str(&format!("  ID:       {}\n", account.id));
    output.push_str(&format!("  Type:     {}\n", attrs.account_type));
    output.push_str(&format!("  Active:   {}\n", active));
    output.push_str(&format!(
        "  Balance:  {} {}\n",
        or_dash(attrs.current_balance.as_deref()),
        attrs.currency_code.as_deref().unwrap_or("")
    ));
    if let Some(iban) = attrs.iban.as_deref().filter(|v| !v.is_empty()) {
        output.push_str(&format!("  IBAN:     {}\n", iban));
    }
    if let Some(number) = attrs.account_number.as_deref().filter(|v| !v.is_empty()) {
        output.push_str(&format!("  Number:   {}\n", number));
    }
    if let Some(notes) = attrs.notes.as_deref().filter(|v| !v.is_empty()) {
        output.push_str(&format!("  Notes:    {}\n", notes));
    }
    output
}

/// One row per split, since a group may hold several.
pub fn format_transaction_list(groups: &[TransactionGroup]) -> String {
    let rows: Vec<[String; 6]> = groups
        .iter()
        .flat_map(|group| {
            group.attributes.transactions.iter().map(move |split| {
                [
                    group.id.clone(),
                    split.date.chars().take(10).collect(),
                    split.transaction_type.clone(),
                    split.amount.clone(),
                    split.description.clone(),
                    format!(
                        "{} -> {}",
                        or_dash(split.source_name.as_deref()),
                        or_dash(split.destination_name.as_deref())
                    ),
                ]
            })
        })
        .collect();

    if rows.is_empty() {
        return "No transactions found.".to_string();
    }

    let id_width = width(rows.iter().map(|r| r[0].as_str()), "ID");
    let type_width = width(rows.iter().map(|r| r[2].as_str()), "Type");
    let desc_width = width(rows.iter().map(|r| r[4].as_str()), "Description");

    let mut output = format!(
        "{:<id_width$}  {:<10}  {:<type_width$}  {:>12}  {:<desc_width$}  {}\n",
        "ID", "Date", "Type", "Amount", "Description", "Accounts"
    );
    output.push_str(&format!(
        "{:-<id_width$}  {:-<10}  {:-<type_width$}  {:->12}  {:-<desc_width$}  {:-<8}\n",
        "", "", "", "", "", ""
    ));
    for [id, date, kind, amount, description, accounts] in &rows {
        output.push_str(&format!(
            "{:<id_width$}  {:<10}  {:<type_width$}  {:>12}  {:<desc_width$}  {}\n",
            id, date, kind, amount, description, accounts
        ));
    }
    output
}

pub fn format_budget_list(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets found.".to_string();
    }

    let id_width = width(budgets.iter().map(|b| b.id.as_str()), "ID");
    let name_width = width(budgets.iter().map(|b| b.attributes.name.as_str()), "Name");

    let mut output = format!("{:<id_width$}  {:<name_width$}  {}\n", "ID", "Name", "Status");
    output.push_str(&format!("{:-<id_width$}  {:-<name_width$}  {:-<8}\n", "", "", ""));
    for budget in budgets {
        let status = if budget.attributes.active == Some(false) {
            "Inactive"
        } else {
            "Active"
        };
        output.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            budget.id, budget.attributes.name, status
        ));
    }
    output
}

pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let id_width = width(categories.iter().map(|c| c.id.as_str()), "ID");
    let name_width = width(categories.iter().map(|c| c.attributes.name.as_str()), "Name");

    let mut output = format!("{:<id_width$}  {:<name_width$}  {}\n", "ID", "Name", "Notes");
    output.push_str(&format!("{:-<id_width$}  {:-<name_width$}  {:-<5}\n", "", "", ""));
    for category in categories {
        output.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            category.id,
            category.attributes.name,
            category.attributes.notes.as_deref().unwrap_or("")
        ));
    }
    output
}

pub fn format_pagination(pagination: &Pagination) -> String {
    format!(
        "Page {} of {} ({} total)",
        pagination.current_page, pagination.total_pages, pagination.total
    )
}

/// The parsed list shown before an import asks for confirmation.
pub fn format_import_plan(categories: &[NewCategory]) -> String {
    let mut output = format!("{} categories to import:\n", categories.len());
    for category in categories {
        match category.notes.as_deref() {
            Some(notes) => output.push_str(&format!("  - {} ({})\n", category.name, notes)),
            None => output.push_str(&format!("  - {}\n", category.name)),
        }
    }
    output
}

pub fn format_import_report(report: &ImportReport) -> String {
    let mut output = format!(
        "Import complete: {} created, {} skipped, {} failed ({} total)\n",
        report.created.len(),
        report.skipped.len(),
        report.failed.len(),
        report.total()
    );
    for failure in &report.failed {
        output.push_str(&format!("  failed: {}: {}\n", failure.name, failure.error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_core::import::ImportFailure;
    use firefly_core::types::{AccountAttributes, CategoryAttributes, Resource};
    use firefly_core::ClientError;

    fn account(id: &str, name: &str, balance: Option<&str>) -> Account {
        Resource {
            id: id.to_string(),
            resource_type: "accounts".to_string(),
            attributes: AccountAttributes {
                name: name.to_string(),
                account_type: "asset".to_string(),
                active: Some(true),
                current_balance: balance.map(str::to_string),
                currency_code: Some("EUR".to_string()),
                iban: None,
                account_number: None,
                notes: None,
            },
        }
    }

    #[test]
    fn account_list_aligns_columns() {
        let out = format_account_list(&[account("1", "Checking", Some("100.00")), account("12", "Savings", None)]);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID  Name    "));
        assert!(lines[2].starts_with("1   Checking"));
        assert!(lines[2].contains("100.00  EUR"));
        assert!(lines[3].contains("-  EUR"));
        assert_eq!(lines[0].find("Type"), lines[3].find("asset"));
    }

    /// Column of `needle` in `line`, counted in chars.
    fn char_col(line: &str, needle: &str) -> Option<usize> {
        line.find(needle).map(|byte| line[..byte].chars().count())
    }

    #[test]
    fn accented_names_keep_columns_aligned() {
        let out = format_account_list(&[account("1", "Café", None), account("2", "Épargne", None)]);
        let lines: Vec<_> = out.lines().collect();

        // "Épargne" is 7 chars wide but 8 bytes long
        let header = char_col(lines[0], "Type");
        assert_eq!(header, Some(2 + 2 + 7 + 2));
        assert_eq!(char_col(lines[2], "asset"), header);
        assert_eq!(char_col(lines[3], "asset"), header);
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(format_account_list(&[]), "No accounts found.");
        assert_eq!(format_budget_list(&[]), "No budgets found.");
        assert_eq!(format_category_list(&[]), "No categories found.");
        assert_eq!(format_transaction_list(&[]), "No transactions found.");
    }

    #[test]
    fn category_list_shows_notes() {
        let category = Resource {
            id: "3".to_string(),
            resource_type: "categories".to_string(),
            attributes: CategoryAttributes {
                name: "Dining".to_string(),
                notes: Some("restaurants".to_string()),
                created_at: None,
                updated_at: None,
            },
        };
        let out = format_category_list(&[category]);
        assert!(out.lines().nth(2).unwrap().ends_with("Dining  restaurants"));
    }

    #[test]
    fn import_plan_lists_notes() {
        let plan = format_import_plan(&[
            NewCategory::new("Groceries"),
            NewCategory {
                name: "Dining".to_string(),
                notes: Some("takeaway".to_string()),
            },
        ]);
        assert_eq!(plan, "2 categories to import:\n  - Groceries\n  - Dining (takeaway)\n");
    }

    #[test]
    fn import_report_lists_failures() {
        let report = ImportReport {
            created: vec!["Rent".to_string()],
            skipped: vec![],
            failed: vec![ImportFailure {
                name: "Rent".to_string(),
                error: ClientError::Network {
                    message: "refused".to_string(),
                },
            }],
        };
        let out = format_import_report(&report);
        assert!(out.starts_with("Import complete: 1 created, 0 skipped, 1 failed (2 total)"));
        assert!(out.contains("failed: Rent: network error: refused"));
    }
}
