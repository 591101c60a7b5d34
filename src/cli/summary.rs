use super::{OutputFormat, ViewOptions, load_portfolio, print_json, ui};
use crate::core::bank::BankingProvider;
use crate::core::config::{AppConfig, Session};
use crate::core::portfolio::PortfolioSummary;
use crate::core::report::{
    LoanBreakdownRow, TypeShare, breakdown_rows, format_amount, month_label, share_by_type,
};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use serde::Serialize;

#[derive(Serialize)]
struct SummaryReport<'a> {
    currency: &'a str,
    start: String,
    summary: &'a PortfolioSummary,
    loans: Vec<LoanBreakdownRow>,
    by_type: Vec<TypeShare>,
}

impl PortfolioSummary {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        let fastest = self
            .fastest_loan
            .as_ref()
            .map_or("N/A".to_string(), |l| l.label());
        let earliest = self.earliest_payoff.as_ref().map_or("N/A".to_string(), |p| {
            format!(
                "{} loan ({}) in {}",
                p.loan_type,
                p.loan_id,
                month_label(p.payoff_date)
            )
        });

        table.add_row(vec![
            Cell::new(format!("Total loan amount ({currency})")),
            ui::amount_cell(self.total_principal),
        ]);
        table.add_row(vec![
            Cell::new(format!("Monthly payment ({currency})")),
            ui::amount_cell(self.total_monthly_payment),
        ]);
        table.add_row(vec![
            Cell::new(format!("Account balance ({currency})")),
            ui::amount_cell(self.total_balance),
        ]);
        table.add_row(vec![
            Cell::new("Debt-free date"),
            ui::format_optional_cell(self.debt_free_period, month_label),
        ]);
        table.add_row(vec![Cell::new("Fastest loan"), Cell::new(fastest)]);
        table.add_row(vec![Cell::new("First loan paid off"), Cell::new(earliest)]);

        let mut output = format!(
            "{}\n\n{}",
            ui::style_text("Loan Overview", ui::StyleType::Title),
            table
        );

        if self.incomplete {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    &format!(
                        "Projection incomplete: {} never paid off at the chosen rate",
                        self.truncated.join(", ")
                    ),
                    ui::StyleType::Warning
                )
            ));
        }
        if !self.unrated.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("No rate chosen for: {}", self.unrated.join(", ")),
                    ui::StyleType::Subtle
                )
            ));
        }
        output
    }
}

fn loans_table(rows: &[LoanBreakdownRow], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Loan"),
        ui::header_cell("Type"),
        ui::header_cell(&format!("Principal ({currency})")),
        ui::header_cell("Monthly"),
        ui::header_cell("Rate"),
        ui::header_cell("Credit score"),
        ui::header_cell("Status"),
        ui::header_cell("Payoff"),
        ui::header_cell("Interest"),
    ]);

    for row in rows {
        let payoff = match (&row.payoff_date, row.months_to_payoff, &row.warning) {
            (Some(date), Some(months), _) => Cell::new(format!("{date} ({months} mo)")),
            (_, _, Some(warning)) => ui::warning_cell(warning),
            _ => ui::format_optional_cell(None::<String>, |s| s),
        };
        table.add_row(vec![
            Cell::new(&row.loan_id),
            Cell::new(&row.loan_type),
            ui::amount_cell(row.principal),
            ui::amount_cell(row.monthly_payment),
            ui::format_optional_cell(row.annual_rate, |r| r.to_string()),
            ui::format_optional_cell(row.credit_score, |c| c.to_string()),
            Cell::new(row.status.as_deref().unwrap_or("-")),
            payoff,
            ui::format_optional_cell(row.total_interest, format_amount),
        ]);
    }
    table.to_string()
}

fn type_table(shares: &[TypeShare]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Loan type"),
        ui::header_cell("Principal"),
        ui::header_cell("Share"),
    ]);
    for share in shares {
        table.add_row(vec![
            Cell::new(&share.loan_type),
            ui::amount_cell(share.principal),
            ui::percentage_cell(share.share_pct),
        ]);
    }
    table.to_string()
}

pub async fn run(
    config: &AppConfig,
    session: &Session,
    bank: &(dyn BankingProvider + Send + Sync),
    options: &ViewOptions,
    start: NaiveDate,
) -> Result<()> {
    let loaded = load_portfolio(config, session, bank, options, start).await?;
    let summary = &loaded.projection.summary;
    let rows = breakdown_rows(&loaded.snapshot.loans, &loaded.projection);
    let by_type = share_by_type(&loaded.snapshot.loans);

    match options.format {
        OutputFormat::Json => print_json(&SummaryReport {
            currency: &config.currency,
            start: month_label(loaded.projection.start),
            summary,
            loans: rows,
            by_type,
        }),
        OutputFormat::Table => {
            println!("{}", summary.display_as_table(&config.currency));
            if rows.is_empty() {
                println!(
                    "\n{}",
                    ui::style_text("No loan data available.", ui::StyleType::Subtle)
                );
                return Ok(());
            }
            ui::print_separator();
            println!(
                "{}\n\n{}",
                ui::style_text("Loan Details", ui::StyleType::Title),
                loans_table(&rows, &config.currency)
            );
            ui::print_separator();
            println!(
                "{}\n\n{}",
                ui::style_text("Loan Breakdown by Type", ui::StyleType::Title),
                type_table(&by_type)
            );
            Ok(())
        }
    }
}
