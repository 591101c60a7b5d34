use super::{OutputFormat, ViewOptions, load_portfolio, print_json, ui};
use crate::core::amortization::Schedule;
use crate::core::bank::BankingProvider;
use crate::core::config::{AppConfig, Session};
use crate::core::report::{format_amount, month_label, timeline_rows};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::Cell;

impl Schedule {
    /// Renders the schedule; `limit` caps the number of period rows shown.
    pub fn display_as_table(&self, limit: Option<usize>) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Month"),
            ui::header_cell("Balance"),
            ui::header_cell("Principal"),
            ui::header_cell("Interest"),
            ui::header_cell("Total principal"),
            ui::header_cell("Total interest"),
            ui::header_cell("Principal %"),
            ui::header_cell("Interest %"),
        ]);

        let shown = limit.unwrap_or(self.periods.len());
        for period in self.periods.iter().take(shown) {
            table.add_row(vec![
                Cell::new(month_label(period.period_date)),
                ui::amount_cell(period.remaining_balance),
                ui::amount_cell(period.principal_paid),
                ui::amount_cell(period.interest_paid),
                ui::amount_cell(period.cumulative_principal_paid),
                ui::amount_cell(period.cumulative_interest_paid),
                ui::percentage_cell(period.principal_share_pct),
                ui::percentage_cell(period.interest_share_pct),
            ]);
        }

        let mut output = format!(
            "{} at {}\n\n",
            ui::style_text(
                &format!("{} loan ({})", self.loan_type, self.loan_id),
                ui::StyleType::Title
            ),
            self.annual_rate
        );

        if self.periods.is_empty() && self.warning.is_none() {
            output.push_str(&ui::style_text(
                "Nothing owed on this loan.",
                ui::StyleType::Subtle,
            ));
            return output;
        }
        if !self.periods.is_empty() {
            output.push_str(&table.to_string());
        }
        if self.periods.len() > shown {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("... {} more months", self.periods.len() - shown),
                    ui::StyleType::Subtle
                )
            ));
        }

        let footer = match (&self.warning, self.payoff_date()) {
            (Some(warning), _) => ui::style_text(&format!("Warning: {warning}"), ui::StyleType::Warning),
            (None, Some(date)) => format!(
                "{} {} ({} months), total interest {}",
                ui::style_text("Paid off in", ui::StyleType::TotalLabel),
                ui::style_text(&month_label(date), ui::StyleType::TotalValue),
                self.months(),
                format_amount(self.total_interest())
            ),
            (None, None) => String::new(),
        };
        output.push_str(&format!("\n\n{footer}"));
        output
    }
}

pub async fn run(
    config: &AppConfig,
    session: &Session,
    bank: &(dyn BankingProvider + Send + Sync),
    options: &ViewOptions,
    loan_id: Option<&str>,
    limit: Option<usize>,
    start: NaiveDate,
) -> Result<()> {
    let loaded = load_portfolio(config, session, bank, options, start).await?;
    let projection = loaded.projection;

    let schedules: Vec<Schedule> = match loan_id {
        Some(id) => match projection.schedule_for(id) {
            Some(schedule) => vec![schedule.clone()],
            None if projection.summary.unrated.iter().any(|u| u == id) => {
                bail!("No interest rate chosen for loan {id}: pass --rate or add it to the config")
            }
            None => bail!("Loan {id} not found in the selected accounts"),
        },
        None => projection.schedules,
    };

    match options.format {
        OutputFormat::Json => print_json(&timeline_rows(&schedules)),
        OutputFormat::Table => {
            if schedules.is_empty() {
                println!(
                    "{}",
                    ui::style_text(
                        "No loans with a chosen interest rate. Pass --rate to project them.",
                        ui::StyleType::Subtle
                    )
                );
                return Ok(());
            }
            let count = schedules.len();
            for (i, schedule) in schedules.iter().enumerate() {
                println!("{}", schedule.display_as_table(limit));
                if i < count - 1 {
                    ui::print_separator();
                }
            }
            Ok(())
        }
    }
}
