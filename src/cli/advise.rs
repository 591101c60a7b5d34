use super::{ViewOptions, load_portfolio, ui};
use crate::core::advice::{LoanAdvisor, SummaryInputs};
use crate::core::bank::BankingProvider;
use crate::core::config::{AppConfig, Session};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use tracing::debug;

/// Writes each chunk to `out` as it arrives.
///
/// Once a write fails the rest of the stream is dropped and the error is
/// returned after the stream ends.
async fn stream_to<W: Write + Send>(
    advisor: &dyn LoanAdvisor,
    inputs: &SummaryInputs,
    products: &[String],
    out: &mut W,
) -> Result<String> {
    let mut write_error: Option<std::io::Error> = None;
    let mut write_chunk = |chunk: &str| {
        if write_error.is_some() {
            return;
        }
        if let Err(e) = out.write_all(chunk.as_bytes()).and_then(|()| out.flush()) {
            write_error = Some(e);
        }
    };
    let text = advisor
        .stream_summary(inputs, products, &mut write_chunk)
        .await
        .context("Failed to generate loan summary")?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write loan summary");
    }
    Ok(text)
}

/// Streams a short natural-language summary of the portfolio to stdout.
pub async fn run(
    config: &AppConfig,
    session: &Session,
    bank: &(dyn BankingProvider + Send + Sync),
    advisor: &dyn LoanAdvisor,
    options: &ViewOptions,
    start: NaiveDate,
) -> Result<()> {
    let loaded = load_portfolio(config, session, bank, options, start).await?;
    let summary = &loaded.projection.summary;
    let inputs = SummaryInputs::from_summary(summary);
    debug!(?inputs, "Requesting loan summary");

    if summary.incomplete {
        println!(
            "{}\n",
            ui::style_text(
                "Note: some loans are never paid off at the chosen rate.",
                ui::StyleType::Warning
            )
        );
    }
    println!("{}\n", ui::style_text("Loan Summary", ui::StyleType::Title));

    let text = stream_to(advisor, &inputs, &config.products, &mut std::io::stdout()).await?;
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct ScriptedAdvisor(Vec<&'static str>);

    #[async_trait]
    impl LoanAdvisor for ScriptedAdvisor {
        async fn stream_summary(
            &self,
            _inputs: &SummaryInputs,
            _products: &[String],
            on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
        ) -> Result<String> {
            let mut text = String::new();
            for chunk in &self.0 {
                let owned = chunk.to_string();
                on_chunk(&owned);
                text.push_str(&owned);
            }
            Ok(text)
        }
    }

    /// Accepts `remaining` writes, then fails like a closed pipe.
    struct ClosingWriter {
        remaining: usize,
        written: Vec<u8>,
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
            }
            self.remaining -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn inputs() -> SummaryInputs {
        SummaryInputs {
            total_loan_amount: dec!(270000),
            account_balance: dec!(10000),
            fastest_loan_description: "home loan (h1)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stream_writes_every_chunk() {
        let advisor = ScriptedAdvisor(vec!["- Stable ", "finances\n"]);
        let mut out = Vec::new();
        let text = stream_to(&advisor, &inputs(), &[], &mut out).await.unwrap();

        assert_eq!(text, "- Stable finances\n");
        assert_eq!(String::from_utf8(out).unwrap(), "- Stable finances\n");
    }

    #[tokio::test]
    async fn test_stream_reports_write_failure() {
        let advisor = ScriptedAdvisor(vec!["one ", "two ", "three"]);
        let mut out = ClosingWriter {
            remaining: 1,
            written: Vec::new(),
        };
        let err = stream_to(&advisor, &inputs(), &[], &mut out)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to write loan summary");
        assert_eq!(out.written, b"one ");
    }
}
