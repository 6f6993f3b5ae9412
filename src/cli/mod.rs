//! Terminal rendering for command results.

pub mod ui;

use chrono::NaiveDate;
use comfy_table::Cell;

use crate::catalog::{Catalog, CurrencyClass};
use crate::service::{RateComparison, RateSample};

fn date_label(date: Option<NaiveDate>) -> String {
    date.map_or("latest".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

pub fn currencies_table(catalog: &Catalog) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Class"),
    ]);

    for currency in catalog.currencies() {
        let class = match currency.class {
            CurrencyClass::Fiat => "fiat",
            CurrencyClass::Crypto => "crypto",
        };
        table.add_row(vec![
            Cell::new(currency.code),
            Cell::new(currency.symbol),
            Cell::new(currency.name),
            Cell::new(class),
        ]);
    }

    table.to_string()
}

/// One row per resolved date, with the rate movement underneath.
pub fn comparison_table(
    from: &str,
    to: &str,
    amount: f64,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    result: &RateComparison,
) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("{amount} {from} in {to}")),
    ]);
    table.add_row(vec![
        Cell::new(date_label(from_date)),
        ui::numeric_cell(&format!("{:.6}", result.from_rate)),
        ui::numeric_cell(&format!("{:.4}", result.amount_at_from)),
    ]);
    table.add_row(vec![
        Cell::new(date_label(to_date)),
        ui::numeric_cell(&format!("{:.6}", result.to_rate)),
        ui::numeric_cell(&format!("{:.4}", result.amount_at_to)),
    ]);

    let mut output = table.to_string();
    output.push_str(&format!(
        "\n{} {}",
        ui::style_text("Rate difference:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:+.6}", result.rate_difference),
            ui::StyleType::TotalValue
        ),
    ));
    output
}

pub fn history_table(from: &str, to: &str, samples: &[RateSample]) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("1 {from} in {to}")),
    ]);
    for sample in samples {
        table.add_row(vec![
            Cell::new(sample.date.format("%Y-%m-%d").to_string()),
            ui::numeric_cell(&format!("{:.6}", sample.rate)),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies_table_lists_the_catalog() {
        let output = currencies_table(&Catalog::builtin());
        assert!(output.contains("Code"));
        assert!(output.contains("USD"));
        assert!(output.contains("BTC"));
        assert!(output.contains("crypto"));
    }

    #[test]
    fn test_comparison_table_shows_both_dates() {
        let result = RateComparison {
            amount_at_from: 100.0,
            amount_at_to: 120.0,
            from_rate: 1.0,
            to_rate: 1.2,
            rate_difference: 0.2,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let output = comparison_table("EUR", "USD", 100.0, Some(date), None, &result);

        assert!(output.contains("2024-03-01"));
        assert!(output.contains("latest"));
        assert!(output.contains("120.0000"));
        assert!(output.contains("Rate difference:"));
        assert!(output.contains("+0.200000"));
    }

    #[test]
    fn test_history_table_has_one_row_per_sample() {
        let samples = vec![
            RateSample {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                rate: 1.05,
            },
            RateSample {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                rate: 1.07,
            },
        ];
        let output = history_table("EUR", "USD", &samples);
        assert!(output.contains("2024-03-01"));
        assert!(output.contains("2024-03-02"));
        assert!(output.contains("1.070000"));
    }
}
