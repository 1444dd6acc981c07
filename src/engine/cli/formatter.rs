//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use crate::engine::models::{Car, FuelType};
use colored::Colorize;

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Print a list item
    pub fn item(text: &str) {
        println!("  {} {}", "•".bright_black(), text);
    }

    /// Print a table with padded columns
    pub fn table(columns: &[&str], rows: &[Vec<String>]) {
        let widths = column_widths(columns, rows);
        let header = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w).bright_white().bold().to_string())
            .collect::<Vec<_>>()
            .join(" │ ");
        println!("  {}", header);
        let rule_len = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
        println!("  {}", "─".repeat(rule_len).bright_black());
        for row in rows {
            println!("  {}", pad_row(row, &widths).join(" │ "));
        }
    }
}

fn column_widths(columns: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn pad_row(row: &[String], widths: &[usize]) -> Vec<String> {
    row.iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<w$}", v, w = *w))
        .collect()
}

/// Table row for the car listing
pub fn car_row(car: &Car) -> Vec<String> {
    vec![
        car.id.to_string(),
        car.brand.clone(),
        car.model.clone(),
        car.year.to_string(),
        car.mileage.to_string(),
    ]
}

/// Table row for the fuel type listing
pub fn fuel_row(fuel_type: &FuelType) -> Vec<String> {
    vec![
        fuel_type.id.to_string(),
        fuel_type.name.clone(),
        format_price(fuel_type.price),
    ]
}

/// Format a currency amount with two decimals
pub fn format_price(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format a distance with thousands separators
pub fn format_km(km: u32) -> String {
    let digits = km.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    format!("{} km", out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.5), "12.50");
        assert_eq!(format_price(0.0), "0.00");
    }

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(0), "0 km");
        assert_eq!(format_km(999), "999 km");
        assert_eq!(format_km(50000), "50.000 km");
        assert_eq!(format_km(1234567), "1.234.567 km");
    }

    #[test]
    fn test_column_widths() {
        let rows = vec![vec!["1".to_string(), "Volkswagen".to_string()]];
        assert_eq!(column_widths(&["Id", "Brand"], &rows), vec![2, 10]);
        assert_eq!(pad_row(&rows[0], &[2, 10]), vec!["1 ", "Volkswagen"]);
    }
}
