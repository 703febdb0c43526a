use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY_SYMBOL: &str = "$";

fn format_with_commas(digits: &str) -> String {
    let reversed: Vec<char> = digits.chars().rev().collect();
    let mut out = Vec::with_capacity(reversed.len() + reversed.len() / 3);
    for (i, ch) in reversed.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out.into_iter().rev().collect()
}

pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{rounded:.2}");
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}.{}", sign, symbol, format_with_commas(whole), cents)
}

/// Profit/loss with an explicit sign on gains.
pub fn format_signed(amount: Decimal, symbol: &str) -> String {
    if amount > Decimal::ZERO {
        format!("+{}", format_currency(amount, symbol))
    } else {
        format_currency(amount, symbol)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .map(|value| format_date(value.date()))
        .unwrap_or_else(|| "-".to_string())
}
