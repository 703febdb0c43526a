use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::gateway::ApiRequest;
use crate::sync::{MonthFilter, Resource, ResourceId};

/// Spending category. The server stores a free-form label, so anything outside the known set is
/// kept verbatim in `Custom` and sent back exactly as it came.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Healthcare,
    Other,
    Custom(String),
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
            Category::Custom(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Exact match only: a label the server spelled differently must round-trip untouched.
impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
            .unwrap_or(Category::Custom(label))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Custom(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Typed input: known names in any case; any other non-blank text is a custom label.
impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(());
        }
        Ok(Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(text))
            .unwrap_or_else(|| Category::Custom(text.to_string())))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub category: Category,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub description: String,
}

impl Resource for Expense {
    type Filter = MonthFilter;
    const COLLECTION: &'static str = "expenses";
    const LABEL: &'static str = "expense";

    fn id(&self) -> Option<ResourceId> {
        self.id
    }

    fn list_request(filter: &MonthFilter) -> ApiRequest {
        let (year, month) = filter.resolve();
        ApiRequest::get("expenses/monthly")
            .query("year", year)
            .query("month", month)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub category: Category,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    pub start_date: NaiveDate,
    // Not checked against start_date here; the server owns that rule.
    pub end_date: NaiveDate,
}

impl Resource for Budget {
    type Filter = ();
    const COLLECTION: &'static str = "budgets";
    const LABEL: &'static str = "budget";

    fn id(&self) -> Option<ResourceId> {
        self.id
    }
}

/// Consumption of one category's budget as reported by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(alias = "target", with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(
        default,
        alias = "spentAmount",
        with = "rust_decimal::serde::float_option"
    )]
    pub spent: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    Remaining(Decimal),
    Overage(Decimal),
}

impl BudgetStatus {
    /// `None` when the server did not report spending; the figure is never guessed.
    pub fn standing(&self) -> Option<Standing> {
        let spent = self.spent?;
        Some(if spent <= self.target_amount {
            Standing::Remaining(self.target_amount - spent)
        } else {
            Standing::Overage(spent - self.target_amount)
        })
    }

    pub fn percent_used(&self) -> Option<Decimal> {
        let spent = self.spent?;
        if self.target_amount.is_zero() {
            return None;
        }
        Some((spent * Decimal::ONE_HUNDRED / self.target_amount).round_dp(0))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub profit_loss: Option<Decimal>,
}

fn default_active() -> bool {
    true
}

impl Investment {
    pub fn open(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: None,
            name: name.into(),
            amount,
            is_active: true,
            created_at: None,
            closed_at: None,
            profit_loss: None,
        }
    }
}

impl Resource for Investment {
    type Filter = ();
    const COLLECTION: &'static str = "investments";
    const LABEL: &'static str = "investment";

    fn id(&self) -> Option<ResourceId> {
        self.id
    }
}

/// A funding label exactly as the server spells it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSource(pub String);

impl BalanceSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BalanceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim()).ok()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Local date-times as the server emits them: either ISO text or a
/// `[year, month, day, hour, minute, second, nanos]` array.
mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Parts(Vec<u32>),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.format(ISO_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Wire::Text(text)) => parse_text(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {text:?}"))),
            Some(Wire::Parts(parts)) => from_parts(&parts)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {parts:?}"))),
        }
    }

    fn parse_text(text: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(text, ISO_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|parsed| parsed.naive_local())
            })
    }

    fn from_parts(parts: &[u32]) -> Option<NaiveDateTime> {
        let part = |index: usize| parts.get(index).copied().unwrap_or(0);
        if parts.len() < 3 {
            return None;
        }
        NaiveDate::from_ymd_opt(i32::try_from(parts[0]).ok()?, parts[1], parts[2])?
            .and_hms_nano_opt(part(3), part(4), part(5), part(6))
    }
}
