use chrono::NaiveDateTime;
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::form::EditForm;
use crate::gateway::{ApiRequest, Gateway};
use crate::models::{parse_amount, Investment};
use crate::sync::{require_id, Resource, ResourceId, Synchronizer};

#[derive(Clone, Debug, PartialEq)]
pub enum Lifecycle {
    Open,
    Closed {
        closed_at: Option<NaiveDateTime>,
        profit_loss: Option<Decimal>,
    },
}

impl Investment {
    pub fn lifecycle(&self) -> Lifecycle {
        if self.is_active {
            Lifecycle::Open
        } else {
            Lifecycle::Closed {
                closed_at: self.closed_at,
                profit_loss: self.profit_loss,
            }
        }
    }

    /// Closing is one-way; only open investments offer it.
    pub fn can_close(&self) -> bool {
        self.is_active && self.id.is_some()
    }
}

/// Gain (positive) or loss (negative) of closing at `closing_amount`.
pub fn profit_loss(principal: Decimal, closing_amount: Decimal) -> Decimal {
    closing_amount - principal
}

/// The closing amount the user is typing. Local only; the server never sees it, just the
/// delta.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosePreview {
    pub principal: Decimal,
    pub closing_amount: Option<Decimal>,
}

impl ClosePreview {
    pub fn new(principal: Decimal, closing_input: &str) -> Self {
        Self {
            principal,
            closing_amount: parse_amount(closing_input),
        }
    }

    pub fn delta(&self) -> Option<Decimal> {
        self.closing_amount
            .map(|closing| profit_loss(self.principal, closing))
    }

    pub fn is_gain(&self) -> Option<bool> {
        self.delta().map(|delta| delta >= Decimal::ZERO)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CloseRequest {
    #[serde(with = "rust_decimal::serde::float")]
    profit_loss: Decimal,
}

/// The single dialog the investments view can show. Editing and closing exclude each other, so
/// opening one replaces the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum InvestmentDialog {
    #[default]
    Hidden,
    Edit(EditForm<Investment>),
    Close(Investment),
}

impl InvestmentDialog {
    /// Only an open, saved investment gets a close dialog.
    pub fn close(investment: Investment) -> Result<Self> {
        require_id(&investment)?;
        if !investment.can_close() {
            return Err(ApiError::Invalid(format!(
                "{} is already closed.",
                investment.name
            )));
        }
        Ok(Self::Close(investment))
    }

    pub fn edit_form(&self) -> Option<&EditForm<Investment>> {
        match self {
            Self::Edit(form) => Some(form),
            _ => None,
        }
    }

    pub fn closing(&self) -> Option<&Investment> {
        match self {
            Self::Close(investment) => Some(investment),
            _ => None,
        }
    }
}

/// Investments: the generic CRUD plus the open → closed transition.
#[derive(Clone, PartialEq)]
pub struct InvestmentTracker {
    sync: Synchronizer<Investment>,
}

impl InvestmentTracker {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            sync: Synchronizer::new(gateway, ()),
        }
    }

    pub fn sync(&self) -> &Synchronizer<Investment> {
        &self.sync
    }

    pub async fn fetch(&self, id: ResourceId) -> Result<Investment> {
        self.sync.fetch_one(id).await
    }

    /// Closes at `closing_amount`, sending only `closing_amount - principal`. Whether a closed
    /// investment may be closed again is the server's call.
    pub async fn close(&self, investment: &Investment, closing_amount: Decimal) -> Result<Investment> {
        let id = require_id(investment)?;
        let delta = profit_loss(investment.amount, closing_amount);
        let request = ApiRequest::post(format!("{}/close", Investment::item_path(id)))
            .json(&CloseRequest { profit_loss: delta })?;
        let closed: Investment = self.sync.gateway().fetch(request).await?;
        info!("closed investment {id} with profit/loss {delta}");
        self.sync.resync().await;
        Ok(closed)
    }
}
