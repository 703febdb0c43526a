use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use rust_decimal::Decimal;

use crate::error::{ApiError, Result};
use crate::gateway::{ApiRequest, Gateway};
use crate::models::BalanceSource;

/// The account balance and the funding sources the server knows about.
///
/// The balance is only ever read from the server; a deposit is followed by a fresh read rather
/// than a local addition, since the server may apply rules the client cannot see.
#[derive(Clone)]
pub struct BalanceLedger {
    gateway: Gateway,
    sources: Rc<RefCell<Vec<BalanceSource>>>,
}

impl PartialEq for BalanceLedger {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.sources, &other.sources)
    }
}

impl BalanceLedger {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            sources: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub async fn fetch_balance(&self) -> Result<Decimal> {
        self.gateway.fetch(ApiRequest::get("users/balance")).await
    }

    pub async fn fetch_sources(&self) -> Result<Vec<BalanceSource>> {
        let sources: Vec<BalanceSource> = self
            .gateway
            .fetch(ApiRequest::get("users/balance/sources"))
            .await?;
        *self.sources.borrow_mut() = sources.clone();
        Ok(sources)
    }

    /// Adds `amount` tagged with `source` and returns the balance as the server now reports it.
    pub async fn deposit(&self, amount: Decimal, source: &BalanceSource) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(ApiError::Invalid("Enter a positive amount.".to_string()));
        }
        if !self.sources.borrow().contains(source) {
            return Err(ApiError::Invalid(format!("Unknown source {source}.")));
        }

        self.gateway
            .send(
                ApiRequest::post("users/balance/add")
                    .query("amount", amount)
                    .query("source", source),
            )
            .await?;
        info!("deposited {amount} from {source}");
        self.fetch_balance().await
    }
}
