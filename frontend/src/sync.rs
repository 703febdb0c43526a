use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{Datelike, Local, NaiveDate};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::gateway::{ApiRequest, Gateway};

pub type ResourceId = i64;

/// A CRUD-managed entity family with its own endpoint family under `COLLECTION`.
pub trait Resource: Clone + PartialEq + Serialize + DeserializeOwned + 'static {
    type Filter: Clone + PartialEq + fmt::Debug;

    const COLLECTION: &'static str;
    const LABEL: &'static str;

    fn id(&self) -> Option<ResourceId>;

    fn list_request(_filter: &Self::Filter) -> ApiRequest {
        ApiRequest::get(Self::COLLECTION)
    }

    fn item_path(id: ResourceId) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }
}

/// Expenses are only ever listed one calendar month at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonthFilter {
    /// Whatever month it is when the list is requested, not when the filter was built.
    Current,
    Month { year: i32, month: u32 },
}

impl MonthFilter {
    pub fn containing(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `(year, month)` to ask for, given today's date.
    pub fn resolve_on(self, today: NaiveDate) -> (i32, u32) {
        match self {
            Self::Current => (today.year(), today.month()),
            Self::Month { year, month } => (year, month),
        }
    }

    pub fn resolve(self) -> (i32, u32) {
        self.resolve_on(Local::now().date_naive())
    }
}

/// List/create/update/delete for one resource kind.
///
/// Writes never patch the cached list. After every successful write the list is read again, so
/// ids and server-computed fields always come from the server.
pub struct Synchronizer<R: Resource> {
    gateway: Gateway,
    filter: R::Filter,
    items: Rc<RefCell<Vec<R>>>,
    stale: Rc<RefCell<bool>>,
}

impl<R: Resource> Clone for Synchronizer<R> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            filter: self.filter.clone(),
            items: self.items.clone(),
            stale: self.stale.clone(),
        }
    }
}

impl<R: Resource> PartialEq for Synchronizer<R> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items) && self.filter == other.filter
    }
}

impl<R: Resource> Synchronizer<R> {
    pub fn new(gateway: Gateway, filter: R::Filter) -> Self {
        Self {
            gateway,
            filter,
            items: Rc::new(RefCell::new(Vec::new())),
            stale: Rc::new(RefCell::new(false)),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn filter(&self) -> &R::Filter {
        &self.filter
    }

    /// The latest snapshot read from the server.
    pub fn items(&self) -> Vec<R> {
        self.items.borrow().clone()
    }

    /// True when a write went through but the follow-up read failed.
    pub fn is_stale(&self) -> bool {
        *self.stale.borrow()
    }

    pub async fn list(&self) -> Result<Vec<R>> {
        let fresh: Vec<R> = self
            .gateway
            .fetch(R::list_request(&self.filter))
            .await?;
        *self.items.borrow_mut() = fresh.clone();
        *self.stale.borrow_mut() = false;
        Ok(fresh)
    }

    pub async fn create(&self, draft: &R) -> Result<R> {
        let request = ApiRequest::post(R::COLLECTION).json(draft)?;
        let created: R = self.gateway.fetch(request).await?;
        info!("created {} {:?}", R::LABEL, created.id());
        self.resync().await;
        Ok(created)
    }

    pub async fn update(&self, id: ResourceId, draft: &R) -> Result<R> {
        let request = ApiRequest::put(R::item_path(id)).json(draft)?;
        let updated: R = self.gateway.fetch(request).await?;
        info!("updated {} {id}", R::LABEL);
        self.resync().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: ResourceId) -> Result<()> {
        self.gateway
            .send(ApiRequest::delete(R::item_path(id)))
            .await?;
        info!("deleted {} {id}", R::LABEL);
        self.resync().await;
        Ok(())
    }

    pub async fn fetch_one(&self, id: ResourceId) -> Result<R> {
        self.gateway.fetch(ApiRequest::get(R::item_path(id))).await
    }

    /// The write already happened, so a failed re-read is not the caller's error. The old
    /// snapshot stays and is flagged stale until the next successful `list`.
    pub(crate) async fn resync(&self) {
        if let Err(err) = self.list().await {
            warn!("could not refresh {} list: {err}", R::LABEL);
            *self.stale.borrow_mut() = true;
        }
    }
}

/// Rejects a write that has no id to address.
pub fn require_id<R: Resource>(record: &R) -> Result<ResourceId> {
    record
        .id()
        .ok_or_else(|| ApiError::Invalid(format!("this {} has not been saved yet", R::LABEL)))
}
