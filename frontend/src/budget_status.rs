use std::collections::HashMap;
use std::rc::Rc;

use futures::stream::{FuturesUnordered, StreamExt};
use log::warn;
use yew::Reducible;

use crate::error::Result;
use crate::gateway::{ApiRequest, Gateway};
use crate::models::{Budget, BudgetStatus, Category};

/// One category's freshly fetched status.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    pub category: Category,
    pub status: BudgetStatus,
}

/// Category → latest successfully fetched status.
///
/// Writes are keyed and never touch other categories, so updates commute. Entries for
/// categories that no longer have a budget are left in place and simply go unread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusBoard {
    entries: HashMap<Category, BudgetStatus>,
}

impl StatusBoard {
    pub fn merge(&mut self, update: StatusUpdate) {
        self.entries.insert(update.category, update.status);
    }

    pub fn get(&self, category: &Category) -> Option<&BudgetStatus> {
        self.entries.get(category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Reducible for StatusBoard {
    type Action = StatusUpdate;

    fn reduce(self: Rc<Self>, action: StatusUpdate) -> Rc<Self> {
        let mut next = (*self).clone();
        next.merge(action);
        Rc::new(next)
    }
}

/// Each category once, in first-seen order.
pub fn distinct_categories(budgets: &[Budget]) -> Vec<Category> {
    let mut seen = Vec::new();
    for budget in budgets {
        if !seen.contains(&budget.category) {
            seen.push(budget.category.clone());
        }
    }
    seen
}

#[derive(Clone, PartialEq)]
pub struct BudgetStatusAggregator {
    gateway: Gateway,
}

impl BudgetStatusAggregator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self, category: Category) -> Result<BudgetStatus> {
        self.gateway
            .fetch(ApiRequest::get("budgets/status").query("category", category))
            .await
    }

    /// Requests every distinct category concurrently and hands each success to `apply` as it
    /// lands. A failed category is skipped, so whatever the board already held for it stays,
    /// and nothing is written in its place. Returns the categories that failed.
    pub async fn fan_out(
        &self,
        budgets: &[Budget],
        mut apply: impl FnMut(StatusUpdate),
    ) -> Vec<Category> {
        let mut pending: FuturesUnordered<_> = distinct_categories(budgets)
            .into_iter()
            .map(|category| async move {
                let outcome = self.fetch(category.clone()).await;
                (category, outcome)
            })
            .collect();

        let mut failed = Vec::new();
        while let Some((category, outcome)) = pending.next().await {
            match outcome {
                Ok(status) => apply(StatusUpdate { category, status }),
                Err(err) => {
                    warn!("status for {category} unavailable: {err}");
                    failed.push(category);
                }
            }
        }
        failed
    }

    pub async fn refresh(&self, budgets: &[Budget], board: &mut StatusBoard) -> Vec<Category> {
        self.fan_out(budgets, |update| board.merge(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Method;
    use crate::sync::Synchronizer;
    use crate::testing::Harness;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn status(target: i64, spent: i64) -> BudgetStatus {
        BudgetStatus {
            budget: None,
            target_amount: Decimal::new(target, 0),
            spent: Some(Decimal::new(spent, 0)),
        }
    }

    fn status_requests(harness: &Harness) -> Vec<String> {
        harness
            .api
            .requests()
            .into_iter()
            .filter(|request| request.method == Method::Get && request.url.ends_with("/budgets/status"))
            .map(|request| request.query[0].1.clone())
            .collect()
    }

    #[test]
    fn merge_is_keyed_and_order_independent() {
        let updates = vec![
            StatusUpdate { category: Category::Food, status: status(300, 10) },
            StatusUpdate { category: Category::Housing, status: status(900, 900) },
            StatusUpdate { category: Category::Food, status: status(300, 40) },
        ];

        let mut forward = StatusBoard::default();
        updates.iter().cloned().for_each(|u| forward.merge(u));

        // same per-key order, categories interleaved differently
        let mut shuffled = StatusBoard::default();
        shuffled.merge(updates[0].clone());
        shuffled.merge(updates[2].clone());
        shuffled.merge(updates[1].clone());

        assert_eq!(forward, shuffled);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward.get(&Category::Food), Some(&status(300, 40)));
    }

    #[test]
    fn reducer_leaves_other_keys_alone() {
        let board = Rc::new(StatusBoard::default());
        let board = board.reduce(StatusUpdate { category: Category::Food, status: status(300, 10) });
        let board = board.reduce(StatusUpdate { category: Category::Utilities, status: status(80, 90) });
        assert_eq!(board.get(&Category::Food), Some(&status(300, 10)));
        assert_eq!(board.get(&Category::Utilities), Some(&status(80, 90)));
        assert_eq!(board.get(&Category::Housing), None);
    }

    #[tokio::test]
    async fn duplicate_categories_are_fetched_once() {
        let harness = Harness::signed_in();
        harness.api.seed_budget(Category::Food, 300);
        harness.api.seed_budget(Category::Food, 300);
        harness.api.seed_budget(Category::Housing, 900);
        harness.api.seed_expense(
            Category::Food,
            Decimal::new(4250, 2),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );

        let budgets = Synchronizer::<Budget>::new(harness.gateway.clone(), ());
        let listed = budgets.list().await.unwrap();
        let aggregator = BudgetStatusAggregator::new(harness.gateway.clone());
        let mut board = StatusBoard::default();
        let failed = aggregator.refresh(&listed, &mut board).await;

        assert!(failed.is_empty());
        let mut asked = status_requests(&harness);
        asked.sort();
        assert_eq!(asked, vec!["Food".to_string(), "Housing".to_string()]);
        assert_eq!(board.len(), 2);

        // both Food cards read the same entry
        let food = board.get(&listed[0].category).unwrap();
        assert_eq!(board.get(&listed[1].category), Some(food));
        assert_eq!(food.spent, Some(Decimal::new(4250, 2)));
        assert_eq!(food.target_amount, Decimal::new(300, 0));
    }

    #[tokio::test]
    async fn one_failed_category_leaves_siblings_intact() {
        let harness = Harness::signed_in();
        harness.api.seed_budget(Category::Food, 300);
        harness.api.seed_budget(Category::Healthcare, 150);
        harness.api.reject_query("category", "Healthcare", 500);

        let budgets = Synchronizer::<Budget>::new(harness.gateway.clone(), ());
        let listed = budgets.list().await.unwrap();
        let aggregator = BudgetStatusAggregator::new(harness.gateway.clone());
        let mut board = StatusBoard::default();
        let failed = aggregator.refresh(&listed, &mut board).await;

        assert_eq!(failed, vec![Category::Healthcare]);
        assert!(board.get(&Category::Food).is_some());
        assert_eq!(board.get(&Category::Healthcare), None);
        assert!(harness.auth.has_session());
    }

    #[tokio::test]
    async fn deleted_budget_leaves_an_unread_entry() {
        let harness = Harness::signed_in();
        let food = harness.api.seed_budget(Category::Food, 300);
        harness.api.seed_budget(Category::Housing, 900);

        let budgets = Synchronizer::<Budget>::new(harness.gateway.clone(), ());
        let aggregator = BudgetStatusAggregator::new(harness.gateway.clone());
        let mut board = StatusBoard::default();
        aggregator
            .refresh(&budgets.list().await.unwrap(), &mut board)
            .await;

        budgets.delete(food).await.unwrap();
        aggregator.refresh(&budgets.items(), &mut board).await;

        assert_eq!(distinct_categories(&budgets.items()), vec![Category::Housing]);
        assert!(board.get(&Category::Food).is_some());
        assert_eq!(board.len(), 2);
    }

    #[tokio::test]
    async fn custom_labels_get_their_own_status() {
        let harness = Harness::signed_in();
        let pets = Category::Custom("Pets".to_string());
        let pets_id = harness.api.seed_budget(pets.clone(), 200);
        harness.api.seed_budget(Category::Other, 500);
        harness.api.seed_expense(
            Category::Other,
            Decimal::new(75, 0),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        );

        let budgets = Synchronizer::<Budget>::new(harness.gateway.clone(), ());
        let listed = budgets.list().await.unwrap();
        let aggregator = BudgetStatusAggregator::new(harness.gateway.clone());
        let mut board = StatusBoard::default();
        assert!(aggregator.refresh(&listed, &mut board).await.is_empty());

        let mut asked = status_requests(&harness);
        asked.sort();
        assert_eq!(asked, vec!["Other".to_string(), "Pets".to_string()]);
        assert_eq!(board.get(&pets).unwrap().target_amount, Decimal::new(200, 0));
        assert_eq!(board.get(&pets).unwrap().spent, Some(Decimal::ZERO));
        assert_eq!(board.get(&Category::Other).unwrap().spent, Some(Decimal::new(75, 0)));

        let mut edited = listed
            .into_iter()
            .find(|budget| budget.id == Some(pets_id))
            .unwrap();
        edited.target_amount = Decimal::new(250, 0);
        budgets.update(pets_id, &edited).await.unwrap();

        let put = harness
            .api
            .requests()
            .into_iter()
            .find(|request| request.method == Method::Put)
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(put.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["category"], serde_json::json!("Pets"));
        assert!(harness.api.budgets().iter().any(|budget| budget.category == pets));
    }

    #[test]
    fn distinct_keeps_first_seen_order() {
        let budget = |category| Budget {
            id: None,
            category,
            target_amount: Decimal::ONE,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let budgets = vec![
            budget(Category::Other),
            budget(Category::Food),
            budget(Category::Other),
        ];
        assert_eq!(
            distinct_categories(&budgets),
            vec![Category::Other, Category::Food]
        );
    }
}
