//! In-memory stand-ins for the browser and the remote API.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::gateway::{ApiResponse, Gateway, Method, Navigator, Outbound, Route, Transport};
use crate::models::{BalanceSource, Budget, Category, Expense, Investment};
use crate::session::{AuthStore, KeyValueStore};
use crate::sync::{Resource, ResourceId};

pub const BASE_URL: &str = "http://api.test/api";
pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) -> bool {
        self.slots.borrow_mut().remove(key);
        true
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: RefCell<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.borrow_mut().push(route);
    }
}

#[derive(Clone, Debug)]
enum Fault {
    Status(u16, String),
    Network,
}

impl Fault {
    fn into_result(self) -> Result<ApiResponse> {
        match self {
            Fault::Status(status, body) => Ok(ApiResponse { status, body }),
            Fault::Network => Err(ApiError::Network("connection reset".to_string())),
        }
    }
}

struct State {
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
    investments: Vec<Investment>,
    balance: Decimal,
    sources: Vec<BalanceSource>,
    accounts: HashMap<String, String>,
    tokens: HashSet<String>,
    next_id: ResourceId,
    issued: u32,
    upcoming: VecDeque<Option<Fault>>,
    query_faults: Vec<(String, String, Fault)>,
    requests: Vec<Outbound>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            expenses: Vec::new(),
            budgets: Vec::new(),
            investments: Vec::new(),
            balance: Decimal::ZERO,
            sources: ["SALARY", "INVESTMENT", "GIFT", "OTHER"]
                .into_iter()
                .map(|label| BalanceSource(label.to_string()))
                .collect(),
            accounts: HashMap::new(),
            tokens: HashSet::new(),
            next_id: 1,
            issued: 0,
            upcoming: VecDeque::new(),
            query_faults: Vec::new(),
            requests: Vec::new(),
        }
    }
}

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

fn respond(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

fn json_response<T: Serialize>(status: u16, value: &T) -> ApiResponse {
    match serde_json::to_string(value) {
        Ok(body) => ApiResponse { status, body },
        Err(err) => respond(500, &err.to_string()),
    }
}

fn float(value: Decimal) -> Value {
    json!(value.to_f64())
}

fn parse_id(raw: &str) -> Option<ResourceId> {
    raw.parse().ok()
}

fn query<'a>(request: &'a Outbound, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn decode<R: Resource>(mut body: Value, id: ResourceId) -> std::result::Result<R, ApiResponse> {
    body["id"] = json!(id);
    serde_json::from_value(body).map_err(|err| respond(400, &err.to_string()))
}

fn remove<R: Resource>(items: &mut Vec<R>, id: ResourceId) -> ApiResponse {
    match items.iter().position(|item| item.id() == Some(id)) {
        Some(index) => {
            items.remove(index);
            respond(204, "")
        }
        None => respond(404, &format!("{} not found", R::LABEL)),
    }
}

/// A scripted stand-in for the remote API.
#[derive(Default)]
pub struct FakeApi {
    state: RefCell<State>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<Outbound> {
        self.state.borrow().requests.clone()
    }

    pub fn reject_next(&self, status: u16, body: &str) {
        self.state
            .borrow_mut()
            .upcoming
            .push_back(Some(Fault::Status(status, body.to_string())));
    }

    pub fn fail_next_with_network_error(&self) {
        self.state
            .borrow_mut()
            .upcoming
            .push_back(Some(Fault::Network));
    }

    /// Lets `n - 1` requests through untouched, then drops the `n`th.
    pub fn fail_nth_request(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        for _ in 1..n {
            state.upcoming.push_back(None);
        }
        state.upcoming.push_back(Some(Fault::Network));
    }

    /// Every request carrying `key=value` in its query answers with `status`.
    pub fn reject_query(&self, key: &str, value: &str, status: u16) {
        self.state.borrow_mut().query_faults.push((
            key.to_string(),
            value.to_string(),
            Fault::Status(status, "unavailable".to_string()),
        ));
    }

    pub fn register_account(&self, email: &str, password: &str) {
        self.state
            .borrow_mut()
            .accounts
            .insert(email.to_string(), password.to_string());
    }

    pub fn issue_token(&self, token: &str) {
        self.state.borrow_mut().tokens.insert(token.to_string());
    }

    pub fn revoke_sessions(&self) {
        self.state.borrow_mut().tokens.clear();
    }

    pub fn set_balance(&self, balance: Decimal) {
        self.state.borrow_mut().balance = balance;
    }

    pub fn balance(&self) -> Decimal {
        self.state.borrow().balance
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.state.borrow().expenses.clone()
    }

    pub fn budgets(&self) -> Vec<Budget> {
        self.state.borrow().budgets.clone()
    }

    pub fn investments(&self) -> Vec<Investment> {
        self.state.borrow().investments.clone()
    }

    pub fn seed_budget(&self, category: Category, target: i64) -> ResourceId {
        let mut state = self.state.borrow_mut();
        let id = state.take_id();
        state.budgets.push(Budget {
            id: Some(id),
            category,
            target_amount: Decimal::new(target, 0),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap_or_default(),
        });
        id
    }

    pub fn seed_expense(&self, category: Category, amount: Decimal, date: NaiveDate) -> ResourceId {
        let mut state = self.state.borrow_mut();
        let id = state.take_id();
        let description = format!("{category} spend");
        state.expenses.push(Expense {
            id: Some(id),
            category,
            amount,
            expense_date: date,
            description,
        });
        id
    }

    pub fn seed_investment(&self, name: &str, amount: Decimal) -> ResourceId {
        let mut state = self.state.borrow_mut();
        let id = state.take_id();
        let mut investment = Investment::open(name, amount);
        investment.id = Some(id);
        investment.created_at = Some(fixed_now());
        state.investments.push(investment);
        id
    }
}

#[async_trait(?Send)]
impl Transport for FakeApi {
    async fn dispatch(&self, request: Outbound) -> Result<ApiResponse> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        if let Some(Some(fault)) = state.upcoming.pop_front() {
            return fault.into_result();
        }
        let query_fault = state
            .query_faults
            .iter()
            .find(|(key, value, _)| query(&request, key) == Some(value.as_str()))
            .map(|(_, _, fault)| fault.clone());
        if let Some(fault) = query_fault {
            return fault.into_result();
        }

        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .trim_start_matches('/')
            .to_string();
        Ok(state.route(&request, &path))
    }
}

impl State {
    fn take_id(&mut self) -> ResourceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn authorized(&self, request: &Outbound) -> bool {
        request
            .authorization
            .as_deref()
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| self.tokens.contains(token))
    }

    fn route(&mut self, request: &Outbound, path: &str) -> ApiResponse {
        let segments: Vec<&str> = path.split('/').collect();
        let public = matches!(
            segments.as_slice(),
            ["users", "login"] | ["users", "register"] | ["users", "balance", "sources"]
        );
        if !public && !self.authorized(request) {
            return respond(401, "Unauthorized");
        }
        let body: Value = request
            .body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
            .unwrap_or(Value::Null);

        match (request.method, segments.as_slice()) {
            (Method::Post, ["users", "login"]) => self.login(&body),
            (Method::Post, ["users", "register"]) => self.register(&body),
            (Method::Get, ["users", "balance"]) => respond(200, &self.balance.to_string()),
            (Method::Get, ["users", "balance", "sources"]) => json_response(200, &self.sources),
            (Method::Post, ["users", "balance", "add"]) => self.add_balance(request),

            (Method::Get, ["expenses", "monthly"]) => self.monthly_expenses(request),
            (Method::Post, ["expenses"]) => self.save_expense(body, None),
            (Method::Put, ["expenses", id]) => match parse_id(id) {
                Some(id) => self.save_expense(body, Some(id)),
                None => respond(400, "bad id"),
            },
            (Method::Delete, ["expenses", id]) => match parse_id(id) {
                Some(id) => remove(&mut self.expenses, id),
                None => respond(400, "bad id"),
            },

            (Method::Get, ["budgets"]) => json_response(200, &self.budgets),
            (Method::Get, ["budgets", "status"]) => self.budget_status(request),
            (Method::Post, ["budgets"]) => self.save_budget(body, None),
            (Method::Put, ["budgets", id]) => match parse_id(id) {
                Some(id) => self.save_budget(body, Some(id)),
                None => respond(400, "bad id"),
            },
            (Method::Delete, ["budgets", id]) => match parse_id(id) {
                Some(id) => remove(&mut self.budgets, id),
                None => respond(400, "bad id"),
            },

            (Method::Get, ["investments"]) => json_response(200, &self.investments),
            (Method::Get, ["investments", id]) => {
                match self
                    .investments
                    .iter()
                    .find(|investment| investment.id.is_some() && investment.id == parse_id(id))
                {
                    Some(investment) => json_response(200, investment),
                    None => respond(404, "Investment not found"),
                }
            }
            (Method::Post, ["investments"]) => self.open_investment(body),
            (Method::Put, ["investments", id]) => match parse_id(id) {
                Some(id) => self.edit_investment(&body, id),
                None => respond(400, "bad id"),
            },
            (Method::Post, ["investments", id, "close"]) => match parse_id(id) {
                Some(id) => self.close_investment(&body, id),
                None => respond(400, "bad id"),
            },
            (Method::Delete, ["investments", id]) => match parse_id(id) {
                Some(id) => self.delete_investment(id),
                None => respond(400, "bad id"),
            },

            _ => respond(404, "Not Found"),
        }
    }

    fn login(&mut self, body: &Value) -> ApiResponse {
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        if self.accounts.get(email).map(String::as_str) != Some(password) {
            return respond(401, "Invalid email or password");
        }
        self.issued += 1;
        let token = format!("token-{}", self.issued);
        self.tokens.insert(token.clone());
        json_response(200, &json!({ "accessToken": token, "tokenType": "Bearer" }))
    }

    fn register(&mut self, body: &Value) -> ApiResponse {
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default().to_string();
        if self.accounts.contains_key(&email) {
            return respond(400, "Email already registered");
        }
        self.accounts.insert(email, password);
        respond(200, "User registered successfully!")
    }

    fn add_balance(&mut self, request: &Outbound) -> ApiResponse {
        let amount = query(request, "amount").and_then(|raw| raw.parse::<Decimal>().ok());
        let source = query(request, "source");
        match (amount, source) {
            (Some(amount), Some(source))
                if self.sources.iter().any(|known| known.as_str() == source) =>
            {
                self.balance += amount;
                respond(200, "Balance added successfully")
            }
            _ => respond(400, "Invalid amount or source"),
        }
    }

    fn monthly_expenses(&self, request: &Outbound) -> ApiResponse {
        let year = query(request, "year").and_then(|raw| raw.parse::<i32>().ok());
        let month = query(request, "month").and_then(|raw| raw.parse::<u32>().ok());
        let (Some(year), Some(month)) = (year, month) else {
            return respond(400, "year and month are required");
        };
        let listed: Vec<&Expense> = self
            .expenses
            .iter()
            .filter(|expense| {
                expense.expense_date.year() == year && expense.expense_date.month() == month
            })
            .collect();
        json_response(200, &listed)
    }

    fn save_expense(&mut self, body: Value, id: Option<ResourceId>) -> ApiResponse {
        let id = match id {
            Some(id) if !self.expenses.iter().any(|e| e.id == Some(id)) => {
                return respond(404, "expense not found")
            }
            Some(id) => id,
            None => self.take_id(),
        };
        let expense: Expense = match decode(body, id) {
            Ok(expense) => expense,
            Err(response) => return response,
        };
        if expense.amount <= Decimal::ZERO {
            return respond(400, "Amount must be positive");
        }
        match self.expenses.iter_mut().find(|e| e.id == Some(id)) {
            Some(existing) => {
                *existing = expense.clone();
                json_response(200, &expense)
            }
            None => {
                self.expenses.push(expense.clone());
                json_response(201, &expense)
            }
        }
    }

    fn save_budget(&mut self, body: Value, id: Option<ResourceId>) -> ApiResponse {
        let id = match id {
            Some(id) if !self.budgets.iter().any(|b| b.id == Some(id)) => {
                return respond(404, "budget not found")
            }
            Some(id) => id,
            None => self.take_id(),
        };
        let budget: Budget = match decode(body, id) {
            Ok(budget) => budget,
            Err(response) => return response,
        };
        if budget.target_amount <= Decimal::ZERO {
            return respond(400, "Target amount must be positive");
        }
        if budget.end_date < budget.start_date {
            return respond(400, "End date must be after start date");
        }
        match self.budgets.iter_mut().find(|b| b.id == Some(id)) {
            Some(existing) => {
                *existing = budget.clone();
                json_response(200, &budget)
            }
            None => {
                self.budgets.push(budget.clone());
                json_response(201, &budget)
            }
        }
    }

    fn budget_status(&self, request: &Outbound) -> ApiResponse {
        let category = query(request, "category").unwrap_or_default();
        let Some(budget) = self
            .budgets
            .iter()
            .find(|budget| budget.category.as_str() == category)
        else {
            return respond(
                404,
                &format!("No active budget found for category: {category}"),
            );
        };
        let spent: Decimal = self
            .expenses
            .iter()
            .filter(|expense| expense.category == budget.category)
            .map(|expense| expense.amount)
            .sum();
        json_response(
            200,
            &json!({
                "budget": budget,
                "targetAmount": float(budget.target_amount),
                "spent": float(spent),
            }),
        )
    }

    fn open_investment(&mut self, body: Value) -> ApiResponse {
        let id = self.take_id();
        let mut investment: Investment = match decode(body, id) {
            Ok(investment) => investment,
            Err(response) => return response,
        };
        if self.balance < investment.amount {
            return respond(400, "Insufficient balance");
        }
        self.balance -= investment.amount;
        investment.is_active = true;
        investment.created_at = Some(fixed_now());
        investment.closed_at = None;
        investment.profit_loss = None;
        self.investments.push(investment.clone());
        json_response(200, &investment)
    }

    fn edit_investment(&mut self, body: &Value, id: ResourceId) -> ApiResponse {
        let Some(investment) = self.investments.iter_mut().find(|i| i.id == Some(id)) else {
            return respond(404, "Investment not found");
        };
        if let Some(name) = body["name"].as_str() {
            investment.name = name.to_string();
        }
        if let Some(amount) = body
            .get("amount")
            .and_then(|raw| raw.to_string().parse::<Decimal>().ok())
        {
            investment.amount = amount;
        }
        json_response(200, &investment.clone())
    }

    fn close_investment(&mut self, body: &Value, id: ResourceId) -> ApiResponse {
        let profit_loss = match body.get("profitLoss").map(|raw| raw.to_string()) {
            Some(raw) => match raw.parse::<Decimal>() {
                Ok(value) => value,
                Err(_) => return respond(400, "profitLoss is required"),
            },
            None => return respond(400, "profitLoss is required"),
        };
        let Some(investment) = self.investments.iter_mut().find(|i| i.id == Some(id)) else {
            return respond(404, "Investment not found");
        };
        if !investment.is_active {
            return respond(400, "Investment is already closed");
        }
        investment.is_active = false;
        investment.closed_at = Some(fixed_now());
        investment.profit_loss = Some(profit_loss);
        let returned = investment.amount + profit_loss;
        let closed = investment.clone();
        self.balance += returned;
        json_response(200, &closed)
    }

    fn delete_investment(&mut self, id: ResourceId) -> ApiResponse {
        let refund = self
            .investments
            .iter()
            .find(|i| i.id == Some(id))
            .filter(|i| i.is_active)
            .map(|i| i.amount);
        let response = remove(&mut self.investments, id);
        if response.status == 204 {
            self.balance += refund.unwrap_or_default();
        }
        response
    }
}

/// A gateway wired to the fake API, in-memory storage and a recording navigator.
pub struct Harness {
    pub api: Rc<FakeApi>,
    pub storage: Rc<MemoryStorage>,
    pub auth: AuthStore,
    pub navigator: Rc<RecordingNavigator>,
    pub gateway: Gateway,
}

impl Harness {
    pub fn new() -> Self {
        let api = Rc::new(FakeApi::default());
        let storage = Rc::new(MemoryStorage::default());
        let auth = AuthStore::new(storage.clone(), "jwtToken");
        let navigator = Rc::new(RecordingNavigator::default());
        let gateway = Gateway::new(
            ClientConfig::default().with_base_url(BASE_URL),
            auth.clone(),
            api.clone(),
            navigator.clone(),
        );
        Self {
            api,
            storage,
            auth,
            navigator,
            gateway,
        }
    }

    pub fn signed_in() -> Self {
        let harness = Self::new();
        harness.api.issue_token(TEST_TOKEN);
        harness.auth.set_session(TEST_TOKEN, "Bearer");
        harness
    }

    pub fn storage_value(&self) -> Option<String> {
        self.storage.get("jwtToken")
    }
}
