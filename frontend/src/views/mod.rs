use std::rc::Rc;

use yew::prelude::*;

use crate::auth::AuthService;
use crate::balance::BalanceLedger;
use crate::budget_status::BudgetStatusAggregator;
use crate::config::ClientConfig;
use crate::gateway::{Gateway, GlooTransport, Route};
use crate::investments::InvestmentTracker;
use crate::models::{Budget, Category, Expense};
use crate::session::{AuthStore, LocalStorage};
use crate::sync::{MonthFilter, Synchronizer};

mod app;
mod auth_screen;
mod budgets;
mod dashboard;
mod expenses;
mod icons;
mod investments;
mod layout;

pub use app::App;

/// Everything a page needs to talk to the API, shared through context.
#[derive(Clone, PartialEq)]
pub struct Services {
    pub auth: AuthService,
    pub expenses: Synchronizer<Expense>,
    pub budgets: Synchronizer<Budget>,
    pub statuses: BudgetStatusAggregator,
    pub investments: InvestmentTracker,
    pub ledger: BalanceLedger,
}

impl Services {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            auth: AuthService::new(gateway.clone()),
            expenses: Synchronizer::new(gateway.clone(), MonthFilter::Current),
            budgets: Synchronizer::new(gateway.clone(), ()),
            statuses: BudgetStatusAggregator::new(gateway.clone()),
            investments: InvestmentTracker::new(gateway.clone()),
            ledger: BalanceLedger::new(gateway),
        }
    }

    /// Browser wiring: fetch transport, `localStorage` session slot, page-state navigation.
    pub fn for_browser(config: ClientConfig, navigate: Callback<Route>) -> Self {
        let auth = AuthStore::new(Rc::new(LocalStorage), config.session_key.clone());
        let transport = Rc::new(GlooTransport::new(&config));
        Self::new(Gateway::new(config, auth, transport, Rc::new(navigate)))
    }
}

#[derive(Properties, PartialEq)]
pub struct PageProps {
    pub services: Rc<Services>,
}

pub(crate) fn bind_input(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| {
        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
        state.set(input.value());
    })
}

pub(crate) fn bind_select(state: &UseStateHandle<String>) -> Callback<Event> {
    let state = state.clone();
    Callback::from(move |e: Event| {
        let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
        state.set(select.value());
    })
}

/// The known categories, plus the record's own label when the server stored something else.
pub(crate) fn category_options(selected: &str) -> Html {
    let mut choices = Category::ALL.to_vec();
    if let Ok(current @ Category::Custom(_)) = selected.parse::<Category>() {
        choices.push(current);
    }
    html! {
        <>
            <option value="" selected={selected.is_empty()}>{"Select category"}</option>
            { for choices.into_iter().map(|category| {
                let value = category.to_string();
                let is_selected = value == selected;
                let label = value.clone();
                html! {
                    <option value={value} selected={is_selected}>{ label }</option>
                }
            }) }
        </>
    }
}

pub(crate) fn page_shell(title: &'static str, actions: Html, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-7xl mx-auto">
            <div class="flex items-center justify-between pb-4 border-b border-border">
                <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                { actions }
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

pub(crate) fn error_line(message: &Option<String>) -> Html {
    match message {
        Some(msg) => html! { <p class="text-sm text-red-500">{ msg.clone() }</p> },
        None => html! {},
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum StatIcon {
    Wallet,
    TrendingUp,
    Target,
}

#[derive(Properties, PartialEq)]
pub struct StatCardProps {
    pub title: &'static str,
    pub value: String,
    pub icon: StatIcon,
}

#[function_component(StatCard)]
pub fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-card p-6 rounded-[10px] shadow-sm border border-border flex justify-between items-start">
            <div>
                <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest">{ props.title }</p>
                <h3 class="text-2xl font-bold text-[#1D617A] tracking-tight">{ props.value.clone() }</h3>
            </div>
            <div class="p-3 bg-[#eef4f9] rounded-[10px]">
                {
                    match props.icon {
                        StatIcon::Wallet => icons::icon_wallet(),
                        StatIcon::TrendingUp => icons::icon_trending_up(),
                        StatIcon::Target => icons::icon_target(),
                    }
                }
            </div>
        </div>
    }
}
