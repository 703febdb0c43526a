use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::icons::{icon_pencil, icon_plus, icon_trash};
use super::{bind_input, bind_select, category_options, error_line, page_shell, PageProps};
use crate::budget_status::{BudgetStatusAggregator, StatusBoard};
use crate::form::EditForm;
use crate::format::{format_currency, format_date, CURRENCY_SYMBOL};
use crate::models::{parse_amount, parse_date, Budget, BudgetStatus, Category, Standing};
use crate::sync::ResourceId;

fn blank_budget() -> Budget {
    let today = Local::now().date_naive();
    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    Budget {
        id: None,
        category: Category::Other,
        target_amount: Decimal::ZERO,
        start_date: month_start,
        end_date: today,
    }
}

/// Statuses land on the board one by one as each category answers.
fn refresh_statuses(
    aggregator: BudgetStatusAggregator,
    budgets: Vec<Budget>,
    board: UseReducerDispatcher<StatusBoard>,
) {
    spawn_local(async move {
        aggregator
            .fan_out(&budgets, |update| board.dispatch(update))
            .await;
    });
}

#[derive(Clone)]
struct BudgetInputs {
    category: UseStateHandle<String>,
    target: UseStateHandle<String>,
    start_date: UseStateHandle<String>,
    end_date: UseStateHandle<String>,
}

impl BudgetInputs {
    fn load(&self, form: &EditForm<Budget>) {
        let budget = form.current();
        if form.is_editing() {
            self.category.set(budget.category.to_string());
            self.target.set(budget.target_amount.to_string());
        } else {
            self.category.set(String::new());
            self.target.set(String::new());
        }
        self.start_date
            .set(budget.start_date.format("%Y-%m-%d").to_string());
        self.end_date
            .set(budget.end_date.format("%Y-%m-%d").to_string());
    }

    fn draft(&self, base: &Budget) -> Option<Budget> {
        Some(Budget {
            category: self.category.parse().ok()?,
            target_amount: parse_amount(&self.target)?,
            start_date: parse_date(&self.start_date)?,
            end_date: parse_date(&self.end_date)?,
            ..base.clone()
        })
    }
}

fn status_block(status: Option<&BudgetStatus>) -> Html {
    let Some(status) = status else {
        return html! { <p class="text-xs text-muted-foreground">{"Status unavailable"}</p> };
    };
    let spent = match status.spent {
        Some(spent) => format_currency(spent, CURRENCY_SYMBOL),
        None => "unknown".to_string(),
    };
    let standing = match status.standing() {
        Some(Standing::Remaining(left)) => html! {
            <span class="text-green-600">{ format!("{} remaining", format_currency(left, CURRENCY_SYMBOL)) }</span>
        },
        Some(Standing::Overage(over)) => html! {
            <span class="text-red-500">{ format!("{} over budget", format_currency(over, CURRENCY_SYMBOL)) }</span>
        },
        None => html! {},
    };
    let width = status
        .percent_used()
        .map(|pct| pct.min(Decimal::ONE_HUNDRED).to_string())
        .unwrap_or_else(|| "0".to_string());

    html! {
        <div class="space-y-1">
            <div class="flex justify-between text-xs text-muted-foreground">
                <span>{ format!("Spent {spent}") }</span>
                { standing }
            </div>
            <div class="h-2 bg-muted rounded">
                <div class="h-2 bg-[#1D617A] rounded" style={format!("width: {width}%")}></div>
            </div>
        </div>
    }
}

#[function_component(BudgetsPage)]
pub fn budgets_page(props: &PageProps) -> Html {
    let sync = props.services.budgets.clone();
    let aggregator = props.services.statuses.clone();
    let items = {
        let sync = sync.clone();
        use_state(move || sync.items())
    };
    let board = use_reducer(StatusBoard::default);
    let loading = use_state(|| true);
    let list_error = use_state(|| None::<String>);
    let form = use_state(|| None::<EditForm<Budget>>);
    let saving = use_state(|| false);
    let inputs = BudgetInputs {
        category: use_state(String::new),
        target: use_state(String::new),
        start_date: use_state(String::new),
        end_date: use_state(String::new),
    };

    {
        let sync = sync.clone();
        let aggregator = aggregator.clone();
        let items = items.clone();
        let loading = loading.clone();
        let list_error = list_error.clone();
        let dispatcher = board.dispatcher();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match sync.list().await {
                        Ok(list) => {
                            items.set(list.clone());
                            refresh_statuses(aggregator, list, dispatcher);
                        }
                        Err(err) => list_error.set(Some(err.user_message())),
                    }
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    let open_form = {
        let form = form.clone();
        let inputs = inputs.clone();
        let list_error = list_error.clone();
        Callback::from(move |record: Option<Budget>| {
            let next = match record {
                Some(record) => match EditForm::for_edit(record) {
                    Ok(next) => next,
                    Err(err) => {
                        list_error.set(Some(err.user_message()));
                        return;
                    }
                },
                None => EditForm::for_create(blank_budget()),
            };
            inputs.load(&next);
            form.set(Some(next));
        })
    };

    let on_cancel = {
        let form = form.clone();
        Callback::from(move |_| form.set(None))
    };

    let on_submit = {
        let sync = sync.clone();
        let aggregator = aggregator.clone();
        let form = form.clone();
        let items = items.clone();
        let saving = saving.clone();
        let inputs = inputs.clone();
        let dispatcher = board.dispatcher();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(current) = (*form).clone() else {
                return;
            };
            let Some(draft) = inputs.draft(&current.base) else {
                form.set(Some(current.with_error("Please complete all fields.")));
                return;
            };

            saving.set(true);
            let sync = sync.clone();
            let aggregator = aggregator.clone();
            let form = form.clone();
            let items = items.clone();
            let saving = saving.clone();
            let dispatcher = dispatcher.clone();
            spawn_local(async move {
                match current.submit(&sync, draft).await {
                    Ok(_) => {
                        form.set(None);
                        let list = sync.items();
                        items.set(list.clone());
                        refresh_statuses(aggregator, list, dispatcher);
                    }
                    Err(failed) => form.set(Some(failed)),
                }
                saving.set(false);
            });
        })
    };

    let on_delete = {
        let sync = sync.clone();
        let aggregator = aggregator.clone();
        let items = items.clone();
        let list_error = list_error.clone();
        let dispatcher = board.dispatcher();
        Callback::from(move |id: ResourceId| {
            let sync = sync.clone();
            let aggregator = aggregator.clone();
            let items = items.clone();
            let list_error = list_error.clone();
            let dispatcher = dispatcher.clone();
            spawn_local(async move {
                match sync.delete(id).await {
                    Ok(()) => {
                        list_error.set(None);
                        let list = sync.items();
                        items.set(list.clone());
                        refresh_statuses(aggregator, list, dispatcher);
                    }
                    Err(err) => list_error.set(Some(err.user_message())),
                }
            });
        })
    };

    let actions = {
        let open_form = open_form.clone();
        html! {
            <button onclick={Callback::from(move |_| open_form.emit(None))} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-lg">
                { icon_plus() }
                <span>{"Add Budget"}</span>
            </button>
        }
    };

    let form_panel = match &*form {
        Some(current) => html! {
            <form class="bg-card rounded-[10px] p-6 border border-border space-y-3" onsubmit={on_submit}>
                <h3 class="font-bold text-foreground text-lg">{ if current.is_editing() { "Edit Budget" } else { "Add New Budget" } }</h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    <select class="p-2 border rounded" required={true} onchange={bind_select(&inputs.category)}>
                        { category_options(&inputs.category) }
                    </select>
                    <input type="number" step="0.01" placeholder="Target amount" required={true} class="p-2 border rounded"
                        value={(*inputs.target).clone()} oninput={bind_input(&inputs.target)} />
                    <label class="text-xs text-muted-foreground">{"Start date"}
                        <input type="date" required={true} class="p-2 border rounded w-full"
                            value={(*inputs.start_date).clone()} oninput={bind_input(&inputs.start_date)} />
                    </label>
                    <label class="text-xs text-muted-foreground">{"End date"}
                        <input type="date" required={true} class="p-2 border rounded w-full"
                            value={(*inputs.end_date).clone()} oninput={bind_input(&inputs.end_date)} />
                    </label>
                </div>
                { error_line(&current.error) }
                <div class="flex justify-end gap-2">
                    <button type="button" onclick={on_cancel} class="px-4 py-2 border rounded">{"Cancel"}</button>
                    <button type="submit" disabled={*saving} class="bg-primary text-primary-foreground px-4 py-2 rounded">
                        { if *saving { "Saving..." } else if current.is_editing() { "Update Budget" } else { "Add Budget" } }
                    </button>
                </div>
            </form>
        },
        None => html! {},
    };

    let cards = if *loading {
        html! { <p class="text-sm text-muted-foreground">{"Loading..."}</p> }
    } else if items.is_empty() {
        html! { <p class="text-sm text-muted-foreground">{"No budgets yet."}</p> }
    } else {
        html! {
            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
                { for items.iter().map(|budget| {
                    let edit = {
                        let open_form = open_form.clone();
                        let budget = budget.clone();
                        Callback::from(move |_| open_form.emit(Some(budget.clone())))
                    };
                    let delete = {
                        let on_delete = on_delete.clone();
                        let id = budget.id;
                        Callback::from(move |_| {
                            if let Some(id) = id {
                                on_delete.emit(id);
                            }
                        })
                    };
                    html! {
                        <div key={budget.id.unwrap_or_default()} class="bg-card p-5 rounded-[10px] border border-border space-y-3">
                            <div class="flex justify-between items-start">
                                <div>
                                    <h3 class="font-bold text-foreground">{ budget.category.to_string() }</h3>
                                    <p class="text-xs text-muted-foreground">
                                        { format!("{} to {}", format_date(budget.start_date), format_date(budget.end_date)) }
                                    </p>
                                </div>
                                <div class="flex gap-2">
                                    <button onclick={edit} aria-label="Edit">{ icon_pencil() }</button>
                                    <button onclick={delete} aria-label="Delete">{ icon_trash() }</button>
                                </div>
                            </div>
                            <p class="text-xl font-bold text-[#1D617A]">{ format_currency(budget.target_amount, CURRENCY_SYMBOL) }</p>
                            { status_block(board.get(&budget.category)) }
                        </div>
                    }
                }) }
            </div>
        }
    };

    html! {
        { page_shell(
            "Budget Management",
            actions,
            html! {
                <>
                    { form_panel }
                    { error_line(&list_error) }
                    if sync.is_stale() {
                        <p class="text-xs text-muted-foreground">{"Saved, but the list could not be refreshed."}</p>
                    }
                    { cards }
                </>
            }
        ) }
    }
}
