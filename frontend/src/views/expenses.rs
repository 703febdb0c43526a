use chrono::Local;
use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::icons::{icon_pencil, icon_plus, icon_trash};
use super::{bind_input, bind_select, category_options, error_line, page_shell, PageProps};
use crate::form::EditForm;
use crate::format::{format_currency, format_date, CURRENCY_SYMBOL};
use crate::models::{parse_amount, parse_date, Category, Expense};
use crate::sync::ResourceId;

const INCOMPLETE: &str = "Please complete all fields.";

fn blank_expense() -> Expense {
    Expense {
        id: None,
        category: Category::Other,
        amount: Decimal::ZERO,
        expense_date: Local::now().date_naive(),
        description: String::new(),
    }
}

#[derive(Clone)]
struct ExpenseInputs {
    category: UseStateHandle<String>,
    amount: UseStateHandle<String>,
    expense_date: UseStateHandle<String>,
    description: UseStateHandle<String>,
}

impl ExpenseInputs {
    fn load(&self, form: &EditForm<Expense>) {
        let expense = form.current();
        if form.is_editing() {
            self.category.set(expense.category.to_string());
            self.amount.set(expense.amount.to_string());
            self.description.set(expense.description.clone());
        } else {
            self.category.set(String::new());
            self.amount.set(String::new());
            self.description.set(String::new());
        }
        self.expense_date
            .set(expense.expense_date.format("%Y-%m-%d").to_string());
    }

    /// Lays the typed values over `base`; `None` if any field is missing.
    fn draft(&self, base: &Expense) -> Option<Expense> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return None;
        }
        Some(Expense {
            category: self.category.parse().ok()?,
            amount: parse_amount(&self.amount)?,
            expense_date: parse_date(&self.expense_date)?,
            description,
            ..base.clone()
        })
    }
}

#[function_component(ExpensesPage)]
pub fn expenses_page(props: &PageProps) -> Html {
    let sync = props.services.expenses.clone();
    let items = {
        let sync = sync.clone();
        use_state(move || sync.items())
    };
    let loading = use_state(|| true);
    let list_error = use_state(|| None::<String>);
    let form = use_state(|| None::<EditForm<Expense>>);
    let saving = use_state(|| false);
    let inputs = ExpenseInputs {
        category: use_state(String::new),
        amount: use_state(String::new),
        expense_date: use_state(String::new),
        description: use_state(String::new),
    };

    {
        let sync = sync.clone();
        let items = items.clone();
        let loading = loading.clone();
        let list_error = list_error.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match sync.list().await {
                        Ok(list) => items.set(list),
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
        Callback::from(move |record: Option<Expense>| {
            let next = match record {
                Some(record) => match EditForm::for_edit(record) {
                    Ok(next) => next,
                    Err(err) => {
                        list_error.set(Some(err.user_message()));
                        return;
                    }
                },
                None => EditForm::for_create(blank_expense()),
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
        let form = form.clone();
        let items = items.clone();
        let saving = saving.clone();
        let inputs = inputs.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(current) = (*form).clone() else {
                return;
            };
            let Some(draft) = inputs.draft(&current.base) else {
                form.set(Some(current.with_error(INCOMPLETE)));
                return;
            };

            saving.set(true);
            let sync = sync.clone();
            let form = form.clone();
            let items = items.clone();
            let saving = saving.clone();
            spawn_local(async move {
                match current.submit(&sync, draft).await {
                    Ok(_) => {
                        form.set(None);
                        items.set(sync.items());
                    }
                    Err(failed) => form.set(Some(failed)),
                }
                saving.set(false);
            });
        })
    };

    let on_delete = {
        let sync = sync.clone();
        let items = items.clone();
        let list_error = list_error.clone();
        Callback::from(move |id: ResourceId| {
            let sync = sync.clone();
            let items = items.clone();
            let list_error = list_error.clone();
            spawn_local(async move {
                match sync.delete(id).await {
                    Ok(()) => {
                        list_error.set(None);
                        items.set(sync.items());
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
                <span>{"Add Expense"}</span>
            </button>
        }
    };

    let form_panel = match &*form {
        Some(current) => html! {
            <form class="bg-card rounded-[10px] p-6 border border-border space-y-3" onsubmit={on_submit}>
                <h3 class="font-bold text-foreground text-lg">{ if current.is_editing() { "Edit Expense" } else { "Add New Expense" } }</h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    <select class="p-2 border rounded" required={true} onchange={bind_select(&inputs.category)}>
                        { category_options(&inputs.category) }
                    </select>
                    <input type="number" step="0.01" placeholder="Amount" required={true} class="p-2 border rounded"
                        value={(*inputs.amount).clone()} oninput={bind_input(&inputs.amount)} />
                    <input type="date" required={true} class="p-2 border rounded"
                        value={(*inputs.expense_date).clone()} oninput={bind_input(&inputs.expense_date)} />
                    <input placeholder="Description" required={true} class="p-2 border rounded"
                        value={(*inputs.description).clone()} oninput={bind_input(&inputs.description)} />
                </div>
                { error_line(&current.error) }
                <div class="flex justify-end gap-2">
                    <button type="button" onclick={on_cancel} class="px-4 py-2 border rounded">{"Cancel"}</button>
                    <button type="submit" disabled={*saving} class="bg-primary text-primary-foreground px-4 py-2 rounded">
                        { if *saving { "Saving..." } else if current.is_editing() { "Update Expense" } else { "Add Expense" } }
                    </button>
                </div>
            </form>
        },
        None => html! {},
    };

    let rows = if *loading {
        html! { <p class="text-sm text-muted-foreground p-6">{"Loading..."}</p> }
    } else if items.is_empty() {
        html! { <p class="text-sm text-muted-foreground p-6">{"No expenses this month."}</p> }
    } else {
        html! {
            <table class="w-full text-sm">
                <thead>
                    <tr class="text-left text-muted-foreground border-b border-border">
                        <th class="p-3">{"Date"}</th>
                        <th class="p-3">{"Category"}</th>
                        <th class="p-3">{"Description"}</th>
                        <th class="p-3 text-right">{"Amount"}</th>
                        <th class="p-3"></th>
                    </tr>
                </thead>
                <tbody>
                    { for items.iter().map(|expense| {
                        let edit = {
                            let open_form = open_form.clone();
                            let expense = expense.clone();
                            Callback::from(move |_| open_form.emit(Some(expense.clone())))
                        };
                        let delete = {
                            let on_delete = on_delete.clone();
                            let id = expense.id;
                            Callback::from(move |_| {
                                if let Some(id) = id {
                                    on_delete.emit(id);
                                }
                            })
                        };
                        html! {
                            <tr key={expense.id.unwrap_or_default()} class="border-b border-border">
                                <td class="p-3">{ format_date(expense.expense_date) }</td>
                                <td class="p-3">{ expense.category.to_string() }</td>
                                <td class="p-3">{ expense.description.clone() }</td>
                                <td class="p-3 text-right font-semibold">{ format_currency(expense.amount, CURRENCY_SYMBOL) }</td>
                                <td class="p-3">
                                    <div class="flex justify-end gap-2">
                                        <button onclick={edit} aria-label="Edit">{ icon_pencil() }</button>
                                        <button onclick={delete} aria-label="Delete">{ icon_trash() }</button>
                                    </div>
                                </td>
                            </tr>
                        }
                    }) }
                </tbody>
            </table>
        }
    };

    html! {
        { page_shell(
            "Expense Management",
            actions,
            html! {
                <>
                    { form_panel }
                    { error_line(&list_error) }
                    if sync.is_stale() {
                        <p class="text-xs text-muted-foreground">{"Saved, but the list could not be refreshed."}</p>
                    }
                    <div class="bg-card rounded-[10px] border border-border overflow-hidden">
                        { rows }
                    </div>
                </>
            }
        ) }
    }
}
