use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::icons::{icon_dollar, icon_pencil, icon_plus, icon_trash};
use super::{bind_input, error_line, page_shell, PageProps};
use crate::form::EditForm;
use crate::format::{format_currency, format_signed, format_timestamp, CURRENCY_SYMBOL};
use crate::investments::{ClosePreview, InvestmentDialog, Lifecycle};
use crate::models::{parse_amount, Investment};
use crate::sync::ResourceId;

fn lifecycle_cell(investment: &Investment) -> Html {
    match investment.lifecycle() {
        Lifecycle::Open => html! {
            <span class="px-2 py-1 rounded text-xs bg-green-100 text-green-700">{"Active"}</span>
        },
        Lifecycle::Closed { closed_at, profit_loss } => {
            let outcome = match profit_loss {
                Some(delta) => {
                    let tone = if delta >= Decimal::ZERO { "text-green-600" } else { "text-red-500" };
                    html! { <span class={tone}>{ format_signed(delta, CURRENCY_SYMBOL) }</span> }
                }
                None => html! {},
            };
            html! {
                <div class="space-y-1">
                    <span class="px-2 py-1 rounded text-xs bg-muted text-muted-foreground">{"Closed"}</span>
                    <p class="text-xs text-muted-foreground">{ format_timestamp(closed_at) }</p>
                    { outcome }
                </div>
            }
        }
    }
}

#[function_component(InvestmentsPage)]
pub fn investments_page(props: &PageProps) -> Html {
    let tracker = props.services.investments.clone();
    let items = {
        let tracker = tracker.clone();
        use_state(move || tracker.sync().items())
    };
    let loading = use_state(|| true);
    let list_error = use_state(|| None::<String>);
    let dialog = use_state(InvestmentDialog::default);
    let saving = use_state(|| false);
    let name = use_state(String::new);
    let amount = use_state(String::new);

    let closing_input = use_state(String::new);
    let close_error = use_state(|| None::<String>);

    {
        let tracker = tracker.clone();
        let items = items.clone();
        let loading = loading.clone();
        let list_error = list_error.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match tracker.sync().list().await {
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
        let dialog = dialog.clone();
        let name = name.clone();
        let amount = amount.clone();
        let list_error = list_error.clone();
        Callback::from(move |record: Option<Investment>| {
            let next = match record {
                Some(record) => match EditForm::for_edit(record) {
                    Ok(next) => next,
                    Err(err) => {
                        list_error.set(Some(err.user_message()));
                        return;
                    }
                },
                None => EditForm::for_create(Investment::open("", Decimal::ZERO)),
            };
            if next.is_editing() {
                name.set(next.current().name.clone());
                amount.set(next.current().amount.to_string());
            } else {
                name.set(String::new());
                amount.set(String::new());
            }
            dialog.set(InvestmentDialog::Edit(next));
        })
    };

    let dismiss = {
        let dialog = dialog.clone();
        Callback::from(move |_| dialog.set(InvestmentDialog::Hidden))
    };

    let on_submit = {
        let tracker = tracker.clone();
        let dialog = dialog.clone();
        let items = items.clone();
        let saving = saving.clone();
        let name = name.clone();
        let amount = amount.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(current) = dialog.edit_form().cloned() else {
                return;
            };
            let label = name.trim().to_string();
            let principal = match parse_amount(&amount) {
                Some(principal) if !label.is_empty() => principal,
                _ => {
                    dialog.set(InvestmentDialog::Edit(
                        current.with_error("Please complete all fields."),
                    ));
                    return;
                }
            };
            let draft = Investment {
                name: label,
                amount: principal,
                ..current.base.clone()
            };

            saving.set(true);
            let tracker = tracker.clone();
            let dialog = dialog.clone();
            let items = items.clone();
            let saving = saving.clone();
            spawn_local(async move {
                match current.submit(tracker.sync(), draft).await {
                    Ok(_) => {
                        dialog.set(InvestmentDialog::Hidden);
                        items.set(tracker.sync().items());
                    }
                    Err(failed) => dialog.set(InvestmentDialog::Edit(failed)),
                }
                saving.set(false);
            });
        })
    };

    let on_delete = {
        let tracker = tracker.clone();
        let items = items.clone();
        let list_error = list_error.clone();
        Callback::from(move |id: ResourceId| {
            let tracker = tracker.clone();
            let items = items.clone();
            let list_error = list_error.clone();
            spawn_local(async move {
                match tracker.sync().delete(id).await {
                    Ok(()) => {
                        list_error.set(None);
                        items.set(tracker.sync().items());
                    }
                    Err(err) => list_error.set(Some(err.user_message())),
                }
            });
        })
    };

    let open_close = {
        let dialog = dialog.clone();
        let closing_input = closing_input.clone();
        let close_error = close_error.clone();
        let list_error = list_error.clone();
        Callback::from(move |investment: Investment| match InvestmentDialog::close(investment) {
            Ok(next) => {
                closing_input.set(String::new());
                close_error.set(None);
                dialog.set(next);
            }
            Err(err) => list_error.set(Some(err.user_message())),
        })
    };

    let on_close_submit = {
        let tracker = tracker.clone();
        let items = items.clone();
        let dialog = dialog.clone();
        let closing_input = closing_input.clone();
        let close_error = close_error.clone();
        let saving = saving.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(investment) = dialog.closing().cloned() else {
                return;
            };
            let Some(closing_amount) = parse_amount(&closing_input) else {
                close_error.set(Some("Enter the closing amount.".to_string()));
                return;
            };

            saving.set(true);
            let tracker = tracker.clone();
            let items = items.clone();
            let dialog = dialog.clone();
            let close_error = close_error.clone();
            let saving = saving.clone();
            spawn_local(async move {
                match tracker.close(&investment, closing_amount).await {
                    Ok(_) => {
                        dialog.set(InvestmentDialog::Hidden);
                        items.set(tracker.sync().items());
                    }
                    Err(err) => close_error.set(Some(err.user_message())),
                }
                saving.set(false);
            });
        })
    };

    let actions = {
        let open_form = open_form.clone();
        html! {
            <button onclick={Callback::from(move |_| open_form.emit(None))} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-lg">
                { icon_plus() }
                <span>{"New Investment"}</span>
            </button>
        }
    };

    let form_panel = match dialog.edit_form() {
        Some(current) => html! {
            <form class="bg-card rounded-[10px] p-6 border border-border space-y-3" onsubmit={on_submit}>
                <h3 class="font-bold text-foreground text-lg">{ if current.is_editing() { "Edit Investment" } else { "New Investment" } }</h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    <input placeholder="Name" required={true} class="p-2 border rounded"
                        value={(*name).clone()} oninput={bind_input(&name)} />
                    <input type="number" step="0.01" placeholder="Amount" required={true} class="p-2 border rounded"
                        value={(*amount).clone()} oninput={bind_input(&amount)} />
                </div>
                { error_line(&current.error) }
                <div class="flex justify-end gap-2">
                    <button type="button" onclick={dismiss.clone()} class="px-4 py-2 border rounded">{"Cancel"}</button>
                    <button type="submit" disabled={*saving} class="bg-primary text-primary-foreground px-4 py-2 rounded">
                        { if *saving { "Saving..." } else if current.is_editing() { "Update Investment" } else { "Create Investment" } }
                    </button>
                </div>
            </form>
        },
        None => html! {},
    };

    let close_panel = match dialog.closing() {
        Some(investment) => {
            let preview = ClosePreview::new(investment.amount, &closing_input);
            let delta = match (preview.delta(), preview.is_gain()) {
                (Some(delta), Some(gain)) => html! {
                    <p class={if gain { "text-sm text-green-600" } else { "text-sm text-red-500" }}>
                        { format!("{}: {}", if gain { "Profit" } else { "Loss" }, format_signed(delta, CURRENCY_SYMBOL)) }
                    </p>
                },
                _ => html! {},
            };
            html! {
                <form class="bg-card rounded-[10px] p-6 border border-border space-y-3" onsubmit={on_close_submit}>
                    <h3 class="font-bold text-foreground text-lg">{ format!("Close {}", investment.name) }</h3>
                    <p class="text-sm text-muted-foreground">
                        { format!("Invested: {}", format_currency(investment.amount, CURRENCY_SYMBOL)) }
                    </p>
                    <input type="number" step="0.01" placeholder="Closing amount" required={true} class="p-2 border rounded w-full"
                        value={(*closing_input).clone()} oninput={bind_input(&closing_input)} />
                    { delta }
                    { error_line(&close_error) }
                    <div class="flex justify-end gap-2">
                        <button type="button" onclick={dismiss} class="px-4 py-2 border rounded">{"Cancel"}</button>
                        <button type="submit" disabled={*saving} class="bg-primary text-primary-foreground px-4 py-2 rounded">
                            { if *saving { "Closing..." } else { "Close Investment" } }
                        </button>
                    </div>
                </form>
            }
        }
        None => html! {},
    };

    let rows = if *loading {
        html! { <p class="text-sm text-muted-foreground p-6">{"Loading..."}</p> }
    } else if items.is_empty() {
        html! { <p class="text-sm text-muted-foreground p-6">{"No investments yet."}</p> }
    } else {
        html! {
            <table class="w-full text-sm">
                <thead>
                    <tr class="text-left text-muted-foreground border-b border-border">
                        <th class="p-3">{"Name"}</th>
                        <th class="p-3 text-right">{"Amount"}</th>
                        <th class="p-3">{"Opened"}</th>
                        <th class="p-3">{"Status"}</th>
                        <th class="p-3"></th>
                    </tr>
                </thead>
                <tbody>
                    { for items.iter().map(|investment| {
                        let edit = {
                            let open_form = open_form.clone();
                            let investment = investment.clone();
                            Callback::from(move |_| open_form.emit(Some(investment.clone())))
                        };
                        let close = {
                            let open_close = open_close.clone();
                            let investment = investment.clone();
                            Callback::from(move |_| open_close.emit(investment.clone()))
                        };
                        let delete = {
                            let on_delete = on_delete.clone();
                            let id = investment.id;
                            Callback::from(move |_| {
                                if let Some(id) = id {
                                    on_delete.emit(id);
                                }
                            })
                        };
                        html! {
                            <tr key={investment.id.unwrap_or_default()} class="border-b border-border">
                                <td class="p-3 font-medium">{ investment.name.clone() }</td>
                                <td class="p-3 text-right">{ format_currency(investment.amount, CURRENCY_SYMBOL) }</td>
                                <td class="p-3">{ format_timestamp(investment.created_at) }</td>
                                <td class="p-3">{ lifecycle_cell(investment) }</td>
                                <td class="p-3">
                                    <div class="flex justify-end gap-2">
                                        if investment.can_close() {
                                            <button onclick={close} aria-label="Close">{ icon_dollar() }</button>
                                        }
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
            "Investments",
            actions,
            html! {
                <>
                    { form_panel }
                    { close_panel }
                    { error_line(&list_error) }
                    if tracker.sync().is_stale() {
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
