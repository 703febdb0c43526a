use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{bind_input, bind_select, error_line, page_shell, PageProps, StatCard, StatIcon};
use crate::format::{format_currency, format_signed, CURRENCY_SYMBOL};
use crate::models::{parse_amount, BalanceSource, Investment};

fn invested(investments: &[Investment]) -> Decimal {
    investments
        .iter()
        .filter(|investment| investment.is_active)
        .map(|investment| investment.amount)
        .sum()
}

fn realized(investments: &[Investment]) -> Decimal {
    investments
        .iter()
        .filter_map(|investment| investment.profit_loss)
        .sum()
}

#[function_component(DashboardPage)]
pub fn dashboard_page(props: &PageProps) -> Html {
    let services = props.services.clone();
    let balance = use_state(|| None::<Decimal>);
    let sources = use_state(Vec::<BalanceSource>::new);
    let investments = use_state(Vec::<Investment>::new);
    let load_error = use_state(|| None::<String>);

    let deposit_amount = use_state(String::new);
    let deposit_source = use_state(String::new);
    let deposit_error = use_state(|| None::<String>);
    let depositing = use_state(|| false);

    {
        let services = services.clone();
        let balance = balance.clone();
        let sources = sources.clone();
        let investments = investments.clone();
        let load_error = load_error.clone();
        use_effect_with_deps(
            move |_| {
                // Three independent reads; each fills its own slot.
                {
                    let services = services.clone();
                    let load_error = load_error.clone();
                    spawn_local(async move {
                        match services.ledger.fetch_balance().await {
                            Ok(amount) => balance.set(Some(amount)),
                            Err(err) => load_error.set(Some(err.user_message())),
                        }
                    });
                }
                {
                    let services = services.clone();
                    let load_error = load_error.clone();
                    spawn_local(async move {
                        match services.ledger.fetch_sources().await {
                            Ok(list) => sources.set(list),
                            Err(err) => load_error.set(Some(err.user_message())),
                        }
                    });
                }
                spawn_local(async move {
                    match services.investments.sync().list().await {
                        Ok(list) => investments.set(list),
                        Err(err) => load_error.set(Some(err.user_message())),
                    }
                });
                || ()
            },
            (),
        );
    }

    let on_deposit = {
        let services = services.clone();
        let balance = balance.clone();
        let deposit_amount = deposit_amount.clone();
        let deposit_source = deposit_source.clone();
        let deposit_error = deposit_error.clone();
        let depositing = depositing.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let amount = match parse_amount(&deposit_amount) {
                Some(amount) if !deposit_source.is_empty() => amount,
                _ => {
                    deposit_error.set(Some("Please complete all fields.".to_string()));
                    return;
                }
            };
            let source = BalanceSource((*deposit_source).clone());

            depositing.set(true);
            let services = services.clone();
            let balance = balance.clone();
            let deposit_amount = deposit_amount.clone();
            let deposit_error = deposit_error.clone();
            let depositing = depositing.clone();
            spawn_local(async move {
                match services.ledger.deposit(amount, &source).await {
                    Ok(updated) => {
                        balance.set(Some(updated));
                        deposit_amount.set(String::new());
                        deposit_error.set(None);
                    }
                    Err(err) => deposit_error.set(Some(err.user_message())),
                }
                depositing.set(false);
            });
        })
    };

    let balance_label = match *balance {
        Some(amount) => format_currency(amount, CURRENCY_SYMBOL),
        None => "...".to_string(),
    };
    let open_count = investments.iter().filter(|investment| investment.is_active).count();

    html! {
        { page_shell(
            "Dashboard",
            html! {},
            html! {
                <>
                    { error_line(&load_error) }
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                        <StatCard title="BALANCE" value={balance_label} icon={StatIcon::Wallet} />
                        <StatCard
                            title="INVESTED"
                            value={format!("{} in {} open", format_currency(invested(&investments), CURRENCY_SYMBOL), open_count)}
                            icon={StatIcon::TrendingUp}
                        />
                        <StatCard
                            title="REALIZED P/L"
                            value={format_signed(realized(&investments), CURRENCY_SYMBOL)}
                            icon={StatIcon::Target}
                        />
                    </div>

                    <form class="bg-card rounded-[10px] p-6 border border-border space-y-3" onsubmit={on_deposit}>
                        <h3 class="font-bold text-foreground text-lg">{"Add Funds"}</h3>
                        <div class="grid grid-cols-1 md:grid-cols-3 gap-3">
                            <input type="number" step="0.01" placeholder="Amount" required={true} class="p-2 border rounded"
                                value={(*deposit_amount).clone()} oninput={bind_input(&deposit_amount)} />
                            <select class="p-2 border rounded" required={true} onchange={bind_select(&deposit_source)}>
                                <option value="" selected={deposit_source.is_empty()}>{"Select source"}</option>
                                { for sources.iter().map(|source| html! {
                                    <option value={source.to_string()} selected={*deposit_source == source.as_str()}>{ source.to_string() }</option>
                                }) }
                            </select>
                            <button type="submit" disabled={*depositing} class="bg-primary text-primary-foreground px-4 py-2 rounded">
                                { if *depositing { "Adding..." } else { "Add Funds" } }
                            </button>
                        </div>
                        { error_line(&deposit_error) }
                    </form>
                </>
            }
        ) }
    }
}
