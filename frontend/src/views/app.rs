use std::rc::Rc;

use yew::prelude::*;

use super::auth_screen::AuthScreen;
use super::budgets::BudgetsPage;
use super::dashboard::DashboardPage;
use super::expenses::ExpensesPage;
use super::investments::InvestmentsPage;
use super::layout::Layout;
use super::Services;
use crate::config::ClientConfig;
use crate::gateway::Route;

#[function_component(App)]
pub fn app() -> Html {
    let route = use_state(|| Route::Dashboard);

    let services: Rc<Services> = {
        let route = route.clone();
        use_memo(
            move |_| {
                let navigate = Callback::from(move |next: Route| route.set(next));
                Services::for_browser(ClientConfig::default(), navigate)
            },
            (),
        )
    };

    {
        let services = services.clone();
        use_effect_with_deps(
            move |route: &Route| {
                services.auth.guard(*route);
                || ()
            },
            *route,
        );
    }

    let on_select = {
        let route = route.clone();
        Callback::from(move |next: Route| route.set(next))
    };
    let on_logout = {
        let services = services.clone();
        Callback::from(move |_: ()| services.auth.logout())
    };

    let signed_in = services.auth.is_signed_in();

    match *route {
        Route::Register => {
            html! { <AuthScreen services={services} register={true} on_switch={on_select} /> }
        }
        Route::Login => {
            html! { <AuthScreen services={services} register={false} on_switch={on_select} /> }
        }
        _ if !signed_in => {
            html! { <AuthScreen services={services} register={false} on_switch={on_select} /> }
        }
        active => {
            let content = match active {
                Route::Budgets => html! { <BudgetsPage services={services.clone()} /> },
                Route::Expenses => html! { <ExpensesPage services={services.clone()} /> },
                Route::Investments => html! { <InvestmentsPage services={services.clone()} /> },
                _ => html! { <DashboardPage services={services.clone()} /> },
            };
            html! {
                <Layout active={active} on_select={on_select} on_logout={on_logout}>
                    { content }
                </Layout>
            }
        }
    }
}
