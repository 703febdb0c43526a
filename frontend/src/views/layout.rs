use yew::prelude::*;

use super::icons::{
    icon_credit_card, icon_layout_grid, icon_log_out, icon_trending_up, icon_wallet,
};
use crate::gateway::Route;

#[derive(Properties, PartialEq)]
pub struct LayoutProps {
    pub children: Children,
    pub active: Route,
    pub on_select: Callback<Route>,
    pub on_logout: Callback<()>,
}

#[function_component(Layout)]
pub fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-background">
            <div class="hidden md:flex">
                <Sidebar
                    active={props.active}
                    on_select={props.on_select.clone()}
                    on_logout={props.on_logout.clone()}
                />
            </div>

            <div class="flex-1 flex flex-col overflow-hidden">
                <header class="bg-[#D8E1E8] border-b border-border h-16 flex items-center px-6">
                    <span class="text-[#173E63] text-lg font-bold">{"Personal Finance Manager"}</span>
                </header>
                <main class="flex-1 overflow-y-auto">
                    { for props.children.iter() }
                </main>
            </div>
        </div>
    }
}

struct NavItem {
    label: &'static str,
    route: Route,
    icon: fn() -> Html,
}

static NAV_ITEMS: [NavItem; 4] = [
    NavItem {
        label: "Dashboard",
        route: Route::Dashboard,
        icon: icon_layout_grid,
    },
    NavItem {
        label: "Budgets",
        route: Route::Budgets,
        icon: icon_wallet,
    },
    NavItem {
        label: "Expenses",
        route: Route::Expenses,
        icon: icon_credit_card,
    },
    NavItem {
        label: "Investments",
        route: Route::Investments,
        icon: icon_trending_up,
    },
];

#[derive(Properties, PartialEq)]
struct SidebarProps {
    active: Route,
    on_select: Callback<Route>,
    on_logout: Callback<()>,
}

#[function_component(Sidebar)]
fn sidebar(props: &SidebarProps) -> Html {
    let on_logout = {
        let on_logout = props.on_logout.clone();
        Callback::from(move |_| on_logout.emit(()))
    };

    html! {
        <div class="w-[220px] h-screen bg-[#D8E1E8] p-4 flex flex-col">
            <div class="px-2 mb-8">
                <span class="text-[#173E63] text-2xl font-black tracking-tight">{"Finance"}</span>
            </div>

            <div class="flex-1 bg-[#173E63] rounded-[24px] flex flex-col py-6 px-3 shadow-lg">
                <nav class="flex-1 space-y-2">
                    { for NAV_ITEMS.iter().map(|item| {
                        let class_name = if item.route == props.active {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium bg-[#B2CBDE] text-[#173E63] w-full"
                        } else {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                        };
                        let on_select = props.on_select.clone();
                        let route = item.route;

                        html! {
                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(route))}>
                                <span class="shrink-0">{ (item.icon)() }</span>
                                <span class="truncate whitespace-nowrap text-left">{ item.label }</span>
                            </button>
                        }
                    }) }
                </nav>

                <div class="mt-auto pt-4">
                    <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 transition-colors text-[13px] font-medium text-slate-300">
                        { icon_log_out() }
                        <span>{"Log Out"}</span>
                    </button>
                </div>
            </div>
        </div>
    }
}
