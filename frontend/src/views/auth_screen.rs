use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{bind_input, Services};
use crate::gateway::Route;

#[derive(Properties, PartialEq)]
pub struct AuthScreenProps {
    pub services: Rc<Services>,
    pub register: bool,
    pub on_switch: Callback<Route>,
}

#[function_component(AuthScreen)]
pub fn auth_screen(props: &AuthScreenProps) -> Html {
    let email = use_state(String::new);
    let password = use_state(String::new);
    let confirm_password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);
    let is_login = !props.register;

    let on_submit = {
        let services = props.services.clone();
        let email = email.clone();
        let password = password.clone();
        let confirm_password = confirm_password.clone();
        let error = error.clone();
        let loading = loading.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let email_val = (*email).clone();
            let password_val = (*password).clone();

            if email_val.trim().is_empty() || password_val.is_empty() {
                error.set(Some("Email and password are required".to_string()));
                return;
            }
            if !is_login && password_val != *confirm_password {
                error.set(Some("Passwords do not match".to_string()));
                return;
            }

            loading.set(true);
            error.set(None);
            let services = services.clone();
            let error = error.clone();
            let loading = loading.clone();
            spawn_local(async move {
                let outcome = if is_login {
                    services.auth.login(&email_val, &password_val).await
                } else {
                    services.auth.register(&email_val, &password_val).await
                };
                if let Err(err) = outcome {
                    error.set(Some(err.user_message()));
                }
                loading.set(false);
            });
        })
    };

    let toggle_mode = {
        let on_switch = props.on_switch.clone();
        let error = error.clone();
        Callback::from(move |_| {
            error.set(None);
            on_switch.emit(if is_login { Route::Register } else { Route::Login });
        })
    };

    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-foreground">{ if is_login { "Welcome back" } else { "Create account" } }</h1>
                    <p class="text-sm text-muted-foreground mt-2">
                        { if is_login { "Sign in to continue." } else { "Start managing your finances." } }
                    </p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Email"}</label>
                        <input
                            type="email"
                            required={true}
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*email).clone()}
                            oninput={bind_input(&email)}
                        />
                    </div>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Password"}</label>
                        <input
                            type="password"
                            required={true}
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*password).clone()}
                            oninput={bind_input(&password)}
                        />
                    </div>

                    if !is_login {
                        <div class="space-y-1">
                            <label class="text-sm font-medium text-foreground">{"Confirm Password"}</label>
                            <input
                                type="password"
                                class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                                value={(*confirm_password).clone()}
                                oninput={bind_input(&confirm_password)}
                            />
                        </div>
                    }

                    if let Some(msg) = &*error {
                        <div class="text-sm text-red-500">{ msg.clone() }</div>
                    }

                    <button
                        type="submit"
                        class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                        disabled={*loading}
                    >
                        { if *loading { "Please wait..." } else if is_login { "Login" } else { "Sign up" } }
                    </button>
                </form>

                <div class="mt-6 text-center text-sm text-muted-foreground">
                    { if is_login { "No account?" } else { "Already have an account?" } }
                    <button class="ml-2 text-primary font-semibold" onclick={toggle_mode}>
                        { if is_login { "Sign up" } else { "Login" } }
                    </button>
                </div>
            </div>
        </div>
    }
}
