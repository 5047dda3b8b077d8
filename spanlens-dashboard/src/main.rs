use dioxus::launch;
use dioxus::prelude::*;
use dioxus_logger::tracing::Level;

use spanlens_dashboard::{trace_id_from_location, TraceView};

fn main() {
    // Initialize logging for WASM
    wasm_logger::init(wasm_logger::Config::default());
    dioxus_logger::init(Level::INFO).ok();

    launch(App);
}

#[component]
fn App() -> Element {
    let mut trace_id = use_signal(trace_id_from_location);
    let mut draft = use_signal(String::new);

    rsx! {
        match trace_id() {
            Some(id) => rsx! {
                // Keyed so a different trace gets a fresh store and refresh gate.
                TraceView { key: "{id}", trace_id: id.clone() }
            },
            None => rsx! {
                div {
                    class: "trace-picker",
                    h2 { "Open a trace" }
                    form {
                        onsubmit: move |evt| {
                            evt.prevent_default();
                            let id = draft().trim().to_string();
                            if !id.is_empty() {
                                trace_id.set(Some(id));
                            }
                        },
                        input {
                            placeholder: "trace id",
                            value: "{draft}",
                            oninput: move |evt| draft.set(evt.value()),
                        }
                        button { r#type: "submit", "Open" }
                    }
                }
            },
        }
    }
}
