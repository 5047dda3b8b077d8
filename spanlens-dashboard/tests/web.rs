//! Browser-side checks for the page interop helpers.
//!
//! Run with: wasm-pack test --headless --firefox spanlens-dashboard

#![cfg(target_arch = "wasm32")]

use spanlens_dashboard::interop::trace_id_from_location;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn set_query(query: &str) {
    let history = web_sys::window()
        .expect("window")
        .history()
        .expect("history");
    history
        .replace_state_with_url(&JsValue::NULL, "", Some(query))
        .expect("replaceState");
}

#[wasm_bindgen_test]
fn trace_id_is_read_from_query() {
    set_query("?trace=tr_42&tab=tree");
    assert_eq!(trace_id_from_location().as_deref(), Some("tr_42"));
}

#[wasm_bindgen_test]
fn blank_or_missing_trace_id_is_ignored() {
    set_query("?trace=%20%20");
    assert_eq!(trace_id_from_location(), None);

    set_query("?tab=tree");
    assert_eq!(trace_id_from_location(), None);
}
