use wasm_bindgen::prelude::*;
use web_sys::{window, Blob, BlobPropertyBag, HtmlAnchorElement, Url, UrlSearchParams};

/// Trace id from `?trace=<id>` in the page URL.
pub fn trace_id_from_location() -> Option<String> {
    let search = window()?.location().search().ok()?;
    let params = UrlSearchParams::new_with_str(&search).ok()?;
    params
        .get("trace")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

fn js_error(context: &str, err: JsValue) -> String {
    match err.as_string() {
        Some(message) => format!("{context}: {message}"),
        None => format!("{context}: {err:?}"),
    }
}

/// Hand `bytes` to the browser as a file download.
pub fn download_bytes(filename: &str, mime_type: &str, bytes: &[u8]) -> Result<(), String> {
    let window = window().ok_or_else(|| "no global `window` exists".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "no document on window".to_string())?;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| js_error("Failed to build blob", e))?;

    let url = Url::create_object_url_with_blob(&blob)
        .map_err(|e| js_error("Failed to create object URL", e))?;

    let anchor = document
        .create_element("a")
        .map_err(|e| js_error("Failed to create link", e))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| "created element is not an anchor".to_string())?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    Url::revoke_object_url(&url).map_err(|e| js_error("Failed to revoke object URL", e))
}
