use std::{ffi::OsStr, path::PathBuf, sync::Arc};

use headless_chrome::{
    Browser, Element, LaunchOptions, Tab, browser::tab::NoElementFound, protocol::cdp::Runtime,
};
use serde_json::Value;
use tokio::task::spawn_blocking;

pub fn puppeteer(headless: bool, chrome: Option<PathBuf>) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless,
        path: chrome,
        ..LaunchOptions::default()
    })
}

#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

pub async fn navigate_to(tab: &Arc<Tab>, url: String) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || -> anyhow::Result<()> {
        tab.navigate_to(&url)?;
        tab.wait_until_navigated()?;
        Ok(())
    })
    .await?
}

pub async fn wait_navigated(tab: &Arc<Tab>) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.wait_until_navigated().map(|_| ())).await?
}

pub async fn page_content(tab: &Arc<Tab>) -> anyhow::Result<String> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.get_content()).await?
}

/// Click the first match of `selector`. `false` when nothing matches.
pub async fn click_first(tab: &Arc<Tab>, selector: &'static str) -> anyhow::Result<bool> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || match tab.find_element(selector) {
        Ok(element) => element.click().map(|_| true),
        Err(err) if err.is::<NoElementFound>() => Ok(false),
        Err(err) => Err(err),
    })
    .await?
}

/// Viewport Y of the first match of `selector`, if any.
pub async fn locate_y(tab: &Arc<Tab>, selector: &'static str) -> anyhow::Result<Option<f64>> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || {
        let element = match tab.find_element(selector) {
            Ok(element) => element,
            Err(err) if err.is::<NoElementFound>() => return Ok(None),
            Err(err) => return Err(err),
        };
        viewport_y(&element).map(Some)
    })
    .await?
}

/// Viewport Y of the first `tag` element whose innerText equals `label`
/// exactly, if any.
pub async fn locate_labeled_y(
    tab: &Arc<Tab>,
    tag: &'static str,
    label: &'static str,
) -> anyhow::Result<Option<f64>> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || {
        let elements = match tab.find_elements(tag) {
            Ok(elements) => elements,
            Err(err) if err.is::<NoElementFound>() => return Ok(None),
            Err(err) => return Err(err),
        };
        for element in &elements {
            let text = match inner_text(element) {
                Ok(text) => text,
                Err(err) => {
                    // The page may re-render mid-walk; skip the stale node.
                    tracing::warn!(target: "puppeteer", "innerText read failed: {err:?}");
                    continue;
                }
            };
            if text == label {
                return viewport_y(element).map(Some);
            }
        }
        Ok(None)
    })
    .await?
}

/// Wait for `selector`, focus it with a click, and type `text` into it.
pub async fn type_into(tab: &Arc<Tab>, selector: &'static str, text: String) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || -> anyhow::Result<()> {
        tab.wait_for_element(selector)?.click()?;
        tab.type_str(&text)?;
        Ok(())
    })
    .await?
}

fn call_on(element: &Element<'_>, declaration: &str) -> anyhow::Result<Option<Value>> {
    let ret = element.parent.call_method(Runtime::CallFunctionOn {
        object_id: Some(element.remote_object_id.clone()),
        function_declaration: declaration.to_owned(),
        arguments: Some(Vec::new()),
        return_by_value: Some(false),
        generate_preview: Some(true),
        silent: Some(false),
        await_promise: Some(false),
        user_gesture: None,
        execution_context_id: None,
        object_group: None,
        throw_on_side_effect: None,
        serialization_options: None,
        unique_context_id: None,
    })?;

    Ok(ret.result.value)
}

fn inner_text(element: &Element<'_>) -> anyhow::Result<String> {
    match call_on(element, "function(){return this.innerText}")? {
        Some(Value::String(s)) => Ok(s),
        Some(value) => anyhow::bail!("innerText is not a string: {value}"),
        None => anyhow::bail!("innerText returned nothing"),
    }
}

fn viewport_y(element: &Element<'_>) -> anyhow::Result<f64> {
    match call_on(element, "function(){return this.getBoundingClientRect().y}")? {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("rect y is not a number: {value}")),
        None => anyhow::bail!("rect y returned nothing"),
    }
}
