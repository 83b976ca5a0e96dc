use serde_json::Value;

use crate::AppState;
use crate::db::Page;

pub mod admin;
pub mod forms;
pub mod home;
pub mod meetings;
pub mod not_found;

/// Adds the CMS page bound to `title` and the site menu to template data.
/// Views render without CMS content if the page is missing or hidden.
pub async fn with_page(state: &AppState, title: &str, data: Value) -> sqlx::Result<Value> {
    let page = state.get_public_page(title).await?;
    with_bound_page(state, page, data).await
}

/// Adds an already resolved CMS page and the site menu to template data.
pub async fn with_bound_page(
    state: &AppState,
    page: Option<Page>,
    mut data: Value,
) -> sqlx::Result<Value> {
    let menu = state
        .get_menu_pages()
        .await?
        .into_iter()
        .map(|p| serde_json::json!({ "title": p.title, "url": format!("/{}/", p.url) }))
        .collect::<Vec<_>>();
    if let Value::Object(m) = &mut data {
        m.insert("page".to_string(), serde_json::json!(page));
        m.insert("menu".to_string(), Value::Array(menu));
    }
    Ok(data)
}
