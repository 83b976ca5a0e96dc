use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use handlebars::Handlebars;

use crate::cookies::Admin;

lazy_static! {
    /// Handlebars templates.
    pub static ref HBS: handlebars::Handlebars<'static> =
        load_handlebars_templates().expect("error initializing Handlebars templates");
}

/// Loads handlebars templates from disk in debug mode or from the binary in
/// release mode.
fn load_handlebars_templates() -> Result<Handlebars<'static>, handlebars::TemplateError> {
    use chrono::NaiveDate;
    use handlebars::handlebars_helper;

    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);
    hbs.set_dev_mode(cfg!(debug_assertions));

    handlebars_helper!(join: |items: Vec<String>, sep: String| items.join(&sep));
    hbs.register_helper("join", Box::new(join));
    handlebars_helper!(excerpt: |s: String, n: u64| crate::util::excerpt(&s, n as usize));
    hbs.register_helper("excerpt", Box::new(excerpt));
    handlebars_helper!(date: |d: Option<NaiveDate>| d.map(|d| d.format("%B %-d, %Y").to_string()).unwrap_or_default());
    hbs.register_helper("date", Box::new(date));
    handlebars_helper!(basename: |path: Option<String>| path.as_deref().map(crate::util::basename).unwrap_or_default());
    hbs.register_helper("basename", Box::new(basename));
    handlebars_helper!(selected: |a: Json, b: Json| if display_value(a) == display_value(b) { "selected" } else { "" });
    hbs.register_helper("selected", Box::new(selected));

    hbs.register_embed_templates_with_extension::<HtmlTemplates>(".hbs")?; // .hbs

    Ok(hbs)
}

/// Form values are strings, so IDs and booleans are compared by their text.
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_html_template(
    template_name: &str,
    active_admin: &Option<Admin>,
    data: serde_json::Value,
) -> Response {
    match render_html_template_internal(template_name, active_admin, data) {
        Ok(resp) => resp,
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, {
            let error_msg = format!("template error: {e}");
            tracing::error!(template_name, "{error_msg}");
            let data = serde_json::json!({ "error_msg": error_msg });
            render_html_template_internal("error.html", active_admin, data).unwrap_or_else(|e| {
                format!("double template error: {e}\n{error_msg}").into_response()
            })
        })
            .into_response(),
    }
}

/// Renders a template to a string, for attachments.
pub fn render_html_string(
    template_name: &str,
    data: &serde_json::Value,
) -> Result<String, handlebars::RenderError> {
    HBS.render(template_name, data)
}

fn render_html_template_internal(
    template_name: &str,
    active_admin: &Option<Admin>,
    mut data: serde_json::Value,
) -> Result<Response, handlebars::RenderError> {
    if let serde_json::Value::Object(m) = &mut data {
        m.insert(
            "active_admin".to_string(),
            serde_json::Value::Bool(active_admin.is_some()),
        );
        // Admin and error pages have no CMS page or site menu.
        m.entry("page").or_insert(serde_json::Value::Null);
        m.entry("menu").or_insert_with(|| serde_json::json!([]));
    }
    HBS.render(template_name, &data)
        .map(|s| Html(s).into_response())
}

#[derive(rust_embed::RustEmbed, Copy, Clone)]
#[folder = "./html"]
#[include = "*.hbs"]
pub struct HtmlTemplates;
