use axum::{extract::State, response::Html};

use crate::{
    web::{Error, WebResult},
    AppState,
};

/// The landing page hosting the signup form.
pub async fn home(State(app_state): State<AppState>) -> WebResult<Html<String>> {
    let page = app_state
        .templ_mgr
        .render_index(app_state.site_key.as_deref())
        .map_err(Error::PageRender)?;
    Ok(Html(page))
}
