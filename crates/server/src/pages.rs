//! The few HTML pages served by the application.
//!
//! The app shell is a form plus containers that `static/app.js` fills
//! from `/entries` and `/hist_data`.
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::server::ServerState;

const SCRIPT: &str = include_str!("../static/app.js");

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #ccc;padding:4px}\
.error{color:#b00}nav a{margin-right:1em}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>{body}</body></html>"
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn app_shell(snapshot_mode: bool) -> String {
    let nav = if snapshot_mode {
        "<nav><a href=\"/save\">Save</a><a href=\"/local_copy\">Local copy</a>\
         <a href=\"/logout\">Logout</a></nav>"
    } else {
        ""
    };
    layout(
        "Expenses",
        &format!(
            "<h1>Expenses</h1>{nav}\
             <form id=\"entry-form\">\
             <input type=\"hidden\" name=\"id\">\
             <input name=\"date\" type=\"date\" required>\
             <input name=\"amount\" placeholder=\"amount\" required>\
             <input name=\"description\" placeholder=\"description\">\
             <input name=\"category\" placeholder=\"category\">\
             <button type=\"submit\">Save entry</button>\
             <span id=\"form-error\" class=\"error\"></span></form>\
             <h2>Entries</h2><table id=\"entries\"></table>\
             <h2>By category</h2><table id=\"history\"></table>\
             <script src=\"/static/app.js\"></script>"
        ),
    )
}

/// `GET /` in plain mode.
pub async fn entry_page() -> Html<String> {
    Html(app_shell(false))
}

/// `GET /home` in snapshot mode.
pub async fn home() -> Html<String> {
    Html(app_shell(true))
}

/// `GET /` in snapshot mode.
pub async fn login_page(State(state): State<ServerState>, jar: CookieJar) -> Response {
    if state.sessions.resolve(&jar).await.is_some() {
        return Redirect::to("/home").into_response();
    }
    Html(layout(
        "Expenses - login",
        "<h1>Expenses</h1><form method=\"post\" action=\"/\">\
         <input name=\"password\" type=\"password\" placeholder=\"passphrase\" autofocus>\
         <button type=\"submit\">Unlock</button></form>",
    ))
    .into_response()
}

pub(crate) fn login_failed(reason: &str) -> String {
    layout(
        "Expenses - login failed",
        &format!(
            "<h1>Login failed</h1><p class=\"error\">{}</p><a href=\"/\">Try again</a>",
            escape(reason)
        ),
    )
}

pub async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], SCRIPT)
}
