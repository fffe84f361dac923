use axum::extract::{Path, RawQuery, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};

use super::render::{self, ActionTokens, ListView};
use super::{AdminError, AppState, SESSION_COOKIE, per_page_option};
use crate::actions::{ActionKind, ActionProcessor};
use crate::error::AppError;
use crate::listing::{ListQuery, ListTable, MAX_PER_PAGE, SubmissionStore};
use crate::notice::{Notice, NoticeQueue};
use crate::operator::{self, Capability};
use crate::params::RequestParams;

type HandlerResult<T = Response> = Result<T, AdminError>;

pub async fn index() -> Redirect {
    Redirect::to(render::LIST_PATH)
}

pub async fn health() -> &'static str {
    "ok"
}

/// Render the submissions list. Action parameters on a GET are ignored;
/// deletes only run from a POST.
pub async fn list_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> HandlerResult<Html<String>> {
    let operator = state.authenticate(&headers)?;
    operator.require(Capability::Read, "view submissions")?;

    let params = RequestParams::parse(raw.as_deref().unwrap_or_default());
    let per_page = state.per_page_for(&operator)?;
    let mut table = ListTable::new(&*state.db, ListQuery::from_params(&params, per_page));
    let page = table.prepare_items()?;

    let notices = NoticeQueue::new(&state.db, operator.session()).flush()?;

    let tokens = if operator.can(Capability::ManageOptions) {
        Some(ActionTokens {
            delete: state
                .tokens
                .mint(operator.session(), ActionKind::Delete.scope())?,
            bulk_delete: state
                .tokens
                .mint(operator.session(), ActionKind::BulkDelete.scope())?,
        })
    } else {
        None
    };

    Ok(Html(render::list_page(&ListView {
        operator: &operator.name,
        table: &table,
        page: &page,
        notices: &notices,
        tokens,
    })))
}

/// Run a delete or bulk delete, queue its notices and send the operator back
/// to the list they came from.
pub async fn submit_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    body: String,
) -> HandlerResult {
    let operator = state.authenticate(&headers)?;
    let params = RequestParams::parse(raw.as_deref().unwrap_or_default())
        .merged(RequestParams::parse(&body));

    let processor = ActionProcessor::new(&*state.db, &state.tokens);
    if let Some(outcome) = processor.process(&operator, &params)? {
        NoticeQueue::new(&state.db, operator.session()).push_all(&outcome.notices())?;
    }

    let per_page = state.per_page_for(&operator)?;
    let back = ListQuery::from_params(&params, per_page);
    Ok(Redirect::to(&render::list_url(&back)).into_response())
}

pub async fn screen_options(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult {
    let operator = state.authenticate(&headers)?;
    operator.require(Capability::ManageOptions, "change screen options")?;

    let params = RequestParams::parse(&body);
    let queue = NoticeQueue::new(&state.db, operator.session());
    match params.get_u32("per_page") {
        Some(n) if (1..=MAX_PER_PAGE).contains(&n) => {
            state
                .db
                .set_option(&per_page_option(&operator), &n.to_string())?;
            tracing::info!("'{}' set submissions per page to {n}", operator.name);
            queue.push(&Notice::info(format!("Showing {n} submissions per page.")))?;
        }
        _ => queue.push(&Notice::error(format!(
            "Submissions per page must be a number between 1 and {MAX_PER_PAGE}."
        )))?,
    }

    // The page number may no longer exist at the new size
    let back = ListQuery {
        page: 1,
        ..ListQuery::from_params(&params, 1)
    };
    Ok(Redirect::to(&render::list_url(&back)).into_response())
}

pub async fn detail_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> HandlerResult<Html<String>> {
    let operator = state.authenticate(&headers)?;
    operator.require(Capability::Read, "view submissions")?;

    let store: &dyn SubmissionStore = &*state.db;
    let submission = store.get(id)?.ok_or(AppError::SubmissionNotFound(id))?;
    Ok(Html(render::detail_page(&submission, render::LIST_PATH)))
}

pub async fn login_form() -> Html<String> {
    Html(render::login_page(None))
}

pub async fn login(State(state): State<AppState>, body: String) -> Response {
    let params = RequestParams::parse(&body);
    let key = params.get("key");
    match operator::authenticate(&state.settings.operators, key) {
        Ok(op) => {
            tracing::info!("Operator '{}' signed in", op.name);
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict",
                key.unwrap_or_default()
            );
            (
                [(SET_COOKIE, cookie)],
                Redirect::to(render::LIST_PATH),
            )
                .into_response()
        }
        Err(_) => {
            tracing::warn!("Rejected sign-in attempt");
            (
                StatusCode::UNAUTHORIZED,
                Html(render::login_page(Some("Unknown access key."))),
            )
                .into_response()
        }
    }
}

pub async fn logout() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    ([(SET_COOKIE, cookie)], Redirect::to("/login")).into_response()
}
