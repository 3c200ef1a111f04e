//! In-memory stand-in for a Firefly III server.
//!
//! # Design
//! Serves the slice of `/api/v1` the client uses, with JSON:API envelopes and
//! the server's error envelope. Every route requires the configured bearer
//! token. `MockState::fail_next` injects a run of error responses ahead of the
//! real handlers so retry behavior can be exercised over real HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_TOKEN: &str = "mock-token-0123456789abcdef";
pub const DEFAULT_PER_PAGE: usize = 50;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub current_balance: String,
    pub currency_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Split {
    pub transaction_type: String,
    pub date: String,
    pub amount: String,
    pub description: String,
    pub source_name: String,
    pub destination_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionGroup {
    pub id: String,
    pub splits: Vec<Split>,
}

/// Budgets and categories share a shape on this server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Named {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct NewNamed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    pub accounts: Vec<Account>,
    pub transactions: Vec<TransactionGroup>,
    pub budgets: Vec<Named>,
    pub categories: Vec<Named>,
}

impl Store {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// A small ledger: two asset accounts, one expense account, one
    /// withdrawal.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for (name, kind, balance) in [
            ("Checking", "asset", "100.00"),
            ("Savings", "asset", "2500.00"),
            ("Supermarket", "expense", "0.00"),
        ] {
            let id = store.next_id();
            store.accounts.push(Account {
                id,
                name: name.to_string(),
                account_type: kind.to_string(),
                current_balance: balance.to_string(),
                currency_code: "USD".to_string(),
            });
        }
        let id = store.next_id();
        store.transactions.push(TransactionGroup {
            id,
            splits: vec![Split {
                transaction_type: "withdrawal".to_string(),
                date: "2024-01-15T00:00:00+00:00".to_string(),
                amount: "42.50".to_string(),
                description: "Weekly shop".to_string(),
                source_name: "Checking".to_string(),
                destination_name: "Supermarket".to_string(),
            }],
        });
        store
    }
}

struct Fault {
    remaining: u32,
    status: StatusCode,
}

/// Shared server state.
pub struct MockState {
    token: String,
    per_page: usize,
    pub store: RwLock<Store>,
    fault: std::sync::Mutex<Option<Fault>>,
    hits: AtomicU64,
}

impl MockState {
    pub fn new(token: impl Into<String>) -> Arc<Self> {
        Self::with_page_size(token, DEFAULT_PER_PAGE)
    }

    pub fn with_page_size(token: impl Into<String>, per_page: usize) -> Arc<Self> {
        Arc::new(Self {
            token: token.into(),
            per_page: per_page.max(1),
            store: RwLock::new(Store::seeded()),
            fault: std::sync::Mutex::new(None),
            hits: AtomicU64::new(0),
        })
    }

    /// Answer the next `count` requests with `status` before resuming normal
    /// service. Unknown codes become 500.
    pub fn fail_next(&self, count: u32, status: u16) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(Fault {
            remaining: count,
            status,
        });
    }

    /// Requests received, including rejected ones.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    fn take_fault(&self) -> Option<StatusCode> {
        let mut fault = self.fault.lock().unwrap_or_else(|e| e.into_inner());
        let active = fault.as_mut().filter(|f| f.remaining > 0)?;
        active.remaining -= 1;
        Some(active.status)
    }
}

pub type SharedState = Arc<MockState>;

pub fn app() -> Router {
    app_with_state(MockState::new(DEFAULT_TOKEN))
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/about", get(about))
        .route("/api/v1/accounts", get(list_accounts))
        .route("/api/v1/accounts/{id}", get(get_account))
        .route("/api/v1/transactions", get(list_transactions))
        .route("/api/v1/transactions/{id}", get(get_transaction))
        .route("/api/v1/budgets", get(list_budgets).post(create_budget))
        .route("/api/v1/budgets/{id}", get(get_budget))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/{id}", get(get_category))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

pub async fn run_with_state(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn validation_error(field: &str, message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "message": "The given data was invalid.",
            "errors": { field: [message] },
        })),
    )
        .into_response()
}

/// Counts the request, replays injected faults, then checks the token.
async fn guard(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    if let Some(status) = state.take_fault() {
        tracing::debug!(%status, "injected fault");
        return error(status, status.canonical_reason().unwrap_or("Error"));
    }

    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.token);
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Unauthenticated.");
    }

    next.run(req).await
}

fn resource(kind: &str, id: &str, attributes: Value) -> Value {
    json!({ "id": id, "type": kind, "attributes": attributes })
}

fn account_json(a: &Account) -> Value {
    resource(
        "accounts",
        &a.id,
        json!({
            "name": a.name,
            "type": a.account_type,
            "active": true,
            "current_balance": a.current_balance,
            "currency_code": a.currency_code,
        }),
    )
}

fn transaction_json(t: &TransactionGroup) -> Value {
    let splits: Vec<Value> = t
        .splits
        .iter()
        .map(|s| {
            json!({
                "type": s.transaction_type,
                "date": s.date,
                "amount": s.amount,
                "description": s.description,
                "currency_code": "USD",
                "source_name": s.source_name,
                "destination_name": s.destination_name,
            })
        })
        .collect();
    resource("transactions", &t.id, json!({ "group_title": null, "transactions": splits }))
}

fn named_json(kind: &str, n: &Named) -> Value {
    resource(kind, &n.id, json!({ "name": n.name, "notes": n.notes }))
}

/// Page `items` and wrap them in a list envelope with pagination meta.
fn paginate(items: Vec<Value>, page: usize, per_page: usize) -> Value {
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let data: Vec<Value> = items.into_iter().skip((page - 1) * per_page).take(per_page).collect();
    json!({
        "data": data,
        "meta": { "pagination": {
            "total": total,
            "count": data.len(),
            "per_page": per_page,
            "current_page": page,
            "total_pages": total_pages,
        }},
    })
}

fn page_param(params: &HashMap<String, String>) -> usize {
    params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1)
}

fn found(kind: &str, value: Option<Value>) -> Response {
    match value {
        Some(data) => Json(json!({ "data": data })).into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Resource not found ({kind})")),
    }
}

async fn about() -> Json<Value> {
    Json(json!({
        "data": {
            "version": "6.1.0",
            "api_version": "2.0.0",
            "php_version": "8.3.0",
            "os": "Linux",
            "driver": "mock",
        }
    }))
}

async fn list_accounts(State(state): State<SharedState>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let store = state.store.read().await;
    let items = store
        .accounts
        .iter()
        .filter(|a| match params.get("type").map(String::as_str) {
            None | Some("all") => true,
            Some(kind) => a.account_type == kind,
        })
        .map(account_json)
        .collect();
    Json(paginate(items, page_param(&params), state.per_page))
}

async fn get_account(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    found("account", store.accounts.iter().find(|a| a.id == id).map(account_json))
}

async fn list_transactions(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store.read().await;
    let items = store
        .transactions
        .iter()
        .filter(|t| match params.get("type").map(String::as_str) {
            None | Some("all") => true,
            Some(kind) => t.splits.iter().any(|s| s.transaction_type == kind),
        })
        .map(transaction_json)
        .collect();
    let per_page = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(state.per_page)
        .max(1);
    Json(paginate(items, page_param(&params), per_page))
}

async fn get_transaction(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    found("transaction", store.transactions.iter().find(|t| t.id == id).map(transaction_json))
}

async fn list_budgets(State(state): State<SharedState>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let store = state.store.read().await;
    let items = store.budgets.iter().map(|b| named_json("budgets", b)).collect();
    Json(paginate(items, page_param(&params), state.per_page))
}

async fn get_budget(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    found("budget", store.budgets.iter().find(|b| b.id == id).map(|b| named_json("budgets", b)))
}

async fn create_budget(State(state): State<SharedState>, Json(input): Json<NewNamed>) -> Response {
    let mut store = state.store.write().await;
    create_named(&mut store, |s| &mut s.budgets, "budgets", input)
}

async fn list_categories(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store.read().await;
    let items = store.categories.iter().map(|c| named_json("categories", c)).collect();
    Json(paginate(items, page_param(&params), state.per_page))
}

async fn get_category(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    found(
        "category",
        store.categories.iter().find(|c| c.id == id).map(|c| named_json("categories", c)),
    )
}

async fn create_category(State(state): State<SharedState>, Json(input): Json<NewNamed>) -> Response {
    let mut store = state.store.write().await;
    create_named(&mut store, |s| &mut s.categories, "categories", input)
}

/// Shared create path: names are required and unique, case-insensitively.
fn create_named(
    store: &mut Store,
    collection: fn(&mut Store) -> &mut Vec<Named>,
    kind: &str,
    input: NewNamed,
) -> Response {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return validation_error("name", "The name field is required.");
    }
    let taken = collection(store)
        .iter()
        .any(|n| n.name.eq_ignore_ascii_case(&name));
    if taken {
        return validation_error("name", "This name is already in use.");
    }
    let created = Named {
        id: store.next_id(),
        name,
        notes: input.notes,
    };
    let body = json!({ "data": named_json(kind, &created) });
    collection(store).push(created);
    (StatusCode::CREATED, Json(body)).into_response()
}
