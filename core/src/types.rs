//! Domain DTOs for the Firefly III API.
//!
//! # Design
//! The API speaks a JSON:API dialect: every entity arrives as
//! `{ id, type, attributes }` inside a `{ data, meta, links }` envelope.
//! `Resource<A>` and `ApiResponse<T>` model that shape once; the attribute
//! structs carry only the fields the CLI and import tooling read, so unknown
//! fields are ignored rather than rejected.
//!
//! Money amounts stay strings exactly as the server formats them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Success envelope: `{ data, meta?, links? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<T> ApiResponse<T> {
    pub fn pagination(&self) -> Option<&Pagination> {
        self.meta.as_ref().and_then(|m| m.pagination.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub total: u32,
    pub count: u32,
    pub per_page: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// A JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: A,
}

/// Response of `GET /api/v1/about`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub version: String,
    pub api_version: String,
    pub php_version: String,
    pub os: String,
    pub driver: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Account filter accepted by `GET /api/v1/accounts?type=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    All,
    Asset,
    Cash,
    Expense,
    Revenue,
    Liability,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::All => "all",
            AccountType::Asset => "asset",
            AccountType::Cash => "cash",
            AccountType::Expense => "expense",
            AccountType::Revenue => "revenue",
            AccountType::Liability => "liability",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(AccountType::All),
            "asset" => Ok(AccountType::Asset),
            "cash" => Ok(AccountType::Cash),
            "expense" => Ok(AccountType::Expense),
            "revenue" => Ok(AccountType::Revenue),
            "liability" | "liabilities" => Ok(AccountType::Liability),
            other => Err(format!(
                "unknown account type {other:?} (expected all, asset, cash, expense, revenue, liability)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAttributes {
    pub name: String,
    /// Kept as text: the server also reports types outside the filter set,
    /// such as "initial-balance" or "reconciliation".
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub current_balance: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub type Account = Resource<AccountAttributes>;

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    All,
    Withdrawal,
    Deposit,
    Transfer,
    OpeningBalance,
    Reconciliation,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::All => "all",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Transfer => "transfer",
            TransactionType::OpeningBalance => "opening_balance",
            TransactionType::Reconciliation => "reconciliation",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Ok(TransactionType::All),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "deposit" => Ok(TransactionType::Deposit),
            "transfer" => Ok(TransactionType::Transfer),
            "opening_balance" => Ok(TransactionType::OpeningBalance),
            "reconciliation" => Ok(TransactionType::Reconciliation),
            other => Err(format!("unknown transaction type {other:?}")),
        }
    }
}

/// One split of a transaction group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSplit {
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub date: String,
    pub amount: String,
    pub description: String,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub destination_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub budget_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionGroupAttributes {
    #[serde(default)]
    pub group_title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub transactions: Vec<TransactionSplit>,
}

pub type TransactionGroup = Resource<TransactionGroupAttributes>;

// ---------------------------------------------------------------------------
// Budgets and categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAttributes {
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub type Budget = Resource<BudgetAttributes>;

/// Payload for `POST /api/v1/budgets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAttributes {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub type Category = Resource<CategoryAttributes>;

/// Payload for `POST /api/v1/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: None,
        }
    }
}
