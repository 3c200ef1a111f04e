//! Typed accessors for the Firefly III REST API.
//!
//! # Design
//! `FireflyClient` is a thin layer over `Engine`: each method picks an
//! endpoint path, query parameters and the expected response shape, then
//! hands a `RequestDescriptor` to `Engine::execute`. No method retries,
//! throttles or classifies errors on its own.

use chrono::NaiveDate;

use crate::engine::{Engine, ABOUT_PATH};
use crate::error::ClientError;
use crate::request::RequestDescriptor;
use crate::settings::Settings;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    Account, AccountType, ApiResponse, Budget, Category, NewBudget, NewCategory, SystemInfo,
    TransactionGroup, TransactionType,
};

const ACCOUNTS_PATH: &str = "/api/v1/accounts";
const TRANSACTIONS_PATH: &str = "/api/v1/transactions";
const BUDGETS_PATH: &str = "/api/v1/budgets";
const CATEGORIES_PATH: &str = "/api/v1/categories";

/// Upper bound on pages followed by `all_categories`, in case a server
/// reports inconsistent pagination.
const MAX_PAGES: u32 = 1_000;

/// Filters for `GET /api/v1/transactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionQuery {
    fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor::get(TRANSACTIONS_PATH)
            .with_optional_param("start", self.start.map(|d| d.format("%Y-%m-%d").to_string()))
            .with_optional_param("end", self.end.map(|d| d.format("%Y-%m-%d").to_string()))
            .with_optional_param("type", self.transaction_type.map(|t| t.as_str()))
            .with_optional_param("page", self.page)
            .with_optional_param("limit", self.limit)
    }
}

/// Typed client for one Firefly III server.
pub struct FireflyClient<T = ReqwestTransport> {
    engine: Engine<T>,
}

impl FireflyClient<ReqwestTransport> {
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        Ok(Self {
            engine: Engine::new(settings)?,
        })
    }
}

impl<T: Transport> FireflyClient<T> {
    pub fn with_engine(engine: Engine<T>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine<T> {
        &self.engine
    }

    pub fn request_count(&self) -> u64 {
        self.engine.request_count()
    }

    /// See `Engine::test_connection`.
    pub async fn test_connection(&self) -> bool {
        self.engine.test_connection().await
    }

    pub async fn about(&self) -> Result<SystemInfo, ClientError> {
        let resp: ApiResponse<SystemInfo> = self.engine.execute(&RequestDescriptor::get(ABOUT_PATH)).await?;
        Ok(resp.data)
    }

    pub async fn accounts(&self, account_type: Option<AccountType>) -> Result<ApiResponse<Vec<Account>>, ClientError> {
        let desc = RequestDescriptor::get(ACCOUNTS_PATH).with_optional_param("type", account_type.map(|t| t.as_str()));
        self.engine.execute(&desc).await
    }

    pub async fn account(&self, id: &str) -> Result<Account, ClientError> {
        let resp: ApiResponse<Account> = self
            .engine
            .execute(&RequestDescriptor::get(ACCOUNTS_PATH).with_segment(id))
            .await?;
        Ok(resp.data)
    }

    pub async fn transactions(&self, query: &TransactionQuery) -> Result<ApiResponse<Vec<TransactionGroup>>, ClientError> {
        self.engine.execute(&query.descriptor()).await
    }

    pub async fn transaction(&self, id: &str) -> Result<TransactionGroup, ClientError> {
        let resp: ApiResponse<TransactionGroup> = self
            .engine
            .execute(&RequestDescriptor::get(TRANSACTIONS_PATH).with_segment(id))
            .await?;
        Ok(resp.data)
    }

    pub async fn budgets(&self) -> Result<ApiResponse<Vec<Budget>>, ClientError> {
        self.engine.execute(&RequestDescriptor::get(BUDGETS_PATH)).await
    }

    pub async fn budget(&self, id: &str) -> Result<Budget, ClientError> {
        let resp: ApiResponse<Budget> = self
            .engine
            .execute(&RequestDescriptor::get(BUDGETS_PATH).with_segment(id))
            .await?;
        Ok(resp.data)
    }

    pub async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, ClientError> {
        let desc = RequestDescriptor::post(BUDGETS_PATH).with_body(budget)?;
        let resp: ApiResponse<Budget> = self.engine.execute(&desc).await?;
        Ok(resp.data)
    }

    /// First page of categories.
    pub async fn categories(&self) -> Result<ApiResponse<Vec<Category>>, ClientError> {
        self.categories_page(None).await
    }

    async fn categories_page(&self, page: Option<u32>) -> Result<ApiResponse<Vec<Category>>, ClientError> {
        let desc = RequestDescriptor::get(CATEGORIES_PATH).with_optional_param("page", page);
        self.engine.execute(&desc).await
    }

    /// Every category, following `meta.pagination` across pages.
    pub async fn all_categories(&self) -> Result<Vec<Category>, ClientError> {
        let mut categories = Vec::new();
        let mut page = 1;
        loop {
            let resp = self.categories_page(Some(page)).await?;
            let more = resp.pagination().is_some_and(|p| p.has_more());
            let empty = resp.data.is_empty();
            categories.extend(resp.data);
            if !more || empty || page >= MAX_PAGES {
                return Ok(categories);
            }
            page += 1;
        }
    }

    pub async fn category(&self, id: &str) -> Result<Category, ClientError> {
        let resp: ApiResponse<Category> = self
            .engine
            .execute(&RequestDescriptor::get(CATEGORIES_PATH).with_segment(id))
            .await?;
        Ok(resp.data)
    }

    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, ClientError> {
        let desc = RequestDescriptor::post(CATEGORIES_PATH).with_body(category)?;
        let resp: ApiResponse<Category> = self.engine.execute(&desc).await?;
        Ok(resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::QueryValue;

    #[test]
    fn transaction_query_includes_only_set_filters() {
        let query = TransactionQuery {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            transaction_type: Some(TransactionType::Withdrawal),
            limit: Some(25),
            ..TransactionQuery::default()
        };
        let desc = query.descriptor();

        assert_eq!(desc.path(), "/api/v1/transactions");
        assert_eq!(
            desc.params(),
            &[
                ("start".to_string(), QueryValue::Text("2024-01-01".to_string())),
                ("type".to_string(), QueryValue::Text("withdrawal".to_string())),
                ("limit".to_string(), QueryValue::Integer(25)),
            ]
        );
    }

    #[test]
    fn empty_transaction_query_has_no_params() {
        assert!(TransactionQuery::default().descriptor().params().is_empty());
    }
}
