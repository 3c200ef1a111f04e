//! Async client core for the Firefly III personal-finance API.
//!
//! # Overview
//! Turns logical API calls into reliable HTTP exchanges: rate limiting,
//! per-attempt timeouts, retry with exponential backoff, and classification
//! of failures into network, API, and decode errors.
//!
//! # Design
//! - `Engine` owns the session (settings, transport, request counters) and
//!   runs every call through one pipeline; see `engine` for the flow.
//! - `Transport` is the only I/O seam. `ReqwestTransport` does real HTTP;
//!   tests substitute scripted transports and tokio's paused clock.
//! - `FireflyClient` exposes typed accessors that build `RequestDescriptor`s
//!   and delegate to the engine.
//! - `import` parses category files and drives a per-item bulk import.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod engine;
pub mod error;
pub mod http;
pub mod import;
pub mod request;
pub mod settings;
pub mod transport;
pub mod types;

pub use client::{FireflyClient, TransactionQuery};
pub use engine::{Engine, ABOUT_PATH, MIN_REQUEST_SPACING, USER_AGENT};
pub use error::{ClientError, ErrorBody, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use import::{ImportError, ImportOptions, ImportReport};
pub use request::{QueryValue, RequestDescriptor};
pub use settings::{Settings, SettingsError};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Account, AccountType, ApiResponse, Budget, Category, NewBudget, NewCategory, Pagination, SystemInfo,
    TransactionGroup, TransactionType,
};
