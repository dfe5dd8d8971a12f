//! CIL route list core
//!
//! - `api`: the gateway contract and its Supabase (PostgREST) implementation
//! - `controller`: filter, loading and error state behind the route list screen
//! - `status`: day-granularity status classification and badges
//! - `request`: HTTP abstraction the gateway is written against

pub mod api;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod notify;
pub mod request;
pub mod status;

pub use cil_shared::{Frequency, Route, RouteFilter};

pub use api::{RouteDataGateway, SupabaseRouteGateway};
pub use config::RuntimeConfig;
pub use controller::{ControllerState, FETCH_FAILED_MESSAGE, FetchOutcome, RouteListController};
pub use error::{ConfigError, FetchError, FetchErrorOrigin, FetchResult};
pub use notify::Notifier;
pub use request::{HttpClient, ReqwestHttpClient};
pub use status::{RouteStatus, StatusBadge, classify};
