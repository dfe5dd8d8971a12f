//! Route list controller
//!
//! Owns the state behind the route list screen: the active filter, the
//! routes on display, and the loading and error flags. Presentation code
//! reads that state and changes it only through `set_filter` and `refresh`.
//!
//! Every fetch is issued with a ticket `(filter, seq)`. When a fetch settles,
//! its result is applied only if the ticket's filter is still the active one
//! and no newer ticket has been applied already. Anything else is dropped.

use crate::api::RouteDataGateway;
use crate::config::DEFAULT_FETCH_TIMEOUT;
use crate::error::{FetchError, FetchResult};
use crate::notify::{ALERT_ERROR_TITLE, LogNotifier, Notifier};
use cil_shared::date::{Clock, SystemClock};
use cil_shared::{Route, RouteFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};


/// Message stored in `error` after any failed fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Erro ao carregar rotas. Tente novamente.";

// =========================================================
// State
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FetchLedger {
    /// Sequence number of the most recently issued fetch.
    issued: u64,
    /// Sequence number of the most recently applied fetch.
    applied: u64,
}

/// What the route list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// In gateway order (ascending route number).
    pub routes: Vec<Route>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filter: RouteFilter,
    ledger: FetchLedger,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            is_loading: true,
            error: None,
            filter: RouteFilter::Today,
            ledger: FetchLedger::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchTicket {
    filter: RouteFilter,
    seq: u64,
}

/// How a fetch ended, from the controller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the displayed routes.
    Applied { routes: usize },
    /// The fetch failed and the error was recorded and shown.
    Failed,
    /// A newer fetch or a filter change superseded this one.
    Discarded,
}

// =========================================================
// Builder
// =========================================================

pub struct ControllerBuilder<G: RouteDataGateway + ?Sized> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    fetch_timeout: Duration,
}

impl<G: RouteDataGateway + ?Sized + 'static> ControllerBuilder<G> {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn build(self) -> RouteListController<G> {
        let (state, _) = watch::channel(ControllerState::default());
        RouteListController {
            inner: Arc::new(Inner {
                gateway: self.gateway,
                clock: self.clock,
                notifier: self.notifier,
                fetch_timeout: self.fetch_timeout,
                state,
            }),
        }
    }
}

// =========================================================
// Controller
// =========================================================

struct Inner<G: ?Sized> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    fetch_timeout: Duration,
    state: watch::Sender<ControllerState>,
}

/// Route list controller for one screen instance.
///
/// Cloning is cheap and every clone drives the same state. `set_filter`,
/// `mount` and `refresh` spawn onto the current Tokio runtime.
pub struct RouteListController<G: ?Sized> {
    inner: Arc<Inner<G>>,
}

impl<G: ?Sized> Clone for RouteListController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: RouteDataGateway + ?Sized + 'static> RouteListController<G> {
    /// Starts with the local system clock, log-only notifications and the
    /// default fetch timeout.
    pub fn builder(gateway: Arc<G>) -> ControllerBuilder<G> {
        ControllerBuilder {
            gateway,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn new(gateway: Arc<G>) -> Self {
        Self::builder(gateway).build()
    }

    // --- Mutators ---

    /// Issues the first fetch for the initial filter.
    pub fn mount(&self) -> JoinHandle<FetchOutcome> {
        let ticket = self.begin(None);
        self.spawn(ticket)
    }

    /// Switches the filter and refetches in the background.
    ///
    /// Returns at once. The handle resolves when the fetch settles; it can
    /// be dropped without cancelling anything.
    pub fn set_filter(&self, filter: RouteFilter) -> JoinHandle<FetchOutcome> {
        let ticket = self.begin(Some(filter));
        self.spawn(ticket)
    }

    /// Refetches the active filter; the returned future resolves when the
    /// fetch settles.
    ///
    /// The ticket is issued and the fetch spawned at call time, so the
    /// filter is the one active now, and dropping the future leaves the
    /// fetch running to settle on its own.
    pub fn refresh(&self) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let ticket = self.begin(None);
        let handle = self.spawn(ticket);
        async move {
            handle.await.unwrap_or_else(|e| {
                error!(
                    filter = %ticket.filter,
                    seq = ticket.seq,
                    error = %e,
                    "route fetch task aborted"
                );
                FetchOutcome::Discarded
            })
        }
    }

    // --- Readers ---

    pub fn snapshot(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    /// Receives every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.inner.state.borrow().routes.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn filter(&self) -> RouteFilter {
        self.inner.state.borrow().filter
    }

    // --- Fetch lifecycle ---

    fn begin(&self, filter: Option<RouteFilter>) -> FetchTicket {
        let mut ticket = FetchTicket {
            filter: RouteFilter::default(),
            seq: 0,
        };
        self.inner.state.send_modify(|state| {
            if let Some(filter) = filter {
                state.filter = filter;
            }
            state.ledger.issued += 1;
            state.is_loading = true;
            state.error = None;
            ticket = FetchTicket {
                filter: state.filter,
                seq: state.ledger.issued,
            };
        });
        ticket
    }

    fn spawn(&self, ticket: FetchTicket) -> JoinHandle<FetchOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.execute(ticket).await })
    }

    async fn execute(&self, ticket: FetchTicket) -> FetchOutcome {
        let today = self.inner.clock.today();
        debug!(filter = %ticket.filter, seq = ticket.seq, %today, "dispatching route fetch");

        let gateway = &self.inner.gateway;
        let fetch = async {
            match ticket.filter {
                RouteFilter::Today => gateway.fetch_by_date(today).await,
                RouteFilter::Overdue => gateway.fetch_overdue(today).await,
                RouteFilter::All => gateway.fetch_all_active().await,
            }
        };

        let result = match tokio::time::timeout(self.inner.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::timeout(format!(
                "no response within {:?}",
                self.inner.fetch_timeout
            ))
            .in_op_with("routes.fetch", ticket.filter.as_str())),
        };

        self.settle(ticket, result)
    }

    fn settle(&self, ticket: FetchTicket, result: FetchResult<Vec<Route>>) -> FetchOutcome {
        let (routes, failure) = match result {
            Ok(routes) => (Some(routes), None),
            Err(e) => (None, Some(e)),
        };

        let mut outcome = FetchOutcome::Discarded;
        self.inner.state.send_if_modified(|state| {
            if ticket.filter != state.filter || ticket.seq <= state.ledger.applied {
                return false;
            }

            state.ledger.applied = ticket.seq;
            match routes {
                Some(routes) => {
                    outcome = FetchOutcome::Applied {
                        routes: routes.len(),
                    };
                    state.routes = routes;
                    state.error = None;
                }
                // Previous routes stay on screen.
                None => {
                    outcome = FetchOutcome::Failed;
                    state.error = Some(FETCH_FAILED_MESSAGE.to_string());
                }
            }
            if ticket.seq == state.ledger.issued {
                state.is_loading = false;
            }
            true
        });

        match (outcome, failure) {
            (FetchOutcome::Applied { routes }, _) => {
                info!(filter = %ticket.filter, seq = ticket.seq, routes, "routes loaded");
            }
            (FetchOutcome::Failed, Some(e)) => {
                error!(
                    filter = %ticket.filter,
                    seq = ticket.seq,
                    error = %e,
                    "error fetching routes"
                );
                self.inner
                    .notifier
                    .notify_error(ALERT_ERROR_TITLE, FETCH_FAILED_MESSAGE);
            }
            (FetchOutcome::Discarded, failure) => {
                debug!(
                    filter = %ticket.filter,
                    seq = ticket.seq,
                    failed = failure.is_some(),
                    "discarding superseded fetch result"
                );
            }
            (FetchOutcome::Failed, None) => {}
        }

        outcome
    }
}
