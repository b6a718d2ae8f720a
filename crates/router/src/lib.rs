//! Path routing for the blog: the route table, not-found handling and an
//! in-memory navigation history.

pub mod history;
pub mod route;

pub use history::{Addressing, History, HistoryMode, Navigator};
pub use route::{Page, RouteDef, RouteMatch, Router};
