// Router module - route enumeration and split selection
// This file wires path enumeration, leg pricing and the split search behind
// the router facade
//
// Numan Thabit 2025 Nov

pub mod heap;
pub mod paths;
pub mod routes;
pub mod selector;

#[allow(clippy::module_inception)]
pub mod router;

pub use paths::compute_all_routes;
pub use router::{amount_distribution, Router};
pub use routes::{BestSwapRoute, Pool, Protocol, Route, RouteWithValidQuote, SwapRoute, TradeType, V3Route};
pub use selector::{RouteSelector, SplitConfig};
