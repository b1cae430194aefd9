// Candidate path enumeration
// Depth-first search over the candidate pool list producing every simple
// route from token_in to token_out within the hop bound
//
// Numan Thabit 2025 Nov

use crate::router::routes::{Pool, V3Route};
use alloy_primitives::Address;
use std::collections::HashSet;
use tracing::debug;

/// Enumerate all simple routes through `pools` of at most `max_hops` pools.
///
/// Output order follows pool order, so the same inputs always produce the
/// same routes in the same order. No reachable path is not an error.
pub fn compute_all_routes(
    token_in: Address,
    token_out: Address,
    pools: &[Pool],
    max_hops: usize,
) -> Vec<V3Route> {
    if token_in == token_out || max_hops == 0 {
        return Vec::new();
    }

    let mut search = PathSearch {
        token_in,
        token_out,
        pools,
        max_hops,
        pools_used: vec![false; pools.len()],
        tokens_visited: HashSet::from([token_in]),
        current: Vec::with_capacity(max_hops),
        routes: Vec::new(),
    };
    search.visit(token_in);

    debug!(
        token_in = %token_in,
        token_out = %token_out,
        candidate_pools = pools.len(),
        max_hops,
        routes = search.routes.len(),
        "computed candidate routes"
    );
    search.routes
}

struct PathSearch<'a> {
    token_in: Address,
    token_out: Address,
    pools: &'a [Pool],
    max_hops: usize,
    pools_used: Vec<bool>,
    tokens_visited: HashSet<Address>,
    current: Vec<&'a Pool>,
    routes: Vec<V3Route>,
}

impl<'a> PathSearch<'a> {
    fn visit(&mut self, frontier: Address) {
        if self.current.len() > self.max_hops {
            return;
        }
        if let Some(last) = self.current.last() {
            if last.involves_token(self.token_out) {
                let pools = self.current.iter().map(|p| (*p).clone()).collect();
                if let Some(route) = V3Route::new(pools, self.token_in, self.token_out) {
                    self.routes.push(route);
                }
                return;
            }
        }
        if self.current.len() == self.max_hops {
            return;
        }

        let pools = self.pools;
        for (i, pool) in pools.iter().enumerate() {
            if self.pools_used[i] {
                continue;
            }
            let Some(next) = pool.other_token(frontier) else {
                continue;
            };
            if !self.tokens_visited.insert(next) {
                continue;
            }
            self.pools_used[i] = true;
            self.current.push(pool);

            self.visit(next);

            self.current.pop();
            self.pools_used[i] = false;
            self.tokens_visited.remove(&next);
        }
    }
}
