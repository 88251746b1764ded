//! Nearest-agent selection.

use std::collections::HashSet;

use fieldops_core::{Agent, AgentId, Coordinate};

use crate::distance::distance_km;

/// Select the nearest selectable agent to `origin`.
///
/// Filters `agents` to those with a known coordinate, `available ==
/// true`, and an identity not in `exclude`, then minimizes great-circle
/// distance to the origin.
///
/// Two agents at exactly the same distance are tie-broken by the lowest
/// [`AgentId`], so repeated calls over the same set return the same
/// agent.
///
/// Returns `None` when no candidate qualifies.
pub fn nearest<'a>(
    origin: Coordinate,
    agents: &'a [Agent],
    exclude: &HashSet<AgentId>,
) -> Option<&'a Agent> {
    let mut best: Option<(f64, &'a Agent)> = None;

    for agent in agents {
        if !agent.available || exclude.contains(&agent.id) {
            continue;
        }
        let Some(coordinate) = agent.coordinate else {
            continue;
        };
        let d = distance_km(origin, coordinate);
        best = match best {
            None => Some((d, agent)),
            Some((best_d, best_agent)) => {
                if d < best_d || (d == best_d && agent.id < best_agent.id) {
                    Some((d, agent))
                } else {
                    Some((best_d, best_agent))
                }
            }
        };
    }

    best.map(|(_, agent)| agent)
}
