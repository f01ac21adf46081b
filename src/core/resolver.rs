//! Module dependency ordering
//!
//! Modules without a colon-bearing definition come first, in discovery order.
//! Modules with one may reference other such modules in their definition
//! text; those are ordered so that every referenced module comes before the
//! modules referencing it.
//!
//! Edge derivation (substring matching over reference rows) is kept apart
//! from ordering: [`DependencyGraph`] holds explicit edges and runs a stable
//! pass-based topological sort. When a pass makes no progress the remaining
//! names are appended as they stand and the outcome records which of them sit
//! on a cycle.

use std::collections::HashSet;

use crate::core::reference::{DependencyClass, ReferenceTable};

/// How the colon-bearing modules were ordered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Every dependency was placed before its dependents
    #[default]
    Resolved,
    /// Ordering stalled; the unresolved names were appended in list order
    Stalled {
        /// Names on a dependency cycle
        cyclic: Vec<String>,
        /// Names that are not on a cycle but depend on one
        blocked: Vec<String>,
    },
}

/// Ordered module names and how the order was reached
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub order: Vec<String>,
    pub outcome: Outcome,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.outcome == Outcome::Resolved
    }
}

/// Explicit dependency relation between colon-bearing modules
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// `edges[i]` holds the indices `names[i]` depends on
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Derive edges: a module depends on every other listed module whose name
    /// appears in any of its reference rows
    pub fn from_table(names: Vec<String>, table: &ReferenceTable) -> Self {
        let edges = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                names
                    .iter()
                    .enumerate()
                    .filter(|&(j, other)| j != i && other != name && table.mentions(name, other))
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        Self { names, edges }
    }

    /// Modules `name` depends on, in list order
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.edges[i].iter().map(|&j| self.names[j].as_str()).collect())
            .unwrap_or_default()
    }

    /// Stable topological order
    ///
    /// Each pass walks the remaining names in list order and emits every name
    /// whose dependencies have all been emitted, including those emitted
    /// earlier in the same pass.
    pub fn order(&self) -> (Vec<String>, Outcome) {
        let mut emitted = vec![false; self.names.len()];
        let mut order = Vec::with_capacity(self.names.len());
        let mut remaining: Vec<usize> = (0..self.names.len()).collect();

        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|&i| {
                if self.edges[i].iter().all(|&j| emitted[j]) {
                    emitted[i] = true;
                    order.push(self.names[i].clone());
                    false
                } else {
                    true
                }
            });

            if remaining.len() == before {
                let outcome = self.stalled_outcome(&remaining);
                order.extend(remaining.iter().map(|&i| self.names[i].clone()));
                return (order, outcome);
            }
        }

        (order, Outcome::Resolved)
    }

    fn stalled_outcome(&self, remaining: &[usize]) -> Outcome {
        let pending: HashSet<usize> = remaining.iter().copied().collect();
        let (cyclic, blocked): (Vec<usize>, Vec<usize>) = remaining
            .iter()
            .partition(|&&i| self.reaches(i, i, &pending));

        let names = |ids: Vec<usize>| -> Vec<String> {
            ids.into_iter().map(|i| self.names[i].clone()).collect()
        };
        Outcome::Stalled {
            cyclic: names(cyclic),
            blocked: names(blocked),
        }
    }

    /// Whether `target` is reachable from `from` through pending modules
    fn reaches(&self, from: usize, target: usize, pending: &HashSet<usize>) -> bool {
        let mut stack: Vec<usize> = self.edges[from].clone();
        let mut seen = HashSet::new();

        while let Some(i) = stack.pop() {
            if i == target {
                return true;
            }
            if !pending.contains(&i) || !seen.insert(i) {
                continue;
            }
            stack.extend(&self.edges[i]);
        }

        false
    }
}

/// Order module names discovered on a device
///
/// Names are deduplicated on first occurrence. The result always contains
/// every input name exactly once.
pub fn resolve_order(names: &[String], table: &ReferenceTable) -> Resolution {
    let mut seen = HashSet::new();
    let (no_colon, yes_colon): (Vec<String>, Vec<String>) = names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .partition(|name| table.classify(name) == DependencyClass::NoColon);

    let graph = DependencyGraph::from_table(yes_colon, table);
    let (tail, outcome) = graph.order();

    let mut order = no_colon;
    order.extend(tail);

    if let Outcome::Stalled { cyclic, blocked } = &outcome {
        log::warn!(
            "unresolvable module dependencies, appended as listed: cyclic [{}], blocked [{}]",
            cyclic.join(", "),
            blocked.join(", ")
        );
        for name in cyclic {
            log::debug!("{} depends on [{}]", name, graph.dependencies(name).join(", "));
        }
    }

    Resolution { order, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_empty_input() {
        let res = resolve_order(&[], &ReferenceTable::default());
        assert!(res.order.is_empty());
        assert!(res.is_resolved());
    }

    #[test]
    fn test_no_colon_first_in_discovery_order() {
        let table = ReferenceTable::from_rows([
            ("A", "A dep: C"),
            ("B", "B plain"),
            ("C", "C x:1"),
            ("D", "D plain"),
        ]);
        let res = resolve_order(&names(&["A", "B", "C", "D"]), &table);
        assert_eq!(res.order, names(&["B", "D", "C", "A"]));
        assert!(res.is_resolved());
    }

    #[test]
    fn test_unknown_modules_are_no_colon() {
        let table = ReferenceTable::from_rows([("Y", "Y a:b")]);
        let res = resolve_order(&names(&["Y", "UNKNOWN"]), &table);
        assert_eq!(res.order, names(&["UNKNOWN", "Y"]));
    }

    #[test]
    fn test_dependency_emitted_in_same_pass() {
        // A precedes B in the list and B depends on A: both go out in pass one
        let table = ReferenceTable::from_rows([("A", "A k:v"), ("B", "B needs: A")]);
        let graph = DependencyGraph::from_table(names(&["A", "B"]), &table);
        assert_eq!(graph.dependencies("B"), vec!["A"]);
        let (order, outcome) = graph.order();
        assert_eq!(order, names(&["A", "B"]));
        assert_eq!(outcome, Outcome::Resolved);
    }

    #[test]
    fn test_dependency_later_in_list() {
        let table = ReferenceTable::from_rows([("B", "B needs: A"), ("A", "A k:v")]);
        let res = resolve_order(&names(&["B", "A"]), &table);
        assert_eq!(res.order, names(&["A", "B"]));
    }

    #[test]
    fn test_chain() {
        let table = ReferenceTable::from_rows([
            ("Z", "Z:uses Y"),
            ("Y", "Y:uses X"),
            ("X", "X:base"),
        ]);
        let res = resolve_order(&names(&["Z", "Y", "X"]), &table);
        assert_eq!(res.order, names(&["X", "Y", "Z"]));
        assert!(res.is_resolved());
    }

    #[test]
    fn test_cycle_is_kept_and_flagged() {
        let table = ReferenceTable::from_rows([
            ("A", "A: B"),
            ("B", "B: A"),
            ("C", "C: A"),
            ("N", "N plain"),
        ]);
        let input = names(&["A", "B", "C", "N"]);
        let res = resolve_order(&input, &table);
        assert_eq!(res.order, names(&["N", "A", "B", "C"]));
        assert_eq!(
            res.outcome,
            Outcome::Stalled {
                cyclic: names(&["A", "B"]),
                blocked: names(&["C"]),
            }
        );
        assert_eq!(sorted(res.order), sorted(input));
    }

    #[test]
    fn test_duplicates_removed_first_occurrence_wins() {
        let table = ReferenceTable::from_rows([("A", "A: x"), ("B", "B plain")]);
        let res = resolve_order(&names(&["A", "B", "A", "B"]), &table);
        assert_eq!(res.order, names(&["B", "A"]));
    }

    #[test]
    fn test_deterministic() {
        let table = ReferenceTable::from_rows([
            ("P", "P: Q R"),
            ("Q", "Q: R"),
            ("R", "R: P"),
            ("S", "S: T"),
            ("T", "T plain"),
        ]);
        let input = names(&["P", "Q", "R", "S", "T"]);
        let first = resolve_order(&input, &table);
        let second = resolve_order(&input, &table);
        assert_eq!(first, second);
    }

    #[test]
    fn test_never_drops_or_duplicates() {
        let table = ReferenceTable::from_rows([
            ("M1", "M1: M12"),
            ("M12", "M12: x"),
            ("M2", "M2: M1"),
            ("K", "K"),
        ]);
        let input = names(&["M2", "K", "M12", "M1", "EXTRA"]);
        let res = resolve_order(&input, &table);
        assert_eq!(res.order.len(), input.len());
        assert_eq!(sorted(res.order.clone()), sorted(input));
    }
}
