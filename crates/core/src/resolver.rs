//! Dependency resolution for named items
//!
//! Every item declares the names it has to come after. The resolver never
//! orders anything eagerly: the load order and the set of items that can never
//! load are recomputed from the registered nodes on every call to
//! [`DependencyResolver::get_state`].

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Directed graph of named items and their prerequisites
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    nodes: IndexMap<String, IndexSet<String>>,
}

/// Result of resolving the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolverState {
    /// Items in a valid load order
    pub satisfied: Vec<String>,
    /// Items with a missing or cyclic prerequisite, in registration order
    pub unsatisfied: Vec<String>,
}

impl ResolverState {
    pub fn is_fully_satisfied(&self) -> bool {
        self.unsatisfied.is_empty()
    }
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Re-registering a name replaces its prerequisites but
    /// keeps its original position for tie-breaking.
    pub fn add_item<I, S>(&mut self, name: impl Into<String>, prerequisites: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self.nodes.insert(name.into(), prerequisites);
    }

    /// Remove an item. Other items that list it keep doing so and will fail to
    /// resolve on the next [`get_state`](Self::get_state).
    pub fn remove_item(&mut self, name: &str) -> bool {
        self.nodes.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn prerequisites(&self, name: &str) -> Option<&IndexSet<String>> {
        self.nodes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Partition the registered items into a load order and the remainder.
    ///
    /// Each round takes every item whose prerequisites have all been resolved,
    /// in registration order, until a round makes no progress. Whatever is left
    /// either names a prerequisite that was never registered or sits on a
    /// cycle; both end up in `unsatisfied` without distinction.
    pub fn get_state(&self) -> ResolverState {
        let mut resolved: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut satisfied = Vec::with_capacity(self.nodes.len());

        loop {
            let ready: Vec<&str> = self
                .nodes
                .iter()
                .filter(|(name, _)| !resolved.contains(name.as_str()))
                .filter(|(_, after)| after.iter().all(|dep| resolved.contains(dep.as_str())))
                .map(|(name, _)| name.as_str())
                .collect();

            if ready.is_empty() {
                break;
            }

            for name in ready {
                resolved.insert(name);
                satisfied.push(name.to_string());
            }
        }

        let unsatisfied = self
            .nodes
            .keys()
            .filter(|name| !resolved.contains(name.as_str()))
            .cloned()
            .collect();

        ResolverState {
            satisfied,
            unsatisfied,
        }
    }

    /// Collect `names` and everything that depends on them, directly or
    /// transitively, ordered so that every item comes before the items it
    /// depends on.
    ///
    /// Items caught in a cycle inside the closure are returned first, seeds that
    /// were never registered last.
    pub fn get_dependents_multiple<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seeds: IndexSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        let mut closure: IndexSet<&str> = IndexSet::new();
        let mut queue: VecDeque<&str> = seeds.iter().map(String::as_str).collect();
        for seed in &seeds {
            if let Some((name, _)) = self.nodes.get_key_value(seed.as_str()) {
                closure.insert(name.as_str());
            }
        }

        while let Some(current) = queue.pop_front() {
            for (name, after) in &self.nodes {
                if after.contains(current) && closure.insert(name.as_str()) {
                    queue.push_back(name.as_str());
                }
            }
        }

        // Load order restricted to the closure, following registration order
        let mut loaded: HashSet<&str> = HashSet::with_capacity(closure.len());
        let mut load_order: Vec<&str> = Vec::with_capacity(closure.len());
        loop {
            let ready: Vec<&str> = self
                .nodes
                .iter()
                .filter(|(name, _)| closure.contains(name.as_str()))
                .filter(|(name, _)| !loaded.contains(name.as_str()))
                .filter(|(_, after)| {
                    after
                        .iter()
                        .filter(|dep| closure.contains(dep.as_str()))
                        .all(|dep| loaded.contains(dep.as_str()))
                })
                .map(|(name, _)| name.as_str())
                .collect();

            if ready.is_empty() {
                break;
            }

            for name in ready {
                loaded.insert(name);
                load_order.push(name);
            }
        }

        let mut unload_order: Vec<String> = self
            .nodes
            .keys()
            .filter(|name| closure.contains(name.as_str()) && !loaded.contains(name.as_str()))
            .cloned()
            .collect();
        unload_order.extend(load_order.into_iter().rev().map(str::to_string));
        unload_order.extend(
            seeds
                .into_iter()
                .filter(|seed| !self.nodes.contains_key(seed.as_str())),
        );
        unload_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> Vec<&'static str> {
        Vec::new()
    }

    fn position(order: &[String], name: &str) -> usize {
        order
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
    }

    #[test]
    fn test_acyclic_graph_orders_prerequisites_first() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("d", ["b", "c"]);
        resolver.add_item("c", ["a"]);
        resolver.add_item("b", ["a"]);
        resolver.add_item("a", none());

        let state = resolver.get_state();
        assert!(state.is_fully_satisfied());
        assert_eq!(state.satisfied.len(), 4);

        for (name, after) in &resolver.nodes {
            for dep in after {
                assert!(position(&state.satisfied, dep) < position(&state.satisfied, name));
            }
        }
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("zeta", none());
        resolver.add_item("alpha", none());
        resolver.add_item("mid", ["zeta"]);

        let state = resolver.get_state();
        assert_eq!(state.satisfied, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_cycle_members_are_unsatisfied() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("root", none());
        resolver.add_item("x", ["root", "z"]);
        resolver.add_item("y", ["x"]);
        resolver.add_item("z", ["y"]);

        let state = resolver.get_state();
        assert_eq!(state.satisfied, vec!["root"]);
        assert_eq!(state.unsatisfied, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("loop", ["loop"]);

        let state = resolver.get_state();
        assert!(state.satisfied.is_empty());
        assert_eq!(state.unsatisfied, vec!["loop"]);
    }

    #[test]
    fn test_missing_prerequisite_propagates_to_dependents() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("c", ["z"]);
        resolver.add_item("d", ["c"]);
        resolver.add_item("e", ["a"]);

        let state = resolver.get_state();
        assert_eq!(state.satisfied, vec!["a", "e"]);
        assert_eq!(state.unsatisfied, vec!["c", "d"]);
    }

    #[test]
    fn test_get_state_is_idempotent() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("b", ["a"]);
        resolver.add_item("a", none());
        resolver.add_item("c", ["missing"]);

        let first = resolver.get_state();
        let second = resolver.get_state();
        assert_eq!(first, second);
        assert_eq!(resolver.len(), 3);
    }

    #[test]
    fn test_add_item_overwrites_prerequisites() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", ["missing"]);
        resolver.add_item("b", none());
        resolver.add_item("a", none());

        let state = resolver.get_state();
        assert_eq!(state.satisfied, vec!["a", "b"]);
        assert_eq!(resolver.prerequisites("a").map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_remove_item_does_not_cascade() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("b", ["a"]);

        assert!(resolver.remove_item("a"));
        assert!(!resolver.remove_item("a"));

        // b still names a, which is now gone
        assert!(resolver.prerequisites("b").unwrap().contains("a"));
        let state = resolver.get_state();
        assert_eq!(state.unsatisfied, vec!["b"]);
    }

    #[test]
    fn test_dependents_come_before_their_prerequisites() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("b", ["a"]);
        resolver.add_item("c", ["b"]);
        resolver.add_item("unrelated", none());

        let order = resolver.get_dependents_multiple(["a"]);
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_dependents_of_multiple_seeds() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("x", none());
        resolver.add_item("b", ["a"]);
        resolver.add_item("y", ["x", "b"]);
        resolver.add_item("other", none());

        let order = resolver.get_dependents_multiple(["a", "x"]);
        assert_eq!(order.len(), 4);
        assert!(position(&order, "y") < position(&order, "b"));
        assert!(position(&order, "y") < position(&order, "x"));
        assert!(position(&order, "b") < position(&order, "a"));
        assert!(!order.contains(&"other".to_string()));
    }

    #[test]
    fn test_dependents_of_all_items_reverses_load_order() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("b", ["a"]);
        resolver.add_item("c", none());
        resolver.add_item("d", ["c", "b"]);

        let mut load = resolver.get_state().satisfied;
        load.reverse();
        let names: Vec<String> = resolver.names().map(str::to_string).collect();
        assert_eq!(resolver.get_dependents_multiple(&names), load);
    }

    #[test]
    fn test_dependents_with_unknown_seed() {
        let mut resolver = DependencyResolver::new();
        resolver.add_item("a", none());
        resolver.add_item("b", ["ghost"]);

        let order = resolver.get_dependents_multiple(["a", "ghost"]);
        assert_eq!(order, vec!["b", "a", "ghost"]);
    }
}
