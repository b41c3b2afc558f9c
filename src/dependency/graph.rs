use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use indexmap::IndexSet;
use tracing::{debug, info};

use super::store::TargetStore;
use crate::config::MAX_REPORTED_CYCLE_LEN;
use crate::error::{SpecGenError, SpecGenResult};

/// Dependency graph under construction
///
/// The vertex universe is fixed at creation; edges may be added until
/// [`finalize`](Self::finalize) consumes the builder.
///
/// Example:
/// - `orders` depends on `customers`
/// - `daily_totals` depends on `orders`
///
/// Create order: `["customers", "orders", "daily_totals"]`
/// Drop order: `["daily_totals", "orders", "customers"]`
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    store: TargetStore,
    /// `a → b` for every "a depends on b"
    forward: Vec<IndexSet<usize>>,
    /// Transpose of `forward`
    reverse: Vec<IndexSet<usize>>,
}

/// Frozen dependency graph with both topological orders precomputed
#[derive(Debug, Clone)]
pub struct FinalizedGraph {
    store: TargetStore,
    forward: Vec<IndexSet<usize>>,
    reverse: Vec<IndexSet<usize>>,
    /// Every `a → b`: a before b
    dependent_first: Vec<usize>,
    /// Every `a → b`: b before a
    dependency_first: Vec<usize>,
}

impl DependencyGraph {
    /// Create a graph over `targets`, indexed in the given order
    ///
    /// # Errors
    /// `DuplicateTarget` if a name appears twice.
    pub fn new<I, S>(targets: I) -> SpecGenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = TargetStore::new(targets)?;
        let n = store.len();
        Ok(Self {
            store,
            forward: vec![IndexSet::new(); n],
            reverse: vec![IndexSet::new(); n],
        })
    }

    /// Register that `a` depends on `b`
    ///
    /// Re-declaring an edge is a no-op.
    ///
    /// # Errors
    /// `UnknownTarget` if either name is not a vertex, `CyclicDependency` if
    /// `a == b`.
    pub fn depends_on(&mut self, a: &str, b: &str) -> SpecGenResult<()> {
        let a_idx = self.store.require(a)?;
        let b_idx = self.store.require(b)?;

        if a_idx == b_idx {
            return Err(SpecGenError::CyclicDependency {
                cycle: vec![a.to_string(), a.to_string()],
            });
        }

        self.forward[a_idx].insert(b_idx);
        self.reverse[b_idx].insert(a_idx);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.index_of(name).is_some()
    }

    /// Compute both topological orders and freeze the graph
    ///
    /// # Errors
    /// `CyclicDependency` naming one cycle when the edges do not form a DAG.
    pub fn finalize(self) -> SpecGenResult<FinalizedGraph> {
        let dependent_first = topological_sort(&self.forward, &self.reverse)
            .map_err(|stuck| self.cycle_error(&stuck, &self.reverse))?;
        let dependency_first = topological_sort(&self.reverse, &self.forward)
            .map_err(|stuck| self.cycle_error(&stuck, &self.forward))?;

        info!(
            "finalized dependency graph: {} targets, {} edges",
            self.store.len(),
            self.forward.iter().map(IndexSet::len).sum::<usize>()
        );

        Ok(FinalizedGraph {
            store: self.store,
            forward: self.forward,
            reverse: self.reverse,
            dependent_first,
            dependency_first,
        })
    }

    /// Turn Kahn's leftover vertices into an error naming one concrete cycle
    ///
    /// `preds` is the transpose of the adjacency the sort ran on.
    fn cycle_error(&self, stuck: &[bool], preds: &[IndexSet<usize>]) -> SpecGenError {
        let cycle = find_cycle(stuck, preds)
            .into_iter()
            .take(MAX_REPORTED_CYCLE_LEN + 1)
            .map(|i| self.store.name_of(i).unwrap_or("?").to_string())
            .collect();
        SpecGenError::CyclicDependency { cycle }
    }
}

/// Kahn's algorithm over `succ`, ready vertices taken lowest index first
///
/// On a cycle, returns `Err` with the vertices that never became ready.
fn topological_sort(succ: &[IndexSet<usize>], pred: &[IndexSet<usize>]) -> Result<Vec<usize>, Vec<bool>> {
    let n = succ.len();
    let mut in_degree: Vec<usize> = pred.iter().map(IndexSet::len).collect();

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&v| in_degree[v] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(v)) = ready.pop() {
        order.push(v);
        for &w in &succ[v] {
            in_degree[w] -= 1;
            if in_degree[w] == 0 {
                ready.push(Reverse(w));
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err(in_degree.iter().map(|&d| d > 0).collect())
    }
}

/// Walk predecessors among `stuck` vertices until one repeats
///
/// Every stuck vertex keeps a stuck predecessor, so the walk must close a
/// cycle. The result lists the cycle in edge direction, first vertex repeated
/// at the end.
fn find_cycle(stuck: &[bool], preds: &[IndexSet<usize>]) -> Vec<usize> {
    let Some(start) = stuck.iter().position(|&s| s) else {
        return Vec::new();
    };

    let mut seen_at = vec![None; stuck.len()];
    let mut walk = Vec::new();
    let mut v = start;
    loop {
        if let Some(pos) = seen_at[v] {
            let mut cycle: Vec<usize> = walk[pos..].to_vec();
            cycle.reverse();
            cycle.push(cycle[0]);
            return cycle;
        }
        seen_at[v] = Some(walk.len());
        walk.push(v);
        match preds[v].iter().copied().find(|&p| stuck[p]) {
            Some(p) => v = p,
            None => return walk,
        }
    }
}

impl FinalizedGraph {
    /// Global order in which everything can be created
    pub fn create_order_all(&self) -> SpecGenResult<Vec<String>> {
        self.store.names_of(&self.dependency_first)
    }

    /// Global order in which everything can be dropped
    pub fn drop_order_all(&self) -> SpecGenResult<Vec<String>> {
        self.store.names_of(&self.dependent_first)
    }

    /// `target` and everything it transitively depends on, `target` last
    ///
    /// # Errors
    /// `UnknownTarget` if `target` is not a vertex.
    pub fn create_order(&self, target: &str) -> SpecGenResult<Vec<String>> {
        let v = self.store.require(target)?;
        let reachable = reachable_from(&self.forward, v);
        let path = restrict_reversed(&self.dependent_first, &reachable);
        debug!("create order for {}: {} targets", target, path.len());
        self.store.names_of(&path)
    }

    /// `target` and everything that transitively depends on it, `target` last
    ///
    /// # Errors
    /// `UnknownTarget` if `target` is not a vertex.
    pub fn drop_order(&self, target: &str) -> SpecGenResult<Vec<String>> {
        let v = self.store.require(target)?;
        let reachable = reachable_from(&self.reverse, v);
        let path = restrict_reversed(&self.dependency_first, &reachable);
        debug!("drop order for {}: {} targets", target, path.len());
        self.store.names_of(&path)
    }

    /// Direct dependencies of `target`, in declaration order
    pub fn dependencies_of(&self, target: &str) -> SpecGenResult<Vec<String>> {
        let v = self.store.require(target)?;
        self.store.names_of(&self.forward[v].iter().copied().collect::<Vec<_>>())
    }

    /// Direct dependents of `target`, in declaration order
    pub fn dependents_of(&self, target: &str) -> SpecGenResult<Vec<String>> {
        let v = self.store.require(target)?;
        self.store.names_of(&self.reverse[v].iter().copied().collect::<Vec<_>>())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.index_of(name).is_some()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.store.iter()
    }

    pub fn vertex_count(&self) -> usize {
        self.store.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.iter().map(IndexSet::len).sum()
    }
}

/// BFS from `start`; `start` itself is included
fn reachable_from(adj: &[IndexSet<usize>], start: usize) -> Vec<bool> {
    let mut seen = vec![false; adj.len()];
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back(start);

    while let Some(v) = queue.pop_front() {
        for &w in &adj[v] {
            if !seen[w] {
                seen[w] = true;
                queue.push_back(w);
            }
        }
    }
    seen
}

/// Filter `order` to the `keep` set, then reverse it
fn restrict_reversed(order: &[usize], keep: &[bool]) -> Vec<usize> {
    order.iter().rev().copied().filter(|&v| keep[v]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::testing::assert_error_sqlstate;
    use proptest::prelude::*;

    fn graph(targets: &[&str], edges: &[(&str, &str)]) -> SpecGenResult<FinalizedGraph> {
        let mut g = DependencyGraph::new(targets.iter().copied())?;
        for (a, b) in edges {
            g.depends_on(a, b)?;
        }
        g.finalize()
    }

    fn pos(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_fan_out() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("A", "C")]).unwrap();

        let create = g.create_order_all().unwrap();
        assert!(pos(&create, "B") < pos(&create, "A"));
        assert!(pos(&create, "C") < pos(&create, "A"));

        let drop = g.drop_order_all().unwrap();
        assert!(pos(&drop, "A") < pos(&drop, "B"));
        assert!(pos(&drop, "A") < pos(&drop, "C"));

        let scoped = g.create_order("A").unwrap();
        assert!(scoped == ["B", "C", "A"] || scoped == ["C", "B", "A"], "{scoped:?}");
        assert_eq!(g.drop_order("A").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_chain() {
        let g = graph(&["X", "Y", "Z"], &[("X", "Y"), ("Y", "Z")]).unwrap();

        assert_eq!(g.create_order("X").unwrap(), vec!["Z", "Y", "X"]);
        assert_eq!(g.drop_order("Z").unwrap(), vec!["X", "Y", "Z"]);
        assert_eq!(g.create_order("Z").unwrap(), vec!["Z"]);
        assert_eq!(g.drop_order("Y").unwrap(), vec!["X", "Y"]);
        assert_eq!(g.create_order_all().unwrap(), vec!["Z", "Y", "X"]);
        assert_eq!(g.drop_order_all().unwrap(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let g = graph(
            &["noValidator", "constraints", "dependsOn"],
            &[("dependsOn", "noValidator"), ("dependsOn", "constraints")],
        )
        .unwrap();

        assert_eq!(
            g.create_order("dependsOn").unwrap(),
            vec!["constraints", "noValidator", "dependsOn"]
        );
        assert_eq!(
            g.create_order_all().unwrap(),
            vec!["noValidator", "constraints", "dependsOn"]
        );
    }

    #[test]
    fn test_diamond_scoped_orders() {
        // report -> orders -> customers, report -> customers
        let g = graph(
            &["customers", "orders", "report", "unrelated"],
            &[("orders", "customers"), ("report", "orders"), ("report", "customers")],
        )
        .unwrap();

        assert_eq!(g.create_order("report").unwrap(), vec!["customers", "orders", "report"]);
        assert_eq!(g.drop_order("customers").unwrap(), vec!["report", "orders", "customers"]);
        assert_eq!(g.drop_order("unrelated").unwrap(), vec!["unrelated"]);
        assert_eq!(g.dependencies_of("report").unwrap(), vec!["orders", "customers"]);
        assert_eq!(g.dependents_of("customers").unwrap(), vec!["orders", "report"]);
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_edge_is_idempotent() {
        let g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.create_order("a").unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_two_cycle_rejected() {
        let err = graph(&["a", "b"], &[("a", "b"), ("b", "a")]).unwrap_err();
        match err {
            SpecGenError::CyclicDependency { cycle } => {
                assert_eq!(cycle.len(), 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("Wrong error type: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_reported_in_edge_direction() {
        // entry feeds into the cycle but is not part of it
        let err = graph(
            &["entry", "p", "q", "r"],
            &[("entry", "p"), ("p", "q"), ("q", "r"), ("r", "p")],
        )
        .unwrap_err();

        let SpecGenError::CyclicDependency { cycle } = err else {
            panic!("expected cycle");
        };
        assert!(!cycle.contains(&"entry".to_string()));
        assert_eq!(cycle.len(), 4);
        for pair in cycle.windows(2) {
            let expected = match pair[0].as_str() {
                "p" => "q",
                "q" => "r",
                "r" => "p",
                other => panic!("unexpected vertex {other}"),
            };
            assert_eq!(pair[1], expected);
        }
    }

    #[test]
    fn test_self_edge_rejected() {
        let mut g = DependencyGraph::new(["a"]).unwrap();
        assert_error_sqlstate(g.depends_on("a", "a"), "55P03");
    }

    #[test]
    fn test_unknown_targets() {
        let mut g = DependencyGraph::new(["a", "b"]).unwrap();
        assert_eq!(
            g.depends_on("a", "missing"),
            Err(SpecGenError::UnknownTarget { name: "missing".to_string() })
        );
        assert_error_sqlstate(g.depends_on("missing", "a"), "42704");

        let g = g.finalize().unwrap();
        assert_error_sqlstate(g.create_order("missing"), "42704");
        assert_error_sqlstate(g.drop_order("missing"), "42704");
        assert!(!g.contains("missing"));
    }

    #[test]
    fn test_empty_graph() {
        let g = DependencyGraph::new(Vec::<String>::new()).unwrap().finalize().unwrap();
        assert!(g.create_order_all().unwrap().is_empty());
        assert!(g.drop_order_all().unwrap().is_empty());
    }

    /// Random DAG over `n` vertices: edges only from higher to lower index
    fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..12).prop_flat_map(|n| {
            let edges = prop::collection::vec((0..n, 0..n), 0..30).prop_map(|pairs| {
                pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| (a.max(b), a.min(b)))
                    .collect::<Vec<_>>()
            });
            (Just(n), edges)
        })
    }

    fn build_dag(n: usize, edges: &[(usize, usize)], shuffle: &[usize]) -> FinalizedGraph {
        // Register vertices in a permuted order so index order != edge order
        let names: Vec<String> = shuffle.iter().map(|i| format!("t{i}")).collect();
        let mut g = DependencyGraph::new(names).unwrap();
        for &(a, b) in edges {
            g.depends_on(&format!("t{a}"), &format!("t{b}")).unwrap();
        }
        assert_eq!(g.store.len(), n);
        g.finalize().unwrap()
    }

    fn reachable(edges: &[(usize, usize)], start: usize, forward: bool) -> Vec<usize> {
        let mut seen = vec![start];
        let mut i = 0;
        while i < seen.len() {
            let v = seen[i];
            for &(a, b) in edges {
                let (from, to) = if forward { (a, b) } else { (b, a) };
                if from == v && !seen.contains(&to) {
                    seen.push(to);
                }
            }
            i += 1;
        }
        seen
    }

    proptest! {
        #[test]
        fn prop_orders_respect_every_edge(
            (n, edges) in dag(),
            seed in any::<u64>(),
        ) {
            let mut shuffle: Vec<usize> = (0..n).collect();
            shuffle.sort_by_key(|i| (*i as u64).wrapping_mul(seed | 1).rotate_left(17));
            let g = build_dag(n, &edges, &shuffle);

            let create = g.create_order_all().unwrap();
            let drop = g.drop_order_all().unwrap();
            prop_assert_eq!(create.len(), n);
            prop_assert_eq!(drop.len(), n);

            for &(a, b) in &edges {
                let (a, b) = (format!("t{a}"), format!("t{b}"));
                prop_assert!(pos(&create, &b) < pos(&create, &a));
                prop_assert!(pos(&drop, &a) < pos(&drop, &b));
            }
        }

        #[test]
        fn prop_scoped_orders_are_closures_ending_at_target(
            (n, edges) in dag(),
            pick in any::<prop::sample::Index>(),
        ) {
            let shuffle: Vec<usize> = (0..n).collect();
            let g = build_dag(n, &edges, &shuffle);
            let v = pick.index(n);
            let target = format!("t{v}");

            let create = g.create_order(&target).unwrap();
            let drop = g.drop_order(&target).unwrap();
            prop_assert_eq!(create.last(), Some(&target));
            prop_assert_eq!(drop.last(), Some(&target));

            let mut expected: Vec<String> =
                reachable(&edges, v, true).iter().map(|i| format!("t{i}")).collect();
            let mut got = create.clone();
            expected.sort();
            got.sort();
            prop_assert_eq!(got, expected);

            let mut expected: Vec<String> =
                reachable(&edges, v, false).iter().map(|i| format!("t{i}")).collect();
            let mut got = drop.clone();
            expected.sort();
            got.sort();
            prop_assert_eq!(got, expected);

            // idempotent
            prop_assert_eq!(g.create_order(&target).unwrap(), create);
            prop_assert_eq!(g.drop_order(&target).unwrap(), drop);
        }

        #[test]
        fn prop_closing_edge_makes_cycle(n in 2usize..10) {
            let names: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
            let mut g = DependencyGraph::new(names.clone()).unwrap();
            for w in names.windows(2) {
                g.depends_on(&w[0], &w[1]).unwrap();
            }
            g.depends_on(&names[n - 1], &names[0]).unwrap();

            let is_cycle = matches!(g.finalize(), Err(SpecGenError::CyclicDependency { .. }));
            prop_assert!(is_cycle, "closing edge over {} targets was accepted", n);
        }
    }
}
