//! Dependency DAG over migration units and deterministic ordering.

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::table_name::TableName;
use crate::unit_name::UnitName;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A directed acyclic graph of migration unit dependencies.
///
/// Edges run from dependency to dependent, so a topological walk yields
/// dependencies first. Ordering is total and deterministic: units with no
/// dependency relation come out in identifier order.
#[derive(Debug)]
pub struct UnitDag {
    /// The underlying graph
    graph: DiGraph<UnitName, ()>,

    /// Map from unit name to node index
    node_map: HashMap<UnitName, NodeIndex>,
}

impl UnitDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a unit to the DAG
    pub fn add_unit(&mut self, name: &UnitName) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            idx
        } else {
            let idx = self.graph.add_node(name.clone());
            self.node_map.insert(name.clone(), idx);
            idx
        }
    }

    /// Add a dependency edge (`unit` depends on `dependency`)
    pub fn add_dependency(&mut self, unit: &UnitName, dependency: &UnitName) {
        let unit_idx = self.add_unit(unit);
        let dep_idx = self.add_unit(dependency);
        // Edge goes from dependency to dependent so topological sort
        // yields dependencies first.
        if !self.graph.contains_edge(dep_idx, unit_idx) {
            self.graph.add_edge(dep_idx, unit_idx, ());
        }
    }

    /// Build the DAG for a catalog from explicit dependencies plus
    /// referential inference.
    ///
    /// A unit whose operations reference table T is ordered after the unit
    /// whose operations create T. Unknown explicit dependencies are an error;
    /// references to tables no catalog unit creates (pre-existing or
    /// externally managed tables) impose no ordering.
    pub fn build(catalog: &Catalog) -> CoreResult<Self> {
        catalog.validate_dependencies()?;

        let mut dag = Self::new();
        for unit in catalog.units() {
            dag.add_unit(&unit.name);
        }

        // Map each created table to its creating unit.
        let mut creators: HashMap<&TableName, &UnitName> = HashMap::new();
        for unit in catalog.units() {
            for table in unit.created_tables() {
                creators.entry(table).or_insert(&unit.name);
            }
        }

        for unit in catalog.units() {
            for dep in &unit.depends_on {
                dag.add_dependency(&unit.name, dep);
            }
            for table in unit.referenced_tables() {
                if let Some(&creator) = creators.get(&table) {
                    if *creator != unit.name {
                        log::debug!(
                            "inferred dependency: {} -> {} (table {})",
                            unit.name,
                            creator,
                            table
                        );
                        dag.add_dependency(&unit.name, creator);
                    }
                }
            }
        }

        dag.validate()?;
        Ok(dag)
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let cycle_str = self.find_cycle_path(cycle.node_id());
                Err(CoreError::DependencyCycle { cycle: cycle_str })
            }
        }
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Total application order: every dependency before its dependents,
    /// identifier order among unrelated units.
    ///
    /// Kahn's algorithm with an ordered ready-set so the result is stable
    /// across runs regardless of insertion order.
    pub fn application_order(&self) -> CoreResult<Vec<UnitName>> {
        self.validate()?;

        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            in_degree.insert(
                idx,
                self.graph
                    .edges_directed(idx, petgraph::Direction::Incoming)
                    .count(),
            );
        }

        let mut ready: BTreeSet<(UnitName, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| (self.graph[idx].clone(), idx))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(entry) = ready.iter().next().cloned() {
            ready.remove(&entry);
            let (name, idx) = entry;
            order.push(name);

            for edge in self
                .graph
                .edges_directed(idx, petgraph::Direction::Outgoing)
            {
                let target = edge.target();
                let deg = in_degree
                    .get_mut(&target)
                    .expect("target is a known node");
                *deg -= 1;
                if *deg == 0 {
                    ready.insert((self.graph[target].clone(), target));
                }
            }
        }

        Ok(order)
    }

    /// Get direct dependencies of a unit
    pub fn dependencies(&self, unit: &str) -> Vec<UnitName> {
        if let Some(&idx) = self.node_map.get(unit) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| self.graph[e.source()].clone())
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Get direct dependents of a unit
    pub fn dependents(&self, unit: &str) -> Vec<UnitName> {
        if let Some(&idx) = self.node_map.get(unit) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Outgoing)
                .map(|e| self.graph[e.target()].clone())
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Check if a unit exists in the DAG
    pub fn contains(&self, unit: &str) -> bool {
        self.node_map.contains_key(unit)
    }
}

impl Default for UnitDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
