//! Cyclic dependency detection
//!
//! Depth-first search over a node list. Nodes on the current search path are
//! "discovered"; nodes whose adjacents have all been explored are "finished".
//! An edge into a discovered node closes a cycle.

use std::collections::{HashMap, HashSet};

/// Directed graph of task names and their prerequisite edges
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing the adjacents of an existing node
    pub fn add_node(&mut self, node: impl Into<String>, adjacents: Vec<String>) {
        let node = node.into();
        match self.index.get(&node) {
            Some(&i) => self.nodes[i].1 = adjacents,
            None => {
                self.index.insert(node.clone(), self.nodes.len());
                self.nodes.push((node, adjacents));
            }
        }
    }

    /// Search the graph for cycles
    ///
    /// Returns one message per cycle-closing edge, in search order. Empty
    /// when the graph is acyclic.
    pub fn search_for_cycles(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut discovered = HashSet::new();
        let mut finished = HashSet::new();

        for (node, _) in &self.nodes {
            if !discovered.contains(node.as_str()) && !finished.contains(node.as_str()) {
                self.visit(node, &mut discovered, &mut finished, &mut errors);
            }
        }

        errors
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        discovered: &mut HashSet<&'a str>,
        finished: &mut HashSet<&'a str>,
        errors: &mut Vec<String>,
    ) {
        discovered.insert(node);

        let adjacents = self
            .index
            .get(node)
            .map(|&i| self.nodes[i].1.as_slice())
            .unwrap_or_default();

        for adjacent in adjacents {
            let adjacent = adjacent.as_str();
            if discovered.contains(adjacent) {
                errors.push(format!(
                    "cyclic dependency between '{}' and '{}'",
                    node, adjacent
                ));
            } else if !finished.contains(adjacent) {
                self.visit(adjacent, discovered, finished, errors);
            }
        }

        discovered.remove(node);
        finished.insert(node);
    }
}
