//! Module dependency resolution.

use super::Module;
use crate::error::Error;
use std::collections::{HashMap, HashSet};

/// Dependency graph over a set of modules to load.
pub struct DependencyGraph;

impl DependencyGraph {
    /// Produce a load order as indexes into `modules`.
    ///
    /// The order is topological over the `depends` edges; among modules
    /// whose dependencies are equally satisfied, declaration order wins.
    /// A dependency may be satisfied by membership in `satisfied`
    /// (modules already initialized by the loader) instead of the load
    /// set itself.
    pub fn order(modules: &[Module], satisfied: &HashSet<String>) -> Result<Vec<usize>, Error> {
        let index: HashMap<&str, usize> = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), i))
            .collect();

        // Edges dependency -> dependent, plus indegree per module.
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
        let mut indegree = vec![0usize; modules.len()];
        for (i, module) in modules.iter().enumerate() {
            for dependency in &module.depends {
                match index.get(dependency.as_str()) {
                    Some(&dep) => {
                        dependents[dep].push(i);
                        indegree[i] += 1;
                    }
                    None if satisfied.contains(dependency) => {}
                    None => {
                        return Err(Error::MissingDependency {
                            module: module.name.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }

        let mut ready: Vec<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(modules.len());
        while !ready.is_empty() {
            // Smallest declaration index first.
            let pos = ready
                .iter()
                .enumerate()
                .min_by_key(|(_, &i)| i)
                .map(|(p, _)| p)
                .unwrap_or(0);
            let current = ready.swap_remove(pos);
            order.push(current);
            for &dependent in &dependents[current] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(dependent);
                }
            }
        }

        if order.len() < modules.len() {
            let stuck = indegree
                .iter()
                .position(|&d| d > 0)
                .map(|i| modules[i].name.clone())
                .unwrap_or_default();
            return Err(Error::CyclicDependency { module: stuck });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(specs: &[(&str, &[&str])]) -> Vec<Module> {
        specs
            .iter()
            .map(|(name, deps)| {
                let mut module = Module::new(*name, "1.0");
                for dep in *deps {
                    module = module.with_dependency(*dep);
                }
                module
            })
            .collect()
    }

    fn order_names(modules: &[Module], satisfied: &HashSet<String>) -> Result<Vec<String>, Error> {
        let order = DependencyGraph::order(modules, satisfied)?;
        Ok(order.iter().map(|&i| modules[i].name.clone()).collect())
    }

    #[test]
    fn test_dependency_before_dependent() {
        let set = modules(&[("b", &["a"]), ("a", &[])]);
        let order = order_names(&set, &HashSet::new()).unwrap();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let set = modules(&[("c", &[]), ("a", &[]), ("b", &[])]);
        let order = order_names(&set, &HashSet::new()).unwrap();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_dependency() {
        let set = modules(&[("b", &["a"])]);
        let err = order_names(&set, &HashSet::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingDependency { module, dependency }
                if module == "b" && dependency == "a"
        ));
    }

    #[test]
    fn test_already_initialized_dependency_is_satisfied() {
        let set = modules(&[("b", &["a"])]);
        let satisfied: HashSet<String> = ["a".to_string()].into();
        let order = order_names(&set, &satisfied).unwrap();
        assert_eq!(order, vec!["b"]);
    }

    #[test]
    fn test_cycle_detected() {
        let set = modules(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let err = order_names(&set, &HashSet::new()).unwrap_err();
        assert!(matches!(err, Error::CyclicDependency { .. }));
    }

    #[test]
    fn test_diamond() {
        let set = modules(&[
            ("d", &["b", "c"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("a", &[]),
        ]);
        let order = order_names(&set, &HashSet::new()).unwrap();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }
}
