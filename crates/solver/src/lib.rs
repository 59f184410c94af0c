// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Dependency resolution over the package universe.
//!
//! Callers hand in every known release tagged with whether it is the
//! currently installed version, plus a [`Request`] of install / remove /
//! upgrade wishes. [`resolve`] answers with candidate [`Solution`]s, each an
//! ordered sequence of parallel action batches: dependencies strictly before
//! their dependents for installs, dependents first for removals.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use spec::{Constraint, Depend, Name, Version, NV};

/// One release in the solver universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub nv: NV,
    /// This exact release is the installed one
    pub installed: bool,
    pub depends: Vec<Depend>,
}

/// A single wish: a package name, optionally constrained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wish {
    pub name: Name,
    pub constraint: Option<Constraint>,
}

impl Wish {
    pub fn any(name: Name) -> Self {
        Self {
            name,
            constraint: None,
        }
    }

    pub fn pinned(name: Name, version: &Version) -> Self {
        Self {
            name,
            constraint: Some(Constraint::exactly(version)),
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub wish_install: Vec<Wish>,
    pub wish_remove: Vec<Wish>,
    pub wish_upgrade: Vec<Wish>,
}

/// One state-changing step of a solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Install `to`, replacing `from` when a version was already installed
    Change { from: Option<NV>, to: NV },
    /// Remove the installed release
    Delete(NV),
    /// Rebuild the installed release in place
    Recompile(NV),
}

impl Action {
    /// Deletes or replaces a currently installed version
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Action::Delete(_) | Action::Change { from: Some(_), .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Change { from: None, to } => write!(f, "install   {to}"),
            Action::Change {
                from: Some(old),
                to,
            } => write!(f, "upgrade   {} from {} to {}", to.name, old.version, to.version),
            Action::Delete(nv) => write!(f, "remove    {nv}"),
            Action::Recompile(nv) => write!(f, "recompile {nv}"),
        }
    }
}

/// Actions with no ordering requirement between them
pub type Batch = Vec<Action>;

/// An ordered sequence of parallel batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution(pub Vec<Batch>);

impl Solution {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Vec::is_empty)
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.0.iter().flatten()
    }

    /// A solution warranting user confirmation before application
    pub fn is_destructive(&self) -> bool {
        self.actions().any(Action::is_destructive)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for action in self.actions() {
            writeln!(f, "  - {action}")?;
        }
        Ok(())
    }
}

/// Resolve `request` against `universe`.
///
/// An empty result means no solution satisfies the request. A lone solution
/// with no actions means there was nothing left to do.
pub fn resolve(universe: &[Package], request: &Request) -> Result<Vec<Solution>, Error> {
    let lookup = Lookup::new(universe);

    let mut batches = Vec::new();

    // Dependents go away before the packages they rely on
    batches.extend(removals(&lookup, &request.wish_remove)?);

    // Installs & upgrades share the change machinery; upgrades additionally
    // trigger rebuilds of every installed dependent left untouched
    let mut changes = Vec::new();

    for wish in &request.wish_install {
        let Some(candidate) = lookup.best(&wish.name, wish.constraint.as_ref()) else {
            return Ok(Vec::new());
        };
        changes.push(candidate);
    }

    let mut recompiles = Vec::new();

    for wish in &request.wish_upgrade {
        let Some(candidate) = lookup.best(&wish.name, wish.constraint.as_ref()) else {
            return Ok(Vec::new());
        };

        match lookup.installed(&wish.name) {
            // Nothing newer; leave the package alone
            Some(current) if !wants_change(&current.nv.version, &candidate.nv.version) => {}
            _ => {
                changes.push(candidate);
                recompiles.extend(lookup.installed_dependents(&wish.name));
            }
        }
    }

    batches.extend(changes_and_recompiles(&lookup, changes, recompiles)?);

    Ok(vec![Solution(batches)])
}

/// Keep only `roots` and everything they transitively depend on,
/// dependencies ordered before their dependents.
///
/// Naming is historical: the "backward" closure walks dependency edges
/// backwards from the roots, yielding the dependencies-of set.
pub fn filter_backward_dependencies(
    universe: &[Package],
    roots: &[Name],
) -> Result<Vec<NV>, Error> {
    closure(universe, roots, Direction::Incoming)
}

/// Keep only `roots` and every package transitively depending on them
/// (the dependents-of set), dependencies ordered before their dependents.
pub fn filter_forward_dependencies(
    universe: &[Package],
    roots: &[Name],
) -> Result<Vec<NV>, Error> {
    closure(universe, roots, Direction::Outgoing)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("dependency cycle involving {0}")]
    Cyclical(Name),
}

/// Indexed view over the universe
struct Lookup<'a> {
    by_name: HashMap<&'a Name, Vec<&'a Package>>,
}

impl<'a> Lookup<'a> {
    fn new(universe: &'a [Package]) -> Self {
        let mut by_name: HashMap<&Name, Vec<&Package>> = HashMap::new();
        for package in universe {
            by_name.entry(&package.nv.name).or_default().push(package);
        }
        Self { by_name }
    }

    fn installed(&self, name: &Name) -> Option<&'a Package> {
        self.by_name
            .get(name)?
            .iter()
            .find(|p| p.installed)
            .copied()
    }

    /// Highest version candidate honoring `constraint`
    fn best(&self, name: &Name, constraint: Option<&Constraint>) -> Option<&'a Package> {
        self.by_name
            .get(name)?
            .iter()
            .filter(|p| {
                constraint
                    .map(|c| c.satisfied_by(&p.nv.version))
                    .unwrap_or(true)
            })
            .max_by(|a, b| a.nv.version.cmp(&b.nv.version))
            .copied()
    }

    /// Installed packages directly or transitively depending on `name`
    fn installed_dependents(&self, name: &Name) -> Vec<&'a Package> {
        let installed = self.installed_set();
        let (graph, indices) = dependency_graph(&installed);

        let Some(&root) = indices.get(name) else {
            return Vec::new();
        };

        let mut dfs = petgraph::visit::Dfs::new(&graph, root);
        let mut dependents = Vec::new();
        while let Some(ix) = dfs.next(&graph) {
            if ix != root {
                dependents.push(installed[graph[ix]]);
            }
        }
        dependents
    }

    fn installed_set(&self) -> Vec<&'a Package> {
        self.by_name
            .values()
            .flatten()
            .filter(|p| p.installed)
            .copied()
            .sorted_by(|a, b| a.nv.name.cmp(&b.nv.name))
            .collect()
    }
}

/// Build the dependency graph over `packages`, one node per entry holding its
/// index, edges pointing dependency → dependent.
fn dependency_graph<'a>(
    packages: &[&'a Package],
) -> (DiGraph<usize, ()>, HashMap<&'a Name, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut indices = HashMap::new();

    for (ix, package) in packages.iter().enumerate() {
        indices.insert(&package.nv.name, graph.add_node(ix));
    }

    for package in packages {
        for depend in &package.depends {
            if let Some(&dep_ix) = indices.get(&depend.name) {
                graph.add_edge(dep_ix, indices[&package.nv.name], ());
            }
        }
    }

    (graph, indices)
}

/// Group graph nodes into parallel levels: a node lands one level after the
/// deepest of its neighbors in `towards` direction.
fn levels(
    graph: &DiGraph<usize, ()>,
    packages: &[&Package],
    keep: impl Fn(NodeIndex) -> bool,
    towards: Direction,
) -> Result<Vec<Vec<NodeIndex>>, Error> {
    let order = petgraph::algo::toposort(graph, None)
        .map_err(|e| Error::Cyclical(packages[graph[e.node_id()]].nv.name.clone()))?;

    let iter: Box<dyn Iterator<Item = NodeIndex>> = match towards {
        Direction::Incoming => Box::new(order.into_iter()),
        Direction::Outgoing => Box::new(order.into_iter().rev()),
    };

    let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
    let mut grouped: Vec<Vec<NodeIndex>> = Vec::new();

    for ix in iter {
        if !keep(ix) {
            continue;
        }

        let level = graph
            .edges_directed(ix, towards)
            .filter_map(|edge| {
                let other = match towards {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                depth.get(&other).map(|d| d + 1)
            })
            .max()
            .unwrap_or(0);

        depth.insert(ix, level);

        if grouped.len() <= level {
            grouped.resize(level + 1, Vec::new());
        }
        grouped[level].push(ix);
    }

    Ok(grouped)
}

fn removals(lookup: &Lookup<'_>, wishes: &[Wish]) -> Result<Vec<Batch>, Error> {
    if wishes.is_empty() {
        return Ok(Vec::new());
    }

    let installed = lookup.installed_set();
    let (graph, indices) = dependency_graph(&installed);

    // Roots plus every installed dependent
    let mut doomed = std::collections::HashSet::new();
    for wish in wishes {
        let Some(&root) = indices.get(&wish.name) else {
            continue;
        };
        let mut dfs = petgraph::visit::Dfs::new(&graph, root);
        while let Some(ix) = dfs.next(&graph) {
            doomed.insert(ix);
        }
    }

    // Dependents first
    let grouped = levels(&graph, &installed, |ix| doomed.contains(&ix), Direction::Outgoing)?;

    Ok(grouped
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|ix| Action::Delete(installed[graph[ix]].nv.clone()))
                .sorted_by(|a, b| action_key(a).cmp(action_key(b)))
                .collect()
        })
        .filter(|batch: &Batch| !batch.is_empty())
        .collect())
}

fn changes_and_recompiles<'a>(
    lookup: &Lookup<'a>,
    requested: Vec<&'a Package>,
    recompiles: Vec<&'a Package>,
) -> Result<Vec<Batch>, Error> {
    // Close over dependencies: any dependency without a satisfying installed
    // version becomes a change of its own
    let mut chosen: HashMap<&Name, &Package> = HashMap::new();
    let mut queue: Vec<&Package> = requested;

    while let Some(package) = queue.pop() {
        if chosen.contains_key(&package.nv.name) {
            continue;
        }
        chosen.insert(&package.nv.name, package);

        for depend in &package.depends {
            if chosen.contains_key(&depend.name) {
                continue;
            }

            let satisfied = lookup
                .installed(&depend.name)
                .map(|p| {
                    depend
                        .constraint
                        .as_ref()
                        .map(|c| c.satisfied_by(&p.nv.version))
                        .unwrap_or(true)
                })
                .unwrap_or(false);

            if !satisfied {
                if let Some(candidate) = lookup.best(&depend.name, depend.constraint.as_ref()) {
                    queue.push(candidate);
                }
            }
        }
    }

    // Drop no-op changes: the installed release re-chosen as candidate
    chosen.retain(|_, package| !package.installed);

    let recompiles: Vec<&Package> = recompiles
        .into_iter()
        .filter(|p| !chosen.contains_key(&p.nv.name))
        .unique_by(|p| p.nv.name.clone())
        .collect();

    // Order the whole change set dependencies-first
    let affected: Vec<&Package> = chosen
        .values()
        .copied()
        .chain(recompiles.iter().copied())
        .sorted_by(|a, b| a.nv.name.cmp(&b.nv.name))
        .collect();

    let (graph, _) = dependency_graph(&affected);
    let grouped = levels(&graph, &affected, |_| true, Direction::Incoming)?;

    Ok(grouped
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|ix| {
                    let package = affected[graph[ix]];
                    if chosen.contains_key(&package.nv.name) {
                        Action::Change {
                            from: lookup
                                .installed(&package.nv.name)
                                .map(|p| p.nv.clone()),
                            to: package.nv.clone(),
                        }
                    } else {
                        Action::Recompile(package.nv.clone())
                    }
                })
                .sorted_by(|a, b| action_key(a).cmp(action_key(b)))
                .collect()
        })
        .filter(|batch: &Batch| !batch.is_empty())
        .collect())
}

fn action_key(action: &Action) -> &NV {
    match action {
        Action::Change { to, .. } => to,
        Action::Delete(nv) => nv,
        Action::Recompile(nv) => nv,
    }
}

fn closure(universe: &[Package], roots: &[Name], towards: Direction) -> Result<Vec<NV>, Error> {
    let packages: Vec<&Package> = universe.iter().collect();
    let (graph, indices) = dependency_graph(&packages);

    let mut wanted = std::collections::HashSet::new();
    for root in roots {
        let Some(&ix) = indices.get(root) else {
            continue;
        };

        match towards {
            Direction::Outgoing => {
                let mut dfs = petgraph::visit::Dfs::new(&graph, ix);
                while let Some(next) = dfs.next(&graph) {
                    wanted.insert(next);
                }
            }
            Direction::Incoming => {
                let reversed = petgraph::visit::Reversed(&graph);
                let mut dfs = petgraph::visit::Dfs::new(&reversed, ix);
                while let Some(next) = dfs.next(&reversed) {
                    wanted.insert(next);
                }
            }
        }
    }

    let grouped = levels(&graph, &packages, |ix| wanted.contains(&ix), Direction::Incoming)?;

    Ok(grouped
        .into_iter()
        .flatten()
        .map(|ix| packages[graph[ix]].nv.clone())
        .collect())
}

fn wants_change(installed: &Version, candidate: &Version) -> bool {
    use spec::HeadState;

    match (installed, candidate) {
        // A stale git tracking package is refreshed by re-pinning HEAD
        (Version::Head(HeadState::Behind | HeadState::Unknown), Version::Head(_)) => true,
        (Version::Head(HeadState::UpToDate), Version::Head(_)) => false,
        (installed, candidate) => candidate > installed,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn package(nv: &str, installed: bool, depends: &[&str]) -> Package {
        Package {
            nv: nv.parse().unwrap(),
            installed,
            depends: depends
                .iter()
                .map(|name| Depend {
                    name: name.parse().unwrap(),
                    constraint: None,
                })
                .collect(),
        }
    }

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[test]
    fn install_orders_dependencies_first() {
        let universe = vec![
            package("app-1.0", false, &["lib"]),
            package("lib-0.5", false, &["base"]),
            package("base-2.1", false, &[]),
        ];

        let request = Request {
            wish_install: vec![Wish::any(name("app"))],
            ..Default::default()
        };

        let solutions = resolve(&universe, &request).unwrap();
        assert_eq!(solutions.len(), 1);

        let ordered: Vec<String> = solutions[0]
            .actions()
            .map(|a| match a {
                Action::Change { to, .. } => to.name.to_string(),
                _ => panic!("unexpected action"),
            })
            .collect();

        assert_eq!(ordered, ["base", "lib", "app"]);
        assert!(!solutions[0].is_destructive());
    }

    #[test]
    fn remove_takes_dependents_down_first() {
        let universe = vec![
            package("foo-1.0", true, &[]),
            package("bar-0.2", true, &["foo"]),
        ];

        let request = Request {
            wish_remove: vec![Wish::any(name("foo"))],
            ..Default::default()
        };

        let solutions = resolve(&universe, &request).unwrap();
        let deletes: Vec<String> = solutions[0]
            .actions()
            .map(|a| match a {
                Action::Delete(nv) => nv.to_string(),
                _ => panic!("unexpected action"),
            })
            .collect();

        assert_eq!(deletes, ["bar-0.2", "foo-1.0"]);
        assert!(solutions[0].is_destructive());
    }

    #[test]
    fn upgrade_recompiles_dependents() {
        let universe = vec![
            package("lib-1.0", true, &[]),
            package("lib-2.0", false, &[]),
            package("app-0.9", true, &["lib"]),
        ];

        let request = Request {
            wish_upgrade: vec![Wish::any(name("lib"))],
            ..Default::default()
        };

        let solutions = resolve(&universe, &request).unwrap();
        let actions: Vec<&Action> = solutions[0].actions().collect();

        assert!(matches!(
            actions[0],
            Action::Change { from: Some(old), to } if old.to_string() == "lib-1.0" && to.to_string() == "lib-2.0"
        ));
        assert!(matches!(
            actions[1],
            Action::Recompile(nv) if nv.to_string() == "app-0.9"
        ));
    }

    #[test]
    fn unsatisfiable_pin_yields_no_solution() {
        let universe = vec![package("foo-1.0", false, &[])];

        let request = Request {
            wish_install: vec![Wish::pinned(
                name("foo"),
                &Version::Release("9.9".into()),
            )],
            ..Default::default()
        };

        assert!(resolve(&universe, &request).unwrap().is_empty());
    }

    #[test]
    fn nothing_to_do_is_an_empty_solution() {
        let universe = vec![package("foo-1.0", true, &[])];

        let request = Request {
            wish_install: vec![Wish::any(name("foo"))],
            ..Default::default()
        };

        let solutions = resolve(&universe, &request).unwrap();
        assert_eq!(solutions.len(), 1);
        assert!(solutions[0].is_empty());
    }

    #[test]
    fn backward_closure_is_dependencies_of() {
        let universe = vec![
            package("app-1.0", true, &["lib"]),
            package("lib-0.5", true, &["base"]),
            package("base-2.1", true, &[]),
            package("other-3.0", true, &[]),
        ];

        let closure = filter_backward_dependencies(&universe, &[name("app")]).unwrap();
        let names: Vec<String> = closure.iter().map(|nv| nv.name.to_string()).collect();

        assert_eq!(names, ["base", "lib", "app"]);
    }
}
