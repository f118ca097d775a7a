//! Instance nodes and structural-tree operations.
//!
//! One [`Instance`] exists per placement of a functional unit in the design
//! hierarchy. A node with no unit reference is a placeholder awaiting later
//! resolution; a node carrying a range is an unexpanded instance array.
//! All edits are index reassignments on the owning [`CoverageDb`] arenas.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::trace;

use covdb_common::scope;
use covdb_model::{FunitId, InstId, Statistics};

use crate::db::CoverageDb;
use crate::error::TreeError;

/// Declared bounds of an instance array, prior to expansion.
///
/// Bounds arrive already evaluated by the elaborator. Either ordering is
/// legal (`[3:0]` or `[0:3]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstRange {
    /// Left bound as written in the source.
    pub left: i32,
    /// Right bound as written in the source.
    pub right: i32,
}

impl InstRange {
    /// Computes the `(lsb, width)` of the declared range.
    pub fn lsb_and_width(&self) -> (i32, u32) {
        let lsb = self.left.min(self.right);
        let width = self.left.abs_diff(self.right) + 1;
        (lsb, width)
    }
}

/// One structural placement of a functional unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Instantiated name, possibly with an `[index]` suffix after array
    /// resolution.
    pub name: String,
    /// The referenced definition; `None` marks a placeholder.
    pub funit: Option<FunitId>,
    /// Unexpanded array bounds; `Some` means this node is unresolved.
    pub range: Option<InstRange>,
    /// Parent node, `None` for forest roots.
    pub parent: Option<InstId>,
    /// Child placements, in insertion order.
    pub children: Vec<InstId>,
    /// Set when an asymmetric merge made this subtree's scope name only
    /// approximately accurate.
    pub name_diff: bool,
    /// Accumulated statistics for this subtree.
    pub stat: Statistics,
}

impl CoverageDb {
    /// Allocates a new instance node with no children.
    ///
    /// The range, when present, is copied by value so the node's bounds are
    /// independent of the caller's.
    pub fn create_instance(
        &mut self,
        funit: Option<FunitId>,
        name: &str,
        name_diff: bool,
        range: Option<InstRange>,
    ) -> InstId {
        self.insts.alloc(Instance {
            name: name.to_string(),
            funit,
            range,
            parent: None,
            children: Vec::new(),
            name_diff,
            stat: Statistics::zero(),
        })
    }

    /// Inserts a new child under `parent` unless a same-named child already
    /// exists (a duplicate insertion is a silent no-op returning `None`).
    ///
    /// With `resolve` set, the new child's array range is expanded
    /// immediately.
    pub fn add_child(
        &mut self,
        parent: InstId,
        funit: Option<FunitId>,
        name: &str,
        range: Option<InstRange>,
        resolve: bool,
    ) -> Option<InstId> {
        let exists = self.insts[parent]
            .children
            .iter()
            .any(|&c| self.insts[c].name == name);
        if exists {
            return None;
        }
        let child = self.create_instance(funit, name, false, range);
        self.insts[child].parent = Some(parent);
        self.insts[parent].children.push(child);
        if resolve {
            self.resolve_inst(child);
        }
        Some(child)
    }

    /// Tests whether a scope component matches an instance's name.
    ///
    /// When the instance still carries a range, an indexed component
    /// `base[i]` matches if the base name agrees and `i` falls inside the
    /// declared bounds.
    pub fn instance_matches(&self, component: &str, inst: InstId) -> bool {
        let node = &self.insts[inst];
        match node.range {
            Some(range) => match scope::split_index(component) {
                Some((base, index)) => {
                    let (lsb, width) = range.lsb_and_width();
                    base == node.name && index >= lsb && index < lsb + width as i32
                }
                None => false,
            },
            None => component == node.name,
        }
    }

    fn holds_no_signals(&self, inst: InstId) -> bool {
        match self.insts[inst].funit {
            Some(f) => self.funits[f].has_no_signals(),
            None => true,
        }
    }

    /// Resolves a dotted scope path to an instance within `root`'s tree.
    ///
    /// When `remove_unnamed` is false, compiler-generated scopes holding no
    /// signals are transparently skipped, so flattened and unflattened
    /// scope strings both resolve. A miss is a normal `None`, not an error.
    pub fn find_scope(&self, root: InstId, path: &str, remove_unnamed: bool) -> Option<InstId> {
        let (front, rest) = scope::split_front(path);
        let node = &self.insts[root];

        // A flattened path omits this level entirely, so try the children
        // against the whole path first; an unflattened path still matches
        // below.
        if !remove_unnamed && scope::is_unnamed(&node.name) && self.holds_no_signals(root) {
            let skipped = node
                .children
                .iter()
                .find_map(|&child| self.find_scope(child, path, remove_unnamed));
            if skipped.is_some() {
                return skipped;
            }
        }
        if self.instance_matches(front, root) {
            if rest.is_empty() {
                return Some(root);
            }
            return node
                .children
                .iter()
                .find_map(|&child| self.find_scope(child, rest, remove_unnamed));
        }
        None
    }

    /// Depth-first search for the `ignore`-th placement of a functional
    /// unit (zero-based), used to iterate all placements of a shared
    /// definition.
    pub fn find_by_funit(&self, root: InstId, funit: FunitId, ignore: &mut usize) -> Option<InstId> {
        let node = &self.insts[root];
        if node.funit == Some(funit) {
            if *ignore == 0 {
                return Some(root);
            }
            *ignore -= 1;
            return None;
        }
        node.children
            .iter()
            .find_map(|&child| self.find_by_funit(child, funit, ignore))
    }

    /// Finds the single instance of a functional-unit name within a
    /// subtree.
    ///
    /// Ambiguous (two or more placements) and absent cases both yield
    /// `None`, signaling the caller to fall back to another merge
    /// heuristic.
    pub fn find_by_funit_name_unique(&self, root: InstId, funit_name: &str) -> Option<InstId> {
        let mut matched = None;
        let mut matches = 0usize;
        self.count_funit_name(root, funit_name, &mut matched, &mut matches);
        (matches == 1).then_some(matched).flatten()
    }

    fn count_funit_name(
        &self,
        root: InstId,
        funit_name: &str,
        matched: &mut Option<InstId>,
        matches: &mut usize,
    ) {
        let node = &self.insts[root];
        if let Some(f) = node.funit {
            if self.funits[f].name == funit_name {
                *matches += 1;
                *matched = Some(root);
            }
        }
        for &child in &node.children {
            self.count_funit_name(child, funit_name, matched, matches);
        }
    }

    /// Expands an instance array in place.
    ///
    /// The node is renamed to `name[lsb]` and stripped of its range; the
    /// remaining `width - 1` siblings are inserted under the same parent
    /// (or as forest roots when the node is a root), each already resolved.
    /// Returns whether an expansion occurred — a node with no range is a
    /// no-op.
    pub fn resolve_inst(&mut self, inst: InstId) -> bool {
        let Some(range) = self.insts[inst].range else {
            return false;
        };
        let (lsb, width) = range.lsb_and_width();
        let base = self.insts[inst].name.clone();
        let funit = self.insts[inst].funit;
        let parent = self.insts[inst].parent;

        self.insts[inst].range = None;
        self.insts[inst].name = scope::indexed(&base, lsb);
        trace!(%base, lsb, width, "expanding instance array");

        for i in 1..width as i32 {
            let sibling = scope::indexed(&base, lsb + i);
            match parent {
                Some(p) => {
                    self.add_child(p, funit, &sibling, None, true);
                }
                None => {
                    let new_root = self.create_instance(funit, &sibling, false, None);
                    self.roots.push(new_root);
                }
            }
        }
        true
    }

    /// Expands every instance array in the subtree, children first.
    pub fn resolve_all(&mut self, root: InstId) {
        let children = self.insts[root].children.clone();
        for child in children {
            self.resolve_all(child);
        }
        self.resolve_inst(root);
    }

    /// Builds the dotted scope path from the tree root down to `inst`.
    ///
    /// With `flatten` set, unnamed scope components are omitted.
    pub fn gen_scope(&self, inst: InstId, flatten: bool) -> String {
        let mut path = String::new();
        self.gen_scope_into(inst, flatten, &mut path);
        path
    }

    fn gen_scope_into(&self, inst: InstId, flatten: bool, path: &mut String) {
        let node = &self.insts[inst];
        if let Some(parent) = node.parent {
            self.gen_scope_into(parent, flatten, path);
        }
        if !flatten || !scope::is_unnamed(&node.name) {
            if !path.is_empty() {
                path.push(scope::SCOPE_SEP);
            }
            path.push_str(&node.name);
        }
    }

    /// Folds unnamed, signal-less child scopes into their parents across
    /// the subtree, reparenting grandchildren.
    ///
    /// Returns the now-orphaned functional-unit definitions so the caller
    /// can drop them from any definition lists it keeps. Used only during
    /// report preparation, never during simulation.
    pub fn flatten(&mut self, root: InstId) -> Vec<FunitId> {
        let mut removed = Vec::new();
        self.flatten_into(root, &mut removed);
        removed
    }

    fn flatten_into(&mut self, root: InstId, removed: &mut Vec<FunitId>) {
        let children = self.insts[root].children.clone();
        for child in children {
            self.flatten_into(child, removed);

            let fold = match self.insts[child].funit {
                Some(f) => self.funits[f].is_unnamed() && self.funits[f].has_no_signals(),
                None => false,
            };
            if !fold {
                continue;
            }

            let pos = self.insts[root]
                .children
                .iter()
                .position(|&c| c == child)
                .expect("child links are consistent");
            self.insts[root].children.remove(pos);
            let grandchildren = std::mem::take(&mut self.insts[child].children);
            for &grandchild in &grandchildren {
                self.insts[grandchild].parent = Some(root);
            }
            self.insts[root].children.extend(grandchildren);
            self.insts[child].parent = None;

            if let Some(f) = self.insts[child].funit {
                if !removed.contains(&f) {
                    removed.push(f);
                }
            }
        }
    }

    /// Unlinks and discards the subtree named by `path` within `root`'s
    /// tree.
    ///
    /// When the path names the root itself, the whole tree is dropped from
    /// the forest. A missing parent is fatal: it indicates unsalvageable
    /// corruption in the input that produced the path.
    pub fn remove_scope(&mut self, root: InstId, path: &str) -> Result<(), TreeError> {
        if self.instance_matches(path, root) {
            self.roots.retain(|&r| r != root);
            return Ok(());
        }

        let (rest, back) = scope::split_back(path);
        if rest.is_empty() {
            return Err(TreeError::ScopeNotFound {
                scope: path.to_string(),
            });
        }
        let parent = self
            .find_scope(root, rest, true)
            .ok_or_else(|| TreeError::ParentNotFound {
                scope: rest.to_string(),
            })?;
        let pos = self.insts[parent]
            .children
            .iter()
            .position(|&c| self.instance_matches(back, c))
            .ok_or_else(|| TreeError::ScopeNotFound {
                scope: path.to_string(),
            })?;
        let child = self.insts[parent].children.remove(pos);
        self.insts[child].parent = None;
        Ok(())
    }

    /// Deep-copies the subtree rooted at `from` as a new child of `to`.
    ///
    /// Nothing is copied when `to` already has a child named `name`.
    pub fn copy_subtree(
        &mut self,
        from: InstId,
        to: InstId,
        name: &str,
        range: Option<InstRange>,
        resolve: bool,
    ) {
        let funit = self.insts[from].funit;
        let Some(new_inst) = self.add_child(to, funit, name, range, resolve) else {
            return;
        };
        let children = self.insts[from].children.clone();
        for child in children {
            let child_name = self.insts[child].name.clone();
            let child_range = self.insts[child].range;
            self.copy_subtree(child, new_inst, &child_name, child_range, resolve);
        }
    }

    /// Inserts a child definition under every placement of its parent
    /// definition within `root`'s tree.
    ///
    /// When the child definition already has a placement (it was seen
    /// before), its existing subtree is copied so the new placements carry
    /// the same descendants. Returns whether at least one insertion
    /// happened.
    pub fn parse_add(
        &mut self,
        root: InstId,
        parent: FunitId,
        child: FunitId,
        name: &str,
        range: Option<InstRange>,
        resolve: bool,
    ) -> bool {
        let mut ignore = 0usize;
        let template = self.find_by_funit(root, child, &mut ignore);

        let mut inserted = 0usize;
        let mut skip = 0usize;
        loop {
            let mut ignore = skip;
            let Some(placement) = self.find_by_funit(root, parent, &mut ignore) else {
                break;
            };
            match template {
                Some(from) => self.copy_subtree(from, placement, name, range, resolve),
                None => {
                    self.add_child(placement, Some(child), name, range, resolve);
                }
            }
            inserted += 1;
            skip = inserted;
        }
        inserted > 0
    }

    /// Inserts a child under a scope-located parent during CDD reading.
    ///
    /// Unlike [`CoverageDb::parse_add`], exactly one placement is touched;
    /// a missing parent is fatal.
    pub fn read_add(
        &mut self,
        root: InstId,
        parent_scope: &str,
        funit: Option<FunitId>,
        name: &str,
        name_diff: bool,
    ) -> Result<InstId, TreeError> {
        let parent = self
            .find_scope(root, parent_scope, true)
            .ok_or_else(|| TreeError::ParentNotFound {
                scope: parent_scope.to_string(),
            })?;
        let child = self.create_instance(funit, name, name_diff, None);
        self.insts[child].parent = Some(parent);
        self.insts[parent].children.push(child);
        Ok(child)
    }

    /// Renders the subtree as an indented debug listing.
    pub fn dump_tree(&self, root: InstId) -> String {
        let mut out = String::new();
        self.dump_tree_into(root, 0, &mut out);
        out
    }

    fn dump_tree_into(&self, root: InstId, depth: usize, out: &mut String) {
        let node = &self.insts[root];
        let funit_name = node.funit.map(|f| self.funits[f].name.as_str()).unwrap_or("");
        let _ = writeln!(
            out,
            "{:indent$}{} ({})",
            "",
            node.name,
            funit_name,
            indent = depth * 3
        );
        for &child in &node.children {
            self.dump_tree_into(child, depth + 1, out);
        }
    }
}
