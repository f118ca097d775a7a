//! The merge engine: reconciling two instance trees into one.
//!
//! Two trees captured from separate simulation runs usually share a design
//! but not necessarily a leading hierarchy — one run may have been scored
//! from the testbench root, the other from the DUT. Pairing walks a ladder
//! of heuristics from "identical hierarchy" down to "unique placement of
//! the other tree's unit name", and gives up by leaving both trees in the
//! forest rather than forcing an invalid merge.

use tracing::{debug, trace};

use covdb_common::scope;
use covdb_model::InstId;

use crate::db::CoverageDb;
use crate::error::TreeError;

impl CoverageDb {
    /// Returns the leading-hierarchy string of a tree and its first
    /// populated instance.
    ///
    /// The leading hierarchy runs from the nominal root down through any
    /// placeholder ancestors that carry no functional unit; the descent
    /// follows first children, since placeholders created from
    /// instance-only records chain linearly.
    pub fn leading_hierarchy(&self, root: InstId) -> (String, InstId) {
        let mut path = self.insts[root].name.clone();
        let mut top = root;
        while self.insts[top].funit.is_none() {
            let Some(&child) = self.insts[top].children.first() else {
                break;
            };
            path = scope::join(&path, &self.insts[child].name);
            top = child;
        }
        (path, top)
    }

    fn funit_name(&self, inst: InstId) -> Option<&str> {
        self.insts[inst]
            .funit
            .map(|f| self.funits[f].name.as_str())
    }

    /// Merges two instance trees of this database into one.
    ///
    /// Returns `Ok(true)` when the merge happened and `root2` should be
    /// dropped from the forest, `Ok(false)` when the trees are judged
    /// structurally incompatible and must stay separate. Item-shape
    /// mismatches surface as fatal errors.
    pub fn merge_two_trees(&mut self, root1: InstId, root2: InstId) -> Result<bool, TreeError> {
        let (lhier1, tinst1) = self.leading_hierarchy(root1);
        let (lhier2, tinst2) = self.leading_hierarchy(root2);
        debug!(%lhier1, %lhier2, "pairing instance trees");

        let name1 = self.funit_name(tinst1).map(str::to_string);
        let name2 = self.funit_name(tinst2).map(str::to_string);

        // Same top-level unit: merge directly, or realign on the parents.
        if name1.is_some() && name1 == name2 {
            if lhier1 == lhier2 {
                self.merge_tree(tinst1, tinst2)?;
            } else {
                let (rest1, _) = scope::split_back(&lhier1);
                let (rest2, _) = scope::split_back(&lhier2);
                if rest1 != rest2 {
                    self.merge_tree(tinst1, tinst2)?;
                    self.mark_lhier_diffs(tinst1, tinst2);
                } else {
                    match (self.insts[tinst1].parent, self.insts[tinst2].parent) {
                        (Some(p1), Some(p2)) => self.merge_tree(p1, p2)?,
                        _ => {
                            self.merge_tree(tinst1, tinst2)?;
                            self.mark_lhier_diffs(tinst1, tinst2);
                        }
                    }
                }
            }
            return Ok(true);
        }

        // One leading hierarchy is a strict prefix of the other: the longer
        // tree is a branch rooted inside the shorter one.
        if is_scope_prefix(&lhier1, &lhier2) {
            let branch =
                self.find_scope(root2, &lhier1, false)
                    .ok_or_else(|| TreeError::ScopeNotFound {
                        scope: lhier1.clone(),
                    })?;
            self.merge_tree(tinst1, branch)?;
            return Ok(true);
        }
        if is_scope_prefix(&lhier2, &lhier1) {
            let branch =
                self.find_scope(root1, &lhier2, false)
                    .ok_or_else(|| TreeError::ScopeNotFound {
                        scope: lhier2.clone(),
                    })?;
            self.merge_tree(branch, tinst2)?;
            return Ok(true);
        }

        // Last resort: a unique placement of the other tree's unit name.
        if let Some(name1) = &name1 {
            if let Some(branch) = self.find_by_funit_name_unique(tinst2, name1) {
                self.merge_tree(tinst1, branch)?;
                self.mark_lhier_diffs(tinst1, branch);
                return Ok(true);
            }
        }
        if let Some(name2) = &name2 {
            if let Some(branch) = self.find_by_funit_name_unique(tinst1, name2) {
                self.merge_tree(branch, tinst2)?;
                self.mark_lhier_diffs(branch, tinst2);
                return Ok(true);
            }
        }

        debug!("trees are structurally incompatible, keeping both");
        Ok(false)
    }

    /// Splices the tree under `n2` into the tree under `n1` once a pairing
    /// point is established.
    ///
    /// The two nodes' functional units are unioned item by item (a
    /// placeholder adopts the other side's unit). Same-named children merge
    /// recursively; children with no counterpart are relinked wholesale
    /// under `n1` — an index reassignment, not a copy.
    pub fn merge_tree(&mut self, n1: InstId, n2: InstId) -> Result<(), TreeError> {
        match (self.insts[n1].funit, self.insts[n2].funit) {
            (Some(f1), Some(f2)) => {
                if f1 != f2 {
                    let (left, right) = self.funits.pair_mut(f1, f2);
                    left.merge_from(right)?;
                }
            }
            (None, Some(f2)) => {
                self.insts[n1].funit = Some(f2);
                self.insts[n2].funit = None;
            }
            _ => {}
        }

        let children2 = self.insts[n2].children.clone();
        for child2 in children2 {
            let child_name = self.insts[child2].name.clone();
            let counterpart = self.insts[n1]
                .children
                .iter()
                .copied()
                .find(|&c| self.insts[c].name == child_name);
            match counterpart {
                Some(child1) => self.merge_tree(child1, child2)?,
                None => {
                    trace!(name = %child_name, "relinking unmatched child");
                    let pos = self.insts[n2]
                        .children
                        .iter()
                        .position(|&c| c == child2)
                        .expect("child links are consistent");
                    self.insts[n2].children.remove(pos);
                    self.insts[child2].parent = Some(n1);
                    self.insts[n1].children.push(child2);
                }
            }
        }
        Ok(())
    }

    /// Marks ancestors on both sides as carrying approximate names.
    ///
    /// Walks up from the pairing point while the two chains agree on
    /// names, then flags everything above the divergence on both chains —
    /// after an asymmetric merge those scope names are no longer a
    /// reliable path.
    pub fn mark_lhier_diffs(&mut self, inst1: InstId, inst2: InstId) {
        let mut a = Some(inst1);
        let mut b = Some(inst2);
        while let (Some(x), Some(y)) = (a, b) {
            if self.insts[x].name != self.insts[y].name {
                break;
            }
            a = self.insts[x].parent;
            b = self.insts[y].parent;
        }
        while let Some(x) = a {
            self.insts[x].name_diff = true;
            a = self.insts[x].parent;
        }
        while let Some(y) = b {
            self.insts[y].name_diff = true;
            b = self.insts[y].parent;
        }
    }

    /// Pairs freshly read forest roots against the existing ones.
    ///
    /// Each new root merges into the first existing root that accepts it;
    /// roots no heuristic can place join the forest as independent trees.
    pub fn merge_forest(&mut self, new_roots: Vec<InstId>) -> Result<(), TreeError> {
        for root2 in new_roots {
            let existing = self.roots.clone();
            let mut merged = false;
            for root1 in existing {
                if self.merge_two_trees(root1, root2)? {
                    merged = true;
                    break;
                }
            }
            if !merged {
                self.roots.push(root2);
            }
        }
        Ok(())
    }
}

/// Component-boundary prefix test: `short` is a leading scope of `long`.
fn is_scope_prefix(short: &str, long: &str) -> bool {
    long.len() > short.len() && long.starts_with(short) && long.as_bytes()[short.len()] == b'.'
}
