//! Dotted hierarchical scope-path utilities.
//!
//! Instance scopes are dotted paths like `top.cpu.alu0`. Components may
//! carry an array-index suffix (`mem[3]`), and compiler-generated scopes
//! use the reserved `$u<N>` naming convention.

/// Prefix used for compiler-generated (unnamed) scope names.
pub const UNNAMED_PREFIX: &str = "$u";

/// Separator between scope components.
pub const SCOPE_SEP: char = '.';

/// Splits a scope into its front component and the remainder.
///
/// `"a.b.c"` yields `("a", "b.c")`; a single component yields
/// `("a", "")`.
pub fn split_front(scope: &str) -> (&str, &str) {
    match scope.split_once(SCOPE_SEP) {
        Some((front, rest)) => (front, rest),
        None => (scope, ""),
    }
}

/// Splits a scope into everything before the last component and the last
/// component itself.
///
/// `"a.b.c"` yields `("a.b", "c")`; a single component yields
/// `("", "a")`.
pub fn split_back(scope: &str) -> (&str, &str) {
    match scope.rsplit_once(SCOPE_SEP) {
        Some((rest, back)) => (rest, back),
        None => ("", scope),
    }
}

/// Joins a parent scope and a child component.
///
/// An empty parent yields the child unchanged, so the root of a tree can
/// be joined without a leading separator.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SCOPE_SEP}{child}")
    }
}

/// Returns `true` if the given component names a compiler-generated scope.
pub fn is_unnamed(name: &str) -> bool {
    name.strip_prefix(UNNAMED_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses an array-indexed component `base[index]` into its parts.
///
/// Returns `None` for components without a well-formed index suffix.
pub fn split_index(name: &str) -> Option<(&str, i32)> {
    let open = name.find('[')?;
    let inner = name.get(open + 1..)?.strip_suffix(']')?;
    let index: i32 = inner.parse().ok()?;
    Some((&name[..open], index))
}

/// Formats an array-indexed component `base[index]`.
pub fn indexed(base: &str, index: i32) -> String {
    format!("{base}[{index}]")
}
