//! Scope-aware symbol queries
//!
//! Pure functions over built trees. Every call walks the tree afresh; there is
//! no parent map or memoization. Name comparisons ignore ASCII case.

use crate::models::document::{SiblingTree, TextDocument};
use crate::models::position::Position;
use crate::models::symbol::{Symbol, SymbolKind};

use super::builder::base_type_name;

/// A symbol together with the document it was found in
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub uri: &'a str,
    pub symbol: &'a Symbol,
}

/// Symbol whose name token contains `pos`, depth-first
pub fn definition_at(tree: &[Symbol], pos: Position) -> Option<&Symbol> {
    for symbol in tree {
        if symbol.selection_range.contains(pos) {
            return Some(symbol);
        }
        if symbol.range.contains(pos)
            && let Some(found) = definition_at(&symbol.children, pos)
        {
            return Some(found);
        }
    }
    None
}

/// Enclosing scopes of `pos`, innermost first
pub fn scope_chain(tree: &[Symbol], pos: Position) -> Vec<&Symbol> {
    let mut chain = Vec::new();
    let mut level = tree;
    while let Some(scope) = level
        .iter()
        .find(|symbol| opens_scope(symbol) && symbol.range.contains(pos))
    {
        chain.push(scope);
        level = &scope.children;
    }
    chain.reverse();
    chain
}

fn opens_scope(symbol: &Symbol) -> bool {
    !symbol.is_implements()
        && (symbol.kind.is_method_like() || symbol.kind.is_type() || symbol.kind.is_container())
}

/// Resolve `name` from the innermost scope at `pos` outwards, then the roots
pub fn lookup_in_scope<'a>(tree: &'a [Symbol], name: &str, pos: Position) -> Option<&'a Symbol> {
    scope_chain(tree, pos)
        .into_iter()
        .find_map(|scope| scope.children.iter().find(|child| child.is_named(name)))
        .or_else(|| tree.iter().find(|symbol| symbol.is_named(name)))
}

/// Definition-worthy root symbols, looking through namespaces and regions
pub fn top_level_definitions(tree: &[Symbol]) -> Vec<&Symbol> {
    let mut out = Vec::new();
    collect_definitions(tree, &mut out);
    out
}

fn collect_definitions<'a>(symbols: &'a [Symbol], out: &mut Vec<&'a Symbol>) {
    for symbol in symbols {
        if symbol.kind.is_container() {
            collect_definitions(&symbol.children, out);
        } else if symbol.is_definition() {
            out.push(symbol);
        }
    }
}

/// First top-level definition named `name`
pub fn lookup_global<'a>(tree: &'a [Symbol], name: &str) -> Option<&'a Symbol> {
    top_level_definitions(tree)
        .into_iter()
        .find(|symbol| symbol.is_named(name))
}

/// First top-level definition named `name` across siblings, in the order given
pub fn lookup_across<'a>(siblings: &'a [SiblingTree], name: &str) -> Option<Resolved<'a>> {
    siblings.iter().find_map(|sibling| {
        lookup_global(&sibling.symbols, name).map(|symbol| Resolved {
            uri: &sibling.uri,
            symbol,
        })
    })
}

/// Symbol whose `children` holds `target` itself (by address, not by value)
pub fn parent_of<'a>(tree: &'a [Symbol], target: &Symbol) -> Option<&'a Symbol> {
    for symbol in tree {
        if symbol
            .children
            .iter()
            .any(|child| std::ptr::eq(child, target))
        {
            return Some(symbol);
        }
        if let Some(parent) = parent_of(&symbol.children, target) {
            return Some(parent);
        }
    }
    None
}

/// Classes and structures carrying an `Implements <interface>` child
pub fn implementations_of<'a>(trees: &'a [SiblingTree], interface: &str) -> Vec<Resolved<'a>> {
    let interface = unqualified(base_type_name(interface));
    let mut found = Vec::new();
    for tree in trees {
        for symbol in Symbol::flatten(&tree.symbols) {
            if !matches!(symbol.kind, SymbolKind::Class | SymbolKind::Structure) {
                continue;
            }
            let implements = symbol
                .children
                .iter()
                .any(|child| {
                    child.is_implements() && unqualified(&child.name).eq_ignore_ascii_case(interface)
                });
            if implements {
                found.push(Resolved {
                    uri: &tree.uri,
                    symbol,
                });
            }
        }
    }
    found
}

/// `System.IDisposable` -> `IDisposable`
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Definition of the identifier under the cursor
///
/// Tries the name token at `pos`, then the scope chain, then the document's
/// top-level definitions, then each sibling in order.
pub fn resolve_at<'a>(
    document: &'a TextDocument,
    tree: &'a [Symbol],
    siblings: &'a [SiblingTree],
    pos: Position,
) -> Option<Resolved<'a>> {
    if let Some(symbol) = definition_at(tree, pos)
        && !symbol.is_implements()
    {
        return Some(Resolved {
            uri: &document.uri,
            symbol,
        });
    }

    let (word, _) = document.word_at(pos)?;
    tracing::trace!("Resolving '{}' at {}:{}", word, pos.line, pos.character);

    let local = lookup_in_scope(tree, &word, pos)
        .filter(|symbol| !symbol.is_implements())
        .or_else(|| lookup_global(tree, &word));

    match local {
        Some(symbol) => Some(Resolved {
            uri: &document.uri,
            symbol,
        }),
        None => lookup_across(siblings, &word),
    }
}
