//! Checks over the built symbol tree: unused locals, interface completeness
//! and cross-document duplicates

use serde_json::json;

use crate::analysis::builder::base_type_name;
use crate::analysis::line;
use crate::analysis::resolver::{top_level_definitions, unqualified};
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity, DiagnosticTag};
use crate::models::document::SiblingTree;
use crate::models::symbol::{Symbol, SymbolKind};

use super::{codes, diagnostic};

/// Locals of method-like symbols never mentioned outside their declaration line
pub(super) fn check_unused_variables(tree: &[Symbol], lines: &[&str], out: &mut Vec<Diagnostic>) {
    for method in Symbol::flatten(tree) {
        if !method.kind.is_method_like() {
            continue;
        }
        let first = method.range.start.line as usize;
        let last = (method.range.end.line as usize).min(lines.len().saturating_sub(1));

        for local in method.children.iter().filter(|c| c.is_local_variable()) {
            let declared_on = local.range.start.line as usize;
            let used = (first..=last)
                .filter(|&index| index != declared_on)
                .filter_map(|index| lines.get(index))
                .any(|raw| line::contains_word(line::strip_comment(raw), &local.name));
            if used {
                continue;
            }
            out.push(
                diagnostic(
                    DiagnosticSeverity::Information,
                    codes::UNUSED_VARIABLE,
                    local.selection_range,
                    format!("Variable '{}' is declared but never used", local.name),
                )
                .with_tag(DiagnosticTag::Unnecessary)
                .with_data(json!({ "unusedVariable": local.name })),
            );
        }
    }
}

/// Every member of an implemented interface must be declared by the type
pub(super) fn check_interface_members(
    tree: &[Symbol],
    siblings: &[SiblingTree],
    out: &mut Vec<Diagnostic>,
) {
    for owner in Symbol::flatten(tree) {
        if !matches!(owner.kind, SymbolKind::Class | SymbolKind::Structure) {
            continue;
        }
        let members = members_of(owner);

        for marker in owner.children.iter().filter(|c| c.is_implements()) {
            let interface_name = unqualified(base_type_name(&marker.name));
            let Some(interface) = find_interface(tree, siblings, interface_name) else {
                tracing::trace!("Interface '{}' not found; skipping", interface_name);
                continue;
            };

            for required in members_of(interface)
                .into_iter()
                .filter(|m| m.kind.is_method_like())
            {
                let implemented = members
                    .iter()
                    .any(|m| m.kind == required.kind && m.is_named(&required.name));
                if implemented {
                    continue;
                }
                out.push(
                    diagnostic(
                        DiagnosticSeverity::Error,
                        codes::MISSING_MEMBER,
                        marker.selection_range,
                        format!(
                            "'{}' does not implement '{}' from interface '{}'",
                            owner.name, required.name, interface.name
                        ),
                    )
                    .with_data(json!({
                        "missingMember": required.name,
                        "interfaceName": interface.name,
                    })),
                );
            }
        }
    }
}

/// Direct members, looking through `#Region` containers
fn members_of(symbol: &Symbol) -> Vec<&Symbol> {
    let mut members = Vec::new();
    let mut pending: Vec<&Symbol> = symbol.children.iter().rev().collect();
    while let Some(child) = pending.pop() {
        if child.kind.is_container() {
            pending.extend(child.children.iter().rev());
        } else {
            members.push(child);
        }
    }
    members
}

/// Local tree first, then siblings in the order given
fn find_interface<'a>(
    tree: &'a [Symbol],
    siblings: &'a [SiblingTree],
    name: &str,
) -> Option<&'a Symbol> {
    let is_target = |symbol: &&Symbol| symbol.kind == SymbolKind::Interface && symbol.is_named(name);
    top_level_definitions(tree)
        .into_iter()
        .find(is_target)
        .or_else(|| {
            siblings
                .iter()
                .find_map(|sibling| top_level_definitions(&sibling.symbols).into_iter().find(is_target))
        })
}

/// Top-level definitions that another document also declares with the same kind
pub(super) fn check_duplicates(tree: &[Symbol], siblings: &[SiblingTree], out: &mut Vec<Diagnostic>) {
    if siblings.is_empty() {
        return;
    }
    for symbol in top_level_definitions(tree) {
        let duplicate = siblings.iter().find(|sibling| {
            top_level_definitions(&sibling.symbols)
                .iter()
                .any(|other| other.kind == symbol.kind && other.is_named(&symbol.name))
        });
        let Some(sibling) = duplicate else {
            continue;
        };
        out.push(
            diagnostic(
                DiagnosticSeverity::Error,
                codes::DUPLICATE_DECLARATION,
                symbol.selection_range,
                format!(
                    "Duplicate declaration of {} '{}' (also declared in {})",
                    symbol.kind, symbol.name, sibling.uri
                ),
            )
            .with_data(json!({ "duplicateOf": sibling.uri })),
        );
    }
}
