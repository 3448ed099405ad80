//! Analysis core
//!
//! Line classification, symbol tree construction, scope resolution and
//! validation. Everything here is synchronous and rebuilt from the text on
//! every call; nothing is cached between calls.

pub mod builder;
pub mod line;
pub mod resolver;
pub mod validator;

pub use builder::{SymbolBuilder, build_symbol_tree};
pub use resolver::{
    Resolved, definition_at, implementations_of, lookup_across, lookup_global, lookup_in_scope,
    parent_of, resolve_at, scope_chain, top_level_definitions,
};
pub use validator::{ValidationOptions, Validator, codes, validate};
