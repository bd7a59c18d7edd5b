//! Built-in commands
//!
//! Each module registers its stages with a [`Registry`] from its own
//! `register` function; [`register_builtins`] calls them all.

pub mod address;
pub mod avl;
pub mod cast;
pub mod echo;
pub mod filter;
pub mod help;
pub mod linux;
pub mod list;
pub mod member;
pub mod wc;

use crate::backend::{parse_int, Object};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::pretty_printer::PrettyPrintStage;
use crate::pipeline::registry::Registry;
use crate::pipeline::stage::ObjectStream;
use crate::pipeline::walker::WalkStage;

const WALK_HELP: &str = "syntax: walk

Walks each input object with the walker registered for its type. Without
input, lists the types that have walkers.";

const PRETTY_PRINT_HELP: &str = "syntax: pretty_print

Prints each input object with the pretty printer registered for its type.
Without input, lists the types that have pretty printers.";

/// Register every built-in command
pub fn register_builtins(registry: &mut Registry) {
    registry.register_command(&["walk"], WALK_HELP, WalkStage::construct);
    registry.register_command(
        &["pretty_print", "pp"],
        PRETTY_PRINT_HELP,
        PrettyPrintStage::construct,
    );
    address::register(registry);
    cast::register(registry);
    echo::register(registry);
    filter::register(registry);
    help::register(registry);
    member::register(registry);
    wc::register(registry);

    avl::register(registry);
    linux::register(registry);
    list::register(registry);
}

/// Strip one pair of matching surrounding quotes
pub(crate) fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Remove every quote character, so `"struct node" *` reads `struct node *`
pub(crate) fn strip_quotes(text: &str) -> String {
    text.chars().filter(|c| *c != '\'' && *c != '"').collect()
}

/// Parse an optional byte offset argument
pub(crate) fn parse_offset(stage: &str, args: &str) -> PipelineResult<u64> {
    match args.split_whitespace().collect::<Vec<_>>().as_slice() {
        [] => Ok(0),
        [offset] => parse_int(unquote(offset)).ok_or_else(|| {
            PipelineError::invalid_argument(stage, format!("'{}' is not an offset", offset))
        }),
        _ => Err(PipelineError::invalid_argument(
            stage,
            "expected at most one offset",
        )),
    }
}

/// Follow `next` pointers starting from the pointer object `first` until a
/// node equals `stop`. Each node is yielded as a `void *` to
/// `node - offset`, the address of the structure embedding the link.
pub(crate) fn follow_next(first: Object, stop: u64, offset: u64) -> ObjectStream<'static> {
    let program = first.program().clone();
    let node_type = first.type_id();
    let mut cursor: Option<PipelineResult<u64>> = Some(first.value_u64().map_err(Into::into));

    Box::new(std::iter::from_fn(move || {
        let address = match cursor.take()? {
            Ok(address) => address,
            Err(e) => return Some(Err(e)),
        };
        if address == stop {
            return None;
        }
        if address == 0 {
            return Some(Err(PipelineError::command(
                "walk",
                "NULL link in circular list",
            )));
        }
        let next = Object::value(&program, node_type, address)
            .member("next")
            .and_then(|n| n.value_u64());
        cursor = Some(next.map_err(Into::into));
        Some(Ok(Object::void_pointer(&program, address.wrapping_sub(offset))))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'!='"), "!=");
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'x\""), "'x\"");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("x", "").unwrap(), 0);
        assert_eq!(parse_offset("x", "0x10").unwrap(), 16);
        assert!(parse_offset("x", "abc").is_err());
        assert!(parse_offset("x", "1 2").is_err());
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"struct node\" *"), "struct node *");
    }
}
