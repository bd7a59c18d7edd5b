//! The debug target as seen by the pipeline
//!
//! A [`Program`] bundles the target's type table, its global symbols and a
//! [`MemorySource`]. It is shared behind an `Arc` by every
//! [`Object`](super::Object) produced during a session.

use super::memory::MemorySource;
use super::object::Object;
use super::type_table::{TypeDef, TypeId, TypeTable};
use crate::error::{Result, SdbError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A global or static symbol in the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    pub type_id: TypeId,
}

/// A debug target: types, symbols and memory
pub struct Program {
    /// Pointer types are interned lazily, so the table sits behind a lock.
    types: RwLock<TypeTable>,
    /// Resolved type-name strings, including pointer suffixes.
    type_cache: RwLock<HashMap<String, TypeId>>,
    symbols: HashMap<String, Symbol>,
    memory: Box<dyn MemorySource>,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("types", &self.types.read().len())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

impl Program {
    pub fn new(types: TypeTable, memory: impl MemorySource + 'static) -> Self {
        Self {
            types: RwLock::new(types),
            type_cache: RwLock::new(HashMap::new()),
            symbols: HashMap::new(),
            memory: Box::new(memory),
        }
    }

    /// Register a symbol. A later symbol with the same name replaces the earlier one.
    pub fn add_symbol(&mut self, name: impl Into<String>, address: u64, type_id: TypeId) {
        let name = name.into();
        self.symbols.insert(
            name.clone(),
            Symbol {
                name,
                address,
                type_id,
            },
        );
    }

    /// Run `f` with read access to the type table
    pub fn with_types<R>(&self, f: impl FnOnce(&TypeTable) -> R) -> R {
        f(&self.types.read())
    }

    pub fn pointer_size(&self) -> u64 {
        self.types.read().pointer_size()
    }

    /// Resolve a type name such as `int`, `struct node *` or `list_t **`
    pub fn resolve_type(&self, name: &str) -> Result<TypeId> {
        let normalized = normalize_type_name(name);
        if let Some(&id) = self.type_cache.read().get(&normalized) {
            return Ok(id);
        }

        let (base, depth) = split_pointer_suffix(&normalized);

        let id = {
            let mut types = self.types.write();
            let mut id = types
                .lookup(base)
                .ok_or_else(|| SdbError::UnknownType(name.trim().to_string()))?;
            for _ in 0..depth {
                id = types.pointer_to(id);
            }
            id
        };

        self.type_cache.write().insert(normalized, id);
        Ok(id)
    }

    /// Get or create the pointer type for `id`
    pub fn pointer_to(&self, id: TypeId) -> TypeId {
        if let Some(ptr) = self.types.read().existing_pointer_to(id) {
            return ptr;
        }
        self.types.write().pointer_to(id)
    }

    /// The `void *` descriptor
    pub fn void_pointer(&self) -> TypeId {
        let mut types = self.types.write();
        let void = types.void();
        types.pointer_to(void)
    }

    pub fn type_name(&self, id: TypeId) -> String {
        self.types.read().type_name(id)
    }

    pub fn type_size(&self, id: TypeId) -> Option<u64> {
        self.types.read().type_size(id)
    }

    pub fn type_def(&self, id: TypeId) -> Option<TypeDef> {
        self.types.read().get_resolved(id).cloned()
    }

    /// Look up a symbol by name
    pub fn symbol(&self, name: &str) -> Result<&Symbol> {
        self.symbols
            .get(name)
            .ok_or_else(|| SdbError::UnknownSymbol(name.to_string()))
    }

    /// All symbols, sorted by name
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut all: Vec<&Symbol> = self.symbols.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// The object a symbol refers to (an lvalue at the symbol's address)
    pub fn object(self: &Arc<Self>, name: &str) -> Result<Object> {
        let sym = self.symbol(name)?;
        Ok(Object::reference(self, sym.type_id, sym.address))
    }

    /// Read raw memory from the target
    pub fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.memory.read_memory(address, size)
    }

    /// Read a little-endian unsigned integer of `size` bytes (1..=8)
    pub fn read_uint(&self, address: u64, size: usize) -> Result<u64> {
        if size == 0 || size > 8 {
            return Err(SdbError::MemoryAccess {
                address,
                message: format!("unsupported integer width {}", size),
            });
        }
        let bytes = self.read_memory(address, size)?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

/// Split trailing `*` tokens off a type name: `"struct node **"` -> `("struct node", 2)`
fn split_pointer_suffix(name: &str) -> (&str, usize) {
    let mut base = name.trim();
    let mut depth = 0usize;
    while let Some(rest) = base.strip_suffix('*') {
        base = rest.trim_end();
        depth += 1;
    }
    (base, depth)
}

fn normalize_type_name(name: &str) -> String {
    let (base, depth) = split_pointer_suffix(name);
    let mut out = base.split_whitespace().collect::<Vec<_>>().join(" ");
    if depth > 0 {
        out.push(' ');
        out.push_str(&"*".repeat(depth));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MockMemorySource, SnapshotMemory};
    use crate::backend::type_table::{MemberDef, StructDef};

    fn program() -> Program {
        let mut types = TypeTable::default();
        let int = types.lookup("int").unwrap();
        let node = types.insert(TypeDef::Struct(
            StructDef::new(Some("node".to_string()), 8).with_member(MemberDef::new("v", 0, int)),
        ));
        let mut mem = SnapshotMemory::new();
        mem.write_u32(0x1000, 7);
        let mut prog = Program::new(types, mem);
        prog.add_symbol("the_node", 0x1000, node);
        prog
    }

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("struct node*"), "struct node *");
        assert_eq!(normalize_type_name("  struct   node  * "), "struct node *");
        assert_eq!(normalize_type_name("char**"), "char **");
        assert_eq!(normalize_type_name("int"), "int");
    }

    #[test]
    fn test_resolve_pointer_levels() {
        let prog = program();
        let node = prog.resolve_type("struct node").unwrap();
        let p1 = prog.resolve_type("struct node *").unwrap();
        let p1b = prog.resolve_type("struct node*").unwrap();
        let p2 = prog.resolve_type("struct node **").unwrap();
        assert_eq!(p1, p1b);
        assert_eq!(prog.pointer_to(node), p1);
        assert_eq!(prog.pointer_to(p1), p2);
        assert_eq!(prog.type_name(p2), "struct node **");
    }

    #[test]
    fn test_resolve_unknown_type() {
        let prog = program();
        let err = prog.resolve_type("struct missing *").unwrap_err();
        assert_eq!(err.to_string(), "could not find type 'struct missing *'");
        assert!(prog.resolve_type("*").is_err());
    }

    #[test]
    fn test_void_pointer_matches_resolution() {
        let prog = program();
        assert_eq!(prog.void_pointer(), prog.resolve_type("void *").unwrap());
    }

    #[test]
    fn test_symbol_lookup() {
        let prog = program();
        assert_eq!(prog.symbol("the_node").unwrap().address, 0x1000);
        assert!(matches!(
            prog.symbol("nope"),
            Err(SdbError::UnknownSymbol(name)) if name == "nope"
        ));
        assert_eq!(prog.read_uint(0x1000, 4).unwrap(), 7);
    }

    #[test]
    fn test_read_uint_uses_memory_source() {
        let mut mock = MockMemorySource::new();
        mock.expect_read_memory()
            .withf(|addr, size| *addr == 0x40 && *size == 2)
            .times(1)
            .returning(|_, _| Ok(vec![0x34, 0x12]));
        let prog = Program::new(TypeTable::default(), mock);
        assert_eq!(prog.read_uint(0x40, 2).unwrap(), 0x1234);
        assert!(prog.read_uint(0x40, 9).is_err());
    }
}
