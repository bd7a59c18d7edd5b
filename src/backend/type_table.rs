//! Target Type Table
//!
//! Types are stored by index (TypeId) in a single table owned by the
//! [`Program`](super::Program). All type references use TypeId instead of
//! nested boxes, so descriptor equality is plain index equality:
//! two TypeIds are equal iff they denote the same type.
//!
//! Derived types (pointers, arrays) are interned: asking twice for
//! "pointer to struct node" returns the same TypeId, which keeps coercion
//! and dispatch comparisons exact.

use std::collections::HashMap;

/// A unique identifier for a type in the type table.
/// This is just an index into the types vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// A type definition in the type table
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// The void type
    Void,
    /// Primitive/base types
    Primitive(PrimitiveDef),
    /// Pointer to another type
    Pointer(TypeId),
    /// Fixed-size array of elements
    Array { element: TypeId, count: u64 },
    /// Named or anonymous structure
    Struct(StructDef),
    /// Typedef/alias
    Typedef { name: String, underlying: TypeId },
    /// Reserved slot, defined later (used for structs referenced before their definition)
    Placeholder,
}

impl TypeDef {
    /// The name this definition is registered under, if any
    pub fn lookup_name(&self) -> Option<String> {
        match self {
            TypeDef::Void => Some("void".to_string()),
            TypeDef::Primitive(p) => Some(p.name().to_string()),
            TypeDef::Struct(s) => s.name.as_ref().map(|n| format!("struct {}", n)),
            TypeDef::Typedef { name, .. } => Some(name.clone()),
            _ => None,
        }
    }
}

/// Primitive type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveDef {
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
}

impl PrimitiveDef {
    /// All primitives, in the order they are pre-registered
    pub const ALL: [PrimitiveDef; 12] = [
        PrimitiveDef::Bool,
        PrimitiveDef::Char,
        PrimitiveDef::SignedChar,
        PrimitiveDef::UnsignedChar,
        PrimitiveDef::Short,
        PrimitiveDef::UnsignedShort,
        PrimitiveDef::Int,
        PrimitiveDef::UnsignedInt,
        PrimitiveDef::Long,
        PrimitiveDef::UnsignedLong,
        PrimitiveDef::LongLong,
        PrimitiveDef::UnsignedLongLong,
    ];

    /// Get the size in bytes (LP64)
    pub fn size(&self) -> u64 {
        match self {
            PrimitiveDef::Bool
            | PrimitiveDef::Char
            | PrimitiveDef::SignedChar
            | PrimitiveDef::UnsignedChar => 1,
            PrimitiveDef::Short | PrimitiveDef::UnsignedShort => 2,
            PrimitiveDef::Int | PrimitiveDef::UnsignedInt => 4,
            PrimitiveDef::Long
            | PrimitiveDef::UnsignedLong
            | PrimitiveDef::LongLong
            | PrimitiveDef::UnsignedLongLong => 8,
        }
    }

    /// Get the name of this primitive type
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveDef::Bool => "bool",
            PrimitiveDef::Char => "char",
            PrimitiveDef::SignedChar => "signed char",
            PrimitiveDef::UnsignedChar => "unsigned char",
            PrimitiveDef::Short => "short",
            PrimitiveDef::UnsignedShort => "unsigned short",
            PrimitiveDef::Int => "int",
            PrimitiveDef::UnsignedInt => "unsigned int",
            PrimitiveDef::Long => "long",
            PrimitiveDef::UnsignedLong => "unsigned long",
            PrimitiveDef::LongLong => "long long",
            PrimitiveDef::UnsignedLongLong => "unsigned long long",
        }
    }

    /// Check if this is a signed type
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveDef::Char
                | PrimitiveDef::SignedChar
                | PrimitiveDef::Short
                | PrimitiveDef::Int
                | PrimitiveDef::Long
                | PrimitiveDef::LongLong
        )
    }
}

/// Struct definition
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: Option<String>,
    pub size: u64,
    pub members: Vec<MemberDef>,
}

impl StructDef {
    pub fn new(name: Option<String>, size: u64) -> Self {
        Self {
            name,
            size,
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    /// Find a member by name
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A member of a struct
#[derive(Debug, Clone)]
pub struct MemberDef {
    pub name: String,
    pub offset: u64,
    pub type_id: TypeId,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, offset: u64, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            offset,
            type_id,
        }
    }
}

/// Default pointer width in bytes
pub const DEFAULT_POINTER_SIZE: u64 = 8;

/// The type table of one target
#[derive(Debug)]
pub struct TypeTable {
    /// All type definitions, indexed by TypeId
    types: Vec<TypeDef>,
    /// Maps type names to their TypeId. Later definitions replace earlier ones.
    name_to_id: HashMap<String, TypeId>,
    /// Interned pointer types, keyed by pointee
    pointers: HashMap<TypeId, TypeId>,
    /// Interned array types, keyed by (element, count)
    arrays: HashMap<(TypeId, u64), TypeId>,
    pointer_size: u64,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new(DEFAULT_POINTER_SIZE)
    }
}

impl TypeTable {
    /// Create a table holding `void` and the C primitives
    pub fn new(pointer_size: u64) -> Self {
        let mut table = Self {
            types: Vec::new(),
            name_to_id: HashMap::new(),
            pointers: HashMap::new(),
            arrays: HashMap::new(),
            pointer_size,
        };
        table.insert(TypeDef::Void);
        for prim in PrimitiveDef::ALL {
            table.insert(TypeDef::Primitive(prim));
        }
        table
    }

    /// Get the number of types in the table
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// Allocate a new type ID without setting its definition
    pub fn allocate(&mut self) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef::Placeholder);
        id
    }

    /// Define a type at the given TypeId
    pub fn define(&mut self, id: TypeId, def: TypeDef) {
        assert!(
            (id.0 as usize) < self.types.len(),
            "TypeId {} out of range",
            id.0
        );

        if let Some(name) = def.lookup_name() {
            if let Some(previous) = self.name_to_id.insert(name.clone(), id) {
                if previous != id {
                    tracing::debug!("type '{}' redefined ({:?} -> {:?})", name, previous, id);
                }
            }
        }

        self.types[id.0 as usize] = def;
    }

    /// Insert a new type and return its TypeId
    pub fn insert(&mut self, def: TypeDef) -> TypeId {
        let id = self.allocate();
        self.define(id, def);
        id
    }

    /// Get a type definition by TypeId
    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    /// The `void` type, pre-registered by [`TypeTable::new`]
    pub fn void(&mut self) -> TypeId {
        match self.lookup("void") {
            Some(id) => id,
            None => self.insert(TypeDef::Void),
        }
    }

    /// Get or create the pointer type whose pointee is `id`
    pub fn pointer_to(&mut self, id: TypeId) -> TypeId {
        if let Some(&ptr) = self.pointers.get(&id) {
            return ptr;
        }
        let ptr = self.insert(TypeDef::Pointer(id));
        self.pointers.insert(id, ptr);
        ptr
    }

    /// Get the pointer type whose pointee is `id`, if it was already interned
    pub fn existing_pointer_to(&self, id: TypeId) -> Option<TypeId> {
        self.pointers.get(&id).copied()
    }

    /// Get or create the array type `element[count]`
    pub fn array_of(&mut self, element: TypeId, count: u64) -> TypeId {
        if let Some(&arr) = self.arrays.get(&(element, count)) {
            return arr;
        }
        let arr = self.insert(TypeDef::Array { element, count });
        self.arrays.insert((element, count), arr);
        arr
    }

    /// Look up a named type (no pointer suffixes). Whitespace is normalized.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.name_to_id.get(&normalized).copied()
    }

    /// All registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.name_to_id.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Follow typedefs down to the underlying definition
    pub fn strip_typedefs(&self, id: TypeId) -> TypeId {
        let mut current = id;
        // Bounded so a malformed self-referencing typedef cannot hang us.
        for _ in 0..32 {
            match self.get(current) {
                Some(TypeDef::Typedef { underlying, .. }) => current = *underlying,
                _ => break,
            }
        }
        current
    }

    /// Get the resolved (typedef-free) type definition
    pub fn get_resolved(&self, id: TypeId) -> Option<&TypeDef> {
        self.get(self.strip_typedefs(id))
    }

    /// The pointee of a pointer type
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.get_resolved(id)? {
            TypeDef::Pointer(inner) => Some(*inner),
            _ => None,
        }
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        self.pointee(id).is_some()
    }

    /// True for `void *` (including typedefs of either level)
    pub fn is_void_pointer(&self, id: TypeId) -> bool {
        self.pointee(id)
            .map(|inner| matches!(self.get_resolved(inner), Some(TypeDef::Void)))
            .unwrap_or(false)
    }

    /// True for integral primitives
    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.get_resolved(id), Some(TypeDef::Primitive(_)))
    }

    /// True for types whose objects are carried as a scalar value
    pub fn is_scalar(&self, id: TypeId) -> bool {
        matches!(
            self.get_resolved(id),
            Some(TypeDef::Primitive(_)) | Some(TypeDef::Pointer(_))
        )
    }

    /// The struct definition behind `id`, following typedefs
    pub fn struct_def(&self, id: TypeId) -> Option<&StructDef> {
        match self.get_resolved(id)? {
            TypeDef::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get the size of a type in bytes
    pub fn type_size(&self, id: TypeId) -> Option<u64> {
        match self.get_resolved(id)? {
            TypeDef::Void => Some(0),
            TypeDef::Primitive(p) => Some(p.size()),
            TypeDef::Pointer(_) => Some(self.pointer_size),
            TypeDef::Array { element, count } => Some(self.type_size(*element)? * count),
            TypeDef::Struct(s) => Some(s.size),
            TypeDef::Typedef { .. } | TypeDef::Placeholder => None,
        }
    }

    /// Get the display name of a type
    pub fn type_name(&self, id: TypeId) -> String {
        self.type_name_with_depth(id, 0)
    }

    fn type_name_with_depth(&self, id: TypeId, depth: usize) -> String {
        if depth > 20 {
            return "<recursive>".to_string();
        }

        match self.get(id) {
            None => format!("<invalid:{}>", id.0),
            Some(def) => match def {
                TypeDef::Void => "void".to_string(),
                TypeDef::Primitive(p) => p.name().to_string(),
                TypeDef::Pointer(inner) => {
                    let inner_name = self.type_name_with_depth(*inner, depth + 1);
                    if inner_name.ends_with('*') {
                        format!("{}*", inner_name)
                    } else {
                        format!("{} *", inner_name)
                    }
                }
                TypeDef::Array { element, count } => {
                    format!("{} [{}]", self.type_name_with_depth(*element, depth + 1), count)
                }
                TypeDef::Struct(s) => match &s.name {
                    Some(name) => format!("struct {}", name),
                    None => "struct <anonymous>".to_string(),
                },
                TypeDef::Typedef { name, .. } => name.clone(),
                TypeDef::Placeholder => "<placeholder>".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_table() -> (TypeTable, TypeId) {
        let mut table = TypeTable::default();
        let node = table.allocate();
        let node_ptr = table.pointer_to(node);
        let int = table.lookup("int").unwrap();
        table.define(
            node,
            TypeDef::Struct(
                StructDef::new(Some("node".to_string()), 16)
                    .with_member(MemberDef::new("next", 0, node_ptr))
                    .with_member(MemberDef::new("value", 8, int)),
            ),
        );
        (table, node)
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let (table, node) = node_table();
        assert!(table.get(node).is_some());
        assert!(table.get(TypeId(u32::MAX)).is_none());
        assert_eq!(table.type_name(TypeId(u32::MAX)), format!("<invalid:{}>", u32::MAX));
    }

    #[test]
    fn test_primitive_def() {
        assert_eq!(PrimitiveDef::Int.size(), 4);
        assert_eq!(PrimitiveDef::UnsignedLong.size(), 8);
        assert!(PrimitiveDef::Int.is_signed());
        assert!(!PrimitiveDef::UnsignedInt.is_signed());
    }

    #[test]
    fn test_primitives_preregistered() {
        let table = TypeTable::default();
        assert_eq!(table.len(), 1 + PrimitiveDef::ALL.len());
        let ul = table.lookup("unsigned   long").unwrap();
        assert_eq!(table.type_name(ul), "unsigned long");
        assert_eq!(table.type_size(ul), Some(8));
        assert!(table.lookup("float").is_none());
    }

    #[test]
    fn test_pointer_interning() {
        let mut table = TypeTable::default();
        let void = table.lookup("void").unwrap();
        let a = table.pointer_to(void);
        let b = table.pointer_to(void);
        assert_eq!(a, b);
        assert!(table.is_void_pointer(a));
        assert_eq!(table.type_name(a), "void *");

        let pp = table.pointer_to(a);
        assert_eq!(table.type_name(pp), "void **");
        assert!(!table.is_void_pointer(pp));
        assert_eq!(table.type_size(pp), Some(8));
    }

    #[test]
    fn test_struct_type() {
        let (mut table, node) = node_table();
        assert_eq!(table.lookup("struct node"), Some(node));
        assert_eq!(table.type_name(node), "struct node");
        assert_eq!(table.type_size(node), Some(16));

        let def = table.struct_def(node).unwrap();
        assert_eq!(def.member("value").unwrap().offset, 8);
        assert!(def.member("missing").is_none());

        let ptr = table.pointer_to(node);
        assert_eq!(table.type_name(ptr), "struct node *");
        assert_eq!(table.pointee(ptr), Some(node));
    }

    #[test]
    fn test_typedef_stripping() {
        let (mut table, node) = node_table();
        let alias = table.insert(TypeDef::Typedef {
            name: "node_t".to_string(),
            underlying: node,
        });
        assert_ne!(alias, node);
        assert_eq!(table.strip_typedefs(alias), node);
        assert!(table.struct_def(alias).is_some());

        let alias_ptr = table.pointer_to(alias);
        let node_ptr = table.pointer_to(node);
        assert_ne!(alias_ptr, node_ptr);
        assert_eq!(table.type_name(alias_ptr), "node_t *");
    }

    #[test]
    fn test_array_type() {
        let mut table = TypeTable::default();
        let char_id = table.lookup("char").unwrap();
        let arr = table.array_of(char_id, 16);
        assert_eq!(table.array_of(char_id, 16), arr);
        assert_eq!(table.type_name(arr), "char [16]");
        assert_eq!(table.type_size(arr), Some(16));
        assert!(!table.is_scalar(arr));
    }
}
