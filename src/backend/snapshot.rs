//! Memory snapshots
//!
//! A snapshot file describes a frozen target: its structs and typedefs,
//! its global symbols and the bytes of its memory. Files are TOML, or JSON
//! when the extension is `.json`:
//!
//! ```toml
//! pointer_size = 8
//!
//! [[structs]]
//! name = "node"
//! size = 16
//! members = [
//!     { name = "next", type = "struct node *", offset = 0 },
//!     { name = "value", type = "int", offset = 8 },
//! ]
//!
//! [[typedefs]]
//! name = "node_t"
//! type = "struct node"
//!
//! [[symbols]]
//! name = "head"
//! type = "struct node"
//! address = "0x1000"
//!
//! [[memory]]
//! address = "0x1000"
//! words = ["0x1010", 1]
//! ```
//!
//! [`SnapshotBuilder`] is the programmatic equivalent, used by the file
//! loader itself and by tests.

use super::memory::SnapshotMemory;
use super::object::parse_int;
use super::program::Program;
use super::type_table::{MemberDef, StructDef, TypeDef, TypeId, TypeTable, DEFAULT_POINTER_SIZE};
use crate::error::{Result, ResultExt, SdbError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// An integer written either as a number or as a string with a radix prefix
///
/// TOML integers are signed 64-bit, so kernel addresses must be strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    pub fn value(&self) -> Result<u64> {
        match self {
            Number::Int(v) => Ok(*v),
            Number::Text(text) => parse_int(text)
                .ok_or_else(|| SdbError::Snapshot(format!("invalid number '{}'", text))),
        }
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        Number::Int(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructSpec {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub address: Number,
}

/// One region of memory contents. Exactly one of `bytes`, `words` or `string` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub address: Number,
    /// Hex bytes, whitespace allowed: `"de ad be ef"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    /// Little-endian 64-bit words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Number>>,
    /// NUL-terminated string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

fn default_pointer_size() -> u64 {
    DEFAULT_POINTER_SIZE
}

/// Declarative description of a snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSpec {
    #[serde(default = "default_pointer_size")]
    pub pointer_size: u64,
    #[serde(default)]
    pub structs: Vec<StructSpec>,
    #[serde(default)]
    pub typedefs: Vec<TypedefSpec>,
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
    #[serde(default)]
    pub memory: Vec<SegmentSpec>,
}

impl Default for SnapshotSpec {
    fn default() -> Self {
        Self {
            pointer_size: DEFAULT_POINTER_SIZE,
            structs: Vec::new(),
            typedefs: Vec::new(),
            symbols: Vec::new(),
            memory: Vec::new(),
        }
    }
}

impl SnapshotSpec {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a snapshot file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(SdbError::from)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let spec = if is_json {
            Self::from_json(&text)
        } else {
            Self::from_toml(&text)
        };
        spec.with_context(|| format!("parsing snapshot {}", path.display()))
    }

    /// Materialize the described target
    pub fn into_program(self) -> Result<Arc<Program>> {
        if self.pointer_size != 4 && self.pointer_size != 8 {
            return Err(SdbError::Snapshot(format!(
                "unsupported pointer size {}",
                self.pointer_size
            )));
        }
        let mut builder = SnapshotBuilder::with_pointer_size(self.pointer_size);

        // Structs are declared up front so members and typedefs may refer to
        // structs that appear later in the file.
        for s in &self.structs {
            builder.declare_struct(&s.name);
        }
        for t in &self.typedefs {
            builder
                .typedef(&t.name, &t.type_name)
                .with_context(|| format!("typedef {}", t.name))?;
        }
        for s in &self.structs {
            let members: Vec<(&str, &str, u64)> = s
                .members
                .iter()
                .map(|m| (m.name.as_str(), m.type_name.as_str(), m.offset))
                .collect();
            builder
                .define_struct(&s.name, s.size, &members)
                .with_context(|| format!("struct {}", s.name))?;
        }
        for sym in &self.symbols {
            builder
                .symbol(&sym.name, &sym.type_name, sym.address.value()?)
                .with_context(|| format!("symbol {}", sym.name))?;
        }
        for seg in &self.memory {
            builder.segment(seg)?;
        }

        tracing::debug!(
            structs = self.structs.len(),
            symbols = self.symbols.len(),
            segments = self.memory.len(),
            "snapshot materialized"
        );
        Ok(builder.build())
    }
}

/// Load a snapshot file into a ready-to-use program
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Arc<Program>> {
    let path = path.as_ref();
    let program = SnapshotSpec::load(path)?.into_program()?;
    tracing::info!("loaded snapshot {}", path.display());
    Ok(program)
}

/// Incrementally assembles a target
#[derive(Debug)]
pub struct SnapshotBuilder {
    types: TypeTable,
    memory: SnapshotMemory,
    symbols: Vec<(String, u64, TypeId)>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::with_pointer_size(DEFAULT_POINTER_SIZE)
    }

    pub fn with_pointer_size(pointer_size: u64) -> Self {
        Self {
            types: TypeTable::new(pointer_size),
            memory: SnapshotMemory::new(),
            symbols: Vec::new(),
        }
    }

    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    pub fn memory_mut(&mut self) -> &mut SnapshotMemory {
        &mut self.memory
    }

    /// Register `struct <name>` without members, unless it already exists
    pub fn declare_struct(&mut self, name: &str) -> TypeId {
        match self.types.lookup(&format!("struct {}", name)) {
            Some(id) => id,
            None => self
                .types
                .insert(TypeDef::Struct(StructDef::new(Some(name.to_string()), 0))),
        }
    }

    /// Define `struct <name>` from `(member, type, offset)` triples
    pub fn define_struct(
        &mut self,
        name: &str,
        size: u64,
        members: &[(&str, &str, u64)],
    ) -> Result<TypeId> {
        let id = self.declare_struct(name);
        let mut def = StructDef::new(Some(name.to_string()), size);
        for &(member, type_name, offset) in members {
            let type_id = resolve_type_name(&mut self.types, type_name)?;
            def = def.with_member(MemberDef::new(member, offset, type_id));
        }
        self.types.define(id, TypeDef::Struct(def));
        Ok(id)
    }

    pub fn typedef(&mut self, name: &str, target: &str) -> Result<TypeId> {
        let underlying = resolve_type_name(&mut self.types, target)?;
        Ok(self.types.insert(TypeDef::Typedef {
            name: name.to_string(),
            underlying,
        }))
    }

    pub fn resolve(&mut self, type_name: &str) -> Result<TypeId> {
        resolve_type_name(&mut self.types, type_name)
    }

    pub fn symbol(&mut self, name: &str, type_name: &str, address: u64) -> Result<()> {
        let type_id = resolve_type_name(&mut self.types, type_name)?;
        self.symbols.push((name.to_string(), address, type_id));
        Ok(())
    }

    pub fn write(&mut self, address: u64, data: &[u8]) -> &mut Self {
        self.memory.write(address, data);
        self
    }

    pub fn write_u64(&mut self, address: u64, value: u64) -> &mut Self {
        self.memory.write_u64(address, value);
        self
    }

    pub fn write_u32(&mut self, address: u64, value: u32) -> &mut Self {
        self.memory.write_u32(address, value);
        self
    }

    pub fn write_cstr(&mut self, address: u64, value: &str) -> &mut Self {
        self.memory.write_cstr(address, value);
        self
    }

    fn segment(&mut self, seg: &SegmentSpec) -> Result<()> {
        let address = seg.address.value()?;
        match (&seg.bytes, &seg.words, &seg.string) {
            (Some(hex), None, None) => {
                let data = decode_hex(hex)
                    .with_context(|| format!("segment at 0x{:x}", address))?;
                self.memory.write(address, &data);
            }
            (None, Some(words), None) => {
                for (i, word) in words.iter().enumerate() {
                    self.memory.write_u64(address + 8 * i as u64, word.value()?);
                }
            }
            (None, None, Some(s)) => self.memory.write_cstr(address, s),
            _ => {
                return Err(SdbError::Snapshot(format!(
                    "segment at 0x{:x} must set exactly one of bytes, words or string",
                    address
                )))
            }
        }
        Ok(())
    }

    pub fn build(self) -> Arc<Program> {
        let mut program = Program::new(self.types, self.memory);
        for (name, address, type_id) in self.symbols {
            program.add_symbol(name, address, type_id);
        }
        Arc::new(program)
    }
}

/// Resolve `base`, `base *...` and `base [N]...` against a table, creating
/// derived types as needed
fn resolve_type_name(types: &mut TypeTable, name: &str) -> Result<TypeId> {
    let mut rest = name.trim();
    let mut dims = Vec::new();
    while let Some(open) = rest.strip_suffix(']').and_then(|r| r.rfind('[')) {
        let count_text = &rest[open + 1..rest.len() - 1];
        let count = parse_int(count_text)
            .ok_or_else(|| SdbError::UnknownType(name.trim().to_string()))?;
        dims.push(count);
        rest = rest[..open].trim_end();
    }

    let mut depth = 0;
    while let Some(r) = rest.strip_suffix('*') {
        rest = r.trim_end();
        depth += 1;
    }

    let mut id = types
        .lookup(rest)
        .ok_or_else(|| SdbError::UnknownType(name.trim().to_string()))?;
    for _ in 0..depth {
        id = types.pointer_to(id);
    }
    // `int [2][3]` is two arrays of three ints.
    for count in dims {
        id = types.array_of(id, count);
    }
    Ok(id)
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(SdbError::Snapshot("odd number of hex digits".to_string()));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| SdbError::Snapshot(format!("invalid hex byte in '{}'", text)))
        })
        .collect()
}
