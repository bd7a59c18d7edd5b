//! Typed target objects
//!
//! An [`Object`] is the unit that flows through a pipeline: a type
//! descriptor plus either a scalar value or the address of an lvalue in
//! target memory. Objects are immutable; every operation (member access,
//! cast, address-of) produces a new object.

use super::program::Program;
use super::type_table::{PrimitiveDef, TypeDef, TypeId};
use crate::error::{Result, SdbError};
use std::fmt;
use std::sync::Arc;

/// Upper bound for string reads through a `char *`
pub const MAX_STRING_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    /// Scalar bits (integers and pointers)
    Value(u64),
    /// An lvalue living at this address
    Reference(u64),
}

/// A typed value or reference in the target
#[derive(Clone)]
pub struct Object {
    program: Arc<Program>,
    type_id: TypeId,
    repr: Repr,
}

impl Object {
    /// A scalar value of the given type
    pub fn value(program: &Arc<Program>, type_id: TypeId, bits: u64) -> Self {
        Self {
            program: Arc::clone(program),
            type_id,
            repr: Repr::Value(bits),
        }
    }

    /// An object of the given type stored at `address`
    pub fn reference(program: &Arc<Program>, type_id: TypeId, address: u64) -> Self {
        Self {
            program: Arc::clone(program),
            type_id,
            repr: Repr::Reference(address),
        }
    }

    /// A `void *` holding `address`
    pub fn void_pointer(program: &Arc<Program>, address: u64) -> Self {
        let ty = program.void_pointer();
        Self::value(program, ty, address)
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> String {
        self.program.type_name(self.type_id)
    }

    /// The address of the object, if it lives in memory
    pub fn address(&self) -> Option<u64> {
        match self.repr {
            Repr::Reference(address) => Some(address),
            Repr::Value(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.repr, Repr::Reference(_))
    }

    fn invalid(&self, operation: &'static str) -> SdbError {
        SdbError::InvalidOperation {
            operation,
            type_name: self.type_name(),
        }
    }

    /// `&obj`, typed as a pointer to the object's type
    pub fn address_of(&self) -> Result<Object> {
        let address = self.address().ok_or_else(|| self.invalid("take address of"))?;
        let ptr = self.program.pointer_to(self.type_id);
        Ok(Object::value(&self.program, ptr, address))
    }

    /// The scalar bits of an integer or pointer object, reading memory for references
    pub fn value_u64(&self) -> Result<u64> {
        match self.repr {
            Repr::Value(bits) => Ok(bits),
            Repr::Reference(address) => {
                let (scalar, size) = self.program.with_types(|types| {
                    (types.is_scalar(self.type_id), types.type_size(self.type_id))
                });
                match (scalar, size) {
                    (true, Some(size)) => self.program.read_uint(address, size as usize),
                    _ => Err(self.invalid("read value of")),
                }
            }
        }
    }

    /// The value as a signed integer, sign-extended according to the type's width
    pub fn value_i64(&self) -> Result<i64> {
        let bits = self.value_u64()?;
        let width = self.program.type_size(self.type_id).unwrap_or(8);
        if width >= 8 {
            return Ok(bits as i64);
        }
        let shift = 64 - width * 8;
        Ok(((bits << shift) as i64) >> shift)
    }

    pub fn is_null(&self) -> Result<bool> {
        Ok(self.value_u64()? == 0)
    }

    /// Reinterpret the object as `type_id` without changing its bits or address
    pub fn cast(&self, type_id: TypeId) -> Result<Object> {
        let (target_scalar, source_scalar) = self.program.with_types(|types| {
            (types.is_scalar(type_id), types.is_scalar(self.type_id))
        });
        match (self.repr, target_scalar) {
            (Repr::Value(bits), true) => Ok(Object::value(&self.program, type_id, bits)),
            (Repr::Reference(_), true) if source_scalar => {
                Ok(Object::value(&self.program, type_id, self.value_u64()?))
            }
            (Repr::Reference(address), false) => {
                Ok(Object::reference(&self.program, type_id, address))
            }
            _ => Err(self.invalid("cast")),
        }
    }

    /// `*ptr`
    pub fn deref(&self) -> Result<Object> {
        let pointee = self
            .program
            .with_types(|types| types.pointee(self.type_id))
            .ok_or_else(|| self.invalid("dereference"))?;
        Ok(Object::reference(&self.program, pointee, self.value_u64()?))
    }

    /// Member access through a struct lvalue or a pointer to struct
    pub fn member(&self, name: &str) -> Result<Object> {
        let target = if self.program.with_types(|types| types.is_pointer(self.type_id)) {
            self.deref()?
        } else {
            self.clone()
        };
        let base = target
            .address()
            .ok_or_else(|| target.invalid("access member of"))?;

        let member = self.program.with_types(|types| {
            types
                .struct_def(target.type_id)
                .map(|s| s.member(name).map(|m| (m.offset, m.type_id)))
        });
        match member {
            Some(Some((offset, type_id))) => Ok(Object::reference(
                &self.program,
                type_id,
                base.wrapping_add(offset),
            )),
            Some(None) => Err(SdbError::NoMember {
                type_name: target.type_name(),
                member: name.to_string(),
            }),
            None => Err(target.invalid("access member of")),
        }
    }

    /// `obj[index]` for arrays and pointers
    pub fn subscript(&self, index: u64) -> Result<Object> {
        let def = self
            .program
            .type_def(self.type_id)
            .ok_or_else(|| self.invalid("index"))?;
        let (element, base) = match def {
            TypeDef::Array { element, .. } => {
                (element, self.address().ok_or_else(|| self.invalid("index"))?)
            }
            TypeDef::Pointer(pointee) => (pointee, self.value_u64()?),
            _ => return Err(self.invalid("index")),
        };
        let size = self
            .program
            .type_size(element)
            .filter(|&s| s > 0)
            .ok_or_else(|| self.invalid("index"))?;
        Ok(Object::reference(
            &self.program,
            element,
            base.wrapping_add(index.wrapping_mul(size)),
        ))
    }

    /// Follow a member path such as `spa_root_vdev->vdev_child[0].vdev_id`
    pub fn member_path(&self, path: &str) -> Result<Object> {
        let mut current = self.clone();
        for step in parse_member_path(path)? {
            current = match step {
                PathStep::Member(name) => current.member(name)?,
                PathStep::Index(index) => current.subscript(index)?,
            };
        }
        Ok(current)
    }

    /// Read a NUL-terminated string from a `char *` or a `char` array
    pub fn read_string(&self) -> Result<String> {
        let def = self
            .program
            .type_def(self.type_id)
            .ok_or_else(|| self.invalid("read string from"))?;
        let (start, limit) = match def {
            TypeDef::Array { count, .. } => (
                self.address().ok_or_else(|| self.invalid("read string from"))?,
                count as usize,
            ),
            TypeDef::Pointer(_) => (self.value_u64()?, MAX_STRING_LEN),
            _ => return Err(self.invalid("read string from")),
        };

        let mut bytes = Vec::new();
        for i in 0..limit {
            let byte = self.program.read_memory(start + i as u64, 1)?[0];
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let def = match self.program.type_def(self.type_id) {
            Some(def) => def,
            None => return write!(f, "<invalid type>"),
        };
        match def {
            TypeDef::Pointer(_) => match self.value_u64() {
                Ok(bits) => write!(f, "{:#x}", bits),
                Err(e) => write!(f, "<{}>", e),
            },
            TypeDef::Primitive(PrimitiveDef::Bool) => match self.value_u64() {
                Ok(bits) => write!(f, "{}", bits != 0),
                Err(e) => write!(f, "<{}>", e),
            },
            TypeDef::Primitive(p) if p.is_signed() => match self.value_i64() {
                Ok(v) => write!(f, "{}", v),
                Err(e) => write!(f, "<{}>", e),
            },
            TypeDef::Primitive(_) => match self.value_u64() {
                Ok(v) => write!(f, "{}", v),
                Err(e) => write!(f, "<{}>", e),
            },
            TypeDef::Array { element, .. }
                if matches!(
                    self.program.type_def(element),
                    Some(TypeDef::Primitive(PrimitiveDef::Char))
                ) =>
            {
                match self.read_string() {
                    Ok(s) => write!(f, "{:?}", s),
                    Err(e) => write!(f, "<{}>", e),
                }
            }
            TypeDef::Struct(s) if depth == 0 && self.is_reference() => {
                write!(f, "{{")?;
                for (i, m) in s.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " .{} = ", m.name)?;
                    match self.member(&m.name) {
                        Ok(obj) => obj.fmt_value(f, depth + 1)?,
                        Err(e) => write!(f, "<{}>", e)?,
                    }
                }
                write!(f, " }}")
            }
            _ => write!(f, "{{...}}"),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.type_name())?;
        self.fmt_value(f, 0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.type_name())
            .field("repr", &self.repr)
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PathStep<'a> {
    Member(&'a str),
    Index(u64),
}

fn parse_member_path(path: &str) -> Result<Vec<PathStep<'_>>> {
    let bad = |why: &str| SdbError::InvalidOperation {
        operation: "parse member path",
        type_name: format!("'{}' ({})", path, why),
    };

    let mut steps = Vec::new();
    let mut rest = path.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("->") {
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('.') {
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| bad("unclosed '['"))?;
            let index = parse_int(after[..close].trim()).ok_or_else(|| bad("bad index"))?;
            steps.push(PathStep::Index(index));
            rest = &after[close + 1..];
            continue;
        }
        let end = rest
            .find(|c: char| c == '.' || c == '[' || c == '-')
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(bad("unexpected character"));
        }
        steps.push(PathStep::Member(&rest[..end]));
        rest = &rest[end..];
    }
    if steps.is_empty() {
        return Err(bad("empty path"));
    }
    Ok(steps)
}

/// Parse an integer literal with C-style radix prefixes (`0x`, `0o`, `0b`) or in decimal
pub fn parse_int(text: &str) -> Option<u64> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(neg) = lower.strip_prefix('-') {
        neg.parse::<i64>().ok().map(|v| (-v) as u64)
    } else {
        lower.parse::<u64>().ok()
    }
}
