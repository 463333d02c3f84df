//! Tuples, schemas and record ids.
//!
//! Tuples are stored in fixed-width slots, so every [`Type`] has a fixed
//! on-disk length:
//! - `Int`: 4 bytes, little-endian `i32`
//! - `Str`: 4-byte little-endian length, then `STRING_LEN` payload bytes

use std::fmt;

use crate::common::config::STRING_LEN;
use crate::common::PageId;

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Str,
}

impl Type {
    /// Bytes one value of this type occupies in a slot.
    pub const fn byte_len(self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str => 4 + STRING_LEN,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Str => write!(f, "STRING"),
        }
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_) => Type::Str,
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        match self {
            Field::Int(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            Field::Str(s) => {
                // Longer strings are truncated to the fixed payload width,
                // backing off to a char boundary.
                let mut end = s.len().min(STRING_LEN);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                let bytes = &s.as_bytes()[..end];
                out[..4].copy_from_slice(&(bytes.len() as u32).to_le_bytes());
                out[4..4 + bytes.len()].copy_from_slice(bytes);
                out[4 + bytes.len()..Type::Str.byte_len()].fill(0);
            }
        }
    }

    fn read_from(ty: Type, data: &[u8]) -> Self {
        match ty {
            Type::Int => Field::Int(i32::from_le_bytes([data[0], data[1], data[2], data[3]])),
            Type::Str => {
                let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
                let len = len.min(STRING_LEN);
                Field::Str(String::from_utf8_lossy(&data[4..4 + len]).into_owned())
            }
        }
    }
}

/// Schema of a table: an ordered list of typed, optionally named columns.
///
/// Two descriptors are equal when their column types match; names are
/// informational only.
#[derive(Debug, Clone, Eq)]
pub struct TupleDesc {
    types: Vec<Type>,
    names: Vec<Option<String>>,
}

impl TupleDesc {
    /// Anonymous columns of the given types.
    pub fn new(types: Vec<Type>) -> Self {
        let names = vec![None; types.len()];
        Self { types, names }
    }

    /// Named columns.
    pub fn with_names(columns: Vec<(Type, &str)>) -> Self {
        let (types, names) = columns
            .into_iter()
            .map(|(ty, name)| (ty, Some(name.to_string())))
            .unzip();
        Self { types, names }
    }

    pub fn num_fields(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.names.get(index)?.as_deref()
    }

    /// Width of one serialized tuple.
    pub fn tuple_size(&self) -> usize {
        self.types.iter().map(|t| t.byte_len()).sum()
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_types(f, self.types.iter().copied())
    }
}

fn write_types(f: &mut fmt::Formatter<'_>, types: impl Iterator<Item = Type>) -> fmt::Result {
    write!(f, "(")?;
    for (i, ty) in types.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    write!(f, ")")
}

/// Where a stored tuple lives: page plus slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

/// A row of field values, plus its location once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            record_id: None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Whether the field types line up with `desc`.
    pub fn matches(&self, desc: &TupleDesc) -> bool {
        self.fields.len() == desc.types.len()
            && self
                .fields
                .iter()
                .zip(&desc.types)
                .all(|(f, &t)| f.field_type() == t)
    }

    /// Human-readable shape, e.g. `(INT, STRING)`.
    pub fn shape(&self) -> String {
        struct Shape<'a>(&'a [Field]);
        impl fmt::Display for Shape<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_types(f, self.0.iter().map(Field::field_type))
            }
        }
        Shape(&self.fields).to_string()
    }

    /// Serialize into a slot. The tuple must match the slot's schema.
    pub(crate) fn write_to(&self, out: &mut [u8]) {
        let mut offset = 0;
        for field in &self.fields {
            let len = field.field_type().byte_len();
            field.write_to(&mut out[offset..offset + len]);
            offset += len;
        }
    }

    pub(crate) fn read_from(desc: &TupleDesc, data: &[u8], record_id: RecordId) -> Self {
        let mut offset = 0;
        let fields = desc
            .types
            .iter()
            .map(|&ty| {
                let field = Field::read_from(ty, &data[offset..offset + ty.byte_len()]);
                offset += ty.byte_len();
                field
            })
            .collect();
        Self {
            fields,
            record_id: Some(record_id),
        }
    }
}
