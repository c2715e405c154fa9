//! First-class IR value types and their textual syntax
//!
//! Types are written the way LLVM prints them: `i32`, `double`, `ptr`,
//! `ptr addrspace(1)`, `[4 x i8]`, `<2 x float>`, `{ i32, ptr }` and
//! packed structs `<{ i8, i32 }>`.

use crate::error::{MemcheckError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest integer type LLVM accepts (2^23 - 1 bits)
pub const MAX_INT_BITS: u32 = (1 << 23) - 1;

/// Deepest aggregate nesting the parser accepts
const MAX_NESTING: usize = 64;

/// A sized first-class type that a load can read or a store can write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    /// Arbitrary-width integer `iN`
    Int(u32),
    Half,
    BFloat,
    Float,
    Double,
    X86Fp80,
    Fp128,
    /// Opaque pointer in the given address space
    Ptr { addrspace: u32 },
    Array { len: u64, elem: Box<Type> },
    Vector { len: u64, elem: Box<Type> },
    Struct { fields: Vec<Type>, packed: bool },
}

impl Type {
    pub fn ptr() -> Self {
        Type::Ptr { addrspace: 0 }
    }

    pub fn array(len: u64, elem: Type) -> Self {
        Type::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn vector(len: u64, elem: Type) -> Self {
        Type::Vector {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn structure(fields: Vec<Type>) -> Self {
        Type::Struct {
            fields,
            packed: false,
        }
    }

    pub fn packed_structure(fields: Vec<Type>) -> Self {
        Type::Struct {
            fields,
            packed: true,
        }
    }

    /// Bit width of floating-point types, `None` for everything else
    pub fn float_bits(&self) -> Option<u32> {
        match self {
            Type::Half | Type::BFloat => Some(16),
            Type::Float => Some(32),
            Type::Double => Some(64),
            Type::X86Fp80 => Some(80),
            Type::Fp128 => Some(128),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(bits) => write!(f, "i{}", bits),
            Type::Half => f.write_str("half"),
            Type::BFloat => f.write_str("bfloat"),
            Type::Float => f.write_str("float"),
            Type::Double => f.write_str("double"),
            Type::X86Fp80 => f.write_str("x86_fp80"),
            Type::Fp128 => f.write_str("fp128"),
            Type::Ptr { addrspace: 0 } => f.write_str("ptr"),
            Type::Ptr { addrspace } => write!(f, "ptr addrspace({})", addrspace),
            Type::Array { len, elem } => write!(f, "[{} x {}]", len, elem),
            Type::Vector { len, elem } => write!(f, "<{} x {}>", len, elem),
            Type::Struct { fields, packed } => {
                if *packed {
                    f.write_str("<")?;
                }
                if fields.is_empty() {
                    f.write_str("{}")?;
                } else {
                    f.write_str("{ ")?;
                    for (i, field) in fields.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", field)?;
                    }
                    f.write_str(" }")?;
                }
                if *packed {
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Type {
    type Err = MemcheckError;

    fn from_str(text: &str) -> Result<Self> {
        let mut parser = TypeParser {
            text,
            rest: text,
            depth: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if !parser.rest.is_empty() {
            return Err(parser.error(format!("unexpected trailing input '{}'", parser.rest)));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for Type {
    type Error = MemcheckError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

/// Recursive-descent parser over LLVM type syntax
struct TypeParser<'a> {
    text: &'a str,
    rest: &'a str,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, message: impl Into<String>) -> MemcheckError {
        MemcheckError::type_syntax(self.text, message)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn take_word(&mut self) -> &'a str {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        word
    }

    fn parse_number(&mut self) -> Result<u64> {
        let word = self.take_word();
        word.parse()
            .map_err(|_| self.error(format!("expected a count, found '{}'", word)))
    }

    fn parse_type(&mut self) -> Result<Type> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("type nested too deeply"));
        }
        self.depth += 1;
        let ty = self.parse_type_inner();
        self.depth -= 1;
        ty
    }

    fn parse_type_inner(&mut self) -> Result<Type> {
        if self.eat('[') {
            let (len, elem) = self.parse_sequence_body()?;
            self.expect(']')?;
            return Ok(Type::array(len, elem));
        }
        if self.eat('<') {
            if self.eat('{') {
                let fields = self.parse_fields()?;
                self.expect('>')?;
                return Ok(Type::packed_structure(fields));
            }
            let (len, elem) = self.parse_sequence_body()?;
            self.expect('>')?;
            if len == 0 {
                return Err(self.error("vector length must be non-zero"));
            }
            return Ok(Type::vector(len, elem));
        }
        if self.eat('{') {
            return Ok(Type::structure(self.parse_fields()?));
        }

        let word = self.take_word();
        match word {
            "half" => Ok(Type::Half),
            "bfloat" => Ok(Type::BFloat),
            "float" => Ok(Type::Float),
            "double" => Ok(Type::Double),
            "x86_fp80" => Ok(Type::X86Fp80),
            "fp128" => Ok(Type::Fp128),
            "ptr" => Ok(Type::Ptr {
                addrspace: self.parse_addrspace()?,
            }),
            "" => Err(self.error("expected a type")),
            _ => match word.strip_prefix('i').map(str::parse::<u32>) {
                Some(Ok(bits)) if (1..=MAX_INT_BITS).contains(&bits) => Ok(Type::Int(bits)),
                Some(Ok(bits)) => Err(self.error(format!("integer width {} out of range", bits))),
                _ => Err(self.error(format!("unknown type '{}'", word))),
            },
        }
    }

    /// `N x T` inside array and vector brackets
    fn parse_sequence_body(&mut self) -> Result<(u64, Type)> {
        let len = self.parse_number()?;
        if self.take_word() != "x" {
            return Err(self.error("expected 'x' after element count"));
        }
        let elem = self.parse_type()?;
        Ok((len, elem))
    }

    /// Struct fields after the opening brace, consuming the closing one
    fn parse_fields(&mut self) -> Result<Vec<Type>> {
        let mut fields = Vec::new();
        if self.eat('}') {
            return Ok(fields);
        }
        loop {
            fields.push(self.parse_type()?);
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            return Ok(fields);
        }
    }

    fn parse_addrspace(&mut self) -> Result<u32> {
        self.skip_ws();
        let Some(rest) = self.rest.strip_prefix("addrspace") else {
            return Ok(0);
        };
        self.rest = rest;
        self.expect('(')?;
        let space = self.parse_number()?;
        self.expect(')')?;
        u32::try_from(space).map_err(|_| self.error("address space out of range"))
    }
}
