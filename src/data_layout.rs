//! Target data layout: how many bytes a value of a given type occupies
//!
//! Parses LLVM data layout strings (`e-m:e-p:64:64-i64:64-f80:128-n8:16:32:64-S128`)
//! and answers size queries with LLVM's rules:
//!
//! - store size is the bit width rounded up to whole bytes
//! - alloc size is the store size rounded up to the ABI alignment
//! - integer widths without an entry use the next larger entry, else the largest
//! - vector widths without an entry use their natural (power-of-two) alignment
//! - struct fields are padded to their alignment unless the struct is packed

use crate::error::{MemcheckError, Result};
use crate::ir::Type;
use std::collections::BTreeMap;

/// Answers "how many bytes does a value of this type occupy in memory"
pub trait TypeSizeOracle {
    /// Allocation size in bytes, including tail padding
    fn alloc_size(&self, ty: &Type) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointerSpec {
    size_bits: u64,
    abi_align: u64,
}

/// ABI alignments are stored in bytes; preferred alignments are validated
/// but do not influence allocation sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    endianness: Endianness,
    pointers: BTreeMap<u32, PointerSpec>,
    ints: BTreeMap<u32, u64>,
    floats: BTreeMap<u32, u64>,
    vectors: BTreeMap<u32, u64>,
    aggregate_align: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        let align = |abi_bits: u64| abi_bits / 8;

        Self {
            endianness: Endianness::Little,
            pointers: BTreeMap::from([(
                0,
                PointerSpec {
                    size_bits: 64,
                    abi_align: align(64),
                },
            )]),
            ints: BTreeMap::from([
                (1, align(8)),
                (8, align(8)),
                (16, align(16)),
                (32, align(32)),
                (64, align(32)),
            ]),
            floats: BTreeMap::from([
                (16, align(16)),
                (32, align(32)),
                (64, align(64)),
                (128, align(128)),
            ]),
            vectors: BTreeMap::from([(64, align(64)), (128, align(128))]),
            aggregate_align: 1,
        }
    }
}

impl DataLayout {
    /// Parse a data layout string on top of the default layout
    pub fn parse(spec: &str) -> Result<Self> {
        let mut layout = Self::default();

        for token in spec.split('-').filter(|t| !t.is_empty()) {
            let (head, fields) = match token.split_once(':') {
                Some((head, rest)) => (head, rest.split(':').collect::<Vec<_>>()),
                None => (token, Vec::new()),
            };

            match head.chars().next() {
                Some('e') if token == "e" => layout.endianness = Endianness::Little,
                Some('E') if token == "E" => layout.endianness = Endianness::Big,
                Some('p') => {
                    let addrspace = parse_width(spec, &head[1..], 0)?;
                    let size_bits = parse_bits(spec, token, fields.first().copied())?;
                    if size_bits == 0 {
                        return Err(MemcheckError::data_layout(
                            spec,
                            format!("pointer size must be non-zero in '{}'", token),
                        ));
                    }
                    let abi_align = parse_alignment(spec, token, &fields[1..], false)?;
                    layout
                        .pointers
                        .insert(addrspace, PointerSpec { size_bits, abi_align });
                }
                Some(kind @ ('i' | 'f' | 'v')) => {
                    let width = parse_width(spec, &head[1..], u32::MAX)?;
                    if width == u32::MAX || width == 0 {
                        return Err(MemcheckError::data_layout(
                            spec,
                            format!("missing or zero width in '{}'", token),
                        ));
                    }
                    let align = parse_alignment(spec, token, &fields, false)?;
                    let table = match kind {
                        'i' => &mut layout.ints,
                        'f' => &mut layout.floats,
                        _ => &mut layout.vectors,
                    };
                    table.insert(width, align);
                }
                Some('a') => {
                    layout.aggregate_align = parse_alignment(spec, token, &fields, true)?.max(1);
                }
                // mangling, native widths, stack/alloca/program/global address
                // spaces and function pointer alignment do not affect sizes
                _ => tracing::trace!("ignoring data layout specifier '{}'", token),
            }
        }

        Ok(layout)
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Pointer width in bits for an address space, falling back to address space 0
    pub fn pointer_size_bits(&self, addrspace: u32) -> u64 {
        self.pointer_spec(addrspace).size_bits
    }

    fn pointer_spec(&self, addrspace: u32) -> PointerSpec {
        self.pointers
            .get(&addrspace)
            .or_else(|| self.pointers.get(&0))
            .copied()
            .unwrap_or(PointerSpec {
                size_bits: 64,
                abi_align: 8,
            })
    }

    /// Size in bits, without tail padding for scalars
    pub fn size_in_bits(&self, ty: &Type) -> u64 {
        match ty {
            Type::Int(bits) => u64::from(*bits),
            Type::Ptr { addrspace } => self.pointer_size_bits(*addrspace),
            Type::Array { len, elem } => {
                len.saturating_mul(self.alloc_size(elem)).saturating_mul(8)
            }
            Type::Vector { len, elem } => len.saturating_mul(self.size_in_bits(elem)),
            Type::Struct { fields, packed } => {
                self.struct_layout(fields, *packed).0.saturating_mul(8)
            }
            float => u64::from(float.float_bits().unwrap_or(0)),
        }
    }

    /// Bytes written by a store of this type
    pub fn store_size(&self, ty: &Type) -> u64 {
        self.size_in_bits(ty).div_ceil(8)
    }

    /// ABI alignment in bytes
    pub fn abi_alignment(&self, ty: &Type) -> u64 {
        match ty {
            Type::Int(bits) => self.int_alignment(*bits),
            Type::Ptr { addrspace } => self.pointer_spec(*addrspace).abi_align,
            Type::Array { elem, .. } => self.abi_alignment(elem),
            Type::Vector { .. } => {
                let bits = self.size_in_bits(ty);
                match u32::try_from(bits).ok().and_then(|b| self.vectors.get(&b)) {
                    Some(align) => *align,
                    None => self.store_size(ty).next_power_of_two(),
                }
            }
            Type::Struct { packed: true, .. } => 1,
            Type::Struct { fields, packed } => {
                self.aggregate_align.max(self.struct_layout(fields, *packed).1)
            }
            float => {
                let bits = float.float_bits().unwrap_or(0);
                match self.floats.get(&bits) {
                    Some(align) => *align,
                    None => self.store_size(ty).next_power_of_two(),
                }
            }
        }
    }

    fn int_alignment(&self, bits: u32) -> u64 {
        self.ints
            .range(bits..)
            .next()
            .or_else(|| self.ints.iter().next_back())
            .map(|(_, align)| *align)
            .unwrap_or(1)
    }

    /// Returns (size in bytes including tail padding, alignment in bytes)
    fn struct_layout(&self, fields: &[Type], packed: bool) -> (u64, u64) {
        let mut offset = 0u64;
        let mut align = 1u64;

        for field in fields {
            let field_align = if packed { 1 } else { self.abi_alignment(field) };
            offset = align_to(offset, field_align);
            align = align.max(field_align);
            offset = offset.saturating_add(self.alloc_size(field));
        }

        (align_to(offset, align), align)
    }
}

impl TypeSizeOracle for DataLayout {
    fn alloc_size(&self, ty: &Type) -> u64 {
        align_to(self.store_size(ty), self.abi_alignment(ty))
    }
}

fn align_to(value: u64, align: u64) -> u64 {
    value.div_ceil(align.max(1)).saturating_mul(align.max(1))
}

/// Width or address-space number following a specifier letter
fn parse_width(spec: &str, digits: &str, default: u32) -> Result<u32> {
    if digits.is_empty() {
        return Ok(default);
    }
    digits
        .parse()
        .map_err(|_| MemcheckError::data_layout(spec, format!("invalid number '{}'", digits)))
}

fn parse_bits(spec: &str, token: &str, field: Option<&str>) -> Result<u64> {
    let field = field.ok_or_else(|| {
        MemcheckError::data_layout(spec, format!("missing size in '{}'", token))
    })?;
    field.parse().map_err(|_| {
        MemcheckError::data_layout(spec, format!("invalid number '{}' in '{}'", field, token))
    })
}

/// `abi[:pref]` in bits; returns the ABI alignment in bytes
fn parse_alignment(spec: &str, token: &str, fields: &[&str], allow_zero: bool) -> Result<u64> {
    let abi_bits = parse_bits(spec, token, fields.first().copied())?;
    let pref_bits = match fields.get(1) {
        Some(field) => parse_bits(spec, token, Some(field))?,
        None => abi_bits,
    };

    for bits in [abi_bits, pref_bits] {
        let valid = if bits == 0 {
            allow_zero
        } else {
            bits % 8 == 0 && (bits / 8).is_power_of_two()
        };
        if !valid {
            return Err(MemcheckError::data_layout(
                spec,
                format!("alignment {} in '{}' is not a power-of-two byte count", bits, token),
            ));
        }
    }

    if pref_bits != 0 && pref_bits < abi_bits {
        return Err(MemcheckError::data_layout(
            spec,
            format!("preferred alignment below ABI alignment in '{}'", token),
        ));
    }

    Ok(abi_bits / 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const X86_64: &str =
        "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128";

    fn size(layout: &DataLayout, ty: &str) -> u64 {
        layout.alloc_size(&ty.parse().unwrap())
    }

    #[test]
    fn test_default_scalar_sizes() {
        let dl = DataLayout::default();
        assert_eq!(size(&dl, "i1"), 1);
        assert_eq!(size(&dl, "i8"), 1);
        assert_eq!(size(&dl, "i32"), 4);
        assert_eq!(size(&dl, "i64"), 8);
        assert_eq!(size(&dl, "float"), 4);
        assert_eq!(size(&dl, "double"), 8);
        assert_eq!(size(&dl, "ptr"), 8);
    }

    #[test]
    fn test_odd_integer_widths_round_up() {
        let dl = DataLayout::default();
        // 3 bytes of storage, aligned like i32
        assert_eq!(dl.store_size(&Type::Int(24)), 3);
        assert_eq!(size(&dl, "i24"), 4);
        // wider than every entry: aligned like the largest (i64, abi 4)
        assert_eq!(size(&dl, "i96"), 12);
    }

    #[test]
    fn test_x86_64_layout() {
        let dl = DataLayout::parse(X86_64).unwrap();
        assert_eq!(dl.endianness(), Endianness::Little);
        assert_eq!(size(&dl, "i128"), 16);
        assert_eq!(size(&dl, "x86_fp80"), 16);
        assert_eq!(size(&dl, "ptr addrspace(270)"), 4);
        assert_eq!(size(&dl, "ptr addrspace(7)"), 8);
        assert_eq!(size(&dl, "{ i32, i64 }"), 16);
    }

    #[test]
    fn test_default_i64_alignment_is_four() {
        let dl = DataLayout::default();
        assert_eq!(size(&dl, "{ i32, i64 }"), 12);
    }

    #[test]
    fn test_struct_padding_and_packing() {
        let dl = DataLayout::default();
        assert_eq!(size(&dl, "{ i8, i32 }"), 8);
        assert_eq!(size(&dl, "{ i32, i8 }"), 8);
        assert_eq!(size(&dl, "<{ i8, i32 }>"), 5);
        assert_eq!(size(&dl, "{}"), 0);
    }

    #[test]
    fn test_arrays_and_vectors() {
        let dl = DataLayout::default();
        assert_eq!(size(&dl, "[10 x i16]"), 20);
        assert_eq!(size(&dl, "[3 x { i8, i16 }]"), 12);
        assert_eq!(size(&dl, "<4 x i32>"), 16);
        assert_eq!(size(&dl, "<3 x float>"), 16);
        assert_eq!(size(&dl, "<8 x i1>"), 1);
    }

    #[test]
    fn test_32_bit_pointers() {
        let dl = DataLayout::parse("e-p:32:32").unwrap();
        assert_eq!(dl.pointer_size_bits(0), 32);
        assert_eq!(size(&dl, "ptr"), 4);
        assert_eq!(size(&dl, "[2 x ptr]"), 8);
    }

    #[test]
    fn test_big_endian_flag() {
        let dl = DataLayout::parse("E-p:64:64").unwrap();
        assert_eq!(dl.endianness(), Endianness::Big);
    }

    #[test]
    fn test_empty_string_is_default() {
        assert_eq!(DataLayout::parse("").unwrap(), DataLayout::default());
    }

    #[test]
    fn test_rejects_malformed_specifiers() {
        for spec in ["i32:abc", "p:0:64", "i:32", "f64:12", "p:64", "i64"] {
            assert!(DataLayout::parse(spec).is_err(), "should reject '{}'", spec);
        }
    }
}
