#![no_main]

use libfuzzer_sys::fuzz_target;
use memcheck::data_layout::{DataLayout, TypeSizeOracle};
use memcheck::ir::Type;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither parser may panic, and accepted input must be sizeable
        if let Ok(layout) = DataLayout::parse(input) {
            let _ = layout.alloc_size(&Type::ptr());
        }
        if let Ok(ty) = input.parse::<Type>() {
            let _ = DataLayout::default().alloc_size(&ty);
        }
    }
});
