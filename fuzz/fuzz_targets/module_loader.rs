#![no_main]

use libfuzzer_sys::fuzz_target;
use memcheck::accountant::InstructionAccountant;
use memcheck::ir::Module;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(module) = Module::from_json_str(input) {
            let accountant = InstructionAccountant::new(module.data_layout());
            for (_, function) in module.functions() {
                let _ = accountant.analyze(function);
            }
        }
    }
});
