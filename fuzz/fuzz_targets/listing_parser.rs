#![no_main]

use gsparity::listing::{InstructionListing, ListingDialect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for dialect in [
        ListingDialect::gs_opcode(),
        ListingDialect::gs_ir(),
        ListingDialect::python_dis(),
    ]
    .into_iter()
    .flatten()
    {
        let _ = InstructionListing::parse(&text, &dialect);
    }
});
