#![no_main]

use gsparity::host_source::HostModule;
use gsparity::scope::{BraceScanner, ScanMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        // No extractor may panic, whatever the nesting or quoting
        if let Ok(scanner) = BraceScanner::gs() {
            let _ = scanner.clone().extract(source);
            let _ = scanner.mode(ScanMode::SkipLiterals).extract(source);
        }
        let _ = HostModule::parse(source);
    }
});
