#![no_main]
use flashfs_rs::FlashFileSystem;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as a flash region: mounting and looking up must never panic
fuzz_target!(|data: &[u8]| {
    let fs = FlashFileSystem::mount(data);
    if !fs.is_mounted() {
        return;
    }

    if let Ok(table) = fs.table() {
        let _ = table.verify();
        for (name, _) in table.iter().take(64).filter_map(Result::ok) {
            if let Ok(found) = fs.contents(name) {
                assert!(found.len() <= data.len());
            }
            let _ = fs.list(name);
        }
    }
});
