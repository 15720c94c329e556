#![no_main]
use arbitrary::Arbitrary;
use flashfs_rs::{ImageBuilder, FlashFileSystem};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

#[derive(Arbitrary, Debug)]
struct Input {
    paths: Vec<String>,
    dir: String,
}

// Well-formed images built from arbitrary paths: every listed child is unique
fuzz_target!(|input: Input| {
    let mut builder = ImageBuilder::new();
    for path in input.paths.iter().take(128) {
        let _ = builder.add(path, path.as_bytes());
    }
    let image = match builder.build() {
        Ok(image) => image,
        Err(_) => return,
    };

    let mut fs = FlashFileSystem::mount(&image);
    let handle = match fs.open_dir(&input.dir) {
        Ok(handle) => handle,
        Err(_) => return,
    };

    let mut seen = BTreeSet::new();
    let mut steps = 0;
    while let Ok(Some(entry)) = fs.read_dir(handle) {
        assert!(seen.insert(entry.name), "duplicate child {:?}", entry.name);
        steps += 1;
        assert!(steps <= fs.file_count());
    }
    fs.close_dir(handle).unwrap();
});
