//! Shared helpers for building firmware regions

#![allow(dead_code)]

use flashfs_rs::ImageBuilder;

/// Image containing `paths`, each file holding its own path as contents
pub fn image_of(paths: &[&str]) -> Vec<u8> {
    let mut builder = ImageBuilder::new();
    for path in paths {
        builder.add(path, path.as_bytes()).unwrap();
    }
    builder.build().unwrap()
}

/// Image from explicit `(path, contents)` pairs
pub fn image_with(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ImageBuilder::new();
    for (path, contents) in files {
        builder.add(path, contents).unwrap();
    }
    builder.build().unwrap()
}

/// Place `image` after `code_len` bytes of fake firmware, padded to a
/// 4-byte boundary, followed by `tail_len` bytes of erased flash
pub fn embed(image: &[u8], code_len: usize, tail_len: usize) -> Vec<u8> {
    let mut region: Vec<u8> = (0..code_len).map(|i| (i % 97) as u8 + 0x20).collect();
    region.resize((code_len + 3) & !3, 0);
    region.extend_from_slice(image);
    region.resize(region.len() + tail_len, 0xFF);
    region
}

/// The reference tree: `a.txt`, `docs/b.txt`, `docs/img/c.png`, `z.txt`
pub fn reference_region() -> Vec<u8> {
    embed(
        &image_of(&["a.txt", "docs/b.txt", "docs/img/c.png", "z.txt"]),
        1000,
        256,
    )
}
