#![no_main]
use arbitrary::Arbitrary;
use flashfs_rs::{FlashFileSystem, SeekOrigin};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Open(u8),
    Read(u8, u16),
    Seek(u8, i64, u8),
    Close(u8),
}

#[derive(Arbitrary, Debug)]
struct Input {
    region: Vec<u8>,
    ops: Vec<Op>,
}

// Random handle traffic against a random region; cursors stay in bounds
fuzz_target!(|input: Input| {
    let mut fs = FlashFileSystem::mount(&input.region);
    let names: Vec<&str> = match fs.table() {
        Ok(table) => table.iter().filter_map(Result::ok).map(|(name, _)| name).collect(),
        Err(_) => return,
    };
    if names.is_empty() {
        return;
    }

    let mut handles = Vec::new();
    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Open(i) => {
                if let Ok(handle) = fs.open_file(names[i as usize % names.len()]) {
                    handles.push(handle);
                }
            }
            Op::Read(h, len) if !handles.is_empty() => {
                let handle = handles[h as usize % handles.len()];
                let mut buf = vec![0u8; len as usize];
                if let Ok(n) = fs.read(handle, &mut buf) {
                    assert!(n <= buf.len());
                }
            }
            Op::Seek(h, offset, whence) if !handles.is_empty() => {
                let handle = handles[h as usize % handles.len()];
                if let Ok(origin) = SeekOrigin::from_whence(whence as i32 % 4) {
                    let _ = fs.seek(handle, offset, origin);
                }
                let length = fs.length(handle).unwrap();
                assert!(fs.tell(handle).unwrap() <= length);
            }
            Op::Close(h) if !handles.is_empty() => {
                let handle = handles.swap_remove(h as usize % handles.len());
                fs.close_file(handle).unwrap();
            }
            _ => {}
        }
    }
});
