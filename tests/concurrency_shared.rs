//! Shared mount used from several threads

mod common;

use common::{embed, image_with};
use flashfs_rs::{FlashFileSystem, FlashFsError, FsBuilder, SeekOrigin, SharedFileSystem, Vfs};
use std::thread;

fn region() -> Vec<u8> {
    let bodies: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; 100 + i as usize]).collect();
    let names: Vec<String> = (0..16).map(|i| format!("data/{:02}.bin", i)).collect();
    let files: Vec<(&str, &[u8])> = names
        .iter()
        .zip(&bodies)
        .map(|(name, body)| (name.as_str(), body.as_slice()))
        .collect();
    embed(&image_with(&files), 2048, 128)
}

#[test]
fn test_concurrent_readers_see_consistent_bodies() {
    let region = region();
    let shared = SharedFileSystem::new(FlashFileSystem::mount(&region));

    thread::scope(|scope| {
        for worker in 0..8usize {
            let shared = shared.clone();
            scope.spawn(move || {
                for round in 0..100usize {
                    let i = (worker + round) % 16;
                    let handle = shared.open_file(&format!("/data/{:02}.bin", i)).unwrap();
                    assert_eq!(shared.length(handle).unwrap(), 100 + i as u64);

                    shared.seek(handle, 50, SeekOrigin::Start).unwrap();
                    let mut buf = [0u8; 256];
                    let n = shared.read(handle, &mut buf).unwrap();
                    assert_eq!(n, 50 + i);
                    assert!(buf[..n].iter().all(|&b| b == i as u8));
                    shared.close_file(handle).unwrap();
                }
            });
        }
    });

    assert_eq!(shared.with(|fs| fs.open_files()), 0);
}

#[test]
fn test_concurrent_listing() {
    let region = region();
    let shared = SharedFileSystem::new(FlashFileSystem::mount(&region));

    thread::scope(|scope| {
        for _ in 0..4 {
            let shared = shared.clone();
            scope.spawn(move || {
                for _ in 0..25 {
                    let handle = shared.open_dir("data").unwrap();
                    let mut count = 0;
                    while shared.read_dir(handle).unwrap().is_some() {
                        count += 1;
                    }
                    assert_eq!(count, 16);
                    shared.close_dir(handle).unwrap();

                    assert_eq!(shared.list_children("/").unwrap().len(), 1);
                }
            });
        }
    });

    assert_eq!(shared.with(|fs| fs.open_dirs()), 0);
}

#[test]
fn test_shared_pool_limit_holds_across_threads() {
    let region = region();
    let fs = FsBuilder::new().max_open_files(4).mount(&region).unwrap();
    let shared = SharedFileSystem::new(fs);

    let held: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..6)
            .map(|_| {
                let shared = shared.clone();
                scope.spawn(move || shared.open_file("data/00.bin"))
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let opened = held.iter().filter(|r| r.is_ok()).count();
    let refused = held
        .iter()
        .filter(|r| matches!(r, Err(FlashFsError::TooManyOpenFiles { capacity: 4 })))
        .count();
    assert_eq!(opened, 4);
    assert_eq!(refused, 2);

    for handle in held.into_iter().flatten() {
        shared.close_file(handle).unwrap();
    }
    assert!(shared.open_file("data/00.bin").is_ok());
}
