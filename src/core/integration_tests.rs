//! End-to-end tests across locator, table, enumerator and handle pools
//!
//! Images are embedded in a fake firmware region the way they are on a device:
//! code first, then the image at a 4-byte boundary, then unused flash.

#[cfg(test)]
mod tests {
    use crate::core::builder::ImageBuilder;
    use crate::core::dir::EntryKind;
    use crate::core::error::FlashFsError;
    use crate::core::file::SeekOrigin;
    use crate::core::filesystem::FlashFileSystem;
    use std::collections::BTreeSet;

    const PATHS: &[&str] = &[
        "404.html",
        "assets/css/main.css",
        "assets/css/print.css",
        "assets/fonts/mono/regular.woff2",
        "assets/fonts/sans.woff2",
        "assets/logo.svg",
        "favicon.ico",
        "index.html",
        "js/app.js",
        "js/lib/a/b/c/deep.js",
        "js/lib/util.js",
        "js/vendor.js",
    ];

    fn firmware(paths: &[&str]) -> Vec<u8> {
        let mut builder = ImageBuilder::new();
        for path in paths {
            builder.add(path, format!("contents of {}", path).as_bytes()).unwrap();
        }
        let mut region: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        region.extend_from_slice(&builder.build().unwrap());
        region.extend(std::iter::repeat(0xFF).take(1024));
        region
    }

    /// Immediate children of `dir` computed directly from the path list
    fn expected_children(paths: &[&str], dir: &str) -> BTreeSet<String> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        paths
            .iter()
            .filter_map(|path| path.strip_prefix(prefix.as_str()))
            .map(|rest| match rest.find('/') {
                Some(slash) => rest[..=slash].to_string(),
                None => rest.to_string(),
            })
            .collect()
    }

    fn all_directories(paths: &[&str]) -> BTreeSet<String> {
        let mut dirs = BTreeSet::from([String::new()]);
        for path in paths {
            let mut end = 0;
            while let Some(slash) = path[end..].find('/') {
                end += slash;
                dirs.insert(path[..end].to_string());
                end += 1;
            }
        }
        dirs
    }

    #[test]
    fn test_every_path_found_and_contents_match() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);
        assert_eq!(fs.file_count(), PATHS.len());

        for path in PATHS {
            let handle = fs.open_file(path).unwrap();
            let mut contents = Vec::new();
            let mut buf = [0u8; 7];
            loop {
                let n = fs.read(handle, &mut buf).unwrap();
                if n == 0 {
                    break;
                }
                contents.extend_from_slice(&buf[..n]);
            }
            assert_eq!(contents, format!("contents of {}", path).as_bytes());
            assert_eq!(fs.length(handle).unwrap(), contents.len() as u64);
            fs.close_file(handle).unwrap();
        }
    }

    #[test]
    fn test_every_directory_lists_its_immediate_children() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);

        for dir in all_directories(PATHS) {
            let handle = fs.open_dir(&dir).unwrap();
            let mut names = Vec::new();
            while let Some(entry) = fs.read_dir(handle).unwrap() {
                assert_eq!(entry.kind == EntryKind::Directory, entry.name.ends_with('/'));
                names.push(entry.name.to_string());
            }
            fs.close_dir(handle).unwrap();

            let unique: BTreeSet<_> = names.iter().cloned().collect();
            assert_eq!(unique.len(), names.len(), "duplicate child in {:?}", dir);
            assert_eq!(unique, expected_children(PATHS, &dir), "children of {:?}", dir);

            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted, "children of {:?} out of order", dir);
        }
    }

    #[test]
    fn test_rewind_matches_fresh_open() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);

        let fresh: Vec<_> = fs.list("assets").unwrap().iter().map(|e| e.name).collect();

        let handle = fs.open_dir("assets").unwrap();
        fs.read_dir(handle).unwrap();
        fs.read_dir(handle).unwrap();
        fs.rewind_dir(handle).unwrap();
        let mut replay = Vec::new();
        while let Some(entry) = fs.read_dir(handle).unwrap() {
            replay.push(entry.name);
        }
        assert_eq!(replay, fresh);
        assert_eq!(fresh, ["css/", "fonts/", "logo.svg"]);
    }

    #[test]
    fn test_tell_seek_reproduces_tail_at_every_step() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);
        let handle = fs.open_dir("/").unwrap();

        loop {
            let position = fs.tell_dir(handle).unwrap();
            let mut tail = Vec::new();
            while let Some(entry) = fs.read_dir(handle).unwrap() {
                tail.push(entry.name);
            }

            fs.seek_dir(handle, position).unwrap();
            let mut again = Vec::new();
            while let Some(entry) = fs.read_dir(handle).unwrap() {
                again.push(entry.name);
            }
            assert_eq!(tail, again);

            fs.seek_dir(handle, position).unwrap();
            if fs.read_dir(handle).unwrap().is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_seek_end_returns_last_byte() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);
        for path in PATHS {
            let handle = fs.open_file(path).unwrap();
            let length = fs.length(handle).unwrap();
            assert_eq!(fs.seek(handle, 0, SeekOrigin::End).unwrap(), length - 1);
            let mut buf = [0u8; 4];
            assert_eq!(fs.read(handle, &mut buf).unwrap(), 1);
            assert_eq!(buf[0], path.as_bytes()[path.len() - 1]);
            fs.close_file(handle).unwrap();
        }
    }

    #[test]
    fn test_many_handles_on_same_file_are_independent() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);
        let a = fs.open_file("index.html").unwrap();
        let b = fs.open_file("index.html").unwrap();

        fs.seek(a, 3, SeekOrigin::Start).unwrap();
        let mut buf = [0u8; 3];
        fs.read(b, &mut buf).unwrap();
        assert_eq!(&buf, b"con");
        assert_eq!(fs.tell(a).unwrap(), 3);
        assert_eq!(fs.tell(b).unwrap(), 3);
        fs.read(a, &mut buf).unwrap();
        assert_eq!(&buf, b"ten");
    }

    #[test]
    fn test_exhaustion_is_recoverable() {
        let region = firmware(PATHS);
        let mut fs = FlashFileSystem::mount(&region);

        let handles: Vec<_> = (0..16).map(|_| fs.open_file("js/app.js").unwrap()).collect();
        assert!(matches!(
            fs.open_file("js/app.js"),
            Err(FlashFsError::TooManyOpenFiles { capacity: 16 })
        ));
        for handle in handles {
            fs.close_file(handle).unwrap();
        }
        assert_eq!(fs.open_files(), 0);
        assert!(fs.open_file("js/app.js").is_ok());
    }
}
