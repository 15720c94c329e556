//! End-to-end runs of the `flashfs` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn flashfs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flashfs"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "flashfs failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn source_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/img")).unwrap();
    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::write(root.join("z.txt"), "zulu").unwrap();
    fs::write(root.join("docs/b.txt"), "bravo").unwrap();
    fs::write(root.join("docs/img/c.png"), [0x89, b'P', b'N', b'G']).unwrap();
}

fn packed(dir: &tempfile::TempDir) -> String {
    let source = dir.path().join("site");
    source_tree(&source);
    let image = dir.path().join("flash.bin");
    let output = flashfs(&[
        "pack",
        source.to_str().unwrap(),
        image.to_str().unwrap(),
        "--offset",
        "1024",
    ]);
    assert!(stdout(&output).starts_with("4 files"));
    image.to_str().unwrap().to_string()
}

#[test]
fn test_pack_then_ls() {
    let dir = tempfile::tempdir().unwrap();
    let image = packed(&dir);

    let root = stdout(&flashfs(&["ls", &image]));
    let names: Vec<_> = root.lines().map(|l| l.split_whitespace().last().unwrap()).collect();
    assert_eq!(names, ["a.txt", "docs/", "z.txt"]);

    let docs = stdout(&flashfs(&["ls", &image, "/docs"]));
    assert!(docs.lines().any(|l| l.trim() == "5  b.txt"));
    assert!(docs.lines().any(|l| l.ends_with("img/")));
}

#[test]
fn test_cat_and_tree() {
    let dir = tempfile::tempdir().unwrap();
    let image = packed(&dir);

    assert_eq!(stdout(&flashfs(&["cat", &image, "/docs/b.txt"])), "bravo");
    let tree = stdout(&flashfs(&["tree", &image]));
    assert_eq!(
        tree,
        "/\n  a.txt\n  docs/\n    b.txt\n    img/\n      c.png\n  z.txt\n"
    );
}

#[test]
fn test_check_reports_offset() {
    let dir = tempfile::tempdir().unwrap();
    let image = packed(&dir);
    let report = stdout(&flashfs(&["check", &image]));
    assert!(report.starts_with("OK: 4 files"));
    assert!(report.trim_end().ends_with("0x400"));
}

#[test]
fn test_missing_file_and_bad_image_fail() {
    let dir = tempfile::tempdir().unwrap();
    let image = packed(&dir);
    assert!(!flashfs(&["cat", &image, "nope.txt"]).status.success());

    let garbage = dir.path().join("garbage.bin");
    fs::write(&garbage, vec![0xFFu8; 4096]).unwrap();
    assert!(!flashfs(&["ls", garbage.to_str().unwrap()]).status.success());
}

#[test]
fn test_config_signature_used_for_pack_and_mount() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("site");
    source_tree(&source);
    let config = dir.path().join("flashfs.toml");
    fs::write(&config, "signature = \"OtherSig\"\n").unwrap();
    let image = dir.path().join("flash.bin");

    stdout(&flashfs(&[
        "--config",
        config.to_str().unwrap(),
        "pack",
        source.to_str().unwrap(),
        image.to_str().unwrap(),
    ]));
    let image = image.to_str().unwrap();
    assert!(!flashfs(&["ls", image]).status.success());
    let listing = stdout(&flashfs(&["-c", config.to_str().unwrap(), "ls", image]));
    assert_eq!(listing.lines().count(), 3);
}
