use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use xrofs::{Image, ImageBuilder};

fn xrofs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xrofs"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn write_sample(dir: &Path) -> String {
    let mut builder = ImageBuilder::new();
    builder.add_file("a.txt", b"xyz".to_vec()).unwrap();
    builder.add_file("docs/readme.md", b"# hi\n".to_vec()).unwrap();
    builder.add_file("bin/blob", vec![7u8; 40_000]).unwrap();
    let path = dir.join("sample.img");
    fs::write(&path, builder.build().unwrap()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn lists_names_and_sizes() {
    let tmp = tempfile::tempdir().unwrap();
    let img = write_sample(tmp.path());

    let out = xrofs(&["-i", &img, "-l"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("a.txt "));
    assert!(lines[0].ends_with("3  B"));
    assert!(lines[1].starts_with("bin/blob "));
    assert!(lines[1].ends_with("39.1 KB"));
    assert!(lines[2].starts_with("docs/readme.md "));
}

#[test]
fn extracts_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let img = write_sample(tmp.path());
    let dest = tmp.path().join("out");

    let out = xrofs(&["-i", &img, "-a", "-q", "-d", dest.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"xyz");
    assert_eq!(fs::read(dest.join("docs/readme.md")).unwrap(), b"# hi\n");
    assert_eq!(fs::read(dest.join("bin/blob")).unwrap(), vec![7u8; 40_000]);
}

#[test]
fn refuses_existing_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let img = write_sample(tmp.path());

    let out = xrofs(&["-i", &img, "-a", "-d", tmp.path().to_str().unwrap()]);
    assert!(!out.status.success());
}

#[test]
fn missing_file_is_reported_and_others_extracted() {
    let tmp = tempfile::tempdir().unwrap();
    let img = write_sample(tmp.path());
    let dest = tmp.path().join("out");

    let out = xrofs(&[
        "-i",
        &img,
        "-q",
        "-d",
        dest.to_str().unwrap(),
        "nope.txt",
        "a.txt",
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("File \"nope.txt\" not found"));
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"xyz");
}

#[test]
fn pipes_file_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let img = write_sample(tmp.path());

    let out = xrofs(&["-i", &img, "-p", "docs/readme.md", "a.txt"]);
    assert!(out.status.success());
    assert_eq!(out.stdout, b"# hi\nxyz");
}

#[test]
fn rejects_corrupt_image() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.img");
    fs::write(&path, [0x00, 0x80, 0x05, 0x00, 0x01]).unwrap();

    let out = xrofs(&["-i", path.to_str().unwrap(), "-l"]);
    assert!(!out.status.success());
}

#[test]
fn generator_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(src.join("etc")).unwrap();
    fs::write(src.join("etc/motd"), b"hello\n").unwrap();
    fs::write(src.join("init"), b"#!/bin/sh\n").unwrap();
    let img = tmp.path().join("fs.img");

    let out = Command::new(env!("CARGO_BIN_EXE_xrofsgen"))
        .args(["-d", src.to_str().unwrap(), "-o", img.to_str().unwrap()])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let bytes = fs::read(&img).unwrap();
    let image = Image::new(&bytes).unwrap();
    assert_eq!(image.num_entries(), 2);
    assert!(image.is_sorted());
    assert_eq!(image.open("etc/motd").unwrap().map(), b"hello\n");
    assert_eq!(image.open("init").unwrap().map(), b"#!/bin/sh\n");
}

#[test]
fn generator_rejects_empty_file_without_force() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("empty"), b"").unwrap();
    fs::write(src.join("full"), b"x").unwrap();
    let img = tmp.path().join("fs.img");

    let run = |force: bool| {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_xrofsgen"));
        cmd.args(["-d", src.to_str().unwrap(), "-o", img.to_str().unwrap()])
            .env("RUST_LOG", "off");
        if force {
            cmd.arg("-f");
        }
        cmd.output().unwrap()
    };

    assert!(!run(false).status.success());
    assert!(run(true).status.success());
    let bytes = fs::read(&img).unwrap();
    assert_eq!(Image::new(&bytes).unwrap().num_entries(), 1);
}

#[test]
fn verbose_generator_prints_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a"), b"xyz").unwrap();
    fs::write(src.join("b"), b"1").unwrap();
    let img = tmp.path().join("fs.img");

    let out = Command::new(env!("CARGO_BIN_EXE_xrofsgen"))
        .args(["-v", "-d", src.to_str().unwrap(), "-o", img.to_str().unwrap()])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let collected: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with("  > ") && l.ends_with(" B"))
        .collect();
    assert_eq!(collected.len(), 2);
    assert!(collected[0].starts_with("  > a "));
    assert!(stdout.contains("  > [ HEADER (18  B) ]"));

    let placed: Vec<&str> = stdout.lines().filter(|l| l.contains("@ 0x")).collect();
    assert_eq!(placed.len(), 2);
    assert!(placed[0].starts_with("  > a ") && placed[0].ends_with("@ 0x000012"));
    assert!(placed[1].starts_with("  > b ") && placed[1].ends_with("@ 0x000017"));
    assert!(stdout.contains("Result: good"));
}
