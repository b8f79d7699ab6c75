use std::fs;
use std::path::{Path, PathBuf};

use emx_flattree::{deserialize, serialize, ArchiveOptions, ExtractOptions, SkipReason};

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (name, data) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }
}

#[test]
fn end_to_end_example() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(&tree, &[("a.txt", b"hello\n"), ("sub/b.txt", b"world\n")]);
    let archive = work.path().join("archive.txt");

    serialize(&[tree.clone()], &archive, &tree, ArchiveOptions::default())?;
    assert_eq!(fs::read_to_string(&archive)?, "// a.txt\nhello\n\n// sub/b.txt\nworld\n\n");

    let restored = work.path().join("restored");
    let report = deserialize(&archive, &restored, ExtractOptions::default())?;
    assert_eq!(report.written(), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(fs::read(restored.join("a.txt"))?, b"hello\n");
    assert_eq!(fs::read(restored.join("sub/b.txt"))?, b"world\n");
    Ok(())
}

#[test]
fn round_trip_is_byte_exact() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    let files: &[(&str, &[u8])] = &[
        ("empty.txt", b""),
        ("no_newline.txt", b"last line"),
        ("blank_lines.md", b"\n\n\ntitle\n\n\n"),
        ("crlf.txt", b"one\r\ntwo\r\n"),
        ("deep/nested/dir/unicode.txt", "héllo 世界\n".as_bytes()),
        ("spaces in name.txt", b"  indented\n\ttabbed\n"),
    ];
    write_tree(&tree, files);
    let archive = work.path().join("archive.txt");

    serialize(&[tree.clone()], &archive, &tree, ArchiveOptions::default())?;
    let restored = work.path().join("restored");
    deserialize(&archive, &restored, ExtractOptions::default())?;

    for (name, data) in files {
        assert_eq!(&fs::read(restored.join(name))?, data, "{}", name);
    }
    Ok(())
}

#[test]
fn serializing_twice_is_identical() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(
        &tree,
        &[("z.txt", b"z\n"), ("a/b.txt", b"b\n"), ("a/a.txt", b"a\n"), ("m.txt", b"m\n")],
    );
    let first = work.path().join("first.txt");
    let second = work.path().join("second.txt");

    serialize(&[tree.clone()], &first, &tree, ArchiveOptions::default())?;
    serialize(&[tree.clone()], &second, &tree, ArchiveOptions::default())?;
    assert_eq!(fs::read(&first)?, fs::read(&second)?);
    Ok(())
}

#[test]
fn ignore_rules_cover_nested_directories() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(
        &tree,
        &[
            (".flatignore", b"# logs\n*.log\n"),
            ("x.log", b"x\n"),
            ("sub/y.log", b"y\n"),
            ("sub/keep.txt", b"keep\n"),
        ],
    );
    let archive = work.path().join("archive.txt");

    let report = serialize(&[tree.clone()], &archive, &tree, ArchiveOptions::default())?;
    assert_eq!(report.archived(), vec![".flatignore", "sub/keep.txt"]);
    let text = fs::read_to_string(&archive)?;
    assert!(!text.contains("x.log"));
    assert!(!text.contains("y.log"));
    Ok(())
}

#[test]
fn binary_files_are_skipped_or_marked() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(&tree, &[("blob.bin", &[0xFF; 4096])]);
    let archive = work.path().join("archive.txt");

    let report = serialize(&[tree.clone()], &archive, &tree, ArchiveOptions::default())?;
    assert_eq!(fs::read(&archive)?, b"");
    assert_eq!(report.skipped()[0].1, &SkipReason::Binary);

    let options = ArchiveOptions::default().with_include_binary(true);
    serialize(&[tree.clone()], &archive, &tree, options)?;
    let bytes = fs::read(&archive)?;
    assert_eq!(bytes, b"// blob.bin\n// (binary file)\n\n");
    assert!(!bytes.contains(&0xFF));

    let restored = work.path().join("restored");
    let report = deserialize(&archive, &restored, ExtractOptions::default())?;
    assert_eq!(report.skipped(), vec![("blob.bin", &SkipReason::BinaryPlaceholder)]);
    assert!(!restored.join("blob.bin").exists());
    Ok(())
}

#[test]
fn traversal_records_stay_inside_output() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let archive = work.path().join("archive.txt");
    fs::write(&archive, "junk before any header\n// ../../etc/passwd\nowned\n\n// safe/ok.txt\nok\n\n")?;

    let out = work.path().join("a/b/out");
    let report = deserialize(&archive, &out, ExtractOptions::default())?;
    assert_eq!(report.written(), vec!["safe/ok.txt"]);
    assert_eq!(report.skipped(), vec![("../../etc/passwd", &SkipReason::UnsafePath)]);
    assert!(!work.path().join("a/etc/passwd").exists());
    assert_eq!(fs::read_to_string(out.join("safe/ok.txt"))?, "ok\n");
    Ok(())
}

#[test]
fn explicit_file_list_with_missing_entry() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(&tree, &[("src/lib.rs", b"pub mod x;\n"), ("src/x.rs", b"\n")]);
    let archive = work.path().join("archive.txt");
    let inputs: Vec<PathBuf> = vec![tree.join("src/x.rs"), tree.join("nope"), tree.join("src/lib.rs")];

    let report = serialize(&inputs, &archive, &tree, ArchiveOptions::default())?;
    assert_eq!(report.archived(), vec!["src/x.rs", "src/lib.rs"]);
    assert_eq!(report.skipped()[0].1, &SkipReason::NotFileOrDirectory);
    assert_eq!(fs::read_to_string(&archive)?, "// src/x.rs\n\n\n// src/lib.rs\npub mod x;\n\n");
    Ok(())
}

#[test]
fn header_like_content_splits_on_extraction() -> anyhow::Result<()> {
    // Unescaped delimiter: a line starting with `// ` reads back as a header
    let work = tempfile::tempdir()?;
    let tree = work.path().join("tree");
    write_tree(&tree, &[("main.c", b"int x;\n// note.txt\nint y;\n")]);
    let archive = work.path().join("archive.txt");

    serialize(&[tree.clone()], &archive, &tree, ArchiveOptions::default())?;
    let restored = work.path().join("restored");
    let report = deserialize(&archive, &restored, ExtractOptions::default())?;

    assert_eq!(report.written(), vec!["main.c", "note.txt"]);
    assert_eq!(fs::read_to_string(restored.join("main.c"))?, "int x;");
    assert_eq!(fs::read_to_string(restored.join("note.txt"))?, "int y;\n");
    Ok(())
}
