//! Integration tests for input resolution: directories, manifests and globs.

use ironstream::testing::*;
use ironstream::*;
use std::path::PathBuf;

#[test]
fn test_directory_filters_by_extension() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let a = dir.write_raw("a.x1", "1\n")?;
    dir.write_raw("b.x2", "2\n")?;

    let files = resolve(dir.path(), &ResolveOptions::new().with_extension("x1"))?;
    assert_eq!(files, vec![a]);
    Ok(())
}

#[test]
fn test_directory_skips_dotfiles_and_dot_directories() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let visible = dir.write_raw("a.json", "1\n")?;
    dir.write_raw(".hidden.json", "2\n")?;
    dir.write_raw(".cache/c.json", "3\n")?;
    let nested = dir.write_raw("sub/d.json", "4\n")?;

    let files = resolve(dir.path(), &ResolveOptions::jsonl())?;
    assert_eq!(files, vec![visible, nested]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_directory_skips_symlinks() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let real = dir.write_raw("a.json", "1\n")?;
    let target_dir = dir.mkdir("elsewhere")?;
    let outside = FixtureDir::new()?;
    let outside_file = outside.write_raw("o.json", "2\n")?;

    std::os::unix::fs::symlink(&real, dir.file_path("link.json"))?;
    std::os::unix::fs::symlink(outside.path(), dir.file_path("linked_dir"))?;
    std::os::unix::fs::symlink(&outside_file, target_dir.join("o.json"))?;

    let files = resolve(dir.path(), &ResolveOptions::jsonl())?;
    assert_eq!(files, vec![real]);
    Ok(())
}

#[test]
fn test_directory_order_is_depth_first_by_name() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let names = ["b/2.json", "a.json", "b/1.json", "c.json", "b/z/0.json"];
    for name in names {
        dir.write_raw(name, "0\n")?;
    }

    let files = resolve(dir.path(), &ResolveOptions::jsonl())?;
    let expected: Vec<PathBuf> = ["a.json", "b/1.json", "b/2.json", "b/z/0.json", "c.json"]
        .iter()
        .map(|n| dir.file_path(n))
        .collect();
    assert_eq!(files, expected);

    // A second walk of the same tree gives the same order.
    assert_eq!(resolve(dir.path(), &ResolveOptions::jsonl())?, expected);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn test_compressed_files_bypass_extension_filter() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let a = dir.write_raw("a.x1", "1\n")?;
    let b = dir.write_jsonl("b.x2.gz", &[2])?;

    let files = resolve(dir.path(), &ResolveOptions::new().with_extension("x1"))?;
    assert_eq!(files, vec![a, b]);
    Ok(())
}

#[test]
fn test_manifest_is_taken_verbatim() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let manifest = dir.write_raw("inputs.list", "f1.json\n\nf2.json.gz\n")?;

    let files = resolve(&manifest, &ResolveOptions::new().with_extension("x1"))?;
    assert_eq!(files, vec![PathBuf::from("f1.json"), PathBuf::from("f2.json.gz")]);
    assert_eq!(PathSpec::classify(&manifest, &ResolveOptions::new())?, PathSpec::Manifest);
    Ok(())
}

#[test]
fn test_manifest_entries_are_not_expanded() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let sub = dir.mkdir("sub")?;
    let manifest = dir.write_manifest("inputs.list", &[&sub])?;

    assert_eq!(resolve(&manifest, &ResolveOptions::jsonl())?, vec![sub]);
    Ok(())
}

#[test]
fn test_single_file_ignores_extension_filter() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let file = dir.write_raw("notes.txt", "1\n")?;

    assert_eq!(resolve(&file, &ResolveOptions::jsonl())?, vec![file.clone()]);
    assert_eq!(PathSpec::classify(&file, &ResolveOptions::new())?, PathSpec::SingleFile);
    Ok(())
}

#[test]
fn test_missing_path_is_not_found() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let missing = dir.file_path("nope.json");

    let err = resolve(&missing, &ResolveOptions::jsonl()).expect_err("missing input");
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some(missing.as_path()));
    Ok(())
}

#[test]
fn test_missing_paths_with_metacharacters_are_not_found_by_default() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    dir.write_raw("x1.json", "1\n")?;

    for name in ["data[1.json", "x*.json", "x?.json"] {
        let missing = dir.file_path(name);
        let err = resolve(&missing, &ResolveOptions::new()).expect_err("missing input");
        assert!(err.is_not_found(), "{name}: unexpected error: {err:?}");
        assert_eq!(err.path(), Some(missing.as_path()));
    }
    Ok(())
}

#[test]
fn test_glob_pattern_expands_sorted() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let b = dir.write_raw("data2.jsonl", "2\n")?;
    let a = dir.write_raw("data1.jsonl", "1\n")?;
    dir.write_raw("other.txt", "3\n")?;

    let opts = ResolveOptions::new().with_glob(true);
    let pattern = dir.file_path("data*.jsonl");
    assert_eq!(PathSpec::classify(&pattern, &opts)?, PathSpec::Glob);
    assert_eq!(resolve(&pattern, &opts)?, vec![a, b]);
    Ok(())
}

#[test]
fn test_glob_without_matches_is_not_found() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let pattern = dir.file_path("*.json");

    let err = resolve(&pattern, &ResolveOptions::new().with_glob(true)).expect_err("no matches");
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn test_malformed_glob_is_a_pattern_error() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let pattern = dir.file_path("[unclosed.json");

    let err = resolve(&pattern, &ResolveOptions::new().with_glob(true)).expect_err("bad pattern");
    assert!(matches!(err, Error::Pattern { .. }), "unexpected error: {err:?}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_manifest_lines_are_raw_bytes() -> anyhow::Result<()> {
    use std::os::unix::ffi::OsStrExt;

    let dir = FixtureDir::new()?;
    let manifest = dir.write_raw("inputs.list", b"f1.json\r\nb\xffd.json\n".as_slice())?;

    let files = resolve(&manifest, &ResolveOptions::new())?;
    let raw: Vec<&[u8]> = files.iter().map(|f| f.as_os_str().as_bytes()).collect();
    assert_eq!(raw, vec![b"f1.json".as_slice(), b"b\xffd.json".as_slice()]);
    Ok(())
}
