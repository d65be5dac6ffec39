//! Integration tests for chained reading across many files.

use ironstream::testing::*;
use ironstream::*;
use std::io::Read;

#[test]
fn test_records_span_files_in_list_order() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    // List order wins over name order.
    let mut files = Vec::new();
    let mut expected = Vec::new();
    for i in [3, 0, 2, 1] {
        let recs = sample_records(i, i + 1);
        files.push(dir.write_jsonl(&format!("part-{i}.json"), &recs)?);
        expected.extend(recs);
    }

    let reader: Box<dyn Read + Send> = Box::new(MultiReader::new(files));
    let mut records = RecordStreamer::<SampleRecord>::from_reader(reader, "parts");
    let mut got = Vec::new();
    while let Some(rec) = records.next_record()? {
        got.push(rec);
    }
    assert_collections_equal(&got, &expected);
    assert!(records.next_record()?.is_none());
    assert!(records.next_record()?.is_none());
    Ok(())
}

#[test]
fn test_record_without_trailing_newline_joins_next_file() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let a = dir.write_raw("a.json", r#"{"id":1}"#)?;
    let b = dir.write_raw("b.json", "{\"id\":2}\n")?;

    let values: Vec<serde_json::Value> =
        RecordStreamer::from_reader(MultiReader::new(vec![a, b]), "pair").collect::<Result<_>>()?;
    assert_eq!(values, vec![serde_json::json!({"id": 1}), serde_json::json!({"id": 2})]);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn test_mixed_compressed_and_plain_members() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let first = sample_records(0, 3);
    let second = sample_records(1, 2);
    let third = sample_records(2, 4);
    let files = vec![
        dir.write_jsonl("a.json", &first)?,
        dir.write_jsonl("b.json.gz", &second)?,
        dir.write_jsonl("c.jsonl", &third)?,
    ];

    let mut reader = MultiReader::new(files);
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    assert_eq!(text.lines().count(), 9);

    let got: Vec<SampleRecord> = RecordStreamer::from_reader(text.as_bytes(), "text").collect::<Result<_>>()?;
    let expected: Vec<_> = first.into_iter().chain(second).chain(third).collect();
    assert_collections_equal(&got, &expected);
    Ok(())
}

#[cfg(all(feature = "compression-zstd", feature = "compression-bzip2", feature = "compression-xz"))]
#[test]
fn test_every_builtin_codec_in_one_stream() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let mut files = Vec::new();
    let mut expected = Vec::new();
    for (i, name) in ["a.json.zst", "b.json.bz2", "c.json.xz", "d.json"].iter().enumerate() {
        let recs = sample_records(i, 2);
        files.push(dir.write_jsonl(name, &recs)?);
        expected.extend(recs);
    }

    let got: Vec<SampleRecord> =
        RecordStreamer::from_reader(MultiReader::new(files), "codecs").collect::<Result<_>>()?;
    assert_collections_equal(&got, &expected);
    Ok(())
}

#[test]
fn test_open_resolves_a_directory() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    dir.write_raw("a.json", "1\n")?;
    dir.write_raw("b.txt", "2\n")?;
    dir.write_raw("c.jsonl", "3\n")?;

    let reader = MultiReader::open(dir.path(), &ResolveOptions::jsonl())?;
    assert_eq!(reader.files().len(), 2);
    assert_eq!(reader.position(), 0);

    let got: Vec<u32> = RecordStreamer::from_reader(reader, "dir").collect::<Result<_>>()?;
    assert_eq!(got, vec![1, 3]);
    Ok(())
}

#[test]
fn test_close_then_read_returns_end_of_stream() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let a = dir.write_raw("a.json", "1\n2\n3\n")?;
    let b = dir.write_raw("b.json", "4\n")?;

    let mut reader = MultiReader::new(vec![a, b]);
    let mut buf = [0u8; 2];
    assert_eq!(reader.read(&mut buf)?, 2);
    assert!(reader.current_path().is_some());

    reader.close();
    assert!(reader.current_path().is_none());
    assert_eq!(reader.read(&mut buf)?, 0);
    assert_eq!(reader.position(), 0);

    // Removing the files proves nothing is reopened.
    drop(dir);
    assert_eq!(reader.read(&mut buf)?, 0);
    reader.close();
    Ok(())
}

#[test]
fn test_missing_member_is_not_found() -> anyhow::Result<()> {
    let dir = FixtureDir::new()?;
    let a = dir.write_raw("a.json", "1\n")?;
    let missing = dir.file_path("gone.json");

    let mut records = RecordStreamer::<u32, _>::from_reader(MultiReader::new(vec![a, missing.clone()]), "pair");
    assert_eq!(records.next_record()?, Some(1));
    let err = records.next_record().expect_err("second member is missing");
    assert!(err.is_not_found(), "unexpected error: {err:?}");
    assert_eq!(err.path(), Some(missing.as_path()));
    let again = records.next_record().expect_err("a failed stream stays failed");
    assert!(matches!(again, Error::Failed { .. }), "unexpected error: {again:?}");
    Ok(())
}
