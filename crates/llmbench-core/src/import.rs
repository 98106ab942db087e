use crate::model::JsonMap;
use std::io::BufRead;
use std::path::Path;

#[derive(serde::Deserialize)]
struct ExampleLine {
    inputs: JsonMap,
    expected_outputs: JsonMap,
}

/// Bulk example ingest: one JSON object per line, blank lines skipped.
/// Parsing happens up front so a bad line rejects the whole file before
/// anything is inserted.
pub fn load_examples_jsonl(path: &Path) -> anyhow::Result<Vec<(JsonMap, JsonMap)>> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open examples file {}: {}", path.display(), e))?;
    let reader = std::io::BufReader::new(file);

    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ExampleLine = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("line {}: failed to parse example: {}", i + 1, e))?;
        rows.push((entry.inputs, entry.expected_outputs));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_examples_and_skips_blank_lines() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(
            tmp,
            r#"{{"inputs": {{"question": "2+2?"}}, "expected_outputs": {{"answer": "4"}}}}"#
        )?;
        writeln!(tmp)?;
        writeln!(
            tmp,
            r#"{{"inputs": {{"question": "7*6?"}}, "expected_outputs": {{"answer": "42"}}}}"#
        )?;

        let rows = load_examples_jsonl(tmp.path())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0["question"], "2+2?");
        assert_eq!(rows[1].1["answer"], "42");
        Ok(())
    }

    #[test]
    fn bad_line_fails_with_its_line_number() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(
            tmp,
            r#"{{"inputs": {{"q": "x"}}, "expected_outputs": {{"a": "y"}}}}"#
        )?;
        writeln!(tmp, "not json")?;

        let err = load_examples_jsonl(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        Ok(())
    }
}
