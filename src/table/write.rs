use std::{
    io::{self, BufWriter, Write},
    path::Path,
};
use tempfile::Builder;
use tracing::info;

use super::{Field, Table};
use crate::error::{TableError, TableResult};

fn write_line<W: Write>(w: &mut W, fields: &[Field]) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        w.write_all(field.as_bytes())?;
    }
    w.write_all(b"\n")
}

/// Directory and file name of the destination; the temp file is created in
/// the same directory so the final rename stays on one filesystem.
fn split_destination(path: &Path) -> TableResult<(&Path, String)> {
    let name = path.file_name().ok_or_else(|| {
        TableError::io(
            format!("write {}", path.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name"),
        )
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, name.to_string_lossy().into_owned()))
}

impl Table {
    /// Header line, then one line per row, fields joined by `,` and each line
    /// ending in `\n`.
    ///
    /// Fields are written as-is: nothing is quoted, so a field holding a comma,
    /// a `"` or a newline will not read back identically.
    pub fn write_to<W: Write>(&self, writer: W) -> TableResult<()> {
        let mut w = BufWriter::new(writer);
        write_line(&mut w, self.headers())
            .map_err(|e| TableError::io("write header", e))?;
        for (i, row) in self.rows().iter().enumerate() {
            write_line(&mut w, row).map_err(|e| TableError::io(format!("write row {}", i), e))?;
        }
        w.flush().map_err(|e| TableError::io("flush table", e))
    }

    /// Write to `path` through a uniquely named sibling temp file that is
    /// renamed into place, so the destination is either fully replaced or left
    /// as it was. The temp file is removed on every failure path.
    #[tracing::instrument(level = "info", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn write<P: AsRef<Path>>(&self, path: P) -> TableResult<()> {
        let path = path.as_ref();
        let (dir, name) = split_destination(path)?;

        let mut tmp = Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| TableError::io(format!("create temp file in {}", dir.display()), e))?;
        self.write_to(tmp.as_file_mut())?;

        // on failure the returned NamedTempFile is dropped, which deletes it
        tmp.persist(path).map_err(|e| {
            TableError::io(
                format!("rename {} -> {}", e.file.path().display(), path.display()),
                e.error,
            )
        })?;

        info!(
            rows = self.row_count(),
            columns = self.column_count(),
            "wrote table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{init_test_logging, TEST_DATA};
    use anyhow::Result;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn table_from(content: &str) -> Table {
        Table::from_reader(Cursor::new(content)).unwrap().0
    }

    #[test]
    fn test_write_to_joins_fields() -> Result<()> {
        let table = table_from("\nname,age\n\nAlice,25\nBob,30\r\n");
        let mut out = Vec::new();
        table.write_to(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "name,age\nAlice,25\nBob,30\n");
        Ok(())
    }

    #[test]
    fn test_write_does_not_requote() -> Result<()> {
        let table = table_from("a,b\n\"x,y\",z\n");
        let mut out = Vec::new();
        table.write_to(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "a,b\nx,y,z\n");
        Ok(())
    }

    #[test]
    fn test_empty_table_writes_blank_header() -> Result<()> {
        let mut out = Vec::new();
        Table::new().write_to(&mut out)?;
        assert_eq!(out, b"\n");
        Ok(())
    }

    #[test]
    fn test_round_trip_through_file() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let src = dir.path().join("in.csv");
        fs::write(&src, format!("\n{}\nbad,row\n", TEST_DATA))?;

        let (first, _) = Table::from_path(&src)?;
        let out = dir.path().join("out.csv");
        first.write(&out)?;

        let (second, report) = Table::from_path(&out)?;
        assert_eq!(second, first);
        assert_eq!(second.row_count(), 5);
        assert_eq!(second.column_count(), 4);
        assert_eq!(report.rows_skipped, 0);
        assert_eq!(fs::read_to_string(&out)?, TEST_DATA);

        // no temp file left behind
        let leftovers: Vec<_> = fs::read_dir(dir.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("out.csv");
        fs::write(&out, "stale,content\n1,2\n3,4\n")?;

        table_from("x\n1\n").write(&out)?;
        assert_eq!(fs::read_to_string(&out)?, "x\n1\n");
        Ok(())
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_rename_removes_temp_file() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let target = dir.path().join("target_is_dir");
        fs::create_dir(&target)?;
        fs::write(target.join("keep.csv"), "x\n")?;

        let err = table_from(TEST_DATA).write(&target).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert_eq!(dir_entries(dir.path()), vec!["target_is_dir"]);
        assert_eq!(fs::read_to_string(target.join("keep.csv"))?, "x\n");
        Ok(())
    }

    #[test]
    fn test_existing_dot_tmp_file_untouched() -> Result<()> {
        let dir = tempdir()?;
        let squatter = dir.path().join(".out.csv.tmp");
        fs::write(&squatter, "not mine\n")?;

        table_from("x\n1\n").write(dir.path().join("out.csv"))?;
        assert_eq!(fs::read_to_string(&squatter)?, "not mine\n");
        assert_eq!(dir_entries(dir.path()), vec![".out.csv.tmp", "out.csv"]);
        Ok(())
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("no_such_dir").join("out.csv");
        let err = table_from(TEST_DATA).write(&out).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(!out.exists());
    }
}
