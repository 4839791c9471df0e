use crate::error::{Error, Result};
use std::{fs, path::Path};

use toml_edit::{DocumentMut, Item, Table};

/// Reads a TOML file and returns its content as a DocumentMut.
pub fn read_toml(path: &Path) -> Result<DocumentMut> {
    let content = fs::read_to_string(path).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to read TOML file: {}", e),
    })?;

    Ok(content.parse::<DocumentMut>()?)
}

/// Returns the table at `section_path`, creating implicit tables on the way.
/// Non-table items found along the path are replaced.
pub fn ensure_table<'a>(doc: &'a mut DocumentMut, section_path: &[&str]) -> &'a mut Table {
    let mut current = doc.as_table_mut();

    for &section in section_path {
        let item = current.entry(section).or_insert_with(|| {
            let mut new_table = Table::new();
            new_table.set_implicit(true);
            Item::Table(new_table)
        });
        if !item.is_table() {
            *item = Item::Table(Table::new());
        }
        current = match item {
            Item::Table(table) => table,
            _ => unreachable!("item was just made a table"),
        };
    }

    current
}

/// Writes a TOML document to a file.
pub fn write_toml(path: &Path, doc: &DocumentMut) -> Result<()> {
    fs::write(path, doc.to_string()).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to write TOML file: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_table_creates_nested_sections() {
        let mut doc = "[project]\nname = \"demo\"\n".parse::<DocumentMut>().unwrap();
        ensure_table(&mut doc, &["tool", "whl2conda"]).insert("conda-name", toml_edit::value("x"));

        let rendered = doc.to_string();
        assert!(rendered.contains("[tool.whl2conda]"));
        assert!(!rendered.contains("[tool]\n"));
        assert!(rendered.contains("conda-name = \"x\""));
    }

    #[test]
    fn test_read_write_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pyproject.toml");
        fs::write(&path, "# keep me\n[tool.other]\nx = 1\n").unwrap();

        let doc = read_toml(&path).unwrap();
        write_toml(&path, &doc).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# keep me\n[tool.other]\nx = 1\n"
        );
    }

    #[test]
    fn test_read_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pyproject.toml");
        fs::write(&path, "[tool\n").unwrap();
        assert!(matches!(read_toml(&path), Err(Error::Toml(_))));
    }
}
