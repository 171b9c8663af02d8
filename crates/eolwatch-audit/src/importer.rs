//! Component inventory import from CSV.
//!
//! Accepts comma- or semicolon-separated files, with or without a UTF-8
//! BOM, and a handful of header synonyms so spreadsheets exported by
//! different teams load without editing.

use std::fs;
use std::path::Path;

use eolwatch_core::types::Component;

use crate::error::{AuditError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SNIFF_BYTES: usize = 2048;
const MISSING_NAME: &str = "(n/a)";

const PRODUCT_HEADERS: &[&str] = &["product", "os", "produit"];
const VERSION_HEADERS: &[&str] = &["version", "cycle", "version_os"];
const NAME_HEADERS: &[&str] = &["name", "hostname", "machine", "composant"];

/// Read the component inventory at `path`.
///
/// Rows without a product or a version are skipped. Products are
/// lowercased; a missing name becomes `(n/a)`.
pub fn read_components(path: &Path) -> Result<Vec<Component>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AuditError::CsvNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(AuditError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());
    let delimiter = sniff_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let columns = |names: &[&str]| -> Vec<usize> {
        names
            .iter()
            .filter_map(|name| headers.iter().position(|h| h == name))
            .collect()
    };
    let product_cols = columns(PRODUCT_HEADERS);
    let version_cols = columns(VERSION_HEADERS);
    let name_cols = columns(NAME_HEADERS);

    let mut components = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let pick = |cols: &[usize]| {
            cols.iter()
                .filter_map(|&i| record.get(i))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(String::from)
        };

        let (Some(product), Some(version)) = (pick(&product_cols), pick(&version_cols)) else {
            tracing::debug!(row = index + 2, "Skipping row without product or version");
            continue;
        };

        components.push(Component {
            name: pick(&name_cols).unwrap_or_else(|| MISSING_NAME.to_string()),
            product: product.to_lowercase(),
            version,
        });
    }

    tracing::info!(
        path = %path.display(),
        delimiter = %char::from(delimiter),
        components = components.len(),
        "Component inventory loaded"
    );
    Ok(components)
}

/// Pick `;` or `,` from the start of the file. A candidate must appear on
/// the header line; among those, the one whose per-line count holds on the
/// most sample lines wins. Defaults to comma.
fn sniff_delimiter(content: &[u8]) -> u8 {
    let sample = &content[..content.len().min(SNIFF_BYTES)];
    let sample = match std::str::from_utf8(sample) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default(),
    };

    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if content.len() > SNIFF_BYTES && lines.len() > 1 {
        // last line may be cut short
        lines.pop();
    }
    let Some((header, rest)) = lines.split_first() else {
        return b',';
    };

    [b',', b';']
        .into_iter()
        .filter_map(|delim| {
            let expected = count_unquoted(header, delim);
            if expected == 0 {
                return None;
            }
            let consistent = rest
                .iter()
                .filter(|line| count_unquoted(line, delim) == expected)
                .count();
            Some((delim, consistent, expected))
        })
        .max_by_key(|&(_, consistent, expected)| (consistent, expected))
        .map(|(delim, _, _)| delim)
        .unwrap_or(b',')
}

fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    line.bytes()
        .filter(|&b| {
            if b == b'"' {
                in_quotes = !in_quotes;
            }
            !in_quotes && b == delim
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn comma_and_semicolon_agree() {
        let dir = tempfile::tempdir().unwrap();
        let comma = write(&dir, "c.csv", b"name,product,version\nWMS-DB,MySQL,5.7\nWMS-APP,python,3.8\n");
        let semi = write(&dir, "s.csv", b"name;product;version\nWMS-DB;MySQL;5.7\nWMS-APP;python;3.8\n");

        let a = read_components(&comma).unwrap();
        let b = read_components(&semi).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].product, "mysql");
        assert_eq!(a[0].name, "WMS-DB");
    }

    #[test]
    fn header_synonyms_and_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "fr.csv",
            b"Machine;OS;Version_OS\nDC01;windows-server;2019\n;ubuntu;22.04\n",
        );

        let rows = read_components(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "DC01");
        assert_eq!(rows[0].product, "windows-server");
        assert_eq!(rows[0].version, "2019");
        assert_eq!(rows[1].name, "(n/a)");
    }

    #[test]
    fn first_non_empty_synonym_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "mix.csv", b"product,os,version,cycle\n,debian,,12\nnginx,,1.24,\n");

        let rows = read_components(&path).unwrap();
        assert_eq!(rows[0].product, "debian");
        assert_eq!(rows[0].version, "12");
        assert_eq!(rows[1].product, "nginx");
        assert_eq!(rows[1].version, "1.24");
    }

    #[test]
    fn bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bom.csv", b"\xEF\xBB\xBFproduct,version\npostgresql,13\n");

        let rows = read_components(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product, "postgresql");
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "gaps.csv", b"name,product,version\na,mysql,\nb,,8.0\nc,mysql,8.0\nd\n");

        let rows = read_components(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "c");
    }

    #[test]
    fn quoted_commas_do_not_confuse_sniffing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "q.csv",
            b"name;product;version\n\"web, front\";nginx;1.24\n\"db, main\";mysql;8.0\n",
        );

        let rows = read_components(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "web, front");
    }

    #[test]
    fn missing_file() {
        let err = read_components(Path::new("/nonexistent/components.csv")).unwrap_err();
        assert!(matches!(err, AuditError::CsvNotFound(_)));
    }

    #[test]
    fn sniffer_defaults_to_comma() {
        assert_eq!(sniff_delimiter(b"product\nmysql\n"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3\n"), b';');
    }
}
