//! # Dictionary IO
//!
//! Text format: one ``"<symbol> <count>"`` line per retained non-reserved
//! symbol, in index order. The reserved symbols are implicit; on load they
//! are re-created at their fixed indices before any file entries, so a
//! reloaded dictionary reproduces the exact numbering used at save time.

use crate::dictionary::Dictionary;
use crate::types::TokenType;
use anyhow::{bail, Context};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Load a [`Dictionary`] from a persisted listing file.
///
/// # Arguments
/// * `path` - the path to the dictionary file.
pub fn load_dictionary_from_path<T, P>(path: P) -> anyhow::Result<Dictionary<T>>
where
    T: TokenType,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening dictionary {}", path.display()))?;

    let mut dict = Dictionary::new();
    update_dictionary_from_reader(&mut dict, BufReader::new(file))
        .with_context(|| format!("loading dictionary {}", path.display()))?;

    Ok(dict)
}

/// Extend a [`Dictionary`] from a ``"<symbol> <count>"`` line reader.
///
/// Entries are assigned indices in stream order. A line with the wrong
/// field count or an unparsable count is a fatal format error; a symbol
/// already present (including a reserved symbol) is a fatal consistency
/// error. Malformed input is never silently skipped.
pub fn update_dictionary_from_reader<T, R>(
    dict: &mut Dictionary<T>,
    reader: R,
) -> anyhow::Result<()>
where
    T: TokenType,
    R: BufRead,
{
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 2 {
            bail!(
                "line {}: expected \"<symbol> <count>\", got {:?}",
                line_no,
                line
            );
        }

        let symbol = fields[0];
        let count: u64 = fields[1]
            .parse()
            .with_context(|| format!("line {}: malformed count {:?}", line_no, fields[1]))?;

        if dict.index(symbol).is_some() {
            bail!("line {}: duplicate symbol {:?}", line_no, symbol);
        }
        dict.push_entry(symbol, count);
    }
    Ok(())
}

/// Save a [`Dictionary`] to a listing file.
///
/// # Arguments
/// * `dict` - the dictionary to save; expected to be finalized.
/// * `path` - the path to save the dictionary to.
pub fn save_dictionary_to_path<T, P>(
    dict: &Dictionary<T>,
    path: P,
) -> anyhow::Result<()>
where
    T: TokenType,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating dictionary {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    save_dictionary_to_writer(dict, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Save a [`Dictionary`] to a [`Write`] writer.
///
/// Writes the retained non-reserved entries in index order; the reserved
/// symbols are not listed.
pub fn save_dictionary_to_writer<T, W>(
    dict: &Dictionary<T>,
    writer: &mut W,
) -> anyhow::Result<()>
where
    T: TokenType,
    W: Write,
{
    for (symbol, count) in dict.iter_retained() {
        writeln!(writer, "{} {}", symbol, count)?;
    }
    Ok(())
}
