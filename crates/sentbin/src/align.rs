//! # Alignment Frequency Aggregation
//!
//! Consumes a parallel source file, target file, and an alignment
//! annotation (one line of whitespace-separated ``"i-j"`` position pairs
//! per sentence pair) in lockstep, accumulates a co-occurrence frequency
//! table over resolved token indices, and reduces it to one best target
//! index per source index.
//!
//! Determinism: the argmax takes the highest count, ties broken by the
//! SMALLEST target index, and the reduced table is emitted in ascending
//! source-index order.

use crate::dictionary::Dictionary;
use crate::tokenizer::LineTokenizer;
use crate::types::{PairFreqMap, TokenType};
use anyhow::{bail, ensure, Context};
use core::cmp::Reverse;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Build the alignment frequency table from three parallel files.
///
/// See [`alignment_frequencies_from_readers`].
pub fn alignment_frequencies_from_paths<T, K, P, Q, A>(
    src_path: P,
    tgt_path: Q,
    align_path: A,
    src_dict: &Dictionary<T>,
    tgt_dict: &Dictionary<T>,
    tokenizer: &K,
) -> anyhow::Result<PairFreqMap<T>>
where
    T: TokenType,
    K: LineTokenizer,
    P: AsRef<Path>,
    Q: AsRef<Path>,
    A: AsRef<Path>,
{
    let open = |path: &Path| -> anyhow::Result<BufReader<std::fs::File>> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(BufReader::new(file))
    };

    let align_path = align_path.as_ref();
    alignment_frequencies_from_readers(
        open(src_path.as_ref())?,
        open(tgt_path.as_ref())?,
        open(align_path)?,
        src_dict,
        tgt_dict,
        tokenizer,
    )
    .with_context(|| format!("aggregating alignments from {}", align_path.display()))
}

/// Build the alignment frequency table from three lockstep line readers.
///
/// Per record: both sides are tokenized without vocabulary extension, the
/// alignment line is parsed as 0-based ``"srcPos-tgtPos"`` pairs into the
/// tokenized lines (before end-of-sequence is appended), and each resolved
/// ``(srcIdx, tgtIdx)`` pair is counted.
///
/// Fatal conditions, never silently skipped:
/// - the three streams have different record counts,
/// - a malformed or out-of-range position pair,
/// - a position resolving to a pad or end-of-sequence index (upstream data
///   corruption).
///
/// Pairs touching an unknown index on either side are skipped and not
/// counted.
pub fn alignment_frequencies_from_readers<T, K, RS, RT, RA>(
    src_reader: RS,
    tgt_reader: RT,
    align_reader: RA,
    src_dict: &Dictionary<T>,
    tgt_dict: &Dictionary<T>,
    tokenizer: &K,
) -> anyhow::Result<PairFreqMap<T>>
where
    T: TokenType,
    K: LineTokenizer,
    RS: BufRead,
    RT: BufRead,
    RA: BufRead,
{
    let mut src_lines = src_reader.lines();
    let mut tgt_lines = tgt_reader.lines();
    let mut align_lines = align_reader.lines();

    let mut freq = PairFreqMap::<T>::default();
    let mut line_no = 0u64;

    loop {
        line_no += 1;
        let (src_line, tgt_line, align_line) =
            match (src_lines.next(), tgt_lines.next(), align_lines.next()) {
                (None, None, None) => break,
                (Some(s), Some(t), Some(a)) => (s?, t?, a?),
                _ => bail!(
                    "line {}: source, target, and alignment files disagree on record count",
                    line_no
                ),
            };

        let src_tokens: Vec<T> = tokenizer
            .split(&src_line)
            .into_iter()
            .map(|word| src_dict.lookup(word))
            .collect();
        let tgt_tokens: Vec<T> = tokenizer
            .split(&tgt_line)
            .into_iter()
            .map(|word| tgt_dict.lookup(word))
            .collect();

        for pair in align_line.split_whitespace() {
            let (i, j) = pair
                .split_once('-')
                .with_context(|| format!("line {}: malformed alignment pair {:?}", line_no, pair))?;
            let i: usize = i
                .parse()
                .with_context(|| format!("line {}: malformed alignment pair {:?}", line_no, pair))?;
            let j: usize = j
                .parse()
                .with_context(|| format!("line {}: malformed alignment pair {:?}", line_no, pair))?;

            ensure!(
                i < src_tokens.len(),
                "line {}: source position {} out of range ({} words)",
                line_no,
                i,
                src_tokens.len()
            );
            ensure!(
                j < tgt_tokens.len(),
                "line {}: target position {} out of range ({} words)",
                line_no,
                j,
                tgt_tokens.len()
            );

            let src_idx = src_tokens[i];
            let tgt_idx = tgt_tokens[j];

            if src_idx == src_dict.unk() || tgt_idx == tgt_dict.unk() {
                continue;
            }
            ensure!(
                src_idx != src_dict.pad() && src_idx != src_dict.eos(),
                "line {}: source position {} resolves to a control symbol",
                line_no,
                i
            );
            ensure!(
                tgt_idx != tgt_dict.pad() && tgt_idx != tgt_dict.eos(),
                "line {}: target position {} resolves to a control symbol",
                line_no,
                j
            );

            *freq.entry(src_idx).or_default().entry(tgt_idx).or_default() += 1;
        }
    }

    Ok(freq)
}

/// Reduce a frequency table to one ``(source, target)`` index pair per
/// source index.
///
/// Per source index the most frequent co-occurring target index wins;
/// equal counts break to the smallest target index. Results are ordered by
/// ascending source index.
pub fn best_alignment<T: TokenType>(freq: &PairFreqMap<T>) -> Vec<(T, T)> {
    let mut sources: Vec<T> = freq.keys().copied().collect();
    sources.sort_unstable();

    sources
        .into_iter()
        .map(|src| {
            let candidates = &freq[&src];
            let (&tgt, _) = candidates
                .iter()
                .max_by_key(|(&tgt, &count)| (count, Reverse(tgt)))
                .expect("frequency entries are never empty");
            (src, tgt)
        })
        .collect()
}

/// Write a best-alignment table to a file.
///
/// See [`write_alignment_to_writer`].
pub fn write_alignment_to_path<T, P>(
    pairs: &[(T, T)],
    src_dict: &Dictionary<T>,
    tgt_dict: &Dictionary<T>,
    path: P,
) -> anyhow::Result<()>
where
    T: TokenType,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating alignment output {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_alignment_to_writer(pairs, src_dict, tgt_dict, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write one ``"<srcSymbol> <tgtSymbol>"`` line per resolved pair.
pub fn write_alignment_to_writer<T, W>(
    pairs: &[(T, T)],
    src_dict: &Dictionary<T>,
    tgt_dict: &Dictionary<T>,
    writer: &mut W,
) -> anyhow::Result<()>
where
    T: TokenType,
    W: Write,
{
    for &(src, tgt) in pairs {
        let src_symbol = src_dict
            .symbol(src)
            .with_context(|| format!("source index {:?} out of dictionary range", src))?;
        let tgt_symbol = tgt_dict
            .symbol(tgt)
            .with_context(|| format!("target index {:?} out of dictionary range", tgt))?;
        writeln!(writer, "{} {}", src_symbol, tgt_symbol)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;
    use std::io::Cursor;

    fn dict_over(corpus: &str) -> Dictionary<u32> {
        let mut dict =
            Dictionary::<u32>::build_from_reader(Cursor::new(corpus), &WhitespaceTokenizer)
                .unwrap();
        dict.finalize(0, -1);
        dict
    }

    fn frequencies(
        src: &str,
        tgt: &str,
        align: &str,
        src_dict: &Dictionary<u32>,
        tgt_dict: &Dictionary<u32>,
    ) -> anyhow::Result<PairFreqMap<u32>> {
        alignment_frequencies_from_readers(
            Cursor::new(src),
            Cursor::new(tgt),
            Cursor::new(align),
            src_dict,
            tgt_dict,
            &WhitespaceTokenizer,
        )
    }

    #[test]
    fn test_aggregation_and_tie_break() {
        let src_dict = dict_over("a b\n");
        let tgt_dict = dict_over("x y\n");

        let freq = frequencies("a b\n", "x y\n", "0-0 0-1 1-1\n", &src_dict, &tgt_dict)
            .unwrap();

        let a = src_dict.index("a").unwrap();
        let b = src_dict.index("b").unwrap();
        let x = tgt_dict.index("x").unwrap();
        let y = tgt_dict.index("y").unwrap();

        // Pairs counted: a-x once, a-y once, b-y once.
        assert_eq!(freq[&a][&x], 1);
        assert_eq!(freq[&a][&y], 1);
        assert_eq!(freq[&b][&y], 1);
        assert_eq!(freq[&a].len(), 2);
        assert_eq!(freq.len(), 2);

        // a's counts tie; the smaller target index (x) wins.
        assert!(x < y);
        assert_eq!(best_alignment(&freq), vec![(a, x), (b, y)]);
    }

    #[test]
    fn test_majority_wins() {
        let src_dict = dict_over("a\n");
        let tgt_dict = dict_over("x y\n");

        let freq = frequencies(
            "a\na\na\n",
            "x y\ny x\ny x\n",
            "0-0\n0-0\n0-0\n",
            &src_dict,
            &tgt_dict,
        )
        .unwrap();

        let a = src_dict.index("a").unwrap();
        let y = tgt_dict.index("y").unwrap();

        // y observed twice, x once.
        assert_eq!(best_alignment(&freq), vec![(a, y)]);
    }

    #[test]
    fn test_unknown_pairs_are_skipped() {
        let src_dict = dict_over("a\n");
        let tgt_dict = dict_over("x\n");

        let freq = frequencies("a oov\n", "x\n", "0-0 1-0\n", &src_dict, &tgt_dict).unwrap();

        let a = src_dict.index("a").unwrap();
        assert_eq!(freq.len(), 1);
        assert_eq!(freq[&a].len(), 1);
    }

    #[test]
    fn test_record_count_mismatch_is_fatal() {
        let src_dict = dict_over("a\n");
        let tgt_dict = dict_over("x\n");

        let err = frequencies("a\na\n", "x\n", "0-0\n0-0\n", &src_dict, &tgt_dict)
            .unwrap_err();
        assert!(err.to_string().contains("disagree on record count"));
    }

    #[test]
    fn test_malformed_pair_is_fatal() {
        let src_dict = dict_over("a\n");
        let tgt_dict = dict_over("x\n");

        let err = frequencies("a\n", "x\n", "0:0\n", &src_dict, &tgt_dict).unwrap_err();
        assert!(err.to_string().contains("malformed alignment pair"));
    }

    #[test]
    fn test_position_out_of_range_is_fatal() {
        let src_dict = dict_over("a\n");
        let tgt_dict = dict_over("x\n");

        let err = frequencies("a\n", "x\n", "0-3\n", &src_dict, &tgt_dict).unwrap_err();
        assert!(err.to_string().contains("target position 3 out of range"));
    }

    #[test]
    fn test_control_symbol_resolution_is_fatal() {
        let src_dict = dict_over("a </s>\n");
        let tgt_dict = dict_over("x\n");

        // "</s>" in the raw text resolves to the reserved eos index.
        let err = frequencies("a </s>\n", "x\n", "1-0\n", &src_dict, &tgt_dict).unwrap_err();
        assert!(err.to_string().contains("control symbol"));
    }

    #[test]
    fn test_write_alignment() {
        let src_dict = dict_over("a b\n");
        let tgt_dict = dict_over("x y\n");

        let pairs = vec![
            (src_dict.index("a").unwrap(), tgt_dict.index("x").unwrap()),
            (src_dict.index("b").unwrap(), tgt_dict.index("y").unwrap()),
        ];

        let mut buf = Vec::new();
        write_alignment_to_writer(&pairs, &src_dict, &tgt_dict, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a x\nb y\n");
    }
}
