//! Data pre-processing: create dictionaries and store corpus data in
//! binary format.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sentbin::align::{alignment_frequencies_from_paths, best_alignment, write_alignment_to_path};
use sentbin::binarize::binarize_path;
use sentbin::dataset::IndexedDatasetBuilder;
use sentbin::dictionary::{Dictionary, UNK_SYMBOL};
use sentbin::tokenizer::WhitespaceTokenizer;
use std::path::PathBuf;

/// Token index type of all emitted datasets.
type T = u32;

/// Output mode for encoded splits.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indexed binary dataset (`.bin` + `.idx`).
    Binary,
    /// Byte-for-byte copy of the input text.
    Raw,
}

/// Corpus pre-processing pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source language suffix.
    #[arg(short = 's', long, value_name = "SRC")]
    pub source_lang: String,

    /// Target language suffix.
    #[arg(short = 't', long, value_name = "TARGET")]
    pub target_lang: String,

    /// Train file prefix.
    #[arg(long, value_name = "FP", default_value = "train")]
    pub trainpref: String,

    /// Comma-separated validation file prefixes.
    #[arg(long, value_name = "FP", default_value = "valid")]
    pub validpref: String,

    /// Comma-separated test file prefixes.
    #[arg(long, value_name = "FP", default_value = "test")]
    pub testpref: String,

    /// Destination directory.
    #[arg(long, value_name = "DIR", default_value = "data-bin")]
    pub destdir: PathBuf,

    /// Map source words appearing less than threshold times to unknown.
    #[arg(long, value_name = "N", default_value = "0")]
    pub thresholdsrc: u64,

    /// Map target words appearing less than threshold times to unknown.
    #[arg(long, value_name = "N", default_value = "0")]
    pub thresholdtgt: u64,

    /// Reuse a given source dictionary instead of building one.
    #[arg(long, value_name = "FP")]
    pub srcdict: Option<PathBuf>,

    /// Reuse a given target dictionary instead of building one.
    #[arg(long, value_name = "FP")]
    pub tgtdict: Option<PathBuf>,

    /// Number of source words to retain (-1 = unlimited).
    #[arg(long, value_name = "N", default_value = "-1")]
    pub nwordssrc: isize,

    /// Number of target words to retain (-1 = unlimited).
    #[arg(long, value_name = "N", default_value = "-1")]
    pub nwordstgt: isize,

    /// Optional alignment annotation over the train split
    /// (one line of "srcPos-tgtPos" pairs per train sentence pair).
    #[arg(long, value_name = "ALIGN")]
    pub alignfile: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "binary")]
    pub output_format: OutputFormat,
}

impl Args {
    /// `<prefix>.<lang>` input corpus path.
    fn corpus_path(
        &self,
        prefix: &str,
        lang: &str,
    ) -> PathBuf {
        PathBuf::from(format!("{}.{}", prefix, lang))
    }

    /// `<destdir>/dict.<lang>.txt`.
    fn dict_path(
        &self,
        lang: &str,
    ) -> PathBuf {
        self.destdir.join(format!("dict.{}.txt", lang))
    }

    /// `<destdir>/<output_prefix>.<src>-<tgt>.<lang>.<ext>`.
    fn dataset_path(
        &self,
        output_prefix: &str,
        lang: &str,
        ext: &str,
    ) -> PathBuf {
        self.destdir.join(format!(
            "{}.{}-{}.{}.{}",
            output_prefix, self.source_lang, self.target_lang, lang, ext
        ))
    }
}

/// Build (or reuse) a language's dictionary, apply the retention policy,
/// and persist it to the destination directory.
fn prepare_dictionary(
    args: &Args,
    lang: &str,
    reuse: &Option<PathBuf>,
    threshold: u64,
    nwords: isize,
) -> anyhow::Result<()> {
    let mut dict = match reuse {
        Some(path) => Dictionary::<T>::load_from_path(path)?,
        None => Dictionary::<T>::build_from_path(
            args.corpus_path(&args.trainpref, lang),
            &WhitespaceTokenizer,
        )?,
    };
    dict.finalize(threshold, nwords);
    dict.save_to_path(args.dict_path(lang))?;

    log::info!("[{}] dictionary ready: {} symbols", lang, dict.len());
    Ok(())
}

/// Encode one (split, language) file into an indexed binary dataset.
fn make_binary_dataset(
    args: &Args,
    input_prefix: &str,
    output_prefix: &str,
    lang: &str,
) -> anyhow::Result<()> {
    // Reload the persisted dictionary so numbering is identical whether it
    // was freshly built or reused.
    let mut dict = Dictionary::<T>::load_from_path(args.dict_path(lang))?;
    println!("| [{}] Dictionary: {} types", lang, dict.len());

    let input_file = args.corpus_path(input_prefix, lang);
    let mut builder =
        IndexedDatasetBuilder::<T>::create(args.dataset_path(output_prefix, lang, "bin"))?;

    let stats = binarize_path(
        &input_file,
        &mut dict,
        &WhitespaceTokenizer,
        |item| builder.add_item(item),
        false,
    )?;
    builder.finalize(args.dataset_path(output_prefix, lang, "idx"))?;

    println!(
        "| [{}] {}: {} sents, {} tokens, {:.3}% replaced by {}",
        lang,
        input_file.display(),
        stats.sentences,
        stats.tokens,
        100.0 * stats.unknown_rate(),
        UNK_SYMBOL
    );
    Ok(())
}

/// Produce one (split, language) output in the selected format.
fn make_dataset(
    args: &Args,
    input_prefix: &str,
    output_prefix: &str,
    lang: &str,
) -> anyhow::Result<()> {
    match args.output_format {
        OutputFormat::Binary => make_binary_dataset(args, input_prefix, output_prefix, lang),
        OutputFormat::Raw => {
            let input = args.corpus_path(input_prefix, lang);
            let output = args.destdir.join(format!("{}.{}", output_prefix, lang));
            std::fs::copy(&input, &output).with_context(|| {
                format!("copying {} to {}", input.display(), output.display())
            })?;
            Ok(())
        }
    }
}

/// Aggregate the alignment annotation over the train split and write the
/// per-source best-alignment table.
fn make_alignment(
    args: &Args,
    alignfile: &PathBuf,
) -> anyhow::Result<()> {
    let src_dict = Dictionary::<T>::load_from_path(args.dict_path(&args.source_lang))?;
    let tgt_dict = Dictionary::<T>::load_from_path(args.dict_path(&args.target_lang))?;

    let freq = alignment_frequencies_from_paths(
        args.corpus_path(&args.trainpref, &args.source_lang),
        args.corpus_path(&args.trainpref, &args.target_lang),
        alignfile,
        &src_dict,
        &tgt_dict,
        &WhitespaceTokenizer,
    )?;
    let pairs = best_alignment(&freq);

    let output = args.destdir.join(format!(
        "alignment.{}-{}.txt",
        args.source_lang, args.target_lang
    ));
    write_alignment_to_path(&pairs, &src_dict, &tgt_dict, &output)?;

    println!("| Wrote {} alignments to {}", pairs.len(), output.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    println!("{:#?}", args);

    std::fs::create_dir_all(&args.destdir)
        .with_context(|| format!("creating {}", args.destdir.display()))?;

    prepare_dictionary(
        &args,
        &args.source_lang,
        &args.srcdict,
        args.thresholdsrc,
        args.nwordssrc,
    )?;
    prepare_dictionary(
        &args,
        &args.target_lang,
        &args.tgtdict,
        args.thresholdtgt,
        args.nwordstgt,
    )?;

    make_dataset(&args, &args.trainpref, "train", &args.source_lang)?;
    make_dataset(&args, &args.trainpref, "train", &args.target_lang)?;

    for (k, pref) in args.validpref.split(',').enumerate() {
        let outprefix = if k > 0 {
            format!("valid{}", k)
        } else {
            "valid".to_string()
        };
        make_dataset(&args, pref, &outprefix, &args.source_lang)?;
        make_dataset(&args, pref, &outprefix, &args.target_lang)?;
    }
    for (k, pref) in args.testpref.split(',').enumerate() {
        let outprefix = if k > 0 {
            format!("test{}", k)
        } else {
            "test".to_string()
        };
        make_dataset(&args, pref, &outprefix, &args.source_lang)?;
        make_dataset(&args, pref, &outprefix, &args.target_lang)?;
    }
    println!("| Wrote preprocessed data to {}", args.destdir.display());

    if let Some(alignfile) = &args.alignfile {
        make_alignment(&args, alignfile)?;
    }

    Ok(())
}
