//! # Dataset Builder
//!
//! Append-only writer for the data blob plus in-memory offset bookkeeping;
//! the index artifact is written once, by [`IndexedDatasetBuilder::finalize`].

use crate::dataset::{ElementType, INDEX_MAGIC, INDEX_VERSION};
use crate::types::TokenType;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

/// Append-only writer for an indexed binary dataset.
///
/// Items are persisted in append order. `finalize` consumes the builder,
/// so appending to a sealed dataset or finalizing twice cannot compile;
/// a crash before `finalize` leaves no index artifact, which is the
/// crash-safety boundary.
#[derive(Debug)]
pub struct IndexedDatasetBuilder<T: TokenType> {
    data: BufWriter<File>,
    element_type: ElementType,

    /// Prefix sums of item lengths; always starts at 0.
    offsets: Vec<u64>,

    /// Per-item element counts.
    sizes: Vec<u64>,

    _marker: PhantomData<T>,
}

impl<T: TokenType> IndexedDatasetBuilder<T> {
    /// Create a builder writing 4-byte elements to `data_path`.
    pub fn create<P: AsRef<Path>>(data_path: P) -> anyhow::Result<Self> {
        Self::create_with_element_type(data_path, ElementType::U32)
    }

    /// Create a builder with an explicit element storage type.
    pub fn create_with_element_type<P: AsRef<Path>>(
        data_path: P,
        element_type: ElementType,
    ) -> anyhow::Result<Self> {
        let path = data_path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("creating dataset blob {}", path.display()))?;

        Ok(Self {
            data: BufWriter::new(file),
            element_type,
            offsets: vec![0],
            sizes: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// The element storage type of the data blob.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The number of items appended so far.
    pub fn item_count(&self) -> usize {
        self.sizes.len()
    }

    /// The total number of elements appended so far.
    pub fn element_count(&self) -> u64 {
        *self.offsets.last().unwrap()
    }

    /// Append one integer sequence to the dataset.
    ///
    /// Empty sequences are valid items. Elements that do not fit the
    /// declared storage width are a fatal error.
    pub fn add_item(
        &mut self,
        item: &[T],
    ) -> anyhow::Result<()> {
        for &element in item {
            let v = element
                .to_u64()
                .context("element does not fit u64 storage")?;
            match self.element_type {
                ElementType::U16 => {
                    let v = u16::try_from(v)
                        .with_context(|| format!("element {} does not fit u16 storage", v))?;
                    self.data.write_all(&v.to_le_bytes())?;
                }
                ElementType::U32 => {
                    let v = u32::try_from(v)
                        .with_context(|| format!("element {} does not fit u32 storage", v))?;
                    self.data.write_all(&v.to_le_bytes())?;
                }
                ElementType::U64 => {
                    self.data.write_all(&v.to_le_bytes())?;
                }
            }
        }

        let len = item.len() as u64;
        self.offsets.push(self.element_count() + len);
        self.sizes.push(len);
        Ok(())
    }

    /// Seal the dataset: flush the data blob and write the index artifact.
    ///
    /// Consumes the builder; the dataset is immutable afterwards.
    pub fn finalize<P: AsRef<Path>>(
        mut self,
        index_path: P,
    ) -> anyhow::Result<()> {
        self.data.flush().context("flushing dataset blob")?;

        let path = index_path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("creating dataset index {}", path.display()))?;
        let mut index = BufWriter::new(file);

        index.write_all(INDEX_MAGIC)?;
        write_u64(&mut index, INDEX_VERSION)?;
        write_u64(&mut index, self.element_type.code())?;
        write_u64(&mut index, self.element_type.width() as u64)?;
        write_u64(&mut index, self.item_count() as u64)?;
        write_u64(&mut index, self.element_count())?;
        for &offset in &self.offsets {
            write_u64(&mut index, offset)?;
        }
        for &size in &self.sizes {
            write_u64(&mut index, size)?;
        }
        index.flush()?;

        log::info!(
            "finalized dataset {}: {} items, {} elements",
            path.display(),
            self.item_count(),
            self.element_count()
        );
        Ok(())
    }
}

fn write_u64<W: Write>(
    writer: &mut W,
    value: u64,
) -> std::io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_prefix_sums() {
        tempdir::TempDir::new("builder_test")
            .and_then(|dir| {
                let mut builder =
                    IndexedDatasetBuilder::<u32>::create(dir.path().join("d.bin")).unwrap();

                builder.add_item(&[4, 5, 6]).unwrap();
                builder.add_item(&[]).unwrap();
                builder.add_item(&[7]).unwrap();

                assert_eq!(builder.item_count(), 3);
                assert_eq!(builder.element_count(), 4);
                assert_eq!(builder.offsets, vec![0, 3, 3, 4]);
                assert_eq!(builder.sizes, vec![3, 0, 1]);

                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_element_overflow_is_fatal() {
        tempdir::TempDir::new("builder_test")
            .and_then(|dir| {
                let mut builder = IndexedDatasetBuilder::<u32>::create_with_element_type(
                    dir.path().join("d.bin"),
                    ElementType::U16,
                )
                .unwrap();

                let err = builder.add_item(&[1 << 20]).unwrap_err();
                assert!(err.to_string().contains("does not fit u16"));

                Ok(())
            })
            .unwrap();
    }
}
