//! # Dataset Reader
//!
//! Recovers item `i` in O(1) index lookups plus an O(length) data read by
//! slicing ``data[offsets[i] * width .. offsets[i + 1] * width]``.

use crate::dataset::{ElementType, INDEX_MAGIC, INDEX_VERSION};
use crate::types::TokenType;
use anyhow::{bail, ensure, Context};
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

/// Read-only view of a finalized indexed binary dataset.
#[derive(Debug)]
pub struct IndexedDataset<T: TokenType> {
    data: Vec<u8>,
    element_type: ElementType,
    offsets: Vec<u64>,
    sizes: Vec<u64>,
    _marker: PhantomData<T>,
}

impl<T: TokenType> IndexedDataset<T> {
    /// Open a dataset from its data blob and index artifact.
    pub fn open<P, Q>(
        data_path: P,
        index_path: Q,
    ) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let index_path = index_path.as_ref();
        let file = std::fs::File::open(index_path)
            .with_context(|| format!("opening dataset index {}", index_path.display()))?;
        let mut index = std::io::BufReader::new(file);

        let mut magic = [0u8; 8];
        index.read_exact(&mut magic)?;
        if &magic != INDEX_MAGIC {
            bail!(
                "{}: not a dataset index (bad magic {:?})",
                index_path.display(),
                magic
            );
        }

        let version = read_u64(&mut index)?;
        ensure!(
            version == INDEX_VERSION,
            "{}: unsupported index version {}",
            index_path.display(),
            version
        );

        let element_type = ElementType::from_code(read_u64(&mut index)?)
            .with_context(|| format!("reading {}", index_path.display()))?;
        let width = read_u64(&mut index)? as usize;
        ensure!(
            width == element_type.width(),
            "{}: element size {} does not match dtype width {}",
            index_path.display(),
            width,
            element_type.width()
        );

        let item_count = read_u64(&mut index)? as usize;
        let element_count = read_u64(&mut index)?;

        let mut offsets = Vec::with_capacity(item_count + 1);
        for _ in 0..item_count + 1 {
            offsets.push(read_u64(&mut index)?);
        }
        let mut sizes = Vec::with_capacity(item_count);
        for _ in 0..item_count {
            sizes.push(read_u64(&mut index)?);
        }

        ensure!(
            offsets[0] == 0 && *offsets.last().unwrap() == element_count,
            "{}: offset table does not span the element count",
            index_path.display()
        );

        let data_path = data_path.as_ref();
        let data = std::fs::read(data_path)
            .with_context(|| format!("reading dataset blob {}", data_path.display()))?;
        ensure!(
            data.len() as u64 == element_count * width as u64,
            "{}: blob is {} bytes, index declares {}",
            data_path.display(),
            data.len(),
            element_count * width as u64
        );

        Ok(Self {
            data,
            element_type,
            offsets,
            sizes,
            _marker: PhantomData,
        })
    }

    /// The number of items in the dataset.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns `true` if the dataset contains no items.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The total number of elements across all items.
    pub fn element_count(&self) -> u64 {
        *self.offsets.last().unwrap()
    }

    /// The element storage type of the data blob.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The element count of item `i`.
    pub fn size(
        &self,
        i: usize,
    ) -> anyhow::Result<usize> {
        ensure!(i < self.len(), "item index {} out of range ({})", i, self.len());
        Ok(self.sizes[i] as usize)
    }

    /// Decode item `i` back into its integer sequence.
    pub fn get(
        &self,
        i: usize,
    ) -> anyhow::Result<Vec<T>> {
        ensure!(i < self.len(), "item index {} out of range ({})", i, self.len());

        let width = self.element_type.width();
        let start = self.offsets[i] as usize * width;
        let end = self.offsets[i + 1] as usize * width;
        let bytes = &self.data[start..end];

        bytes
            .chunks_exact(width)
            .map(|chunk| {
                let v = match self.element_type {
                    ElementType::U16 => {
                        u16::from_le_bytes(chunk.try_into().unwrap()) as u64
                    }
                    ElementType::U32 => {
                        u32::from_le_bytes(chunk.try_into().unwrap()) as u64
                    }
                    ElementType::U64 => u64::from_le_bytes(chunk.try_into().unwrap()),
                };
                T::from_u64(v).with_context(|| format!("element {} out of token range", v))
            })
            .collect()
    }
}

fn read_u64<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
