use log::debug;
use serde::{Deserialize, Serialize};

use crate::fs::config::{DATA_AREA_START_BLOCK_ID, FREE_MAP_BYTES, LAST_BLOCK_ID};

/// 空闲块位图，第 i 位表示块 i 是否被占用（字节 i/8 的 1 << (i%8)）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBlockBitmap {
    bits: [u8; FREE_MAP_BYTES],
}

impl DataBlockBitmap {
    // 新位图只有超级块（块 0）被占用
    pub fn new() -> Self {
        let mut bitmap = Self::from_bytes([0; FREE_MAP_BYTES]);
        bitmap.set(0, true);
        bitmap
    }

    pub fn from_bytes(bits: [u8; FREE_MAP_BYTES]) -> Self {
        Self { bits }
    }

    pub fn as_bytes(&self) -> &[u8; FREE_MAP_BYTES] {
        &self.bits
    }

    pub fn is_used(&self, block_index: u8) -> bool {
        let byte_index = (block_index / 8) as usize;
        let bit_index = block_index % 8;
        self.bits[byte_index] & (1 << bit_index) != 0
    }

    fn set(&mut self, block_index: u8, used: bool) {
        let byte_index = (block_index / 8) as usize;
        let bit_index = block_index % 8;
        if used {
            self.bits[byte_index] |= 1 << bit_index;
        } else {
            self.bits[byte_index] &= !(1 << bit_index);
        }
    }

    /// 置位或清除 [start, start + size)，不做越界检查，调用方负责
    pub fn mark(&mut self, start: u8, size: u8, used: bool) {
        for block in start..start + size {
            self.set(block, used);
        }
    }

    /// [start, start + size) 是否都在数据区内且空闲
    pub fn is_range_free(&self, start: usize, size: usize) -> bool {
        if start < DATA_AREA_START_BLOCK_ID as usize || start + size > LAST_BLOCK_ID as usize + 1 {
            return false;
        }
        (start..start + size).all(|block| !self.is_used(block as u8))
    }

    /// 首次适配：返回能容纳 size 个连续空闲块的最小起始块号。
    /// size 为 0（目录）时不需要分配，返回 Some(0)。
    pub fn find_contiguous(&self, size: u8) -> Option<u8> {
        if size == 0 {
            return Some(0);
        }

        let last_start = (LAST_BLOCK_ID as usize + 1).checked_sub(size as usize)?;
        let found = (DATA_AREA_START_BLOCK_ID as usize..=last_start)
            .find(|&start| self.is_range_free(start, size as usize))
            .map(|start| start as u8);

        debug!("find_contiguous({}) -> {:?}", size, found);
        found
    }

    pub fn used_blocks(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }
}

impl Default for DataBlockBitmap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bitmap_reserves_superblock() {
        let bitmap = DataBlockBitmap::new();
        assert!(bitmap.is_used(0));
        assert_eq!(bitmap.used_blocks(), 1);
        assert_eq!(bitmap.as_bytes()[0], 0b0000_0001);
    }

    #[test]
    fn first_fit_skips_used_runs() {
        let mut bitmap = DataBlockBitmap::new();
        assert_eq!(bitmap.find_contiguous(3), Some(1));

        bitmap.mark(1, 3, true);
        bitmap.mark(6, 2, true);
        // 4..6 只有两块，放不下 3 块
        assert_eq!(bitmap.find_contiguous(2), Some(4));
        assert_eq!(bitmap.find_contiguous(3), Some(8));
    }

    #[test]
    fn zero_size_needs_no_allocation() {
        let mut bitmap = DataBlockBitmap::new();
        bitmap.mark(1, 127, true);
        assert_eq!(bitmap.find_contiguous(0), Some(0));
    }

    #[test]
    fn no_space_for_long_run() {
        let mut bitmap = DataBlockBitmap::new();
        assert_eq!(bitmap.find_contiguous(127), Some(1));
        bitmap.mark(64, 1, true);
        assert_eq!(bitmap.find_contiguous(64), None);
        assert_eq!(bitmap.find_contiguous(63), Some(1));
        assert_eq!(bitmap.find_contiguous(128), None);
    }

    #[test]
    fn mark_sets_bits_in_byte_order() {
        let mut bitmap = DataBlockBitmap::new();
        bitmap.mark(7, 3, true);
        assert_eq!(bitmap.as_bytes()[0], 0b1000_0001);
        assert_eq!(bitmap.as_bytes()[1], 0b0000_0011);

        bitmap.mark(8, 1, false);
        assert_eq!(bitmap.as_bytes()[1], 0b0000_0010);
        assert!(bitmap.is_used(9));
        assert!(!bitmap.is_used(8));
    }

    #[test]
    fn range_free_respects_disk_end() {
        let bitmap = DataBlockBitmap::new();
        assert!(bitmap.is_range_free(120, 8));
        assert!(!bitmap.is_range_free(120, 9));
        assert!(!bitmap.is_range_free(0, 1));
    }
}
