use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::SUPER_BLOCK_BLOCK_ID, data_block_bitmap::DataBlockBitmap, error::Result,
        inode_table::InodeTable,
    },
};

/// 块 0 的完整镜像：16 字节空闲块位图 + 126 条 8 字节 inode 记录 = 1024 字节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub free_block_list: DataBlockBitmap,
    pub inode_table: InodeTable,
}

impl SuperBlock {
    /// 空文件系统：只有块 0 被占用，所有 inode 空闲
    pub fn new() -> Self {
        Self {
            free_block_list: DataBlockBitmap::new(),
            inode_table: InodeTable::new(),
        }
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        Ok(bincode::deserialize(block)?)
    }

    pub fn to_block(&self) -> Result<Block> {
        let bytes = bincode::serialize(self)?;
        let mut block = [0u8; BLOCK_SIZE];
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(block)
    }

    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut block)?;
        Self::from_block(&block)
    }

    /// 整块写回超级块
    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        let block = self.to_block()?;
        disk.write_block(SUPER_BLOCK_BLOCK_ID, &block)?;
        debug!(
            "superblock synced ({} blocks in use)",
            self.free_block_list.used_blocks()
        );
        Ok(())
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}
