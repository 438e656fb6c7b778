use std::fmt;

use log::debug;

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        error::{FileSystemError, Result},
        inode_table::InodeName,
        MountedDisk,
    },
};

/// 1KB 共享缓冲区，读块时被覆盖，写块时作为数据来源
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Block,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            data: [0; BLOCK_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// 写入最多 1024 字节，剩余部分补 0
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > BLOCK_SIZE {
            return Err(FileSystemError::BufferTooLarge(bytes.len()));
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.data[bytes.len()..].fill(0);
        Ok(())
    }

    pub fn as_block(&self) -> &Block {
        &self.data
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        f.debug_struct("Buffer").field("used", &used).finish()
    }
}

pub(crate) fn copy_block<D: BlockDevice>(disk: &D, from: usize, to: usize) -> Result<()> {
    let mut block = [0u8; BLOCK_SIZE];
    disk.read_block(from as u64, &mut block)?;
    disk.write_block(to as u64, &block)?;
    Ok(())
}

pub(crate) fn zero_blocks<D, I>(disk: &D, blocks: I) -> Result<()>
where
    D: BlockDevice,
    I: IntoIterator<Item = usize>,
{
    let zero = [0u8; BLOCK_SIZE];
    for block in blocks {
        disk.write_block(block as u64, &zero)?;
    }
    Ok(())
}

impl<D: BlockDevice> MountedDisk<D> {
    /// 解析当前目录下文件的第 block 块对应的绝对块号
    fn file_block(&self, name: &str, block: u32) -> Result<u64> {
        let inode_name = InodeName::new(name)?;
        let table = &self.super_block.inode_table;
        let index = table
            .find_file(self.cwd, &inode_name)
            .ok_or_else(|| FileSystemError::FileNotFound(name.to_string()))?;

        let inode = &table[index];
        if block >= inode.size() as u32 {
            return Err(FileSystemError::NoSuchBlock {
                name: name.to_string(),
                block,
            });
        }
        Ok(inode.start_block as u64 + block as u64)
    }

    pub fn read_file_block(&self, name: &str, block: u32, buffer: &mut Buffer) -> Result<()> {
        let block_id = self.file_block(name, block)?;
        self.disk.read_block(block_id, &mut buffer.data)?;
        debug!("read {} block {} (disk block {})", name, block, block_id);
        Ok(())
    }

    /// 直接写盘，不做缓存
    pub fn write_file_block(&self, name: &str, block: u32, buffer: &Buffer) -> Result<()> {
        let block_id = self.file_block(name, block)?;
        self.disk.write_block(block_id, &buffer.data)?;
        debug!("wrote {} block {} (disk block {})", name, block, block_id);
        Ok(())
    }
}
