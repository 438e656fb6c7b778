use std::{
    io::{Error, ErrorKind, Result},
    sync::Mutex,
};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_COUNT, BLOCK_SIZE},
};

/// 测试用的内存磁盘
#[derive(Debug)]
pub struct MemDisk {
    bytes: Mutex<Vec<u8>>,
}

impl MemDisk {
    pub fn new() -> Self {
        Self {
            bytes: Mutex::new(vec![0; BLOCK_SIZE * BLOCK_COUNT]),
        }
    }

    /// 整盘快照，用于比较操作前后是否逐字节一致
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().unwrap().clone()
    }

    pub fn block(&self, block_id: usize) -> Block {
        let mut buf = [0; BLOCK_SIZE];
        self.read_block(block_id as u64, &mut buf).unwrap();
        buf
    }

    fn range(block_id: u64) -> Result<std::ops::Range<usize>> {
        let start = block_id as usize * BLOCK_SIZE;
        if block_id as usize >= BLOCK_COUNT {
            return Err(Error::new(ErrorKind::UnexpectedEof, "block out of range"));
        }
        Ok(start..start + BLOCK_SIZE)
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let range = Self::range(block_id)?;
        buf.copy_from_slice(&self.bytes.lock().unwrap()[range]);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let range = Self::range(block_id)?;
        self.bytes.lock().unwrap()[range].copy_from_slice(buf);
        Ok(())
    }
}
