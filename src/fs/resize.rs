use std::cmp::Ordering;

use log::debug;

use crate::{
    disk::BlockDevice,
    fs::{
        config::MAX_FILE_BLOCKS,
        data_area::{copy_block, zero_blocks},
        error::{FileSystemError, Result},
        inode_table::InodeName,
        MountedDisk,
    },
};

impl<D: BlockDevice> MountedDisk<D> {
    /// 调整文件大小：
    /// - 变大时先尝试原地扩展，不行再整体搬到新的连续区域；
    /// - 变小时清零并释放尾部的块，起始块不变。
    pub fn resize(&mut self, name: &str, new_size: u32) -> Result<()> {
        if new_size > MAX_FILE_BLOCKS {
            return Err(FileSystemError::InvalidSize(new_size));
        }
        let inode_name = InodeName::new(name)?;
        let index = self
            .super_block
            .inode_table
            .find_file(self.cwd, &inode_name)
            .ok_or_else(|| FileSystemError::FileNotFound(name.to_string()))?;

        let inode = self.super_block.inode_table[index];
        let start = inode.start_block;
        let size = inode.size();
        let new_size = new_size as u8;

        let mut next = self.super_block.clone();
        match new_size.cmp(&size) {
            Ordering::Equal => return Ok(()),
            Ordering::Less => {
                zero_blocks(
                    &self.disk,
                    (start + new_size) as usize..(start + size) as usize,
                )?;
                next.free_block_list
                    .mark(start + new_size, size - new_size, false);
                debug!("shrank {} from {} to {} blocks", name, size, new_size);
            }
            Ordering::Greater => {
                let tail = (start + size) as usize;
                let grow = (new_size - size) as usize;

                if self.super_block.free_block_list.is_range_free(tail, grow) {
                    next.free_block_list
                        .mark(start + size, new_size - size, true);
                    debug!("grew {} in place to {} blocks", name, new_size);
                } else {
                    let new_start = self
                        .super_block
                        .free_block_list
                        .find_contiguous(new_size)
                        .ok_or_else(|| FileSystemError::CannotExpand {
                            name: name.to_string(),
                            size: new_size as u32,
                        })?;

                    for i in 0..size as usize {
                        copy_block(&self.disk, start as usize + i, new_start as usize + i)?;
                    }
                    zero_blocks(&self.disk, inode.block_range())?;

                    next.free_block_list.mark(start, size, false);
                    next.free_block_list.mark(new_start, new_size, true);
                    next.inode_table[index].start_block = new_start;
                    debug!(
                        "relocated {} from block {} to {} ({} blocks)",
                        name, start, new_start, new_size
                    );
                }
            }
        }

        next.inode_table[index].set_size(new_size);
        self.commit(next)
    }
}
