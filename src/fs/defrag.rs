use log::debug;

use crate::{
    disk::BlockDevice,
    fs::{
        config::DATA_AREA_START_BLOCK_ID,
        data_area::{copy_block, zero_blocks},
        error::Result,
        MountedDisk,
    },
};

impl<D: BlockDevice> MountedDisk<D> {
    /// 把所有文件按原起始块顺序依次挪到磁盘前部，去掉中间的空洞。
    /// 目录和大小为 0 的文件不占块，保持不动。
    pub fn defragment(&mut self) -> Result<()> {
        let mut files: Vec<(usize, u8, u8)> = self
            .super_block
            .inode_table
            .iter()
            .filter(|(_, inode)| inode.is_file() && inode.size() > 0)
            .map(|(index, inode)| (index, inode.start_block, inode.size()))
            .collect();
        files.sort_by_key(|&(_, start, _)| start);

        let mut next = self.super_block.clone();
        let mut cursor = DATA_AREA_START_BLOCK_ID;

        for (index, start, size) in files {
            if start != cursor {
                // 只会往前挪，按升序逐块复制不会覆盖还没读的块
                for i in 0..size as usize {
                    copy_block(&self.disk, start as usize + i, cursor as usize + i)?;
                }

                let old = start as usize..(start + size) as usize;
                let new = cursor as usize..(cursor + size) as usize;
                zero_blocks(&self.disk, old.filter(|block| !new.contains(block)))?;

                next.free_block_list.mark(start, size, false);
                next.free_block_list.mark(cursor, size, true);
                next.inode_table[index].start_block = cursor;
                debug!(
                    "moved slot {} from block {} to {} ({} blocks)",
                    index, start, cursor, size
                );
            }
            cursor += size;
        }

        self.commit(next)
    }
}
