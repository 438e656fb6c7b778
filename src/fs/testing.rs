use crate::{
    disk::mem_disk::MemDisk,
    fs::{consistency, super_block::SuperBlock, FileSystem},
};

/// 只写入了空超级块的内存磁盘
pub fn blank_disk() -> MemDisk {
    let disk = MemDisk::new();
    SuperBlock::new().sync(&disk).unwrap();
    disk
}

/// 挂载了一块空磁盘（名为 disk0）的文件系统
pub fn mounted() -> FileSystem<MemDisk> {
    let mut fs = FileSystem::new();
    fs.mount_device("disk0", blank_disk()).unwrap();
    fs
}

/// 超级块镜像 + 整盘字节 + 当前目录，用来断言失败操作没有留下任何改动
pub fn snapshot(fs: &FileSystem<MemDisk>) -> (SuperBlock, Vec<u8>, u8) {
    let session = fs.mounted().unwrap();
    (
        session.super_block.clone(),
        session.disk.snapshot(),
        session.cwd,
    )
}

pub fn assert_consistent(fs: &FileSystem<MemDisk>) {
    let session = fs.mounted().unwrap();
    assert_eq!(consistency::check(&session.super_block), Ok(()));
    assert_eq!(SuperBlock::load(&session.disk).unwrap(), session.super_block);
}

pub fn start_of(fs: &FileSystem<MemDisk>, index: usize) -> u8 {
    fs.mounted().unwrap().super_block.inode_table[index].start_block
}
