use log::{info, warn};

use crate::{
    disk::{BlockDevice, FileDisk},
    fs::{
        config::{ROOT_INDEX, TOTAL_INODES},
        data_area::Buffer,
        directory::Listing,
        error::{FileSystemError, Result},
        super_block::SuperBlock,
    },
};

pub mod config;
pub mod consistency;
pub mod data_area;
pub mod data_block_bitmap;
pub mod defrag;
pub mod directory;
pub mod error;
pub mod inode_table;
pub mod resize;
pub mod super_block;
#[cfg(test)]
pub mod testing;

/// 一次挂载会话：磁盘、内存中的超级块镜像和当前目录
#[derive(Debug)]
pub struct MountedDisk<D: BlockDevice> {
    pub disk_name: String,
    pub disk: D,
    pub super_block: SuperBlock,
    pub cwd: u8, // 当前目录的 inode 下标，根目录为 127
}

impl<D: BlockDevice> MountedDisk<D> {
    /// 先整块写回超级块，成功后再替换内存镜像。
    /// 写盘失败时内存镜像保持原样。
    /// 调用方先写数据块、最后才提交超级块，这一步失败时磁盘上的数据块不会回滚。
    fn commit(&mut self, next: SuperBlock) -> Result<()> {
        next.sync(&self.disk)?;
        self.super_block = next;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileSystem<D: BlockDevice = FileDisk> {
    mounted: Option<MountedDisk<D>>, // 同一时刻最多挂载一个磁盘
    buffer: Buffer,                  // 与文件无关的 1KB 共享缓冲区
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn new() -> Self {
        Self {
            mounted: None,
            buffer: Buffer::new(),
        }
    }

    /// 读入候选超级块并做一致性检查，通过后才替换当前挂载。
    /// 失败时之前挂载的磁盘不受影响。
    pub fn mount_device(&mut self, disk_name: &str, disk: D) -> Result<()> {
        let super_block = SuperBlock::load(&disk)?;

        if let Err(failure) = consistency::check(&super_block) {
            warn!("refusing to mount {}: {}", disk_name, failure);
            return Err(FileSystemError::Inconsistent {
                disk: disk_name.to_string(),
                code: failure.code(),
            });
        }

        if let Some(previous) = &self.mounted {
            info!("unmounting {}", previous.disk_name);
        }
        info!("mounted {}", disk_name);

        self.mounted = Some(MountedDisk {
            disk_name: disk_name.to_string(),
            disk,
            super_block,
            cwd: ROOT_INDEX,
        });
        self.buffer.clear();
        Ok(())
    }

    /// 卸载当前磁盘，缓冲区保留
    pub fn unmount(&mut self) -> Option<String> {
        let previous = self.mounted.take()?;
        info!("unmounted {}", previous.disk_name);
        Some(previous.disk_name)
    }

    pub fn mounted(&self) -> Option<&MountedDisk<D>> {
        self.mounted.as_ref()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn session(&mut self) -> Result<&mut MountedDisk<D>> {
        self.mounted.as_mut().ok_or(FileSystemError::NotMounted)
    }

    /// 沿父目录链拼出当前目录的路径，例如 /a/b
    pub fn working_path(&self) -> Option<String> {
        let mounted = self.mounted.as_ref()?;
        let table = &mounted.super_block.inode_table;

        let mut parts = Vec::new();
        let mut current = mounted.cwd;
        while current != ROOT_INDEX && parts.len() < TOTAL_INODES {
            let inode = &table[current as usize];
            parts.push(inode.name().to_string());
            current = inode.parent();
        }
        parts.reverse();
        Some(format!("/{}", parts.join("/")))
    }

    pub fn create(&mut self, name: &str, size: u32) -> Result<()> {
        self.session()?.create(name, size)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.session()?.delete(name)
    }

    pub fn read_block(&mut self, name: &str, block: u32) -> Result<()> {
        let mounted = self.mounted.as_ref().ok_or(FileSystemError::NotMounted)?;
        mounted.read_file_block(name, block, &mut self.buffer)
    }

    pub fn write_block(&mut self, name: &str, block: u32) -> Result<()> {
        let mounted = self.mounted.as_ref().ok_or(FileSystemError::NotMounted)?;
        mounted.write_file_block(name, block, &self.buffer)
    }

    /// 覆盖共享缓冲区，不足 1024 字节的部分补 0，不碰磁盘
    pub fn load_buffer(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.load(bytes)
    }

    pub fn list(&self) -> Result<Listing> {
        let mounted = self.mounted.as_ref().ok_or(FileSystemError::NotMounted)?;
        Ok(mounted.list())
    }

    pub fn resize(&mut self, name: &str, new_size: u32) -> Result<()> {
        self.session()?.resize(name, new_size)
    }

    pub fn defragment(&mut self) -> Result<()> {
        self.session()?.defragment()
    }

    pub fn change_dir(&mut self, name: &str) -> Result<()> {
        self.session()?.change_dir(name)
    }
}

impl FileSystem<FileDisk> {
    /// 按路径打开磁盘镜像并挂载
    pub fn mount(&mut self, path: &str) -> Result<()> {
        let disk = FileDisk::open(path).map_err(|e| {
            warn!("cannot open disk {}: {}", path, e);
            FileSystemError::DiskNotFound(path.to_string())
        })?;
        self.mount_device(path, disk)
    }
}

impl<D: BlockDevice> Default for FileSystem<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::{mem_disk::MemDisk, BLOCK_SIZE},
        fs::{
            inode_table::{Inode, InodeName},
            testing::{blank_disk, mounted},
        },
    };

    #[test]
    fn operations_require_a_mount() {
        let mut fs: FileSystem<MemDisk> = FileSystem::new();
        assert!(matches!(fs.create("a", 1), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.delete("a"), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.read_block("a", 0), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.write_block("a", 0), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.list(), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.resize("a", 2), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.defragment(), Err(FileSystemError::NotMounted)));
        assert!(matches!(fs.change_dir("a"), Err(FileSystemError::NotMounted)));
        // 缓冲区不依赖挂载
        assert!(fs.load_buffer(b"hi").is_ok());
    }

    #[test]
    fn mount_resets_cwd_and_clears_buffer() {
        let mut fs = mounted();
        fs.create("d", 0).unwrap();
        fs.change_dir("d").unwrap();
        fs.load_buffer(b"data").unwrap();

        fs.mount_device("other", blank_disk()).unwrap();
        assert_eq!(fs.mounted().unwrap().cwd, ROOT_INDEX);
        assert_eq!(fs.mounted().unwrap().disk_name, "other");
        assert_eq!(fs.buffer().as_block(), &[0u8; BLOCK_SIZE]);
    }

    #[test]
    fn inconsistent_mount_keeps_previous_disk() {
        let mut fs = mounted();
        fs.create("keep", 2).unwrap();
        fs.load_buffer(b"still here").unwrap();

        let bad = MemDisk::new();
        let mut sb = SuperBlock::new();
        sb.free_block_list.mark(0, 1, false);
        sb.sync(&bad).unwrap();

        match fs.mount_device("bad", bad) {
            Err(FileSystemError::Inconsistent { disk, code }) => {
                assert_eq!(disk, "bad");
                assert_eq!(code, 6);
            }
            other => panic!("unexpected {:?}", other),
        }

        let session = fs.mounted().unwrap();
        assert_eq!(session.disk_name, "disk0");
        assert!(session.super_block.inode_table[0].is_file());
        assert_eq!(&fs.buffer().as_block()[..10], b"still here");
    }

    #[test]
    fn missing_image_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.img");
        let mut fs: FileSystem = FileSystem::new();
        assert!(matches!(
            fs.mount(path.to_str().unwrap()),
            Err(FileSystemError::DiskNotFound(_))
        ));
        assert!(fs.mounted().is_none());
    }

    #[test]
    fn unopenable_image_keeps_previous_mount() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.img");
        let good = good.to_str().unwrap();
        crate::disk::init::format_disk(good).unwrap();
        let short = dir.path().join("short.img");
        std::fs::write(&short, [0u8; 100]).unwrap();
        let missing = dir.path().join("missing.img");

        let mut fs: FileSystem = FileSystem::new();
        fs.mount(good).unwrap();
        fs.create("sub", 0).unwrap();
        fs.change_dir("sub").unwrap();
        fs.load_buffer(b"xyz").unwrap();
        let cwd = fs.mounted().unwrap().cwd;
        assert_ne!(cwd, ROOT_INDEX);

        for path in [&missing, &short] {
            assert!(matches!(
                fs.mount(path.to_str().unwrap()),
                Err(FileSystemError::DiskNotFound(_))
            ));
            let session = fs.mounted().unwrap();
            assert_eq!(session.disk_name, good);
            assert_eq!(session.cwd, cwd);
            assert_eq!(&fs.buffer().as_block()[..3], b"xyz");
        }
    }

    #[test]
    fn remount_reexposes_identical_superblock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let path = path.to_str().unwrap();
        crate::disk::init::format_disk(path).unwrap();

        let mut fs: FileSystem = FileSystem::new();
        fs.mount(path).unwrap();
        fs.create("f1", 3).unwrap();
        fs.create("dir", 0).unwrap();
        fs.load_buffer(b"persisted").unwrap();
        fs.write_block("f1", 2).unwrap();
        let before = fs.mounted().unwrap().super_block.clone();

        fs.unmount();
        fs.mount(path).unwrap();
        assert_eq!(fs.mounted().unwrap().super_block, before);

        fs.unmount();
        fs.mount(path).unwrap();
        assert_eq!(fs.mounted().unwrap().super_block, before);

        fs.read_block("f1", 2).unwrap();
        assert_eq!(&fs.buffer().as_block()[..9], b"persisted");
    }

    #[test]
    fn working_path_follows_parents() {
        let mut fs = mounted();
        assert_eq!(fs.working_path().as_deref(), Some("/"));
        fs.create("a", 0).unwrap();
        fs.change_dir("a").unwrap();
        fs.create("b", 0).unwrap();
        fs.change_dir("b").unwrap();
        assert_eq!(fs.working_path().as_deref(), Some("/a/b"));
    }

    #[test]
    fn mount_rejects_free_inode_with_name() {
        let disk = MemDisk::new();
        let mut sb = SuperBlock::new();
        sb.inode_table[3] = Inode::new_file(InodeName::new("x").unwrap(), 0, 0, 0);
        sb.inode_table[3].used_size = 0;
        sb.sync(&disk).unwrap();

        let mut fs = FileSystem::new();
        assert!(matches!(
            fs.mount_device("d", disk),
            Err(FileSystemError::Inconsistent { code: 1, .. })
        ));
    }
}
