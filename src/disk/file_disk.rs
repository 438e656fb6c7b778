use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use log::debug;

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE, DISK_SIZE},
};

/// 以宿主机上的一个镜像文件作为虚拟磁盘，挂载期间文件保持打开
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
}

impl FileDisk {
    /// 打开已有的磁盘镜像，镜像不足 128KB 视为无法使用
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        let len = file.metadata()?.len();
        if len < DISK_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("disk image is {} bytes, expected {}", len, DISK_SIZE),
            ));
        }

        debug!("opened disk image {}", path.as_ref().display());
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// 创建（或截断）一个全零的磁盘镜像
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(DISK_SIZE)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "disk file lock poisoned"))
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rw.img");
        let disk = FileDisk::create(&path).unwrap();

        let block: Block = [0x42; BLOCK_SIZE];
        disk.write_block(3, &block).unwrap();
        disk.write_block(127, &[0x7; BLOCK_SIZE]).unwrap();

        let mut buf: Block = [0; BLOCK_SIZE];
        disk.read_block(3, &mut buf).unwrap();
        assert_eq!(buf, block);
        disk.read_block(4, &mut buf).unwrap();
        assert_eq!(buf, [0; BLOCK_SIZE]);
        disk.read_block(127, &mut buf).unwrap();
        assert_eq!(buf, [0x7; BLOCK_SIZE]);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), DISK_SIZE);
    }

    #[test]
    fn open_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDisk::open(dir.path().join("nope.img")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn open_short_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.img");
        std::fs::write(&path, [0u8; 2048]).unwrap();
        let err = FileDisk::open(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
