use std::path::Path;

use indicatif::ProgressBar;
use log::info;

use crate::{
    disk::{
        block_device::BlockDevice,
        file_disk::FileDisk,
        types::{BLOCK_COUNT, BLOCK_SIZE},
    },
    fs::{error::Result, super_block::SuperBlock},
};

/// 写出一块全新的磁盘镜像：超级块只占用块 0，其余块清零
pub fn format_disk<P: AsRef<Path>>(path: P) -> Result<()> {
    format_disk_with_progress(path, &ProgressBar::hidden())
}

pub fn format_disk_with_progress<P: AsRef<Path>>(path: P, pb: &ProgressBar) -> Result<()> {
    let disk = FileDisk::create(path.as_ref())?;
    pb.set_length(BLOCK_COUNT as u64);

    SuperBlock::new().sync(&disk)?;
    pb.inc(1);

    let zero = [0u8; BLOCK_SIZE];
    for block_id in 1..BLOCK_COUNT as u64 {
        disk.write_block(block_id, &zero)?;
        pb.inc(1);
    }

    info!("formatted {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disk::types::DISK_SIZE, fs::consistency};

    #[test]
    fn formatted_image_is_mountable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.img");
        std::fs::write(&path, [0xFFu8; 4096]).unwrap();

        format_disk(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), DISK_SIZE);

        let disk = FileDisk::open(&path).unwrap();
        let sb = SuperBlock::load(&disk).unwrap();
        assert_eq!(sb, SuperBlock::new());
        assert_eq!(consistency::check(&sb), Ok(()));

        let mut block = [0xAAu8; BLOCK_SIZE];
        disk.read_block(1, &mut block).unwrap();
        assert_eq!(block, [0; BLOCK_SIZE]);
    }
}
