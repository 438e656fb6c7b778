use log::debug;

use crate::{
    disk::BlockDevice,
    fs::{
        config::{MAX_FILE_BLOCKS, ROOT_INDEX, TOTAL_INODES},
        data_area::zero_blocks,
        error::{FileSystemError, Result},
        inode_table::{Inode, InodeName, InodeTable},
        MountedDisk,
    },
};

// 目录项类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntryType {
    File { size: u8 },         // 文件大小（块数，1 块 = 1KB）
    Directory { entries: usize }, // 直接子项数 + 2（. 和 ..）
}

// 一个目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub inode_index: usize,
    pub entry_type: DirEntryType,
}

/// `ls` 的结果：. 和 .. 的项数，以及按槽位顺序排列的直接子项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub current: usize,
    pub parent: usize,
    pub entries: Vec<DirEntry>,
}

/// 后序收集 index 及其全部后代，子项先于父目录。
/// visited 保证父链成环时也能结束。
fn collect_subtree(
    table: &InodeTable,
    index: usize,
    visited: &mut [bool; TOTAL_INODES],
    out: &mut Vec<usize>,
) {
    if visited[index] {
        return;
    }
    visited[index] = true;

    if table[index].is_dir() {
        let children: Vec<usize> = table.children(index as u8).collect();
        for child in children {
            collect_subtree(table, child, visited, out);
        }
    }
    out.push(index);
}

impl<D: BlockDevice> MountedDisk<D> {
    pub fn create(&mut self, name: &str, size: u32) -> Result<()> {
        if size > MAX_FILE_BLOCKS {
            return Err(FileSystemError::InvalidSize(size));
        }
        let inode_name = InodeName::new(name)?;
        let table = &self.super_block.inode_table;

        if table.find_in_dir(self.cwd, &inode_name).is_some() {
            return Err(FileSystemError::AlreadyExists(name.to_string()));
        }

        let slot = table
            .find_free_slot()
            .ok_or_else(|| FileSystemError::InodeFull {
                disk: self.disk_name.clone(),
                name: name.to_string(),
            })?;

        let size = size as u8;
        let start_block = self
            .super_block
            .free_block_list
            .find_contiguous(size)
            .ok_or_else(|| FileSystemError::CannotAllocate {
                disk: self.disk_name.clone(),
                size: size as u32,
            })?;

        // 所有检查都通过之后才开始修改
        let mut next = self.super_block.clone();
        next.inode_table[slot] = if size == 0 {
            Inode::new_directory(inode_name, self.cwd)
        } else {
            next.free_block_list.mark(start_block, size, true);
            Inode::new_file(inode_name, size, start_block, self.cwd)
        };

        debug!(
            "created {} in slot {} (size {}, start block {})",
            name, slot, size, start_block
        );
        self.commit(next)
    }

    /// 删除当前目录下的文件或目录，目录连同所有后代一起删除
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let inode_name = InodeName::new(name)?;
        let target = self
            .super_block
            .inode_table
            .find_in_dir(self.cwd, &inode_name)
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))?;

        let mut doomed = Vec::new();
        collect_subtree(
            &self.super_block.inode_table,
            target,
            &mut [false; TOTAL_INODES],
            &mut doomed,
        );

        let mut next = self.super_block.clone();
        for index in doomed {
            let inode = next.inode_table[index];
            if inode.is_file() {
                zero_blocks(&self.disk, inode.block_range())?;
                next.free_block_list
                    .mark(inode.start_block, inode.size(), false);
            }
            next.inode_table.clear(index);
            debug!("deleted {} (slot {})", inode.name(), index);
        }

        self.commit(next)
    }

    pub fn list(&self) -> Listing {
        let table = &self.super_block.inode_table;
        let current = table.child_count(self.cwd) + 2;
        let parent = if self.cwd == ROOT_INDEX {
            current
        } else {
            table.child_count(table[self.cwd as usize].parent()) + 2
        };

        let entries = table
            .children(self.cwd)
            .map(|index| {
                let inode = &table[index];
                let entry_type = if inode.is_dir() {
                    DirEntryType::Directory {
                        entries: table.child_count(index as u8) + 2,
                    }
                } else {
                    DirEntryType::File { size: inode.size() }
                };
                DirEntry {
                    name: inode.name().to_string(),
                    inode_index: index,
                    entry_type,
                }
            })
            .collect();

        Listing {
            current,
            parent,
            entries,
        }
    }

    pub fn change_dir(&mut self, name: &str) -> Result<()> {
        match name {
            "." => {}
            ".." => {
                if self.cwd != ROOT_INDEX {
                    self.cwd = self.super_block.inode_table[self.cwd as usize].parent();
                }
            }
            _ => {
                let inode_name = InodeName::new(name)?;
                let index = self
                    .super_block
                    .inode_table
                    .find_dir(self.cwd, &inode_name)
                    .ok_or_else(|| FileSystemError::DirectoryNotFound(name.to_string()))?;
                self.cwd = index as u8;
            }
        }
        Ok(())
    }
}
