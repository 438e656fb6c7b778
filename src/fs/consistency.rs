//! 挂载时的一致性检查（fsck）。
//!
//! 六项检查按固定顺序各自扫描整张 inode 表，返回第一项失败的检查，
//! 不汇总多个错误。

use std::fmt;

use crate::fs::{
    config::{
        DATA_AREA_START_BLOCK_ID, LAST_BLOCK_ID, RESERVED_INDEX, ROOT_INDEX, TOTAL_INODES,
    },
    inode_table::InodeTable,
    super_block::SuperBlock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    /// 空闲 inode 的其余字段不全为 0
    FreeInodeNotBlank,
    /// 文件的起始块或末尾块越界
    FileBlocksOutOfRange,
    /// 目录的起始块或大小不为 0
    DirectoryHasBlocks,
    /// 父目录下标为 126，或指向空闲 inode / 文件
    InvalidParent,
    /// 同一目录下有重名项
    DuplicateName,
    /// 位图与文件占用的块不一致
    BlockAllocationMismatch,
}

impl Inconsistency {
    pub fn code(self) -> u8 {
        match self {
            Self::FreeInodeNotBlank => 1,
            Self::FileBlocksOutOfRange => 2,
            Self::DirectoryHasBlocks => 3,
            Self::InvalidParent => 4,
            Self::DuplicateName => 5,
            Self::BlockAllocationMismatch => 6,
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            Self::FreeInodeNotBlank => "free inode is not zeroed",
            Self::FileBlocksOutOfRange => "file blocks out of range",
            Self::DirectoryHasBlocks => "directory has a start block or size",
            Self::InvalidParent => "invalid parent directory",
            Self::DuplicateName => "duplicate name in directory",
            Self::BlockAllocationMismatch => "block allocation inconsistent",
        };
        write!(f, "{} (check {})", desc, self.code())
    }
}

pub fn check(sb: &SuperBlock) -> Result<(), Inconsistency> {
    let table = &sb.inode_table;

    if !free_inodes_blank(table) {
        return Err(Inconsistency::FreeInodeNotBlank);
    }
    if !file_ranges_valid(table) {
        return Err(Inconsistency::FileBlocksOutOfRange);
    }
    if !directories_empty(table) {
        return Err(Inconsistency::DirectoryHasBlocks);
    }
    if !parents_valid(table) {
        return Err(Inconsistency::InvalidParent);
    }
    if !names_unique(table) {
        return Err(Inconsistency::DuplicateName);
    }
    if !blocks_consistent(sb) {
        return Err(Inconsistency::BlockAllocationMismatch);
    }
    Ok(())
}

fn free_inodes_blank(table: &InodeTable) -> bool {
    table
        .iter()
        .filter(|(_, inode)| !inode.is_used())
        .all(|(_, inode)| inode.is_blank())
}

fn file_ranges_valid(table: &InodeTable) -> bool {
    table.iter().filter(|(_, inode)| inode.is_file()).all(|(_, inode)| {
        let start = inode.start_block;
        let end = start as usize + inode.size() as usize;
        (DATA_AREA_START_BLOCK_ID..=LAST_BLOCK_ID).contains(&start)
            && end <= LAST_BLOCK_ID as usize + 1
    })
}

fn directories_empty(table: &InodeTable) -> bool {
    table
        .iter()
        .filter(|(_, inode)| inode.is_dir())
        .all(|(_, inode)| inode.start_block == 0 && inode.size() == 0)
}

fn parents_valid(table: &InodeTable) -> bool {
    table
        .iter()
        .filter(|(_, inode)| inode.is_used())
        .all(|(_, inode)| match inode.parent() {
            ROOT_INDEX => true,
            RESERVED_INDEX => false,
            parent => table[parent as usize].is_dir(),
        })
}

fn names_unique(table: &InodeTable) -> bool {
    (0..TOTAL_INODES).filter(|&i| table[i].is_used()).all(|i| {
        (i + 1..TOTAL_INODES).all(|j| {
            !(table[j].is_used()
                && table[j].parent() == table[i].parent()
                && table[j].name() == table[i].name())
        })
    })
}

fn blocks_consistent(sb: &SuperBlock) -> bool {
    let bitmap = &sb.free_block_list;
    if !bitmap.is_used(0) {
        return false;
    }

    let mut owners = [0u8; LAST_BLOCK_ID as usize + 1];
    for (_, inode) in sb.inode_table.iter().filter(|(_, inode)| inode.is_file()) {
        for block in inode.block_range() {
            owners[block] = owners[block].saturating_add(1);
        }
    }

    (DATA_AREA_START_BLOCK_ID..=LAST_BLOCK_ID).all(|block| match owners[block as usize] {
        0 => !bitmap.is_used(block),
        1 => bitmap.is_used(block),
        _ => false,
    })
}
