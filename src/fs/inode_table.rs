use std::{
    fmt,
    ops::{Index, IndexMut, Range},
};

use bitflags::bitflags;
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::fs::{
    config::{NAME_LEN, TOTAL_INODES},
    error::{FileSystemError, Result},
};

bitflags! {
    /// used_size 字节的最高位：inode 是否被占用
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsedFlags: u8 {
        const IN_USE = 0b1000_0000;
    }
}

bitflags! {
    /// dir_parent 字节的最高位：是否为目录
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParentFlags: u8 {
        const DIRECTORY = 0b1000_0000;
    }
}

// 低 7 位：文件大小 / 父目录下标
const LOW_BITS: u8 = 0b0111_1111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    File,      // 文件
    Directory, // 目录
}

/// 文件或目录名：最多 5 字节，尾部用 \0（或空格）填充
#[derive(Debug, Clone, Copy, Eq)]
pub struct InodeName([u8; NAME_LEN]);

impl InodeName {
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > NAME_LEN || bytes.contains(&0) {
            return Err(FileSystemError::InvalidName(name.to_string()));
        }
        let mut raw = [0u8; NAME_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    pub fn from_raw(raw: [u8; NAME_LEN]) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> [u8; NAME_LEN] {
        self.0
    }

    /// 去掉尾部填充后的有效字节
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0 && b != b' ')
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }
}

impl PartialEq for InodeName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for InodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// 超级块中的一条 inode 记录，磁盘上固定 8 字节：
/// name(5) | used_size(1) | start_block(1) | dir_parent(1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub name: [u8; NAME_LEN],
    pub used_size: u8,
    pub start_block: u8,
    pub dir_parent: u8,
}

impl Inode {
    pub const fn empty() -> Self {
        Self {
            name: [0; NAME_LEN],
            used_size: 0,
            start_block: 0,
            dir_parent: 0,
        }
    }

    pub fn new_file(name: InodeName, size: u8, start_block: u8, parent: u8) -> Self {
        Self {
            name: name.raw(),
            used_size: UsedFlags::IN_USE.bits() | (size & LOW_BITS),
            start_block,
            dir_parent: parent & LOW_BITS,
        }
    }

    pub fn new_directory(name: InodeName, parent: u8) -> Self {
        Self {
            name: name.raw(),
            used_size: UsedFlags::IN_USE.bits(),
            start_block: 0,
            dir_parent: ParentFlags::DIRECTORY.bits() | (parent & LOW_BITS),
        }
    }

    pub fn is_used(&self) -> bool {
        UsedFlags::from_bits_truncate(self.used_size).contains(UsedFlags::IN_USE)
    }

    pub fn inode_type(&self) -> InodeType {
        if ParentFlags::from_bits_truncate(self.dir_parent).contains(ParentFlags::DIRECTORY) {
            InodeType::Directory
        } else {
            InodeType::File
        }
    }

    pub fn is_dir(&self) -> bool {
        self.is_used() && self.inode_type() == InodeType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.is_used() && self.inode_type() == InodeType::File
    }

    /// 占用的块数
    pub fn size(&self) -> u8 {
        self.used_size & LOW_BITS
    }

    pub fn set_size(&mut self, size: u8) {
        self.used_size = (self.used_size & !LOW_BITS) | (size & LOW_BITS);
    }

    /// 父目录下标，127 表示根目录
    pub fn parent(&self) -> u8 {
        self.dir_parent & LOW_BITS
    }

    pub fn name(&self) -> InodeName {
        InodeName::from_raw(self.name)
    }

    /// 所有字节都为 0
    pub fn is_blank(&self) -> bool {
        *self == Self::empty()
    }

    /// 文件占用的块区间 [start_block, start_block + size)
    pub fn block_range(&self) -> Range<usize> {
        let start = self.start_block as usize;
        start..start + self.size() as usize
    }
}

/// 126 个 inode 槽位组成的定长表，目录结构靠父下标反向引用表达
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeTable {
    inodes: [Inode; TOTAL_INODES],
}

impl InodeTable {
    pub fn new() -> Self {
        Self {
            inodes: [Inode::empty(); TOTAL_INODES],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Inode)> {
        self.inodes.iter().enumerate()
    }

    pub fn find_free_slot(&self) -> Option<usize> {
        self.inodes.iter().position(|inode| !inode.is_used())
    }

    /// 在目录 parent 下按名字查找，不区分类型
    pub fn find_in_dir(&self, parent: u8, name: &InodeName) -> Option<usize> {
        self.children(parent)
            .find(|&index| self.inodes[index].name() == *name)
    }

    pub fn find_file(&self, parent: u8, name: &InodeName) -> Option<usize> {
        self.children(parent)
            .find(|&index| self.inodes[index].is_file() && self.inodes[index].name() == *name)
    }

    pub fn find_dir(&self, parent: u8, name: &InodeName) -> Option<usize> {
        self.children(parent)
            .find(|&index| self.inodes[index].is_dir() && self.inodes[index].name() == *name)
    }

    /// parent 的直接子项，按槽位下标升序
    pub fn children(&self, parent: u8) -> impl Iterator<Item = usize> + '_ {
        self.inodes
            .iter()
            .enumerate()
            .filter(move |(_, inode)| inode.is_used() && inode.parent() == parent)
            .map(|(index, _)| index)
    }

    pub fn child_count(&self, parent: u8) -> usize {
        self.children(parent).count()
    }

    pub fn clear(&mut self, index: usize) {
        self.inodes[index] = Inode::empty();
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for InodeTable {
    type Output = Inode;

    fn index(&self, index: usize) -> &Inode {
        &self.inodes[index]
    }
}

impl IndexMut<usize> for InodeTable {
    fn index_mut(&mut self, index: usize) -> &mut Inode {
        &mut self.inodes[index]
    }
}

// serde 的派生只支持 32 个元素以内的数组，这里按定长元组逐条写出，
// bincode 不会为元组加长度前缀。
impl Serialize for InodeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(TOTAL_INODES)?;
        for inode in &self.inodes {
            tuple.serialize_element(inode)?;
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for InodeTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = InodeTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} inode records", TOTAL_INODES)
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<InodeTable, A::Error> {
                let mut table = InodeTable::new();
                for (i, slot) in table.inodes.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_tuple(TOTAL_INODES, TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::config::ROOT_INDEX;

    fn name(s: &str) -> InodeName {
        InodeName::new(s).unwrap()
    }

    #[test]
    fn names_compare_without_padding() {
        assert_eq!(name("ab"), InodeName::from_raw(*b"ab   "));
        assert_eq!(name("ab"), InodeName::from_raw(*b"ab\0\0\0"));
        assert_ne!(name("ab"), name("abc"));
        assert_eq!(name("hello").raw(), *b"hello");
        assert_eq!(format!("{:<5}|", name("f1")), "f1   |");
    }

    #[test]
    fn invalid_names_rejected() {
        assert!(InodeName::new("").is_err());
        assert!(InodeName::new("sixsix").is_err());
        assert!(InodeName::new("a\0b").is_err());
    }

    #[test]
    fn flags_packed_in_high_bits() {
        let file = Inode::new_file(name("f1"), 3, 1, ROOT_INDEX);
        assert_eq!(file.used_size, 0x83);
        assert_eq!(file.dir_parent, 127);
        assert!(file.is_file());
        assert_eq!(file.block_range(), 1..4);

        let dir = Inode::new_directory(name("d"), 4);
        assert_eq!(dir.used_size, 0x80);
        assert_eq!(dir.dir_parent, 0x84);
        assert!(dir.is_dir());
        assert_eq!(dir.parent(), 4);

        let mut resized = file;
        resized.set_size(10);
        assert_eq!(resized.used_size, 0x8A);
        assert!(resized.is_used());
    }

    #[test]
    fn children_ignore_free_slots() {
        let mut table = InodeTable::new();
        // 空闲槽位的父字段为 0，不能被当成 inode 0 的子项
        table[0] = Inode::new_directory(name("d"), ROOT_INDEX);
        table[2] = Inode::new_file(name("x"), 1, 1, 0);
        table[5] = Inode::new_file(name("y"), 1, 2, 0);

        assert_eq!(table.children(0).collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(table.child_count(ROOT_INDEX), 1);
        assert_eq!(table.find_free_slot(), Some(1));
        assert_eq!(table.find_file(0, &name("y")), Some(5));
        assert_eq!(table.find_dir(0, &name("y")), None);
        assert_eq!(table.find_in_dir(ROOT_INDEX, &name("d")), Some(0));

        table.clear(0);
        assert!(table[0].is_blank());
    }

    #[test]
    fn full_table_has_no_free_slot() {
        let mut table = InodeTable::new();
        for i in 0..TOTAL_INODES {
            table[i] = Inode::new_directory(name("d"), ROOT_INDEX);
        }
        assert_eq!(table.find_free_slot(), None);
    }
}
