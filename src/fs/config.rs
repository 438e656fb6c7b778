pub const SUPER_BLOCK_BLOCK_ID: u64 = 0;

// 数据区的起始块号，块 0 被超级块占用
pub const DATA_AREA_START_BLOCK_ID: u8 = 1;

// 最后一个数据块
pub const LAST_BLOCK_ID: u8 = 127;

// 空闲块位图：128 位 = 16 字节
pub const FREE_MAP_BYTES: usize = 16;

// 超级块中 inode 的数量，16 + 126 * 8 正好是一个 1KB 块
pub const TOTAL_INODES: usize = 126;
pub const INODE_RECORD_SIZE: usize = 8;

// 文件名最多 5 个字节，不要求以 \0 结尾
pub const NAME_LEN: usize = 5;

// 根目录不占用 inode，用 127 作为父目录哨兵
pub const ROOT_INDEX: u8 = 127;

// 父目录字段里不允许出现的值
pub const RESERVED_INDEX: u8 = 126;

// 单个文件最多占用的块数
pub const MAX_FILE_BLOCKS: u32 = 127;
