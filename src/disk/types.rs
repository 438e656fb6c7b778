/// 每个逻辑块（Block）的大小：1KB
/// 文件系统以“块”为最小读写单位。
pub const BLOCK_SIZE: usize = 1024;

/// 磁盘中包含的块总数：块 0 是超级块，1..=127 是数据块
pub const BLOCK_COUNT: usize = 128;

/// 虚拟磁盘总大小（单位：字节）：128 * 1KB = 128KB
pub const DISK_SIZE: u64 = (BLOCK_SIZE * BLOCK_COUNT) as u64;

/// 定义一个逻辑块类型（每块 1KB 的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];
