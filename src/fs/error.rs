use thiserror::Error;

/// 文件系统错误类型
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error), // 底层 I/O 错误
    #[error("Superblock encoding error: {0}")]
    Encoding(#[from] bincode::Error), // 超级块编解码失败
    #[error("No file system is mounted")]
    NotMounted,
    #[error("Cannot find disk {0}")]
    DiskNotFound(String),
    #[error("File system in {disk} is inconsistent (error code: {code})")]
    Inconsistent { disk: String, code: u8 }, // 挂载检查失败，带检查编号 1..=6
    #[error("Superblock in disk {disk} is full, cannot create {name}")]
    InodeFull { disk: String, name: String },
    #[error("File or directory {0} already exists")]
    AlreadyExists(String),
    #[error("Cannot allocate {size} blocks on {disk}")]
    CannotAllocate { disk: String, size: u32 }, // 找不到足够长的连续空闲块
    #[error("File or directory {0} does not exist")]
    NotFound(String),
    #[error("File {0} does not exist")]
    FileNotFound(String),
    #[error("Directory {0} does not exist")]
    DirectoryNotFound(String),
    #[error("{name} does not have block {block}")]
    NoSuchBlock { name: String, block: u32 },
    #[error("File {name} cannot expand to size {size}")]
    CannotExpand { name: String, size: u32 },
    #[error("Invalid size {0}, must be between 0 and 127")]
    InvalidSize(u32),
    #[error("Invalid name: {0:?}")]
    InvalidName(String),
    #[error("Buffer holds at most 1024 bytes, got {0}")]
    BufferTooLarge(usize),
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
