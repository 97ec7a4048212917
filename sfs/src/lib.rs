#![no_std]

extern crate alloc;

/* sfs 的整体架构，自上而下 */

// 文件操作层：打开、读写、定位、删除、遍历
mod vfs;

// 磁盘块管理器层：格式化、挂载、块分配与整体落盘
mod fs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 块缓存层：内存上的磁盘块数据缓存
mod block_cache;

// 错误码
mod error;

pub use self::{
    error::{Error, Result},
    fs::SimpleFileSystem,
    layout::{DirEntry, DiskInode, DiskInodeKind, SuperBlock, MAX_FILE_BLOCKS, NAME_MAX_LEN},
    vfs::{FileOps, Stat, StatKind},
};

/// 卷魔数
pub const MAGIC: u32 = 0xACBD_0005;
/// 块大小（字节）
pub const BLOCK_SIZE: usize = 1024;
/// 卷内块总数
pub const TOTAL_BLOCKS: usize = 2000;
/// inode 表、目录表与描述符表的统一容量
pub const MAX_FILES: usize = 100;

type DataBlock = [u8; BLOCK_SIZE];
