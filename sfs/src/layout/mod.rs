//! # 磁盘数据结构层
//!
//! sfs 的磁盘布局，按块编号从低到高：
//! 超级块 | inode 表 | 根目录表(12块) | 数据块区域 | 位图
//!
//! 四个固定区域在格式化时一次划定，之后永不移动。

use core::mem;

use crate::{BLOCK_SIZE, MAX_FILES, TOTAL_BLOCKS};

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub(crate) use inode::IndirectBlock;
pub use inode::{DiskInode, DiskInodeKind, DIRECT_COUNT, MAX_FILE_BLOCKS, NO_BLOCK};

/// 文件项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::{DirEntry, NAME_MAX_LEN};

/// inode 表的字节大小
pub(crate) const INODE_TABLE_BYTES: usize = MAX_FILES * mem::size_of::<DiskInode>();
/// inode 区域块数：表尾不足一块时多留一块
pub(crate) const INODE_AREA_BLOCKS: usize = INODE_TABLE_BYTES / BLOCK_SIZE + 1;

/// 目录表的字节大小
pub(crate) const DIR_TABLE_BYTES: usize = MAX_FILES * DirEntry::SIZE;
/// 根目录恒占12个数据块，经根 inode 的直接索引寻址
pub(crate) const DIR_BLOCKS: usize = DIRECT_COUNT;

/// 位图区域块数
pub(crate) const BITMAP_AREA_BLOCKS: usize = Bitmap::BYTES / BLOCK_SIZE + 1;
/// 位图区域起始块：位于卷尾
pub(crate) const BITMAP_AREA_START: usize = TOTAL_BLOCKS - BITMAP_AREA_BLOCKS;

/// 根 inode 编号
pub(crate) const ROOT_INODE: usize = 0;
