//! inode 及其索引结构
//! - 直接索引：inode 内置 12 个块编号
//! - 间接索引：inode 指向一个索引块，块内连续存储 256 个块编号
//!
//! 文件容量上限即 12 + 256 = 268 个数据块。

use core::mem;

use crate::BLOCK_SIZE;

/// 直接索引数量
pub const DIRECT_COUNT: usize = 12;
/// 间接索引块的编号容量
pub const INDIRECT_COUNT: usize = BLOCK_SIZE / mem::size_of::<u32>();
/// 单个文件的数据块上限
pub const MAX_FILE_BLOCKS: usize = DIRECT_COUNT + INDIRECT_COUNT;
/// 块指针的空哨兵
pub const NO_BLOCK: u32 = u32::MAX;

/// 间接索引块
pub(crate) type IndirectBlock = [u32; INDIRECT_COUNT];

/// 文件元信息。
/// 字段全部为 u32，记录内不产生填充，整张表可按原始字节落盘。
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct DiskInode {
    /// 非0表示槽位空闲
    free: u32,
    pub kind: DiskInodeKind,
    /// 已分配的数据块数（不含间接索引块本身）
    pub blocks: u32,
    /// 仅为兼容保留，逻辑上不使用
    pub uid: u32,
    pub gid: u32,
    /// 文件大小（字节）
    pub size: u32,
    /// 直接索引
    pub direct: [u32; DIRECT_COUNT],
    /// 指向一个间接索引块，[`NO_BLOCK`] 表示尚未分配
    pub indirect: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum DiskInodeKind {
    Directory = 0,
    #[default]
    File = 1,
}

impl DiskInode {
    /// 空闲槽位
    pub const FREE: Self = Self {
        free: 1,
        kind: DiskInodeKind::File,
        blocks: 0,
        uid: 0,
        gid: 0,
        size: 0,
        direct: [0; DIRECT_COUNT],
        indirect: NO_BLOCK,
    };

    #[inline]
    pub fn init(&mut self, kind: DiskInodeKind) {
        *self = Self {
            free: 0,
            kind,
            ..Self::FREE
        };
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.free != 0
    }

    /// 释放槽位。指针留作陈迹，块的归属以位图为准。
    #[inline]
    pub fn release(&mut self) {
        self.free = 1;
    }
}
