use crate::layout::{INODE_AREA_BLOCKS, ROOT_INODE};
use crate::{BLOCK_SIZE, MAGIC, TOTAL_BLOCKS};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位其它固定区域
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 块大小（字节）
    pub block_size: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// inode 表区域占据块数
    pub inode_area_blocks: u32,
    /// 根 inode 编号
    pub root_inode: u32,
}

impl SuperBlock {
    #[inline]
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            block_size: BLOCK_SIZE as u32,
            total_blocks: TOTAL_BLOCKS as u32,
            inode_area_blocks: INODE_AREA_BLOCKS as u32,
            root_inode: ROOT_INODE as u32,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}
