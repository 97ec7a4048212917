use core::{mem, str};

/// 文件名最大长度（字节，不含终止符）
pub const NAME_MAX_LEN: usize = 20;
/// 名字字段宽度：补齐到4字节对齐，目录项内部不留填充
const NAME_FIELD: usize = 24;

/// 文件项的元信息：文件名到 inode 的映射。
/// 名字为空即空闲槽位。
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct DirEntry {
    name: [u8; NAME_FIELD],
    inode_id: u32,
}

impl DirEntry {
    /// 目录项大小恒为28字节
    pub const SIZE: usize = mem::size_of::<Self>();
    /// 空闲槽位
    pub const EMPTY: Self = Self {
        name: [0; NAME_FIELD],
        inode_id: 0,
    };

    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        debug_assert!(!name.is_empty() && name.len() <= NAME_MAX_LEN);
        let bytes = name.as_bytes();
        let mut name = [0; NAME_FIELD];
        name[..bytes.len()].copy_from_slice(bytes);

        Self { name, inode_id }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap();
        str::from_utf8(&self.name[..len]).unwrap()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }
}
