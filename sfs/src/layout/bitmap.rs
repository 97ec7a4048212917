//! 位图：整卷每块一位，0 空闲、1 占用。
//!
//! 与盘上按需读写的方案不同，位图常驻内存，
//! 由持久化逻辑整体写入卷尾的固定区域，挂载时原样读回。

use core::mem;
use core::ptr;
use core::slice;

use crate::TOTAL_BLOCKS;

/// 每组64位
const GROUP_BITS: usize = 64;
/// 位组数量
const GROUPS: usize = TOTAL_BLOCKS.div_ceil(GROUP_BITS);

/// 块分配状态，每块一位
#[derive(Debug, PartialEq, Eq)]
pub struct Bitmap {
    bits: [u64; GROUPS],
}

impl Bitmap {
    /// 序列化后的字节大小
    pub const BYTES: usize = mem::size_of::<[u64; GROUPS]>();

    pub fn new() -> Self {
        let mut map = Self { bits: [0; GROUPS] };
        // 末组中越界的位永久置1，分配时便无需再做范围检查
        for bit in TOTAL_BLOCKS..GROUPS * GROUP_BITS {
            map.mark_used(bit as u32);
        }
        map
    }

    /// 从块0起线性扫描，取第一个空闲块并标记占用。
    /// 卷满则返回空——调用方按实际拿到的数量收缩请求，不视为错误。
    pub fn alloc(&mut self) -> Option<u32> {
        let (group, ingroup) = self.bits.iter().enumerate().find_map(|(group, &bits)| {
            (bits != u64::MAX).then_some((group, bits.trailing_ones() as usize))
        })?;

        self.bits[group] |= 1 << ingroup;
        Some((group * GROUP_BITS + ingroup) as u32)
    }

    pub fn dealloc(&mut self, block_id: u32) {
        let (group, ingroup) = Self::decompose(block_id);
        // 归还的块一定处于占用状态
        assert_ne!(self.bits[group] & (1 << ingroup), 0);
        self.bits[group] &= !(1 << ingroup);
    }

    pub fn mark_used(&mut self, block_id: u32) {
        let (group, ingroup) = Self::decompose(block_id);
        self.bits[group] |= 1 << ingroup;
    }

    pub fn is_used(&self, block_id: u32) -> bool {
        let (group, ingroup) = Self::decompose(block_id);
        self.bits[group] & (1 << ingroup) != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(&self.bits).cast(), Self::BYTES) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(&mut self.bits).cast(), Self::BYTES) }
    }

    #[inline]
    fn decompose(block_id: u32) -> (usize, usize) {
        let block_id = block_id as usize;
        (block_id / GROUP_BITS, block_id % GROUP_BITS)
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}
