//! # 磁盘块管理器层
//!
//! 构建磁盘布局并维护五张表：超级块、inode 表、目录表、位图，
//! 以及只存在于内存的描述符表。
//!
//! 每次变更操作返回前，前四张表都会整体写回各自的固定区域（见 [`SimpleFileSystem::flush`]），
//! 因此进程随时退出，卷上见到的都是最近一次成功操作之后的状态。

use core::mem;
use core::ptr;
use core::slice;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::block_cache::BlockCacheManager;
use crate::layout::{
    Bitmap, DirEntry, DiskInode, DiskInodeKind, IndirectBlock, SuperBlock, BITMAP_AREA_START,
    DIRECT_COUNT, DIR_BLOCKS, DIR_TABLE_BYTES, INODE_AREA_BLOCKS, NO_BLOCK, ROOT_INODE,
};
use crate::vfs::FileDesc;
use crate::{DataBlock, BLOCK_SIZE, MAX_FILES, TOTAL_BLOCKS};

/// 单卷文件系统。
///
/// 所有状态集中于一个属主对象，方便在测试里同时摆弄多个卷；
/// 本身不做任何加锁，并发访问需要外部再包一层互斥。
pub struct SimpleFileSystem {
    pub(crate) block_device: Arc<dyn BlockDevice>,
    pub(crate) cache: BlockCacheManager,
    pub(crate) super_block: SuperBlock,
    pub(crate) inode_table: [DiskInode; MAX_FILES],
    pub(crate) directory: [DirEntry; MAX_FILES],
    pub(crate) bitmap: Bitmap,
    /// 打开文件的游标表，不落盘
    pub(crate) fd_table: [Option<FileDesc>; MAX_FILES],
    /// 目录遍历进度，同样只在内存
    pub(crate) dir_cursor: usize,
}

impl SimpleFileSystem {
    /// 在块设备上格式化出一个空卷并挂载。
    pub fn create(block_device: Arc<dyn BlockDevice>) -> Self {
        let mut fs = Self {
            block_device,
            cache: BlockCacheManager::new(),
            super_block: SuperBlock::new(),
            inode_table: [DiskInode::FREE; MAX_FILES],
            directory: [DirEntry::EMPTY; MAX_FILES],
            bitmap: Bitmap::new(),
            fd_table: [None; MAX_FILES],
            dir_cursor: 0,
        };

        for block_id in 0..TOTAL_BLOCKS {
            fs.cache
                .get(block_id, &fs.block_device)
                .lock()
                .map_mut(0, |block: &mut DataBlock| block.fill(0));
        }

        // 划定固定区域
        fs.bitmap.mark_used(0);
        for block_id in 1..=INODE_AREA_BLOCKS {
            fs.bitmap.mark_used(block_id as u32);
        }
        for block_id in BITMAP_AREA_START..TOTAL_BLOCKS {
            fs.bitmap.mark_used(block_id as u32);
        }

        // 根 inode：紧随 inode 表分得连续12块，承载整张目录表
        let mut root = DiskInode::FREE;
        root.init(DiskInodeKind::Directory);
        let first = INODE_AREA_BLOCKS + 1;
        for (slot, block_id) in (first..first + DIR_BLOCKS).enumerate() {
            fs.bitmap.mark_used(block_id as u32);
            root.direct[slot] = block_id as u32;
        }
        root.blocks = DIR_BLOCKS as u32;
        root.size = DIR_TABLE_BYTES as u32;
        fs.inode_table[ROOT_INODE] = root;

        log::debug!(
            "formatted volume: {TOTAL_BLOCKS} blocks, inode area {INODE_AREA_BLOCKS} blocks, \
             directory at block {first}"
        );
        fs.flush();
        fs
    }

    /// 挂载既有的卷：按写入时的顺序把四个固定区域原样读回，
    /// 不重算任何东西——位图以盘上为准。
    pub fn open(block_device: Arc<dyn BlockDevice>) -> Self {
        let mut cache = BlockCacheManager::new();
        let super_block = cache
            .get(0, &block_device)
            .lock()
            .map(0, |super_block: &SuperBlock| *super_block);
        assert!(super_block.is_valid(), "error when loading SFS");

        let mut fs = Self {
            block_device,
            cache,
            super_block,
            inode_table: [DiskInode::FREE; MAX_FILES],
            directory: [DirEntry::EMPTY; MAX_FILES],
            bitmap: Bitmap::new(),
            fd_table: [None; MAX_FILES],
            dir_cursor: 0,
        };

        let inode_blocks: Vec<u32> = (1..=fs.super_block.inode_area_blocks).collect();
        read_region(
            &mut fs.cache,
            &fs.block_device,
            &inode_blocks,
            bytes_of_mut(&mut fs.inode_table),
        );

        let root = fs.inode_table[fs.super_block.root_inode as usize];
        read_region(
            &mut fs.cache,
            &fs.block_device,
            &root.direct[..DIR_BLOCKS],
            bytes_of_mut(&mut fs.directory),
        );

        let bitmap_blocks: Vec<u32> = (BITMAP_AREA_START as u32..TOTAL_BLOCKS as u32).collect();
        read_region(
            &mut fs.cache,
            &fs.block_device,
            &bitmap_blocks,
            fs.bitmap.as_bytes_mut(),
        );

        log::debug!(
            "mounted volume: {} blocks, {} live files",
            fs.super_block.total_blocks,
            fs.directory.iter().filter(|entry| !entry.is_free()).count(),
        );
        fs
    }

    /// 持久化：超级块、整张 inode 表、整张目录表、整幅位图，
    /// 依次写回固定区域后同步块缓存。
    pub(crate) fn flush(&mut self) {
        write_region(
            &mut self.cache,
            &self.block_device,
            &[0],
            bytes_of(&self.super_block),
        );

        let inode_blocks: Vec<u32> = (1..=INODE_AREA_BLOCKS as u32).collect();
        write_region(
            &mut self.cache,
            &self.block_device,
            &inode_blocks,
            bytes_of(&self.inode_table),
        );

        let dir_blocks = self.inode_table[ROOT_INODE].direct;
        write_region(
            &mut self.cache,
            &self.block_device,
            &dir_blocks[..DIR_BLOCKS],
            bytes_of(&self.directory),
        );

        let bitmap_blocks: Vec<u32> = (BITMAP_AREA_START as u32..TOTAL_BLOCKS as u32).collect();
        write_region(
            &mut self.cache,
            &self.block_device,
            &bitmap_blocks,
            self.bitmap.as_bytes(),
        );

        self.cache.sync_all();
    }

    /// 文件增长路径：为 inode 追加 `extra` 个数据块。
    ///
    /// 逻辑块号先填满12个直接索引；越界的第一块之前还要备好间接索引块。
    /// 卷满时提前停止，返回实际拿到的块数——这是唯一的"磁盘已满"信号。
    pub(crate) fn grow(&mut self, inode: &mut DiskInode, extra: usize) -> usize {
        let first = inode.blocks as usize;
        let mut got = 0;

        while got < extra {
            let index = first + got;

            if index >= DIRECT_COUNT && inode.indirect == NO_BLOCK {
                // 首次越过直接索引，先准备间接索引块；
                // 全部槽位填上哨兵再落盘，免得把残留内存当成块编号
                let Some(block_id) = self.bitmap.alloc() else {
                    break;
                };
                self.cache
                    .get(block_id as usize, &self.block_device)
                    .lock()
                    .map_mut(0, |indirect: &mut IndirectBlock| indirect.fill(NO_BLOCK));
                inode.indirect = block_id;
            }

            let Some(block_id) = self.bitmap.alloc() else {
                break;
            };
            if index < DIRECT_COUNT {
                inode.direct[index] = block_id;
            } else {
                self.cache
                    .get(inode.indirect as usize, &self.block_device)
                    .lock()
                    .map_mut(0, |indirect: &mut IndirectBlock| {
                        indirect[index - DIRECT_COUNT] = block_id
                    });
            }

            got += 1;
        }

        if got < extra {
            log::warn!("volume full: requested {extra} blocks, allocated {got}");
        }
        inode.blocks += got as u32;
        got
    }

    /// 把文件已分配的全部块按逻辑顺序读成一段连续缓冲
    pub(crate) fn read_whole(&mut self, inode: &DiskInode) -> Vec<u8> {
        let blocks = inode.blocks as usize;
        let mut data = vec![0u8; blocks * BLOCK_SIZE];

        for index in 0..blocks {
            let block_id = self.block_of(inode, index);
            self.cache
                .get(block_id as usize, &self.block_device)
                .lock()
                .map(0, |block: &DataBlock| {
                    data[index * BLOCK_SIZE..(index + 1) * BLOCK_SIZE].copy_from_slice(block)
                });
        }

        data
    }

    /// 把一段连续缓冲按逻辑顺序写回文件的全部块
    pub(crate) fn write_whole(&mut self, inode: &DiskInode, data: &[u8]) {
        for index in 0..inode.blocks as usize {
            let block_id = self.block_of(inode, index);
            self.cache
                .get(block_id as usize, &self.block_device)
                .lock()
                .map_mut(0, |block: &mut DataBlock| {
                    block.copy_from_slice(&data[index * BLOCK_SIZE..(index + 1) * BLOCK_SIZE])
                });
        }
    }

    /// 归还文件占用的所有块：数据块，以及间接索引块本身
    pub(crate) fn free_file_blocks(&mut self, inode: &DiskInode) {
        let blocks = inode.blocks as usize;

        for index in 0..blocks.min(DIRECT_COUNT) {
            self.bitmap.dealloc(inode.direct[index]);
        }

        if inode.indirect != NO_BLOCK {
            let indirect = self
                .cache
                .get(inode.indirect as usize, &self.block_device)
                .lock()
                .map(0, |indirect: &IndirectBlock| *indirect);
            for &block_id in &indirect[..blocks.saturating_sub(DIRECT_COUNT)] {
                self.bitmap.dealloc(block_id);
            }
            // 即使一个数据块都没挂上，索引块本身也要归还
            self.bitmap.dealloc(inode.indirect);
        }
    }

    /// 核对分配账目：固定区域加上每个存活 inode 的指针，
    /// 应当不重不漏地覆盖位图中所有置位的块。
    pub fn is_consistent(&mut self) -> bool {
        let mut expect = Bitmap::new();
        expect.mark_used(0);
        for block_id in 1..=INODE_AREA_BLOCKS {
            expect.mark_used(block_id as u32);
        }
        for block_id in BITMAP_AREA_START..TOTAL_BLOCKS {
            expect.mark_used(block_id as u32);
        }

        let table = self.inode_table;
        for inode in table.iter().filter(|inode| !inode.is_free()) {
            for index in 0..inode.blocks as usize {
                let block_id = self.block_of(inode, index);
                if expect.is_used(block_id) {
                    return false;
                }
                expect.mark_used(block_id);
            }
            if inode.indirect != NO_BLOCK {
                if expect.is_used(inode.indirect) {
                    return false;
                }
                expect.mark_used(inode.indirect);
            }
        }

        expect == self.bitmap
    }

    /// 逻辑块号到块设备编号：前12块走直接索引，其余查间接索引块
    fn block_of(&mut self, inode: &DiskInode, index: usize) -> u32 {
        if index < DIRECT_COUNT {
            inode.direct[index]
        } else {
            self.cache
                .get(inode.indirect as usize, &self.block_device)
                .lock()
                .map(0, |indirect: &IndirectBlock| indirect[index - DIRECT_COUNT])
        }
    }
}

/// 把一段字节写进给定的块序列，末块不足部分补零
fn write_region(
    cache: &mut BlockCacheManager,
    device: &Arc<dyn BlockDevice>,
    blocks: &[u32],
    data: &[u8],
) {
    for (index, &block_id) in blocks.iter().enumerate() {
        let start = (index * BLOCK_SIZE).min(data.len());
        let end = ((index + 1) * BLOCK_SIZE).min(data.len());
        let chunk = &data[start..end];
        cache
            .get(block_id as usize, device)
            .lock()
            .map_mut(0, |block: &mut DataBlock| {
                block.fill(0);
                block[..chunk.len()].copy_from_slice(chunk);
            });
    }
}

/// 从给定的块序列读出一段字节
fn read_region(
    cache: &mut BlockCacheManager,
    device: &Arc<dyn BlockDevice>,
    blocks: &[u32],
    out: &mut [u8],
) {
    for (index, &block_id) in blocks.iter().enumerate() {
        let start = (index * BLOCK_SIZE).min(out.len());
        let end = ((index + 1) * BLOCK_SIZE).min(out.len());
        if start == end {
            break;
        }
        cache
            .get(block_id as usize, device)
            .lock()
            .map(0, |block: &DataBlock| {
                out[start..end].copy_from_slice(&block[..end - start])
            });
    }
}

fn bytes_of<T>(value: &T) -> &[u8] {
    unsafe { slice::from_raw_parts(ptr::from_ref(value).cast(), mem::size_of::<T>()) }
}

fn bytes_of_mut<T>(value: &mut T) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(ptr::from_mut(value).cast(), mem::size_of::<T>()) }
}
