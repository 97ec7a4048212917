use std::mem;

use sfs::{DirEntry, DiskInode, SuperBlock, BLOCK_SIZE, MAX_FILES};

#[test]
fn layout() {
    assert_eq!(20, mem::size_of::<SuperBlock>());
    assert_eq!(76, mem::size_of::<DiskInode>());
    assert_eq!(28, mem::size_of::<DirEntry>());
}

#[test]
fn directory_fits_direct_blocks() {
    // 整张目录表必须装得进根 inode 的12个直接块
    assert!(MAX_FILES * mem::size_of::<DirEntry>() <= 12 * BLOCK_SIZE);
}
