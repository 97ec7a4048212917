//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、磁盘镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统通过块设备驱动读写底层的存储介质，
//! 既可以是内核里的真实磁盘，也可以是用户态模拟出来的镜像。

#![no_std]

use core::any::Any;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
