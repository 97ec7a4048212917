//! 用户态模拟块设备：把宿主机上的普通文件当作一块磁盘使用

#[cfg(test)]
mod tests;

use std::fs::OpenOptions;
use std::io;
use std::io::{Read, Write};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

use block_dev::BlockDevice;
use sfs::{SimpleFileSystem, BLOCK_SIZE, TOTAL_BLOCKS};

pub struct BlockFile(pub Mutex<std::fs::File>);

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(file.read(buf).unwrap(), BLOCK_SIZE, "not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        assert_eq!(
            file.write(buf).unwrap(),
            BLOCK_SIZE,
            "not a complete block!"
        );
    }
}

/// 新建定长镜像文件并在其上格式化出空卷
pub fn create_image(path: &Path) -> io::Result<SimpleFileSystem> {
    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    fd.set_len((TOTAL_BLOCKS * BLOCK_SIZE) as u64)?;

    Ok(SimpleFileSystem::create(Arc::new(BlockFile(Mutex::new(
        fd,
    )))))
}

/// 挂载既有镜像
pub fn open_image(path: &Path) -> io::Result<SimpleFileSystem> {
    let fd = OpenOptions::new().read(true).write(true).open(path)?;

    Ok(SimpleFileSystem::open(Arc::new(BlockFile(Mutex::new(fd)))))
}
