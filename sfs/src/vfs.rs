//! # 文件操作层
//!
//! 面向调用方的接口：按名打开与删除，按描述符读写与定位，
//! 外加目录遍历和元信息查询。
//!
//! 读写游标成对而独立：读游标打开时归零，写游标落在文件末尾，
//! 顺手就是追加写。

use alloc::string::{String, ToString};

use enumflags2::{bitflags, BitFlags};

use crate::error::{Error, Result};
use crate::fs::SimpleFileSystem;
use crate::layout::{DirEntry, DiskInodeKind, NAME_MAX_LEN};
use crate::{BLOCK_SIZE, MAX_FILES, MAX_FILE_BLOCKS};

/// 打开文件的游标。一个文件同时至多一个。
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileDesc {
    pub inode: u32,
    pub read_pos: usize,
    pub write_pos: usize,
}

/// 文件元信息快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub inode: u32,
    pub size: u32,
    pub blocks: u32,
    pub kind: BitFlags<StatKind>,
}

#[bitflags]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatKind {
    Dir = 0o040000,
    File = 0o100000,
}

impl From<DiskInodeKind> for BitFlags<StatKind> {
    fn from(kind: DiskInodeKind) -> Self {
        match kind {
            DiskInodeKind::Directory => StatKind::Dir.into(),
            DiskInodeKind::File => StatKind::File.into(),
        }
    }
}

/// 按名打开文件。
///
/// 独立成 trait 而非固有方法：挂载构造函数 [`SimpleFileSystem::open`]
/// 已占用固有命名空间里的 `open`，二者无法在同一固有 impl 中共存。
pub trait FileOps {
    /// 打开文件，不存在则创建空文件。返回描述符编号。
    ///
    /// 同一文件不允许重复打开；新描述符的读游标在开头，写游标在末尾。
    fn open(&mut self, name: &str) -> Result<usize>;
}

impl FileOps for SimpleFileSystem {
    fn open(&mut self, name: &str) -> Result<usize> {
        validate_name(name)?;

        // 先确保有描述符槽位，失败的打开不该在盘上留下新文件
        let fd = self
            .fd_table
            .iter()
            .position(Option::is_none)
            .ok_or(Error::ResourceExhausted)?;

        let inode_id = match self.lookup(name) {
            Some(slot) => {
                let inode_id = self.directory[slot].inode_id();
                if self.is_open(inode_id) {
                    return Err(Error::AlreadyOpen);
                }
                inode_id
            }
            None => self.create_file(name)?,
        };

        self.fd_table[fd] = Some(FileDesc {
            inode: inode_id,
            read_pos: 0,
            write_pos: self.inode_table[inode_id as usize].size as usize,
        });

        log::trace!("open {name:?} -> fd {fd} (inode {inode_id})");
        Ok(fd)
    }
}

impl SimpleFileSystem {
    /// 关闭描述符。游标作废，文件数据不受影响。
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.fd_table
            .get_mut(fd)
            .and_then(Option::take)
            .map(|_| ())
            .ok_or(Error::InvalidArgument)
    }

    /// 移动读游标，可停在 `[0, size]` 的任意位置
    pub fn seek_read(&mut self, fd: usize, pos: usize) -> Result<()> {
        let desc = self.desc(fd)?;
        let size = self.inode_table[desc.inode as usize].size as usize;
        if pos > size {
            return Err(Error::InvalidArgument);
        }

        self.fd_table[fd].as_mut().unwrap().read_pos = pos;
        Ok(())
    }

    /// 移动写游标，可停在 `[0, size]` 的任意位置
    pub fn seek_write(&mut self, fd: usize, pos: usize) -> Result<()> {
        let desc = self.desc(fd)?;
        let size = self.inode_table[desc.inode as usize].size as usize;
        if pos > size {
            return Err(Error::InvalidArgument);
        }

        self.fd_table[fd].as_mut().unwrap().write_pos = pos;
        Ok(())
    }

    /// 从读游标处读入 `buf`，返回实际读到的字节数。
    /// 游标已在文件末尾、或描述符失效时读到 0 字节，不算错误。
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> usize {
        let Ok(desc) = self.desc(fd) else {
            return 0;
        };
        let inode = self.inode_table[desc.inode as usize];

        let len = buf.len().min((inode.size as usize).saturating_sub(desc.read_pos));
        if len == 0 {
            return 0;
        }

        let data = self.read_whole(&inode);
        buf[..len].copy_from_slice(&data[desc.read_pos..desc.read_pos + len]);

        self.fd_table[fd].as_mut().unwrap().read_pos += len;
        len
    }

    /// 从写游标处写入 `buf`，返回实际写入的字节数。
    ///
    /// 需要时就地扩容；容量触顶或卷满时收缩本次写入量，
    /// 能写多少写多少。描述符失效时写入 0 字节。
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> usize {
        let Ok(desc) = self.desc(fd) else {
            return 0;
        };
        let mut inode = self.inode_table[desc.inode as usize];
        let pos = desc.write_pos;

        // 第一重收缩：不越过单文件容量上限
        let mut len = buf.len().min(MAX_FILE_BLOCKS * BLOCK_SIZE - pos);

        let needed = (pos + len).div_ceil(BLOCK_SIZE);
        if needed > inode.blocks as usize {
            let extra = needed - inode.blocks as usize;
            self.grow(&mut inode, extra);
            // 第二重收缩：卷满时只写进实际分到的块
            len = len.min(inode.blocks as usize * BLOCK_SIZE - pos);
        }

        if len == 0 {
            // 一个字节都写不进也要记下扩容结果
            self.inode_table[desc.inode as usize] = inode;
            self.flush();
            return 0;
        }

        let mut data = self.read_whole(&inode);
        data[pos..pos + len].copy_from_slice(&buf[..len]);
        self.write_whole(&inode, &data);

        inode.size = inode.size.max((pos + len) as u32);
        self.inode_table[desc.inode as usize] = inode;
        self.fd_table[fd].as_mut().unwrap().write_pos = pos + len;

        self.flush();
        len
    }

    /// 删除文件并归还其全部块。已打开的文件拒绝删除。
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let slot = self.lookup(name).ok_or(Error::NotFound)?;
        let inode_id = self.directory[slot].inode_id();
        if self.is_open(inode_id) {
            return Err(Error::Busy);
        }

        let inode = self.inode_table[inode_id as usize];
        self.free_file_blocks(&inode);
        self.inode_table[inode_id as usize].release();
        self.directory[slot].clear();

        log::trace!("remove {name:?} (inode {inode_id})");
        self.flush();
        Ok(())
    }

    /// 目录遍历：返回下一个文件名，走完一轮后返回一次空并回到开头
    pub fn next_file(&mut self) -> Option<String> {
        while self.dir_cursor < MAX_FILES {
            let entry = &self.directory[self.dir_cursor];
            self.dir_cursor += 1;
            if !entry.is_free() {
                return Some(entry.name().to_string());
            }
        }

        self.dir_cursor = 0;
        None
    }

    /// 按名查询文件大小
    pub fn file_size(&self, name: &str) -> Result<usize> {
        let slot = self.lookup(name).ok_or(Error::NotFound)?;
        let inode_id = self.directory[slot].inode_id();
        Ok(self.inode_table[inode_id as usize].size as usize)
    }

    /// 按名查询文件元信息
    pub fn stat(&self, name: &str) -> Result<Stat> {
        let slot = self.lookup(name).ok_or(Error::NotFound)?;
        let inode_id = self.directory[slot].inode_id();
        let inode = self.inode_table[inode_id as usize];

        Ok(Stat {
            inode: inode_id,
            size: inode.size,
            blocks: inode.blocks,
            kind: inode.kind.into(),
        })
    }
}

impl SimpleFileSystem {
    fn lookup(&self, name: &str) -> Option<usize> {
        self.directory
            .iter()
            .position(|entry| !entry.is_free() && entry.name() == name)
    }

    fn is_open(&self, inode_id: u32) -> bool {
        self.fd_table
            .iter()
            .flatten()
            .any(|desc| desc.inode == inode_id)
    }

    fn desc(&self, fd: usize) -> Result<FileDesc> {
        self.fd_table
            .get(fd)
            .copied()
            .flatten()
            .ok_or(Error::InvalidArgument)
    }

    /// 占一个目录槽位和一个 inode，登记为空文件
    fn create_file(&mut self, name: &str) -> Result<u32> {
        let slot = self
            .directory
            .iter()
            .position(DirEntry::is_free)
            .ok_or(Error::ResourceExhausted)?;
        let inode_id = self
            .inode_table
            .iter()
            .position(|inode| inode.is_free())
            .ok_or(Error::ResourceExhausted)? as u32;

        self.inode_table[inode_id as usize].init(DiskInodeKind::File);
        self.directory[slot] = DirEntry::new(name, inode_id);

        log::trace!("create {name:?} at slot {slot} (inode {inode_id})");
        self.flush();
        Ok(inode_id)
    }
}

/// 文件名须非空、不超长、不含 NUL（NUL 在盘上充当终止符）
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > NAME_MAX_LEN || name.bytes().any(|byte| byte == 0) {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}
