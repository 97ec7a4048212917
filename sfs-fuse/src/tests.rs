//! 用内存盘对整套文件操作接口做功能性验证。
//! 每个测试各自持有一块盘，互不干扰，可以并行跑。

use std::sync::{Arc, Mutex};

use block_dev::BlockDevice;
use sfs::{
    Error, FileOps, SimpleFileSystem, StatKind, BLOCK_SIZE, MAX_FILES, MAX_FILE_BLOCKS,
    NAME_MAX_LEN, TOTAL_BLOCKS,
};

/// 模拟块设备：一整段内存。
/// 初值填非零杂讯，顺带验证格式化确实清过盘。
struct MemDisk(Mutex<Vec<u8>>);

impl MemDisk {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(vec![0xA5; TOTAL_BLOCKS * BLOCK_SIZE])))
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let data = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut data = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
    }
}

fn fresh() -> SimpleFileSystem {
    SimpleFileSystem::create(MemDisk::new())
}

#[test]
fn format_leaves_empty_volume() {
    let mut sfs = fresh();
    assert!(sfs.is_consistent());
    assert_eq!(sfs.next_file(), None);
}

#[test]
fn open_creates_empty_file() {
    let mut sfs = fresh();
    let fd = sfs.open("notes.txt").unwrap();
    assert_eq!(sfs.file_size("notes.txt").unwrap(), 0);

    let stat = sfs.stat("notes.txt").unwrap();
    assert_eq!(stat.size, 0);
    assert_eq!(stat.blocks, 0);
    assert_eq!(stat.kind, StatKind::File);

    sfs.close(fd).unwrap();
    assert!(sfs.is_consistent());
}

#[test]
fn write_then_read_back() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();

    let payload = b"hello simple filesystem";
    assert_eq!(sfs.write(fd, payload), payload.len());
    assert_eq!(sfs.file_size("a").unwrap(), payload.len());

    // 读游标从开头起步，与写游标无关
    let mut buf = vec![0u8; payload.len()];
    assert_eq!(sfs.read(fd, &mut buf), payload.len());
    assert_eq!(&buf, payload);
}

#[test]
fn reopen_appends_at_end() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"front");
    sfs.close(fd).unwrap();

    // 重新打开，写游标落在文件末尾
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"-back");

    let mut buf = vec![0u8; 10];
    assert_eq!(sfs.read(fd, &mut buf), 10);
    assert_eq!(&buf, b"front-back");
}

#[test]
fn overwrite_keeps_size() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"0123456789");

    sfs.seek_write(fd, 2).unwrap();
    sfs.write(fd, b"XY");

    assert_eq!(sfs.file_size("a").unwrap(), 10);
    let mut buf = vec![0u8; 10];
    sfs.read(fd, &mut buf);
    assert_eq!(&buf, b"01XY456789");
}

#[test]
fn read_at_end_returns_zero() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"data");

    sfs.seek_read(fd, 4).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(sfs.read(fd, &mut buf), 0);
}

#[test]
fn seek_stays_within_file() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"data");

    assert_eq!(sfs.seek_read(fd, 0), Ok(()));
    assert_eq!(sfs.seek_read(fd, 4), Ok(()));
    assert_eq!(sfs.seek_read(fd, 5), Err(Error::InvalidArgument));
    assert_eq!(sfs.seek_write(fd, 5), Err(Error::InvalidArgument));
}

#[test]
fn open_is_exclusive() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    assert_eq!(sfs.open("a"), Err(Error::AlreadyOpen));

    sfs.close(fd).unwrap();
    assert!(sfs.open("a").is_ok());
}

#[test]
fn stale_descriptor_is_inert() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    sfs.write(fd, b"data");
    sfs.close(fd).unwrap();

    assert_eq!(sfs.close(fd), Err(Error::InvalidArgument));
    assert_eq!(sfs.close(MAX_FILES), Err(Error::InvalidArgument));
    assert_eq!(sfs.seek_read(fd, 0), Err(Error::InvalidArgument));
    // 失效描述符上的读写不报错，只是读写不到任何字节
    assert_eq!(sfs.read(fd, &mut [0u8; 4]), 0);
    assert_eq!(sfs.write(fd, b"x"), 0);
    assert_eq!(sfs.file_size("a").unwrap(), 4);
}

#[test]
fn remove_rejects_open_file() {
    let mut sfs = fresh();
    let fd = sfs.open("a").unwrap();
    assert_eq!(sfs.remove("a"), Err(Error::Busy));

    sfs.close(fd).unwrap();
    assert_eq!(sfs.remove("a"), Ok(()));
    assert_eq!(sfs.remove("a"), Err(Error::NotFound));
    assert_eq!(sfs.file_size("a"), Err(Error::NotFound));
}

#[test]
fn remove_reclaims_blocks() {
    let mut sfs = fresh();
    let fd = sfs.open("big").unwrap();
    // 越过直接索引，让间接索引块也参与进来
    let data = vec![7u8; 20 * BLOCK_SIZE];
    assert_eq!(sfs.write(fd, &data), data.len());
    sfs.close(fd).unwrap();

    assert!(sfs.is_consistent());
    sfs.remove("big").unwrap();
    assert!(sfs.is_consistent());
    assert_eq!(sfs.next_file(), None);
}

#[test]
fn name_validation() {
    let mut sfs = fresh();
    assert_eq!(sfs.open(""), Err(Error::InvalidArgument));
    assert_eq!(sfs.open("x\0y"), Err(Error::InvalidArgument));

    let long = "x".repeat(NAME_MAX_LEN + 1);
    assert_eq!(sfs.open(&long), Err(Error::InvalidArgument));

    let max = "y".repeat(NAME_MAX_LEN);
    let fd = sfs.open(&max).unwrap();
    sfs.close(fd).unwrap();
    assert_eq!(sfs.next_file().as_deref(), Some(max.as_str()));
}

#[test]
fn directory_iteration_wraps() {
    let mut sfs = fresh();
    for name in ["one", "two", "three"] {
        let fd = sfs.open(name).unwrap();
        sfs.close(fd).unwrap();
    }

    let mut seen = Vec::new();
    while let Some(name) = sfs.next_file() {
        seen.push(name);
    }
    seen.sort();
    assert_eq!(seen, ["one", "three", "two"]);

    // 游标回卷，下一轮从头再来
    assert_eq!(sfs.next_file().as_deref(), Some("one"));
}

#[test]
fn inode_table_capacity() {
    let mut sfs = fresh();
    // 根目录占用0号 inode，留给文件的只有99个
    for i in 0..MAX_FILES - 1 {
        let name = format!("f{i}");
        let fd = sfs.open(&name).unwrap();
        sfs.close(fd).unwrap();
    }
    assert_eq!(sfs.open("straw"), Err(Error::ResourceExhausted));

    sfs.remove("f0").unwrap();
    assert!(sfs.open("straw").is_ok());
}

#[test]
fn large_file_spans_indirect_index() {
    let mut sfs = fresh();
    let fd = sfs.open("big").unwrap();

    let data: Vec<u8> = (0..40 * BLOCK_SIZE).map(|i| (i % 251) as u8).collect();
    assert_eq!(sfs.write(fd, &data), data.len());

    let stat = sfs.stat("big").unwrap();
    assert_eq!(stat.size as usize, data.len());
    assert_eq!(stat.blocks, 40);

    let mut buf = vec![0u8; data.len()];
    assert_eq!(sfs.read(fd, &mut buf), data.len());
    assert_eq!(buf, data);
    assert!(sfs.is_consistent());
}

#[test]
fn write_clamps_at_file_capacity() {
    let mut sfs = fresh();
    let fd = sfs.open("cap").unwrap();

    let cap = MAX_FILE_BLOCKS * BLOCK_SIZE;
    let data = vec![1u8; cap + BLOCK_SIZE];
    assert_eq!(sfs.write(fd, &data), cap);
    assert_eq!(sfs.file_size("cap").unwrap(), cap);

    // 已到容量上限，再写一个字节也进不去
    assert_eq!(sfs.write(fd, b"!"), 0);
    assert!(sfs.is_consistent());
}

#[test]
fn volume_full_shrinks_write() {
    let mut sfs = fresh();
    let chunk = vec![3u8; MAX_FILE_BLOCKS * BLOCK_SIZE];

    // 不断塞满容量上限的文件，直到某次只写进一部分
    let mut shrunk = false;
    for i in 0..10 {
        let name = format!("fill{i}");
        let fd = sfs.open(&name).unwrap();
        let written = sfs.write(fd, &chunk);
        sfs.close(fd).unwrap();
        if written < chunk.len() {
            shrunk = true;
            break;
        }
    }
    assert!(shrunk);
    assert!(sfs.is_consistent());

    // 卷满后腾出空间，写入恢复
    sfs.remove("fill0").unwrap();
    let fd = sfs.open("after").unwrap();
    assert!(sfs.write(fd, b"breathing room") > 0);
    assert!(sfs.is_consistent());
}

#[test]
fn survives_remount() {
    let disk = MemDisk::new();
    let payload: Vec<u8> = (0..15 * BLOCK_SIZE).map(|i| (i % 241) as u8).collect();

    {
        let mut sfs = SimpleFileSystem::create(disk.clone());
        let fd = sfs.open("keep").unwrap();
        sfs.write(fd, &payload);
        sfs.close(fd).unwrap();
        let fd = sfs.open("other").unwrap();
        sfs.write(fd, b"second file");
        sfs.close(fd).unwrap();
    }

    let mut sfs = SimpleFileSystem::open(disk);
    assert!(sfs.is_consistent());
    assert_eq!(sfs.file_size("keep").unwrap(), payload.len());

    let fd = sfs.open("keep").unwrap();
    let mut buf = vec![0u8; payload.len()];
    assert_eq!(sfs.read(fd, &mut buf), payload.len());
    assert_eq!(buf, payload);

    // 描述符表不落盘：重挂后一切文件都处于关闭状态
    assert_eq!(sfs.remove("other"), Ok(()));
}

#[test]
fn remount_preserves_free_list() {
    let disk = MemDisk::new();

    {
        let mut sfs = SimpleFileSystem::create(disk.clone());
        let fd = sfs.open("a").unwrap();
        sfs.write(fd, &vec![9u8; 14 * BLOCK_SIZE]);
        sfs.close(fd).unwrap();
        sfs.remove("a").unwrap();
    }

    // 删除归还的块在重挂后依旧可用
    let mut sfs = SimpleFileSystem::open(disk);
    assert!(sfs.is_consistent());
    let fd = sfs.open("b").unwrap();
    assert_eq!(sfs.write(fd, b"reuse"), 5);
    assert!(sfs.is_consistent());
}

#[test]
#[should_panic(expected = "error when loading SFS")]
fn mount_rejects_blank_disk() {
    let _ = SimpleFileSystem::open(MemDisk::new());
}

#[test]
fn interleaved_descriptors_are_independent() {
    let mut sfs = fresh();
    let fa = sfs.open("a").unwrap();
    let fb = sfs.open("b").unwrap();

    sfs.write(fa, b"aaaa");
    sfs.write(fb, b"bb");
    sfs.write(fa, b"AA");

    let mut buf = [0u8; 6];
    assert_eq!(sfs.read(fa, &mut buf), 6);
    assert_eq!(&buf, b"aaaaAA");

    let mut buf = [0u8; 2];
    assert_eq!(sfs.read(fb, &mut buf), 2);
    assert_eq!(&buf, b"bb");
}

#[test]
fn image_file_round_trip() {
    let path = std::env::temp_dir().join(format!("sfs-test-{}.img", std::process::id()));

    {
        let mut sfs = crate::create_image(&path).unwrap();
        let fd = sfs.open("on-disk").unwrap();
        sfs.write(fd, b"written through a file-backed device");
        sfs.close(fd).unwrap();
    }

    let mut sfs = crate::open_image(&path).unwrap();
    assert!(sfs.is_consistent());
    let fd = sfs.open("on-disk").unwrap();
    let mut buf = vec![0u8; sfs.file_size("on-disk").unwrap()];
    sfs.read(fd, &mut buf);
    assert_eq!(&buf, b"written through a file-backed device");

    std::fs::remove_file(&path).unwrap();
}
