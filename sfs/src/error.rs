/// 文件操作失败的原因。
/// 所有失败都以返回值同步上报，不跨越 API 边界传播恐慌。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 参数非法：文件名超长或为空、定位越过文件末尾、描述符不存在
    InvalidArgument,
    /// 没有同名的目录项
    NotFound,
    /// 该文件已有存活的描述符
    AlreadyOpen,
    /// 文件处于打开状态，不能删除
    Busy,
    /// inode、目录槽位或描述符槽位耗尽
    ResourceExhausted,
}

pub type Result<T> = core::result::Result<T, Error>;
