use crate::error::InspectError;

/// 进程可读属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDetails {
    /// 进程名
    pub name: String,
    /// 命令行参数列表
    pub cmdline: Vec<String>,
}

/// 快照中的一个进程。pid 总是可用，其余属性可能读取失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub details: Result<ProcessDetails, InspectError>,
}

impl ProcessEntry {
    pub fn new(pid: u32, name: impl Into<String>, cmdline: Vec<String>) -> Self {
        Self {
            pid,
            details: Ok(ProcessDetails {
                name: name.into(),
                cmdline,
            }),
        }
    }

    pub fn inaccessible(pid: u32, error: InspectError) -> Self {
        Self {
            pid,
            details: Err(error),
        }
    }
}

/// 一次采集得到的只读进程视图
pub type ProcessSnapshot = Vec<ProcessEntry>;
