use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::models::{ProcessEntry, ProcessSnapshot};

/// 进程快照来源
pub trait ProcessInspector {
    fn snapshot(&mut self) -> ProcessSnapshot;
}

/// 基于 sysinfo 的进程采集
///
/// sysinfo 在读不到 /proc 字段时返回空值而不是报错，
/// 因此这里产生的条目总是可读的。
pub struct SysinfoInspector {
    system: System,
}

impl SysinfoInspector {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for SysinfoInspector {
    fn snapshot(&mut self) -> ProcessSnapshot {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
        );

        self.system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let cmdline = process
                    .cmd()
                    .iter()
                    .map(|s| s.to_string_lossy().into_owned())
                    .collect();
                ProcessEntry::new(pid.as_u32(), process.name().to_string_lossy(), cmdline)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;

    #[test]
    fn test_snapshot_contains_current_process() {
        let current_pid = process::id();
        let snapshot = SysinfoInspector::new().snapshot();

        let me = snapshot
            .iter()
            .find(|entry| entry.pid == current_pid)
            .expect("current process in snapshot");
        let details = me.details.as_ref().unwrap();
        assert!(!details.name.is_empty());
        assert!(!details.cmdline.is_empty());
    }
}
