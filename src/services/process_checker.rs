use crate::error::InspectError;
use crate::models::{ProcessDetails, ProcessEntry, ServiceDescriptor};

/// 命中的匹配规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Pid,
    ProcessName,
    Args,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessMatch {
    pub pid: u32,
    pub rule: MatchRule,
}

/// 检查服务是否正在运行
pub fn is_running(service: &ServiceDescriptor, snapshot: &[ProcessEntry]) -> bool {
    find_match(service, snapshot).is_some()
}

/// 按优先级查找匹配的进程：
/// 1. pid 相同
/// 2. 进程名相同（忽略大小写）
/// 3. args 中每个参数都出现在进程命令行中
///
/// 前一条规则命中后不再检查后面的规则。
pub fn find_match(service: &ServiceDescriptor, snapshot: &[ProcessEntry]) -> Option<ProcessMatch> {
    // pid 不需要读取进程详情，无权限的进程也能命中
    if let Some(pid) = service.process_id {
        if snapshot.iter().any(|entry| entry.pid == pid) {
            return Some(ProcessMatch { pid, rule: MatchRule::Pid });
        }
    }

    let wanted_name = service.process_name().map(str::to_lowercase);
    if wanted_name.is_none() && service.args.is_empty() {
        return None;
    }

    let inspectable: Vec<(u32, &ProcessDetails)> = snapshot
        .iter()
        .filter_map(|entry| match &entry.details {
            Ok(details) => Some((entry.pid, details)),
            Err(InspectError::AccessDenied { .. }) => {
                log::trace!("Access denied for pid {}, skipping", entry.pid);
                None
            }
            Err(e) => {
                log::warn!("Error for pid {}: {}", entry.pid, e);
                None
            }
        })
        .collect();

    if let Some(wanted) = wanted_name {
        if let Some((pid, _)) = inspectable
            .iter()
            .find(|(_, details)| details.name.to_lowercase() == wanted)
        {
            return Some(ProcessMatch { pid: *pid, rule: MatchRule::ProcessName });
        }
    }

    if !service.args.is_empty() {
        if let Some((pid, _)) = inspectable
            .iter()
            .find(|(_, details)| contains_all(&details.cmdline, &service.args))
        {
            return Some(ProcessMatch { pid: *pid, rule: MatchRule::Args });
        }
    }

    None
}

fn contains_all(cmdline: &[String], tokens: &[String]) -> bool {
    tokens.iter().all(|token| cmdline.iter().any(|arg| arg == token))
}
