use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::errors::{AuthError, Result};

/// netrc 中保存账号信息所用的机器名
pub const NETRC_MACHINE: &str = "coursera-dl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetrcEntry {
    pub machine: Option<String>, // None 表示 default 条目
    pub login: String,
    pub password: String,
}

/// 解析 netrc 内容。`macdef` 定义的宏体一直持续到空行，会被跳过
pub fn parse_netrc(text: &str) -> Vec<NetrcEntry> {
    let mut entries = Vec::new();
    let mut current: Option<NetrcEntry> = None;
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "machine" | "default" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    let machine = if token == "machine" {
                        tokens.next().map(str::to_string)
                    } else {
                        None
                    };
                    current = Some(NetrcEntry {
                        machine,
                        login: String::new(),
                        password: String::new(),
                    });
                }
                "login" => {
                    if let (Some(entry), Some(value)) = (current.as_mut(), tokens.next()) {
                        entry.login = value.to_string();
                    }
                }
                "password" => {
                    if let (Some(entry), Some(value)) = (current.as_mut(), tokens.next()) {
                        entry.password = value.to_string();
                    }
                }
                "account" => {
                    tokens.next();
                }
                "macdef" => {
                    for body in lines.by_ref() {
                        if body.trim().is_empty() {
                            break;
                        }
                    }
                    break;
                }
                _ if token.starts_with('#') => break,
                _ => {}
            }
        }
    }

    if let Some(entry) = current {
        entries.push(entry);
    }
    entries
}

/// 查找指定机器的账号，找不到时退回到 default 条目
pub fn lookup(text: &str, machine: &str) -> Option<(String, String)> {
    let entries = parse_netrc(text);
    entries
        .iter()
        .find(|e| e.machine.as_deref() == Some(machine))
        .or_else(|| entries.iter().find(|e| e.machine.is_none()))
        .filter(|e| !e.login.is_empty())
        .map(|e| (e.login.clone(), e.password.clone()))
}

/// 需要依次尝试的 netrc 路径。
///
/// 用户指定了路径就只用它；Unix 上是 `~/.netrc`；Windows 没有统一的约定，
/// 按环境变量组合出多个目录，每个目录分别尝试 `.netrc` 和 `_netrc`。
pub fn config_paths(user_specified: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = user_specified {
        return vec![path.to_path_buf()];
    }

    if !cfg!(windows) {
        return dirs::home_dir()
            .map(|home| vec![home.join(".netrc")])
            .unwrap_or_default();
    }

    let env_vars: [&[&str]; 4] = [
        &["HOME"],
        &["HOMEDRIVE", "HOMEPATH"],
        &["USERPROFILE"],
        &["SYSTEMDRIVE"],
    ];

    let mut all_dirs = Vec::new();
    for vars in env_vars {
        let dir: String = vars
            .iter()
            .map(|v| std::env::var(v).unwrap_or_default())
            .collect();
        if dir.is_empty() {
            debug!("环境变量 {:?} 未定义，跳过", vars);
        } else {
            all_dirs.push(dir);
        }
    }
    all_dirs.push("C:".to_string());
    all_dirs.push(String::new());

    let sep = std::path::MAIN_SEPARATOR;
    all_dirs
        .iter()
        .flat_map(|dir| {
            [".", "_"]
                .into_iter()
                .map(move |lead| PathBuf::from(format!("{}{}{}netrc", dir, sep, lead)))
        })
        .collect()
}

/// 从 netrc 读取用户名和密码，所有候选路径都失败时逐条记录错误
pub fn credentials_from_netrc(user_specified: Option<&Path>) -> Result<(String, String)> {
    let mut errors = Vec::new();

    for path in config_paths(user_specified) {
        debug!("尝试读取 netrc 文件: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(text) => match lookup(&text, NETRC_MACHINE) {
                Some(found) => return Ok(found),
                None => errors.push(format!(
                    "{}: 没有机器 {} 的条目",
                    path.display(),
                    NETRC_MACHINE
                )),
            },
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    for e in &errors {
        error!("{}", e);
    }
    Err(AuthError::NetrcNotFound(NETRC_MACHINE.to_string()))
}
