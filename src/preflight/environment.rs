//! Work directory checks.

use std::fs;

use crate::workspace::Layout;

use super::types::CheckResult;

pub fn check_work_dir(layout: &Layout) -> CheckResult {
    let name = format!("{} writable", layout.work_dir.display());

    if let Err(e) = fs::create_dir_all(&layout.work_dir) {
        return CheckResult::fail(&name, &format!("Cannot create: {}", e));
    }

    let probe = layout.work_dir.join(".preflight-test");
    match fs::write(&probe, "test") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            CheckResult::pass(&name)
        }
        Err(e) => CheckResult::fail(&name, &format!("Cannot write: {}", e)),
    }
}
