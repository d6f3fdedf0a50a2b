// Launching the companion script. The script receives the selected course,
// its column and the session token through environment variables.

use anyhow::{Context, Result};
use log::{debug, info};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const LOCAL_SCRIPT: &str = "script.sh";
pub const SHARE_SCRIPT: &str = ".local/share/mlwl-image-occlusion/script.sh";

/// Values handed to the script.
#[derive(Debug, Clone)]
pub struct ScriptEnv {
    pub course_id: i64,
    pub column_id: Option<i64>,
    pub auth_token: String,
}

impl ScriptEnv {
    /// Name/value pairs; an unknown column is exported as `-1`.
    pub fn vars(&self) -> [(&'static str, String); 3] {
        [
            ("COURSE_ID", self.course_id.to_string()),
            ("COLUMN_ID", self.column_id.unwrap_or(-1).to_string()),
            ("AUTH_TOKEN", self.auth_token.clone()),
        ]
    }
}

/// Find the script: an explicit override, then `./script.sh`, then the
/// per-user share directory.
pub fn locate_script(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Unable to determine the current directory")?;
    locate_script_in(explicit, &cwd, dirs::home_dir().as_deref())
}

pub fn locate_script_in(explicit: Option<&Path>, cwd: &Path, home: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return path
            .canonicalize()
            .with_context(|| format!("Script not found: {}", path.display()));
    }

    let local = cwd.join(LOCAL_SCRIPT);
    if local.exists() {
        return local
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", local.display()));
    }

    let home = home.context("Unable to determine the home directory")?;
    let shared = home.join(SHARE_SCRIPT);
    if shared.exists() {
        return Ok(shared);
    }
    anyhow::bail!(
        "Script not found in either {} or {}",
        local.display(),
        shared.display()
    )
}

pub fn script_command(script: &Path, env: &ScriptEnv) -> Command {
    let mut cmd = Command::new("bash");
    cmd.arg(script).envs(env.vars());
    cmd
}

/// Replace this process with the script so its output stays on the
/// terminal. Only returns if the exec fails.
pub fn run_foreground(script: &Path, env: &ScriptEnv) -> anyhow::Error {
    info!("Running script in debug mode: {}", script.display());
    let err = script_command(script, env).exec();
    anyhow::Error::new(err).context("Error running script in debug mode")
}

/// Start the script in its own session with all output discarded and
/// return its PID without waiting for it.
pub fn spawn_detached(script: &Path, env: &ScriptEnv) -> Result<u32> {
    let mut cmd = script_command(script, env);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
    let child = cmd
        .spawn()
        .context("Error running script in detached mode")?;
    debug!("detached script {} as pid {}", script.display(), child.id());
    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mlwl-launcher-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn env() -> ScriptEnv {
        ScriptEnv {
            course_id: 42,
            column_id: None,
            auth_token: "tok".into(),
        }
    }

    #[test]
    fn local_script_wins_over_shared() {
        let root = scratch_dir("local");
        let cwd = root.join("cwd");
        let home = root.join("home");
        fs::create_dir_all(&cwd).unwrap();
        fs::create_dir_all(home.join(".local/share/mlwl-image-occlusion")).unwrap();
        fs::write(cwd.join(LOCAL_SCRIPT), "true").unwrap();
        fs::write(home.join(SHARE_SCRIPT), "true").unwrap();

        let found = locate_script_in(None, &cwd, Some(home.as_path())).unwrap();
        assert_eq!(found, cwd.join(LOCAL_SCRIPT).canonicalize().unwrap());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn falls_back_to_shared_script() {
        let root = scratch_dir("shared");
        let home = root.join("home");
        fs::create_dir_all(home.join(".local/share/mlwl-image-occlusion")).unwrap();
        fs::write(home.join(SHARE_SCRIPT), "true").unwrap();

        let found = locate_script_in(None, &root, Some(home.as_path())).unwrap();
        assert_eq!(found, home.join(SHARE_SCRIPT));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_script_is_an_error() {
        let root = scratch_dir("missing");
        assert!(locate_script_in(None, &root, Some(root.as_path())).is_err());
        assert!(locate_script_in(None, &root, None).is_err());
        assert!(locate_script_in(Some(root.join("nope.sh").as_path()), &root, None).is_err());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn unknown_column_is_exported_as_minus_one() {
        let vars = env().vars();
        assert_eq!(vars[0], ("COURSE_ID", "42".to_string()));
        assert_eq!(vars[1], ("COLUMN_ID", "-1".to_string()));
        assert_eq!(vars[2], ("AUTH_TOKEN", "tok".to_string()));
    }

    #[test]
    fn command_runs_bash_with_env() {
        let script = Path::new("/tmp/script.sh");
        let cmd = script_command(script, &ScriptEnv { column_id: Some(7), ..env() });
        assert_eq!(cmd.get_program(), OsStr::new("bash"));
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec![OsStr::new("/tmp/script.sh")]);
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("COLUMN_ID"), Some(OsStr::new("7")))));
        assert!(envs.contains(&(OsStr::new("AUTH_TOKEN"), Some(OsStr::new("tok")))));
    }

    #[test]
    fn detached_script_runs_with_exported_env() {
        let root = scratch_dir("detached");
        let marker = root.join("out.txt");
        let script = root.join("script.sh");
        fs::write(
            &script,
            format!("echo \"$COURSE_ID $COLUMN_ID $AUTH_TOKEN\" > '{}'\n", marker.display()),
        )
        .unwrap();

        let pid = spawn_detached(&script, &env()).unwrap();
        assert!(pid > 0);
        let mut contents = String::new();
        for _ in 0..100 {
            if let Ok(c) = fs::read_to_string(&marker) {
                if c.ends_with('\n') {
                    contents = c;
                    break;
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        assert_eq!(contents, "42 -1 tok\n");
        let _ = fs::remove_dir_all(&root);
    }
}
