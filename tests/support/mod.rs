#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use helpline::db::Database;
use helpline::model::{HelpPost, PostDraft, User};
use helpline::storage::DB_FILENAME;
use helpline::HelpDesk;
use tempfile::TempDir;

/// A freshly initialized helpline home in a temp directory.
pub struct TestDesk {
    dir: TempDir,
    desk: HelpDesk,
}

impl TestDesk {
    pub fn init() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let desk = HelpDesk::open(dir.path().to_path_buf());
        desk.init()?;
        Ok(Self { dir, desk })
    }

    /// Initialize with `helpline.toml` written before the desk is opened.
    pub fn with_config(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("helpline.toml"), contents)?;
        let desk = HelpDesk::open(dir.path().to_path_buf());
        desk.init()?;
        Ok(Self { dir, desk })
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    pub fn desk(&self) -> &HelpDesk {
        &self.desk
    }

    /// A second handle on the same home, as another process would open it.
    pub fn reopen(&self) -> HelpDesk {
        HelpDesk::open(self.home().to_path_buf())
    }

    pub fn user(&self, username: &str) -> Result<User, helpline::Error> {
        self.desk.register_user(username, None)
    }

    pub fn post(
        &self,
        author: &User,
        title: &str,
        location: &str,
    ) -> Result<HelpPost, helpline::Error> {
        let draft = PostDraft::new(location, "please help").with_title(title);
        Ok(self.desk.create_post(author.id, draft)?.post)
    }

    /// The raw snapshot on disk.
    pub fn read_db(&self) -> Result<Database, Box<dyn std::error::Error>> {
        let raw = fs::read_to_string(self.home().join(DB_FILENAME))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The CLI pointed at this home with no ambient actor.
    pub fn cmd(&self) -> Command {
        let mut cmd = helpline_cmd();
        cmd.arg("--home").arg(self.home());
        cmd
    }

    /// The CLI acting as `username`.
    pub fn cmd_as(&self, username: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--as", username]);
        cmd
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.home().join(rel)
    }
}

pub fn helpline_cmd() -> Command {
    let mut cmd = Command::cargo_bin("helpline").expect("helpline binary");
    cmd.env_remove("HELPLINE_ACTOR")
        .env_remove("HELPLINE_HOME")
        .env_remove("RUST_LOG");
    cmd
}

/// Parse the JSON envelope printed by a `--json` invocation.
pub fn json_output(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON envelope")
}
