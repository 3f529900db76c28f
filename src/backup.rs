use std::{
    io::{Read, Seek, SeekFrom},
    process::{Command, Stdio},
};

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{config, model, storage};

// {debug-}{dbname}{iso timestamp, second precision, colons stripped}.sql.gz
pub fn backup_name(database: &str, debug: bool, now: OffsetDateTime) -> String {
    let stamp = format!(
        "{:04}-{:02}-{:02}T{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    );

    format!(
        "{}{}{}.sql.gz",
        if debug { "debug-" } else { "" },
        database,
        stamp
    )
}

pub fn pg_backup(
    cfg: &config::BackupConfig,
    storage: &mut storage::SwiftStorage,
) -> Result<String, model::error::BackupError> {
    let name = backup_name(&cfg.database.name, cfg.debug, OffsetDateTime::now_utc());
    info!(name = %name, "backup");

    let mut dump = Command::new("pg_dump");
    dump.arg(cfg.database.url());

    let content = dump_pipeline(dump, Command::new("gzip"))?;
    storage.write(&name, &content)?;

    Ok(name)
}

// Runs `dump | compress` with the compressed output spooled to a temp file,
// returning the spooled bytes. Either process exiting non-zero is fatal.
fn dump_pipeline(
    mut dump: Command,
    mut compress: Command,
) -> Result<Vec<u8>, model::error::BackupError> {
    let mut spool = tempfile::tempfile()?;

    let mut dump_child = dump.stdout(Stdio::piped()).spawn()?;
    let dump_stdout = dump_child
        .stdout
        .take()
        .expect("dump stdout was requested as a pipe");

    let compress_child = compress
        .stdin(Stdio::from(dump_stdout))
        .stdout(Stdio::from(spool.try_clone()?))
        .stderr(Stdio::piped())
        .spawn()?;

    let compress_out = compress_child.wait_with_output()?;
    let dump_status = dump_child.wait()?;

    if !dump_status.success() {
        return Err(model::error::BackupError::Process {
            command: command_name(&dump),
            code: dump_status.code(),
        });
    }

    if !compress_out.status.success() {
        return Err(model::error::BackupError::Process {
            command: command_name(&compress),
            code: compress_out.status.code(),
        });
    }

    if !compress_out.stderr.is_empty() {
        warn!(stderr = %String::from_utf8_lossy(&compress_out.stderr), "compress");
    }

    spool.seek(SeekFrom::Start(0))?;
    let mut content = Vec::new();
    spool.read_to_end(&mut content)?;

    Ok(content)
}

fn command_name(command: &Command) -> String {
    command.get_program().to_string_lossy().to_string()
}
