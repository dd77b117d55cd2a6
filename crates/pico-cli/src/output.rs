//! Output destinations and terminal color selection.

use anyhow::Context;
use pico_bytecode::Assembly;
use std::io::Write;
use std::path::Path;
use termcolor::ColorChoice;

/// Resolve `ColorChoice` from the `--color` flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Write `data` to stdout or to `path`.
pub fn write_output(data: &[u8], path: &Path, to_stdout: bool) -> anyhow::Result<()> {
    if to_stdout {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(data).context("failed to write to stdout")?;
        lock.flush().context("failed to write to stdout")?;
        return Ok(());
    }
    std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = data.len(), "wrote output");
    Ok(())
}

/// Write the label table and line mapping as JSON.
pub fn write_map(assembly: &Assembly, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(assembly).context("failed to serialize map")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), labels = assembly.labels.len(), "wrote map");
    Ok(())
}
