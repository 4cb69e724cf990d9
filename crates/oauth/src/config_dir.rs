use std::path::PathBuf;

/// `~/.config/tokenrelay/`, or the override set through `tokenrelay_config::set_config_dir`.
pub(crate) fn tokenrelay_config_dir() -> PathBuf {
    tokenrelay_config::config_dir().unwrap_or_else(|| PathBuf::from(".tokenrelay"))
}
