// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where the config file and the mail template are looked up.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

const APP_DIR: &str = "resticara";
const CONFIG_FILE: &str = "config.toml";
const MAIL_TEMPLATE_FILE: &str = "mail_template.txt";

/// `./config.toml`, `/etc/resticara/config.toml`, then the user config dir
/// (`$XDG_CONFIG_HOME` or `~/.config`).
pub fn config_search_paths() -> Vec<PathBuf> {
	let mut paths = vec![
		PathBuf::from(CONFIG_FILE),
		Path::new("/etc").join(APP_DIR).join(CONFIG_FILE),
	];
	if let Some(dir) = dirs::config_dir() {
		paths.push(dir.join(APP_DIR).join(CONFIG_FILE));
	}
	paths
}

pub fn mail_template_search_paths() -> Vec<PathBuf> {
	let mut paths = vec![
		Path::new("templates").join(MAIL_TEMPLATE_FILE),
		Path::new("/etc")
			.join(APP_DIR)
			.join("templates")
			.join(MAIL_TEMPLATE_FILE),
	];
	if let Some(dir) = dirs::config_dir() {
		paths.push(dir.join(APP_DIR).join(MAIL_TEMPLATE_FILE));
	}
	paths
}

/// First path that exists as a file.
pub fn find_existing(paths: &[PathBuf]) -> Option<PathBuf> {
	paths.iter().find(|p| p.is_file()).cloned()
}

/// An explicit path must exist; otherwise the search order is walked.
pub fn locate_config(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
	locate(explicit, &config_search_paths())?.ok_or_else(|| ConfigError::NotFound {
		searched: display_paths(&config_search_paths()),
	})
}

/// `Ok(None)` means no template file exists and the built-in one applies.
pub fn locate_mail_template(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
	locate(explicit, &mail_template_search_paths())
}

fn locate(explicit: Option<&Path>, search: &[PathBuf]) -> Result<Option<PathBuf>, ConfigError> {
	if let Some(path) = explicit {
		return if path.is_file() {
			Ok(Some(path.to_path_buf()))
		} else {
			Err(ConfigError::NotFound {
				searched: path.display().to_string(),
			})
		};
	}

	let found = find_existing(search);
	debug!(found = ?found, "searched for file");
	Ok(found)
}

fn display_paths(paths: &[PathBuf]) -> String {
	paths
		.iter()
		.map(|p| p.display().to_string())
		.collect::<Vec<_>>()
		.join(", ")
}
