// src/config/environment.rs

//! The process [`Environment`]: directories, remote caller address and
//! terminal detection, resolved once at process start.
//!
//! Also resolves which configuration files to read and which state file
//! to use for the calling remote address.

use crate::common::{FPath, Path, PathBuf};
use crate::config::parser::ClusterDefinition;
use crate::readers::helpers::path_to_fpath;

use std::ffi::OsString;
use std::io::{Error, ErrorKind, IsTerminal, Result};
use std::net::IpAddr;

use ::encoding_rs::{Encoding, UTF_8};
use ::lazy_static::lazy_static;
use ::regex::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Name of the main configuration file in the configuration directory.
pub const CONFIG_FILE_NAME: &str = "logwatch.cfg";

/// Glob, relative to the configuration directory, of additional
/// configuration files.
pub const CONFIG_DIR_GLOB: &str = "logwatch.d/*.cfg";

/// Base name of state files in the var directory.
pub const STATE_FILE_NAME: &str = "logwatch.state";

lazy_static! {
    /// IPv4 address, optionally in IPv4-mapped IPv6 notation.
    static ref IPV4_REGEX: Regex =
        Regex::new(r"^(::ffff:|::ffff:0:|)(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").unwrap();
    /// Fully written out IPv6 address, upper case.
    static ref IPV6_REGEX: Regex =
        Regex::new(r"^(?:[A-F0-9]{1,4}:){7}[A-F0-9]{1,4}$").unwrap();
}

/// Environment of one run, passed down explicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Environment {
    /// state files, from `LOGWATCH_DIR`, `MK_VARDIR` or `MK_STATEDIR`
    pub vardir: PathBuf,
    /// configuration files, from `LOGWATCH_DIR` or `MK_CONFDIR`
    pub confdir: PathBuf,
    /// address of the caller, from `REMOTE` or `REMOTE_ADDR`
    pub remote: Option<String>,
    /// is stdout a terminal?
    pub stdout_is_tty: bool,
    /// encoding of log files without byte order mark or `encoding` option
    pub locale_encoding: &'static Encoding,
}

/// First of `names` that is set to a non-empty value.
fn first_env_var(names: &[&str]) -> Option<OsString> {
    names
        .iter()
        .filter_map(std::env::var_os)
        .find(|val| !val.is_empty())
}

impl Environment {
    /// Resolve the environment variables of the current process.
    pub fn from_env() -> Environment {
        defn!();
        let vardir = first_env_var(&["LOGWATCH_DIR", "MK_VARDIR", "MK_STATEDIR"])
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let confdir = first_env_var(&["LOGWATCH_DIR", "MK_CONFDIR"])
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let remote = first_env_var(&["REMOTE", "REMOTE_ADDR"]).map(|s| s.to_string_lossy().into_owned());
        let env = Environment {
            vardir,
            confdir,
            remote,
            stdout_is_tty: std::io::stdout().is_terminal(),
            locale_encoding: locale_encoding(first_env_var(&["LC_ALL", "LC_CTYPE", "LANG"])),
        };
        defx!("{:?}", env);

        env
    }

    /// Configuration files to read, in order.
    ///
    /// `config_file_arg` (option `-c`) replaces the whole list.
    pub fn config_files(
        &self,
        config_file_arg: Option<&Path>,
    ) -> Vec<PathBuf> {
        if let Some(path) = config_file_arg {
            return vec![path.to_path_buf()];
        }
        let mut paths: Vec<PathBuf> = vec![self.confdir.join(CONFIG_FILE_NAME)];
        let pattern: FPath = path_to_fpath(&self.confdir.join(CONFIG_DIR_GLOB));
        match ::glob::glob(&pattern) {
            Ok(entries) => {
                // `glob` yields entries in alphabetical order
                paths.extend(entries.filter_map(|entry| entry.ok()));
            }
            Err(err) => {
                ::log::warn!("Invalid configuration glob {:?}: {}", pattern, err);
            }
        }
        ::log::info!("Configuration file paths: {:?}", paths);

        paths
    }

    /// Path of the legacy single state file.
    pub fn default_state_path(&self) -> PathBuf {
        self.vardir.join(STATE_FILE_NAME)
    }

    /// Determine the state file path for this caller:
    ///
    /// * no remote, stdout a terminal: `logwatch.state.local`
    /// * no remote: `logwatch.state`
    /// * remote not an IP address: `logwatch.state.<remote>`
    /// * remote IP address within a cluster: `logwatch.state.<cluster>`
    /// * otherwise: `logwatch.state.<remote>`
    ///
    /// where `<remote>` has every `:` replaced with `_`.
    pub fn status_filename(
        &self,
        clusters: &[ClusterDefinition],
    ) -> PathBuf {
        defn!();
        let remote: &str = match self.remote.as_deref() {
            Some(remote) if !remote.is_empty() => remote,
            _ => {
                let suffix = if self.stdout_is_tty { ".local" } else { "" };
                defx!("no remote");
                return self.vardir.join(format!("{}{}", STATE_FILE_NAME, suffix));
            }
        };
        let remote_hostname: String = remote.replace(':', "_");

        if !IPV4_REGEX.is_match(remote) && !IPV6_REGEX.is_match(remote) {
            ::log::debug!("REMOTE {:?} neither IPv4 nor IPv6 address.", remote);
            defx!("not an IP address");
            return self.vardir.join(format!("{}.{}", STATE_FILE_NAME, remote_hostname));
        }

        // IPv4 in IPv6 notation, match the plain IPv4 address
        let remote_ip: &str = remote
            .strip_prefix("::ffff:0:")
            .or_else(|| remote.strip_prefix("::ffff:"))
            .unwrap_or(remote);

        let mut name: &str = remote_hostname.as_str();
        for cluster in clusters.iter() {
            for ip_or_subnet in cluster.ips_or_subnets.iter() {
                match ip_in_subnetwork(remote_ip, ip_or_subnet) {
                    Ok(true) => {
                        ::log::info!("Matching cluster ip {}", remote_ip);
                        ::log::info!("Matching cluster name {}", cluster.name);
                        name = cluster.name.as_str();
                    }
                    Ok(false) => {}
                    Err(err) => {
                        ::log::warn!("Cluster {:?}: {}", cluster.name, err);
                    }
                }
            }
        }
        let path = self.vardir.join(format!("{}.{}", STATE_FILE_NAME, name));
        ::log::info!("Status filename: {:?}", path);
        defx!("{:?}", path);

        path
    }

    /// Copy the legacy single state file to `status_path` if `status_path`
    /// does not exist yet, so that a caller switching to its own state file
    /// keeps its offsets.
    pub fn migrate_state_file(
        &self,
        status_path: &Path,
    ) -> Result<()> {
        let default_path = self.default_state_path();
        if status_path.exists() || !default_path.exists() || status_path == default_path {
            return Ok(());
        }
        ::log::info!("Copying {:?} to {:?}", default_path, status_path);
        std::fs::copy(&default_path, status_path)?;

        Ok(())
    }
}

/// Encoding named by the codeset of a locale name like `de_DE.ISO-8859-1@euro`.
///
/// No locale, no codeset, or the codeset of the `C` locale means UTF-8.
pub fn locale_encoding(locale: Option<OsString>) -> &'static Encoding {
    let locale: String = match locale {
        Some(locale) => locale.to_string_lossy().into_owned(),
        None => return UTF_8,
    };
    let codeset: &str = match locale.split_once('.') {
        Some((_, rest)) => rest.split('@').next().unwrap_or(rest),
        None => return UTF_8,
    };
    if codeset.is_empty() || codeset == "ANSI_X3.4-1968" {
        return UTF_8;
    }
    let encoding = Encoding::for_label(codeset.as_bytes()).unwrap_or(UTF_8);
    ::log::debug!("Locale {:?} preferred encoding is {}", locale, encoding.name());

    encoding
}

/// Address family and integer value of an IP address.
fn ip_to_integer(ip_address: &str) -> Result<(u128, u8)> {
    match ip_address.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok((u32::from(ip) as u128, 4)),
        Ok(IpAddr::V6(ip)) => Ok((u128::from(ip), 6)),
        Err(_) => Err(Error::new(ErrorKind::InvalidInput, format!("invalid IP address: {:?}", ip_address))),
    }
}

/// Inclusive range of addresses of a subnetwork in CIDR notation, or of a
/// single address.
fn subnetwork_to_ip_range(subnetwork: &str) -> Result<(u128, u128, u8)> {
    let (prefix, netmask_len) = match subnetwork.split_once('/') {
        Some(pl) => pl,
        None => {
            let (ip, version) = ip_to_integer(subnetwork)?;
            return Ok((ip, ip, version));
        }
    };
    let invalid = || Error::new(ErrorKind::InvalidInput, format!("invalid subnetwork: {:?}", subnetwork));
    let (ip, version) = ip_to_integer(prefix).map_err(|_| invalid())?;
    let ip_len: u32 = if version == 4 { 32 } else { 128 };
    let netmask_len: u32 = match netmask_len.trim().parse::<u32>() {
        Ok(n) if n <= ip_len => n,
        _ => return Err(invalid()),
    };
    let suffix_len: u32 = ip_len - netmask_len;
    let suffix_mask: u128 = if suffix_len >= 128 { u128::MAX } else { (1u128 << suffix_len) - 1 };
    let ip_lower: u128 = ip & !suffix_mask;

    Ok((ip_lower, ip_lower | suffix_mask, version))
}

/// Is `ip_address` within `subnetwork` (CIDR notation, e.g.
/// `10.80.1.0/24`, or a plain address)?
///
/// Addresses of different IP versions never match.
pub fn ip_in_subnetwork(
    ip_address: &str,
    subnetwork: &str,
) -> Result<bool> {
    let (ip, version1) = ip_to_integer(ip_address)?;
    let (ip_lower, ip_upper, version2) = subnetwork_to_ip_range(subnetwork)?;
    if version1 != version2 {
        return Ok(false);
    }

    Ok(ip_lower <= ip && ip <= ip_upper)
}
