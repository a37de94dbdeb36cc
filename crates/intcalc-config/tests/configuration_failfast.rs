//! Malformed configuration layers fail loading instead of being skipped.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ortho_config::OrthoError;
use rstest::rstest;
use tempfile::TempDir;

use intcalc_config::Config;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::env::var_os(key);
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

#[test]
fn malformed_configs_return_aggregated_error() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let cli_path = temp_dir.path().join("cli_intcalc.toml");
    let env_path = temp_dir.path().join("env_intcalc.toml");

    fs::write(&cli_path, "port = 5142 max_threads = 2").expect("write malformed cli config");
    fs::write(&env_path, "port = not_a_number").expect("write malformed env config");

    let _env = EnvOverride::set_var("INTCALC_CONFIG_PATH", env_path.as_os_str());

    let args = vec![
        OsString::from("intserver"),
        OsString::from("--config-path"),
        cli_path.clone().into_os_string(),
    ];

    let error = Config::load_from_iter(args).expect_err("loading must fail");
    let message = error.to_string();
    assert!(
        message.contains("multiple configuration errors"),
        "expected aggregate message, got {message:?}"
    );

    match error.as_ref() {
        OrthoError::Aggregate(aggregate) => {
            let mentioned_paths = aggregate
                .iter()
                .filter_map(|err| match err {
                    OrthoError::File { path, .. } => Some(path.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>();

            assert!(
                mentioned_paths.contains(&cli_path),
                "missing CLI path in aggregate: {mentioned_paths:?}"
            );
            assert!(
                mentioned_paths.contains(&env_path),
                "missing env path in aggregate: {mentioned_paths:?}"
            );
        }
        other => panic!("expected aggregated error, got {other:?}"),
    }
}

#[rstest]
#[case::port_out_of_range(&["--port", "70000"])]
#[case::port_not_numeric(&["--port", "http"])]
#[case::negative_max_threads(&["--max-threads", "-1"])]
#[case::unknown_log_format(&["--log-format", "pretty"])]
fn malformed_flags_are_rejected(#[case] flags: &[&str]) {
    let args = std::iter::once("intserver")
        .chain(flags.iter().copied())
        .map(OsString::from);
    assert!(Config::load_from_iter(args).is_err());
}
