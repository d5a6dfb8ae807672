use std::path::Path;

use dockyard_cloud::{CheckResult, REGISTRY_TOKEN_ENV, REGISTRY_USERNAME_ENV, RegistryCredentials, ToolClient};

pub async fn doctor(config: Option<&Path>) -> anyhow::Result<()> {
    let client = ToolClient::new();
    let mut report = client.doctor().await;

    let path = super::config_path(config);
    report.config_file = if !path.exists() {
        CheckResult::ok("Not found, using defaults")
    } else {
        match super::load_config(config) {
            Ok(_) => CheckResult::ok("Found"),
            Err(e) => CheckResult::fail(&format!("{e:#}")),
        }
    };

    report.credentials = if RegistryCredentials::from_env().is_some() {
        CheckResult::ok("Found")
    } else {
        CheckResult::fail(&format!(
            "{REGISTRY_USERNAME_ENV} / {REGISTRY_TOKEN_ENV} not set"
        ))
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed — see above for details");
    }

    Ok(())
}
