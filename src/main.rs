// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use kas_acme_hook::{
    ChallengeHook, ChallengeRequest, Error, HickoryLookup, HookAction, HookConfig, HookSettings,
    Invocation, KasClient, KasCredentials, PollPolicy, PropagationChecker, StringLogger,
    DEFAULT_CONFIG_FILE,
};
use std::process::ExitCode;
use structopt::clap::AppSettings;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    about = "ACME DNS-01 hook for the KAS API",
    setting = AppSettings::TrailingVarArg
)]
struct Options {
    /// TOML configuration file (default: kas_hook.toml in $HOME or ./, if present)
    #[structopt(short, long)]
    config: Option<String>,

    /// Do not print progress lines
    #[structopt(short, long)]
    quiet: bool,

    /// deploy_challenge, clean_challenge, or another hook action (ignored)
    action: String,

    /// <domain> <challenge> <token> [...]
    // Tokens are base64url and may start with '-'.
    #[structopt(allow_hyphen_values = true)]
    args: Vec<String>,
}

fn load_config(options: &Options) -> Result<HookConfig, Error> {
    let builder = || HookConfig::builder().debug(!options.quiet);
    match &options.config {
        Some(file_name) => builder().toml_file(file_name).build(),
        None => builder()
            .toml_file(DEFAULT_CONFIG_FILE)
            .build()
            .or_else(|_| builder().toml_str("").build()),
    }
}

async fn run(
    action: &HookAction,
    request: &ChallengeRequest,
    credentials: &KasCredentials,
    settings: &HookSettings,
    logger: &StringLogger,
) -> Result<(), Error> {
    let kas = KasClient::authenticate(&settings.kas, credentials).await?;
    let lookup = HickoryLookup::from_settings(&settings.propagation, logger).await?;
    let checker = PropagationChecker::new(lookup, logger.clone());
    let hook = ChallengeHook::new(
        &kas,
        &checker,
        PollPolicy::from(&settings.propagation),
        logger.clone(),
    );
    match action {
        HookAction::DeployChallenge => {
            hook.deploy_challenge(&request.domain, &request.challenge, &request.token)
                .await?;
        }
        HookAction::CleanChallenge => {
            hook.clean_challenge(&request.domain, &request.token).await?;
        }
        HookAction::Ignored(_) => {}
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let options = Options::from_args();

    let invocation = Invocation::parse(&options.action, &options.args, |name| {
        std::env::var(name).ok()
    });
    let (action, request, credentials) = match invocation {
        Ok(Invocation::Skip) => return ExitCode::SUCCESS,
        Ok(Invocation::Run {
            action,
            request,
            credentials,
        }) => (action, request, credentials),
        Err(line) => {
            eprintln!("{line}");
            return ExitCode::FAILURE;
        }
    };

    let loaded = load_config(&options).and_then(|config| Ok((config.settings()?, config.debug())));
    let (settings, debug) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", action.failure(Some(&request.domain), &e));
            return ExitCode::FAILURE;
        }
    };

    let logger = StringLogger::new(debug);
    match run(&action, &request, &credentials, &settings, &logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", action.failure(Some(&request.domain), &e));
            ExitCode::FAILURE
        }
    }
}
