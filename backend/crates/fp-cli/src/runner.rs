use crate::cli::Cli;
use crate::commands::Commands;

use fp_config::{ModuleProp, PanelConfig};
use fp_control::bridge::CommandBridge;
use fp_control::logging::setup_logging;
use fp_control::{ControlError, ControlResult, LifecycleController, LifecycleState, Notice};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Load panel config, set up logging, then run the chosen command.
pub async fn run(cli: Cli) -> ControlResult<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => PanelConfig::config_dir()?,
    };

    let config = PanelConfig::load_from(&config_dir)?;
    config.validate()?;

    // Commands still work without a log file.
    if let Err(e) = setup_logging(&config.log_dir(&config_dir), &config.logging.level) {
        eprintln!("Warning: file logging disabled: {e}");
    }
    config.log_summary();

    let (bridge, _pump) = CommandBridge::with_shell_host(config.bridge.timeout());
    let controller = LifecycleController::new(&config, bridge);
    let mut notices = controller.subscribe_notices();

    let state = controller.initialize().await;
    debug!("Initial server state: {state}");

    let result = dispatch(&controller, cli.command, &mut notices).await;
    print_pending(&mut notices);
    result
}

/// Print the error and what to do about it.
pub fn report_error(err: &ControlError) {
    eprintln!("Error: {err}");
    match err {
        ControlError::ConfirmationRequired { .. } => {
            eprintln!("Re-run with --yes to stop the server.");
        }
        _ => eprintln!("{}", err.recovery_hint()),
    }
}

async fn dispatch(
    controller: &LifecycleController,
    command: Commands,
    notices: &mut broadcast::Receiver<Notice>,
) -> ControlResult<()> {
    match command {
        Commands::Status => {
            print_status(controller).await;
            Ok(())
        }
        Commands::Show => {
            let settings = controller.settings().await;
            println!("port={}", settings.port);
            println!("parameters={}", settings.parameters);
            println!("version={}", settings.version);
            println!("status={}", settings.status_flag());
            println!("file={}", controller.config_store().path().display());
            Ok(())
        }
        Commands::Save(args) => {
            let draft = args.draft(&controller.settings().await);
            controller.save_settings(&draft).await?;
            Ok(())
        }
        Commands::Start(args) => {
            let draft = args.draft(&controller.settings().await);
            controller.start(&draft).await?;
            print_status(controller).await;
            Ok(())
        }
        Commands::Stop { yes } => {
            controller.stop(yes).await?;
            print_status(controller).await;
            Ok(())
        }
        Commands::Toggle { settings, yes } => {
            let draft = settings.draft(&controller.settings().await);
            controller.toggle(&draft, yes).await?;
            print_status(controller).await;
            Ok(())
        }
        Commands::Switch { version } => {
            controller.switch_version(version).await?;
            print_status(controller).await;
            Ok(())
        }
        Commands::Watch => watch(controller, notices).await,
    }
}

async fn watch(
    controller: &LifecycleController,
    notices: &mut broadcast::Receiver<Notice>,
) -> ControlResult<()> {
    let mut states = controller.subscribe_state();
    print_status(controller).await;

    let poller = controller.spawn_poller();

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!("Server {}", state_text(state));
            }
            notice = notices.recv() => match notice {
                Ok(notice) => println!("{notice}"),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {skipped} notices"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.shutdown();
    if let Err(e) = poller.await {
        warn!("Status poller ended abnormally: {e}");
    }
    Ok(())
}

async fn print_status(controller: &LifecycleController) {
    let state = controller.state().await;
    let settings = controller.settings().await;
    println!(
        "{}",
        ModuleProp::describe(state.is_running(), settings.version)
    );
}

fn print_pending(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        println!("{notice}");
    }
}

fn state_text(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Running => "started",
        LifecycleState::Stopped => "stopped",
    }
}
