//! PC debug host for the FPGA stream loader.
//!
//! Runs the shared session logic against a simulated peripheral. Levels are
//! read from an asset directory and button events come from a script file or
//! stdin, one `press <button>` / `release <button>` per line.

mod assets;
mod display;
mod error;
mod input;
mod transport;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fpga_stream_core::{
    Session, SessionConfig, SessionError, Variant, DEFAULT_EXPECTED_CHUNKS,
};
use fpga_stream_hal::InputSource;

use assets::DirAssetStore;
use display::ConsoleDisplay;
use error::HostError;
use input::ScriptInput;
use transport::SimulatedFpga;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    /// Auto-load level 1; Home exits, Menu/Select step levels
    Simple,
    /// Start at the level menu; Menu returns to it
    Enhanced,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Simple => Variant::Simple,
            VariantArg::Enhanced => Variant::Enhanced,
        }
    }
}

#[derive(Parser)]
#[command(name = "fpga-stream-pc")]
#[command(about = "Run the FPGA level loader against a simulated peripheral", long_about = None)]
struct Cli {
    /// Directory holding write_spi.bin, <level>.raw and <level>.bit
    #[arg(default_value = ".")]
    assets: PathBuf,

    /// Session flavour
    #[arg(long, value_enum, default_value = "enhanced")]
    variant: VariantArg,

    /// Chunks streamed per level
    #[arg(long, default_value_t = DEFAULT_EXPECTED_CHUNKS)]
    chunks: u32,

    /// Number of selectable levels (the menu holds 15 plus Quit)
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u8).range(1..=15))]
    levels: u8,

    /// Probes answered "busy" before each chunk
    #[arg(long, default_value_t = 0)]
    busy_polls: u32,

    /// Button script (default: stdin)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Write the last latched memory image here on exit
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn open_script(script: Option<&PathBuf>) -> Result<ScriptInput, HostError> {
    match script {
        Some(path) => {
            let file = File::open(path).map_err(|source| HostError::Script {
                path: path.clone(),
                source,
            })?;
            Ok(ScriptInput::new(Box::new(BufReader::new(file))))
        }
        None => Ok(ScriptInput::new(Box::new(io::stdin().lock()))),
    }
}

fn run(cli: Cli) -> Result<(), HostError> {
    let store = DirAssetStore::new(&cli.assets)?;
    log::info!("assets from {}", store.root().display());

    let config = SessionConfig {
        variant: cli.variant.into(),
        expected_chunks: cli.chunks,
        levels: cli.levels,
    };
    let mut input = open_script(cli.script.as_ref())?;
    input.init();

    let mut session = Session::new(
        SimulatedFpga::new(cli.busy_polls),
        store,
        ConsoleDisplay::stdout(),
        config,
    );

    // Load failures leave the session at the menu; keep taking input.
    match session.start() {
        Err(SessionError::Load(e)) => log::warn!("initial load failed: {e}"),
        other => other?,
    }
    while !session.is_terminated() {
        match session.poll_input(&mut input) {
            Ok(true) => {}
            Ok(false) => {
                log::info!("input exhausted");
                break;
            }
            Err(SessionError::Load(e)) => log::warn!("load failed: {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    let final_mode = session.mode();
    let (fpga, _, _) = session.into_parts();
    if let Some(path) = cli.dump {
        fs::write(&path, fpga.loaded_memory()).map_err(|source| HostError::Dump {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "wrote {} bytes of latched memory to {}",
            fpga.loaded_memory().len(),
            path.display()
        );
    }
    log::debug!(
        "peripheral {}, display {:?}, exit requested: {}",
        if fpga.is_enabled() { "enabled" } else { "disabled" },
        fpga.display_mode(),
        fpga.exit_requested()
    );
    log::info!(
        "finished in {final_mode:?}: {} configurations, {} chunks, {} probes, {} input reports",
        fpga.configurations().len(),
        fpga.chunks(),
        fpga.probes(),
        fpga.reports().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpga_stream_core::SessionMode;
    use std::io::Cursor;

    const CHUNKS: u32 = 2;

    fn asset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("write_spi.bin"), b"loader").unwrap();
        for level in 1..=7u8 {
            fs::write(dir.path().join(format!("{level}.raw")), vec![level; 1500]).unwrap();
            fs::write(dir.path().join(format!("{level}.bit")), vec![0xB0 | level; 16]).unwrap();
        }
        dir
    }

    fn session(
        dir: &tempfile::TempDir,
        config: SessionConfig,
    ) -> Session<SimulatedFpga, DirAssetStore, ConsoleDisplay<Vec<u8>>> {
        Session::new(
            SimulatedFpga::new(3),
            DirAssetStore::new(dir.path()).unwrap(),
            ConsoleDisplay::new(Vec::new()),
            config.with_expected_chunks(CHUNKS),
        )
    }

    fn drain(
        session: &mut Session<SimulatedFpga, DirAssetStore, ConsoleDisplay<Vec<u8>>>,
        script: &str,
    ) {
        let mut input = ScriptInput::new(Box::new(Cursor::new(script.to_owned())));
        while !session.is_terminated() && session.poll_input(&mut input).unwrap() {}
    }

    #[test]
    fn test_enhanced_session_streams_selected_level() {
        let dir = asset_dir();
        let mut session = session(&dir, SessionConfig::enhanced());
        session.start().unwrap();

        drain(&mut session, "tap down\ntap down\ntap a\npress b\nrelease b\n");

        assert_eq!(session.mode(), SessionMode::Playing);
        let fpga = session.link();
        assert_eq!(fpga.configurations(), &[6, 16]);
        assert_eq!(fpga.chunks(), u64::from(CHUNKS));
        let memory = fpga.loaded_memory();
        assert_eq!(memory.len(), 2048);
        assert!(memory[..1500].iter().all(|&b| b == 3));
        assert!(memory[1500..].iter().all(|&b| b == 0));
        // The release of the confirming A arrives after the level is running.
        assert_eq!(
            fpga.reports(),
            &[(0x0000, 0x0200), (0x0400, 0x0400), (0x0000, 0x0400)]
        );
        assert_eq!(fpga.display_mode(), fpga_stream_hal::DisplayMode::Run);
    }

    #[test]
    fn test_enhanced_quit_entry_terminates() {
        let dir = asset_dir();
        let mut session = session(&dir, SessionConfig::enhanced());
        session.start().unwrap();

        drain(&mut session, &"tap down\n".repeat(7));
        drain(&mut session, "tap start\ntap a\n");

        assert!(session.is_terminated());
        let (fpga, _, _) = session.into_parts();
        assert!(fpga.exit_requested());
        assert!(!fpga.is_enabled());
        assert!(fpga.configurations().is_empty());
    }

    #[test]
    fn test_simple_session_steps_levels() {
        let dir = asset_dir();
        let mut session = session(&dir, SessionConfig::simple());
        session.start().unwrap();
        assert!(session.link().loaded_memory().iter().take(1500).all(|&b| b == 1));

        drain(&mut session, "tap menu\n");
        assert!(session.link().loaded_memory().iter().take(1500).all(|&b| b == 2));

        drain(&mut session, "tap home\n");
        assert!(session.is_terminated());
        assert_eq!(session.link().reports().first(), Some(&(0x0040, 0x0040)));
    }

    #[test]
    fn test_missing_level_is_reported_and_recoverable() {
        let dir = asset_dir();
        fs::remove_file(dir.path().join("1.raw")).unwrap();
        let mut session = session(&dir, SessionConfig::enhanced());
        session.start().unwrap();

        let mut input = ScriptInput::new(Box::new(Cursor::new("tap a\n")));
        let err = session.poll_input(&mut input).unwrap_err();
        assert!(matches!(err, SessionError::Load(_)));
        assert_eq!(session.mode(), SessionMode::LoadFailed);

        drain(&mut session, "release a\ntap down\ntap a\n");
        assert_eq!(session.mode(), SessionMode::Playing);
    }
}
