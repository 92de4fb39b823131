mod directory;

use directory::DirectoryArtifact;
use jphase::jvm::{ClassName, Name};
use jphase::phase::{Error, PhaseVerifier, Settings, WarningSink};

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print warnings to standard error as they are found
struct ConsoleWarnings {
    stderr: StandardStream,
}

impl ConsoleWarnings {
    fn print(&mut self, message: &str) -> io::Result<()> {
        self.stderr
            .set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        self.stderr.write_all(b"warning")?;
        self.stderr.reset()?;
        writeln!(self.stderr, ": {}", message)
    }
}

impl WarningSink for ConsoleWarnings {
    fn warn(&mut self, message: &str) {
        if let Err(err) = self.print(message) {
            log::error!("Failed to print warning ({}): {}", err, message);
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("Lifecycle phase checker")
        .version(crate_version!())
        .about("Check lifecycle phase annotations across method overrides in JVM class files")
        .arg(
            Arg::new("class-list")
                .long("class-list")
                .value_name("FILE")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help("Only check the classes listed in this file (one per line)"),
        )
        .arg(
            Arg::new("annotation-package")
                .long("annotation-package")
                .value_name("PKG")
                .action(ArgAction::Set)
                .help("Package of the phase annotations")
                .default_value(Settings::DEFAULT_ANNOTATION_PACKAGE),
        )
        .arg(
            Arg::new("override-annotation")
                .long("override-annotation")
                .value_name("CLASS")
                .action(ArgAction::Set)
                .help("Annotation marking methods that must override something"),
        )
        .arg(
            Arg::new("check-calls")
                .long("check-calls")
                .action(ArgAction::SetTrue)
                .help("Also check that methods only call methods of the same phase"),
        )
        .arg(
            Arg::new("deny-warnings")
                .long("deny-warnings")
                .action(ArgAction::SetTrue)
                .help("Exit with a failure status if there are any warnings"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Directory of class files to check")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .get_matches();

    let input: PathBuf = matches
        .get_one::<PathBuf>("INPUT")
        .cloned()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing input directory"))?;

    let mut settings = Settings::new()?;
    if let Some(package) = matches.get_one::<String>("annotation-package") {
        settings = settings.with_annotation_package(package)?;
    }
    if let Some(marker) = matches.get_one::<String>("override-annotation") {
        settings.override_annotation =
            ClassName::from_string(marker.clone()).map_err(Error::MalformedName)?;
    }
    settings.check_call_edges = matches.get_flag("check-calls");

    let mut artifact = DirectoryArtifact::new(&input);
    if let Some(class_list) = matches.get_one::<PathBuf>("class-list") {
        artifact = artifact.with_class_list(class_list)?;
    }

    log::info!("Checking classes in {:?}", input);
    let sink = ConsoleWarnings {
        stderr: StandardStream::stderr(ColorChoice::Auto),
    };
    let verifier = PhaseVerifier::new(&artifact, settings, sink);
    let warning_count = verifier.verify_all()?;

    // Summary
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let color = if warning_count == 0 {
        Color::Green
    } else {
        Color::Yellow
    };
    stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(stdout, "{}", warning_count)?;
    stdout.reset()?;
    writeln!(
        stdout,
        " warning{} reported",
        if warning_count == 1 { "" } else { "s" }
    )?;

    if warning_count > 0 && matches.get_flag("deny-warnings") {
        exit(1);
    }
    Ok(())
}
