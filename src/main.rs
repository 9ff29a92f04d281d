use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_stdin::FileOrStdin;

use modc::{driver, Config, Result};

#[derive(Parser, Debug)]
#[command(version, about = "Translates modular C into plain C and builds it")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a program and compile it with the backend C compiler
    Build {
        /// Root source file or package directory
        path: PathBuf,
        /// Output executable, defaults to the root module's name
        output: Option<String>,
    },
    /// Print the import tree of a program
    Deptree { path: PathBuf },
    /// Print the translated C for one file, or for stdin with `-`
    Emit {
        #[arg(default_value = "-")]
        input: FileOrStdin,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env();
    match cli.command {
        Command::Build { path, output } => driver::build(&config, &path, output.as_deref()),
        Command::Deptree { path } => {
            print!("{}", driver::deptree(&config, &path)?);
            Ok(())
        }
        Command::Emit { input } => {
            let out = if input.is_stdin() {
                driver::emit_source(&config, &input.contents()?)?
            } else {
                driver::emit_file(&config, &PathBuf::from(input.filename()))?
            };
            print!("{}", out);
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("modc: {}", err);
        std::process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_takes_a_positional_output_name() {
        let cli = Cli::try_parse_from(["modc", "build", "app.c", "app"]).unwrap();
        let Command::Build { path, output } = cli.command else {
            panic!("expected build, got {:?}", cli.command);
        };
        assert_eq!(path, PathBuf::from("app.c"));
        assert_eq!(output.as_deref(), Some("app"));

        let cli = Cli::try_parse_from(["modc", "build", "app.c"]).unwrap();
        assert!(matches!(cli.command, Command::Build { output: None, .. }));
    }
}
